//! Include/exclude pattern sets applied to file trees.

use serde::{Deserialize, Serialize};

/// A set of Ant-style include and exclude patterns.
///
/// Intersecting two non-empty sets keeps both as separate constraints: a file
/// must satisfy this set and every intersected set to be part of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSet {
    includes: Vec<String>,
    excludes: Vec<String>,
    intersections: Vec<PatternSet>,
}

impl PatternSet {
    /// Creates an empty pattern set, which matches every file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an include pattern.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    /// Adds an exclude pattern.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }

    /// Returns the include patterns, in declaration order.
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    /// Returns the exclude patterns, in declaration order.
    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }

    /// Returns the sets this one was intersected with.
    pub fn intersections(&self) -> &[PatternSet] {
        &self.intersections
    }

    /// Returns `true` if the set places no constraint on the tree.
    pub fn is_empty(&self) -> bool {
        self.includes.is_empty()
            && self.excludes.is_empty()
            && self.intersections.iter().all(PatternSet::is_empty)
    }

    /// Returns a set matching only files matched by both `self` and `other`.
    pub fn intersect(&self, other: &PatternSet) -> PatternSet {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut combined = self.clone();
        combined.intersections.push(other.clone());
        combined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_set_is_empty() {
        assert!(PatternSet::new().is_empty());
    }

    #[test]
    fn builder_records_patterns_in_order() {
        let set = PatternSet::new()
            .include("**/*.java")
            .include("**/*.kt")
            .exclude("**/generated/**");
        assert_eq!(set.includes(), ["**/*.java", "**/*.kt"]);
        assert_eq!(set.excludes(), ["**/generated/**"]);
        assert!(!set.is_empty());
    }

    #[test]
    fn intersect_with_empty_is_identity() {
        let set = PatternSet::new().include("*.txt");
        assert_eq!(set.intersect(&PatternSet::new()), set);
        assert_eq!(PatternSet::new().intersect(&set), set);
    }

    #[test]
    fn intersect_keeps_both_constraints() {
        let a = PatternSet::new().include("src/**");
        let b = PatternSet::new().exclude("**/*.tmp");
        let both = a.intersect(&b);
        assert_eq!(both.includes(), ["src/**"]);
        assert_eq!(both.intersections(), [b]);
    }

    #[test]
    fn intersection_of_empty_sets_is_empty() {
        let mut set = PatternSet::new();
        set.intersections.push(PatternSet::new());
        assert!(set.is_empty());
    }
}
