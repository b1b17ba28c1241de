//! Problem codes with category prefixes for structured problem identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a problem code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Problems that prevented a value from being stored, prefixed with `E`.
    Error,
    /// Problems with values that were stored best-effort, prefixed with `W`.
    Warning,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
        }
    }
}

/// A structured problem code combining a category prefix and a numeric identifier.
///
/// Displayed as the category prefix followed by a zero-padded 3-digit number,
/// e.g. `W101`, `E102`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ProblemCode {
    /// The category of this problem.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl ProblemCode {
    /// A field whose declared type is known not to survive a cache round trip.
    pub const UNSUPPORTED_FIELD_TYPE: ProblemCode = ProblemCode::new(Category::Warning, 101);

    /// A value of a type with no registered codec.
    pub const UNSUPPORTED_TYPE: ProblemCode = ProblemCode::new(Category::Error, 101);

    /// A file tree that cannot be reduced to a reconstructable spec.
    pub const UNSUPPORTED_TREE_KIND: ProblemCode = ProblemCode::new(Category::Error, 102);

    /// Any other failure while storing or loading a value.
    pub const SERIALIZATION_FAILURE: ProblemCode = ProblemCode::new(Category::Error, 103);

    /// Creates a new problem code.
    pub const fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for ProblemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Error.prefix(), 'E');
        assert_eq!(Category::Warning.prefix(), 'W');
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", ProblemCode::UNSUPPORTED_FIELD_TYPE), "W101");
        assert_eq!(format!("{}", ProblemCode::UNSUPPORTED_TREE_KIND), "E102");
        assert_eq!(format!("{}", ProblemCode::new(Category::Warning, 3)), "W003");
    }

    #[test]
    fn serde_roundtrip() {
        let code = ProblemCode::SERIALIZATION_FAILURE;
        let json = serde_json::to_string(&code).unwrap();
        let back: ProblemCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
