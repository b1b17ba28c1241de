//! The path of properties currently being processed.

use std::fmt;

/// What kind of property a trace entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A field of a bean.
    Field,
    /// A property exposed by a dedicated codec.
    Property,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Field => write!(f, "field"),
            PropertyKind::Property => write!(f, "property"),
        }
    }
}

/// One entry of a [`PropertyTrace`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// What kind of property this is.
    pub kind: PropertyKind,
    /// The property name.
    pub name: &'static str,
    /// Short name of the type declaring the property.
    pub owner: String,
}

/// An ordered stack of the properties enclosing the value being processed.
///
/// Used only to attribute errors and problems.
#[derive(Debug, Default)]
pub struct PropertyTrace {
    entries: Vec<TraceEntry>,
}

impl PropertyTrace {
    /// Pushes an entry.
    pub fn push(&mut self, kind: PropertyKind, name: &'static str, owner: &str) {
        self.entries.push(TraceEntry {
            kind,
            name,
            owner: short_type_name(owner),
        });
    }

    /// Pops the innermost entry.
    pub fn pop(&mut self) {
        self.entries.pop();
    }

    /// Returns `true` at the top level of a session.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries on the stack.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// The entries, outermost first.
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Describes the innermost property, e.g. ``field `source` of `Compile` ``.
    pub fn description(&self) -> String {
        match self.entries.last() {
            Some(entry) => format!("{} `{}` of `{}`", entry.kind, entry.name, entry.owner),
            None => "value".to_string(),
        }
    }
}

/// Strips module paths from every path in a type name.
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
pub fn short_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut segment_start = 0;
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
        } else {
            out.push(c);
            if !(c.is_alphanumeric() || c == '_') {
                segment_start = out.len();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trace_describes_value() {
        let trace = PropertyTrace::default();
        assert!(trace.is_empty());
        assert_eq!(trace.description(), "value");
    }

    #[test]
    fn description_names_innermost_entry() {
        let mut trace = PropertyTrace::default();
        trace.push(PropertyKind::Field, "compile", "app::tasks::Build");
        trace.push(PropertyKind::Field, "source", "app::tasks::Compile");
        assert_eq!(trace.description(), "field `source` of `Compile`");
        trace.pop();
        assert_eq!(trace.description(), "field `compile` of `Build`");
        assert_eq!(trace.depth(), 1);
    }

    #[test]
    fn short_names() {
        assert_eq!(short_type_name("app::Compile"), "Compile");
        assert_eq!(short_type_name("i64"), "i64");
        assert_eq!(
            short_type_name("alloc::vec::Vec<alloc::string::String>"),
            "Vec<String>"
        );
        assert_eq!(
            short_type_name("core::option::Option<std::path::PathBuf>"),
            "Option<PathBuf>"
        );
    }
}
