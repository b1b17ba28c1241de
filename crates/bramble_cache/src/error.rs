//! Error types for serialization sessions and cache operations.

use std::fmt;
use std::path::PathBuf;

use bramble_model::UnknownListenerType;

/// Whether a value was being written or read when a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Encoding a value.
    Writing,
    /// Decoding a value.
    Reading,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Writing => write!(f, "writing"),
            Direction::Reading => write!(f, "reading"),
        }
    }
}

/// Errors raised while encoding or decoding an object graph.
///
/// Failures inside a nested value are attributed to the property being
/// processed by wrapping them in [`SerializationError::Property`]. Stream
/// faults, already reported problems, already attributed failures and
/// cancellation pass through unchanged (see [`is_pass_through`]).
///
/// [`is_pass_through`]: SerializationError::is_pass_through
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// The output stream could not be written.
    #[error("failed to write cache stream: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// The input stream is truncated or malformed.
    #[error("failed to read cache stream: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// The session reported more problems than it is allowed to.
    #[error("too many configuration cache problems ({count} reported)")]
    AlreadyReported {
        /// Number of problems the session reported.
        count: usize,
    },

    /// A failure attributed to the property being processed.
    #[error("{description}: error {direction} value of type '{type_name}'")]
    Property {
        /// Description of the property, e.g. ``field `source` of `Compile` ``.
        description: String,
        /// Whether the value was being written or read.
        direction: Direction,
        /// Runtime type of the offending value.
        type_name: String,
        /// The original failure.
        #[source]
        source: Box<SerializationError>,
    },

    /// No codec is registered for the runtime type of a value.
    #[error("no codec registered for type '{type_name}'")]
    UnsupportedType {
        /// The unregistered type.
        type_name: String,
    },

    /// The stream names a codec this registry does not have.
    #[error("unknown codec tag {tag}")]
    UnknownTag {
        /// The tag read from the stream.
        tag: u32,
    },

    /// A file tree could not be reduced to a reconstructable spec.
    #[error("cannot create spec for file tree '{tree}' of type '{type_name}'")]
    UnsupportedTreeKind {
        /// Display name of the tree.
        tree: String,
        /// Runtime type of the tree.
        type_name: String,
    },

    /// A decoded value does not fit the field it is assigned to.
    #[error("field `{field}` of `{owner}` expects '{expected}', got '{actual}'")]
    FieldType {
        /// The bean type.
        owner: String,
        /// The field name.
        field: String,
        /// The declared type of the field.
        expected: String,
        /// The runtime type of the decoded value.
        actual: String,
    },

    /// An object refers back to itself before its own payload is complete.
    #[error("cyclic reference to object #{id}")]
    CyclicReference {
        /// The identity of the object still being processed.
        id: u32,
    },

    /// The stream refers to an identity that was never defined.
    #[error("reference to unknown object #{id}")]
    UnknownReference {
        /// The undefined identity.
        id: u32,
    },

    /// A value that must be present was null.
    #[error("unexpected null {what}")]
    NullValue {
        /// What was null.
        what: String,
    },

    /// The broadcaster factory does not know a listener interface.
    #[error(transparent)]
    UnknownListenerType(#[from] UnknownListenerType),

    /// The session was cancelled.
    #[error("serialization cancelled")]
    Cancelled,

    /// Any other failure.
    #[error("{message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

impl SerializationError {
    /// Returns `true` for failures that propagate without being attributed to
    /// the enclosing property.
    pub fn is_pass_through(&self) -> bool {
        matches!(
            self,
            SerializationError::Encode(_)
                | SerializationError::Decode(_)
                | SerializationError::AlreadyReported { .. }
                | SerializationError::Property { .. }
                | SerializationError::Cancelled
        )
    }

    /// Returns the innermost failure, looking through property attribution.
    pub fn root_cause(&self) -> &SerializationError {
        let mut current = self;
        while let SerializationError::Property { source, .. } = current {
            current = source;
        }
        current
    }

    /// Attributes `self` to the property described by `description`, unless
    /// it passes through.
    pub(crate) fn attribute(
        self,
        description: String,
        direction: Direction,
        type_name: &str,
    ) -> SerializationError {
        if self.is_pass_through() {
            return self;
        }
        SerializationError::Property {
            description,
            direction,
            type_name: type_name.to_string(),
            source: Box::new(self),
        }
    }
}

/// Errors that can occur while storing or loading cache entries.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing an entry file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The value could not be encoded or decoded.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// The entry was not committed because its session reported problems.
    #[error("entry not stored: {count} configuration cache problem(s) reported")]
    Problems {
        /// Number of problems the session reported.
        count: usize,
    },

    /// The entry key cannot be used as a file name.
    #[error("invalid cache key '{key}'")]
    InvalidKey {
        /// The rejected key.
        key: String,
    },

    /// The worker pool for batch sessions could not be started.
    #[error("failed to start cache workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsupported() -> SerializationError {
        SerializationError::UnsupportedType {
            type_name: "app::Handle".to_string(),
        }
    }

    #[test]
    fn property_display() {
        let err = unsupported().attribute(
            "field `handle` of `Compile`".to_string(),
            Direction::Writing,
            "app::Handle",
        );
        assert_eq!(
            err.to_string(),
            "field `handle` of `Compile`: error writing value of type 'app::Handle'"
        );
    }

    #[test]
    fn attribution_is_applied_once() {
        let inner = unsupported().attribute(
            "field `a` of `Inner`".to_string(),
            Direction::Reading,
            "app::Handle",
        );
        let outer = inner.attribute("field `b` of `Outer`".to_string(), Direction::Reading, "Inner");
        assert!(outer.to_string().starts_with("field `a` of `Inner`: error reading"));
        assert!(matches!(
            outer.root_cause(),
            SerializationError::UnsupportedType { .. }
        ));
    }

    #[test]
    fn pass_through_kinds() {
        assert!(SerializationError::Cancelled.is_pass_through());
        assert!(SerializationError::AlreadyReported { count: 3 }.is_pass_through());
        assert!(!unsupported().is_pass_through());
        assert!(!SerializationError::CyclicReference { id: 0 }.is_pass_through());
    }

    #[test]
    fn unsupported_tree_kind_display() {
        let err = SerializationError::UnsupportedTreeKind {
            tree: "file '/a'".to_string(),
            type_name: "app::Custom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "cannot create spec for file tree 'file '/a'' of type 'app::Custom'"
        );
    }

    #[test]
    fn cache_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cc/entry.bin"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        };
        assert!(err.to_string().contains("cache I/O error"));
        assert!(err.to_string().contains("entry.bin"));

        let err = CacheError::Problems { count: 2 };
        assert_eq!(
            err.to_string(),
            "entry not stored: 2 configuration cache problem(s) reported"
        );
    }

    #[test]
    fn serialization_error_converts() {
        let err: CacheError = SerializationError::Cancelled.into();
        assert_eq!(err.to_string(), "serialization cancelled");
    }
}
