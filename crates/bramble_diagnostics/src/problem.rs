//! Structured problem reports with severity, codes, locations, and notes.

use crate::code::ProblemCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured report of something that went wrong while storing or loading
/// a configuration cache entry.
///
/// Each problem includes:
/// - A severity level and problem code
/// - A primary message
/// - The property path being processed when the problem was found
/// - The runtime type of the offending value, when known
/// - Optional notes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    /// The severity level of this problem.
    pub severity: Severity,
    /// The code identifying the kind of problem.
    pub code: ProblemCode,
    /// The main problem message.
    pub message: String,
    /// Description of the property being processed, e.g. ``field `source` of `Compile` ``.
    pub location: String,
    /// Name of the runtime type of the offending value.
    pub type_name: Option<String>,
    /// Explanatory footnotes (e.g., "caused by: ...").
    pub notes: Vec<String>,
}

impl Problem {
    /// Creates a new error problem with the given code, message, and location.
    pub fn error(code: ProblemCode, message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message.into(), location.into())
    }

    /// Creates a new warning problem with the given code, message, and location.
    pub fn warning(
        code: ProblemCode,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warning, code, message.into(), location.into())
    }

    fn new(severity: Severity, code: ProblemCode, message: String, location: String) -> Self {
        Self {
            severity,
            code,
            message,
            location,
            type_name: None,
            notes: Vec::new(),
        }
    }

    /// Records the runtime type of the offending value.
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Adds a note to this problem.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}
