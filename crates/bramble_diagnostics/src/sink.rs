//! Thread-safe problem accumulator shared by concurrent cache sessions.

use crate::problem::Problem;
use std::sync::{Mutex, PoisonError};

/// A thread-safe accumulator for problems reported during cache sessions.
///
/// Sessions running on different worker threads can report problems
/// concurrently via [`emit`](Self::emit).
pub struct ProblemSink {
    problems: Mutex<Vec<Problem>>,
}

impl ProblemSink {
    /// Creates a new empty problem sink.
    pub fn new() -> Self {
        Self {
            problems: Mutex::new(Vec::new()),
        }
    }

    /// Emits a problem into the sink.
    pub fn emit(&self, problem: Problem) {
        let mut problems = self.problems.lock().unwrap_or_else(PoisonError::into_inner);
        problems.push(problem);
    }

    /// Returns the number of problems currently held by the sink.
    pub fn len(&self) -> usize {
        self.problems
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the sink holds no problems.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a snapshot of all accumulated problems, in emission order.
    pub fn problems(&self) -> Vec<Problem> {
        let problems = self.problems.lock().unwrap_or_else(PoisonError::into_inner);
        problems.clone()
    }
}

impl Default for ProblemSink {
    fn default() -> Self {
        Self::new()
    }
}
