//! Serialization contexts.
//!
//! A context is created per session (one full encode or decode of a value)
//! and owns everything the session mutates: the byte stream, the identity
//! table, the [`PropertyTrace`] and the debug frames. Everything it only reads
//! is borrowed through a [`SessionScope`], which is what lets many sessions
//! run side by side on a worker pool without locks.

mod identity;
mod read;
mod trace;
mod write;

pub use identity::{ReadIdentities, ReadIdentity, WriteIdentities, WriteIdentity};
pub use read::ReadContext;
pub use trace::{short_type_name, PropertyKind, PropertyTrace, TraceEntry};
pub use write::WriteContext;

use bramble_common::CancellationToken;
use bramble_config::CacheSettings;
use bramble_diagnostics::{Problem, ProblemSink};
use bramble_model::{ConventionProvider, NoConventions};

use crate::error::{Direction, SerializationError};
use crate::registry::CodecRegistry;

/// Tag written in place of a codec tag for an absent value.
pub(crate) const NULL_TAG: u32 = 0;

/// The collaborators a session reads but never mutates.
#[derive(Clone, Copy)]
pub struct SessionScope<'a> {
    /// Resolves codecs by runtime type and by tag.
    pub registry: &'a CodecRegistry,
    /// Consulted for bean fields that were not set explicitly.
    pub conventions: &'a dyn ConventionProvider,
    /// Receives problems reported by the session.
    pub problems: &'a ProblemSink,
    /// Polled before every nested value.
    pub cancel: &'a CancellationToken,
    /// Whether debug frames are recorded.
    pub debug_frames: bool,
    /// Number of problems after which the session is aborted.
    pub max_problems: usize,
}

impl<'a> SessionScope<'a> {
    /// Creates a scope without conventions and with default limits.
    pub fn new(
        registry: &'a CodecRegistry,
        problems: &'a ProblemSink,
        cancel: &'a CancellationToken,
    ) -> Self {
        let defaults = CacheSettings::default();
        Self {
            registry,
            conventions: &NoConventions,
            problems,
            cancel,
            debug_frames: defaults.debug_frames,
            max_problems: defaults.max_problems,
        }
    }

    /// Uses `conventions` for fields that were not set explicitly.
    pub fn with_conventions(mut self, conventions: &'a dyn ConventionProvider) -> Self {
        self.conventions = conventions;
        self
    }

    /// Applies the session-related cache settings.
    pub fn with_settings(mut self, settings: &CacheSettings) -> Self {
        self.debug_frames = settings.debug_frames;
        self.max_problems = settings.max_problems;
        self
    }
}

/// Session state shared by write and read contexts.
#[derive(Debug, Default)]
pub struct SessionState {
    trace: PropertyTrace,
    frames: Vec<String>,
    reported: usize,
}

/// Operations common to [`WriteContext`] and [`ReadContext`].
pub trait SessionContext {
    /// The collaborators of the session.
    fn scope(&self) -> SessionScope<'_>;

    /// The state of the session.
    fn state(&self) -> &SessionState;

    /// The state of the session, mutably.
    fn state_mut(&mut self) -> &mut SessionState;

    /// The properties enclosing the value being processed.
    fn trace(&self) -> &PropertyTrace {
        &self.state().trace
    }

    /// The debug frames entered, outermost first.
    fn debug_frames(&self) -> &[String] {
        &self.state().frames
    }

    /// Number of problems this session reported.
    fn problems_reported(&self) -> usize {
        self.state().reported
    }

    /// Fails with [`SerializationError::Cancelled`] once the session is cancelled.
    fn check_cancelled(&self) -> Result<(), SerializationError> {
        if self.scope().cancel.is_cancelled() {
            return Err(SerializationError::Cancelled);
        }
        Ok(())
    }

    /// Runs `body` with a trace entry for the named property pushed.
    ///
    /// The entry is popped however `body` returns.
    fn with_property_trace<R>(
        &mut self,
        kind: PropertyKind,
        name: &'static str,
        owner: &str,
        body: impl FnOnce(&mut Self) -> Result<R, SerializationError>,
    ) -> Result<R, SerializationError>
    where
        Self: Sized,
    {
        self.state_mut().trace.push(kind, name, owner);
        let result = body(self);
        self.state_mut().trace.pop();
        result
    }

    /// Runs `body` inside a debug frame.
    ///
    /// Frames are only recorded when the scope enables them, and never
    /// change what is written.
    fn with_debug_frame<R>(
        &mut self,
        label: impl FnOnce() -> String,
        body: impl FnOnce(&mut Self) -> Result<R, SerializationError>,
    ) -> Result<R, SerializationError>
    where
        Self: Sized,
    {
        if !self.scope().debug_frames {
            return body(self);
        }
        let label = label();
        tracing::trace!(frame = %label, depth = self.state().frames.len(), "entering debug frame");
        self.state_mut().frames.push(label);
        let result = body(self);
        self.state_mut().frames.pop();
        result
    }

    /// Reports a problem to the sink.
    ///
    /// Fails with [`SerializationError::AlreadyReported`] once the session
    /// reported more problems than it is allowed to.
    fn report_problem(&mut self, problem: Problem) -> Result<(), SerializationError> {
        let scope = self.scope();
        scope.problems.emit(problem);
        let max_problems = scope.max_problems;
        let state = self.state_mut();
        state.reported += 1;
        if state.reported > max_problems {
            return Err(SerializationError::AlreadyReported {
                count: state.reported,
            });
        }
        Ok(())
    }

    /// Attributes a failure to the innermost property of the trace.
    ///
    /// Failures at the top level of a session are returned unchanged.
    fn attribute(
        &self,
        error: SerializationError,
        direction: Direction,
        type_name: &str,
    ) -> SerializationError {
        let trace = self.trace();
        if trace.is_empty() {
            return error;
        }
        error.attribute(trace.description(), direction, type_name)
    }
}
