//! Sessions over a codec registry, and committing their results.

use std::path::Path;
use std::sync::Arc;

use bramble_common::{CancellationToken, Object};
use bramble_config::{CacheSettings, ProblemPolicy};
use bramble_diagnostics::{Problem, ProblemCode, ProblemSink};
use bramble_model::{ConventionProvider, NoConventions};
use rayon::prelude::*;

use crate::context::{ReadContext, SessionContext, SessionScope, WriteContext};
use crate::error::{CacheError, SerializationError};
use crate::registry::CodecRegistry;
use crate::store::EntryStore;

/// The encoded bytes of a session and the number of problems it reported.
#[derive(Debug, Clone)]
pub struct Encoded {
    /// The encoded value.
    pub bytes: Vec<u8>,
    /// Problems reported while encoding.
    pub problems: usize,
}

/// Stores and loads configuration model values.
///
/// Every [`encode`](Self::encode), [`decode`](Self::decode),
/// [`store`](Self::store) and [`load`](Self::load) call is one session with
/// its own identity table and property trace. Sessions share nothing
/// mutable, so [`store_all`](Self::store_all) runs them on a worker pool.
pub struct ConfigurationCache {
    registry: Arc<CodecRegistry>,
    conventions: Arc<dyn ConventionProvider>,
    problems: Arc<ProblemSink>,
    cancel: CancellationToken,
    settings: CacheSettings,
    store: EntryStore,
}

impl ConfigurationCache {
    /// Creates a cache storing entries under `project_dir` as configured.
    pub fn new(registry: Arc<CodecRegistry>, project_dir: &Path, settings: CacheSettings) -> Self {
        let store = EntryStore::new(&project_dir.join(&settings.dir));
        Self {
            registry,
            conventions: Arc::new(NoConventions),
            problems: Arc::new(ProblemSink::new()),
            cancel: CancellationToken::new(),
            settings,
            store,
        }
    }

    /// Uses `conventions` for bean fields that were not set explicitly.
    pub fn with_conventions(mut self, conventions: Arc<dyn ConventionProvider>) -> Self {
        self.conventions = conventions;
        self
    }

    /// Reports problems to `problems` instead of a private sink.
    pub fn with_problem_sink(mut self, problems: Arc<ProblemSink>) -> Self {
        self.problems = problems;
        self
    }

    /// Aborts sessions when `cancel` is cancelled.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The problems reported by all sessions so far.
    pub fn problems(&self) -> &ProblemSink {
        &self.problems
    }

    /// The token that cancels running sessions.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The committed entries.
    pub fn entries(&self) -> &EntryStore {
        &self.store
    }

    /// The codec registry.
    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    fn scope(&self) -> SessionScope<'_> {
        SessionScope::new(&self.registry, &self.problems, &self.cancel)
            .with_conventions(self.conventions.as_ref())
            .with_settings(&self.settings)
    }

    /// Encodes `value` in a new session.
    pub fn encode(&self, value: &Object) -> Result<Encoded, SerializationError> {
        let mut ctx = WriteContext::new(self.scope());
        if let Err(e) = ctx.write(Some(value)) {
            return Err(self.fail(e));
        }
        let problems = ctx.problems_reported();
        let identities = ctx.identities().len();
        let bytes = ctx.into_bytes();
        tracing::debug!(
            type_name = value.type_name(),
            bytes = bytes.len(),
            identities,
            problems,
            "encoded value"
        );
        Ok(Encoded { bytes, problems })
    }

    /// Decodes a value in a new session.
    pub fn decode(&self, bytes: &[u8]) -> Result<Option<Object>, SerializationError> {
        let mut ctx = ReadContext::new(self.scope(), bytes);
        let value = match ctx.read() {
            Ok(value) => value,
            Err(e) => return Err(self.fail(e)),
        };
        if ctx.remaining() != 0 {
            return Err(self.fail(SerializationError::Failed {
                message: format!("{} trailing bytes after value", ctx.remaining()),
            }));
        }
        tracing::debug!(
            bytes = bytes.len(),
            identities = ctx.identities().len(),
            "decoded value"
        );
        Ok(value)
    }

    /// Encodes `value` and commits it under `key`.
    ///
    /// Nothing is committed if encoding fails, or if the session reported
    /// problems and the problem policy is [`ProblemPolicy::Fail`].
    pub fn store(&self, key: &str, value: &Object) -> Result<(), CacheError> {
        let encoded = self.encode(value)?;
        if encoded.problems > 0 && self.settings.problems == ProblemPolicy::Fail {
            return Err(CacheError::Problems {
                count: encoded.problems,
            });
        }
        let path = self
            .store
            .write_entry(key, self.registry.fingerprint(), &encoded.bytes)?;
        tracing::info!(key, path = %path.display(), bytes = encoded.bytes.len(), "stored cache entry");
        Ok(())
    }

    /// Loads the value committed under `key`.
    ///
    /// A missing or unusable entry is a miss, not an error.
    pub fn load(&self, key: &str) -> Result<Option<Object>, CacheError> {
        let Some(bytes) = self.store.read_entry(key, self.registry.fingerprint()) else {
            tracing::debug!(key, "cache miss");
            return Ok(None);
        };
        Ok(self.decode(&bytes)?)
    }

    /// Stores several independent values on a pool of `workers` threads.
    ///
    /// Each value is its own session: the result for one entry does not
    /// affect the others. Results are returned in input order.
    pub fn store_all(
        &self,
        entries: &[(String, Object)],
    ) -> Result<Vec<Result<(), CacheError>>, CacheError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.workers)
            .build()?;
        Ok(pool.install(|| {
            entries
                .par_iter()
                .map(|(key, value)| self.store(key, value))
                .collect()
        }))
    }

    /// Reports a fatal session failure, unless it was reported already.
    fn fail(&self, error: SerializationError) -> SerializationError {
        if matches!(
            error.root_cause(),
            SerializationError::AlreadyReported { .. } | SerializationError::Cancelled
        ) {
            tracing::debug!(error = %error, "session aborted");
            return error;
        }
        let code = match error.root_cause() {
            SerializationError::UnsupportedType { .. } => ProblemCode::UNSUPPORTED_TYPE,
            SerializationError::UnsupportedTreeKind { .. } => ProblemCode::UNSUPPORTED_TREE_KIND,
            _ => ProblemCode::SERIALIZATION_FAILURE,
        };
        let problem = match &error {
            SerializationError::Property {
                description,
                type_name,
                source,
                ..
            } => Problem::error(code, error.to_string(), description.clone())
                .with_type(type_name.clone())
                .with_note(format!("caused by: {}", source.root_cause())),
            _ => Problem::error(code, error.to_string(), "value"),
        };
        self.problems.emit(problem);
        tracing::debug!(error = %error, "session failed");
        error
    }
}
