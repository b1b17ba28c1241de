use bramble_common::Object;
use bramble_model::ConventionProvider;
use serde::Serialize;

use super::identity::{WriteIdentities, WriteIdentity};
use super::{SessionContext, SessionScope, SessionState, NULL_TAG};
use crate::error::{Direction, SerializationError};

/// The context of an encoding session.
pub struct WriteContext<'a> {
    scope: SessionScope<'a>,
    state: SessionState,
    out: Vec<u8>,
    identities: WriteIdentities,
}

impl<'a> WriteContext<'a> {
    /// Starts a session writing into an empty buffer.
    pub fn new(scope: SessionScope<'a>) -> Self {
        Self {
            scope,
            state: SessionState::default(),
            out: Vec::new(),
            identities: WriteIdentities::default(),
        }
    }

    /// Writes a value, or null, through the codec registered for its type.
    pub fn write(&mut self, value: Option<&Object>) -> Result<(), SerializationError> {
        self.check_cancelled()?;
        let Some(value) = value else {
            return self.write_raw(&NULL_TAG);
        };
        let registry = self.scope.registry;
        let result = match registry.binding_for(value.runtime_type()) {
            Some(binding) => self
                .write_raw(&binding.tag())
                .and_then(|()| binding.codec().encode(self, value)),
            None => Err(SerializationError::UnsupportedType {
                type_name: value.type_name().to_string(),
            }),
        };
        result.map_err(|e| self.attribute(e, Direction::Writing, value.type_name()))
    }

    /// Writes `value` once per session.
    ///
    /// The first time `value` is seen it is assigned a new identity and
    /// `body` writes its payload; later occurrences only write a reference.
    pub fn encode_preserving_identity(
        &mut self,
        value: &Object,
        body: impl FnOnce(&mut Self) -> Result<(), SerializationError>,
    ) -> Result<(), SerializationError> {
        match self.identities.get_or_assign(value)? {
            WriteIdentity::Known(id) => self.write_raw(&id),
            WriteIdentity::New(id) => {
                self.write_raw(&id)?;
                body(self)?;
                self.identities.complete(value);
                Ok(())
            }
        }
    }

    /// Writes a plain serde value with no tag or identity.
    pub fn write_raw<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), SerializationError> {
        bincode::serde::encode_into_std_write(value, &mut self.out, bincode::config::standard())?;
        Ok(())
    }

    /// The convention provider of the session.
    pub fn conventions(&self) -> &'a dyn ConventionProvider {
        self.scope.conventions
    }

    /// The identities assigned so far.
    pub fn identities(&self) -> &WriteIdentities {
        &self.identities
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// Returns `true` if nothing was written.
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Ends the session and returns the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

impl SessionContext for WriteContext<'_> {
    fn scope(&self) -> SessionScope<'_> {
        self.scope
    }

    fn state(&self) -> &SessionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }
}
