use bramble_common::Object;
use serde::de::DeserializeOwned;

use super::identity::{ReadIdentities, ReadIdentity};
use super::{SessionContext, SessionScope, SessionState, NULL_TAG};
use crate::error::{Direction, SerializationError};

/// The context of a decoding session.
pub struct ReadContext<'a> {
    scope: SessionScope<'a>,
    state: SessionState,
    input: &'a [u8],
    pos: usize,
    identities: ReadIdentities,
}

impl<'a> ReadContext<'a> {
    /// Starts a session reading `input` from the beginning.
    pub fn new(scope: SessionScope<'a>, input: &'a [u8]) -> Self {
        Self {
            scope,
            state: SessionState::default(),
            input,
            pos: 0,
            identities: ReadIdentities::default(),
        }
    }

    /// Reads a value, or null, through the codec named by its tag.
    pub fn read(&mut self) -> Result<Option<Object>, SerializationError> {
        self.check_cancelled()?;
        let tag: u32 = self.read_raw()?;
        if tag == NULL_TAG {
            return Ok(None);
        }
        let registry = self.scope.registry;
        let Some(binding) = registry.binding_by_tag(tag) else {
            let error = SerializationError::UnknownTag { tag };
            return Err(self.attribute(error, Direction::Reading, "<unknown>"));
        };
        binding
            .codec()
            .decode(self)
            .map_err(|e| self.attribute(e, Direction::Reading, binding.name()))
    }

    /// Reads a value that must not be null.
    pub fn read_non_null(&mut self, what: &str) -> Result<Object, SerializationError> {
        self.read()?.ok_or_else(|| SerializationError::NullValue {
            what: what.to_string(),
        })
    }

    /// Mirrors [`WriteContext::encode_preserving_identity`].
    ///
    /// A reference returns the instance decoded earlier. A new identity runs
    /// `body` and registers its result before returning it.
    ///
    /// [`WriteContext::encode_preserving_identity`]: super::WriteContext::encode_preserving_identity
    pub fn decode_preserving_identity(
        &mut self,
        body: impl FnOnce(&mut Self, u32) -> Result<Object, SerializationError>,
    ) -> Result<Object, SerializationError> {
        let id: u32 = self.read_raw()?;
        match self.identities.resolve(id)? {
            ReadIdentity::Known(value) => Ok(value),
            ReadIdentity::New(id) => {
                let value = body(self, id)?;
                self.identities.put_instance(id, value.clone());
                Ok(value)
            }
        }
    }

    /// Reads a plain serde value written by [`WriteContext::write_raw`].
    ///
    /// [`WriteContext::write_raw`]: super::WriteContext::write_raw
    pub fn read_raw<T: DeserializeOwned>(&mut self) -> Result<T, SerializationError> {
        let (value, len) = bincode::serde::decode_from_slice(
            &self.input[self.pos..],
            bincode::config::standard(),
        )?;
        self.pos += len;
        Ok(value)
    }

    /// The identities resolved so far.
    pub fn identities(&self) -> &ReadIdentities {
        &self.identities
    }

    /// Number of bytes not yet read.
    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }
}

impl SessionContext for ReadContext<'_> {
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
