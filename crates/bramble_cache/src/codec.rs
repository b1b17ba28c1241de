//! The codec protocol.

use std::marker::PhantomData;

use bramble_common::Object;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::context::{ReadContext, WriteContext};
use crate::error::SerializationError;

/// Encodes and decodes the values of one runtime type.
///
/// Codecs are registered in a [`CodecRegistry`](crate::CodecRegistry) and
/// shared by every session, so they hold no per-session state. Nested values
/// are written and read back through the context, which dispatches them to
/// their own codecs.
pub trait Codec: Send + Sync {
    /// Writes the payload of `value`.
    ///
    /// `value` is guaranteed to be of the type the codec is registered for.
    fn encode(&self, ctx: &mut WriteContext<'_>, value: &Object) -> Result<(), SerializationError>;

    /// Reads back a payload written by [`encode`](Self::encode).
    ///
    /// `None` means the payload describes no value.
    fn decode(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Object>, SerializationError>;
}

/// A codec for plain serde values, which carry no identity.
pub struct SerdeCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeCodec<T> {
    /// Creates the codec.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Codec for SerdeCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn encode(&self, ctx: &mut WriteContext<'_>, value: &Object) -> Result<(), SerializationError> {
        ctx.write_raw(downcast::<T>(value)?)
    }

    fn decode(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Object>, SerializationError> {
        let value: T = ctx.read_raw()?;
        Ok(Some(Object::new(value)))
    }
}

/// Borrows `value` as the type a codec is registered for.
pub(crate) fn downcast<T: 'static>(value: &Object) -> Result<&T, SerializationError> {
    value
        .downcast_ref::<T>()
        .ok_or_else(|| SerializationError::Failed {
            message: format!(
                "codec for '{}' received a value of type '{}'",
                std::any::type_name::<T>(),
                value.type_name()
            ),
        })
}
