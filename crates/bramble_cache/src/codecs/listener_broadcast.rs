//! Encodes a [`ListenerBroadcast`] as its interface name and its listeners.

use std::sync::Arc;

use bramble_common::Object;
use bramble_model::{BroadcasterFactory, ListenerBroadcast};

use crate::codec::{downcast, Codec};
use crate::context::{PropertyKind, ReadContext, SessionContext, WriteContext};
use crate::error::SerializationError;

/// The codec for [`ListenerBroadcast`] values.
///
/// Listeners are written through general dispatch, in registration order,
/// duplicates included.
pub struct ListenerBroadcastCodec {
    factory: Arc<dyn BroadcasterFactory>,
}

impl ListenerBroadcastCodec {
    /// Creates the codec, creating broadcasts with `factory`.
    pub fn new(factory: Arc<dyn BroadcasterFactory>) -> Self {
        Self { factory }
    }
}

impl Codec for ListenerBroadcastCodec {
    fn encode(&self, ctx: &mut WriteContext<'_>, value: &Object) -> Result<(), SerializationError> {
        let broadcast = downcast::<ListenerBroadcast>(value)?;
        ctx.encode_preserving_identity(value, |ctx| {
            ctx.write_raw(broadcast.interface())?;
            let listeners = broadcast.listeners();
            ctx.write_raw(&listeners.len())?;
            ctx.with_property_trace(
                PropertyKind::Property,
                "listeners",
                broadcast.interface(),
                |ctx| {
                    for listener in &listeners {
                        ctx.write(Some(listener))?;
                    }
                    Ok(())
                },
            )
        })
    }

    fn decode(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Object>, SerializationError> {
        ctx.decode_preserving_identity(|ctx, _id| {
            let interface: String = ctx.read_raw()?;
            let broadcast = self.factory.create_anonymous_broadcaster(&interface)?;
            let len: usize = ctx.read_raw()?;
            ctx.with_property_trace(PropertyKind::Property, "listeners", &interface, |ctx| {
                for _ in 0..len {
                    broadcast.add(ctx.read_non_null("listener")?);
                }
                Ok(())
            })?;
            Ok(Object::new(broadcast))
        })
        .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionScope;
    use crate::registry::CodecRegistry;
    use bramble_common::CancellationToken;
    use bramble_diagnostics::ProblemSink;
    use bramble_model::ListenerManager;

    fn registry() -> CodecRegistry {
        CodecRegistry::builder()
            .with_builtin_codecs()
            .with_listener_broadcasts(Arc::new(ListenerManager::new().register("BuildListener")))
            .build()
    }

    fn encode(registry: &CodecRegistry, value: &Object) -> Result<Vec<u8>, SerializationError> {
        let sink = ProblemSink::new();
        let cancel = CancellationToken::new();
        let mut ctx = WriteContext::new(SessionScope::new(registry, &sink, &cancel));
        ctx.write(Some(value))?;
        Ok(ctx.into_bytes())
    }

    fn decode(registry: &CodecRegistry, bytes: &[u8]) -> Result<Option<Object>, SerializationError> {
        let sink = ProblemSink::new();
        let cancel = CancellationToken::new();
        ReadContext::new(SessionScope::new(registry, &sink, &cancel), bytes).read()
    }

    #[test]
    fn empty_broadcast() {
        let registry = registry();
        let bytes = encode(&registry, &Object::new(ListenerBroadcast::new("BuildListener"))).unwrap();
        let decoded = decode(&registry, &bytes).unwrap().unwrap();
        let decoded = decoded.downcast_ref::<ListenerBroadcast>().unwrap();
        assert_eq!(decoded.interface(), "BuildListener");
        assert!(decoded.is_empty());
    }

    #[test]
    fn listeners_in_order() {
        let registry = registry();
        let broadcast = ListenerBroadcast::new("BuildListener");
        for name in ["a", "b", "c"] {
            broadcast.add(Object::new(name.to_string()));
        }
        let bytes = encode(&registry, &Object::new(broadcast)).unwrap();
        let decoded = decode(&registry, &bytes).unwrap().unwrap();
        let mut names = Vec::new();
        decoded
            .downcast_ref::<ListenerBroadcast>()
            .unwrap()
            .dispatch(|name: &String| names.push(name.clone()));
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn unsupported_listener_names_the_interface() {
        #[derive(Debug)]
        struct Opaque;

        let registry = registry();
        let broadcast = ListenerBroadcast::new("BuildListener");
        broadcast.add(Object::new(Opaque));
        let err = encode(&registry, &Object::new(broadcast)).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("property `listeners` of `BuildListener`: error writing value"),
            "{err}"
        );
    }

    #[test]
    fn unknown_interface_is_rejected_on_read() {
        let registry = registry();
        let bytes = encode(&registry, &Object::new(ListenerBroadcast::new("Other"))).unwrap();
        let err = decode(&registry, &bytes).unwrap_err();
        assert_eq!(err.to_string(), "unknown listener type 'Other'");
    }
}
