//! Codecs for leaf values and plain collections.

use std::path::PathBuf;

use bramble_common::Object;
use bramble_model::{FileCollection, PatternSet, SingletonFileTree};

use crate::codec::{downcast, Codec, SerdeCodec};
use crate::context::{ReadContext, WriteContext};
use crate::error::SerializationError;
use crate::registry::CodecRegistryBuilder;

/// An ordered list of values of any registered types.
#[derive(Debug, Clone, Default)]
pub struct ObjectList(pub Vec<Object>);

impl ObjectList {
    /// Wraps `items`.
    pub fn new(items: Vec<Object>) -> Self {
        Self(items)
    }

    /// The items, in order.
    pub fn items(&self) -> &[Object] {
        &self.0
    }
}

/// Writes each item of an [`ObjectList`] through its own codec.
#[derive(Debug, Default)]
pub struct ObjectListCodec;

impl Codec for ObjectListCodec {
    fn encode(&self, ctx: &mut WriteContext<'_>, value: &Object) -> Result<(), SerializationError> {
        let list = downcast::<ObjectList>(value)?;
        ctx.write_raw(&list.0.len())?;
        for item in &list.0 {
            ctx.write(Some(item))?;
        }
        Ok(())
    }

    fn decode(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Object>, SerializationError> {
        let len: usize = ctx.read_raw()?;
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(ctx.read_non_null("list item")?);
        }
        Ok(Some(Object::new(ObjectList(items))))
    }
}

/// Writes a [`FileCollection`] once per session.
#[derive(Debug, Default)]
pub struct FileCollectionCodec;

impl Codec for FileCollectionCodec {
    fn encode(&self, ctx: &mut WriteContext<'_>, value: &Object) -> Result<(), SerializationError> {
        let collection = downcast::<FileCollection>(value)?;
        ctx.encode_preserving_identity(value, |ctx| {
            ctx.write_raw(&collection.display_name)?;
            ctx.write_raw(&collection.files)
        })
    }

    fn decode(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Object>, SerializationError> {
        ctx.decode_preserving_identity(|ctx, _id| {
            let display_name: String = ctx.read_raw()?;
            let files: Vec<PathBuf> = ctx.read_raw()?;
            Ok(Object::new(FileCollection::new(display_name, files)))
        })
        .map(Some)
    }
}

pub(crate) fn register(builder: CodecRegistryBuilder) -> CodecRegistryBuilder {
    builder
        .register::<String>(SerdeCodec::<String>::new())
        .register::<bool>(SerdeCodec::<bool>::new())
        .register::<i32>(SerdeCodec::<i32>::new())
        .register::<i64>(SerdeCodec::<i64>::new())
        .register::<u32>(SerdeCodec::<u32>::new())
        .register::<u64>(SerdeCodec::<u64>::new())
        .register::<PathBuf>(SerdeCodec::<PathBuf>::new())
        .register::<Vec<u8>>(SerdeCodec::<Vec<u8>>::new())
        .register::<Vec<String>>(SerdeCodec::<Vec<String>>::new())
        .register::<PatternSet>(SerdeCodec::<PatternSet>::new())
        .register::<SingletonFileTree>(SerdeCodec::<SingletonFileTree>::new())
        .register::<ObjectList>(ObjectListCodec)
        .register::<FileCollection>(FileCollectionCodec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionScope;
    use crate::registry::CodecRegistry;
    use bramble_common::CancellationToken;
    use bramble_diagnostics::ProblemSink;
    use std::sync::Arc;

    fn round_trip(registry: &CodecRegistry, value: &Object) -> Option<Object> {
        let sink = ProblemSink::new();
        let cancel = CancellationToken::new();
        let scope = SessionScope::new(registry, &sink, &cancel);
        let mut writer = WriteContext::new(scope);
        writer.write(Some(value)).unwrap();
        let bytes = writer.into_bytes();
        let mut reader = ReadContext::new(scope, &bytes);
        let decoded = reader.read().unwrap();
        assert_eq!(reader.remaining(), 0);
        decoded
    }

    fn registry() -> CodecRegistry {
        CodecRegistry::builder().with_builtin_codecs().build()
    }

    #[test]
    fn leaf_values() {
        let registry = registry();
        let text = round_trip(&registry, &Object::new("hello".to_string())).unwrap();
        assert_eq!(text.downcast_ref::<String>().unwrap(), "hello");
        let number = round_trip(&registry, &Object::new(-7i64)).unwrap();
        assert_eq!(*number.downcast_ref::<i64>().unwrap(), -7);
        let path = round_trip(&registry, &Object::new(PathBuf::from("/a/b"))).unwrap();
        assert_eq!(path.downcast_ref::<PathBuf>().unwrap(), &PathBuf::from("/a/b"));
    }

    #[test]
    fn object_list_keeps_heterogeneous_items() {
        let list = ObjectList::new(vec![
            Object::new("a".to_string()),
            Object::new(1u32),
            Object::new(true),
        ]);
        let decoded = round_trip(&registry(), &Object::new(list)).unwrap();
        let items = decoded.downcast_ref::<ObjectList>().unwrap().items().to_vec();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].downcast_ref::<String>().unwrap(), "a");
        assert_eq!(*items[1].downcast_ref::<u32>().unwrap(), 1);
        assert!(*items[2].downcast_ref::<bool>().unwrap());
    }

    #[test]
    fn shared_file_collection_decodes_once() {
        let collection = Object::from_arc(Arc::new(FileCollection::new(
            "classpath",
            vec![PathBuf::from("/a.jar")],
        )));
        let list = ObjectList::new(vec![collection.clone(), collection]);
        let decoded = round_trip(&registry(), &Object::new(list)).unwrap();
        let items = decoded.downcast_ref::<ObjectList>().unwrap().items().to_vec();
        assert!(items[0].ptr_eq(&items[1]));
        assert_eq!(
            items[0].downcast_ref::<FileCollection>().unwrap().files,
            [PathBuf::from("/a.jar")]
        );
    }

    #[test]
    fn null_round_trips() {
        let registry = registry();
        let sink = ProblemSink::new();
        let cancel = CancellationToken::new();
        let scope = SessionScope::new(&registry, &sink, &cancel);
        let mut writer = WriteContext::new(scope);
        writer.write(None).unwrap();
        let bytes = writer.into_bytes();
        assert!(ReadContext::new(scope, &bytes).read().unwrap().is_none());
    }
}
