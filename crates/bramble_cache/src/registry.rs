//! The codec registry: which codec handles which runtime type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bramble_common::ContentHash;
use bramble_model::{BroadcasterFactory, FileCollectionFactory};

use crate::bean::{schema_of, Bean, BeanCodec};
use crate::codec::Codec;
use crate::codecs::{builtin, FileTreeCodec, ListenerBroadcastCodec};

/// A codec bound to a runtime type.
pub struct Binding {
    tag: u32,
    name: String,
    codec: Arc<dyn Codec>,
}

impl Binding {
    /// The tag written before every value of the bound type.
    pub fn tag(&self) -> u32 {
        self.tag
    }

    /// The name of the bound type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The codec.
    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("tag", &self.tag)
            .field("name", &self.name)
            .finish()
    }
}

/// An immutable mapping from runtime types to codecs.
///
/// Tags are assigned from 1 in registration order; 0 stands for null. Two
/// registries with the same bindings in the same order have the same
/// [`fingerprint`](Self::fingerprint) and read each other's streams.
#[derive(Debug)]
pub struct CodecRegistry {
    bindings: Vec<Binding>,
    by_type: HashMap<TypeId, usize>,
    fingerprint: ContentHash,
}

impl CodecRegistry {
    /// Starts an empty registry.
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder::default()
    }

    /// The binding for a runtime type.
    pub fn binding_for(&self, type_id: TypeId) -> Option<&Binding> {
        self.by_type.get(&type_id).map(|&index| &self.bindings[index])
    }

    /// The binding for a tag read from a stream.
    pub fn binding_by_tag(&self, tag: u32) -> Option<&Binding> {
        let index = usize::try_from(tag).ok()?.checked_sub(1)?;
        self.bindings.get(index)
    }

    /// Returns `true` if values of type `T` can be written.
    pub fn supports<T: Any>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Hash of the bound type names, in tag order.
    pub fn fingerprint(&self) -> ContentHash {
        self.fingerprint
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Builds a [`CodecRegistry`].
#[derive(Default)]
pub struct CodecRegistryBuilder {
    bindings: Vec<Binding>,
    by_type: HashMap<TypeId, usize>,
}

impl CodecRegistryBuilder {
    /// Binds `codec` to values of type `T`.
    ///
    /// Binding a type again replaces its codec and keeps its tag.
    pub fn register<T: Any>(mut self, codec: impl Codec + 'static) -> Self {
        let name = std::any::type_name::<T>().to_string();
        let codec: Arc<dyn Codec> = Arc::new(codec);
        match self.by_type.get(&TypeId::of::<T>()) {
            Some(&index) => self.bindings[index].codec = codec,
            None => {
                let index = self.bindings.len();
                self.bindings.push(Binding {
                    tag: index as u32 + 1,
                    name,
                    codec,
                });
                self.by_type.insert(TypeId::of::<T>(), index);
            }
        }
        self
    }

    /// Binds the field-by-field codec to bean type `T`.
    ///
    /// The schema of `T` is computed here if no session computed it before.
    pub fn bean<T: Bean>(self) -> Self {
        schema_of::<T>();
        self.register::<T>(BeanCodec::<T>::new())
    }

    /// Binds the codecs for strings, integers, paths, byte buffers, object
    /// lists, file collections and pattern sets.
    pub fn with_builtin_codecs(self) -> Self {
        builtin::register(self)
    }

    /// Binds the file tree codec, rebuilding trees with `factory`.
    pub fn with_file_trees(self, factory: Arc<dyn FileCollectionFactory>) -> Self {
        self.register::<bramble_model::FileTree>(FileTreeCodec::new(factory))
    }

    /// Binds the listener broadcast codec, creating broadcasts with `factory`.
    pub fn with_listener_broadcasts(self, factory: Arc<dyn BroadcasterFactory>) -> Self {
        self.register::<bramble_model::ListenerBroadcast>(ListenerBroadcastCodec::new(factory))
    }

    /// Freezes the registry.
    pub fn build(self) -> CodecRegistry {
        let fingerprint = ContentHash::from_parts(self.bindings.iter().map(|b| b.name.as_str()));
        CodecRegistry {
            bindings: self.bindings,
            by_type: self.by_type,
            fingerprint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SerdeCodec;

    #[test]
    fn tags_follow_registration_order() {
        let registry = CodecRegistry::builder()
            .register::<String>(SerdeCodec::<String>::new())
            .register::<u32>(SerdeCodec::<u32>::new())
            .build();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.binding_for(TypeId::of::<String>()).unwrap().tag(), 1);
        assert_eq!(registry.binding_for(TypeId::of::<u32>()).unwrap().tag(), 2);
        assert!(registry.binding_by_tag(2).unwrap().name().ends_with("u32"));
        assert!(registry.binding_by_tag(0).is_none());
        assert!(registry.binding_by_tag(3).is_none());
    }

    #[test]
    fn unregistered_type_has_no_binding() {
        let registry = CodecRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(!registry.supports::<String>());
        assert!(registry.binding_for(TypeId::of::<String>()).is_none());
    }

    #[test]
    fn rebinding_keeps_tag() {
        let registry = CodecRegistry::builder()
            .register::<String>(SerdeCodec::<String>::new())
            .register::<u32>(SerdeCodec::<u32>::new())
            .register::<String>(SerdeCodec::<String>::new())
            .build();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.binding_for(TypeId::of::<String>()).unwrap().tag(), 1);
    }

    #[test]
    fn fingerprint_depends_on_layout() {
        let a = CodecRegistry::builder().with_builtin_codecs().build();
        let b = CodecRegistry::builder().with_builtin_codecs().build();
        let c = CodecRegistry::builder()
            .register::<u64>(SerdeCodec::<u64>::new())
            .with_builtin_codecs()
            .build();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
