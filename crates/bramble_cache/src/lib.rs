//! The configuration cache: persists the build configuration model as a
//! binary object graph and restores it on a later run.
//!
//! - [`context`]: per-session write and read contexts with the identity
//!   table, the property trace and debug frames.
//! - [`CodecRegistry`]: which [`Codec`] handles which runtime type.
//! - [`bean`]: field-by-field encoding of model types, with conventions.
//! - [`codecs`]: built-in, file tree and listener broadcast codecs.
//! - [`ConfigurationCache`]: runs sessions and commits their results to the
//!   [`EntryStore`].

#![warn(missing_docs)]

pub mod bean;
pub mod cache;
pub mod codec;
pub mod codecs;
pub mod context;
pub mod error;
pub mod registry;
pub mod store;

pub use bean::{Bean, BeanCodec, DeclaredType, FieldValue, RelevantField, SchemaBuilder};
pub use cache::{ConfigurationCache, Encoded};
pub use codec::{Codec, SerdeCodec};
pub use codecs::{FileTreePart, FileTreeSpec, ObjectList};
pub use context::{PropertyKind, ReadContext, SessionContext, SessionScope, WriteContext};
pub use error::{CacheError, Direction, SerializationError};
pub use registry::{CodecRegistry, CodecRegistryBuilder};
pub use store::EntryStore;
