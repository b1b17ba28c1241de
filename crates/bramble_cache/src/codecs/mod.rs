//! Codecs for the built-in value types and the domain types the cache
//! handles specially.

pub(crate) mod builtin;
mod file_tree;
mod listener_broadcast;

pub use builtin::{FileCollectionCodec, ObjectList, ObjectListCodec};
pub use file_tree::{specs_of, FileTreeCodec, FileTreePart, FileTreeSpec};
pub use listener_broadcast::ListenerBroadcastCodec;
