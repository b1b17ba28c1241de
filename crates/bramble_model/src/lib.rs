//! The parts of the build configuration model that the configuration cache
//! stores through dedicated codecs.
//!
//! - [`files`]: composable file trees, their structure visitor, and the
//!   factory that rebuilds trees from minimal specs.
//! - [`event`]: anonymous listener broadcasts and the factory that creates them.
//! - [`convention`]: convention values consulted for attributes the user never
//!   set explicitly.

#![warn(missing_docs)]

pub mod convention;
pub mod event;
pub mod files;

pub use convention::{ConventionProvider, ConventionTable, NoConventions};
pub use event::{BroadcasterFactory, ListenerBroadcast, ListenerManager, UnknownListenerType};
pub use files::{
    DefaultFileCollectionFactory, DirectoryFileTree, FileCollection, FileCollectionFactory,
    FileStructureVisitor, FileTree, FilteredMinimalFileTree, GeneratedSingletonFileTree,
    GeneratedSpec, MinimalFileTree, MirroringFileTree, PatternSet, SingletonFileTree,
    TarFileTree, TreeKind, ZipFileTree,
};
