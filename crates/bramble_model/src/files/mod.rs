//! Composable file trees.
//!
//! A [`FileTree`] is built from [`MinimalFileTree`] leaves (a directory scan,
//! an archive, a generated file), from plain [`FileCollection`]s viewed as
//! trees, from pattern filters and from unions. Consumers that need to know
//! how a tree is composed walk it with a [`FileStructureVisitor`] instead of
//! matching on concrete leaf types.

mod factory;
mod minimal;
mod patterns;
mod tree;

pub use factory::{DefaultFileCollectionFactory, FileCollectionFactory};
pub use minimal::{
    DirectoryFileTree, FileVisitDetails, FilteredMinimalFileTree, GeneratedSingletonFileTree,
    GeneratedSpec, MinimalFileTree, MirroringFileTree, SingletonFileTree, TarFileTree, TreeKind,
    ZipFileTree,
};
pub use patterns::PatternSet;
pub use tree::{FileCollection, FileStructureVisitor, FileTree};
