//! Construction of file trees from their decoded parts.

use std::path::PathBuf;
use std::sync::Arc;

use bramble_common::Object;

use super::minimal::{
    DirectoryFileTree, GeneratedSingletonFileTree, GeneratedSpec, SingletonFileTree, TarFileTree,
    ZipFileTree,
};
use super::patterns::PatternSet;
use super::tree::{FileCollection, FileTree};

/// Builds file trees.
pub trait FileCollectionFactory: Send + Sync {
    /// A directory scanned with `patterns`.
    fn directory(&self, dir: PathBuf, patterns: PatternSet) -> FileTree {
        FileTree::adapt(DirectoryFileTree::new(dir, patterns))
    }

    /// The contents of a ZIP archive.
    fn zip_tree(&self, file: PathBuf) -> FileTree {
        FileTree::adapt(ZipFileTree { file })
    }

    /// The contents of a TAR archive.
    fn tar_tree(&self, file: PathBuf) -> FileTree {
        FileTree::adapt(TarFileTree { file })
    }

    /// A tree holding one generated file.
    fn generated(&self, spec: GeneratedSpec) -> FileTree {
        FileTree::adapt(GeneratedSingletonFileTree { spec })
    }

    /// A tree over a plain collection.
    fn tree_of(&self, collection: Arc<FileCollection>) -> FileTree {
        FileTree::CollectionBacked(collection)
    }

    /// Rebuilds a tree from a value produced by
    /// [`MinimalFileTree::portable`](super::MinimalFileTree::portable).
    ///
    /// Returns `None` when the value is not a tree this factory understands.
    fn adapt(&self, portable: &Object) -> Option<FileTree>;

    /// Combines trees in order. A single tree is returned unchanged.
    fn union(&self, mut trees: Vec<FileTree>) -> FileTree {
        if trees.len() == 1 {
            if let Some(tree) = trees.pop() {
                return tree;
            }
        }
        FileTree::Union(trees.into_iter().map(Arc::new).collect())
    }
}

/// The factory for the built-in tree types.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFileCollectionFactory;

impl FileCollectionFactory for DefaultFileCollectionFactory {
    fn adapt(&self, portable: &Object) -> Option<FileTree> {
        portable
            .downcast_ref::<SingletonFileTree>()
            .map(|tree| FileTree::adapt(tree.clone()))
    }
}
