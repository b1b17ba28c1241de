//! Composite file trees and the visitor that walks their structure.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::minimal::{MinimalFileTree, MirroringFileTree, TreeKind};
use super::patterns::PatternSet;

/// A plain, ordered set of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCollection {
    /// Human-readable name used in error messages.
    pub display_name: String,
    /// The files, in declaration order.
    pub files: Vec<PathBuf>,
}

impl FileCollection {
    /// Creates a collection of the given files.
    pub fn new(display_name: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            files,
        }
    }

    /// Views the collection as a file tree.
    pub fn as_file_tree(self: &Arc<Self>) -> FileTree {
        FileTree::CollectionBacked(Arc::clone(self))
    }
}

/// A tree of files composed from minimal trees, collections, filters and unions.
#[derive(Debug, Clone)]
pub enum FileTree {
    /// A single minimal tree.
    Adapter(Arc<dyn MinimalFileTree>),
    /// A plain collection viewed as a tree.
    CollectionBacked(Arc<FileCollection>),
    /// Another tree seen through a pattern filter.
    Filtered {
        /// The filtered tree.
        tree: Arc<FileTree>,
        /// The filter's patterns.
        patterns: PatternSet,
    },
    /// The union of several trees, in order.
    Union(Vec<Arc<FileTree>>),
}

impl FileTree {
    /// Wraps a minimal tree.
    pub fn adapt(tree: impl MinimalFileTree + 'static) -> Self {
        FileTree::Adapter(Arc::new(tree))
    }

    /// Returns this tree restricted to the files matching `patterns`.
    pub fn matching(self, patterns: PatternSet) -> Self {
        FileTree::Filtered {
            tree: Arc::new(self),
            patterns,
        }
    }

    /// Human-readable name used in error messages.
    pub fn display_name(&self) -> String {
        match self {
            FileTree::Adapter(tree) => tree.display_name(),
            FileTree::CollectionBacked(collection) => collection.display_name.clone(),
            FileTree::Filtered { tree, .. } => tree.display_name(),
            FileTree::Union(_) => "file tree".to_string(),
        }
    }

    /// Walks the composition of this tree.
    ///
    /// Every node is first offered to [`FileStructureVisitor::start_visit`];
    /// its contents are only visited when that returns `true`.
    pub fn visit_structure<E>(
        &self,
        visitor: &mut dyn FileStructureVisitor<Error = E>,
    ) -> Result<(), E> {
        if !visitor.start_visit(self)? {
            return Ok(());
        }
        match self {
            FileTree::Union(trees) => {
                for tree in trees {
                    tree.visit_structure(visitor)?;
                }
                Ok(())
            }
            FileTree::Adapter(tree) => visit_minimal(tree.as_ref(), self, visitor),
            FileTree::CollectionBacked(collection) => visitor.visit_collection(collection),
            FileTree::Filtered { tree, patterns } => tree.visit_structure(&mut Filtering {
                delegate: visitor,
                patterns,
            }),
        }
    }
}

/// Reports the contents of a minimal tree to `visitor`.
fn visit_minimal<E>(
    minimal: &dyn MinimalFileTree,
    owner: &FileTree,
    visitor: &mut dyn FileStructureVisitor<Error = E>,
) -> Result<(), E> {
    match minimal.kind() {
        TreeKind::Directory { dir, patterns } => visitor.visit_file_tree(dir, patterns, owner),
        TreeKind::Zip(file) | TreeKind::Tar(file) | TreeKind::BackedByFile(file) => {
            visitor.visit_file_tree_backed_by_file(file, owner, minimal)
        }
        TreeKind::Generated(spec) => {
            visitor.visit_file_tree_backed_by_file(&spec.file_path(), owner, minimal)
        }
        TreeKind::Filtered { patterns, tree } => visit_minimal(
            tree,
            owner,
            &mut Filtering {
                delegate: visitor,
                patterns,
            },
        ),
        TreeKind::Mirroring(mirroring) => visitor.visit_generic_file_tree(owner, mirroring),
        TreeKind::Opaque => visitor.visit_opaque_tree(owner, minimal),
    }
}

/// Receives the structure of a [`FileTree`].
pub trait FileStructureVisitor {
    /// Error returned to abort the walk.
    type Error;

    /// Called for every node before its contents. Returning `false` skips them.
    fn start_visit(&mut self, tree: &FileTree) -> Result<bool, Self::Error>;

    /// A plain collection of files.
    fn visit_collection(&mut self, collection: &FileCollection) -> Result<(), Self::Error>;

    /// A directory scanned with `patterns`.
    fn visit_file_tree(
        &mut self,
        root: &Path,
        patterns: &PatternSet,
        tree: &FileTree,
    ) -> Result<(), Self::Error>;

    /// A tree whose contents come from a single file, such as an archive.
    fn visit_file_tree_backed_by_file(
        &mut self,
        file: &Path,
        tree: &FileTree,
        source: &dyn MinimalFileTree,
    ) -> Result<(), Self::Error>;

    /// A tree that mirrors its contents into a directory.
    fn visit_generic_file_tree(
        &mut self,
        tree: &FileTree,
        source: &dyn MirroringFileTree,
    ) -> Result<(), Self::Error>;

    /// A minimal tree of no known kind.
    fn visit_opaque_tree(
        &mut self,
        tree: &FileTree,
        source: &dyn MinimalFileTree,
    ) -> Result<(), Self::Error>;
}

/// Forwards to another visitor, narrowing directory patterns by a filter.
struct Filtering<'a, E> {
    delegate: &'a mut dyn FileStructureVisitor<Error = E>,
    patterns: &'a PatternSet,
}

impl<E> FileStructureVisitor for Filtering<'_, E> {
    type Error = E;

    fn start_visit(&mut self, tree: &FileTree) -> Result<bool, E> {
        self.delegate.start_visit(tree)
    }

    fn visit_collection(&mut self, collection: &FileCollection) -> Result<(), E> {
        self.delegate.visit_collection(collection)
    }

    fn visit_file_tree(
        &mut self,
        root: &Path,
        patterns: &PatternSet,
        tree: &FileTree,
    ) -> Result<(), E> {
        self.delegate
            .visit_file_tree(root, &patterns.intersect(self.patterns), tree)
    }

    fn visit_file_tree_backed_by_file(
        &mut self,
        file: &Path,
        tree: &FileTree,
        source: &dyn MinimalFileTree,
    ) -> Result<(), E> {
        self.delegate.visit_file_tree_backed_by_file(file, tree, source)
    }

    fn visit_generic_file_tree(
        &mut self,
        tree: &FileTree,
        source: &dyn MirroringFileTree,
    ) -> Result<(), E> {
        self.delegate.visit_generic_file_tree(tree, source)
    }

    fn visit_opaque_tree(&mut self, tree: &FileTree, source: &dyn MinimalFileTree) -> Result<(), E> {
        self.delegate.visit_opaque_tree(tree, source)
    }
}
