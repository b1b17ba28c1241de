//! Minimal file trees: the primitive leaves richer trees are built from.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bramble_common::Object;
use serde::{Deserialize, Serialize};

use super::patterns::PatternSet;

/// What a minimal tree is, as far as code that needs to rebuild it cares.
pub enum TreeKind<'a> {
    /// A directory scanned with a pattern set.
    Directory {
        /// The directory root.
        dir: &'a Path,
        /// Patterns applied while scanning.
        patterns: &'a PatternSet,
    },
    /// The contents of a ZIP archive.
    Zip(&'a Path),
    /// The contents of a TAR archive.
    Tar(&'a Path),
    /// A single file generated on demand.
    Generated(&'a GeneratedSpec),
    /// Another minimal tree seen through a pattern filter.
    Filtered {
        /// The filter's patterns.
        patterns: &'a PatternSet,
        /// The filtered tree.
        tree: &'a dyn MinimalFileTree,
    },
    /// Some other format backed by a single file on disk.
    BackedByFile(&'a Path),
    /// A tree whose contents are mirrored into a directory when visited.
    Mirroring(&'a dyn MirroringFileTree),
    /// Anything else.
    Opaque,
}

/// A primitive, non-composite file tree.
pub trait MinimalFileTree: fmt::Debug + Send + Sync {
    /// Human-readable name used in error messages.
    fn display_name(&self) -> String;

    /// Describes the tree.
    fn kind(&self) -> TreeKind<'_> {
        TreeKind::Opaque
    }

    /// A self-contained value that the factory can turn back into an
    /// equivalent tree, for trees that fit no other [`TreeKind`].
    fn portable(&self) -> Option<Object> {
        None
    }

    /// Fully qualified name of the implementing type.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// One file or directory reported while visiting a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVisitDetails {
    /// Absolute path of the visited entry.
    pub path: PathBuf,
    /// Path relative to the tree root, `/`-separated.
    pub relative_path: String,
    /// Whether the entry is a directory.
    pub is_directory: bool,
}

/// A tree that materializes its contents into a directory as it is visited.
///
/// The mirror is only complete after a full [`visit`](Self::visit).
pub trait MirroringFileTree: Send + Sync {
    /// Visits every entry, materializing it in the mirror directory.
    fn visit(&self, visitor: &mut dyn FnMut(&FileVisitDetails)) -> io::Result<()>;

    /// The directory tree the contents are mirrored into.
    fn mirror(&self) -> DirectoryFileTree;
}

/// A directory scanned with a pattern set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryFileTree {
    /// The directory root.
    pub dir: PathBuf,
    /// Patterns applied while scanning.
    pub patterns: PatternSet,
}

impl DirectoryFileTree {
    /// Creates a directory tree with the given root and patterns.
    pub fn new(dir: impl Into<PathBuf>, patterns: PatternSet) -> Self {
        Self {
            dir: dir.into(),
            patterns,
        }
    }
}

impl MinimalFileTree for DirectoryFileTree {
    fn display_name(&self) -> String {
        format!("directory '{}'", self.dir.display())
    }

    fn kind(&self) -> TreeKind<'_> {
        TreeKind::Directory {
            dir: &self.dir,
            patterns: &self.patterns,
        }
    }
}

/// The contents of a ZIP archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipFileTree {
    /// The archive file.
    pub file: PathBuf,
}

impl MinimalFileTree for ZipFileTree {
    fn display_name(&self) -> String {
        format!("ZIP '{}'", self.file.display())
    }

    fn kind(&self) -> TreeKind<'_> {
        TreeKind::Zip(&self.file)
    }
}

/// The contents of a TAR archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarFileTree {
    /// The archive file.
    pub file: PathBuf,
}

impl MinimalFileTree for TarFileTree {
    fn display_name(&self) -> String {
        format!("TAR '{}'", self.file.display())
    }

    fn kind(&self) -> TreeKind<'_> {
        TreeKind::Tar(&self.file)
    }
}

/// Everything needed to regenerate a single generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSpec {
    /// Directory the file is generated into.
    pub tmp_dir: PathBuf,
    /// Name of the generated file.
    pub file_name: String,
    /// Identifier of the content generator, resolved when the file is produced.
    pub generator: String,
}

impl GeneratedSpec {
    /// The path of the generated file.
    pub fn file_path(&self) -> PathBuf {
        self.tmp_dir.join(&self.file_name)
    }
}

/// A tree containing exactly one generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSingletonFileTree {
    /// How to regenerate the file.
    pub spec: GeneratedSpec,
}

impl MinimalFileTree for GeneratedSingletonFileTree {
    fn display_name(&self) -> String {
        format!("generated file '{}'", self.spec.file_name)
    }

    fn kind(&self) -> TreeKind<'_> {
        TreeKind::Generated(&self.spec)
    }
}

/// A minimal tree seen through a pattern filter.
#[derive(Debug, Clone)]
pub struct FilteredMinimalFileTree {
    /// The filter's patterns.
    pub patterns: PatternSet,
    /// The filtered tree.
    pub tree: Arc<dyn MinimalFileTree>,
}

impl MinimalFileTree for FilteredMinimalFileTree {
    fn display_name(&self) -> String {
        self.tree.display_name()
    }

    fn kind(&self) -> TreeKind<'_> {
        TreeKind::Filtered {
            patterns: &self.patterns,
            tree: self.tree.as_ref(),
        }
    }
}

/// A tree containing one existing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingletonFileTree {
    /// The file.
    pub file: PathBuf,
}

impl MinimalFileTree for SingletonFileTree {
    fn display_name(&self) -> String {
        format!("file '{}'", self.file.display())
    }

    fn portable(&self) -> Option<Object> {
        Some(Object::new(self.clone()))
    }
}
