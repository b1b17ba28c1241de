//! Encodes a [`FileTree`] as the list of minimal trees it is composed of.
//!
//! Encoding walks the structure of the tree and reduces every part to a
//! [`FileTreeSpec`]. Decoding rebuilds each spec with the
//! [`FileCollectionFactory`] and unions the results. The part list is written
//! under the identity of the tree, so a tree shared across the graph decodes
//! to one shared tree.
//!
//! Pattern filters survive the round trip: they are folded into the patterns
//! of directory specs and carried next to every other spec. A plain
//! collection under a non-empty filter cannot be encoded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bramble_common::Object;
use bramble_model::{
    FileCollection, FileCollectionFactory, FileStructureVisitor, FileTree, GeneratedSpec,
    MinimalFileTree, MirroringFileTree, PatternSet, TreeKind,
};

use crate::codec::{downcast, Codec};
use crate::context::{ReadContext, WriteContext};
use crate::error::SerializationError;

/// A minimal, reconstructable part of a file tree.
#[derive(Debug, Clone)]
pub enum FileTreeSpec {
    /// A minimal tree of no known kind, restored from its portable value.
    AdaptedTree(Object),
    /// A plain file collection viewed as a tree.
    WrappedCollection(Object),
    /// A directory scanned with a pattern set.
    DirectoryTree {
        /// The directory root.
        root: PathBuf,
        /// Patterns applied while scanning.
        patterns: PatternSet,
    },
    /// The contents of a ZIP archive.
    ZipTree(PathBuf),
    /// The contents of a TAR archive.
    TarTree(PathBuf),
    /// A single generated file.
    GeneratedTree(GeneratedSpec),
}

impl FileTreeSpec {
    fn tag(&self) -> u8 {
        match self {
            FileTreeSpec::AdaptedTree(_) => 0,
            FileTreeSpec::WrappedCollection(_) => 1,
            FileTreeSpec::DirectoryTree { .. } => 2,
            FileTreeSpec::ZipTree(_) => 3,
            FileTreeSpec::TarTree(_) => 4,
            FileTreeSpec::GeneratedTree(_) => 5,
        }
    }
}

/// A spec and the pattern filter its tree is seen through.
///
/// Directory specs always have an empty filter: their patterns already
/// include it.
#[derive(Debug, Clone)]
pub struct FileTreePart {
    /// The reconstructable tree.
    pub spec: FileTreeSpec,
    /// Patterns the rebuilt tree is filtered with. Empty for no filter.
    pub filter: PatternSet,
}

impl FileTreePart {
    fn unfiltered(spec: FileTreeSpec) -> Self {
        Self {
            spec,
            filter: PatternSet::new(),
        }
    }

    /// Narrows the part by `patterns`.
    fn filtered_by(self, patterns: &PatternSet) -> Self {
        match self.spec {
            FileTreeSpec::DirectoryTree {
                root,
                patterns: inner,
            } => Self::unfiltered(FileTreeSpec::DirectoryTree {
                root,
                patterns: inner.intersect(patterns),
            }),
            spec => Self {
                spec,
                filter: self.filter.intersect(patterns),
            },
        }
    }
}

/// Reduces a file tree to the parts it is composed of.
///
/// Fails with [`SerializationError::UnsupportedTreeKind`] if some part cannot
/// be reduced; no parts are returned in that case.
pub fn specs_of(tree: &FileTree) -> Result<Vec<FileTreePart>, SerializationError> {
    let mut collector = SpecCollector::default();
    tree.visit_structure::<SerializationError>(&mut collector)?;
    Ok(collector.parts)
}

/// Reduces a minimal tree to a part, if it has a known kind.
///
/// A filtered minimal tree is reduced to its inner tree, narrowed by the
/// filter's patterns.
fn spec_of(tree: &dyn MinimalFileTree) -> Option<FileTreePart> {
    let spec = match tree.kind() {
        TreeKind::Directory { dir, patterns } => FileTreeSpec::DirectoryTree {
            root: dir.to_path_buf(),
            patterns: patterns.clone(),
        },
        TreeKind::Zip(file) => FileTreeSpec::ZipTree(file.to_path_buf()),
        TreeKind::Tar(file) => FileTreeSpec::TarTree(file.to_path_buf()),
        TreeKind::Generated(spec) => FileTreeSpec::GeneratedTree(spec.clone()),
        TreeKind::Filtered { patterns, tree } => {
            return spec_of(tree).map(|part| part.filtered_by(patterns));
        }
        TreeKind::BackedByFile(_) | TreeKind::Mirroring(_) | TreeKind::Opaque => return None,
    };
    Some(FileTreePart::unfiltered(spec))
}

fn unsupported(tree: &dyn MinimalFileTree) -> SerializationError {
    SerializationError::UnsupportedTreeKind {
        tree: tree.display_name(),
        type_name: tree.type_name().to_string(),
    }
}

/// Collects parts, narrowing each by the pattern filters entered.
#[derive(Default)]
struct SpecCollector {
    parts: Vec<FileTreePart>,
    filters: Vec<PatternSet>,
}

impl SpecCollector {
    fn push(&mut self, part: FileTreePart) {
        let part = self
            .filters
            .iter()
            .rev()
            .fold(part, |part, filter| part.filtered_by(filter));
        self.parts.push(part);
    }
}

impl FileStructureVisitor for SpecCollector {
    type Error = SerializationError;

    fn start_visit(&mut self, tree: &FileTree) -> Result<bool, SerializationError> {
        match tree {
            FileTree::Adapter(minimal) => {
                if let Some(part) = spec_of(minimal.as_ref()) {
                    self.push(part);
                    return Ok(false);
                }
                if let Some(portable) = minimal.portable() {
                    self.push(FileTreePart::unfiltered(FileTreeSpec::AdaptedTree(portable)));
                    return Ok(false);
                }
                Ok(true)
            }
            // Under a filter the collection is visited, which fails.
            FileTree::CollectionBacked(_) if !self.filters.is_empty() => Ok(true),
            FileTree::CollectionBacked(collection) => {
                self.push(FileTreePart::unfiltered(FileTreeSpec::WrappedCollection(
                    Object::from_arc(Arc::clone(collection)),
                )));
                Ok(false)
            }
            // `tree.matching(PatternSet::new())` is common: skip the filter.
            FileTree::Filtered { tree, patterns } if patterns.is_empty() => {
                tree.visit_structure(self)?;
                Ok(false)
            }
            FileTree::Filtered { tree, patterns } => {
                self.filters.push(patterns.clone());
                let result = tree.visit_structure(self);
                self.filters.pop();
                result.map(|()| false)
            }
            FileTree::Union(_) => Ok(true),
        }
    }

    fn visit_collection(&mut self, collection: &FileCollection) -> Result<(), SerializationError> {
        Err(SerializationError::Failed {
            message: format!(
                "cannot apply a pattern filter to file collection '{}'",
                collection.display_name
            ),
        })
    }

    fn visit_file_tree(
        &mut self,
        root: &Path,
        patterns: &PatternSet,
        _tree: &FileTree,
    ) -> Result<(), SerializationError> {
        self.push(FileTreePart::unfiltered(FileTreeSpec::DirectoryTree {
            root: root.to_path_buf(),
            patterns: patterns.clone(),
        }));
        Ok(())
    }

    fn visit_file_tree_backed_by_file(
        &mut self,
        _file: &Path,
        _tree: &FileTree,
        source: &dyn MinimalFileTree,
    ) -> Result<(), SerializationError> {
        let part = spec_of(source).ok_or_else(|| unsupported(source))?;
        self.push(part);
        Ok(())
    }

    fn visit_generic_file_tree(
        &mut self,
        tree: &FileTree,
        source: &dyn MirroringFileTree,
    ) -> Result<(), SerializationError> {
        // The mirror is only complete once every entry was visited.
        source
            .visit(&mut |_details| {})
            .map_err(|e| SerializationError::Failed {
                message: format!("failed to mirror file tree '{}': {e}", tree.display_name()),
            })?;
        let mirror = source.mirror();
        self.push(FileTreePart::unfiltered(FileTreeSpec::DirectoryTree {
            root: mirror.dir,
            patterns: mirror.patterns,
        }));
        Ok(())
    }

    fn visit_opaque_tree(
        &mut self,
        _tree: &FileTree,
        source: &dyn MinimalFileTree,
    ) -> Result<(), SerializationError> {
        Err(unsupported(source))
    }
}

/// The codec for [`FileTree`] values.
///
/// Each part is written as its spec tag and payload. Every part but a
/// directory is followed by its filter.
pub struct FileTreeCodec {
    factory: Arc<dyn FileCollectionFactory>,
}

impl FileTreeCodec {
    /// Creates the codec, rebuilding trees with `factory`.
    pub fn new(factory: Arc<dyn FileCollectionFactory>) -> Self {
        Self { factory }
    }

    fn write_part(ctx: &mut WriteContext<'_>, part: &FileTreePart) -> Result<(), SerializationError> {
        ctx.write_raw(&part.spec.tag())?;
        match &part.spec {
            FileTreeSpec::AdaptedTree(value) | FileTreeSpec::WrappedCollection(value) => {
                ctx.write(Some(value))?
            }
            FileTreeSpec::DirectoryTree { root, patterns } => {
                ctx.write_raw(root)?;
                return ctx.write_raw(patterns);
            }
            FileTreeSpec::ZipTree(file) | FileTreeSpec::TarTree(file) => ctx.write_raw(file)?,
            FileTreeSpec::GeneratedTree(spec) => ctx.write_raw(spec)?,
        }
        ctx.write_raw(&part.filter)
    }

    fn read_tree(&self, ctx: &mut ReadContext<'_>) -> Result<FileTree, SerializationError> {
        let tag: u8 = ctx.read_raw()?;
        let tree = match tag {
            0 => {
                let portable = ctx.read_non_null("adapted file tree")?;
                self.factory
                    .adapt(&portable)
                    .ok_or_else(|| SerializationError::Failed {
                        message: format!(
                            "cannot adapt value of type '{}' to a file tree",
                            portable.type_name()
                        ),
                    })?
            }
            1 => {
                let value = ctx.read_non_null("wrapped file collection")?;
                let collection = value.downcast::<FileCollection>().ok_or_else(|| {
                    SerializationError::Failed {
                        message: format!(
                            "expected a file collection, got value of type '{}'",
                            value.type_name()
                        ),
                    }
                })?;
                self.factory.tree_of(collection)
            }
            2 => {
                let root: PathBuf = ctx.read_raw()?;
                let patterns: PatternSet = ctx.read_raw()?;
                return Ok(self.factory.directory(root, patterns));
            }
            3 => self.factory.zip_tree(ctx.read_raw()?),
            4 => self.factory.tar_tree(ctx.read_raw()?),
            5 => self.factory.generated(ctx.read_raw()?),
            tag => return Err(SerializationError::UnknownTag { tag: u32::from(tag) }),
        };
        let filter: PatternSet = ctx.read_raw()?;
        if filter.is_empty() {
            Ok(tree)
        } else {
            Ok(tree.matching(filter))
        }
    }
}

impl Codec for FileTreeCodec {
    fn encode(&self, ctx: &mut WriteContext<'_>, value: &Object) -> Result<(), SerializationError> {
        let tree = downcast::<FileTree>(value)?;
        ctx.encode_preserving_identity(value, |ctx| {
            let parts = specs_of(tree)?;
            ctx.write_raw(&parts.len())?;
            for part in &parts {
                Self::write_part(ctx, part)?;
            }
            Ok(())
        })
    }

    fn decode(&self, ctx: &mut ReadContext<'_>) -> Result<Option<Object>, SerializationError> {
        ctx.decode_preserving_identity(|ctx, _id| {
            let len: usize = ctx.read_raw()?;
            let mut trees = Vec::with_capacity(len.min(1024));
            for _ in 0..len {
                trees.push(self.read_tree(ctx)?);
            }
            Ok(Object::new(self.factory.union(trees)))
        })
        .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bramble_model::{
        DirectoryFileTree, FilteredMinimalFileTree, GeneratedSingletonFileTree, TarFileTree,
        ZipFileTree,
    };

    #[derive(Debug)]
    struct Custom;

    impl MinimalFileTree for Custom {
        fn display_name(&self) -> String {
            "custom".to_string()
        }
    }

    fn dir(path: &str) -> FileTree {
        FileTree::adapt(DirectoryFileTree::new(path, PatternSet::new().include("**/*")))
    }

    fn zip(path: &str) -> FileTree {
        FileTree::adapt(ZipFileTree {
            file: PathBuf::from(path),
        })
    }

    fn specs(tree: &FileTree) -> Vec<FileTreeSpec> {
        specs_of(tree)
            .unwrap()
            .into_iter()
            .map(|part| {
                assert!(part.filter.is_empty());
                part.spec
            })
            .collect()
    }

    #[test]
    fn reduces_minimal_kinds() {
        let tree = FileTree::Union(vec![
            Arc::new(dir("/src")),
            Arc::new(zip("/a.zip")),
            Arc::new(FileTree::adapt(TarFileTree {
                file: PathBuf::from("/b.tar"),
            })),
            Arc::new(FileTree::adapt(GeneratedSingletonFileTree {
                spec: GeneratedSpec {
                    tmp_dir: PathBuf::from("/tmp"),
                    file_name: "v.txt".to_string(),
                    generator: "version".to_string(),
                },
            })),
        ]);
        let specs = specs(&tree);
        assert_eq!(specs.len(), 4);
        assert!(matches!(&specs[0], FileTreeSpec::DirectoryTree { root, .. } if root == Path::new("/src")));
        assert!(matches!(&specs[1], FileTreeSpec::ZipTree(f) if f == Path::new("/a.zip")));
        assert!(matches!(&specs[2], FileTreeSpec::TarTree(_)));
        assert!(matches!(&specs[3], FileTreeSpec::GeneratedTree(g) if g.file_name == "v.txt"));
    }

    #[test]
    fn filtered_minimal_tree_reduces_to_inner() {
        let tree = FileTree::adapt(FilteredMinimalFileTree {
            patterns: PatternSet::new().exclude("**/*.tmp"),
            tree: Arc::new(DirectoryFileTree::new("/out", PatternSet::new())),
        });
        match &specs(&tree)[..] {
            [FileTreeSpec::DirectoryTree { root, patterns }] => {
                assert_eq!(root, Path::new("/out"));
                assert_eq!(patterns.excludes(), ["**/*.tmp"]);
            }
            other => panic!("unexpected specs {other:?}"),
        }
    }

    #[test]
    fn filtered_minimal_archive_keeps_filter() {
        let filter = PatternSet::new().include("**/*.class");
        let tree = FileTree::adapt(FilteredMinimalFileTree {
            patterns: filter.clone(),
            tree: Arc::new(ZipFileTree {
                file: PathBuf::from("/a.zip"),
            }),
        });
        let parts = specs_of(&tree).unwrap();
        assert_eq!(parts.len(), 1);
        assert!(matches!(&parts[0].spec, FileTreeSpec::ZipTree(f) if f == Path::new("/a.zip")));
        assert_eq!(parts[0].filter, filter);
    }

    #[test]
    fn collection_backed_tree_is_wrapped() {
        let collection = Arc::new(FileCollection::new("libs", vec![PathBuf::from("/l.jar")]));
        match &specs(&collection.as_file_tree())[..] {
            [FileTreeSpec::WrappedCollection(value)] => {
                assert!(Arc::ptr_eq(
                    &value.downcast::<FileCollection>().unwrap(),
                    &collection
                ));
            }
            other => panic!("unexpected specs {other:?}"),
        }
    }

    #[test]
    fn non_empty_filter_narrows_directories() {
        let tree = dir("/src").matching(PatternSet::new().exclude("**/test/**"));
        match &specs(&tree)[..] {
            [FileTreeSpec::DirectoryTree { patterns, .. }] => {
                assert_eq!(patterns.includes(), ["**/*"]);
                assert_eq!(patterns.intersections().len(), 1);
            }
            other => panic!("unexpected specs {other:?}"),
        }
    }

    #[test]
    fn non_empty_filter_is_carried_by_archives() {
        let outer = PatternSet::new().include("**/*.class");
        let inner = PatternSet::new().exclude("**/Test*");
        let tree = FileTree::Union(vec![Arc::new(zip("/a.zip")), Arc::new(dir("/src"))])
            .matching(inner.clone())
            .matching(outer.clone());
        let parts = specs_of(&tree).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(matches!(&parts[0].spec, FileTreeSpec::ZipTree(_)));
        assert_eq!(parts[0].filter, inner.intersect(&outer));
        assert!(matches!(&parts[1].spec, FileTreeSpec::DirectoryTree { .. }));
        assert!(parts[1].filter.is_empty());
    }

    #[test]
    fn filtered_collection_is_rejected() {
        let collection = Arc::new(FileCollection::new("deps", vec![PathBuf::from("/a.jar")]));
        let tree = collection
            .as_file_tree()
            .matching(PatternSet::new().include("**/*.jar"));
        let err = specs_of(&tree).unwrap_err();
        assert!(matches!(err, SerializationError::Failed { .. }));
        assert!(err.to_string().contains("'deps'"), "{err}");
    }

    #[test]
    fn unknown_minimal_tree_fails_without_partial_specs() {
        let tree = FileTree::Union(vec![
            Arc::new(dir("/src")),
            Arc::new(FileTree::adapt(Custom)),
        ]);
        let err = specs_of(&tree).unwrap_err();
        match err {
            SerializationError::UnsupportedTreeKind { tree, type_name } => {
                assert_eq!(tree, "custom");
                assert!(type_name.ends_with("Custom"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
