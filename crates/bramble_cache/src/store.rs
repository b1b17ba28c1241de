//! Committed cache entries on disk.
//!
//! Each entry is stored at `<dir>/<key>.bin` as a 4-byte little-endian header
//! length, a bincode-encoded [`EntryHeader`], and the encoded session bytes.
//! Entries are written to a uniquely named temporary file first and renamed
//! into place, so a reader never sees a partially written entry and
//! concurrent writers of one key never share a temporary file.

use std::io::Write;
use std::path::{Path, PathBuf};

use bramble_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, SerializationError};

/// Magic bytes identifying a Bramble configuration cache entry.
const ENTRY_MAGIC: [u8; 4] = *b"BRCC";

/// Current entry format version. Increment on breaking changes to the header
/// or to any codec payload.
const ENTRY_FORMAT_VERSION: u32 = 1;

/// File extension of committed entries.
const ENTRY_EXT: &str = "bin";

/// Header prepended to every entry for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryHeader {
    /// Magic bytes: must be `b"BRCC"`.
    pub magic: [u8; 4],

    /// Entry format version.
    pub format_version: u32,

    /// Version of the tool that wrote the entry.
    pub tool_version: String,

    /// Fingerprint of the codec registry that wrote the payload.
    pub registry: ContentHash,

    /// Content hash of the payload.
    pub checksum: ContentHash,
}

/// Directory of committed entries.
#[derive(Debug, Clone)]
pub struct EntryStore {
    dir: PathBuf,
    tool_version: String,
}

impl EntryStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// The root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file path of the entry with the given key.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{ENTRY_EXT}"))
    }

    /// Commits `data` under `key`, replacing any previous entry.
    pub fn write_entry(
        &self,
        key: &str,
        registry: ContentHash,
        data: &[u8],
    ) -> Result<PathBuf, CacheError> {
        validate_key(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        let header = EntryHeader {
            magic: ENTRY_MAGIC,
            format_version: ENTRY_FORMAT_VERSION,
            tool_version: self.tool_version.clone(),
            registry,
            checksum: ContentHash::from_bytes(data),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(SerializationError::Encode)?;

        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);

        let path = self.entry_path(key);
        let io_error = |source| CacheError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!("{key}."))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(io_error)?;
        tmp.write_all(&output).map_err(io_error)?;
        tmp.persist(&path).map_err(|e| io_error(e.error))?;
        Ok(path)
    }

    /// Reads the payload of the entry with the given key.
    ///
    /// Returns `None` if the entry is missing, its header is invalid, it was
    /// written by another format version or by a differently composed
    /// registry, or its checksum does not verify.
    pub fn read_entry(&self, key: &str, registry: ContentHash) -> Option<Vec<u8>> {
        validate_key(key).ok()?;
        let raw = std::fs::read(self.entry_path(key)).ok()?;
        if raw.len() < 4 {
            return None;
        }

        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }

        let header: EntryHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;
        if header.magic != ENTRY_MAGIC
            || header.format_version != ENTRY_FORMAT_VERSION
            || header.registry != registry
        {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return None;
        }
        Some(payload.to_vec())
    }

    /// Deletes the entry with the given key. Returns `false` if there was none.
    pub fn remove_entry(&self, key: &str) -> Result<bool, CacheError> {
        validate_key(key)?;
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }

    /// Removes entries whose key is not in `live_keys`, and any leftover
    /// temporary files. Returns the number of files removed.
    pub fn gc(&self, live_keys: &[&str]) -> Result<usize, CacheError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        let entries = std::fs::read_dir(&self.dir).map_err(|e| CacheError::Io {
            path: self.dir.clone(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| CacheError::Io {
                path: self.dir.clone(),
                source: e,
            })?;
            let path = entry.path();
            let stale = match path.extension().and_then(|e| e.to_str()) {
                Some("tmp") => true,
                Some(ENTRY_EXT) => path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| !live_keys.contains(&stem)),
                _ => false,
            };
            if stale {
                std::fs::remove_file(&path).map_err(|e| CacheError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Keys become file names: only ASCII letters, digits, `-`, `_` and `.` are
/// allowed, and a key may not start with `.`.
fn validate_key(key: &str) -> Result<(), CacheError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidKey {
            key: key.to_string(),
        })
    }
}
