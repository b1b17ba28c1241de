//! Settings types deserialized from `bramble.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// The top-level settings parsed from `bramble.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct BuildSettings {
    /// Configuration cache settings.
    #[serde(default)]
    pub cache: CacheSettings,
}

/// Settings for the configuration cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Directory holding committed cache entries, relative to the project root.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// Number of worker threads used when storing or loading several entries
    /// at once. Accepts a positive integer or `"auto"`.
    #[serde(default = "default_workers", deserialize_with = "deserialize_worker_count")]
    pub workers: usize,
    /// Whether sessions record debug frames around every field they write.
    #[serde(default)]
    pub debug_frames: bool,
    /// What to do with an entry whose session reported problems.
    #[serde(default)]
    pub problems: ProblemPolicy,
    /// Number of problems after which a session is aborted.
    #[serde(default = "default_max_problems")]
    pub max_problems: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            workers: default_workers(),
            debug_frames: false,
            problems: ProblemPolicy::default(),
            max_problems: default_max_problems(),
        }
    }
}

/// How problems reported during a session affect the resulting cache entry.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProblemPolicy {
    /// Report problems and still commit the entry (default).
    #[default]
    Warn,
    /// Refuse to commit an entry whose session reported any problem.
    Fail,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".bramble/configuration-cache")
}

fn default_workers() -> usize {
    4
}

fn default_max_problems() -> usize {
    512
}

/// Deserializes a worker count given either as an integer or as `"auto"`.
///
/// `"auto"` resolves to the available parallelism of the current machine.
fn deserialize_worker_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    struct WorkerCount;

    impl<'de> Visitor<'de> for WorkerCount {
        type Value = usize;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a positive integer or \"auto\"")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            usize::try_from(v).map_err(|_| E::custom(format!("invalid worker count {v}")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            usize::try_from(v).map_err(|_| E::custom(format!("invalid worker count {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            if v == "auto" {
                Ok(std::thread::available_parallelism().map_or(1, |n| n.get()))
            } else {
                Err(E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }
    }

    deserializer.deserialize_any(WorkerCount)
}
