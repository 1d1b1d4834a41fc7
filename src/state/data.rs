/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the benchmark routines, the cache layer and the UI layer.
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Where the bytes of a file (or of a cached copy) come from
#[derive(Clone)]
pub enum FileSource {
    /// A file on disk, read lazily every time
    Disk(PathBuf),
    /// Bytes already in memory (cache read-back, tests)
    Memory(Arc<[u8]>),
}

impl FileSource {
    /// Read the full content
    pub async fn read(&self) -> Result<Arc<[u8]>> {
        match self {
            FileSource::Disk(path) => Ok(tokio::fs::read(path).await?.into()),
            FileSource::Memory(bytes) => Ok(Arc::clone(bytes)),
        }
    }
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Disk(path) => f.debug_tuple("Disk").field(path).finish(),
            FileSource::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}

/// A user-chosen image
#[derive(Debug, Clone)]
pub struct SelectedFile {
    /// Filename only (e.g., "logo.png")
    pub name: String,
    /// Size in bytes at selection time
    pub size: u64,
    pub source: FileSource,
}

impl SelectedFile {
    /// Stat a file on disk. The content itself is read on demand.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        Ok(Self {
            name,
            size: metadata.len(),
            source: FileSource::Disk(path.to_path_buf()),
        })
    }

    /// Extension in lowercase, used to pick a MIME type
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

#[cfg(test)]
impl SelectedFile {
    /// An in-memory file, so tests don't need fixtures on disk
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            source: FileSource::Memory(bytes),
        }
    }
}

/// Whether inlining is advisable for a file
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Good,
    Bad,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub text: &'static str,
}

/// Comparison numbers for one file
///
/// Always produced whole. Absent values mean that step failed.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub original_size: u64,
    /// Length of the complete data URL
    pub base64_size: Option<u64>,
    /// Size increase of the data URL over the raw bytes, one decimal
    pub inflation_percent: Option<f64>,
    /// Time to produce the data URL
    #[serde(rename = "read_time_ms", serialize_with = "as_millis_opt")]
    pub read_time: Option<Duration>,
    /// Time to decode the data URL
    #[serde(rename = "base64_decode_time_ms", serialize_with = "as_millis_opt")]
    pub base64_decode_time: Option<Duration>,
    /// External reference decode time (from the cache on warm runs)
    #[serde(rename = "decode_time_ms", serialize_with = "as_millis_opt")]
    pub decode_time: Option<Duration>,
    /// Read + base64 decode, absent parts counted as zero
    #[serde(rename = "total_time_ms", serialize_with = "as_millis")]
    pub total_time: Duration,
    pub cached: bool,
    pub recommendation: Recommendation,
}

impl MeasurementRecord {
    /// Bytes the external strategy transfers: nothing when served from cache
    pub fn external_transferred(&self) -> u64 {
        if self.cached {
            0
        } else {
            self.original_size
        }
    }

    /// Whether any part of the Base64 path produced a timing
    pub fn has_base64_timing(&self) -> bool {
        self.read_time.is_some() || self.base64_decode_time.is_some()
    }
}

fn as_millis<S: Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}

fn as_millis_opt<S: Serializer>(
    d: &Option<Duration>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    match d {
        Some(d) => as_millis(d, s),
        None => s.serialize_none(),
    }
}

/// Snapshot of the persistent cache
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheSummary {
    pub available: bool,
    pub entry_count: usize,
    pub total_bytes: u64,
}

impl CacheSummary {
    pub fn unavailable() -> Self {
        Self::default()
    }
}
