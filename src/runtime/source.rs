//! Definition sources
//!
//! A source yields raw [`DocumentBatch`]es. Parsing is left to the merger so a
//! malformed batch can be dropped without affecting the others.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::config::LoaderConfig;

/// Where a batch came from; decides its place in the merge order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Definitions document found on disk
    File,
    /// Persisted record
    Record,
}

/// Raw definitions document from one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBatch {
    pub origin: SourceKind,
    /// Human-readable origin (path or record id), used in logs and reports
    pub label: String,
    /// Unparsed JSON text: an object keyed by block name
    pub payload: String,
}

impl DocumentBatch {
    pub fn file(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            origin: SourceKind::File,
            label: label.into(),
            payload: payload.into(),
        }
    }

    pub fn record(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            origin: SourceKind::Record,
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Anything that supplies definition documents
///
/// Batches are returned in discovery order; the merger applies precedence.
pub trait DefinitionSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    fn batches(&self) -> Vec<DocumentBatch>;
}

/// Per-batch failure; always absorbed by the merge, never surfaced to callers
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed definitions in {label}: {source}")]
    Parse {
        label: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Definitions in {label} are not a JSON object")]
    NotAnObject { label: String },
}

// ── File-backed definitions ────────────────────────────────────────────────

/// Definitions documents located under an ordered list of search roots
///
/// Roots are listed most specific first (a child theme before its parent,
/// the parent before the plugin's bundled definitions).
#[derive(Debug, Clone)]
pub struct FileSource {
    roots: Vec<PathBuf>,
    relative_path: PathBuf,
}

impl FileSource {
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            roots: Vec::new(),
            relative_path: relative_path.into(),
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            roots: config.search_roots.clone(),
            relative_path: config.definitions_path.clone(),
        }
    }

    /// Append a search root with lower precedence than the existing ones
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Existing definitions files, in root order
    pub fn discover(&self) -> Vec<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(&self.relative_path))
            .filter(|path| path.is_file())
            .collect()
    }

    fn read(path: &Path) -> Result<DocumentBatch, SourceError> {
        let payload = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(DocumentBatch::file(path.display().to_string(), payload))
    }
}

impl DefinitionSource for FileSource {
    fn kind(&self) -> SourceKind {
        SourceKind::File
    }

    fn batches(&self) -> Vec<DocumentBatch> {
        self.discover()
            .iter()
            .filter_map(|path| match Self::read(path) {
                Ok(batch) => Some(batch),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable definitions file");
                    None
                }
            })
            .collect()
    }
}

// ── Persisted records ───────────────────────────────────────────────────────

/// Publication state of a persisted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Published,
    Draft,
    Pending,
    Private,
    Trash,
}

/// A stored record whose content holds one block definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: u64,
    /// Content classification, e.g. `"acb_block"`
    pub classification: String,
    pub status: RecordStatus,
    /// JSON object keyed by the block name
    pub content: String,
}

/// Records handed over by the host's persistence layer
///
/// Only published records of the configured classification become batches,
/// in the order the host supplied them.
#[derive(Debug, Clone, Default)]
pub struct RecordSource {
    classification: String,
    records: Vec<PersistedRecord>,
}

impl RecordSource {
    pub fn new(classification: impl Into<String>) -> Self {
        Self {
            classification: classification.into(),
            records: Vec::new(),
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(config.record_classification.clone())
    }

    pub fn with_records(mut self, records: impl IntoIterator<Item = PersistedRecord>) -> Self {
        self.records.extend(records);
        self
    }

    pub fn push(&mut self, record: PersistedRecord) {
        self.records.push(record);
    }

    /// Records eligible for merging
    pub fn published(&self) -> impl Iterator<Item = &PersistedRecord> {
        self.records.iter().filter(|record| {
            record.status == RecordStatus::Published && record.classification == self.classification
        })
    }
}

impl DefinitionSource for RecordSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Record
    }

    fn batches(&self) -> Vec<DocumentBatch> {
        self.published()
            .map(|record| DocumentBatch::record(format!("record:{}", record.id), record.content.clone()))
            .collect()
    }
}
