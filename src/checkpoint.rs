//! Checkpoint and resume state
//!
//! A checkpoint file records a run signature and the next unprocessed chunk
//! index, persisted after every upserted batch. A rerun with a matching
//! signature resumes where the previous run stopped; a signature mismatch
//! (different collection, model, chapter set or chunking parameters) restarts
//! from zero. Completed runs delete the checkpoint.
//!
//! Only one process is expected to touch a given checkpoint path; there is no
//! file locking.

use crate::config::Config;
use crate::corpus::hex_digest;
use crate::error::{IndexerError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hash over the run-defining configuration, used to decide whether a
/// checkpoint belongs to the current invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSignature(String);

impl RunSignature {
    /// Compute the signature over collection, endpoints, scope and chunking
    /// parameters. `scope` identifies the gathered input set, e.g.
    /// `chapters:3-9` or `folder:/data/corpus`.
    pub fn compute(config: &Config, scope: &str) -> Self {
        let material = format!(
            "collection={}\nqdrant={}\nendpoint={}\nmodel={}\nscope={}\nmax_chars={}\noverlap={}\ninclude_media={}",
            config.qdrant.collection,
            config.qdrant.url,
            config.embedding.endpoint,
            config.embedding.model,
            scope,
            config.chunking.max_chars,
            config.chunking.overlap,
            config.content.include_media,
        );
        Self(hex_digest(&material))
    }

    /// Hex form stored in the checkpoint file
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Persisted resume state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// Signature of the run this checkpoint belongs to
    pub signature: String,

    /// Index of the next unprocessed chunk
    pub next_index: usize,

    /// Total chunk count of the run, for sanity checks and progress
    pub total_docs: usize,

    /// When this checkpoint was last written
    pub updated_at: DateTime<Utc>,
}

/// What the driver should do given the current checkpoint state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumePlan {
    /// Start indexing at chunk 0
    Start,
    /// Resume at the given chunk index
    Resume(usize),
    /// Everything is already indexed; nothing to do
    Skip,
}

/// Decide how to start the run. `existing_points` is the collection's current
/// point count, consulted only when no usable checkpoint exists (the
/// already-complete heuristic; it cannot detect a shrunken document set).
pub fn plan_resume(
    checkpoint: Option<&Checkpoint>,
    signature: &RunSignature,
    total_docs: usize,
    existing_points: u64,
) -> ResumePlan {
    if let Some(cp) = checkpoint {
        if cp.signature != signature.as_str() {
            log::warn!("checkpoint signature mismatch, restarting from zero");
            return ResumePlan::Start;
        }
        if cp.next_index >= total_docs {
            return ResumePlan::Skip;
        }
        log::info!(
            "resuming at chunk {}/{} (checkpoint from {})",
            cp.next_index,
            total_docs,
            cp.updated_at.to_rfc3339()
        );
        return ResumePlan::Resume(cp.next_index);
    }

    if total_docs > 0 && existing_points >= total_docs as u64 {
        log::warn!(
            "collection already holds {} points for {} chunks, skipping \
             (heuristic; does not detect removed documents)",
            existing_points,
            total_docs
        );
        return ResumePlan::Skip;
    }

    ResumePlan::Start
}

/// JSON checkpoint file at a configurable path
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Create a store for the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the checkpoint file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the checkpoint, if any. A malformed file is treated as absent
    /// with a warning; the run then restarts from zero.
    pub fn load(&self) -> Result<Option<Checkpoint>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            IndexerError::Checkpoint(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        match serde_json::from_str(&raw) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(e) => {
                log::warn!(
                    "ignoring malformed checkpoint {}: {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    /// Persist the checkpoint. Written after every upserted batch.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(checkpoint)?;
        std::fs::write(&self.path, json).map_err(|e| {
            IndexerError::Checkpoint(format!("cannot write {}: {}", self.path.display(), e))
        })
    }

    /// Delete the checkpoint file; a missing file is fine.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IndexerError::Checkpoint(format!(
                "cannot delete {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
