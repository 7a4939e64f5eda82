//! Sampler checkpointing.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use itc_core::errors::{ErrorInfo, ItcError};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;

/// Serializable snapshot of a sampler between iterations.
///
/// Written only at iteration boundaries, so a payload on disk always holds a
/// complete parameter vector and consistent trace lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointPayload {
    /// Number of iterations completed when the checkpoint was written.
    pub iteration: usize,
    /// Configuration snapshot associated with the run.
    pub config: AnalysisConfig,
    /// Master seed used to derive proposal substreams.
    pub master_seed: u64,
    /// Parameter names in trace order.
    pub names: Vec<String>,
    /// Current parameter values.
    pub values: Vec<f64>,
    /// Current proposal scales.
    pub scales: Vec<f64>,
    /// Retained (thinned, post-burn-in) samples per parameter.
    pub traces: IndexMap<String, Vec<f64>>,
    /// Proposals accepted since the last adaptation window began.
    pub accepted: Vec<usize>,
    /// Proposals made since the last adaptation window began.
    pub proposed: Vec<usize>,
}

impl CheckpointPayload {
    /// Restores the payload from disk.
    pub fn load(path: &Path) -> Result<Self, ItcError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            ItcError::Serde(
                ErrorInfo::new("checkpoint-read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        serde_json::from_str(&contents).map_err(|err| {
            ItcError::Serde(
                ErrorInfo::new("checkpoint-parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Writes the payload to disk.
    pub fn store(&self, path: &Path) -> Result<(), ItcError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                ItcError::Serde(
                    ErrorInfo::new("checkpoint-mkdir", err.to_string())
                        .with_context("path", parent.display().to_string()),
                )
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|err| {
            ItcError::Serde(
                ErrorInfo::new("checkpoint-serialize", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        fs::write(path, json).map_err(|err| {
            ItcError::Serde(
                ErrorInfo::new("checkpoint-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }
}

/// Determines the checkpoint file path using a deterministic numbering scheme.
pub fn checkpoint_path(root: &Path, iteration: usize) -> PathBuf {
    root.join(format!("ckpt_{iteration:08}.json"))
}

/// Lists the checkpoint files already present under `root`, oldest first.
///
/// A missing directory is an empty list; the numbering scheme makes the
/// lexicographic order the write order.
pub fn existing_checkpoints(root: &Path) -> Result<Vec<PathBuf>, ItcError> {
    let Ok(entries) = fs::read_dir(root) else {
        return Ok(Vec::new());
    };
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            ItcError::Serde(
                ErrorInfo::new("checkpoint-scan", err.to_string())
                    .with_context("path", root.display().to_string()),
            )
        })?;
        let path = entry.path();
        let is_checkpoint = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("ckpt_") && name.ends_with(".json"));
        if is_checkpoint {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Deletes the oldest checkpoints until at most `max_to_keep` remain.
pub fn enforce_retention(paths: &mut Vec<PathBuf>, max_to_keep: usize) -> Result<(), ItcError> {
    if paths.len() <= max_to_keep {
        return Ok(());
    }
    let mut removed = Vec::new();
    while paths.len() > max_to_keep {
        removed.push(paths.remove(0));
    }
    for path in removed {
        fs::remove_file(&path).map_err(|err| {
            ItcError::Serde(
                ErrorInfo::new("checkpoint-remove", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
    }
    Ok(())
}
