//! On-disk state for the CLI.
//!
//! A single CBOR file holds the multisig stores and the deferred queue.
//! Saves go to a sibling temp file first and are renamed into place, so a
//! crash mid-write leaves the previous state intact.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use cosign::host::DeferredTransaction;
use cosign::serialization::{from_cbor, to_cbor};
use cosign::store::MultisigState;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub multisig: MultisigState,
    #[serde(default)]
    pub deferred: Vec<DeferredTransaction>,
}

impl StateFile {
    /// Load the state file, or start empty if it does not exist yet.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no state file, starting empty");
            return Ok(Self::default());
        }

        let bytes = fs::read(path)
            .map_err(|e| format!("Failed to read state file '{}': {}", path.display(), e))?;
        let state = from_cbor(&bytes)
            .map_err(|e| format!("Failed to decode state file '{}': {}", path.display(), e))?;
        Ok(state)
    }

    /// Write atomically: temp file in the same directory, then rename.
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let bytes = to_cbor(self).map_err(|e| format!("Failed to encode state: {}", e))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create state directory: {}", e))?;
            }
        }

        let tmp = temp_path(path);
        fs::write(&tmp, bytes)
            .map_err(|e| format!("Failed to write state file '{}': {}", tmp.display(), e))?;
        fs::rename(&tmp, path)
            .map_err(|e| format!("Failed to replace state file '{}': {}", path.display(), e))?;

        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "state".into());
    name.push(".tmp");
    path.with_file_name(name)
}
