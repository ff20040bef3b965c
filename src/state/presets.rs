//! Values read from other files via `--from-file`

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use tracing::info;

use super::record::{Levels, StateDocument};
use super::store::StateStore;
use crate::engine::AdjustError;

/// Documents referenced by `--from-file`, read on first use and at most once
#[derive(Debug, Default)]
pub struct Presets {
    documents: HashMap<PathBuf, StateDocument>,
}

impl Presets {
    #[cfg(test)]
    pub fn from_documents(documents: impl IntoIterator<Item = (PathBuf, StateDocument)>) -> Self {
        Self {
            documents: documents.into_iter().collect(),
        }
    }

    /// Values recorded in `path` for the first of `outputs` that file knows
    pub fn levels_for(&mut self, path: &Path, outputs: &[&str]) -> Result<Levels, AdjustError> {
        let document = match self.documents.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let document = StateStore::new(path)
                    .load()
                    .map_err(|source| AdjustError::PresetLoad {
                        path: path.to_path_buf(),
                        source,
                    })?;
                info!(path = %path.display(), "Loaded preset values");
                entry.insert(document)
            }
        };
        outputs
            .iter()
            .find_map(|output| document.levels_for(output))
            .ok_or_else(|| AdjustError::PresetOutputMissing {
                outputs: outputs.join(", "),
                path: path.to_path_buf(),
            })
    }
}
