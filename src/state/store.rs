use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::record::StateDocument;

/// Reads and writes the JSON values file
///
/// No locking: two invocations racing on the same file resolve as last write wins.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<StateDocument> {
        debug!(path = %self.path.display(), "Reading values file");
        let contents = fs::read_to_string(&self.path)
            .context(format!("Failed to read values file {}", self.path.display()))?;
        StateDocument::parse(&contents)
            .context(format!("Failed to parse values file {}", self.path.display()))
    }

    /// Replace the values file with `document`
    ///
    /// The JSON is written to a sibling temporary file first and renamed over the
    /// target, so a crash mid-write leaves the previous values in place.
    pub fn save(&self, document: &StateDocument) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .context(format!("Failed to create values directory: {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(document)
            .context("Failed to serialize values to JSON")?;

        let temp_path = self.temp_path();
        let mut file = fs::File::create(&temp_path)
            .context(format!("Failed to create {}", temp_path.display()))?;
        file.write_all(contents.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.sync_all())
            .context(format!("Failed to write {}", temp_path.display()))?;
        drop(file);

        fs::rename(&temp_path, &self.path).context(format!(
            "Failed to move {} into place at {}",
            temp_path.display(),
            self.path.display()
        ))?;

        info!(path = %self.path.display(), "Saved values file");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::record::{Gamma, OutputRecord, SharedRecord};
    use serde_json::Map;

    fn sample_records() -> StateDocument {
        let mut left = OutputRecord::new("HDMI-1", Gamma::new(1.0, 1.025, 1.05), 0.9);
        left.alias = Some("left".to_string());
        left.gamma_step = Some(Gamma::new(0.5, 0.5, 0.5));
        let mut right = OutputRecord::new("DP-2", Gamma::new(1.0, 1.0, 1.0), 1.1);
        right.brightness_step = Some(0.05);
        StateDocument::PerOutput(vec![left, right])
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("values.json"));

        let document = sample_records();
        store.save(&document).unwrap();

        assert_eq!(store.load().unwrap(), document);
    }

    #[test]
    fn test_repeated_save_is_byte_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("values.json"));

        store.save(&sample_records()).unwrap();
        let first = fs::read(store.path()).unwrap();

        let reloaded = store.load().unwrap();
        store.save(&reloaded).unwrap();
        let second = fs::read(store.path()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_shared_record_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("shared.json"));

        let document = StateDocument::Shared(SharedRecord {
            outputs: vec!["HDMI-1".to_string(), "DP-2".to_string()],
            alias: None,
            gamma: Gamma::new(1.0, 1.0, 1.0),
            brightness: 0.7,
            gamma_step: None,
            brightness_step: None,
            extra: Map::new(),
        });
        store.save(&document).unwrap();

        assert_eq!(store.load().unwrap(), document);
    }

    #[test]
    fn test_save_creates_parent_directory_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("values.json");
        let store = StateStore::new(&path);

        store.save(&sample_records()).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("nested").join("values.json.tmp").exists());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("absent.json"));

        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("Failed to read values file"));
    }

    #[test]
    fn test_load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");
        fs::write(&path, r#"[{"output": "HDMI-1", "gamma": [1, 1, 1]}]"#).unwrap();

        let err = StateStore::new(&path).load().unwrap_err();
        assert!(format!("{err:#}").contains("brightness"));
    }
}
