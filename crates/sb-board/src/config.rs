use std::path::{Path, PathBuf};

use sb_types::DEFAULT_TAB_NAME;
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub data_dir: PathBuf,
    /// Snapshot document, relative to `data_dir`.
    pub snapshot_file: PathBuf,
    /// Blob store directory, relative to `data_dir`.
    pub blob_dir: PathBuf,
    pub default_tab_name: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            snapshot_file: PathBuf::from("soundboardState.json"),
            blob_dir: PathBuf::from("files"),
            default_tab_name: DEFAULT_TAB_NAME.into(),
        }
    }
}

impl BoardConfig {
    /// Defaults rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> BoardResult<Self> {
        toml::from_str(text).map_err(|e| BoardError::Config(e.to_string()))
    }

    /// Read a TOML config file. Relative `data_dir` values resolve against
    /// the file's directory.
    pub fn load(path: impl AsRef<Path>) -> BoardResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BoardError::Config(format!("{}: {e}", path.display())))?;
        let mut config = Self::from_toml_str(&text)?;
        if config.data_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.data_dir = parent.join(&config.data_dir);
            }
        }
        Ok(config)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }

    pub fn blob_path(&self) -> PathBuf {
        self.data_dir.join(&self.blob_dir)
    }
}
