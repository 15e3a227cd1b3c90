// ⚙️ Configuration - user settings file + data directory layout
//
// Settings:  <config_dir>/hunt-analyzer/config.json
// Data root: <data_local_dir>/HuntAnalyzer/ (or $HUNT_ANALYZER_HOME)
//   json/           hunt library
//   library.db      import manifest + event log
//   profiles.json   character presets

use crate::writer::atomic_write_json;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "HuntAnalyzer";
pub const CONFIG_DIR_NAME: &str = "hunt-analyzer";
/// Overrides the data root when set
pub const DATA_HOME_ENV: &str = "HUNT_ANALYZER_HOME";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Folder hunt exports are imported from
    pub source_folder: Option<PathBuf>,
    /// Library location override; defaults to `<data root>/json`
    pub library_dir: Option<PathBuf>,
    /// Filters pre-selected in the zone views
    pub default_vocation: Option<String>,
    pub default_mode: Option<String>,
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_default()
            .join(CONFIG_DIR_NAME)
            .join("config.json")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Missing file → defaults; corrupt file → defaults with a warning
    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return AppConfig::default(),
        };
        match serde_json::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring corrupt config {}: {}", path.display(), e);
                AppConfig::default()
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        atomic_write_json(path, &serde_json::to_value(self)?)
            .with_context(|| format!("Failed to write config {}", path.display()))
    }

    /// Resolve where library, store and profiles live
    pub fn paths(&self) -> DataPaths {
        let mut paths = DataPaths::under(&data_root());
        if let Some(library) = &self.library_dir {
            paths.library = library.clone();
        }
        paths
    }
}

pub fn data_root() -> PathBuf {
    match std::env::var_os(DATA_HOME_ENV) {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => dirs::data_local_dir().unwrap_or_default().join(APP_DIR_NAME),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataPaths {
    pub root: PathBuf,
    pub library: PathBuf,
    pub db: PathBuf,
    pub profiles: PathBuf,
}

impl DataPaths {
    pub fn under(root: &Path) -> Self {
        DataPaths {
            root: root.to_path_buf(),
            library: root.join("json"),
            db: root.join("library.db"),
            profiles: root.join("profiles.json"),
        }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.library)
            .with_context(|| format!("Failed to create library {}", self.library.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            AppConfig::load_from(&dir.path().join("config.json")),
            AppConfig::default()
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = AppConfig {
            source_folder: Some(PathBuf::from("/games/hunts")),
            library_dir: None,
            default_vocation: Some("Knight".into()),
            default_mode: None,
        };
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path), config);
    }

    #[test]
    fn test_corrupt_and_partial_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        fs::write(&path, "not json").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());

        // Unknown keys and missing fields are tolerated
        fs::write(&path, r#"{"source_folder": "/x", "language": "es"}"#).unwrap();
        let config = AppConfig::load_from(&path);
        assert_eq!(config.source_folder, Some(PathBuf::from("/x")));
        assert!(config.default_mode.is_none());
    }

    #[test]
    fn test_data_paths_layout() {
        let paths = DataPaths::under(Path::new("/data/HuntAnalyzer"));
        assert_eq!(paths.library, PathBuf::from("/data/HuntAnalyzer/json"));
        assert_eq!(paths.db, PathBuf::from("/data/HuntAnalyzer/library.db"));
        assert_eq!(paths.profiles, PathBuf::from("/data/HuntAnalyzer/profiles.json"));

        let config = AppConfig {
            library_dir: Some(PathBuf::from("/elsewhere")),
            ..Default::default()
        };
        assert_eq!(config.paths().library, PathBuf::from("/elsewhere"));
    }
}
