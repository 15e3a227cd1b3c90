// 👤 Character Profiles - named (vocation, level) presets
//
// Stored as {"profiles": [{name, vocation, level}, ...]} next to the library.
// Applying a profile stamps its vocation and level onto every pending hunt.

use crate::pending::{coerce_consistency, find_issues};
use crate::schema::{is_valid_level, HuntRecord, Vocation};
use crate::writer::{atomic_write_json, write_meta, MetaField, MetaUpdate};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub vocation: String,
    pub level: String,
}

impl Profile {
    pub fn as_update(&self) -> MetaUpdate {
        MetaUpdate::new()
            .with(MetaField::Vocation, self.vocation.as_str())
            .with(MetaField::Level, self.level.as_str())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: Vec<Profile>,
}

#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profiles: Vec<Profile>,
}

impl ProfileStore {
    /// Load from `path`; a missing or unreadable file yields an empty store.
    pub fn load(path: &Path) -> Self {
        let profiles = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<ProfileFile>(&text) {
                Ok(file) => file.profiles,
                Err(e) => {
                    log::warn!("Ignoring corrupt profiles file {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        ProfileStore {
            path: path.to_path_buf(),
            profiles,
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = ProfileFile {
            profiles: self.profiles.clone(),
        };
        atomic_write_json(&self.path, &serde_json::to_value(&file)?)
            .with_context(|| format!("Failed to save profiles to {}", self.path.display()))
    }

    pub fn list(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Insert or replace by name, keeping list position on replace
    pub fn upsert(&mut self, name: &str, vocation: &str, level: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            bail!("Profile name cannot be empty");
        }
        if Vocation::parse(vocation).is_none() {
            bail!("Unknown vocation: {}", vocation);
        }
        if !is_valid_level(level) {
            bail!("Unknown level range: {}", level);
        }

        let profile = Profile {
            name: name.to_string(),
            vocation: vocation.to_string(),
            level: level.to_string(),
        };
        match self.profiles.iter_mut().find(|p| p.name == name) {
            Some(existing) => *existing = profile,
            None => self.profiles.push(profile),
        }
        Ok(())
    }

    /// Returns whether a profile was removed
    pub fn delete(&mut self, name: &str) -> bool {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.name != name);
        self.profiles.len() != before
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ApplyReport {
    pub updated: Vec<String>,
    pub failed: Vec<String>,
}

/// Write the profile's vocation and level to every pending hunt
pub fn apply_to_pending(profile: &Profile, records: &[HuntRecord]) -> ApplyReport {
    let mut report = ApplyReport::default();
    let update = profile.as_update();

    for record in records.iter().filter(|r| !find_issues(r).is_empty()) {
        let coerced = coerce_consistency(&update, Some(record));
        match write_meta(Path::new(&record.source_id), &coerced) {
            Ok(()) => report.updated.push(record.source_id.clone()),
            Err(e) => {
                log::warn!("Profile {} not applied: {}", profile.name, e);
                report.failed.push(record.source_id.clone());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::load_library;

    #[test]
    fn test_upsert_get_delete_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");

        let mut store = ProfileStore::load(&path);
        assert!(store.list().is_empty());

        store.upsert("Main", "Knight", "301-350").unwrap();
        store.upsert("Alt", "Druid", "101-150").unwrap();
        store.upsert("Main", "Knight", "351-400").unwrap();
        store.save().unwrap();

        let reloaded = ProfileStore::load(&path);
        assert_eq!(reloaded.list().len(), 2);
        assert_eq!(reloaded.list()[0].name, "Main");
        assert_eq!(reloaded.get("Main").unwrap().level, "351-400");

        let mut store = reloaded;
        assert!(store.delete("Alt"));
        assert!(!store.delete("Alt"));
        assert!(store.get("Alt").is_none());
    }

    #[test]
    fn test_upsert_validates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ProfileStore::load(&dir.path().join("p.json"));

        assert!(store.upsert("  ", "Knight", "8-25").is_err());
        assert!(store.upsert("x", "Necromancer", "8-25").is_err());
        assert!(store.upsert("x", "Knight", "9000+").is_err());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(ProfileStore::load(&path).list().is_empty());
    }

    #[test]
    fn test_apply_to_pending_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("done.json"),
            r#"{"Vocation": "Paladin", "Mode": "Solo", "Vocation duo": "none",
                "Zona": "Issavi", "Level": "8-25"}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("todo.json"),
            r#"{"Mode": "Solo", "Vocation duo": "Druid", "Zona": "Issavi"}"#,
        )
        .unwrap();

        let profile = Profile {
            name: "Main".into(),
            vocation: "Knight".into(),
            level: "301-350".into(),
        };
        let report = apply_to_pending(&profile, &load_library(dir.path()));

        assert_eq!(report.updated.len(), 1);
        assert!(report.updated[0].ends_with("todo.json"));
        assert!(report.failed.is_empty());

        let records = load_library(dir.path());
        let done = records.iter().find(|r| r.file_name() == "done.json").unwrap();
        let todo = records.iter().find(|r| r.file_name() == "todo.json").unwrap();
        assert_eq!(done.vocation.as_deref(), Some("Paladin"));
        assert_eq!(todo.vocation.as_deref(), Some("Knight"));
        assert_eq!(todo.level_bucket.as_deref(), Some("301-350"));
        // Solo partner coerced to "none"
        assert_eq!(todo.vocation_duo.as_deref(), Some("none"));
        assert!(todo.is_complete);
    }
}
