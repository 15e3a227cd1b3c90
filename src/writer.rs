// 💾 Metadata Writer - the only path that mutates hunt files
// Merge → backup → tmp file + fsync + rename. All-or-nothing per file.

use crate::schema::keys;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// WRITABLE FIELDS
// ============================================================================

/// Storage keys a metadata edit may touch. Everything else in a hunt file is
/// preserved as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetaField {
    #[serde(rename = "Vocation")]
    Vocation,
    #[serde(rename = "Mode")]
    Mode,
    #[serde(rename = "Vocation duo")]
    VocationDuo,
    #[serde(rename = "Zona")]
    Zone,
    #[serde(rename = "Level")]
    Level,
    #[serde(rename = "Balance Real")]
    BalanceReal,
    #[serde(rename = "Ignore Duo Balance")]
    IgnoreDuoBalance,
}

impl MetaField {
    pub const ALL: [MetaField; 7] = [
        MetaField::Vocation,
        MetaField::Mode,
        MetaField::VocationDuo,
        MetaField::Zone,
        MetaField::Level,
        MetaField::BalanceReal,
        MetaField::IgnoreDuoBalance,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MetaField::Vocation => keys::VOCATION,
            MetaField::Mode => keys::MODE,
            MetaField::VocationDuo => keys::VOCATION_DUO,
            MetaField::Zone => keys::ZONE,
            MetaField::Level => keys::LEVEL,
            MetaField::BalanceReal => keys::BALANCE_REAL,
            MetaField::IgnoreDuoBalance => keys::IGNORE_DUO_BALANCE,
        }
    }

    pub fn from_key(key: &str) -> Option<MetaField> {
        MetaField::ALL.iter().copied().find(|f| f.key() == key)
    }
}

/// A set of new values keyed by writable field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaUpdate {
    fields: BTreeMap<MetaField, Value>,
}

impl MetaUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: MetaField, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(field, value.into());
        self
    }

    /// Builder form of [`MetaUpdate::set`]
    pub fn with(mut self, field: MetaField, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Store the ignore flag the way hunt files spell it
    pub fn set_ignore_duo_balance(&mut self, ignore: bool) -> &mut Self {
        self.set(
            MetaField::IgnoreDuoBalance,
            if ignore { "true" } else { "false" },
        )
    }

    /// Store a real balance as a plain digit string
    pub fn set_balance_real(&mut self, balance: i64) -> &mut Self {
        self.set(MetaField::BalanceReal, balance.to_string())
    }

    pub fn get(&self, field: MetaField) -> Option<&Value> {
        self.fields.get(&field)
    }

    pub fn get_text(&self, field: MetaField) -> Option<&str> {
        self.fields.get(&field).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetaField, &Value)> {
        self.fields.iter().map(|(f, v)| (*f, v))
    }

    /// JSON object form, e.g. for the event log
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.iter()
                .map(|(f, v)| (f.key().to_string(), v.clone()))
                .collect(),
        )
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("hunt file not found: {0}")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} does not hold a JSON object")]
    NotAnObject(String),

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// WRITE
// ============================================================================

/// `<path><suffix>`, e.g. `hunt.json` → `hunt.json.bak`
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Pretty-print `value` into `<path>.tmp`, fsync, then rename over `path`.
/// The temp file is removed on any failure.
pub fn atomic_write_json(path: &Path, value: &Value) -> io::Result<()> {
    let tmp_path = with_suffix(path, ".tmp");

    let result = (|| -> io::Result<()> {
        let body = serde_json::to_string_pretty(value)?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(body.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() && tmp_path.exists() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Merge `update` into the hunt file at `path`.
pub fn write_meta(path: &Path, update: &MetaUpdate) -> Result<(), WriteError> {
    let display = path.display().to_string();

    if !path.is_file() {
        return Err(WriteError::NotFound(display));
    }

    let content = fs::read_to_string(path).map_err(|source| WriteError::Read {
        path: display.clone(),
        source,
    })?;
    let document: Value = serde_json::from_str(&content).map_err(|source| WriteError::Parse {
        path: display.clone(),
        source,
    })?;
    let Value::Object(mut object) = document else {
        return Err(WriteError::NotAnObject(display));
    };

    // Backup once; the first pristine copy is the one worth keeping
    let backup = with_suffix(path, ".bak");
    if !backup.exists() {
        if let Err(e) = fs::copy(path, &backup) {
            log::warn!("Could not create backup {}: {}", backup.display(), e);
        }
    }

    for (field, value) in update.iter() {
        object.insert(field.key().to_string(), value.clone());
    }

    atomic_write_json(path, &Value::Object(object)).map_err(|source| WriteError::Write {
        path: display.clone(),
        source,
    })?;

    log::debug!("Updated {} field(s) in {}", update.len(), display);
    Ok(())
}

/// Boolean contract used by batch callers: true on success, failure logged.
pub fn write_meta_to_json(path: &Path, update: &MetaUpdate) -> bool {
    match write_meta(path, update) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("{}", e);
            false
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use serde_json::json;

    fn write_fixture(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    fn read_object(path: &Path) -> serde_json::Map<String, Value> {
        let text = fs::read_to_string(path).unwrap();
        serde_json::from_str::<Value>(&text)
            .unwrap()
            .as_object()
            .cloned()
            .unwrap()
    }

    fn fixture() -> Value {
        json!({
            "Session length": "2:00h",
            "XP Gain": "2,000,000",
            "Loot": "500,000",
            "Supplies": "200,000",
            "Balance": "300,000",
            "Killed Monsters": [{"Count": 40, "Name": "werehyaena"}],
            "Vocation": "",
            "Mode": "Duo"
        })
    }

    #[test]
    fn test_write_then_normalize_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "hunt.json", &fixture());

        let mut update = MetaUpdate::new();
        update
            .set(MetaField::Vocation, "Paladin")
            .set(MetaField::VocationDuo, "Druid")
            .set(MetaField::Zone, "Werehyaena Cave")
            .set(MetaField::Level, "251-300")
            .set_balance_real(120_000)
            .set_ignore_duo_balance(false);

        assert!(write_meta_to_json(&path, &update));

        let object = read_object(&path);
        let rec = normalize(&path.display().to_string(), &object);

        assert_eq!(rec.vocation.as_deref(), Some("Paladin"));
        assert_eq!(rec.vocation_duo.as_deref(), Some("Druid"));
        assert_eq!(rec.zone.as_deref(), Some("Werehyaena Cave"));
        assert_eq!(rec.level_bucket.as_deref(), Some("251-300"));
        assert_eq!(rec.balance, 120_000);
        assert!(rec.has_real_balance);
        assert!(!rec.ignore_duo_balance);
        assert!(rec.is_complete);

        // untouched fields survive
        let original = fixture();
        assert_eq!(object["XP Gain"], original["XP Gain"]);
        assert_eq!(object["Killed Monsters"], original["Killed Monsters"]);
        assert_eq!(object["Mode"], original["Mode"]);
    }

    #[test]
    fn test_key_order_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "hunt.json", &fixture());

        let before: Vec<String> = read_object(&path).keys().cloned().collect();
        let update = MetaUpdate::new().with(MetaField::Vocation, "Monk");
        write_meta(&path, &update).unwrap();
        let after: Vec<String> = read_object(&path).keys().cloned().collect();

        assert_eq!(before, after);
    }

    #[test]
    fn test_backup_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_fixture(dir.path(), "hunt.json", &fixture());
        let backup = with_suffix(&path, ".bak");

        write_meta(&path, &MetaUpdate::new().with(MetaField::Zone, "First")).unwrap();
        assert!(backup.exists());
        let first_backup = fs::read_to_string(&backup).unwrap();

        write_meta(&path, &MetaUpdate::new().with(MetaField::Zone, "Second")).unwrap();
        assert_eq!(fs::read_to_string(&backup).unwrap(), first_backup);
        assert!(!first_backup.contains("First"));
        assert!(!with_suffix(&path, ".tmp").exists());
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");

        let update = MetaUpdate::new().with(MetaField::Zone, "X");
        assert!(matches!(write_meta(&path, &update), Err(WriteError::NotFound(_))));
        assert!(!write_meta_to_json(&path, &update));
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_and_non_object_files_are_untouched() {
        let dir = tempfile::tempdir().unwrap();

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        let update = MetaUpdate::new().with(MetaField::Zone, "X");
        assert!(matches!(write_meta(&corrupt, &update), Err(WriteError::Parse { .. })));
        assert_eq!(fs::read_to_string(&corrupt).unwrap(), "{ not json");

        let array = write_fixture(dir.path(), "array.json", &json!([1, 2]));
        assert!(matches!(write_meta(&array, &update), Err(WriteError::NotAnObject(_))));
    }

    #[test]
    fn test_meta_update_serde_uses_storage_keys() {
        let update: MetaUpdate =
            serde_json::from_value(json!({"Vocation duo": "none", "Zona": "Issavi"})).unwrap();
        assert_eq!(update.get_text(MetaField::VocationDuo), Some("none"));
        assert_eq!(update.get_text(MetaField::Zone), Some("Issavi"));
        assert_eq!(update.to_json(), json!({"Vocation duo": "none", "Zona": "Issavi"}));
        assert_eq!(MetaField::from_key("Balance Real"), Some(MetaField::BalanceReal));
        assert_eq!(MetaField::from_key("XP Gain"), None);
    }
}
