// 📚 Hunt Library - snapshot loading + deduplicated import
//
// The library is a flat directory of hunt JSON files. Imports copy new files
// in from a source folder; the manifest in the store remembers every content
// hash already seen so re-imports are cheap no-ops.

use crate::db::{self, event_types, Event, ManifestEntry, HUNT_ENTITY};
use crate::normalizer::normalize_value;
use crate::schema::HuntRecord;
use anyhow::{anyhow, bail, Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// LOADING
// ============================================================================

/// True for `*.json` (any case). Names starting with `_` are auxiliary files.
pub fn is_hunt_file_name(name: &str) -> bool {
    !name.starts_with('_') && name.to_lowercase().ends_with(".json")
}

/// Hunt files in `dir`, sorted by name. A missing directory is empty.
pub fn hunt_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        let is_hunt = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_hunt_file_name);
        if path.is_file() && is_hunt {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn load_hunt_file(path: &Path) -> Result<HuntRecord> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    normalize_value(&path.to_string_lossy(), &value)
        .ok_or_else(|| anyhow!("{} is not a JSON object", path.display()))
}

/// Load every hunt in the library. Bad files are skipped with a warning.
pub fn load_library(dir: &Path) -> Vec<HuntRecord> {
    let files = match hunt_files(dir) {
        Ok(files) => files,
        Err(e) => {
            log::warn!("Cannot read library {}: {:#}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut records = Vec::with_capacity(files.len());
    for path in files {
        match load_hunt_file(&path) {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("Skipping hunt file: {:#}", e),
        }
    }

    log::info!("Loaded {} hunts from {}", records.len(), dir.display());
    records
}

/// Find a record by file name or full source path
pub fn find_record<'a>(records: &'a [HuntRecord], file: &str) -> Option<&'a HuntRecord> {
    records
        .iter()
        .find(|r| r.source_id == file || r.file_name() == file)
}

/// Resolve a bare file name inside the library, rejecting anything that
/// could escape it.
pub fn resolve_hunt_path(library: &Path, file_name: &str) -> Result<PathBuf> {
    let bare = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| *n == file_name);
    match bare {
        Some(name) if is_hunt_file_name(name) => Ok(library.join(name)),
        _ => bail!("Invalid hunt file name: {}", file_name),
    }
}

// ============================================================================
// IMPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub copied: usize,
    pub ignored: usize,
    /// Library names of the copied files
    pub imported: Vec<String>,
}

impl ImportSummary {
    pub fn summary(&self) -> String {
        format!("{} copied, {} already in library", self.copied, self.ignored)
    }
}

/// Semantic JSON equality; falls back to byte length when either side is
/// not valid JSON.
pub fn same_json(a: &Path, b: &Path) -> bool {
    let read = |p: &Path| -> Option<Value> {
        let text = fs::read_to_string(p).ok()?;
        serde_json::from_str(&text).ok()
    };
    match (read(a), read(b)) {
        (Some(ja), Some(jb)) => ja == jb,
        _ => match (fs::metadata(a), fs::metadata(b)) {
            (Ok(ma), Ok(mb)) => ma.len() == mb.len(),
            _ => false,
        },
    }
}

/// First unused `stem_N.ext` in `dir`, starting at N = 2
pub fn next_free_name(dir: &Path, file_name: &str) -> String {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    (2..)
        .map(|i| format!("{}_{}{}", stem, i, ext))
        .find(|candidate| !dir.join(candidate).exists())
        .unwrap_or_else(|| file_name.to_string())
}

/// Copy new hunt files from `source` into `library`.
///
/// A file whose hash is in the manifest is ignored. A new hash whose name is
/// taken in the library is ignored when the JSON is equal, otherwise copied
/// under the next free `_N` name.
pub fn import_from_source(source: &Path, library: &Path, conn: &Connection) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    if !source.is_dir() {
        log::warn!("Source folder {} does not exist", source.display());
        return Ok(summary);
    }

    fs::create_dir_all(library)
        .with_context(|| format!("Failed to create library {}", library.display()))?;

    for src in hunt_files(source)? {
        let Some(name) = src.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };

        let bytes = fs::read(&src).with_context(|| format!("Failed to read {}", src.display()))?;
        let hash = db::compute_content_hash(&bytes);

        if db::is_known_hash(conn, &hash)? {
            summary.ignored += 1;
            continue;
        }

        let dst = library.join(&name);
        let target_name = if !dst.exists() {
            name.clone()
        } else if same_json(&src, &dst) {
            db::record_manifest(conn, &ManifestEntry::new(&hash, &name, &src.to_string_lossy()))?;
            summary.ignored += 1;
            continue;
        } else {
            next_free_name(library, &name)
        };

        let target = library.join(&target_name);
        fs::copy(&src, &target)
            .with_context(|| format!("Failed to copy {} to {}", src.display(), target.display()))?;

        db::record_manifest(
            conn,
            &ManifestEntry::new(&hash, &target_name, &src.to_string_lossy()),
        )?;
        db::insert_event(
            conn,
            &Event::new(
                event_types::HUNT_IMPORTED,
                HUNT_ENTITY,
                &target_name,
                serde_json::json!({
                    "source": src.to_string_lossy(),
                    "content_hash": hash,
                    "renamed": target_name != name,
                }),
                "import",
            ),
        )?;

        log::debug!("Imported {} as {}", src.display(), target_name);
        summary.copied += 1;
        summary.imported.push(target_name);
    }

    log::info!("Import from {}: {}", source.display(), summary.summary());
    Ok(summary)
}

// ============================================================================
// TESTS
// ============================================================================
