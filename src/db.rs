use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// One imported hunt file, keyed by the hash of its bytes
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ManifestEntry {
    /// SHA-256 of the file contents (hex)
    pub content_hash: String,
    /// Name under which the file landed in the library
    pub file_name: String,
    /// Where it was copied from
    pub source_path: String,
    pub imported_at: DateTime<Utc>,
}

impl ManifestEntry {
    pub fn new(content_hash: &str, file_name: &str, source_path: &str) -> Self {
        Self {
            content_hash: content_hash.to_string(),
            file_name: file_name.to_string(),
            source_path: source_path.to_string(),
            imported_at: Utc::now(),
        }
    }
}

/// Event for audit trail: imports and metadata edits
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// Event types written by the library and the surfaces
pub mod event_types {
    pub const HUNT_IMPORTED: &str = "hunt_imported";
    pub const META_UPDATED: &str = "meta_updated";
    pub const BALANCE_CALCULATED: &str = "balance_calculated";
    pub const PROFILE_APPLIED: &str = "profile_applied";
}

/// Entity type used for every hunt-file event
pub const HUNT_ENTITY: &str = "hunt";

/// SHA-256 hex digest of raw file bytes
pub fn compute_content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Open (creating if needed) the store at `path` and ensure its schema
pub fn open_database(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Import manifest (content hash → library file)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS library_manifest (
            content_hash TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            source_path TEXT NOT NULL,
            imported_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_manifest_file ON library_manifest(file_name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// MANIFEST
// ============================================================================

pub fn is_known_hash(conn: &Connection, content_hash: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM library_manifest WHERE content_hash = ?1",
            params![content_hash],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Record an imported file. Returns false when the hash was already known.
pub fn record_manifest(conn: &Connection, entry: &ManifestEntry) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO library_manifest (
            content_hash, file_name, source_path, imported_at
        ) VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.content_hash,
            entry.file_name,
            entry.source_path,
            entry.imported_at.to_rfc3339(),
        ],
    )?;
    Ok(changed > 0)
}

pub fn get_manifest(conn: &Connection) -> Result<Vec<ManifestEntry>> {
    let mut stmt = conn.prepare(
        "SELECT content_hash, file_name, source_path, imported_at
         FROM library_manifest
         ORDER BY imported_at, file_name",
    )?;

    let entries = stmt
        .query_map([], |row| {
            let imported_at: String = row.get(3)?;
            Ok(ManifestEntry {
                content_hash: row.get(0)?,
                file_name: row.get(1)?,
                source_path: row.get(2)?,
                imported_at: parse_timestamp(3, &imported_at)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

pub fn manifest_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM library_manifest", [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Events for one entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

pub fn get_recent_events(conn: &Connection, limit: usize) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         ORDER BY timestamp DESC, id DESC
         LIMIT ?1",
    )?;

    let events = stmt
        .query_map(params![limit as i64], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    let timestamp_str: String = row.get(1)?;
    let data_json: String = row.get(5)?;

    Ok(Event {
        event_id: row.get(0)?,
        timestamp: parse_timestamp(1, &timestamp_str)?,
        event_type: row.get(2)?,
        entity_type: row.get(3)?,
        entity_id: row.get(4)?,
        data: serde_json::from_str(&data_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
        actor: row.get(6)?,
    })
}

fn parse_timestamp(column: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_manifest_import_twice() {
        let conn = test_db();
        let hash = compute_content_hash(b"{\"Zona\": \"Issavi\"}");
        let entry = ManifestEntry::new(&hash, "hunt.json", "/source/hunt.json");

        assert!(!is_known_hash(&conn, &hash).unwrap());

        let first = record_manifest(&conn, &entry).unwrap();
        let second = record_manifest(&conn, &entry).unwrap();

        assert!(first, "First import should record the hash");
        assert!(!second, "Second import of the same bytes is a no-op");
        assert!(is_known_hash(&conn, &hash).unwrap());
        assert_eq!(manifest_count(&conn).unwrap(), 1);

        let manifest = get_manifest(&conn).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].file_name, "hunt.json");
        assert_eq!(manifest[0].source_path, "/source/hunt.json");
    }

    #[test]
    fn test_compute_content_hash() {
        let hash1 = compute_content_hash(b"abc");
        let hash2 = compute_content_hash(b"abc");

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64, "SHA-256 hash should be 64 hex characters");
        assert_eq!(
            hash1,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(hash1, compute_content_hash(b"abd"));
    }

    #[test]
    fn test_event_log() {
        let conn = test_db();

        let event = Event::new(
            event_types::META_UPDATED,
            HUNT_ENTITY,
            "hunt_1.json",
            serde_json::json!({"Zona": "Rashid Hunt"}),
            "cli",
        );
        insert_event(&conn, &event).unwrap();
        insert_event(
            &conn,
            &Event::new(
                event_types::HUNT_IMPORTED,
                HUNT_ENTITY,
                "other.json",
                serde_json::json!({}),
                "import",
            ),
        )
        .unwrap();

        let events = get_events_for_entity(&conn, HUNT_ENTITY, "hunt_1.json").unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "meta_updated");
        assert_eq!(events[0].actor, "cli");
        assert_eq!(events[0].data["Zona"], "Rashid Hunt");

        assert_eq!(get_recent_events(&conn, 10).unwrap().len(), 2);
        assert_eq!(get_recent_events(&conn, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_open_database_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("library.db");

        let conn = open_database(&path).unwrap();

        assert!(path.exists());
        assert_eq!(manifest_count(&conn).unwrap(), 0);
    }
}
