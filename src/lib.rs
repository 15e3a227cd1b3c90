// Hunt Analyzer - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod schema;         // Hunt model + aggregated value objects
pub mod normalizer;     // Raw JSON → HuntRecord
pub mod pending;        // Validity issues + consistency coercion
pub mod aggregator;     // Per-zone hourly statistics
pub mod writer;         // Durable metadata updates
pub mod db;             // Import manifest + event log (SQLite)
pub mod library;        // Snapshot loading + deduplicated import
pub mod balance_calc;   // Duo real balance from pasted text
pub mod profiles;       // Character presets
pub mod config;         // User config + data directories
pub mod export;         // CSV export

// Re-export commonly used types
pub use schema::{
    AggregatedZone, HuntRecord, Mode, RateStats, Vocation,
    ALL_LEVELS, DUO_NONE, LEVEL_BUCKETS,
};
pub use normalizer::{normalize, normalize_value};
pub use pending::{
    coerce_consistency, find_issues, find_pending, is_resolved,
    IssueKind, PendingRow,
};
pub use aggregator::{
    aggregate_by_zone, sort_zones,
    FilterOptions, LibraryStats, ZoneColumn, ZoneFilter,
};
pub use writer::{write_meta, write_meta_to_json, MetaField, MetaUpdate, WriteError};
pub use db::{
    Event, ManifestEntry,
    open_database, setup_database, insert_event, get_events_for_entity,
};
pub use library::{import_from_source, load_library, ImportSummary};
pub use balance_calc::{calculate_real_balance, BalanceCalc, BalanceSource, CalcError};
pub use profiles::{apply_to_pending, Profile, ProfileStore};
pub use config::{AppConfig, DataPaths};
pub use export::export_zones_csv;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
