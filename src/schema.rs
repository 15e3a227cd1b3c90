// 📐 Hunt Model - canonical record + aggregated value objects
// One HuntRecord per session file, one AggregatedZone per zone per query

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// CLASSIFICATION ENUMERATIONS
// ============================================================================

/// Character vocation. Records carry the free text; this enum is the
/// whitelist it is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vocation {
    Knight,
    Paladin,
    Sorcerer,
    Druid,
    Monk,
}

impl Vocation {
    pub const ALL: [Vocation; 5] = [
        Vocation::Knight,
        Vocation::Paladin,
        Vocation::Sorcerer,
        Vocation::Druid,
        Vocation::Monk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Vocation::Knight => "Knight",
            Vocation::Paladin => "Paladin",
            Vocation::Sorcerer => "Sorcerer",
            Vocation::Druid => "Druid",
            Vocation::Monk => "Monk",
        }
    }

    /// Exact, case-sensitive match against the stored spelling
    pub fn parse(value: &str) -> Option<Vocation> {
        Vocation::ALL.iter().copied().find(|v| v.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Solo,
    Duo,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Solo, Mode::Duo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Solo => "Solo",
            Mode::Duo => "Duo",
        }
    }

    pub fn parse(value: &str) -> Option<Mode> {
        Mode::ALL.iter().copied().find(|m| m.as_str() == value)
    }
}

/// Level ranges hunts are stratified by, in display order
pub const LEVEL_BUCKETS: [&str; 12] = [
    "8-25", "26-50", "51-75", "76-100", "101-150", "151-200", "201-250", "251-300", "301-350",
    "351-400", "401-450", "451-500",
];

/// Level filter value that disables level filtering
pub const ALL_LEVELS: &str = "All";

/// Literal stored in "Vocation duo" for Solo hunts
pub const DUO_NONE: &str = "none";

pub fn is_valid_level(value: &str) -> bool {
    LEVEL_BUCKETS.contains(&value)
}

// ============================================================================
// STORAGE KEYS
// ============================================================================

/// Keys of the on-disk hunt JSON object
pub mod keys {
    pub const XP_GAIN: &str = "XP Gain";
    pub const RAW_XP_GAIN: &str = "Raw XP Gain";
    pub const SUPPLIES: &str = "Supplies";
    pub const LOOT: &str = "Loot";
    pub const BALANCE: &str = "Balance";
    pub const BALANCE_REAL: &str = "Balance Real";
    pub const IGNORE_DUO_BALANCE: &str = "Ignore Duo Balance";
    pub const VOCATION: &str = "Vocation";
    pub const MODE: &str = "Mode";
    pub const VOCATION_DUO: &str = "Vocation duo";
    pub const ZONE: &str = "Zona";
    pub const LEVEL: &str = "Level";
    pub const SESSION_START: &str = "Session start";
    pub const SESSION_END: &str = "Session end";
    pub const SESSION_LENGTH: &str = "Session length";
}

// ============================================================================
// HUNT RECORD
// ============================================================================

/// One normalized hunt session.
///
/// Built only by [`crate::normalizer::normalize`]; `is_complete` and
/// `has_real_balance` are derived there and never set independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HuntRecord {
    /// Path of the backing JSON file, used as the update target
    pub source_id: String,

    pub session_start: Option<NaiveDateTime>,
    pub session_end: Option<NaiveDateTime>,
    pub duration_seconds: u64,

    pub xp_gain: i64,
    pub raw_xp_gain: Option<i64>,
    pub supplies_cost: i64,
    pub loot_value: i64,

    /// Explicit "Balance Real" override, when the file carries a parseable one
    pub balance_real: Option<i64>,
    pub has_real_balance: bool,
    /// Resolved profit: real balance, else "Balance", else loot - supplies
    pub balance: i64,

    pub vocation: Option<String>,
    pub mode: Option<String>,
    pub vocation_duo: Option<String>,
    pub zone: Option<String>,
    pub level_bucket: Option<String>,

    pub is_complete: bool,
    pub ignore_duo_balance: bool,

    /// Backing object as read from disk
    #[serde(skip_serializing)]
    pub raw: Map<String, Value>,
}

impl HuntRecord {
    /// Duration in hours (0.0 for zero-length sessions)
    pub fn hours(&self) -> f64 {
        hours(self.duration_seconds)
    }

    pub fn is_duo(&self) -> bool {
        self.mode.as_deref() == Some(Mode::Duo.as_str())
    }

    pub fn is_solo(&self) -> bool {
        self.mode.as_deref() == Some(Mode::Solo.as_str())
    }

    /// File name of the backing JSON, for display
    pub fn file_name(&self) -> &str {
        std::path::Path::new(&self.source_id)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.source_id)
    }
}

pub fn hours(seconds: u64) -> f64 {
    if seconds == 0 {
        0.0
    } else {
        seconds as f64 / 3600.0
    }
}

// ============================================================================
// AGGREGATED ZONE
// ============================================================================

/// Mean per-hour rate plus the spread of per-record rates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-zone summary produced by [`crate::aggregator::aggregate_by_zone`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedZone {
    pub zone: String,
    pub hunt_count: usize,
    pub total_hours: f64,
    pub xp_gain_per_h: RateStats,
    pub raw_xp_gain_per_h: RateStats,
    pub supplies_per_h: RateStats,
    pub loot_per_h: RateStats,
    pub balance_per_h: RateStats,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocation_parse_is_exact() {
        assert_eq!(Vocation::parse("Knight"), Some(Vocation::Knight));
        assert_eq!(Vocation::parse("Monk"), Some(Vocation::Monk));
        assert_eq!(Vocation::parse("knight"), None);
        assert_eq!(Vocation::parse(DUO_NONE), None);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("Solo"), Some(Mode::Solo));
        assert_eq!(Mode::parse("Duo"), Some(Mode::Duo));
        assert_eq!(Mode::parse("Party"), None);
    }

    #[test]
    fn test_level_buckets() {
        assert_eq!(LEVEL_BUCKETS.len(), 12);
        assert!(is_valid_level("8-25"));
        assert!(is_valid_level("451-500"));
        assert!(!is_valid_level("500-550"));
        assert!(!is_valid_level(ALL_LEVELS));
    }

    #[test]
    fn test_hours() {
        assert_eq!(hours(0), 0.0);
        assert_eq!(hours(3600), 1.0);
        assert_eq!(hours(5400), 1.5);
    }
}
