// 🧹 Record Normalizer - raw hunt JSON → HuntRecord
// Best effort: every unparseable field degrades to a default, never an error

use crate::schema::{is_valid_level, keys, HuntRecord, Mode, Vocation, DUO_NONE};
use chrono::NaiveDateTime;
use serde_json::{Map, Value};

/// Timestamp format used by "Session start" / "Session end"
pub const SESSION_TIME_FORMAT: &str = "%Y-%m-%d, %H:%M:%S";

/// Tokens accepted as `true` for boolean flags (compared lowercased)
const TRUTHY_TOKENS: [&str; 5] = ["1", "true", "yes", "y", "on"];

// ============================================================================
// FIELD PARSERS
// ============================================================================

/// Integer with optional comma grouping ("1,234,567"). Missing or junk → 0.
pub fn parse_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Bool(b)) => i64::from(*b),
        other => parse_optional_int(other).unwrap_or(0),
    }
}

/// Like [`parse_int`] but keeps "absent" and "unparseable" distinguishable.
pub fn parse_optional_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| parse_grouped(&n.to_string())),
        Value::String(s) => parse_grouped(s),
        _ => None,
    }
}

fn parse_grouped(text: &str) -> Option<i64> {
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<i64>().ok()
}

/// "H:MM" (optionally suffixed with "h") → seconds. Anything else → 0.
pub fn parse_duration_to_sec(value: Option<&Value>) -> u64 {
    let Some(Value::String(text)) = value else {
        return 0;
    };

    let stripped = text.replace('h', "");
    let parts: Vec<&str> = stripped.split(':').collect();
    if parts.len() != 2 {
        return 0;
    }

    let hours = parts[0].trim().parse::<u64>();
    let minutes = parts[1].trim().parse::<u64>();
    match (hours, minutes) {
        (Ok(h), Ok(m)) => h
            .checked_mul(3600)
            .and_then(|s| s.checked_add(m.saturating_mul(60)))
            .unwrap_or(0),
        _ => 0,
    }
}

pub fn parse_datetime(value: Option<&Value>) -> Option<NaiveDateTime> {
    match value? {
        Value::String(text) if !text.is_empty() => {
            NaiveDateTime::parse_from_str(text, SESSION_TIME_FORMAT).ok()
        }
        _ => None,
    }
}

/// Truthy-token flag. JSON booleans and numbers are read in their textual form.
pub fn parse_flag(value: Option<&Value>) -> bool {
    let text = match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return false,
    };
    let token = text.trim().to_lowercase();
    TRUTHY_TOKENS.contains(&token.as_str())
}

/// Trimmed text, `None` when empty
pub fn parse_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ============================================================================
// COMPLETENESS
// ============================================================================

/// True iff every classification field is present, valid and duo-consistent.
pub fn classification_complete(
    vocation: Option<&str>,
    mode: Option<&str>,
    vocation_duo: Option<&str>,
    zone: Option<&str>,
    level_bucket: Option<&str>,
) -> bool {
    let Some(vocation) = vocation.filter(|v| Vocation::parse(v).is_some()) else {
        return false;
    };

    let duo_consistent = match mode.and_then(Mode::parse) {
        Some(Mode::Solo) => vocation_duo == Some(DUO_NONE),
        Some(Mode::Duo) => match vocation_duo {
            Some(duo) => Vocation::parse(duo).is_some() && duo != vocation,
            None => false,
        },
        None => return false,
    };

    duo_consistent
        && zone.is_some_and(|z| !z.is_empty())
        && level_bucket.is_some_and(is_valid_level)
}

// ============================================================================
// NORMALIZE
// ============================================================================

/// Build the canonical record for one raw hunt object.
pub fn normalize(source_id: &str, raw: &Map<String, Value>) -> HuntRecord {
    let xp_gain = parse_int(raw.get(keys::XP_GAIN));
    let raw_xp_gain = parse_optional_int(raw.get(keys::RAW_XP_GAIN));
    let supplies_cost = parse_int(raw.get(keys::SUPPLIES));
    let loot_value = parse_int(raw.get(keys::LOOT));

    let balance_real = parse_optional_int(raw.get(keys::BALANCE_REAL));
    let balance = match balance_real {
        Some(real) => real,
        None if raw.contains_key(keys::BALANCE) => parse_int(raw.get(keys::BALANCE)),
        None => loot_value.saturating_sub(supplies_cost),
    };

    let vocation = parse_text(raw.get(keys::VOCATION));
    let mode = parse_text(raw.get(keys::MODE));
    let vocation_duo = parse_text(raw.get(keys::VOCATION_DUO));
    let zone = parse_text(raw.get(keys::ZONE));
    let level_bucket = parse_text(raw.get(keys::LEVEL));

    let is_complete = classification_complete(
        vocation.as_deref(),
        mode.as_deref(),
        vocation_duo.as_deref(),
        zone.as_deref(),
        level_bucket.as_deref(),
    );

    HuntRecord {
        source_id: source_id.to_string(),
        session_start: parse_datetime(raw.get(keys::SESSION_START)),
        session_end: parse_datetime(raw.get(keys::SESSION_END)),
        duration_seconds: parse_duration_to_sec(raw.get(keys::SESSION_LENGTH)),
        xp_gain,
        raw_xp_gain,
        supplies_cost,
        loot_value,
        balance_real,
        has_real_balance: balance_real.is_some(),
        balance,
        vocation,
        mode,
        vocation_duo,
        zone,
        level_bucket,
        is_complete,
        ignore_duo_balance: parse_flag(raw.get(keys::IGNORE_DUO_BALANCE)),
        raw: raw.clone(),
    }
}

/// Normalize a parsed JSON document; non-object documents are rejected.
pub fn normalize_value(source_id: &str, value: &Value) -> Option<HuntRecord> {
    value.as_object().map(|obj| normalize(source_id, obj))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn complete_solo() -> Map<String, Value> {
        obj(json!({
            "Session start": "2025-03-01, 18:00:00",
            "Session end": "2025-03-01, 19:30:00",
            "Session length": "1:30h",
            "XP Gain": "1,234,567",
            "Raw XP Gain": "987,654",
            "Supplies": "150,000",
            "Loot": "400,000",
            "Balance": "250,000",
            "Vocation": "Knight",
            "Mode": "Solo",
            "Vocation duo": "none",
            "Zona": "Rashid Hunt",
            "Level": "301-350",
            "Killed Monsters": [{"Count": 120, "Name": "cyclops"}]
        }))
    }

    #[test]
    fn test_parse_int_variants() {
        assert_eq!(parse_int(Some(&json!("1,234"))), 1234);
        assert_eq!(parse_int(Some(&json!(" -5,000 "))), -5000);
        assert_eq!(parse_int(Some(&json!(42))), 42);
        assert_eq!(parse_int(Some(&json!("abc"))), 0);
        assert_eq!(parse_int(Some(&json!("1.5"))), 0);
        assert_eq!(parse_int(Some(&Value::Null)), 0);
        assert_eq!(parse_int(None), 0);
    }

    #[test]
    fn test_parse_optional_int() {
        assert_eq!(parse_optional_int(None), None);
        assert_eq!(parse_optional_int(Some(&Value::Null)), None);
        assert_eq!(parse_optional_int(Some(&json!(""))), None);
        assert_eq!(parse_optional_int(Some(&json!("12,000"))), Some(12000));
        assert_eq!(parse_optional_int(Some(&json!(-300))), Some(-300));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration_to_sec(Some(&json!("1:30h"))), 5400);
        assert_eq!(parse_duration_to_sec(Some(&json!("0:45"))), 2700);
        assert_eq!(parse_duration_to_sec(Some(&json!("12:05h"))), 43500);
        assert_eq!(parse_duration_to_sec(Some(&json!("90 minutes"))), 0);
        assert_eq!(parse_duration_to_sec(Some(&json!("1:2:3"))), 0);
        assert_eq!(parse_duration_to_sec(Some(&json!("-1:30"))), 0);
        assert_eq!(parse_duration_to_sec(Some(&json!(5400))), 0);
        assert_eq!(parse_duration_to_sec(None), 0);
    }

    #[test]
    fn test_parse_datetime() {
        let dt = parse_datetime(Some(&json!("2025-03-01, 18:05:09"))).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(dt.hour(), 18);
        assert_eq!(dt.second(), 9);

        assert!(parse_datetime(Some(&json!("2025-03-01 18:05:09"))).is_none());
        assert!(parse_datetime(Some(&json!(""))).is_none());
        assert!(parse_datetime(None).is_none());
    }

    #[test]
    fn test_parse_flag() {
        for token in ["1", "true", "TRUE", " Yes ", "y", "on"] {
            assert!(parse_flag(Some(&json!(token))), "token {:?}", token);
        }
        assert!(parse_flag(Some(&json!(true))));
        assert!(parse_flag(Some(&json!(1))));
        assert!(!parse_flag(Some(&json!("false"))));
        assert!(!parse_flag(Some(&json!("nope"))));
        assert!(!parse_flag(Some(&json!(false))));
        assert!(!parse_flag(Some(&Value::Null)));
        assert!(!parse_flag(None));
    }

    #[test]
    fn test_normalize_complete_record() {
        let rec = normalize("/lib/a.json", &complete_solo());

        assert_eq!(rec.source_id, "/lib/a.json");
        assert_eq!(rec.duration_seconds, 5400);
        assert_eq!(rec.xp_gain, 1_234_567);
        assert_eq!(rec.raw_xp_gain, Some(987_654));
        assert_eq!(rec.supplies_cost, 150_000);
        assert_eq!(rec.loot_value, 400_000);
        assert_eq!(rec.balance, 250_000);
        assert!(!rec.has_real_balance);
        assert_eq!(rec.zone.as_deref(), Some("Rashid Hunt"));
        assert!(rec.session_start.is_some());
        assert!(rec.session_end.is_some());
        assert!(rec.is_complete);
        assert!(!rec.ignore_duo_balance);
        assert!(rec.raw.contains_key("Killed Monsters"));
    }

    #[test]
    fn test_balance_resolution_order() {
        let mut raw = complete_solo();
        raw.insert("Balance Real".into(), json!("99,000"));
        let rec = normalize("a", &raw);
        assert_eq!(rec.balance, 99_000);
        assert!(rec.has_real_balance);

        raw.remove("Balance Real");
        raw.remove("Balance");
        let rec = normalize("a", &raw);
        assert_eq!(rec.balance, 400_000 - 150_000);

        raw.insert("Balance".into(), json!("garbage"));
        let rec = normalize("a", &raw);
        assert_eq!(rec.balance, 0);
    }

    #[test]
    fn test_unparseable_real_balance_is_absent() {
        let mut raw = complete_solo();
        raw.insert("Balance Real".into(), json!(""));
        let rec = normalize("a", &raw);
        assert!(!rec.has_real_balance);
        assert_eq!(rec.balance, 250_000);
    }

    #[test]
    fn test_missing_fields_degrade() {
        let rec = normalize("empty.json", &Map::new());

        assert_eq!(rec.duration_seconds, 0);
        assert_eq!(rec.xp_gain, 0);
        assert_eq!(rec.raw_xp_gain, None);
        assert_eq!(rec.balance, 0);
        assert!(rec.session_start.is_none());
        assert!(rec.vocation.is_none());
        assert!(!rec.is_complete);
    }

    #[test]
    fn test_whitespace_text_is_absent() {
        let mut raw = complete_solo();
        raw.insert("Zona".into(), json!("   "));
        let rec = normalize("a", &raw);
        assert!(rec.zone.is_none());
        assert!(!rec.is_complete);
    }

    #[test]
    fn test_solo_requires_none_duo() {
        let mut raw = complete_solo();
        raw.insert("Vocation duo".into(), json!("Druid"));
        assert!(!normalize("a", &raw).is_complete);
    }

    #[test]
    fn test_duo_completeness() {
        let mut raw = complete_solo();
        raw.insert("Mode".into(), json!("Duo"));
        raw.insert("Vocation duo".into(), json!("Druid"));
        assert!(normalize("a", &raw).is_complete);

        raw.insert("Vocation duo".into(), json!("Knight"));
        assert!(!normalize("a", &raw).is_complete);

        raw.insert("Vocation duo".into(), json!("none"));
        assert!(!normalize("a", &raw).is_complete);

        raw.remove("Vocation duo");
        assert!(!normalize("a", &raw).is_complete);
    }

    #[test]
    fn test_invalid_enumerations() {
        let mut raw = complete_solo();
        raw.insert("Level".into(), json!("1000-2000"));
        assert!(!normalize("a", &raw).is_complete);

        let mut raw = complete_solo();
        raw.insert("Vocation".into(), json!("Necromancer"));
        assert!(!normalize("a", &raw).is_complete);

        let mut raw = complete_solo();
        raw.insert("Mode".into(), json!("Party"));
        assert!(!normalize("a", &raw).is_complete);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = complete_solo();
        assert_eq!(normalize("a", &raw), normalize("a", &raw));
    }

    #[test]
    fn test_normalize_value_rejects_non_objects() {
        assert!(normalize_value("a", &json!([1, 2, 3])).is_none());
        assert!(normalize_value("a", &json!({})).is_some());
    }
}
