// 🧮 Duo Balance Calculator - real balance from pasted in-game text
//
// Two inputs are recognised, tried in this order:
//   Party Hunt analyser block → total party balance split per member
//   Transfer message          → recorded "Balance" minus the amount sent

use crate::schema::keys;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

/// Members assumed when no member blocks are found (the Duo case)
pub const DEFAULT_PARTY_SIZE: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalcError {
    #[error("Paste Party or Transfer text first.")]
    EmptyText,
    #[error("Party or Transfer not detected in the text.")]
    NotDetected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BalanceSource {
    Party { total: i64, members: usize },
    Transfer { amount: i64, recorded: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceCalc {
    pub value: i64,
    pub source: BalanceSource,
}

fn party_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Balance:\s*([\d.,-]+)").expect("valid party total regex"))
}

fn party_member_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*([^\n]+)\r?\n\s+Loot:").expect("valid party member regex")
    })
}

fn transfer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Transfer\s+([\d.,-]+)\s+to\s+.+").expect("valid transfer regex")
    })
}

/// Keep only digits and '-'; "1.234.567" and "1,234,567" both read 1234567.
/// Nothing left (or a stray '-') reads as 0.
pub fn parse_amount(text: &str) -> i64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    cleaned.parse().unwrap_or(0)
}

/// `numerator / denominator` rounded to nearest, ties to even.
/// Results past the i64 range saturate.
pub fn div_round_half_even(numerator: i64, denominator: i64) -> i64 {
    if denominator == 0 {
        return numerator;
    }
    let (n, d) = if denominator < 0 {
        (-i128::from(numerator), -i128::from(denominator))
    } else {
        (i128::from(numerator), i128::from(denominator))
    };
    let q = n.div_euclid(d);
    let twice_rem = 2 * n.rem_euclid(d);
    let rounded = if twice_rem > d || (twice_rem == d && q % 2 != 0) {
        q + 1
    } else {
        q
    };
    i64::try_from(rounded).unwrap_or(if rounded > 0 { i64::MAX } else { i64::MIN })
}

/// Party Hunt block → (total balance, member count, per-member share)
pub fn parse_party(text: &str) -> Option<(i64, usize, i64)> {
    let total = parse_amount(party_total_re().captures(text)?.get(1)?.as_str());
    let members = match party_member_re().find_iter(text).count() {
        0 => DEFAULT_PARTY_SIZE,
        n => n,
    };
    Some((total, members, div_round_half_even(total, members as i64)))
}

/// Transfer message → transferred amount
pub fn parse_transfer(text: &str) -> Option<i64> {
    let caps = transfer_re().captures(text)?;
    Some(parse_amount(caps.get(1)?.as_str()))
}

fn recorded_balance(raw: &Map<String, Value>) -> i64 {
    match raw.get(keys::BALANCE) {
        Some(Value::String(s)) => parse_amount(s),
        Some(Value::Number(n)) => parse_amount(&n.to_string()),
        _ => 0,
    }
}

/// Derive the real balance for one hunt from pasted text
pub fn calculate_real_balance(text: &str, raw: &Map<String, Value>) -> Result<BalanceCalc, CalcError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CalcError::EmptyText);
    }

    if let Some((total, members, share)) = parse_party(text) {
        return Ok(BalanceCalc {
            value: share,
            source: BalanceSource::Party { total, members },
        });
    }

    if let Some(amount) = parse_transfer(text) {
        let recorded = recorded_balance(raw);
        return Ok(BalanceCalc {
            value: recorded.saturating_sub(amount),
            source: BalanceSource::Transfer { amount, recorded },
        });
    }

    Err(CalcError::NotDetected)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PARTY_TEXT: &str = "Session data: From 2025-03-01, 18:00:00 to 2025-03-01, 19:30:00
Session: 01:30h
Loot Type: Leader
Loot: 2,400,000
Supplies: 1,400,001
Balance: 1,000,001
Knightly Boi (Leader)
    Loot: 1,200,000
    Supplies: 900,000
    Balance: 300,000
    Damage: 4,000,000
    Healing: 1,000,000
Druidy Gal
    Loot: 1,200,000
    Supplies: 500,001
    Balance: 699,999
    Damage: 2,000,000
    Healing: 3,000,000";

    fn raw(balance: Value) -> Map<String, Value> {
        json!({ "Balance": balance }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234,567"), 1_234_567);
        assert_eq!(parse_amount("1.234.567"), 1_234_567);
        assert_eq!(parse_amount("-50,000"), -50_000);
        assert_eq!(parse_amount(""), 0);
        assert_eq!(parse_amount("-"), 0);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(div_round_half_even(5, 2), 2);
        assert_eq!(div_round_half_even(7, 2), 4);
        assert_eq!(div_round_half_even(10, 3), 3);
        assert_eq!(div_round_half_even(11, 3), 4);
        assert_eq!(div_round_half_even(-5, 2), -2);
        assert_eq!(div_round_half_even(-7, 2), -4);
        assert_eq!(div_round_half_even(9, 0), 9);
    }

    #[test]
    fn test_extreme_amounts_saturate() {
        assert_eq!(div_round_half_even(i64::MIN, -1), i64::MAX);
        assert_eq!(div_round_half_even(i64::MIN, 2), i64::MIN / 2);
        assert_eq!(div_round_half_even(i64::MAX, -1), -i64::MAX);

        let text = "Transfer 9,223,372,036,854,775,807 to Druidy Gal";
        let calc = calculate_real_balance(text, &raw(json!("-10"))).unwrap();
        assert_eq!(calc.value, i64::MIN);
    }

    #[test]
    fn test_party_block() {
        let (total, members, share) = parse_party(PARTY_TEXT).unwrap();
        assert_eq!(total, 1_000_001);
        assert_eq!(members, 2);
        // 500000.5 rounds to even
        assert_eq!(share, 500_000);
    }

    #[test]
    fn test_party_three_members() {
        let text = "Balance: 900,000
Alpha
    Loot: 1
Beta
    Loot: 2
Gamma
    Loot: 3";
        assert_eq!(parse_party(text), Some((900_000, 3, 300_000)));
    }

    #[test]
    fn test_party_without_members_defaults_to_duo() {
        assert_eq!(parse_party("Balance: 1,001"), Some((1001, 2, 500)));
    }

    #[test]
    fn test_transfer_message() {
        let text = "Transfer 120,000 to Druidy Gal";
        assert_eq!(parse_transfer(text), Some(120_000));
        assert_eq!(parse_transfer("transfer 5 TO someone"), Some(5));
        assert_eq!(parse_transfer("Transfer 5 to"), None);

        let calc = calculate_real_balance(text, &raw(json!("500,000"))).unwrap();
        assert_eq!(calc.value, 380_000);
        assert_eq!(
            calc.source,
            BalanceSource::Transfer {
                amount: 120_000,
                recorded: 500_000
            }
        );

        let numeric = calculate_real_balance(text, &raw(json!(100_000))).unwrap();
        assert_eq!(numeric.value, -20_000);

        let missing = calculate_real_balance(text, &Map::new()).unwrap();
        assert_eq!(missing.value, -120_000);
    }

    #[test]
    fn test_party_wins_over_transfer() {
        let text = format!("{}\nTransfer 1 to Someone", PARTY_TEXT);
        let calc = calculate_real_balance(&text, &Map::new()).unwrap();
        assert!(matches!(calc.source, BalanceSource::Party { members: 2, .. }));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            calculate_real_balance("   ", &Map::new()),
            Err(CalcError::EmptyText)
        );
        assert_eq!(
            calculate_real_balance("hello there", &Map::new()),
            Err(CalcError::NotDetected)
        );
    }
}
