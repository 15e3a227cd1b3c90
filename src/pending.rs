// ✅ Pending Checker - which records still need user attention
// Issues are data, not errors: an empty list means the record is resolved

use crate::schema::{is_valid_level, HuntRecord, Mode, Vocation, DUO_NONE};
use crate::writer::{MetaField, MetaUpdate};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ISSUE TAXONOMY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingVocation,
    InvalidVocation,
    MissingMode,
    InvalidMode,
    MissingZone,
    MissingLevel,
    InvalidLevel,
    /// Solo hunt whose "Vocation duo" is not "none"
    DuoMustBeNone,
    /// Duo hunt without a partner vocation
    DuoMissing,
    /// Duo hunt whose partner vocation equals the main one
    DuoEqualsVocation,
    /// Duo hunt with neither a real balance nor the ignore flag
    BalanceDuoRequired,
}

impl IssueKind {
    pub const ALL: [IssueKind; 11] = [
        IssueKind::MissingVocation,
        IssueKind::InvalidVocation,
        IssueKind::MissingMode,
        IssueKind::InvalidMode,
        IssueKind::MissingZone,
        IssueKind::MissingLevel,
        IssueKind::InvalidLevel,
        IssueKind::DuoMustBeNone,
        IssueKind::DuoMissing,
        IssueKind::DuoEqualsVocation,
        IssueKind::BalanceDuoRequired,
    ];

    /// Stable identifier, suitable as a translation key
    pub fn key(&self) -> &'static str {
        match self {
            IssueKind::MissingVocation => "pending.issue.missing_vocation",
            IssueKind::InvalidVocation => "pending.issue.invalid_vocation",
            IssueKind::MissingMode => "pending.issue.missing_mode",
            IssueKind::InvalidMode => "pending.issue.invalid_mode",
            IssueKind::MissingZone => "pending.issue.missing_zone",
            IssueKind::MissingLevel => "pending.issue.missing_level",
            IssueKind::InvalidLevel => "pending.issue.invalid_level",
            IssueKind::DuoMustBeNone => "pending.issue.duo_must_be_none",
            IssueKind::DuoMissing => "pending.issue.duo_missing",
            IssueKind::DuoEqualsVocation => "pending.issue.duo_cannot_equal_vocation",
            IssueKind::BalanceDuoRequired => "pending.issue.balance_duo_required",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            IssueKind::MissingVocation => "Missing vocation",
            IssueKind::InvalidVocation => "Invalid vocation",
            IssueKind::MissingMode => "Missing mode",
            IssueKind::InvalidMode => "Invalid mode",
            IssueKind::MissingZone => "Missing zone",
            IssueKind::MissingLevel => "Missing level",
            IssueKind::InvalidLevel => "Invalid level",
            IssueKind::DuoMustBeNone => "In Solo, 'Vocation duo' must be 'none'",
            IssueKind::DuoMissing => "In Duo, select 'Vocation duo'",
            IssueKind::DuoEqualsVocation => {
                "In Duo, 'Vocation duo' cannot be the same as 'Vocation'"
            }
            IssueKind::BalanceDuoRequired => {
                "In Duo, set Balance Real or mark 'Ignore Duo Balance'"
            }
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// ============================================================================
// CHECKS
// ============================================================================

/// All issues of one record, in check order.
pub fn find_issues(record: &HuntRecord) -> Vec<IssueKind> {
    let mut issues = Vec::new();

    let vocation = record.vocation.as_deref().unwrap_or("");
    let mode = record.mode.as_deref().unwrap_or("");
    let zone = record.zone.as_deref().unwrap_or("");
    let level = record.level_bucket.as_deref().unwrap_or("");
    let duo = record.vocation_duo.as_deref().unwrap_or("");

    if vocation.is_empty() {
        issues.push(IssueKind::MissingVocation);
    } else if Vocation::parse(vocation).is_none() {
        issues.push(IssueKind::InvalidVocation);
    }

    if mode.is_empty() {
        issues.push(IssueKind::MissingMode);
    } else if Mode::parse(mode).is_none() {
        issues.push(IssueKind::InvalidMode);
    }

    if zone.is_empty() {
        issues.push(IssueKind::MissingZone);
    }

    if level.is_empty() {
        issues.push(IssueKind::MissingLevel);
    } else if !is_valid_level(level) {
        issues.push(IssueKind::InvalidLevel);
    }

    match Mode::parse(mode) {
        Some(Mode::Solo) => {
            if duo != DUO_NONE {
                issues.push(IssueKind::DuoMustBeNone);
            }
        }
        Some(Mode::Duo) => {
            if duo.is_empty() || duo == DUO_NONE {
                issues.push(IssueKind::DuoMissing);
            } else if !vocation.is_empty() && duo == vocation {
                issues.push(IssueKind::DuoEqualsVocation);
            }

            if !record.has_real_balance && !record.ignore_duo_balance {
                issues.push(IssueKind::BalanceDuoRequired);
            }
        }
        None => {}
    }

    issues
}

pub fn is_resolved(record: &HuntRecord) -> bool {
    find_issues(record).is_empty()
}

// ============================================================================
// PENDING WORKLIST
// ============================================================================

/// One row of the pending worklist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingRow {
    pub source_id: String,
    pub vocation: String,
    pub mode: String,
    pub vocation_duo: String,
    pub zone: String,
    pub level: String,
    pub balance_real: Option<i64>,
    pub ignore_duo_balance: bool,
    pub issues: Vec<IssueKind>,
}

impl PendingRow {
    pub fn issue_summary(&self) -> String {
        self.issues
            .iter()
            .map(|i| i.message())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Records that still have at least one issue, in input order.
pub fn find_pending(records: &[HuntRecord]) -> Vec<PendingRow> {
    records
        .iter()
        .filter_map(|rec| {
            let issues = find_issues(rec);
            if issues.is_empty() {
                return None;
            }
            Some(PendingRow {
                source_id: rec.source_id.clone(),
                vocation: rec.vocation.clone().unwrap_or_default(),
                mode: rec.mode.clone().unwrap_or_default(),
                vocation_duo: rec.vocation_duo.clone().unwrap_or_default(),
                zone: rec.zone.clone().unwrap_or_default(),
                level: rec.level_bucket.clone().unwrap_or_default(),
                balance_real: rec.balance_real,
                ignore_duo_balance: rec.ignore_duo_balance,
                issues,
            })
        })
        .collect()
}

// ============================================================================
// CONSISTENCY COERCION
// ============================================================================

/// Normalize a user edit before it is written.
///
/// `current` supplies the record's existing values for fields the update
/// does not touch. Solo forces the partner to "none"; Duo with an absent,
/// "none" or duplicate partner clears it so the record stays pending.
pub fn coerce_consistency(update: &MetaUpdate, current: Option<&HuntRecord>) -> MetaUpdate {
    let mut coerced = update.clone();

    let pick = |field: MetaField, fallback: Option<&String>| -> String {
        update
            .get_text(field)
            .map(|s| s.trim().to_string())
            .or_else(|| fallback.cloned())
            .unwrap_or_default()
    };

    let mode = pick(MetaField::Mode, current.and_then(|r| r.mode.as_ref()));
    let vocation = pick(MetaField::Vocation, current.and_then(|r| r.vocation.as_ref()));
    let duo = pick(
        MetaField::VocationDuo,
        current.and_then(|r| r.vocation_duo.as_ref()),
    );

    match Mode::parse(&mode) {
        Some(Mode::Solo) => {
            coerced.set(MetaField::VocationDuo, DUO_NONE);
        }
        Some(Mode::Duo) => {
            if duo.is_empty() || duo == DUO_NONE || duo == vocation {
                coerced.set(MetaField::VocationDuo, "");
            }
        }
        None => {}
    }

    coerced
}

// ============================================================================
// TESTS
// ============================================================================
