// 📊 Zone Aggregator - per-zone hourly rates over complete hunts
//
// Means are hours-weighted (sum / hours); min/max come from per-record rates.
// Balance has its own inclusion rule and its own hour denominator.

use crate::schema::{
    hours, AggregatedZone, HuntRecord, Mode, RateStats, Vocation, ALL_LEVELS, LEVEL_BUCKETS,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ============================================================================
// FILTER
// ============================================================================

/// Optional filters; `None` or empty disables a filter. The level filter
/// also treats "All" as disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFilter {
    pub vocation: Option<String>,
    pub mode: Option<String>,
    pub level: Option<String>,
}

impl ZoneFilter {
    pub fn new(vocation: Option<&str>, mode: Option<&str>, level: Option<&str>) -> Self {
        ZoneFilter {
            vocation: vocation.map(str::to_string),
            mode: mode.map(str::to_string),
            level: level.map(str::to_string),
        }
    }

    fn active(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn vocation(&self) -> Option<&str> {
        Self::active(&self.vocation)
    }

    pub fn mode(&self) -> Option<&str> {
        Self::active(&self.mode)
    }

    pub fn level(&self) -> Option<&str> {
        Self::active(&self.level).filter(|l| *l != ALL_LEVELS)
    }

    /// Whether the Duo balance rule (explicit real balance required) applies
    pub fn is_duo(&self) -> bool {
        self.mode() == Some(Mode::Duo.as_str())
    }

    pub fn matches(&self, record: &HuntRecord) -> bool {
        if !record.is_complete || record.zone.as_deref().map_or(true, str::is_empty) {
            return false;
        }
        if let Some(vocation) = self.vocation() {
            if record.vocation.as_deref() != Some(vocation) {
                return false;
            }
        }
        if let Some(mode) = self.mode() {
            if record.mode.as_deref() != Some(mode) {
                return false;
            }
        }
        if let Some(level) = self.level() {
            if record.level_bucket.as_deref() != Some(level) {
                return false;
            }
        }
        true
    }
}

/// Whether a record's balance counts toward balance statistics.
///
/// Under a Duo filter only hunts with an explicit real balance (and not
/// ignored) count; otherwise everything counts except ignored Duo hunts.
pub fn includes_balance(record: &HuntRecord, filter: &ZoneFilter) -> bool {
    if filter.is_duo() {
        record.has_real_balance && !record.ignore_duo_balance
    } else {
        !(record.is_duo() && record.ignore_duo_balance)
    }
}

// ============================================================================
// ACCUMULATION
// ============================================================================

#[derive(Debug, Default)]
struct ZoneBucket {
    hunts: usize,
    seconds: u64,
    raw_seconds: u64,
    balance_seconds: u64,

    // Sums are widened so a zone of extreme hunts cannot overflow
    xp_sum: i128,
    raw_sum: i128,
    supplies_sum: i128,
    loot_sum: i128,
    balance_sum: i128,

    xp_rates: Vec<f64>,
    raw_rates: Vec<f64>,
    supplies_rates: Vec<f64>,
    loot_rates: Vec<f64>,
    balance_rates: Vec<f64>,
}

impl ZoneBucket {
    fn add(&mut self, record: &HuntRecord, include_balance: bool) {
        let hrs = record.hours();

        self.hunts += 1;
        self.seconds = self.seconds.saturating_add(record.duration_seconds);
        self.xp_sum += i128::from(record.xp_gain);
        self.supplies_sum += i128::from(record.supplies_cost);
        self.loot_sum += i128::from(record.loot_value);

        if include_balance {
            self.balance_sum += i128::from(record.balance);
            self.balance_seconds = self.balance_seconds.saturating_add(record.duration_seconds);
        }

        if hrs > 0.0 {
            self.xp_rates.push(record.xp_gain as f64 / hrs);
            self.supplies_rates.push(record.supplies_cost as f64 / hrs);
            self.loot_rates.push(record.loot_value as f64 / hrs);
            if include_balance {
                self.balance_rates.push(record.balance as f64 / hrs);
            }
        }

        if let Some(raw) = record.raw_xp_gain {
            self.raw_sum += i128::from(raw);
            self.raw_seconds = self.raw_seconds.saturating_add(record.duration_seconds);
            if hrs > 0.0 {
                self.raw_rates.push(raw as f64 / hrs);
            }
        }
    }

    fn finish(self, zone: String) -> AggregatedZone {
        let total_hours = hours(self.seconds);
        let raw_hours = hours(self.raw_seconds);
        let balance_hours = hours(self.balance_seconds);

        AggregatedZone {
            zone,
            hunt_count: self.hunts,
            total_hours,
            xp_gain_per_h: rate(self.xp_sum, total_hours, &self.xp_rates),
            raw_xp_gain_per_h: rate(self.raw_sum, raw_hours, &self.raw_rates),
            supplies_per_h: rate(self.supplies_sum, total_hours, &self.supplies_rates),
            loot_per_h: rate(self.loot_sum, total_hours, &self.loot_rates),
            balance_per_h: rate(self.balance_sum, balance_hours, &self.balance_rates),
        }
    }
}

fn rate(sum: i128, hours: f64, samples: &[f64]) -> RateStats {
    let mean = if hours > 0.0 { sum as f64 / hours } else { 0.0 };
    let (min, max) = min_max(samples);
    RateStats { mean, min, max }
}

fn min_max(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

// ============================================================================
// AGGREGATE
// ============================================================================

/// Group complete, filtered records by zone; best balance/h first.
pub fn aggregate_by_zone(records: &[HuntRecord], filter: &ZoneFilter) -> Vec<AggregatedZone> {
    // Vec + index map keeps zones in first-seen order for a stable sort
    let mut buckets: Vec<(String, ZoneBucket)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records.iter().filter(|r| filter.matches(r)) {
        let Some(zone) = record.zone.as_ref() else {
            continue;
        };
        let slot = *index.entry(zone.clone()).or_insert_with(|| {
            buckets.push((zone.clone(), ZoneBucket::default()));
            buckets.len() - 1
        });
        buckets[slot].1.add(record, includes_balance(record, filter));
    }

    let mut rows: Vec<AggregatedZone> = buckets
        .into_iter()
        .map(|(zone, bucket)| bucket.finish(zone))
        .collect();

    sort_zones(&mut rows, ZoneColumn::BalancePerHour, true);
    rows
}

// ============================================================================
// SORTING
// ============================================================================

/// Sortable columns of the zone table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneColumn {
    Zone,
    Hunts,
    Hours,
    XpPerHour,
    RawXpPerHour,
    SuppliesPerHour,
    LootPerHour,
    BalancePerHour,
}

impl ZoneColumn {
    pub const ALL: [ZoneColumn; 8] = [
        ZoneColumn::Zone,
        ZoneColumn::Hunts,
        ZoneColumn::Hours,
        ZoneColumn::XpPerHour,
        ZoneColumn::RawXpPerHour,
        ZoneColumn::SuppliesPerHour,
        ZoneColumn::LootPerHour,
        ZoneColumn::BalancePerHour,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ZoneColumn::Zone => "Zone",
            ZoneColumn::Hunts => "Hunts",
            ZoneColumn::Hours => "Hours",
            ZoneColumn::XpPerHour => "XP/h",
            ZoneColumn::RawXpPerHour => "Raw XP/h",
            ZoneColumn::SuppliesPerHour => "Supplies/h",
            ZoneColumn::LootPerHour => "Loot/h",
            ZoneColumn::BalancePerHour => "Balance/h",
        }
    }

    pub fn next(&self) -> ZoneColumn {
        let i = ZoneColumn::ALL.iter().position(|c| c == self).unwrap_or(0);
        ZoneColumn::ALL[(i + 1) % ZoneColumn::ALL.len()]
    }

    fn compare(&self, a: &AggregatedZone, b: &AggregatedZone) -> Ordering {
        let by = |x: f64, y: f64| x.partial_cmp(&y).unwrap_or(Ordering::Equal);
        match self {
            ZoneColumn::Zone => a.zone.cmp(&b.zone),
            ZoneColumn::Hunts => a.hunt_count.cmp(&b.hunt_count),
            ZoneColumn::Hours => by(a.total_hours, b.total_hours),
            ZoneColumn::XpPerHour => by(a.xp_gain_per_h.mean, b.xp_gain_per_h.mean),
            ZoneColumn::RawXpPerHour => by(a.raw_xp_gain_per_h.mean, b.raw_xp_gain_per_h.mean),
            ZoneColumn::SuppliesPerHour => by(a.supplies_per_h.mean, b.supplies_per_h.mean),
            ZoneColumn::LootPerHour => by(a.loot_per_h.mean, b.loot_per_h.mean),
            ZoneColumn::BalancePerHour => by(a.balance_per_h.mean, b.balance_per_h.mean),
        }
    }
}

/// Stable sort of an aggregation result by one column
pub fn sort_zones(rows: &mut [AggregatedZone], column: ZoneColumn, descending: bool) {
    rows.sort_by(|a, b| {
        let ord = column.compare(a, b);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
}

// ============================================================================
// FILTER OPTIONS & LIBRARY STATS
// ============================================================================

/// Filter values present among complete records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub vocations: Vec<String>,
    pub modes: Vec<String>,
    /// Ordered by (length, text) so "8-25" sorts before "101-150"
    pub levels: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[HuntRecord]) -> Self {
        let mut vocations = BTreeSet::new();
        let mut modes = BTreeSet::new();
        let mut levels = BTreeSet::new();

        for rec in records.iter().filter(|r| r.is_complete) {
            if let Some(v) = &rec.vocation {
                vocations.insert(v.clone());
            }
            if let Some(m) = &rec.mode {
                modes.insert(m.clone());
            }
            if let Some(l) = &rec.level_bucket {
                levels.insert(l.clone());
            }
        }

        let mut levels: Vec<String> = levels.into_iter().collect();
        levels.sort_by(|a, b| (a.len(), a).cmp(&(b.len(), b)));

        FilterOptions {
            vocations: vocations.into_iter().collect(),
            modes: modes.into_iter().collect(),
            levels,
        }
    }

    /// Level choices with the "All" sentinel first
    pub fn level_choices(&self) -> Vec<String> {
        std::iter::once(ALL_LEVELS.to_string())
            .chain(self.levels.iter().cloned())
            .collect()
    }
}

/// Library-wide counts, independent of completeness
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LibraryStats {
    pub total: usize,
    pub complete: usize,
    pub by_vocation: BTreeMap<String, usize>,
    pub by_mode: BTreeMap<String, usize>,
    pub by_level: BTreeMap<String, usize>,
    pub total_hours: f64,
}

impl LibraryStats {
    pub fn from_records(records: &[HuntRecord]) -> Self {
        let mut stats = LibraryStats {
            total: records.len(),
            ..Default::default()
        };

        // Known values always show up, even at zero
        for v in Vocation::ALL {
            stats.by_vocation.insert(v.as_str().to_string(), 0);
        }
        for m in Mode::ALL {
            stats.by_mode.insert(m.as_str().to_string(), 0);
        }
        for l in LEVEL_BUCKETS {
            stats.by_level.insert(l.to_string(), 0);
        }

        for rec in records {
            if rec.is_complete {
                stats.complete += 1;
            }
            if let Some(v) = &rec.vocation {
                *stats.by_vocation.entry(v.clone()).or_insert(0) += 1;
            }
            if let Some(m) = &rec.mode {
                *stats.by_mode.entry(m.clone()).or_insert(0) += 1;
            }
            if let Some(l) = &rec.level_bucket {
                *stats.by_level.entry(l.clone()).or_insert(0) += 1;
            }
            stats.total_hours += rec.hours();
        }

        stats
    }

    pub fn summary(&self) -> String {
        format!(
            "{} hunts ({} complete, {} pending) | {:.1} hours",
            self.total,
            self.complete,
            self.total - self.complete,
            self.total_hours
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
