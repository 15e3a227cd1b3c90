// 📤 Export & Display - CSV rows and table cell formatting

use crate::schema::{AggregatedZone, RateStats};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ZoneCsvRow<'a> {
    #[serde(rename = "Zone")]
    zone: &'a str,
    #[serde(rename = "Hunts")]
    hunts: usize,
    #[serde(rename = "Hours")]
    hours: f64,
    #[serde(rename = "XP/h")]
    xp: i64,
    #[serde(rename = "XP/h min")]
    xp_min: i64,
    #[serde(rename = "XP/h max")]
    xp_max: i64,
    #[serde(rename = "Raw XP/h")]
    raw_xp: i64,
    #[serde(rename = "Raw XP/h min")]
    raw_xp_min: i64,
    #[serde(rename = "Raw XP/h max")]
    raw_xp_max: i64,
    #[serde(rename = "Supplies/h")]
    supplies: i64,
    #[serde(rename = "Supplies/h min")]
    supplies_min: i64,
    #[serde(rename = "Supplies/h max")]
    supplies_max: i64,
    #[serde(rename = "Loot/h")]
    loot: i64,
    #[serde(rename = "Loot/h min")]
    loot_min: i64,
    #[serde(rename = "Loot/h max")]
    loot_max: i64,
    #[serde(rename = "Balance/h")]
    balance: i64,
    #[serde(rename = "Balance/h min")]
    balance_min: i64,
    #[serde(rename = "Balance/h max")]
    balance_max: i64,
}

impl<'a> From<&'a AggregatedZone> for ZoneCsvRow<'a> {
    fn from(z: &'a AggregatedZone) -> Self {
        // Rates are exported as whole gold/xp per hour, hours to two decimals
        let r = |v: f64| v.round() as i64;
        ZoneCsvRow {
            zone: &z.zone,
            hunts: z.hunt_count,
            hours: (z.total_hours * 100.0).round() / 100.0,
            xp: r(z.xp_gain_per_h.mean),
            xp_min: r(z.xp_gain_per_h.min),
            xp_max: r(z.xp_gain_per_h.max),
            raw_xp: r(z.raw_xp_gain_per_h.mean),
            raw_xp_min: r(z.raw_xp_gain_per_h.min),
            raw_xp_max: r(z.raw_xp_gain_per_h.max),
            supplies: r(z.supplies_per_h.mean),
            supplies_min: r(z.supplies_per_h.min),
            supplies_max: r(z.supplies_per_h.max),
            loot: r(z.loot_per_h.mean),
            loot_min: r(z.loot_per_h.min),
            loot_max: r(z.loot_per_h.max),
            balance: r(z.balance_per_h.mean),
            balance_min: r(z.balance_per_h.min),
            balance_max: r(z.balance_per_h.max),
        }
    }
}

/// "1234567" → "1,234,567"
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Table cell for a rate: the mean, plus "(min / max)" in high/low mode
pub fn format_rate(stats: &RateStats, hilo: bool) -> String {
    let mean = group_thousands(stats.mean.round() as i64);
    if hilo {
        format!(
            "{} ({} / {})",
            mean,
            group_thousands(stats.min.round() as i64),
            group_thousands(stats.max.round() as i64)
        )
    } else {
        mean
    }
}

/// Write rows as CSV (header included) to any writer
pub fn write_zones_csv<W: io::Write>(writer: W, zones: &[AggregatedZone]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for zone in zones {
        wtr.serialize(ZoneCsvRow::from(zone))
            .context("Failed to serialize zone row")?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_zones_csv(path: &Path, zones: &[AggregatedZone]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_zones_csv(file, zones)?;
    log::info!("Exported {} zones to {}", zones.len(), path.display());
    Ok(())
}
