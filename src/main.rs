// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use std::io::Read;
use std::path::{Path, PathBuf};

use hunt_analyzer::db::{self, event_types, HUNT_ENTITY};
use hunt_analyzer::export::{format_rate, group_thousands};
use hunt_analyzer::library::{load_hunt_file, resolve_hunt_path};
use hunt_analyzer::{
    aggregate_by_zone, apply_to_pending, calculate_real_balance, coerce_consistency,
    export_zones_csv, find_issues, find_pending, import_from_source, load_library, sort_zones,
    write_meta, AppConfig, DataPaths, Event, HuntRecord, LibraryStats, MetaField, MetaUpdate,
    ProfileStore, ZoneColumn, ZoneFilter,
};

#[derive(Parser)]
#[command(name = "hunt-analyzer", version)]
#[command(about = "Hunt session library: per-zone profit/XP rates and metadata upkeep")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy new hunt files from the source folder into the library
    Import {
        /// Source folder (defaults to the configured one)
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Per-zone rates for the selected filters
    Zones {
        #[arg(long)]
        vocation: Option<String>,
        #[arg(long)]
        mode: Option<String>,
        /// Level range, or "All"
        #[arg(long)]
        level: Option<String>,
        /// Show min/max next to each mean
        #[arg(long)]
        hilo: bool,
        #[arg(long, value_enum, default_value_t = SortColumn::Balance)]
        sort: SortColumn,
        /// Ascending instead of descending
        #[arg(long)]
        asc: bool,
        /// Also write the table to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Hunts that still need metadata
    Pending,
    /// Update the metadata of one hunt file
    SetMeta {
        /// Library file name or path
        file: String,
        #[arg(long)]
        vocation: Option<String>,
        #[arg(long)]
        mode: Option<String>,
        /// Partner vocation ("none" for Solo)
        #[arg(long)]
        duo: Option<String>,
        #[arg(long)]
        zone: Option<String>,
        #[arg(long)]
        level: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        balance_real: Option<i64>,
        #[arg(long)]
        ignore_duo_balance: Option<bool>,
    },
    /// Derive a Duo real balance from Party Hunt or Transfer text
    CalcBalance {
        file: String,
        /// Text file to read (stdin when omitted)
        #[arg(long)]
        text: Option<PathBuf>,
        /// Store the result as "Balance Real"
        #[arg(long)]
        save: bool,
    },
    /// Library totals by vocation, mode and level
    Stats,
    /// Import and edit history of one hunt file
    History { file: String },
    /// Character presets
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Interactive zone browser
    Ui,
}

#[derive(Subcommand)]
enum ProfileAction {
    List,
    Save {
        name: String,
        #[arg(long)]
        vocation: String,
        #[arg(long)]
        level: String,
    },
    Delete { name: String },
    /// Write the profile's vocation and level to every pending hunt
    Apply { name: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    SetSource { dir: PathBuf },
    SetLibrary { dir: PathBuf },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortColumn {
    Zone,
    Hunts,
    Hours,
    Xp,
    RawXp,
    Supplies,
    Loot,
    Balance,
}

impl From<SortColumn> for ZoneColumn {
    fn from(col: SortColumn) -> Self {
        match col {
            SortColumn::Zone => ZoneColumn::Zone,
            SortColumn::Hunts => ZoneColumn::Hunts,
            SortColumn::Hours => ZoneColumn::Hours,
            SortColumn::Xp => ZoneColumn::XpPerHour,
            SortColumn::RawXp => ZoneColumn::RawXpPerHour,
            SortColumn::Supplies => ZoneColumn::SuppliesPerHour,
            SortColumn::Loot => ZoneColumn::LootPerHour,
            SortColumn::Balance => ZoneColumn::BalancePerHour,
        }
    }
}

/// Loaded settings plus resolved data locations
struct Workspace {
    config: AppConfig,
    paths: DataPaths,
}

impl Workspace {
    fn load() -> Result<Self> {
        let config = AppConfig::load();
        let paths = config.paths();
        paths.ensure()?;
        Ok(Self { config, paths })
    }

    fn open_db(&self) -> Result<Connection> {
        db::open_database(&self.paths.db)
    }

    fn records(&self) -> Vec<HuntRecord> {
        load_library(&self.paths.library)
    }

    /// Accept a library file name or a path to an existing file
    fn hunt_path(&self, file: &str) -> Result<PathBuf> {
        let direct = Path::new(file);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }
        resolve_hunt_path(&self.paths.library, file)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let ws = Workspace::load()?;

    match cli.command.unwrap_or(Commands::Ui) {
        Commands::Import { source } => run_import(&ws, source)?,
        Commands::Zones {
            vocation,
            mode,
            level,
            hilo,
            sort,
            asc,
            csv,
        } => {
            let filter = ZoneFilter {
                vocation: vocation.or_else(|| ws.config.default_vocation.clone()),
                mode: mode.or_else(|| ws.config.default_mode.clone()),
                level,
            };
            run_zones(&ws, &filter, hilo, sort.into(), !asc, csv.as_deref())?
        }
        Commands::Pending => run_pending(&ws),
        Commands::SetMeta {
            file,
            vocation,
            mode,
            duo,
            zone,
            level,
            balance_real,
            ignore_duo_balance,
        } => {
            let mut update = MetaUpdate::new();
            let text_fields = [
                (MetaField::Vocation, vocation),
                (MetaField::Mode, mode),
                (MetaField::VocationDuo, duo),
                (MetaField::Zone, zone),
                (MetaField::Level, level),
            ];
            for (field, value) in text_fields {
                if let Some(value) = value {
                    update.set(field, value);
                }
            }
            if let Some(balance) = balance_real {
                update.set_balance_real(balance);
            }
            if let Some(ignore) = ignore_duo_balance {
                update.set_ignore_duo_balance(ignore);
            }
            run_set_meta(&ws, &file, update)?
        }
        Commands::CalcBalance { file, text, save } => run_calc_balance(&ws, &file, text, save)?,
        Commands::Stats => run_stats(&ws),
        Commands::History { file } => run_history(&ws, &file)?,
        Commands::Profile { action } => run_profile(&ws, action)?,
        Commands::Config { action } => run_config(ws, action)?,
        Commands::Ui => run_ui_mode(&ws)?,
    }

    Ok(())
}

fn run_import(ws: &Workspace, source: Option<PathBuf>) -> Result<()> {
    println!("📥 Import - source folder → hunt library");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let Some(source) = source.or_else(|| ws.config.source_folder.clone()) else {
        bail!("No source folder. Pass --source DIR or run: hunt-analyzer config set-source DIR");
    };

    println!("\n📂 Source:  {}", source.display());
    println!("📚 Library: {}", ws.paths.library.display());

    let conn = ws.open_db()?;
    let summary = import_from_source(&source, &ws.paths.library, &conn)?;

    println!("\n✓ Copied:  {}", summary.copied);
    println!("✓ Ignored: {} (already in library)", summary.ignored);
    for name in &summary.imported {
        println!("   + {}", name);
    }
    println!("✓ Manifest holds {} files", db::manifest_count(&conn)?);

    Ok(())
}

fn run_zones(
    ws: &Workspace,
    filter: &ZoneFilter,
    hilo: bool,
    column: ZoneColumn,
    descending: bool,
    csv: Option<&Path>,
) -> Result<()> {
    let records = ws.records();
    let mut zones = aggregate_by_zone(&records, filter);
    sort_zones(&mut zones, column, descending);

    println!(
        "📊 Zones | vocation: {} | mode: {} | level: {}",
        filter.vocation().unwrap_or("any"),
        filter.mode().unwrap_or("any"),
        filter.level().unwrap_or("All")
    );
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if zones.is_empty() {
        println!("No complete hunts match these filters.");
    } else {
        let width = if hilo { 34 } else { 12 };
        println!(
            "{:<28} {:>5} {:>7} {:>w$} {:>w$} {:>w$} {:>w$} {:>w$}",
            "Zone",
            "Hunts",
            "Hours",
            "XP/h",
            "Raw XP/h",
            "Supplies/h",
            "Loot/h",
            "Balance/h",
            w = width
        );
        for z in &zones {
            println!(
                "{:<28} {:>5} {:>7.2} {:>w$} {:>w$} {:>w$} {:>w$} {:>w$}",
                z.zone,
                z.hunt_count,
                z.total_hours,
                format_rate(&z.xp_gain_per_h, hilo),
                format_rate(&z.raw_xp_gain_per_h, hilo),
                format_rate(&z.supplies_per_h, hilo),
                format_rate(&z.loot_per_h, hilo),
                format_rate(&z.balance_per_h, hilo),
                w = width
            );
        }
    }

    if let Some(path) = csv {
        export_zones_csv(path, &zones)?;
        println!("\n✓ Exported {} zones to {}", zones.len(), path.display());
    }

    Ok(())
}

fn run_pending(ws: &Workspace) {
    let rows = find_pending(&ws.records());

    println!("📝 Pending hunts: {}", rows.len());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    for row in &rows {
        let name = Path::new(&row.source_id)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| row.source_id.clone());
        println!(
            "\n• {}  [{} | {} | duo: {} | {} | {}]",
            name, row.vocation, row.mode, row.vocation_duo, row.zone, row.level
        );
        for issue in &row.issues {
            println!("   ⚠️  {}", issue.message());
        }
    }
}

fn run_set_meta(ws: &Workspace, file: &str, update: MetaUpdate) -> Result<()> {
    if update.is_empty() {
        bail!("Nothing to update. Pass at least one field option.");
    }

    let path = ws.hunt_path(file)?;
    let current = load_hunt_file(&path)?;
    let coerced = coerce_consistency(&update, Some(&current));

    write_meta(&path, &coerced).with_context(|| format!("Failed to update {}", path.display()))?;
    log_hunt_event(ws, &path, event_types::META_UPDATED, coerced.to_json(), "cli")?;

    println!("✓ Updated {}", path.display());
    let updated = load_hunt_file(&path)?;
    let issues = find_issues(&updated);
    if issues.is_empty() {
        println!("✅ Hunt is complete");
    } else {
        for issue in issues {
            println!("   ⚠️  {}", issue.message());
        }
    }

    Ok(())
}

fn run_calc_balance(ws: &Workspace, file: &str, text: Option<PathBuf>, save: bool) -> Result<()> {
    let path = ws.hunt_path(file)?;
    let record = load_hunt_file(&path)?;

    let pasted = match text {
        Some(text_path) => std::fs::read_to_string(&text_path)
            .with_context(|| format!("Failed to read {}", text_path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read text from stdin")?;
            buf
        }
    };

    let calc = calculate_real_balance(&pasted, &record.raw)?;
    println!("🧮 Real balance: {}", group_thousands(calc.value));

    if save {
        let update = MetaUpdate::new().with(MetaField::BalanceReal, calc.value.to_string());
        write_meta(&path, &update)?;
        log_hunt_event(
            ws,
            &path,
            event_types::BALANCE_CALCULATED,
            serde_json::to_value(calc)?,
            "cli",
        )?;
        println!("✓ Saved as \"Balance Real\" in {}", path.display());
    }

    Ok(())
}

fn run_stats(ws: &Workspace) {
    let stats = LibraryStats::from_records(&ws.records());

    println!("📈 Library: {}", stats.summary());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("\nBy vocation:");
    for (vocation, count) in &stats.by_vocation {
        println!("   {:<10} {:>6}", vocation, count);
    }
    println!("\nBy mode:");
    for (mode, count) in &stats.by_mode {
        println!("   {:<10} {:>6}", mode, count);
    }
    println!("\nBy level:");
    for (level, count) in stats.by_level.iter().filter(|(_, c)| **c > 0) {
        println!("   {:<10} {:>6}", level, count);
    }
}

fn run_history(ws: &Workspace, file: &str) -> Result<()> {
    let conn = ws.open_db()?;
    let name = entity_id(&ws.hunt_path(file)?);
    let events = db::get_events_for_entity(&conn, HUNT_ENTITY, &name)?;

    println!("🕓 History of {} ({} events)", name, events.len());
    for event in events {
        println!(
            "   {}  {:<20} {:<8} {}",
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
            event.event_type,
            event.actor,
            event.data
        );
    }
    Ok(())
}

fn run_profile(ws: &Workspace, action: ProfileAction) -> Result<()> {
    let mut store = ProfileStore::load(&ws.paths.profiles);

    match action {
        ProfileAction::List => {
            if store.list().is_empty() {
                println!("No profiles yet.");
            }
            for p in store.list() {
                println!("👤 {:<20} {:<10} {}", p.name, p.vocation, p.level);
            }
        }
        ProfileAction::Save {
            name,
            vocation,
            level,
        } => {
            store.upsert(&name, &vocation, &level)?;
            store.save()?;
            println!("✓ Saved profile {}", name);
        }
        ProfileAction::Delete { name } => {
            if store.delete(&name) {
                store.save()?;
                println!("✓ Deleted profile {}", name);
            } else {
                println!("No profile named {}", name);
            }
        }
        ProfileAction::Apply { name } => {
            let Some(profile) = store.get(&name) else {
                bail!("No profile named {}", name);
            };
            let report = apply_to_pending(profile, &ws.records());
            let conn = ws.open_db()?;
            for source in &report.updated {
                db::insert_event(
                    &conn,
                    &Event::new(
                        event_types::PROFILE_APPLIED,
                        HUNT_ENTITY,
                        &entity_id(Path::new(source)),
                        serde_json::to_value(profile)?,
                        "cli",
                    ),
                )?;
            }
            println!(
                "✓ Applied {} to {} pending hunts ({} failed)",
                profile.name,
                report.updated.len(),
                report.failed.len()
            );
        }
    }

    Ok(())
}

fn run_config(ws: Workspace, action: ConfigAction) -> Result<()> {
    let mut config = ws.config;

    match action {
        ConfigAction::Show => {
            println!("⚙️  Config: {}", AppConfig::default_path().display());
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("\nData paths:");
            println!("{}", serde_json::to_string_pretty(&ws.paths)?);
            return Ok(());
        }
        ConfigAction::SetSource { dir } => {
            if !dir.is_dir() {
                bail!("{} is not a directory", dir.display());
            }
            config.source_folder = Some(dir);
        }
        ConfigAction::SetLibrary { dir } => {
            config.library_dir = Some(dir);
        }
    }

    config.save()?;
    println!("✓ Config saved to {}", AppConfig::default_path().display());
    Ok(())
}

/// Events are keyed by library file name
fn entity_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn log_hunt_event(
    ws: &Workspace,
    path: &Path,
    event_type: &str,
    data: serde_json::Value,
    actor: &str,
) -> Result<()> {
    let conn = ws.open_db()?;
    db::insert_event(
        &conn,
        &Event::new(event_type, HUNT_ENTITY, &entity_id(path), data, actor),
    )
}

#[cfg(feature = "tui")]
fn run_ui_mode(ws: &Workspace) -> Result<()> {
    println!("🖥️  Loading Hunt Analyzer UI...\n");

    let records = ws.records();
    println!("✓ Loaded {} hunts from {}\n", records.len(), ws.paths.library.display());
    println!("Starting UI... (Press 'q' to quit)\n");

    let filter = ZoneFilter {
        vocation: ws.config.default_vocation.clone(),
        mode: ws.config.default_mode.clone(),
        level: None,
    };
    let mut app = ui::App::new(records, ws.paths.library.clone(), filter);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_ws: &Workspace) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use web UI: cargo run --bin hunt-server --features server");
    std::process::exit(1);
}
