// ==========================================
// Roster import - CLI entry point
// ==========================================
// build-schema | import-data | report-stats | inspect-source | run-all (default)
// Exit codes: 0 ok, 2 configuration, 3 source access, 1 other
// ==========================================

use clap::{Parser, Subcommand};
use roster_import::domain::RunReport;
use roster_import::importer::sheet_source::open_source;
use roster_import::importer::{
    inspect_source, ImportError, ImportPipeline, ImportResult, SourceInspection,
};
use roster_import::repository::{RecordStore, StatsRepository, StoreStats};
use roster_import::{logging, ImportConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "roster-import")]
#[command(about = "Import the electoral staff roster spreadsheet into SQLite")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (default: ./roster_import.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides the configuration and ROSTER_IMPORT_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print reports as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Create tables and views (safe to repeat)
    BuildSchema,
    /// Import every sheet into an existing schema
    ImportData,
    /// Row counts per table and urban/rural split
    ReportStats,
    /// Sheets, headers, row counts and missing columns of the source (read-only)
    InspectSource,
    /// build-schema, import-data, report-stats
    RunAll,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "run aborted");
            eprintln!("error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> ImportResult<()> {
    let command = cli.command.unwrap_or(Commands::RunAll);
    info!(version = roster_import::VERSION, "{} starting", roster_import::APP_NAME);

    match command {
        Commands::BuildSchema => {
            let config = load_config(cli, false)?;
            let store = RecordStore::open(&config.database.path)?;
            store.build_schema()?;
            let version = store.schema_version()?;
            if cli.json {
                print_json(&serde_json::json!({
                    "database": config.database.path,
                    "schema_version": version,
                }))?;
            } else {
                println!(
                    "Schema ready (version {}): {}",
                    version.unwrap_or_default(),
                    config.database.path.display()
                );
            }
        }
        Commands::ImportData => {
            let config = load_config(cli, true)?;
            let store = RecordStore::open(&config.database.path)?;
            let report = import(&store, &config)?;
            if cli.json {
                print_json(&report)?;
            } else {
                print_run_report(&report);
            }
        }
        Commands::ReportStats => {
            let config = load_config(cli, false)?;
            let store = RecordStore::open(&config.database.path)?;
            let stats = collect_stats(&store)?;
            if cli.json {
                print_json(&stats)?;
            } else {
                print_stats(&stats);
            }
        }
        Commands::InspectSource => {
            let config = load_config(cli, true)?;
            let mut source = open_source(&config.source)?;
            let inspection = inspect_source(source.as_mut(), &config)?;
            if cli.json {
                print_json(&inspection)?;
            } else {
                print_inspection(&inspection);
            }
        }
        Commands::RunAll => {
            let config = load_config(cli, true)?;
            let store = RecordStore::open(&config.database.path)?;
            store.build_schema()?;
            let report = import(&store, &config)?;
            let stats = collect_stats(&store)?;
            if cli.json {
                print_json(&serde_json::json!({ "report": report, "stats": stats }))?;
            } else {
                print_run_report(&report);
                println!();
                print_stats(&stats);
            }
        }
    }
    Ok(())
}

/// Commands that never touch the source fall back to defaults when no file exists
fn load_config(cli: &Cli, require_file: bool) -> ImportResult<ImportConfig> {
    let mut config =
        ImportConfig::load_or_defaults(ImportConfig::locate(cli.config.as_deref()), require_file)?;
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    Ok(config)
}

fn import(store: &RecordStore, config: &ImportConfig) -> ImportResult<RunReport> {
    let mut source = open_source(&config.source)?;
    ImportPipeline::new(store, config).run(source.as_mut())
}

fn collect_stats(store: &RecordStore) -> ImportResult<StoreStats> {
    store.ensure_schema()?;
    Ok(StatsRepository::from_connection(store.connection()).collect()?)
}

fn print_json<T: serde::Serialize>(value: &T) -> ImportResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ImportError::Other(anyhow::Error::new(e)))?;
    println!("{}", text);
    Ok(())
}

fn print_run_report(report: &RunReport) {
    println!("Import run {}", report.run_id);
    println!(
        "{:<16} {:<22} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "entity", "sheet", "read", "ins", "upd", "skip", "err", "drop", "dup"
    );
    for r in &report.entities {
        println!(
            "{:<16} {:<22} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
            r.entity.to_string(),
            r.sheet,
            r.rows_read,
            r.inserted,
            r.updated,
            r.skipped,
            r.errors,
            r.dropped,
            r.duplicates
        );
    }
    let t = report.totals();
    println!(
        "{:<16} {:<22} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "TOTAL", "", t.rows_read, t.inserted, t.updated, t.skipped, t.errors, t.dropped, t.duplicates
    );

    for r in report.entities.iter().filter(|r| !r.issues.is_empty()) {
        println!();
        println!("{} ({}):", r.entity, r.sheet);
        for issue in &r.issues {
            println!(
                "  row {:>5}  {:<9} {}",
                issue.row_number,
                format!("{:?}", issue.level).to_lowercase(),
                issue.message
            );
        }
    }
}

fn print_stats(stats: &StoreStats) {
    println!(
        "Store statistics (schema version {})",
        stats
            .schema_version
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    for table in &stats.tables {
        println!("  {:<16} {:>8}", table.entity.to_string(), table.rows);
    }
    println!("  {:<16} {:>8}", "total", stats.total_rows());
    println!(
        "  operators: {} urban / {} rural",
        stats.operators_by_area.urban, stats.operators_by_area.rural
    );
    println!(
        "  notaries:  {} urban / {} rural",
        stats.notaries_by_area.urban, stats.notaries_by_area.rural
    );
}

fn print_inspection(inspection: &SourceInspection) {
    println!("Source: {}", inspection.source);
    println!("Sheets: {}", inspection.sheets.join(", "));
    println!();
    println!("{:<16} {:<22} {:>6}  {}", "entity", "sheet", "rows", "status");
    for sheet in &inspection.entities {
        let status = if !sheet.present {
            "MISSING SHEET".to_string()
        } else if sheet.missing_columns.is_empty() {
            "ok".to_string()
        } else {
            format!("missing columns: {}", sheet.missing_columns.join(", "))
        };
        println!(
            "{:<16} {:<22} {:>6}  {}",
            sheet.entity.to_string(),
            sheet.sheet,
            sheet.rows,
            status
        );
        if sheet.present {
            println!("{:<16} headers: {}", "", sheet.headers.join(", "));
        }
        if !sheet.missing_optional.is_empty() {
            println!("{:<16} unscoped, no: {}", "", sheet.missing_optional.join(", "));
        }
    }
    println!();
    println!(
        "{}",
        if inspection.is_ready() {
            "Source is ready to import"
        } else {
            "Source is NOT ready to import"
        }
    );
}
