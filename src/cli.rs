//! CLI definition and dispatch.

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_seed_adapter::CsvSeedAdapter;
use crate::adapters::csv_workbook_adapter::CsvWorkbookAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_detail_adapter::{JsonDetailAdapter, NullSession};
use crate::adapters::sqlite_adapter::SqliteAdapter;
use crate::domain::config_validation::{validate_refresh_config, validate_store_config};
use crate::domain::eligibility::EligibilityRules;
use crate::domain::error::ScreenerError;
use crate::domain::record::StockRecord;
use crate::domain::record_store::RecordStore;
use crate::domain::refresh::{CycleSummary, Orchestrator};
use crate::domain::report::ReportBuilder;
use crate::domain::staleness::{DEFAULT_WINDOW_HOURS, StalenessPolicy};
use crate::ports::config_port::ConfigPort;
use crate::ports::kv_port::KeyValuePort;

pub const DEFAULT_REPORT_DIR: &str = "reports";

#[derive(Parser, Debug)]
#[command(name = "stockscreen", about = "Equity universe screener")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Seed the universe from the configured listing
    Seed {
        #[arg(short, long)]
        config: PathBuf,
        /// Run even if the last seed is still fresh
        #[arg(long)]
        force: bool,
    },
    /// Fetch financial statements and reclassify every record
    Detail {
        #[arg(short, long)]
        config: PathBuf,
        /// Run even if the last detail cycle is still fresh
        #[arg(long)]
        force: bool,
    },
    /// Run the seed and detail cycles if they are due
    Refresh {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Write the monthly eligibility report
    Report {
        #[arg(short, long)]
        config: PathBuf,
        /// Report month as YYYY-MM (defaults to the current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// List stored symbols with their tags
    List {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print one record as JSON
    Show {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Seed { config, force } => run_seed(&config, force),
        Command::Detail { config, force } => run_detail(&config, force),
        Command::Refresh { config } => run_refresh(&config),
        Command::Report { config, month } => run_report(&config, month.as_deref()),
        Command::List { config } => run_list(&config),
        Command::Show { config, symbol } => run_show(&config, &symbol),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = ScreenerError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Install the global subscriber. `RUST_LOG` wins over `[log] level`.
pub fn init_logging(config: &dyn ConfigPort) {
    let level = config
        .get_string("log", "level")
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn build_eligibility_rules(config: &dyn ConfigPort) -> EligibilityRules {
    let defaults = EligibilityRules::default();
    EligibilityRules {
        annual_min_growth_pct: config.get_double(
            "eligibility",
            "annual_min_growth_pct",
            defaults.annual_min_growth_pct,
        ),
        quarterly_min_growth_pct: config.get_double(
            "eligibility",
            "quarterly_min_growth_pct",
            defaults.quarterly_min_growth_pct,
        ),
        min_annual_periods: config
            .get_int("eligibility", "min_annual_periods", 2)
            .max(2) as usize,
        min_quarterly_periods: config
            .get_int("eligibility", "min_quarterly_periods", 2)
            .max(2) as usize,
    }
}

pub fn build_staleness_policy(config: &dyn ConfigPort) -> StalenessPolicy {
    StalenessPolicy::new(config.get_double("refresh", "window_hours", DEFAULT_WINDOW_HOURS))
}

pub fn report_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("report", "dir")
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR))
}

/// Parse a `YYYY-MM` month into its first day.
pub fn parse_month(month: &str) -> Result<NaiveDate, ScreenerError> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d").map_err(|_| {
        ScreenerError::ConfigInvalid {
            section: "report".into(),
            key: "month".into(),
            reason: format!("invalid month {month:?} (expected YYYY-MM)"),
        }
    })
}

pub fn run_seed_pipeline(
    backend: &dyn KeyValuePort,
    config: &dyn ConfigPort,
    now_ms: i64,
    force: bool,
) -> Result<CycleSummary, ScreenerError> {
    let seed_path = config.require_string("seed", "path")?;
    let store = RecordStore::new(backend);
    let orchestrator = Orchestrator::new(
        &store,
        build_eligibility_rules(config),
        build_staleness_policy(config),
    );
    let mut provider = CsvSeedAdapter::new(PathBuf::from(seed_path), backend)?;
    orchestrator.run_seed_cycle(&mut provider, now_ms, force)
}

pub fn run_detail_pipeline(
    backend: &dyn KeyValuePort,
    config: &dyn ConfigPort,
    now_ms: i64,
    force: bool,
) -> Result<CycleSummary, ScreenerError> {
    let detail_dir = config.require_string("detail", "dir")?;
    let store = RecordStore::new(backend);
    let orchestrator = Orchestrator::new(
        &store,
        build_eligibility_rules(config),
        build_staleness_policy(config),
    );
    let mut provider = JsonDetailAdapter::new(PathBuf::from(detail_dir), backend)?;
    let mut session = NullSession;
    orchestrator.run_detail_cycle(&mut provider, &mut session, now_ms, force)
}

pub fn run_report_pipeline(
    backend: &dyn KeyValuePort,
    config: &dyn ConfigPort,
    date: NaiveDate,
) -> Option<PathBuf> {
    let store = RecordStore::new(backend);
    let sink = CsvWorkbookAdapter::new();
    ReportBuilder::new(&store, &sink, report_dir(config), build_eligibility_rules(config))
        .generate(date)
}

/// Render a record, with freshly derived metrics, as pretty JSON.
pub fn render_record(
    backend: &dyn KeyValuePort,
    config: &dyn ConfigPort,
    symbol: &str,
) -> Result<String, ScreenerError> {
    let store = RecordStore::new(backend);
    let mut record = store.load(&symbol.to_uppercase())?;
    build_eligibility_rules(config).apply(&mut record);

    let view = serde_json::json!({
        "record": &record,
        "computed": &record.computed,
    });
    serde_json::to_string_pretty(&view).map_err(|e| ScreenerError::CorruptRecord {
        key: record.name.clone(),
        reason: e.to_string(),
    })
}

pub fn format_listing(records: &[StockRecord]) -> Vec<String> {
    let mut lines: Vec<String> = records
        .iter()
        .map(|r| {
            let tags: Vec<&str> = r.list.iter().map(|t| t.as_str()).collect();
            format!("{}\t{}", r.name, tags.join(","))
        })
        .collect();
    lines.sort();
    lines
}

fn print_summary(cycle: &str, summary: &CycleSummary) {
    if !summary.ran {
        eprintln!("{cycle} cycle not due, skipped");
        return;
    }
    eprintln!(
        "{cycle} cycle: {} created, {} updated, {} skipped",
        summary.created,
        summary.updated,
        summary.skipped.len()
    );
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn fail(e: ScreenerError) -> ExitCode {
    eprintln!("error: {e}");
    (&e).into()
}

/// Load and validate config, set up logging, and open the store.
fn prepare(config_path: &PathBuf) -> Result<(FileConfigAdapter, SqliteAdapter), ExitCode> {
    let config = load_config(config_path)?;
    init_logging(&config);

    validate_store_config(&config).map_err(fail)?;
    validate_refresh_config(&config).map_err(fail)?;

    let backend = SqliteAdapter::from_config(&config).map_err(fail)?;
    backend.initialize_schema().map_err(fail)?;
    Ok((config, backend))
}

fn run_seed(config_path: &PathBuf, force: bool) -> ExitCode {
    let (config, backend) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    match run_seed_pipeline(&backend, &config, now_ms(), force) {
        Ok(summary) => {
            print_summary("seed", &summary);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_detail(config_path: &PathBuf, force: bool) -> ExitCode {
    let (config, backend) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    match run_detail_pipeline(&backend, &config, now_ms(), force) {
        Ok(summary) => {
            print_summary("detail", &summary);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_refresh(config_path: &PathBuf) -> ExitCode {
    let (config, backend) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let now = now_ms();
    match run_seed_pipeline(&backend, &config, now, false) {
        Ok(summary) => print_summary("seed", &summary),
        Err(e) => return fail(e),
    }
    match run_detail_pipeline(&backend, &config, now, false) {
        Ok(summary) => print_summary("detail", &summary),
        Err(e) => return fail(e),
    }
    ExitCode::SUCCESS
}

fn run_report(config_path: &PathBuf, month: Option<&str>) -> ExitCode {
    let (config, backend) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let date = match month {
        Some(m) => match parse_month(m) {
            Ok(d) => d,
            Err(e) => return fail(e),
        },
        None => Utc::now().date_naive(),
    };

    match run_report_pipeline(&backend, &config, date) {
        Some(path) => {
            eprintln!("Report written to: {}", path.display());
            ExitCode::SUCCESS
        }
        None => ExitCode::from(5),
    }
}

fn run_list(config_path: &PathBuf) -> ExitCode {
    let (_config, backend) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let records = match RecordStore::new(&backend).load_all() {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    for line in format_listing(&records) {
        println!("{line}");
    }
    eprintln!("{} records", records.len());
    ExitCode::SUCCESS
}

fn run_show(config_path: &PathBuf, symbol: &str) -> ExitCode {
    let (config, backend) = match prepare(config_path) {
        Ok(p) => p,
        Err(code) => return code,
    };

    match render_record(&backend, &config, symbol) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
