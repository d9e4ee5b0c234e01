mod logging;
mod redaction;
mod settings;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use rein_core::{
    Dialect, EvalError, InvalidRuleError, NameCollisionError, Namer, Row, build_predicate,
    check_passes,
};
use rein_plan::{
    PlanError, Planner, PresentConstraints, ValidatedDocument, ValidatedTable, ValidationReport,
    load_rules_document_for, migrate_table, rules_json_schema,
};
use rein_postgres::{ApplyOptions, PostgresHost};
use settings::{ReinSettings, SETTINGS_FILE, SettingsError, load_settings};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use crate::redaction::redact_connection_string;

#[derive(Debug, Error)]
enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Rule(#[from] InvalidRuleError),
    #[error(transparent)]
    Collision(#[from] NameCollisionError),
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("rules document has {0} error(s)")]
    InvalidRules(usize),
    #[error("{0} rule(s) rejected the row")]
    CheckFailed(usize),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
    #[error("logging error: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(name = "rein", version, about = "Declarative CHECK constraints for PostgreSQL")]
struct Cli {
    /// Settings file.
    #[arg(long, global = true, default_value = SETTINGS_FILE)]
    config: PathBuf,
    /// Emit JSON log lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the migration SQL for a rules document.
    Plan(PlanArgs),
    /// Plan against a live database and apply the result.
    Apply(ApplyArgs),
    /// Evaluate a table's rules against a sample row.
    Check(CheckArgs),
    /// Print the rules document JSON Schema.
    Schema,
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Rules document (JSON).
    #[arg(long)]
    rules: PathBuf,
    /// Constraint names already present, one per line (`name[<TAB>fingerprint]`).
    #[arg(long)]
    present: Option<PathBuf>,
    /// Only plan this table (`name` or `schema.name`).
    #[arg(long)]
    table: Option<String>,
}

#[derive(Args, Debug)]
struct ApplyArgs {
    /// Database connection string.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: String,
    /// Rules document (JSON).
    #[arg(long)]
    rules: PathBuf,
    /// Only migrate this table (`name` or `schema.name`).
    #[arg(long)]
    table: Option<String>,
    /// Log the statements instead of executing them.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Lock timeout for each table's migration, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    lock_timeout_ms: u64,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Rules document (JSON).
    #[arg(long)]
    rules: PathBuf,
    /// Table whose rules are evaluated.
    #[arg(long)]
    table: String,
    /// Sample row as a JSON object, e.g. `{"state": "on_loan", "due_date": null}`.
    #[arg(long)]
    row: String,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = load_settings(&cli.config)?;
    logging::init_logging(cli.log_json || settings.log_json).map_err(CliError::Logging)?;

    match cli.command {
        Command::Plan(args) => run_plan(args, &settings),
        Command::Apply(args) => run_apply(args, &settings).await,
        Command::Check(args) => run_check(args, &settings),
        Command::Schema => run_schema(),
    }
}

fn run_plan(args: PlanArgs, settings: &ReinSettings) -> Result<(), CliError> {
    let document = load_document(&args.rules, &dialect_for(settings))?;
    let planner = planner_for(settings, document.prefix.as_deref())?;
    let tables = select_tables(&document, args.table.as_deref())?;

    let present = match &args.present {
        Some(path) => {
            if tables.len() > 1 {
                return Err(CliError::InvalidConfig(
                    "--present describes a single table; select it with --table".to_string(),
                ));
            }
            PresentConstraints::parse_listing(&std::fs::read_to_string(path)?)
        }
        None => PresentConstraints::new(),
    };

    for table in tables {
        let plan = planner.plan(&table.table, &table.rules, &present)?;
        print!("{}", plan.to_sql());
    }
    Ok(())
}

async fn run_apply(args: ApplyArgs, settings: &ReinSettings) -> Result<(), CliError> {
    let engine = detect_engine(&args.conn)?;
    let document = load_document(&args.rules, &dialect_for(settings))?;
    let planner = planner_for(settings, document.prefix.as_deref())?;
    let tables = select_tables(&document, args.table.as_deref())?;

    tracing::info!(
        event = "apply_started",
        engine,
        connection = %redact_connection_string(&args.conn),
        tables = tables.len(),
        dry_run = args.dry_run
    );
    let timer = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&args.conn)
        .await?;
    let host = PostgresHost::with_options(
        pool,
        ApplyOptions {
            lock_timeout: Some(Duration::from_millis(args.lock_timeout_ms)),
            dry_run: args.dry_run,
        },
    );

    for table in tables {
        let plan = migrate_table(&host, &planner, &table.table, &table.rules).await?;
        print!("{}", plan.to_sql());
    }

    let duration_ms = timer.elapsed().as_millis();
    tracing::info!(event = "apply_finished", status = "success", duration_ms = duration_ms);
    Ok(())
}

fn run_check(args: CheckArgs, settings: &ReinSettings) -> Result<(), CliError> {
    let document = load_document(&args.rules, &dialect_for(settings))?;
    let planner = planner_for(settings, document.prefix.as_deref())?;
    let tables = select_tables(&document, Some(&args.table))?;
    let row: Row = serde_json::from_str(&args.row)?;

    let mut failures = 0;
    for table in tables {
        for rule in &table.rules {
            let name = planner.namer().name_for(&table.table.name, rule);
            let expr = match build_predicate(rule, planner.dialect()) {
                Ok(expr) => expr,
                Err(err) => {
                    println!("skip {name}: {err}");
                    continue;
                }
            };
            if check_passes(&expr, &row)? {
                println!("pass {name}");
            } else {
                failures += 1;
                println!("fail {name}: CHECK ({expr})");
            }
        }
    }

    if failures > 0 {
        return Err(CliError::CheckFailed(failures));
    }
    Ok(())
}

fn run_schema() -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(&rules_json_schema())?;
    println!("{json}");
    Ok(())
}

fn load_document(path: &Path, dialect: &Dialect) -> Result<ValidatedDocument, CliError> {
    let contents = std::fs::read_to_string(path)?;
    let json = serde_json::from_str(&contents)?;
    match load_rules_document_for(&json, dialect) {
        Ok(document) => {
            print_report(&ValidationReport {
                errors: Vec::new(),
                warnings: document.warnings.clone(),
            });
            Ok(document)
        }
        Err(report) => {
            print_report(&report);
            Err(CliError::InvalidRules(report.errors.len()))
        }
    }
}

fn print_report(report: &ValidationReport) {
    for issue in report.errors.iter().chain(&report.warnings) {
        eprintln!("{issue}");
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
}

fn dialect_for(settings: &ReinSettings) -> Dialect {
    Dialect::postgres().with_max_identifier_len(settings.max_identifier_len)
}

fn planner_for(settings: &ReinSettings, prefix: Option<&str>) -> Result<Planner, CliError> {
    let dialect = dialect_for(settings);
    let namer = Namer::new(prefix.unwrap_or(&settings.prefix), &dialect)?;
    Ok(Planner::new(dialect, namer))
}

fn select_tables<'a>(
    document: &'a ValidatedDocument,
    table: Option<&str>,
) -> Result<Vec<&'a ValidatedTable>, CliError> {
    let Some(wanted) = table else {
        return Ok(document.tables.iter().collect());
    };

    let selected: Vec<_> = document
        .tables
        .iter()
        .filter(|entry| entry.table.name == wanted || entry.table.to_string() == wanted)
        .collect();
    if selected.is_empty() {
        return Err(CliError::InvalidConfig(format!(
            "table {wanted} is not declared in the rules document"
        )));
    }
    Ok(selected)
}

fn detect_engine(conn: &str) -> Result<&'static str, CliError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(CliError::UnsupportedEngine(redact_connection_string(conn)))
    }
}
