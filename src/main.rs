use std::{fs, path::PathBuf, sync::Arc};

use agritrace::{
    config::{self, AppConfig},
    dto::{CreateLogisticsRequest, CreateLotRequest, CreateTransformationRequest},
    services::{LotTraceSummary, TraceabilityService},
    validation::{ChainReport, ValidationResult},
    Dataset, InMemoryStore, ServiceError,
};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize(cli.dataset.clone())?;

    match cli.command {
        Commands::Trace { lot_code } => handle_trace(&context, &lot_code, cli.json),
        Commands::Overview => handle_overview(&context, cli.json),
        Commands::Stats => handle_stats(&context, cli.json),
        Commands::Validate(command) => handle_validate(&context, command, cli.json),
    }
}

#[derive(Parser)]
#[command(
    name = "agritrace",
    about = "Inspect and validate agricultural traceability chains",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,

    #[arg(long, global = true, help = "Dataset file to use instead of the configured one")]
    dataset: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the whole chain of one lot
    Trace {
        #[arg(value_name = "LOT_CODE")]
        lot_code: String,
    },
    /// List every lot with its chain coverage
    Overview,
    /// Dashboard counters
    Stats,
    /// Check a request payload without saving it
    #[command(subcommand)]
    Validate(ValidateCommands),
}

#[derive(Subcommand)]
enum ValidateCommands {
    Lot {
        /// Inline JSON, or a path to a JSON file
        #[arg(value_name = "REQUEST_JSON")]
        request: String,
    },
    Transformation {
        #[arg(value_name = "REQUEST_JSON")]
        request: String,
    },
    Logistics {
        #[arg(value_name = "REQUEST_JSON")]
        request: String,
    },
}

struct CliContext {
    today: NaiveDate,
    service: TraceabilityService<InMemoryStore>,
}

impl CliContext {
    fn initialize(dataset_override: Option<PathBuf>) -> Result<Self> {
        let config: AppConfig =
            config::load_config().context("failed to load application config")?;
        config::init_tracing(&config.log_level, config.log_json);

        let path = dataset_override.unwrap_or_else(|| config.dataset_path());
        let store = Dataset::load_or_default(&path)
            .and_then(Dataset::into_store)
            .with_context(|| format!("failed to load dataset {}", path.display()))?;
        debug!(path = %path.display(), "dataset ready");

        Ok(Self {
            today: config.today(),
            service: TraceabilityService::new(Arc::new(store)),
        })
    }
}

fn handle_trace(context: &CliContext, lot_code: &str, json: bool) -> Result<()> {
    let report = context
        .service
        .trace_chain_by_code(lot_code, context.today)
        .with_context(|| format!("failed to trace lot {}", lot_code))?;

    if json {
        print_json(&report)?;
    } else {
        render_chain(&report);
    }
    Ok(())
}

fn handle_overview(context: &CliContext, json: bool) -> Result<()> {
    let overview = context
        .service
        .overview()
        .context("failed to build overview")?;

    if json {
        print_json(&overview)?;
    } else if overview.is_empty() {
        println!("No lots registered.");
    } else {
        for summary in &overview {
            render_summary(summary);
        }
    }
    Ok(())
}

fn handle_stats(context: &CliContext, json: bool) -> Result<()> {
    let stats = context.service.stats().context("failed to compute stats")?;

    if json {
        print_json(&stats)?;
    } else {
        println!("Lots:             {}", stats.total_lots);
        println!("Transformations:  {}", stats.total_transformations);
        println!("Logistics:        {}", stats.total_logistics);
        println!("Complete chains:  {}", stats.complete_chains);
    }
    Ok(())
}

fn handle_validate(context: &CliContext, command: ValidateCommands, json: bool) -> Result<()> {
    let service = &context.service;
    let outcome = match command {
        ValidateCommands::Lot { request } => {
            let request: CreateLotRequest = read_request(&request)?;
            service.prepare_lot(request, context.today).map(|_| ())
        }
        ValidateCommands::Transformation { request } => {
            let request: CreateTransformationRequest = read_request(&request)?;
            service.prepare_transformation(request).map(|_| ())
        }
        ValidateCommands::Logistics { request } => {
            let request: CreateLogisticsRequest = read_request(&request)?;
            service.prepare_logistics(request).map(|_| ())
        }
    };

    let result = match outcome {
        Ok(()) => ValidationResult::new(),
        Err(ServiceError::ValidationFailed(result)) => result,
        Err(err) => return Err(err).context("failed to validate request"),
    };

    if json {
        print_json(&result)?;
    } else if result.is_valid() {
        println!("valid");
    } else {
        println!("invalid ({} violations)", result.len());
        for violation in result.violations() {
            println!("  - {}", violation);
        }
    }

    if !result.is_valid() {
        std::process::exit(2);
    }
    Ok(())
}

fn read_request<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let body = if raw.trim_start().starts_with('{') {
        raw.to_string()
    } else {
        fs::read_to_string(raw).with_context(|| format!("failed to read request file {}", raw))?
    };
    serde_json::from_str(&body).context("request is not a JSON object")
}

fn render_chain(report: &ChainReport) {
    println!(
        "Lot {} ({}) • consistent: {} • complete: {}",
        report.lot_code,
        report.lot_id,
        yes_no(report.consistent),
        yes_no(report.complete)
    );
    for stage in &report.stages {
        let record = stage
            .record_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "not recorded".to_string());
        let status = if stage.result.is_empty() {
            "ok".to_string()
        } else {
            format!("{} entries", stage.result.len())
        };
        println!("  {:<15} {:<36}  {}", stage.stage, record, status);
        for violation in stage.result.violations() {
            println!("    - {}", violation);
        }
    }
}

fn render_summary(summary: &LotTraceSummary) {
    println!(
        "- {} • {} • harvested {} • transformation: {} • logistics: {}{}",
        summary.code,
        summary.product_type,
        summary.harvest_date,
        yes_no(summary.has_transformation),
        yes_no(summary.has_logistics),
        summary
            .delivery_status
            .as_deref()
            .map(|s| format!(" ({})", s))
            .unwrap_or_default()
    );
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
