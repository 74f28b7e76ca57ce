use batchgen::generator::CommandConfig;
use batchgen::{BatchController, BatchObserver, BatchStatus, CommandGenerator, LoggingObserver, NewItem, Statistics};
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;
mod config;

use cli::Cli;
use cli::commands::Commands;
use config::Config;

type Controller = BatchController<Value, String>;

fn setup_logging(level: Option<&str>) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("batchgen")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("batchgen.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::from_default_env();
    // RUST_LOG wins over the configured level
    if std::env::var_os("RUST_LOG").is_none()
        && let Some(level) = level
    {
        builder.parse_filters(level);
    }
    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn load_items(path: &Path) -> Result<Vec<NewItem<Value>>> {
    let content = fs::read_to_string(path).context(format!("Failed to read items file {}", path.display()))?;
    let items: Vec<NewItem<Value>> = serde_yaml::from_str(&content).context("Failed to parse items file")?;
    info!("Loaded {} items from {}", items.len(), path.display());
    Ok(items)
}

fn build_controller(config: &Config) -> Result<Controller> {
    let generator = CommandGenerator::new(
        CommandConfig::new(config.generator.command.clone()).timeout_ms(config.generator.timeout_ms),
    );
    let observers: Vec<Arc<dyn BatchObserver<Value, String>>> = vec![Arc::new(LoggingObserver)];
    let controller = BatchController::with_observers(config.batch_config(), Arc::new(generator), observers)?;
    Ok(controller)
}

async fn run_application(cli: &Cli, config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run {
            items,
            concurrency,
            delay_ms,
            max_retries,
            command,
            retry_failed,
            json,
        } => {
            let config = config.with_overrides(*concurrency, *delay_ms, *max_retries, command.as_deref());
            handle_run_command(items, &config, *retry_failed, *json).await
        }
        Commands::Validate { items } => handle_validate_command(items),
    }
}

async fn handle_run_command(path: &Path, config: &Config, retry_failed: bool, json: bool) -> Result<()> {
    config.validate()?;
    let items = load_items(path)?;
    let controller = build_controller(config)?;

    info!(
        "Running {} items with concurrency {} via `{}`",
        items.len(),
        config.batch.concurrency,
        config.generator.command
    );

    let progress_task = {
        let mut progress = controller.subscribe();
        tokio::spawn(async move {
            while progress.changed().await.is_ok() {
                let p = progress.borrow_and_update().clone();
                eprintln!(
                    "{} {:>5.1}% [{} done, {} failed, {} running, {} pending]",
                    "progress".cyan(),
                    p.percentage,
                    p.completed,
                    p.failed,
                    p.generating,
                    p.pending
                );
            }
        })
    };

    let interrupt_task = {
        let controller = controller.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("{}", "Interrupted, cancelling batch...".yellow());
                controller.cancel();
            }
        })
    };

    let mut stats = controller.start(items).await?;

    if retry_failed {
        while controller.status() != BatchStatus::Cancelled {
            let retried = controller.retry_failed().await;
            if retried.is_empty() {
                break;
            }
            info!("Retried {} failed items", retried.len());
            stats = controller.statistics();
        }
    }

    interrupt_task.abort();
    progress_task.abort();

    if json {
        println!("{}", serde_json::to_string_pretty(&controller.items())?);
    } else {
        print_summary(&controller, &stats);
    }
    Ok(())
}

fn print_summary(controller: &Controller, stats: &Statistics) {
    for item in controller.items().iter().filter(|i| i.error.is_some()) {
        println!(
            "{} {} ({}): {}",
            "failed".red(),
            item.id,
            item.item_type,
            item.error.as_deref().unwrap_or_default()
        );
    }

    let status = controller.status();
    let status_str = match status {
        BatchStatus::Completed => status.to_string().green(),
        BatchStatus::Cancelled => status.to_string().yellow(),
        _ => status.to_string().normal(),
    };
    println!("{} {}", "Batch:".bold(), status_str);
    println!("  {} {}", "Succeeded:".green(), stats.success_count);
    println!("  {} {}", "Failed:".red(), stats.failure_count);
    println!("  Success rate: {:.1}%", stats.success_rate * 100.0);
    if let Some(avg) = stats.average_time_ms {
        println!("  Average time: {:.0}ms", avg);
    }
}

fn handle_validate_command(path: &Path) -> Result<()> {
    let items = load_items(path)?;
    // Adding to an unstarted batch runs the same checks a real run would, without generating
    let controller: Controller = BatchController::new(Default::default(), CommandGenerator::simple("true"))?;
    match controller.add_items(items) {
        Ok(ids) => {
            println!("{} {} items", "Valid:".green(), ids.len());
            Ok(())
        }
        Err(e) => {
            println!("{} {}", "Invalid:".red(), e);
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    setup_logging(config.log_level.as_deref()).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, config).await.context("Application failed")?;

    Ok(())
}
