//! PageMind - On-device page assistant.

mod app;
mod cli;
mod serve;

use std::path::PathBuf;

use clap::Parser;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pagemind_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use pagemind_runtime::PipelineOutcome;

use app::App;
use cli::{Cli, Commands};

fn init_tracing(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Console output goes to stderr; stdout carries the response stream.
    let file_layer = if config.file {
        let log_dir = PathBuf::from(ConfigLoader::expand_path(
            &config.directory.to_string_lossy(),
        ));
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("pagemind")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&log_dir)?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        static GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
    } else {
        None
    };

    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ConfigLoader::load_or_default(&cli.config)?;
    init_tracing(&config.logging)?;

    if let Err(e) = run(cli.command.unwrap_or(Commands::Serve), &config).await {
        error!("{}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(command: Commands, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    for warning in ConfigValidator::validate(config)?.into_result()? {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    let app = App::build(config)?;
    match command {
        Commands::Serve => run_serve(app).await,
        Commands::Summarize { file, focus } => run_summarize(app, file, focus).await,
        Commands::Sweep => run_sweep(app).await,
    }
}

async fn run_serve(app: App) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting PageMind v{}", env!("CARGO_PKG_VERSION"));

    let sweeper = app.sweeper().map(|sweeper| sweeper.spawn());
    let (tx, rx) = mpsc::unbounded_channel();
    let dispatcher = app.dispatcher(tx.clone());

    serve::serve(
        dispatcher,
        tx,
        rx,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!(
        "PageMind stopped, {} sessions still live",
        app.pipelines.pool().live_total()
    );
    Ok(())
}

async fn run_summarize(
    app: App,
    file: PathBuf,
    focus: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = tokio::fs::read_to_string(&file).await?;
    info!("Summarizing {} ({} chars)", file.display(), content.chars().count());

    let report = |message: &str| warn!("{}", message);
    let outcome = app
        .pipelines
        .summarize(&content, focus.as_deref().unwrap_or(""), Some(&report))
        .await;

    match outcome {
        PipelineOutcome::Completed(summary) => {
            println!("{}", summary);
            Ok(())
        }
        PipelineOutcome::Failed(sentinel) => Err(sentinel.into()),
    }
}

async fn run_sweep(app: App) -> Result<(), Box<dyn std::error::Error>> {
    let Some(sweeper) = app.sweeper() else {
        println!("Store is disabled, nothing to sweep");
        return Ok(());
    };

    let report = sweeper.sweep_once().await?;
    println!(
        "Removed {} expired keys, pruned {} expired entries",
        report.removed_keys, report.pruned_elements
    );
    Ok(())
}
