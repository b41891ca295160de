use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use news_indexer::{Dependencies, IndexerSettings, IndexingError, LogFormat};

#[derive(Parser)]
#[command(name = "news-indexer")]
#[command(about = "Keeps the news search index in sync with the articles table", long_about = None)]
struct Cli {
    /// Run a single sync cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    let settings = IndexerSettings::from_env();
    init_tracing(settings.as_ref().map(|s| s.log_format).unwrap_or_default());

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Indexer stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, settings: IndexerSettings) -> Result<(), IndexingError> {
    let Dependencies {
        mut orchestrator,
        source,
    } = Dependencies::new(&settings).await?;

    let shutdown = orchestrator.shutdown_handle();
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal");
        shutdown.trigger();
    });

    info!(
        index = %settings.opensearch.index_name,
        batch_size = settings.batch_size,
        interval = ?settings.poll_interval,
        once = cli.once,
        "Indexer started"
    );

    let result = if cli.once {
        orchestrator.run_once().await.map(drop).map_err(IndexingError::from)
    } else {
        orchestrator.run_forever().await;
        Ok(())
    };

    source.close().await;
    info!("Indexer shutdown complete");
    result
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGTERM, only Ctrl-C stops the indexer");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
