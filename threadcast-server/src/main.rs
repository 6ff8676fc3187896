//! threadcast-server - HTTP API for drafting and posting threads

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::StreamExt;
use libthreadcast::config::PlatformKind;
use libthreadcast::logging::LoggingConfig;
use libthreadcast::service::events::{Event, EventReceiver};
use libthreadcast::service::ThreadcastService;
use libthreadcast::{Config, ThreadcastError};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use threadcast_server::{build_router, AppState};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "threadcast-server")]
#[command(version, about = "Serve the Threadcast HTTP API")]
#[command(long_about = r#"Serve the Threadcast HTTP API.

Configuration is read from $THREADCAST_CONFIG or ~/.config/threadcast/config.toml.
Credentials come from the environment (or a .env file):
    X_API_KEY, X_API_SECRET, X_ACCESS_TOKEN, X_ACCESS_SECRET   posting to X
    GEMINI_API_KEY                                             generation

EXIT CODES:
    0 - Clean shutdown
    1 - Server error
    2 - Configuration error (missing credentials, bad config file)
"#)]
struct Cli {
    /// Address to listen on (overrides server.bind)
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<String>,

    /// Posting backend: mock or x (overrides posting.platform)
    #[arg(short, long, value_name = "PLATFORM")]
    platform: Option<PlatformKind>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("info", cli.verbose).init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<ThreadcastError>()
            .map(ThreadcastError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(platform) = cli.platform {
        config.posting.platform = platform;
    }

    let bind = config.server.bind.clone();
    let service = ThreadcastService::from_config(config)?;
    info!(
        "Posting to '{}'; generation {}",
        service.platform_name(),
        if service.generation().is_enabled() {
            "enabled"
        } else {
            "disabled"
        }
    );

    tokio::spawn(log_events(service.subscribe()));

    let app = build_router(AppState::new(service));
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("listening on {}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("threadcast-server stopped");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let mut signals = match Signals::new([SIGINT, SIGTERM]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Signal setup failed, graceful shutdown disabled: {}", e);
            return std::future::pending::<()>().await;
        }
    };

    if let Some(signal) = signals.next().await {
        info!("Received signal {}, shutting down gracefully...", signal);
    }
}

async fn log_events(mut events: EventReceiver) {
    loop {
        match events.recv().await {
            Ok(Event::ThreadCompleted { run_id, post_ids }) => {
                info!("run {}: posted {} post(s)", run_id, post_ids.len());
            }
            Ok(Event::ThreadFailed {
                run_id,
                step,
                index,
                error,
                posted,
            }) => {
                warn!(
                    "run {}: {} failed at post {} after {} post(s): {}",
                    run_id,
                    step,
                    index,
                    posted.len(),
                    error
                );
            }
            Ok(event) => debug!("{:?}", event),
            Err(RecvError::Lagged(missed)) => debug!("Event logger skipped {} events", missed),
            Err(RecvError::Closed) => break,
        }
    }
}
