// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  reqlog: request/response logging middleware demo
//
//  Stack:   HeadOverride(RequestLogger(WidgetsApi))
//  Input:   YAML request fixtures (built-in sample by default)
//  Config:  YAML + REQLOG_* environment overrides
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

mod demo;
mod replay;

use clap::Parser;
use demo::WidgetsApi;
use reqlog_core::LoggerConfig;
use reqlog_middleware::{App, Defaults, Halt, HeadOverride, Options, RequestLogger};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "reqlog", version, about = "Replay requests through the reqlog middleware")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "reqlog.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// YAML file with the requests to replay. Uses a built-in sample when omitted.
    #[arg(long)]
    requests: Option<PathBuf>,

    /// Render each log group as a single JSON object.
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "reqlog starting");

    // ── Config ──
    let mut config = if cli.config.exists() {
        info!(path = %cli.config.display(), "Loading config file");
        LoggerConfig::load(&cli.config)?
    } else {
        info!("No config file found, using defaults");
        LoggerConfig::default()
    };
    if cli.json {
        config.render_json = true;
    }

    let defaults = Defaults::from_config(&config);
    info!(
        render_json = defaults.render_json,
        headers = ?defaults.headers,
        filter = defaults.filter.is_some(),
        "Logger configured"
    );

    // ── Stack ──
    let api = Arc::new(WidgetsApi::new());
    let stack = HeadOverride::new(RequestLogger::new(Arc::clone(&api), &defaults, Options::new()));

    // ── Replay ──
    let requests = match &cli.requests {
        Some(path) => replay::load_requests(path)?,
        None => replay::sample_requests()?,
    };
    info!(requests = requests.len(), "Replaying requests");

    for request in requests {
        let mut env = match request.into_env() {
            Ok(env) => env,
            Err(e) => {
                warn!(error = %e, "Skipping invalid request");
                continue;
            }
        };
        if !api.resolve(&mut env) {
            warn!(method = %env.method, path = %env.path, "No route matched");
        }

        let result = stack.call(&mut env).await;
        let phase = env.published_log().map(|h| h.phase.as_str()).unwrap_or("none");
        match result {
            Ok(response) => info!(
                method = %env.method,
                path = %env.path,
                status = response.status,
                body_bytes = response.body.len(),
                phase,
                "Request completed"
            ),
            Err(Halt::Exception(e)) => warn!(
                method = %env.method,
                path = %env.path,
                error = %e,
                phase,
                "Request raised"
            ),
            Err(Halt::Error(signal)) => info!(
                method = %env.method,
                path = %env.path,
                status = signal.status,
                reason = signal.message.as_deref().unwrap_or(""),
                phase,
                "Request halted"
            ),
        }
    }

    info!("reqlog finished");
    Ok(())
}
