//! # contact-svc - Contact Form Backend
//!
//! Accepts contact-form submissions from an unauthenticated web page while
//! keeping bots out, without any server-side session state.
//!
//! ## Protocol
//! ```text
//! POST /api/verify   {email}                 → token (or 401 + quiz question)
//! POST /api/response {email, response, ...}  → token
//! POST /api/submit   {email, name, message, expiry, signature}
//!                       ↓
//!                    SendGrid → site owner
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod challenge;
mod config;
mod flow;
mod mail;
mod ratelimit;
mod routes;
mod signing;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;

/// contact-svc - back-end for a contact form
#[derive(Parser, Debug)]
#[command(name = "contact-svc")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/contact-svc.toml")]
    config: String,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Verification secret, used to sign tokens
    #[arg(short = 'v', long, env = "VERIFICATION_SECRET", hide_env_values = true)]
    verification_secret: Option<String>,

    /// SendGrid API key
    #[arg(short = 'k', long, env = "SENDGRID_API_KEY", hide_env_values = true)]
    sendgrid_api_key: Option<String>,

    /// From email address
    #[arg(short, long)]
    from_email: Option<String>,

    /// To email address
    #[arg(short, long)]
    to_email: Option<String>,

    /// Email subject header
    #[arg(short, long)]
    subject: Option<String>,

    /// Enable SendGrid email send
    #[arg(short = 'e', long)]
    enable_send: bool,

    /// Enable the quiz question challenge
    #[arg(short = 'q', long)]
    enable_quiz: bool,

    /// Question file for the quiz (overrides config)
    #[arg(long)]
    questions: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs)?;

    if let Some(e) = dotenv_failure(dotenv) {
        tracing::warn!(error = %e, "Failed to load .env file");
    }

    info!("Starting contact-svc v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(&args.config, &args)?;
    info!(path = %args.config, "Configuration loaded");

    let state = AppState::new(config.clone())?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()?;
    }

    Ok(())
}

/// Problems loading `.env`, other than there being no such file
fn dotenv_failure<T>(result: Result<T, dotenvy::Error>) -> Option<dotenvy::Error> {
    match result {
        Ok(_) => None,
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => Some(e),
    }
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Signal received, shutting down");
}
