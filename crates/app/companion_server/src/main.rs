//! Companion API server binary.
//!
//! Loads `.env`, resolves configuration from flags and environment, and
//! serves the health/login/chat API until Ctrl-C.

use std::path::PathBuf;

use clap::Parser;
use companion_api::config::ApiConfig;
use tracing::{error, info, warn};

/// CLI arguments. Anything not given here falls back to the environment.
#[derive(Parser, Debug)]
#[command(name = "companion_server", about = "Companion chat API server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR")]
    bind: Option<String>,

    /// Port to listen on; overrides the port of `--bind` (0 = ephemeral).
    #[arg(long)]
    port: Option<u16>,

    /// Persona text file replacing the built-in persona.
    #[arg(long, env = "PERSONA_FILE")]
    persona_file: Option<PathBuf>,

    /// Model identifier for new conversations.
    #[arg(long, env = "GEMINI_MODEL")]
    model: Option<String>,
}

impl Args {
    /// Apply CLI overrides on top of the environment-derived config.
    fn apply(self, mut config: ApiConfig) -> ApiConfig {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(port) = self.port {
            let host = config
                .bind_addr
                .rsplit_once(':')
                .map(|(host, _)| host.to_string())
                .unwrap_or_else(|| "127.0.0.1".into());
            config.bind_addr = format!("{host}:{port}");
        }
        if let Some(path) = self.persona_file {
            config.persona_file = Some(path);
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        config
    }
}

/// Log a configuration error when no provider key is set. Returns true in
/// degraded mode.
fn report_degraded_mode(config: &ApiConfig) -> bool {
    let degraded = config.llm.api_key.is_none();
    if degraded {
        error!(
            "configuration problem: GEMINI_API_KEY is not set; starting in degraded mode, every chat will return the fallback reply"
        );
    }
    degraded
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,companion_api=debug,companion_core=debug",
                )
            }),
        )
        .init();

    let args = Args::parse();
    let config = args.apply(ApiConfig::from_env());

    report_degraded_mode(&config);

    info!(
        bind_addr = %config.bind_addr,
        model = %config.llm.model,
        timeout_secs = config.llm.timeout.as_secs(),
        "starting companion_server"
    );

    let state = companion_api::AppState::from_config(&config)?;
    let app = companion_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("companion_server").chain(argv.iter().copied()))
            .expect("valid args")
    }

    #[test]
    fn port_replaces_bind_port() {
        let config = args(&["--port", "9001"]).apply(ApiConfig::default());
        assert_eq!(config.bind_addr, "127.0.0.1:9001");
    }

    #[test]
    fn bind_and_port_combine() {
        let config = args(&["--bind", "0.0.0.0:8000", "--port", "0"]).apply(ApiConfig::default());
        assert_eq!(config.bind_addr, "0.0.0.0:0");
    }

    #[test]
    fn model_flag_overrides_config() {
        let config = args(&["--model", "gemini-2.0-flash"]).apply(ApiConfig::default());
        assert_eq!(config.llm.model, "gemini-2.0-flash");
    }

    #[test]
    fn missing_key_is_reported_as_degraded() {
        let mut config = ApiConfig::default();
        assert!(report_degraded_mode(&config));
        config.llm.api_key = Some("k".into());
        assert!(!report_degraded_mode(&config));
    }

    #[test]
    fn no_flags_keep_config() {
        let base = ApiConfig::default();
        let expected = base.bind_addr.clone();
        let config = Args {
            bind: None,
            port: None,
            persona_file: None,
            model: None,
        }
        .apply(base);
        assert_eq!(config.bind_addr, expected);
    }
}
