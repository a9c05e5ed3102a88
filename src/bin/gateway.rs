//! Gateway server binary.
//!
//! Loads configuration from `--config <file>` (TOML) or from `GATEWAY_*`
//! environment variables, then serves until CTRL+C.

use lobby_gateway::config::GatewayConfig;
use lobby_gateway::protocol::lobby::GreetingLobby;
use lobby_gateway::transport::Listener;
use lobby_gateway::utils::logging;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

fn load_config() -> lobby_gateway::Result<GatewayConfig> {
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("--config") | Some("-c") => {
            let path = args.next().ok_or_else(|| {
                lobby_gateway::GatewayError::ConfigError("--config requires a path".into())
            })?;
            GatewayConfig::from_file(path)
        }
        Some(other) => Err(lobby_gateway::GatewayError::ConfigError(format!(
            "unknown argument '{other}' (usage: gateway [--config <file>])"
        ))),
        None => GatewayConfig::from_env(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.logging);

    let listener = match Listener::bind(&config).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "failed to start gateway");
            return ExitCode::FAILURE;
        }
    };

    match listener.serve(Arc::new(GreetingLobby)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "gateway exited with error");
            ExitCode::FAILURE
        }
    }
}
