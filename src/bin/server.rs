//! Headless adapter server.
//!
//! Runs the engine behind the line-JSON TCP protocol until interrupted.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate_digger::adapter::{serve, ServerConfig};
use crate_digger::core::Tuning;
use crate_digger::engine::{Engine, EngineOptions};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("crate_digger=info".parse()?))
        .init();

    if ServerConfig::is_disabled() {
        info!("adapter disabled via CRATE_DIGGER_ADAPTER_DISABLED");
        return Ok(());
    }

    let config = ServerConfig::from_env();
    let engine = Engine::new(EngineOptions {
        tuning: Tuning::from_env(),
        ..Default::default()
    });

    tokio::select! {
        result = serve(config, engine, None) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            Ok(())
        }
    }
}
