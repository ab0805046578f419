//! Runnable roshambo server.
//!
//! Configuration comes from the environment:
//!
//! - `ROSHAMBO_ADDR`: listen address (default `127.0.0.1:5000`)
//! - `ROSHAMBO_ROUND_SECS`: seconds per round (default 10)
//! - `ROSHAMBO_REQUIRE_READY`: `1`/`true` to wait for both players' ready
//! - `RUST_LOG`: tracing filter (default `info`)

use std::time::Duration;

use roshambo::prelude::*;

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn round_duration() -> Duration {
    std::env::var("ROSHAMBO_ROUND_SECS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_ROUND_DURATION)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let addr = std::env::var("ROSHAMBO_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let config = RoomConfig {
        round_duration: round_duration(),
        require_ready: env_flag("ROSHAMBO_REQUIRE_READY"),
        ..RoomConfig::default()
    };
    tracing::info!(
        %addr,
        round_secs = config.round_duration.as_secs(),
        require_ready = config.require_ready,
        "starting roshambo server"
    );

    let server = RoshamboServer::builder()
        .bind(&addr)
        .room_config(config)
        .build()
        .await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}
