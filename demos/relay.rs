//! Relays a single response request through the realtime API.
//!
//! This demo shows how to:
//! 1. Connect with an API key from `OPENAI_API_KEY`
//! 2. Send a `response.create` event
//! 3. Print every event until the server goes quiet, then disconnect
//!
//! Run with tracing enabled:
//! ```sh
//! OPENAI_API_KEY=sk-... RUST_LOG=debug,rustls=off cargo run --example relay --features tracing
//! ```
//!
//! Optionally log to a file:
//! ```sh
//! LOG_FILE=relay.log OPENAI_API_KEY=sk-... RUST_LOG=debug cargo run --example relay --features tracing
//! ```

use std::fs::File;
use std::time::Duration;

use openai_realtime_client::RealtimeConnection;
use serde_json::json;
use tokio::time::timeout;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = File::create(path)?;
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file)
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    }

    let api_key = std::env::var("OPENAI_API_KEY")?;
    let mut connection = RealtimeConnection::new(api_key);
    let mut messages = connection.subscribe_messages();
    let mut errors = connection.subscribe_errors();

    connection.connect();
    info!(connected = connection.is_connected(), "connect issued");

    let request = json!({
        "type": "response.create",
        "response": {
            "modalities": ["text"],
            "instructions": "Say hello in one short sentence.",
        }
    });
    connection.send_message(request.to_string());

    loop {
        tokio::select! {
            message = timeout(IDLE_TIMEOUT, messages.recv()) => match message {
                Ok(Ok(event)) => info!(%event, "received"),
                Ok(Err(e)) => {
                    warn!(error = %e, "message channel closed or lagged");
                    break;
                }
                Err(_) => {
                    info!(timeout = ?IDLE_TIMEOUT, "no events, stopping");
                    break;
                }
            },
            Ok(e) = errors.recv() => {
                error!(error = %e, "realtime error");
                if !connection.is_connected() {
                    break;
                }
            }
        }
    }

    connection.disconnect();
    info!(connected = connection.is_connected(), "disconnected");

    Ok(())
}
