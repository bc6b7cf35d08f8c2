//! Realtime WebSocket transport.
//!
//! # Architecture
//!
//! - [`RealtimeConnection`]: owns one socket, relays frames to subscribers
//! - [`Config`]: endpoint, model query parameter and binary frame handling
//! - [`InboundFrame`]: text or binary payload read from the socket
//!
//! # Example
//!
//! ```no_run
//! use openai_realtime_client::ws::{Config, RealtimeConnection};
//!
//! # async fn example() -> openai_realtime_client::Result<()> {
//! let config = Config::with_endpoint("wss://api.openai.com/v1/realtime")?.without_model();
//! let mut connection = RealtimeConnection::with_config("sk-...", config);
//! let mut errors = connection.subscribe_errors();
//!
//! connection.connect();
//! if let Ok(error) = errors.recv().await {
//!     eprintln!("realtime error: {error}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod frame;

pub use config::Config;
pub use connection::{ConnectionState, RealtimeConnection};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use frame::InboundFrame;
