#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod auth;
pub mod error;
pub mod ws;

pub use auth::ApiKey;
pub use error::{Error, Kind};
pub use ws::{Config, ConnectionState, InboundFrame, RealtimeConnection};

pub type Result<T> = std::result::Result<T, Error>;
