#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;

use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

/// WebSocket error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error opening or reading from the WebSocket connection
    Connection(tokio_tungstenite::tungstenite::Error),
    /// Error writing an outbound frame
    Send(tokio_tungstenite::tungstenite::Error),
    /// The peer closed the connection
    ConnectionClosed {
        /// Close code sent by the peer, if any
        code: Option<CloseCode>,
        /// Close reason sent by the peer, possibly empty
        reason: String,
    },
    /// The handshake request could not be built
    InvalidRequest(String),
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "WebSocket connection error: {e}"),
            Self::Send(e) => write!(f, "Failed to send WebSocket message: {e}"),
            Self::ConnectionClosed {
                code: Some(code),
                reason,
            } if !reason.is_empty() => {
                write!(f, "WebSocket connection closed ({code}): {reason}")
            }
            Self::ConnectionClosed {
                code: Some(code), ..
            } => write!(f, "WebSocket connection closed ({code})"),
            Self::ConnectionClosed { code: None, .. } => write!(f, "WebSocket connection closed"),
            Self::InvalidRequest(reason) => write!(f, "Invalid WebSocket request: {reason}"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) | Self::Send(e) => Some(e),
            _ => None,
        }
    }
}

// Integration with main Error type
impl From<WsError> for crate::error::Error {
    fn from(e: WsError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, e)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for crate::error::Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, WsError::Connection(e))
    }
}
