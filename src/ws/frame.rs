#![expect(
    clippy::module_name_repetitions,
    reason = "Frame types carry the module name so they read clearly when re-exported"
)]

use tokio_tungstenite::tungstenite::Message;

/// A data frame read from the realtime socket.
///
/// Frames are transient: the payload is handed to subscribers as text and not retained.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
}

impl InboundFrame {
    /// Extract the data frame from a WebSocket message.
    ///
    /// Control frames (ping, pong, close) and raw frames yield `None`.
    #[must_use]
    pub fn from_message(message: Message) -> Option<Self> {
        match message {
            Message::Text(text) => Some(Self::Text(text.as_str().to_owned())),
            Message::Binary(data) => Some(Self::Binary(data.to_vec())),
            _ => None,
        }
    }

    /// Text delivered to subscribers for this frame.
    ///
    /// Binary payloads are decoded as UTF-8, invalid sequences becoming U+FFFD. With
    /// `decode_binary` unset, binary frames produce nothing.
    #[must_use]
    pub fn into_text(self, decode_binary: bool) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(data) if decode_binary => Some(match String::from_utf8(data) {
                Ok(text) => text,
                Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
            }),
            Self::Binary(_) => None,
        }
    }
}
