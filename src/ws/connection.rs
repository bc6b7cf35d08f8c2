#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use std::time::Duration;

use futures::{Sink, SinkExt as _, Stream, StreamExt as _};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest as _;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsProtocolError, Message};
use tokio_util::sync::CancellationToken;

use super::config::Config;
use super::error::WsError;
use super::frame::InboundFrame;
use crate::Result;
use crate::auth::{ApiKey, BETA_HEADER, BETA_VERSION};
use crate::error::Error;

/// Upper bound for finishing a handshake and writing the close frame after release.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection state tracking.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport handle, or the last one failed
    Disconnected,
    /// A transport handle was created. The handshake may still be in flight.
    Connected {
        /// When [`RealtimeConnection::connect`] created the handle
        since: Instant,
    },
}

impl ConnectionState {
    /// Check if the connection is currently active.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

/// Channels shared by every transport handle of one connection.
#[derive(Clone)]
struct Notifier {
    state_tx: watch::Sender<ConnectionState>,
    message_tx: broadcast::Sender<String>,
    error_tx: broadcast::Sender<Arc<Error>>,
}

/// Delivery gate for a single transport handle.
///
/// `active` is checked and changed under the lock, so once [`Relay::deactivate`] returns the
/// handle can no longer notify subscribers or touch the connection state.
struct Relay {
    active: Mutex<bool>,
    notifier: Notifier,
}

impl Relay {
    #[expect(
        clippy::mutex_atomic,
        reason = "The lock is held while delivering, not just while reading the flag"
    )]
    fn new(notifier: Notifier) -> Self {
        Self {
            active: Mutex::new(true),
            notifier,
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `false` once the handle has been released.
    fn message(&self, text: String) -> bool {
        let active = self.lock();
        if *active {
            _ = self.notifier.message_tx.send(text);
        }
        *active
    }

    fn send_failed(&self, error: Error) {
        let active = self.lock();
        if *active {
            _ = self.notifier.error_tx.send(Arc::new(error));
        }
    }

    fn receive_failed(&self, error: Error) {
        let mut active = self.lock();
        if *active {
            _ = self.notifier.error_tx.send(Arc::new(error));
            self.notifier
                .state_tx
                .send_replace(ConnectionState::Disconnected);
            *active = false;
        }
    }

    fn deactivate(&self) {
        *self.lock() = false;
    }
}

/// The live transport owned by a [`RealtimeConnection`].
struct Handle {
    token: CancellationToken,
    outbound_tx: mpsc::UnboundedSender<String>,
    relay: Arc<Relay>,
}

impl Handle {
    fn release(self) {
        // Cancel first: a relay that refuses delivery implies a cancelled token.
        self.token.cancel();
        self.relay.deactivate();
    }
}

/// A single connection to the realtime WebSocket endpoint.
///
/// The connection relays frames between the socket and its subscribers and does nothing else:
/// payloads are never parsed, failed sends are not retried, and a failed socket is not
/// reopened until [`connect`](Self::connect) is called again.
///
/// All methods return immediately. Socket I/O runs on a background tokio task, so
/// [`connect`](Self::connect) must be called from within a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use openai_realtime_client::RealtimeConnection;
///
/// # async fn example() {
/// let mut connection = RealtimeConnection::new("sk-...");
/// let mut messages = connection.subscribe_messages();
///
/// connection.connect();
/// connection.send_message(r#"{"type":"response.create"}"#);
///
/// while let Ok(event) = messages.recv().await {
///     println!("{event}");
/// }
/// # }
/// ```
pub struct RealtimeConnection {
    api_key: ApiKey,
    config: Config,
    notifier: Notifier,
    handle: Option<Handle>,
}

impl RealtimeConnection {
    /// Create a connection for the default endpoint. No I/O is performed.
    #[must_use]
    pub fn new<K: Into<ApiKey>>(api_key: K) -> Self {
        Self::with_config(api_key, Config::default())
    }

    #[must_use]
    pub fn with_config<K: Into<ApiKey>>(api_key: K, config: Config) -> Self {
        let capacity = config.channel_capacity.max(1);
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (message_tx, _) = broadcast::channel(capacity);
        let (error_tx, _) = broadcast::channel(capacity);

        Self {
            api_key: api_key.into(),
            config,
            notifier: Notifier {
                state_tx,
                message_tx,
                error_tx,
            },
            handle: None,
        }
    }

    /// Open the socket and start relaying frames.
    ///
    /// Does nothing if already connected. The state becomes
    /// [`Connected`](ConnectionState::Connected) as soon as the transport is created, before the
    /// handshake completes; a failed handshake is reported on the error channel and moves the
    /// state back to [`Disconnected`](ConnectionState::Disconnected).
    pub fn connect(&mut self) {
        if self.handle.is_some() && self.is_connected() {
            return;
        }

        // Left behind by a receive loop that stopped on error.
        if let Some(stale) = self.handle.take() {
            stale.release();
        }

        let request = match self.request() {
            Ok(request) => request,
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "Unable to build realtime handshake request");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                return;
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %request.uri(), "Connecting to realtime endpoint");

        let token = CancellationToken::new();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let relay = Arc::new(Relay::new(self.notifier.clone()));

        self.notifier.state_tx.send_replace(ConnectionState::Connected {
            since: Instant::now(),
        });

        tokio::spawn(transport_loop(
            request,
            outbound_rx,
            token.clone(),
            Arc::clone(&relay),
            self.config.decode_binary_as_text,
        ));

        self.handle = Some(Handle {
            token,
            outbound_tx,
            relay,
        });
    }

    /// Close the socket with a "going away" close frame.
    ///
    /// Safe to call at any time, including when already disconnected. Once this returns no
    /// further messages or errors are delivered from the released socket.
    pub fn disconnect(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.release();

            #[cfg(feature = "tracing")]
            tracing::debug!("Disconnected from realtime endpoint");
        }

        self.notifier
            .state_tx
            .send_replace(ConnectionState::Disconnected);
    }

    /// Queue `payload` as a single text frame.
    ///
    /// Silently dropped when not connected. A failed write is reported on the error channel
    /// and leaves the connection state unchanged.
    pub fn send_message<S: Into<String>>(&self, payload: S) {
        let Some(handle) = self.handle.as_ref() else {
            return;
        };
        if !self.is_connected() {
            return;
        }

        _ = handle.outbound_tx.send(payload.into());
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.notifier.state_tx.borrow()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.notifier.state_tx.subscribe()
    }

    /// Subscribe to incoming messages.
    ///
    /// Each call returns a new independent receiver that sees messages from every later
    /// connection of this instance.
    #[must_use]
    pub fn subscribe_messages(&self) -> broadcast::Receiver<String> {
        self.notifier.message_tx.subscribe()
    }

    /// Subscribe to send and receive failures.
    #[must_use]
    pub fn subscribe_errors(&self) -> broadcast::Receiver<Arc<Error>> {
        self.notifier.error_tx.subscribe()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn request(&self) -> Result<Request> {
        let mut request = self
            .config
            .request_url()
            .as_str()
            .into_client_request()
            .map_err(|e| WsError::InvalidRequest(e.to_string()))?;
        let authorization = self
            .api_key
            .bearer()
            .map_err(|e| WsError::InvalidRequest(format!("authorization header: {e}")))?;

        let headers = request.headers_mut();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(
            HeaderName::from_static(BETA_HEADER),
            HeaderValue::from_static(BETA_VERSION),
        );

        Ok(request)
    }
}

impl Drop for RealtimeConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Handshake, then relay frames until the handle is released or the socket fails.
async fn transport_loop(
    request: Request,
    outbound_rx: mpsc::UnboundedReceiver<String>,
    token: CancellationToken,
    relay: Arc<Relay>,
    decode_binary: bool,
) {
    let handshake = connect_async(request);
    tokio::pin!(handshake);

    let connected = tokio::select! {
        () = token.cancelled() => {
            // Released mid-handshake: finish it so the peer still sees a close frame.
            if let Ok(Ok((mut ws_stream, _))) = timeout(CLOSE_TIMEOUT, &mut handshake).await {
                _ = timeout(CLOSE_TIMEOUT, ws_stream.send(going_away())).await;
            }
            return;
        }
        result = &mut handshake => result,
    };

    let ws_stream = match connected {
        Ok((ws_stream, _)) => ws_stream,
        Err(e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %e, "Unable to connect to realtime endpoint");
            relay.receive_failed(WsError::Connection(e).into());
            return;
        }
    };

    relay_frames(ws_stream, outbound_rx, &token, &relay, decode_binary).await;
}

/// Receive loop and outbound writer for an open socket.
///
/// Sends a "going away" close frame when `token` is cancelled, bounded by [`CLOSE_TIMEOUT`].
async fn relay_frames<S>(
    socket: S,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    token: &CancellationToken,
    relay: &Relay,
    decode_binary: bool,
) where
    S: Stream<Item = std::result::Result<Message, WsProtocolError>> + Sink<Message, Error = WsProtocolError>,
{
    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            biased;

            () = token.cancelled() => break,

            Some(text) = outbound_rx.recv() => {
                let sent = tokio::select! {
                    () = token.cancelled() => break,
                    sent = write.send(Message::text(text)) => sent,
                };
                if let Err(e) = sent {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(error = %e, "Failed to send realtime message");
                    relay.send_failed(WsError::Send(e).into());
                }
            }

            message = read.next() => {
                match message {
                    Some(Ok(Message::Close(frame))) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(?frame, "Realtime endpoint closed the connection");
                        let (code, reason) = frame
                            .map(|f| (Some(f.code), f.reason.as_str().to_owned()))
                            .unwrap_or_default();
                        relay.receive_failed(WsError::ConnectionClosed { code, reason }.into());
                        return;
                    }
                    Some(Ok(message)) => {
                        let Some(text) = InboundFrame::from_message(message)
                            .and_then(|frame| frame.into_text(decode_binary))
                        else {
                            continue;
                        };

                        #[cfg(feature = "tracing")]
                        tracing::trace!(%text, "Received realtime message");

                        if !relay.message(text) {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(error = %e, "Realtime receive failed");
                        relay.receive_failed(WsError::Connection(e).into());
                        return;
                    }
                    None => {
                        relay.receive_failed(
                            WsError::ConnectionClosed {
                                code: None,
                                reason: String::new(),
                            }
                            .into(),
                        );
                        return;
                    }
                }
            }
        }
    }

    // Only reached once the handle was released.
    let closed = timeout(CLOSE_TIMEOUT, write.send(going_away())).await;
    #[cfg(feature = "tracing")]
    if closed.is_err() {
        tracing::debug!(timeout = ?CLOSE_TIMEOUT, "Peer did not accept the close frame in time");
    }
    #[cfg(not(feature = "tracing"))]
    let _ = closed;
}

fn going_away() -> Message {
    Message::Close(Some(CloseFrame {
        code: CloseCode::Away,
        reason: "".into(),
    }))
}
