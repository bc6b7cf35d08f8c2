#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use url::Url;

use crate::Result;
use crate::error::Error;

/// Realtime endpoint used when no other endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "wss://api.openai.com/v1/realtime";

/// Model requested through the `model` query parameter by default.
pub const DEFAULT_MODEL: &str = "gpt-4o-realtime-preview";

/// Broadcast channel capacity for notifications.
const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Configuration for a [`RealtimeConnection`](super::RealtimeConnection).
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct Config {
    /// WebSocket endpoint, without the `model` query parameter
    pub endpoint: Url,
    /// Model appended as `?model=<value>`. `None` connects to the bare endpoint.
    pub model: Option<String>,
    /// Decode binary frames as UTF-8 text and deliver them as messages.
    /// When disabled, binary frames are dropped.
    pub decode_binary_as_text: bool,
    /// Number of notifications a slow subscriber may fall behind before it lags
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default realtime endpoint is valid"),
            model: Some(DEFAULT_MODEL.to_owned()),
            decode_binary_as_text: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    /// Create a configuration for a custom endpoint, keeping the other defaults.
    ///
    /// The endpoint must be an absolute `ws://` or `wss://` URL.
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            return Err(Error::validation(format!(
                "endpoint scheme must be ws or wss, got {}",
                endpoint.scheme()
            )));
        }

        Ok(Self {
            endpoint,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn without_model(mut self) -> Self {
        self.model = None;
        self
    }

    #[must_use]
    pub fn with_binary_as_text(mut self, decode: bool) -> Self {
        self.decode_binary_as_text = decode;
        self
    }

    /// Capacity is clamped to at least one.
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// URL the handshake is sent to.
    ///
    /// A configured model replaces any `model` pair already present on the endpoint.
    #[must_use]
    pub fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        let Some(model) = &self.model else {
            return url;
        };

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "model")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("model", model);
        url
    }
}
