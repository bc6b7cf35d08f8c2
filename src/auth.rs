/// Secret string types that redact values in debug output for security.
pub use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::tungstenite::http::HeaderValue;

use crate::Result;

/// Name of the `OpenAI-Beta` header that selects the protocol version, in canonical lowercase.
pub const BETA_HEADER: &str = "openai-beta";

/// Protocol version requested through [`BETA_HEADER`].
pub const BETA_VERSION: &str = "realtime=v1";

/// API key used to authenticate the realtime handshake.
///
/// The key is opaque: it is neither validated nor inspected, only forwarded as a bearer token.
/// Debug output never includes the key itself.
#[derive(Clone, Debug)]
pub struct ApiKey(SecretString);

impl ApiKey {
    #[must_use]
    pub fn new<S: Into<String>>(key: S) -> Self {
        Self(SecretString::from(key.into()))
    }

    /// Returns the underlying secret.
    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.0
    }

    /// Builds the `Authorization` header value, `Bearer <key>`.
    ///
    /// Fails if the key contains bytes that are not allowed in an HTTP header.
    pub fn bearer(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", self.0.expose_secret()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}
