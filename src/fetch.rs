//! Retrieval of the current message list from a mailbox API.
//!
//! [`MessageSource`] is the seam between the poll loop and the provider. The
//! production implementation is [`HttpMessageSource`]: one authenticated GET per
//! call, response normalized into [`RawMessage`]s. Tests substitute in-memory
//! sources.

use crate::config::PollConfig;
use crate::error::{Error, Result};
use crate::message::RawMessage;
use crate::normalize;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, Url};
use tracing::{debug, instrument};

/// Something that can list the messages currently held in a mailbox.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use mailbox_poll::{MessageSource, RawMessage, Result};
/// use serde_json::json;
///
/// struct Fixed(Vec<RawMessage>);
///
/// #[async_trait]
/// impl MessageSource for Fixed {
///     async fn fetch_messages(&self) -> Result<Vec<RawMessage>> {
///         Ok(self.0.clone())
///     }
///
///     fn describe(&self) -> String {
///         "fixed".into()
///     }
/// }
///
/// let source = Fixed(vec![RawMessage::new(json!({"subject": "hi"}))]);
/// assert_eq!(source.describe(), "fixed");
/// ```
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Returns the messages currently available, in provider order.
    ///
    /// # Errors
    ///
    /// Returns a retrieval error ([`Error::Request`], [`Error::Status`] or
    /// [`Error::Decode`]) when the list cannot be obtained.
    async fn fetch_messages(&self) -> Result<Vec<RawMessage>>;

    /// Returns a short, secret-free description for logs.
    fn describe(&self) -> String;
}

/// Fetches messages over HTTP with a JSON response.
#[derive(Clone)]
pub struct HttpMessageSource {
    client: Client,
    endpoint: Url,
    endpoint_display: String,
    headers: HeaderMap,
}

impl HttpMessageSource {
    /// Builds an HTTP source from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the auth header cannot be encoded,
    /// or an error if the proxy or HTTP client cannot be set up.
    pub fn new(config: &PollConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeouts.request {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.timeouts.connect {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(proxy.to_reqwest()?);
        }
        let client = builder
            .build()
            .map_err(|source| Error::HttpClient { source })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = config.api_key() {
            let (name, value) = config.auth_scheme.header_pair(key);
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidHeader { name: name.clone() })?;
            let mut header_value =
                HeaderValue::from_str(&value).map_err(|_| Error::InvalidHeader { name })?;
            header_value.set_sensitive(true);
            headers.insert(header_name, header_value);
        }

        Ok(Self {
            client,
            endpoint: config.endpoint().clone(),
            endpoint_display: config.endpoint_display(),
            headers,
        })
    }
}

impl std::fmt::Debug for HttpMessageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMessageSource")
            .field("endpoint", &self.endpoint_display)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MessageSource for HttpMessageSource {
    #[instrument(
        name = "HttpMessageSource::fetch_messages",
        skip(self),
        fields(source = %self.endpoint_display, status, shape, message_count)
    )]
    async fn fetch_messages(&self) -> Result<Vec<RawMessage>> {
        let span = tracing::Span::current();
        let request_error = |source: reqwest::Error| Error::Request {
            endpoint: self.endpoint_display.clone(),
            source,
        };

        let response = self
            .client
            .get(self.endpoint.clone())
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        span.record("status", status.as_u16());
        if !status.is_success() {
            return Err(Error::Status {
                endpoint: self.endpoint_display.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        let json: serde_json::Value =
            serde_json::from_slice(&body).map_err(|source| Error::Decode {
                endpoint: self.endpoint_display.clone(),
                source,
            })?;

        let shape = normalize::detect_shape(&json);
        span.record("shape", tracing::field::display(&shape));
        let messages = normalize::normalize(json);
        span.record("message_count", messages.len());

        debug!(%shape, message_count = messages.len(), "Fetched message list");

        Ok(messages)
    }

    fn describe(&self) -> String {
        self.endpoint_display.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::known_providers::AuthScheme;
    use crate::proxy::Proxy;
    use std::time::Duration;

    fn config(api_key: Option<&str>, scheme: AuthScheme) -> PollConfig {
        let mut builder = PollConfig::builder()
            .endpoint("https://api.example.com/v1/messages?inbox=qa")
            .auth_scheme(scheme);
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_zoho_header() {
        let source = HttpMessageSource::new(&config(Some("k1"), AuthScheme::ZohoApiKey)).unwrap();
        assert_eq!(
            source.headers.get("authorization").unwrap(),
            "Zoho-enczapikey k1"
        );
        assert!(source.headers.get("authorization").unwrap().is_sensitive());
        assert_eq!(source.headers.get(ACCEPT).unwrap(), "application/json");
    }

    #[test]
    fn test_custom_header() {
        let source =
            HttpMessageSource::new(&config(Some("k2"), AuthScheme::header("X-Api-Key"))).unwrap();
        assert_eq!(source.headers.get("x-api-key").unwrap(), "k2");
        assert!(source.headers.get("authorization").is_none());
    }

    #[test]
    fn test_no_key_sends_no_auth_header() {
        let source = HttpMessageSource::new(&config(None, AuthScheme::Bearer)).unwrap();
        assert_eq!(source.headers.len(), 1);
    }

    #[test]
    fn test_describe_hides_query() {
        let source = HttpMessageSource::new(&config(Some("k"), AuthScheme::Bearer)).unwrap();
        assert_eq!(source.describe(), "https://api.example.com/v1/messages");
        assert!(!format!("{source:?}").contains("inbox=qa"));
    }

    #[test]
    fn test_client_with_proxy_and_timeouts() {
        let config = PollConfig::builder()
            .endpoint("https://api.example.com/messages")
            .request_timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(2))
            .proxy(Proxy::socks5("127.0.0.1", 1080).with_auth("u", "p"))
            .build()
            .unwrap();
        assert!(HttpMessageSource::new(&config).is_ok());
    }
}
