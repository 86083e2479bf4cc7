//! Configuration for a mailbox poll.
//!
//! Use [`PollConfigBuilder`] to create a configuration with sensible defaults:
//!
//! ```
//! use mailbox_poll::PollConfig;
//!
//! let config = PollConfig::builder()
//!     .endpoint("https://api.zeptomail.com/v1.1/inbox/messages")
//!     .api_key("secret")
//!     .recipient("new.user@yopmail.com")
//!     .subject_pattern("(?i)invited to join")
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::{Error, Result};
use crate::known_providers::{AuthScheme, ProviderRegistry};
use crate::matcher::MessageFilter;
use crate::proxy::Proxy;
use regex::Regex;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Default pause between unsuccessful attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Default overall deadline.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(90);

/// Configuration for polling one mailbox endpoint.
///
/// Create using [`PollConfig::builder()`].
///
/// Note: The API key is stored as a [`SecretString`] to prevent accidental
/// logging of credentials.
#[derive(Clone)]
pub struct PollConfig {
    /// Retrieval endpoint (validated absolute http(s) URL).
    endpoint: Url,
    /// API key (protected from accidental logging).
    api_key: Option<SecretString>,
    /// How the API key is attached to requests.
    pub auth_scheme: AuthScheme,
    /// Criteria the awaited message must satisfy.
    pub filter: MessageFilter,
    /// Polling configuration.
    pub polling: PollingConfig,
    /// HTTP timeout configuration.
    pub timeouts: TimeoutConfig,
    /// Optional outbound proxy.
    pub proxy: Option<Proxy>,
}

impl std::fmt::Debug for PollConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollConfig")
            .field("endpoint", &self.endpoint_display())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("auth_scheme", &self.auth_scheme)
            .field("filter", &self.filter)
            .field("polling", &self.polling)
            .field("timeouts", &self.timeouts)
            .field("proxy", &self.proxy.as_ref().map(ToString::to_string))
            .finish()
    }
}

impl PollConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> PollConfigBuilder {
        PollConfigBuilder::default()
    }

    /// Returns the retrieval endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Returns the endpoint without query string or credentials, for logs.
    #[must_use]
    pub fn endpoint_display(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!(
                "{}://{host}:{port}{}",
                self.endpoint.scheme(),
                self.endpoint.path()
            ),
            None => format!("{}://{host}{}", self.endpoint.scheme(), self.endpoint.path()),
        }
    }

    /// Returns the API key, if one was configured.
    ///
    /// The key is intentionally not directly accessible to prevent accidental logging.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(ExposeSecret::expose_secret)
    }
}

/// Polling configuration for wait operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    /// Interval between polling attempts when no message matched.
    pub interval: Duration,
    /// Maximum time to wait for a matching message.
    pub max_wait: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl PollingConfig {
    /// Checks `0 < interval <= max_wait`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the violated bound.
    pub fn validate(&self) -> Result<()> {
        if self.max_wait.is_zero() {
            return Err(invalid("max_wait must be greater than zero"));
        }
        if self.interval.is_zero() {
            return Err(invalid("poll interval must be greater than zero"));
        }
        if self.interval > self.max_wait {
            return Err(invalid(format!(
                "poll interval {:?} exceeds max_wait {:?}",
                self.interval, self.max_wait
            )));
        }
        Ok(())
    }
}

/// Timeout configuration for individual HTTP requests.
///
/// Unset timeouts leave a slow request bounded only by the poll deadline,
/// checked after the request returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Timeout for establishing the TCP/TLS connection.
    pub connect: Option<Duration>,
    /// Timeout for a whole retrieval request.
    pub request: Option<Duration>,
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidConfig {
        message: message.into(),
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidEndpoint {
        endpoint: raw.to_string(),
        message: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::InvalidEndpoint {
            endpoint: raw.to_string(),
            message: "expected an absolute http(s) URL".into(),
        });
    }

    Ok(url)
}

/// Checks that the auth header derived from `scheme` and `key` can be sent.
fn validate_header(scheme: &AuthScheme, key: &str) -> Result<()> {
    let (name, value) = scheme.header_pair(key);
    let name_ok = HeaderName::from_bytes(name.as_bytes()).is_ok();
    if !name_ok || HeaderValue::from_str(&value).is_err() {
        return Err(Error::InvalidHeader { name });
    }
    Ok(())
}

/// Builder for [`PollConfig`].
#[derive(Debug, Default)]
pub struct PollConfigBuilder {
    endpoint: Option<String>,
    api_key: Option<SecretString>,
    auth_scheme: Option<AuthScheme>,
    provider_registry: Option<ProviderRegistry>,
    recipient: Option<String>,
    subject: Option<Regex>,
    subject_pattern: Option<String>,
    body_pattern: Option<String>,
    polling: Option<PollingConfig>,
    timeouts: Option<TimeoutConfig>,
    proxy: Option<Proxy>,
}

impl PollConfigBuilder {
    /// Pre-fills the builder from `{PREFIX}_API_URL`, `{PREFIX}_API_KEY`,
    /// `{PREFIX}_POLL_INTERVAL_SECS` and `{PREFIX}_TIMEOUT_SECS`.
    ///
    /// Unset variables leave the corresponding setting untouched; later setter
    /// calls still override.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a duration variable is not a whole
    /// number of seconds.
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::from_lookup(prefix, |name| std::env::var(name).ok())
    }

    fn from_lookup(prefix: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |suffix: &str| lookup(&format!("{prefix}_{suffix}")).filter(|v| !v.is_empty());
        let secs = |suffix: &str| -> Result<Option<Duration>> {
            var(suffix)
                .map(|raw| {
                    raw.trim()
                        .parse::<u64>()
                        .map(Duration::from_secs)
                        .map_err(|_| {
                            invalid(format!("{prefix}_{suffix} must be whole seconds, got '{raw}'"))
                        })
                })
                .transpose()
        };

        let mut builder = Self::default();
        if let Some(endpoint) = var("API_URL") {
            builder = builder.endpoint(endpoint);
        }
        if let Some(key) = var("API_KEY") {
            builder = builder.api_key(key);
        }
        if let Some(interval) = secs("POLL_INTERVAL_SECS")? {
            builder = builder.poll_interval(interval);
        }
        if let Some(max_wait) = secs("TIMEOUT_SECS")? {
            builder = builder.max_wait(max_wait);
        }
        Ok(builder)
    }

    /// Sets the retrieval endpoint URL (required).
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the API key sent with every request.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    /// Sets how the API key is sent.
    ///
    /// If not set, the scheme is discovered from the endpoint host.
    #[must_use]
    pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = Some(scheme);
        self
    }

    /// Sets a custom registry for auth scheme discovery.
    ///
    /// # Example
    ///
    /// ```
    /// use mailbox_poll::known_providers::{AuthScheme, ProviderRegistry};
    /// use mailbox_poll::PollConfig;
    ///
    /// let mut registry = ProviderRegistry::with_defaults();
    /// registry.register("mail.internal.example.com", AuthScheme::header("X-Mailbox-Key"));
    ///
    /// let config = PollConfig::builder()
    ///     .endpoint("https://mail.internal.example.com/messages")
    ///     .api_key("secret")
    ///     .provider_registry(registry)
    ///     .build()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.auth_scheme, AuthScheme::header("X-Mailbox-Key"));
    /// ```
    #[must_use]
    pub fn provider_registry(mut self, registry: ProviderRegistry) -> Self {
        self.provider_registry = Some(registry);
        self
    }

    /// Only accept messages whose recipient field contains `recipient`.
    #[must_use]
    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Only accept messages whose subject matches `pattern` (compiled at build time).
    #[must_use]
    pub fn subject_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.subject_pattern = Some(pattern.into());
        self.subject = None;
        self
    }

    /// Only accept messages whose subject matches `regex`.
    #[must_use]
    pub fn subject_regex(mut self, regex: Regex) -> Self {
        self.subject = Some(regex);
        self.subject_pattern = None;
        self
    }

    /// Only accept messages whose body matches `pattern` (compiled at build time).
    #[must_use]
    pub fn body_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.body_pattern = Some(pattern.into());
        self
    }

    /// Sets polling configuration.
    #[must_use]
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.polling = Some(polling);
        self
    }

    /// Sets the pause between attempts.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .interval = interval;
        self
    }

    /// Sets the overall deadline.
    #[must_use]
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .max_wait = max_wait;
        self
    }

    /// Sets HTTP timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .request = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = Some(timeout);
        self
    }

    /// Routes requests through a proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is missing or invalid, a pattern does not
    /// compile, or the polling bounds are inconsistent.
    pub fn build(self) -> Result<PollConfig> {
        let endpoint_raw = self.endpoint.ok_or_else(|| invalid("endpoint is required"))?;
        let endpoint = parse_endpoint(&endpoint_raw)?;

        let polling = self.polling.unwrap_or_default();
        polling.validate()?;

        let mut filter = MessageFilter::new();
        if let Some(recipient) = self.recipient {
            filter = filter.recipient(recipient);
        }
        if let Some(regex) = self.subject {
            filter = filter.subject_regex(regex);
        } else if let Some(pattern) = &self.subject_pattern {
            filter = filter.subject_pattern(pattern)?;
        }
        if let Some(pattern) = &self.body_pattern {
            filter = filter.body_pattern(pattern)?;
        }

        // Resolve auth scheme: explicit > registry > built-in discovery
        let host = endpoint.host_str().unwrap_or_default();
        let auth_scheme = self.auth_scheme.unwrap_or_else(|| {
            self.provider_registry
                .unwrap_or_else(ProviderRegistry::with_defaults)
                .discover(host)
        });

        let api_key = self.api_key.filter(|key| !key.expose_secret().is_empty());
        if let Some(key) = &api_key {
            validate_header(&auth_scheme, key.expose_secret())?;
        }

        Ok(PollConfig {
            api_key,
            endpoint,
            auth_scheme,
            filter,
            polling,
            timeouts: self.timeouts.unwrap_or_default(),
            proxy: self.proxy,
        })
    }
}
