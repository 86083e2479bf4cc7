//! Outbound proxy configuration for mailbox API requests.
//!
//! Supports HTTP(S) and SOCKS5 proxies with optional basic authentication.
//!
//! # Example
//!
//! ```
//! use mailbox_poll::Proxy;
//!
//! // Without authentication
//! let proxy = Proxy::http("proxy.example.com", 3128);
//!
//! // With authentication
//! let proxy = Proxy::socks5("proxy.example.com", 1080).with_auth("username", "password");
//! ```

use crate::error::{Error, Result};

/// Proxy protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyKind {
    /// Plain HTTP proxy (CONNECT for https targets).
    Http,
    /// HTTPS proxy.
    Https,
    /// SOCKS5 proxy with remote DNS resolution.
    Socks5,
}

impl ProxyKind {
    fn scheme(self) -> &'static str {
        match self {
            ProxyKind::Http => "http",
            ProxyKind::Https => "https",
            ProxyKind::Socks5 => "socks5h",
        }
    }
}

/// Proxy configuration.
#[derive(Debug, Clone)]
pub struct Proxy {
    /// Proxy protocol.
    pub kind: ProxyKind,
    /// Proxy server hostname or IP address.
    pub host: String,
    /// Proxy server port.
    pub port: u16,
    /// Optional authentication credentials.
    pub auth: Option<ProxyAuth>,
}

/// Authentication credentials for a proxy.
#[derive(Clone)]
pub struct ProxyAuth {
    /// Username for proxy authentication.
    pub username: String,
    /// Password for proxy authentication.
    pub password: String,
}

impl std::fmt::Debug for ProxyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyAuth")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Proxy {
    /// Creates a proxy configuration without authentication.
    #[must_use]
    pub fn new(kind: ProxyKind, host: impl Into<String>, port: u16) -> Self {
        Self {
            kind,
            host: host.into(),
            port,
            auth: None,
        }
    }

    /// Creates an HTTP proxy configuration.
    #[must_use]
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self::new(ProxyKind::Http, host, port)
    }

    /// Creates a SOCKS5 proxy configuration.
    #[must_use]
    pub fn socks5(host: impl Into<String>, port: u16) -> Self {
        Self::new(ProxyKind::Socks5, host, port)
    }

    /// Adds basic authentication credentials.
    #[must_use]
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(ProxyAuth {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Returns the proxy URL without credentials.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.kind.scheme(), self.host, self.port)
    }

    /// Returns `true` if this proxy requires authentication.
    #[must_use]
    pub fn requires_auth(&self) -> bool {
        self.auth.is_some()
    }

    /// Converts into a proxy applying to every request of the HTTP client.
    pub(crate) fn to_reqwest(&self) -> Result<reqwest::Proxy> {
        let proxy = reqwest::Proxy::all(self.url()).map_err(|_| Error::InvalidConfig {
            message: format!("invalid proxy address {self}"),
        })?;

        Ok(match &self.auth {
            Some(auth) => proxy.basic_auth(&auth.username, &auth.password),
            None => proxy,
        })
    }
}

impl std::fmt::Display for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.auth {
            Some(auth) => write!(
                f,
                "{}://{}:***@{}:{}",
                self.kind.scheme(),
                auth.username,
                self.host,
                self.port
            ),
            None => f.write_str(&self.url()),
        }
    }
}
