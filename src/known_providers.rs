//! Auth header discovery from the retrieval endpoint's host.
//!
//! Mailbox APIs disagree on how the API key travels. This module maps known
//! provider hosts to an [`AuthScheme`], with support for runtime customization.
//! Unknown hosts fall back to [`AuthScheme::Bearer`].
//!
//! # Example
//!
//! ```
//! use mailbox_poll::known_providers::{discover_auth_scheme, AuthScheme, ProviderRegistry};
//!
//! // Use built-in discovery
//! assert_eq!(discover_auth_scheme("api.zeptomail.com"), AuthScheme::ZohoApiKey);
//!
//! // Create a custom registry for your application
//! let mut registry = ProviderRegistry::with_defaults();
//! registry.register("mail.internal.example.com", AuthScheme::header("X-Mailbox-Key"));
//! assert_eq!(
//!     registry.discover("mail.internal.example.com"),
//!     AuthScheme::header("X-Mailbox-Key")
//! );
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

/// How the API key is attached to retrieval requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthScheme {
    /// `Authorization: Zoho-enczapikey <key>` (ZeptoMail).
    ZohoApiKey,
    /// `Authorization: Bearer <key>`.
    Bearer,
    /// `<name>: <key>` with a provider-specific header name.
    Header(String),
}

impl AuthScheme {
    /// Shorthand for [`AuthScheme::Header`].
    #[must_use]
    pub fn header(name: impl Into<String>) -> Self {
        AuthScheme::Header(name.into())
    }

    /// Returns the `(header name, header value)` pair for `key`.
    #[must_use]
    pub fn header_pair(&self, key: &str) -> (String, String) {
        match self {
            AuthScheme::ZohoApiKey => ("Authorization".into(), format!("Zoho-enczapikey {key}")),
            AuthScheme::Bearer => ("Authorization".into(), format!("Bearer {key}")),
            AuthScheme::Header(name) => (name.clone(), key.to_string()),
        }
    }
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthScheme::ZohoApiKey => write!(f, "Zoho-enczapikey"),
            AuthScheme::Bearer => write!(f, "Bearer"),
            AuthScheme::Header(name) => write!(f, "header {name}"),
        }
    }
}

/// Map of API hosts (or parent domains) to their auth scheme.
static KNOWN_PROVIDERS: LazyLock<HashMap<&'static str, AuthScheme>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // ZeptoMail regional data centres
    m.insert("zeptomail.com", AuthScheme::ZohoApiKey);
    m.insert("zeptomail.eu", AuthScheme::ZohoApiKey);
    m.insert("zeptomail.in", AuthScheme::ZohoApiKey);
    m.insert("zeptomail.com.au", AuthScheme::ZohoApiKey);

    // MailSlurp
    m.insert("mailslurp.com", AuthScheme::Header("x-api-key".into()));

    // Mailtrap
    m.insert("mailtrap.io", AuthScheme::Bearer);

    m
});

/// Candidate lookup keys for `host`: the host itself, then each parent domain.
fn host_candidates(host: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(Some(host), |h| h.split_once('.').map(|(_, rest)| rest))
        .filter(|h| h.contains('.'))
}

/// A customizable registry for auth scheme discovery.
///
/// Lookups try the full host first, then each parent domain, so registering
/// `example.com` also covers `api.eu.example.com`.
///
/// # Example
///
/// ```
/// use mailbox_poll::known_providers::{AuthScheme, ProviderRegistry};
///
/// let mut registry = ProviderRegistry::with_defaults();
/// registry.register("example.com", AuthScheme::header("X-Api-Key"));
///
/// assert_eq!(registry.discover("api.eu.example.com"), AuthScheme::header("X-Api-Key"));
/// assert_eq!(registry.discover("api.zeptomail.eu"), AuthScheme::ZohoApiKey); // Built-in
/// ```
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    custom: HashMap<String, AuthScheme>,
    use_defaults: bool,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry without built-in defaults.
    ///
    /// Use [`Self::with_defaults`] if you want to include the standard mappings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            custom: HashMap::new(),
            use_defaults: false,
        }
    }

    /// Creates a registry that includes built-in default mappings.
    ///
    /// Custom mappings added via [`Self::register`] will override defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            custom: HashMap::new(),
            use_defaults: true,
        }
    }

    /// Registers a host (or parent domain) mapping, overriding any existing one.
    pub fn register(&mut self, host: impl Into<String>, scheme: AuthScheme) {
        self.custom.insert(host.into().to_lowercase(), scheme);
    }

    /// Removes a custom mapping.
    ///
    /// Note: This only removes custom mappings, not built-in defaults.
    pub fn unregister(&mut self, host: &str) -> Option<AuthScheme> {
        self.custom.remove(&host.to_lowercase())
    }

    /// Discovers the auth scheme for an API host.
    ///
    /// Resolution order, for the host and then each parent domain:
    /// 1. Custom mappings (added via [`Self::register`])
    /// 2. Built-in defaults (if [`Self::with_defaults`] was used)
    ///
    /// Falls back to [`AuthScheme::Bearer`].
    #[must_use]
    pub fn discover(&self, host: &str) -> AuthScheme {
        let host = host.to_lowercase();

        for candidate in host_candidates(&host) {
            if let Some(scheme) = self.custom.get(candidate) {
                return scheme.clone();
            }
            if self.use_defaults {
                if let Some(scheme) = KNOWN_PROVIDERS.get(candidate) {
                    return scheme.clone();
                }
            }
        }

        AuthScheme::Bearer
    }

    /// Returns `true` if the host (or a parent domain) has a mapping.
    #[must_use]
    pub fn is_known(&self, host: &str) -> bool {
        let host = host.to_lowercase();
        let known = host_candidates(&host).any(|candidate| {
            self.custom.contains_key(candidate)
                || (self.use_defaults && KNOWN_PROVIDERS.contains_key(candidate))
        });
        known
    }

    /// Returns the number of registered mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        let default_count = if self.use_defaults {
            KNOWN_PROVIDERS
                .keys()
                .filter(|k| !self.custom.contains_key(**k))
                .count()
        } else {
            0
        };
        self.custom.len() + default_count
    }

    /// Returns `true` if the registry has no mappings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.custom.is_empty() && (!self.use_defaults || KNOWN_PROVIDERS.is_empty())
    }
}

/// Discovers the auth scheme for an API host using the built-in table.
///
/// # Example
///
/// ```
/// use mailbox_poll::known_providers::{discover_auth_scheme, AuthScheme};
///
/// assert_eq!(discover_auth_scheme("api.zeptomail.in"), AuthScheme::ZohoApiKey);
/// assert_eq!(discover_auth_scheme("mail.example.org"), AuthScheme::Bearer);
/// ```
#[must_use]
pub fn discover_auth_scheme(host: &str) -> AuthScheme {
    ProviderRegistry::with_defaults().discover(host)
}
