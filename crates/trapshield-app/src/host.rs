//! Host environment capability: the optional source of an active tab URL.

use async_trait::async_trait;
use url::Url;

/// Environment variable read by [`EnvHostEnvironment`].
pub const ACTIVE_URL_ENV: &str = "TRAPSHIELD_ACTIVE_URL";

/// Optional host facility exposing the user's active tab.
///
/// Absence is a normal outcome: implementations return `None` instead of
/// failing when the host API is unavailable.
#[async_trait]
pub trait HostEnvironment: Send + Sync {
    /// URL of the currently active tab, if the host can tell.
    async fn active_tab_url(&self) -> Option<String>;
}

/// Host without tab inspection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHostEnvironment;

#[async_trait]
impl HostEnvironment for NoHostEnvironment {
    async fn active_tab_url(&self) -> Option<String> {
        None
    }
}

/// Host reporting a fixed active tab.
#[derive(Debug, Clone, Default)]
pub struct FixedHostEnvironment {
    url: Option<String>,
}

impl FixedHostEnvironment {
    /// Host whose active tab is `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }
}

#[async_trait]
impl HostEnvironment for FixedHostEnvironment {
    async fn active_tab_url(&self) -> Option<String> {
        self.url.clone()
    }
}

/// Host reading the active tab from [`ACTIVE_URL_ENV`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvHostEnvironment;

#[async_trait]
impl HostEnvironment for EnvHostEnvironment {
    async fn active_tab_url(&self) -> Option<String> {
        active_url_from(std::env::var(ACTIVE_URL_ENV).ok())
    }
}

/// Trims a raw variable value; blank counts as no active tab.
fn active_url_from(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Returns `true` for parseable `http` and `https` URLs.
///
/// Browser-internal pages (`chrome://newtab`, `about:blank`, `file://`) are
/// not analyzable.
pub fn is_analyzable_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
