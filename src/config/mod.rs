/// Application configuration module
use anyhow::{bail, Context};
use reqwest::Url;
use std::env;
use std::time::Duration;

pub const DEFAULT_ARCHIVE_URL: &str = "https://exoplanetarchive.ipac.caltech.edu";
pub const DEFAULT_CLASSIFIER_URL: &str = "https://the-drifters-project.onrender.com";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub gateway: GatewayConfig,
}

/// Everything the archive gateway needs to reach its upstreams
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub archive_base_url: Url,
    pub classifier_base_url: Url,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let archive_base_url = url_var(&lookup, "ARCHIVE_BASE_URL", DEFAULT_ARCHIVE_URL)?;
        let classifier_base_url =
            url_var(&lookup, "CLASSIFIER_BASE_URL", DEFAULT_CLASSIFIER_URL)?;

        let timeout_seconds = lookup_u64(&lookup, "REQUEST_TIMEOUT_SECONDS", DEFAULT_TIMEOUT_SECONDS);
        if timeout_seconds == 0 {
            bail!("REQUEST_TIMEOUT_SECONDS must be greater than zero");
        }

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let user_agent = lookup("USER_AGENT").unwrap_or_else(default_user_agent);

        Ok(Self {
            bind_addr,
            gateway: GatewayConfig {
                archive_base_url,
                classifier_base_url,
                request_timeout: Duration::from_secs(timeout_seconds),
                user_agent,
            },
        })
    }
}

fn default_user_agent() -> String {
    format!("exoplanet-gateway/{}", env!("CARGO_PKG_VERSION"))
}

fn url_var<F>(lookup: &F, key: &str, default: &str) -> anyhow::Result<Url>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    Url::parse(raw.trim()).with_context(|| format!("{key} is not a valid URL: {raw}"))
}

fn lookup_u64<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
