use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://mini-shipping-manager-backend.onrender.com";
pub const DEFAULT_DWELL_MS: u64 = 3000;
pub const DEFAULT_PAGE_OUTPUT: &str = "shipments.html";

const MERGE_PATH: &str = "/api/shipments/merge-last-5";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub shipments_path: String,
    pub notification_dwell: Duration,
    pub http_timeout: Option<Duration>,
    pub page_output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            shipments_path: String::new(),
            notification_dwell: Duration::from_millis(DEFAULT_DWELL_MS),
            http_timeout: None,
            page_output: PathBuf::from(DEFAULT_PAGE_OUTPUT),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `SHIPPING_API_URL`: Optional - API base URL (default: the hosted backend)
    /// - `SHIPPING_SHIPMENTS_PATH`: Optional - Path of the shipment collection (default: "")
    /// - `SHIPPING_NOTIFICATION_DWELL_MS`: Optional - Notification dwell time (default: 3000)
    /// - `SHIPPING_HTTP_TIMEOUT_SECS`: Optional - Request timeout (default: none)
    /// - `SHIPPING_PAGE_OUTPUT`: Optional - Where the page snapshot is written (default: "shipments.html")
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let api_url = lookup("SHIPPING_API_URL")
            .unwrap_or(defaults.api_url)
            .trim()
            .trim_end_matches('/')
            .to_string();

        if api_url.is_empty() {
            bail!("SHIPPING_API_URL cannot be empty");
        }

        let shipments_path = lookup("SHIPPING_SHIPMENTS_PATH")
            .map(|path| path.trim().to_string())
            .unwrap_or(defaults.shipments_path);

        if !shipments_path.is_empty() && !shipments_path.starts_with('/') {
            bail!("SHIPPING_SHIPMENTS_PATH must start with '/'");
        }

        let notification_dwell = match lookup("SHIPPING_NOTIFICATION_DWELL_MS") {
            Some(value) => Duration::from_millis(
                value
                    .trim()
                    .parse()
                    .context("SHIPPING_NOTIFICATION_DWELL_MS must be a whole number of milliseconds")?,
            ),
            None => defaults.notification_dwell,
        };

        let http_timeout = match lookup("SHIPPING_HTTP_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value
                    .trim()
                    .parse()
                    .context("SHIPPING_HTTP_TIMEOUT_SECS must be a whole number of seconds")?;
                if secs == 0 {
                    bail!("SHIPPING_HTTP_TIMEOUT_SECS must be greater than zero");
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let page_output = lookup("SHIPPING_PAGE_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or(defaults.page_output);

        Ok(Config {
            api_url,
            shipments_path,
            notification_dwell,
            http_timeout,
            page_output,
        })
    }

    pub fn shipments_url(&self) -> String {
        format!("{}{}", self.api_url, self.shipments_path)
    }

    pub fn merge_url(&self) -> String {
        format!("{}{}", self.api_url, MERGE_PATH)
    }
}
