//! Application-level configuration constants and the external endpoints.

use reqwest::Url;

// UI Behavior
pub const DEBOUNCE_MS: u32 = 300;
pub const SLOTS_REFRESH_MS: u32 = 30_000;
pub const TYPING_INTERVAL_MS: u32 = 30;
pub const SPEECH_LINE_MS: u32 = 1_200;
pub const MOBILE_BREAKPOINT_PX: f64 = 640.0;

// Claim rules
pub const CAPACITY: u64 = 300;
pub const MIN_HANDLE_LEN: usize = 3;

// Response cache
pub const CACHE_TTL_MS: u64 = 30_000;
pub const CACHE_MAX_ENTRIES: usize = 256;

// Defaults for the external collaborators
pub const DEFAULT_RECORD_STORE_URL: &str = "https://app.nocodb.com";
pub const DEFAULT_RELAY_PATH: &str = "/api/slack";
pub const SHARE_INTENT_URL: &str = "https://twitter.com/intent/tweet";
pub const SHARE_MENTION: &str = "@pointerinc";
pub const SITE_DOMAIN: &str = "trypointer.com";

/// Endpoints and credentials for the hosted services.
///
/// Values are baked in at build time from the `OPERATOR_CLAIM_*` environment
/// variables, the same way the page bundle is configured for deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimConfig {
    pub record_store_url: String,
    pub api_key: String,
    pub table_id: String,
    pub relay_url: String,
    pub capacity: u64,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            record_store_url: DEFAULT_RECORD_STORE_URL.to_string(),
            api_key: String::new(),
            table_id: String::new(),
            relay_url: DEFAULT_RELAY_PATH.to_string(),
            capacity: CAPACITY,
        }
    }
}

impl ClaimConfig {
    pub fn from_build_env() -> Self {
        let defaults = Self::default();
        let cfg = Self {
            record_store_url: option_env!("OPERATOR_CLAIM_RECORD_STORE_URL")
                .map(str::to_string)
                .unwrap_or(defaults.record_store_url),
            api_key: option_env!("OPERATOR_CLAIM_API_KEY")
                .map(str::to_string)
                .unwrap_or(defaults.api_key),
            table_id: option_env!("OPERATOR_CLAIM_TABLE_ID")
                .map(str::to_string)
                .unwrap_or(defaults.table_id),
            relay_url: option_env!("OPERATOR_CLAIM_RELAY_URL")
                .map(str::to_string)
                .unwrap_or(defaults.relay_url),
            capacity: defaults.capacity,
        };
        if cfg.api_key.is_empty() || cfg.table_id.is_empty() {
            log::warn!("record store API key or table id missing; claims will fail");
        }
        cfg
    }

    /// Resolve a relative relay URL (e.g. `/api/slack`) against the page origin.
    pub fn with_origin(mut self, origin: &str) -> Self {
        if Url::parse(&self.relay_url).is_err() {
            match Url::parse(origin).and_then(|base| base.join(&self.relay_url)) {
                Ok(url) => self.relay_url = url.to_string(),
                Err(e) => log::warn!("cannot resolve relay url against {}: {}", origin, e),
            }
        }
        self
    }
}
