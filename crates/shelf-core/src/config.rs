use std::{fmt, time::Duration};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    facet::DEFAULT_FACET_BATCH_SIZE,
    ingest::DEFAULT_CHUNK_SIZE,
    page::DEFAULT_PAGE_SIZE,
    virtual_window::{DEFAULT_OVERSCAN, DEFAULT_ROW_HEIGHT},
};

pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_SEND_DELAY_MS: u64 = 500;
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;

pub const ENV_BOT_TOKEN: &str = "SHELF_TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "SHELF_TELEGRAM_CHAT_ID";
pub const ENV_API_BASE: &str = "SHELF_TELEGRAM_API_BASE";
pub const ENV_SEND_DELAY_MS: &str = "SHELF_SEND_DELAY_MS";

/// Tunables of the dashboard engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct DashboardConfig {
    #[builder(default = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
    /// Rows per ingested CSV chunk.
    #[builder(default = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
    /// Rows per facet scan batch.
    #[builder(default = DEFAULT_FACET_BATCH_SIZE)]
    pub facet_batch_size: usize,
    #[builder(default = DEFAULT_SEARCH_DEBOUNCE_MS)]
    pub search_debounce_ms: u64,
    #[builder(default = DEFAULT_ROW_HEIGHT)]
    pub row_height: f32,
    #[builder(default = DEFAULT_OVERSCAN)]
    pub overscan: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DashboardConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

/// Where and how fast to post photo messages.
#[derive(Clone, Builder)]
pub struct TelegramConfig {
    #[builder(into)]
    pub bot_token: String,
    #[builder(into)]
    pub chat_id: String,
    #[builder(into, default = DEFAULT_TELEGRAM_API_BASE.to_string())]
    pub api_base: String,
    /// Pause between two consecutive requests.
    #[builder(default = Duration::from_millis(DEFAULT_SEND_DELAY_MS))]
    pub send_delay: Duration,
    #[builder(default = Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS))]
    pub timeout: Duration,
}

// keep the token out of logs
impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("send_delay", &self.send_delay)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl TelegramConfig {
    /// Read the `SHELF_TELEGRAM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TelegramConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{key} is not set")))
        };

        let bot_token = required(ENV_BOT_TOKEN)?;
        let chat_id = required(ENV_CHAT_ID)?;
        let api_base = lookup(ENV_API_BASE)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TELEGRAM_API_BASE.to_string());
        let send_delay = match lookup(ENV_SEND_DELAY_MS) {
            Some(ms) => ms.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("{ENV_SEND_DELAY_MS} must be milliseconds: {e}"))
            })?,
            None => DEFAULT_SEND_DELAY_MS,
        };

        Ok(Self::builder()
            .bot_token(bot_token)
            .chat_id(chat_id)
            .api_base(api_base)
            .send_delay(Duration::from_millis(send_delay))
            .build())
    }
}
