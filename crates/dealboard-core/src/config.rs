//! Runtime configuration
//!
//! Populated by the binary from the environment (and `.env`); the library
//! never reads the environment itself.

use crate::cache::{Caches, DEFAULT_BOARD_TTL, DEFAULT_RESPONSE_TTL};
use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_MONDAY_API_URL: &str = "https://api.monday.com/v2";
pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-70b-versatile";

/// Settings for one dealboard process
#[derive(Clone)]
pub struct AppConfig {
    // monday.com
    pub monday_api_key: String,
    pub monday_api_url: String,
    pub deals_board_id: String,
    pub work_orders_board_id: String,
    /// Items requested per `items_page` call
    pub monday_page_size: u32,

    // Groq
    pub groq_api_key: String,
    pub groq_model: String,
    /// Base URL; `/chat/completions` is appended
    pub groq_api_url: String,

    // Caching and timeouts
    pub board_cache_ttl: Duration,
    pub response_cache_ttl: Duration,
    pub source_timeout: Duration,
    pub llm_timeout: Duration,

    /// Intents below this confidence are sent back for clarification
    pub confidence_threshold: f64,

    // Service
    /// Expose internal error detail in API responses
    pub debug: bool,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            monday_api_key: String::new(),
            monday_api_url: DEFAULT_MONDAY_API_URL.to_string(),
            deals_board_id: String::new(),
            work_orders_board_id: String::new(),
            monday_page_size: 100,
            groq_api_key: String::new(),
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            groq_api_url: DEFAULT_GROQ_API_URL.to_string(),
            board_cache_ttl: DEFAULT_BOARD_TTL,
            response_cache_ttl: DEFAULT_RESPONSE_TTL,
            source_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(60),
            confidence_threshold: 0.5,
            debug: false,
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("monday_api_key", &"[REDACTED]")
            .field("monday_api_url", &self.monday_api_url)
            .field("deals_board_id", &self.deals_board_id)
            .field("work_orders_board_id", &self.work_orders_board_id)
            .field("monday_page_size", &self.monday_page_size)
            .field("groq_api_key", &"[REDACTED]")
            .field("groq_model", &self.groq_model)
            .field("groq_api_url", &self.groq_api_url)
            .field("board_cache_ttl", &self.board_cache_ttl)
            .field("response_cache_ttl", &self.response_cache_ttl)
            .field("source_timeout", &self.source_timeout)
            .field("llm_timeout", &self.llm_timeout)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("debug", &self.debug)
            .field("log_level", &self.log_level)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

fn require(value: &str, name: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing { name });
    }
    Ok(())
}

/// Longest TTL or timeout accepted (one year)
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn bounded(value: Duration, name: &'static str) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".to_string(),
        });
    }
    if value > MAX_DURATION {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("{}s exceeds {}s", value.as_secs(), MAX_DURATION.as_secs()),
        });
    }
    Ok(())
}

impl AppConfig {
    /// Check credentials, board ids, TTLs and the confidence threshold
    pub fn validate(&self) -> Result<(), ConfigError> {
        require(&self.monday_api_key, "MONDAY_API_KEY")?;
        require(&self.monday_api_url, "MONDAY_API_URL")?;
        require(&self.deals_board_id, "DEALS_BOARD_ID")?;
        require(&self.work_orders_board_id, "WORK_ORDERS_BOARD_ID")?;
        require(&self.groq_api_key, "GROQ_API_KEY")?;
        require(&self.groq_model, "GROQ_MODEL")?;

        if self.monday_page_size == 0 || self.monday_page_size > 500 {
            return Err(ConfigError::Invalid {
                name: "MONDAY_PAGE_SIZE",
                reason: format!("{} is outside 1..=500", self.monday_page_size),
            });
        }

        bounded(self.board_cache_ttl, "CACHE_BOARD_TTL")?;
        bounded(self.response_cache_ttl, "CACHE_RESPONSE_TTL")?;
        bounded(self.source_timeout, "SOURCE_TIMEOUT")?;
        bounded(self.llm_timeout, "LLM_TIMEOUT")?;

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid {
                name: "CONFIDENCE_THRESHOLD",
                reason: format!("{} is outside 0.0..=1.0", self.confidence_threshold),
            });
        }
        Ok(())
    }

    /// Fresh cache pair with the configured TTLs
    pub fn caches(&self) -> Caches {
        Caches::new(self.board_cache_ttl, self.response_cache_ttl)
    }

    /// `host:port` for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
