use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DataFeedError, FeedResult};
use crate::domain::market_data::{SymbolCatalog, SymbolRecord};

pub const DEFAULT_API_BASE_URL: &str = "https://api.example-exchange.com";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

/// Timing and paging knobs for the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedTuning {
    pub poll_interval_ms: u32,
    pub request_timeout_ms: u32,
    /// Rows per history request; `None` fetches the whole range in one call
    pub page_limit: Option<u32>,
    pub max_pages: u32,
}

impl Default for FeedTuning {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10_000,
            request_timeout_ms: 15_000,
            page_limit: Some(1_000),
            max_pages: 10,
        }
    }
}

impl FeedTuning {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.poll_interval_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.request_timeout_ms))
    }
}

/// Settings handed to the feed once at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFeedConfig {
    pub exchange_label: String,
    pub symbol_catalog: Vec<SymbolRecord>,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub tuning: FeedTuning,
}

impl DataFeedConfig {
    pub fn new(
        exchange_label: impl Into<String>,
        symbol_catalog: Vec<SymbolRecord>,
        auth_token: impl Into<String>,
    ) -> Self {
        Self {
            exchange_label: exchange_label.into(),
            symbol_catalog,
            auth_token: auth_token.into(),
            api_base_url: default_api_base_url(),
            tuning: FeedTuning::default(),
        }
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn with_tuning(mut self, tuning: FeedTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn catalog(&self) -> SymbolCatalog {
        SymbolCatalog::new(self.symbol_catalog.clone())
    }

    pub fn validate(&self) -> FeedResult<()> {
        let invalid = |msg: String| Err(DataFeedError::InvalidConfig(msg));

        if self.exchange_label.trim().is_empty() {
            return invalid("exchange label must not be empty".to_string());
        }
        if let Some(ticker) = self.catalog().first_duplicate() {
            return invalid(format!("duplicate ticker in symbol catalog: {ticker}"));
        }
        if self.tuning.poll_interval_ms == 0 {
            return invalid("poll interval must be positive".to_string());
        }
        if self.tuning.request_timeout_ms == 0 {
            return invalid("request timeout must be positive".to_string());
        }
        if self.tuning.page_limit == Some(0) {
            return invalid("page limit must be positive".to_string());
        }
        if self.tuning.max_pages == 0 {
            return invalid("max pages must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_js_config_with_defaults() {
        let config: DataFeedConfig = serde_json::from_str(
            r#"{
                "exchangeLabel": "Binance",
                "symbolCatalog": [
                    {"symbol": "BTC/USDT", "base": "BTC", "quote": "USDT",
                     "limits": {"price": {"min": 0.01}}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.auth_token, "");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.tuning, FeedTuning::default());
        assert_eq!(config.symbol_catalog[0].limits.price.min, Some(0.01));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_tuning_keeps_other_defaults() {
        let tuning: FeedTuning =
            serde_json::from_str(r#"{"pollIntervalMs": 2500, "pageLimit": null}"#).unwrap();
        assert_eq!(tuning.poll_interval(), Duration::from_millis(2_500));
        assert_eq!(tuning.page_limit, None);
        assert_eq!(tuning.max_pages, 10);
    }

    #[test]
    fn rejects_bad_settings() {
        let record = SymbolRecord::new("BTC/USDT", "BTC", "USDT");

        let empty_label = DataFeedConfig::new(" ", vec![record.clone()], "");
        assert!(matches!(empty_label.validate(), Err(DataFeedError::InvalidConfig(_))));

        let dup = DataFeedConfig::new("X", vec![record.clone(), record.clone()], "");
        assert_eq!(
            dup.validate(),
            Err(DataFeedError::InvalidConfig(
                "duplicate ticker in symbol catalog: BTC/USDT".to_string()
            ))
        );

        let zero_page = DataFeedConfig::new("X", vec![record], "")
            .with_tuning(FeedTuning { page_limit: Some(0), ..FeedTuning::default() });
        assert!(zero_page.validate().is_err());
    }
}
