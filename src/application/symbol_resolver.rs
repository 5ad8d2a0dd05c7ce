use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DataFeedError, FeedResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::services::price_scale;
use crate::domain::market_data::{Resolution, SymbolCatalog, SymbolRecord};
use crate::{log_debug, log_warn};

const COMPONENT: LogComponent = LogComponent::Application("SymbolResolver");
const SYMBOL_TYPE: &str = "crypto";
const DEFAULT_VOLUME_PRECISION: u32 = 2;

/// Symbol description in the shape the charting widget consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    pub name: String,
    pub ticker: String,
    pub full_name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub symbol_type: String,
    pub session: String,
    pub timezone: String,
    pub exchange: String,
    pub listed_exchange: String,
    pub format: String,
    pub minmov: u32,
    pub pricescale: u64,
    pub has_intraday: bool,
    pub has_daily: bool,
    pub has_weekly_and_monthly: bool,
    pub supported_resolutions: Vec<String>,
    pub volume_precision: u32,
    pub data_status: String,
    pub base: String,
    pub quote: String,
}

/// Entry returned by symbol search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSearchResult {
    pub symbol: String,
    pub full_name: String,
    pub description: String,
    pub exchange: String,
    pub ticker: String,
    #[serde(rename = "type")]
    pub symbol_type: String,
}

/// Maps widget ticker strings onto catalog records
pub struct SymbolResolver {
    catalog: Rc<SymbolCatalog>,
    exchange_label: String,
}

impl SymbolResolver {
    pub fn new(catalog: Rc<SymbolCatalog>, exchange_label: impl Into<String>) -> Self {
        Self { catalog, exchange_label: exchange_label.into() }
    }

    /// Catalog record for `ticker`; first exact match wins
    pub fn record(&self, ticker: &str) -> FeedResult<&SymbolRecord> {
        self.catalog.find(ticker).ok_or_else(|| DataFeedError::SymbolNotFound(ticker.to_string()))
    }

    pub fn resolve(&self, ticker: &str) -> FeedResult<ResolvedSymbol> {
        match self.record(ticker) {
            Ok(record) => {
                let resolved = self.describe(record);
                log_debug!(COMPONENT, "Resolved {} with pricescale {}", ticker, resolved.pricescale);
                Ok(resolved)
            }
            Err(e) => {
                log_warn!(COMPONENT, "{}", e);
                Err(e)
            }
        }
    }

    pub fn search(&self, query: &str, limit: Option<usize>) -> Vec<SymbolSearchResult> {
        self.catalog
            .search(query)
            .take(limit.unwrap_or(usize::MAX))
            .map(|record| SymbolSearchResult {
                symbol: record.symbol.clone(),
                full_name: self.full_name(record),
                description: Self::description(record),
                exchange: self.exchange_label.clone(),
                ticker: record.symbol.clone(),
                symbol_type: SYMBOL_TYPE.to_string(),
            })
            .collect()
    }

    fn describe(&self, record: &SymbolRecord) -> ResolvedSymbol {
        ResolvedSymbol {
            name: record.symbol.clone(),
            ticker: record.symbol.clone(),
            full_name: self.full_name(record),
            description: Self::description(record),
            symbol_type: SYMBOL_TYPE.to_string(),
            session: "24x7".to_string(),
            timezone: "Etc/UTC".to_string(),
            exchange: self.exchange_label.clone(),
            listed_exchange: self.exchange_label.clone(),
            format: "price".to_string(),
            minmov: 1,
            pricescale: price_scale(record),
            has_intraday: true,
            has_daily: true,
            has_weekly_and_monthly: true,
            supported_resolutions: Resolution::supported(),
            volume_precision: record.precision.amount.unwrap_or(DEFAULT_VOLUME_PRECISION),
            data_status: "streaming".to_string(),
            base: record.base.clone(),
            quote: record.quote.clone(),
        }
    }

    fn full_name(&self, record: &SymbolRecord) -> String {
        format!("{}:{}", self.exchange_label, record.symbol)
    }

    fn description(record: &SymbolRecord) -> String {
        format!("{} / {}", record.base, record.quote)
    }
}
