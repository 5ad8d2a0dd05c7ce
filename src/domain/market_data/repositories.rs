use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use super::entities::SymbolRecord;
use super::value_objects::Resolution;
use crate::domain::errors::FeedResult;

/// Positional OHLCV row as the backend sends it: `[timeMillis, open, high, low, close, volume]`.
/// Fields may be JSON numbers or numeric strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBarRow(pub Vec<serde_json::Value>);

/// Query for one page of history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub base: String,
    pub quote: String,
    pub resolution_millis: u64,
    pub from_millis: i64,
    pub to_millis: i64,
    pub limit: Option<u32>,
}

impl HistoryRequest {
    pub fn new(
        symbol: &SymbolRecord,
        resolution: Resolution,
        from_millis: i64,
        to_millis: i64,
        limit: Option<u32>,
    ) -> Self {
        Self {
            base: symbol.base.clone(),
            quote: symbol.quote.clone(),
            resolution_millis: resolution.duration_ms(),
            from_millis,
            to_millis,
            limit,
        }
    }
}

/// Authoritative server clock reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub server_time_millis: i64,
}

/// Remote market-data source consumed by the feed
pub trait MarketDataBackend {
    fn fetch_ohlcv<'a>(
        &'a self,
        request: &'a HistoryRequest,
    ) -> LocalBoxFuture<'a, FeedResult<Vec<RawBarRow>>>;

    fn fetch_server_time(&self) -> LocalBoxFuture<'_, FeedResult<ServerTime>>;
}
