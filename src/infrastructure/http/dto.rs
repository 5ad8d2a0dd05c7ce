use serde::Deserialize;

use crate::domain::errors::{DataFeedError, FeedResult};
use crate::domain::market_data::{RawBarRow, ServerTime};

/// OHLCV payload: a bare row array or one wrapped in `data`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OhlcvPayload {
    Rows(Vec<RawBarRow>),
    Wrapped { data: Vec<RawBarRow> },
}

pub fn parse_ohlcv_body(body: &str) -> FeedResult<Vec<RawBarRow>> {
    let payload: OhlcvPayload = serde_json::from_str(body)
        .map_err(|e| DataFeedError::Fetch(format!("Failed to parse OHLCV JSON: {e}")))?;
    Ok(match payload {
        OhlcvPayload::Rows(rows) | OhlcvPayload::Wrapped { data: rows } => rows,
    })
}

pub fn parse_server_time_body(body: &str) -> FeedResult<ServerTime> {
    serde_json::from_str(body)
        .map_err(|e| DataFeedError::Fetch(format!("Failed to parse server time JSON: {e}")))
}
