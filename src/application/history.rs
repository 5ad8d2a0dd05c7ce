use std::rc::Rc;
use std::time::Duration;

use crate::application::runtime::{Timer, with_timeout};
use crate::domain::errors::FeedResult;
use crate::domain::logging::{LogComponent, LogLevel, get_logger};
use crate::domain::market_data::services::normalize_rows;
use crate::domain::market_data::{
    AccumulatedBarSet, Bar, BarRange, HistoryRequest, MarketDataBackend, Resolution, SymbolRecord,
    Timestamp,
};
use crate::log_debug;

const COMPONENT: LogComponent = LogComponent::Application("History");

/// Paging limits for one historical load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingPolicy {
    pub page_limit: Option<u32>,
    pub max_pages: u32,
    pub request_timeout: Duration,
}

/// Result of a successful historical load
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    Bars(Vec<Bar>),
    NoData,
}

impl HistoryOutcome {
    pub fn bars(&self) -> &[Bar] {
        match self {
            Self::Bars(bars) => bars,
            Self::NoData => &[],
        }
    }
}

/// Fetches and normalizes OHLCV bars for a time window
pub struct HistoricalBarRetriever<B> {
    backend: Rc<B>,
    timer: Rc<dyn Timer>,
    policy: PagingPolicy,
}

impl<B: MarketDataBackend> HistoricalBarRetriever<B> {
    pub fn new(backend: Rc<B>, timer: Rc<dyn Timer>, policy: PagingPolicy) -> Self {
        Self { backend, timer, policy }
    }

    /// Bars in `[range.from, range.to)`, strictly increasing by time.
    ///
    /// The accumulator lives only for this call, so overlapping loads never share state.
    pub async fn fetch_range(
        &self,
        symbol: &SymbolRecord,
        resolution: Resolution,
        range: BarRange,
    ) -> FeedResult<Vec<Bar>> {
        self.fetch_pages(symbol, resolution, range, self.policy.page_limit, self.policy.max_pages).await
    }

    /// Freshest bar in `[range.from, range.to)` from one unpaginated request
    pub async fn fetch_latest(
        &self,
        symbol: &SymbolRecord,
        resolution: Resolution,
        range: BarRange,
    ) -> FeedResult<Option<Bar>> {
        let bars = self.fetch_pages(symbol, resolution, range, None, 1).await?;
        Ok(bars.last().copied())
    }

    async fn fetch_pages(
        &self,
        symbol: &SymbolRecord,
        resolution: Resolution,
        range: BarRange,
        page_limit: Option<u32>,
        max_pages: u32,
    ) -> FeedResult<Vec<Bar>> {
        let mut accumulated = AccumulatedBarSet::new();
        if range.is_empty() {
            return Ok(accumulated.into_bars());
        }

        let step_ms = resolution.duration_ms() as i64;
        let to_millis = range.to.as_millis();
        let mut from_millis = range.from.as_millis();
        let mut pages = 0u32;

        while pages < max_pages {
            let request = HistoryRequest::new(symbol, resolution, from_millis, to_millis, page_limit);
            let rows = with_timeout(
                self.timer.as_ref(),
                self.policy.request_timeout,
                self.backend.fetch_ohlcv(&request),
            )
            .await?;
            pages += 1;

            let received = rows.len();
            let normalized = normalize_rows(&rows);
            if normalized.rejected > 0 {
                get_logger().log_with_metadata(
                    LogLevel::Warn,
                    COMPONENT,
                    &format!("Dropped rows for {} that could not be normalized", symbol.symbol),
                    &format!("rejected={} received={}", normalized.rejected, received),
                );
            }

            let newest = normalized.bars.iter().map(|bar| bar.time).max();
            accumulated.extend(normalized.bars.into_iter().filter(|bar| range.contains(bar.time)));

            let Some(next_from) = next_page_start(page_limit, received, newest, step_ms) else {
                break;
            };
            if next_from <= from_millis || next_from >= to_millis {
                break;
            }
            from_millis = next_from;
        }

        log_debug!(
            COMPONENT,
            "Loaded {} bars for {} @ {} in {} page(s) [{}, {})",
            accumulated.len(),
            symbol.symbol,
            resolution,
            pages,
            range.from,
            range.to
        );

        Ok(accumulated.into_bars())
    }
}

/// Start of the next page when the current one came back full
fn next_page_start(
    page_limit: Option<u32>,
    received: usize,
    newest: Option<Timestamp>,
    step_ms: i64,
) -> Option<i64> {
    let limit = page_limit? as usize;
    if received < limit {
        return None;
    }
    newest.map(|time| time.as_millis().saturating_add(step_ms))
}
