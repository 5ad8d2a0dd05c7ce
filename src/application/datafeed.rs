use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::application::config::DataFeedConfig;
use crate::application::history::{HistoricalBarRetriever, HistoryOutcome, PagingPolicy};
use crate::application::poller::{RealtimePoller, SessionAnchor, SubscriptionHandle};
use crate::application::runtime::Runtime;
use crate::application::symbol_resolver::{ResolvedSymbol, SymbolResolver, SymbolSearchResult};
use crate::application::time_service::ServerTimeService;
use crate::domain::errors::FeedResult;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{
    Bar, BarRange, MarketDataBackend, Resolution, SymbolCatalog, SymbolRecord, Timestamp,
};
use crate::{log_error, log_info};

const COMPONENT: LogComponent = LogComponent::Application("DataFeed");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeDescriptor {
    pub value: String,
    pub name: String,
    pub desc: String,
}

/// Static feature set reported to the widget on readiness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFeedCapabilities {
    pub supports_marks: bool,
    pub supports_timescale_marks: bool,
    pub supports_time: bool,
    pub supported_resolutions: Vec<String>,
    pub exchanges: Vec<ExchangeDescriptor>,
}

/// Chart data feed: readiness, server time, symbol resolution, history and live polling
pub struct DataFeed<B> {
    config: DataFeedConfig,
    resolver: SymbolResolver,
    time_service: ServerTimeService<B>,
    history: Rc<HistoricalBarRetriever<B>>,
    poller: RealtimePoller<B>,
    anchor: SessionAnchor,
}

impl<B: MarketDataBackend + 'static> DataFeed<B> {
    pub fn new(config: DataFeedConfig, backend: Rc<B>, runtime: Runtime) -> FeedResult<Self> {
        config.validate()?;

        let tuning = config.tuning;
        let catalog = Rc::new(SymbolCatalog::new(config.symbol_catalog.clone()));
        let resolver = SymbolResolver::new(catalog, config.exchange_label.clone());
        let time_service = ServerTimeService::new(
            Rc::clone(&backend),
            Rc::clone(&runtime.clock),
            Rc::clone(&runtime.timer),
            tuning.request_timeout(),
        );
        let history = Rc::new(HistoricalBarRetriever::new(
            backend,
            Rc::clone(&runtime.timer),
            PagingPolicy {
                page_limit: tuning.page_limit,
                max_pages: tuning.max_pages,
                request_timeout: tuning.request_timeout(),
            },
        ));
        let anchor: SessionAnchor = Rc::new(Cell::new(None));
        let poller =
            RealtimePoller::new(Rc::clone(&history), runtime, Rc::clone(&anchor), tuning.poll_interval());

        log_info!(
            COMPONENT,
            "Data feed ready for {} with {} symbols",
            config.exchange_label,
            config.symbol_catalog.len()
        );

        Ok(Self { config, resolver, time_service, history, poller, anchor })
    }

    pub fn config(&self) -> &DataFeedConfig {
        &self.config
    }

    pub fn capabilities(&self) -> DataFeedCapabilities {
        let label = &self.config.exchange_label;
        DataFeedCapabilities {
            supports_marks: false,
            supports_timescale_marks: false,
            supports_time: true,
            supported_resolutions: Resolution::supported(),
            exchanges: vec![ExchangeDescriptor {
                value: label.clone(),
                name: label.clone(),
                desc: label.clone(),
            }],
        }
    }

    pub async fn server_time(&self) -> Timestamp {
        self.time_service.server_time().await
    }

    pub fn resolve_symbol(&self, ticker: &str) -> FeedResult<ResolvedSymbol> {
        self.resolver.resolve(ticker)
    }

    pub fn symbol_record(&self, ticker: &str) -> FeedResult<&SymbolRecord> {
        self.resolver.record(ticker)
    }

    pub fn search_symbols(&self, query: &str, limit: Option<usize>) -> Vec<SymbolSearchResult> {
        self.resolver.search(query, limit)
    }

    /// Historical bars for `range`. The first request of a session records `range.from` as the
    /// anchor the live poller refreshes from.
    pub async fn get_bars(
        &self,
        symbol: &SymbolRecord,
        resolution: Resolution,
        range: BarRange,
        first_request: bool,
    ) -> FeedResult<HistoryOutcome> {
        if first_request {
            self.anchor.set(Some(range.from));
        }

        match self.history.fetch_range(symbol, resolution, range).await {
            Ok(bars) if bars.is_empty() => Ok(HistoryOutcome::NoData),
            Ok(bars) => Ok(HistoryOutcome::Bars(bars)),
            Err(e) => {
                log_error!(
                    COMPONENT,
                    "History for {} @ {} [{}, {}) failed: {}",
                    symbol.symbol,
                    resolution,
                    range.from,
                    range.to,
                    e
                );
                Err(e)
            }
        }
    }

    pub fn session_anchor(&self) -> Option<Timestamp> {
        self.anchor.get()
    }

    pub fn subscribe<F>(
        &self,
        symbol: &SymbolRecord,
        resolution: Resolution,
        on_bar: F,
    ) -> FeedResult<SubscriptionHandle>
    where
        F: FnMut(Bar) + 'static,
    {
        self.poller.subscribe(symbol, resolution, on_bar)
    }

    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.poller.unsubscribe(handle)
    }

    pub fn is_subscribed(&self, handle: SubscriptionHandle) -> bool {
        self.poller.is_subscribed(handle)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.poller.active_count()
    }
}
