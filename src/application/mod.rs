//! Feed services built on the domain layer and driven through the injected runtime.

pub mod config;
pub mod datafeed;
pub mod history;
pub mod poller;
pub mod runtime;
pub mod symbol_resolver;
pub mod time_service;

pub use config::{DataFeedConfig, FeedTuning};
pub use datafeed::{DataFeed, DataFeedCapabilities, ExchangeDescriptor};
pub use history::{HistoricalBarRetriever, HistoryOutcome, PagingPolicy};
pub use poller::{RealtimePoller, SubscriptionHandle};
pub use runtime::{Clock, Runtime, Timer};
pub use symbol_resolver::{ResolvedSymbol, SymbolResolver, SymbolSearchResult};
pub use time_service::ServerTimeService;
