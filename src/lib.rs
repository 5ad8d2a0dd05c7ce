use wasm_bindgen::prelude::*;

use crate::domain::logging::{LogComponent, get_logger};

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::{
    DataFeed, DataFeedCapabilities, DataFeedConfig, FeedTuning, HistoryOutcome, ResolvedSymbol,
    SubscriptionHandle,
};
pub use domain::errors::{DataFeedError, FeedResult};
pub use domain::market_data::{Bar, BarRange, Resolution, SymbolCatalog, SymbolRecord, Timestamp};
pub use presentation::ChartDataFeed;

/// Installs the console logger and panic hook once the module is loaded
#[wasm_bindgen(start)]
pub fn initialize() {
    console_error_panic_hook::set_once();

    let console_logger = if cfg!(debug_assertions) {
        infrastructure::services::ConsoleLogger::new_development()
    } else {
        infrastructure::services::ConsoleLogger::new_production()
    };
    domain::logging::init_logger(Box::new(console_logger));
    domain::logging::init_time_provider(Box::new(infrastructure::services::BrowserTimeProvider::new()));

    get_logger().info(LogComponent::Presentation("Initialize"), "Chart data feed module loaded");
}
