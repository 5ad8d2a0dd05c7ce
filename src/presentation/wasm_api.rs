use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo::utils::format::JsValueSerdeExt;
use js_sys::Function;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::application::{DataFeed, DataFeedConfig, HistoryOutcome, SubscriptionHandle};
use crate::domain::errors::{DataFeedError, FeedResult};
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{BarRange, Resolution, SymbolRecord, Timestamp};
use crate::infrastructure::{HttpMarketDataBackend, browser_runtime};
use crate::{log_debug, log_error};

const COMPONENT: LogComponent = LogComponent::Presentation("ChartDataFeed");

/// `periodParams` argument of `getBars`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PeriodParams {
    from: i64,
    to: i64,
    #[serde(default)]
    first_data_request: bool,
}

/// The part of the widget's symbol info we need to find the catalog record again
#[derive(Debug, Deserialize)]
struct SymbolInfoRef {
    ticker: Option<String>,
    name: Option<String>,
}

impl SymbolInfoRef {
    fn ticker(&self) -> Option<&str> {
        self.ticker.as_deref().or(self.name.as_deref())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryMetadata {
    no_data: bool,
}

fn to_js<T: Serialize>(value: &T) -> JsValue {
    JsValue::from_serde(value).unwrap_or_else(|e| {
        log_error!(COMPONENT, "Failed to convert value for JS: {}", e);
        JsValue::NULL
    })
}

fn call1(callback: &Function, arg: &JsValue) {
    if let Err(e) = callback.call1(&JsValue::NULL, arg) {
        log_error!(COMPONENT, "Widget callback threw: {:?}", e);
    }
}

fn call2(callback: &Function, first: &JsValue, second: &JsValue) {
    if let Err(e) = callback.call2(&JsValue::NULL, first, second) {
        log_error!(COMPONENT, "Widget callback threw: {:?}", e);
    }
}

/// Runs `callback` on a later turn of the event loop
fn defer<F: FnOnce() + 'static>(callback: F) {
    spawn_local(async move { callback() });
}

/// Data feed object handed to the charting widget
#[wasm_bindgen]
pub struct ChartDataFeed {
    feed: Rc<DataFeed<HttpMarketDataBackend>>,
    listeners: Rc<RefCell<HashMap<String, SubscriptionHandle>>>,
}

#[wasm_bindgen]
impl ChartDataFeed {
    /// Builds the feed from `{ exchangeLabel, symbolCatalog, authToken, apiBaseUrl?, tuning? }`
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<ChartDataFeed, JsValue> {
        let config: DataFeedConfig = config
            .into_serde()
            .map_err(|e| JsValue::from_str(&format!("Invalid data feed config: {e}")))?;
        let backend = HttpMarketDataBackend::new(config.api_base_url.clone(), config.auth_token.clone());
        let feed = DataFeed::new(config, Rc::new(backend), browser_runtime())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(Self { feed: Rc::new(feed), listeners: Rc::new(RefCell::new(HashMap::new())) })
    }

    #[wasm_bindgen(js_name = onReady)]
    pub fn on_ready(&self, callback: Function) {
        let capabilities = to_js(&self.feed.capabilities());
        defer(move || call1(&callback, &capabilities));
    }

    #[wasm_bindgen(js_name = getServerTime)]
    pub fn get_server_time(&self, callback: Function) {
        let feed = Rc::clone(&self.feed);
        spawn_local(async move {
            let time = feed.server_time().await;
            call1(&callback, &JsValue::from_f64(time.secs() as f64));
        });
    }

    #[wasm_bindgen(js_name = searchSymbols)]
    pub fn search_symbols(
        &self,
        user_input: String,
        exchange: String,
        symbol_type: String,
        on_result: Function,
    ) {
        let exchange_matches = exchange.is_empty() || exchange == self.feed.config().exchange_label;
        let type_matches = symbol_type.is_empty() || symbol_type == "crypto";
        let results = if exchange_matches && type_matches {
            self.feed.search_symbols(&user_input, None)
        } else {
            Vec::new()
        };
        let results = to_js(&results);
        defer(move || call1(&on_result, &results));
    }

    #[wasm_bindgen(js_name = resolveSymbol)]
    pub fn resolve_symbol(&self, symbol_name: String, on_resolve: Function, on_error: Function) {
        match self.feed.resolve_symbol(&symbol_name) {
            Ok(resolved) => {
                let resolved = to_js(&resolved);
                defer(move || call1(&on_resolve, &resolved));
            }
            Err(e) => {
                let message = JsValue::from_str(&e.to_string());
                defer(move || call1(&on_error, &message));
            }
        }
    }

    #[wasm_bindgen(js_name = getBars)]
    pub fn get_bars(
        &self,
        symbol_info: JsValue,
        resolution: String,
        period_params: JsValue,
        on_result: Function,
        on_error: Function,
    ) {
        let request = self.history_request(&symbol_info, &resolution, &period_params);
        let (record, resolution, params) = match request {
            Ok(parts) => parts,
            Err(e) => {
                let message = JsValue::from_str(&e.to_string());
                defer(move || call1(&on_error, &message));
                return;
            }
        };

        let feed = Rc::clone(&self.feed);
        spawn_local(async move {
            let range = BarRange::new(Timestamp::from_secs(params.from), Timestamp::from_secs(params.to));
            match feed.get_bars(&record, resolution, range, params.first_data_request).await {
                Ok(HistoryOutcome::Bars(bars)) => {
                    call2(&on_result, &to_js(&bars), &to_js(&HistoryMetadata { no_data: false }));
                }
                Ok(HistoryOutcome::NoData) => {
                    call2(&on_result, &js_sys::Array::new(), &to_js(&HistoryMetadata { no_data: true }));
                }
                Err(e) => call1(&on_error, &JsValue::from_str(&e.to_string())),
            }
        });
    }

    #[wasm_bindgen(js_name = subscribeBars)]
    pub fn subscribe_bars(
        &self,
        symbol_info: JsValue,
        resolution: String,
        on_tick: Function,
        listener_guid: String,
        _on_reset_cache_needed: JsValue,
    ) {
        let record = match self.record_for(&symbol_info) {
            Ok(record) => record,
            Err(e) => {
                log_error!(COMPONENT, "subscribeBars {}: {}", listener_guid, e);
                return;
            }
        };
        let resolution = match Resolution::parse(&resolution) {
            Ok(resolution) => resolution,
            Err(e) => {
                log_error!(COMPONENT, "subscribeBars {}: {}", listener_guid, e);
                return;
            }
        };

        self.unsubscribe_bars(listener_guid.clone());
        match self.feed.subscribe(&record, resolution, move |bar| call1(&on_tick, &to_js(&bar))) {
            Ok(handle) => {
                log_debug!(COMPONENT, "Listener {} -> subscription {}", listener_guid, handle.id());
                self.listeners.borrow_mut().insert(listener_guid, handle);
            }
            Err(e) => {
                log_error!(COMPONENT, "subscribeBars {}: {}", listener_guid, e);
            }
        }
    }

    #[wasm_bindgen(js_name = unsubscribeBars)]
    pub fn unsubscribe_bars(&self, listener_guid: String) {
        let handle = self.listeners.borrow_mut().remove(&listener_guid);
        if let Some(handle) = handle {
            self.feed.unsubscribe(handle);
        }
    }

    #[wasm_bindgen(js_name = activeSubscriptions)]
    pub fn active_subscriptions(&self) -> usize {
        self.feed.active_subscriptions()
    }
}

impl ChartDataFeed {
    fn record_for(&self, symbol_info: &JsValue) -> FeedResult<SymbolRecord> {
        let info: SymbolInfoRef = symbol_info
            .into_serde()
            .map_err(|e| DataFeedError::InvalidRequest(format!("unreadable symbol info: {e}")))?;
        let ticker = info
            .ticker()
            .ok_or_else(|| DataFeedError::InvalidRequest("symbol info without ticker".to_string()))?;
        self.feed.symbol_record(ticker).cloned()
    }

    fn history_request(
        &self,
        symbol_info: &JsValue,
        resolution: &str,
        period_params: &JsValue,
    ) -> FeedResult<(SymbolRecord, Resolution, PeriodParams)> {
        let record = self.record_for(symbol_info)?;
        let resolution = Resolution::parse(resolution)?;
        let params: PeriodParams = period_params
            .into_serde()
            .map_err(|e| DataFeedError::InvalidRequest(format!("invalid period params: {e}")))?;
        Ok((record, resolution, params))
    }
}
