pub mod dto;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use gloo_net::http::Request;

use crate::domain::{
    errors::{DataFeedError, FeedResult},
    logging::{LogComponent, get_logger},
    market_data::{HistoryRequest, MarketDataBackend, RawBarRow, ServerTime},
};

const OHLCV_PATH: &str = "market/ohlcv";
const TIME_PATH: &str = "time";

/// Market-data backend over HTTP with gloo
#[derive(Clone)]
pub struct HttpMarketDataBackend {
    base_url: String,
    auth_token: String,
}

impl HttpMarketDataBackend {
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), auth_token: auth_token.into() }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    pub fn ohlcv_endpoint(&self) -> String {
        self.endpoint(OHLCV_PATH)
    }

    pub fn time_endpoint(&self) -> String {
        self.endpoint(TIME_PATH)
    }

    /// Query parameters of one history page; times and resolution in milliseconds
    pub fn ohlcv_query(request: &HistoryRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("base", request.base.clone()),
            ("quote", request.quote.clone()),
            ("resolution", request.resolution_millis.to_string()),
            ("from", request.from_millis.to_string()),
            ("to", request.to_millis.to_string()),
        ];
        if let Some(limit) = request.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }

    async fn get_text(&self, url: &str, query: &[(&'static str, String)]) -> FeedResult<String> {
        get_logger().debug(LogComponent::Infrastructure("HTTP"), &format!("🌐 GET: {url} {query:?}"));

        let mut request = Request::get(url)
            .query(query.iter().map(|(key, value)| (*key, value.as_str())))
            .header("Accept", "application/json");
        if !self.auth_token.is_empty() {
            request = request.header("Authorization", &format!("Bearer {}", self.auth_token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DataFeedError::Fetch(format!("Request failed: {e:?}")))?;

        if !response.ok() {
            let message = format!("HTTP error: {} - {}", response.status(), response.status_text());
            get_logger().error(LogComponent::Infrastructure("HTTP"), &message);
            return Err(DataFeedError::Fetch(message));
        }

        let text = response
            .text()
            .await
            .map_err(|e| DataFeedError::Fetch(format!("Failed to read response: {e:?}")))?;

        get_logger().debug(
            LogComponent::Infrastructure("HTTP"),
            &format!("✅ GET response: {} bytes", text.len()),
        );
        Ok(text)
    }
}

impl MarketDataBackend for HttpMarketDataBackend {
    fn fetch_ohlcv<'a>(
        &'a self,
        request: &'a HistoryRequest,
    ) -> LocalBoxFuture<'a, FeedResult<Vec<RawBarRow>>> {
        async move {
            let body = self.get_text(&self.ohlcv_endpoint(), &Self::ohlcv_query(request)).await?;
            dto::parse_ohlcv_body(&body)
        }
        .boxed_local()
    }

    fn fetch_server_time(&self) -> LocalBoxFuture<'_, FeedResult<ServerTime>> {
        async move {
            let body = self.get_text(&self.time_endpoint(), &[]).await?;
            dto::parse_server_time_body(&body)
        }
        .boxed_local()
    }
}
