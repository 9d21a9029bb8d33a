use gloo_net::http::Request;

use super::dto::HistoricalResponse;
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::{Candle, HistoryProvider, Symbol, TimeInterval, Timestamp};
use crate::time_utils;

/// REST client for the historical-data endpoint.
#[derive(Debug, Clone)]
pub struct HistoryHttpClient {
    base_url: String,
}

impl HistoryHttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn historical_url(
        &self,
        symbol: &Symbol,
        interval: TimeInterval,
        end_time_exclusive: Timestamp,
        limit: u32,
    ) -> String {
        format!(
            "{}/api/historical/{}?end_time={}&limit={}&interval={}",
            self.base_url.trim_end_matches('/'),
            symbol.value(),
            urlencode(&time_utils::format_backend_timestamp(end_time_exclusive)),
            limit,
            interval.as_query_str(),
        )
    }

    async fn fetch_from_url(&self, url: String) -> ChartResult<Vec<Candle>> {
        get_logger().debug(LogComponent::Infrastructure("HistoryAPI"), &format!("GET {url}"));

        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| ChartError::Network(format!("history request failed: {e:?}")))?;

        if !response.ok() {
            return Err(ChartError::Network(format!("history HTTP error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ChartError::Network(format!("history body unreadable: {e:?}")))?;

        let candles = parse_history_response(&body)?;
        get_logger().debug(
            LogComponent::Infrastructure("HistoryAPI"),
            &format!("loaded {} historical candles", candles.len()),
        );
        Ok(candles)
    }
}

impl HistoryProvider for HistoryHttpClient {
    async fn fetch_before(
        &self,
        symbol: &Symbol,
        interval: TimeInterval,
        end_time_exclusive: Timestamp,
        limit: u32,
    ) -> ChartResult<Vec<Candle>> {
        let url = self.historical_url(symbol, interval, end_time_exclusive, limit);
        self.fetch_from_url(url).await
    }
}

/// Decode a history response body into candles. An empty `price_data` is a
/// valid "no more history" answer, not an error.
pub fn parse_history_response(body: &str) -> ChartResult<Vec<Candle>> {
    let response: HistoricalResponse = serde_json::from_str(body)
        .map_err(|e| ChartError::Parse(format!("history payload: {e}")))?;
    response.price_data.iter().map(|row| row.to_candle()).collect()
}

// Only ever fed the fixed "%Y-%m-%d %H:%M:%S" rendering, whose sole
// reserved characters are the space and the colons.
fn urlencode(input: &str) -> String {
    input.replace(' ', "%20").replace(':', "%3A")
}
