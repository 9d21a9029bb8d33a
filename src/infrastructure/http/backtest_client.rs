use gloo_net::http::Request;

use super::dto::{BacktestRequest, BacktestResult, ErrorDetail};
use crate::application::backtest_service::BacktestGateway;
use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::logging::{LogComponent, get_logger};

/// REST client for the backtest-execution endpoint.
#[derive(Debug, Clone)]
pub struct BacktestHttpClient {
    base_url: String,
}

impl BacktestHttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn backtest_url(&self) -> String {
        format!("{}/api/backtest", self.base_url.trim_end_matches('/'))
    }
}

impl BacktestGateway for BacktestHttpClient {
    async fn run(&self, request: &BacktestRequest) -> ChartResult<BacktestResult> {
        let url = self.backtest_url();
        get_logger().debug(LogComponent::Infrastructure("BacktestAPI"), &format!("POST {url}"));

        let response = Request::post(&url)
            .json(request)
            .map_err(|e| ChartError::Parse(format!("backtest request body: {e:?}")))?
            .send()
            .await
            .map_err(|e| ChartError::Network(format!("backtest request failed: {e:?}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ChartError::Network(format!("backtest body unreadable: {e:?}")))?;

        if !(200..300).contains(&status) {
            return Err(ChartError::Backtest(extract_detail(&body, status)));
        }

        serde_json::from_str(&body).map_err(|e| ChartError::Parse(format!("backtest payload: {e}")))
    }
}

/// Pull the human-readable `detail` out of a failure body; fall back to the
/// status code when the body is not the structured payload.
pub fn extract_detail(body: &str, status: u16) -> String {
    serde_json::from_str::<ErrorDetail>(body)
        .map(|e| e.detail)
        .unwrap_or_else(|_| format!("backtest failed with HTTP {status}"))
}
