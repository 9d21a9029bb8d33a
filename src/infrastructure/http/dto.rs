//! Wire formats of the backend endpoints.
//!
//! Timestamps on the wire are naive date-time strings, implicitly UTC;
//! conversions go through `time_utils` and nowhere else.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::errors::ChartResult;
use crate::domain::market_data::{Candle, OHLCV, Price, Volume};
use crate::time_utils;

/// One OHLCV row as served by both endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRow {
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceRow {
    pub fn to_candle(&self) -> ChartResult<Candle> {
        let timestamp = time_utils::parse_utc_timestamp(&self.timestamp)?;
        Ok(Candle::new(
            timestamp,
            OHLCV::new(
                Price::new(self.open),
                Price::new(self.high),
                Price::new(self.low),
                Price::new(self.close),
                Volume::new(self.volume),
            ),
        ))
    }
}

/// GET /api/historical/{symbol} response body.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalResponse {
    pub price_data: Vec<PriceRow>,
}

/// POST /api/backtest request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    pub strategy_id: String,
    pub params: HashMap<String, serde_json::Value>,
    pub symbol: String,
    pub interval: String,
    pub start_time: String,
    pub end_time: String,
    pub initial_capital: f64,
}

/// One equity-curve sample of a backtest run.
#[derive(Debug, Clone, Deserialize)]
pub struct EquityRow {
    pub timestamp: String,
    pub equity: f64,
    pub position: f64,
    pub returns_pct: f64,
}

/// One executed trade of a backtest run.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeRow {
    pub timestamp: String,
    pub action: String,
    pub price: f64,
    pub size: f64,
    pub pnl: f64,
}

/// POST /api/backtest success body.
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestResult {
    pub equity: Vec<EquityRow>,
    pub trades: Vec<TradeRow>,
    pub stats: HashMap<String, f64>,
    pub price_data: Vec<PriceRow>,
}

/// Structured error payload on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}
