//! Orchestrates a backtest run from a committed selection.

use std::collections::HashMap;

use crate::domain::chart::{EquityPoint, MarkerSide, PositionBar, TradeMarker};
use crate::domain::errors::ChartResult;
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::{Symbol, TimeInterval};
use crate::domain::selection::TimeRange;
use crate::infrastructure::http::dto::{BacktestRequest, BacktestResult};
use crate::time_utils;

/// Port to the backtest-execution endpoint.
pub trait BacktestGateway {
    fn run(&self, request: &BacktestRequest) -> impl Future<Output = ChartResult<BacktestResult>>;
}

/// Caller-supplied strategy parameterization; the form producing it is an
/// external collaborator.
#[derive(Debug, Clone)]
pub struct StrategyParams {
    pub strategy_id: String,
    pub params: HashMap<String, serde_json::Value>,
    pub initial_capital: f64,
}

pub struct BacktestRunner<G> {
    gateway: G,
    symbol: Symbol,
}

impl<G: BacktestGateway> BacktestRunner<G> {
    pub fn new(gateway: G, symbol: Symbol) -> Self {
        Self { gateway, symbol }
    }

    /// Run a backtest over the committed range.
    ///
    /// Range bounds are converted to ISO-8601 here; a validation failure
    /// comes back as `ChartError::Backtest` with the backend's `detail`
    /// untouched, for verbatim display.
    pub async fn run(
        &self,
        range: TimeRange,
        interval: TimeInterval,
        strategy: &StrategyParams,
    ) -> ChartResult<BacktestOutcome> {
        let request = BacktestRequest {
            strategy_id: strategy.strategy_id.clone(),
            params: strategy.params.clone(),
            symbol: self.symbol.value().to_string(),
            interval: interval.as_query_str().to_string(),
            start_time: time_utils::to_iso8601(range.start),
            end_time: time_utils::to_iso8601(range.end),
            initial_capital: strategy.initial_capital,
        };

        get_logger().info(
            LogComponent::Application("Backtest"),
            &format!(
                "running {} on {} {} .. {}",
                request.strategy_id, request.symbol, request.start_time, request.end_time
            ),
        );

        let result = self.gateway.run(&request).await?;
        Ok(BacktestOutcome { result })
    }
}

/// A parsed backtest run, with views shaped for the rendering surface.
#[derive(Debug, Clone)]
pub struct BacktestOutcome {
    pub result: BacktestResult,
}

impl BacktestOutcome {
    pub fn equity_points(&self) -> ChartResult<Vec<EquityPoint>> {
        self.result
            .equity
            .iter()
            .map(|row| {
                Ok(EquityPoint { time: time_utils::parse_utc_timestamp(&row.timestamp)?, equity: row.equity })
            })
            .collect()
    }

    pub fn position_bars(&self) -> ChartResult<Vec<PositionBar>> {
        self.result
            .equity
            .iter()
            .map(|row| {
                Ok(PositionBar {
                    time: time_utils::parse_utc_timestamp(&row.timestamp)?,
                    position: row.position,
                })
            })
            .collect()
    }

    /// Trade markers for the price series. Rows with an action the engine
    /// does not emit are skipped rather than failing the whole run.
    pub fn trade_markers(&self) -> ChartResult<Vec<TradeMarker>> {
        let mut markers = Vec::with_capacity(self.result.trades.len());
        for trade in &self.result.trades {
            let side = match trade.action.to_ascii_uppercase().as_str() {
                "BUY" => MarkerSide::Buy,
                "SELL" => MarkerSide::Sell,
                _ => continue,
            };
            markers.push(TradeMarker {
                time: time_utils::parse_utc_timestamp(&trade.timestamp)?,
                side,
                label: format!("{} {:.4} @ {:.2}", trade.action, trade.size, trade.price),
            });
        }
        Ok(markers)
    }

    pub fn stats(&self) -> &HashMap<String, f64> {
        &self.result.stats
    }
}
