pub mod backtest_service;
pub mod series_loader;

pub use backtest_service::{BacktestGateway, BacktestOutcome, BacktestRunner, StrategyParams};
pub use series_loader::{BATCH_LIMIT, BOUNDARY_THRESHOLD_SECS, SeriesLoader, should_fetch_history};
