pub mod backtest_client;
pub mod dto;
pub mod history_client;

pub use backtest_client::BacktestHttpClient;
pub use history_client::HistoryHttpClient;
