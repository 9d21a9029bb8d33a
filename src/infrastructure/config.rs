use serde::Deserialize;

use crate::domain::errors::{ChartError, ChartResult};
use crate::domain::market_data::{Symbol, TimeInterval};

/// Chart configuration supplied by the host page at startup.
///
/// Missing fields fall back to the defaults of the original deployment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Backend serving /api/historical and /api/backtest.
    pub base_url: String,
    pub symbol: String,
    pub interval: TimeInterval,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            symbol: "BTCUSDT".to_string(),
            interval: TimeInterval::OneMinute,
        }
    }
}

impl ChartConfig {
    pub fn from_json(raw: &str) -> ChartResult<Self> {
        serde_json::from_str(raw).map_err(|e| ChartError::Parse(format!("invalid config: {e}")))
    }

    pub fn symbol(&self) -> Symbol {
        Symbol::from(self.symbol.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config = ChartConfig::from_json(r#"{"symbol":"ethusdt"}"#).unwrap();
        assert_eq!(config.symbol().value(), "ETHUSDT");
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.interval, TimeInterval::OneMinute);
    }

    #[test]
    fn rejects_unknown_interval() {
        assert!(ChartConfig::from_json(r#"{"interval":"3m"}"#).is_err());
    }
}
