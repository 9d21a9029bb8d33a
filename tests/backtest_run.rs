use std::cell::RefCell;
use std::collections::HashMap;

use backtest_chart_wasm::application::backtest_service::{
    BacktestGateway, BacktestRunner, StrategyParams,
};
use backtest_chart_wasm::domain::{
    chart::MarkerSide,
    errors::{ChartError, ChartResult},
    market_data::{Symbol, TimeInterval, Timestamp},
    selection::TimeRange,
};
use backtest_chart_wasm::infrastructure::http::dto::{BacktestRequest, BacktestResult};
use futures::executor::block_on;

const RESULT_BODY: &str = r#"{
    "equity": [
        {"timestamp": "2024-03-01 00:00:00", "equity": 10000.0, "position": 0.0, "returns_pct": 0.0},
        {"timestamp": "2024-03-01 00:01:00", "equity": 10050.0, "position": 1.0, "returns_pct": 0.5}
    ],
    "trades": [
        {"timestamp": "2024-03-01 00:01:00", "action": "BUY", "price": 50000.0, "size": 0.2, "pnl": 0.0},
        {"timestamp": "2024-03-01 00:02:00", "action": "HOLD", "price": 50100.0, "size": 0.0, "pnl": 0.0},
        {"timestamp": "2024-03-01 00:03:00", "action": "sell", "price": 50250.0, "size": 0.2, "pnl": 50.0}
    ],
    "stats": {"total_return_pct": 0.5, "max_drawdown_pct": 0.1},
    "price_data": []
}"#;

struct CapturingGateway {
    captured: RefCell<Option<BacktestRequest>>,
}

impl BacktestGateway for &CapturingGateway {
    async fn run(&self, request: &BacktestRequest) -> ChartResult<BacktestResult> {
        *self.captured.borrow_mut() = Some(request.clone());
        serde_json::from_str(RESULT_BODY).map_err(|e| ChartError::Parse(e.to_string()))
    }
}

struct RejectingGateway;

impl BacktestGateway for RejectingGateway {
    async fn run(&self, _request: &BacktestRequest) -> ChartResult<BacktestResult> {
        Err(ChartError::Backtest("Strategy sma-adx not found".to_string()))
    }
}

fn strategy() -> StrategyParams {
    let mut params = HashMap::new();
    params.insert("fast".to_string(), serde_json::json!(12));
    params.insert("slow".to_string(), serde_json::json!(26));
    StrategyParams { strategy_id: "sma-adx".to_string(), params, initial_capital: 10_000.0 }
}

fn range() -> TimeRange {
    TimeRange {
        start: Timestamp::new(1_709_251_200), // 2024-03-01 00:00:00 UTC
        end: Timestamp::new(1_709_337_600),   // 2024-03-02 00:00:00 UTC
    }
}

#[test]
fn request_carries_selection_and_strategy() {
    let gateway = CapturingGateway { captured: RefCell::new(None) };
    let runner = BacktestRunner::new(&gateway, Symbol::from("BTCUSDT"));

    block_on(runner.run(range(), TimeInterval::FiveMinutes, &strategy())).unwrap();

    let request = gateway.captured.borrow().clone().unwrap();
    assert_eq!(request.strategy_id, "sma-adx");
    assert_eq!(request.symbol, "BTCUSDT");
    assert_eq!(request.interval, "5m");
    assert_eq!(request.start_time, "2024-03-01T00:00:00");
    assert_eq!(request.end_time, "2024-03-02T00:00:00");
    assert_eq!(request.initial_capital, 10_000.0);
    assert_eq!(request.params.get("fast"), Some(&serde_json::json!(12)));
}

#[test]
fn outcome_views_shape_the_result_for_the_surface() {
    let gateway = CapturingGateway { captured: RefCell::new(None) };
    let runner = BacktestRunner::new(&gateway, Symbol::from("BTCUSDT"));

    let outcome = block_on(runner.run(range(), TimeInterval::OneMinute, &strategy())).unwrap();

    let equity = outcome.equity_points().unwrap();
    assert_eq!(equity.len(), 2);
    assert_eq!(equity[0].time.value(), 1_709_251_200);
    assert_eq!(equity[1].equity, 10_050.0);

    let positions = outcome.position_bars().unwrap();
    assert_eq!(positions[1].position, 1.0);

    // HOLD rows are dropped; action matching ignores case.
    let markers = outcome.trade_markers().unwrap();
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0].side, MarkerSide::Buy);
    assert_eq!(markers[1].side, MarkerSide::Sell);
    assert!(markers[0].label.starts_with("BUY"));

    assert_eq!(outcome.stats().get("total_return_pct"), Some(&0.5));
}

#[test]
fn backend_rejection_surfaces_the_detail_verbatim() {
    let runner = BacktestRunner::new(RejectingGateway, Symbol::from("BTCUSDT"));

    let err = block_on(runner.run(range(), TimeInterval::OneMinute, &strategy())).unwrap_err();
    match err {
        ChartError::Backtest(detail) => assert_eq!(detail, "Strategy sma-adx not found"),
        other => panic!("unexpected error: {other}"),
    }
}
