use std::cell::RefCell;
use std::collections::VecDeque;

use backtest_chart_wasm::application::series_loader::SeriesLoader;
use backtest_chart_wasm::domain::{
    chart::{ChartSurface, EquityPoint, PositionBar, TradeMarker},
    errors::ChartError,
    market_data::{Candle, HistoryProvider, OHLCV, Price, Symbol, TimeInterval, Timestamp, Volume},
};
use futures::executor::block_on;

fn make_candle(ts: i64) -> Candle {
    Candle::new(
        Timestamp::new(ts),
        OHLCV::new(
            Price::new(1.0),
            Price::new(1.0),
            Price::new(1.0),
            Price::new(1.0),
            Volume::new(1.0),
        ),
    )
}

struct ScriptedProvider {
    batches: RefCell<VecDeque<Vec<Candle>>>,
    calls: RefCell<usize>,
}

impl ScriptedProvider {
    fn new(batches: Vec<Vec<Candle>>) -> Self {
        Self { batches: RefCell::new(batches.into()), calls: RefCell::new(0) }
    }
}

impl HistoryProvider for &ScriptedProvider {
    async fn fetch_before(
        &self,
        _symbol: &Symbol,
        _interval: TimeInterval,
        _end_time_exclusive: Timestamp,
        _limit: u32,
    ) -> Result<Vec<Candle>, ChartError> {
        *self.calls.borrow_mut() += 1;
        Ok(self.batches.borrow_mut().pop_front().unwrap_or_default())
    }
}

#[derive(Default)]
struct RecordingSurface {
    updates: RefCell<usize>,
}

impl ChartSurface for RecordingSurface {
    fn time_at_logical_index(&self, _index: f64) -> Option<Timestamp> {
        None
    }
    fn coordinate_for_time(&self, _time: Timestamp) -> Option<f64> {
        None
    }
    fn set_candle_series(&self, _candles: &[Candle]) {
        *self.updates.borrow_mut() += 1;
    }
    fn set_equity_series(&self, _points: &[EquityPoint]) {}
    fn set_position_series(&self, _bars: &[PositionBar]) {}
    fn set_markers(&self, _markers: &[TradeMarker]) {}
    fn set_pan_zoom_enabled(&self, _enabled: bool) {}
    fn set_selection_overlay(&self, _range: Option<(f64, f64)>) {}
}

#[test]
fn empty_batch_leaves_series_and_cursor_untouched() {
    let provider = ScriptedProvider::new(vec![
        (0..3).map(|i| make_candle(6000 + i * 60)).collect(),
        Vec::new(),
    ]);
    let loader = SeriesLoader::new(&provider, Symbol::from("BTCUSDT"), TimeInterval::OneMinute);
    let surface = RecordingSurface::default();

    block_on(loader.reload(&surface, Timestamp::new(6000 + 3 * 60), TimeInterval::OneMinute));
    let cursor_before = loader.oldest_loaded();

    block_on(loader.load_batch(&surface, Timestamp::new(6000 - 60), true));

    assert_eq!(loader.candle_count(), 3);
    assert_eq!(loader.oldest_loaded(), cursor_before);
    // The surface saw only the initial publish.
    assert_eq!(*surface.updates.borrow(), 1);
    assert!(!loader.is_loading());
}

#[test]
fn exhaustion_is_not_sticky() {
    let provider = ScriptedProvider::new(vec![
        (0..3).map(|i| make_candle(6000 + i * 60)).collect(),
        Vec::new(),
        vec![make_candle(6000 - 60)],
    ]);
    let loader = SeriesLoader::new(&provider, Symbol::from("BTCUSDT"), TimeInterval::OneMinute);
    let surface = RecordingSurface::default();

    block_on(loader.reload(&surface, Timestamp::new(6000 + 3 * 60), TimeInterval::OneMinute));
    block_on(loader.load_batch(&surface, Timestamp::new(6000 - 60), true));

    // A later attempt still asks the store; rows that appeared are folded in.
    block_on(loader.load_batch(&surface, Timestamp::new(6000 - 60), true));

    assert_eq!(*provider.calls.borrow(), 3);
    assert_eq!(loader.candle_count(), 4);
    assert_eq!(loader.oldest_loaded(), Some(Timestamp::new(6000 - 60)));
}
