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
    calls: RefCell<Vec<(i64, u32)>>,
}

impl ScriptedProvider {
    fn new(batches: Vec<Vec<Candle>>) -> Self {
        Self { batches: RefCell::new(batches.into()), calls: RefCell::new(Vec::new()) }
    }
}

// Implemented on the reference so tests keep the provider and inspect calls.
impl HistoryProvider for &ScriptedProvider {
    async fn fetch_before(
        &self,
        _symbol: &Symbol,
        _interval: TimeInterval,
        end_time_exclusive: Timestamp,
        limit: u32,
    ) -> Result<Vec<Candle>, ChartError> {
        self.calls.borrow_mut().push((end_time_exclusive.value(), limit));
        Ok(self.batches.borrow_mut().pop_front().unwrap_or_default())
    }
}

#[derive(Default)]
struct RecordingSurface {
    candles: RefCell<Vec<Candle>>,
}

impl ChartSurface for RecordingSurface {
    fn time_at_logical_index(&self, _index: f64) -> Option<Timestamp> {
        None
    }
    fn coordinate_for_time(&self, _time: Timestamp) -> Option<f64> {
        None
    }
    fn set_candle_series(&self, candles: &[Candle]) {
        *self.candles.borrow_mut() = candles.to_vec();
    }
    fn set_equity_series(&self, _points: &[EquityPoint]) {}
    fn set_position_series(&self, _bars: &[PositionBar]) {}
    fn set_markers(&self, _markers: &[TradeMarker]) {}
    fn set_pan_zoom_enabled(&self, _enabled: bool) {}
    fn set_selection_overlay(&self, _range: Option<(f64, f64)>) {}
}

#[test]
fn backfill_three_batches() {
    let provider = ScriptedProvider::new(vec![
        (1000..=1002).map(|t| make_candle(t * 60)).collect(),
        (997..=999).map(|t| make_candle(t * 60)).collect(),
        (994..=996).map(|t| make_candle(t * 60)).collect(),
    ]);
    let loader = SeriesLoader::new(&provider, Symbol::from("BTCUSDT"), TimeInterval::OneMinute);
    let surface = RecordingSurface::default();

    block_on(loader.reload(&surface, Timestamp::new(1003 * 60), TimeInterval::OneMinute));
    block_on(loader.load_batch(&surface, Timestamp::new(1000 * 60), true));
    block_on(loader.load_batch(&surface, Timestamp::new(997 * 60), true));

    let published = surface.candles.borrow();
    assert_eq!(published.len(), 9);
    for (i, c) in published.iter().enumerate() {
        assert_eq!(c.timestamp.value(), (994 + i as i64) * 60);
    }
    assert_eq!(loader.oldest_loaded(), Some(Timestamp::new(994 * 60)));
}

#[test]
fn overlapping_batches_stay_unique() {
    let provider = ScriptedProvider::new(vec![
        (100..=104).map(|t| make_candle(t * 60)).collect(),
        // Overlaps the two oldest rows already loaded.
        (98..=101).map(|t| make_candle(t * 60)).collect(),
    ]);
    let loader = SeriesLoader::new(&provider, Symbol::from("BTCUSDT"), TimeInterval::OneMinute);
    let surface = RecordingSurface::default();

    block_on(loader.reload(&surface, Timestamp::new(105 * 60), TimeInterval::OneMinute));
    block_on(loader.load_batch(&surface, Timestamp::new(100 * 60), true));

    assert_eq!(loader.candle_count(), 7);
    let times: Vec<i64> = surface.candles.borrow().iter().map(|c| c.timestamp.value()).collect();
    assert_eq!(times, (98..=104).map(|t| t * 60).collect::<Vec<_>>());
}

#[test]
fn each_fetch_passes_the_anchor_and_limit() {
    let provider = ScriptedProvider::new(vec![(10..=12).map(|t| make_candle(t * 60)).collect()]);
    let loader = SeriesLoader::new(&provider, Symbol::from("BTCUSDT"), TimeInterval::OneMinute);
    let surface = RecordingSurface::default();

    block_on(loader.reload(&surface, Timestamp::new(13 * 60), TimeInterval::OneMinute));

    let calls = provider.calls.borrow();
    assert_eq!(calls.as_slice(), &[(13 * 60, backtest_chart_wasm::application::BATCH_LIMIT)]);
}
