pub use super::value_objects::{OHLCV, Price, Timestamp, Volume};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Domain entity - Candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: Timestamp,
    pub ohlcv: OHLCV,
}

impl Candle {
    pub fn new(timestamp: Timestamp, ohlcv: OHLCV) -> Self {
        Self { timestamp, ohlcv }
    }

    pub fn is_bullish(&self) -> bool {
        self.ohlcv.close > self.ohlcv.open
    }

    pub fn is_bearish(&self) -> bool {
        self.ohlcv.close < self.ohlcv.open
    }
}

/// Domain entity - the authoritative candle series.
///
/// Strictly increasing by timestamp, no duplicate timestamps. Only the
/// series loader mutates it; everyone else gets snapshots.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new() -> Self {
        Self { candles: Vec::new() }
    }

    /// Merge a batch into the series.
    ///
    /// Full rebuild: concatenate, collapse through a map keyed by timestamp
    /// (last write wins), sort ascending. Batches are capped at 1000 rows,
    /// so rebuilding once per scroll event is cheaper than getting a
    /// binary-searched splice wrong.
    pub fn merge(&mut self, batch: Vec<Candle>) {
        if batch.is_empty() {
            return;
        }

        let mut by_time: HashMap<Timestamp, Candle> =
            HashMap::with_capacity(self.candles.len() + batch.len());
        for candle in self.candles.drain(..).chain(batch) {
            by_time.insert(candle.timestamp, candle);
        }

        let mut merged: Vec<Candle> = by_time.into_values().collect();
        merged.sort_by_key(|c| c.timestamp);
        self.candles = merged;
    }

    /// Replace the series outright (full reload), keeping the invariants.
    pub fn replace(&mut self, batch: Vec<Candle>) {
        self.candles.clear();
        self.merge(batch);
    }

    pub fn get_candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn snapshot(&self) -> Vec<Candle> {
        self.candles.clone()
    }

    pub fn oldest(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn count(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn get_latest_price(&self) -> Option<&Price> {
        self.candles.last().map(|candle| &candle.ohlcv.close)
    }

    /// Price range across the whole series, for axis fitting.
    pub fn price_range(&self) -> Option<(&Price, &Price)> {
        if self.candles.is_empty() {
            return None;
        }

        let mut min_price = &self.candles[0].ohlcv.low;
        let mut max_price = &self.candles[0].ohlcv.high;

        for candle in &self.candles {
            if candle.ohlcv.low.value() < min_price.value() {
                min_price = &candle.ohlcv.low;
            }
            if candle.ohlcv.high.value() > max_price.value() {
                max_price = &candle.ohlcv.high;
            }
        }

        Some((min_price, max_price))
    }
}
