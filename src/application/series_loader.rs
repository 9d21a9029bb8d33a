//! Incremental backward pagination of candle history.
//!
//! The loader owns the authoritative series and its load cursor, hides
//! pagination from the rendering surface, and guarantees at most one fetch
//! in flight. Everything runs on the single-threaded WASM event loop, so
//! state lives in `Cell`/`RefCell` and every entry point takes `&self`.

use std::cell::{Cell, RefCell};

use crate::domain::chart::ChartSurface;
use crate::domain::errors::ChartError;
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::{Candle, CandleSeries, HistoryProvider, Symbol, TimeInterval, Timestamp};
use crate::log_warn;

/// Fixed batch size requested from the history endpoint.
pub const BATCH_LIMIT: u32 = 1000;

/// A viewport whose left edge comes within this many seconds of the oldest
/// loaded candle triggers the next backward fetch.
pub const BOUNDARY_THRESHOLD_SECS: i64 = 60;

/// Backward-fetch decision for a viewport event.
///
/// An unresolvable left edge means the surface scrolled past the loaded
/// range, which is treated as "need more data". With nothing loaded yet
/// there is no anchor to page from; the initial `reload` covers that case.
pub fn should_fetch_history(visible_left: Option<Timestamp>, oldest_loaded: Option<Timestamp>) -> bool {
    let Some(oldest) = oldest_loaded else {
        return false;
    };
    match visible_left {
        None => true,
        Some(visible) => visible.value() <= oldest.value() + BOUNDARY_THRESHOLD_SECS,
    }
}

/// Clears the loading flag on every exit path, including panics and early
/// returns through `?`.
struct LoadingGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> LoadingGuard<'a> {
    fn engage(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// The incremental data-loading controller.
pub struct SeriesLoader<P> {
    provider: P,
    symbol: Symbol,
    interval: Cell<TimeInterval>,
    series: RefCell<CandleSeries>,
    oldest_loaded: Cell<Option<Timestamp>>,
    loading: Cell<bool>,
    batch_limit: u32,
    error_sink: Box<dyn Fn(ChartError)>,
}

impl<P: HistoryProvider> SeriesLoader<P> {
    pub fn new(provider: P, symbol: Symbol, interval: TimeInterval) -> Self {
        Self {
            provider,
            symbol,
            interval: Cell::new(interval),
            series: RefCell::new(CandleSeries::new()),
            oldest_loaded: Cell::new(None),
            loading: Cell::new(false),
            batch_limit: BATCH_LIMIT,
            error_sink: Box::new(|e| {
                get_logger().error(LogComponent::Application("SeriesLoader"), &e.to_string());
            }),
        }
    }

    /// Route fetch failures to the surrounding application instead of the
    /// default log sink. Failures never propagate into event callbacks.
    pub fn with_error_sink(mut self, sink: impl Fn(ChartError) + 'static) -> Self {
        self.error_sink = Box::new(sink);
        self
    }

    /// Fetch one batch strictly older than `anchor_time` and fold it in.
    ///
    /// No-op while a fetch is already in flight. `keep_existing` selects
    /// merge (backward extension) versus replace (full reset). An empty
    /// batch means the store is exhausted before the anchor: series and
    /// cursor stay untouched.
    pub async fn load_batch(&self, surface: &impl ChartSurface, anchor_time: Timestamp, keep_existing: bool) {
        if self.loading.get() {
            return;
        }
        let _guard = LoadingGuard::engage(&self.loading);

        // The interval is captured here; a granularity switch during the
        // await does not retroactively apply to this batch.
        let interval = self.interval.get();

        get_logger().debug(
            LogComponent::Application("SeriesLoader"),
            &format!(
                "fetching up to {} candles before {} at {}",
                self.batch_limit,
                anchor_time.value(),
                interval
            ),
        );

        match self.provider.fetch_before(&self.symbol, interval, anchor_time, self.batch_limit).await {
            Ok(batch) => {
                if batch.is_empty() {
                    get_logger().info(
                        LogComponent::Application("SeriesLoader"),
                        &format!("no history before {}", anchor_time.value()),
                    );
                    return;
                }

                let mut series = self.series.borrow_mut();
                if keep_existing {
                    series.merge(batch);
                } else {
                    series.replace(batch);
                }
                self.oldest_loaded.set(series.oldest().map(|c| c.timestamp));
                surface.set_candle_series(series.get_candles());
            }
            Err(e) => (self.error_sink)(e),
        }
    }

    /// Anchor for the next backward fetch a viewport event calls for, or
    /// `None` when no fetch is due (boundary not reached, nothing loaded
    /// yet, or a fetch already in flight). Lets callers raise their loading
    /// indicator only for events that actually start a fetch.
    pub fn next_backward_anchor(
        &self,
        surface: &impl ChartSurface,
        visible_left_index: f64,
    ) -> Option<Timestamp> {
        if self.loading.get() {
            return None;
        }

        let oldest = self.oldest_loaded.get();
        let visible_left = surface.time_at_logical_index(visible_left_index);
        if !should_fetch_history(visible_left, oldest) {
            return None;
        }

        let oldest = oldest?;
        Some(Timestamp::new(oldest.value() - self.interval.get().duration_secs()))
    }

    /// Viewport moved; extend backward when the left boundary needs it.
    ///
    /// Events arriving while a fetch is in flight are dropped, not queued:
    /// the next event after the flag clears re-evaluates the boundary
    /// freshly, so a needed fetch is coalesced, never lost.
    pub async fn on_viewport_changed(&self, surface: &impl ChartSurface, visible_left_index: f64) {
        let Some(anchor) = self.next_backward_anchor(surface, visible_left_index) else {
            return;
        };
        self.load_batch(surface, anchor, true).await;
    }

    /// Full reload from a fresh anchor: mount, symbol reset, or an interval
    /// switch. Ignored while a fetch is in flight; the caller retries once
    /// the flag clears (there is no cancellation of in-flight fetches).
    pub async fn reload(&self, surface: &impl ChartSurface, anchor_time: Timestamp, interval: TimeInterval) {
        if self.loading.get() {
            log_warn!(LogComponent::Application("SeriesLoader"), "reload ignored: a fetch is in flight");
            return;
        }
        self.interval.set(interval);
        self.load_batch(surface, anchor_time, false).await;
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn oldest_loaded(&self) -> Option<Timestamp> {
        self.oldest_loaded.get()
    }

    pub fn interval(&self) -> TimeInterval {
        self.interval.get()
    }

    pub fn candle_count(&self) -> usize {
        self.series.borrow().count()
    }

    /// Read-only snapshot for the surrounding application.
    pub fn snapshot(&self) -> Vec<Candle> {
        self.series.borrow().snapshot()
    }
}
