//! Boundary to the rendering surface.
//!
//! The chart itself (series creation, axis scaling, legend, markers) lives
//! in the host page's charting library. This crate only consumes the
//! capabilities below; `presentation::wasm_api` bridges them to JS
//! callbacks, tests substitute a recording mock.

use crate::domain::market_data::{Candle, Timestamp};
use crate::domain::selection::TimeRange;

/// Direction of a trade marker on the price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSide {
    Buy,
    Sell,
}

/// A point marker pinned to a candle.
#[derive(Debug, Clone)]
pub struct TradeMarker {
    pub time: Timestamp,
    pub side: MarkerSide,
    pub label: String,
}

/// One sample of the equity curve line series.
#[derive(Debug, Clone, Copy)]
pub struct EquityPoint {
    pub time: Timestamp,
    pub equity: f64,
}

/// One bar of the position histogram series.
#[derive(Debug, Clone, Copy)]
pub struct PositionBar {
    pub time: Timestamp,
    pub position: f64,
}

/// Capabilities this crate consumes from the rendering surface.
pub trait ChartSurface {
    /// Map a visible logical index to a time coordinate. `None` when the
    /// index falls outside the loaded range.
    fn time_at_logical_index(&self, index: f64) -> Option<Timestamp>;

    /// Map a time coordinate to a pixel x. `None` mid-resize or for times
    /// outside the visible window.
    fn coordinate_for_time(&self, time: Timestamp) -> Option<f64>;

    /// Publish a read-only snapshot of the candle series.
    fn set_candle_series(&self, candles: &[Candle]);

    /// Publish the backtest equity curve.
    fn set_equity_series(&self, points: &[EquityPoint]);

    /// Publish the backtest position histogram.
    fn set_position_series(&self, bars: &[PositionBar]);

    /// Pin or clear trade markers on the price series.
    fn set_markers(&self, markers: &[TradeMarker]);

    /// Toggle the surface's native pan/zoom handling (off during a drag).
    fn set_pan_zoom_enabled(&self, enabled: bool);

    /// Position the selection overlay between two pixel columns, or hide it.
    fn set_selection_overlay(&self, range: Option<(f64, f64)>);
}

/// Overlay placement for a live drag: both endpoints mapped, or nothing.
///
/// A failed mapping (resize race) skips the frame; the logical range is
/// computed from times and is unaffected.
pub fn overlay_coordinates(surface: &impl ChartSurface, range: TimeRange) -> Option<(f64, f64)> {
    let left = surface.coordinate_for_time(range.start)?;
    let right = surface.coordinate_for_time(range.end)?;
    Some((left, right))
}
