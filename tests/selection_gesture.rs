use std::cell::Cell;

use backtest_chart_wasm::domain::{
    chart::{ChartSurface, EquityPoint, PositionBar, TradeMarker, overlay_coordinates},
    market_data::{Candle, Timestamp},
    selection::{SelectionController, SelectionEffect, TimeRange},
};

fn ts(v: i64) -> Timestamp {
    Timestamp::new(v)
}

#[test]
fn drag_publishes_ordered_ranges_in_both_directions() {
    let mut sel = SelectionController::new();
    assert_eq!(sel.pointer_down(ts(1000), true), SelectionEffect::BeginDrag);

    // Rightward, then back across the anchor.
    assert_eq!(
        sel.pointer_move(ts(1200), true),
        SelectionEffect::OverlayUpdate(TimeRange { start: ts(1000), end: ts(1200) })
    );
    assert_eq!(
        sel.pointer_move(ts(800), true),
        SelectionEffect::OverlayUpdate(TimeRange { start: ts(800), end: ts(1000) })
    );
    assert_eq!(
        sel.pointer_move(ts(1500), true),
        SelectionEffect::OverlayUpdate(TimeRange { start: ts(1000), end: ts(1500) })
    );
}

#[test]
fn release_ends_drag_and_keeps_last_range() {
    let mut sel = SelectionController::new();
    sel.pointer_down(ts(1000), true);
    sel.pointer_move(ts(1300), true);

    assert_eq!(sel.modifier_released(), SelectionEffect::None);
    assert!(!sel.is_dragging());
    assert_eq!(sel.committed(), Some(TimeRange { start: ts(1000), end: ts(1300) }));

    // Pointer motion after the drag ended changes nothing.
    assert_eq!(sel.pointer_move(ts(2000), false), SelectionEffect::None);
    assert_eq!(sel.committed(), Some(TimeRange { start: ts(1000), end: ts(1300) }));
}

#[test]
fn down_without_any_movement_commits_nothing() {
    let mut sel = SelectionController::new();
    sel.pointer_down(ts(1000), true);
    sel.modifier_released();

    assert_eq!(sel.committed(), None);
    // Nothing on screen, so nothing blocks the next drag.
    assert_eq!(sel.pointer_down(ts(1100), true), SelectionEffect::BeginDrag);
}

#[test]
fn clear_resets_mid_drag() {
    let mut sel = SelectionController::new();
    sel.pointer_down(ts(1000), true);
    sel.pointer_move(ts(1100), true);

    assert_eq!(sel.clear(), SelectionEffect::Cleared);
    assert!(!sel.is_dragging());
    assert_eq!(sel.committed(), None);
}

/// Maps time linearly to pixels; flips to unmappable mid-test.
#[derive(Default)]
struct MappingSurface {
    unmappable: Cell<bool>,
}

impl ChartSurface for MappingSurface {
    fn time_at_logical_index(&self, _index: f64) -> Option<Timestamp> {
        None
    }
    fn coordinate_for_time(&self, time: Timestamp) -> Option<f64> {
        if self.unmappable.get() { None } else { Some(time.value() as f64 / 10.0) }
    }
    fn set_candle_series(&self, _candles: &[Candle]) {}
    fn set_equity_series(&self, _points: &[EquityPoint]) {}
    fn set_position_series(&self, _bars: &[PositionBar]) {}
    fn set_markers(&self, _markers: &[TradeMarker]) {}
    fn set_pan_zoom_enabled(&self, _enabled: bool) {}
    fn set_selection_overlay(&self, _range: Option<(f64, f64)>) {}
}

#[test]
fn overlay_maps_both_endpoints_or_skips_the_frame() {
    let surface = MappingSurface::default();
    let range = TimeRange { start: ts(1000), end: ts(1500) };

    assert_eq!(overlay_coordinates(&surface, range), Some((100.0, 150.0)));

    surface.unmappable.set(true);
    assert_eq!(overlay_coordinates(&surface, range), None);
}
