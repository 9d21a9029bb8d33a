use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::Timestamp;
use serde::{Deserialize, Serialize};

/// A committed selection, always ordered start <= end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    /// Build a range from two drag endpoints in either order.
    pub fn from_endpoints(a: Timestamp, b: Timestamp) -> Self {
        Self { start: a.min(b), end: a.max(b) }
    }
}

/// What the caller must apply to the rendering surface after a transition.
///
/// The controller itself never touches the surface; pixel mapping for the
/// overlay stays on the caller's side so a failed mapping only skips one
/// frame of overlay, never the logical state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEffect {
    None,
    /// A drag started: disable the surface's native pan/zoom.
    BeginDrag,
    /// The live range changed: reposition the overlay.
    OverlayUpdate(TimeRange),
    /// Selection gone: hide the overlay, re-enable native pan/zoom.
    Cleared,
}

/// Drag-selection state machine.
///
/// Gestures are gated on a held modifier key so an ordinary drag-to-pan is
/// never read as a range selection. The anchor exists only while a drag is
/// active; the committed range survives until an explicit clear or the
/// start-over gesture.
#[derive(Debug, Default)]
pub struct SelectionController {
    anchor: Option<Timestamp>,
    committed: Option<TimeRange>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer pressed on the chart.
    ///
    /// Starts a drag only when the modifier is held, no drag is active, and
    /// no committed range is on screen. A committed range blocks new drags
    /// so the user cannot re-select underneath rendered backtest results.
    pub fn pointer_down(&mut self, time: Timestamp, modifier_held: bool) -> SelectionEffect {
        if !modifier_held || self.anchor.is_some() || self.committed.is_some() {
            return SelectionEffect::None;
        }

        self.anchor = Some(time);
        get_logger().debug(
            LogComponent::Domain("Selection"),
            &format!("drag anchored at {}", time.value()),
        );
        SelectionEffect::BeginDrag
    }

    /// Crosshair moved during an active drag.
    ///
    /// Publishes the committed range continuously so the overlay tracks the
    /// live drag; min/max ordering makes the drag direction irrelevant.
    pub fn pointer_move(&mut self, time: Timestamp, modifier_held: bool) -> SelectionEffect {
        let Some(anchor) = self.anchor else {
            return SelectionEffect::None;
        };
        if !modifier_held {
            return SelectionEffect::None;
        }

        let range = TimeRange::from_endpoints(anchor, time);
        self.committed = Some(range);
        SelectionEffect::OverlayUpdate(range)
    }

    /// Modifier key released: the drag ends, the last range stays selected.
    pub fn modifier_released(&mut self) -> SelectionEffect {
        self.anchor = None;
        SelectionEffect::None
    }

    /// Modifier key pressed again over an existing committed range: the
    /// explicit start-over gesture.
    pub fn modifier_pressed(&mut self) -> SelectionEffect {
        if self.anchor.is_none() && self.committed.is_some() {
            self.committed = None;
            get_logger().debug(LogComponent::Domain("Selection"), "committed range cleared");
            return SelectionEffect::Cleared;
        }
        SelectionEffect::None
    }

    /// Unconditional reset from a dismiss control.
    pub fn clear(&mut self) -> SelectionEffect {
        self.anchor = None;
        self.committed = None;
        SelectionEffect::Cleared
    }

    pub fn committed(&self) -> Option<TimeRange> {
        self.committed
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(v: i64) -> Timestamp {
        Timestamp::new(v)
    }

    #[test]
    fn unmodified_pointer_down_is_ignored() {
        let mut sel = SelectionController::new();
        assert_eq!(sel.pointer_down(ts(100), false), SelectionEffect::None);
        assert!(!sel.is_dragging());
    }

    #[test]
    fn pointer_down_blocked_while_results_displayed() {
        let mut sel = SelectionController::new();
        sel.pointer_down(ts(100), true);
        sel.pointer_move(ts(200), true);
        sel.modifier_released();

        assert_eq!(sel.pointer_down(ts(300), true), SelectionEffect::None);
        assert_eq!(sel.committed(), Some(TimeRange { start: ts(100), end: ts(200) }));
    }

    #[test]
    fn move_without_anchor_is_noop() {
        let mut sel = SelectionController::new();
        assert_eq!(sel.pointer_move(ts(50), true), SelectionEffect::None);
        assert_eq!(sel.committed(), None);
    }

    #[test]
    fn modifier_press_restarts_after_commit() {
        let mut sel = SelectionController::new();
        sel.pointer_down(ts(10), true);
        sel.pointer_move(ts(20), true);
        sel.modifier_released();

        assert_eq!(sel.modifier_pressed(), SelectionEffect::Cleared);
        assert_eq!(sel.committed(), None);
        // Same key hold may anchor a fresh drag.
        assert_eq!(sel.pointer_down(ts(30), true), SelectionEffect::BeginDrag);
    }
}
