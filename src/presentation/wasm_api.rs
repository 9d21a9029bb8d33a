//! WASM API bridging the host page and its charting library.
//!
//! Minimal logic - only a bridge to the application layer. The host page
//! registers coordinate-mapping and series-publishing callbacks once, then
//! forwards pointer/viewport events from the charting library into the
//! entry points below.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use gloo::utils::format::JsValueSerdeExt;
use js_sys::{Function, Promise};
use leptos::{SignalGetUntracked, SignalSet};
use serde_json::json;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::application::backtest_service::{BacktestRunner, StrategyParams};
use crate::application::series_loader::SeriesLoader;
use crate::domain::chart::{ChartSurface, EquityPoint, MarkerSide, PositionBar, TradeMarker, overlay_coordinates};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::market_data::{Candle, TimeInterval, Timestamp};
use crate::domain::selection::{SelectionController, SelectionEffect};
use crate::event_utils::{KeyListenerHandle, on_window_keydown, on_window_keyup};
use crate::domain::errors::ChartError;
use crate::global_state;
use crate::infrastructure::config::ChartConfig;
use crate::infrastructure::http::{BacktestHttpClient, HistoryHttpClient};
use crate::log_error;

fn js_error(error: ChartError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Rendering-surface callbacks supplied by the host page.
///
/// Each callback wraps one capability of the charting library; a callback
/// returning null/undefined maps to `None` on the Rust side.
pub struct JsChartSurface {
    time_at_index: Function,
    coord_for_time: Function,
    set_candles: Function,
    set_equity: Function,
    set_positions: Function,
    set_markers: Function,
    set_pan_zoom: Function,
    set_overlay: Function,
}

impl JsChartSurface {
    fn call_number(&self, f: &Function, arg: f64) -> Option<f64> {
        f.call1(&JsValue::NULL, &JsValue::from_f64(arg)).ok()?.as_f64()
    }

    fn publish(&self, f: &Function, payload: serde_json::Value) {
        let value = <JsValue as JsValueSerdeExt>::from_serde(&payload).unwrap_or(JsValue::NULL);
        if f.call1(&JsValue::NULL, &value).is_err() {
            get_logger().warn(LogComponent::Presentation("Surface"), "surface callback failed");
        }
    }
}

impl ChartSurface for JsChartSurface {
    fn time_at_logical_index(&self, index: f64) -> Option<Timestamp> {
        self.call_number(&self.time_at_index, index).map(|t| Timestamp::new(t as i64))
    }

    fn coordinate_for_time(&self, time: Timestamp) -> Option<f64> {
        self.call_number(&self.coord_for_time, time.as_f64())
    }

    fn set_candle_series(&self, candles: &[Candle]) {
        let rows: Vec<serde_json::Value> = candles
            .iter()
            .map(|c| {
                json!({
                    "time": c.timestamp.value(),
                    "open": c.ohlcv.open.value(),
                    "high": c.ohlcv.high.value(),
                    "low": c.ohlcv.low.value(),
                    "close": c.ohlcv.close.value(),
                    "volume": c.ohlcv.volume.value(),
                })
            })
            .collect();
        global_state::candle_count().set(candles.len());
        self.publish(&self.set_candles, serde_json::Value::Array(rows));
    }

    fn set_equity_series(&self, points: &[EquityPoint]) {
        let rows: Vec<serde_json::Value> =
            points.iter().map(|p| json!({"time": p.time.value(), "value": p.equity})).collect();
        self.publish(&self.set_equity, serde_json::Value::Array(rows));
    }

    fn set_position_series(&self, bars: &[PositionBar]) {
        let rows: Vec<serde_json::Value> =
            bars.iter().map(|b| json!({"time": b.time.value(), "value": b.position})).collect();
        self.publish(&self.set_positions, serde_json::Value::Array(rows));
    }

    fn set_markers(&self, markers: &[TradeMarker]) {
        let rows: Vec<serde_json::Value> = markers
            .iter()
            .map(|m| {
                let (position, shape) = match m.side {
                    MarkerSide::Buy => ("belowBar", "arrowUp"),
                    MarkerSide::Sell => ("aboveBar", "arrowDown"),
                };
                json!({"time": m.time.value(), "position": position, "shape": shape, "text": m.label})
            })
            .collect();
        self.publish(&self.set_markers, serde_json::Value::Array(rows));
    }

    fn set_pan_zoom_enabled(&self, enabled: bool) {
        let _ = self.set_pan_zoom.call1(&JsValue::NULL, &JsValue::from_bool(enabled));
    }

    fn set_selection_overlay(&self, range: Option<(f64, f64)>) {
        let payload = match range {
            Some((left, right)) => json!({"left": left, "right": right}),
            None => serde_json::Value::Null,
        };
        self.publish(&self.set_overlay, payload);
    }
}

struct ApiInner {
    config: ChartConfig,
    loader: SeriesLoader<HistoryHttpClient>,
    runner: BacktestRunner<BacktestHttpClient>,
    selection: RefCell<SelectionController>,
    surface: RefCell<Option<Rc<JsChartSurface>>>,
    listeners: RefCell<Vec<KeyListenerHandle>>,
}

impl ApiInner {
    fn surface(&self) -> Option<Rc<JsChartSurface>> {
        self.surface.borrow().clone()
    }

    fn apply_selection_effect(&self, surface: &JsChartSurface, effect: SelectionEffect) {
        match effect {
            SelectionEffect::None => {}
            SelectionEffect::BeginDrag => surface.set_pan_zoom_enabled(false),
            SelectionEffect::OverlayUpdate(range) => {
                global_state::selection().set(Some(range));
                // A failed pixel mapping skips this frame's overlay only.
                if let Some(coords) = overlay_coordinates(surface, range) {
                    surface.set_selection_overlay(Some(coords));
                }
            }
            SelectionEffect::Cleared => {
                global_state::selection().set(None);
                surface.set_selection_overlay(None);
                surface.set_pan_zoom_enabled(true);
            }
        }
    }
}

/// Chart controller facade exposed to JavaScript.
#[wasm_bindgen]
pub struct BacktestChartApi {
    inner: Rc<ApiInner>,
}

#[wasm_bindgen]
impl BacktestChartApi {
    /// Create the API from an optional JSON config blob.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<BacktestChartApi, JsValue> {
        let config = match config_json {
            Some(raw) => ChartConfig::from_json(&raw).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => ChartConfig::default(),
        };

        global_state::current_symbol().set(config.symbol.clone());
        global_state::current_interval().set(config.interval);

        let loader = SeriesLoader::new(
            HistoryHttpClient::new(config.base_url.clone()),
            config.symbol(),
            config.interval,
        )
        .with_error_sink(|e| {
            global_state::loading_more().set(false);
            global_state::status().set(e.to_string());
            log_error!(LogComponent::Presentation("Api"), "{e}");
        });

        let runner =
            BacktestRunner::new(BacktestHttpClient::new(config.base_url.clone()), config.symbol());

        Ok(Self {
            inner: Rc::new(ApiInner {
                config,
                loader,
                runner,
                selection: RefCell::new(SelectionController::new()),
                surface: RefCell::new(None),
                listeners: RefCell::new(Vec::new()),
            }),
        })
    }

    /// Register the charting-library callbacks. Must be called before any
    /// data or event entry point.
    #[wasm_bindgen(js_name = registerSurface)]
    #[allow(clippy::too_many_arguments)]
    pub fn register_surface(
        &self,
        time_at_index: Function,
        coord_for_time: Function,
        set_candles: Function,
        set_equity: Function,
        set_positions: Function,
        set_markers: Function,
        set_pan_zoom: Function,
        set_overlay: Function,
    ) {
        *self.inner.surface.borrow_mut() = Some(Rc::new(JsChartSurface {
            time_at_index,
            coord_for_time,
            set_candles,
            set_equity,
            set_positions,
            set_markers,
            set_pan_zoom,
            set_overlay,
        }));
    }

    /// Full reload anchored at `anchor_secs`, or at "now" when omitted.
    pub fn reload(&self, anchor_secs: Option<f64>) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let Some(surface) = inner.surface() else {
                return Err(js_error(ChartError::Surface("surface not registered".to_string())));
            };
            let anchor =
                Timestamp::new(anchor_secs.unwrap_or_else(|| js_sys::Date::now() / 1000.0) as i64);
            let interval = global_state::current_interval().get_untracked();

            global_state::loading_more().set(true);
            inner.loader.reload(surface.as_ref(), anchor, interval).await;
            global_state::loading_more().set(false);

            Ok(JsValue::from_f64(inner.loader.candle_count() as f64))
        })
    }

    /// Switch the interval granularity and reload from "now".
    ///
    /// Ignored while a fetch is in flight (no cancellation of in-flight
    /// fetches); the host retries once `isLoading` reports false.
    #[wasm_bindgen(js_name = setInterval)]
    pub fn set_interval(&self, interval: String) -> Result<Promise, JsValue> {
        let parsed: TimeInterval =
            interval.parse().map_err(|_| JsValue::from_str(&format!("invalid interval: {interval}")))?;
        if self.inner.loader.is_loading() {
            return Err(JsValue::from_str("interval switch ignored: fetch in flight"));
        }
        global_state::current_interval().set(parsed);
        Ok(self.reload(None))
    }

    /// Visible-logical-range-changed event from the charting library.
    ///
    /// Resolves true only when the event actually started a fetch; the
    /// loading indicator is raised for exactly that case, so ordinary pans
    /// away from the boundary never flash it.
    #[wasm_bindgen(js_name = onVisibleRangeChanged)]
    pub fn on_visible_range_changed(&self, left_index: f64) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let Some(surface) = inner.surface() else {
                return Ok(JsValue::FALSE);
            };
            let Some(anchor) = inner.loader.next_backward_anchor(surface.as_ref(), left_index)
            else {
                return Ok(JsValue::FALSE);
            };

            global_state::loading_more().set(true);
            inner.loader.load_batch(surface.as_ref(), anchor, true).await;
            global_state::loading_more().set(false);

            Ok(JsValue::TRUE)
        })
    }

    #[wasm_bindgen(js_name = onPointerDown)]
    pub fn on_pointer_down(&self, time_secs: f64, modifier_held: bool) {
        if let Some(surface) = self.inner.surface() {
            let effect =
                self.inner.selection.borrow_mut().pointer_down(Timestamp::new(time_secs as i64), modifier_held);
            self.inner.apply_selection_effect(surface.as_ref(), effect);
        }
    }

    #[wasm_bindgen(js_name = onCrosshairMove)]
    pub fn on_crosshair_move(&self, time_secs: f64, modifier_held: bool) {
        if let Some(surface) = self.inner.surface() {
            let effect =
                self.inner.selection.borrow_mut().pointer_move(Timestamp::new(time_secs as i64), modifier_held);
            self.inner.apply_selection_effect(surface.as_ref(), effect);
        }
    }

    #[wasm_bindgen(js_name = onModifierPressed)]
    pub fn on_modifier_pressed(&self) {
        global_state::modifier_held().set(true);
        if let Some(surface) = self.inner.surface() {
            let effect = self.inner.selection.borrow_mut().modifier_pressed();
            self.inner.apply_selection_effect(surface.as_ref(), effect);
        }
    }

    #[wasm_bindgen(js_name = onModifierReleased)]
    pub fn on_modifier_released(&self) {
        global_state::modifier_held().set(false);
        if let Some(surface) = self.inner.surface() {
            let effect = self.inner.selection.borrow_mut().modifier_released();
            self.inner.apply_selection_effect(surface.as_ref(), effect);
        }
    }

    /// The committed `{start, end}` range, or null.
    #[wasm_bindgen(js_name = committedRange)]
    pub fn committed_range(&self) -> JsValue {
        match self.inner.selection.borrow().committed() {
            Some(range) => <JsValue as JsValueSerdeExt>::from_serde(
                &json!({"start": range.start.value(), "end": range.end.value()}),
            )
            .unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) {
        if let Some(surface) = self.inner.surface() {
            let effect = self.inner.selection.borrow_mut().clear();
            self.inner.apply_selection_effect(surface.as_ref(), effect);
        }
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.inner.loader.is_loading()
    }

    /// Run a backtest over the committed range and publish the equity
    /// curve, position histogram and trade markers to the surface.
    /// Resolves with the summary statistics object.
    #[wasm_bindgen(js_name = runBacktest)]
    pub fn run_backtest(
        &self,
        strategy_id: String,
        params_json: String,
        initial_capital: f64,
    ) -> Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let Some(surface) = inner.surface() else {
                return Err(js_error(ChartError::Surface("surface not registered".to_string())));
            };
            let Some(range) = inner.selection.borrow().committed() else {
                return Err(JsValue::from_str("no time range selected"));
            };

            let params: HashMap<String, serde_json::Value> = serde_json::from_str(&params_json)
                .map_err(|e| JsValue::from_str(&format!("invalid params: {e}")))?;
            let strategy = StrategyParams { strategy_id, params, initial_capital };
            let interval = global_state::current_interval().get_untracked();

            global_state::backtest_running().set(true);
            let outcome = inner.runner.run(range, interval, &strategy).await;
            global_state::backtest_running().set(false);

            let outcome = outcome.map_err(|e| JsValue::from_str(&e.to_string()))?;

            let equity = outcome.equity_points().map_err(|e| JsValue::from_str(&e.to_string()))?;
            let positions = outcome.position_bars().map_err(|e| JsValue::from_str(&e.to_string()))?;
            let markers = outcome.trade_markers().map_err(|e| JsValue::from_str(&e.to_string()))?;
            surface.set_equity_series(&equity);
            surface.set_position_series(&positions);
            surface.set_markers(&markers);

            let mut stats: Vec<(String, f64)> =
                outcome.stats().iter().map(|(k, v)| (k.clone(), *v)).collect();
            stats.sort_by(|a, b| a.0.cmp(&b.0));
            global_state::backtest_stats().set(stats);

            <JsValue as JsValueSerdeExt>::from_serde(outcome.stats())
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    /// Mount the Leptos shell (interval selector, loading badge, selection
    /// readout, stats) and wire its controls to this instance.
    #[wasm_bindgen(js_name = mountShell)]
    pub fn mount_shell(&self) {
        let inner = Rc::clone(&self.inner);
        crate::app::set_clear_handler(move || {
            if let Some(surface) = inner.surface() {
                let effect = inner.selection.borrow_mut().clear();
                inner.apply_selection_effect(surface.as_ref(), effect);
            }
        });

        let inner = Rc::clone(&self.inner);
        crate::app::set_interval_handler(move |interval| {
            if inner.loader.is_loading() {
                return;
            }
            global_state::current_interval().set(interval);
            let inner = Rc::clone(&inner);
            spawn_local(async move {
                let Some(surface) = inner.surface() else {
                    return;
                };
                let anchor = Timestamp::new((js_sys::Date::now() / 1000.0) as i64);
                global_state::loading_more().set(true);
                inner.loader.reload(surface.as_ref(), anchor, interval).await;
                global_state::loading_more().set(false);
            });
        });

        crate::app::mount_shell();
    }

    /// Track the Shift modifier on the window, so hosts don't have to
    /// forward key events through `onModifierPressed`/`onModifierReleased`
    /// themselves.
    #[wasm_bindgen(js_name = startModifierTracking)]
    pub fn start_modifier_tracking(&self) {
        let inner = Rc::clone(&self.inner);
        let down = on_window_keydown(move |ev| {
            if ev.key() == "Shift" && !ev.repeat() {
                global_state::modifier_held().set(true);
                if let Some(surface) = inner.surface() {
                    let effect = inner.selection.borrow_mut().modifier_pressed();
                    inner.apply_selection_effect(surface.as_ref(), effect);
                }
            }
        });

        let inner = Rc::clone(&self.inner);
        let up = on_window_keyup(move |ev| {
            if ev.key() == "Shift" {
                global_state::modifier_held().set(false);
                if let Some(surface) = inner.surface() {
                    let effect = inner.selection.borrow_mut().modifier_released();
                    inner.apply_selection_effect(surface.as_ref(), effect);
                }
            }
        });

        self.inner.listeners.borrow_mut().extend([down, up]);
    }

    /// Backend base URL in effect, mostly for host-page diagnostics.
    #[wasm_bindgen(js_name = baseUrl)]
    pub fn base_url(&self) -> String {
        self.inner.config.base_url.clone()
    }
}
