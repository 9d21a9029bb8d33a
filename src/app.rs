//! Leptos shell around the external chart: loading badge, selection
//! readout, backtest summary. The chart canvas itself belongs to the host
//! page's charting library.

use std::cell::RefCell;

use leptos::*;
use strum::IntoEnumIterator;

use crate::domain::market_data::TimeInterval;
use crate::global_state;
use crate::time_utils;

thread_local! {
    // Bridges from shell controls to whoever owns the selection controller
    // and the loader (the WASM API instance).
    static CLEAR_HANDLER: RefCell<Option<Box<dyn Fn()>>> = const { RefCell::new(None) };
    static INTERVAL_HANDLER: RefCell<Option<Box<dyn Fn(TimeInterval)>>> = const { RefCell::new(None) };
}

pub fn set_clear_handler(handler: impl Fn() + 'static) {
    CLEAR_HANDLER.with(|cell| *cell.borrow_mut() = Some(Box::new(handler)));
}

pub fn set_interval_handler(handler: impl Fn(TimeInterval) + 'static) {
    INTERVAL_HANDLER.with(|cell| *cell.borrow_mut() = Some(Box::new(handler)));
}

fn request_clear() {
    CLEAR_HANDLER.with(|cell| {
        if let Some(handler) = cell.borrow().as_ref() {
            handler();
        }
    });
}

fn request_interval(interval: TimeInterval) {
    INTERVAL_HANDLER.with(|cell| {
        if let Some(handler) = cell.borrow().as_ref() {
            handler(interval);
        }
    });
}

/// Mount the shell below the chart container.
pub fn mount_shell() {
    mount_to_body(App);
}

#[component]
pub fn App() -> impl IntoView {
    view! {
        <style>
            {r#"
            .backtest-shell {
                font-family: 'SF Pro Display', -apple-system, sans-serif;
                color: #e0e0e0;
                background: #1c2633;
                padding: 12px 16px;
                border-radius: 8px;
            }
            .shell-row { display: flex; gap: 24px; align-items: center; }
            .badge { padding: 2px 8px; border-radius: 4px; font-size: 12px; }
            .badge-loading { background: #f39c12; color: #1c2633; }
            .selection-range { font-family: 'Courier New', monospace; }
            .interval-select {
                background: #2c3e50; color: #e0e0e0; border: none;
                padding: 2px 6px; border-radius: 4px;
            }
            .clear-btn {
                background: #4a5d73; color: white; border: none;
                padding: 4px 10px; border-radius: 4px; cursor: pointer;
            }
            .stats-table { margin-top: 10px; font-size: 13px; border-collapse: collapse; }
            .stats-table td { padding: 2px 12px 2px 0; }
            .status-line { margin-top: 8px; font-size: 12px; color: #a0a0a0; }
            "#}
        </style>
        <div class="backtest-shell">
            <Header />
            <SelectionPanel />
            <StatsPanel />
            <StatusLine />
        </div>
    }
}

#[component]
fn Header() -> impl IntoView {
    let symbol = global_state::current_symbol();
    let interval = global_state::current_interval();
    let candle_count = global_state::candle_count();
    let loading = global_state::loading_more();

    view! {
        <div class="shell-row">
            <strong>{move || symbol.get()}</strong>
            <select
                class="interval-select"
                on:change=move |ev| {
                    if let Ok(parsed) = event_target_value(&ev).parse::<TimeInterval>() {
                        request_interval(parsed);
                    }
                }
            >
                {TimeInterval::iter()
                    .map(|option| {
                        view! {
                            <option
                                value=option.as_query_str().to_string()
                                selected=move || interval.get() == option
                            >
                                {option.as_query_str().to_string()}
                            </option>
                        }
                    })
                    .collect_view()}
            </select>
            <span>{move || format!("{} candles", candle_count.get())}</span>
            <Show when=move || loading.get()>
                <span class="badge badge-loading">"loading history…"</span>
            </Show>
        </div>
    }
}

#[component]
fn SelectionPanel() -> impl IntoView {
    let selection = global_state::selection();

    view! {
        <Show when=move || selection.get().is_some()>
            <div class="shell-row">
                <span class="selection-range">
                    {move || {
                        selection
                            .get()
                            .map(|range| {
                                format!(
                                    "{} → {}",
                                    time_utils::format_backend_timestamp(range.start),
                                    time_utils::format_backend_timestamp(range.end),
                                )
                            })
                            .unwrap_or_default()
                    }}
                </span>
                <button class="clear-btn" on:click=move |_| request_clear()>
                    "Clear"
                </button>
            </div>
        </Show>
    }
}

#[component]
fn StatsPanel() -> impl IntoView {
    let stats = global_state::backtest_stats();
    let running = global_state::backtest_running();

    view! {
        <Show when=move || running.get()>
            <div class="shell-row">"Running backtest…"</div>
        </Show>
        <Show when=move || !stats.get().is_empty()>
            <table class="stats-table">
                <For
                    each=move || stats.get()
                    key=|(name, _)| name.clone()
                    children=move |(name, value)| {
                        view! {
                            <tr>
                                <td>{name}</td>
                                <td>{format!("{value:.2}")}</td>
                            </tr>
                        }
                    }
                />
            </table>
        </Show>
    }
}

#[component]
fn StatusLine() -> impl IntoView {
    let status = global_state::status();
    view! {
        <Show when=move || !status.get().is_empty()>
            <div class="status-line">{move || status.get()}</div>
        </Show>
    }
}
