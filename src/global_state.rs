use crate::domain::market_data::TimeInterval;
use crate::domain::selection::TimeRange;
use leptos::*;
use once_cell::sync::OnceCell;

pub struct Globals {
    pub loading_more: RwSignal<bool>,
    pub current_interval: RwSignal<TimeInterval>,
    pub current_symbol: RwSignal<String>,
    pub candle_count: RwSignal<usize>,
    pub selection: RwSignal<Option<TimeRange>>,
    pub modifier_held: RwSignal<bool>,
    pub backtest_running: RwSignal<bool>,
    pub backtest_stats: RwSignal<Vec<(String, f64)>>,
    pub status: RwSignal<String>,
}

static GLOBALS: OnceCell<Globals> = OnceCell::new();

pub fn globals() -> &'static Globals {
    GLOBALS.get_or_init(|| Globals {
        loading_more: create_rw_signal(false),
        current_interval: create_rw_signal(TimeInterval::OneMinute),
        current_symbol: create_rw_signal("BTCUSDT".to_string()),
        candle_count: create_rw_signal(0),
        selection: create_rw_signal(None),
        modifier_held: create_rw_signal(false),
        backtest_running: create_rw_signal(false),
        backtest_stats: create_rw_signal(Vec::new()),
        status: create_rw_signal(String::new()),
    })
}

/// Accessor functions over the signal table above.
macro_rules! global_signals {
    ( $( $vis:vis $name:ident => $field:ident : $ty:ty ),+ $(,)? ) => {
        $(
            $vis fn $name() -> RwSignal<$ty> {
                globals().$field
            }
        )+
    };
}

global_signals! {
    pub loading_more => loading_more: bool,
    pub current_interval => current_interval: TimeInterval,
    pub current_symbol => current_symbol: String,
    pub candle_count => candle_count: usize,
    pub selection => selection: Option<TimeRange>,
    pub modifier_held => modifier_held: bool,
    pub backtest_running => backtest_running: bool,
    pub backtest_stats => backtest_stats: Vec<(String, f64)>,
    pub status => status: String,
}
