//! Window-level key listeners for the selection modifier.
//!
//! The charting library owns the canvas events; the modifier key is the one
//! input this crate has to watch on the window itself.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{AddEventListenerOptions, KeyboardEvent};

/// Owns the callback closure for a registered listener. Dropping the handle
/// without `remove` keeps the closure alive but orphaned, so holders keep it
/// for the lifetime of the tracking.
pub struct KeyListenerHandle {
    event_name: &'static str,
    callback: Closure<dyn FnMut(KeyboardEvent)>,
}

impl KeyListenerHandle {
    pub fn remove(self) {
        if let Some(window) = web_sys::window() {
            let _ = window.remove_event_listener_with_callback(
                self.event_name,
                self.callback.as_ref().unchecked_ref(),
            );
        }
    }
}

fn listen(event_name: &'static str, cb: impl FnMut(KeyboardEvent) + 'static) -> KeyListenerHandle {
    let opts = AddEventListenerOptions::new();
    opts.set_passive(true);

    let callback = Closure::wrap(Box::new(cb) as Box<dyn FnMut(KeyboardEvent)>);
    if let Some(window) = web_sys::window() {
        let _ = window.add_event_listener_with_callback_and_add_event_listener_options(
            event_name,
            callback.as_ref().unchecked_ref(),
            &opts,
        );
    }

    KeyListenerHandle { event_name, callback }
}

pub fn on_window_keydown(cb: impl FnMut(KeyboardEvent) + 'static) -> KeyListenerHandle {
    listen("keydown", cb)
}

pub fn on_window_keyup(cb: impl FnMut(KeyboardEvent) + 'static) -> KeyListenerHandle {
    listen("keyup", cb)
}
