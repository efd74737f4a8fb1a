//! Slide Fifteen core crate.
//!
//! A single-player sliding puzzle ("15-puzzle") drawn on an HTML canvas. The
//! whole game is one UI controller (see [`puzzle`]): grid state, pointer
//! input, optional slide animation, a move counter, an elapsed-time clock and
//! a results log mirrored into a DOM table. The grid and session logic are
//! pure Rust and unit-tested natively; only the controller touches the DOM.

use wasm_bindgen::prelude::*;

pub mod puzzle;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Mount the puzzle onto the page and wire up its controls.
///
/// Expects the DOM contract described in the README: a `canvas` element plus
/// `start`/`restart`/`finish` buttons, the `slider` dimension input, the
/// `switch` animation toggle and the `steps`/`timer`/`dimension`/`table_body`
/// display elements.
#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    puzzle::mount()
}

/// Results log as JSON, for JS consumers that want to persist or render it
/// outside the built-in table.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn results_json() -> String {
    puzzle::results_json()
}

// Millisecond timestamp from performance.now(); 0.0 outside a browser.
pub(crate) fn performance_now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}
