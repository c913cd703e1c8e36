//! Canvas Interop WASM binding
//!
//! Implements the browser host on top of `canvas-interop.js`, owns the
//! page-wide bridge and exports the entry points the host page calls.

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod callbacks;
#[cfg(target_arch = "wasm32")]
mod host;
mod input;

pub use input::InputState;

#[cfg(target_arch = "wasm32")]
use std::cell::RefCell;
#[cfg(target_arch = "wasm32")]
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
use canvas_interop_core::{Bridge, InteropOptions};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
thread_local! {
    static BRIDGE: RefCell<Option<Bridge>> = const { RefCell::new(None) };
}

/// The page-wide bridge, once [`initialize`] created it.
#[cfg(target_arch = "wasm32")]
pub(crate) fn bridge() -> Option<Bridge> {
    BRIDGE.with(|b| b.borrow().clone())
}

/// Entry point, called when the WASM module loads.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // Fails only when a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Canvas interop runtime loaded");
}

/// Create the bridge (first call only) and run the interop setup.
///
/// `options_json` is an optional JSON object with camelCase
/// `InteropOptions` fields; it is ignored once the bridge exists.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn initialize(options_json: Option<String>) -> Result<(), JsValue> {
    let bridge = match bridge() {
        Some(bridge) => bridge,
        None => {
            let options = match options_json.as_deref() {
                Some(json) => InteropOptions::from_json(json).map_err(|e| JsError::new(&e.to_string()))?,
                None => InteropOptions::default(),
            };
            let callbacks = callbacks::build()?;
            let bridge = Bridge::new(Rc::new(host::JsBrowserHost::new(callbacks.into())), options);
            BRIDGE.with(|b| *b.borrow_mut() = Some(bridge.clone()));
            bridge
        }
    };

    bridge
        .initialize()
        .await
        .map_err(|e| JsError::new(&e.to_string()).into())
}
