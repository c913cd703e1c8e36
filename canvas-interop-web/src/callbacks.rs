//! The object of Rust closures `canvas-interop.js` calls back into.
//!
//! Closures are leaked with `forget`: the module keeps them for the lifetime
//! of the page.

use canvas_interop_core::{Bridge, InteropError};
use js_sys::{Object, Reflect, Uint8Array};
use wasm_bindgen::closure::WasmClosure;
use wasm_bindgen::prelude::*;

fn to_js(e: InteropError) -> JsValue {
    JsError::new(&e.to_string()).into()
}

fn with_bridge(f: impl FnOnce(&Bridge) -> canvas_interop_core::Result<()>) -> Result<(), JsValue> {
    let bridge = crate::bridge().ok_or_else(|| JsValue::from_str("canvas interop bridge was not created"))?;
    f(&bridge).map_err(to_js)
}

/// `null`/`undefined` become `None`; arrays and typed arrays are copied.
fn bytes_from_js(value: &JsValue) -> Option<Vec<u8>> {
    if value.is_null() || value.is_undefined() {
        None
    } else {
        Some(Uint8Array::new(value).to_vec())
    }
}

fn register<F: ?Sized + WasmClosure>(target: &Object, name: &str, closure: Closure<F>) -> Result<(), JsValue> {
    Reflect::set(target, &JsValue::from_str(name), closure.as_ref())?;
    closure.forget();
    Ok(())
}

pub fn build() -> Result<Object, JsValue> {
    let callbacks = Object::new();

    register(
        &callbacks,
        "onPointerDown",
        Closure::<dyn FnMut(Option<String>, i32, i32, i32, i32) -> Result<(), JsValue>>::new(
            |canvas_id: Option<String>, button, buttons, pointer_id, modifiers| {
                with_bridge(|b| b.dispatch_pointer_down(canvas_id.as_deref(), button, buttons, pointer_id, modifiers))
            },
        ),
    )?;

    register(
        &callbacks,
        "onPointerUp",
        Closure::<dyn FnMut(Option<String>, i32, i32, i32, i32) -> Result<(), JsValue>>::new(
            |canvas_id: Option<String>, button, buttons, pointer_id, modifiers| {
                with_bridge(|b| b.dispatch_pointer_up(canvas_id.as_deref(), button, buttons, pointer_id, modifiers))
            },
        ),
    )?;

    register(
        &callbacks,
        "onPointerMoved",
        Closure::<dyn FnMut(Option<String>, f32, f32, i32, i32) -> Result<(), JsValue>>::new(
            |canvas_id: Option<String>, x, y, buttons, modifiers| {
                with_bridge(|b| b.dispatch_pointer_moved(canvas_id.as_deref(), x, y, buttons, modifiers))
            },
        ),
    )?;

    register(
        &callbacks,
        "onMouseWheel",
        Closure::<dyn FnMut(Option<String>, f32, f32, i32) -> Result<(), JsValue>>::new(
            |canvas_id: Option<String>, dx, dy, modifiers| {
                with_bridge(|b| b.dispatch_wheel(canvas_id.as_deref(), dx, dy, modifiers))
            },
        ),
    )?;

    register(
        &callbacks,
        "onPinchZoomStarted",
        Closure::<dyn FnMut(Option<String>, f32, f32, f32) -> Result<(), JsValue>>::new(
            |canvas_id: Option<String>, distance, cx, cy| {
                with_bridge(|b| b.dispatch_pinch_started(canvas_id.as_deref(), distance, cx, cy))
            },
        ),
    )?;

    register(
        &callbacks,
        "onPinchZoom",
        Closure::<dyn FnMut(Option<String>, f32, f32, f32) -> Result<(), JsValue>>::new(
            |canvas_id: Option<String>, distance, cx, cy| {
                with_bridge(|b| b.dispatch_pinch_updated(canvas_id.as_deref(), distance, cx, cy))
            },
        ),
    )?;

    register(
        &callbacks,
        "onPinchZoomEnded",
        Closure::<dyn FnMut(Option<String>) -> Result<(), JsValue>>::new(|canvas_id: Option<String>| {
            with_bridge(|b| b.dispatch_pinch_ended(canvas_id.as_deref()))
        }),
    )?;

    register(
        &callbacks,
        "onCanvasResized",
        Closure::<dyn FnMut(Option<String>, f32, f32, f32) -> Result<(), JsValue>>::new(
            |canvas_id: Option<String>, width, height, dpi_scale| {
                with_bridge(|b| b.dispatch_resized(canvas_id.as_deref(), width, height, dpi_scale))
            },
        ),
    )?;

    register(
        &callbacks,
        "onContextLost",
        Closure::<dyn FnMut(Option<String>) -> Result<(), JsValue>>::new(|canvas_id: Option<String>| {
            with_bridge(|b| b.dispatch_context_lost(canvas_id.as_deref()))
        }),
    )?;

    register(
        &callbacks,
        "onFrameUpdate",
        Closure::<dyn FnMut() -> Result<(), JsValue>>::new(|| {
            with_bridge(|b| {
                b.dispatch_animation_frame();
                Ok(())
            })
        }),
    )?;

    register(
        &callbacks,
        "onTextFileLoaded",
        Closure::<dyn FnMut(Option<String>, String, Option<String>, Option<String>) -> Result<(), JsValue>>::new(
            |canvas_id: Option<String>, url: String, text, error| {
                with_bridge(|b| b.complete_text_file(canvas_id.as_deref(), &url, text, error))
            },
        ),
    )?;

    register(
        &callbacks,
        "onBinaryFileLoaded",
        Closure::<dyn FnMut(Option<String>, String, JsValue, Option<String>) -> Result<(), JsValue>>::new(
            |canvas_id: Option<String>, url: String, data: JsValue, error| {
                with_bridge(|b| b.complete_binary_file(canvas_id.as_deref(), &url, bytes_from_js(&data), error))
            },
        ),
    )?;

    register(
        &callbacks,
        "onImageBytesLoaded",
        Closure::<dyn FnMut(Option<String>, String, i32, i32, JsValue, Option<String>) -> Result<(), JsValue>>::new(
            |canvas_id: Option<String>, url: String, width, height, data: JsValue, error| {
                with_bridge(|b| {
                    b.complete_image_bytes(canvas_id.as_deref(), &url, width, height, bytes_from_js(&data), error)
                })
            },
        ),
    )?;

    Ok(callbacks)
}
