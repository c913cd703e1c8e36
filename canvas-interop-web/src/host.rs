use canvas_interop_core::{BrowserHost, ResourceKind, WebGlOptions};
use futures::future::{FutureExt, LocalBoxFuture};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen(module = "/js/interop-shim.js")]
extern "C" {
    #[wasm_bindgen(js_name = importInteropModule, catch)]
    fn import_interop_module(url: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_name = importScript, catch)]
    fn import_script(url: &str) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_name = initInterop, catch)]
    fn init_interop(callbacks: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_name = initWebGLCanvas, catch)]
    fn init_webgl_canvas(
        canvas_id: &str,
        use_msaa: bool,
        preserve_drawing_buffer: bool,
        subscribe_pointer_events: bool,
        subscribe_animation_frame: bool,
        log_javascript: bool,
    ) -> Result<String, JsValue>;

    #[wasm_bindgen(js_name = subscribeBrowserEvents, catch)]
    fn subscribe_browser_events(canvas_id: &str, pointer_events: bool, animation_frame: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = unsubscribeBrowserEvents, catch)]
    fn unsubscribe_browser_events(canvas_id: &str, pointer_events: bool, animation_frame: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = disconnectWebGLCanvas, catch)]
    fn disconnect_webgl_canvas(canvas_id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = loadTextFile, catch)]
    fn load_text_file(canvas_id: &str, url: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = loadBinaryFile, catch)]
    fn load_binary_file(canvas_id: &str, url: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = loadImageBytes, catch)]
    fn load_image_bytes(canvas_id: &str, url: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = createImageFromBytes, catch)]
    fn create_image_from_bytes(canvas_id: &str, bytes: &[u8], mime_type: &str, image_name: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = setCursorStyle, catch)]
    fn set_cursor_style(canvas_id: &str, cursor_style: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = setPointerCapture, catch)]
    fn set_pointer_capture(canvas_id: &str, pointer_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = releasePointerCapture, catch)]
    fn release_pointer_capture(canvas_id: &str, pointer_id: i32) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = showRawBitmap, catch)]
    fn show_raw_bitmap(canvas_id: &str, width: u32, height: u32, pixels: &[u8]) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = startFrameCapture, catch)]
    fn start_frame_capture(canvas_id: &str) -> Result<bool, JsValue>;

    #[wasm_bindgen(js_name = stopFrameCapture, catch)]
    fn stop_frame_capture() -> Result<(), JsValue>;
}

/// Readable text for a thrown JS value: `Error.message`, a string, or the
/// debug form of anything else.
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return format!("{}: {}", String::from(error.name()), String::from(error.message()));
    }
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn await_promise(promise: Result<js_sys::Promise, JsValue>) -> LocalBoxFuture<'static, Result<(), String>> {
    async move {
        let promise = promise.map_err(|e| js_error_message(&e))?;
        JsFuture::from(promise)
            .await
            .map(|_| ())
            .map_err(|e| js_error_message(&e))
    }
    .boxed_local()
}

/// Log fire-and-forget calls that threw inside the browser module.
fn log_failure(call: &str, result: Result<(), JsValue>) {
    if let Err(e) = result {
        log::error!("{call} failed: {}", js_error_message(&e));
    }
}

/// `BrowserHost` backed by the `canvas-interop.js` module.
pub struct JsBrowserHost {
    callbacks: JsValue,
}

impl JsBrowserHost {
    /// `callbacks` is the object of Rust closures handed to the module on init.
    pub fn new(callbacks: JsValue) -> Self {
        Self { callbacks }
    }
}

impl BrowserHost for JsBrowserHost {
    fn import_module(&self, url: &str) -> LocalBoxFuture<'static, Result<(), String>> {
        await_promise(import_interop_module(url))
    }

    fn import_script(&self, url: &str) -> LocalBoxFuture<'static, Result<(), String>> {
        await_promise(import_script(url))
    }

    fn init_interop(&self) -> LocalBoxFuture<'static, Result<(), String>> {
        await_promise(init_interop(&self.callbacks))
    }

    fn init_webgl_canvas(
        &self,
        canvas_id: &str,
        options: &WebGlOptions,
        subscribe_pointer_events: bool,
        log_javascript: bool,
    ) -> String {
        init_webgl_canvas(
            canvas_id,
            options.use_msaa,
            options.preserve_drawing_buffer,
            subscribe_pointer_events,
            options.subscribe_animation_frame,
            log_javascript,
        )
        .unwrap_or_else(|e| js_error_message(&e))
    }

    fn subscribe_browser_events(&self, canvas_id: &str, pointer_events: bool, animation_frame: bool) {
        log_failure(
            "subscribeBrowserEvents",
            subscribe_browser_events(canvas_id, pointer_events, animation_frame),
        );
    }

    fn unsubscribe_browser_events(&self, canvas_id: &str, pointer_events: bool, animation_frame: bool) {
        log_failure(
            "unsubscribeBrowserEvents",
            unsubscribe_browser_events(canvas_id, pointer_events, animation_frame),
        );
    }

    fn disconnect_webgl_canvas(&self, canvas_id: &str) {
        log_failure("disconnectWebGLCanvas", disconnect_webgl_canvas(canvas_id));
    }

    fn load_resource(&self, canvas_id: &str, kind: ResourceKind, url: &str) {
        let result = match kind {
            ResourceKind::Text => load_text_file(canvas_id, url),
            ResourceKind::Binary => load_binary_file(canvas_id, url),
            ResourceKind::Image => load_image_bytes(canvas_id, url),
        };
        log_failure(kind.label(), result);
    }

    fn decode_image_bytes(&self, canvas_id: &str, bytes: &[u8], mime_type: &str, image_name: &str) {
        log_failure(
            "createImageFromBytes",
            create_image_from_bytes(canvas_id, bytes, mime_type, image_name),
        );
    }

    fn set_cursor_style(&self, canvas_id: &str, cursor_style: &str) {
        log_failure("setCursorStyle", set_cursor_style(canvas_id, cursor_style));
    }

    fn set_pointer_capture(&self, canvas_id: &str, pointer_id: i32) {
        log_failure("setPointerCapture", set_pointer_capture(canvas_id, pointer_id));
    }

    fn release_pointer_capture(&self, canvas_id: &str, pointer_id: i32) {
        log_failure("releasePointerCapture", release_pointer_capture(canvas_id, pointer_id));
    }

    fn show_raw_bitmap(&self, canvas_id: &str, width: u32, height: u32, pixels: &[u8]) {
        log_failure("showRawBitmap", show_raw_bitmap(canvas_id, width, height, pixels));
    }

    fn start_frame_capture(&self, canvas_id: &str) -> bool {
        start_frame_capture(canvas_id).unwrap_or_else(|e| {
            log::error!("startFrameCapture failed: {}", js_error_message(&e));
            false
        })
    }

    fn stop_frame_capture(&self) {
        log_failure("stopFrameCapture", stop_frame_capture());
    }
}
