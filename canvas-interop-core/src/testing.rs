//! Recording browser double shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::block_on;
use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::bridge::Bridge;
use crate::host::{BrowserHost, ResourceKind};
use crate::interop::CanvasInterop;
use crate::options::{InteropOptions, WebGlOptions};

#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Import { url: String },
    ImportScript { url: String },
    InitInterop,
    InitWebGl { canvas_id: String, subscribe_pointer_events: bool },
    Subscribe { canvas_id: String, pointer_events: bool, animation_frame: bool },
    Unsubscribe { canvas_id: String, pointer_events: bool, animation_frame: bool },
    Disconnect { canvas_id: String },
    LoadResource { canvas_id: String, kind: ResourceKind, url: String },
    DecodeImageBytes { canvas_id: String, name: String, mime: String, len: usize },
    CursorStyle { canvas_id: String, style: String },
    PointerCapture { canvas_id: String, pointer_id: i32, captured: bool },
    ShowRawBitmap { canvas_id: String, width: u32, height: u32 },
    StartCapture { canvas_id: String },
    StopCapture,
}

pub struct RecordingHost {
    calls: RefCell<Vec<HostCall>>,
    import_failure: RefCell<Option<String>>,
    init_failure: RefCell<Option<String>>,
    script_failure: RefCell<Option<String>>,
    hold_init: Cell<bool>,
    init_release: RefCell<Option<oneshot::Sender<()>>>,
    handshake: RefCell<String>,
    capture_available: Cell<bool>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            import_failure: RefCell::new(None),
            init_failure: RefCell::new(None),
            script_failure: RefCell::new(None),
            hold_init: Cell::new(false),
            init_release: RefCell::new(None),
            handshake: RefCell::new("OK:v2;800;600;1.5".to_string()),
            capture_available: Cell::new(true),
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    pub fn import_calls(&self) -> usize {
        self.count(|c| matches!(c, HostCall::Import { .. }))
    }

    pub fn fail_import(&self, message: &str) {
        *self.import_failure.borrow_mut() = Some(message.to_string());
    }

    pub fn fail_init(&self, message: &str) {
        *self.init_failure.borrow_mut() = Some(message.to_string());
    }

    pub fn fail_script(&self, message: &str) {
        *self.script_failure.borrow_mut() = Some(message.to_string());
    }

    pub fn clear_failures(&self) {
        *self.import_failure.borrow_mut() = None;
        *self.init_failure.borrow_mut() = None;
        *self.script_failure.borrow_mut() = None;
    }

    /// Keep the next `init_interop` pending until `release_init`.
    pub fn hold_init(&self) {
        self.hold_init.set(true);
    }

    pub fn release_init(&self) {
        self.hold_init.set(false);
        if let Some(tx) = self.init_release.borrow_mut().take() {
            let _ = tx.send(());
        }
    }

    pub fn set_handshake(&self, reply: &str) {
        *self.handshake.borrow_mut() = reply.to_string();
    }

    pub fn set_capture_available(&self, available: bool) {
        self.capture_available.set(available);
    }

    fn record(&self, call: HostCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl BrowserHost for RecordingHost {
    fn import_module(&self, url: &str) -> LocalBoxFuture<'static, Result<(), String>> {
        self.record(HostCall::Import { url: url.to_string() });
        let result = match self.import_failure.borrow().clone() {
            Some(message) => Err(message),
            None => Ok(()),
        };
        future::ready(result).boxed_local()
    }

    fn import_script(&self, url: &str) -> LocalBoxFuture<'static, Result<(), String>> {
        self.record(HostCall::ImportScript { url: url.to_string() });
        let result = match self.script_failure.borrow().clone() {
            Some(message) => Err(message),
            None => Ok(()),
        };
        future::ready(result).boxed_local()
    }

    fn init_interop(&self) -> LocalBoxFuture<'static, Result<(), String>> {
        self.record(HostCall::InitInterop);
        let result = match self.init_failure.borrow().clone() {
            Some(message) => Err(message),
            None => Ok(()),
        };
        if self.hold_init.get() {
            let (tx, rx) = oneshot::channel();
            *self.init_release.borrow_mut() = Some(tx);
            return async move {
                let _ = rx.await;
                result
            }
            .boxed_local();
        }
        future::ready(result).boxed_local()
    }

    fn init_webgl_canvas(
        &self,
        canvas_id: &str,
        _options: &WebGlOptions,
        subscribe_pointer_events: bool,
        _log_javascript: bool,
    ) -> String {
        self.record(HostCall::InitWebGl {
            canvas_id: canvas_id.to_string(),
            subscribe_pointer_events,
        });
        self.handshake.borrow().clone()
    }

    fn subscribe_browser_events(&self, canvas_id: &str, pointer_events: bool, animation_frame: bool) {
        self.record(HostCall::Subscribe {
            canvas_id: canvas_id.to_string(),
            pointer_events,
            animation_frame,
        });
    }

    fn unsubscribe_browser_events(&self, canvas_id: &str, pointer_events: bool, animation_frame: bool) {
        self.record(HostCall::Unsubscribe {
            canvas_id: canvas_id.to_string(),
            pointer_events,
            animation_frame,
        });
    }

    fn disconnect_webgl_canvas(&self, canvas_id: &str) {
        self.record(HostCall::Disconnect { canvas_id: canvas_id.to_string() });
    }

    fn load_resource(&self, canvas_id: &str, kind: ResourceKind, url: &str) {
        self.record(HostCall::LoadResource {
            canvas_id: canvas_id.to_string(),
            kind,
            url: url.to_string(),
        });
    }

    fn decode_image_bytes(&self, canvas_id: &str, bytes: &[u8], mime_type: &str, image_name: &str) {
        self.record(HostCall::DecodeImageBytes {
            canvas_id: canvas_id.to_string(),
            name: image_name.to_string(),
            mime: mime_type.to_string(),
            len: bytes.len(),
        });
    }

    fn set_cursor_style(&self, canvas_id: &str, cursor_style: &str) {
        self.record(HostCall::CursorStyle {
            canvas_id: canvas_id.to_string(),
            style: cursor_style.to_string(),
        });
    }

    fn set_pointer_capture(&self, canvas_id: &str, pointer_id: i32) {
        self.record(HostCall::PointerCapture {
            canvas_id: canvas_id.to_string(),
            pointer_id,
            captured: true,
        });
    }

    fn release_pointer_capture(&self, canvas_id: &str, pointer_id: i32) {
        self.record(HostCall::PointerCapture {
            canvas_id: canvas_id.to_string(),
            pointer_id,
            captured: false,
        });
    }

    fn show_raw_bitmap(&self, canvas_id: &str, width: u32, height: u32, _pixels: &[u8]) {
        self.record(HostCall::ShowRawBitmap {
            canvas_id: canvas_id.to_string(),
            width,
            height,
        });
    }

    fn start_frame_capture(&self, canvas_id: &str) -> bool {
        self.record(HostCall::StartCapture { canvas_id: canvas_id.to_string() });
        self.capture_available.get()
    }

    fn stop_frame_capture(&self) {
        self.record(HostCall::StopCapture);
    }
}

pub fn bridge_with(host: &Rc<RecordingHost>) -> Bridge {
    let host: Rc<dyn BrowserHost> = Rc::clone(host) as Rc<dyn BrowserHost>;
    Bridge::new(host, InteropOptions::default())
}

pub fn ready_bridge() -> (Rc<RecordingHost>, Bridge) {
    let _ = env_logger::builder().is_test(true).try_init();
    let host = Rc::new(RecordingHost::new());
    let bridge = bridge_with(&host);
    block_on(bridge.initialize()).expect("recording host initializes");
    (host, bridge)
}

pub fn connected_canvas(bridge: &Bridge, canvas_id: &str) -> CanvasInterop {
    let canvas = bridge.create_canvas(Some(canvas_id), true);
    assert!(canvas.connect(WebGlOptions::default()).expect("connect"));
    canvas
}
