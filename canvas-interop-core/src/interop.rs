use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::bridge::Bridge;
use crate::error::{InteropError, LifecycleStage, Result};
use crate::events::CanvasEvents;
use crate::handshake::{CanvasHandshake, WebGlVersion};
use crate::host::BrowserHost;
use crate::loader::PendingRequests;
use crate::options::WebGlOptions;
use crate::registry::CanvasKeyed;

/// Mutable per-canvas state, updated by connect, resize and dispose.
#[derive(Debug, Clone, Copy)]
struct CanvasState {
    connected: bool,
    disposed: bool,
    webgl_version: Option<WebGlVersion>,
    width: u32,
    height: u32,
    dpi_scale: f32,
    msaa: bool,
    preserve_drawing_buffer: bool,
    pointer_events_subscribed: bool,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            connected: false,
            disposed: false,
            webgl_version: None,
            width: 0,
            height: 0,
            dpi_scale: 1.0,
            msaa: false,
            preserve_drawing_buffer: false,
            pointer_events_subscribed: false,
        }
    }
}

#[derive(Default)]
struct FrameCapture {
    script_loaded: bool,
    started: bool,
}

struct InteropInner {
    canvas_id: String,
    bridge: Bridge,
    subscribe_pointer_events_on_connect: bool,
    state: Cell<CanvasState>,
    capture: RefCell<FrameCapture>,
    events: CanvasEvents,
    requests: RefCell<PendingRequests>,
}

/// One browser canvas bound to one rendering surface.
///
/// Cheap to clone; clones refer to the same canvas. The instance is
/// registered with its [`Bridge`] on a successful [`connect`](Self::connect)
/// and unregistered by [`dispose`](Self::dispose).
#[derive(Clone)]
pub struct CanvasInterop {
    inner: Rc<InteropInner>,
}

impl CanvasKeyed for CanvasInterop {
    fn canvas_id(&self) -> &str {
        &self.inner.canvas_id
    }
}

impl CanvasInterop {
    pub(crate) fn new(bridge: Bridge, canvas_id: String, subscribe_pointer_events: bool) -> Self {
        Self {
            inner: Rc::new(InteropInner {
                canvas_id,
                bridge,
                subscribe_pointer_events_on_connect: subscribe_pointer_events,
                state: Cell::new(CanvasState::default()),
                capture: RefCell::new(FrameCapture::default()),
                events: CanvasEvents::default(),
                requests: RefCell::new(PendingRequests::default()),
            }),
        }
    }

    pub fn canvas_id(&self) -> &str {
        &self.inner.canvas_id
    }

    pub fn bridge(&self) -> &Bridge {
        &self.inner.bridge
    }

    pub fn events(&self) -> &CanvasEvents {
        &self.inner.events
    }

    pub fn stage(&self) -> LifecycleStage {
        let state = self.inner.state.get();
        if state.disposed {
            LifecycleStage::Disposed
        } else if state.connected {
            LifecycleStage::CanvasConnected
        } else if self.inner.bridge.is_ready() {
            LifecycleStage::InteropReady
        } else {
            LifecycleStage::Uninitialized
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.get().connected
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.get().disposed
    }

    pub fn webgl_version(&self) -> Option<WebGlVersion> {
        self.inner.state.get().webgl_version
    }

    pub fn is_webgl2(&self) -> bool {
        self.webgl_version() == Some(WebGlVersion::WebGl2)
    }

    /// Back buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.inner.state.get().width
    }

    pub fn height(&self) -> u32 {
        self.inner.state.get().height
    }

    pub fn dpi_scale(&self) -> f32 {
        self.inner.state.get().dpi_scale
    }

    pub fn is_using_msaa(&self) -> bool {
        self.inner.state.get().msaa
    }

    pub fn is_preserving_drawing_buffer(&self) -> bool {
        self.inner.state.get().preserve_drawing_buffer
    }

    pub fn are_pointer_events_subscribed(&self) -> bool {
        self.inner.state.get().pointer_events_subscribed
    }

    /// Create the WebGL context for this canvas and register it.
    ///
    /// Returns `Ok(false)` when the browser could not create a context (canvas
    /// missing, WebGL unsupported); the instance then stays unconnected.
    pub fn connect(&self, options: WebGlOptions) -> Result<bool> {
        self.check_stage("connect", LifecycleStage::InteropReady)?;
        if self.is_connected() {
            return Ok(true);
        }
        if self.bridge().find(self.canvas_id()).is_some() {
            return Err(InteropError::DuplicateCanvasId(self.canvas_id().to_string()));
        }

        let subscribe_pointer_events = self.inner.subscribe_pointer_events_on_connect;
        let result = self.host().init_webgl_canvas(
            self.canvas_id(),
            &options,
            subscribe_pointer_events,
            self.bridge().options().log_javascript,
        );

        let handshake = match CanvasHandshake::parse(&result) {
            Ok(handshake) => handshake,
            Err(e) => {
                log::warn!("Error initializing WebGL canvas '{}': {e}", self.canvas_id());
                return Ok(false);
            }
        };

        self.bridge().register(self.clone())?;
        self.update_state(|s| {
            s.connected = true;
            s.webgl_version = Some(handshake.version);
            s.width = handshake.width;
            s.height = handshake.height;
            s.dpi_scale = handshake.dpi_scale;
            s.msaa = options.use_msaa;
            s.preserve_drawing_buffer = options.preserve_drawing_buffer;
            s.pointer_events_subscribed = subscribe_pointer_events;
        });

        log::info!(
            "Initialized WebGL {} for '{}': {} x {}; dpi scale: {}",
            handshake.version.major(),
            self.canvas_id(),
            handshake.width,
            handshake.height,
            handshake.dpi_scale
        );

        self.events().webgl_initialized.fire(self);
        Ok(true)
    }

    pub fn subscribe_pointer_events(&self) -> Result<()> {
        self.check_stage("subscribe_pointer_events", LifecycleStage::CanvasConnected)?;
        self.host().subscribe_browser_events(self.canvas_id(), true, true);
        self.update_state(|s| s.pointer_events_subscribed = true);
        Ok(())
    }

    pub fn unsubscribe_pointer_events(&self) -> Result<()> {
        self.check_stage("unsubscribe_pointer_events", LifecycleStage::CanvasConnected)?;
        self.host().unsubscribe_browser_events(self.canvas_id(), true, false);
        self.update_state(|s| s.pointer_events_subscribed = false);
        Ok(())
    }

    /// Set the CSS cursor of the canvas element (`"pointer"`, `"grab"`, ...).
    pub fn set_cursor_style(&self, cursor_style: &str) -> Result<()> {
        self.check_stage("set_cursor_style", LifecycleStage::CanvasConnected)?;
        self.host().set_cursor_style(self.canvas_id(), cursor_style);
        Ok(())
    }

    pub fn set_pointer_capture(&self, pointer_id: i32) -> Result<()> {
        self.check_stage("set_pointer_capture", LifecycleStage::CanvasConnected)?;
        self.host().set_pointer_capture(self.canvas_id(), pointer_id);
        Ok(())
    }

    pub fn release_pointer_capture(&self, pointer_id: i32) -> Result<()> {
        self.check_stage("release_pointer_capture", LifecycleStage::CanvasConnected)?;
        self.host().release_pointer_capture(self.canvas_id(), pointer_id);
        Ok(())
    }

    /// Blit RGBA pixels into the 2D canvas element `target_canvas_id`.
    pub fn show_raw_bitmap(&self, target_canvas_id: &str, width: u32, height: u32, pixels: &[u8]) -> Result<()> {
        self.check_stage("show_raw_bitmap", LifecycleStage::InteropReady)?;
        self.host().show_raw_bitmap(target_canvas_id, width, height, pixels);
        Ok(())
    }

    /// Start a GPU command capture of this canvas, importing the capture
    /// script on first use. Returns whether the capture is running.
    pub async fn start_frame_capture(&self) -> Result<bool> {
        self.check_stage("start_frame_capture", LifecycleStage::CanvasConnected)?;
        if self.inner.capture.borrow().started {
            return Ok(true);
        }

        let script_loaded = self.inner.capture.borrow().script_loaded;
        if !script_loaded {
            let url = self.bridge().options().frame_capture_script_url.clone();
            self.host()
                .import_script(&url)
                .await
                .map_err(|message| InteropError::LoadFailed { url, message })?;
            self.inner.capture.borrow_mut().script_loaded = true;
        }

        let started = self.host().start_frame_capture(self.canvas_id());
        self.inner.capture.borrow_mut().started = started;
        Ok(started)
    }

    pub fn stop_frame_capture(&self) -> Result<()> {
        self.check_stage("stop_frame_capture", LifecycleStage::CanvasConnected)?;
        let mut capture = self.inner.capture.borrow_mut();
        if capture.started {
            self.host().stop_frame_capture();
            capture.started = false;
        }
        Ok(())
    }

    /// Disconnect from the browser and unregister.
    ///
    /// Outstanding requests are dropped without firing; their URLs go into
    /// the bridge's disposed-request ledger. Disposing twice is an error.
    pub fn dispose(&self) -> Result<()> {
        self.check_not_disposed("dispose")?;

        self.events().disposing.emit(self, &());

        if self.is_connected() {
            self.host().disconnect_webgl_canvas(self.canvas_id());
        }

        let urls = self.inner.requests.borrow_mut().drain_urls();
        if !urls.is_empty() {
            log::debug!("'{}' disposed with {} pending request(s)", self.canvas_id(), urls.len());
            self.bridge().record_disposed_requests(urls);
        }
        self.events().webgl_initialized.clear();

        self.bridge().unregister(self);
        self.update_state(|s| {
            s.connected = false;
            s.pointer_events_subscribed = false;
            s.disposed = true;
        });
        Ok(())
    }

    /// Whether both handles refer to the same canvas instance.
    pub fn same_instance(&self, other: &CanvasInterop) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn host(&self) -> &dyn BrowserHost {
        self.inner.bridge.host()
    }

    pub(crate) fn requests(&self) -> &RefCell<PendingRequests> {
        &self.inner.requests
    }

    /// Store new geometry reported by the browser.
    pub(crate) fn apply_resize(&self, width: f32, height: f32, dpi_scale: f32) {
        self.update_state(|s| {
            s.width = width.max(0.0) as u32;
            s.height = height.max(0.0) as u32;
            s.dpi_scale = dpi_scale;
        });
    }

    fn update_state(&self, f: impl FnOnce(&mut CanvasState)) {
        let mut state = self.inner.state.get();
        f(&mut state);
        self.inner.state.set(state);
    }

    pub(crate) fn check_not_disposed(&self, method: &'static str) -> Result<()> {
        if self.is_disposed() {
            return Err(InteropError::Disposed { method });
        }
        Ok(())
    }

    /// Fail unless `required` (or a later live stage) was reached.
    pub(crate) fn check_stage(&self, method: &'static str, required: LifecycleStage) -> Result<()> {
        self.check_not_disposed(method)?;
        if !self.inner.bridge.is_ready() {
            return Err(InteropError::NotReady {
                method,
                required: LifecycleStage::InteropReady,
            });
        }
        if required == LifecycleStage::CanvasConnected && !self.is_connected() {
            return Err(InteropError::NotReady { method, required });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bridge_with, connected_canvas, ready_bridge, HostCall, RecordingHost};
    use futures::executor::block_on;

    #[test]
    fn test_connect_requires_ready_bridge() {
        let host = Rc::new(RecordingHost::new());
        let bridge = bridge_with(&host);
        let canvas = bridge.create_canvas(Some("c1"), true);
        assert_eq!(canvas.stage(), LifecycleStage::Uninitialized);

        let err = canvas.connect(WebGlOptions::default()).unwrap_err();
        assert_eq!(
            err,
            InteropError::NotReady {
                method: "connect",
                required: LifecycleStage::InteropReady
            }
        );
        assert!(err.to_string().contains("connect"));
    }

    #[test]
    fn test_connect_applies_handshake() {
        let (host, bridge) = ready_bridge();
        let canvas = bridge.create_canvas(Some("c1"), false);
        assert_eq!(canvas.stage(), LifecycleStage::InteropReady);

        let options = WebGlOptions {
            use_msaa: false,
            preserve_drawing_buffer: true,
            ..Default::default()
        };
        assert!(canvas.connect(options).unwrap());
        assert_eq!(canvas.stage(), LifecycleStage::CanvasConnected);
        assert!(canvas.is_webgl2());
        assert_eq!((canvas.width(), canvas.height(), canvas.dpi_scale()), (800, 600, 1.5));
        assert!(!canvas.is_using_msaa());
        assert!(canvas.is_preserving_drawing_buffer());
        assert!(!canvas.are_pointer_events_subscribed());
        assert_eq!(bridge.primary().map(|c| c.canvas_id().to_string()), Some("c1".into()));

        // Connecting again is a no-op.
        assert!(canvas.connect(WebGlOptions::default()).unwrap());
        assert_eq!(host.count(|c| matches!(c, HostCall::InitWebGl { .. })), 1);
    }

    #[test]
    fn test_rejected_handshake_leaves_canvas_unconnected() {
        let (host, bridge) = ready_bridge();
        host.set_handshake("Canvas not found: nope");
        let canvas = bridge.create_canvas(Some("nope"), true);

        assert!(!canvas.connect(WebGlOptions::default()).unwrap());
        assert_eq!(canvas.stage(), LifecycleStage::InteropReady);
        assert!(bridge.find("nope").is_none());
        assert_eq!(
            canvas.set_cursor_style("grab"),
            Err(InteropError::NotReady {
                method: "set_cursor_style",
                required: LifecycleStage::CanvasConnected
            })
        );
    }

    #[test]
    fn test_duplicate_canvas_id_is_rejected() {
        let (_host, bridge) = ready_bridge();
        let _first = connected_canvas(&bridge, "dup");
        let second = bridge.create_canvas(Some("dup"), true);
        assert_eq!(
            second.connect(WebGlOptions::default()),
            Err(InteropError::DuplicateCanvasId("dup".into()))
        );
        assert!(!second.is_connected());
    }

    #[test]
    fn test_disposing_rejected_duplicate_keeps_live_canvas() {
        let (host, bridge) = ready_bridge();
        let live = connected_canvas(&bridge, "dup");
        let duplicate = bridge.create_canvas(Some("dup"), true);
        assert!(duplicate.connect(WebGlOptions::default()).is_err());

        duplicate.dispose().unwrap();
        assert!(live.is_connected());
        assert!(bridge.find("dup").is_some_and(|c| c.same_instance(&live)));
        assert_eq!(host.count(|c| matches!(c, HostCall::Disconnect { .. })), 0);
    }

    #[test]
    fn test_connected_operations_reach_host() {
        let (host, bridge) = ready_bridge();
        let canvas = connected_canvas(&bridge, "c1");

        canvas.set_cursor_style("pointer").unwrap();
        canvas.set_pointer_capture(3).unwrap();
        canvas.release_pointer_capture(3).unwrap();
        canvas.unsubscribe_pointer_events().unwrap();
        assert!(!canvas.are_pointer_events_subscribed());
        canvas.subscribe_pointer_events().unwrap();
        assert!(canvas.are_pointer_events_subscribed());
        canvas.show_raw_bitmap("preview", 2, 1, &[0; 8]).unwrap();

        let calls = host.calls();
        assert!(calls.contains(&HostCall::CursorStyle {
            canvas_id: "c1".into(),
            style: "pointer".into()
        }));
        assert!(calls.contains(&HostCall::PointerCapture {
            canvas_id: "c1".into(),
            pointer_id: 3,
            captured: false
        }));
        assert!(calls.contains(&HostCall::ShowRawBitmap {
            canvas_id: "preview".into(),
            width: 2,
            height: 1
        }));
    }

    #[test]
    fn test_dispose_promotes_next_canvas() {
        let (host, bridge) = ready_bridge();
        let first = connected_canvas(&bridge, "a");
        let _second = connected_canvas(&bridge, "b");

        let disposing = Rc::new(Cell::new(false));
        let flag = Rc::clone(&disposing);
        first.events().disposing.add(move |sender, _| {
            assert!(sender.is_connected());
            flag.set(true);
        });

        first.dispose().unwrap();
        assert!(disposing.get());
        assert_eq!(first.stage(), LifecycleStage::Disposed);
        assert_eq!(bridge.primary().map(|c| c.canvas_id().to_string()), Some("b".into()));
        assert!(host.calls().contains(&HostCall::Disconnect { canvas_id: "a".into() }));
    }

    #[test]
    fn test_double_dispose_is_an_error() {
        let (_host, bridge) = ready_bridge();
        let canvas = connected_canvas(&bridge, "c1");
        canvas.dispose().unwrap();
        assert_eq!(canvas.dispose(), Err(InteropError::Disposed { method: "dispose" }));
        assert_eq!(
            canvas.connect(WebGlOptions::default()),
            Err(InteropError::Disposed { method: "connect" })
        );
    }

    #[test]
    fn test_dispose_before_connect_drops_deferred_work() {
        let (host, bridge) = ready_bridge();
        let canvas = bridge.create_canvas(Some("c1"), true);
        canvas.load_text_file("a.txt", |_| {}, |_| {}).unwrap();
        canvas.dispose().unwrap();
        assert!(canvas.events().webgl_initialized.is_empty());
        assert_eq!(host.count(|c| matches!(c, HostCall::Disconnect { .. })), 0);
    }

    #[test]
    fn test_frame_capture_loads_script_once() {
        let (host, bridge) = ready_bridge();
        let canvas = connected_canvas(&bridge, "c1");

        assert!(block_on(canvas.start_frame_capture()).unwrap());
        assert!(block_on(canvas.start_frame_capture()).unwrap());
        canvas.stop_frame_capture().unwrap();
        assert!(block_on(canvas.start_frame_capture()).unwrap());

        assert_eq!(host.count(|c| matches!(c, HostCall::ImportScript { .. })), 1);
        assert_eq!(host.count(|c| matches!(c, HostCall::StartCapture { .. })), 2);
        assert_eq!(host.count(|c| *c == HostCall::StopCapture), 1);
    }

    #[test]
    fn test_frame_capture_script_failure() {
        let (host, bridge) = ready_bridge();
        host.fail_script("blocked");
        let canvas = connected_canvas(&bridge, "c1");
        let err = block_on(canvas.start_frame_capture()).unwrap_err();
        assert!(matches!(err, InteropError::LoadFailed { .. }));
        assert_eq!(host.count(|c| matches!(c, HostCall::StartCapture { .. })), 0);
    }

    #[test]
    fn test_frame_capture_without_library() {
        let (host, bridge) = ready_bridge();
        host.set_capture_available(false);
        let canvas = connected_canvas(&bridge, "c1");
        assert!(!block_on(canvas.start_frame_capture()).unwrap());
        canvas.stop_frame_capture().unwrap();
        assert_eq!(host.count(|c| *c == HostCall::StopCapture), 0);
    }
}
