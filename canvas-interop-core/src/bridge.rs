use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;

use crate::error::{InteropError, Result};
use crate::host::BrowserHost;
use crate::interop::CanvasInterop;
use crate::ledger::DisposedRequestLedger;
use crate::options::InteropOptions;
use crate::registry::{next_canvas_id, CanvasRegistry};

/// Progress of the one-time bridge setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteropStage {
    Uninitialized,
    Initializing,
    Ready,
}

struct BridgeInner {
    host: Rc<dyn BrowserHost>,
    options: InteropOptions,
    stage: RefCell<InteropStage>,
    init_waiters: RefCell<Vec<oneshot::Sender<Result<()>>>>,
    registry: RefCell<CanvasRegistry<CanvasInterop>>,
    ledger: RefCell<DisposedRequestLedger>,
}

/// Shared state of the interop bridge: the browser host, the canvas registry
/// and the disposed-request ledger.
///
/// All access happens on the browser's single thread; clones share the same
/// state.
#[derive(Clone)]
pub struct Bridge {
    inner: Rc<BridgeInner>,
}

impl Bridge {
    pub fn new(host: Rc<dyn BrowserHost>, options: InteropOptions) -> Self {
        let ledger = DisposedRequestLedger::new(options.disposed_ledger_capacity);
        Self {
            inner: Rc::new(BridgeInner {
                host,
                options,
                stage: RefCell::new(InteropStage::Uninitialized),
                init_waiters: RefCell::new(Vec::new()),
                registry: RefCell::new(CanvasRegistry::new()),
                ledger: RefCell::new(ledger),
            }),
        }
    }

    /// Import the browser module and run the interop handshake.
    ///
    /// Idempotent: once ready, later calls return immediately. Calls made
    /// while another initialization is in flight wait for its outcome. A
    /// failure leaves the bridge uninitialized so the call can be retried.
    pub async fn initialize(&self) -> Result<()> {
        let current = *self.inner.stage.borrow();
        match current {
            InteropStage::Ready => return Ok(()),
            InteropStage::Initializing => {
                let (tx, rx) = oneshot::channel();
                self.inner.init_waiters.borrow_mut().push(tx);
                return rx.await.unwrap_or_else(|_| {
                    Err(InteropError::InitializationFailed(
                        "initialization was abandoned".to_string(),
                    ))
                });
            }
            InteropStage::Uninitialized => {}
        }

        *self.inner.stage.borrow_mut() = InteropStage::Initializing;
        log::info!("Initializing canvas interop from '{}'", self.inner.options.module_url);

        let mut guard = InitGuard {
            bridge: self,
            finished: false,
        };
        let result = self.run_setup().await;
        guard.finished = true;

        *self.inner.stage.borrow_mut() = match result {
            Ok(()) => InteropStage::Ready,
            Err(_) => InteropStage::Uninitialized,
        };
        match &result {
            Ok(()) => log::info!("Canvas interop initialized"),
            Err(e) => log::error!("{e}"),
        }

        let waiters = std::mem::take(&mut *self.inner.init_waiters.borrow_mut());
        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
        result
    }

    async fn run_setup(&self) -> Result<()> {
        let url = self.inner.options.module_url.clone();
        self.inner
            .host
            .import_module(&url)
            .await
            .map_err(|message| InteropError::from_module_import(&url, message))?;

        self.inner
            .host
            .init_interop()
            .await
            .map_err(InteropError::InitializationFailed)
    }

    pub fn stage(&self) -> InteropStage {
        *self.inner.stage.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.stage() == InteropStage::Ready
    }

    pub fn options(&self) -> &InteropOptions {
        &self.inner.options
    }

    pub(crate) fn host(&self) -> &dyn BrowserHost {
        self.inner.host.as_ref()
    }

    /// Create an unconnected interop object. `None` generates a
    /// `sharpEngineCanvas_{N}` id.
    pub fn create_canvas(&self, canvas_id: Option<&str>, subscribe_pointer_events: bool) -> CanvasInterop {
        let canvas_id = canvas_id.map_or_else(next_canvas_id, str::to_string);
        CanvasInterop::new(self.clone(), canvas_id, subscribe_pointer_events)
    }

    pub fn find(&self, canvas_id: &str) -> Option<CanvasInterop> {
        self.inner.registry.borrow().find(canvas_id).cloned()
    }

    pub fn primary(&self) -> Option<CanvasInterop> {
        self.inner.registry.borrow().primary().cloned()
    }

    /// Every connected canvas, primary first.
    pub fn canvases(&self) -> Vec<CanvasInterop> {
        self.inner.registry.borrow().iter().cloned().collect()
    }

    pub(crate) fn register(&self, canvas: CanvasInterop) -> Result<()> {
        self.inner.registry.borrow_mut().register(canvas)
    }

    /// Remove `canvas` only if it is the instance registered under its id.
    pub(crate) fn unregister(&self, canvas: &CanvasInterop) -> bool {
        let mut registry = self.inner.registry.borrow_mut();
        let registered = registry
            .find(canvas.canvas_id())
            .is_some_and(|live| live.same_instance(canvas));
        registered && registry.unregister(canvas.canvas_id()).is_some()
    }

    pub(crate) fn record_disposed_requests(&self, urls: Vec<String>) {
        let mut ledger = self.inner.ledger.borrow_mut();
        for url in urls {
            ledger.record(url);
        }
    }

    pub(crate) fn consume_disposed_request(&self, url: &str) -> bool {
        self.inner.ledger.borrow_mut().consume(url)
    }

    pub fn disposed_request_count(&self) -> usize {
        self.inner.ledger.borrow().len()
    }
}

/// Rolls an in-flight initialization back when its future is dropped.
struct InitGuard<'a> {
    bridge: &'a Bridge,
    finished: bool,
}

impl Drop for InitGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        log::warn!("Canvas interop initialization was cancelled");
        *self.bridge.inner.stage.borrow_mut() = InteropStage::Uninitialized;
        // Dropping the senders fails every waiter.
        self.bridge.inner.init_waiters.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bridge_with, RecordingHost};
    use futures::executor::block_on;

    #[test]
    fn test_initialize_is_idempotent() {
        let host = Rc::new(RecordingHost::new());
        let bridge = bridge_with(&host);
        block_on(bridge.initialize()).unwrap();
        block_on(bridge.initialize()).unwrap();
        assert!(bridge.is_ready());
        assert_eq!(host.import_calls(), 1);
    }

    #[test]
    fn test_failed_import_allows_retry() {
        let host = Rc::new(RecordingHost::new());
        host.fail_import("TypeError: Failed to fetch dynamically imported module: x");
        let bridge = bridge_with(&host);

        let err = block_on(bridge.initialize()).unwrap_err();
        assert!(matches!(err, InteropError::ModuleNotFound { .. }));
        assert_eq!(bridge.stage(), InteropStage::Uninitialized);

        host.clear_failures();
        block_on(bridge.initialize()).unwrap();
        assert!(bridge.is_ready());
        assert_eq!(host.import_calls(), 2);
    }

    #[test]
    fn test_failed_handshake_is_initialization_error() {
        let host = Rc::new(RecordingHost::new());
        host.fail_init("exports missing");
        let bridge = bridge_with(&host);
        let err = block_on(bridge.initialize()).unwrap_err();
        assert_eq!(err, InteropError::InitializationFailed("exports missing".into()));
        assert!(!bridge.is_ready());
    }

    #[test]
    fn test_concurrent_initialize_shares_outcome() {
        let host = Rc::new(RecordingHost::new());
        host.hold_init();
        let bridge = bridge_with(&host);

        let release = Rc::clone(&host);
        let (a, b, ()) = block_on(async {
            futures::join!(bridge.initialize(), bridge.initialize(), async {
                release.release_init();
            })
        });
        assert_eq!(a, Ok(()));
        assert_eq!(b, Ok(()));
        assert_eq!(host.import_calls(), 1);
    }

    #[test]
    fn test_cancelled_initialize_allows_retry() {
        let host = Rc::new(RecordingHost::new());
        host.hold_init();
        let bridge = bridge_with(&host);

        block_on(async {
            let mut first = Box::pin(bridge.initialize());
            let mut second = Box::pin(bridge.initialize());
            assert!(futures::poll!(first.as_mut()).is_pending());
            assert!(futures::poll!(second.as_mut()).is_pending());
            assert_eq!(bridge.stage(), InteropStage::Initializing);

            drop(first);
            assert_eq!(bridge.stage(), InteropStage::Uninitialized);
            assert!(matches!(second.await, Err(InteropError::InitializationFailed(_))));
        });

        host.release_init();
        block_on(bridge.initialize()).unwrap();
        assert!(bridge.is_ready());
        assert_eq!(host.import_calls(), 2);
    }

    #[test]
    fn test_create_canvas_generates_ids() {
        let host = Rc::new(RecordingHost::new());
        let bridge = bridge_with(&host);
        let a = bridge.create_canvas(None, true);
        let b = bridge.create_canvas(None, true);
        assert!(a.canvas_id().starts_with("sharpEngineCanvas_"));
        assert_ne!(a.canvas_id(), b.canvas_id());
        assert_eq!(bridge.create_canvas(Some("mine"), false).canvas_id(), "mine");
    }
}
