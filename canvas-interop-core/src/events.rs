use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::interop::CanvasInterop;
use crate::pointer::{
    CanvasResizedEvent, PinchEvent, PointerButtonEvent, PointerMoveEvent, WheelEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler<E> = Rc<dyn Fn(&CanvasInterop, &E)>;

/// Multicast handler list for one event kind.
///
/// `emit` iterates over a snapshot, so handlers may subscribe, unsubscribe or
/// call back into the instance while the event is being delivered.
pub struct EventHandlers<E> {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(HandlerId, Handler<E>)>>,
}

impl<E> EventHandlers<E> {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            handlers: RefCell::new(Vec::new()),
        }
    }

    pub fn add(&self, handler: impl Fn(&CanvasInterop, &E) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    pub fn remove(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }

    pub fn emit(&self, sender: &CanvasInterop, event: &E) {
        let snapshot: Vec<Handler<E>> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in snapshot {
            handler(sender, event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }
}

impl<E> Default for EventHandlers<E> {
    fn default() -> Self {
        Self::new()
    }
}

type OneShotHandler = Box<dyn FnOnce(&CanvasInterop)>;

/// Handlers that run at most once. The list is taken before the first handler
/// runs, so handlers added during `fire` wait for the next one.
#[derive(Default)]
pub struct OneShot {
    handlers: RefCell<Vec<OneShotHandler>>,
}

impl OneShot {
    pub fn add(&self, handler: impl FnOnce(&CanvasInterop) + 'static) {
        self.handlers.borrow_mut().push(Box::new(handler));
    }

    pub fn fire(&self, sender: &CanvasInterop) {
        let handlers = std::mem::take(&mut *self.handlers.borrow_mut());
        for handler in handlers {
            handler(sender);
        }
    }

    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.handlers.borrow_mut());
        drop(dropped);
    }

    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }
}

/// Every event a connected canvas can raise.
#[derive(Default)]
pub struct CanvasEvents {
    pub pointer_down: EventHandlers<PointerButtonEvent>,
    pub pointer_up: EventHandlers<PointerButtonEvent>,
    pub pointer_moved: EventHandlers<PointerMoveEvent>,
    pub wheel: EventHandlers<WheelEvent>,
    pub pinch_started: EventHandlers<PinchEvent>,
    pub pinch_updated: EventHandlers<PinchEvent>,
    pub pinch_ended: EventHandlers<()>,
    pub resized: EventHandlers<CanvasResizedEvent>,
    pub context_lost: EventHandlers<()>,
    pub animation_frame: EventHandlers<()>,
    pub disposing: EventHandlers<()>,
    /// Fired once after a successful connect.
    pub webgl_initialized: OneShot,
}
