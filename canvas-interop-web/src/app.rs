use std::cell::{Cell, RefCell};
use std::rc::Rc;

use canvas_interop_core::{CanvasInterop, WebGlOptions};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::input::InputState;

/// Demo application: one connected canvas feeding an [`InputState`].
#[wasm_bindgen]
pub struct App {
    canvas: CanvasInterop,
    input: Rc<RefCell<InputState>>,
    ticks: Rc<Cell<u32>>,
    last_time: f64,
}

#[wasm_bindgen]
impl App {
    /// Initialize the bridge if needed and connect `canvas_id`.
    pub async fn connect(canvas_id: String) -> Result<App, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let document = window.document().ok_or("No document")?;
        document
            .get_element_by_id(&canvas_id)
            .ok_or("Canvas not found")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| "Element is not a canvas")?;

        crate::initialize(None).await?;
        let bridge = crate::bridge().ok_or("Canvas interop bridge missing")?;

        let canvas = bridge.create_canvas(Some(&canvas_id), true);
        let input = Rc::new(RefCell::new(InputState::new()));
        let ticks = Rc::new(Cell::new(0));
        subscribe_input(&canvas, &input, &ticks);

        let connected = canvas
            .connect(WebGlOptions::default())
            .map_err(|e| JsError::new(&e.to_string()))?;
        if !connected {
            canvas.dispose().map_err(|e| JsError::new(&e.to_string()))?;
            return Err(JsValue::from_str(&format!("WebGL could not be initialized for '{canvas_id}'")));
        }

        log::info!(
            "Connected '{}': WebGL {}, {} x {}",
            canvas_id,
            canvas.webgl_version().map_or(0, |v| v.major()),
            canvas.width(),
            canvas.height(),
        );

        Ok(App {
            canvas,
            input,
            ticks,
            last_time: 0.0,
        })
    }

    /// Run one frame. Returns the elapsed time in seconds.
    pub fn frame(&mut self, time: f64) -> f64 {
        let dt = if self.last_time > 0.0 {
            (time - self.last_time) / 1000.0
        } else {
            0.016 // ~60fps first frame
        };
        self.last_time = time;
        self.input.borrow_mut().update();
        dt
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    #[wasm_bindgen(getter)]
    pub fn pointer_x(&self) -> f32 {
        self.input.borrow().position.x
    }

    #[wasm_bindgen(getter)]
    pub fn pointer_y(&self) -> f32 {
        self.input.borrow().position.y
    }

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f32 {
        self.input.borrow().zoom
    }

    /// Animation frame ticks received from the browser.
    #[wasm_bindgen(getter)]
    pub fn ticks(&self) -> u32 {
        self.ticks.get()
    }

    pub fn dispose(&self) -> Result<(), JsValue> {
        self.canvas
            .dispose()
            .map_err(|e| JsError::new(&e.to_string()).into())
    }
}

fn subscribe_input(canvas: &CanvasInterop, input: &Rc<RefCell<InputState>>, ticks: &Rc<Cell<u32>>) {
    let events = canvas.events();

    let state = Rc::clone(input);
    events.pointer_down.add(move |_, e| state.borrow_mut().on_pointer_button(e));
    let state = Rc::clone(input);
    events.pointer_up.add(move |_, e| state.borrow_mut().on_pointer_button(e));
    let state = Rc::clone(input);
    events.pointer_moved.add(move |_, e| state.borrow_mut().on_pointer_moved(e));
    let state = Rc::clone(input);
    events.wheel.add(move |_, e| state.borrow_mut().on_wheel(e));
    let state = Rc::clone(input);
    events.pinch_started.add(move |_, e| state.borrow_mut().on_pinch_started(e));
    let state = Rc::clone(input);
    events.pinch_updated.add(move |_, e| state.borrow_mut().on_pinch_updated(e));
    let state = Rc::clone(input);
    events.pinch_ended.add(move |_, _| state.borrow_mut().on_pinch_ended());

    let count = Rc::clone(ticks);
    events.animation_frame.add(move |_, _| count.set(count.get().wrapping_add(1)));

    events.resized.add(|sender, e| {
        log::debug!("'{}' resized to {} x {}", sender.canvas_id(), e.width, e.height);
    });
    events.context_lost.add(|sender, _| {
        log::warn!("'{}' lost its WebGL context", sender.canvas_id());
    });
}
