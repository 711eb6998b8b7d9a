//! Normalization of host input callbacks into the internal event queue.
//!
//! The host binding layer (DOM glue, a windowing shell, a test harness)
//! calls one [`InputBridge`] method per host callback; the bridge converts
//! the heterogeneous callback shapes into [`InputEvent`] values and queues
//! them. The frame renderer drains the queue once at the start of each
//! tick, applying events in strict arrival order exactly once.
//!
//! Pointer coordinates are translated from host viewport space into
//! canvas-local space using the canvas bounding rectangle captured at
//! event-handling time, since layout or scrolling can move the canvas
//! between events.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::host::CanvasRect;

/// Modifier-key flags accompanying pointer and key events.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    /// Alt / Option.
    pub alt: bool,
    /// Control.
    pub ctrl: bool,
    /// Shift.
    pub shift: bool,
    /// Meta on mac, Windows key elsewhere.
    pub command: bool,
}

/// Pointer button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Auxiliary (wheel) button.
    Middle,
    /// Secondary button.
    Right,
}

/// Keyboard key identifier, normalized from host key strings/codes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[allow(missing_docs)] // Variant names are the documentation.
pub enum Key {
    ArrowDown, ArrowLeft, ArrowRight, ArrowUp,
    Escape, Tab, Backspace, Enter, Space,
    Insert, Delete, Home, End, PageUp, PageDown,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    /// Host key not represented above, carrying its platform code.
    Unknown(u32),
}

/// A normalized host event, consumed once by the renderer at the start of
/// the frame tick following its arrival.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer moved; coordinates are canvas-local logical pixels.
    PointerMove {
        /// Canvas-local x.
        x: f32,
        /// Canvas-local y.
        y: f32,
        /// Movement since the previous pointer event.
        delta_x: f32,
        /// Movement since the previous pointer event.
        delta_y: f32,
        /// Modifier flags at event time.
        modifiers: Modifiers,
    },
    /// Pointer button pressed.
    PointerDown {
        /// Canvas-local x.
        x: f32,
        /// Canvas-local y.
        y: f32,
        /// Which button.
        button: MouseButton,
        /// Modifier flags at event time.
        modifiers: Modifiers,
    },
    /// Pointer button released.
    PointerUp {
        /// Canvas-local x.
        x: f32,
        /// Canvas-local y.
        y: f32,
        /// Which button.
        button: MouseButton,
        /// Modifier flags at event time.
        modifiers: Modifiers,
    },
    /// Wheel or two-finger scroll, normalized across platforms.
    Wheel {
        /// Horizontal scroll steps.
        delta_x: f32,
        /// Vertical scroll steps; positive zooms in.
        delta_y: f32,
        /// Modifier flags at event time.
        modifiers: Modifiers,
    },
    /// Key pressed.
    KeyDown {
        /// Normalized key identifier.
        key: Key,
        /// Modifier flags at event time.
        modifiers: Modifiers,
    },
    /// Key released.
    KeyUp {
        /// Normalized key identifier.
        key: Key,
        /// Modifier flags at event time.
        modifiers: Modifiers,
    },
    /// Canvas observed size or pixel ratio changed. Coalesced: only the
    /// last resize pending before a tick takes effect.
    Resize {
        /// New observed width in logical pixels.
        width: u32,
        /// New observed height in logical pixels.
        height: u32,
        /// Device pixel ratio at event time.
        pixel_ratio: f64,
    },
    /// Document/page visibility changed.
    VisibilityChange {
        /// Whether the canvas is now visible.
        visible: bool,
    },
    /// Clipboard text pasted onto the canvas.
    Paste {
        /// The pasted text.
        text: String,
    },
    /// A file was dropped onto the canvas.
    Drop {
        /// Host-reported file name.
        name: String,
        /// Opaque file contents.
        bytes: Vec<u8>,
    },
}

struct BridgeState {
    queue: VecDeque<InputEvent>,
    attached: bool,
    last_pointer: Option<(f32, f32)>,
}

/// Handle the host binding layer uses to feed events to the viewer.
///
/// Cheap to clone; all clones share one queue. The bridge is attached on
/// `start` and detached on `destroy`; events pushed while detached are
/// dropped, so a late host callback can never reach a destroyed renderer.
#[derive(Clone)]
pub struct InputBridge {
    shared: Rc<RefCell<BridgeState>>,
}

impl InputBridge {
    pub(crate) fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(BridgeState {
                queue: VecDeque::new(),
                attached: false,
                last_pointer: None,
            })),
        }
    }

    pub(crate) fn attach(&self) {
        let mut state = self.shared.borrow_mut();
        state.attached = true;
        state.queue.clear();
        state.last_pointer = None;
    }

    pub(crate) fn detach(&self) {
        let mut state = self.shared.borrow_mut();
        state.attached = false;
        state.queue.clear();
    }

    /// Remove and return all queued events in arrival order.
    pub(crate) fn drain(&self) -> Vec<InputEvent> {
        self.shared.borrow_mut().queue.drain(..).collect()
    }

    fn push(&self, event: InputEvent) {
        let mut state = self.shared.borrow_mut();
        if state.attached {
            state.queue.push_back(event);
        } else {
            log::debug!("dropping host event for detached bridge: {event:?}");
        }
    }

    /// Host pointer-move callback; `x`/`y` are in host viewport space.
    pub fn pointer_moved(&self, rect: &CanvasRect, x: f32, y: f32, modifiers: Modifiers) {
        let (cx, cy) = to_canvas_local(rect, x, y);
        let (delta_x, delta_y) = {
            let mut state = self.shared.borrow_mut();
            let delta = match state.last_pointer {
                Some((px, py)) => (cx - px, cy - py),
                None => (0.0, 0.0),
            };
            state.last_pointer = Some((cx, cy));
            delta
        };
        self.push(InputEvent::PointerMove {
            x: cx,
            y: cy,
            delta_x,
            delta_y,
            modifiers,
        });
    }

    /// Host pointer-down callback; `x`/`y` are in host viewport space.
    pub fn pointer_pressed(
        &self,
        rect: &CanvasRect,
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    ) {
        let (cx, cy) = to_canvas_local(rect, x, y);
        self.shared.borrow_mut().last_pointer = Some((cx, cy));
        self.push(InputEvent::PointerDown {
            x: cx,
            y: cy,
            button,
            modifiers,
        });
    }

    /// Host pointer-up callback; `x`/`y` are in host viewport space.
    pub fn pointer_released(
        &self,
        rect: &CanvasRect,
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    ) {
        let (cx, cy) = to_canvas_local(rect, x, y);
        self.push(InputEvent::PointerUp {
            x: cx,
            y: cy,
            button,
            modifiers,
        });
    }

    /// Host wheel callback. Raw deltas are normalized to scroll steps,
    /// since each platform reports its own magnitude for one notch.
    pub fn wheel(&self, delta_x: f32, delta_y: f32, modifiers: Modifiers) {
        let step = |value: f32| if value.abs() < 1e-6 { 0.0 } else { value.signum() * 3.0 };
        self.push(InputEvent::Wheel {
            delta_x: step(delta_x),
            delta_y: step(delta_y),
            modifiers,
        });
    }

    /// Host key-down callback.
    pub fn key_pressed(&self, key: Key, modifiers: Modifiers) {
        self.push(InputEvent::KeyDown { key, modifiers });
    }

    /// Host key-up callback.
    pub fn key_released(&self, key: Key, modifiers: Modifiers) {
        self.push(InputEvent::KeyUp { key, modifiers });
    }

    /// Host resize-observer callback with the new observed size.
    pub fn resized(&self, width: u32, height: u32, pixel_ratio: f64) {
        self.push(InputEvent::Resize {
            width,
            height,
            pixel_ratio,
        });
    }

    /// Host visibility-change callback.
    pub fn visibility_changed(&self, visible: bool) {
        self.push(InputEvent::VisibilityChange { visible });
    }

    /// Host clipboard-paste callback.
    pub fn pasted(&self, text: String) {
        self.push(InputEvent::Paste { text });
    }

    /// Host file-drop callback with the dropped payload.
    pub fn file_dropped(&self, name: String, bytes: Vec<u8>) {
        self.push(InputEvent::Drop { name, bytes });
    }
}

fn to_canvas_local(rect: &CanvasRect, x: f32, y: f32) -> (f32, f32) {
    (x - rect.left, y - rect.top)
}
