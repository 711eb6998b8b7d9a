//! The application handle the host embeds.
//!
//! [`App`] ties the host seam, the input bridge, and the frame renderer
//! together and owns the animation-frame scheduling loop. Its `tick` is
//! the only code the host's frame callback runs, and a panic anywhere
//! inside it is caught at that boundary, recorded as the fault, and never
//! unwinds into the host.
//!
//! Lifecycle: `new` allocates a detached handle; the async `start`
//! acquires the context, optionally fetches the initial scene asset, and
//! schedules the first frame; `destroy` tears everything down and is valid
//! from any state. After a crash the handle stays inspectable through
//! `has_panicked`/`panic_message`/`panic_callstack`; recovery means
//! `destroy` followed by a fresh `start`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::Error;
use crate::host::{FrameRequest, HostWindow};
use crate::input::InputBridge;
use crate::render::{FrameRenderer, Phase};

/// Startup configuration for an [`App`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// URL of the initial scene asset to fetch on `start`, if any.
    pub scene_url: Option<String>,
    /// Clear color for the canvas (linear RGBA).
    pub clear_color: [f32; 4],
    /// Upper bound on the honored device pixel ratio, so very dense
    /// displays do not quadruple the fill cost.
    pub max_pixel_ratio: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scene_url: None,
            clear_color: [0.12, 0.12, 0.12, 1.0],
            max_pixel_ratio: 2.0,
        }
    }
}

/// A recorded structural failure or caught panic.
struct Fault {
    message: String,
    callstack: Option<String>,
}

/// The embedder-facing handle over one canvas.
pub struct App<H: HostWindow> {
    host: H,
    config: AppConfig,
    renderer: Option<FrameRenderer<H::Gl>>,
    bridge: InputBridge,
    fault: Option<Fault>,
    pending_frame: Option<FrameRequest>,
}

impl<H: HostWindow> App<H> {
    /// Allocate a handle over `host`. No graphics work happens until
    /// [`start`](Self::start).
    pub fn new(host: H, config: AppConfig) -> Self {
        Self {
            host,
            config,
            renderer: None,
            bridge: InputBridge::new(),
            fault: None,
            pending_frame: None,
        }
    }

    /// The input bridge the host binding layer should feed its callbacks
    /// into. Cheap to clone.
    pub fn bridge(&self) -> InputBridge {
        self.bridge.clone()
    }

    /// Acquire the graphics context, fetch the initial scene asset if one
    /// is configured, and schedule the first frame.
    ///
    /// Calling `start` on a handle that is already running is a logged
    /// no-op. After `destroy` (or a crash followed by `destroy`) the
    /// handle can be started again from scratch.
    ///
    /// # Errors
    /// [`Error::HostCall`] if the context cannot be acquired (the handle
    /// is crashed afterwards) or the scene fetch fails (the handle stays
    /// startable).
    pub async fn start(&mut self) -> Result<(), Error> {
        if self
            .renderer
            .as_ref()
            .is_some_and(|r| r.phase() == Phase::Running)
        {
            log::warn!("start called on a running handle; ignoring");
            return Ok(());
        }
        self.fault = None;

        // A crashed or destroyed session may still own host GL objects;
        // reclaim them before building the replacement.
        if let Some(mut renderer) = self.renderer.take() {
            renderer.destroy();
        }

        let gl = match self.host.acquire_gl() {
            Ok(gl) => gl,
            Err(err) => {
                log::error!("context acquisition failed: {err}");
                self.fault = Some(Fault {
                    message: err.to_string(),
                    callstack: None,
                });
                return Err(err);
            }
        };

        // A failed fetch is a startup error, not a crash: the context was
        // never touched, so the caller may simply retry start.
        let scene_payload = match self.config.scene_url.clone() {
            Some(url) => match self.host.fetch(&url).await {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    log::warn!("scene fetch from {url} failed: {err}");
                    return Err(err);
                }
            },
            None => None,
        };

        let mut renderer = FrameRenderer::new(
            gl,
            self.host.canvas_size(),
            self.host.device_pixel_ratio(),
            self.config.clear_color,
            self.config.max_pixel_ratio,
        );
        renderer.initialize();
        if let Some(bytes) = scene_payload {
            renderer.load_scene(bytes);
        }
        self.renderer = Some(renderer);
        self.bridge.attach();

        match self.host.request_frame() {
            Ok(request) => self.pending_frame = Some(request),
            Err(err) => {
                log::error!("first frame request failed: {err}");
                self.fault = Some(Fault {
                    message: err.to_string(),
                    callstack: None,
                });
                if let Some(renderer) = &mut self.renderer {
                    renderer.crash();
                }
                return Err(err);
            }
        }

        let (width, height) = self.host.canvas_size();
        log::info!("viewer started at {width}x{height}");
        Ok(())
    }

    /// Run one frame. Invoked by the host's animation-frame callback.
    ///
    /// Recoverable errors log a warning and keep the loop alive;
    /// structural errors and panics record the fault, stop the loop, and
    /// leave the handle in the crashed state. Never unwinds.
    pub fn tick(&mut self) {
        self.pending_frame = None;
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        if renderer.phase() != Phase::Running {
            return;
        }

        let events = self.bridge.drain();
        let now_ms = self.host.now_ms();

        let outcome = catch_unwind(AssertUnwindSafe(|| renderer.tick(events, now_ms)));
        let schedule_next = match outcome {
            Ok(Ok(schedule)) => schedule,
            Ok(Err(err)) if err.is_recoverable() => {
                log::warn!("frame aborted, retrying next tick: {err}");
                true
            }
            Ok(Err(err)) => {
                log::error!("renderer failed: {err}");
                self.fault = Some(Fault {
                    message: err.to_string(),
                    callstack: None,
                });
                renderer.crash();
                false
            }
            Err(payload) => {
                let message = panic_message_of(payload.as_ref());
                log::error!("panic during frame: {message}");
                self.fault = Some(Fault {
                    message,
                    callstack: Some(std::backtrace::Backtrace::force_capture().to_string()),
                });
                renderer.crash();
                false
            }
        };

        if schedule_next {
            match self.host.request_frame() {
                Ok(request) => self.pending_frame = Some(request),
                Err(err) => log::warn!("frame request failed: {err}"),
            }
        }
    }

    /// Tear everything down: cancel the pending frame, detach the input
    /// bridge, and release every GPU resource. Idempotent and valid from
    /// any state.
    pub fn destroy(&mut self) {
        if let Some(request) = self.pending_frame.take() {
            self.host.cancel_frame(request);
        }
        self.bridge.detach();
        if let Some(renderer) = &mut self.renderer {
            renderer.destroy();
        }
        log::info!("viewer destroyed");
    }

    /// Whether a structural failure or panic has been recorded.
    pub fn has_panicked(&self) -> bool {
        self.fault.is_some()
    }

    /// Message of the recorded fault, if any.
    pub fn panic_message(&self) -> Option<&str> {
        self.fault.as_ref().map(|f| f.message.as_str())
    }

    /// Captured callstack of the recorded fault, if one was available.
    pub fn panic_callstack(&self) -> Option<&str> {
        self.fault.as_ref().and_then(|f| f.callstack.as_deref())
    }

    /// Current renderer lifecycle phase, if a renderer exists.
    pub fn phase(&self) -> Option<Phase> {
        self.renderer.as_ref().map(|renderer| renderer.phase())
    }

    /// Installed scene payload, if any.
    pub fn scene_payload(&self) -> Option<&[u8]> {
        self.renderer
            .as_ref()
            .and_then(|renderer| renderer.scene_payload())
    }

    /// Whether an animation frame is currently requested.
    pub fn frame_scheduled(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Read an opaque blob from the host's persistent store.
    pub fn load_state(&self, key: &str) -> Option<Vec<u8>> {
        self.host.storage_get(key)
    }

    /// Write an opaque blob to the host's persistent store.
    ///
    /// # Errors
    /// [`Error::HostCall`] if the host store rejects the write.
    pub fn save_state(&mut self, key: &str, value: &[u8]) -> Result<(), Error> {
        self.host.storage_set(key, value)
    }
}

fn panic_message_of(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
