//! Per-frame rendering driven by a tick loop.
//!
//! [`FrameRenderer`] owns the graphics context, the resource registry, the
//! program cache, and the camera, and advances through a small lifecycle:
//! `Uninitialized` until the first `initialize`, then `Running` ticks until
//! `destroy` (terminal `Destroyed`) or a structural failure (terminal
//! `Crashed`, set by the application handle).
//!
//! All GPU resources are created lazily inside the tick rather than up
//! front, so an allocation refused by a lost context aborts only that
//! frame and is retried naturally on the next tick.

use glam::Vec3;

use crate::api::GlApi;
use crate::camera::CameraController;
use crate::error::Error;
use crate::input::InputEvent;
use crate::program::ProgramCache;
use crate::registry::{ResourceHandle, ResourceKind, ResourceRegistry};
use crate::shaders::{SDF_FRAGMENT_SRC, SDF_VERTEX_SRC};

/// Lifecycle phase of a [`FrameRenderer`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    /// Constructed, GL state not yet configured.
    Uninitialized,
    /// Ticking normally.
    Running,
    /// A structural failure stopped the renderer; terminal.
    Crashed,
    /// Explicitly torn down; terminal.
    Destroyed,
}

/// One fullscreen-triangle vertex.
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
struct QuadVertex {
    position: [f32; 2],
}

/// A single clip-space triangle covering the whole viewport.
const FULLSCREEN_TRIANGLE: [QuadVertex; 3] = [
    QuadVertex { position: [-1.0, -1.0] },
    QuadVertex { position: [3.0, -1.0] },
    QuadVertex { position: [-1.0, 3.0] },
];

/// Everything resolved for one frame before any draw call is issued.
struct FrameState {
    viewport: (i32, i32),
    program: ResourceHandle,
    vertex_array: ResourceHandle,
}

/// Owner of all per-canvas rendering state.
pub struct FrameRenderer<G: GlApi> {
    api: G,
    registry: ResourceRegistry<G>,
    programs: ProgramCache<G>,
    /// Orbit camera updated from input events each tick.
    pub camera: CameraController,
    phase: Phase,
    clear_color: [f32; 4],
    /// Backing-store size in physical pixels.
    backing_size: (u32, u32),
    pixel_ratio: f64,
    /// Resize bursts and very dense displays are both bounded by this.
    max_pixel_ratio: f64,
    /// Only the last resize observed before a tick takes effect.
    pending_resize: Option<(u32, u32, f64)>,
    visible: bool,
    quad_vbo: Option<ResourceHandle>,
    quad_vao: Option<ResourceHandle>,
    scene_payload: Option<Vec<u8>>,
    /// SDF volume bounds fed to the raymarcher.
    pub bounds_min: Vec3,
    /// SDF volume bounds fed to the raymarcher.
    pub bounds_max: Vec3,
    /// Isosurface threshold within the distance field.
    pub threshold: f32,
    /// Base surface color tint.
    pub tint: [f32; 4],
}

impl<G: GlApi> FrameRenderer<G> {
    /// Build a renderer for a canvas of the given logical size and pixel
    /// ratio. The GL context is untouched until [`initialize`](Self::initialize).
    pub fn new(
        api: G,
        css_size: (u32, u32),
        pixel_ratio: f64,
        clear_color: [f32; 4],
        max_pixel_ratio: f64,
    ) -> Self {
        let pixel_ratio = pixel_ratio.min(max_pixel_ratio);
        Self {
            api,
            registry: ResourceRegistry::new(),
            programs: ProgramCache::new(),
            camera: CameraController::new(),
            phase: Phase::Uninitialized,
            clear_color,
            backing_size: backing_size(css_size.0, css_size.1, pixel_ratio),
            pixel_ratio,
            max_pixel_ratio,
            pending_resize: None,
            visible: true,
            quad_vbo: None,
            quad_vao: None,
            scene_payload: None,
            bounds_min: Vec3::splat(-2.0),
            bounds_max: Vec3::splat(2.0),
            threshold: 0.0,
            tint: [0.9, 0.9, 0.9, 1.0],
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Mark the renderer crashed after a structural failure. Terminal.
    pub fn crash(&mut self) {
        self.phase = Phase::Crashed;
    }

    /// Install the scene asset payload. The bytes are opaque to the
    /// renderer core; an SDF evaluator layered on top consumes them.
    pub fn load_scene(&mut self, bytes: Vec<u8>) {
        log::info!("scene payload installed ({} bytes)", bytes.len());
        self.scene_payload = Some(bytes);
    }

    /// Installed scene payload, if any.
    pub fn scene_payload(&self) -> Option<&[u8]> {
        self.scene_payload.as_deref()
    }

    /// Configure fixed pipeline state and enter the `Running` phase.
    pub fn initialize(&mut self) {
        self.api.enable(glow::DEPTH_TEST);
        self.api.depth_func(glow::LEQUAL);
        self.api.enable(glow::CULL_FACE);
        self.api.cull_face(glow::BACK);
        self.api.enable(glow::BLEND);
        self.api.blend_func(glow::ONE, glow::ONE_MINUS_SRC_ALPHA);
        self.phase = Phase::Running;
    }

    /// Run one frame: apply the queued input events, then draw. Returns
    /// whether another frame should be scheduled.
    ///
    /// Hidden canvases still consume events and resizes but skip the draw
    /// entirely. Not an error; ticking resumes drawing once visible.
    ///
    /// # Errors
    /// [`Error::Allocation`] when the context refuses an object (the frame
    /// is aborted cleanly and the creation retried next tick);
    /// [`Error::Compile`] or [`Error::InvalidHandle`] on structural
    /// failures the caller should treat as fatal.
    pub fn tick(&mut self, events: Vec<InputEvent>, now_ms: f64) -> Result<bool, Error> {
        if self.phase != Phase::Running {
            return Ok(false);
        }

        for event in events {
            match event {
                InputEvent::Resize {
                    width,
                    height,
                    pixel_ratio,
                } => {
                    // Overwrite, never queue: intermediate sizes from a
                    // resize burst must not produce frames.
                    self.pending_resize = Some((width, height, pixel_ratio));
                }
                InputEvent::VisibilityChange { visible } => {
                    self.visible = visible;
                }
                InputEvent::Drop { name, bytes } => {
                    log::info!("file dropped: {name} ({} bytes)", bytes.len());
                    self.scene_payload = Some(bytes);
                }
                InputEvent::Paste { ref text } => {
                    log::debug!("ignoring pasted text ({} chars)", text.len());
                }
                other => self.camera.handle_event(&other),
            }
        }

        if let Some((width, height, pixel_ratio)) = self.pending_resize.take() {
            let pixel_ratio = pixel_ratio.min(self.max_pixel_ratio);
            self.backing_size = backing_size(width, height, pixel_ratio);
            self.pixel_ratio = pixel_ratio;
        }

        if !self.visible {
            return Ok(true);
        }

        let frame = self.prepare_frame()?;
        self.draw(&frame, now_ms)?;
        Ok(true)
    }

    /// Resolve everything the draw needs, creating lazily-allocated
    /// resources on the way. Nothing is drawn until this succeeds, so an
    /// allocation failure leaves no partial frame behind.
    fn prepare_frame(&mut self) -> Result<FrameState, Error> {
        let program = self
            .programs
            .get_or_compile(&self.api, &mut self.registry, SDF_VERTEX_SRC, SDF_FRAGMENT_SRC)?;
        let program_handle = program.handle;
        let position_location = program.attribute("a_position");

        let vertex_array = match self.quad_vao {
            Some(vao) => vao,
            None => {
                let vbo = self.registry.create(&self.api, ResourceKind::Buffer)?;
                let vao = match self.registry.create(&self.api, ResourceKind::VertexArray) {
                    Ok(vao) => vao,
                    Err(err) => {
                        self.registry.delete(&self.api, vbo);
                        return Err(err);
                    }
                };
                self.registry.bind(&self.api, vao, 0)?;
                self.registry.bind(&self.api, vbo, glow::ARRAY_BUFFER)?;
                self.api.buffer_data_u8_slice(
                    glow::ARRAY_BUFFER,
                    bytemuck::cast_slice(&FULLSCREEN_TRIANGLE),
                    glow::STATIC_DRAW,
                );
                if let Some(location) = position_location {
                    self.api.enable_vertex_attrib_array(location);
                    self.api.vertex_attrib_pointer_f32(location, 2, glow::FLOAT, false, 8, 0);
                }
                self.quad_vbo = Some(vbo);
                self.quad_vao = Some(vao);
                vao
            }
        };

        Ok(FrameState {
            viewport: (
                i32::try_from(self.backing_size.0).unwrap_or(i32::MAX),
                i32::try_from(self.backing_size.1).unwrap_or(i32::MAX),
            ),
            program: program_handle,
            vertex_array,
        })
    }

    fn draw(&mut self, frame: &FrameState, now_ms: f64) -> Result<(), Error> {
        let (width, height) = frame.viewport;
        self.api.viewport(0, 0, width, height);
        let [r, g, b, a] = self.clear_color;
        self.api.clear_color(r, g, b, a);
        self.api.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

        // Re-bind every frame; the embedder may have touched GL state
        // between ticks.
        self.registry.bind(&self.api, frame.vertex_array, 0)?;
        self.registry.bind(&self.api, frame.program, 0)?;

        let view_proj = self
            .camera
            .view_proj(self.backing_size.0, self.backing_size.1);
        let camera_pos = self.camera.position();

        let program = self
            .programs
            .get_or_compile(&self.api, &mut self.registry, SDF_VERTEX_SRC, SDF_FRAGMENT_SRC)?;
        if let Some(loc) = program.uniform("u_view_proj_inv") {
            self.api
                .uniform_matrix_4_f32(loc, false, &view_proj.inverse().to_cols_array());
        }
        if let Some(loc) = program.uniform("u_camera_pos") {
            self.api
                .uniform_3_f32(loc, camera_pos.x, camera_pos.y, camera_pos.z);
        }
        if let Some(loc) = program.uniform("u_resolution") {
            #[allow(clippy::cast_precision_loss)]
            self.api
                .uniform_2_f32(loc, self.backing_size.0 as f32, self.backing_size.1 as f32);
        }
        if let Some(loc) = program.uniform("u_bounds_min") {
            self.api
                .uniform_3_f32(loc, self.bounds_min.x, self.bounds_min.y, self.bounds_min.z);
        }
        if let Some(loc) = program.uniform("u_bounds_max") {
            self.api
                .uniform_3_f32(loc, self.bounds_max.x, self.bounds_max.y, self.bounds_max.z);
        }
        if let Some(loc) = program.uniform("u_threshold") {
            self.api.uniform_1_f32(loc, self.threshold);
        }
        if let Some(loc) = program.uniform("u_tint") {
            let [tr, tg, tb, ta] = self.tint;
            self.api.uniform_4_f32(loc, tr, tg, tb, ta);
        }
        if let Some(loc) = program.uniform("u_time") {
            #[allow(clippy::cast_possible_truncation)]
            self.api.uniform_1_f32(loc, now_ms as f32);
        }

        self.api.draw_arrays(glow::TRIANGLES, 0, 3);
        Ok(())
    }

    /// Release every GPU resource and enter the terminal `Destroyed`
    /// phase. Safe to call in any phase, any number of times.
    pub fn destroy(&mut self) {
        self.registry.destroy_all(&self.api);
        self.programs.clear();
        self.quad_vbo = None;
        self.quad_vao = None;
        self.phase = Phase::Destroyed;
    }
}

fn backing_size(width: u32, height: u32, pixel_ratio: f64) -> (u32, u32) {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scale = |v: u32| ((f64::from(v) * pixel_ratio).round() as u32).max(1);
    (scale(width), scale(height))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::input::InputEvent;
    use crate::testutil::FakeGl;
    use std::rc::Rc;

    fn renderer(gl: &Rc<FakeGl>) -> FrameRenderer<Rc<FakeGl>> {
        let mut renderer =
            FrameRenderer::new(Rc::clone(gl), (300, 150), 1.0, [0.1, 0.1, 0.1, 1.0], 2.0);
        renderer.initialize();
        renderer
    }

    fn resize(width: u32, height: u32) -> InputEvent {
        InputEvent::Resize {
            width,
            height,
            pixel_ratio: 1.0,
        }
    }

    #[test]
    fn initialize_configures_fixed_pipeline_state() {
        let gl = Rc::new(FakeGl::new());
        let renderer = renderer(&gl);
        assert_eq!(renderer.phase(), Phase::Running);
        assert!(gl.is_enabled(glow::DEPTH_TEST));
        assert!(gl.is_enabled(glow::CULL_FACE));
        assert!(gl.is_enabled(glow::BLEND));
    }

    #[test]
    fn first_tick_compiles_and_uploads_once_then_reuses() {
        let gl = Rc::new(FakeGl::new());
        let mut renderer = renderer(&gl);

        renderer.tick(Vec::new(), 16.0).unwrap();
        assert_eq!(gl.compile_calls(), 2);
        assert_eq!(gl.link_calls(), 1);
        assert_eq!(gl.buffer_uploads(), 1);
        assert_eq!(gl.draw_calls(), 1);

        renderer.tick(Vec::new(), 32.0).unwrap();
        assert_eq!(gl.compile_calls(), 2);
        assert_eq!(gl.buffer_uploads(), 1);
        assert_eq!(gl.draw_calls(), 2);
    }

    #[test]
    fn resize_burst_coalesces_to_the_last_size() {
        let gl = Rc::new(FakeGl::new());
        let mut renderer = renderer(&gl);

        renderer
            .tick(vec![resize(400, 200), resize(500, 250), resize(600, 300)], 16.0)
            .unwrap();

        let viewports = gl.viewports();
        assert_eq!(viewports.last(), Some(&(0, 0, 600, 300)));
        assert!(!viewports.contains(&(0, 0, 400, 200)));
        assert!(!viewports.contains(&(0, 0, 500, 250)));
    }

    #[test]
    fn pixel_ratio_scales_the_backing_store() {
        let gl = Rc::new(FakeGl::new());
        let mut renderer = renderer(&gl);

        renderer
            .tick(
                vec![InputEvent::Resize {
                    width: 300,
                    height: 150,
                    pixel_ratio: 2.0,
                }],
                16.0,
            )
            .unwrap();
        assert_eq!(gl.viewports().last(), Some(&(0, 0, 600, 300)));

        // Ratios past the configured cap are clamped, not honored.
        renderer
            .tick(
                vec![InputEvent::Resize {
                    width: 300,
                    height: 150,
                    pixel_ratio: 4.0,
                }],
                32.0,
            )
            .unwrap();
        assert_eq!(gl.viewports().last(), Some(&(0, 0, 600, 300)));
    }

    #[test]
    fn hidden_canvas_skips_drawing_but_keeps_consuming_events() {
        let gl = Rc::new(FakeGl::new());
        let mut renderer = renderer(&gl);

        renderer
            .tick(
                vec![
                    InputEvent::VisibilityChange { visible: false },
                    resize(800, 400),
                ],
                16.0,
            )
            .unwrap();
        assert_eq!(gl.draw_calls(), 0);
        assert_eq!(gl.clear_calls(), 0);

        // The resize applied while hidden takes effect on the first
        // visible frame.
        renderer
            .tick(vec![InputEvent::VisibilityChange { visible: true }], 32.0)
            .unwrap();
        assert_eq!(gl.draw_calls(), 1);
        assert_eq!(gl.viewports().last(), Some(&(0, 0, 800, 400)));
    }

    #[test]
    fn allocation_failure_aborts_the_frame_and_recovers_next_tick() {
        let gl = Rc::new(FakeGl::new());
        let mut renderer = renderer(&gl);

        gl.fail_creates(true);
        let err = renderer.tick(Vec::new(), 16.0).unwrap_err();
        assert!(matches!(err, Error::Allocation { .. }));
        assert!(err.is_recoverable());
        assert_eq!(gl.draw_calls(), 0);

        gl.fail_creates(false);
        renderer.tick(Vec::new(), 32.0).unwrap();
        assert_eq!(gl.draw_calls(), 1);
    }

    #[test]
    fn link_failure_surfaces_a_structural_error() {
        let gl = Rc::new(FakeGl::new());
        let mut renderer = renderer(&gl);

        gl.fail_link(true);
        let err = renderer.tick(Vec::new(), 16.0).unwrap_err();
        assert!(matches!(err, Error::Compile { .. }));
        assert!(!err.is_recoverable());
        assert_eq!(gl.draw_calls(), 0);
    }

    #[test]
    fn dropped_file_replaces_the_scene_payload() {
        let gl = Rc::new(FakeGl::new());
        let mut renderer = renderer(&gl);

        renderer
            .tick(
                vec![InputEvent::Drop {
                    name: "model.sdf".into(),
                    bytes: vec![1, 2, 3],
                }],
                16.0,
            )
            .unwrap();
        assert_eq!(renderer.scene_payload(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn destroy_releases_everything_and_is_idempotent() {
        let gl = Rc::new(FakeGl::new());
        let mut renderer = renderer(&gl);

        renderer.tick(Vec::new(), 16.0).unwrap();
        assert!(gl.alive_objects() > 0);

        renderer.destroy();
        assert_eq!(gl.alive_objects(), 0);
        assert_eq!(renderer.phase(), Phase::Destroyed);

        renderer.destroy();
        assert_eq!(gl.alive_objects(), 0);

        // Ticking a destroyed renderer is a no-op that asks for no more
        // frames.
        assert!(!renderer.tick(Vec::new(), 32.0).unwrap());
        assert_eq!(gl.draw_calls(), 1);
    }
}
