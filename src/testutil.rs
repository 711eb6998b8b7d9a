//! Test doubles for the host seams: a recording [`FakeGl`] graphics
//! context and a scripted [`FakeHost`] window.
//!
//! `FakeGl` hands out sequential ids, tracks which objects are alive
//! (panicking on double-free so leaks and double-deletes fail tests), and
//! derives shader introspection data from the uploaded GLSL source text.
//! A source containing `#error` fails compilation the way a real driver
//! would.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use crate::api::GlApi;
use crate::error::Error;
use crate::host::{CanvasRect, FrameRequest, HostWindow};
use crate::registry::ResourceKind;

#[derive(Default)]
struct FakeGlState {
    next_id: u32,
    alive: HashSet<(ResourceKind, u32)>,
    fail_creates: bool,
    fail_link: bool,
    panic_on_draw: bool,
    shaders: HashMap<u32, (u32, String)>,
    programs: HashMap<u32, Vec<u32>>,
    compile_calls: u32,
    link_calls: u32,
    viewports: Vec<(i32, i32, i32, i32)>,
    clear_calls: u32,
    draw_calls: u32,
    buffer_uploads: u32,
    enabled_caps: HashSet<u32>,
}

/// Recording fake of the host graphics context.
pub(crate) struct FakeGl {
    state: RefCell<FakeGlState>,
}

impl FakeGl {
    pub(crate) fn new() -> Self {
        // Logs from the code under test are visible with RUST_LOG set.
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            state: RefCell::new(FakeGlState::default()),
        }
    }

    /// Make every subsequent create call fail, as under context loss.
    pub(crate) fn fail_creates(&self, fail: bool) {
        self.state.borrow_mut().fail_creates = fail;
    }

    /// Make every subsequent program link fail.
    pub(crate) fn fail_link(&self, fail: bool) {
        self.state.borrow_mut().fail_link = fail;
    }

    /// Panic on the next draw call, simulating a driver-level fault.
    pub(crate) fn panic_on_draw(&self, panic: bool) {
        self.state.borrow_mut().panic_on_draw = panic;
    }

    pub(crate) fn alive_objects(&self) -> usize {
        self.state.borrow().alive.len()
    }

    pub(crate) fn compile_calls(&self) -> u32 {
        self.state.borrow().compile_calls
    }

    pub(crate) fn link_calls(&self) -> u32 {
        self.state.borrow().link_calls
    }

    pub(crate) fn viewports(&self) -> Vec<(i32, i32, i32, i32)> {
        self.state.borrow().viewports.clone()
    }

    pub(crate) fn draw_calls(&self) -> u32 {
        self.state.borrow().draw_calls
    }

    pub(crate) fn clear_calls(&self) -> u32 {
        self.state.borrow().clear_calls
    }

    pub(crate) fn buffer_uploads(&self) -> u32 {
        self.state.borrow().buffer_uploads
    }

    pub(crate) fn is_enabled(&self, cap: u32) -> bool {
        self.state.borrow().enabled_caps.contains(&cap)
    }

    fn create(&self, kind: ResourceKind) -> Result<u32, String> {
        let mut s = self.state.borrow_mut();
        if s.fail_creates {
            return Err("fake: context lost".into());
        }
        s.next_id += 1;
        let id = s.next_id;
        s.alive.insert((kind, id));
        Ok(id)
    }

    fn delete(&self, kind: ResourceKind, id: u32) {
        let mut s = self.state.borrow_mut();
        assert!(
            s.alive.remove(&(kind, id)),
            "double free of {kind:?} object {id}"
        );
    }

    /// Names declared with `prefix` (e.g. `"uniform "`, `"in "`) in GLSL
    /// source, in declaration order.
    fn declared_names(source: &str, prefix: &str) -> Vec<String> {
        source
            .lines()
            .filter_map(|line| {
                let rest = line.trim().strip_prefix(prefix)?;
                let name = rest.trim_end_matches(';').split_whitespace().last()?;
                let name: String = name
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '_')
                    .collect();
                (!name.is_empty()).then_some(name)
            })
            .collect()
    }

    fn program_attributes(&self, program: u32) -> Vec<String> {
        let s = self.state.borrow();
        let mut names = Vec::new();
        for shader in s.programs.get(&program).into_iter().flatten() {
            if let Some((stage, source)) = s.shaders.get(shader) {
                if *stage == glow::VERTEX_SHADER {
                    names.extend(Self::declared_names(source, "in "));
                }
            }
        }
        names
    }

    fn program_uniforms(&self, program: u32) -> Vec<String> {
        let s = self.state.borrow();
        let mut names = Vec::new();
        for shader in s.programs.get(&program).into_iter().flatten() {
            if let Some((_, source)) = s.shaders.get(shader) {
                for name in Self::declared_names(source, "uniform ") {
                    if !names.contains(&name) {
                        names.push(name);
                    }
                }
            }
        }
        names
    }
}

impl GlApi for FakeGl {
    type Buffer = u32;
    type Texture = u32;
    type Framebuffer = u32;
    type Shader = u32;
    type Program = u32;
    type VertexArray = u32;
    type UniformLocation = u32;

    fn create_buffer(&self) -> Result<u32, String> {
        self.create(ResourceKind::Buffer)
    }

    fn create_texture(&self) -> Result<u32, String> {
        self.create(ResourceKind::Texture)
    }

    fn create_framebuffer(&self) -> Result<u32, String> {
        self.create(ResourceKind::Framebuffer)
    }

    fn create_shader(&self, stage: u32) -> Result<u32, String> {
        let id = self.create(ResourceKind::Shader)?;
        self.state
            .borrow_mut()
            .shaders
            .insert(id, (stage, String::new()));
        Ok(id)
    }

    fn create_program(&self) -> Result<u32, String> {
        let id = self.create(ResourceKind::Program)?;
        self.state.borrow_mut().programs.insert(id, Vec::new());
        Ok(id)
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        self.create(ResourceKind::VertexArray)
    }

    fn delete_buffer(&self, buffer: u32) {
        self.delete(ResourceKind::Buffer, buffer);
    }

    fn delete_texture(&self, texture: u32) {
        self.delete(ResourceKind::Texture, texture);
    }

    fn delete_framebuffer(&self, framebuffer: u32) {
        self.delete(ResourceKind::Framebuffer, framebuffer);
    }

    fn delete_shader(&self, shader: u32) {
        self.delete(ResourceKind::Shader, shader);
    }

    fn delete_program(&self, program: u32) {
        self.delete(ResourceKind::Program, program);
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        self.delete(ResourceKind::VertexArray, vertex_array);
    }

    fn bind_buffer(&self, _target: u32, _buffer: Option<u32>) {}
    fn bind_texture(&self, _target: u32, _texture: Option<u32>) {}
    fn bind_framebuffer(&self, _target: u32, _framebuffer: Option<u32>) {}
    fn bind_vertex_array(&self, _vertex_array: Option<u32>) {}
    fn use_program(&self, _program: Option<u32>) {}

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(entry) = self.state.borrow_mut().shaders.get_mut(&shader) {
            entry.1 = source.to_owned();
        }
    }

    fn compile_shader(&self, _shader: u32) {
        self.state.borrow_mut().compile_calls += 1;
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        let s = self.state.borrow();
        s.shaders
            .get(&shader)
            .is_some_and(|(_, src)| !src.contains("#error"))
    }

    fn shader_info_log(&self, shader: u32) -> String {
        if self.shader_compile_status(shader) {
            String::new()
        } else {
            "fake: #error directive encountered".into()
        }
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        if let Some(attached) = self.state.borrow_mut().programs.get_mut(&program) {
            attached.push(shader);
        }
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        // Introspection data survives detach, like a real driver's
        // post-link reflection.
        let _ = (program, shader);
    }

    fn link_program(&self, _program: u32) {
        self.state.borrow_mut().link_calls += 1;
    }

    fn program_link_status(&self, _program: u32) -> bool {
        !self.state.borrow().fail_link
    }

    fn program_info_log(&self, _program: u32) -> String {
        if self.state.borrow().fail_link {
            "fake: link forced to fail".into()
        } else {
            String::new()
        }
    }

    fn active_attribute_count(&self, program: u32) -> u32 {
        u32::try_from(self.program_attributes(program).len()).unwrap_or(0)
    }

    fn active_attribute_name(&self, program: u32, index: u32) -> Option<String> {
        self.program_attributes(program).get(index as usize).cloned()
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        self.program_attributes(program)
            .iter()
            .position(|n| n == name)
            .and_then(|i| u32::try_from(i).ok())
    }

    fn active_uniform_count(&self, program: u32) -> u32 {
        u32::try_from(self.program_uniforms(program).len()).unwrap_or(0)
    }

    fn active_uniform_name(&self, program: u32, index: u32) -> Option<String> {
        self.program_uniforms(program).get(index as usize).cloned()
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        self.program_uniforms(program)
            .iter()
            .position(|n| n == name)
            .and_then(|i| u32::try_from(i).ok())
    }

    fn uniform_1_f32(&self, _location: &u32, _x: f32) {}
    fn uniform_2_f32(&self, _location: &u32, _x: f32, _y: f32) {}
    fn uniform_3_f32(&self, _location: &u32, _x: f32, _y: f32, _z: f32) {}
    fn uniform_4_f32(&self, _location: &u32, _x: f32, _y: f32, _z: f32, _w: f32) {}
    fn uniform_1_i32(&self, _location: &u32, _x: i32) {}
    fn uniform_matrix_4_f32(&self, _location: &u32, _transpose: bool, _v: &[f32]) {}

    fn buffer_data_u8_slice(&self, _target: u32, _data: &[u8], _usage: u32) {
        self.state.borrow_mut().buffer_uploads += 1;
    }

    fn enable_vertex_attrib_array(&self, _index: u32) {}

    fn vertex_attrib_pointer_f32(
        &self,
        _index: u32,
        _size: i32,
        _data_type: u32,
        _normalized: bool,
        _stride: i32,
        _offset: i32,
    ) {
    }

    fn enable(&self, cap: u32) {
        self.state.borrow_mut().enabled_caps.insert(cap);
    }

    fn disable(&self, cap: u32) {
        self.state.borrow_mut().enabled_caps.remove(&cap);
    }

    fn blend_func(&self, _src: u32, _dst: u32) {}
    fn depth_func(&self, _func: u32) {}
    fn cull_face(&self, _mode: u32) {}

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewports.push((x, y, width, height));
    }

    fn clear_color(&self, _r: f32, _g: f32, _b: f32, _a: f32) {}

    fn clear(&self, _mask: u32) {
        self.state.borrow_mut().clear_calls += 1;
    }

    fn draw_arrays(&self, _mode: u32, _first: i32, _count: i32) {
        let panic_now = {
            let mut s = self.state.borrow_mut();
            s.draw_calls += 1;
            s.panic_on_draw
        };
        if panic_now {
            panic!("fake: draw call exploded");
        }
    }
}

#[derive(Default)]
struct FakeHostState {
    canvas_size: (u32, u32),
    pixel_ratio: f64,
    rect_origin: (f32, f32),
    next_frame: u64,
    pending_frames: Vec<u64>,
    canceled_frames: Vec<u64>,
    now_ms: f64,
    storage: HashMap<String, Vec<u8>>,
    fetch_response: Option<Result<Vec<u8>, String>>,
    fetched_urls: Vec<String>,
    fail_acquire: bool,
}

/// Scripted fake of the host window/canvas environment.
pub(crate) struct FakeHost {
    state: Rc<RefCell<FakeHostState>>,
    gl: Rc<FakeGl>,
}

/// Inspection handle kept by tests after the host moves into the app.
pub(crate) struct FakeHostProbe {
    state: Rc<RefCell<FakeHostState>>,
    pub(crate) gl: Rc<FakeGl>,
}

impl FakeHost {
    pub(crate) fn new(width: u32, height: u32, pixel_ratio: f64) -> (Self, FakeHostProbe) {
        let state = Rc::new(RefCell::new(FakeHostState {
            canvas_size: (width, height),
            pixel_ratio,
            ..FakeHostState::default()
        }));
        let gl = Rc::new(FakeGl::new());
        let probe = FakeHostProbe {
            state: Rc::clone(&state),
            gl: Rc::clone(&gl),
        };
        (Self { state, gl }, probe)
    }
}

impl FakeHostProbe {
    pub(crate) fn set_fetch_response(&self, response: Result<Vec<u8>, String>) {
        self.state.borrow_mut().fetch_response = Some(response);
    }

    pub(crate) fn fetched_urls(&self) -> Vec<String> {
        self.state.borrow().fetched_urls.clone()
    }

    pub(crate) fn fail_acquire(&self, fail: bool) {
        self.state.borrow_mut().fail_acquire = fail;
    }

    pub(crate) fn pending_frames(&self) -> usize {
        self.state.borrow().pending_frames.len()
    }

    pub(crate) fn canceled_frames(&self) -> usize {
        self.state.borrow().canceled_frames.len()
    }

    pub(crate) fn stored(&self, key: &str) -> Option<Vec<u8>> {
        self.state.borrow().storage.get(key).cloned()
    }
}

impl HostWindow for FakeHost {
    type Gl = Rc<FakeGl>;

    fn acquire_gl(&mut self) -> Result<Self::Gl, Error> {
        if self.state.borrow().fail_acquire {
            return Err(Error::HostCall("fake: no webgl context".into()));
        }
        Ok(Rc::clone(&self.gl))
    }

    fn canvas_size(&self) -> (u32, u32) {
        self.state.borrow().canvas_size
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.state.borrow().pixel_ratio
    }

    fn canvas_rect(&self) -> CanvasRect {
        let s = self.state.borrow();
        CanvasRect {
            left: s.rect_origin.0,
            top: s.rect_origin.1,
            width: s.canvas_size.0 as f32,
            height: s.canvas_size.1 as f32,
        }
    }

    fn request_frame(&mut self) -> Result<FrameRequest, Error> {
        let mut s = self.state.borrow_mut();
        s.next_frame += 1;
        let id = s.next_frame;
        s.pending_frames.push(id);
        Ok(FrameRequest(id))
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut s = self.state.borrow_mut();
        s.pending_frames.retain(|id| *id != request.0);
        s.canceled_frames.push(request.0);
    }

    fn now_ms(&self) -> f64 {
        let mut s = self.state.borrow_mut();
        // The app reads the clock exactly once per frame; treat that as
        // the scheduled callback having fired, the way a real host
        // forgets a request once its callback runs.
        if !s.pending_frames.is_empty() {
            s.pending_frames.remove(0);
        }
        s.now_ms += 16.0;
        s.now_ms
    }

    fn storage_get(&self, key: &str) -> Option<Vec<u8>> {
        self.state.borrow().storage.get(key).cloned()
    }

    fn storage_set(&mut self, key: &str, value: &[u8]) -> Result<(), Error> {
        self.state
            .borrow_mut()
            .storage
            .insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn fetch(
        &mut self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>, Error>> + '_>> {
        let mut s = self.state.borrow_mut();
        s.fetched_urls.push(url.to_owned());
        let response = match s.fetch_response.clone() {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(reason)) => Err(Error::HostCall(reason)),
            None => Ok(Vec::new()),
        };
        Box::pin(std::future::ready(response))
    }
}
