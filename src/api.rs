//! The seam between the viewer core and the host graphics context.
//!
//! [`GlApi`] lists exactly the WebGL-class operations the core consumes:
//! object create/delete/bind, shader compile/link with status and log
//! retrieval, program introspection, uniform upload, and draw submission.
//! The associated types carry the host's per-kind raw object identifiers,
//! mirroring `glow::HasContext`. `glow::Context` implements the trait by
//! delegating to raw GL calls; tests substitute a recording fake.
//!
//! Capability differences between GL variants (WebGL1 vs WebGL2, core vs
//! ES) are a property of the implementing context, never a second code
//! path in the core.

use glow::HasContext;

/// Host graphics context operations consumed by the viewer core.
///
/// Creation methods return the host's reason text on refusal (typically a
/// lost context); the registry wraps that into an allocation error.
pub trait GlApi {
    /// Raw buffer object identifier.
    type Buffer: Copy + PartialEq + std::fmt::Debug;
    /// Raw texture object identifier.
    type Texture: Copy + PartialEq + std::fmt::Debug;
    /// Raw framebuffer object identifier.
    type Framebuffer: Copy + PartialEq + std::fmt::Debug;
    /// Raw shader object identifier.
    type Shader: Copy + PartialEq + std::fmt::Debug;
    /// Raw program object identifier.
    type Program: Copy + PartialEq + std::fmt::Debug;
    /// Raw vertex array object identifier.
    type VertexArray: Copy + PartialEq + std::fmt::Debug;
    /// Opaque uniform location.
    type UniformLocation: Clone + std::fmt::Debug;

    /// Create a buffer object.
    ///
    /// # Errors
    /// Host-reported reason text if creation is refused.
    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    /// Create a texture object.
    ///
    /// # Errors
    /// Host-reported reason text if creation is refused.
    fn create_texture(&self) -> Result<Self::Texture, String>;
    /// Create a framebuffer object.
    ///
    /// # Errors
    /// Host-reported reason text if creation is refused.
    fn create_framebuffer(&self) -> Result<Self::Framebuffer, String>;
    /// Create a shader object for the given stage (`glow::VERTEX_SHADER` or
    /// `glow::FRAGMENT_SHADER`).
    ///
    /// # Errors
    /// Host-reported reason text if creation is refused.
    fn create_shader(&self, stage: u32) -> Result<Self::Shader, String>;
    /// Create a program object.
    ///
    /// # Errors
    /// Host-reported reason text if creation is refused.
    fn create_program(&self) -> Result<Self::Program, String>;
    /// Create a vertex array object.
    ///
    /// # Errors
    /// Host-reported reason text if creation is refused.
    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;

    /// Delete a buffer object.
    fn delete_buffer(&self, buffer: Self::Buffer);
    /// Delete a texture object.
    fn delete_texture(&self, texture: Self::Texture);
    /// Delete a framebuffer object.
    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer);
    /// Delete a shader object.
    fn delete_shader(&self, shader: Self::Shader);
    /// Delete a program object.
    fn delete_program(&self, program: Self::Program);
    /// Delete a vertex array object.
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);

    /// Bind a buffer to a target such as `glow::ARRAY_BUFFER`.
    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>);
    /// Bind a texture to a target such as `glow::TEXTURE_2D`.
    fn bind_texture(&self, target: u32, texture: Option<Self::Texture>);
    /// Bind a framebuffer to a target such as `glow::FRAMEBUFFER`.
    fn bind_framebuffer(&self, target: u32, framebuffer: Option<Self::Framebuffer>);
    /// Bind a vertex array object.
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    /// Activate a program for subsequent draws.
    fn use_program(&self, program: Option<Self::Program>);

    /// Upload shader source text.
    fn shader_source(&self, shader: Self::Shader, source: &str);
    /// Request shader compilation.
    fn compile_shader(&self, shader: Self::Shader);
    /// Poll the compile status, synchronously from the caller's view.
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    /// Retrieve the shader's diagnostic log.
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    /// Attach a shader to a program.
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Detach a shader from a program.
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Request program linking.
    fn link_program(&self, program: Self::Program);
    /// Poll the link status, synchronously from the caller's view.
    fn program_link_status(&self, program: Self::Program) -> bool;
    /// Retrieve the program's diagnostic log.
    fn program_info_log(&self, program: Self::Program) -> String;

    /// Number of active attributes on a linked program.
    fn active_attribute_count(&self, program: Self::Program) -> u32;
    /// Name of the active attribute at `index`, if any.
    fn active_attribute_name(&self, program: Self::Program, index: u32) -> Option<String>;
    /// Location of a named attribute.
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    /// Number of active uniforms on a linked program.
    fn active_uniform_count(&self, program: Self::Program) -> u32;
    /// Name of the active uniform at `index`, if any.
    fn active_uniform_name(&self, program: Self::Program, index: u32) -> Option<String>;
    /// Location of a named uniform.
    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;

    /// Upload a scalar `float` uniform.
    fn uniform_1_f32(&self, location: &Self::UniformLocation, x: f32);
    /// Upload a `vec2` uniform.
    fn uniform_2_f32(&self, location: &Self::UniformLocation, x: f32, y: f32);
    /// Upload a `vec3` uniform.
    fn uniform_3_f32(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32);
    /// Upload a `vec4` uniform.
    fn uniform_4_f32(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32, w: f32);
    /// Upload a scalar `int` uniform.
    fn uniform_1_i32(&self, location: &Self::UniformLocation, x: i32);
    /// Upload a `mat4` uniform from a 16-element column-major slice.
    fn uniform_matrix_4_f32(&self, location: &Self::UniformLocation, transpose: bool, v: &[f32]);

    /// Upload raw bytes into the buffer bound at `target`.
    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32);
    /// Enable a vertex attribute array on the bound VAO.
    fn enable_vertex_attrib_array(&self, index: u32);
    /// Configure a float vertex attribute pointer on the bound VAO.
    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    /// Enable a capability such as `glow::DEPTH_TEST`.
    fn enable(&self, cap: u32);
    /// Disable a capability.
    fn disable(&self, cap: u32);
    /// Configure the blend function.
    fn blend_func(&self, src: u32, dst: u32);
    /// Configure the depth comparison function.
    fn depth_func(&self, func: u32);
    /// Select which faces are culled.
    fn cull_face(&self, mode: u32);
    /// Set the viewport rectangle in backing-store pixels.
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    /// Set the clear color.
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    /// Clear the buffers selected by `mask`.
    fn clear(&self, mask: u32);
    /// Issue a non-indexed draw call.
    fn draw_arrays(&self, mode: u32, first: i32, count: i32);
}

/// Delegation through `Rc`, so a single-threaded embedder can share one
/// context between the renderer and its own code (the scheduling model is
/// cooperative single-threaded throughout).
impl<T: GlApi> GlApi for std::rc::Rc<T> {
    type Buffer = T::Buffer;
    type Texture = T::Texture;
    type Framebuffer = T::Framebuffer;
    type Shader = T::Shader;
    type Program = T::Program;
    type VertexArray = T::VertexArray;
    type UniformLocation = T::UniformLocation;

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        (**self).create_buffer()
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        (**self).create_texture()
    }

    fn create_framebuffer(&self) -> Result<Self::Framebuffer, String> {
        (**self).create_framebuffer()
    }

    fn create_shader(&self, stage: u32) -> Result<Self::Shader, String> {
        (**self).create_shader(stage)
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        (**self).create_program()
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        (**self).create_vertex_array()
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        (**self).delete_buffer(buffer);
    }

    fn delete_texture(&self, texture: Self::Texture) {
        (**self).delete_texture(texture);
    }

    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer) {
        (**self).delete_framebuffer(framebuffer);
    }

    fn delete_shader(&self, shader: Self::Shader) {
        (**self).delete_shader(shader);
    }

    fn delete_program(&self, program: Self::Program) {
        (**self).delete_program(program);
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        (**self).delete_vertex_array(vertex_array);
    }

    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>) {
        (**self).bind_buffer(target, buffer);
    }

    fn bind_texture(&self, target: u32, texture: Option<Self::Texture>) {
        (**self).bind_texture(target, texture);
    }

    fn bind_framebuffer(&self, target: u32, framebuffer: Option<Self::Framebuffer>) {
        (**self).bind_framebuffer(target, framebuffer);
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        (**self).bind_vertex_array(vertex_array);
    }

    fn use_program(&self, program: Option<Self::Program>) {
        (**self).use_program(program);
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        (**self).shader_source(shader, source);
    }

    fn compile_shader(&self, shader: Self::Shader) {
        (**self).compile_shader(shader);
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        (**self).shader_compile_status(shader)
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        (**self).shader_info_log(shader)
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        (**self).attach_shader(program, shader);
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        (**self).detach_shader(program, shader);
    }

    fn link_program(&self, program: Self::Program) {
        (**self).link_program(program);
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        (**self).program_link_status(program)
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        (**self).program_info_log(program)
    }

    fn active_attribute_count(&self, program: Self::Program) -> u32 {
        (**self).active_attribute_count(program)
    }

    fn active_attribute_name(&self, program: Self::Program, index: u32) -> Option<String> {
        (**self).active_attribute_name(program, index)
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        (**self).attrib_location(program, name)
    }

    fn active_uniform_count(&self, program: Self::Program) -> u32 {
        (**self).active_uniform_count(program)
    }

    fn active_uniform_name(&self, program: Self::Program, index: u32) -> Option<String> {
        (**self).active_uniform_name(program, index)
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        (**self).uniform_location(program, name)
    }

    fn uniform_1_f32(&self, location: &Self::UniformLocation, x: f32) {
        (**self).uniform_1_f32(location, x);
    }

    fn uniform_2_f32(&self, location: &Self::UniformLocation, x: f32, y: f32) {
        (**self).uniform_2_f32(location, x, y);
    }

    fn uniform_3_f32(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32) {
        (**self).uniform_3_f32(location, x, y, z);
    }

    fn uniform_4_f32(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        (**self).uniform_4_f32(location, x, y, z, w);
    }

    fn uniform_1_i32(&self, location: &Self::UniformLocation, x: i32) {
        (**self).uniform_1_i32(location, x);
    }

    fn uniform_matrix_4_f32(&self, location: &Self::UniformLocation, transpose: bool, v: &[f32]) {
        (**self).uniform_matrix_4_f32(location, transpose, v);
    }

    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        (**self).buffer_data_u8_slice(target, data, usage);
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        (**self).enable_vertex_attrib_array(index);
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        (**self).vertex_attrib_pointer_f32(index, size, data_type, normalized, stride, offset);
    }

    fn enable(&self, cap: u32) {
        (**self).enable(cap);
    }

    fn disable(&self, cap: u32) {
        (**self).disable(cap);
    }

    fn blend_func(&self, src: u32, dst: u32) {
        (**self).blend_func(src, dst);
    }

    fn depth_func(&self, func: u32) {
        (**self).depth_func(func);
    }

    fn cull_face(&self, mode: u32) {
        (**self).cull_face(mode);
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        (**self).viewport(x, y, width, height);
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        (**self).clear_color(r, g, b, a);
    }

    fn clear(&self, mask: u32) {
        (**self).clear(mask);
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        (**self).draw_arrays(mode, first, count);
    }
}

impl GlApi for glow::Context {
    type Buffer = <glow::Context as HasContext>::Buffer;
    type Texture = <glow::Context as HasContext>::Texture;
    type Framebuffer = <glow::Context as HasContext>::Framebuffer;
    type Shader = <glow::Context as HasContext>::Shader;
    type Program = <glow::Context as HasContext>::Program;
    type VertexArray = <glow::Context as HasContext>::VertexArray;
    type UniformLocation = <glow::Context as HasContext>::UniformLocation;

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn create_texture(&self) -> Result<Self::Texture, String> {
        unsafe { HasContext::create_texture(self) }
    }

    fn create_framebuffer(&self) -> Result<Self::Framebuffer, String> {
        unsafe { HasContext::create_framebuffer(self) }
    }

    fn create_shader(&self, stage: u32) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, stage) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn delete_texture(&self, texture: Self::Texture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    fn delete_framebuffer(&self, framebuffer: Self::Framebuffer) {
        unsafe { HasContext::delete_framebuffer(self, framebuffer) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target, buffer) }
    }

    fn bind_texture(&self, target: u32, texture: Option<Self::Texture>) {
        unsafe { HasContext::bind_texture(self, target, texture) }
    }

    fn bind_framebuffer(&self, target: u32, framebuffer: Option<Self::Framebuffer>) {
        unsafe { HasContext::bind_framebuffer(self, target, framebuffer) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { HasContext::shader_source(self, shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::compile_shader(self, shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { HasContext::get_shader_compile_status(self, shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { HasContext::get_shader_info_log(self, shader) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { HasContext::get_program_link_status(self, program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { HasContext::get_program_info_log(self, program) }
    }

    fn active_attribute_count(&self, program: Self::Program) -> u32 {
        unsafe { HasContext::get_active_attributes(self, program) }
    }

    fn active_attribute_name(&self, program: Self::Program, index: u32) -> Option<String> {
        unsafe { HasContext::get_active_attribute(self, program, index) }.map(|a| a.name)
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { HasContext::get_attrib_location(self, program, name) }
    }

    fn active_uniform_count(&self, program: Self::Program) -> u32 {
        unsafe { HasContext::get_active_uniforms(self, program) }
    }

    fn active_uniform_name(&self, program: Self::Program, index: u32) -> Option<String> {
        unsafe { HasContext::get_active_uniform(self, program, index) }.map(|u| u.name)
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    fn uniform_1_f32(&self, location: &Self::UniformLocation, x: f32) {
        unsafe { HasContext::uniform_1_f32(self, Some(location), x) }
    }

    fn uniform_2_f32(&self, location: &Self::UniformLocation, x: f32, y: f32) {
        unsafe { HasContext::uniform_2_f32(self, Some(location), x, y) }
    }

    fn uniform_3_f32(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32) {
        unsafe { HasContext::uniform_3_f32(self, Some(location), x, y, z) }
    }

    fn uniform_4_f32(&self, location: &Self::UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        unsafe { HasContext::uniform_4_f32(self, Some(location), x, y, z, w) }
    }

    fn uniform_1_i32(&self, location: &Self::UniformLocation, x: i32) {
        unsafe { HasContext::uniform_1_i32(self, Some(location), x) }
    }

    fn uniform_matrix_4_f32(&self, location: &Self::UniformLocation, transpose: bool, v: &[f32]) {
        unsafe { HasContext::uniform_matrix_4_f32_slice(self, Some(location), transpose, v) }
    }

    fn buffer_data_u8_slice(&self, target: u32, data: &[u8], usage: u32) {
        unsafe { HasContext::buffer_data_u8_slice(self, target, data, usage) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            HasContext::vertex_attrib_pointer_f32(
                self, index, size, data_type, normalized, stride, offset,
            );
        }
    }

    fn enable(&self, cap: u32) {
        unsafe { HasContext::enable(self, cap) }
    }

    fn disable(&self, cap: u32) {
        unsafe { HasContext::disable(self, cap) }
    }

    fn blend_func(&self, src: u32, dst: u32) {
        unsafe { HasContext::blend_func(self, src, dst) }
    }

    fn depth_func(&self, func: u32) {
        unsafe { HasContext::depth_func(self, func) }
    }

    fn cull_face(&self, mode: u32) {
        unsafe { HasContext::cull_face(self, mode) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { HasContext::clear_color(self, r, g, b, a) }
    }

    fn clear(&self, mask: u32) {
        unsafe { HasContext::clear(self, mask) }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { HasContext::draw_arrays(self, mode, first, count) }
    }
}
