//! Call tracing as a [`GlApi`] decorator.
//!
//! `Traced` implements `GlApi` by writing a line for every call to a [`TraceSink`] and then
//! forwarding to the wrapped implementation, so it stacks in front of [`DriverGl`](crate::DriverGl),
//! a fake, or even another `Traced`. Calls that produce a value are recorded after they return so
//! the line can include the result.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;

use gl::types::*;

use crate::api::GlApi;

/// Receives one formatted line per traced call.
pub trait TraceSink {
    /// Lets a sink skip formatting entirely, e.g. when its log level is filtered out.
    fn enabled(&self) -> bool { true }

    fn record(&self, call: &str);
}

/// Writes trace lines through the `log` facade under the `glkit::trace` target.
#[derive(Debug, Clone, Copy)]
pub struct LogSink {
    pub level: log::Level,
}

impl Default for LogSink {
    fn default() -> Self {
        Self { level: log::Level::Debug }
    }
}

impl TraceSink for LogSink {
    fn enabled(&self) -> bool {
        log::log_enabled!(target: "glkit::trace", self.level)
    }

    fn record(&self, call: &str) {
        log::log!(target: "glkit::trace", self.level, "{}", call);
    }
}

/// Collects lines in memory.
impl TraceSink for RefCell<Vec<String>> {
    fn record(&self, call: &str) {
        self.borrow_mut().push(call.to_string());
    }
}

pub struct Traced<A, S = LogSink> {
    inner: A,
    sink: S,
    calls: Cell<u64>,
}

impl<A: GlApi> Traced<A, LogSink> {
    /// Traces to the log at debug level.
    pub fn new(inner: A) -> Self {
        Self::with_sink(inner, LogSink::default())
    }
}

impl<A: GlApi, S: TraceSink> Traced<A, S> {
    pub fn with_sink(inner: A, sink: S) -> Self {
        Self { inner, sink, calls: Cell::new(0) }
    }

    pub fn inner(&self) -> &A { &self.inner }

    pub fn sink(&self) -> &S { &self.sink }

    /// How many calls went through, whether or not the sink was enabled.
    pub fn calls(&self) -> u64 { self.calls.get() }

    fn trace(&self, args: fmt::Arguments<'_>) {
        self.calls.set(self.calls.get() + 1);
        if self.sink.enabled() {
            self.sink.record(&args.to_string());
        }
    }
}

/// Spells out the GL constants the demos pass around; anything else prints as hex.
pub fn enum_name(value: GLenum) -> Cow<'static, str> {
    let name = match value {
        gl::VERTEX_SHADER => "GL_VERTEX_SHADER",
        gl::TESS_CONTROL_SHADER => "GL_TESS_CONTROL_SHADER",
        gl::TESS_EVALUATION_SHADER => "GL_TESS_EVALUATION_SHADER",
        gl::GEOMETRY_SHADER => "GL_GEOMETRY_SHADER",
        gl::FRAGMENT_SHADER => "GL_FRAGMENT_SHADER",
        gl::COMPUTE_SHADER => "GL_COMPUTE_SHADER",
        gl::UNIFORM_BUFFER => "GL_UNIFORM_BUFFER",
        gl::SHADER_STORAGE_BUFFER => "GL_SHADER_STORAGE_BUFFER",
        gl::TEXTURE_2D => "GL_TEXTURE_2D",
        gl::TEXTURE_CUBE_MAP => "GL_TEXTURE_CUBE_MAP",
        gl::TEXTURE_MAX_LEVEL => "GL_TEXTURE_MAX_LEVEL",
        gl::TEXTURE_BASE_LEVEL => "GL_TEXTURE_BASE_LEVEL",
        gl::TEXTURE_MIN_FILTER => "GL_TEXTURE_MIN_FILTER",
        gl::TEXTURE_MAG_FILTER => "GL_TEXTURE_MAG_FILTER",
        gl::TEXTURE_WRAP_S => "GL_TEXTURE_WRAP_S",
        gl::TEXTURE_WRAP_T => "GL_TEXTURE_WRAP_T",
        gl::TEXTURE_WRAP_R => "GL_TEXTURE_WRAP_R",
        gl::UNPACK_ALIGNMENT => "GL_UNPACK_ALIGNMENT",
        gl::RGB => "GL_RGB",
        gl::RGB8 => "GL_RGB8",
        gl::RGB32F => "GL_RGB32F",
        gl::UNSIGNED_BYTE => "GL_UNSIGNED_BYTE",
        gl::UNSIGNED_INT => "GL_UNSIGNED_INT",
        gl::FLOAT => "GL_FLOAT",
        gl::TRIANGLES => "GL_TRIANGLES",
        gl::DEPTH_TEST => "GL_DEPTH_TEST",
        gl::POLYGON_OFFSET_LINE => "GL_POLYGON_OFFSET_LINE",
        gl::FRONT_AND_BACK => "GL_FRONT_AND_BACK",
        gl::FILL => "GL_FILL",
        gl::LINE => "GL_LINE",
        gl::VENDOR => "GL_VENDOR",
        gl::RENDERER => "GL_RENDERER",
        gl::VERSION => "GL_VERSION",
        _ => return Cow::Owned(format!("0x{:04X}", value)),
    };
    Cow::Borrowed(name)
}

impl<A: GlApi, S: TraceSink> GlApi for Traced<A, S> {
    fn create_shader(&self, kind: GLenum) -> GLuint {
        let shader = self.inner.create_shader(kind);
        self.trace(format_args!("glCreateShader({}) -> {}", enum_name(kind), shader));
        shader
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        self.trace(format_args!("glShaderSource({}, 1, <{} bytes>, NULL)", shader, source.len()));
        self.inner.shader_source(shader, source)
    }

    fn compile_shader(&self, shader: GLuint) {
        self.trace(format_args!("glCompileShader({})", shader));
        self.inner.compile_shader(shader)
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let log = self.inner.shader_info_log(shader);
        self.trace(format_args!("glGetShaderInfoLog({}) -> <{} bytes>", shader, log.len()));
        log
    }

    fn delete_shader(&self, shader: GLuint) {
        self.trace(format_args!("glDeleteShader({})", shader));
        self.inner.delete_shader(shader)
    }

    fn create_program(&self) -> GLuint {
        let program = self.inner.create_program();
        self.trace(format_args!("glCreateProgram() -> {}", program));
        program
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        self.trace(format_args!("glAttachShader({}, {})", program, shader));
        self.inner.attach_shader(program, shader)
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        self.trace(format_args!("glDetachShader({}, {})", program, shader));
        self.inner.detach_shader(program, shader)
    }

    fn link_program(&self, program: GLuint) {
        self.trace(format_args!("glLinkProgram({})", program));
        self.inner.link_program(program)
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let log = self.inner.program_info_log(program);
        self.trace(format_args!("glGetProgramInfoLog({}) -> <{} bytes>", program, log.len()));
        log
    }

    fn use_program(&self, program: GLuint) {
        self.trace(format_args!("glUseProgram({})", program));
        self.inner.use_program(program)
    }

    fn delete_program(&self, program: GLuint) {
        self.trace(format_args!("glDeleteProgram({})", program));
        self.inner.delete_program(program)
    }

    fn create_buffer(&self) -> GLuint {
        let buffer = self.inner.create_buffer();
        self.trace(format_args!("glCreateBuffers(1) -> {}", buffer));
        buffer
    }

    fn named_buffer_storage(&self, buffer: GLuint, size: usize, data: Option<&[u8]>, flags: GLbitfield) {
        let data_desc = if data.is_some() { "<data>" } else { "NULL" };
        self.trace(format_args!("glNamedBufferStorage({}, {}, {}, 0x{:X})", buffer, size, data_desc, flags));
        self.inner.named_buffer_storage(buffer, size, data, flags)
    }

    fn named_buffer_sub_data(&self, buffer: GLuint, offset: usize, data: &[u8]) {
        self.trace(format_args!("glNamedBufferSubData({}, {}, {}, <data>)", buffer, offset, data.len()));
        self.inner.named_buffer_sub_data(buffer, offset, data)
    }

    fn get_named_buffer_sub_data(&self, buffer: GLuint, offset: usize, out: &mut [u8]) {
        self.trace(format_args!("glGetNamedBufferSubData({}, {}, {}, <out>)", buffer, offset, out.len()));
        self.inner.get_named_buffer_sub_data(buffer, offset, out)
    }

    fn bind_buffer_range(&self, target: GLenum, index: GLuint, buffer: GLuint, offset: usize, size: usize) {
        self.trace(format_args!("glBindBufferRange({}, {}, {}, {}, {})", enum_name(target), index, buffer, offset, size));
        self.inner.bind_buffer_range(target, index, buffer, offset, size)
    }

    fn bind_buffer_base(&self, target: GLenum, index: GLuint, buffer: GLuint) {
        self.trace(format_args!("glBindBufferBase({}, {}, {})", enum_name(target), index, buffer));
        self.inner.bind_buffer_base(target, index, buffer)
    }

    fn delete_buffer(&self, buffer: GLuint) {
        self.trace(format_args!("glDeleteBuffers(1, [{}])", buffer));
        self.inner.delete_buffer(buffer)
    }

    fn create_vertex_array(&self) -> GLuint {
        let vao = self.inner.create_vertex_array();
        self.trace(format_args!("glCreateVertexArrays(1) -> {}", vao));
        vao
    }

    fn bind_vertex_array(&self, vao: GLuint) {
        self.trace(format_args!("glBindVertexArray({})", vao));
        self.inner.bind_vertex_array(vao)
    }

    fn vertex_array_element_buffer(&self, vao: GLuint, buffer: GLuint) {
        self.trace(format_args!("glVertexArrayElementBuffer({}, {})", vao, buffer));
        self.inner.vertex_array_element_buffer(vao, buffer)
    }

    fn delete_vertex_array(&self, vao: GLuint) {
        self.trace(format_args!("glDeleteVertexArrays(1, [{}])", vao));
        self.inner.delete_vertex_array(vao)
    }

    fn create_texture(&self, target: GLenum) -> GLuint {
        let texture = self.inner.create_texture(target);
        self.trace(format_args!("glCreateTextures({}, 1) -> {}", enum_name(target), texture));
        texture
    }

    fn texture_parameter_i(&self, texture: GLuint, pname: GLenum, param: GLint) {
        self.trace(format_args!("glTextureParameteri({}, {}, {})", texture, enum_name(pname), param));
        self.inner.texture_parameter_i(texture, pname, param)
    }

    fn texture_storage_2d(&self, texture: GLuint, levels: GLsizei, internal_format: GLenum, width: GLsizei, height: GLsizei) {
        self.trace(format_args!(
            "glTextureStorage2D({}, {}, {}, {}, {})",
            texture, levels, enum_name(internal_format), width, height
        ));
        self.inner.texture_storage_2d(texture, levels, internal_format, width, height)
    }

    fn texture_sub_image_2d(
        &self,
        texture: GLuint,
        level: GLint,
        offset: (GLint, GLint),
        size: (GLsizei, GLsizei),
        format: GLenum,
        kind: GLenum,
        pixels: &[u8],
    ) {
        self.trace(format_args!(
            "glTextureSubImage2D({}, {}, {}, {}, {}, {}, {}, {}, <{} bytes>)",
            texture, level, offset.0, offset.1, size.0, size.1, enum_name(format), enum_name(kind), pixels.len()
        ));
        self.inner.texture_sub_image_2d(texture, level, offset, size, format, kind, pixels)
    }

    fn texture_sub_image_3d(
        &self,
        texture: GLuint,
        level: GLint,
        offset: (GLint, GLint, GLint),
        size: (GLsizei, GLsizei, GLsizei),
        format: GLenum,
        kind: GLenum,
        pixels: &[u8],
    ) {
        self.trace(format_args!(
            "glTextureSubImage3D({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, <{} bytes>)",
            texture, level, offset.0, offset.1, offset.2, size.0, size.1, size.2,
            enum_name(format), enum_name(kind), pixels.len()
        ));
        self.inner.texture_sub_image_3d(texture, level, offset, size, format, kind, pixels)
    }

    fn pixel_store_i(&self, pname: GLenum, param: GLint) {
        self.trace(format_args!("glPixelStorei({}, {})", enum_name(pname), param));
        self.inner.pixel_store_i(pname, param)
    }

    fn bind_textures(&self, first: GLuint, textures: &[GLuint]) {
        self.trace(format_args!("glBindTextures({}, {}, {:?})", first, textures.len(), textures));
        self.inner.bind_textures(first, textures)
    }

    fn delete_texture(&self, texture: GLuint) {
        self.trace(format_args!("glDeleteTextures(1, [{}])", texture));
        self.inner.delete_texture(texture)
    }

    fn get_string(&self, name: GLenum) -> String {
        let value = self.inner.get_string(name);
        self.trace(format_args!("glGetString({}) -> {:?}", enum_name(name), value));
        value
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.trace(format_args!("glClearColor({}, {}, {}, {})", r, g, b, a));
        self.inner.clear_color(r, g, b, a)
    }

    fn clear(&self, mask: GLbitfield) {
        self.trace(format_args!("glClear(0x{:X})", mask));
        self.inner.clear(mask)
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.trace(format_args!("glViewport({}, {}, {}, {})", x, y, width, height));
        self.inner.viewport(x, y, width, height)
    }

    fn enable(&self, cap: GLenum) {
        self.trace(format_args!("glEnable({})", enum_name(cap)));
        self.inner.enable(cap)
    }

    fn polygon_offset(&self, factor: f32, units: f32) {
        self.trace(format_args!("glPolygonOffset({}, {})", factor, units));
        self.inner.polygon_offset(factor, units)
    }

    fn polygon_mode(&self, face: GLenum, mode: GLenum) {
        self.trace(format_args!("glPolygonMode({}, {})", enum_name(face), enum_name(mode)));
        self.inner.polygon_mode(face, mode)
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        self.trace(format_args!("glDrawArrays({}, {}, {})", enum_name(mode), first, count));
        self.inner.draw_arrays(mode, first, count)
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum, offset: usize) {
        self.trace(format_args!("glDrawElements({}, {}, {}, {})", enum_name(mode), count, enum_name(kind), offset));
        self.inner.draw_elements(mode, count, kind, offset)
    }
}
