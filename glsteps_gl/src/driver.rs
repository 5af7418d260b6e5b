//! The real driver, reached through the `gl` crate's global function table.

use std::ffi::{c_void, CStr};
use std::marker::PhantomData;
use std::ptr::null;

use gl::types::*;

use crate::api::GlApi;
use crate::error::GlError;

/// Entry points that must resolve for the wrappers to work. Checked once in [`DriverGl::load`].
const REQUIRED: &[(&str, fn() -> bool)] = &[
    ("glCreateShader", gl::CreateShader::is_loaded),
    ("glShaderSource", gl::ShaderSource::is_loaded),
    ("glCompileShader", gl::CompileShader::is_loaded),
    ("glGetShaderInfoLog", gl::GetShaderInfoLog::is_loaded),
    ("glCreateProgram", gl::CreateProgram::is_loaded),
    ("glLinkProgram", gl::LinkProgram::is_loaded),
    ("glCreateBuffers", gl::CreateBuffers::is_loaded),
    ("glNamedBufferStorage", gl::NamedBufferStorage::is_loaded),
    ("glNamedBufferSubData", gl::NamedBufferSubData::is_loaded),
    ("glGetNamedBufferSubData", gl::GetNamedBufferSubData::is_loaded),
    ("glCreateVertexArrays", gl::CreateVertexArrays::is_loaded),
    ("glVertexArrayElementBuffer", gl::VertexArrayElementBuffer::is_loaded),
    ("glCreateTextures", gl::CreateTextures::is_loaded),
    ("glTextureStorage2D", gl::TextureStorage2D::is_loaded),
    ("glTextureSubImage2D", gl::TextureSubImage2D::is_loaded),
    ("glTextureSubImage3D", gl::TextureSubImage3D::is_loaded),
    ("glBindTextures", gl::BindTextures::is_loaded),
];

/// OpenGL as loaded from the current context.
///
/// The `gl` crate keeps its function pointers in globals, so there is nothing to store here. The
/// marker keeps the type off other threads, since the context is only current on this one.
pub struct DriverGl {
    _not_send: PhantomData<*const ()>,
}

impl DriverGl {
    /// Fills the function table through `loader` (usually the windowing library's
    /// `get_proc_address`) and checks the 4.5 entry points the wrappers depend on.
    ///
    /// # Safety
    ///
    /// A context must be current on the calling thread, and every `DriverGl` method must be called
    /// while it still is.
    pub unsafe fn load<F>(mut loader: F) -> Result<Self, GlError>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(|name| loader(name));

        for (name, is_loaded) in REQUIRED {
            if !is_loaded() {
                return Err(GlError::MissingEntryPoint(*name));
            }
        }

        Ok(Self { _not_send: PhantomData })
    }

    /// Routes driver debug messages to `log` under the `glkit::debug` target. Only debug contexts
    /// produce them, so this returns `false` and does nothing on any other context.
    pub fn enable_debug_output(&self) -> bool {
        if !gl::DebugMessageCallback::is_loaded() {
            return false;
        }

        let mut flags = 0;
        unsafe { gl::GetIntegerv(gl::CONTEXT_FLAGS, &mut flags) };
        if flags as GLenum & gl::CONTEXT_FLAG_DEBUG_BIT == 0 {
            return false;
        }

        unsafe {
            gl::Enable(gl::DEBUG_OUTPUT);
            // Messages arrive on the calling thread, inside the offending call
            gl::Enable(gl::DEBUG_OUTPUT_SYNCHRONOUS);
            gl::DebugMessageCallback(Some(forward_debug_message), null());
        }
        log::debug!("forwarding OpenGL debug output");
        true
    }
}

/// The `log` level a debug message of `severity` is reported at.
fn debug_level(severity: GLenum) -> log::Level {
    match severity {
        gl::DEBUG_SEVERITY_HIGH => log::Level::Error,
        gl::DEBUG_SEVERITY_MEDIUM => log::Level::Warn,
        gl::DEBUG_SEVERITY_LOW => log::Level::Info,
        _ => log::Level::Debug,
    }
}

fn debug_source_name(source: GLenum) -> &'static str {
    match source {
        gl::DEBUG_SOURCE_API => "api",
        gl::DEBUG_SOURCE_WINDOW_SYSTEM => "window system",
        gl::DEBUG_SOURCE_SHADER_COMPILER => "shader compiler",
        gl::DEBUG_SOURCE_THIRD_PARTY => "third party",
        gl::DEBUG_SOURCE_APPLICATION => "application",
        _ => "other",
    }
}

extern "system" fn forward_debug_message(
    source: GLenum,
    _kind: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    _user: *mut c_void,
) {
    if message.is_null() {
        return;
    }

    // A negative length means the message is nul-terminated
    let text = if length < 0 {
        unsafe { CStr::from_ptr(message) }.to_string_lossy()
    } else {
        let bytes = unsafe { std::slice::from_raw_parts(message as *const u8, length as usize) };
        String::from_utf8_lossy(bytes)
    };

    log::log!(target: "glkit::debug", debug_level(severity), "[{} {}] {}", debug_source_name(source), id, text.trim_end());
}

/// Reads an info log of `len` bytes (including the terminator) through `fill`.
fn read_info_log<F>(len: GLint, fill: F) -> String
where
    F: FnOnce(GLsizei, *mut GLsizei, *mut GLchar),
{
    if len <= 1 {
        return String::new();
    }

    let mut buf = vec![0u8; len as usize];
    let mut written: GLsizei = 0;
    fill(len, &mut written, buf.as_mut_ptr() as *mut GLchar);
    buf.truncate(written.max(0) as usize);

    String::from_utf8_lossy(&buf).into_owned()
}

impl GlApi for DriverGl {
    fn create_shader(&self, kind: GLenum) -> GLuint {
        unsafe { gl::CreateShader(kind) }
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        // Pass the length explicitly so the source needs no terminator
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        unsafe { gl::ShaderSource(shader, 1, &ptr, &len) }
    }

    fn compile_shader(&self, shader: GLuint) {
        unsafe { gl::CompileShader(shader) }
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        let mut len = 0;
        unsafe { gl::GetShaderiv(shader, gl::INFO_LOG_LENGTH, &mut len) };
        read_info_log(len, |cap, written, buf| unsafe { gl::GetShaderInfoLog(shader, cap, written, buf) })
    }

    fn delete_shader(&self, shader: GLuint) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        unsafe { gl::DetachShader(program, shader) }
    }

    fn link_program(&self, program: GLuint) {
        unsafe { gl::LinkProgram(program) }
    }

    fn program_info_log(&self, program: GLuint) -> String {
        let mut len = 0;
        unsafe { gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len) };
        read_info_log(len, |cap, written, buf| unsafe { gl::GetProgramInfoLog(program, cap, written, buf) })
    }

    fn use_program(&self, program: GLuint) {
        unsafe { gl::UseProgram(program) }
    }

    fn delete_program(&self, program: GLuint) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn create_buffer(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::CreateBuffers(1, &mut id) };
        id
    }

    fn named_buffer_storage(&self, buffer: GLuint, size: usize, data: Option<&[u8]>, flags: GLbitfield) {
        let ptr = data.map_or(null(), |d| d.as_ptr() as *const c_void);
        unsafe { gl::NamedBufferStorage(buffer, size as GLsizeiptr, ptr, flags) }
    }

    fn named_buffer_sub_data(&self, buffer: GLuint, offset: usize, data: &[u8]) {
        unsafe {
            gl::NamedBufferSubData(
                buffer,
                offset as GLintptr,
                data.len() as GLsizeiptr,
                data.as_ptr() as *const c_void,
            )
        }
    }

    fn get_named_buffer_sub_data(&self, buffer: GLuint, offset: usize, out: &mut [u8]) {
        unsafe {
            gl::GetNamedBufferSubData(
                buffer,
                offset as GLintptr,
                out.len() as GLsizeiptr,
                out.as_mut_ptr() as *mut c_void,
            )
        }
    }

    fn bind_buffer_range(&self, target: GLenum, index: GLuint, buffer: GLuint, offset: usize, size: usize) {
        unsafe { gl::BindBufferRange(target, index, buffer, offset as GLintptr, size as GLsizeiptr) }
    }

    fn bind_buffer_base(&self, target: GLenum, index: GLuint, buffer: GLuint) {
        unsafe { gl::BindBufferBase(target, index, buffer) }
    }

    fn delete_buffer(&self, buffer: GLuint) {
        unsafe { gl::DeleteBuffers(1, &buffer) }
    }

    fn create_vertex_array(&self) -> GLuint {
        let mut id = 0;
        unsafe { gl::CreateVertexArrays(1, &mut id) };
        id
    }

    fn bind_vertex_array(&self, vao: GLuint) {
        unsafe { gl::BindVertexArray(vao) }
    }

    fn vertex_array_element_buffer(&self, vao: GLuint, buffer: GLuint) {
        unsafe { gl::VertexArrayElementBuffer(vao, buffer) }
    }

    fn delete_vertex_array(&self, vao: GLuint) {
        unsafe { gl::DeleteVertexArrays(1, &vao) }
    }

    fn create_texture(&self, target: GLenum) -> GLuint {
        let mut id = 0;
        unsafe { gl::CreateTextures(target, 1, &mut id) };
        id
    }

    fn texture_parameter_i(&self, texture: GLuint, pname: GLenum, param: GLint) {
        unsafe { gl::TextureParameteri(texture, pname, param) }
    }

    fn texture_storage_2d(&self, texture: GLuint, levels: GLsizei, internal_format: GLenum, width: GLsizei, height: GLsizei) {
        unsafe { gl::TextureStorage2D(texture, levels, internal_format, width, height) }
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
        unsafe {
            gl::TextureSubImage2D(
                texture,
                level,
                offset.0,
                offset.1,
                size.0,
                size.1,
                format,
                kind,
                pixels.as_ptr() as *const c_void,
            )
        }
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
        unsafe {
            gl::TextureSubImage3D(
                texture,
                level,
                offset.0,
                offset.1,
                offset.2,
                size.0,
                size.1,
                size.2,
                format,
                kind,
                pixels.as_ptr() as *const c_void,
            )
        }
    }

    fn pixel_store_i(&self, pname: GLenum, param: GLint) {
        unsafe { gl::PixelStorei(pname, param) }
    }

    fn bind_textures(&self, first: GLuint, textures: &[GLuint]) {
        unsafe { gl::BindTextures(first, textures.len() as GLsizei, textures.as_ptr()) }
    }

    fn delete_texture(&self, texture: GLuint) {
        unsafe { gl::DeleteTextures(1, &texture) }
    }

    fn get_string(&self, name: GLenum) -> String {
        unsafe {
            let ptr = gl::GetString(name);
            if ptr.is_null() {
                return String::new();
            }
            CStr::from_ptr(ptr as *const _).to_string_lossy().into_owned()
        }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { gl::ClearColor(r, g, b, a) }
    }

    fn clear(&self, mask: GLbitfield) {
        unsafe { gl::Clear(mask) }
    }

    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        unsafe { gl::Viewport(x, y, width, height) }
    }

    fn enable(&self, cap: GLenum) {
        unsafe { gl::Enable(cap) }
    }

    fn polygon_offset(&self, factor: f32, units: f32) {
        unsafe { gl::PolygonOffset(factor, units) }
    }

    fn polygon_mode(&self, face: GLenum, mode: GLenum) {
        unsafe { gl::PolygonMode(face, mode) }
    }

    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) {
        unsafe { gl::DrawArrays(mode, first, count) }
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum, offset: usize) {
        unsafe { gl::DrawElements(mode, count, kind, offset as *const c_void) }
    }
}
