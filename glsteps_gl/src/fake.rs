//! An in-memory stand-in for the driver.
//!
//! `FakeGl` hands out handles, keeps buffer contents in plain `Vec`s and writes down every
//! creation, deletion and attachment so tests can check the wrappers' bookkeeping without a
//! window or a GPU. Its "compiler" only knows two mistakes: a missing `#version` line and
//! unbalanced braces.

use std::cell::RefCell;
use std::collections::HashMap;

use gl::types::*;

use crate::api::GlApi;

/// A vertex shader the fake compiler accepts.
pub const MINIMAL_VERTEX: &str = "#version 460 core
void main() {
    gl_Position = vec4(0.0, 0.0, 0.0, 1.0);
}
";

/// A fragment shader the fake compiler accepts.
pub const MINIMAL_FRAGMENT: &str = "#version 460 core
layout (location=0) out vec4 out_FragColor;
void main() {
    out_FragColor = vec4(1.0);
}
";

/// Unterminated `main`, so compilation fails.
pub const BROKEN_SOURCE: &str = "#version 460 core
void main() {
    gl_Position = vec4(0.0)
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Shader,
    Program,
    Buffer,
    VertexArray,
    Texture,
}

#[derive(Debug, Clone, Default)]
pub struct FakeTexture {
    pub target: GLenum,
    pub params: Vec<(GLenum, GLint)>,
    pub storage: Option<(GLsizei, GLenum, GLsizei, GLsizei)>,
    /// `(layer, byte count)` for every sub-image upload; 2D uploads use layer 0.
    pub uploads: Vec<(GLint, usize)>,
}

#[derive(Default)]
struct FakeProgram {
    attached: Vec<GLuint>,
    attached_at_link: Vec<GLuint>,
    log: String,
}

#[derive(Default)]
struct State {
    next_handle: GLuint,
    live: HashMap<GLuint, Kind>,
    created: Vec<(Kind, GLuint)>,
    deleted: Vec<(Kind, GLuint)>,
    shaders: HashMap<GLuint, (GLenum, String)>,
    programs: HashMap<GLuint, FakeProgram>,
    buffers: HashMap<GLuint, Option<(Vec<u8>, GLbitfield)>>,
    vertex_arrays: HashMap<GLuint, Option<GLuint>>,
    textures: HashMap<GLuint, FakeTexture>,
    ranges: HashMap<(GLenum, GLuint), (GLuint, usize, usize)>,
    units: HashMap<GLuint, GLuint>,
    current_program: GLuint,
    bound_vertex_array: GLuint,
    pending_link_failure: Option<String>,
    calls: Vec<&'static str>,
    draws: Vec<(GLenum, GLsizei)>,
}

#[derive(Default)]
pub struct FakeGl {
    state: RefCell<State>,
}

impl FakeGl {
    pub fn new() -> Self {
        Self::default()
    }

    fn create(&self, kind: Kind, call: &'static str) -> GLuint {
        let mut st = self.state.borrow_mut();
        st.calls.push(call);
        st.next_handle += 1;
        let handle = st.next_handle;
        st.live.insert(handle, kind);
        st.created.push((kind, handle));
        handle
    }

    fn delete(&self, kind: Kind, handle: GLuint, call: &'static str) {
        let mut st = self.state.borrow_mut();
        st.calls.push(call);
        // Deleting zero is a silent no-op in GL
        if handle == 0 {
            return;
        }
        st.live.remove(&handle);
        st.deleted.push((kind, handle));
    }

    fn called(&self, call: &'static str) {
        self.state.borrow_mut().calls.push(call);
    }

    /// Makes the next `glLinkProgram` fail with `log`.
    pub fn fail_next_link(&self, log: &str) {
        self.state.borrow_mut().pending_link_failure = Some(log.to_string());
    }

    pub fn is_live(&self, kind: Kind, handle: GLuint) -> bool {
        self.state.borrow().live.get(&handle) == Some(&kind)
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    pub fn live_of(&self, kind: Kind) -> usize {
        self.state.borrow().live.values().filter(|k| **k == kind).count()
    }

    /// How many objects of `kind` were ever created.
    pub fn created(&self, kind: Kind) -> usize {
        self.state.borrow().created.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Every deleted handle of `kind`, in deletion order.
    pub fn deleted(&self, kind: Kind) -> Vec<GLuint> {
        self.state.borrow().deleted.iter().filter(|(k, _)| *k == kind).map(|(_, h)| *h).collect()
    }

    /// Every deletion of any kind, in order.
    pub fn deletion_order(&self) -> Vec<(Kind, GLuint)> {
        self.state.borrow().deleted.clone()
    }

    pub fn stage_of(&self, shader: GLuint) -> Option<GLenum> {
        self.state.borrow().shaders.get(&shader).map(|(kind, _)| *kind)
    }

    /// The shaders that were attached when `program` was linked, in attachment order.
    pub fn attached_at_link(&self, program: GLuint) -> Vec<GLuint> {
        self.state.borrow().programs.get(&program).map(|p| p.attached_at_link.clone()).unwrap_or_default()
    }

    pub fn buffer_contents(&self, buffer: GLuint) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).and_then(|b| b.as_ref().map(|(data, _)| data.clone()))
    }

    pub fn buffer_flags(&self, buffer: GLuint) -> Option<GLbitfield> {
        self.state.borrow().buffers.get(&buffer).and_then(|b| b.as_ref().map(|(_, flags)| *flags))
    }

    /// `(buffer, offset, size)` bound at `index` of `target`. `bind_buffer_base` records size 0.
    pub fn binding(&self, target: GLenum, index: GLuint) -> Option<(GLuint, usize, usize)> {
        self.state.borrow().ranges.get(&(target, index)).copied()
    }

    pub fn element_buffer_of(&self, vao: GLuint) -> Option<GLuint> {
        self.state.borrow().vertex_arrays.get(&vao).copied().flatten()
    }

    pub fn texture(&self, texture: GLuint) -> Option<FakeTexture> {
        self.state.borrow().textures.get(&texture).cloned()
    }

    pub fn texture_at_unit(&self, unit: GLuint) -> Option<GLuint> {
        self.state.borrow().units.get(&unit).copied()
    }

    pub fn current_program(&self) -> GLuint {
        self.state.borrow().current_program
    }

    pub fn bound_vertex_array(&self) -> GLuint {
        self.state.borrow().bound_vertex_array
    }

    /// `(mode, count)` of every draw call.
    pub fn draws(&self) -> Vec<(GLenum, GLsizei)> {
        self.state.borrow().draws.clone()
    }

    /// The GL names of every call made so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.borrow().calls.clone()
    }

    pub fn count_of(&self, call: &str) -> usize {
        self.state.borrow().calls.iter().filter(|c| **c == call).count()
    }
}

fn fake_compile(source: &str) -> String {
    if !source.trim_start().starts_with("#version") {
        return String::from("0:1(1): error: missing #version directive\n");
    }

    let mut depth = 0i32;
    for (n, line) in source.lines().enumerate() {
        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return format!("0:{}(1): error: syntax error, unexpected '}}'\n", n + 1);
            }
        }
    }

    if depth != 0 {
        let lines = source.lines().count();
        return format!("0:{}(1): error: syntax error, unexpected end of file\n", lines + 1);
    }

    String::new()
}

impl GlApi for FakeGl {
    fn create_shader(&self, kind: GLenum) -> GLuint {
        let handle = self.create(Kind::Shader, "glCreateShader");
        self.state.borrow_mut().shaders.insert(handle, (kind, String::new()));
        handle
    }

    fn shader_source(&self, shader: GLuint, source: &str) {
        self.called("glShaderSource");
        let mut st = self.state.borrow_mut();
        if let Some(entry) = st.shaders.get_mut(&shader) {
            entry.1 = source.to_string();
        }
    }

    fn compile_shader(&self, _shader: GLuint) {
        self.called("glCompileShader");
    }

    fn shader_info_log(&self, shader: GLuint) -> String {
        self.called("glGetShaderInfoLog");
        self.state.borrow().shaders.get(&shader).map(|(_, src)| fake_compile(src)).unwrap_or_default()
    }

    fn delete_shader(&self, shader: GLuint) {
        self.delete(Kind::Shader, shader, "glDeleteShader");
    }

    fn create_program(&self) -> GLuint {
        let handle = self.create(Kind::Program, "glCreateProgram");
        self.state.borrow_mut().programs.insert(handle, FakeProgram::default());
        handle
    }

    fn attach_shader(&self, program: GLuint, shader: GLuint) {
        self.called("glAttachShader");
        let mut st = self.state.borrow_mut();
        if let Some(p) = st.programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: GLuint, shader: GLuint) {
        self.called("glDetachShader");
        let mut st = self.state.borrow_mut();
        if let Some(p) = st.programs.get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: GLuint) {
        self.called("glLinkProgram");
        let mut st = self.state.borrow_mut();
        let pending = st.pending_link_failure.take();

        let attached = match st.programs.get(&program) {
            Some(p) => p.attached.clone(),
            None => return,
        };
        let stages = attached.iter()
            .filter_map(|s| st.shaders.get(s))
            .map(|(kind, src)| (*kind, fake_compile(src)))
            .collect::<Vec<_>>();

        let log = if let Some(log) = pending {
            log
        } else if attached.is_empty() {
            String::from("error: no shaders attached\n")
        } else if stages.iter().any(|(_, log)| !log.is_empty()) {
            String::from("error: linking with uncompiled/unspecialized shader\n")
        } else if stages.iter().any(|(k, _)| *k == gl::COMPUTE_SHADER) && stages.len() > 1 {
            String::from("error: compute shaders cannot be linked with other stages\n")
        } else {
            String::new()
        };

        if let Some(p) = st.programs.get_mut(&program) {
            p.attached_at_link = attached;
            p.log = log;
        }
    }

    fn program_info_log(&self, program: GLuint) -> String {
        self.called("glGetProgramInfoLog");
        self.state.borrow().programs.get(&program).map(|p| p.log.clone()).unwrap_or_default()
    }

    fn use_program(&self, program: GLuint) {
        self.called("glUseProgram");
        self.state.borrow_mut().current_program = program;
    }

    fn delete_program(&self, program: GLuint) {
        self.delete(Kind::Program, program, "glDeleteProgram");
    }

    fn create_buffer(&self) -> GLuint {
        let handle = self.create(Kind::Buffer, "glCreateBuffers");
        self.state.borrow_mut().buffers.insert(handle, None);
        handle
    }

    fn named_buffer_storage(&self, buffer: GLuint, size: usize, data: Option<&[u8]>, flags: GLbitfield) {
        self.called("glNamedBufferStorage");
        let contents = match data {
            Some(bytes) => {
                assert_eq!(bytes.len(), size, "initial data must cover the whole buffer");
                bytes.to_vec()
            }
            None => vec![0; size],
        };
        self.state.borrow_mut().buffers.insert(buffer, Some((contents, flags)));
    }

    fn named_buffer_sub_data(&self, buffer: GLuint, offset: usize, data: &[u8]) {
        self.called("glNamedBufferSubData");
        let mut st = self.state.borrow_mut();
        let (storage, flags) = st.buffers.get_mut(&buffer)
            .and_then(Option::as_mut)
            .expect("glNamedBufferSubData on a buffer without storage");
        // GL_INVALID_OPERATION: storage is immutable
        if *flags & gl::DYNAMIC_STORAGE_BIT == 0 {
            return;
        }
        storage[offset..offset + data.len()].copy_from_slice(data);
    }

    fn get_named_buffer_sub_data(&self, buffer: GLuint, offset: usize, out: &mut [u8]) {
        self.called("glGetNamedBufferSubData");
        let st = self.state.borrow();
        let (storage, _) = st.buffers.get(&buffer)
            .and_then(Option::as_ref)
            .expect("glGetNamedBufferSubData on a buffer without storage");
        let len = out.len();
        out.copy_from_slice(&storage[offset..offset + len]);
    }

    fn bind_buffer_range(&self, target: GLenum, index: GLuint, buffer: GLuint, offset: usize, size: usize) {
        self.called("glBindBufferRange");
        self.state.borrow_mut().ranges.insert((target, index), (buffer, offset, size));
    }

    fn bind_buffer_base(&self, target: GLenum, index: GLuint, buffer: GLuint) {
        self.called("glBindBufferBase");
        self.state.borrow_mut().ranges.insert((target, index), (buffer, 0, 0));
    }

    fn delete_buffer(&self, buffer: GLuint) {
        self.delete(Kind::Buffer, buffer, "glDeleteBuffers");
    }

    fn create_vertex_array(&self) -> GLuint {
        let handle = self.create(Kind::VertexArray, "glCreateVertexArrays");
        self.state.borrow_mut().vertex_arrays.insert(handle, None);
        handle
    }

    fn bind_vertex_array(&self, vao: GLuint) {
        self.called("glBindVertexArray");
        self.state.borrow_mut().bound_vertex_array = vao;
    }

    fn vertex_array_element_buffer(&self, vao: GLuint, buffer: GLuint) {
        self.called("glVertexArrayElementBuffer");
        self.state.borrow_mut().vertex_arrays.insert(vao, Some(buffer));
    }

    fn delete_vertex_array(&self, vao: GLuint) {
        self.delete(Kind::VertexArray, vao, "glDeleteVertexArrays");
    }

    fn create_texture(&self, target: GLenum) -> GLuint {
        let handle = self.create(Kind::Texture, "glCreateTextures");
        self.state.borrow_mut().textures.insert(handle, FakeTexture { target, ..FakeTexture::default() });
        handle
    }

    fn texture_parameter_i(&self, texture: GLuint, pname: GLenum, param: GLint) {
        self.called("glTextureParameteri");
        if let Some(t) = self.state.borrow_mut().textures.get_mut(&texture) {
            t.params.push((pname, param));
        }
    }

    fn texture_storage_2d(&self, texture: GLuint, levels: GLsizei, internal_format: GLenum, width: GLsizei, height: GLsizei) {
        self.called("glTextureStorage2D");
        if let Some(t) = self.state.borrow_mut().textures.get_mut(&texture) {
            t.storage = Some((levels, internal_format, width, height));
        }
    }

    fn texture_sub_image_2d(
        &self,
        texture: GLuint,
        _level: GLint,
        _offset: (GLint, GLint),
        _size: (GLsizei, GLsizei),
        _format: GLenum,
        _kind: GLenum,
        pixels: &[u8],
    ) {
        self.called("glTextureSubImage2D");
        if let Some(t) = self.state.borrow_mut().textures.get_mut(&texture) {
            t.uploads.push((0, pixels.len()));
        }
    }

    fn texture_sub_image_3d(
        &self,
        texture: GLuint,
        _level: GLint,
        offset: (GLint, GLint, GLint),
        _size: (GLsizei, GLsizei, GLsizei),
        _format: GLenum,
        _kind: GLenum,
        pixels: &[u8],
    ) {
        self.called("glTextureSubImage3D");
        if let Some(t) = self.state.borrow_mut().textures.get_mut(&texture) {
            t.uploads.push((offset.2, pixels.len()));
        }
    }

    fn pixel_store_i(&self, _pname: GLenum, _param: GLint) {
        self.called("glPixelStorei");
    }

    fn bind_textures(&self, first: GLuint, textures: &[GLuint]) {
        self.called("glBindTextures");
        let mut st = self.state.borrow_mut();
        for (i, tex) in textures.iter().enumerate() {
            st.units.insert(first + i as GLuint, *tex);
        }
    }

    fn delete_texture(&self, texture: GLuint) {
        self.delete(Kind::Texture, texture, "glDeleteTextures");
    }

    fn get_string(&self, name: GLenum) -> String {
        self.called("glGetString");
        match name {
            gl::VENDOR => String::from("glkit"),
            gl::RENDERER => String::from("FakeGl"),
            gl::VERSION => String::from("4.6.0 fake"),
            _ => String::new(),
        }
    }

    fn clear_color(&self, _r: f32, _g: f32, _b: f32, _a: f32) {
        self.called("glClearColor");
    }

    fn clear(&self, _mask: GLbitfield) {
        self.called("glClear");
    }

    fn viewport(&self, _x: GLint, _y: GLint, _width: GLsizei, _height: GLsizei) {
        self.called("glViewport");
    }

    fn enable(&self, _cap: GLenum) {
        self.called("glEnable");
    }

    fn polygon_offset(&self, _factor: f32, _units: f32) {
        self.called("glPolygonOffset");
    }

    fn polygon_mode(&self, _face: GLenum, _mode: GLenum) {
        self.called("glPolygonMode");
    }

    fn draw_arrays(&self, mode: GLenum, _first: GLint, count: GLsizei) {
        self.called("glDrawArrays");
        self.state.borrow_mut().draws.push((mode, count));
    }

    fn draw_elements(&self, mode: GLenum, count: GLsizei, _kind: GLenum, _offset: usize) {
        self.called("glDrawElements");
        self.state.borrow_mut().draws.push((mode, count));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fake_compiler_accepts_the_minimal_pair() {
        assert!(fake_compile(MINIMAL_VERTEX).is_empty());
        assert!(fake_compile(MINIMAL_FRAGMENT).is_empty());
    }

    #[test]
    fn fake_compiler_points_at_the_end_of_an_unterminated_block() {
        assert!(fake_compile(BROKEN_SOURCE).starts_with("0:4(1): error"));
        assert!(fake_compile("void main() {}").contains("#version"));
    }

    #[test]
    fn sub_data_leaves_immutable_storage_alone() {
        let gl = FakeGl::new();
        let fixed = gl.create_buffer();
        gl.named_buffer_storage(fixed, 2, Some(&[1, 2]), 0);
        let dynamic = gl.create_buffer();
        gl.named_buffer_storage(dynamic, 2, Some(&[1, 2]), gl::DYNAMIC_STORAGE_BIT);

        gl.named_buffer_sub_data(fixed, 0, &[7]);
        gl.named_buffer_sub_data(dynamic, 0, &[7]);

        assert_eq!(gl.buffer_contents(fixed), Some(vec![1, 2]));
        assert_eq!(gl.buffer_contents(dynamic), Some(vec![7, 2]));
    }

    #[test]
    fn handles_are_unique_and_never_zero() {
        let gl = FakeGl::new();
        let a = gl.create_buffer();
        let b = gl.create_shader(gl::VERTEX_SHADER);
        gl.delete_buffer(a);
        let c = gl.create_texture(gl::TEXTURE_2D);

        assert!(a != 0 && b != 0 && c != 0);
        assert!(a != b && b != c && a != c);
    }
}
