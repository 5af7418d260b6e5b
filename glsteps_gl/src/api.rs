//! The capability trait every wrapper in this crate is written against.
//!
//! Each method maps to exactly one OpenGL entry point (named in its doc line) and takes Rust slices
//! where the C API takes a pointer and a length. Implementations must only be used while the
//! context they were loaded from is current on the calling thread.

use gl::types::*;

pub trait GlApi {
    // shaders

    /// `glCreateShader`
    fn create_shader(&self, kind: GLenum) -> GLuint;
    /// `glShaderSource`, with a single source string.
    fn shader_source(&self, shader: GLuint, source: &str);
    /// `glCompileShader`
    fn compile_shader(&self, shader: GLuint);
    /// `glGetShaderInfoLog`. Empty when the driver had nothing to say.
    fn shader_info_log(&self, shader: GLuint) -> String;
    /// `glDeleteShader`
    fn delete_shader(&self, shader: GLuint);

    // programs

    /// `glCreateProgram`
    fn create_program(&self) -> GLuint;
    /// `glAttachShader`
    fn attach_shader(&self, program: GLuint, shader: GLuint);
    /// `glDetachShader`
    fn detach_shader(&self, program: GLuint, shader: GLuint);
    /// `glLinkProgram`
    fn link_program(&self, program: GLuint);
    /// `glGetProgramInfoLog`. Empty when the driver had nothing to say.
    fn program_info_log(&self, program: GLuint) -> String;
    /// `glUseProgram`
    fn use_program(&self, program: GLuint);
    /// `glDeleteProgram`
    fn delete_program(&self, program: GLuint);

    // buffers

    /// `glCreateBuffers` for a single buffer.
    fn create_buffer(&self) -> GLuint;
    /// `glNamedBufferStorage`. When `data` is `Some`, its length equals `size`.
    fn named_buffer_storage(&self, buffer: GLuint, size: usize, data: Option<&[u8]>, flags: GLbitfield);
    /// `glNamedBufferSubData`
    fn named_buffer_sub_data(&self, buffer: GLuint, offset: usize, data: &[u8]);
    /// `glGetNamedBufferSubData`, filling all of `out`.
    fn get_named_buffer_sub_data(&self, buffer: GLuint, offset: usize, out: &mut [u8]);
    /// `glBindBufferRange`
    fn bind_buffer_range(&self, target: GLenum, index: GLuint, buffer: GLuint, offset: usize, size: usize);
    /// `glBindBufferBase`
    fn bind_buffer_base(&self, target: GLenum, index: GLuint, buffer: GLuint);
    /// `glDeleteBuffers` for a single buffer.
    fn delete_buffer(&self, buffer: GLuint);

    // vertex arrays

    /// `glCreateVertexArrays` for a single array.
    fn create_vertex_array(&self) -> GLuint;
    /// `glBindVertexArray`
    fn bind_vertex_array(&self, vao: GLuint);
    /// `glVertexArrayElementBuffer`
    fn vertex_array_element_buffer(&self, vao: GLuint, buffer: GLuint);
    /// `glDeleteVertexArrays` for a single array.
    fn delete_vertex_array(&self, vao: GLuint);

    // textures

    /// `glCreateTextures` for a single texture.
    fn create_texture(&self, target: GLenum) -> GLuint;
    /// `glTextureParameteri`
    fn texture_parameter_i(&self, texture: GLuint, pname: GLenum, param: GLint);
    /// `glTextureStorage2D`
    fn texture_storage_2d(&self, texture: GLuint, levels: GLsizei, internal_format: GLenum, width: GLsizei, height: GLsizei);
    /// `glTextureSubImage2D`
    fn texture_sub_image_2d(
        &self,
        texture: GLuint,
        level: GLint,
        offset: (GLint, GLint),
        size: (GLsizei, GLsizei),
        format: GLenum,
        kind: GLenum,
        pixels: &[u8],
    );
    /// `glTextureSubImage3D`. Cube map faces are layers along z.
    fn texture_sub_image_3d(
        &self,
        texture: GLuint,
        level: GLint,
        offset: (GLint, GLint, GLint),
        size: (GLsizei, GLsizei, GLsizei),
        format: GLenum,
        kind: GLenum,
        pixels: &[u8],
    );
    /// `glPixelStorei`
    fn pixel_store_i(&self, pname: GLenum, param: GLint);
    /// `glBindTextures`, starting at unit `first`.
    fn bind_textures(&self, first: GLuint, textures: &[GLuint]);
    /// `glDeleteTextures` for a single texture.
    fn delete_texture(&self, texture: GLuint);

    // state and drawing

    /// `glGetString`. Empty if the driver returns null.
    fn get_string(&self, name: GLenum) -> String;
    /// `glClearColor`
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    /// `glClear`
    fn clear(&self, mask: GLbitfield);
    /// `glViewport`
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    /// `glEnable`
    fn enable(&self, cap: GLenum);
    /// `glPolygonOffset`
    fn polygon_offset(&self, factor: f32, units: f32);
    /// `glPolygonMode`
    fn polygon_mode(&self, face: GLenum, mode: GLenum);
    /// `glDrawArrays`
    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei);
    /// `glDrawElements` with indices read from the bound element buffer at byte `offset`.
    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum, offset: usize);
}

/// Lets a borrowed implementation stand in wherever an owned one is expected, so a
/// [`Traced`](crate::Traced) can wrap a `&DriverGl` as easily as a `DriverGl`.
impl<'a, A: GlApi + ?Sized> GlApi for &'a A {
    fn create_shader(&self, kind: GLenum) -> GLuint { (**self).create_shader(kind) }
    fn shader_source(&self, shader: GLuint, source: &str) { (**self).shader_source(shader, source) }
    fn compile_shader(&self, shader: GLuint) { (**self).compile_shader(shader) }
    fn shader_info_log(&self, shader: GLuint) -> String { (**self).shader_info_log(shader) }
    fn delete_shader(&self, shader: GLuint) { (**self).delete_shader(shader) }

    fn create_program(&self) -> GLuint { (**self).create_program() }
    fn attach_shader(&self, program: GLuint, shader: GLuint) { (**self).attach_shader(program, shader) }
    fn detach_shader(&self, program: GLuint, shader: GLuint) { (**self).detach_shader(program, shader) }
    fn link_program(&self, program: GLuint) { (**self).link_program(program) }
    fn program_info_log(&self, program: GLuint) -> String { (**self).program_info_log(program) }
    fn use_program(&self, program: GLuint) { (**self).use_program(program) }
    fn delete_program(&self, program: GLuint) { (**self).delete_program(program) }

    fn create_buffer(&self) -> GLuint { (**self).create_buffer() }
    fn named_buffer_storage(&self, buffer: GLuint, size: usize, data: Option<&[u8]>, flags: GLbitfield) {
        (**self).named_buffer_storage(buffer, size, data, flags)
    }
    fn named_buffer_sub_data(&self, buffer: GLuint, offset: usize, data: &[u8]) {
        (**self).named_buffer_sub_data(buffer, offset, data)
    }
    fn get_named_buffer_sub_data(&self, buffer: GLuint, offset: usize, out: &mut [u8]) {
        (**self).get_named_buffer_sub_data(buffer, offset, out)
    }
    fn bind_buffer_range(&self, target: GLenum, index: GLuint, buffer: GLuint, offset: usize, size: usize) {
        (**self).bind_buffer_range(target, index, buffer, offset, size)
    }
    fn bind_buffer_base(&self, target: GLenum, index: GLuint, buffer: GLuint) {
        (**self).bind_buffer_base(target, index, buffer)
    }
    fn delete_buffer(&self, buffer: GLuint) { (**self).delete_buffer(buffer) }

    fn create_vertex_array(&self) -> GLuint { (**self).create_vertex_array() }
    fn bind_vertex_array(&self, vao: GLuint) { (**self).bind_vertex_array(vao) }
    fn vertex_array_element_buffer(&self, vao: GLuint, buffer: GLuint) {
        (**self).vertex_array_element_buffer(vao, buffer)
    }
    fn delete_vertex_array(&self, vao: GLuint) { (**self).delete_vertex_array(vao) }

    fn create_texture(&self, target: GLenum) -> GLuint { (**self).create_texture(target) }
    fn texture_parameter_i(&self, texture: GLuint, pname: GLenum, param: GLint) {
        (**self).texture_parameter_i(texture, pname, param)
    }
    fn texture_storage_2d(&self, texture: GLuint, levels: GLsizei, internal_format: GLenum, width: GLsizei, height: GLsizei) {
        (**self).texture_storage_2d(texture, levels, internal_format, width, height)
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
        (**self).texture_sub_image_2d(texture, level, offset, size, format, kind, pixels)
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
        (**self).texture_sub_image_3d(texture, level, offset, size, format, kind, pixels)
    }
    fn pixel_store_i(&self, pname: GLenum, param: GLint) { (**self).pixel_store_i(pname, param) }
    fn bind_textures(&self, first: GLuint, textures: &[GLuint]) { (**self).bind_textures(first, textures) }
    fn delete_texture(&self, texture: GLuint) { (**self).delete_texture(texture) }

    fn get_string(&self, name: GLenum) -> String { (**self).get_string(name) }
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) { (**self).clear_color(r, g, b, a) }
    fn clear(&self, mask: GLbitfield) { (**self).clear(mask) }
    fn viewport(&self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        (**self).viewport(x, y, width, height)
    }
    fn enable(&self, cap: GLenum) { (**self).enable(cap) }
    fn polygon_offset(&self, factor: f32, units: f32) { (**self).polygon_offset(factor, units) }
    fn polygon_mode(&self, face: GLenum, mode: GLenum) { (**self).polygon_mode(face, mode) }
    fn draw_arrays(&self, mode: GLenum, first: GLint, count: GLsizei) { (**self).draw_arrays(mode, first, count) }
    fn draw_elements(&self, mode: GLenum, count: GLsizei, kind: GLenum, offset: usize) {
        (**self).draw_elements(mode, count, kind, offset)
    }
}
