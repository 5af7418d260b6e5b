//! "Texture" is the OpenGL term for an image passed to the graphics pipeline. A fragment shader
//! samples it to colour its pixels. The helpers here only create what the demos need: RGB8 2D
//! textures from decoded images and RGB32F cube maps from six float faces.

use std::fmt;

use gl::types::*;

use crate::api::GlApi;
use crate::buffer::Buffer;
use crate::error::GlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Tex2D,
    CubeMap,
}

impl TextureKind {
    pub fn gl_enum(self) -> GLenum {
        match self {
            TextureKind::Tex2D => gl::TEXTURE_2D,
            TextureKind::CubeMap => gl::TEXTURE_CUBE_MAP,
        }
    }
}

/// A texture with immutable storage and a single mip level. Deleted when dropped.
pub struct Texture<'gl, A: GlApi + ?Sized> {
    gl: &'gl A,
    handle: GLuint,
    kind: TextureKind,
    width: u32,
    height: u32,
}

fn create<A: GlApi + ?Sized>(gl: &A, kind: TextureKind) -> Result<GLuint, GlError> {
    match gl.create_texture(kind.gl_enum()) {
        0 => Err(GlError::ZeroHandle("glCreateTextures")),
        handle => Ok(handle),
    }
}

impl<'gl, A: GlApi + ?Sized> Texture<'gl, A> {
    pub fn handle(&self) -> GLuint { self.handle }

    pub fn kind(&self) -> TextureKind { self.kind }

    pub fn width(&self) -> u32 { self.width }

    pub fn height(&self) -> u32 { self.height }

    /// Uploads tightly packed RGB8 pixels unflipped, top row of the image first. That row lands
    /// at t = 0.
    pub fn rgb8(gl: &'gl A, width: u32, height: u32, pixels: &[u8]) -> Result<Self, GlError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected || expected == 0 {
            return Err(GlError::SizeMismatch { expected, actual: pixels.len() });
        }

        let handle = create(gl, TextureKind::Tex2D)?;
        let texture = Self { gl, handle, kind: TextureKind::Tex2D, width, height };

        gl.texture_parameter_i(handle, gl::TEXTURE_MAX_LEVEL, 0);
        gl.texture_parameter_i(handle, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
        gl.texture_parameter_i(handle, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
        gl.texture_storage_2d(handle, 1, gl::RGB8, width as GLsizei, height as GLsizei);
        // RGB rows are not 4-byte aligned in general
        gl.pixel_store_i(gl::UNPACK_ALIGNMENT, 1);
        gl.texture_sub_image_2d(
            handle,
            0,
            (0, 0),
            (width as GLsizei, height as GLsizei),
            gl::RGB,
            gl::UNSIGNED_BYTE,
            pixels,
        );

        Ok(texture)
    }

    /// Uploads six square RGB32F faces laid out back to back in `+X, -X, +Y, -Y, +Z, -Z` order.
    pub fn cube_rgb32f(gl: &'gl A, face_size: u32, faces: &[f32]) -> Result<Self, GlError> {
        let face_len = face_size as usize * face_size as usize * 3;
        if faces.len() != face_len * 6 || face_len == 0 {
            return Err(GlError::SizeMismatch { expected: face_len * 6, actual: faces.len() });
        }

        let handle = create(gl, TextureKind::CubeMap)?;
        let texture = Self { gl, handle, kind: TextureKind::CubeMap, width: face_size, height: face_size };

        gl.texture_parameter_i(handle, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as GLint);
        gl.texture_parameter_i(handle, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as GLint);
        gl.texture_parameter_i(handle, gl::TEXTURE_WRAP_R, gl::CLAMP_TO_EDGE as GLint);
        gl.texture_parameter_i(handle, gl::TEXTURE_BASE_LEVEL, 0);
        gl.texture_parameter_i(handle, gl::TEXTURE_MAX_LEVEL, 0);
        gl.texture_parameter_i(handle, gl::TEXTURE_MIN_FILTER, gl::LINEAR as GLint);
        gl.texture_parameter_i(handle, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
        gl.texture_storage_2d(handle, 1, gl::RGB32F, face_size as GLsizei, face_size as GLsizei);

        for (layer, face) in faces.chunks_exact(face_len).enumerate() {
            gl.texture_sub_image_3d(
                handle,
                0,
                (0, 0, layer as GLint),
                (face_size as GLsizei, face_size as GLsizei, 1),
                gl::RGB,
                gl::FLOAT,
                bytemuck::cast_slice(face),
            );
        }

        Ok(texture)
    }

    /// Binds this texture to texture unit `unit`.
    pub fn bind_unit(&self, unit: GLuint) {
        self.gl.bind_textures(unit, &[self.handle]);
    }
}

impl<'gl, A: GlApi + ?Sized> Drop for Texture<'gl, A> {
    fn drop(&mut self) {
        self.gl.delete_texture(self.handle);
    }
}

impl<'gl, A: GlApi + ?Sized> fmt::Debug for Texture<'gl, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Texture ( {:?}, {}, {}x{} )", self.kind, self.handle, self.width, self.height)
    }
}

/// A vertex array object. The demos pull vertices from storage buffers, so the only state it
/// carries is an optional element buffer.
pub struct VertexArray<'gl, A: GlApi + ?Sized> {
    gl: &'gl A,
    handle: GLuint,
}

impl<'gl, A: GlApi + ?Sized> VertexArray<'gl, A> {
    pub fn handle(&self) -> GLuint { self.handle }

    pub fn new(gl: &'gl A) -> Result<Self, GlError> {
        match gl.create_vertex_array() {
            0 => Err(GlError::ZeroHandle("glCreateVertexArrays")),
            handle => Ok(Self { gl, handle }),
        }
    }

    pub fn bind(&self) {
        self.gl.bind_vertex_array(self.handle);
    }

    /// Uses `indices` for `glDrawElements` while this array is bound.
    pub fn set_element_buffer(&self, indices: &Buffer<'_, A>) {
        self.gl.vertex_array_element_buffer(self.handle, indices.handle());
    }
}

impl<'gl, A: GlApi + ?Sized> Drop for VertexArray<'gl, A> {
    fn drop(&mut self) {
        self.gl.delete_vertex_array(self.handle);
    }
}

impl<'gl, A: GlApi + ?Sized> fmt::Debug for VertexArray<'gl, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VertexArray ( {} )", self.handle)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::buffer::StorageFlags;
    use crate::fake::{FakeGl, Kind};

    #[test]
    fn rgb8_texture_gets_single_level_storage_and_one_upload() {
        let gl = FakeGl::new();
        let pixels = vec![255u8; 3 * 5 * 3];
        let texture = Texture::rgb8(&gl, 3, 5, &pixels).unwrap();

        let fake = gl.texture(texture.handle()).unwrap();
        assert_eq!(fake.target, gl::TEXTURE_2D);
        assert_eq!(fake.storage, Some((1, gl::RGB8, 3, 5)));
        assert_eq!(fake.uploads, vec![(0, pixels.len())]);
        assert!(fake.params.contains(&(gl::TEXTURE_MAX_LEVEL, 0)));
    }

    #[test]
    fn rgb8_rejects_short_pixel_data_before_creating_anything() {
        let gl = FakeGl::new();
        assert!(Texture::rgb8(&gl, 4, 4, &[0; 10]).is_err());
        assert_eq!(gl.created(Kind::Texture), 0);
    }

    #[test]
    fn cube_map_uploads_each_face_to_its_own_layer() {
        let gl = FakeGl::new();
        let faces = vec![0.5f32; 2 * 2 * 3 * 6];
        let cube = Texture::cube_rgb32f(&gl, 2, &faces).unwrap();

        let fake = gl.texture(cube.handle()).unwrap();
        assert_eq!(fake.target, gl::TEXTURE_CUBE_MAP);
        assert_eq!(fake.storage, Some((1, gl::RGB32F, 2, 2)));

        let layers = fake.uploads.iter().map(|(layer, _)| *layer).collect::<Vec<_>>();
        assert_eq!(layers, vec![0, 1, 2, 3, 4, 5]);
        assert!(fake.uploads.iter().all(|(_, bytes)| *bytes == 2 * 2 * 3 * 4));
    }

    #[test]
    fn bind_unit_and_drop() {
        let gl = FakeGl::new();
        let handle = {
            let texture = Texture::rgb8(&gl, 1, 1, &[1, 2, 3]).unwrap();
            texture.bind_unit(2);
            assert_eq!(gl.texture_at_unit(2), Some(texture.handle()));
            texture.handle()
        };
        assert_eq!(gl.deleted(Kind::Texture), vec![handle]);
    }

    #[test]
    fn vertex_array_remembers_its_element_buffer() {
        let gl = FakeGl::new();
        let indices = Buffer::with_data(&gl, &[0u32, 1, 2], StorageFlags::NONE).unwrap();
        let vao = VertexArray::new(&gl).unwrap();

        vao.set_element_buffer(&indices);
        vao.bind();

        assert_eq!(gl.element_buffer_of(vao.handle()), Some(indices.handle()));
        assert_eq!(gl.bound_vertex_array(), vao.handle());
    }
}
