use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glkit::gl;
use glkit::{Buffer, BufferTarget, GlApi, Program, Shader, ShaderStage, StorageFlags, Texture, VertexArray};
use nalgebra::{Matrix4, Vector3};

use super::{begin, Demo};
use crate::frame::Frame;
use crate::graphics::raster::Rgb8Image;
use crate::math;

const VERTEX_SOURCE: &str = include_str!("../../shaders/triangle.vert");
const FRAGMENT_SOURCE: &str = include_str!("../../shaders/triangle.frag");

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PerFrameData {
    mvp: Matrix4<f32>,
}

/// A triangle spinning in the screen plane with an image on it.
pub struct TexturedTriangle<'gl, A: GlApi + ?Sized> {
    gl: &'gl A,
    texture: Texture<'gl, A>,
    per_frame: Buffer<'gl, A>,
    vao: VertexArray<'gl, A>,
    program: Program<'gl, A>,
}

impl<'gl, A: GlApi + ?Sized> TexturedTriangle<'gl, A> {
    pub fn new(gl: &'gl A, image: &Rgb8Image) -> Result<Self> {
        let vertex = Shader::from_source(gl, ShaderStage::Vertex, VERTEX_SOURCE, "triangle.vert")?;
        let fragment = Shader::from_source(gl, ShaderStage::Fragment, FRAGMENT_SOURCE, "triangle.frag")?;
        let program = Program::link(gl, &[&vertex, &fragment]).context("could not link the triangle program")?;

        let vao = VertexArray::new(gl)?;
        vao.bind();

        let per_frame = Buffer::for_value::<PerFrameData>(gl, StorageFlags::DYNAMIC)?;
        per_frame.bind_range(BufferTarget::Uniform, 0);

        let texture = Texture::rgb8(gl, image.width, image.height, &image.pixels)
            .context("could not upload the triangle texture")?;
        texture.bind_unit(0);

        gl.clear_color(1.0, 1.0, 1.0, 1.0);

        Ok(Self { gl, texture, per_frame, vao, program })
    }
}

impl<'gl, A: GlApi + ?Sized> Demo for TexturedTriangle<'gl, A> {
    fn draw(&mut self, frame: &Frame) -> Result<()> {
        let aspect = match begin(self.gl, frame, gl::COLOR_BUFFER_BIT) {
            Some(aspect) => aspect,
            None => return Ok(()),
        };

        let mvp = math::ortho(aspect) * math::rotation(frame.time, Vector3::z());

        self.program.use_program();
        self.vao.bind();
        self.texture.bind_unit(0);
        self.per_frame.write(&PerFrameData { mvp })?;
        self.gl.draw_arrays(gl::TRIANGLES, 0, 3);

        Ok(())
    }
}
