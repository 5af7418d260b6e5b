use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glkit::gl;
use glkit::{Buffer, BufferTarget, GlApi, Program, Shader, ShaderStage, StorageFlags, VertexArray};
use nalgebra::{Matrix4, Vector3};

use super::{begin, Demo};
use crate::frame::Frame;
use crate::math;

const VERTEX_SOURCE: &str = include_str!("../../shaders/cube.vert");
const FRAGMENT_SOURCE: &str = include_str!("../../shaders/cube.frag");

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PerFrameData {
    mvp: Matrix4<f32>,
    is_wireframe: i32,
}

/// A cube whose corners live in the vertex shader, drawn filled and then again as black lines
/// pulled slightly towards the camera.
pub struct RotatingCube<'gl, A: GlApi + ?Sized> {
    gl: &'gl A,
    per_frame: Buffer<'gl, A>,
    vao: VertexArray<'gl, A>,
    program: Program<'gl, A>,
}

impl<'gl, A: GlApi + ?Sized> RotatingCube<'gl, A> {
    pub fn new(gl: &'gl A) -> Result<Self> {
        let vertex = Shader::from_source(gl, ShaderStage::Vertex, VERTEX_SOURCE, "cube.vert")?;
        let fragment = Shader::from_source(gl, ShaderStage::Fragment, FRAGMENT_SOURCE, "cube.frag")?;
        let program = Program::link(gl, &[&vertex, &fragment]).context("could not link the cube program")?;

        // Core profile draws need a vertex array even when there are no attributes
        let vao = VertexArray::new(gl)?;
        vao.bind();

        let per_frame = Buffer::for_value::<PerFrameData>(gl, StorageFlags::DYNAMIC)?;
        per_frame.bind_range(BufferTarget::Uniform, 0);

        gl.clear_color(1.0, 1.0, 1.0, 1.0);
        gl.enable(gl::DEPTH_TEST);
        gl.enable(gl::POLYGON_OFFSET_LINE);
        gl.polygon_offset(-1.0, -1.0);

        Ok(Self { gl, per_frame, vao, program })
    }

    /// Clears the frame and binds the program. Returns the frame's transform, or `None` when
    /// there is nothing to draw into.
    pub(super) fn prepare(&self, frame: &Frame) -> Option<Matrix4<f32>> {
        let aspect = begin(self.gl, frame, gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT)?;

        let model = math::translation(0.0, 0.0, -3.5) * math::rotation(frame.time, Vector3::new(1.0, 1.0, 1.0));

        self.program.use_program();
        self.vao.bind();
        Some(math::perspective(aspect) * model)
    }

    /// One draw of the 36 cube vertices, filled or as lines.
    pub(super) fn pass(&self, mvp: Matrix4<f32>, wireframe: bool) -> Result<()> {
        self.per_frame.write(&PerFrameData { mvp, is_wireframe: wireframe as i32 })?;
        self.gl.polygon_mode(gl::FRONT_AND_BACK, if wireframe { gl::LINE } else { gl::FILL });
        self.gl.draw_arrays(gl::TRIANGLES, 0, 36);
        Ok(())
    }
}

impl<'gl, A: GlApi + ?Sized> Demo for RotatingCube<'gl, A> {
    fn draw(&mut self, frame: &Frame) -> Result<()> {
        let mvp = match self.prepare(frame) {
            Some(mvp) => mvp,
            None => return Ok(()),
        };

        self.pass(mvp, false)?;
        self.pass(mvp, true)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::demos::test::frame;
    use glkit::fake::{FakeGl, Kind};

    #[test]
    fn per_frame_block_is_a_matrix_and_a_flag() {
        assert_eq!(std::mem::size_of::<PerFrameData>(), 68);
    }

    #[test]
    fn draws_a_filled_and_a_wireframe_pass() {
        let fake = FakeGl::new();
        let mut cube = RotatingCube::new(&fake).unwrap();
        cube.draw(&frame(640, 480)).unwrap();

        assert_eq!(fake.draws(), vec![(gl::TRIANGLES, 36), (gl::TRIANGLES, 36)]);
        assert_eq!(fake.current_program(), cube.program.handle());

        let (buffer, offset, size) = fake.binding(gl::UNIFORM_BUFFER, 0).unwrap();
        assert_eq!((buffer, offset, size), (cube.per_frame.handle(), 0, 68));

        // the wireframe flag is the last thing written
        let block: PerFrameData = cube.per_frame.read_value().unwrap();
        assert_eq!(block.is_wireframe, 1);
    }

    #[test]
    fn minimised_window_draws_nothing() {
        let fake = FakeGl::new();
        let mut cube = RotatingCube::new(&fake).unwrap();
        cube.draw(&frame(640, 0)).unwrap();
        assert!(fake.draws().is_empty());
    }

    #[test]
    fn everything_is_released_in_reverse_creation_order() {
        let fake = FakeGl::new();
        drop(RotatingCube::new(&fake).unwrap());

        assert_eq!(fake.live_count(), 0);
        let kinds: Vec<Kind> = fake.deletion_order().into_iter().map(|(kind, _)| kind).collect();
        // shaders go as soon as the program is linked
        assert_eq!(kinds, vec![Kind::Shader, Kind::Shader, Kind::Buffer, Kind::VertexArray, Kind::Program]);
    }
}
