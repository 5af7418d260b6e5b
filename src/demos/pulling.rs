use std::path::Path;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glkit::gl;
use glkit::{Buffer, BufferTarget, GlApi, Program, StorageFlags, Texture, VertexArray};
use nalgebra::{Matrix4, Vector3};

use super::{begin, Demo};
use crate::frame::Frame;
use crate::graphics::mesh::Mesh;
use crate::graphics::raster::Rgb8Image;
use crate::math;

/// Binding point the vertex shader reads vertices from.
const VERTICES_BINDING: u32 = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PerFrameData {
    mvp: Matrix4<f32>,
}

/// A textured cube with no vertex attributes at all: the vertex shader fetches each vertex from a
/// storage buffer by `gl_VertexID`, and a geometry shader adds barycentrics for the wireframe.
pub struct PulledMesh<'gl, A: GlApi + ?Sized> {
    gl: &'gl A,
    index_count: i32,
    per_frame: Buffer<'gl, A>,
    texture: Texture<'gl, A>,
    vertices: Buffer<'gl, A>,
    vao: VertexArray<'gl, A>,
    indices: Buffer<'gl, A>,
    program: Program<'gl, A>,
}

impl<'gl, A: GlApi + ?Sized> PulledMesh<'gl, A> {
    /// Loads `pulling.vert`, `pulling.geom` and `pulling.frag` from `shader_dir`.
    pub fn new(gl: &'gl A, shader_dir: &Path, image: &Rgb8Image) -> Result<Self> {
        let stages = ["pulling.vert", "pulling.geom", "pulling.frag"];
        let paths: Vec<_> = stages.iter().map(|name| shader_dir.join(name)).collect();
        let program = Program::from_files(gl, &paths)
            .with_context(|| format!("could not build the pulling program from `{}`", shader_dir.display()))?;

        let mesh = Mesh::cube();
        log::debug!("pulling {} vertices, {} indices", mesh.vertices.len(), mesh.indices.len());

        let indices = Buffer::with_data(gl, &mesh.indices, StorageFlags::NONE)?;
        let vao = VertexArray::new(gl)?;
        vao.set_element_buffer(&indices);
        vao.bind();

        let vertices = Buffer::with_data(gl, &mesh.vertices, StorageFlags::NONE)?;
        vertices.bind_base(BufferTarget::ShaderStorage, VERTICES_BINDING);

        let texture = Texture::rgb8(gl, image.width, image.height, &image.pixels)
            .context("could not upload the mesh texture")?;
        texture.bind_unit(0);

        let per_frame = Buffer::for_value::<PerFrameData>(gl, StorageFlags::DYNAMIC)?;
        per_frame.bind_range(BufferTarget::Uniform, 0);

        gl.clear_color(1.0, 1.0, 1.0, 1.0);
        gl.enable(gl::DEPTH_TEST);

        Ok(Self {
            gl,
            index_count: mesh.indices.len() as i32,
            per_frame,
            texture,
            vertices,
            vao,
            indices,
            program,
        })
    }
}

impl<'gl, A: GlApi + ?Sized> Demo for PulledMesh<'gl, A> {
    fn draw(&mut self, frame: &Frame) -> Result<()> {
        let aspect = match begin(self.gl, frame, gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT) {
            Some(aspect) => aspect,
            None => return Ok(()),
        };

        let model = math::translation(0.0, 0.0, -2.5)
            * math::rotation(frame.time, Vector3::y())
            * math::rotation(0.5, Vector3::x());
        let mvp = math::perspective(aspect) * model;

        self.program.use_program();
        self.vao.bind();
        self.per_frame.write(&PerFrameData { mvp })?;
        self.gl.draw_elements(gl::TRIANGLES, self.index_count, gl::UNSIGNED_INT, 0);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::*;
    use crate::demos::test::frame;
    use glkit::fake::{FakeGl, Kind};
    use glkit::ShaderStage;

    fn shader_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders")
    }

    #[test]
    fn links_three_stages_from_files() {
        let fake = FakeGl::new();
        let mesh = PulledMesh::new(&fake, &shader_dir(), &Rgb8Image::checkerboard(4, 1)).unwrap();

        let stages: Vec<_> = fake
            .attached_at_link(mesh.program.handle())
            .into_iter()
            .map(|shader| fake.stage_of(shader))
            .collect();
        assert_eq!(
            stages,
            vec![
                Some(ShaderStage::Vertex.gl_enum()),
                Some(ShaderStage::Geometry.gl_enum()),
                Some(ShaderStage::Fragment.gl_enum()),
            ]
        );
    }

    #[test]
    fn vertices_are_pulled_from_the_storage_buffer() {
        let fake = FakeGl::new();
        let mut mesh = PulledMesh::new(&fake, &shader_dir(), &Rgb8Image::checkerboard(4, 1)).unwrap();
        mesh.draw(&frame(640, 480)).unwrap();

        let (buffer, _, _) = fake.binding(gl::SHADER_STORAGE_BUFFER, VERTICES_BINDING).unwrap();
        assert_eq!(buffer, mesh.vertices.handle());
        assert_eq!(fake.buffer_contents(buffer).map(|bytes| bytes.len()), Some(24 * 32));

        assert_eq!(fake.element_buffer_of(mesh.vao.handle()), Some(mesh.indices.handle()));
        assert_eq!(fake.draws(), vec![(gl::TRIANGLES, 36)]);
    }

    #[test]
    fn missing_shader_directory_is_an_error_with_context() {
        let fake = FakeGl::new();
        let err = PulledMesh::new(&fake, Path::new("does/not/exist"), &Rgb8Image::checkerboard(4, 1))
            .err()
            .unwrap();
        assert!(format!("{:#}", err).contains("pulling.vert"));
        assert_eq!(fake.live_count(), 0);
        assert_eq!(fake.created(Kind::Buffer), 0);
    }
}
