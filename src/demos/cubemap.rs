use std::path::Path;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glkit::gl;
use glkit::{Buffer, BufferTarget, GlApi, Program, Shader, ShaderStage, StorageFlags, Texture, VertexArray};
use nalgebra::{Matrix4, Vector3, Vector4};

use super::{begin, Demo};
use crate::frame::Frame;
use crate::graphics::bitmap::Bitmap;
use crate::graphics::cubemap::{equirect_to_vertical_cross, vertical_cross_to_faces};
use crate::graphics::mesh::Mesh;
use crate::math;

const SKYBOX_VERTEX: &str = include_str!("../../shaders/skybox.vert");
const SKYBOX_FRAGMENT: &str = include_str!("../../shaders/skybox.frag");
const REFLECT_VERTEX: &str = include_str!("../../shaders/reflect.vert");
const REFLECT_FRAGMENT: &str = include_str!("../../shaders/reflect.frag");

const VERTICES_BINDING: u32 = 1;
const ENVIRONMENT_UNIT: u32 = 1;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct PerFrameData {
    model: Matrix4<f32>,
    mvp: Matrix4<f32>,
    camera_pos: Vector4<f32>,
}

/// Loads an equirectangular HDR image, writes its vertical cross to `snapshot` and returns the six
/// cube map faces.
pub fn prepare_faces(hdr: &Path, snapshot: &Path) -> Result<Bitmap> {
    let equirect = Bitmap::load_rgb(hdr)?;
    log::info!("converting {}x{} equirectangular map", equirect.width, equirect.height);

    let cross = equirect_to_vertical_cross(&equirect)
        .with_context(|| format!("`{}` cannot be turned into a cube map", hdr.display()))?;
    cross.save_hdr(snapshot)?;

    vertical_cross_to_faces(&cross)
}

fn link<'gl, A: GlApi + ?Sized>(gl: &'gl A, name: &str, vertex: &str, fragment: &str) -> Result<Program<'gl, A>> {
    let vs = Shader::from_source(gl, ShaderStage::Vertex, vertex, &format!("{}.vert", name))?;
    let fs = Shader::from_source(gl, ShaderStage::Fragment, fragment, &format!("{}.frag", name))?;
    Program::link(gl, &[&vs, &fs]).with_context(|| format!("could not link the {} program", name))
}

/// A spinning mirror cube inside a skybox, both lit by the same cube map.
pub struct ReflectiveCube<'gl, A: GlApi + ?Sized> {
    gl: &'gl A,
    index_count: i32,
    per_frame: Buffer<'gl, A>,
    environment: Texture<'gl, A>,
    vertices: Buffer<'gl, A>,
    vao: VertexArray<'gl, A>,
    indices: Buffer<'gl, A>,
    skybox: Program<'gl, A>,
    mirror: Program<'gl, A>,
}

impl<'gl, A: GlApi + ?Sized> ReflectiveCube<'gl, A> {
    /// `faces` holds six square RGB layers, as made by [`prepare_faces`].
    pub fn new(gl: &'gl A, faces: &Bitmap) -> Result<Self> {
        if faces.depth != 6 || faces.comp != 3 || faces.width != faces.height {
            anyhow::bail!(
                "expected six square RGB faces, got {} layers of {}x{}x{}",
                faces.depth,
                faces.width,
                faces.height,
                faces.comp
            );
        }

        let mirror = link(gl, "reflect", REFLECT_VERTEX, REFLECT_FRAGMENT)?;
        let skybox = link(gl, "skybox", SKYBOX_VERTEX, SKYBOX_FRAGMENT)?;

        let mesh = Mesh::cube();
        let indices = Buffer::with_data(gl, &mesh.indices, StorageFlags::NONE)?;
        let vao = VertexArray::new(gl)?;
        vao.set_element_buffer(&indices);
        vao.bind();

        let vertices = Buffer::with_data(gl, &mesh.vertices, StorageFlags::NONE)?;
        vertices.bind_base(BufferTarget::ShaderStorage, VERTICES_BINDING);

        let environment = Texture::cube_rgb32f(gl, faces.width as u32, faces.data())
            .context("could not upload the cube map")?;
        environment.bind_unit(ENVIRONMENT_UNIT);

        let per_frame = Buffer::for_value::<PerFrameData>(gl, StorageFlags::DYNAMIC)?;
        per_frame.bind_range(BufferTarget::Uniform, 0);

        gl.clear_color(1.0, 1.0, 1.0, 1.0);
        gl.enable(gl::DEPTH_TEST);

        Ok(Self {
            gl,
            index_count: mesh.indices.len() as i32,
            per_frame,
            environment,
            vertices,
            vao,
            indices,
            skybox,
            mirror,
        })
    }
}

impl<'gl, A: GlApi + ?Sized> Demo for ReflectiveCube<'gl, A> {
    fn draw(&mut self, frame: &Frame) -> Result<()> {
        let aspect = match begin(self.gl, frame, gl::COLOR_BUFFER_BIT | gl::DEPTH_BUFFER_BIT) {
            Some(aspect) => aspect,
            None => return Ok(()),
        };
        let projection = math::perspective(aspect);
        let camera_pos = Vector4::new(0.0, 0.0, 0.0, 1.0);

        self.vao.bind();
        self.environment.bind_unit(ENVIRONMENT_UNIT);

        let model = math::translation(0.0, 0.0, -1.5)
            * math::rotation(frame.time, Vector3::y())
            * Matrix4::new_scaling(0.4);
        self.mirror.use_program();
        self.per_frame.write(&PerFrameData { model, mvp: projection * model, camera_pos })?;
        self.gl.draw_elements(gl::TRIANGLES, self.index_count, gl::UNSIGNED_INT, 0);

        let model = Matrix4::new_scaling(2.0);
        self.skybox.use_program();
        self.per_frame.write(&PerFrameData { model, mvp: projection * model, camera_pos })?;
        self.gl.draw_arrays(gl::TRIANGLES, 0, 36);

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::demos::test::frame;
    use glkit::fake::{FakeGl, Kind};

    fn faces(size: usize) -> Bitmap {
        Bitmap::new_layers(size, size, 6, 3).unwrap()
    }

    #[test]
    fn per_frame_block_matches_the_shader() {
        assert_eq!(std::mem::size_of::<PerFrameData>(), 64 + 64 + 16);
    }

    #[test]
    fn uploads_six_layers_and_binds_them_to_unit_one() {
        let fake = FakeGl::new();
        let scene = ReflectiveCube::new(&fake, &faces(4)).unwrap();

        let cube = fake.texture(scene.environment.handle()).unwrap();
        assert_eq!(cube.target, gl::TEXTURE_CUBE_MAP);
        assert_eq!(cube.storage, Some((1, gl::RGB32F, 4, 4)));
        let layers: Vec<i32> = cube.uploads.iter().map(|&(layer, _)| layer).collect();
        assert_eq!(layers, vec![0, 1, 2, 3, 4, 5]);
        assert!(cube.uploads.iter().all(|&(_, bytes)| bytes == 4 * 4 * 3 * 4));

        assert_eq!(fake.texture_at_unit(ENVIRONMENT_UNIT), Some(scene.environment.handle()));
    }

    #[test]
    fn draws_the_mirror_then_the_skybox() {
        let fake = FakeGl::new();
        let mut scene = ReflectiveCube::new(&fake, &faces(2)).unwrap();
        scene.draw(&frame(1024, 768)).unwrap();

        assert_eq!(fake.draws(), vec![(gl::TRIANGLES, 36), (gl::TRIANGLES, 36)]);
        assert_eq!(fake.count_of("glDrawElements"), 1);
        assert_eq!(fake.current_program(), scene.skybox.handle());

        let block: PerFrameData = scene.per_frame.read_value().unwrap();
        assert_eq!(block.model, Matrix4::new_scaling(2.0));
    }

    #[test]
    fn rejects_anything_but_six_square_faces() {
        let fake = FakeGl::new();
        assert!(ReflectiveCube::new(&fake, &Bitmap::new_layers(4, 4, 5, 3).unwrap()).is_err());
        assert!(ReflectiveCube::new(&fake, &Bitmap::new_layers(4, 2, 6, 3).unwrap()).is_err());
        assert_eq!(fake.created(Kind::Program), 0);
    }

    #[test]
    fn hdr_goes_through_the_cross_into_faces() {
        let dir = std::env::temp_dir();
        let hdr = dir.join(format!("glsteps-equirect-{}.hdr", std::process::id()));
        let snapshot = dir.join(format!("glsteps-cross-{}.hdr", std::process::id()));

        let equirect = Bitmap::from_data(16, 8, 3, vec![1.0; 16 * 8 * 3]).unwrap();
        equirect.save_hdr(&hdr).unwrap();

        let faces = prepare_faces(&hdr, &snapshot).unwrap();
        let cross = Bitmap::load_rgb(&snapshot).unwrap();
        std::fs::remove_file(&hdr).ok();
        std::fs::remove_file(&snapshot).ok();

        assert_eq!((cross.width, cross.height), (12, 16));
        assert_eq!((faces.width, faces.height, faces.depth), (4, 4, 6));
        assert!(faces.data().iter().all(|&v| (v - 1.0).abs() < 1e-3));
    }

    #[test]
    fn missing_hdr_is_reported() {
        let err = prepare_faces(Path::new("nowhere.hdr"), Path::new("unused.hdr")).unwrap_err();
        assert!(format!("{:#}", err).contains("nowhere.hdr"));
    }
}
