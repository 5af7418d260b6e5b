//! The walkthroughs behind each subcommand.
//!
//! Every demo owns its GPU objects through `glkit` and borrows the API it was built with, so a demo
//! written against `DriverGl` runs unchanged under `Traced` or the in-memory driver used by tests.

pub mod cube;
pub mod cubemap;
pub mod profile;
pub mod pulling;
pub mod texture;

use anyhow::{Context, Result};
use glkit::gl;
use glkit::gl::types::GLbitfield;
use glkit::{GlApi, LogSink, Traced};

use crate::frame::Frame;
use crate::graphics::raster::Rgb8Image;
use crate::interface::cli::{DemoConfig, DemoKind};
use crate::profiling::ChromeTrace;
use crate::window::GlWindow;

pub trait Demo {
    fn draw(&mut self, frame: &Frame) -> Result<()>;
}

/// Opens the window, builds the chosen demo and runs it until the window closes.
pub fn run(config: &DemoConfig) -> Result<()> {
    let mut window = GlWindow::open(&config.window)?;
    let gl = window.load_gl().context("could not load OpenGL 4.6 entry points")?;
    log_driver(&gl);

    match &config.demo {
        DemoKind::Cube => {
            let demo = cube::RotatingCube::new(&gl)?;
            present(&mut window, demo)
        }
        DemoKind::Texture { image } => {
            let image = Rgb8Image::load_or_checkerboard(image.as_deref())?;
            let demo = texture::TexturedTriangle::new(&gl, &image)?;
            present(&mut window, demo)
        }
        DemoKind::Traced { image, level } => {
            let image = Rgb8Image::load_or_checkerboard(image.as_deref())?;
            let traced = Traced::with_sink(&gl, LogSink { level: *level });

            let result = texture::TexturedTriangle::new(&traced, &image)
                .and_then(|demo| present(&mut window, demo));

            log::info!("traced {} OpenGL calls", traced.calls());
            result
        }
        DemoKind::Profile { trace_out } => {
            let trace = ChromeTrace::record_to(trace_out)?;

            let result = profile::ProfiledCube::new(&gl, profile::PASS_WORK)
                .and_then(|demo| present(&mut window, demo));

            trace.finish();
            result
        }
        DemoKind::Pulling { image, shaders } => {
            let image = Rgb8Image::load_or_checkerboard(image.as_deref())?;
            let demo = pulling::PulledMesh::new(&gl, shaders, &image)?;
            present(&mut window, demo)
        }
        DemoKind::Cubemap { hdr, snapshot } => {
            let faces = cubemap::prepare_faces(hdr, snapshot)?;
            let demo = cubemap::ReflectiveCube::new(&gl, &faces)?;
            present(&mut window, demo)
        }
    }
}

/// The demo drops when this returns, before the window and its context do.
fn present<D: Demo>(window: &mut GlWindow, mut demo: D) -> Result<()> {
    window.run(|frame| demo.draw(frame))
}

fn log_driver<A: GlApi + ?Sized>(gl: &A) {
    log::info!("OpenGL vendor:   {}", gl.get_string(gl::VENDOR));
    log::info!("OpenGL renderer: {}", gl.get_string(gl::RENDERER));
    log::info!("OpenGL version:  {}", gl.get_string(gl::VERSION));
    log::info!("GLSL version:    {}", gl.get_string(gl::SHADING_LANGUAGE_VERSION));
}

/// Sets the viewport to the frame and clears it. Returns the aspect ratio, or `None` when the
/// framebuffer is empty and nothing should be drawn.
fn begin<A: GlApi + ?Sized>(gl: &A, frame: &Frame, mask: GLbitfield) -> Option<f32> {
    let aspect = frame.aspect()?;
    gl.viewport(0, 0, frame.width as i32, frame.height as i32);
    gl.clear(mask);
    Some(aspect)
}
