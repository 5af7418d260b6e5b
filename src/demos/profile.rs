use std::thread;
use std::time::Duration;

use anyhow::Result;
use glkit::GlApi;

use super::cube::RotatingCube;
use super::Demo;
use crate::frame::Frame;

/// Stand-in for real work inside each pass, long enough to show up in the trace.
pub const PASS_WORK: Duration = Duration::from_millis(2);

/// The rotating cube with its setup, frames and both passes wrapped in spans.
pub struct ProfiledCube<'gl, A: GlApi + ?Sized> {
    cube: RotatingCube<'gl, A>,
    work: Duration,
}

impl<'gl, A: GlApi + ?Sized> ProfiledCube<'gl, A> {
    pub fn new(gl: &'gl A, work: Duration) -> Result<Self> {
        let cube = tracing::info_span!("create resources").in_scope(|| RotatingCube::new(gl))?;
        Ok(Self { cube, work })
    }
}

impl<'gl, A: GlApi + ?Sized> Demo for ProfiledCube<'gl, A> {
    fn draw(&mut self, frame: &Frame) -> Result<()> {
        let _frame = tracing::info_span!("main loop", frame = frame.index).entered();

        let mvp = match self.cube.prepare(frame) {
            Some(mvp) => mvp,
            None => return Ok(()),
        };

        tracing::info_span!("pass 1").in_scope(|| {
            thread::sleep(self.work);
            self.cube.pass(mvp, false)
        })?;

        tracing::info_span!("pass 2").in_scope(|| {
            thread::sleep(self.work);
            self.cube.pass(mvp, true)
        })
    }
}
