//! One window, one OpenGL 4.6 core context, one loop.

use std::ffi::c_void;

use anyhow::{Context, Result};
use glkit::{DriverGl, GlError};
use glutin::dpi::LogicalSize;
use glutin::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use glutin::event_loop::{ControlFlow, EventLoop};
use glutin::platform::run_return::EventLoopExtRunReturn;
use glutin::window::WindowBuilder;
use glutin::{Api, ContextBuilder, GlProfile, GlRequest, PossiblyCurrent, WindowedContext};

use crate::frame::{Frame, FrameClock, LoopState, Signal};

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::from("glsteps"),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

pub struct GlWindow {
    event_loop: EventLoop<()>,
    context: WindowedContext<PossiblyCurrent>,
}

impl GlWindow {
    /// Opens the window and makes its context current on this thread.
    pub fn open(config: &WindowConfig) -> Result<Self> {
        let event_loop = EventLoop::new();
        let window = WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width, config.height));

        let context = ContextBuilder::new()
            .with_gl(GlRequest::Specific(Api::OpenGl, (4, 6)))
            .with_gl_profile(GlProfile::Core)
            .with_gl_debug_flag(cfg!(debug_assertions))
            .with_vsync(config.vsync)
            .build_windowed(window, &event_loop)
            .context("could not create an OpenGL 4.6 core context")?;

        let context = unsafe { context.make_current() }
            .map_err(|(_, e)| e)
            .context("could not make the OpenGL context current")?;

        log::info!("opened {}x{} window `{}`", config.width, config.height, config.title);
        Ok(Self { event_loop, context })
    }

    /// Loads OpenGL from this window's context. Debug builds also forward the driver's debug
    /// messages to the log.
    pub fn load_gl(&self) -> Result<DriverGl, GlError> {
        // The context was made current in `open` and nothing else ever touches it
        let gl = unsafe { DriverGl::load(|name| self.context.get_proc_address(name) as *const c_void) }?;
        if cfg!(debug_assertions) && !gl.enable_debug_output() {
            log::warn!("asked for a debug context but the driver gave none, debug output is off");
        }
        Ok(gl)
    }

    /// Calls `draw` once per frame until the window is closed or Escape is pressed, presenting
    /// after each call. The first error from `draw` stops the loop and is returned.
    pub fn run<F>(&mut self, mut draw: F) -> Result<()>
    where
        F: FnMut(&Frame) -> Result<()>,
    {
        let context = &self.context;
        let mut state = LoopState::Running;
        let mut clock = FrameClock::new();
        let mut failure = None;

        self.event_loop.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Poll;

            match &event {
                Event::WindowEvent { event, .. } => {
                    if let WindowEvent::Resized(size) = event {
                        context.resize(*size);
                    }
                    if let Some(signal) = signal_of(event) {
                        state = state.on(signal);
                    }
                }
                Event::MainEventsCleared if state == LoopState::Running => {
                    let size = context.window().inner_size();
                    let frame = clock.tick(size.width, size.height);
                    log::trace!("frame {} ({:.2} ms)", frame.index, frame.dt * 1000.0);

                    let presented = draw(&frame)
                        .and_then(|_| context.swap_buffers().context("could not present the frame"));
                    if let Err(e) = presented {
                        failure = Some(e);
                        state = LoopState::Closing;
                    }
                }
                _ => {}
            }

            if state == LoopState::Closing {
                *control_flow = ControlFlow::Exit;
            }
        });

        log::info!("window closed");
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn signal_of(event: &WindowEvent<'_>) -> Option<Signal> {
    match event {
        WindowEvent::CloseRequested => Some(Signal::CloseRequested),
        WindowEvent::KeyboardInput {
            input: KeyboardInput { state: ElementState::Pressed, virtual_keycode: Some(key), .. },
            ..
        } => {
            if *key == VirtualKeyCode::Escape {
                Some(Signal::EscapePressed)
            } else {
                Some(Signal::OtherKeyPressed)
            }
        }
        _ => None,
    }
}
