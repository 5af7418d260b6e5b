//! A small set of owning wrappers around the OpenGL API.
//!
//! Drawing a triangle in OpenGL is only a handful of calls, but every one of them is unsafe, takes
//! bare integers, and expects you to remember to delete whatever you created. This crate wraps the
//! calls the demos need in types that own their handle: a [`Shader`], [`Program`], [`Buffer`],
//! [`Texture`] or [`VertexArray`] releases its object exactly once when it is dropped, and it can't
//! be copied, so it can't be released twice either.
//!
//! None of the owners talk to the driver directly. They go through the [`GlApi`] trait, which has
//! one method per entry point. [`DriverGl`] is the real thing, loaded through whatever
//! `get_proc_address` the windowing library hands you. [`Traced`] wraps any other `GlApi` and
//! reports every call it forwards, which is handy when a frame comes out black and you
//! want to see what was actually sent.
//!
//! Compilation and linking failures come back as values ([`CompileError`], [`LinkError`]) carrying
//! the driver's diagnostic log, so the caller decides whether to bail out or try something else.

#[macro_use] extern crate lazy_static;

pub mod api;
pub mod buffer;
pub mod driver;
pub mod error;
pub mod program;
pub mod shader;
pub mod texture;
pub mod trace;

#[cfg(any(test, feature = "fake"))]
pub mod fake;

pub use gl;

pub use api::GlApi;
pub use buffer::{Buffer, BufferTarget, StorageFlags};
pub use driver::DriverGl;
pub use error::GlError;
pub use program::{LinkError, Program};
pub use shader::{CompileError, Shader, ShaderError, ShaderStage};
pub use texture::{Texture, TextureKind, VertexArray};
pub use trace::{LogSink, TraceSink, Traced};
