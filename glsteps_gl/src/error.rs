use gl::types::GLuint;
use thiserror::Error;

use crate::program::LinkError;
use crate::shader::{CompileError, ShaderError};

/// Everything that can go wrong while creating or using the wrappers in this crate.
#[derive(Debug, Error)]
pub enum GlError {
    #[error("OpenGL entry point `{0}` could not be loaded (is a 4.5+ context current?)")]
    MissingEntryPoint(&'static str),

    #[error("the driver returned a zero handle from {0}")]
    ZeroHandle(&'static str),

    #[error("byte range {offset}..{end} is outside a buffer of {size} bytes")]
    OutOfBounds { offset: usize, end: usize, size: usize },

    #[error("buffer {0} was created without dynamic storage and cannot be updated")]
    NotDynamic(GLuint),

    #[error("expected {expected} bytes of data but got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("buffers must be at least one byte long")]
    EmptyBuffer,

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    Link(#[from] LinkError),
}

impl From<CompileError> for GlError {
    fn from(e: CompileError) -> Self {
        GlError::Shader(ShaderError::Compile(e))
    }
}
