use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gl::types::*;
use thiserror::Error;

use crate::api::GlApi;

/// One programmable stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

lazy_static! {
    // By convention the file extension names the stage
    static ref STAGE_EXTENSIONS: HashMap<&'static str, ShaderStage> = {
        let mut m = HashMap::new();
        m.insert("vert", ShaderStage::Vertex);
        m.insert("tesc", ShaderStage::TessControl);
        m.insert("tese", ShaderStage::TessEvaluation);
        m.insert("geom", ShaderStage::Geometry);
        m.insert("frag", ShaderStage::Fragment);
        m.insert("comp", ShaderStage::Compute);
        m
    };
}

impl ShaderStage {
    pub fn gl_enum(self) -> GLenum {
        match self {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::TessControl => gl::TESS_CONTROL_SHADER,
            ShaderStage::TessEvaluation => gl::TESS_EVALUATION_SHADER,
            ShaderStage::Geometry => gl::GEOMETRY_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
            ShaderStage::Compute => gl::COMPUTE_SHADER,
        }
    }

    /// Looks up the stage for a bare extension such as `"frag"`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        STAGE_EXTENSIONS.get(ext).copied()
    }

    /// Infers the stage from a file name. Anything other than `.vert`, `.tesc`, `.tese`, `.geom`,
    /// `.frag` or `.comp` is an [`ShaderError::UnknownStage`].
    pub fn from_path(path: &Path) -> Result<Self, ShaderError> {
        path.extension()
            .and_then(OsStr::to_str)
            .and_then(Self::from_extension)
            .ok_or_else(|| ShaderError::UnknownStage(path.to_path_buf()))
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessControl => "tessellation control",
            ShaderStage::TessEvaluation => "tessellation evaluation",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// The driver rejected a shader. `log` is its diagnostic output, verbatim.
#[derive(Debug, Error)]
#[error("failed to compile {stage} shader `{source_name}`:\n{log}")]
pub struct CompileError {
    pub log: String,
    pub stage: ShaderStage,
    pub source_name: String,
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("could not read shader file `{}`", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("cannot tell the shader stage of `{}` from its extension", .0.display())]
    UnknownStage(PathBuf),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// A compiled shader stage. Deleted when dropped.
pub struct Shader<'gl, A: GlApi + ?Sized> {
    gl: &'gl A,
    handle: GLuint,
    stage: ShaderStage,
}

impl<'gl, A: GlApi + ?Sized> Shader<'gl, A> {
    pub fn handle(&self) -> GLuint { self.handle }

    pub fn stage(&self) -> ShaderStage { self.stage }

    /// Reads and compiles a shader file, picking the stage from its extension.
    pub fn from_file<P: AsRef<Path>>(gl: &'gl A, path: P) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let stage = ShaderStage::from_path(path)?;
        let source = fs::read_to_string(path)
            .map_err(|source| ShaderError::Io { path: path.to_path_buf(), source })?;

        Ok(Self::from_source(gl, stage, &source, &path.display().to_string())?)
    }

    /// Compiles `source` as `stage`. `debug_name` only shows up in diagnostics.
    ///
    /// Any output in the compiler log counts as a failure. The shader object is deleted before the
    /// error is returned.
    pub fn from_source(gl: &'gl A, stage: ShaderStage, source: &str, debug_name: &str) -> Result<Self, CompileError> {
        let handle = gl.create_shader(stage.gl_enum());
        if handle == 0 {
            return Err(CompileError {
                log: String::from("glCreateShader returned no shader object"),
                stage,
                source_name: debug_name.to_string(),
            });
        }

        gl.shader_source(handle, source);
        gl.compile_shader(handle);

        let log = gl.shader_info_log(handle);
        if !log.trim().is_empty() {
            gl.delete_shader(handle);
            log::error!("{} shader `{}` failed to compile:\n{}\n{}", stage, debug_name, log.trim_end(), numbered(source));

            return Err(CompileError { log, stage, source_name: debug_name.to_string() });
        }

        log::debug!("compiled {} shader `{}` as {}", stage, debug_name, handle);
        Ok(Self { gl, handle, stage })
    }
}

impl<'gl, A: GlApi + ?Sized> Drop for Shader<'gl, A> {
    fn drop(&mut self) {
        self.gl.delete_shader(self.handle);
    }
}

impl<'gl, A: GlApi + ?Sized> fmt::Debug for Shader<'gl, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shader ( {}, {} )", self.stage, self.handle)
    }
}

/// Prefixes every line with its 1-based number so it lines up with the driver's log.
fn numbered(source: &str) -> String {
    source.lines()
        .enumerate()
        .map(|(n, line)| format!("{:4}: {}", n + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;
    use crate::fake::{FakeGl, Kind, BROKEN_SOURCE, MINIMAL_VERTEX};

    #[test]
    fn every_known_extension_selects_its_stage() {
        let cases = [
            ("a.vert", ShaderStage::Vertex),
            ("b.geom", ShaderStage::Geometry),
            ("c.frag", ShaderStage::Fragment),
            ("d.tesc", ShaderStage::TessControl),
            ("e.tese", ShaderStage::TessEvaluation),
            ("shaders/f.comp", ShaderStage::Compute),
        ];

        for (file, stage) in cases.iter() {
            assert_eq!(ShaderStage::from_path(Path::new(file)).unwrap(), *stage, "{}", file);
        }
    }

    #[test]
    fn unknown_or_missing_extension_is_an_error() {
        for file in ["shader.glsl", "shader", "shader.VERT", "vert"].iter() {
            match ShaderStage::from_path(Path::new(file)) {
                Err(ShaderError::UnknownStage(p)) => assert_eq!(p, Path::new(file)),
                other => panic!("{} gave {:?}", file, other),
            }
        }
    }

    #[test]
    fn successful_compile_yields_a_live_non_zero_handle() {
        let gl = FakeGl::new();
        let shader = Shader::from_source(&gl, ShaderStage::Vertex, MINIMAL_VERTEX, "minimal").unwrap();

        assert_ne!(shader.handle(), 0);
        assert_eq!(shader.stage(), ShaderStage::Vertex);
        assert_eq!(gl.stage_of(shader.handle()), Some(gl::VERTEX_SHADER));
        assert!(gl.is_live(Kind::Shader, shader.handle()));
    }

    #[test]
    fn syntax_error_returns_the_log_and_releases_the_handle() {
        let gl = FakeGl::new();
        let err = Shader::from_source(&gl, ShaderStage::Fragment, BROKEN_SOURCE, "broken.frag").unwrap_err();

        assert!(!err.log.is_empty());
        assert_eq!(err.stage, ShaderStage::Fragment);
        assert_eq!(err.source_name, "broken.frag");
        assert_eq!(gl.live_count(), 0);
        assert_eq!(gl.deleted(Kind::Shader).len(), 1);
    }

    #[test]
    fn drop_deletes_exactly_once() {
        let gl = FakeGl::new();
        let handle = {
            let shader = Shader::from_source(&gl, ShaderStage::Vertex, MINIMAL_VERTEX, "minimal").unwrap();
            shader.handle()
        };

        assert_eq!(gl.deleted(Kind::Shader), vec![handle]);
        assert!(!gl.is_live(Kind::Shader, handle));
    }

    #[test]
    fn from_file_reports_io_errors_with_the_path() {
        let gl = FakeGl::new();
        let path = std::env::temp_dir().join("glkit-does-not-exist.vert");

        match Shader::from_file(&gl, &path) {
            Err(ShaderError::Io { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {:?}", other.map(|s| s.handle())),
        }
        assert_eq!(gl.live_count(), 0);
    }

    #[test]
    fn from_file_compiles_with_the_inferred_stage() {
        let gl = FakeGl::new();
        let path = std::env::temp_dir().join(format!("glkit-{}.geom", std::process::id()));
        std::fs::write(&path, MINIMAL_VERTEX).unwrap();

        let shader = Shader::from_file(&gl, &path).unwrap();
        assert_eq!(shader.stage(), ShaderStage::Geometry);
        assert_eq!(gl.stage_of(shader.handle()), Some(gl::GEOMETRY_SHADER));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn numbered_source_counts_from_one() {
        assert_eq!(numbered("a\nb"), "   1: a\n   2: b");
    }
}
