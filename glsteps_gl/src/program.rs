use std::fmt;
use std::path::Path;

use gl::types::*;
use thiserror::Error;

use crate::api::GlApi;
use crate::error::GlError;
use crate::shader::Shader;

/// The most shaders a single program links: one per graphics stage.
pub const MAX_ATTACHED_SHADERS: usize = 5;

/// The driver refused to link. `log` is its diagnostic output, verbatim.
#[derive(Debug, Error)]
#[error("failed to link program:\n{log}")]
pub struct LinkError {
    pub log: String,
}

/// A linked pipeline. Deleted when dropped.
///
/// The shaders are only needed while linking; they are detached afterwards, so dropping them
/// early is fine.
pub struct Program<'gl, A: GlApi + ?Sized> {
    gl: &'gl A,
    handle: GLuint,
}

impl<'gl, A: GlApi + ?Sized> Program<'gl, A> {
    pub fn handle(&self) -> GLuint { self.handle }

    /// Attaches `shaders` in the order given and links them.
    ///
    /// Between one and [`MAX_ATTACHED_SHADERS`] shaders are accepted. Any output in the link log
    /// counts as a failure, and the program object is deleted before the error is returned.
    pub fn link(gl: &'gl A, shaders: &[&Shader<'_, A>]) -> Result<Self, LinkError> {
        if shaders.is_empty() || shaders.len() > MAX_ATTACHED_SHADERS {
            return Err(LinkError {
                log: format!("a program links 1 to {} shaders, got {}", MAX_ATTACHED_SHADERS, shaders.len()),
            });
        }

        let handle = gl.create_program();
        if handle == 0 {
            return Err(LinkError { log: String::from("glCreateProgram returned no program object") });
        }

        for shader in shaders {
            gl.attach_shader(handle, shader.handle());
        }

        gl.link_program(handle);

        let log = gl.program_info_log(handle);
        if !log.trim().is_empty() {
            gl.delete_program(handle);
            log::error!("program linking failed:\n{}", log.trim_end());

            return Err(LinkError { log });
        }

        for shader in shaders {
            gl.detach_shader(handle, shader.handle());
        }

        log::debug!("linked program {} from {} shaders", handle, shaders.len());
        Ok(Self { gl, handle })
    }

    /// Compiles each file (stage from its extension) and links the results.
    pub fn from_files<P: AsRef<Path>>(gl: &'gl A, paths: &[P]) -> Result<Self, GlError> {
        let shaders = paths.iter()
            .map(|p| Shader::from_file(gl, p))
            .collect::<Result<Vec<_>, _>>()?;
        let refs = shaders.iter().collect::<Vec<_>>();

        Ok(Self::link(gl, &refs)?)
    }

    pub fn use_program(&self) {
        self.gl.use_program(self.handle);
    }
}

impl<'gl, A: GlApi + ?Sized> Drop for Program<'gl, A> {
    fn drop(&mut self) {
        self.gl.delete_program(self.handle);
    }
}

impl<'gl, A: GlApi + ?Sized> fmt::Debug for Program<'gl, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Program ( {} )", self.handle)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::fake::{FakeGl, Kind, MINIMAL_FRAGMENT, MINIMAL_VERTEX};
    use crate::shader::ShaderStage;

    fn compile<'gl>(gl: &'gl FakeGl, stage: ShaderStage) -> Shader<'gl, FakeGl> {
        let src = if stage == ShaderStage::Fragment { MINIMAL_FRAGMENT } else { MINIMAL_VERTEX };
        Shader::from_source(gl, stage, src, "test").unwrap()
    }

    #[test]
    fn minimal_vertex_fragment_pair_links() {
        let gl = FakeGl::new();
        let vs = compile(&gl, ShaderStage::Vertex);
        let fs = compile(&gl, ShaderStage::Fragment);

        let program = Program::link(&gl, &[&vs, &fs]).unwrap();

        assert_ne!(program.handle(), 0);
        assert!(gl.program_info_log(program.handle()).is_empty());
    }

    #[test]
    fn attaches_every_shader_in_order_before_linking() {
        let stages = [
            ShaderStage::Vertex,
            ShaderStage::TessControl,
            ShaderStage::TessEvaluation,
            ShaderStage::Geometry,
            ShaderStage::Fragment,
        ];

        for n in 1..=MAX_ATTACHED_SHADERS {
            let gl = FakeGl::new();
            let shaders = stages[..n].iter().map(|s| compile(&gl, *s)).collect::<Vec<_>>();
            let refs = shaders.iter().collect::<Vec<_>>();

            let program = Program::link(&gl, &refs).unwrap();

            let expected = shaders.iter().map(|s| s.handle()).collect::<Vec<_>>();
            assert_eq!(gl.attached_at_link(program.handle()), expected, "with {} shaders", n);
        }
    }

    #[test]
    fn shader_count_outside_one_to_five_is_rejected_before_any_handle_exists() {
        let gl = FakeGl::new();
        let shaders = (0..6).map(|_| compile(&gl, ShaderStage::Vertex)).collect::<Vec<_>>();
        let refs = shaders.iter().collect::<Vec<_>>();

        assert!(Program::link(&gl, &[]).is_err());
        assert!(Program::link(&gl, &refs).is_err());
        assert_eq!(gl.created(Kind::Program), 0);
    }

    #[test]
    fn link_failure_returns_the_log_and_releases_the_program() {
        let gl = FakeGl::new();
        let vs = compile(&gl, ShaderStage::Vertex);
        let fs = compile(&gl, ShaderStage::Fragment);

        gl.fail_next_link("error: fragment input `uv` has no matching vertex output");
        let err = Program::link(&gl, &[&vs, &fs]).unwrap_err();

        assert!(err.log.contains("uv"));
        assert_eq!(gl.deleted(Kind::Program).len(), 1);
        assert_eq!(gl.live_of(Kind::Program), 0);
    }

    #[test]
    fn shaders_can_be_dropped_after_linking() {
        let gl = FakeGl::new();
        let program = {
            let vs = compile(&gl, ShaderStage::Vertex);
            let fs = compile(&gl, ShaderStage::Fragment);
            Program::link(&gl, &[&vs, &fs]).unwrap()
        };

        assert_eq!(gl.live_of(Kind::Shader), 0);
        assert!(gl.is_live(Kind::Program, program.handle()));

        program.use_program();
        assert_eq!(gl.current_program(), program.handle());
    }

    #[test]
    fn drop_deletes_program_exactly_once() {
        let gl = FakeGl::new();
        let vs = compile(&gl, ShaderStage::Compute);
        let handle = Program::link(&gl, &[&vs]).unwrap().handle();

        assert_eq!(gl.deleted(Kind::Program), vec![handle]);
    }

    #[test]
    fn from_files_propagates_shader_errors() {
        let gl = FakeGl::new();
        match Program::from_files(&gl, &["a.vert", "b.txt"]) {
            Err(GlError::Shader(_)) => {}
            other => panic!("unexpected {:?}", other.map(|p| p.handle())),
        }
        assert_eq!(gl.live_count(), 0);
    }
}
