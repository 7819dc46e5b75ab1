use std::path::Path;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl From<ShaderKind> for shaderc::ShaderKind {
    fn from(kind: ShaderKind) -> Self {
        match kind {
            ShaderKind::Vertex => shaderc::ShaderKind::Vertex,
            ShaderKind::Fragment => shaderc::ShaderKind::Fragment,
        }
    }
}

/// Compiles GLSL to SPIR-V for Vulkan 1.0. Compiler diagnostics come back as the error.
pub fn compile_shader(kind: ShaderKind, source: &str) -> Result<Vec<u32>> {
    compile(kind, source, "shader.glsl")
}

pub fn compile_shader_file(kind: ShaderKind, path: impl AsRef<Path>) -> Result<Vec<u32>> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "shader.glsl".to_owned());
    compile(kind, &source, &file_name)
}

fn compile(kind: ShaderKind, source: &str, file_name: &str) -> Result<Vec<u32>> {
    let compiler = shaderc::Compiler::new().ok_or(Error::ShaderCompilerUnavailable)?;
    let mut options = shaderc::CompileOptions::new().ok_or(Error::ShaderCompilerUnavailable)?;
    options.set_target_env(
        shaderc::TargetEnv::Vulkan,
        shaderc::EnvVersion::Vulkan1_0 as u32,
    );
    options.set_target_spirv(shaderc::SpirvVersion::V1_0);
    options.set_optimization_level(shaderc::OptimizationLevel::Performance);

    let result =
        compiler.compile_into_spirv(source, kind.into(), file_name, "main", Some(&options))?;
    if result.get_num_warnings() > 0 {
        log::warn!("{file_name}: {}", result.get_warning_messages());
    }
    Ok(result.as_binary().to_owned())
}
