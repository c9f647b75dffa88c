//! Compilation of shader source into SPIR-V.
//!
//! The [`ShaderCompiler`] trait is the seam between the framework and whatever produces SPIR-V.
//! With the `shaderc` feature enabled, [`GlslShaderCompiler`] compiles GLSL at runtime.

use anyhow::Result;
use ash::vk;

#[cfg(feature = "shaderc")]
mod glsl;

#[cfg(feature = "shaderc")]
pub use glsl::GlslShaderCompiler;

/// Compiles shader source for a single stage into SPIR-V words.
pub trait ShaderCompiler {
    /// Compile `source` for `stage`. `definitions` are preprocessor definitions, each either
    /// `NAME` or `NAME=VALUE`.
    /// # Errors
    /// Fails with [`Error::ShaderCompilation`](crate::Error::ShaderCompilation) if the source does not compile.
    fn compile(&self, stage: vk::ShaderStageFlags, source: &str, entry_point: &str, definitions: &[String]) -> Result<Vec<u32>>;
}
