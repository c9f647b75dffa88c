use anyhow::Result;
use ash::vk;
use shaderc::{CompileOptions, EnvVersion, ShaderKind, SpirvVersion, TargetEnv};

use crate::{Error, ShaderCompiler};

/// GLSL to SPIR-V compiler backed by shaderc. Targets Vulkan 1.2 and SPIR-V 1.3.
///
/// # Example
/// ```
/// # use vkb::*;
/// let compiler = GlslShaderCompiler::new()?;
/// let source = "#version 450\nlayout(local_size_x = 64) in;\nvoid main() {}";
/// let spirv = compiler.compile(vk::ShaderStageFlags::COMPUTE, source, "main", &[])?;
/// assert_eq!(spirv[0], 0x0723_0203);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct GlslShaderCompiler {
    compiler: shaderc::Compiler,
}

impl std::fmt::Debug for GlslShaderCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlslShaderCompiler").finish_non_exhaustive()
    }
}

fn shader_kind(stage: vk::ShaderStageFlags) -> Result<ShaderKind> {
    Ok(match stage {
        vk::ShaderStageFlags::VERTEX => ShaderKind::Vertex,
        vk::ShaderStageFlags::FRAGMENT => ShaderKind::Fragment,
        vk::ShaderStageFlags::GEOMETRY => ShaderKind::Geometry,
        vk::ShaderStageFlags::COMPUTE => ShaderKind::Compute,
        vk::ShaderStageFlags::TESSELLATION_CONTROL => ShaderKind::TessControl,
        vk::ShaderStageFlags::TESSELLATION_EVALUATION => ShaderKind::TessEvaluation,
        vk::ShaderStageFlags::RAYGEN_KHR => ShaderKind::RayGeneration,
        vk::ShaderStageFlags::ANY_HIT_KHR => ShaderKind::AnyHit,
        vk::ShaderStageFlags::CLOSEST_HIT_KHR => ShaderKind::ClosestHit,
        vk::ShaderStageFlags::MISS_KHR => ShaderKind::Miss,
        vk::ShaderStageFlags::INTERSECTION_KHR => ShaderKind::Intersection,
        vk::ShaderStageFlags::CALLABLE_KHR => ShaderKind::Callable,
        _ => return Err(Error::ShaderCompilation(format!("unsupported shader stage {:?}", stage)).into()),
    })
}

impl GlslShaderCompiler {
    /// Initialize shaderc.
    pub fn new() -> Result<Self> {
        let compiler = shaderc::Compiler::new().ok_or(Error::Uncategorized("failed to initialize shaderc"))?;
        Ok(Self {
            compiler,
        })
    }
}

impl ShaderCompiler for GlslShaderCompiler {
    fn compile(&self, stage: vk::ShaderStageFlags, source: &str, entry_point: &str, definitions: &[String]) -> Result<Vec<u32>> {
        let kind = shader_kind(stage)?;
        let mut options = CompileOptions::new().ok_or(Error::Uncategorized("failed to create shaderc compile options"))?;
        options.set_target_env(TargetEnv::Vulkan, EnvVersion::Vulkan1_2 as u32);
        options.set_target_spirv(SpirvVersion::V1_3);
        for definition in definitions {
            match definition.split_once('=') {
                Some((name, value)) => options.add_macro_definition(name, Some(value)),
                None => options.add_macro_definition(definition, None),
            }
        }

        match self
            .compiler
            .compile_into_spirv(source, kind, "shader", entry_point, Some(&options))
        {
            Ok(artifact) => {
                if artifact.get_num_warnings() > 0 {
                    warn!("{}", artifact.get_warning_messages());
                }
                Ok(artifact.as_binary().to_vec())
            }
            Err(err) => {
                error!("Failed to compile {:?} shader: {}", stage, err);
                Err(Error::ShaderCompilation(err.to_string()).into())
            }
        }
    }
}
