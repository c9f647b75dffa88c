pub use ash::vk;

pub use crate::core::app_info::*;
pub use crate::core::context::Context;
pub use crate::core::device::Device;
pub use crate::core::error::Error;
pub use crate::core::instance::Instance;
pub use crate::core::physical_device::PhysicalDevice;
pub use crate::core::queue::Queue;

pub use crate::sync::fence::*;
pub use crate::sync::sync_point::*;

pub use crate::allocator::allocation::*;
pub use crate::allocator::memory_pool::*;
pub use crate::allocator::memory_usage::MemoryUsage;
pub use crate::allocator::traits::*;

pub use crate::command_buffer::*;

pub use crate::graph::execution::*;
pub use crate::graph::handle::*;
pub use crate::graph::registry::*;
pub use crate::graph::task::*;
pub use crate::graph::task_graph::TaskGraph;

pub use crate::shader::ShaderCompiler;
#[cfg(feature = "shaderc")]
pub use crate::shader::GlslShaderCompiler;
