//! Two-phase task definitions.
//!
//! A task is declared in two steps. The declaration phase runs immediately when the task is added
//! to a [`TaskGraph`](crate::TaskGraph): it requests resources from the [`TaskRegistry`] and declares
//! accesses to them. It then returns the execution phase, a closure that only captures aliased handles
//! and plain task state, and that records commands once the graph is executed.

use anyhow::Result;

use crate::{DefaultMemoryPool, IncompleteCommandBuffer, MemoryPool, TaskExecutionContext, TaskRegistry};

/// The execution phase of a task. Invoked once, in task registration order, with the shared
/// execution context and the command buffer of the graph.
pub type ExecutionFn<P = DefaultMemoryPool> = Box<dyn FnOnce(&mut TaskExecutionContext<P>, &IncompleteCommandBuffer) -> Result<()>>;

/// The declaration phase of a task.
///
/// This is implemented for every closure taking a registry, so most tasks are written inline.
/// Implement it on a struct for tasks that carry configuration.
///
/// # Example
/// ```
/// # use vkb::*;
/// struct ClearTask {
///     color: [f32; 4],
///     extent: vk::Extent3D,
/// }
///
/// impl TaskDefinition for ClearTask {
///     fn declare(self, registry: &mut TaskRegistry) -> Option<ExecutionFn> {
///         let target = registry.request_image(vk::ImageUsageFlags::TRANSFER_DST, vk::Format::R8G8B8A8_UNORM, self.extent);
///         let target = registry.write(target);
///         execute(move |ctx, cmd| {
///             if let Some(image) = ctx.image(target)? {
///                 cmd.transition_image(image, vk::ImageAspectFlags::COLOR, vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
///                     .clear_color_image(image, vk::ImageLayout::TRANSFER_DST_OPTIMAL, self.color);
///             }
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait TaskDefinition<P: MemoryPool = DefaultMemoryPool> {
    /// Declare resources and accesses, then return the execution phase.
    /// Returning `None` adds no task.
    fn declare(self, registry: &mut TaskRegistry<P>) -> Option<ExecutionFn<P>>;
}

impl<P: MemoryPool, F> TaskDefinition<P> for F
where
    F: FnOnce(&mut TaskRegistry<P>) -> Option<ExecutionFn<P>>,
{
    fn declare(self, registry: &mut TaskRegistry<P>) -> Option<ExecutionFn<P>> {
        self(registry)
    }
}

/// Box a closure as the execution phase of a task.
pub fn execute<P, F>(f: F) -> Option<ExecutionFn<P>>
where
    P: MemoryPool,
    F: FnOnce(&mut TaskExecutionContext<P>, &IncompleteCommandBuffer) -> Result<()> + 'static,
{
    Some(Box::new(f))
}
