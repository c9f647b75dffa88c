//! Execution of a built task graph, and the context that keeps its resources alive.

use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use crate::command_buffer::CommandPool;
use crate::{
    AliasedBufferHandle, AliasedImageHandle, BufferView, DefaultMemoryPool, Error, ExecutionFn, Fence, IncompleteCommandBuffer, MemoryPool, Queue, SyncGroup,
    SyncPoint, SyncPtr, TaskRegistry,
};

/// Owns everything a graph submission depends on: the materialized transient resources, the
/// completion signals of the submission, and cleanups registered by task bodies.
///
/// Call [`SyncPoint::wait`] before dropping the context. Dropping it while the GPU still uses
/// its resources is a caller error: the destructor warns, but does not wait.
///
/// On drop, deferred cleanups run in reverse registration order, after which the transient
/// resources are released.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct TaskExecutionContext<P: MemoryPool = DefaultMemoryPool> {
    #[derivative(Debug = "ignore")]
    deferred_cleanups: Vec<Box<dyn FnOnce()>>,
    completion: SyncGroup,
    registry: TaskRegistry<P>,
}

impl<P: MemoryPool> TaskExecutionContext<P> {
    /// Create a context around a registry, with no completion signals attached yet.
    pub fn new(registry: TaskRegistry<P>) -> Self {
        Self {
            deferred_cleanups: Vec::new(),
            completion: SyncGroup::default(),
            registry,
        }
    }

    /// Register a closure to run when this context is dropped. Cleanups run in reverse registration order.
    pub fn defer_cleanup(&mut self, cleanup: impl FnOnce() + 'static) {
        self.deferred_cleanups.push(Box::new(cleanup));
    }

    /// Attach a fence that signals completion of work recorded against this context.
    pub fn append_fence(&mut self, fence: Arc<Fence>) {
        self.completion.push(fence);
    }

    /// Attach any synchronization point that must signal before this context counts as completed.
    pub fn append_sync_point(&mut self, point: SyncPtr) {
        self.completion.push(point);
    }

    /// See [`TaskRegistry::image`].
    pub fn image(&mut self, alias: AliasedImageHandle) -> Result<Option<vk::Image>> {
        self.registry.image(alias)
    }

    /// See [`TaskRegistry::image_view`].
    pub fn image_view(&mut self, alias: AliasedImageHandle) -> Result<Option<vk::ImageView>> {
        self.registry.image_view(alias)
    }

    /// See [`TaskRegistry::buffer`].
    pub fn buffer(&mut self, alias: AliasedBufferHandle) -> Result<Option<vk::Buffer>> {
        self.registry.buffer(alias)
    }

    /// See [`TaskRegistry::buffer_view`].
    pub fn buffer_view(&mut self, alias: AliasedBufferHandle) -> Result<Option<BufferView>> {
        self.registry.buffer_view(alias)
    }

    pub fn registry(&self) -> &TaskRegistry<P> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TaskRegistry<P> {
        &mut self.registry
    }

    /// Number of completion signals attached to this context.
    pub fn sync_point_count(&self) -> usize {
        self.completion.len()
    }
}

impl<P: MemoryPool> SyncPoint for TaskExecutionContext<P> {
    fn wait_until(&self, timeout: u64) -> Result<bool> {
        self.completion.wait_until(timeout)
    }

    fn is_signaled(&self) -> bool {
        self.completion.is_signaled()
    }
}

impl<P: MemoryPool> Drop for TaskExecutionContext<P> {
    fn drop(&mut self) {
        if !self.completion.is_signaled() {
            warn!("Task execution context dropped before its work completed. Call wait() first.");
        }
        while let Some(cleanup) = self.deferred_cleanups.pop() {
            cleanup();
        }
    }
}

/// A frozen list of tasks, ready to be recorded and submitted once.
/// Obtained from [`TaskGraph::build`](crate::TaskGraph::build).
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct TaskGraphExecution<P: MemoryPool = DefaultMemoryPool> {
    queue: Option<Queue>,
    registry: TaskRegistry<P>,
    #[derivative(Debug = "ignore")]
    tasks: Vec<ExecutionFn<P>>,
}

impl<P: MemoryPool> TaskGraphExecution<P> {
    pub(crate) fn new(queue: Option<Queue>, registry: TaskRegistry<P>, tasks: Vec<ExecutionFn<P>>) -> Self {
        Self {
            queue,
            registry,
            tasks,
        }
    }

    /// Number of tasks that will be recorded.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// The registry every task was declared against.
    pub fn registry(&self) -> &TaskRegistry<P> {
        &self.registry
    }

    /// Record every task into a single command buffer in registration order, and submit it.
    ///
    /// No barriers are inserted between tasks. Task bodies synchronize their own accesses.
    /// The returned context must be waited on before it is dropped.
    /// # Errors
    /// * Fails with [`Error::NoCapableQueue`] if the graph was never bound to a queue. No task body runs in that case.
    /// * Fails if creating the command pool, command buffer or fence fails.
    /// * Fails with the first error returned by a task body. Nothing is submitted in that case.
    /// * Fails if submission fails.
    pub fn execute(self) -> Result<TaskExecutionContext<P>> {
        let TaskGraphExecution {
            queue,
            registry,
            tasks,
        } = self;
        let queue = queue.ok_or(Error::NoCapableQueue)?;
        let device = queue.device().clone();
        let mut context = TaskExecutionContext::new(registry);

        let pool = CommandPool::new(device.clone(), queue.family_index(), vk::CommandPoolCreateFlags::TRANSIENT)?;
        let cmd = IncompleteCommandBuffer::new(device.clone(), pool.allocate_primary()?, vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)?;
        // Registered first so the pool is destroyed after every other cleanup.
        context.defer_cleanup(move || drop(pool));

        let count = tasks.len();
        for task in tasks {
            task(&mut context, &cmd)?;
        }

        let cmd = cmd.finish()?;
        let fence = Arc::new(Fence::new(device, false)?);
        queue.submit(&[&cmd], Some(&fence))?;
        context.append_fence(fence);
        debug!("Submitted task graph with {} tasks", count);
        Ok(context)
    }
}
