//! The task graph accumulates tasks and freezes them into a [`TaskGraphExecution`].

use crate::{Context, DefaultMemoryPool, ExecutionFn, MemoryPool, Queue, TaskDefinition, TaskGraphExecution, TaskRegistry};

/// A linear list of tasks that share one registry of transient resources.
///
/// Task declarations run immediately when a task is added. Execution phases are recorded in
/// registration order when the built graph is executed. A graph can only be built once.
///
/// Declaring tasks needs no queue. A graph created with [`TaskGraph::with_pool`] can be built, but
/// executing it fails until it is given a queue through [`TaskGraph::with_queue`] or [`TaskGraph::new`].
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct TaskGraph<P: MemoryPool = DefaultMemoryPool> {
    queue: Option<Queue>,
    registry: TaskRegistry<P>,
    #[derivative(Debug = "ignore")]
    tasks: Vec<ExecutionFn<P>>,
}

impl TaskGraph<DefaultMemoryPool> {
    /// Create a graph that submits to the context's queue and allocates from its memory pool.
    pub fn new(context: &Context) -> Self {
        Self::with_queue(context.graphics_queue().clone(), context.memory_pool().clone())
    }
}

impl<P: MemoryPool> TaskGraph<P> {
    /// Create a graph that submits to `queue` and allocates transient resources from `pool`.
    pub fn with_queue(queue: Queue, pool: P) -> Self {
        Self {
            queue: Some(queue),
            registry: TaskRegistry::new(pool),
            tasks: Vec::new(),
        }
    }

    /// Create a graph that allocates transient resources from `pool` and is not bound to a queue yet.
    pub fn with_pool(pool: P) -> Self {
        Self {
            queue: None,
            registry: TaskRegistry::new(pool),
            tasks: Vec::new(),
        }
    }

    /// Bind the queue the built graph will be submitted to, replacing any previous one.
    pub fn set_queue(&mut self, queue: Queue) {
        self.queue = Some(queue);
    }

    /// Add a task written as a closure over the registry. See [`TaskGraph::add`].
    pub fn add_task<F>(&mut self, definition: F)
    where
        F: FnOnce(&mut TaskRegistry<P>) -> Option<ExecutionFn<P>>, {
        self.add(definition);
    }

    /// Run the declaration phase of a task now, and queue its execution phase.
    /// A declaration returning `None` adds nothing.
    pub fn add<T: TaskDefinition<P>>(&mut self, task: T) {
        match task.declare(&mut self.registry) {
            Some(execution) => self.tasks.push(execution),
            None => trace!("Task declaration produced no execution phase, skipping"),
        }
    }

    /// Number of tasks with an execution phase.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn registry(&self) -> &TaskRegistry<P> {
        &self.registry
    }

    /// Freeze the task list. The graph is consumed.
    pub fn build(self) -> TaskGraphExecution<P> {
        TaskGraphExecution::new(self.queue, self.registry, self.tasks)
    }
}
