//! The task graph records a frame's GPU work as a linear sequence of tasks.
//!
//! Every task is declared in two phases (see [`task`]). While a task is added, it requests transient
//! images and buffers from the [`TaskRegistry`](crate::TaskRegistry) and declares read or write
//! accesses to them, which yields aliased handles. When the built graph is executed, all execution
//! phases are recorded in registration order into one command buffer, which is then submitted.
//! Transient resources are only allocated once a task body resolves one of their aliases.
//!
//! There is no reordering and no automatic barrier insertion between tasks. Tasks see each other's
//! commands through command buffer order, and task bodies issue the barriers they need themselves.
//!
//! # Example
//!
//! ```no_run
//! use vkb::prelude::*;
//!
//! # let context: Context = unimplemented!();
//! let mut graph = TaskGraph::new(&context);
//! graph.add_task(|registry| {
//!     let data = registry.request_buffer(vk::BufferUsageFlags::TRANSFER_DST, 1024);
//!     let data = registry.write(data);
//!     execute(move |ctx, cmd| {
//!         if let Some(view) = ctx.buffer_view(data)? {
//!             cmd.fill_buffer(&view, 0);
//!         }
//!         Ok(())
//!     })
//! });
//!
//! let exec = graph.build().execute()?;
//! // Everything the tasks used stays alive until the context is dropped.
//! exec.wait()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod execution;
pub mod handle;
pub mod registry;
pub mod task;
pub mod task_graph;
