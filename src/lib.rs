//! Core of a Vulkan sample framework.
//!
//! The crate provides a headless device context, a reference counted GPU memory pool and a
//! transient resource task graph. A frame's rendering work is expressed as a linear sequence of
//! tasks. Every task first declares the transient images and buffers it needs against a
//! [`TaskRegistry`](crate::TaskRegistry), and then returns a closure that records commands once the
//! graph is executed. Resources are allocated lazily the first time a task body touches them.
//!
//! ```no_run
//! use vkb::prelude::*;
//!
//! let settings = AppBuilder::new()
//!     .name("vkb demo")
//!     .validation(true)
//!     .build();
//! let context = Context::new(&settings)?;
//!
//! let mut graph = TaskGraph::new(&context);
//! graph.add_task(|registry| {
//!     let target = registry.request_image(
//!         vk::ImageUsageFlags::TRANSFER_DST,
//!         vk::Format::R8G8B8A8_UNORM,
//!         vk::Extent3D { width: 64, height: 64, depth: 1 },
//!     );
//!     let target = registry.write(target);
//!     execute(move |ctx, cmd| {
//!         let image = ctx.image(target)?.ok_or(Error::Uncategorized("missing target"))?;
//!         cmd.transition_image(
//!             image,
//!             vk::ImageAspectFlags::COLOR,
//!             vk::ImageLayout::UNDEFINED,
//!             vk::ImageLayout::TRANSFER_DST_OPTIMAL,
//!         );
//!         cmd.clear_color_image(image, vk::ImageLayout::TRANSFER_DST_OPTIMAL, [0.0, 0.0, 0.0, 1.0]);
//!         Ok(())
//!     })
//! });
//!
//! let exec = graph.build().execute()?;
//! exec.wait()?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! For further details, check out the following modules
//! - [`core`] for instance, device and context creation.
//! - [`sync`] for fences and synchronization groups.
//! - [`allocator`] for the memory pool and its allocations.
//! - [`command_buffer`] for command recording.
//! - [`graph`] for the task graph itself.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod allocator;
pub mod command_buffer;
pub mod core;
pub mod graph;
pub mod shader;
pub mod sync;
pub mod util;
