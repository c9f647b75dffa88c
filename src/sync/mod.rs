//! The sync module provides host-side synchronization with GPU work.
//!
//! - The [`sync_point`] module defines the [`SyncPoint`](crate::SyncPoint) capability shared by everything
//!   that can be polled or waited on, and [`SyncGroup`](crate::SyncGroup) to combine several of them.
//! - The [`fence`] module provides a wrapper around `VkFence` objects, used for CPU-GPU sync,
//!   as well as an implementation for [`Future`](std::future::Future) for them.

pub mod fence;
pub mod sync_point;
