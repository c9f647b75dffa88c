//! The allocator module exposes the memory pool used by the task graph.
//!
//! # Memory pool traits
//! These are defined in [`traits`], and can be implemented to supply a custom pool to the task graph.
//! This is mostly useful for testing task declarations without a GPU.
//! # Default memory pool
//! A default pool based on the `gpu_allocator` crate is implemented in [`memory_pool`]. It hands out
//! reference counted [`ImageAllocation`](crate::ImageAllocation)s and [`BufferAllocation`](crate::BufferAllocation)s
//! that release themselves once the last reference is dropped.

pub mod allocation;
pub mod memory_pool;
pub mod memory_usage;
pub mod traits;
