//! Exposes the vkb error type

use std::ffi::NulError;
use std::sync::PoisonError;

use ash;
use gpu_allocator::AllocationError;
use thiserror::Error;

/// Error type that vkb can return.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load the Vulkan library.
    #[error("Failed to load Vulkan.")]
    LoadFailed(ash::LoadingError),
    /// Could not convert rust string to C-String because it has null bytes
    #[error("Invalid C string")]
    InvalidString(NulError),
    /// Generic Vulkan error type.
    #[error("Vulkan error: `{0}`")]
    VkError(ash::vk::Result),
    /// Vulkan allocation error.
    #[error("Vulkan allocation error: `{0}`")]
    AllocationError(AllocationError),
    /// No suitable GPU found.
    #[error("No physical device found matching requirements.")]
    NoGPU,
    /// No queue was found with the requested capabilities.
    #[error("No queue found with the requested capabilities.")]
    NoCapableQueue,
    /// Poisoned mutex
    #[error("Poisoned mutex")]
    PoisonError,
    /// Mappable buffer expected
    #[error("Requested mappable buffer, but buffer does not have a memory map")]
    UnmappableBuffer,
    /// Data written to a buffer does not fit inside it.
    #[error("Buffer update of {size} bytes does not fit in a buffer of {capacity} bytes.")]
    UpdateOutOfRange { size: u64, capacity: u64 },
    /// Buffer view out of range of original buffer
    #[error("Buffer view is not a valid range in the parent buffer.")]
    BufferViewOutOfRange,
    /// Buffer copy between views of different sizes is not allowed.
    #[error("Buffer copy has invalid buffer views as range.")]
    InvalidBufferCopy,
    /// A transient image request that cannot be created as a single layer 2D image.
    #[error("Transient image extent {0:?} is not a valid 2D extent.")]
    InvalidImageExtent(ash::vk::Extent3D),
    /// A transient buffer request of zero bytes.
    #[error("Transient buffer requested with a size of zero.")]
    EmptyBuffer,
    /// The allocation was already freed.
    #[error("Allocation is no longer valid.")]
    InvalidAllocation,
    /// Compiling a shader to SPIR-V failed.
    #[error("Shader compilation failed: {0}")]
    ShaderCompilation(String),
    /// Uncategorized error.
    #[error("Uncategorized error: `{0}`")]
    Uncategorized(&'static str),
}

impl From<ash::LoadingError> for Error {
    fn from(value: ash::LoadingError) -> Self {
        Error::LoadFailed(value)
    }
}

impl From<NulError> for Error {
    fn from(value: NulError) -> Self {
        Error::InvalidString(value)
    }
}

impl From<ash::vk::Result> for Error {
    fn from(value: ash::vk::Result) -> Self {
        Error::VkError(value)
    }
}

impl From<AllocationError> for Error {
    fn from(value: AllocationError) -> Self {
        Error::AllocationError(value)
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonError
    }
}
