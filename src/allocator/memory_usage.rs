//! Exposes the memory usage hint that determines where an allocation should live.

/// The memory usage of an allocation indicates where it should live.
/// Give this to a [`MemoryPool`](crate::MemoryPool) to let it decide which memory type to pick.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MemoryUsage {
    /// Store the allocation in GPU only accessible memory. This is where render targets and other
    /// transient task graph resources live.
    #[default]
    GpuOnly,
    /// Host visible memory meant to be read back on the CPU.
    CpuOnly,
    /// Memory useful for uploading data to the GPU and potentially for constant buffers. On most implementations,
    /// this maps to the PCIe BAR.
    CpuToGpu,
    /// Lazily allocated memory for attachments that never leave tile memory. Falls back to regular
    /// device local memory where lazy allocation is not supported.
    LazyAlloc,
    /// Let the allocator decide.
    Auto,
}

impl MemoryUsage {
    /// Whether allocations with this usage are expected to have a persistent host mapping.
    pub fn is_host_visible(&self) -> bool {
        matches!(self, MemoryUsage::CpuOnly | MemoryUsage::CpuToGpu)
    }
}

impl From<MemoryUsage> for gpu_allocator::MemoryLocation {
    fn from(value: MemoryUsage) -> Self {
        match value {
            MemoryUsage::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
            MemoryUsage::CpuOnly => gpu_allocator::MemoryLocation::GpuToCpu,
            MemoryUsage::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
            MemoryUsage::LazyAlloc => gpu_allocator::MemoryLocation::GpuOnly,
            MemoryUsage::Auto => gpu_allocator::MemoryLocation::Unknown,
        }
    }
}

