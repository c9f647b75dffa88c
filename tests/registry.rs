use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use ash::vk;

use vkb::{Access, BufferResource, Error, ExecutionFn, MemoryUsage, TaskDefinition, TaskRegistry};

use framework::MockPool;

mod framework;

fn extent(width: u32, height: u32) -> vk::Extent3D {
    vk::Extent3D {
        width,
        height,
        depth: 1,
    }
}

#[test]
pub fn requested_handles_are_distinct() {
    let mut registry = TaskRegistry::new(MockPool::new());
    let images = (0..16)
        .map(|_| registry.request_image(vk::ImageUsageFlags::SAMPLED, vk::Format::R8G8B8A8_UNORM, extent(4, 4)))
        .collect::<HashSet<_>>();
    let buffers = (0..16)
        .map(|_| registry.request_buffer(vk::BufferUsageFlags::STORAGE_BUFFER, 64))
        .collect::<HashSet<_>>();
    assert_eq!(images.len(), 16, "identical image requests must not be deduplicated");
    assert_eq!(buffers.len(), 16, "identical buffer requests must not be deduplicated");
}

#[test]
pub fn aliases_share_one_allocation() -> Result<()> {
    let pool = MockPool::new();
    let mut registry = TaskRegistry::new(pool.clone());
    let target = registry.request_image(vk::ImageUsageFlags::TRANSFER_DST, vk::Format::R8G8B8A8_UNORM, extent(16, 16));
    let written = registry.write(target);
    let read = registry.read(target);
    assert_ne!(written, read);
    assert_eq!(pool.image_allocations(), 0, "requests and aliases must not allocate");

    let first = registry.image(written)?;
    let second = registry.image(read)?;
    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(registry.image_view(written)?, registry.image_view(read)?);

    let a = registry.image_allocation(written)?.expect("image should materialize");
    let b = registry.image_allocation(read)?.expect("image should materialize");
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(pool.image_allocations(), 1);
    assert_eq!(registry.materialized_images(), 1);
    Ok(())
}

#[test]
pub fn materialized_image_is_single_mip_2d() -> Result<()> {
    let pool = MockPool::new();
    let mut registry = TaskRegistry::new(pool);
    let target = registry.request_image(vk::ImageUsageFlags::COLOR_ATTACHMENT, vk::Format::B8G8R8A8_SRGB, extent(128, 64));
    let alias = registry.write(target);
    let image = registry.image_allocation(alias)?.expect("image should materialize");
    assert_eq!(image.info.image_type, vk::ImageType::TYPE_2D);
    assert_eq!(image.info.mip_levels, 1);
    assert_eq!(image.info.array_layers, 1);
    assert_eq!(image.info.samples, vk::SampleCountFlags::TYPE_1);
    assert_eq!(image.info.initial_layout, vk::ImageLayout::UNDEFINED);
    assert_eq!(image.info.format, vk::Format::B8G8R8A8_SRGB);
    assert_eq!(image.info.extent.width, 128);
    assert_eq!(image.info.extent.height, 64);
    assert_eq!(image.usage, MemoryUsage::GpuOnly);
    Ok(())
}

#[test]
pub fn distinct_requests_materialize_separately() -> Result<()> {
    let pool = MockPool::new();
    let mut registry = TaskRegistry::new(pool.clone());
    let a = registry.request_image(vk::ImageUsageFlags::STORAGE, vk::Format::R32_SFLOAT, extent(8, 8));
    let b = registry.request_image(vk::ImageUsageFlags::STORAGE, vk::Format::R32_SFLOAT, extent(8, 8));
    let a = registry.write(a);
    let b = registry.write(b);
    assert_ne!(registry.image(a)?, registry.image(b)?);
    assert_eq!(pool.image_allocations(), 2);
    Ok(())
}

#[test]
pub fn unknown_alias_resolves_to_nothing() -> Result<()> {
    let mut other = TaskRegistry::new(MockPool::new());
    let image = other.request_image(vk::ImageUsageFlags::SAMPLED, vk::Format::R8_UNORM, extent(1, 1));
    let buffer = other.request_buffer(vk::BufferUsageFlags::UNIFORM_BUFFER, 16);
    let image_aliases = (0..4).map(|_| other.read(image)).collect::<Vec<_>>();
    let buffer_aliases = (0..4).map(|_| other.read(buffer)).collect::<Vec<_>>();

    let pool = MockPool::new();
    let mut registry = TaskRegistry::new(pool.clone());
    let last_image = image_aliases[3];
    let last_buffer = buffer_aliases[3];
    assert_eq!(registry.image(last_image)?, None);
    assert_eq!(registry.image_view(last_image)?, None);
    assert_eq!(registry.buffer(last_buffer)?, None);
    assert_eq!(registry.buffer_view(last_buffer)?, None);
    assert_eq!(registry.resolve_image(last_image), None);
    assert_eq!(pool.image_allocations() + pool.buffer_allocations(), 0);
    Ok(())
}

#[test]
pub fn buffers_materialize_like_images() -> Result<()> {
    let pool = MockPool::new();
    let mut registry = TaskRegistry::new(pool.clone());
    let data = registry.request_buffer(vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_SRC, 4096);
    let written = registry.write(data);
    let read = registry.read(data);

    let view = registry.buffer_view(written)?.expect("buffer should materialize");
    assert_eq!(view.offset, 0);
    assert_eq!(view.size, 4096);
    assert_eq!(registry.buffer_view(read)?, Some(view));
    assert_eq!(registry.buffer(read)?, Some(view.handle()));

    let allocation = registry.buffer_allocation(read)?.expect("buffer should materialize");
    assert_eq!(allocation.size(), 4096);
    assert_eq!(allocation.usage, MemoryUsage::GpuOnly);
    assert_eq!(pool.buffer_allocations(), 1);
    assert_eq!(registry.materialized_buffers(), 1);
    Ok(())
}

#[test]
pub fn read_and_write_are_recorded() {
    let mut registry = TaskRegistry::new(MockPool::new());
    let image = registry.request_image(vk::ImageUsageFlags::SAMPLED, vk::Format::R8_UNORM, extent(2, 2));
    let buffer = registry.request_buffer(vk::BufferUsageFlags::VERTEX_BUFFER, 32);
    let image_write = registry.write(image);
    let image_read = registry.read(image);
    let buffer_read = registry.read(buffer);

    assert_eq!(registry.image_access(image_write), Some(Access::Write));
    assert_eq!(registry.image_access(image_read), Some(Access::Read));
    assert_eq!(registry.buffer_access(buffer_read), Some(Access::Read));
    assert_eq!(registry.resolve_image(image_read), Some(image));
    assert_eq!(registry.resolve_buffer(buffer_read), Some(buffer));
    assert_eq!(registry.buffer_request(buffer).map(|request| request.size), Some(32));
    assert_eq!(registry.image_request(image).map(|request| request.format), Some(vk::Format::R8_UNORM));
}

#[test]
pub fn failed_allocation_is_an_error() {
    let pool = MockPool::new();
    let mut registry = TaskRegistry::new(pool.clone());
    let image = registry.request_image(vk::ImageUsageFlags::SAMPLED, vk::Format::R8_UNORM, extent(2, 2));
    let alias = registry.read(image);
    pool.fail_allocations();
    assert!(registry.image(alias).is_err());
    assert_eq!(registry.materialized_images(), 0);
}

#[test]
pub fn dropping_the_registry_releases_resources() -> Result<()> {
    let pool = MockPool::new();
    let mut registry = TaskRegistry::new(pool.clone());
    let image = registry.request_image(vk::ImageUsageFlags::SAMPLED, vk::Format::R8_UNORM, extent(2, 2));
    let image = registry.read(image);
    let buffer = registry.request_buffer(vk::BufferUsageFlags::UNIFORM_BUFFER, 256);
    let buffer = registry.write(buffer);
    registry.image(image)?;
    let held = registry.buffer_allocation(buffer)?.expect("buffer should materialize");
    assert_eq!(pool.live_images(), 1);
    assert_eq!(pool.live_buffers(), 1);

    drop(registry);
    assert_eq!(pool.live_images(), 0);
    assert_eq!(pool.live_buffers(), 1, "an outside reference keeps the buffer alive");
    drop(held);
    assert_eq!(pool.live_buffers(), 0);
    Ok(())
}

struct Blit {
    size: vk::DeviceSize,
}

impl TaskDefinition<MockPool> for Blit {
    fn declare(self, registry: &mut TaskRegistry<MockPool>) -> Option<ExecutionFn<MockPool>> {
        if self.size == 0 {
            return None;
        }
        let src = registry.request_buffer(vk::BufferUsageFlags::TRANSFER_SRC, self.size);
        let dst = registry.request_buffer(vk::BufferUsageFlags::TRANSFER_DST, self.size);
        let src = registry.read(src);
        let dst = registry.write(dst);
        vkb::execute(move |ctx, cmd| {
            let (Some(src), Some(dst)) = (ctx.buffer_view(src)?, ctx.buffer_view(dst)?) else {
                return Ok(());
            };
            cmd.copy_buffer(&src, &dst)?;
            Ok(())
        })
    }
}

#[test]
pub fn struct_definitions_declare_eagerly() {
    let pool = MockPool::new();
    let mut registry = TaskRegistry::new(pool.clone());
    assert!(Blit {
        size: 0,
    }
    .declare(&mut registry)
    .is_none());
    assert!(Blit {
        size: 512,
    }
    .declare(&mut registry)
    .is_some());

    // The declaration requested two buffers, but nothing is allocated until a body runs.
    let first = registry.request_buffer(vk::BufferUsageFlags::UNIFORM_BUFFER, 1);
    assert_eq!(first.id(), 2);
    assert_eq!(pool.buffer_allocations(), 0);
}

#[test]
pub fn non_2d_extent_is_rejected() {
    let pool = MockPool::new();
    let mut registry = TaskRegistry::new(pool.clone());
    let volume = registry.request_image(
        vk::ImageUsageFlags::STORAGE,
        vk::Format::R8G8B8A8_UNORM,
        vk::Extent3D {
            width: 4,
            height: 4,
            depth: 4,
        },
    );
    let flat = registry.request_image(vk::ImageUsageFlags::STORAGE, vk::Format::R8G8B8A8_UNORM, extent(0, 4));
    let volume = registry.write(volume);
    let flat = registry.write(flat);

    for alias in [volume, flat] {
        let err = registry.image(alias).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidImageExtent(_))));
    }
    assert_eq!(pool.image_allocations(), 0, "invalid requests must never reach the pool");
    assert_eq!(registry.materialized_images(), 0);
}

#[test]
pub fn empty_buffer_is_rejected() {
    let pool = MockPool::new();
    let mut registry = TaskRegistry::new(pool.clone());
    let empty = registry.request_buffer(vk::BufferUsageFlags::STORAGE_BUFFER, 0);
    let empty = registry.read(empty);

    let err = registry.buffer_view(empty).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::EmptyBuffer)));
    assert_eq!(pool.buffer_allocations(), 0);
    assert_eq!(registry.materialized_buffers(), 0);
}
