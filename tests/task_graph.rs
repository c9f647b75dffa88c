use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::Result;
use ash::vk;

use vkb::{execute, Access, BufferResource, Error, MemoryPool, MemoryUsage, SyncPoint, TaskGraph, TransientImageHandle};

use framework::MockPool;

mod framework;

const EXTENT: vk::Extent3D = vk::Extent3D {
    width: 8,
    height: 8,
    depth: 1,
};

#[test]
pub fn declarations_run_eagerly_in_order() {
    let pool = MockPool::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    let mut graph = TaskGraph::with_pool(pool.clone());
    for index in 0..3 {
        let order = order.clone();
        graph.add_task(move |registry| {
            order.borrow_mut().push(index);
            registry.request_buffer(vk::BufferUsageFlags::STORAGE_BUFFER, 64);
            execute(|_ctx, _cmd| Ok(()))
        });
    }
    let skipped = order.clone();
    graph.add_task(move |_registry| {
        skipped.borrow_mut().push(3);
        None
    });

    assert_eq!(*order.borrow(), vec![0, 1, 2, 3], "declarations run when the task is added");
    assert_eq!(graph.task_count(), 3, "declarations without an execution phase are skipped");
    assert_eq!(pool.buffer_allocations(), 0, "declaring tasks must not allocate");

    let exec = graph.build();
    assert_eq!(exec.task_count(), 3);
    assert_eq!(exec.registry().materialized_buffers(), 0);
}

#[test]
pub fn tasks_share_one_registry() {
    let mut graph = TaskGraph::with_pool(MockPool::new());
    let produced: Rc<Cell<Option<TransientImageHandle>>> = Rc::new(Cell::new(None));

    let producer = produced.clone();
    graph.add_task(move |registry| {
        let target = registry.request_image(
            vk::ImageUsageFlags::COLOR_ATTACHMENT,
            vk::Format::R8G8B8A8_UNORM,
            vk::Extent3D {
                width: 4,
                height: 4,
                depth: 1,
            },
        );
        producer.set(Some(target));
        let target = registry.write(target);
        execute(move |ctx, _cmd| {
            ctx.image(target)?;
            Ok(())
        })
    });

    let consumed = Rc::new(Cell::new(None));
    let (source, consumer) = (produced.clone(), consumed.clone());
    graph.add_task(move |registry| {
        let target = source.get()?;
        consumer.set(Some(registry.read(target)));
        execute(|_ctx, _cmd| Ok(()))
    });
    assert_eq!(graph.task_count(), 2);

    let alias = consumed.get().expect("second task should alias the first task's image");
    let registry = graph.registry();
    assert_eq!(registry.resolve_image(alias), produced.get());
    assert_eq!(registry.image_access(alias), Some(Access::Read));
}

#[test]
pub fn executing_without_a_queue_runs_nothing() {
    let pool = MockPool::new();
    let ran = Rc::new(Cell::new(false));
    let flag = ran.clone();
    let mut graph = TaskGraph::with_pool(pool.clone());
    graph.add_task(move |registry| {
        let scratch = registry.request_buffer(vk::BufferUsageFlags::TRANSFER_DST, 16);
        let scratch = registry.write(scratch);
        execute(move |ctx, _cmd| {
            flag.set(true);
            ctx.buffer(scratch)?;
            Ok(())
        })
    });

    let err = graph.build().execute().unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NoCapableQueue)));
    assert!(!ran.get(), "no task body may run without a queue to submit to");
    assert_eq!(pool.buffer_allocations(), 0);
}

#[test]
#[ignore = "requires a Vulkan device"]
pub fn clear_and_read_back() -> Result<()> {
    let context = framework::make_context().expect("Can initialize context.");
    let pool = context.memory_pool().clone();
    let readback = pool.allocate_buffer(
        &vk::BufferCreateInfo {
            size: (EXTENT.width * EXTENT.height * 4) as u64,
            usage: vk::BufferUsageFlags::TRANSFER_DST,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        },
        MemoryUsage::CpuOnly,
    )?;
    let images_before = pool.stats().images;

    let mut graph = TaskGraph::new(&context);
    let target_view = readback.view_full();
    graph.add_task(move |registry| {
        let target = registry.request_image(
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::TRANSFER_SRC,
            vk::Format::R8G8B8A8_UNORM,
            EXTENT,
        );
        let written = registry.write(target);
        let read = registry.read(target);
        execute(move |ctx, cmd| {
            let image = ctx.image(written)?.ok_or(Error::Uncategorized("target image missing"))?;
            assert_eq!(ctx.image(read)?, Some(image));
            cmd.transition_image(image, vk::ImageAspectFlags::COLOR, vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .clear_color_image(image, vk::ImageLayout::TRANSFER_DST_OPTIMAL, [1.0, 0.0, 0.0, 1.0])
                .transition_image(
                    image,
                    vk::ImageAspectFlags::COLOR,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                )
                .copy_image_to_buffer(image, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, vk::ImageAspectFlags::COLOR, EXTENT, &target_view)
                .buffer_barrier(
                    &target_view,
                    vk::PipelineStageFlags::TRANSFER,
                    vk::AccessFlags::TRANSFER_WRITE,
                    vk::PipelineStageFlags::HOST,
                    vk::AccessFlags::HOST_READ,
                );
            Ok(())
        })
    });
    assert_eq!(graph.task_count(), 1);

    let exec = graph.build().execute()?;
    exec.wait()?;
    assert!(exec.is_signaled());
    assert_eq!(exec.registry().materialized_images(), 1);
    assert_eq!(pool.stats().images, images_before + 1, "aliased image must be allocated exactly once");

    let pixels = readback.read_bytes()?;
    assert!(pixels.chunks_exact(4).all(|pixel| pixel == [255, 0, 0, 255]));

    drop(exec);
    assert_eq!(pool.stats().images, images_before);
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
pub fn tasks_run_in_registration_order() -> Result<()> {
    let context = framework::make_context().expect("Can initialize context.");
    let counter = Rc::new(Cell::new(0));
    let mut graph = TaskGraph::new(&context);
    for expected in 0..4 {
        let counter = counter.clone();
        graph.add_task(move |_registry| {
            execute(move |_ctx, _cmd| {
                assert_eq!(counter.get(), expected);
                counter.set(expected + 1);
                Ok(())
            })
        });
    }
    graph.add_task(|_registry| None);
    assert_eq!(graph.task_count(), 4, "declarations without an execution phase are skipped");

    let exec = graph.build().execute()?;
    exec.wait()?;
    assert_eq!(counter.get(), 4);
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
pub fn transient_buffer_fill_and_copy() -> Result<()> {
    let context = framework::make_context().expect("Can initialize context.");
    let readback = context.memory_pool().allocate_buffer(
        &vk::BufferCreateInfo {
            size: 64,
            usage: vk::BufferUsageFlags::TRANSFER_DST,
            sharing_mode: vk::SharingMode::EXCLUSIVE,
            ..Default::default()
        },
        MemoryUsage::CpuOnly,
    )?;
    let dst = readback.view_full();

    let mut graph = TaskGraph::new(&context);
    graph.add_task(move |registry| {
        let scratch = registry.request_buffer(vk::BufferUsageFlags::TRANSFER_SRC | vk::BufferUsageFlags::TRANSFER_DST, 64);
        let scratch = registry.write(scratch);
        execute(move |ctx, cmd| {
            let src = ctx.buffer_view(scratch)?.ok_or(Error::Uncategorized("scratch buffer missing"))?;
            cmd.fill_buffer(&src, 0xDEAD_BEEF).buffer_barrier(
                &src,
                vk::PipelineStageFlags::TRANSFER,
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::TRANSFER,
                vk::AccessFlags::TRANSFER_READ,
            );
            cmd.copy_buffer(&src, &dst)?.buffer_barrier(
                &dst,
                vk::PipelineStageFlags::TRANSFER,
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::HOST,
                vk::AccessFlags::HOST_READ,
            );
            Ok(())
        })
    });

    let exec = graph.build().execute()?;
    exec.wait()?;
    let bytes = readback.read_bytes()?;
    assert!(bytes.chunks_exact(4).all(|word| word == 0xDEAD_BEEFu32.to_ne_bytes()));
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
pub fn failing_task_aborts_execution() -> Result<()> {
    let context = framework::make_context().expect("Can initialize context.");
    let cleaned_up = Rc::new(Cell::new(false));
    let flag = cleaned_up.clone();
    let mut graph = TaskGraph::new(&context);
    graph.add_task(move |_registry| {
        execute(move |ctx, _cmd| {
            ctx.defer_cleanup(move || flag.set(true));
            Err(Error::Uncategorized("task failed").into())
        })
    });
    assert!(graph.build().execute().is_err());
    assert!(cleaned_up.get(), "cleanups run even when execution is aborted");
    Ok(())
}
