use std::sync::Arc;

use anyhow::Result;
use futures::executor::block_on;

use vkb::{Fence, SyncGroup, SyncPoint, SyncPtr};

mod framework;

#[test]
#[ignore = "requires a Vulkan device"]
pub fn unsignaled_fence_times_out() -> Result<()> {
    let context = framework::make_context().expect("Can initialize context.");
    let fence = Fence::new(context.device().clone(), false)?;
    assert!(fence.is_valid());
    assert!(!fence.is_signaled());
    assert!(!fence.wait_until(0)?);
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
pub fn signaled_fence_stays_signaled() -> Result<()> {
    let context = framework::make_context().expect("Can initialize context.");
    let fence = Arc::new(Fence::new(context.device().clone(), true)?);
    assert!(fence.wait_until(0)?);
    assert!(fence.is_signaled());

    let group = SyncGroup::new(vec![fence.clone() as SyncPtr]);
    assert!(group.is_signaled());
    Ok(())
}

#[test]
#[ignore = "requires a Vulkan device"]
pub fn fence_is_a_future() -> Result<()> {
    let context = framework::make_context().expect("Can initialize context.");
    let fence = Fence::new(context.device().clone(), true)?;
    block_on(fence);
    Ok(())
}
