//! Wrapper around `VkFence` implementing [`SyncPoint`](crate::SyncPoint) and [`Future`](std::future::Future).

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use anyhow::Result;
use ash::vk;

use crate::{Device, Error, SyncPoint};

/// Wrapper around a [`VkFence`](vk::Fence) object. Fences are used for CPU-GPU sync.
///
/// The observed signaled state is cached, so once a fence was seen signaled it will never report
/// unsignaled again. A fence without a device or handle (see [`Fence::empty`]) never blocks a waiter.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Fence {
    #[derivative(Debug = "ignore")]
    device: Option<Device>,
    handle: vk::Fence,
    signaled: AtomicBool,
}

impl Fence {
    /// Create a new fence, possibly in the signaled status.
    pub fn new(device: Device, signaled: bool) -> Result<Self> {
        let info = vk::FenceCreateInfo {
            flags: if signaled {
                vk::FenceCreateFlags::SIGNALED
            } else {
                vk::FenceCreateFlags::empty()
            },
            ..Default::default()
        };
        let handle = unsafe { device.create_fence(&info, None)? };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkFence {:p}", handle);
        Ok(Fence {
            device: Some(device),
            handle,
            signaled: AtomicBool::new(signaled),
        })
    }

    /// Create a placeholder fence that is not backed by any Vulkan object.
    /// Waiting on it returns immediately.
    pub fn empty() -> Self {
        Fence {
            device: None,
            handle: vk::Fence::null(),
            signaled: AtomicBool::new(false),
        }
    }

    /// Whether this fence is backed by a Vulkan object.
    pub fn is_valid(&self) -> bool {
        self.device.is_some() && self.handle != vk::Fence::null()
    }

    /// Get unsafe access to the underlying `VkFence` handle, for example to pass it to a queue submission.
    /// # Safety
    /// The caller must not destroy or reset the fence.
    pub unsafe fn handle(&self) -> vk::Fence {
        self.handle
    }

    fn latch(&self) {
        self.signaled.store(true, Ordering::Release);
    }
}

impl SyncPoint for Fence {
    fn wait_until(&self, timeout: u64) -> Result<bool> {
        if self.signaled.load(Ordering::Acquire) {
            return Ok(true);
        }
        let Some(device) = self.device.as_ref().filter(|_| self.is_valid()) else {
            warn!("Waiting on a fence that has no device or handle");
            return Ok(true);
        };
        match unsafe { device.wait_for_fences(std::slice::from_ref(&self.handle), true, timeout) } {
            Ok(()) => {
                self.latch();
                Ok(true)
            }
            Err(vk::Result::TIMEOUT) => Ok(false),
            Err(err) => Err(Error::from(err).into()),
        }
    }

    fn is_signaled(&self) -> bool {
        if self.signaled.load(Ordering::Acquire) {
            return true;
        }
        if let Some(device) = self.device.as_ref().filter(|_| self.is_valid()) {
            if let Ok(true) = unsafe { device.get_fence_status(self.handle) } {
                self.latch();
                return true;
            }
        }
        false
    }
}

// Note that the future implementation for Fence works by periodically polling the fence.
impl std::future::Future for Fence {
    type Output = ();

    fn poll(self: Pin<&mut Self>, ctx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.is_signaled() || !self.is_valid() {
            Poll::Ready(())
        } else {
            let waker = ctx.waker().clone();
            std::thread::spawn(move || {
                // We will try to poll every 5 milliseconds.
                std::thread::sleep(Duration::from_millis(5));
                waker.wake();
            });
            Poll::Pending
        }
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        if let Some(device) = &self.device {
            if self.handle != vk::Fence::null() {
                #[cfg(feature = "log-objects")]
                trace!("Destroying VkFence {:p}", self.handle);
                unsafe {
                    device.destroy_fence(self.handle, None);
                }
            }
        }
    }
}
