//! Polymorphic completion signals.

use std::sync::Arc;

use anyhow::Result;

/// Shared pointer to any synchronization point.
pub type SyncPtr = Arc<dyn SyncPoint + Send + Sync>;

/// Something that eventually becomes signaled, usually because submitted GPU work completed.
///
/// Implementors must latch: once [`SyncPoint::is_signaled`] or [`SyncPoint::wait_until`] observed
/// the signaled state, every later call reports signaled as well.
pub trait SyncPoint {
    /// Block until signaled or until `timeout` nanoseconds have passed.
    /// Returns `Ok(true)` when signaled and `Ok(false)` on timeout.
    /// # Errors
    /// * Fails if the device was lost while waiting.
    fn wait_until(&self, timeout: u64) -> Result<bool>;

    /// Non-blocking poll of the signaled state.
    fn is_signaled(&self) -> bool;

    /// Block until signaled, without a timeout.
    fn wait(&self) -> Result<()> {
        self.wait_until(u64::MAX)?;
        Ok(())
    }
}

/// A group of synchronization points that is signaled once every member is.
/// An empty group is always signaled.
///
/// # Example
/// ```no_run
/// # use vkb::*;
/// # use std::sync::Arc;
/// # fn submit_uploads() -> Vec<Arc<Fence>> { unimplemented!() }
/// let fences = submit_uploads();
/// let group = SyncGroup::new(fences.into_iter().map(|fence| fence as SyncPtr).collect());
/// group.wait()?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Derivative, Default, Clone)]
#[derivative(Debug)]
pub struct SyncGroup {
    #[derivative(Debug = "ignore")]
    points: Vec<SyncPtr>,
}

impl SyncGroup {
    /// Create a group over the given synchronization points.
    pub fn new(points: Vec<SyncPtr>) -> Self {
        Self {
            points,
        }
    }

    /// Add another member to the group.
    pub fn push(&mut self, point: SyncPtr) {
        self.points.push(point);
    }

    /// Number of members in this group.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether this group has no members.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl SyncPoint for SyncGroup {
    /// Waits on every member with the same timeout. Returns `Ok(false)` as soon as one member times out.
    fn wait_until(&self, timeout: u64) -> Result<bool> {
        for point in &self.points {
            if !point.wait_until(timeout)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn is_signaled(&self) -> bool {
        self.points.iter().all(|point| point.is_signaled())
    }
}
