//! Typed handles for the resources a task declares.
//!
//! A *transient* handle identifies a resource request: a description of an image or buffer that
//! is only allocated once a task body first touches it. An *aliased* handle is what a task body
//! uses to reach a transient resource. It is obtained by declaring a read or a write access in
//! the [`TaskRegistry`](crate::TaskRegistry). Handles of different kinds can never be mixed up.

use static_assertions::{assert_impl_all, assert_type_ne_all};

macro_rules! resource_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            id: u32,
        }

        impl $name {
            pub(crate) fn new(id: u32) -> Self {
                Self {
                    id,
                }
            }

            /// Numeric id of this handle. Ids are unique per handle kind within one registry.
            pub fn id(&self) -> u32 {
                self.id
            }
        }
    };
}

resource_handle!(
    /// Identifies an image request made with [`TaskRegistry::request_image`](crate::TaskRegistry::request_image).
    TransientImageHandle
);
resource_handle!(
    /// Identifies a buffer request made with [`TaskRegistry::request_buffer`](crate::TaskRegistry::request_buffer).
    TransientBufferHandle
);
resource_handle!(
    /// Access to a transient image, usable from a task body.
    AliasedImageHandle
);
resource_handle!(
    /// Access to a transient buffer, usable from a task body.
    AliasedBufferHandle
);

assert_type_ne_all!(TransientImageHandle, TransientBufferHandle, AliasedImageHandle, AliasedBufferHandle);
assert_impl_all!(TransientImageHandle: Copy, Eq, std::hash::Hash, Send, Sync);
assert_impl_all!(TransientBufferHandle: Copy, Eq, std::hash::Hash, Send, Sync);
assert_impl_all!(AliasedImageHandle: Copy, Eq, std::hash::Hash, Send, Sync);
assert_impl_all!(AliasedBufferHandle: Copy, Eq, std::hash::Hash, Send, Sync);
