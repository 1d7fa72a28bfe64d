use core::fmt;

use crate::AllocError;

/// Capability over the foreign side's memory allocator.
///
/// Buffers are identified by opaque [`BufferHandle`] tokens. Handles passed
/// to [`ForeignAllocator::buffer`] and [`ForeignAllocator::buffer_mut`] may
/// have been produced by the foreign side rather than by
/// [`ForeignAllocator::allocate`]; an implementation must be able to resolve
/// both.
///
/// This trait is object-safe and may be used in a dynamic context.
pub trait ForeignAllocator {
    /// Allocates a foreign buffer of `size` bytes and returns its handle.
    fn allocate(&mut self, size: usize) -> Result<BufferHandle, AllocError>;

    /// Releases a previously allocated foreign buffer.
    fn release(&mut self, handle: BufferHandle);

    /// Resolves a handle to the buffer contents.
    fn buffer(&self, handle: BufferHandle) -> &[u8];

    /// Resolves a handle to the buffer contents, mutably.
    fn buffer_mut(&mut self, handle: BufferHandle) -> &mut [u8];
}

assert_obj_safe!(ForeignAllocator);

impl<A: ForeignAllocator + ?Sized> ForeignAllocator for &mut A {
    fn allocate(&mut self, size: usize) -> Result<BufferHandle, AllocError> {
        (**self).allocate(size)
    }

    fn release(&mut self, handle: BufferHandle) {
        (**self).release(handle)
    }

    fn buffer(&self, handle: BufferHandle) -> &[u8] {
        (**self).buffer(handle)
    }

    fn buffer_mut(&mut self, handle: BufferHandle) -> &mut [u8] {
        (**self).buffer_mut(handle)
    }
}

/// Opaque handle to a foreign-side buffer.
///
/// Handles compare by equality only; the coordinator never interprets the
/// raw value. A handle received back from the foreign side that does not
/// compare equal to the one recorded on the current frame is the signature
/// of a nested conversion.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    /// Creates a handle from a raw value chosen by the allocator.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value of this handle.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferHandle({:#x})", self.0)
    }
}
