use std::collections::BTreeMap;

use gangway_core::{AllocError, BufferHandle, ForeignAllocator};

/// In-memory stand-in for the foreign side's allocator.
///
/// Tracks every live buffer so tests can assert that conversions release
/// exactly what they allocate, and can be armed to fail the next
/// allocation to exercise the retry path.
#[derive(Debug, Default)]
pub struct MemoryAllocator {
    buffers: BTreeMap<u64, Vec<u8>>,
    next_handle: u64,
    allocated: usize,
    released: usize,
    fail_next: bool,
}

impl MemoryAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buffers currently live (allocated or adopted, not yet
    /// released).
    pub fn live(&self) -> usize {
        self.buffers.len()
    }

    /// Total number of successful [`ForeignAllocator::allocate`] calls.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Total number of [`ForeignAllocator::release`] calls.
    pub fn released(&self) -> usize {
        self.released
    }

    /// Arms the allocator to fail the next [`ForeignAllocator::allocate`]
    /// call with an out-of-memory error.
    pub fn fail_next_allocation(&mut self) {
        self.fail_next = true;
    }

    /// Registers a buffer produced by the foreign side, as when a foreign
    /// caller hands a pre-filled buffer into managed code. The buffer
    /// counts as live until released, but not as an allocation.
    pub fn adopt_foreign(&mut self, bytes: Vec<u8>) -> BufferHandle {
        let handle = self.fresh_handle();
        self.buffers.insert(handle.as_raw(), bytes);
        handle
    }

    fn fresh_handle(&mut self) -> BufferHandle {
        self.next_handle += 1;
        BufferHandle::from_raw(self.next_handle)
    }
}

impl ForeignAllocator for MemoryAllocator {
    fn allocate(&mut self, size: usize) -> Result<BufferHandle, AllocError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(AllocError::OutOfMemory { requested: size });
        }
        let handle = self.fresh_handle();
        self.buffers.insert(handle.as_raw(), vec![0; size]);
        self.allocated += 1;
        Ok(handle)
    }

    fn release(&mut self, handle: BufferHandle) {
        let released = self.buffers.remove(&handle.as_raw());
        assert!(released.is_some(), "released a buffer that is not live: {handle:?}");
        self.released += 1;
    }

    fn buffer(&self, handle: BufferHandle) -> &[u8] {
        match self.buffers.get(&handle.as_raw()) {
            Some(bytes) => bytes,
            None => panic!("resolved a buffer that is not live: {handle:?}"),
        }
    }

    fn buffer_mut(&mut self, handle: BufferHandle) -> &mut [u8] {
        match self.buffers.get_mut(&handle.as_raw()) {
            Some(bytes) => bytes,
            None => panic!("resolved a buffer that is not live: {handle:?}"),
        }
    }
}
