use gangway_core::{BufferHandle, ForeignAllocator, ForeignValue, MarshalResult};

use crate::frame::{Frame, STAGE_IN_FLIGHT, STAGE_SETTLED, STAGE_START};

/// The conversion coordinator.
///
/// Owns one thread's stack of conversion frames and the foreign allocator
/// capability, and drives each frame through the two-call protocol
/// described in the crate documentation. All state transitions happen on
/// the calling thread; each thread owns an independent `Marshaler`, so no
/// locking is involved.
///
/// A conversion that is started must eventually be completed and released
/// through [`Marshaler::release_managed`] or
/// [`Marshaler::release_foreign`]. As a backstop, dropping the coordinator
/// releases any foreign buffers its frames still own.
pub struct Marshaler<V, A: ForeignAllocator> {
    alloc: A,
    // Base frame at index 0, current frame on top. Never empty.
    frames: Vec<Frame<V>>,
}

impl<V: ForeignValue, A: ForeignAllocator> Marshaler<V, A> {
    /// Creates a coordinator for the calling thread with a single base
    /// frame at stage 0.
    pub fn new(alloc: A) -> Self {
        Self {
            alloc,
            frames: vec![Frame::new()],
        }
    }

    /// Projects a logical value into its foreign buffer representation.
    ///
    /// Returns the handle of the buffer holding the serialized value. On
    /// error the current frame's stage is left unadvanced, so the call may
    /// be retried safely.
    pub fn convert_out(&mut self, value: &V) -> MarshalResult<BufferHandle> {
        loop {
            match self.top().stage {
                STAGE_START => {
                    let size = value.foreign_size();
                    debug_assert!(size > 0, "value reports an empty foreign representation");

                    let handle = self.alloc.allocate(size)?;
                    if let Err(error) = value.write_foreign(self.alloc.buffer_mut(handle)) {
                        self.alloc.release(handle);
                        return Err(error);
                    }

                    let top = self.top_mut();
                    top.value = Some(value.clone());
                    top.identity = Some(value.identity());
                    top.buffer = Some(handle);
                    top.owns_buffer = true;
                    top.advance();
                    trace!(size, ?handle, "projected value into a fresh foreign buffer");
                    return Ok(handle);
                }
                STAGE_IN_FLIGHT => {
                    if self.top().identity != Some(value.identity()) {
                        // Not the continuation of the conversion in flight:
                        // a nested outbound conversion is starting while
                        // this one unwinds. Retry against a child frame.
                        self.push_frame();
                        continue;
                    }

                    let Some(handle) = self.top().buffer else {
                        self.corrupted("in-flight frame has no buffer");
                    };
                    // Idempotent re-write into the existing buffer.
                    value.write_foreign(self.alloc.buffer_mut(handle))?;
                    self.top_mut().advance();
                    return Ok(handle);
                }
                STAGE_SETTLED => {
                    self.split_frame();
                }
                _ => self.corrupted("stage out of range in convert_out"),
            }
        }
    }

    /// Reflects a foreign buffer back into a logical value.
    ///
    /// At stage 0 this materializes a fresh value from the buffer; at
    /// stage 1 with a matching handle it merges the buffer contents into
    /// the frame's tracked value in place. On error the current frame's
    /// stage is left unadvanced.
    pub fn convert_in(&mut self, handle: BufferHandle) -> MarshalResult<V> {
        loop {
            match self.top().stage {
                STAGE_START => {
                    let value = V::read_foreign(self.alloc.buffer(handle))?;

                    let top = self.top_mut();
                    top.value = Some(value.clone());
                    top.identity = Some(value.identity());
                    top.buffer = Some(handle);
                    top.advance();
                    trace!(?handle, "materialized a fresh value from the foreign buffer");
                    return Ok(value);
                }
                STAGE_IN_FLIGHT => {
                    if self.top().buffer != Some(handle) {
                        // The handle does not belong to the frame in
                        // flight: this is the first half of a nested
                        // foreign-to-managed conversion arriving while the
                        // outbound half is still pending.
                        self.push_frame();
                        continue;
                    }

                    let Some(tracked) = self.top().value.as_ref() else {
                        self.corrupted("in-flight frame has no value");
                    };
                    // Merge semantics: the tracked value keeps its
                    // identity and is refreshed in place.
                    tracked.update_from_foreign(self.alloc.buffer(handle))?;
                    let refreshed = tracked.clone();
                    self.top_mut().advance();
                    return Ok(refreshed);
                }
                STAGE_SETTLED => {
                    self.split_frame();
                }
                _ => self.corrupted("stage out of range in convert_in"),
            }
        }
    }

    /// Cleanup hook invoked by the managed-side caller.
    ///
    /// Semantically identical to [`Marshaler::release_foreign`]: both end
    /// the current frame's conversion. Calling it again on an already
    /// cleared base frame is a no-op.
    pub fn release_managed(&mut self) {
        trace!("managed-side cleanup hook");
        self.release_current();
    }

    /// Cleanup hook invoked by the foreign-side caller.
    pub fn release_foreign(&mut self) {
        trace!("foreign-side cleanup hook");
        self.release_current();
    }

    /// Reports the foreign buffer size when known ahead of allocation.
    ///
    /// `None` means the size is determined per value at
    /// [`Marshaler::convert_out`] time.
    pub fn size_hint() -> Option<usize> {
        V::size_hint()
    }

    /// Returns the current frame's stage.
    pub fn stage(&self) -> u8 {
        self.top().stage
    }

    /// Returns the depth of the frame stack. The base frame counts, so a
    /// quiescent coordinator reports a depth of 1.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Returns the buffer handle tracked by the current frame, if any.
    pub fn current_buffer(&self) -> Option<BufferHandle> {
        self.top().buffer
    }

    /// Returns a reference to the foreign allocator capability.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns a mutable reference to the foreign allocator capability.
    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.alloc
    }

    fn top(&self) -> &Frame<V> {
        match self.frames.last() {
            Some(frame) => frame,
            None => self.corrupted("frame stack is empty"),
        }
    }

    fn top_mut(&mut self) -> &mut Frame<V> {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => {
                error!("frame stack is empty; aborting");
                std::process::abort();
            }
        }
    }

    fn push_frame(&mut self) {
        self.frames.push(Frame::new());
        debug!(depth = self.frames.len(), "nested conversion detected; pushed a child frame");
    }

    /// Splits the current frame after an impossible third call: a child
    /// frame takes over the tracked value and buffer, both frames are set
    /// to stage 1, and buffer ownership stays with the parent so the
    /// buffer is still released exactly once.
    fn split_frame(&mut self) {
        let parent = self.top_mut();
        parent.stage = STAGE_IN_FLIGHT;
        let child = Frame {
            stage: STAGE_IN_FLIGHT,
            value: parent.value.clone(),
            identity: parent.identity,
            buffer: parent.buffer,
            owns_buffer: false,
        };
        self.frames.push(child);
        debug!(depth = self.frames.len(), "split a reused conversion frame");
    }

    fn release_current(&mut self) {
        match (self.top().owns_buffer, self.top().buffer) {
            (true, Some(handle)) => {
                self.alloc.release(handle);
                self.top_mut().owns_buffer = false;
                trace!(?handle, "released the frame's foreign buffer");
            }
            (true, None) => self.corrupted("frame owns a buffer it does not hold"),
            (false, _) => {}
        }

        if self.frames.len() == 1 {
            // The base frame is never popped; clear it in place so the
            // thread always has a valid current frame to query.
            self.top_mut().reset();
        } else {
            self.frames.pop();
            trace!(depth = self.frames.len(), "popped conversion frame; parent is current again");
        }
    }

    /// Fatal invariant violation: the frame bookkeeping itself is
    /// corrupted and there is no safe recovery. Terminating beats handing
    /// a wrong value across the boundary, so this is an abort, not a
    /// catchable error path.
    #[cold]
    fn corrupted(&self, detail: &'static str) -> ! {
        let stage = self.frames.last().map(|frame| frame.stage);
        error!(
            ?stage,
            depth = self.frames.len(),
            detail,
            "conversion frame bookkeeping is corrupted; aborting"
        );
        std::process::abort();
    }
}

impl<V, A: ForeignAllocator> Drop for Marshaler<V, A> {
    fn drop(&mut self) {
        for frame in &mut self.frames {
            if let (true, Some(handle)) = (frame.owns_buffer, frame.buffer) {
                debug!(?handle, "releasing a foreign buffer still owned at drop");
                self.alloc.release(handle);
                frame.owns_buffer = false;
            }
        }
    }
}
