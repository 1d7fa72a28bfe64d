use gangway_core::{BufferHandle, ValueIdentity};

/// No conversion attempted for this frame yet.
pub(crate) const STAGE_START: u8 = 0;
/// One half-step has completed; the frame expects the matching
/// continuation call, or evidence of recursion.
pub(crate) const STAGE_IN_FLIGHT: u8 = 1;
/// Both half-steps have completed. A further call against this frame means
/// it is being reused for an unrelated conversion.
pub(crate) const STAGE_SETTLED: u8 = 2;

/// One in-flight conversion attempt.
///
/// Parent linkage is positional: frames live in the coordinator's stack,
/// the frame below the top is the parent and index 0 is the base frame,
/// which is reset in place rather than popped.
#[derive(Debug)]
pub(crate) struct Frame<V> {
    pub(crate) stage: u8,
    pub(crate) value: Option<V>,
    pub(crate) identity: Option<ValueIdentity>,
    pub(crate) buffer: Option<BufferHandle>,
    pub(crate) owns_buffer: bool,
}

impl<V> Frame<V> {
    pub(crate) fn new() -> Self {
        Self {
            stage: STAGE_START,
            value: None,
            identity: None,
            buffer: None,
            owns_buffer: false,
        }
    }

    /// Advances the stage by exactly one. Called once per successful step.
    pub(crate) fn advance(&mut self) {
        self.stage += 1;
    }

    /// Clears the frame in place, keeping it on the stack.
    pub(crate) fn reset(&mut self) {
        debug_assert!(!self.owns_buffer, "resetting a frame that still owns a buffer");
        self.stage = STAGE_START;
        self.value = None;
        self.identity = None;
        self.buffer = None;
    }
}
