use crate::MarshalResult;

/// Opaque identity token for a logical value.
///
/// The coordinator records the token of the value it adopted and compares it
/// against the token of every subsequent call to tell "the continuation of
/// the conversion in flight" apart from "the start of a nested conversion".
/// Two tokens must compare equal if and only if they designate the same
/// logical value instance.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ValueIdentity(u64);

impl ValueIdentity {
    /// Creates a token from a raw value chosen by the value type.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value of this token.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

/// A logical value that can be projected into, and refreshed from, a foreign
/// buffer representation.
///
/// Implementations are expected to be cheap handles (reference-counted or
/// otherwise shared), so that cloning tracks the same logical value:
/// [`ForeignValue::update_from_foreign`] must be observable through every
/// clone, and every clone must report the same [`ValueIdentity`].
pub trait ForeignValue: Clone {
    /// Returns the identity token of this logical value.
    fn identity(&self) -> ValueIdentity;

    /// Returns the size in bytes of this value's foreign representation.
    fn foreign_size(&self) -> usize;

    /// Serializes this value into the foreign buffer.
    ///
    /// `dst` is at least [`ForeignValue::foreign_size`] bytes long. Called
    /// again on the same buffer this must be an idempotent re-write.
    fn write_foreign(&self, dst: &mut [u8]) -> MarshalResult<()>;

    /// Refreshes this value in place from the foreign buffer.
    ///
    /// This is merge semantics, not replacement: the logical value keeps its
    /// identity and every clone observes the update.
    fn update_from_foreign(&self, src: &[u8]) -> MarshalResult<()>;

    /// Deserializes a fresh logical value from the foreign buffer.
    fn read_foreign(src: &[u8]) -> MarshalResult<Self>;

    /// Reports the foreign buffer size when it is known ahead of allocation.
    ///
    /// `None` signals that the size is determined per value at conversion
    /// time, which is the common case for variable-length representations.
    fn size_hint() -> Option<usize> {
        None
    }
}
