/// A result type for conversion operations, which can either succeed with a
/// value of type `T` or fail with a [`MarshalError`].
pub type MarshalResult<T> = Result<T, MarshalError>;

/// An error returned by a conversion operation.
///
/// All variants are recoverable: the coordinator leaves the current frame's
/// stage unadvanced when one of these is returned, so the caller may retry
/// the same call safely.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MarshalError {
    /// The foreign buffer is too small for the operation.
    #[error("not enough bytes in foreign buffer: received {received} bytes, expected {expected} bytes")]
    NotEnoughBytes {
        /// The number of bytes actually available.
        received: usize,
        /// The number of bytes expected or required.
        expected: usize,
    },

    /// A field of the foreign representation is invalid.
    #[error("invalid `{field}`: {reason}")]
    InvalidField {
        /// The name of the invalid field.
        field: &'static str,
        /// The reason why the field is considered invalid.
        reason: &'static str,
    },

    /// The foreign allocator refused to provide a buffer.
    #[error("foreign allocation failed")]
    Alloc(#[from] AllocError),

    /// Any other error that doesn't fit into the above categories.
    #[error("other ({description})")]
    Other {
        /// A description of the error.
        description: &'static str,
    },
}

/// An error returned by the foreign memory allocator.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// The foreign side could not satisfy the requested allocation.
    #[error("foreign allocator is out of memory ({requested} bytes requested)")]
    OutOfMemory {
        /// The number of bytes requested.
        requested: usize,
    },

    /// The foreign side rejected the request for another reason.
    #[error("foreign allocator rejected the request: {reason}")]
    Rejected {
        /// The reason given for the rejection.
        reason: &'static str,
    },
}
