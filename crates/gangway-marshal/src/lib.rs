#![doc = include_str!("../README.md")]
//!
//! # The two-call protocol
//!
//! A non-nested conversion crosses the boundary exactly twice:
//!
//! - **Managed calling foreign**: [`Marshaler::convert_out`] is invoked
//!   first (stage 0). The coordinator adopts the logical value, allocates a
//!   foreign buffer, serializes into it and hands the buffer handle to the
//!   foreign side. When the foreign call returns, [`Marshaler::convert_in`]
//!   is invoked with that same handle (stage 1) and the results are merged
//!   back into the adopted value. A cleanup hook then releases the buffer.
//! - **Foreign calling managed**: the order is reversed.
//!   [`Marshaler::convert_in`] runs first and materializes a fresh logical
//!   value from the foreign buffer; [`Marshaler::convert_out`] later writes
//!   the managed result back out.
//!
//! # Nesting
//!
//! The foreign side may call back into managed logic while a conversion is
//! still in flight, which invokes the same primitive again before the first
//! invocation has logically finished. There is no explicit correlation
//! token, so nesting is detected two ways:
//!
//! 1. At stage 1, a value identity or buffer handle that does not match the
//!    one recorded on the current frame cannot be the second half of the
//!    conversion in flight; it is the first half of a nested one. A child
//!    frame is pushed and the call retried against it.
//! 2. A third call against a frame that should have finished after two
//!    means the frame is being reused for an unrelated conversion while the
//!    same value or handle is replayed. The frame is split: a child takes
//!    over the tracked value and buffer, and the call is retried.
//!
//! Frames beneath the stack top are suspended until their children are
//! released; releasing a child restores its parent as the current frame.

#[macro_use]
extern crate tracing;

mod frame;
mod marshaler;

// Re-export gangway_core crate for convenience
pub use gangway_core;

pub use self::marshaler::Marshaler;
