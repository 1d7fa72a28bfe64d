#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

#[macro_use]
mod macros;

mod alloc;
mod error;
mod value;

// Flat API hierarchy of common traits and types

pub use self::alloc::*;
pub use self::error::*;
pub use self::value::*;
