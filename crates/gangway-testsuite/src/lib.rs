//! Test doubles shared by the Gangway integration tests: an in-memory
//! foreign allocator that tracks live buffers, and logical value types with
//! observable identity and payload.

mod alloc;
mod value;

pub use self::alloc::MemoryAllocator;
pub use self::value::{BlobValue, ProbeValue};
