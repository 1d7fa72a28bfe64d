use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gangway_core::{ForeignValue, MarshalError, MarshalResult, ValueIdentity};

/// Fixed-size logical value: a shared `u64` payload with an 8-byte
/// little-endian foreign representation.
///
/// Clones share the payload cell, so an update through the coordinator is
/// observable from every clone, and the identity token stays stable across
/// clones.
#[derive(Clone, Debug)]
pub struct ProbeValue {
    payload: Rc<Cell<u64>>,
}

impl ProbeValue {
    /// Size of the foreign representation.
    pub const FOREIGN_SIZE: usize = 8;

    pub fn new(payload: u64) -> Self {
        Self {
            payload: Rc::new(Cell::new(payload)),
        }
    }

    pub fn payload(&self) -> u64 {
        self.payload.get()
    }

    pub fn set_payload(&self, payload: u64) {
        self.payload.set(payload);
    }

    /// The foreign representation of `payload`, for fabricating buffers
    /// that stand in for foreign-side data.
    pub fn foreign_bytes(payload: u64) -> Vec<u8> {
        payload.to_le_bytes().to_vec()
    }
}

impl PartialEq for ProbeValue {
    fn eq(&self, other: &Self) -> bool {
        self.payload() == other.payload()
    }
}

impl ForeignValue for ProbeValue {
    fn identity(&self) -> ValueIdentity {
        ValueIdentity::from_raw(Rc::as_ptr(&self.payload) as usize as u64)
    }

    fn foreign_size(&self) -> usize {
        Self::FOREIGN_SIZE
    }

    fn write_foreign(&self, dst: &mut [u8]) -> MarshalResult<()> {
        let received = dst.len();
        let dst = dst
            .get_mut(..Self::FOREIGN_SIZE)
            .ok_or(MarshalError::NotEnoughBytes {
                received,
                expected: Self::FOREIGN_SIZE,
            })?;
        dst.copy_from_slice(&self.payload.get().to_le_bytes());
        Ok(())
    }

    fn update_from_foreign(&self, src: &[u8]) -> MarshalResult<()> {
        self.payload.set(u64::from_le_bytes(fixed_payload(src)?));
        Ok(())
    }

    fn read_foreign(src: &[u8]) -> MarshalResult<Self> {
        Ok(Self::new(u64::from_le_bytes(fixed_payload(src)?)))
    }

    fn size_hint() -> Option<usize> {
        Some(Self::FOREIGN_SIZE)
    }
}

fn fixed_payload(src: &[u8]) -> MarshalResult<[u8; 8]> {
    src.get(..ProbeValue::FOREIGN_SIZE)
        .and_then(|bytes| <[u8; 8]>::try_from(bytes).ok())
        .ok_or(MarshalError::NotEnoughBytes {
            received: src.len(),
            expected: ProbeValue::FOREIGN_SIZE,
        })
}

/// Variable-size logical value: a shared byte blob with a length-prefixed
/// foreign representation, so the buffer size is only known per value.
#[derive(Clone, Debug)]
pub struct BlobValue {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl BlobValue {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Rc::new(RefCell::new(bytes)),
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }
}

impl PartialEq for BlobValue {
    fn eq(&self, other: &Self) -> bool {
        *self.bytes.borrow() == *other.bytes.borrow()
    }
}

impl ForeignValue for BlobValue {
    fn identity(&self) -> ValueIdentity {
        ValueIdentity::from_raw(Rc::as_ptr(&self.bytes) as usize as u64)
    }

    fn foreign_size(&self) -> usize {
        4 + self.bytes.borrow().len()
    }

    fn write_foreign(&self, dst: &mut [u8]) -> MarshalResult<()> {
        let bytes = self.bytes.borrow();
        let expected = 4 + bytes.len();
        let received = dst.len();
        let dst = dst.get_mut(..expected).ok_or(MarshalError::NotEnoughBytes { received, expected })?;
        let len = u32::try_from(bytes.len()).map_err(|_| MarshalError::InvalidField {
            field: "length",
            reason: "blob is longer than a u32 can describe",
        })?;
        dst[..4].copy_from_slice(&len.to_le_bytes());
        dst[4..].copy_from_slice(&bytes);
        Ok(())
    }

    fn update_from_foreign(&self, src: &[u8]) -> MarshalResult<()> {
        *self.bytes.borrow_mut() = decode_blob(src)?;
        Ok(())
    }

    fn read_foreign(src: &[u8]) -> MarshalResult<Self> {
        Ok(Self::new(decode_blob(src)?))
    }
}

fn decode_blob(src: &[u8]) -> MarshalResult<Vec<u8>> {
    let prefix = src.get(..4).ok_or(MarshalError::NotEnoughBytes {
        received: src.len(),
        expected: 4,
    })?;
    let len = usize::try_from(u32::from_le_bytes(
        <[u8; 4]>::try_from(prefix).map_err(|_| MarshalError::Other {
            description: "length prefix is not 4 bytes",
        })?,
    ))
    .map_err(|_| MarshalError::InvalidField {
        field: "length",
        reason: "length does not fit in usize",
    })?;
    src.get(4..4 + len)
        .map(<[u8]>::to_vec)
        .ok_or(MarshalError::NotEnoughBytes {
            received: src.len().saturating_sub(4),
            expected: len,
        })
}
