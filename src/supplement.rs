use std::ops::Deref;

use crate::base::VInt64;
use crate::element::Element;
use crate::functional::*;

/// Ebml Void element, used for padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Void {
    /// Size of the void element in bytes.
    pub size: u64,
}
impl Element for Void {
    const ID: VInt64 = VInt64::from_encoded(0xEC);
    fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
        let len = buf.len() as u64;
        buf.advance(buf.len());
        Ok(Self { size: len })
    }
    fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        buf.append_slice(&vec![0; self.size as usize]);
        Ok(())
    }
}

impl Void {
    /// Build a `Void` whose fully encoded form (ID + size VInt + body) occupies
    /// exactly `target` bytes.
    ///
    /// The ID is always one byte (0xEC). The size VInt's own length depends on
    /// the body length, which depends on the size VInt's length, so this is
    /// solved by fixed point: start from the lower bound and grow the size
    /// VInt by one byte whenever the candidate body size crosses one of
    /// `VInt64::encode_size`'s length-class boundaries.
    pub fn new_by_size(target: u64) -> crate::Result<Self> {
        // VInt64 encodes the value 127 in 2 bytes (see `VInt64::as_encoded`) to
        // avoid colliding with the reserved all-ones 1-byte "unknown" marker,
        // even though its bit width alone would fit in 1 byte.
        fn vint_len(value: u64) -> u64 {
            if value == 127 {
                2
            } else {
                VInt64::encode_size(value) as u64
            }
        }

        const ID_LEN: u64 = 1;
        if target < ID_LEN + 1 {
            return Err(crate::Error::OutOfBounds);
        }
        let mut size_len = 1u64;
        loop {
            if target < ID_LEN + size_len || size_len > 8 {
                return Err(crate::Error::OutOfBounds);
            }
            let body = target - ID_LEN - size_len;
            let needed = vint_len(body);
            if needed == size_len {
                return Ok(Self { size: body });
            }
            // grow one byte at a time: shrinking the body by one byte can
            // only ever lower its required VInt length by at most one class.
            size_len += 1;
        }
    }
}

/// CRC-32 element, used for integrity checking. The CRC-32 is stored as a little-endian u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc32(pub u32);
impl Deref for Crc32 {
    type Target = u32;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl Element for Crc32 {
    const ID: VInt64 = VInt64::from_encoded(0xBF);
    fn decode_body(buf: &mut &[u8]) -> crate::Result<Self> {
        let buf = <[u8; 4]>::decode_exact(buf, 4)?;
        Ok(Self(u32::from_le_bytes(buf)))
    }
    fn encode_body<B: BufMut>(&self, buf: &mut B) -> crate::Result<()> {
        buf.append_slice(&self.0.to_le_bytes());
        Ok(())
    }
}
