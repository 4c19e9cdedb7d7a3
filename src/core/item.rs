//! Tradeable item values.

use serde::{Deserialize, Serialize};

/// A stack of one item kind.
///
/// `kind` is an opaque numeric item identifier owned by the embedding
/// world; the core only moves it between offers and the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStack {
    pub kind: u16,
    pub count: u8,
}

impl ItemStack {
    pub const WIRE_LEN: usize = 3;

    pub fn new(kind: u16, count: u8) -> Self {
        Self { kind, count }
    }

    /// Appends the 3-byte wire form: `kind: u16 LE`, `count: u8`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.kind.to_le_bytes());
        buf.push(self.count);
    }
}
