//! Per-session framing.
//!
//! Every outbound message starts with the session's envelope id so the
//! remote endpoint can route it to the correct open surface.

use bytes::Bytes;

/// Slot count advertised in the open frame: two inputs and one result.
pub const OPEN_SLOT_COUNT: u8 = 3;

/// `[envelope_id: u32][payload]` — the offer-list update frame.
pub fn offer_frame(envelope_id: u32, payload: &Bytes) -> Bytes {
    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&envelope_id.to_le_bytes());
    buf.extend_from_slice(payload);
    Bytes::from(buf)
}

/// `[envelope_id: u32][slot_count: u8][title_len: u8][title utf-8]` —
/// sent on admission and again whenever the wire title changes.
///
/// `wire_title` is already truncated to the 32-code-unit wire limit, so
/// its UTF-8 form always fits the one-byte length prefix.
pub fn open_frame(envelope_id: u32, wire_title: &str) -> Bytes {
    let title = wire_title.as_bytes();
    let mut buf = Vec::with_capacity(6 + title.len());
    buf.extend_from_slice(&envelope_id.to_le_bytes());
    buf.push(OPEN_SLOT_COUNT);
    buf.push(u8::try_from(title.len()).unwrap_or(u8::MAX));
    buf.extend_from_slice(title);
    Bytes::from(buf)
}
