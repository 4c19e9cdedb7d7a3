//! Per-era offer-list payloads.
//!
//! All integers little-endian. Common layout:
//! `[offer_count: u16][per offer: first_input, has_second: u8,
//! (second_input), output, disabled: u8, era-specific use fields]`.
//!
//! Encoding is pure: it reads immutable snapshots and cannot fail.

use bytes::Bytes;

use crate::core::offer::OfferSnapshot;
use super::bucket::WireEra;

/// Encodes the whole offer list once, in `era`'s layout.
///
/// Lists longer than `u16::MAX` entries saturate the count field; the
/// merchant API never produces one.
pub fn encode_offer_list(era: WireEra, offers: &[OfferSnapshot]) -> Bytes {
    let mut buf = Vec::with_capacity(2 + offers.len() * per_offer_hint(era));
    let count = u16::try_from(offers.len()).unwrap_or(u16::MAX);
    buf.extend_from_slice(&count.to_le_bytes());
    for offer in offers.iter().take(count as usize) {
        encode_offer(era, offer, &mut buf);
    }
    Bytes::from(buf)
}

fn encode_offer(era: WireEra, offer: &OfferSnapshot, buf: &mut Vec<u8>) {
    offer.first_input.encode_into(buf);
    match offer.second_input {
        Some(second) => {
            buf.push(1);
            second.encode_into(buf);
        }
        None => buf.push(0),
    }
    offer.output.encode_into(buf);
    buf.push(u8::from(offer.disabled));

    match era {
        WireEra::Legacy => {}
        WireEra::Classic => {
            buf.extend_from_slice(&offer.remaining_uses().to_le_bytes());
        }
        WireEra::Modern => {
            buf.extend_from_slice(&offer.uses.to_le_bytes());
            buf.extend_from_slice(&offer.max_uses.to_le_bytes());
        }
    }
}

fn per_offer_hint(era: WireEra) -> usize {
    match era {
        WireEra::Legacy => 11,
        WireEra::Classic => 15,
        WireEra::Modern => 19,
    }
}
