//! Wire protocol: era bucketing and byte-level encoders.
//!
//! Module hierarchy:
//! - bucket: WireEra, BucketTable (version -> era dispatch as data)
//! - encode: per-era offer-list payloads
//! - frame: per-session envelope and the open/rename frame

pub mod bucket;
pub mod encode;
pub mod frame;

pub use bucket::{BucketTable, WireEra};
pub use encode::encode_offer_list;
pub use frame::{open_frame, offer_frame};
