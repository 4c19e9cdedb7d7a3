//! Merchant behavior policies.
//!
//! The observed protocol generations disagree on a few behaviors; each
//! disagreement is a policy here, fixed per merchant at construction.

use serde::{Deserialize, Serialize};

/// What `add_offer` does when the offer is already present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateOfferPolicy {
    /// Re-adding a present offer is a silent no-op.
    #[default]
    Ignore,
    /// Always append, even when the offer is already listed.
    Append,
}

/// What `set_title` does when structured text fails to decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleDecodePolicy {
    /// Surface the decode error; title state is untouched.
    #[default]
    Strict,
    /// Log the failure and keep the previous wire title. The raw title
    /// and mode flag are still recorded.
    Lenient,
}

/// When a broadcast copies offer state before encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotUsesMode {
    /// Copy when more than one bucket will encode in this broadcast, or
    /// when any bucket derives its use representation.
    #[default]
    MultiBucket,
    /// Copy unconditionally.
    Always,
}

/// Per-merchant policy set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MerchantConfig {
    pub duplicate_offers: DuplicateOfferPolicy,
    pub title_decode: TitleDecodePolicy,
    pub snapshot_uses: SnapshotUsesMode,
}
