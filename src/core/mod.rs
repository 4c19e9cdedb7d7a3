//! Core domain types for merchants.
//!
//! Module hierarchy follows type dependency order:
//! - identity: OfferId, CustomerId, MerchantId
//! - item: ItemStack
//! - offer: Offer handle, shared record state, OfferSnapshot
//! - offers: OfferList
//! - error: CoreError

pub mod error;
pub mod identity;
pub mod item;
pub mod offer;
pub mod offers;

pub use error::CoreError;
pub use identity::{CustomerId, MerchantId, OfferId};
pub use item::ItemStack;
pub use offer::{Offer, OfferSnapshot};
pub use offers::OfferList;
