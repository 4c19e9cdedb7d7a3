#![forbid(unsafe_code)]

pub mod broadcast;
pub mod config;
pub mod core;
pub mod error;
pub mod merchant;
pub mod presenter;
pub mod session;
pub mod title;
pub mod transport;
pub mod wire;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::broadcast::BroadcastReport;
pub use crate::config::{
    DuplicateOfferPolicy, MerchantConfig, SnapshotUsesMode, TitleDecodePolicy,
};
pub use crate::core::{
    CoreError, CustomerId, ItemStack, MerchantId, Offer, OfferId, OfferList, OfferSnapshot,
};
pub use crate::merchant::{AdmitOutcome, ListenerId, Merchant, TradeListener};
pub use crate::presenter::{NoopPresenter, Presenter, Surface, SurfaceVeto};
pub use crate::session::{CustomerSession, SessionRegistry};
pub use crate::title::TitleDecodeError;
pub use crate::transport::{ChannelTransport, SessionTransport, TransportError};
pub use crate::wire::{BucketTable, WireEra};
