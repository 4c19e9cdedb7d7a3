use thiserror::Error;

use crate::core::CoreError;
use crate::title::TitleDecodeError;
use crate::transport::TransportError;

/// Crate-level convenience error.
///
/// Not a "god error": it is a thin wrapper over canonical capability errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    TitleDecode(#[from] TitleDecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
