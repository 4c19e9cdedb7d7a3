//! The presentation seam.
//!
//! Opening a surface for an admitted customer is the embedder's job (a UI
//! window, a container, whatever the world renders). The presenter may
//! veto the admission; the merchant then rolls the registration back.

use std::fmt;

use crate::core::{CustomerId, MerchantId};

/// Handle to an opened presentation surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    /// Envelope id assigned to the new session; tags every outbound frame.
    pub envelope_id: u32,
}

/// The presenter refused to open a surface.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SurfaceVeto {
    pub reason: Option<String>,
}

impl fmt::Display for SurfaceVeto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "surface vetoed: {reason}"),
            None => write!(f, "surface vetoed"),
        }
    }
}

/// Opens and closes presentation surfaces and assigns envelope ids.
pub trait Presenter {
    /// Attempts to open a surface for `customer` at `merchant`. A veto
    /// leaves no state behind on either side.
    fn open_surface(
        &mut self,
        customer: CustomerId,
        merchant: MerchantId,
    ) -> Result<Surface, SurfaceVeto>;

    /// Tears down the customer's surface. Called on removal; must be
    /// idempotent.
    fn close_surface(&mut self, customer: CustomerId);
}

/// Presenter that always admits, assigning envelope ids from a counter.
#[derive(Debug, Default)]
pub struct NoopPresenter {
    next_envelope_id: u32,
}

impl NoopPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Presenter for NoopPresenter {
    fn open_surface(
        &mut self,
        _customer: CustomerId,
        _merchant: MerchantId,
    ) -> Result<Surface, SurfaceVeto> {
        self.next_envelope_id = self.next_envelope_id.wrapping_add(1);
        Ok(Surface {
            envelope_id: self.next_envelope_id,
        })
    }

    fn close_surface(&mut self, _customer: CustomerId) {}
}
