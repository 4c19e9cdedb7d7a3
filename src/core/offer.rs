//! Offers: the shared trade record and its immutable snapshot.
//!
//! An `Offer` is a cheap clonable handle over shared state. The use
//! counter is shared mutable across every merchant that holds the offer,
//! so encoding for several wire eras in one broadcast works from an
//! `OfferSnapshot` copy rather than the live counter.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::identity::{MerchantId, OfferId};
use super::item::ItemStack;

/// A single tradeable entry: one or two inputs, one output, a use counter
/// and a cap.
///
/// Cloning produces another handle to the same record; identity is the
/// `OfferId`, which `PartialEq` compares.
#[derive(Clone)]
pub struct Offer {
    inner: Arc<OfferInner>,
}

struct OfferInner {
    id: OfferId,
    first_input: ItemStack,
    second_input: Option<ItemStack>,
    output: ItemStack,
    max_uses: u32,
    uses: AtomicU32,
    /// Merchants currently holding this offer. Detaching one merchant
    /// must not disturb the others' view of the shared counter.
    owners: Mutex<BTreeSet<MerchantId>>,
}

impl Offer {
    /// Creates a single-input offer. `max_uses` of zero is clamped to one.
    pub fn new(first_input: ItemStack, output: ItemStack, max_uses: u32) -> Self {
        Self::build(first_input, None, output, max_uses)
    }

    /// Creates a two-input offer. `max_uses` of zero is clamped to one.
    pub fn with_second_input(
        first_input: ItemStack,
        second_input: ItemStack,
        output: ItemStack,
        max_uses: u32,
    ) -> Self {
        Self::build(first_input, Some(second_input), output, max_uses)
    }

    fn build(
        first_input: ItemStack,
        second_input: Option<ItemStack>,
        output: ItemStack,
        max_uses: u32,
    ) -> Self {
        Self {
            inner: Arc::new(OfferInner {
                id: OfferId::new(),
                first_input,
                second_input,
                output,
                max_uses: max_uses.max(1),
                uses: AtomicU32::new(0),
                owners: Mutex::new(BTreeSet::new()),
            }),
        }
    }

    pub fn id(&self) -> OfferId {
        self.inner.id
    }

    pub fn first_input(&self) -> ItemStack {
        self.inner.first_input
    }

    pub fn second_input(&self) -> Option<ItemStack> {
        self.inner.second_input
    }

    pub fn output(&self) -> ItemStack {
        self.inner.output
    }

    pub fn max_uses(&self) -> u32 {
        self.inner.max_uses
    }

    pub fn uses(&self) -> u32 {
        self.inner.uses.load(Ordering::Acquire)
    }

    /// Whether the offer has been traded out.
    pub fn is_disabled(&self) -> bool {
        self.uses() >= self.inner.max_uses
    }

    /// Counts one completed trade. Saturates at `u32::MAX`.
    pub fn use_up(&self) {
        let _ = self
            .inner
            .uses
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |uses| {
                Some(uses.saturating_add(1))
            });
    }

    /// Explicitly rewinds the use counter to zero, re-enabling the offer.
    pub fn reset_uses(&self) {
        self.inner.uses.store(0, Ordering::Release);
    }

    /// Copies the full record state; encoders working across wire eras
    /// read from this instead of the live counter.
    pub fn snapshot(&self) -> OfferSnapshot {
        let uses = self.uses();
        OfferSnapshot {
            first_input: self.inner.first_input,
            second_input: self.inner.second_input,
            output: self.inner.output,
            uses,
            max_uses: self.inner.max_uses,
            disabled: uses >= self.inner.max_uses,
        }
    }

    /// Records that `merchant` now holds this offer.
    pub(crate) fn attach(&self, merchant: MerchantId) {
        self.lock_owners().insert(merchant);
    }

    /// Clears the back-reference to `merchant`.
    pub(crate) fn detach(&self, merchant: MerchantId) {
        self.lock_owners().remove(&merchant);
    }

    /// Merchants currently holding this offer.
    pub fn owners(&self) -> Vec<MerchantId> {
        self.lock_owners().iter().copied().collect()
    }

    fn lock_owners(&self) -> MutexGuard<'_, BTreeSet<MerchantId>> {
        // Critical sections are single set operations; recover from poison.
        self.inner
            .owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for Offer {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Offer {}

impl fmt::Debug for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Offer")
            .field("id", &self.inner.id)
            .field("first_input", &self.inner.first_input)
            .field("second_input", &self.inner.second_input)
            .field("output", &self.inner.output)
            .field("uses", &self.uses())
            .field("max_uses", &self.inner.max_uses)
            .finish()
    }
}

/// Immutable copy of one offer's state, taken once per broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OfferSnapshot {
    pub first_input: ItemStack,
    pub second_input: Option<ItemStack>,
    pub output: ItemStack,
    pub uses: u32,
    pub max_uses: u32,
    pub disabled: bool,
}

impl OfferSnapshot {
    /// Uses left before the offer disables. The `Classic` era puts this
    /// derived value on the wire.
    pub fn remaining_uses(&self) -> u32 {
        self.max_uses.saturating_sub(self.uses)
    }
}
