//! The ordered offer list.
//!
//! Insertion order is meaningful: it is the slot order customers see.
//! Mutated only through `Merchant` operations, never by a session.

use std::cmp::Ordering;

use bytes::Bytes;

use super::error::CoreError;
use super::offer::{Offer, OfferSnapshot};
use crate::wire::{self, WireEra};

/// Ordered collection of offers.
#[derive(Clone, Debug, Default)]
pub struct OfferList {
    entries: Vec<Offer>,
}

impl OfferList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, offer: &Offer) -> bool {
        self.entries.contains(offer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Offer> {
        self.entries.iter()
    }

    /// Appends an offer at the end of the slot order.
    pub fn push(&mut self, offer: Offer) {
        self.entries.push(offer);
    }

    /// Inserts before the offer currently at `index`.
    ///
    /// `index == len` is rejected: insertion cannot be used as append.
    pub fn insert(&mut self, index: usize, offer: Offer) -> Result<(), CoreError> {
        self.check_bounds(index)?;
        self.entries.insert(index, offer);
        Ok(())
    }

    /// Removes the first entry with the same identity. Returns whether
    /// anything was removed.
    pub fn remove(&mut self, offer: &Offer) -> bool {
        match self.entries.iter().position(|entry| entry == offer) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes every listed offer (all occurrences). Returns whether at
    /// least one entry was removed.
    pub fn remove_all<'a>(&mut self, offers: impl IntoIterator<Item = &'a Offer>) -> bool {
        let doomed: Vec<&Offer> = offers.into_iter().collect();
        if doomed.is_empty() {
            return false;
        }
        let before = self.entries.len();
        self.entries.retain(|entry| !doomed.contains(&entry));
        self.entries.len() != before
    }

    pub fn get(&self, index: usize) -> Result<&Offer, CoreError> {
        self.check_bounds(index)?;
        Ok(&self.entries[index])
    }

    /// Replaces the offer at `index`, returning the previous occupant.
    pub fn set(&mut self, index: usize, offer: Offer) -> Result<Offer, CoreError> {
        self.check_bounds(index)?;
        Ok(std::mem::replace(&mut self.entries[index], offer))
    }

    /// Sorts the slot order. A list of one or zero entries is left
    /// untouched; the return value says whether a sort pass ran.
    pub fn sort_by<F>(&mut self, mut comparator: F) -> bool
    where
        F: FnMut(&Offer, &Offer) -> Ordering,
    {
        if self.entries.len() <= 1 {
            return false;
        }
        self.entries.sort_by(|a, b| comparator(a, b));
        true
    }

    /// Copies every offer's state once, in slot order.
    pub fn snapshot(&self) -> Vec<OfferSnapshot> {
        self.entries.iter().map(Offer::snapshot).collect()
    }

    /// Encodes the live list for one wire era.
    pub fn encode(&self, era: WireEra) -> Bytes {
        wire::encode_offer_list(era, &self.snapshot())
    }

    fn check_bounds(&self, index: usize) -> Result<(), CoreError> {
        if index >= self.entries.len() {
            return Err(CoreError::out_of_bounds(index, self.entries.len()));
        }
        Ok(())
    }
}
