//! Version-to-era dispatch.
//!
//! A session's negotiated protocol version is an arbitrary integer; the
//! table maps it to the wire era whose encoding that session understands.
//! The mapping is ordered threshold data, not code: adding a protocol era
//! is a table change.

use serde::{Deserialize, Serialize};

use crate::core::error::CoreError;

/// One supported wire encoding of the offer list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireEra {
    /// Oldest layout: items and the disabled flag only.
    Legacy,
    /// Adds a derived remaining-uses counter.
    Classic,
    /// Full use accounting: uses and max uses.
    Modern,
}

impl WireEra {
    /// Whether this era's encoding derives its use representation from
    /// the live counter instead of carrying it verbatim.
    pub fn derives_uses(self) -> bool {
        matches!(self, WireEra::Classic)
    }
}

/// Ordered `(upper_exclusive_version, era)` cutoffs plus a fallback era.
///
/// Every `i32` version lands in exactly one era: the first cutoff the
/// version is below wins, and anything at or above the last cutoff takes
/// the fallback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTable {
    cutoffs: Vec<(i32, WireEra)>,
    fallback: WireEra,
}

impl BucketTable {
    /// Builds a table, rejecting cutoff lists that are not strictly
    /// ascending.
    pub fn new(cutoffs: Vec<(i32, WireEra)>, fallback: WireEra) -> Result<Self, CoreError> {
        for (position, window) in cutoffs.windows(2).enumerate() {
            if window[0].0 >= window[1].0 {
                return Err(CoreError::UnsortedBucketTable {
                    cutoff: window[1].0,
                    position: position + 1,
                });
            }
        }
        Ok(Self { cutoffs, fallback })
    }

    /// Single-format table: every session gets `era`.
    pub fn uniform(era: WireEra) -> Self {
        Self {
            cutoffs: Vec::new(),
            fallback: era,
        }
    }

    /// Resolves a negotiated protocol version to its era.
    pub fn era_for(&self, version: i32) -> WireEra {
        for &(upper_exclusive, era) in &self.cutoffs {
            if version < upper_exclusive {
                return era;
            }
        }
        self.fallback
    }
}

impl Default for BucketTable {
    /// `< 28` Legacy, `< 47` Classic, else Modern.
    fn default() -> Self {
        Self {
            cutoffs: vec![(28, WireEra::Legacy), (47, WireEra::Classic)],
            fallback: WireEra::Modern,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_all_versions() {
        let table = BucketTable::default();
        assert_eq!(table.era_for(i32::MIN), WireEra::Legacy);
        assert_eq!(table.era_for(27), WireEra::Legacy);
        assert_eq!(table.era_for(28), WireEra::Classic);
        assert_eq!(table.era_for(46), WireEra::Classic);
        assert_eq!(table.era_for(47), WireEra::Modern);
        assert_eq!(table.era_for(i32::MAX), WireEra::Modern);
    }

    #[test]
    fn uniform_table_is_the_degenerate_case() {
        let table = BucketTable::uniform(WireEra::Modern);
        assert_eq!(table.era_for(i32::MIN), WireEra::Modern);
        assert_eq!(table.era_for(0), WireEra::Modern);
    }

    #[test]
    fn rejects_unsorted_cutoffs() {
        let err = BucketTable::new(
            vec![(47, WireEra::Legacy), (28, WireEra::Classic)],
            WireEra::Modern,
        )
        .unwrap_err();
        assert_eq!(
            err,
            CoreError::UnsortedBucketTable {
                cutoff: 28,
                position: 1
            }
        );
    }

    #[test]
    fn rejects_duplicate_cutoffs() {
        assert!(
            BucketTable::new(
                vec![(28, WireEra::Legacy), (28, WireEra::Classic)],
                WireEra::Modern,
            )
            .is_err()
        );
    }
}
