//! The version-partitioning broadcast encoder.
//!
//! One broadcast serializes the offer list exactly once per non-empty
//! protocol-era bucket and delivers one addressed frame per live session.
//! Sessions removed between the snapshot and their bucket's delivery are
//! skipped; a failing transport is logged and skipped. Neither ever
//! aborts the rest of the broadcast.

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use crate::config::SnapshotUsesMode;
use crate::core::{OfferList, OfferSnapshot};
use crate::session::{CustomerSession, SessionRegistry};
use crate::wire::{self, BucketTable, WireEra};

/// Outcome counts for one broadcast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Non-empty buckets encoded (distinct payloads produced).
    pub buckets: usize,
    /// Frames delivered.
    pub frames: usize,
    /// Sessions skipped because they left the registry mid-broadcast.
    pub skipped: usize,
    /// Sessions whose transport refused the frame.
    pub failures: usize,
}

/// Serializes the offer list per era bucket and delivers one addressed
/// frame per live session.
pub fn broadcast_offers(
    table: &BucketTable,
    registry: &SessionRegistry,
    offers: &OfferList,
    mode: SnapshotUsesMode,
) -> BroadcastReport {
    let sessions = registry.snapshot();
    if sessions.is_empty() {
        return BroadcastReport::default();
    }

    let buckets = partition(table, sessions);
    let shared_views = snapshot_views(mode, &buckets, offers);

    let mut report = BroadcastReport {
        buckets: buckets.len(),
        ..BroadcastReport::default()
    };

    for (era, bucket) in buckets {
        let payload = match &shared_views {
            Some(views) => wire::encode_offer_list(era, views),
            None => offers.encode(era),
        };

        for session in bucket {
            if !registry.contains(session.customer) {
                trace!(customer = %session.customer, "session left before delivery, skipping");
                report.skipped += 1;
                continue;
            }
            let frame = wire::offer_frame(session.envelope_id, &payload);
            match session.transport.send(frame) {
                Ok(()) => report.frames += 1,
                Err(err) => {
                    warn!(customer = %session.customer, error = %err, "offer frame delivery failed");
                    report.failures += 1;
                }
            }
        }
    }

    debug!(
        buckets = report.buckets,
        frames = report.frames,
        skipped = report.skipped,
        failures = report.failures,
        offers = offers.len(),
        "offer broadcast complete"
    );
    report
}

/// Re-frames the open/rename message for every live session. The offer
/// list is not resent.
pub fn broadcast_title(registry: &SessionRegistry, wire_title: &str) -> BroadcastReport {
    let sessions = registry.snapshot();
    let mut report = BroadcastReport::default();

    for session in sessions {
        if !registry.contains(session.customer) {
            trace!(customer = %session.customer, "session left before delivery, skipping");
            report.skipped += 1;
            continue;
        }
        let frame = wire::open_frame(session.envelope_id, wire_title);
        match session.transport.send(frame) {
            Ok(()) => report.frames += 1,
            Err(err) => {
                warn!(customer = %session.customer, error = %err, "title frame delivery failed");
                report.failures += 1;
            }
        }
    }

    debug!(
        frames = report.frames,
        skipped = report.skipped,
        failures = report.failures,
        "title broadcast complete"
    );
    report
}

/// Sends the current offer list to one session only (the admission
/// snapshot). Failure is swallowed like any other delivery failure.
pub fn send_offer_list(table: &BucketTable, session: &CustomerSession, offers: &OfferList) {
    let era = table.era_for(session.protocol_version);
    let payload = offers.encode(era);
    let frame = wire::offer_frame(session.envelope_id, &payload);
    if let Err(err) = session.transport.send(frame) {
        warn!(customer = %session.customer, error = %err, "admission offer frame delivery failed");
    }
}

fn partition(
    table: &BucketTable,
    sessions: Vec<CustomerSession>,
) -> BTreeMap<WireEra, Vec<CustomerSession>> {
    let mut buckets: BTreeMap<WireEra, Vec<CustomerSession>> = BTreeMap::new();
    for session in sessions {
        let era = table.era_for(session.protocol_version);
        buckets.entry(era).or_default().push(session);
    }
    buckets
}

/// Copies offer state once for the whole broadcast when the mode (or the
/// bucket mix) requires it, so every bucket encodes the same view of the
/// shared use counters.
fn snapshot_views(
    mode: SnapshotUsesMode,
    buckets: &BTreeMap<WireEra, Vec<CustomerSession>>,
    offers: &OfferList,
) -> Option<Vec<OfferSnapshot>> {
    let required = match mode {
        SnapshotUsesMode::Always => true,
        SnapshotUsesMode::MultiBucket => {
            buckets.len() > 1 || buckets.keys().any(|era| era.derives_uses())
        }
    };
    required.then(|| offers.snapshot())
}
