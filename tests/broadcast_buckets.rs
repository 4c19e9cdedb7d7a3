//! Version-partitioned broadcast: bucket counts, payload divergence,
//! mid-broadcast session removal, delivery-failure isolation.

mod fixtures;

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use merchants::broadcast::{broadcast_offers, broadcast_title};
use merchants::config::SnapshotUsesMode;
use merchants::session::{CustomerSession, SessionRegistry};
use merchants::{BucketTable, CustomerId, OfferList, SessionTransport, TransportError, WireEra};
use uuid::Uuid;

use fixtures::{offer, offer_with_uses, FailingTransport, RecordingTransport};

fn customer(tag: u8) -> CustomerId {
    CustomerId::from_uuid(Uuid::from_bytes([tag; 16]))
}

fn offers(kinds: &[u16]) -> OfferList {
    let mut list = OfferList::new();
    for &kind in kinds {
        list.push(offer(kind));
    }
    list
}

fn add_session(
    registry: &SessionRegistry,
    tag: u8,
    envelope_id: u32,
    version: i32,
) -> Arc<RecordingTransport> {
    let transport = RecordingTransport::new(version);
    registry.insert(CustomerSession::new(
        customer(tag),
        envelope_id,
        transport.clone(),
    ));
    transport
}

#[test]
fn three_buckets_three_payloads_n_frames() {
    let registry = SessionRegistry::new();
    // Default table: < 28 Legacy, < 47 Classic, else Modern.
    let transports = [
        add_session(&registry, 1, 11, 5),
        add_session(&registry, 2, 12, 27),
        add_session(&registry, 3, 13, 30),
        add_session(&registry, 4, 14, 47),
        add_session(&registry, 5, 15, 900),
    ];

    let list = offers(&[1, 2, 3]);
    let report = broadcast_offers(
        &BucketTable::default(),
        &registry,
        &list,
        SnapshotUsesMode::MultiBucket,
    );
    assert_eq!(report.buckets, 3);
    assert_eq!(report.frames, 5);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.failures, 0);

    // Each frame carries its own session's envelope id and an offer
    // count equal to the list size.
    for (index, transport) in transports.iter().enumerate() {
        assert_eq!(transport.frame_count(), 1);
        assert_eq!(transport.envelope_of(0), 11 + index as u32);
        let payload = transport.payload_of(0);
        assert_eq!(u16::from_le_bytes([payload[0], payload[1]]), 3);
    }

    // Same-era sessions share a payload; different eras diverge.
    assert_eq!(transports[0].payload_of(0), transports[1].payload_of(0));
    assert_ne!(transports[1].payload_of(0), transports[2].payload_of(0));
    assert_ne!(transports[2].payload_of(0), transports[3].payload_of(0));
    assert_eq!(transports[3].payload_of(0), transports[4].payload_of(0));
}

#[test]
fn uniform_table_is_one_bucket() {
    let registry = SessionRegistry::new();
    let a = add_session(&registry, 1, 1, -3);
    let b = add_session(&registry, 2, 2, 5000);

    let report = broadcast_offers(
        &BucketTable::uniform(WireEra::Modern),
        &registry,
        &offers(&[1]),
        SnapshotUsesMode::MultiBucket,
    );
    assert_eq!(report.buckets, 1);
    assert_eq!(report.frames, 2);
    assert_eq!(a.payload_of(0), b.payload_of(0));
}

/// Transport that rips a designated victim out of the registry the first
/// time it is asked to deliver, simulating a disconnect racing the
/// broadcast iteration.
struct RemovingTransport {
    protocol_version: i32,
    registry: SessionRegistry,
    victim: CustomerId,
    delivered: Mutex<Vec<Bytes>>,
}

impl SessionTransport for RemovingTransport {
    fn protocol_version(&self) -> i32 {
        self.protocol_version
    }

    fn send(&self, frame: Bytes) -> Result<(), TransportError> {
        self.registry.remove(self.victim);
        self.delivered.lock().unwrap().push(frame);
        Ok(())
    }
}

#[test]
fn session_removed_mid_broadcast_is_skipped_without_error() {
    let registry = SessionRegistry::new();

    // Customers sort by id in the snapshot; tags 1 and 2 deliver before
    // the victim (tag 9) comes up, and both pull the victim out.
    let victim = customer(9);
    for tag in [1u8, 2] {
        let transport = Arc::new(RemovingTransport {
            protocol_version: 50,
            registry: registry.clone(),
            victim,
            delivered: Mutex::new(Vec::new()),
        });
        registry.insert(CustomerSession::new(customer(tag), tag as u32, transport));
    }
    let victim_transport = RecordingTransport::new(50);
    registry.insert(CustomerSession::new(victim, 9, victim_transport.clone()));
    assert_eq!(registry.len(), 3);

    let report = broadcast_offers(
        &BucketTable::default(),
        &registry,
        &offers(&[1]),
        SnapshotUsesMode::MultiBucket,
    );
    assert_eq!(report.frames, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failures, 0);
    assert_eq!(victim_transport.frame_count(), 0);
}

#[test]
fn one_failing_transport_does_not_abort_the_rest() {
    let registry = SessionRegistry::new();
    let ok_before = add_session(&registry, 1, 1, 50);
    let failing = FailingTransport::new(50);
    registry.insert(CustomerSession::new(customer(2), 2, failing.clone()));
    let ok_after = add_session(&registry, 3, 3, 50);

    let list = offers(&[1, 2]);
    let report = broadcast_offers(
        &BucketTable::default(),
        &registry,
        &list,
        SnapshotUsesMode::MultiBucket,
    );
    assert_eq!(report.failures, 1);
    assert_eq!(report.frames, 2);
    assert_eq!(failing.attempts(), 1);
    assert_eq!(ok_before.frame_count(), 1);
    assert_eq!(ok_after.frame_count(), 1);

    // Offer state is untouched by the failure.
    assert_eq!(list.len(), 2);
}

#[test]
fn snapshot_always_mode_matches_live_encoding_when_quiescent() {
    let registry = SessionRegistry::new();
    let a = add_session(&registry, 1, 1, 50);

    let mut list = OfferList::new();
    let traded = offer_with_uses(1, 4);
    traded.use_up();
    list.push(traded);

    broadcast_offers(
        &BucketTable::default(),
        &registry,
        &list,
        SnapshotUsesMode::Always,
    );
    let always = a.payload_of(0);
    a.clear();
    broadcast_offers(
        &BucketTable::default(),
        &registry,
        &list,
        SnapshotUsesMode::MultiBucket,
    );
    assert_eq!(a.payload_of(0), always);
}

#[test]
fn classic_era_wires_remaining_uses_from_one_snapshot() {
    let registry = SessionRegistry::new();
    // Version 30 resolves to Classic, whose use field is derived.
    let classic = add_session(&registry, 1, 1, 30);
    let modern = add_session(&registry, 2, 2, 50);

    let mut list = OfferList::new();
    let traded = offer_with_uses(7, 5);
    traded.use_up();
    traded.use_up();
    list.push(traded);

    let report = broadcast_offers(
        &BucketTable::default(),
        &registry,
        &list,
        SnapshotUsesMode::MultiBucket,
    );
    assert_eq!(report.buckets, 2);

    // Classic payload: count(2) + items(8) + remaining_uses u32 = 3.
    let classic_payload = classic.payload_of(0);
    let remaining = u32::from_le_bytes([
        classic_payload[10],
        classic_payload[11],
        classic_payload[12],
        classic_payload[13],
    ]);
    assert_eq!(remaining, 3);

    // Modern payload carries uses and max_uses verbatim.
    let modern_payload = modern.payload_of(0);
    let uses = u32::from_le_bytes([
        modern_payload[10],
        modern_payload[11],
        modern_payload[12],
        modern_payload[13],
    ]);
    let max_uses = u32::from_le_bytes([
        modern_payload[14],
        modern_payload[15],
        modern_payload[16],
        modern_payload[17],
    ]);
    assert_eq!(uses, 2);
    assert_eq!(max_uses, 5);
}

#[test]
fn title_broadcast_tags_each_session() {
    let registry = SessionRegistry::new();
    let a = add_session(&registry, 1, 41, 5);
    let b = add_session(&registry, 2, 42, 50);

    let report = broadcast_title(&registry, "Bazaar");
    assert_eq!(report.frames, 2);
    assert_eq!(a.envelope_of(0), 41);
    assert_eq!(b.envelope_of(0), 42);
    assert_eq!(&a.frames()[0][6..], b"Bazaar");
}

#[test]
fn empty_registry_broadcast_is_a_noop() {
    let registry = SessionRegistry::new();
    let report = broadcast_offers(
        &BucketTable::default(),
        &registry,
        &offers(&[1]),
        SnapshotUsesMode::MultiBucket,
    );
    assert_eq!(report.buckets, 0);
    assert_eq!(report.frames, 0);
}
