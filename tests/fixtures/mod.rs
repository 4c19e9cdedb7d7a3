//! Shared fixtures: recording transports and scripted presenters.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use merchants::{
    CustomerId, ItemStack, MerchantId, Offer, Presenter, SessionTransport, Surface, SurfaceVeto,
    TransportError,
};

/// Transport that records every frame it is handed.
pub struct RecordingTransport {
    protocol_version: i32,
    frames: Mutex<Vec<Bytes>>,
}

impl RecordingTransport {
    pub fn new(protocol_version: i32) -> Arc<Self> {
        Arc::new(Self {
            protocol_version,
            frames: Mutex::new(Vec::new()),
        })
    }

    pub fn frames(&self) -> Vec<Bytes> {
        self.frames.lock().unwrap().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.frames.lock().unwrap().clear();
    }

    /// Envelope id prefix of frame `index`.
    pub fn envelope_of(&self, index: usize) -> u32 {
        let frames = self.frames.lock().unwrap();
        let frame = &frames[index];
        u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]])
    }

    /// Payload (everything after the envelope id) of frame `index`.
    pub fn payload_of(&self, index: usize) -> Bytes {
        self.frames.lock().unwrap()[index].slice(4..)
    }
}

impl SessionTransport for RecordingTransport {
    fn protocol_version(&self) -> i32 {
        self.protocol_version
    }

    fn send(&self, frame: Bytes) -> Result<(), TransportError> {
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }
}

/// Transport that refuses every frame.
pub struct FailingTransport {
    protocol_version: i32,
    attempts: AtomicU32,
}

impl FailingTransport {
    pub fn new(protocol_version: i32) -> Arc<Self> {
        Arc::new(Self {
            protocol_version,
            attempts: AtomicU32::new(0),
        })
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::Acquire)
    }
}

impl SessionTransport for FailingTransport {
    fn protocol_version(&self) -> i32 {
        self.protocol_version
    }

    fn send(&self, _frame: Bytes) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::AcqRel);
        Err(TransportError::Closed)
    }
}

/// Presenter with monotonic envelope ids and an optional veto switch.
#[derive(Default)]
pub struct ScriptedPresenter {
    next_envelope_id: u32,
    veto_next: bool,
    pub opened: Vec<CustomerId>,
    pub closed: Vec<CustomerId>,
}

impl ScriptedPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn veto_next(&mut self) {
        self.veto_next = true;
    }
}

impl Presenter for ScriptedPresenter {
    fn open_surface(
        &mut self,
        customer: CustomerId,
        _merchant: MerchantId,
    ) -> Result<Surface, SurfaceVeto> {
        if self.veto_next {
            self.veto_next = false;
            return Err(SurfaceVeto {
                reason: Some("scripted veto".to_string()),
            });
        }
        self.next_envelope_id += 1;
        self.opened.push(customer);
        Ok(Surface {
            envelope_id: self.next_envelope_id,
        })
    }

    fn close_surface(&mut self, customer: CustomerId) {
        self.closed.push(customer);
    }
}

/// Presenter wrapper that shares the veto switch across the `Box`.
#[derive(Clone, Default)]
pub struct SharedPresenter {
    inner: Arc<Mutex<ScriptedPresenter>>,
}

impl SharedPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn veto_next(&self) {
        self.inner.lock().unwrap().veto_next();
    }

    pub fn opened(&self) -> Vec<CustomerId> {
        self.inner.lock().unwrap().opened.clone()
    }

    pub fn closed(&self) -> Vec<CustomerId> {
        self.inner.lock().unwrap().closed.clone()
    }
}

impl Presenter for SharedPresenter {
    fn open_surface(
        &mut self,
        customer: CustomerId,
        merchant: MerchantId,
    ) -> Result<Surface, SurfaceVeto> {
        self.inner.lock().unwrap().open_surface(customer, merchant)
    }

    fn close_surface(&mut self, customer: CustomerId) {
        self.inner.lock().unwrap().close_surface(customer)
    }
}

pub fn offer(kind: u16) -> Offer {
    Offer::new(ItemStack::new(kind, 1), ItemStack::new(1000, 1), 8)
}

pub fn offer_with_uses(kind: u16, max_uses: u32) -> Offer {
    Offer::new(ItemStack::new(kind, 1), ItemStack::new(1000, 1), max_uses)
}
