//! Customer sessions and the session registry.
//!
//! The registry is a clonable handle over shared state, so an embedder
//! (or a transport callback) can remove a session while a broadcast is
//! iterating its snapshot. Broadcast re-checks liveness per delivery and
//! skips, never fails.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::core::CustomerId;
use crate::transport::SessionTransport;

/// One connected customer: fixed protocol version, fixed envelope id,
/// an outbound transport.
#[derive(Clone)]
pub struct CustomerSession {
    pub customer: CustomerId,
    pub envelope_id: u32,
    pub protocol_version: i32,
    pub transport: Arc<dyn SessionTransport>,
}

impl CustomerSession {
    pub fn new(
        customer: CustomerId,
        envelope_id: u32,
        transport: Arc<dyn SessionTransport>,
    ) -> Self {
        let protocol_version = transport.protocol_version();
        Self {
            customer,
            envelope_id,
            protocol_version,
            transport,
        }
    }
}

impl std::fmt::Debug for CustomerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerSession")
            .field("customer", &self.customer)
            .field("envelope_id", &self.envelope_id)
            .field("protocol_version", &self.protocol_version)
            .finish()
    }
}

/// Live session set, keyed by customer; at most one session per customer.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<BTreeMap<CustomerId, CustomerSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session. Returns `false` (and changes nothing) when
    /// the customer already has one.
    pub fn insert(&self, session: CustomerSession) -> bool {
        let mut sessions = self.lock();
        if sessions.contains_key(&session.customer) {
            return false;
        }
        sessions.insert(session.customer, session);
        true
    }

    /// Deregisters a customer's session, if any.
    pub fn remove(&self, customer: CustomerId) -> bool {
        self.lock().remove(&customer).is_some()
    }

    pub fn contains(&self, customer: CustomerId) -> bool {
        self.lock().contains_key(&customer)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn customers(&self) -> Vec<CustomerId> {
        self.lock().keys().copied().collect()
    }

    pub fn get(&self, customer: CustomerId) -> Option<CustomerSession> {
        self.lock().get(&customer).cloned()
    }

    /// Copies the current session set; broadcast iterates this snapshot.
    pub fn snapshot(&self) -> Vec<CustomerSession> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<CustomerId, CustomerSession>> {
        // Critical sections are single map operations; recover from poison.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
