//! The transport seam.
//!
//! The core never owns a socket: a session hands it an object that knows
//! the negotiated protocol version and accepts framed bytes. Sends are
//! fire-and-forget; a failure is local to one session and never aborts a
//! broadcast.

use bytes::Bytes;
use crossbeam::channel::{Receiver, Sender, TrySendError};
use thiserror::Error;

/// Delivery failure for a single session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("session outbound queue is full")]
    Backpressure,

    #[error("session transport is closed")]
    Closed,
}

/// Per-session outbound channel plus the version it negotiated.
pub trait SessionTransport: Send + Sync {
    /// The protocol version this session negotiated at connect time.
    /// Immutable for the session's lifetime.
    fn protocol_version(&self) -> i32;

    /// Queues one framed message. Must not block; failures are reported
    /// but the caller treats them as non-fatal.
    fn send(&self, frame: Bytes) -> Result<(), TransportError>;
}

/// Reference transport backed by a bounded channel.
///
/// A full queue surfaces as `Backpressure` rather than blocking, which is
/// the drop-on-lag behavior a slow session deserves.
pub struct ChannelTransport {
    protocol_version: i32,
    sender: Sender<Bytes>,
}

impl ChannelTransport {
    /// Creates the transport and the receiving half the embedder drains.
    pub fn bounded(protocol_version: i32, capacity: usize) -> (Self, Receiver<Bytes>) {
        let (sender, receiver) = crossbeam::channel::bounded(capacity.max(1));
        (
            Self {
                protocol_version,
                sender,
            },
            receiver,
        )
    }
}

impl SessionTransport for ChannelTransport {
    fn protocol_version(&self) -> i32 {
        self.protocol_version
    }

    fn send(&self, frame: Bytes) -> Result<(), TransportError> {
        match self.sender.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(TransportError::Backpressure),
            Err(TrySendError::Disconnected(_)) => Err(TransportError::Closed),
        }
    }
}
