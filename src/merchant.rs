//! The trading counter.
//!
//! A `Merchant` owns title state, the offer list, the session registry
//! and the trade-listener registrations, and drives the broadcast
//! protocols: every mutation that changes observable offer state
//! triggers exactly one broadcast at its end, never per intermediate
//! step. Callers serialize access to one merchant; different merchants
//! are independent.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::broadcast::{self, BroadcastReport};
use crate::config::{DuplicateOfferPolicy, MerchantConfig, TitleDecodePolicy};
use crate::core::{CustomerId, MerchantId, Offer, OfferList};
use crate::presenter::{Presenter, SurfaceVeto};
use crate::session::{CustomerSession, SessionRegistry};
use crate::title::{self, TitleDecodeError};
use crate::transport::SessionTransport;
use crate::wire::{self, BucketTable};
use crate::Result;

/// Result of an admission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// A session was registered and the initial frames were sent.
    Admitted,
    /// The customer already has a session; nothing changed.
    AlreadyPresent,
    /// The presenter vetoed or failed; nothing was left half-registered.
    Refused(SurfaceVeto),
}

/// Registration handle for a trade listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Observer of completed trades. Dispatch is driven by the surrounding
/// trade-execution flow via [`Merchant::notify_trade`].
pub trait TradeListener: Send + Sync {
    fn on_trade(&self, customer: CustomerId, offer: &Offer);
}

/// A stateful trading counter synchronizing its offer list to a dynamic
/// set of version-heterogeneous customer sessions.
pub struct Merchant {
    id: MerchantId,
    config: MerchantConfig,
    table: BucketTable,
    title: String,
    title_structured: bool,
    wire_title: String,
    offers: OfferList,
    sessions: SessionRegistry,
    presenter: Box<dyn Presenter>,
    listeners: BTreeMap<ListenerId, Arc<dyn TradeListener>>,
    next_listener_id: u64,
    last_trade: Option<Offer>,
}

impl Merchant {
    /// Creates a merchant with default policies and the default bucket
    /// table. Fails only when a structured title does not decode under
    /// the strict policy.
    pub fn new(title: &str, structured: bool, presenter: Box<dyn Presenter>) -> Result<Self> {
        Self::with_config(
            title,
            structured,
            MerchantConfig::default(),
            BucketTable::default(),
            presenter,
        )
    }

    pub fn with_config(
        title: &str,
        structured: bool,
        config: MerchantConfig,
        table: BucketTable,
        presenter: Box<dyn Presenter>,
    ) -> Result<Self> {
        let mut merchant = Self {
            id: MerchantId::new(),
            config,
            table,
            title: String::new(),
            title_structured: false,
            wire_title: String::new(),
            offers: OfferList::new(),
            sessions: SessionRegistry::new(),
            presenter,
            listeners: BTreeMap::new(),
            next_listener_id: 0,
            last_trade: None,
        };
        merchant.set_title(title, structured)?;
        Ok(merchant)
    }

    pub fn id(&self) -> MerchantId {
        self.id
    }

    pub fn config(&self) -> &MerchantConfig {
        &self.config
    }

    pub fn bucket_table(&self) -> &BucketTable {
        &self.table
    }

    // =========================================================================
    // Title protocol
    // =========================================================================

    /// Raw title as last set, undecoded and untruncated.
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_title_structured(&self) -> bool {
        self.title_structured
    }

    /// Truncated, encoding-resolved projection of the title that goes on
    /// the wire.
    pub fn wire_title(&self) -> &str {
        &self.wire_title
    }

    /// Sets the title. Structured text is decoded to a flat display
    /// string first; the wire form is its 32-code-unit truncation. Every
    /// live session receives a rename frame, but only when the wire form
    /// actually changed.
    pub fn set_title(&mut self, title: &str, structured: bool) -> Result<()> {
        let display = if structured {
            match title::decode_structured(title) {
                Ok(display) => Some(display),
                Err(err) => match self.config.title_decode {
                    TitleDecodePolicy::Strict => return Err(err.into()),
                    TitleDecodePolicy::Lenient => {
                        self.log_title_decode_failure(&err);
                        None
                    }
                },
            }
        } else {
            Some(title.to_string())
        };

        self.title = title.to_string();
        self.title_structured = structured;

        if let Some(display) = display {
            let wire_title = title::wire_title(&display);
            if wire_title != self.wire_title {
                self.wire_title = wire_title;
                broadcast::broadcast_title(&self.sessions, &self.wire_title);
            }
        }
        Ok(())
    }

    fn log_title_decode_failure(&self, err: &TitleDecodeError) {
        warn!(merchant = %self.id, error = %err, "structured title rejected, keeping previous wire title");
    }

    // =========================================================================
    // Offer mutation protocol
    // =========================================================================

    pub fn offers(&self) -> &OfferList {
        &self.offers
    }

    /// Appends an offer. Under the `Ignore` policy a present offer is a
    /// silent no-op; the return value says whether the list changed.
    pub fn add_offer(&mut self, offer: &Offer) -> bool {
        if !self.admit_offer(offer) {
            return false;
        }
        self.broadcast_offers();
        true
    }

    /// Appends a batch. One broadcast for the whole batch; none when the
    /// batch is empty or entirely ignored. Returns how many were added.
    pub fn add_offers<'a>(&mut self, offers: impl IntoIterator<Item = &'a Offer>) -> usize {
        let mut added = 0;
        for offer in offers {
            if self.admit_offer(offer) {
                added += 1;
            }
        }
        if added > 0 {
            self.broadcast_offers();
        }
        added
    }

    /// Removes an offer, clearing its back-reference to this merchant.
    /// Broadcasts only when something was removed.
    pub fn remove_offer(&mut self, offer: &Offer) -> bool {
        if !self.offers.remove(offer) {
            return false;
        }
        offer.detach(self.id);
        self.broadcast_offers();
        true
    }

    /// Removes a batch; one broadcast iff at least one removal occurred.
    pub fn remove_offers<'a>(&mut self, offers: impl IntoIterator<Item = &'a Offer>) -> bool {
        let doomed: Vec<&Offer> = offers.into_iter().collect();
        if doomed.is_empty() {
            return false;
        }
        if !self.offers.remove_all(doomed.iter().copied()) {
            return false;
        }
        for offer in doomed {
            offer.detach(self.id);
        }
        self.broadcast_offers();
        true
    }

    pub fn offer_at(&self, index: usize) -> Result<&Offer> {
        Ok(self.offers.get(index)?)
    }

    /// Replaces the offer at `index`, returning the previous occupant
    /// with its back-reference cleared.
    pub fn set_offer_at(&mut self, index: usize, offer: &Offer) -> Result<Offer> {
        let previous = self.offers.set(index, offer.clone())?;
        offer.attach(self.id);
        previous.detach(self.id);
        self.broadcast_offers();
        Ok(previous)
    }

    /// Inserts before the offer currently at `index`. Does not broadcast:
    /// the slot shift becomes visible with the next offer mutation.
    pub fn insert_offer_at(&mut self, index: usize, offer: &Offer) -> Result<()> {
        self.offers.insert(index, offer.clone())?;
        offer.attach(self.id);
        Ok(())
    }

    /// Reorders the offer list. A list of one or zero entries is left
    /// untouched and nothing is broadcast.
    pub fn sort_offers<F>(&mut self, comparator: F)
    where
        F: FnMut(&Offer, &Offer) -> std::cmp::Ordering,
    {
        if self.offers.sort_by(comparator) {
            self.broadcast_offers();
        }
    }

    fn admit_offer(&mut self, offer: &Offer) -> bool {
        if self.config.duplicate_offers == DuplicateOfferPolicy::Ignore
            && self.offers.contains(offer)
        {
            return false;
        }
        self.offers.push(offer.clone());
        offer.attach(self.id);
        true
    }

    fn broadcast_offers(&self) -> BroadcastReport {
        broadcast::broadcast_offers(
            &self.table,
            &self.sessions,
            &self.offers,
            self.config.snapshot_uses,
        )
    }

    // =========================================================================
    // Session lifecycle protocol
    // =========================================================================

    /// Clonable handle to the live session set.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Admits a customer: asks the presenter for a surface (which may
    /// veto), registers the session, then sends the open frame and a
    /// single-recipient offer snapshot encoded for that session's era.
    pub fn add_customer(
        &mut self,
        customer: CustomerId,
        transport: Arc<dyn SessionTransport>,
    ) -> AdmitOutcome {
        if self.sessions.contains(customer) {
            return AdmitOutcome::AlreadyPresent;
        }

        let surface = match self.presenter.open_surface(customer, self.id) {
            Ok(surface) => surface,
            Err(veto) => {
                debug!(merchant = %self.id, customer = %customer, %veto, "admission vetoed");
                return AdmitOutcome::Refused(veto);
            }
        };

        let session = CustomerSession::new(customer, surface.envelope_id, transport);
        if !self.sessions.insert(session.clone()) {
            // Lost a race with an external registry handle; undo the surface.
            self.presenter.close_surface(customer);
            return AdmitOutcome::AlreadyPresent;
        }

        let open = wire::open_frame(session.envelope_id, &self.wire_title);
        if let Err(err) = session.transport.send(open) {
            warn!(customer = %customer, error = %err, "open frame delivery failed");
        }
        broadcast::send_offer_list(&self.table, &session, &self.offers);

        debug!(
            merchant = %self.id,
            customer = %customer,
            envelope_id = session.envelope_id,
            protocol_version = session.protocol_version,
            "customer admitted"
        );
        AdmitOutcome::Admitted
    }

    /// Deregisters a customer's session and closes its surface. Returns
    /// `false` when the customer had no session.
    pub fn remove_customer(&mut self, customer: CustomerId) -> bool {
        if !self.sessions.remove(customer) {
            return false;
        }
        self.presenter.close_surface(customer);
        debug!(merchant = %self.id, customer = %customer, "customer removed");
        true
    }

    pub fn has_customer(&self, customer: CustomerId) -> bool {
        self.sessions.contains(customer)
    }

    pub fn customers(&self) -> Vec<CustomerId> {
        self.sessions.customers()
    }

    // =========================================================================
    // Trade-completion hook and listeners
    // =========================================================================

    /// Called by the surrounding trade flow when a customer completes a
    /// trade: counts one use and records the offer as last traded. Never
    /// broadcasts; resynchronization is the caller's decision.
    pub fn complete_trade(&mut self, offer: &Offer) {
        offer.use_up();
        self.last_trade = Some(offer.clone());
    }

    /// The offer most recently passed to [`complete_trade`].
    ///
    /// [`complete_trade`]: Merchant::complete_trade
    pub fn last_trade(&self) -> Option<&Offer> {
        self.last_trade.as_ref()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn TradeListener>) -> ListenerId {
        self.next_listener_id += 1;
        let id = ListenerId(self.next_listener_id);
        self.listeners.insert(id, listener);
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn listeners(&self) -> Vec<Arc<dyn TradeListener>> {
        self.listeners.values().cloned().collect()
    }

    /// Fans a completed trade out to every registered listener, in
    /// registration order.
    pub fn notify_trade(&self, customer: CustomerId, offer: &Offer) {
        for listener in self.listeners.values() {
            listener.on_trade(customer, offer);
        }
    }
}

impl Drop for Merchant {
    fn drop(&mut self) {
        // Shared offers must not keep pointing at a destroyed merchant.
        for offer in self.offers.iter() {
            offer.detach(self.id);
        }
    }
}
