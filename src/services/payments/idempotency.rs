//! Idempotent payment-intent creation.
//!
//! The ledger maps a client-supplied idempotency key (scoped by payment
//! method) to the creation outcome. The check and the reservation happen
//! under one map-entry lock with no suspension point in between, so two
//! near-simultaneous retries with the same key can never both pass the
//! "not yet recorded" check. Entries live for the process lifetime; a
//! multi-process deployment would back this same contract with a shared
//! store offering conditional-put semantics.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::errors::ServiceError;
use crate::models::payment::{PaymentCreationResult, PaymentMethod};

#[derive(Debug, Clone)]
enum Reservation {
    /// A creation attempt holds the key but has not produced an intent yet.
    InFlight,
    /// The key resolved to this intent; replays return it verbatim.
    Recorded(PaymentCreationResult),
}

#[derive(Default)]
pub struct IdempotencyLedger {
    entries: DashMap<(String, PaymentMethod), Reservation>,
}

impl IdempotencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// First caller for a (key, method) pair reserves it and gets `None`;
    /// a replay of a finished attempt gets the recorded payload; a replay
    /// racing an unfinished attempt is refused.
    pub fn check_or_reserve(
        &self,
        key: &str,
        method: PaymentMethod,
    ) -> Result<Option<PaymentCreationResult>, ServiceError> {
        match self.entries.entry((key.to_string(), method)) {
            Entry::Occupied(entry) => match entry.get() {
                Reservation::Recorded(result) => Ok(Some(result.clone())),
                Reservation::InFlight => Err(ServiceError::Conflict(
                    "a payment attempt with this idempotency key is already in progress"
                        .to_string(),
                )),
            },
            Entry::Vacant(slot) => {
                slot.insert(Reservation::InFlight);
                Ok(None)
            }
        }
    }

    pub fn record(&self, key: &str, method: PaymentMethod, result: PaymentCreationResult) {
        self.entries
            .insert((key.to_string(), method), Reservation::Recorded(result));
    }

    /// Drops an in-flight reservation after a failed creation so the client
    /// may retry the same key. Recorded outcomes are never released.
    pub fn release(&self, key: &str, method: PaymentMethod) {
        if let Entry::Occupied(entry) = self.entries.entry((key.to_string(), method)) {
            if matches!(entry.get(), Reservation::InFlight) {
                entry.remove();
            }
        }
    }
}
