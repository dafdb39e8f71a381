/*!
Bridge ledger

Concurrency-safe store of per-asset bridging records and their lifecycle
position. States only move forward; a terminal record stays for audit but no
longer blocks a fresh bridging attempt for the same asset.
*/

use crate::error::LedgerError;
use crate::spec::NftSpec;
use crate::types::{Address, AssetId, Chain};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lifecycle position of a bridged asset
///
/// Ordering follows the settlement sequence, so `PartialOrd` compares
/// progress directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BridgeState {
    /// Instruction seen, custody transfer awaited
    Expect,
    /// Custodial account opted in to the asset
    Prepared,
    /// Asset observed in custody
    Received,
    /// Representation minted on the destination chain
    Sent,
}

impl BridgeState {
    /// Terminal states accept no further processing
    pub fn is_terminal(&self) -> bool {
        matches!(self, BridgeState::Sent)
    }

    /// The next state in the settlement sequence
    fn successor(&self) -> Option<BridgeState> {
        match self {
            BridgeState::Expect => Some(BridgeState::Prepared),
            BridgeState::Prepared => Some(BridgeState::Received),
            BridgeState::Received => Some(BridgeState::Sent),
            BridgeState::Sent => None,
        }
    }

    /// Whether moving to `next` is legal: stay in place or take exactly one
    /// step forward, never backwards and never skipping a state
    pub fn can_advance_to(&self, next: BridgeState) -> bool {
        next == *self || self.successor() == Some(next)
    }
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeState::Expect => write!(f, "expect"),
            BridgeState::Prepared => write!(f, "prepared"),
            BridgeState::Received => write!(f, "received"),
            BridgeState::Sent => write!(f, "sent"),
        }
    }
}

/// Everything tracked about one asset moving across the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgingRecord {
    pub origin: Chain,
    pub state: BridgeState,
    pub destination: Address,
    pub asset_id: AssetId,
    pub sender: String,
    pub spec: NftSpec,
    pub asset_url: String,
    pub source_txn_id: String,
    pub created_at: DateTime<Utc>,
}

impl BridgingRecord {
    /// New record in the initial state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        origin: Chain,
        destination: Address,
        asset_id: AssetId,
        sender: String,
        spec: NftSpec,
        asset_url: String,
        source_txn_id: String,
    ) -> Self {
        Self {
            origin,
            state: BridgeState::Expect,
            destination,
            asset_id,
            sender,
            spec,
            asset_url,
            source_txn_id,
            created_at: Utc::now(),
        }
    }
}

/// Storage seam between the settlement engine and the record store
pub trait LedgerStore: Send + Sync + 'static {
    /// Snapshot of the record for `asset_id`, if tracked
    fn get(&self, asset_id: AssetId) -> Option<BridgingRecord>;

    /// Insert a fresh record; fails while a non-terminal record exists
    fn put_if_absent(&self, record: BridgingRecord) -> Result<(), LedgerError>;

    /// Apply `mutator` to the tracked record under the store's lock and
    /// return the committed snapshot
    ///
    /// The mutated state must stay in place or advance exactly one step;
    /// anything else rolls back and errors.
    fn update(
        &self,
        asset_id: AssetId,
        mutator: &mut dyn FnMut(&mut BridgingRecord),
    ) -> Result<BridgingRecord, LedgerError>;
}

#[derive(Default)]
struct Inner {
    records: HashMap<AssetId, BridgingRecord>,
    last_round: u64,
}

/// In-memory ledger shared between the monitor and the engine
#[derive(Default)]
pub struct BridgeLedger {
    inner: Mutex<Inner>,
}

impl BridgeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest source-chain round already inspected
    pub fn last_round(&self) -> u64 {
        self.inner.lock().last_round
    }

    /// Raise the round high-water mark; lower values are ignored
    pub fn advance_round(&self, round: u64) {
        let mut inner = self.inner.lock();
        if round > inner.last_round {
            inner.last_round = round;
        }
    }
}

impl LedgerStore for BridgeLedger {
    fn get(&self, asset_id: AssetId) -> Option<BridgingRecord> {
        self.inner.lock().records.get(&asset_id).cloned()
    }

    fn put_if_absent(&self, record: BridgingRecord) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.records.get(&record.asset_id) {
            if !existing.state.is_terminal() {
                return Err(LedgerError::DuplicateAsset {
                    asset_id: record.asset_id,
                    state: existing.state,
                });
            }
        }
        inner.records.insert(record.asset_id, record);
        Ok(())
    }

    fn update(
        &self,
        asset_id: AssetId,
        mutator: &mut dyn FnMut(&mut BridgingRecord),
    ) -> Result<BridgingRecord, LedgerError> {
        let mut inner = self.inner.lock();
        let Some(existing) = inner.records.get_mut(&asset_id) else {
            return Err(LedgerError::UnknownAsset { asset_id });
        };
        let mut updated = existing.clone();
        mutator(&mut updated);
        if !existing.state.can_advance_to(updated.state) {
            return Err(LedgerError::InvalidTransition {
                from: existing.state,
                to: updated.state,
            });
        }
        *existing = updated.clone();
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(asset_id: AssetId, state: BridgeState) -> BridgingRecord {
        let mut r = BridgingRecord::new(
            Chain::Algorand,
            Address([2u8; 32]),
            asset_id,
            "SENDER".to_string(),
            NftSpec::Arc3,
            "ipfs://meta#arc3".to_string(),
            "TXID".to_string(),
        );
        r.state = state;
        r
    }

    #[test]
    fn test_state_ordering() {
        assert!(BridgeState::Expect.can_advance_to(BridgeState::Prepared));
        assert!(BridgeState::Received.can_advance_to(BridgeState::Received));
        assert!(!BridgeState::Sent.can_advance_to(BridgeState::Expect));
        // one step at a time, no skipping
        assert!(!BridgeState::Expect.can_advance_to(BridgeState::Received));
        assert!(!BridgeState::Expect.can_advance_to(BridgeState::Sent));
        assert!(!BridgeState::Prepared.can_advance_to(BridgeState::Sent));
        assert!(BridgeState::Sent.is_terminal());
        assert!(!BridgeState::Received.is_terminal());
    }

    #[test]
    fn test_insert_and_get() {
        let ledger = BridgeLedger::new();
        ledger.put_if_absent(record(42, BridgeState::Expect)).unwrap();
        let stored = ledger.get(42).unwrap();
        assert_eq!(stored.state, BridgeState::Expect);
        assert!(ledger.get(7).is_none());
    }

    #[test]
    fn test_duplicate_rejected_while_in_flight() {
        let ledger = BridgeLedger::new();
        ledger.put_if_absent(record(42, BridgeState::Expect)).unwrap();
        let err = ledger.put_if_absent(record(42, BridgeState::Expect)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::DuplicateAsset {
                asset_id: 42,
                state: BridgeState::Expect,
            }
        );
        // existing record untouched
        assert_eq!(ledger.get(42).unwrap().state, BridgeState::Expect);
    }

    #[test]
    fn test_terminal_record_can_be_replaced() {
        let ledger = BridgeLedger::new();
        ledger.put_if_absent(record(42, BridgeState::Sent)).unwrap();
        ledger.put_if_absent(record(42, BridgeState::Expect)).unwrap();
        assert_eq!(ledger.get(42).unwrap().state, BridgeState::Expect);
    }

    #[test]
    fn test_update_moves_forward_only() {
        let ledger = BridgeLedger::new();
        ledger.put_if_absent(record(42, BridgeState::Expect)).unwrap();
        let updated = ledger
            .update(42, &mut |r| r.state = BridgeState::Prepared)
            .unwrap();
        assert_eq!(updated.state, BridgeState::Prepared);
        let err = ledger
            .update(42, &mut |r| r.state = BridgeState::Expect)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidTransition {
                from: BridgeState::Prepared,
                to: BridgeState::Expect,
            }
        );
        assert_eq!(ledger.get(42).unwrap().state, BridgeState::Prepared);
    }

    #[test]
    fn test_update_rejects_skipped_state() {
        let ledger = BridgeLedger::new();
        ledger.put_if_absent(record(42, BridgeState::Expect)).unwrap();
        let err = ledger
            .update(42, &mut |r| r.state = BridgeState::Sent)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidTransition {
                from: BridgeState::Expect,
                to: BridgeState::Sent,
            }
        );
        // rolled back, nothing committed
        assert_eq!(ledger.get(42).unwrap().state, BridgeState::Expect);
    }

    #[test]
    fn test_update_mutates_under_lock() {
        let ledger = BridgeLedger::new();
        ledger.put_if_absent(record(42, BridgeState::Expect)).unwrap();
        let updated = ledger
            .update(42, &mut |r| r.asset_url = "ipfs://rewritten".to_string())
            .unwrap();
        assert_eq!(updated.state, BridgeState::Expect);
        assert_eq!(ledger.get(42).unwrap().asset_url, "ipfs://rewritten");
    }

    #[test]
    fn test_update_unknown_asset() {
        let ledger = BridgeLedger::new();
        let err = ledger
            .update(42, &mut |r| r.state = BridgeState::Prepared)
            .unwrap_err();
        assert_eq!(err, LedgerError::UnknownAsset { asset_id: 42 });
    }

    #[test]
    fn test_round_high_water_mark() {
        let ledger = BridgeLedger::new();
        assert_eq!(ledger.last_round(), 0);
        ledger.advance_round(1200);
        ledger.advance_round(900);
        assert_eq!(ledger.last_round(), 1200);
    }
}
