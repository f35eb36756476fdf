//! Node-side view of the underlying UTXO ledger.
//!
//! The admission engine only consumes the [`Ledger`] trait; this is the
//! node's in-process implementation, fed by the block commit path. Balances
//! and unspent outputs are a summary of the chain the node follows, not an
//! independent source of truth.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

use crate::context::Ledger;
use crate::types::{Address, OutPoint};

#[derive(Default)]
struct ChainInner {
    height: u64,
    /// Explicit clock override for deterministic replay; `None` follows the
    /// system clock.
    time_override: Option<u64>,
    balances: HashMap<Address, i64>,
    first_seen: HashMap<Address, u64>,
    utxos: HashSet<OutPoint>,
}

#[derive(Default)]
pub struct ChainState {
    inner: RwLock<ChainInner>,
}

pub fn system_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_height(&self, height: u64) {
        self.inner.write().height = height;
    }

    pub fn advance_height(&self) -> u64 {
        let mut inner = self.inner.write();
        inner.height += 1;
        inner.height
    }

    pub fn set_time_override(&self, time: Option<u64>) {
        self.inner.write().time_override = time;
    }

    /// Credits an address and remembers when it was first funded.
    pub fn credit(&self, address: &str, amount: i64, time: u64) {
        let mut inner = self.inner.write();
        *inner.balances.entry(address.to_string()).or_insert(0) += amount;
        inner
            .first_seen
            .entry(address.to_string())
            .or_insert(time);
    }

    pub fn add_utxo(&self, outpoint: OutPoint) {
        self.inner.write().utxos.insert(outpoint);
    }

    pub fn spend_utxo(&self, outpoint: &OutPoint) -> bool {
        self.inner.write().utxos.remove(outpoint)
    }
}

impl Ledger for ChainState {
    fn height(&self) -> u64 {
        self.inner.read().height
    }

    fn adjusted_time(&self) -> u64 {
        self.inner
            .read()
            .time_override
            .unwrap_or_else(system_time)
    }

    fn balance(&self, address: &str) -> i64 {
        self.inner.read().balances.get(address).copied().unwrap_or(0)
    }

    fn first_seen(&self, address: &str) -> Option<u64> {
        self.inner.read().first_seen.get(address).copied()
    }

    fn utxo_unspent(&self, outpoint: &OutPoint) -> bool {
        self.inner.read().utxos.contains(outpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_balances_and_first_seen() {
        let chain = ChainState::new();
        chain.credit("alice", 500, 100);
        chain.credit("alice", 250, 200);

        assert_eq!(chain.balance("alice"), 750);
        assert_eq!(chain.first_seen("alice"), Some(100));
        assert_eq!(chain.balance("bob"), 0);
    }

    #[test]
    fn utxo_set_round_trip() {
        let chain = ChainState::new();
        let outpoint = OutPoint {
            txid: "t1".into(),
            vout: 0,
        };
        chain.add_utxo(outpoint.clone());
        assert!(chain.utxo_unspent(&outpoint));
        assert!(chain.spend_utxo(&outpoint));
        assert!(!chain.utxo_unspent(&outpoint));
    }
}
