use serde::{Deserialize, Serialize};

use super::{Address, TxId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: TxId,
    pub vout: u32,
}

/// Funding view of a social transaction: the engine only cares that the
/// inputs exist and are unspent, everything else is verified upstream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawTransaction {
    pub txid: TxId,
    pub inputs: Vec<OutPoint>,
}

/// Read-only quota/reputation aggregate for one address, served over RPC.
/// `*_spent` counts actions used inside the current window, `*_unspent` the
/// remaining allowance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserState {
    pub address: Address,
    pub user_reg_date: i64,
    pub addr_reg_date: i64,
    pub reputation: f64,
    pub balance: i64,
    pub trial: bool,
    pub post_spent: u32,
    pub post_unspent: u32,
    pub score_spent: u32,
    pub score_unspent: u32,
    pub complain_spent: u32,
    pub complain_unspent: u32,
    pub comment_spent: u32,
    pub comment_unspent: u32,
    pub comment_score_spent: u32,
    pub comment_score_unspent: u32,
    pub number_of_blocking: u32,
}
