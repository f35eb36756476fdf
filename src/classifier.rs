//! Actor classification: maps an address to its admission class.

use crate::context::{Ledger, SocialQuery};
use crate::limits::{threshold, ActorClass, Threshold};
use crate::reputation::ReputationLedger;

/// Snapshot of everything the validators need to know about an author.
#[derive(Clone, Debug)]
pub struct ActorProfile {
    pub class: ActorClass,
    /// Half-point units.
    pub reputation: i64,
    pub balance: i64,
    pub registered_at: u64,
}

/// Classifies `address` at `height`. Registration is resolved against the
/// given observation context, so a profile earlier in the same block or
/// pending in the mempool already registers the address; reputation always
/// derives from committed records only. Returns `None` for an unregistered
/// address.
pub fn classify(
    address: &str,
    height: u64,
    now: u64,
    view: &dyn SocialQuery,
    ledger: &dyn Ledger,
    reputation: &ReputationLedger,
) -> Option<ActorProfile> {
    let registered_at = view.registered_at(address)?;
    let balance = ledger.balance(address);
    let units = reputation.reputation_of(address, height);
    let age = now.saturating_sub(registered_at);

    let full = age >= threshold(Threshold::FullAccountAge, height) as u64
        && balance >= threshold(Threshold::FullAccountBalance, height)
        && units >= threshold(Threshold::FullAccountReputation, height);

    Some(ActorProfile {
        class: if full { ActorClass::Full } else { ActorClass::Trial },
        reputation: units,
        balance,
        registered_at,
    })
}
