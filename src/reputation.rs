//! Deterministic reputation derivation.
//!
//! Reputation is never stored as a source of truth: it is recomputed from
//! the accepted scores an address has received. The derivation is
//! height-stratified: the reputation of an address at height `h` depends
//! only on records in blocks strictly below `h`, and the eligibility of each
//! scorer is evaluated at the height the score was accepted. That breaks the
//! scorer-reputation recursion into strictly smaller subproblems, so every
//! node converges on the same values.
//!
//! Units are half-points: a comment upvote is +1 unit (+0.5 displayed), a
//! post score `v ∈ 1..=5` contributes `2v - 7` units, which keeps 1..3
//! negative and 4..5 positive.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::context::{Ledger, ReceivedScore, SocialDb};
use crate::limits::{threshold, Threshold};

/// Rescales a post score value into reputation units.
pub fn post_score_units(value: i32) -> i64 {
    (2 * value - 7) as i64
}

/// Rescales a comment score value into reputation units.
pub fn comment_score_units(value: i32) -> i64 {
    value as i64
}

/// Displayed reputation for a unit count.
pub fn display_reputation(units: i64) -> f64 {
    units as f64 / 2.0
}

pub struct ReputationLedger {
    social: Arc<dyn SocialDb>,
    ledger: Arc<dyn Ledger>,
    cache: RwLock<HashMap<(String, u64), i64>>,
}

impl ReputationLedger {
    pub fn new(social: Arc<dyn SocialDb>, ledger: Arc<dyn Ledger>) -> Self {
        Self {
            social,
            ledger,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Reputation of `address` at `height`, in half-point units.
    pub fn reputation_of(&self, address: &str, height: u64) -> i64 {
        let key = (address.to_string(), height);
        if let Some(cached) = self.cache.read().get(&key) {
            return *cached;
        }
        let mut total = 0i64;
        for score in self.social.scores_received(address, height) {
            if !self.score_counts(&score) {
                continue;
            }
            total += score_units(&score);
        }
        self.cache.write().insert(key, total);
        total
    }

    /// Whether scores cast by `scorer` may modify reputation right now.
    pub fn allow_modify_reputation(&self, scorer: &str, height: u64) -> bool {
        self.eligible_at(scorer, height, self.ledger.adjusted_time())
    }

    /// Over-post relaxation: a scorer below the main threshold still counts
    /// when it owns at least one item with positive received reputation and
    /// the scored post is young enough. Lottery payouts skip the age bound.
    pub fn allow_modify_reputation_over_post(
        &self,
        scorer: &str,
        post_author: &str,
        height: u64,
        post_time: u64,
        score_time: u64,
        lottery: bool,
    ) -> bool {
        if scorer == post_author {
            return false;
        }
        if !self.registered_mature(scorer, height, score_time) {
            return false;
        }
        let depth = threshold(Threshold::ReputationDepth, height) as u64;
        let within = lottery || score_time.saturating_sub(post_time) <= depth;
        within && self.has_positive_item(scorer, height)
    }

    /// Same relaxation for comment scores.
    pub fn allow_modify_reputation_over_comment(
        &self,
        scorer: &str,
        comment_author: &str,
        height: u64,
        comment_time: u64,
        score_time: u64,
        lottery: bool,
    ) -> bool {
        self.allow_modify_reputation_over_post(
            scorer,
            comment_author,
            height,
            comment_time,
            score_time,
            lottery,
        )
    }

    /// Admission gate: may this address score at all. Reputation or balance
    /// qualifies; the age requirement only gates reputation modification.
    pub fn allow_scoring(&self, address: &str, height: u64) -> bool {
        self.reputation_of(address, height) >= threshold(Threshold::ScoringReputation, height)
            || self.ledger.balance(address) >= threshold(Threshold::FullAccountBalance, height)
    }

    fn eligible_at(&self, scorer: &str, height: u64, at_time: u64) -> bool {
        self.registered_mature(scorer, height, at_time) && self.allow_scoring(scorer, height)
    }

    fn registered_mature(&self, scorer: &str, height: u64, at_time: u64) -> bool {
        let Some(registered_at) = self.social.registered_at(scorer) else {
            return false;
        };
        at_time.saturating_sub(registered_at) >= threshold(Threshold::ScoringAccountAge, height) as u64
    }

    /// Whether one accepted score contributes to its target's reputation.
    fn score_counts(&self, score: &ReceivedScore) -> bool {
        if score.scorer == score.author || score.lottery {
            return false;
        }
        if self.eligible_at(&score.scorer, score.height, score.time) {
            return true;
        }
        match score.target {
            crate::context::ScoreTarget::Post => self.allow_modify_reputation_over_post(
                &score.scorer,
                &score.author,
                score.height,
                score.item_time,
                score.time,
                false,
            ),
            crate::context::ScoreTarget::Comment => self.allow_modify_reputation_over_comment(
                &score.scorer,
                &score.author,
                score.height,
                score.item_time,
                score.time,
                false,
            ),
        }
    }

    /// At least one item authored by `address` accumulated positive
    /// reputation below `height`.
    fn has_positive_item(&self, address: &str, height: u64) -> bool {
        let mut per_item: HashMap<String, i64> = HashMap::new();
        for score in self.social.scores_received(address, height) {
            if !self.score_counts(&score) {
                continue;
            }
            *per_item.entry(score.target_txid.clone()).or_insert(0) += score_units(&score);
        }
        let floor = threshold(Threshold::OverItemReputation, height);
        per_item.values().any(|units| *units >= floor)
    }
}

fn score_units(score: &ReceivedScore) -> i64 {
    match score.target {
        crate::context::ScoreTarget::Post => post_score_units(score.value),
        crate::context::ScoreTarget::Comment => comment_score_units(score.value),
    }
}
