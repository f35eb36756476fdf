//! Admission orchestrator.
//!
//! [`Engine`] is the only public entry into the antibot policy. It owns no
//! state besides a reputation cache; the chain, the social database and the
//! mempool are injected as trait objects, so tests run against in-memory
//! stubs and the node wires in its production collaborators.

use std::sync::Arc;

use tracing::warn;

use crate::context::{BlockScratch, ContextView, Ledger, MempoolView, SocialDb, SocialQuery};
use crate::errors::ChainResult;
use crate::limits::{limit, ActorClass, DAY_WINDOW};
use crate::reputation::{display_reputation, ReputationLedger};
use crate::types::{RawTransaction, SocialItem, SocialKind, UserState};
use crate::validators::{check, AdmissionContext};
use crate::verdict::Verdict;

pub struct Engine {
    ledger: Arc<dyn Ledger>,
    social: Arc<dyn SocialDb>,
    mempool: Arc<dyn MempoolView>,
    reputation: ReputationLedger,
}

impl Engine {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        social: Arc<dyn SocialDb>,
        mempool: Arc<dyn MempoolView>,
    ) -> Self {
        let reputation = ReputationLedger::new(social.clone(), ledger.clone());
        Self {
            ledger,
            social,
            mempool,
            reputation,
        }
    }

    pub fn reputation(&self) -> &ReputationLedger {
        &self.reputation
    }

    /// Mempool admission: the candidate is judged against the committed
    /// chain plus everything already pending.
    pub fn check_item(&self, item: &SocialItem) -> Verdict {
        let view = ContextView::for_mempool(&*self.social, self.mempool.as_ref().as_query());
        let ctx = AdmissionContext {
            view: &view,
            ledger: &*self.ledger,
            reputation: &self.reputation,
            height: self.ledger.height(),
            now: self.ledger.adjusted_time(),
        };
        check(item, &ctx)
    }

    /// Block validation: items are processed in a deterministic order and
    /// each one observes only the accepted prefix of the block. Returns one
    /// verdict per input item, index-aligned.
    pub fn check_block(&self, items: &[SocialItem]) -> Vec<Verdict> {
        let height = self.ledger.height();
        let now = self.ledger.adjusted_time();
        let mut verdicts = vec![Verdict::Unknown; items.len()];
        let mut scratch = BlockScratch::new();

        for index in block_order(items) {
            let item = &items[index];
            let verdict = {
                let view = ContextView::for_block(&*self.social, &scratch);
                let ctx = AdmissionContext {
                    view: &view,
                    ledger: &*self.ledger,
                    reputation: &self.reputation,
                    height,
                    now,
                };
                if item.kind() == SocialKind::ProfileChange
                    && scratch.profile_count(item.author()) > 0
                {
                    Verdict::ManyTransactions
                } else {
                    check(item, &ctx)
                }
            };
            if verdict.is_success() {
                scratch.push(item.clone());
            } else {
                warn!(kind = %item.kind(), txid = %item.txid(), %verdict, "rejected block item");
            }
            verdicts[index] = verdict;
        }
        verdicts
    }

    /// Funding inputs of a social transaction must exist and be unspent.
    pub fn check_inputs(&self, tx: &RawTransaction) -> bool {
        !tx.inputs.is_empty()
            && tx
                .inputs
                .iter()
                .all(|outpoint| self.ledger.utxo_unspent(outpoint))
    }

    /// Read-only quota/reputation aggregate for one address. Not consulted
    /// by admission decisions; it feeds UI and RPC clients.
    pub fn get_user_state(&self, address: &str, time: u64) -> ChainResult<UserState> {
        let height = self.ledger.height();
        let view = ContextView::for_mempool(&*self.social, self.mempool.as_ref().as_query());

        let registered_at = view.registered_at(address);
        let units = self.reputation.reputation_of(address, height);
        let balance = self.ledger.balance(address);
        let class = registered_at
            .and_then(|_| {
                crate::classifier::classify(
                    address,
                    height,
                    self.ledger.adjusted_time(),
                    &view,
                    &*self.ledger,
                    &self.reputation,
                )
            })
            .map(|profile| profile.class)
            .unwrap_or(ActorClass::Trial);

        let spent = |kind: SocialKind| -> u32 {
            view.count_by_author_window(kind, address, time.saturating_sub(DAY_WINDOW), time) as u32
        };
        let allowance = |kind: SocialKind, used: u32| -> u32 {
            limit(kind, class, height).saturating_sub(used)
        };

        let post_spent = spent(SocialKind::Post);
        let score_spent = spent(SocialKind::Score);
        let complain_spent = spent(SocialKind::Complaint);
        let comment_spent = spent(SocialKind::Comment);
        let comment_score_spent = spent(SocialKind::CommentScore);

        Ok(UserState {
            address: address.to_string(),
            user_reg_date: registered_at.map(|t| t as i64).unwrap_or(-1),
            addr_reg_date: self
                .ledger
                .first_seen(address)
                .map(|t| t as i64)
                .unwrap_or(-1),
            reputation: display_reputation(units),
            balance,
            trial: class.is_trial(),
            post_spent,
            post_unspent: allowance(SocialKind::Post, post_spent),
            score_spent,
            score_unspent: allowance(SocialKind::Score, score_spent),
            complain_spent,
            complain_unspent: allowance(SocialKind::Complaint, complain_spent),
            comment_spent,
            comment_unspent: allowance(SocialKind::Comment, comment_spent),
            comment_score_spent,
            comment_score_unspent: allowance(SocialKind::CommentScore, comment_score_spent),
            number_of_blocking: self.social.blocking_count(address),
        })
    }
}

/// Kind priority inside a block: registrations first, then originals before
/// the items that may refer to them.
fn kind_priority(kind: SocialKind) -> u8 {
    match kind {
        SocialKind::ProfileChange => 0,
        SocialKind::Post => 1,
        SocialKind::PostEdit => 2,
        SocialKind::Comment => 3,
        SocialKind::CommentEdit => 4,
        SocialKind::CommentDelete => 5,
        SocialKind::Score => 6,
        SocialKind::CommentScore => 7,
        SocialKind::Complaint => 8,
        SocialKind::Subscribe => 9,
        SocialKind::Blocking => 10,
    }
}

/// Deterministic processing order: author groups in first-appearance order,
/// then kind priority, then declared time, ties broken by block index. Two
/// honest nodes observing the same block always walk it identically.
pub(crate) fn block_order(items: &[SocialItem]) -> Vec<usize> {
    let mut first_seen: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for (index, item) in items.iter().enumerate() {
        first_seen.entry(item.author()).or_insert(index);
    }
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|&index| {
        let item = &items[index];
        (
            first_seen[item.author()],
            kind_priority(item.kind()),
            item.time(),
            index,
        )
    });
    order
}

/// Upcast helper so the engine can hand the mempool to a context view.
trait AsQuery {
    fn as_query(&self) -> &dyn SocialQuery;
}

impl AsQuery for dyn MempoolView + '_ {
    fn as_query(&self) -> &dyn SocialQuery {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Post, ProfileChange};

    fn item_post(txid: &str, author: &str, time: u64) -> SocialItem {
        SocialItem::Post(Post {
            txid: txid.into(),
            original_txid: txid.into(),
            author: author.into(),
            time,
            ..Post::default()
        })
    }

    fn item_profile(txid: &str, address: &str, time: u64) -> SocialItem {
        SocialItem::ProfileChange(ProfileChange {
            txid: txid.into(),
            address: address.into(),
            name: address.into(),
            time,
            ..ProfileChange::default()
        })
    }

    #[test]
    fn block_order_puts_registrations_before_posts() {
        let items = vec![
            item_post("p1", "alice", 100),
            item_profile("u1", "alice", 50),
        ];
        assert_eq!(block_order(&items), vec![1, 0]);
    }

    #[test]
    fn block_order_is_stable_for_equal_times() {
        let items = vec![
            item_post("p1", "alice", 100),
            item_post("p2", "alice", 100),
            item_post("p3", "alice", 99),
        ];
        assert_eq!(block_order(&items), vec![2, 0, 1]);
    }

    #[test]
    fn block_order_keeps_author_groups_in_first_appearance_order() {
        let items = vec![
            item_post("p1", "bob", 100),
            item_post("p2", "alice", 10),
            item_post("p3", "bob", 5),
        ];
        assert_eq!(block_order(&items), vec![2, 0, 1]);
    }
}
