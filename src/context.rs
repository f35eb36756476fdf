//! Read interface over the three observation layers the admission engine may
//! consult: the committed chain, the prefix of the block under validation,
//! and the mempool. Validators never touch a concrete database; they see a
//! [`ContextView`] restricted by a [`ContextMask`].

use serde::{Deserialize, Serialize};

use crate::types::{Address, Comment, OutPoint, Post, SocialItem, SocialKind, TxId};

/// Chain-side collaborator: transaction lookup, clock and balances come from
/// the underlying UTXO ledger, never from the social layer.
pub trait Ledger: Send + Sync {
    fn height(&self) -> u64;
    fn adjusted_time(&self) -> u64;
    fn balance(&self, address: &str) -> i64;
    /// Time of the first transaction funding this address, if any.
    fn first_seen(&self, address: &str) -> Option<u64>;
    fn utxo_unspent(&self, outpoint: &OutPoint) -> bool;
}

/// Latest-wins subscription relation between two addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionState {
    pub subscribed: bool,
    pub private: bool,
}

/// Admission queries every observation layer answers. Counts are summed
/// across layers, existence checks are OR-ed, head and relation lookups are
/// resolved newest-layer-first.
pub trait SocialQuery: Send + Sync {
    /// Accepted items of `kind` authored by `author` with `time ∈ (from, to]`.
    fn count_by_author_window(&self, kind: SocialKind, author: &str, from: u64, to: u64) -> u64;

    /// Time of the earliest profile record registering `address`.
    fn registered_at(&self, address: &str) -> Option<u64>;

    /// Time of the most recent profile record for `address`.
    fn latest_profile_time(&self, address: &str) -> Option<u64>;

    /// True when another address already carries `name`.
    fn nickname_taken(&self, name: &str, excluding: &str) -> bool;

    /// Head (latest version) of the post chain rooted at `original_txid`.
    fn post_head(&self, original_txid: &str) -> Option<Post>;

    /// Head of the comment chain rooted at `original_txid`.
    fn comment_head(&self, original_txid: &str) -> Option<Comment>;

    /// Creation time of the first version of the post chain.
    fn post_created_at(&self, original_txid: &str) -> Option<u64>;

    /// Creation time of the first version of the comment chain.
    fn comment_created_at(&self, original_txid: &str) -> Option<u64>;

    /// A not-yet-committed edit of the post chain is pending in this layer.
    fn post_edit_pending(&self, original_txid: &str) -> bool;

    /// A not-yet-committed edit or delete of the comment chain is pending.
    fn comment_edit_pending(&self, original_txid: &str) -> bool;

    fn score_exists(&self, author: &str, post_txid: &str) -> bool;

    fn comment_score_exists(&self, author: &str, comment_txid: &str) -> bool;

    fn complaint_exists(&self, author: &str, post_txid: &str) -> bool;

    fn subscription_state(&self, author: &str, target: &str) -> Option<SubscriptionState>;

    /// Latest blocking record: `Some(true)` blocked, `Some(false)` unblocked.
    fn blocking_state(&self, author: &str, target: &str) -> Option<bool>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreTarget {
    Post,
    Comment,
}

/// One accepted score received by an address, as stored on chain. Input to
/// the reputation derivation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReceivedScore {
    pub scorer: Address,
    pub author: Address,
    pub target_txid: TxId,
    pub target: ScoreTarget,
    pub value: i32,
    pub time: u64,
    pub height: u64,
    /// Creation time of the scored item.
    pub item_time: u64,
    pub lottery: bool,
}

/// Committed-chain social database: the admission query surface plus the
/// primary records the reputation ledger derives from.
pub trait SocialDb: SocialQuery {
    /// Scores received by `address` in blocks strictly below `height`,
    /// ordered by `(height, time)`.
    fn scores_received(&self, address: &str, below_height: u64) -> Vec<ReceivedScore>;

    /// Active outgoing blockings of `author` (latest-wins), for reporting.
    fn blocking_count(&self, author: &str) -> u32;
}

/// Pending-transaction view the mempool subsystem exposes to the engine.
pub trait MempoolView: SocialQuery {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn contains(&self, txid: &str) -> bool;
}

/// Which layers a rule evaluation may observe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextMask {
    pub chain: bool,
    pub block: bool,
    pub mempool: bool,
}

impl ContextMask {
    /// Mempool admission: committed chain plus pending transactions.
    pub const MEMPOOL_ADMISSION: ContextMask = ContextMask {
        chain: true,
        block: false,
        mempool: true,
    };

    /// Block validation: committed chain plus the already-accepted prefix of
    /// the block under validation.
    pub const BLOCK_VALIDATION: ContextMask = ContextMask {
        chain: true,
        block: true,
        mempool: false,
    };
}

/// Scan helpers shared by every layer that answers admission queries from a
/// plain slice of items (block scratch, mempool).
pub(crate) mod scan {
    use super::SubscriptionState;
    use crate::types::{Comment, Post, SocialItem, SocialKind};

    pub fn count_by_author_window(
        items: &[SocialItem],
        kind: SocialKind,
        author: &str,
        from: u64,
        to: u64,
    ) -> u64 {
        items
            .iter()
            .filter(|item| {
                item.kind() == kind
                    && item.author() == author
                    && item.time() > from
                    && item.time() <= to
            })
            .count() as u64
    }

    pub fn registered_at(items: &[SocialItem], address: &str) -> Option<u64> {
        items
            .iter()
            .filter_map(|item| match item {
                SocialItem::ProfileChange(profile) if profile.address == address => {
                    Some(profile.time)
                }
                _ => None,
            })
            .min()
    }

    pub fn latest_profile_time(items: &[SocialItem], address: &str) -> Option<u64> {
        items
            .iter()
            .filter_map(|item| match item {
                SocialItem::ProfileChange(profile) if profile.address == address => {
                    Some(profile.time)
                }
                _ => None,
            })
            .max()
    }

    pub fn nickname_taken(items: &[SocialItem], name: &str, excluding: &str) -> bool {
        items.iter().any(|item| match item {
            SocialItem::ProfileChange(profile) => {
                profile.name == name && profile.address != excluding
            }
            _ => false,
        })
    }

    pub fn post_head(items: &[SocialItem], original_txid: &str) -> Option<Post> {
        items.iter().rev().find_map(|item| match item {
            SocialItem::Post(post) | SocialItem::PostEdit(post)
                if post.original_txid == original_txid =>
            {
                Some(post.clone())
            }
            _ => None,
        })
    }

    pub fn comment_head(items: &[SocialItem], original_txid: &str) -> Option<Comment> {
        items.iter().rev().find_map(|item| match item {
            SocialItem::Comment(comment)
            | SocialItem::CommentEdit(comment)
            | SocialItem::CommentDelete(comment)
                if comment.original_txid == original_txid =>
            {
                let mut head = comment.clone();
                if matches!(item, SocialItem::CommentDelete(_)) {
                    head.deleted = true;
                    head.message = String::new();
                }
                Some(head)
            }
            _ => None,
        })
    }

    pub fn post_created_at(items: &[SocialItem], original_txid: &str) -> Option<u64> {
        items.iter().find_map(|item| match item {
            SocialItem::Post(post) if post.txid == original_txid => Some(post.time),
            _ => None,
        })
    }

    pub fn comment_created_at(items: &[SocialItem], original_txid: &str) -> Option<u64> {
        items.iter().find_map(|item| match item {
            SocialItem::Comment(comment) if comment.txid == original_txid => Some(comment.time),
            _ => None,
        })
    }

    pub fn post_edit_pending(items: &[SocialItem], original_txid: &str) -> bool {
        items.iter().any(|item| match item {
            SocialItem::PostEdit(post) => post.original_txid == original_txid,
            _ => false,
        })
    }

    pub fn comment_edit_pending(items: &[SocialItem], original_txid: &str) -> bool {
        items.iter().any(|item| match item {
            SocialItem::CommentEdit(comment) | SocialItem::CommentDelete(comment) => {
                comment.original_txid == original_txid
            }
            _ => false,
        })
    }

    pub fn score_exists(items: &[SocialItem], author: &str, post_txid: &str) -> bool {
        items.iter().any(|item| match item {
            SocialItem::Score(score) => score.author == author && score.post_txid == post_txid,
            _ => false,
        })
    }

    pub fn comment_score_exists(items: &[SocialItem], author: &str, comment_txid: &str) -> bool {
        items.iter().any(|item| match item {
            SocialItem::CommentScore(score) => {
                score.author == author && score.comment_txid == comment_txid
            }
            _ => false,
        })
    }

    pub fn complaint_exists(items: &[SocialItem], author: &str, post_txid: &str) -> bool {
        items.iter().any(|item| match item {
            SocialItem::Complaint(complaint) => {
                complaint.author == author && complaint.post_txid == post_txid
            }
            _ => false,
        })
    }

    pub fn subscription_state(
        items: &[SocialItem],
        author: &str,
        target: &str,
    ) -> Option<SubscriptionState> {
        items.iter().rev().find_map(|item| match item {
            SocialItem::Subscribe(sub) if sub.author == author && sub.target == target => {
                Some(SubscriptionState {
                    subscribed: !sub.unsubscribe,
                    private: sub.private,
                })
            }
            _ => None,
        })
    }

    pub fn blocking_state(items: &[SocialItem], author: &str, target: &str) -> Option<bool> {
        items.iter().rev().find_map(|item| match item {
            SocialItem::Blocking(blocking)
                if blocking.author == author && blocking.target == target =>
            {
                Some(!blocking.unblock)
            }
            _ => None,
        })
    }
}

/// Scratch buffer of social items already accepted into the block under
/// validation. The only mutable state the engine owns; dropped whole when
/// the block is rejected. Blocks are small, linear scans are fine.
#[derive(Default)]
pub struct BlockScratch {
    items: Vec<SocialItem>,
}

impl BlockScratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: SocialItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[SocialItem] {
        &self.items
    }

    pub fn profile_count(&self, address: &str) -> usize {
        self.items
            .iter()
            .filter(|item| item.kind() == SocialKind::ProfileChange && item.author() == address)
            .count()
    }
}

impl SocialQuery for BlockScratch {
    fn count_by_author_window(&self, kind: SocialKind, author: &str, from: u64, to: u64) -> u64 {
        scan::count_by_author_window(&self.items, kind, author, from, to)
    }

    fn registered_at(&self, address: &str) -> Option<u64> {
        scan::registered_at(&self.items, address)
    }

    fn latest_profile_time(&self, address: &str) -> Option<u64> {
        scan::latest_profile_time(&self.items, address)
    }

    fn nickname_taken(&self, name: &str, excluding: &str) -> bool {
        scan::nickname_taken(&self.items, name, excluding)
    }

    fn post_head(&self, original_txid: &str) -> Option<Post> {
        scan::post_head(&self.items, original_txid)
    }

    fn comment_head(&self, original_txid: &str) -> Option<Comment> {
        scan::comment_head(&self.items, original_txid)
    }

    fn post_created_at(&self, original_txid: &str) -> Option<u64> {
        scan::post_created_at(&self.items, original_txid)
    }

    fn comment_created_at(&self, original_txid: &str) -> Option<u64> {
        scan::comment_created_at(&self.items, original_txid)
    }

    fn post_edit_pending(&self, original_txid: &str) -> bool {
        scan::post_edit_pending(&self.items, original_txid)
    }

    fn comment_edit_pending(&self, original_txid: &str) -> bool {
        scan::comment_edit_pending(&self.items, original_txid)
    }

    fn score_exists(&self, author: &str, post_txid: &str) -> bool {
        scan::score_exists(&self.items, author, post_txid)
    }

    fn comment_score_exists(&self, author: &str, comment_txid: &str) -> bool {
        scan::comment_score_exists(&self.items, author, comment_txid)
    }

    fn complaint_exists(&self, author: &str, post_txid: &str) -> bool {
        scan::complaint_exists(&self.items, author, post_txid)
    }

    fn subscription_state(&self, author: &str, target: &str) -> Option<SubscriptionState> {
        scan::subscription_state(&self.items, author, target)
    }

    fn blocking_state(&self, author: &str, target: &str) -> Option<bool> {
        scan::blocking_state(&self.items, author, target)
    }
}

/// Union of the observation layers selected by a mask. Newest layer wins for
/// head and relation lookups: block scratch, then mempool, then chain.
pub struct ContextView<'a> {
    chain: &'a dyn SocialDb,
    mempool: Option<&'a dyn SocialQuery>,
    scratch: Option<&'a BlockScratch>,
    mask: ContextMask,
}

impl<'a> ContextView<'a> {
    pub fn for_mempool(chain: &'a dyn SocialDb, mempool: &'a dyn SocialQuery) -> Self {
        Self {
            chain,
            mempool: Some(mempool),
            scratch: None,
            mask: ContextMask::MEMPOOL_ADMISSION,
        }
    }

    pub fn for_block(chain: &'a dyn SocialDb, scratch: &'a BlockScratch) -> Self {
        Self {
            chain,
            mempool: None,
            scratch: Some(scratch),
            mask: ContextMask::BLOCK_VALIDATION,
        }
    }

    pub fn chain_only(chain: &'a dyn SocialDb) -> Self {
        Self {
            chain,
            mempool: None,
            scratch: None,
            mask: ContextMask {
                chain: true,
                block: false,
                mempool: false,
            },
        }
    }

    pub fn mask(&self) -> ContextMask {
        self.mask
    }

    pub fn chain_db(&self) -> &dyn SocialDb {
        self.chain
    }

    /// Layers in precedence order: newest first.
    fn layers(&self) -> impl Iterator<Item = &dyn SocialQuery> {
        let scratch = self
            .scratch
            .filter(|_| self.mask.block)
            .map(|scratch| scratch as &dyn SocialQuery);
        let mempool = self.mempool.filter(|_| self.mask.mempool);
        let chain = self.mask.chain.then_some(self.chain.as_social_query());
        scratch.into_iter().chain(mempool).chain(chain)
    }
}

impl SocialQuery for ContextView<'_> {
    fn count_by_author_window(&self, kind: SocialKind, author: &str, from: u64, to: u64) -> u64 {
        self.layers()
            .map(|layer| layer.count_by_author_window(kind, author, from, to))
            .sum()
    }

    fn registered_at(&self, address: &str) -> Option<u64> {
        self.layers()
            .filter_map(|layer| layer.registered_at(address))
            .min()
    }

    fn latest_profile_time(&self, address: &str) -> Option<u64> {
        self.layers()
            .filter_map(|layer| layer.latest_profile_time(address))
            .max()
    }

    fn nickname_taken(&self, name: &str, excluding: &str) -> bool {
        self.layers()
            .any(|layer| layer.nickname_taken(name, excluding))
    }

    fn post_head(&self, original_txid: &str) -> Option<Post> {
        self.layers().find_map(|layer| layer.post_head(original_txid))
    }

    fn comment_head(&self, original_txid: &str) -> Option<Comment> {
        self.layers()
            .find_map(|layer| layer.comment_head(original_txid))
    }

    fn post_created_at(&self, original_txid: &str) -> Option<u64> {
        self.layers()
            .find_map(|layer| layer.post_created_at(original_txid))
    }

    fn comment_created_at(&self, original_txid: &str) -> Option<u64> {
        self.layers()
            .find_map(|layer| layer.comment_created_at(original_txid))
    }

    fn post_edit_pending(&self, original_txid: &str) -> bool {
        self.layers()
            .any(|layer| layer.post_edit_pending(original_txid))
    }

    fn comment_edit_pending(&self, original_txid: &str) -> bool {
        self.layers()
            .any(|layer| layer.comment_edit_pending(original_txid))
    }

    fn score_exists(&self, author: &str, post_txid: &str) -> bool {
        self.layers()
            .any(|layer| layer.score_exists(author, post_txid))
    }

    fn comment_score_exists(&self, author: &str, comment_txid: &str) -> bool {
        self.layers()
            .any(|layer| layer.comment_score_exists(author, comment_txid))
    }

    fn complaint_exists(&self, author: &str, post_txid: &str) -> bool {
        self.layers()
            .any(|layer| layer.complaint_exists(author, post_txid))
    }

    fn subscription_state(&self, author: &str, target: &str) -> Option<SubscriptionState> {
        self.layers()
            .find_map(|layer| layer.subscription_state(author, target))
    }

    fn blocking_state(&self, author: &str, target: &str) -> Option<bool> {
        self.layers()
            .find_map(|layer| layer.blocking_state(author, target))
    }
}

/// Helper for upcasting `&dyn SocialDb` to its query super-trait.
trait AsSocialQuery {
    fn as_social_query(&self) -> &dyn SocialQuery;
}

impl AsSocialQuery for dyn SocialDb + '_ {
    fn as_social_query(&self) -> &dyn SocialQuery {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Post, Subscription};

    fn post(txid: &str, author: &str, time: u64) -> SocialItem {
        SocialItem::Post(Post {
            txid: txid.into(),
            original_txid: txid.into(),
            author: author.into(),
            time,
            ..Post::default()
        })
    }

    #[test]
    fn scratch_counts_respect_window() {
        let mut scratch = BlockScratch::new();
        scratch.push(post("a1", "alice", 100));
        scratch.push(post("a2", "alice", 200));
        scratch.push(post("b1", "bob", 150));

        assert_eq!(
            scratch.count_by_author_window(SocialKind::Post, "alice", 0, 200),
            2
        );
        assert_eq!(
            scratch.count_by_author_window(SocialKind::Post, "alice", 100, 200),
            1
        );
        assert_eq!(
            scratch.count_by_author_window(SocialKind::Comment, "alice", 0, 200),
            0
        );
    }

    #[test]
    fn scratch_relation_state_is_latest_wins() {
        let mut scratch = BlockScratch::new();
        scratch.push(SocialItem::Subscribe(Subscription {
            txid: "s1".into(),
            author: "alice".into(),
            target: "bob".into(),
            private: false,
            unsubscribe: false,
            time: 10,
            block_height: None,
        }));
        scratch.push(SocialItem::Subscribe(Subscription {
            txid: "s2".into(),
            author: "alice".into(),
            target: "bob".into(),
            private: false,
            unsubscribe: true,
            time: 20,
            block_height: None,
        }));

        let state = scratch.subscription_state("alice", "bob").unwrap();
        assert!(!state.subscribed);
    }

    #[test]
    fn scratch_comment_delete_shows_deleted_head() {
        use crate::types::Comment;
        let mut scratch = BlockScratch::new();
        scratch.push(SocialItem::Comment(Comment {
            txid: "c1".into(),
            original_txid: "c1".into(),
            author: "alice".into(),
            post_txid: "p1".into(),
            time: 10,
            message: "hi".into(),
            ..Comment::default()
        }));
        scratch.push(SocialItem::CommentDelete(Comment {
            txid: "c2".into(),
            original_txid: "c1".into(),
            author: "alice".into(),
            post_txid: "p1".into(),
            time: 20,
            ..Comment::default()
        }));

        let head = scratch.comment_head("c1").unwrap();
        assert!(head.deleted);
        assert!(head.message.is_empty());
    }
}
