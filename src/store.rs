//! In-memory indexed database of accepted social records.
//!
//! The store is derived state: it is rebuilt from the persisted primary
//! records at boot and after a reorganisation, and every index it maintains
//! (edit-chain heads, nickname ownership, latest-wins relations, received
//! scores) is a pure function of the commit sequence.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::context::{ReceivedScore, ScoreTarget, SocialDb, SocialQuery, SubscriptionState};
use crate::errors::{ChainError, ChainResult};
use crate::types::{Address, Comment, Post, ProfileChange, SocialItem, SocialKind, TxId};

#[derive(Default)]
struct StoreInner {
    /// Declared times per (kind, author), in commit order, for window counts.
    action_times: HashMap<(SocialKind, Address), Vec<u64>>,
    /// Profile records per address, in commit order; first entry registers.
    profiles: HashMap<Address, Vec<ProfileChange>>,
    /// Current nickname ownership and its inverse.
    nickname_owner: HashMap<String, Address>,
    nickname_of: HashMap<Address, String>,
    /// Edit-chain heads keyed by original txid.
    post_heads: HashMap<TxId, Post>,
    comment_heads: HashMap<TxId, Comment>,
    /// Creation time of the first version per chain.
    post_created: HashMap<TxId, u64>,
    comment_created: HashMap<TxId, u64>,
    /// One-shot action indexes.
    scores: HashMap<(Address, TxId), i32>,
    comment_scores: HashMap<(Address, TxId), i32>,
    complaints: HashMap<(Address, TxId), i32>,
    /// Latest-wins relations.
    subscriptions: HashMap<(Address, Address), SubscriptionState>,
    blockings: HashMap<(Address, Address), bool>,
    /// Scores received per address, in commit order.
    received: HashMap<Address, Vec<ReceivedScore>>,
}

pub struct SocialStore {
    inner: RwLock<StoreInner>,
}

impl Default for SocialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SocialStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
        }
    }

    /// Applies one admitted item at `height`. Callers must only commit items
    /// the engine accepted; the store still refuses structurally impossible
    /// transitions so a corrupted replay cannot silently diverge.
    pub fn commit(&self, item: &SocialItem, height: u64) -> ChainResult<()> {
        let mut inner = self.inner.write();
        inner
            .action_times
            .entry((item.kind(), item.author().to_string()))
            .or_default()
            .push(item.time());

        match item {
            SocialItem::Post(post) => {
                inner.post_created.insert(post.txid.clone(), post.time);
                let mut head = post.clone();
                head.block_height = Some(height);
                inner.post_heads.insert(post.txid.clone(), head);
            }
            SocialItem::PostEdit(post) => {
                let head = inner.post_heads.get_mut(&post.original_txid).ok_or_else(|| {
                    ChainError::Transaction(format!(
                        "post edit {} without original {}",
                        post.txid, post.original_txid
                    ))
                })?;
                let mut next = post.clone();
                next.block_height = Some(height);
                *head = next;
            }
            SocialItem::Comment(comment) => {
                inner
                    .comment_created
                    .insert(comment.txid.clone(), comment.time);
                let mut head = comment.clone();
                head.block_height = Some(height);
                head.last = true;
                inner.comment_heads.insert(comment.txid.clone(), head);
            }
            SocialItem::CommentEdit(comment) => {
                let head = inner
                    .comment_heads
                    .get_mut(&comment.original_txid)
                    .ok_or_else(|| {
                        ChainError::Transaction(format!(
                            "comment edit {} without original {}",
                            comment.txid, comment.original_txid
                        ))
                    })?;
                let mut next = comment.clone();
                next.block_height = Some(height);
                next.last = true;
                *head = next;
            }
            SocialItem::CommentDelete(comment) => {
                let head = inner
                    .comment_heads
                    .get_mut(&comment.original_txid)
                    .ok_or_else(|| {
                        ChainError::Transaction(format!(
                            "comment delete {} without original {}",
                            comment.txid, comment.original_txid
                        ))
                    })?;
                head.txid = comment.txid.clone();
                head.time = comment.time;
                head.block_height = Some(height);
                head.message = String::new();
                head.deleted = true;
                head.last = true;
            }
            SocialItem::Score(score) => {
                // The relaxation window measures from the first version.
                let created = inner.post_created.get(&score.post_txid).copied();
                let (target_author, item_time) = inner
                    .post_heads
                    .get(&score.post_txid)
                    .map(|post| (post.author.clone(), created.unwrap_or(post.time)))
                    .ok_or_else(|| {
                        ChainError::Transaction(format!(
                            "score {} targets unknown post {}",
                            score.txid, score.post_txid
                        ))
                    })?;
                inner
                    .scores
                    .insert((score.author.clone(), score.post_txid.clone()), score.value);
                inner
                    .received
                    .entry(target_author.clone())
                    .or_default()
                    .push(ReceivedScore {
                        scorer: score.author.clone(),
                        author: target_author,
                        target_txid: score.post_txid.clone(),
                        target: ScoreTarget::Post,
                        value: score.value,
                        time: score.time,
                        height,
                        item_time,
                        lottery: score.lottery,
                    });
            }
            SocialItem::CommentScore(score) => {
                let created = inner.comment_created.get(&score.comment_txid).copied();
                let (target_author, item_time) = inner
                    .comment_heads
                    .get(&score.comment_txid)
                    .map(|comment| (comment.author.clone(), created.unwrap_or(comment.time)))
                    .ok_or_else(|| {
                        ChainError::Transaction(format!(
                            "comment score {} targets unknown comment {}",
                            score.txid, score.comment_txid
                        ))
                    })?;
                inner.comment_scores.insert(
                    (score.author.clone(), score.comment_txid.clone()),
                    score.value,
                );
                inner
                    .received
                    .entry(target_author.clone())
                    .or_default()
                    .push(ReceivedScore {
                        scorer: score.author.clone(),
                        author: target_author,
                        target_txid: score.comment_txid.clone(),
                        target: ScoreTarget::Comment,
                        value: score.value,
                        time: score.time,
                        height,
                        item_time,
                        lottery: false,
                    });
            }
            SocialItem::Complaint(complaint) => {
                inner.complaints.insert(
                    (complaint.author.clone(), complaint.post_txid.clone()),
                    complaint.reason,
                );
            }
            SocialItem::Subscribe(sub) => {
                inner.subscriptions.insert(
                    (sub.author.clone(), sub.target.clone()),
                    SubscriptionState {
                        subscribed: !sub.unsubscribe,
                        private: sub.private,
                    },
                );
            }
            SocialItem::Blocking(blocking) => {
                inner.blockings.insert(
                    (blocking.author.clone(), blocking.target.clone()),
                    !blocking.unblock,
                );
            }
            SocialItem::ProfileChange(profile) => {
                if let Some(previous) = inner.nickname_of.remove(&profile.address) {
                    inner.nickname_owner.remove(&previous);
                }
                if !profile.name.is_empty() {
                    inner
                        .nickname_owner
                        .insert(profile.name.clone(), profile.address.clone());
                    inner
                        .nickname_of
                        .insert(profile.address.clone(), profile.name.clone());
                }
                let mut record = profile.clone();
                record.block_height = Some(height);
                inner
                    .profiles
                    .entry(profile.address.clone())
                    .or_default()
                    .push(record);
            }
        }
        Ok(())
    }

    /// Rebuilds the store from a primary record sequence (boot, reorg).
    pub fn replay<'a>(
        &self,
        items: impl IntoIterator<Item = (&'a SocialItem, u64)>,
    ) -> ChainResult<()> {
        *self.inner.write() = StoreInner::default();
        for (item, height) in items {
            self.commit(item, height)?;
        }
        Ok(())
    }
}

impl SocialQuery for SocialStore {
    fn count_by_author_window(&self, kind: SocialKind, author: &str, from: u64, to: u64) -> u64 {
        let inner = self.inner.read();
        inner
            .action_times
            .get(&(kind, author.to_string()))
            .map(|times| {
                times
                    .iter()
                    .filter(|time| **time > from && **time <= to)
                    .count() as u64
            })
            .unwrap_or(0)
    }

    fn registered_at(&self, address: &str) -> Option<u64> {
        let inner = self.inner.read();
        inner
            .profiles
            .get(address)
            .and_then(|records| records.first())
            .map(|record| record.time)
    }

    fn latest_profile_time(&self, address: &str) -> Option<u64> {
        let inner = self.inner.read();
        inner
            .profiles
            .get(address)
            .and_then(|records| records.last())
            .map(|record| record.time)
    }

    fn nickname_taken(&self, name: &str, excluding: &str) -> bool {
        let inner = self.inner.read();
        inner
            .nickname_owner
            .get(name)
            .map(|owner| owner != excluding)
            .unwrap_or(false)
    }

    fn post_head(&self, original_txid: &str) -> Option<Post> {
        self.inner.read().post_heads.get(original_txid).cloned()
    }

    fn comment_head(&self, original_txid: &str) -> Option<Comment> {
        self.inner.read().comment_heads.get(original_txid).cloned()
    }

    fn post_created_at(&self, original_txid: &str) -> Option<u64> {
        self.inner.read().post_created.get(original_txid).copied()
    }

    fn comment_created_at(&self, original_txid: &str) -> Option<u64> {
        self.inner
            .read()
            .comment_created
            .get(original_txid)
            .copied()
    }

    fn post_edit_pending(&self, _original_txid: &str) -> bool {
        // Committed edits are history, not pending work.
        false
    }

    fn comment_edit_pending(&self, _original_txid: &str) -> bool {
        false
    }

    fn score_exists(&self, author: &str, post_txid: &str) -> bool {
        self.inner
            .read()
            .scores
            .contains_key(&(author.to_string(), post_txid.to_string()))
    }

    fn comment_score_exists(&self, author: &str, comment_txid: &str) -> bool {
        self.inner
            .read()
            .comment_scores
            .contains_key(&(author.to_string(), comment_txid.to_string()))
    }

    fn complaint_exists(&self, author: &str, post_txid: &str) -> bool {
        self.inner
            .read()
            .complaints
            .contains_key(&(author.to_string(), post_txid.to_string()))
    }

    fn subscription_state(&self, author: &str, target: &str) -> Option<SubscriptionState> {
        self.inner
            .read()
            .subscriptions
            .get(&(author.to_string(), target.to_string()))
            .copied()
    }

    fn blocking_state(&self, author: &str, target: &str) -> Option<bool> {
        self.inner
            .read()
            .blockings
            .get(&(author.to_string(), target.to_string()))
            .copied()
    }
}

impl SocialDb for SocialStore {
    fn scores_received(&self, address: &str, below_height: u64) -> Vec<ReceivedScore> {
        let inner = self.inner.read();
        inner
            .received
            .get(address)
            .map(|scores| {
                scores
                    .iter()
                    .filter(|score| score.height < below_height)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn blocking_count(&self, author: &str) -> u32 {
        let inner = self.inner.read();
        inner
            .blockings
            .iter()
            .filter(|((blocker, _), blocked)| blocker == author && **blocked)
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Blocking, CommentScore, Score, Subscription};

    fn profile(txid: &str, address: &str, name: &str, time: u64) -> SocialItem {
        SocialItem::ProfileChange(ProfileChange {
            txid: txid.into(),
            address: address.into(),
            name: name.into(),
            time,
            ..ProfileChange::default()
        })
    }

    fn post(txid: &str, author: &str, time: u64) -> SocialItem {
        SocialItem::Post(Post {
            txid: txid.into(),
            original_txid: txid.into(),
            author: author.into(),
            time,
            message: "hello".into(),
            ..Post::default()
        })
    }

    #[test]
    fn registration_is_earliest_profile() {
        let store = SocialStore::new();
        store.commit(&profile("u1", "alice", "alice", 100), 1).unwrap();
        store.commit(&profile("u2", "alice", "wonder", 200), 2).unwrap();

        assert_eq!(store.registered_at("alice"), Some(100));
        assert_eq!(store.latest_profile_time("alice"), Some(200));
        assert!(!store.nickname_taken("alice", "bob"));
        assert!(store.nickname_taken("wonder", "bob"));
        assert!(!store.nickname_taken("wonder", "alice"));
    }

    #[test]
    fn post_edit_replaces_head_and_keeps_creation_time() {
        let store = SocialStore::new();
        store.commit(&post("p1", "alice", 100), 1).unwrap();
        store
            .commit(
                &SocialItem::PostEdit(Post {
                    txid: "p2".into(),
                    original_txid: "p1".into(),
                    author: "alice".into(),
                    time: 150,
                    message: "edited".into(),
                    ..Post::default()
                }),
                2,
            )
            .unwrap();

        let head = store.post_head("p1").unwrap();
        assert_eq!(head.txid, "p2");
        assert_eq!(head.message, "edited");
        assert_eq!(store.post_created_at("p1"), Some(100));
    }

    #[test]
    fn comment_delete_empties_message_and_marks_chain() {
        let store = SocialStore::new();
        store
            .commit(
                &SocialItem::Comment(Comment {
                    txid: "c1".into(),
                    original_txid: "c1".into(),
                    author: "alice".into(),
                    post_txid: "p1".into(),
                    time: 100,
                    message: "first".into(),
                    ..Comment::default()
                }),
                1,
            )
            .unwrap();
        store
            .commit(
                &SocialItem::CommentDelete(Comment {
                    txid: "c2".into(),
                    original_txid: "c1".into(),
                    author: "alice".into(),
                    post_txid: "p1".into(),
                    time: 200,
                    ..Comment::default()
                }),
                2,
            )
            .unwrap();

        let head = store.comment_head("c1").unwrap();
        assert!(head.deleted);
        assert!(head.last);
        assert!(head.message.is_empty());
        assert_eq!(head.txid, "c2");
    }

    #[test]
    fn received_scores_are_height_stratified() {
        let store = SocialStore::new();
        store.commit(&post("p1", "bob", 50), 1).unwrap();
        store
            .commit(
                &SocialItem::Score(Score {
                    txid: "s1".into(),
                    author: "alice".into(),
                    post_txid: "p1".into(),
                    time: 60,
                    value: 5,
                    ..Score::default()
                }),
                3,
            )
            .unwrap();

        assert!(store.scores_received("bob", 3).is_empty());
        let received = store.scores_received("bob", 4);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].scorer, "alice");
        assert_eq!(received[0].value, 5);
        assert!(store.score_exists("alice", "p1"));
        assert!(!store.score_exists("alice", "p2"));
    }

    #[test]
    fn relations_are_latest_wins() {
        let store = SocialStore::new();
        store
            .commit(
                &SocialItem::Subscribe(Subscription {
                    txid: "s1".into(),
                    author: "alice".into(),
                    target: "bob".into(),
                    private: false,
                    unsubscribe: false,
                    time: 10,
                    block_height: None,
                }),
                1,
            )
            .unwrap();
        store
            .commit(
                &SocialItem::Blocking(Blocking {
                    txid: "b1".into(),
                    author: "alice".into(),
                    target: "carol".into(),
                    unblock: false,
                    time: 11,
                    block_height: None,
                }),
                1,
            )
            .unwrap();

        assert!(store.subscription_state("alice", "bob").unwrap().subscribed);
        assert_eq!(store.blocking_state("alice", "carol"), Some(true));
        assert_eq!(store.blocking_count("alice"), 1);

        store
            .commit(
                &SocialItem::Blocking(Blocking {
                    txid: "b2".into(),
                    author: "alice".into(),
                    target: "carol".into(),
                    unblock: true,
                    time: 12,
                    block_height: None,
                }),
                2,
            )
            .unwrap();
        assert_eq!(store.blocking_state("alice", "carol"), Some(false));
        assert_eq!(store.blocking_count("alice"), 0);
    }

    #[test]
    fn comment_score_commit_tracks_target_author() {
        let store = SocialStore::new();
        store
            .commit(
                &SocialItem::Comment(Comment {
                    txid: "c1".into(),
                    original_txid: "c1".into(),
                    author: "bob".into(),
                    post_txid: "p1".into(),
                    time: 100,
                    message: "hi".into(),
                    ..Comment::default()
                }),
                1,
            )
            .unwrap();
        store
            .commit(
                &SocialItem::CommentScore(CommentScore {
                    txid: "cs1".into(),
                    author: "alice".into(),
                    comment_txid: "c1".into(),
                    time: 110,
                    value: 1,
                    block_height: None,
                }),
                2,
            )
            .unwrap();

        let received = store.scores_received("bob", 10);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].target, ScoreTarget::Comment);
        assert!(store.comment_score_exists("alice", "c1"));
    }
}
