//! Pending social transactions awaiting block inclusion.
//!
//! The mempool is mutated only by the node (admission upstream, drain on
//! block assembly); the engine sees it as a read-only observation layer.

use std::collections::VecDeque;

use parking_lot::RwLock;

use crate::context::{scan, MempoolView, SocialQuery, SubscriptionState};
use crate::errors::{ChainError, ChainResult};
use crate::types::{Comment, Post, SocialItem, SocialKind};

pub struct Mempool {
    capacity: usize,
    queue: RwLock<VecDeque<SocialItem>>,
}

impl Mempool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            queue: RwLock::new(VecDeque::new()),
        }
    }

    pub fn push(&self, item: SocialItem) -> ChainResult<()> {
        let mut queue = self.queue.write();
        if queue.len() >= self.capacity {
            return Err(ChainError::Transaction("mempool full".into()));
        }
        if queue.iter().any(|pending| pending.txid() == item.txid()) {
            return Err(ChainError::Transaction("transaction already queued".into()));
        }
        queue.push_back(item);
        Ok(())
    }

    /// Removes and returns up to `max` items in arrival order.
    pub fn drain(&self, max: usize) -> Vec<SocialItem> {
        let mut queue = self.queue.write();
        let take = max.min(queue.len());
        queue.drain(..take).collect()
    }

    /// Puts items back at the front, preserving their relative order. Used
    /// when a sealed block is rejected wholesale.
    pub fn requeue(&self, items: Vec<SocialItem>) {
        let mut queue = self.queue.write();
        for item in items.into_iter().rev() {
            queue.push_front(item);
        }
    }

    pub fn remove(&self, txid: &str) -> Option<SocialItem> {
        let mut queue = self.queue.write();
        let index = queue.iter().position(|item| item.txid() == txid)?;
        queue.remove(index)
    }

    fn snapshot(&self) -> Vec<SocialItem> {
        self.queue.read().iter().cloned().collect()
    }
}

impl SocialQuery for Mempool {
    fn count_by_author_window(&self, kind: SocialKind, author: &str, from: u64, to: u64) -> u64 {
        scan::count_by_author_window(&self.snapshot(), kind, author, from, to)
    }

    fn registered_at(&self, address: &str) -> Option<u64> {
        scan::registered_at(&self.snapshot(), address)
    }

    fn latest_profile_time(&self, address: &str) -> Option<u64> {
        scan::latest_profile_time(&self.snapshot(), address)
    }

    fn nickname_taken(&self, name: &str, excluding: &str) -> bool {
        scan::nickname_taken(&self.snapshot(), name, excluding)
    }

    fn post_head(&self, original_txid: &str) -> Option<Post> {
        scan::post_head(&self.snapshot(), original_txid)
    }

    fn comment_head(&self, original_txid: &str) -> Option<Comment> {
        scan::comment_head(&self.snapshot(), original_txid)
    }

    fn post_created_at(&self, original_txid: &str) -> Option<u64> {
        scan::post_created_at(&self.snapshot(), original_txid)
    }

    fn comment_created_at(&self, original_txid: &str) -> Option<u64> {
        scan::comment_created_at(&self.snapshot(), original_txid)
    }

    fn post_edit_pending(&self, original_txid: &str) -> bool {
        scan::post_edit_pending(&self.snapshot(), original_txid)
    }

    fn comment_edit_pending(&self, original_txid: &str) -> bool {
        scan::comment_edit_pending(&self.snapshot(), original_txid)
    }

    fn score_exists(&self, author: &str, post_txid: &str) -> bool {
        scan::score_exists(&self.snapshot(), author, post_txid)
    }

    fn comment_score_exists(&self, author: &str, comment_txid: &str) -> bool {
        scan::comment_score_exists(&self.snapshot(), author, comment_txid)
    }

    fn complaint_exists(&self, author: &str, post_txid: &str) -> bool {
        scan::complaint_exists(&self.snapshot(), author, post_txid)
    }

    fn subscription_state(&self, author: &str, target: &str) -> Option<SubscriptionState> {
        scan::subscription_state(&self.snapshot(), author, target)
    }

    fn blocking_state(&self, author: &str, target: &str) -> Option<bool> {
        scan::blocking_state(&self.snapshot(), author, target)
    }
}

impl MempoolView for Mempool {
    fn len(&self) -> usize {
        self.queue.read().len()
    }

    fn contains(&self, txid: &str) -> bool {
        self.queue.read().iter().any(|item| item.txid() == txid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Post;

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
    fn rejects_duplicates_and_overflow() {
        let mempool = Mempool::new(2);
        mempool.push(post("a", "alice", 1)).unwrap();
        assert!(mempool.push(post("a", "alice", 1)).is_err());
        mempool.push(post("b", "alice", 2)).unwrap();
        assert!(mempool.push(post("c", "alice", 3)).is_err());
        assert_eq!(MempoolView::len(&mempool), 2);
        assert!(mempool.contains("a"));
    }

    #[test]
    fn drain_preserves_arrival_order() {
        let mempool = Mempool::new(8);
        mempool.push(post("a", "alice", 1)).unwrap();
        mempool.push(post("b", "bob", 2)).unwrap();
        mempool.push(post("c", "carol", 3)).unwrap();

        let drained = mempool.drain(2);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].txid(), "a");
        assert_eq!(drained[1].txid(), "b");
        assert_eq!(MempoolView::len(&mempool), 1);

        mempool.requeue(drained);
        let all = mempool.drain(10);
        assert_eq!(
            all.iter().map(|item| item.txid().to_string()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn queries_see_pending_items() {
        let mempool = Mempool::new(8);
        mempool.push(post("a", "alice", 100)).unwrap();
        assert_eq!(
            mempool.count_by_author_window(SocialKind::Post, "alice", 0, 100),
            1
        );
        assert!(mempool.post_head("a").is_some());
        mempool.remove("a").unwrap();
        assert!(mempool.post_head("a").is_none());
    }
}
