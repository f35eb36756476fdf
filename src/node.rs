//! Node runtime: wires the chain view, the social store, the mempool and
//! the admission engine together and seals blocks on a timer.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time;
use tracing::{info, warn};

use crate::chain::ChainState;
use crate::config::NodeConfig;
use crate::context::{Ledger, MempoolView, SocialDb};
use crate::engine::Engine;
use crate::errors::ChainResult;
use crate::mempool::Mempool;
use crate::storage::Storage;
use crate::store::SocialStore;
use crate::types::{RawTransaction, SocialItem, UserState};
use crate::verdict::Verdict;

pub struct Node {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    config: NodeConfig,
    chain: Arc<ChainState>,
    store: Arc<SocialStore>,
    mempool: Arc<Mempool>,
    storage: Storage,
    engine: Engine,
    block_interval: Duration,
}

#[derive(Clone)]
pub struct NodeHandle {
    inner: Arc<NodeInner>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NodeStatus {
    pub height: u64,
    pub mempool_pending: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct MempoolStatus {
    pub pending: usize,
    pub capacity: usize,
}

impl Node {
    pub fn new(config: NodeConfig) -> ChainResult<Self> {
        config.ensure_directories()?;
        let storage = Storage::open(&config.data_dir.join("db"))?;
        let chain = Arc::new(ChainState::new());
        if let Some(tip) = storage.tip()? {
            chain.set_height(tip);
        }

        let store = Arc::new(SocialStore::new());
        let records = storage.load_records()?;
        store.replay(records.iter().map(|record| (&record.item, record.height)))?;
        info!(records = records.len(), height = chain.height(), "social index rebuilt");

        let mempool = Arc::new(Mempool::new(config.mempool_limit));
        let engine = Engine::new(
            chain.clone() as Arc<dyn Ledger>,
            store.clone() as Arc<dyn SocialDb>,
            mempool.clone() as Arc<dyn MempoolView>,
        );

        let inner = Arc::new(NodeInner {
            block_interval: Duration::from_millis(config.block_time_ms),
            config,
            chain,
            store,
            mempool,
            storage,
            engine,
        });
        Ok(Self { inner })
    }

    pub fn handle(&self) -> NodeHandle {
        NodeHandle {
            inner: self.inner.clone(),
        }
    }

    pub async fn start(self) -> ChainResult<()> {
        self.inner.run().await
    }
}

impl NodeHandle {
    pub fn submit_item(&self, item: SocialItem) -> ChainResult<Verdict> {
        self.inner.submit_item(item)
    }

    pub fn check_inputs(&self, tx: &RawTransaction) -> bool {
        self.inner.engine.check_inputs(tx)
    }

    pub fn user_state(&self, address: &str, time: u64) -> ChainResult<UserState> {
        self.inner.engine.get_user_state(address, time)
    }

    pub fn adjusted_time(&self) -> u64 {
        self.inner.chain.adjusted_time()
    }

    pub fn node_status(&self) -> NodeStatus {
        NodeStatus {
            height: self.inner.chain.height(),
            mempool_pending: MempoolView::len(&*self.inner.mempool),
        }
    }

    pub fn mempool_status(&self) -> MempoolStatus {
        MempoolStatus {
            pending: MempoolView::len(&*self.inner.mempool),
            capacity: self.inner.config.mempool_limit,
        }
    }
}

impl NodeInner {
    async fn run(self: Arc<Self>) -> ChainResult<()> {
        info!(listen = %self.config.rpc_listen, "starting social chain node");
        let mut ticker = time::interval(self.block_interval);
        loop {
            ticker.tick().await;
            if let Err(err) = self.seal_block() {
                warn!(?err, "block sealing failed");
            }
        }
    }

    fn submit_item(&self, item: SocialItem) -> ChainResult<Verdict> {
        let verdict = self.engine.check_item(&item);
        if verdict.is_success() {
            self.mempool.push(item)?;
        }
        Ok(verdict)
    }

    fn seal_block(&self) -> ChainResult<()> {
        let pending = self.mempool.drain(self.config.max_block_social_items);
        if pending.is_empty() {
            return Ok(());
        }
        let height = self.chain.height() + 1;
        let verdicts = self.engine.check_block(&pending);

        let mut accepted = 0usize;
        for index in crate::engine::block_order(&pending) {
            let verdict = verdicts[index];
            if verdict.is_success() {
                let mut item = pending[index].clone();
                item.set_block_height(height);
                self.store.commit(&item, height)?;
                self.storage.append_record(&item, height)?;
                accepted += 1;
            } else if verdict.is_transient() {
                // Infrastructure trouble is not a rejection; try again later.
                self.mempool.requeue(vec![pending[index].clone()]);
            } else {
                warn!(
                    txid = %pending[index].txid(),
                    kind = %pending[index].kind(),
                    %verdict,
                    "dropping rejected social item"
                );
            }
        }

        if accepted == 0 {
            return Ok(());
        }
        self.chain.set_height(height);
        self.storage.store_tip(height)?;
        info!(height, accepted, "sealed block");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Post, ProfileChange};
    use tempfile::tempdir;

    const NOW: u64 = 1_700_000_000;

    fn test_config(dir: &std::path::Path) -> NodeConfig {
        NodeConfig {
            data_dir: dir.to_path_buf(),
            ..NodeConfig::default()
        }
    }

    fn profile(txid: &str, address: &str, time: u64) -> SocialItem {
        SocialItem::ProfileChange(ProfileChange {
            txid: txid.into(),
            address: address.into(),
            name: address.into(),
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
    fn submit_seal_and_restart_round_trip() {
        let dir = tempdir().expect("temp dir");
        {
            let node = Node::new(test_config(dir.path())).unwrap();
            node.inner.chain.set_time_override(Some(NOW));

            let handle = node.handle();
            assert_eq!(
                handle.submit_item(post("p0", "alice", NOW)).unwrap(),
                Verdict::NotRegistered
            );
            assert_eq!(
                handle.submit_item(profile("u1", "alice", NOW - 10)).unwrap(),
                Verdict::Success
            );
            // Registration is already visible through the mempool context.
            assert_eq!(
                handle.submit_item(post("p1", "alice", NOW)).unwrap(),
                Verdict::Success
            );
            assert_eq!(handle.mempool_status().pending, 2);

            node.inner.seal_block().unwrap();
            assert_eq!(handle.node_status().height, 1);
            assert_eq!(handle.mempool_status().pending, 0);

            let state = handle.user_state("alice", NOW).unwrap();
            assert_eq!(state.post_spent, 1);
            assert_eq!(state.user_reg_date, (NOW - 10) as i64);
        }

        // Restart: the social index is rebuilt from persisted records.
        let node = Node::new(test_config(dir.path())).unwrap();
        node.inner.chain.set_time_override(Some(NOW));
        let handle = node.handle();
        assert_eq!(handle.node_status().height, 1);
        let state = handle.user_state("alice", NOW).unwrap();
        assert_eq!(state.post_spent, 1);
        assert_eq!(state.user_reg_date, (NOW - 10) as i64);
    }
}
