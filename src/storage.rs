//! Embedded persistence of accepted social records.
//!
//! RocksDB column families hold the primary records in commit order plus tip
//! metadata. Everything derived (indexes, reputation, quotas) is rebuilt by
//! replaying the records into the in-memory store at boot.

use std::convert::TryInto;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options,
};
use serde::{Deserialize, Serialize};

use crate::errors::{ChainError, ChainResult};
use crate::types::SocialItem;

pub const STORAGE_SCHEMA_VERSION: u32 = 1;

const CF_RECORDS: &str = "records";
const CF_METADATA: &str = "metadata";
const TIP_HEIGHT_KEY: &[u8] = b"tip_height";
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredRecord {
    pub height: u64,
    pub item: SocialItem,
}

pub struct Storage {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    next_seq: AtomicU64,
}

impl Storage {
    pub fn open(path: &Path) -> ChainResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_RECORDS, Options::default()),
            ColumnFamilyDescriptor::new(CF_METADATA, Options::default()),
        ];
        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)?;
        let storage = Self {
            db: Arc::new(db),
            next_seq: AtomicU64::new(0),
        };
        storage.ensure_schema_supported()?;
        let count = storage.record_count()?;
        storage.next_seq.store(count, Ordering::SeqCst);
        Ok(storage)
    }

    fn records_cf(&self) -> ChainResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(CF_RECORDS)
            .ok_or_else(|| ChainError::Config("missing records column family".into()))
    }

    fn metadata_cf(&self) -> ChainResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(CF_METADATA)
            .ok_or_else(|| ChainError::Config("missing metadata column family".into()))
    }

    fn ensure_schema_supported(&self) -> ChainResult<()> {
        let metadata_cf = self.metadata_cf()?;
        match self.db.get_cf(&metadata_cf, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let bytes: [u8; 4] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| ChainError::Config("invalid schema version encoding".into()))?;
                let version = u32::from_be_bytes(bytes);
                if version != STORAGE_SCHEMA_VERSION {
                    return Err(ChainError::Config(format!(
                        "database schema version {version} is not supported ({STORAGE_SCHEMA_VERSION} required)"
                    )));
                }
                Ok(())
            }
            None => {
                self.db.put_cf(
                    &metadata_cf,
                    SCHEMA_VERSION_KEY,
                    STORAGE_SCHEMA_VERSION.to_be_bytes(),
                )?;
                Ok(())
            }
        }
    }

    fn record_count(&self) -> ChainResult<u64> {
        let cf = self.records_cf()?;
        let mut count = 0u64;
        let mut iterator = self.db.iterator_cf(&cf, IteratorMode::Start);
        while let Some(entry) = iterator.next() {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    /// Appends one accepted record in commit order.
    pub fn append_record(&self, item: &SocialItem, height: u64) -> ChainResult<()> {
        let cf = self.records_cf()?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let record = StoredRecord {
            height,
            item: item.clone(),
        };
        let data = bincode::serialize(&record)?;
        self.db.put_cf(&cf, seq.to_be_bytes(), data)?;
        Ok(())
    }

    /// All records in commit order.
    pub fn load_records(&self) -> ChainResult<Vec<StoredRecord>> {
        let cf = self.records_cf()?;
        let mut records = Vec::new();
        let mut iterator = self.db.iterator_cf(&cf, IteratorMode::Start);
        while let Some(entry) = iterator.next() {
            let (_key, value) = entry?;
            records.push(bincode::deserialize::<StoredRecord>(&value)?);
        }
        Ok(records)
    }

    pub fn store_tip(&self, height: u64) -> ChainResult<()> {
        let cf = self.metadata_cf()?;
        self.db.put_cf(&cf, TIP_HEIGHT_KEY, height.to_be_bytes())?;
        Ok(())
    }

    pub fn tip(&self) -> ChainResult<Option<u64>> {
        let cf = self.metadata_cf()?;
        match self.db.get_cf(&cf, TIP_HEIGHT_KEY)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| ChainError::Config("invalid tip height encoding".into()))?;
                Ok(Some(u64::from_be_bytes(bytes)))
            }
            None => Ok(None),
        }
    }
}

impl Clone for Storage {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            next_seq: AtomicU64::new(self.next_seq.load(Ordering::SeqCst)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Post;
    use tempfile::tempdir;

    fn post(txid: &str, time: u64) -> SocialItem {
        SocialItem::Post(Post {
            txid: txid.into(),
            original_txid: txid.into(),
            author: "alice".into(),
            time,
            ..Post::default()
        })
    }

    #[test]
    fn records_survive_reopen_in_commit_order() {
        let dir = tempdir().expect("temp dir");
        {
            let storage = Storage::open(dir.path()).unwrap();
            storage.append_record(&post("p1", 10), 1).unwrap();
            storage.append_record(&post("p2", 20), 1).unwrap();
            storage.store_tip(1).unwrap();
        }
        let storage = Storage::open(dir.path()).unwrap();
        assert_eq!(storage.tip().unwrap(), Some(1));
        let records = storage.load_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].item.txid(), "p1");
        assert_eq!(records[1].item.txid(), "p2");

        storage.append_record(&post("p3", 30), 2).unwrap();
        let records = storage.load_records().unwrap();
        assert_eq!(records[2].item.txid(), "p3");
    }
}
