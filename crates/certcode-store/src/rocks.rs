//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `CodeStore`
//! trait. `RocksDB` has no conditional put, so every read-modify-write runs
//! under the code's entry in a [`KeyLocks`] table.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options,
};

use certcode_core::{ArtifactRef, Code, CodeRecord, Redeemer};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::locks::KeyLocks;
use crate::schema::{all_column_families, cf};
use crate::{CodeStats, CodeStore};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    locks: KeyLocks,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let path = path.as_ref();
        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        tracing::debug!(path = %path.display(), "RocksDB code store opened");

        Ok(Self {
            db: Arc::new(db),
            locks: KeyLocks::new(),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn read(&self, code: &Code) -> Result<Option<CodeRecord>> {
        let cf = self.cf(cf::CODES)?;

        self.db
            .get_cf(&cf, keys::code_key(code))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn write(&self, record: &CodeRecord) -> Result<()> {
        let cf = self.cf(cf::CODES)?;
        let value = Self::serialize(record)?;

        self.db
            .put_cf(&cf, keys::code_key(&record.code), value)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    /// Read, modify and write back one record under its key lock.
    fn update(
        &self,
        code: &Code,
        modify: impl FnOnce(&mut CodeRecord) -> certcode_core::Result<()>,
    ) -> Result<CodeRecord> {
        self.locks.with_lock(code.as_str(), || {
            let mut record = self.read(code)?.ok_or(StoreError::NotFound)?;
            modify(&mut record)?;
            self.write(&record)?;
            Ok(record)
        })
    }

    /// Visit every stored record in key order.
    fn for_each_record(&self, mut visit: impl FnMut(CodeRecord) -> bool) -> Result<()> {
        let cf = self.cf(cf::CODES)?;

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !visit(Self::deserialize(&value)?) {
                break;
            }
        }

        Ok(())
    }
}

impl CodeStore for RocksStore {
    fn insert(&self, record: &CodeRecord) -> Result<()> {
        self.locks.with_lock(record.code.as_str(), || {
            if self.read(&record.code)?.is_some() {
                return Err(StoreError::DuplicateCode {
                    code: record.code.to_string(),
                });
            }
            self.write(record)
        })
    }

    fn get(&self, code: &Code) -> Result<CodeRecord> {
        self.read(code)?.ok_or(StoreError::NotFound)
    }

    fn compare_and_set_used(
        &self,
        code: &Code,
        redeemer: &Redeemer,
        artifact_ref: &ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<CodeRecord> {
        self.update(code, |record| {
            record.claim(redeemer.clone(), artifact_ref.clone(), now)
        })
    }

    fn finalize_artifact(
        &self,
        code: &Code,
        artifact_ref: &ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<CodeRecord> {
        self.update(code, |record| {
            record.finalize_artifact(artifact_ref.clone(), now)
        })
    }

    fn pending_artifacts(&self, limit: usize) -> Result<Vec<CodeRecord>> {
        let mut pending = Vec::new();
        if limit == 0 {
            return Ok(pending);
        }

        self.for_each_record(|record| {
            if record.is_pending_artifact() {
                pending.push(record);
            }
            pending.len() < limit
        })?;

        Ok(pending)
    }

    fn stats(&self) -> Result<CodeStats> {
        let mut stats = CodeStats::default();
        self.for_each_record(|record| {
            stats.record(&record);
            true
        })?;
        Ok(stats)
    }
}
