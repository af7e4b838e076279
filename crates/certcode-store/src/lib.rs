//! Storage layer for certcode.
//!
//! The store is the sole owner of code state. Every backend must make
//! [`CodeStore::compare_and_set_used`] linearizable per code: of any number of
//! concurrent claims on one code, exactly one succeeds.
//!
//! # Backends
//!
//! - [`MemoryStore`]: `DashMap`-backed, process-local. Used by tests and when
//!   the service runs without persistence.
//! - `RocksStore` (feature `rocksdb-backend`): durable, one column family
//!   `codes`, CBOR values, per-key locking for read-modify-write operations.
//!
//! # Example
//!
//! ```
//! use certcode_core::{ArtifactRef, Code, CodeRecord, Redeemer};
//! use certcode_store::{CodeStore, MemoryStore, StoreError};
//!
//! let store = MemoryStore::new();
//! let code = Code::generate();
//! store.insert(&CodeRecord::new(code.clone(), "Kraftakt", chrono::Utc::now())).unwrap();
//!
//! let redeemer = Redeemer { name: "John Doe".into(), email: "john@example.com".into() };
//! let reserved = ArtifactRef::reserved_for(&code);
//! store.compare_and_set_used(&code, &redeemer, &reserved, chrono::Utc::now()).unwrap();
//!
//! let again = store.compare_and_set_used(&code, &redeemer, &reserved, chrono::Utc::now());
//! assert!(matches!(again, Err(StoreError::AlreadyUsed)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod locks;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use certcode_core::{ArtifactRef, Code, CodeRecord, Redeemer};

pub use error::{Result, StoreError};
pub use locks::KeyLocks;
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

/// Code counts for one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    /// Codes issued in the category.
    pub total: u64,
    /// Codes in the category not yet redeemed.
    pub unused: u64,
}

/// Aggregate code counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CodeStats {
    /// All codes ever issued.
    pub total: u64,
    /// Codes not yet redeemed.
    pub unused: u64,
    /// Counts per category.
    pub by_category: BTreeMap<String, CategoryStats>,
}

impl CodeStats {
    /// Add one record to the counts.
    pub fn record(&mut self, record: &CodeRecord) {
        let unused = u64::from(record.is_unused());
        self.total += 1;
        self.unused += unused;
        let category = self.by_category.entry(record.category.clone()).or_default();
        category.total += 1;
        category.unused += unused;
    }
}

/// The storage trait for code records.
///
/// Records are never deleted; a redeemed code stays as an audit record.
pub trait CodeStore: Send + Sync {
    /// Insert a new record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateCode` if the code already exists.
    fn insert(&self, record: &CodeRecord) -> Result<()>;

    /// Get a record by code.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the code does not exist.
    fn get(&self, code: &Code) -> Result<CodeRecord>;

    /// Atomically claim an unused code.
    ///
    /// On success the record is `USED` with a pending artifact reserved at
    /// `artifact_ref`, and the updated record is returned.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the code does not exist.
    /// - `StoreError::AlreadyUsed` if the code was claimed before. Nothing is
    ///   modified in that case.
    fn compare_and_set_used(
        &self,
        code: &Code,
        redeemer: &Redeemer,
        artifact_ref: &ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<CodeRecord>;

    /// Store the final artifact reference of a claimed code.
    ///
    /// Idempotent: finalizing an already rendered record succeeds.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the code does not exist.
    /// - `StoreError::NotRedeemed` if the code is still unused.
    fn finalize_artifact(
        &self,
        code: &Code,
        artifact_ref: &ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<CodeRecord>;

    /// List claimed codes whose artifact is still pending, up to `limit`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn pending_artifacts(&self, limit: usize) -> Result<Vec<CodeRecord>>;

    /// Count codes overall and per category.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn stats(&self) -> Result<CodeStats>;
}
