//! In-memory storage implementation.
//!
//! Every mutating operation runs under the write guard of the code's map
//! entry, which makes it atomic with respect to every other operation on the
//! same code.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use certcode_core::{ArtifactRef, Code, CodeRecord, Redeemer};

use crate::error::{Result, StoreError};
use crate::{CodeStats, CodeStore};

/// DashMap-backed storage implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<Code, CodeRecord>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no codes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CodeStore for MemoryStore {
    fn insert(&self, record: &CodeRecord) -> Result<()> {
        match self.records.entry(record.code.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateCode {
                code: record.code.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    fn get(&self, code: &Code) -> Result<CodeRecord> {
        self.records
            .get(code)
            .map(|r| r.value().clone())
            .ok_or(StoreError::NotFound)
    }

    fn compare_and_set_used(
        &self,
        code: &Code,
        redeemer: &Redeemer,
        artifact_ref: &ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<CodeRecord> {
        let mut record = self.records.get_mut(code).ok_or(StoreError::NotFound)?;
        record.claim(redeemer.clone(), artifact_ref.clone(), now)?;
        Ok(record.clone())
    }

    fn finalize_artifact(
        &self,
        code: &Code,
        artifact_ref: &ArtifactRef,
        now: DateTime<Utc>,
    ) -> Result<CodeRecord> {
        let mut record = self.records.get_mut(code).ok_or(StoreError::NotFound)?;
        record.finalize_artifact(artifact_ref.clone(), now)?;
        Ok(record.clone())
    }

    fn pending_artifacts(&self, limit: usize) -> Result<Vec<CodeRecord>> {
        let mut pending: Vec<CodeRecord> = self
            .records
            .iter()
            .filter(|r| r.is_pending_artifact())
            .map(|r| r.value().clone())
            .collect();

        // Oldest claims first.
        pending.sort_by_key(|r| r.redemption.as_ref().map(|red| red.redeemed_at));
        pending.truncate(limit);
        Ok(pending)
    }

    fn stats(&self) -> Result<CodeStats> {
        let mut stats = CodeStats::default();
        for record in self.records.iter() {
            stats.record(record.value());
        }
        Ok(stats)
    }
}
