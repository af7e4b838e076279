//! Batch issuance of new codes.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use certcode_core::{Code, CodeError, CodeRecord};
use certcode_store::{CodeStore, StoreError};

/// Attempts per code before a collision is reported as a storage error.
///
/// ULIDs carry 80 random bits, so even one retry is not expected in practice.
const MAX_ISSUE_ATTEMPTS: u32 = 8;

/// Source of fresh codes.
pub type CodeGenerator = Arc<dyn Fn() -> Code + Send + Sync>;

/// A batch issuance request.
#[derive(Debug, Clone)]
pub struct IssueBatch {
    /// Certificate category for every code in the batch.
    pub category: String,
    /// Number of codes to issue.
    pub count: usize,
    /// Labels attached to every code in the batch.
    pub tags: Vec<String>,
}

/// A freshly issued code and the URL that redeems it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedCode {
    /// The code.
    pub code: String,
    /// Redemption URL, suitable for a QR code.
    pub url: String,
}

/// Issues batches of unique, unused codes.
#[derive(Clone)]
pub struct CodeIssuer {
    store: Arc<dyn CodeStore>,
    generator: CodeGenerator,
    redeem_base_url: String,
    max_batch_size: usize,
}

impl CodeIssuer {
    /// Create an issuer generating ULID codes.
    ///
    /// `public_base_url` is the address users open to redeem a code; issued
    /// URLs have the form `<public_base_url>/?code=<code>`.
    #[must_use]
    pub fn new(store: Arc<dyn CodeStore>, public_base_url: &str, max_batch_size: usize) -> Self {
        Self {
            store,
            generator: Arc::new(Code::generate),
            redeem_base_url: format!("{}/?code=", public_base_url.trim_end_matches('/')),
            max_batch_size,
        }
    }

    /// Replace the code generator.
    #[must_use]
    pub fn with_generator(mut self, generator: CodeGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Issue a batch of codes.
    ///
    /// Codes are returned in issuance order. If the batch fails half-way, the
    /// codes issued so far stay in the store as unused codes.
    ///
    /// # Errors
    ///
    /// - `CodeError::InvalidCount` if `count` is zero or above the maximum.
    /// - `CodeError::InvalidCategory` if the category is blank.
    /// - `CodeError::Storage` if the store fails.
    pub fn issue_batch(&self, batch: &IssueBatch) -> Result<Vec<IssuedCode>, CodeError> {
        if batch.count == 0 || batch.count > self.max_batch_size {
            return Err(CodeError::InvalidCount(format!(
                "count must be between 1 and {}, got {}",
                self.max_batch_size, batch.count
            )));
        }

        let category = batch.category.trim();
        if category.is_empty() {
            return Err(CodeError::InvalidCategory);
        }

        let tags: Vec<String> = batch
            .tags
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let mut issued = Vec::with_capacity(batch.count);
        for _ in 0..batch.count {
            let code = self.issue_one(category, &tags)?;
            issued.push(IssuedCode {
                url: self.redemption_url(&code),
                code: code.into(),
            });
        }

        tracing::info!(
            category = %category,
            count = issued.len(),
            "Code batch issued"
        );

        Ok(issued)
    }

    /// Redemption URL for a code.
    #[must_use]
    pub fn redemption_url(&self, code: &Code) -> String {
        format!("{}{code}", self.redeem_base_url)
    }

    fn issue_one(&self, category: &str, tags: &[String]) -> Result<Code, CodeError> {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            let code = (self.generator)();
            let record =
                CodeRecord::new(code.clone(), category, Utc::now()).with_tags(tags.to_vec());

            match self.store.insert(&record) {
                Ok(()) => return Ok(code),
                Err(StoreError::DuplicateCode { code }) => {
                    tracing::warn!(code = %code, attempt, "Generated code collided, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CodeError::Storage(format!(
            "no unique code after {MAX_ISSUE_ATTEMPTS} attempts"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use certcode_core::CodeState;
    use certcode_store::MemoryStore;

    fn issuer(store: &Arc<MemoryStore>) -> CodeIssuer {
        CodeIssuer::new(store.clone(), "https://certs.example.com/", 1000)
    }

    fn batch(category: &str, count: usize) -> IssueBatch {
        IssueBatch {
            category: category.into(),
            count,
            tags: Vec::new(),
        }
    }

    #[test]
    fn issues_distinct_unused_codes() {
        let store = Arc::new(MemoryStore::new());
        let issuer = issuer(&store);

        let first = issuer.issue_batch(&batch("Kraftakt", 1000)).unwrap();
        let second = issuer.issue_batch(&batch("Kraftakt", 10)).unwrap();

        let all: HashSet<_> = first.iter().chain(&second).map(|c| c.code.clone()).collect();
        assert_eq!(first.len(), 1000);
        assert_eq!(all.len(), 1010);
        assert_eq!(store.len(), 1010);

        let code = Code::parse(&first[0].code).unwrap();
        let record = store.get(&code).unwrap();
        assert_eq!(record.state(), CodeState::Unused);
        assert_eq!(record.category, "Kraftakt");
    }

    #[test]
    fn urls_point_at_redemption_page() {
        let store = Arc::new(MemoryStore::new());
        let issued = issuer(&store).issue_batch(&batch("Kraftakt", 1)).unwrap();

        assert_eq!(
            issued[0].url,
            format!("https://certs.example.com/?code={}", issued[0].code)
        );
    }

    #[test]
    fn rejects_invalid_count() {
        let store = Arc::new(MemoryStore::new());
        let issuer = issuer(&store);

        assert!(matches!(
            issuer.issue_batch(&batch("Kraftakt", 0)),
            Err(CodeError::InvalidCount(_))
        ));
        assert!(matches!(
            issuer.issue_batch(&batch("Kraftakt", 1001)),
            Err(CodeError::InvalidCount(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn rejects_blank_category() {
        let store = Arc::new(MemoryStore::new());
        assert_eq!(
            issuer(&store).issue_batch(&batch("  ", 5)),
            Err(CodeError::InvalidCategory)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn tags_are_trimmed_and_stored() {
        let store = Arc::new(MemoryStore::new());
        let issued = issuer(&store)
            .issue_batch(&IssueBatch {
                category: "Kraftakt".into(),
                count: 1,
                tags: vec![" fair ".into(), String::new(), "2024".into()],
            })
            .unwrap();

        let record = store.get(&Code::parse(&issued[0].code).unwrap()).unwrap();
        assert_eq!(record.tags, vec!["fair".to_string(), "2024".to_string()]);
    }

    #[test]
    fn collisions_are_retried_transparently() {
        let store = Arc::new(MemoryStore::new());
        let taken = Code::parse("taken").unwrap();
        store
            .insert(&CodeRecord::new(taken.clone(), "Old", Utc::now()))
            .unwrap();

        // The first two generated codes collide with the existing one.
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let generator: CodeGenerator = Arc::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Code::parse("taken").unwrap()
            } else {
                Code::generate()
            }
        });

        let issued = issuer(&store)
            .with_generator(generator)
            .issue_batch(&batch("Kraftakt", 1))
            .unwrap();

        assert_eq!(issued.len(), 1);
        assert_ne!(issued[0].code, "taken");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(store.get(&taken).unwrap().category, "Old");
    }

    #[test]
    fn persistent_collisions_surface_as_storage_error() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(&CodeRecord::new(Code::parse("taken").unwrap(), "Old", Utc::now()))
            .unwrap();

        let generator: CodeGenerator = Arc::new(|| Code::parse("taken").unwrap());
        let result = issuer(&store)
            .with_generator(generator)
            .issue_batch(&batch("Kraftakt", 1));

        assert!(matches!(result, Err(CodeError::Storage(_))));
    }
}
