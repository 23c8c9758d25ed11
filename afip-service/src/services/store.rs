//! Durable storage of authorization records.
//!
//! A record reflects state the authority has already advanced, so it is
//! committed on its own as soon as it exists, never as part of a larger unit
//! of work that could later roll back.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AuthorizationError;
use crate::models::AuthorizationRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Records are write-once.
    #[error("Invoice {0} already has an authorization record")]
    AlreadyAuthorized(Uuid),

    #[error("Storage backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait AuthorizationStore: Send + Sync {
    async fn find(&self, invoice_id: Uuid) -> Result<Option<AuthorizationRecord>, StoreError>;

    /// Write and durably commit the record for one invoice.
    async fn commit(
        &self,
        invoice_id: Uuid,
        record: &AuthorizationRecord,
    ) -> Result<(), StoreError>;
}

/// Process-local store used by the batch binary and tests.
#[derive(Default)]
pub struct InMemoryAuthorizationStore {
    records: RwLock<HashMap<Uuid, AuthorizationRecord>>,
    commits: AtomicUsize,
}

impl InMemoryAuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationStore for InMemoryAuthorizationStore {
    async fn find(&self, invoice_id: Uuid) -> Result<Option<AuthorizationRecord>, StoreError> {
        Ok(self.records.read().await.get(&invoice_id).cloned())
    }

    async fn commit(
        &self,
        invoice_id: Uuid,
        record: &AuthorizationRecord,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let has_code = records
            .get(&invoice_id)
            .is_some_and(|existing| !existing.auth_code.is_empty());
        if has_code {
            return Err(StoreError::AlreadyAuthorized(invoice_id));
        }
        records.insert(invoice_id, record.clone());
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl From<StoreError> for AuthorizationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyAuthorized(invoice_id) => {
                AuthorizationError::AlreadyAuthorized(invoice_id)
            }
            StoreError::Backend(source) => AuthorizationError::Store(source),
        }
    }
}
