//! Timeout decorator for document stores.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use tracing::warn;

use super::{Batch, Document, DocumentPath, DocumentStore, Predicate, StoreError, StoredDocument};

/// Bounds every call on the wrapped store. An elapsed call fails with
/// [`StoreError::Timeout`] and is assumed to have had no effect.
#[derive(Debug, Clone)]
pub struct BoundedStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> BoundedStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        if let Ok(result) = tokio::time::timeout(self.timeout, call).await {
            result
        } else {
            warn!(operation, timeout = ?self.timeout, "store call timed out");

            Err(StoreError::Timeout(self.timeout))
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for BoundedStore<S> {
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.bounded("get_document", self.inner.get_document(path))
            .await
    }

    async fn set_document(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError> {
        self.bounded("set_document", self.inner.set_document(path, data))
            .await
    }

    async fn update_document(
        &self,
        path: &DocumentPath,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.bounded("update_document", self.inner.update_document(path, fields))
            .await
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.bounded("delete_document", self.inner.delete_document(path))
            .await
    }

    async fn query_collection(
        &self,
        collection: &DocumentPath,
        predicates: &[Predicate],
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.bounded(
            "query_collection",
            self.inner.query_collection(collection, predicates),
        )
        .await
    }

    async fn run_atomic_batch(&self, batch: Batch) -> Result<(), StoreError> {
        self.bounded("run_atomic_batch", self.inner.run_atomic_batch(batch))
            .await
    }
}
