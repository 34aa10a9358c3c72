//! In-process document store.
//!
//! Holds documents in a sorted map behind an async mutex. Batches are applied
//! to a copy of the map which replaces the original only when every
//! precondition and write succeeds. Faults can be injected for tests and demos:
//! an offline switch, artificial latency, and paths whose writes are refused.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    Batch, Document, DocumentPath, DocumentStore, Predicate, StoreError, StoredDocument, Write,
};

#[derive(Debug, Default)]
struct MemoryState {
    documents: BTreeMap<DocumentPath, Document>,
    rejected: BTreeSet<DocumentPath>,
    offline: bool,
    latency: Option<Duration>,
    writes: usize,
}

impl MemoryState {
    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("store is offline".to_string()));
        }

        Ok(())
    }

    fn ensure_writable(&self, path: &DocumentPath) -> Result<(), StoreError> {
        if self.rejected.contains(path) {
            return Err(StoreError::Rejected(path.clone()));
        }

        Ok(())
    }
}

/// Shared, cloneable in-memory [`DocumentStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    /// Delay every call by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().await.latency = latency;
    }

    /// Refuse any write to `path`, failing the whole batch it is part of.
    pub async fn reject_writes_to(&self, path: DocumentPath) {
        self.state.lock().await.rejected.insert(path);
    }

    /// Accept writes to `path` again.
    pub async fn accept_writes_to(&self, path: &DocumentPath) {
        self.state.lock().await.rejected.remove(path);
    }

    /// Direct read that bypasses fault injection.
    pub async fn document(&self, path: &DocumentPath) -> Option<Document> {
        self.state.lock().await.documents.get(path).cloned()
    }

    /// Direct write that bypasses fault injection and is not counted.
    pub async fn seed(&self, path: DocumentPath, data: Document) {
        self.state.lock().await.documents.insert(path, data);
    }

    /// Number of individual writes applied so far.
    pub async fn write_count(&self) -> usize {
        self.state.lock().await.writes
    }

    async fn delay(&self) {
        let latency = self.state.lock().await.latency;

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn apply(documents: &mut BTreeMap<DocumentPath, Document>, write: Write) -> Result<(), StoreError> {
    match write {
        Write::Set { path, data } => {
            documents.insert(path, data);
        }
        Write::Update { path, fields } => {
            let document = documents
                .get_mut(&path)
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;

            document.extend(fields);
        }
        Write::Delete(path) => {
            documents.remove(&path);
        }
    }

    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.delay().await;

        let state = self.state.lock().await;
        state.ensure_online()?;

        Ok(state.documents.get(path).cloned())
    }

    async fn set_document(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError> {
        self.run_atomic_batch(Batch::new().set(path.clone(), data))
            .await
    }

    async fn update_document(
        &self,
        path: &DocumentPath,
        fields: Document,
    ) -> Result<(), StoreError> {
        self.run_atomic_batch(Batch::new().update(path.clone(), fields))
            .await
    }

    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StoreError> {
        self.run_atomic_batch(Batch::new().delete(path.clone()))
            .await
    }

    async fn query_collection(
        &self,
        collection: &DocumentPath,
        predicates: &[Predicate],
    ) -> Result<Vec<StoredDocument>, StoreError> {
        self.delay().await;

        let state = self.state.lock().await;
        state.ensure_online()?;

        let found = state
            .documents
            .iter()
            .filter(|(path, _)| path.parent().as_ref() == Some(collection))
            .filter(|(_, data)| predicates.iter().all(|predicate| predicate.matches(data)))
            .map(|(path, data)| StoredDocument {
                path: path.clone(),
                data: data.clone(),
            })
            .collect();

        Ok(found)
    }

    async fn run_atomic_batch(&self, batch: Batch) -> Result<(), StoreError> {
        self.delay().await;

        let mut state = self.state.lock().await;
        state.ensure_online()?;

        let (preconditions, writes) = batch.into_parts();

        for precondition in &preconditions {
            if !precondition.holds(state.documents.get(precondition.path())) {
                debug!(path = %precondition.path(), "batch precondition failed");

                return Err(StoreError::PreconditionFailed(precondition.path().clone()));
            }
        }

        let mut staged = state.documents.clone();
        let count = writes.len();

        for write in writes {
            state.ensure_writable(write.path())?;
            apply(&mut staged, write)?;
        }

        state.documents = staged;
        state.writes += count;

        Ok(())
    }
}
