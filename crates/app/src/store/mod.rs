//! Remote Document Store
//!
//! The narrow interface the core consumes: per-document CRUD, collection
//! queries with simple predicates, and an all-or-nothing batch commit with
//! preconditions.

use async_trait::async_trait;
use mockall::automock;

mod batch;
mod bounded;
mod documents;
mod errors;
mod memory;
mod paths;
mod predicates;

pub use batch::{Batch, Precondition, Write};
pub use bounded::BoundedStore;
pub use documents::{Document, DocumentError, StoredDocument, decode, encode};
pub use errors::StoreError;
pub use memory::MemoryDocumentStore;
pub use paths::DocumentPath;
pub use predicates::Predicate;

#[automock]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, `None` when absent.
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Document>, StoreError>;

    /// Create or overwrite a document.
    async fn set_document(&self, path: &DocumentPath, data: Document) -> Result<(), StoreError>;

    /// Merge top-level fields into an existing document.
    async fn update_document(&self, path: &DocumentPath, fields: Document)
    -> Result<(), StoreError>;

    /// Delete a document. Deleting an absent document succeeds.
    async fn delete_document(&self, path: &DocumentPath) -> Result<(), StoreError>;

    /// Documents directly inside `collection` matching every predicate.
    async fn query_collection(
        &self,
        collection: &DocumentPath,
        predicates: &[Predicate],
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Apply every write in the batch, or none of them.
    async fn run_atomic_batch(&self, batch: Batch) -> Result<(), StoreError>;
}
