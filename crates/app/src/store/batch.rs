//! Atomic Batches
//!
//! A batch is a list of preconditions checked against the store's current
//! state, followed by writes applied all together. If any precondition fails
//! or any write is refused, nothing is applied.

use serde_json::Value;

use super::{Document, DocumentPath};

/// Condition that must hold when the batch is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// The document exists.
    Exists(DocumentPath),

    /// The document does not exist.
    Missing(DocumentPath),

    /// The document exists and `field` currently equals `value`.
    FieldEquals {
        path: DocumentPath,
        field: String,
        value: Value,
    },
}

impl Precondition {
    /// Document the precondition refers to.
    pub fn path(&self) -> &DocumentPath {
        match self {
            Self::Exists(path) | Self::Missing(path) | Self::FieldEquals { path, .. } => path,
        }
    }

    /// Whether the precondition holds for the document's current body.
    pub fn holds(&self, current: Option<&Document>) -> bool {
        match self {
            Self::Exists(_) => current.is_some(),
            Self::Missing(_) => current.is_none(),
            Self::FieldEquals { field, value, .. } => {
                current.and_then(|document| document.get(field)) == Some(value)
            }
        }
    }
}

/// One write in a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create or overwrite.
    Set { path: DocumentPath, data: Document },

    /// Merge top-level fields into an existing document.
    Update { path: DocumentPath, fields: Document },

    /// Remove.
    Delete(DocumentPath),
}

impl Write {
    /// Document the write targets.
    pub fn path(&self) -> &DocumentPath {
        match self {
            Self::Set { path, .. } | Self::Update { path, .. } | Self::Delete(path) => path,
        }
    }
}

/// Preconditions plus writes, submitted once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    preconditions: Vec<Precondition>,
    writes: Vec<Write>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a precondition.
    #[must_use]
    pub fn require(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    /// Add a create-or-overwrite write.
    #[must_use]
    pub fn set(mut self, path: DocumentPath, data: Document) -> Self {
        self.writes.push(Write::Set { path, data });
        self
    }

    /// Add a field merge.
    #[must_use]
    pub fn update(mut self, path: DocumentPath, fields: Document) -> Self {
        self.writes.push(Write::Update { path, fields });
        self
    }

    /// Add a delete.
    #[must_use]
    pub fn delete(mut self, path: DocumentPath) -> Self {
        self.writes.push(Write::Delete(path));
        self
    }

    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Whether the batch has no writes.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Whether any write targets `path`.
    pub fn writes_to(&self, path: &DocumentPath) -> bool {
        self.writes.iter().any(|write| write.path() == path)
    }

    pub fn into_parts(self) -> (Vec<Precondition>, Vec<Write>) {
        (self.preconditions, self.writes)
    }
}
