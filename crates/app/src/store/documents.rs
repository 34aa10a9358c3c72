//! Document encoding.

use harvest::ids::TypedUuid;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

use super::DocumentPath;

/// Schema-less document body.
pub type Document = Map<String, Value>;

/// A document returned from a collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub path: DocumentPath,
    pub data: Document,
}

impl StoredDocument {
    /// The document's id parsed as a typed uuid.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidId`] if the last path segment is not a uuid.
    pub fn uuid<T>(&self) -> Result<TypedUuid<T>, DocumentError> {
        Ok(self.path.id().parse()?)
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("record did not serialize to an object")]
    NotAnObject,

    #[error("malformed document")]
    Malformed(#[from] serde_json::Error),

    #[error("document id is not a uuid")]
    InvalidId(#[from] uuid::Error),
}

/// Serialize a record into a document body.
///
/// # Errors
///
/// Returns [`DocumentError`] if the record does not serialize to a JSON object.
pub fn encode<T: Serialize>(record: &T) -> Result<Document, DocumentError> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        _ => Err(DocumentError::NotAnObject),
    }
}

/// Deserialize a document body into a record.
///
/// # Errors
///
/// Returns [`DocumentError::Malformed`] when the body does not fit the record.
pub fn decode<T: DeserializeOwned>(document: Document) -> Result<T, DocumentError> {
    Ok(serde_json::from_value(Value::Object(document))?)
}
