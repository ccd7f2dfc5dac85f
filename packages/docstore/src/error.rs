use thiserror::Error;

/// Errors surfaced by a document store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document with the given id exists in the collection.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    /// A document with the given id already exists.
    #[error("document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },
    /// An ordered query needs an index the store does not have yet.
    ///
    /// Callers are expected to fall back to the unordered form of the same
    /// query and sort client-side.
    #[error("ordered query on {collection}.{field} requires a missing index")]
    IndexRequired { collection: String, field: String },
    /// A document could not be encoded or decoded.
    #[error("document serialization failed: {0}")]
    Serialization(String),
    /// The backend could not be reached or failed internally.
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}
