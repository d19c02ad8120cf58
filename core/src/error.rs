use crate::DocId;

/// Rejection of a whole build attempt. A failed build never publishes anything.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("duplicate document id {id:?}")]
    DuplicateId { id: String },

    #[error("document at position {position} has an empty {field}")]
    MissingField { position: usize, field: &'static str },

    #[error("document count exceeds the 32-bit position space")]
    TooManyDocuments,
}

/// Lookup of a document that is not part of the current snapshot.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("no document at position {0}")]
    Position(DocId),

    #[error("no document with id {0:?}")]
    Id(String),
}

#[derive(thiserror::Error, Debug)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Bincode(#[from] bincode::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported index format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("corrupt index: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Failure of a document store to hand over its documents.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum RebuildError {
    #[error("loading documents failed: {0}")]
    Store(#[from] StoreError),

    #[error("build rejected: {0}")]
    Build(#[from] BuildError),
}
