//! Boundary to whatever produces the pages (a documentation generator, a
//! directory of exported JSON, a test fixture).

use crate::builder::{Document, SourceDocument};
use crate::error::StoreError;

pub trait DocumentStore {
    type Doc: SourceDocument;

    /// Every document of the site, in the order positions should be assigned.
    fn load_documents(&self) -> Result<Vec<Self::Doc>, StoreError>;
}

/// A fixed set of documents held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Vec<Document>,
}

impl MemoryStore {
    pub fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }
}

impl DocumentStore for MemoryStore {
    type Doc = Document;

    fn load_documents(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.docs.clone())
    }
}
