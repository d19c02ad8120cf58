use crate::builder::{IndexBuilder, SourceDocument};
use crate::error::{BuildError, RebuildError};
use crate::index::InvertedIndex;
use crate::store::DocumentStore;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// The published index. Readers clone the current `Arc` and query it for as
/// long as they like; a rebuild only swaps the pointer once the new index is
/// complete. Builds are serialized through `writer`.
#[derive(Debug)]
pub struct IndexHandle {
    current: RwLock<Published>,
    writer: Mutex<()>,
}

#[derive(Debug, Clone)]
struct Published {
    generation: u64,
    index: Arc<InvertedIndex>,
}

impl IndexHandle {
    pub fn new(index: InvertedIndex) -> Self {
        Self {
            current: RwLock::new(Published { generation: 0, index: Arc::new(index) }),
            writer: Mutex::new(()),
        }
    }

    pub fn snapshot(&self) -> Arc<InvertedIndex> {
        self.current.read().index.clone()
    }

    /// The current snapshot together with its generation, read atomically.
    pub fn versioned(&self) -> (u64, Arc<InvertedIndex>) {
        let current = self.current.read();
        (current.generation, current.index.clone())
    }

    /// Number of indexes published since construction.
    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    /// Publish `index`, returning it with the generation it was published as.
    pub fn publish(&self, index: InvertedIndex) -> (u64, Arc<InvertedIndex>) {
        let _writer = self.writer.lock();
        self.swap(index)
    }

    /// Build from `documents` and publish. On failure the current index keeps serving.
    pub fn rebuild<I, D>(
        &self,
        builder: &IndexBuilder,
        documents: I,
    ) -> Result<(u64, Arc<InvertedIndex>), BuildError>
    where
        I: IntoIterator<Item = D>,
        D: SourceDocument,
    {
        let _writer = self.writer.lock();
        match builder.build(documents) {
            Ok(index) => Ok(self.swap(index)),
            Err(err) => {
                tracing::warn!(%err, "rebuild rejected, keeping published index");
                Err(err)
            }
        }
    }

    pub fn rebuild_from_store<S: DocumentStore>(
        &self,
        builder: &IndexBuilder,
        store: &S,
    ) -> Result<(u64, Arc<InvertedIndex>), RebuildError> {
        let documents = store.load_documents()?;
        Ok(self.rebuild(builder, documents)?)
    }

    fn swap(&self, index: InvertedIndex) -> (u64, Arc<InvertedIndex>) {
        let index = Arc::new(index);
        let mut current = self.current.write();
        current.generation += 1;
        current.index = index.clone();
        tracing::info!(
            generation = current.generation,
            num_docs = index.num_docs(),
            num_terms = index.num_terms(),
            "index published"
        );
        (current.generation, index)
    }
}
