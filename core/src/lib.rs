//! Inverted-index search for documentation sites: tokenize pages, build an
//! immutable index of title and body terms, and answer strict-AND queries
//! ranked by where the terms were found.

pub mod artifact;
pub mod builder;
pub mod config;
pub mod error;
pub mod index;
pub mod persist;
pub mod search;
pub mod snapshot;
pub mod store;
pub mod tokenizer;

pub use builder::{Document, IndexBuilder, SourceDocument};
pub use config::EngineConfig;
pub use error::{BuildError, NotFoundError, PersistError, RebuildError, StoreError};
pub use index::{DocId, DocMeta, Field, InvertedIndex, Posting, TermPostings};
pub use search::{QueryEngine, ScoredDoc, ScoringConfig, SearchHit, BODY_WEIGHT, TITLE_WEIGHT};
pub use snapshot::IndexHandle;
pub use store::{DocumentStore, MemoryStore};
pub use tokenizer::{Tokenizer, TokenizerConfig};
