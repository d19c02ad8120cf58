use crate::error::BuildError;
use crate::index::{DocId, DocMeta, Field, InvertedIndex, TermPostings};
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// A page handed over by a document store. The body is only read during the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub path: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), path: path.into(), title: title.into(), body: body.into() }
    }
}

/// Anything the builder can index.
pub trait SourceDocument {
    fn id(&self) -> &str;
    fn path(&self) -> &str;
    fn title(&self) -> &str;
    fn body(&self) -> Cow<'_, str>;
}

impl SourceDocument for Document {
    fn id(&self) -> &str {
        &self.id
    }
    fn path(&self) -> &str {
        &self.path
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn body(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.body)
    }
}

impl<T: SourceDocument + ?Sized> SourceDocument for &T {
    fn id(&self) -> &str {
        (**self).id()
    }
    fn path(&self) -> &str {
        (**self).path()
    }
    fn title(&self) -> &str {
        (**self).title()
    }
    fn body(&self) -> Cow<'_, str> {
        (**self).body()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    tokenizer: Tokenizer,
}

impl IndexBuilder {
    pub fn new(tokenizer: Tokenizer) -> Self {
        Self { tokenizer }
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Build a complete index or nothing. Document positions follow input order.
    pub fn build<I, D>(&self, documents: I) -> Result<InvertedIndex, BuildError>
    where
        I: IntoIterator<Item = D>,
        D: SourceDocument,
    {
        let mut docs: Vec<DocMeta> = Vec::new();
        let mut ids: HashMap<String, DocId> = HashMap::new();
        let mut postings: BTreeMap<String, TermPostings> = BTreeMap::new();

        for (position, doc) in documents.into_iter().enumerate() {
            if doc.id().is_empty() {
                return Err(BuildError::MissingField { position, field: "id" });
            }
            if doc.path().is_empty() {
                return Err(BuildError::MissingField { position, field: "path" });
            }
            let doc_id = DocId::try_from(position).map_err(|_| BuildError::TooManyDocuments)?;
            if ids.insert(doc.id().to_string(), doc_id).is_some() {
                return Err(BuildError::DuplicateId { id: doc.id().to_string() });
            }

            for term in self.tokenizer.tokenize(doc.title()) {
                postings.entry(term).or_default().insert(doc_id, Field::Title);
            }
            for term in self.tokenizer.tokenize(&doc.body()) {
                postings.entry(term).or_default().insert(doc_id, Field::Body);
            }

            docs.push(DocMeta {
                id: doc.id().to_string(),
                path: doc.path().to_string(),
                title: doc.title().to_string(),
            });
        }

        tracing::info!(num_docs = docs.len(), num_terms = postings.len(), "index built");
        Ok(InvertedIndex::assemble(self.tokenizer.clone(), docs, ids, postings))
    }
}
