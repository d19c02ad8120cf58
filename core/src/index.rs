use crate::error::{BuildError, NotFoundError, PersistError};
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Bound;

/// Position of a document in registration order. Stable for the lifetime of one build.
pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMeta {
    /// Stable external identifier, e.g. a page name.
    pub id: String,
    /// Logical location / URL fragment of the page.
    pub path: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Posting {
    pub doc_id: DocId,
    pub field: Field,
}

/// Documents containing one term, split by field. Presence only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermPostings {
    pub title_docs: BTreeSet<DocId>,
    pub body_docs: BTreeSet<DocId>,
}

static NO_POSTINGS: TermPostings = TermPostings {
    title_docs: BTreeSet::new(),
    body_docs: BTreeSet::new(),
};

impl TermPostings {
    pub fn docs(&self, field: Field) -> &BTreeSet<DocId> {
        match field {
            Field::Title => &self.title_docs,
            Field::Body => &self.body_docs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title_docs.is_empty() && self.body_docs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Posting> + '_ {
        let title = self.title_docs.iter().map(|&doc_id| Posting { doc_id, field: Field::Title });
        let body = self.body_docs.iter().map(|&doc_id| Posting { doc_id, field: Field::Body });
        title.chain(body)
    }

    pub(crate) fn insert(&mut self, doc_id: DocId, field: Field) {
        match field {
            Field::Title => self.title_docs.insert(doc_id),
            Field::Body => self.body_docs.insert(doc_id),
        };
    }
}

/// An immutable, fully built index. Only the builder and the loaders create one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvertedIndex {
    tokenizer: Tokenizer,
    docs: Vec<DocMeta>,
    ids: HashMap<String, DocId>,
    postings: BTreeMap<String, TermPostings>,
}

impl InvertedIndex {
    pub fn empty(tokenizer: Tokenizer) -> Self {
        Self { tokenizer, docs: Vec::new(), ids: HashMap::new(), postings: BTreeMap::new() }
    }

    /// Assemble an index from parts that are already known to be consistent.
    pub(crate) fn assemble(
        tokenizer: Tokenizer,
        docs: Vec<DocMeta>,
        ids: HashMap<String, DocId>,
        postings: BTreeMap<String, TermPostings>,
    ) -> Self {
        Self { tokenizer, docs, ids, postings }
    }

    /// Assemble an index from untrusted parts (e.g. read back from disk),
    /// checking every invariant the builder guarantees.
    pub fn from_parts(
        tokenizer: Tokenizer,
        docs: Vec<DocMeta>,
        postings: BTreeMap<String, TermPostings>,
    ) -> Result<Self, PersistError> {
        if DocId::try_from(docs.len()).is_err() {
            return Err(BuildError::TooManyDocuments.into());
        }
        let mut ids = HashMap::with_capacity(docs.len());
        for (position, doc) in docs.iter().enumerate() {
            if doc.id.is_empty() {
                return Err(BuildError::MissingField { position, field: "id" }.into());
            }
            if doc.path.is_empty() {
                return Err(BuildError::MissingField { position, field: "path" }.into());
            }
            if ids.insert(doc.id.clone(), position as DocId).is_some() {
                return Err(BuildError::DuplicateId { id: doc.id.clone() }.into());
            }
        }
        let num_docs = docs.len() as DocId;
        for (term, plist) in &postings {
            if let Some(p) = plist.iter().find(|p| p.doc_id >= num_docs) {
                return Err(PersistError::Corrupt(format!(
                    "term {term:?} references document {} of {num_docs}",
                    p.doc_id
                )));
            }
        }
        Ok(Self { tokenizer, docs, ids, postings })
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Document table in registration order; the slice index is the `DocId`.
    pub fn documents(&self) -> &[DocMeta] {
        &self.docs
    }

    /// Terms in lexicographic order with their postings.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermPostings)> + '_ {
        self.postings.iter().map(|(t, p)| (t.as_str(), p))
    }

    /// Postings of an already normalized term. Unknown terms yield an empty set.
    pub fn postings_for(&self, term: &str) -> &TermPostings {
        self.postings.get(term).unwrap_or(&NO_POSTINGS)
    }

    /// Every indexed term starting with `prefix`, in lexicographic order.
    pub fn postings_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a TermPostings)> + 'a {
        self.postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(term, _)| term.starts_with(prefix))
            .map(|(t, p)| (t.as_str(), p))
    }

    pub fn metadata_for(&self, doc_id: DocId) -> Result<&DocMeta, NotFoundError> {
        self.docs.get(doc_id as usize).ok_or(NotFoundError::Position(doc_id))
    }

    pub fn doc_id_of(&self, id: &str) -> Option<DocId> {
        self.ids.get(id).copied()
    }

    pub fn metadata_by_id(&self, id: &str) -> Result<&DocMeta, NotFoundError> {
        self.doc_id_of(id)
            .and_then(|doc_id| self.docs.get(doc_id as usize))
            .ok_or_else(|| NotFoundError::Id(id.to_string()))
    }
}
