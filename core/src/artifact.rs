//! The `searchindex.js` layout consumed by in-browser search pages:
//! `Search.setIndex({...})` around a JSON object holding the document table
//! as parallel arrays and one term map per field. A term that hits exactly
//! one document stores a bare position instead of a one-element list.

use crate::error::PersistError;
use crate::index::{DocId, DocMeta, Field, InvertedIndex, TermPostings};
use crate::persist::write_replace;
use crate::tokenizer::Tokenizer;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const JS_PREFIX: &str = "Search.setIndex(";
const JS_SUFFIX: &str = ")";

lazy_static! {
    // a whole string literal, or a bare object key right after `{` or `,`
    static ref BARE_KEY: Regex =
        Regex::new(r#""(?:[^"\\]|\\.)*"|([{,]\s*)([A-Za-z0-9_$][A-Za-z0-9_$]*)(\s*:)"#)
            .expect("valid regex");
}

/// Quote the unquoted keys of a JavaScript object literal so it parses as JSON.
/// String literals are matched whole and left untouched.
fn quote_bare_keys(src: &str) -> std::borrow::Cow<'_, str> {
    BARE_KEY.replace_all(src, |caps: &Captures| match caps.get(2) {
        Some(key) => format!("{}\"{}\"{}", &caps[1], key.as_str(), &caps[3]),
        None => caps[0].to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocRefs {
    One(DocId),
    Many(Vec<DocId>),
}

impl DocRefs {
    fn from_set(docs: &BTreeSet<DocId>) -> Option<Self> {
        match docs.len() {
            0 => None,
            1 => docs.iter().next().map(|&d| DocRefs::One(d)),
            _ => Some(DocRefs::Many(docs.iter().copied().collect())),
        }
    }

    fn iter(&self) -> impl Iterator<Item = DocId> + '_ {
        let slice = match self {
            DocRefs::One(d) => std::slice::from_ref(d),
            DocRefs::Many(ds) => ds.as_slice(),
        };
        slice.iter().copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndexFile {
    pub docnames: Vec<String>,
    pub filenames: Vec<String>,
    pub titles: Vec<String>,
    /// Body term map.
    #[serde(default)]
    pub terms: BTreeMap<String, DocRefs>,
    /// Title term map.
    #[serde(default)]
    pub titleterms: BTreeMap<String, DocRefs>,
}

impl SearchIndexFile {
    pub fn from_index(index: &InvertedIndex) -> Self {
        let docs = index.documents();
        let mut terms = BTreeMap::new();
        let mut titleterms = BTreeMap::new();
        for (term, postings) in index.terms() {
            if let Some(refs) = DocRefs::from_set(postings.docs(Field::Body)) {
                terms.insert(term.to_string(), refs);
            }
            if let Some(refs) = DocRefs::from_set(postings.docs(Field::Title)) {
                titleterms.insert(term.to_string(), refs);
            }
        }
        Self {
            docnames: docs.iter().map(|d| d.id.clone()).collect(),
            filenames: docs.iter().map(|d| d.path.clone()).collect(),
            titles: docs.iter().map(|d| d.title.clone()).collect(),
            terms,
            titleterms,
        }
    }

    /// Rebuild the typed index. The artifact does not record tokenizer
    /// settings, so the caller supplies the one queries should use.
    pub fn into_index(self, tokenizer: Tokenizer) -> Result<InvertedIndex, PersistError> {
        let n = self.docnames.len();
        if self.filenames.len() != n || self.titles.len() != n {
            return Err(PersistError::Corrupt(format!(
                "document table lengths differ: {} names, {} files, {} titles",
                n,
                self.filenames.len(),
                self.titles.len()
            )));
        }
        let docs: Vec<DocMeta> = self
            .docnames
            .into_iter()
            .zip(self.filenames)
            .zip(self.titles)
            .map(|((id, path), title)| DocMeta { id, path, title })
            .collect();

        let mut postings: BTreeMap<String, TermPostings> = BTreeMap::new();
        for (field, map) in [(Field::Body, self.terms), (Field::Title, self.titleterms)] {
            for (term, refs) in map {
                let entry = postings.entry(term).or_default();
                for doc_id in refs.iter() {
                    entry.insert(doc_id, field);
                }
            }
        }
        InvertedIndex::from_parts(tokenizer, docs, postings)
    }

    pub fn to_js(&self) -> Result<String, PersistError> {
        Ok(format!("{}{}{}", JS_PREFIX, serde_json::to_string(self)?, JS_SUFFIX))
    }

    /// Parse a `Search.setIndex(...)` wrapper (or a bare object). Keys may be
    /// bare identifiers as generators emit them; unknown keys are ignored.
    pub fn from_js(src: &str) -> Result<Self, PersistError> {
        let trimmed = src.trim().trim_end_matches(';').trim_end();
        let json = match trimmed.strip_prefix(JS_PREFIX) {
            Some(rest) => rest.strip_suffix(JS_SUFFIX).ok_or_else(|| {
                PersistError::Corrupt("unterminated Search.setIndex call".into())
            })?,
            None => trimmed,
        };
        Ok(serde_json::from_str(&quote_bare_keys(json))?)
    }
}

pub fn export_js(path: &Path, index: &InvertedIndex) -> Result<(), PersistError> {
    let js = SearchIndexFile::from_index(index).to_js()?;
    write_replace(path, js.as_bytes())?;
    tracing::info!(path = %path.display(), bytes = js.len(), "searchindex.js exported");
    Ok(())
}

pub fn import_js(path: &Path, tokenizer: Tokenizer) -> Result<InvertedIndex, PersistError> {
    let src = std::fs::read_to_string(path)?;
    SearchIndexFile::from_js(&src)?.into_index(tokenizer)
}
