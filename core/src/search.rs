use crate::index::{DocId, InvertedIndex, TermPostings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score contributed by a query term found in a document title.
pub const TITLE_WEIGHT: u32 = 2;
/// Score contributed by a query term found in a document body.
pub const BODY_WEIGHT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub title_weight: u32,
    pub body_weight: u32,
    /// Let the last query term match every indexed term it is a prefix of.
    pub prefix_last_term: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { title_weight: TITLE_WEIGHT, body_weight: BODY_WEIGHT, prefix_last_term: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: u32,
}

/// A ranked result resolved against the document table, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub id: String,
    pub path: String,
    pub title: String,
    pub score: u32,
}

/// Strict-AND ranked search over one index snapshot. Never mutates the index.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    scoring: ScoringConfig,
}

impl QueryEngine {
    pub fn new(scoring: ScoringConfig) -> Self {
        Self { scoring }
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// Rank every document containing all query terms (in either field).
    /// Ordered by descending score, then by registration position.
    pub fn search(&self, index: &InvertedIndex, query: &str) -> Vec<ScoredDoc> {
        let terms = index.tokenizer().tokenize(query);
        if terms.is_empty() {
            return Vec::new();
        }

        let last = terms.len() - 1;
        let mut per_term: Vec<BTreeMap<DocId, u32>> = Vec::with_capacity(terms.len());
        for (i, term) in terms.iter().enumerate() {
            let contributions = if i == last && self.scoring.prefix_last_term {
                self.prefix_contributions(index, term)
            } else {
                self.contributions(index.postings_for(term))
            };
            if contributions.is_empty() {
                tracing::debug!(term = %term, "query term has no postings");
                return Vec::new();
            }
            per_term.push(contributions);
        }

        // intersect starting from the rarest term
        per_term.sort_by_key(|c| c.len());
        let mut per_term = per_term.into_iter();
        let mut scores = match per_term.next() {
            Some(first) => first,
            None => return Vec::new(),
        };
        for contributions in per_term {
            scores.retain(|doc_id, score| match contributions.get(doc_id) {
                Some(c) => {
                    *score += c;
                    true
                }
                None => false,
            });
            if scores.is_empty() {
                break;
            }
        }

        let mut ranked: Vec<ScoredDoc> =
            scores.into_iter().map(|(doc_id, score)| ScoredDoc { doc_id, score }).collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
        tracing::debug!(query, terms = terms.len(), hits = ranked.len(), "search");
        ranked
    }

    /// Attach document metadata to ranked results. Stale references are dropped.
    pub fn resolve(&self, index: &InvertedIndex, ranked: &[ScoredDoc]) -> Vec<SearchHit> {
        ranked
            .iter()
            .filter_map(|r| match index.metadata_for(r.doc_id) {
                Ok(meta) => Some(SearchHit {
                    doc_id: r.doc_id,
                    id: meta.id.clone(),
                    path: meta.path.clone(),
                    title: meta.title.clone(),
                    score: r.score,
                }),
                Err(err) => {
                    tracing::debug!(%err, "dropping stale result");
                    None
                }
            })
            .collect()
    }

    pub fn search_hits(&self, index: &InvertedIndex, query: &str) -> Vec<SearchHit> {
        let ranked = self.search(index, query);
        self.resolve(index, &ranked)
    }

    fn contributions(&self, postings: &TermPostings) -> BTreeMap<DocId, u32> {
        let mut out = BTreeMap::new();
        for &doc_id in &postings.title_docs {
            *out.entry(doc_id).or_insert(0) += self.scoring.title_weight;
        }
        for &doc_id in &postings.body_docs {
            *out.entry(doc_id).or_insert(0) += self.scoring.body_weight;
        }
        out
    }

    /// Union of all terms starting with `prefix`; a document scores each field once.
    fn prefix_contributions(&self, index: &InvertedIndex, prefix: &str) -> BTreeMap<DocId, u32> {
        let mut merged = TermPostings::default();
        for (_, postings) in index.postings_with_prefix(prefix) {
            merged.title_docs.extend(postings.title_docs.iter().copied());
            merged.body_docs.extend(postings.body_docs.iter().copied());
        }
        self.contributions(&merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Document, IndexBuilder};

    fn napari_docs() -> Vec<Document> {
        vec![
            Document::new("1", "/quickstart", "Quick start", "napari plugin guide"),
            Document::new("2", "/guide", "Guide", "napari tracking quick filter"),
        ]
    }

    fn scored(pairs: &[(DocId, u32)]) -> Vec<ScoredDoc> {
        pairs.iter().map(|&(doc_id, score)| ScoredDoc { doc_id, score }).collect()
    }

    #[test]
    fn title_hits_outrank_body_hits() {
        let index = IndexBuilder::default().build(napari_docs()).unwrap();
        let engine = QueryEngine::default();
        assert_eq!(engine.search(&index, "quick"), scored(&[(0, 2), (1, 1)]));
        assert_eq!(engine.search(&index, "napari quick"), scored(&[(0, 3), (1, 2)]));
        assert!(engine.search(&index, "zzz").is_empty());
    }

    #[test]
    fn term_in_both_fields_scores_both() {
        let index = IndexBuilder::default()
            .build([Document::new("g", "/g", "Guide", "a short guide")])
            .unwrap();
        let engine = QueryEngine::default();
        assert_eq!(engine.search(&index, "GUIDE"), scored(&[(0, 3)]));
    }

    #[test]
    fn ties_break_by_registration_order() {
        let index = IndexBuilder::default()
            .build([
                Document::new("z", "/z", "Other", "tracking"),
                Document::new("a", "/a", "Other", "tracking"),
            ])
            .unwrap();
        let engine = QueryEngine::default();
        assert_eq!(engine.search(&index, "tracking"), scored(&[(0, 1), (1, 1)]));
    }

    #[test]
    fn custom_weights_apply() {
        let index = IndexBuilder::default().build(napari_docs()).unwrap();
        let engine = QueryEngine::new(ScoringConfig { title_weight: 5, body_weight: 3, ..Default::default() });
        assert_eq!(engine.search(&index, "quick"), scored(&[(0, 5), (1, 3)]));
    }

    #[test]
    fn prefix_matching_applies_to_last_term_only() {
        let index = IndexBuilder::default()
            .build([
                Document::new("a", "/a", "Tracker", "tracking tracks"),
                Document::new("b", "/b", "Filters", "track filter"),
            ])
            .unwrap();
        let exact = QueryEngine::default();
        assert!(exact.search(&index, "trac").is_empty());

        let prefix = QueryEngine::new(ScoringConfig { prefix_last_term: true, ..Default::default() });
        // doc a: tracker(title) + tracking/tracks(body) counted once per field
        assert_eq!(prefix.search(&index, "trac"), scored(&[(0, 3), (1, 1)]));
        assert!(prefix.search(&index, "trac filt").is_empty());
        // track(body) + filter(body) and filters(title)
        assert_eq!(prefix.search(&index, "track filt"), scored(&[(1, 4)]));
    }

    #[test]
    fn resolve_attaches_metadata_and_skips_stale_rows() {
        let index = IndexBuilder::default().build(napari_docs()).unwrap();
        let engine = QueryEngine::default();
        let hits = engine.resolve(&index, &scored(&[(1, 4), (9, 3)]));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].path, "/guide");
        assert_eq!(hits[0].title, "Guide");
        assert_eq!(hits[0].score, 4);
    }
}
