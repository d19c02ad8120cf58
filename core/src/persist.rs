use crate::error::PersistError;
use crate::index::{DocMeta, InvertedIndex, TermPostings};
use crate::tokenizer::{Tokenizer, TokenizerConfig};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::fs::{self, create_dir_all, File};
use std::io::Read;
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
    /// Tokenizer the index was built with; queries must use the same one.
    pub tokenizer: TokenizerConfig,
    /// SHA-1 of `docs.bin` as written by the same save.
    pub docs_sha1: String,
    /// SHA-1 of `postings.bin` as written by the same save.
    pub postings_sha1: String,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    pub fn searchindex_js(&self) -> PathBuf { self.root.join("searchindex.js") }
}

/// Write to a sibling temp file, then rename over the target so a concurrent
/// loader sees either the old or the new file.
pub(crate) fn write_replace(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, PersistError> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha1_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha1::digest(bytes))
}

/// Read a payload and check it against the digest recorded in `meta.json`.
fn read_verified(path: &Path, expected_sha1: &str) -> Result<Vec<u8>, PersistError> {
    let bytes = read_bytes(path)?;
    let found = sha1_hex(&bytes);
    if found != expected_sha1 {
        return Err(PersistError::Corrupt(format!(
            "{} does not belong to meta.json (sha1 {found}, expected {expected_sha1})",
            path.display()
        )));
    }
    Ok(bytes)
}

/// Returns the SHA-1 of the written payload.
pub fn save_docs(paths: &IndexPaths, docs: &[DocMeta]) -> Result<String, PersistError> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(docs)?;
    write_replace(&paths.docs(), &bytes)?;
    Ok(sha1_hex(&bytes))
}

pub fn load_docs(paths: &IndexPaths) -> Result<Vec<DocMeta>, PersistError> {
    Ok(bincode::deserialize(&read_bytes(&paths.docs())?)?)
}

/// Returns the SHA-1 of the written payload.
pub fn save_postings<'a, I>(paths: &IndexPaths, terms: I) -> Result<String, PersistError>
where
    I: IntoIterator<Item = (&'a str, &'a TermPostings)>,
{
    create_dir_all(&paths.root)?;
    let postings: BTreeMap<&str, &TermPostings> = terms.into_iter().collect();
    let bytes = bincode::serialize(&postings)?;
    write_replace(&paths.postings(), &bytes)?;
    Ok(sha1_hex(&bytes))
}

pub fn load_postings(paths: &IndexPaths) -> Result<BTreeMap<String, TermPostings>, PersistError> {
    Ok(bincode::deserialize(&read_bytes(&paths.postings())?)?)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<(), PersistError> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_replace(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile, PersistError> {
    let meta: MetaFile = serde_json::from_slice(&read_bytes(&paths.meta())?)?;
    if meta.version != FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion { found: meta.version, expected: FORMAT_VERSION });
    }
    Ok(meta)
}

/// Persist a whole index. `meta.json` is written last and names the digests of
/// the payloads it commits; a loader rejects any payload written by another save.
pub fn save_index(
    paths: &IndexPaths,
    index: &InvertedIndex,
    created_at: &str,
) -> Result<MetaFile, PersistError> {
    let docs_sha1 = save_docs(paths, index.documents())?;
    let postings_sha1 = save_postings(paths, index.terms())?;
    let meta = MetaFile {
        num_docs: index.num_docs() as u32,
        num_terms: index.num_terms() as u32,
        created_at: created_at.to_string(),
        version: FORMAT_VERSION,
        tokenizer: index.tokenizer().config().clone(),
        docs_sha1,
        postings_sha1,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "index saved");
    Ok(meta)
}

/// Load a whole index, refusing payloads that do not match `meta.json`
/// (e.g. a save that is still in progress).
pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex, PersistError> {
    let meta = load_meta(paths)?;
    let docs: Vec<DocMeta> =
        bincode::deserialize(&read_verified(&paths.docs(), &meta.docs_sha1)?)?;
    let postings: BTreeMap<String, TermPostings> =
        bincode::deserialize(&read_verified(&paths.postings(), &meta.postings_sha1)?)?;
    if docs.len() != meta.num_docs as usize || postings.len() != meta.num_terms as usize {
        return Err(PersistError::Corrupt(format!(
            "meta.json announces {} docs / {} terms, found {} / {}",
            meta.num_docs,
            meta.num_terms,
            docs.len(),
            postings.len()
        )));
    }
    InvertedIndex::from_parts(Tokenizer::new(meta.tokenizer), docs, postings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Document, IndexBuilder};

    #[test]
    fn saved_index_loads_back_equal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path().join("idx"));
        let tokenizer = Tokenizer::new(TokenizerConfig { min_term_len: 3, ..Default::default() });
        let index = IndexBuilder::new(tokenizer)
            .build([
                Document::new("about", "about.html", "About", "2d and 3d tracking"),
                Document::new("help", "help.html", "Getting Help", "raise an issue"),
            ])
            .unwrap();
        let meta = save_index(&paths, &index, "2024-01-01T00:00:00Z").unwrap();
        assert_eq!(meta.num_docs, 2);

        let loaded = load_index(&paths).unwrap();
        assert_eq!(loaded, index);
        assert_eq!(loaded.tokenizer().config().min_term_len, 3);
    }

    #[test]
    fn partially_overwritten_index_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let index = IndexBuilder::default()
            .build([
                Document::new("a", "/a", "A", "alpha"),
                Document::new("b", "/b", "B", "beta"),
            ])
            .unwrap();
        save_index(&paths, &index, "").unwrap();

        // a second save that has replaced docs.bin but not yet postings.bin or meta.json
        let newer = vec![
            DocMeta { id: "x".into(), path: "/new-x".into(), title: "X".into() },
            DocMeta { id: "y".into(), path: "/new-y".into(), title: "Y".into() },
        ];
        save_docs(&paths, &newer).unwrap();
        let err = load_index(&paths).unwrap_err();
        assert!(matches!(err, PersistError::Corrupt(ref msg) if msg.contains("docs.bin")), "{err}");

        // once the same save commits its own payloads and meta, loading works again
        let rebuilt = IndexBuilder::default()
            .build([Document::new("x", "/new-x", "X", "gamma"), Document::new("y", "/new-y", "Y", "")])
            .unwrap();
        save_index(&paths, &rebuilt, "").unwrap();
        assert_eq!(load_index(&paths).unwrap(), rebuilt);
    }

    #[test]
    fn stale_postings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let index = IndexBuilder::default().build([Document::new("a", "/a", "A", "alpha")]).unwrap();
        save_index(&paths, &index, "").unwrap();
        let other = IndexBuilder::default().build([Document::new("a", "/a", "A", "omega")]).unwrap();
        save_postings(&paths, other.terms()).unwrap();
        assert!(matches!(load_index(&paths), Err(PersistError::Corrupt(_))));
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(dir.path());
        let index = IndexBuilder::default().build(Vec::<Document>::new()).unwrap();
        let mut meta = save_index(&paths, &index, "").unwrap();
        meta.version = FORMAT_VERSION + 1;
        save_meta(&paths, &meta).unwrap();
        assert!(matches!(load_index(&paths), Err(PersistError::UnsupportedVersion { .. })));
    }
}
