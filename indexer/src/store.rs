use docsearch_core::{Document, DocumentStore, StoreError};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    /// Missing paths are left empty and rejected by the build.
    #[serde(default, alias = "url")]
    path: String,
}

impl From<InputDoc> for Document {
    fn from(d: InputDoc) -> Self {
        Document { id: d.id, path: d.path, title: d.title, body: d.body }
    }
}

/// Documents exported as `.json` (one object or an array) or `.jsonl` files,
/// from a single file or a directory tree. Files are read in path order.
pub struct JsonFileStore {
    input: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self { input: input.as_ref().to_path_buf() }
    }

    fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::new();
        if self.input.is_dir() {
            for entry in WalkDir::new(&self.input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
                let p = entry.path();
                if p.is_file() {
                    if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                        if matches!(ext, "json" | "jsonl") {
                            files.push(p.to_path_buf());
                        }
                    }
                }
            }
        } else if self.input.is_file() {
            files.push(self.input.clone());
        }
        files
    }
}

impl DocumentStore for JsonFileStore {
    type Doc = Document;

    fn load_documents(&self) -> Result<Vec<Document>, StoreError> {
        let mut docs = Vec::new();
        for file in self.files() {
            if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                read_jsonl(&file, &mut docs)?;
            } else {
                read_json(&file, &mut docs)?;
            }
        }
        tracing::info!(input = %self.input.display(), num_docs = docs.len(), "documents loaded");
        Ok(docs)
    }
}

fn parse_error(file: &Path, line: Option<usize>) -> impl FnOnce(serde_json::Error) -> StoreError + '_ {
    move |source| StoreError::Parse {
        origin: match line {
            Some(n) => format!("{}:{}", file.display(), n),
            None => file.display().to_string(),
        },
        source,
    }
}

fn read_jsonl(file: &Path, docs: &mut Vec<Document>) -> Result<(), StoreError> {
    let reader = BufReader::new(File::open(file)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line).map_err(parse_error(file, Some(n + 1)))?;
        docs.push(doc.into());
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<Document>) -> Result<(), StoreError> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader).map_err(parse_error(file, None))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v).map_err(parse_error(file, None))?;
                docs.push(doc.into());
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json).map_err(parse_error(file, None))?;
            docs.push(doc.into());
        }
        _ => tracing::warn!(file = %file.display(), "skipping json file without documents"),
    }
    Ok(())
}
