use crate::error::PersistError;
use crate::search::ScoringConfig;
use crate::tokenizer::TokenizerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables shared by the indexer and the server, usually read from a JSON file.
/// Missing keys fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tokenizer: TokenizerConfig,
    pub scoring: ScoringConfig,
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, PersistError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
