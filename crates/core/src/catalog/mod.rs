use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const DEFAULT_MOOD_ID: &str = "neutral";

const BUILTIN_MOODS_JSON: &str = include_str!("../../data/moods.json");

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodRecord {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub keywords: Vec<String>,
    pub support_message: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("mood catalog is empty")]
    Empty,
    #[error("duplicate mood id: {0}")]
    DuplicateId(String),
    #[error("mood catalog has no \"neutral\" record")]
    MissingDefault,
    #[error("mood {0} has no keywords")]
    NoKeywords(String),
    #[error("mood {0} has a blank keyword")]
    BlankKeyword(String),
    #[error("mood {0} has a blank name")]
    BlankName(String),
    #[error("failed to read mood catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse mood catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk shapes accepted by the loader: the `{"moods": [...]}` wrapper or a bare list.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { moods: Vec<MoodRecord> },
    Bare(Vec<MoodRecord>),
}

impl CatalogFile {
    fn into_records(self) -> Vec<MoodRecord> {
        match self {
            CatalogFile::Wrapped { moods } => moods,
            CatalogFile::Bare(moods) => moods,
        }
    }
}

/// Immutable, validated set of moods. Insertion order is kept and is the
/// tie-break order for ranking.
#[derive(Clone, Debug)]
pub struct MoodCatalog {
    records: Vec<MoodRecord>,
    default_idx: usize,
}

impl MoodCatalog {
    pub fn new(records: Vec<MoodRecord>) -> Result<Self, CatalogError> {
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id.as_str()) {
                return Err(CatalogError::DuplicateId(record.id.clone()));
            }
            if record.id != DEFAULT_MOOD_ID && record.keywords.is_empty() {
                return Err(CatalogError::NoKeywords(record.id.clone()));
            }
            // an empty string is contained in every query
            if record.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(CatalogError::BlankKeyword(record.id.clone()));
            }
            if record.name.trim().is_empty() {
                return Err(CatalogError::BlankName(record.id.clone()));
            }
        }

        let default_idx = records
            .iter()
            .position(|r| r.id == DEFAULT_MOOD_ID)
            .ok_or(CatalogError::MissingDefault)?;

        Ok(Self {
            records,
            default_idx,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.into_records())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), moods = catalog.len(), "mood catalog loaded");
        Ok(catalog)
    }

    /// The catalog bundled with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_MOODS_JSON)
    }

    pub fn records(&self) -> &[MoodRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&MoodRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn default_record(&self) -> &MoodRecord {
        &self.records[self.default_idx]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn record(id: &str, name: &str, keywords: &[&str]) -> MoodRecord {
    MoodRecord {
        id: id.to_owned(),
        name: name.to_owned(),
        emoji: "🙂".to_owned(),
        keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
        support_message: format!("{name} support"),
        suggestions: Vec::new(),
    }
}
