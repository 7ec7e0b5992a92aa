mod algolia;
mod fallback;
mod local;
mod response;

use crate::catalog::MoodRecord;
use crate::matcher::ScoredMatch;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub use algolia::AlgoliaSearch;
pub use fallback::{ChainOutcome, FallbackChain};
pub use local::{DefaultMoodSearch, LocalMoodSearch};
pub use response::{ResponseHit, SearchResponse};

pub const DEFAULT_SUPPORT_MESSAGE: &str =
    "I understand how you're feeling. You're not alone in this.";

/// A detected mood as handed to message generation and display.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodHit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub support_message: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl MoodHit {
    pub fn from_record(record: &MoodRecord, score: Option<u32>) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            emoji: record.emoji.clone(),
            support_message: record.support_message.clone(),
            suggestions: record.suggestions.clone(),
            score,
        }
    }

    pub fn support_message_or_default(&self) -> &str {
        if self.support_message.trim().is_empty() {
            DEFAULT_SUPPORT_MESSAGE
        } else {
            &self.support_message
        }
    }
}

impl From<ScoredMatch<'_>> for MoodHit {
    fn from(m: ScoredMatch<'_>) -> Self {
        Self::from_record(m.record, Some(m.score))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Detection {
    /// Best first; never empty.
    Found(Vec<MoodHit>),
    NoMatch,
}

impl Detection {
    pub(crate) fn from_hits(hits: Vec<MoodHit>) -> Self {
        if hits.is_empty() {
            Detection::NoMatch
        } else {
            Detection::Found(hits)
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("search provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    #[error("all mood search strategies exhausted")]
    Exhausted,
}

/// Turn raw query bytes into text. Anything that is not UTF-8 is rejected
/// rather than lossily coerced.
pub fn query_from_bytes(bytes: Vec<u8>) -> Result<String, SearchError> {
    String::from_utf8(bytes).map_err(|e| SearchError::InvalidQuery(e.to_string()))
}

/// One way of turning an utterance into moods. Strategies are tried in order
/// by [`FallbackChain`].
pub trait MoodSearch: Send + Sync {
    fn name(&self) -> &str;

    fn search(&self, query: String) -> BoxFuture<'_, Result<Detection, SearchError>>;
}
