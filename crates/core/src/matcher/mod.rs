//! Local keyword-overlap scoring of free text against the mood catalog.
//!
//! Used when the hosted index is unreachable or has nothing for a query. Every
//! record is scored additively:
//!
//! - `+10` per keyword where the query contains the keyword or the keyword contains the query
//! - `+5` per (keyword, query word) pair where either contains the other; words of two
//!   characters or fewer are ignored
//! - `+8` when the query and the mood name contain one another
//! - `+7` per colloquial trigger in the query that points at the mood's id
//!
//! Records scoring zero are dropped. The rest are sorted by score, ties kept in
//! catalog order, and cut to the configured top-N.

mod colloquial;

use crate::catalog::{MoodCatalog, MoodRecord};

pub use crate::config::DEFAULT_TOP_N;

const LOG_TARGET: &str = "matcher";

const KEYWORD_SCORE: u32 = 10;
const WORD_SCORE: u32 = 5;
const NAME_SCORE: u32 = 8;
const HINT_SCORE: u32 = 7;
const MIN_WORD_CHARS: usize = 3;

#[derive(Clone, Debug)]
pub struct MatcherConfig {
    /// Maximum number of matches returned. Values below 1 are treated as 1.
    pub top_n: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoredMatch<'a> {
    pub record: &'a MoodRecord,
    pub score: u32,
}

struct NormalizedQuery<'q> {
    full: &'q str,
    words: Vec<&'q str>,
}

impl<'q> NormalizedQuery<'q> {
    fn new(lower: &'q str) -> Self {
        let words = lower
            .split_whitespace()
            .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
            .collect();
        Self { full: lower, words }
    }
}

fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

#[derive(Clone, Debug, Default)]
pub struct MoodMatcher {
    config: MatcherConfig,
}

impl MoodMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        Self { config }
    }

    pub fn top_n(&self) -> usize {
        self.config.top_n.max(1)
    }

    /// Score a single record. A blank query scores zero against everything.
    pub fn score(&self, query: &str, record: &MoodRecord) -> u32 {
        let lower = query.to_lowercase();
        if lower.trim().is_empty() {
            return 0;
        }
        score_record(&NormalizedQuery::new(&lower), record)
    }

    /// Records with a positive score, best first, at most `top_n`. Empty when
    /// nothing in the catalog overlaps the query.
    pub fn rank<'a>(&self, query: &str, catalog: &'a MoodCatalog) -> Vec<ScoredMatch<'a>> {
        let lower = query.to_lowercase();
        if lower.trim().is_empty() {
            tracing::debug!(target: LOG_TARGET, "blank query, nothing to rank");
            return Vec::new();
        }

        let normalized = NormalizedQuery::new(&lower);
        let mut matches: Vec<ScoredMatch<'a>> = catalog
            .records()
            .iter()
            .map(|record| ScoredMatch {
                record,
                score: score_record(&normalized, record),
            })
            .filter(|m| m.score > 0)
            .collect();

        // stable: equal scores keep catalog order
        matches.sort_by(|a, b| b.score.cmp(&a.score));

        tracing::debug!(
            target: LOG_TARGET,
            query = %lower,
            scores = ?matches.iter().map(|m| (m.record.id.as_str(), m.score)).collect::<Vec<_>>(),
            "mood scores"
        );

        matches.truncate(self.top_n());
        matches
    }

    /// Like [`rank`](Self::rank), but never empty: when nothing scores, the
    /// catalog's default mood is returned alone with a score of zero.
    pub fn match_query<'a>(&self, query: &str, catalog: &'a MoodCatalog) -> Vec<ScoredMatch<'a>> {
        let matches = self.rank(query, catalog);
        if !matches.is_empty() {
            return matches;
        }

        let fallback = catalog.default_record();
        tracing::debug!(target: LOG_TARGET, mood = %fallback.id, "no matches, using default mood");
        vec![ScoredMatch {
            record: fallback,
            score: 0,
        }]
    }
}

fn score_record(query: &NormalizedQuery<'_>, record: &MoodRecord) -> u32 {
    let mut score = 0;

    for keyword in &record.keywords {
        let keyword = keyword.to_lowercase();
        if overlaps(query.full, &keyword) {
            score += KEYWORD_SCORE;
        }
        for word in &query.words {
            if overlaps(&keyword, word) {
                score += WORD_SCORE;
            }
        }
    }

    if overlaps(query.full, &record.name.to_lowercase()) {
        score += NAME_SCORE;
    }

    score + HINT_SCORE * colloquial::hint_count(query.full, &record.id)
}
