use crate::catalog::MoodCatalog;
use crate::matcher::MoodMatcher;
use crate::search::{DefaultMoodSearch, Detection, LocalMoodSearch, MoodHit, MoodSearch, SearchError};
use std::sync::Arc;

const LOG_TARGET: &str = "search::fallback";

/// Result of a chain run: the hits plus the strategy that produced them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainOutcome {
    strategy: String,
    hits: Vec<MoodHit>,
}

impl ChainOutcome {
    /// Only built from a non-empty `Found`.
    fn new(strategy: &str, hits: Vec<MoodHit>) -> Self {
        debug_assert!(!hits.is_empty());
        Self {
            strategy: strategy.to_owned(),
            hits,
        }
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// The detected mood.
    pub fn top(&self) -> &MoodHit {
        &self.hits[0]
    }

    pub fn hits(&self) -> &[MoodHit] {
        &self.hits
    }

    pub fn into_hits(self) -> Vec<MoodHit> {
        self.hits
    }
}

/// Ordered list of mood sources. Each is asked in turn; errors and empty
/// answers move on to the next one.
#[derive(Default)]
pub struct FallbackChain {
    strategies: Vec<Box<dyn MoodSearch>>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(mut self, strategy: impl MoodSearch + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Hosted index (when given), then local scoring, then the default mood.
    pub fn standard(
        catalog: Arc<MoodCatalog>,
        matcher: MoodMatcher,
        primary: Option<Box<dyn MoodSearch>>,
    ) -> Self {
        let mut chain = Self::new();
        if let Some(primary) = primary {
            chain.strategies.push(primary);
        }
        chain
            .with_strategy(LocalMoodSearch::new(catalog.clone(), matcher))
            .with_strategy(DefaultMoodSearch::new(catalog))
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn detect(&self, query: &str) -> Result<ChainOutcome, SearchError> {
        for strategy in &self.strategies {
            match strategy.search(query.to_owned()).await {
                Ok(Detection::Found(hits)) if !hits.is_empty() => {
                    tracing::info!(
                        target: LOG_TARGET,
                        strategy = strategy.name(),
                        mood = %hits[0].id,
                        "mood detected"
                    );
                    return Ok(ChainOutcome::new(strategy.name(), hits));
                }
                Ok(_) => {
                    tracing::debug!(target: LOG_TARGET, strategy = strategy.name(), "no match, trying next strategy");
                }
                Err(e) => {
                    tracing::warn!(target: LOG_TARGET, strategy = strategy.name(), "search failed, trying next strategy: {e}");
                }
            }
        }
        Err(SearchError::Exhausted)
    }
}
