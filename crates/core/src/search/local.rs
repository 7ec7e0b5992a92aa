use crate::catalog::MoodCatalog;
use crate::matcher::MoodMatcher;
use crate::search::{Detection, MoodHit, MoodSearch, SearchError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

/// Keyword scoring against the in-memory catalog. Reports `NoMatch` instead of
/// inventing a default so the chain can decide what comes next.
#[derive(Clone)]
pub struct LocalMoodSearch {
    catalog: Arc<MoodCatalog>,
    matcher: MoodMatcher,
}

impl LocalMoodSearch {
    pub fn new(catalog: Arc<MoodCatalog>, matcher: MoodMatcher) -> Self {
        Self { catalog, matcher }
    }
}

impl MoodSearch for LocalMoodSearch {
    fn name(&self) -> &str {
        "local"
    }

    fn search(&self, query: String) -> BoxFuture<'_, Result<Detection, SearchError>> {
        async move {
            let hits = self
                .matcher
                .rank(&query, &self.catalog)
                .into_iter()
                .map(MoodHit::from)
                .collect();
            Ok(Detection::from_hits(hits))
        }
        .boxed()
    }
}

/// Last resort: always answers with the catalog's default mood.
#[derive(Clone)]
pub struct DefaultMoodSearch {
    catalog: Arc<MoodCatalog>,
}

impl DefaultMoodSearch {
    pub fn new(catalog: Arc<MoodCatalog>) -> Self {
        Self { catalog }
    }
}

impl MoodSearch for DefaultMoodSearch {
    fn name(&self) -> &str {
        "default"
    }

    fn search(&self, _query: String) -> BoxFuture<'_, Result<Detection, SearchError>> {
        async move {
            let hit = MoodHit::from_record(self.catalog.default_record(), Some(0));
            Ok(Detection::Found(vec![hit]))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::record;

    fn catalog() -> Arc<MoodCatalog> {
        Arc::new(
            MoodCatalog::new(vec![
                record("lonely", "Lonely", &["lonely", "isolated"]),
                record("neutral", "Neutral", &["fine"]),
            ])
            .expect("valid catalog"),
        )
    }

    #[tokio::test]
    async fn local_search_returns_scored_hits() {
        let search = LocalMoodSearch::new(catalog(), MoodMatcher::new());
        match search.search("I feel so alone".into()).await.unwrap() {
            Detection::Found(hits) => {
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0].id, "lonely");
                assert_eq!(hits[0].score, Some(7));
            }
            Detection::NoMatch => panic!("expected a hit"),
        }
    }

    #[tokio::test]
    async fn local_search_reports_no_match() {
        let search = LocalMoodSearch::new(catalog(), MoodMatcher::new());
        let detection = search.search("blah blah blah".into()).await.unwrap();
        assert_eq!(detection, Detection::NoMatch);
    }

    #[tokio::test]
    async fn default_search_always_answers_neutral() {
        let search = DefaultMoodSearch::new(catalog());
        let detection = search.search(String::new()).await.unwrap();
        assert_eq!(
            detection,
            Detection::Found(vec![MoodHit {
                id: "neutral".into(),
                name: "Neutral".into(),
                emoji: "🙂".into(),
                support_message: "Neutral support".into(),
                suggestions: Vec::new(),
                score: Some(0),
            }])
        );
    }
}
