use crate::catalog::{MoodCatalog, MoodRecord};
use crate::config::AlgoliaConfig;
use crate::search::{Detection, MoodHit, MoodSearch, SearchError};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "search::algolia";

/// Hosted index search, the primary mood source.
#[derive(Clone)]
pub struct AlgoliaSearch {
    client: Client,
    app_id: String,
    api_key: String,
    index: String,
    base_url: String,
    filters: Option<String>,
}

impl AlgoliaSearch {
    pub fn new(config: &AlgoliaConfig) -> Self {
        Self {
            client: Client::new(),
            app_id: config.app_id.clone(),
            api_key: config.api_key.expose().to_owned(),
            index: config.index.as_str().to_owned(),
            base_url: format!("https://{}-dsn.algolia.net", config.app_id),
            filters: None,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_filters(mut self, filters: String) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn filters(&self) -> Option<&str> {
        self.filters.as_deref()
    }

    fn index_url(&self, action: &str) -> String {
        format!(
            "{}/1/indexes/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.index),
            action
        )
    }

    fn post(&self, url: &str) -> RequestBuilder {
        self.client
            .post(url)
            .header("X-Algolia-API-Key", &self.api_key)
            .header("X-Algolia-Application-Id", &self.app_id)
    }

    /// Push every catalog record into the index, keyed by mood id. Returns the
    /// number of records sent.
    pub async fn upload_catalog(&self, catalog: &MoodCatalog) -> Result<usize, SearchError> {
        let body = batch_body(catalog);
        let url = self.index_url("batch");

        tracing::info!(target: LOG_TARGET, index = %self.index, records = catalog.len(), "uploading mood catalog");

        let response = self.post(&url).json(&body).send().await?;
        let response = check_status(response).await?;
        let ack: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("failed to parse JSON: {e}")))?;

        tracing::debug!(target: LOG_TARGET, response = %ack, "batch accepted");
        Ok(catalog.len())
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filters: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    hits: Vec<IndexHit>,
}

#[derive(Deserialize)]
struct IndexHit {
    #[serde(rename = "objectID")]
    object_id: Option<String>,
    id: Option<String>,
    name: String,
    #[serde(default)]
    emoji: String,
    #[serde(default)]
    support_message: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

impl IndexHit {
    fn into_mood_hit(self) -> Result<MoodHit, SearchError> {
        let id = self
            .id
            .or(self.object_id)
            .ok_or_else(|| SearchError::InvalidResponse(format!("hit {:?} has no id", self.name)))?;
        Ok(MoodHit {
            id,
            name: self.name,
            emoji: self.emoji,
            support_message: self.support_message,
            suggestions: self.suggestions,
            score: None,
        })
    }
}

#[derive(Serialize)]
struct BatchBody<'a> {
    requests: Vec<BatchRequest<'a>>,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    action: &'static str,
    body: IndexedMood<'a>,
}

#[derive(Serialize)]
struct IndexedMood<'a> {
    #[serde(rename = "objectID")]
    object_id: &'a str,
    #[serde(flatten)]
    record: &'a MoodRecord,
}

fn batch_body(catalog: &MoodCatalog) -> BatchBody<'_> {
    BatchBody {
        requests: catalog
            .records()
            .iter()
            .map(|record| BatchRequest {
                action: "updateObject",
                body: IndexedMood {
                    object_id: &record.id,
                    record,
                },
            })
            .collect(),
    }
}

async fn check_status(response: Response) -> Result<Response, SearchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(SearchError::Api {
        status: status.as_u16(),
        body,
    })
}

fn parse_hits(response: QueryResponse) -> Result<Detection, SearchError> {
    let hits = response
        .hits
        .into_iter()
        .map(IndexHit::into_mood_hit)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Detection::from_hits(hits))
}

impl MoodSearch for AlgoliaSearch {
    fn name(&self) -> &str {
        "algolia"
    }

    fn search(&self, query: String) -> BoxFuture<'_, Result<Detection, SearchError>> {
        async move {
            let request = QueryRequest {
                query: &query,
                filters: self.filters.as_deref(),
            };

            let response = self.post(&self.index_url("query")).json(&request).send().await?;
            let response = match check_status(response).await {
                Ok(response) => response,
                Err(SearchError::Api { status, body }) => {
                    match status {
                        404 => tracing::info!(target: LOG_TARGET, index = %self.index, "index does not exist; run setup-index with an admin key"),
                        400 | 403 => tracing::info!(target: LOG_TARGET, "api key lacks permission for this index"),
                        _ => {}
                    }
                    return Err(SearchError::Api { status, body });
                }
                Err(e) => return Err(e),
            };

            let parsed: QueryResponse = response
                .json()
                .await
                .map_err(|e| SearchError::InvalidResponse(format!("failed to parse JSON: {e}")))?;

            let detection = parse_hits(parsed)?;
            if let Detection::Found(hits) = &detection {
                tracing::debug!(target: LOG_TARGET, hits = hits.len(), top = %hits[0].id, "index search succeeded");
            }
            Ok(detection)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::record;
    use crate::config::{ApiKey, IndexName};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn config() -> AlgoliaConfig {
        AlgoliaConfig {
            app_id: "APP123".to_owned(),
            api_key: ApiKey::new("key").expect("non-empty"),
            index: IndexName::new("my moods").expect("non-empty"),
        }
    }

    /// Answers a single HTTP request with `status` and `body`, handing back the
    /// raw request (lowercased) once the connection is done.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];

            let header_end = loop {
                let n = socket.read(&mut buf).await.expect("read");
                assert!(n > 0, "connection closed before headers");
                raw.extend_from_slice(&buf[..n]);
                if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&raw[..header_end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|v| v.trim().parse::<usize>().expect("numeric length"))
                .unwrap_or(0);
            while raw.len() < header_end + content_length {
                let n = socket.read(&mut buf).await.expect("read");
                assert!(n > 0, "connection closed before body");
                raw.extend_from_slice(&buf[..n]);
            }

            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.expect("write");
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&raw).to_lowercase()
        });

        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn missing_index_surfaces_status_and_body() {
        let (base_url, server) = serve_once("404 Not Found", "missing").await;
        let search = AlgoliaSearch::new(&config()).with_base_url(base_url);

        let err = search.search("so tired".into()).await.unwrap_err();
        match err {
            SearchError::Api { status, body } => {
                assert_eq!(status, 404);
                assert_eq!(body, "missing");
            }
            other => panic!("expected api error, got {other:?}"),
        }

        let request = server.await.expect("server task");
        assert!(request.starts_with("post /1/indexes/my%20moods/query "));
    }

    #[tokio::test]
    async fn query_sends_credentials_and_filters_and_reads_hits() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"hits":[{"objectID":"burnt-out","name":"Burnt Out","emoji":"😴","support_message":"rest","suggestions":["Take a 10-minute break"]}],"nbHits":1}"#,
        )
        .await;
        let search = AlgoliaSearch::new(&config())
            .with_base_url(base_url)
            .with_filters("NOT id:neutral".to_owned());

        match search.search("so tired".into()).await.expect("search") {
            Detection::Found(hits) => {
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0].id, "burnt-out");
                assert_eq!(hits[0].suggestions, vec!["Take a 10-minute break".to_owned()]);
                assert_eq!(hits[0].score, None);
            }
            Detection::NoMatch => panic!("expected a hit"),
        }

        let request = server.await.expect("server task");
        assert!(request.contains("x-algolia-api-key: key\r\n"));
        assert!(request.contains("x-algolia-application-id: app123\r\n"));
        assert!(request.contains(r#""query":"so tired""#));
        assert!(request.contains(r#""filters":"not id:neutral""#));
    }

    #[tokio::test]
    async fn empty_index_answer_is_no_match() {
        let (base_url, server) = serve_once("200 OK", r#"{"hits":[]}"#).await;
        let search = AlgoliaSearch::new(&config()).with_base_url(base_url);

        assert_eq!(
            search.search("blah".into()).await.expect("search"),
            Detection::NoMatch
        );
        assert!(!server.await.expect("server task").contains("filters"));
    }

    #[tokio::test]
    async fn upload_posts_batch_and_counts_records() {
        let (base_url, server) =
            serve_once("200 OK", r#"{"taskID":1,"objectIDs":["sad","neutral"]}"#).await;
        let catalog = MoodCatalog::new(vec![
            record("sad", "Sad", &["down"]),
            record("neutral", "Neutral", &[]),
        ])
        .expect("valid catalog");
        let search = AlgoliaSearch::new(&config()).with_base_url(base_url);

        assert_eq!(search.upload_catalog(&catalog).await.expect("upload"), 2);

        let request = server.await.expect("server task");
        assert!(request.starts_with("post /1/indexes/my%20moods/batch "));
        assert!(request.contains(r#""action":"updateobject""#));
        assert!(request.contains(r#""objectid":"sad""#));
    }

    #[tokio::test]
    async fn rejected_upload_is_an_api_error() {
        let (base_url, _server) = serve_once(
            "403 Forbidden",
            r#"{"message":"Method not allowed with this API key"}"#,
        )
        .await;
        let catalog =
            MoodCatalog::new(vec![record("neutral", "Neutral", &[])]).expect("valid catalog");
        let search = AlgoliaSearch::new(&config()).with_base_url(base_url);

        assert!(matches!(
            search.upload_catalog(&catalog).await,
            Err(SearchError::Api { status: 403, .. })
        ));
    }

    #[test]
    fn urls_are_derived_from_app_id_and_index() {
        let search = AlgoliaSearch::new(&config());
        assert_eq!(
            search.index_url("query"),
            "https://APP123-dsn.algolia.net/1/indexes/my%20moods/query"
        );

        let local = search.with_base_url("http://127.0.0.1:9000/".to_owned());
        assert_eq!(
            local.index_url("batch"),
            "http://127.0.0.1:9000/1/indexes/my%20moods/batch"
        );
    }

    #[test]
    fn query_request_omits_missing_filters() {
        let body = serde_json::to_value(QueryRequest {
            query: "so tired",
            filters: None,
        })
        .expect("serializable");
        assert_eq!(body, serde_json::json!({ "query": "so tired" }));
    }

    #[test]
    fn hits_prefer_id_and_fall_back_to_object_id() {
        let raw = serde_json::json!({
            "hits": [
                { "objectID": "sad", "name": "Sad", "emoji": "😔", "support_message": "hey" },
                { "objectID": "x", "id": "angry", "name": "Angry" }
            ],
            "nbHits": 2
        });
        let parsed: QueryResponse = serde_json::from_value(raw).expect("valid response");

        match parse_hits(parsed).expect("hits") {
            Detection::Found(hits) => {
                assert_eq!(hits[0].id, "sad");
                assert_eq!(hits[0].support_message, "hey");
                assert_eq!(hits[1].id, "angry");
                assert_eq!(hits[1].emoji, "");
                assert!(hits.iter().all(|h| h.score.is_none()));
            }
            Detection::NoMatch => panic!("expected hits"),
        }
    }

    #[test]
    fn zero_hits_is_no_match() {
        let parsed: QueryResponse =
            serde_json::from_value(serde_json::json!({ "hits": [] })).expect("valid response");
        assert_eq!(parse_hits(parsed).expect("ok"), Detection::NoMatch);
    }

    #[test]
    fn hit_without_any_id_is_invalid() {
        let parsed: QueryResponse =
            serde_json::from_value(serde_json::json!({ "hits": [{ "name": "Sad" }] }))
                .expect("valid response");
        assert!(matches!(
            parse_hits(parsed),
            Err(SearchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn batch_body_keys_records_by_mood_id() {
        let catalog = MoodCatalog::new(vec![
            record("sad", "Sad", &["down"]),
            record("neutral", "Neutral", &[]),
        ])
        .expect("valid catalog");

        let body = serde_json::to_value(batch_body(&catalog)).expect("serializable");
        let requests = body["requests"].as_array().expect("array");
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["action"], "updateObject");
        assert_eq!(requests[0]["body"]["objectID"], "sad");
        assert_eq!(requests[0]["body"]["id"], "sad");
        assert_eq!(requests[0]["body"]["keywords"], serde_json::json!(["down"]));
        assert_eq!(requests[1]["body"]["objectID"], "neutral");
    }
}
