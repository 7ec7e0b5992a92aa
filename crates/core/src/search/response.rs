use crate::search::MoodHit;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseHit {
    #[serde(rename = "objectID")]
    pub object_id: String,
    #[serde(flatten)]
    pub hit: MoodHit,
}

impl From<MoodHit> for ResponseHit {
    fn from(hit: MoodHit) -> Self {
        Self {
            object_id: hit.id.clone(),
            hit,
        }
    }
}

/// Index-style result envelope, so callers see the same shape whichever
/// strategy answered.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub hits: Vec<ResponseHit>,
    pub nb_hits: usize,
    pub page: u32,
    pub nb_pages: u32,
    pub hits_per_page: usize,
    pub exhaustive_nb_hits: bool,
    pub query: String,
    pub params: String,
}

impl SearchResponse {
    /// Keeps at most `hits_per_page` hits, in order.
    pub fn new(query: &str, mut hits: Vec<MoodHit>, hits_per_page: usize) -> Self {
        hits.truncate(hits_per_page);
        Self {
            nb_hits: hits.len(),
            hits: hits.into_iter().map(ResponseHit::from).collect(),
            page: 0,
            nb_pages: 1,
            hits_per_page,
            exhaustive_nb_hits: true,
            query: query.to_owned(),
            params: format!("query={query}"),
        }
    }
}
