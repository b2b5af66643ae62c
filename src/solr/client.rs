//! HTTP client for the Solr request handler.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{BackendError, Row, SearchBackend, SolrPage, SolrQuery};

/// Solr client bound to one core and request handler.
#[derive(Clone)]
pub struct SolrClient {
    client: Client,
    base_url: String,
    handler: String,
}

impl SolrClient {
    pub fn new(base_url: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            handler: handler.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.handler)
    }
}

/// Flatten a query into Solr request parameters.
fn query_params(query: &SolrQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", query.q.clone()), ("wt", "json".to_string())];

    for fq in &query.fq {
        params.push(("fq", fq.clone()));
    }
    if !query.fl.is_empty() {
        params.push(("fl", query.fl.join(",")));
    }
    if let Some(sort) = &query.sort {
        params.push(("sort", sort.clone()));
    }
    if let Some(rows) = query.rows {
        params.push(("rows", rows.to_string()));
    }
    if let Some(start) = query.start {
        params.push(("start", start.to_string()));
    }
    if let Some(mark) = &query.cursor_mark {
        params.push(("cursorMark", mark.clone()));
    }

    params
}

#[derive(Debug, Deserialize)]
struct SelectResponse {
    response: ResponseBody,
    #[serde(rename = "nextCursorMark")]
    next_cursor_mark: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<Row>,
}

#[async_trait::async_trait]
impl SearchBackend for SolrClient {
    async fn search(&self, query: &SolrQuery) -> Result<SolrPage, BackendError> {
        let params = query_params(query);
        debug!("Solr query: fq={:?} sort={:?} rows={:?}", query.fq, query.sort, query.rows);

        let resp = self.client.get(self.endpoint()).query(&params).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status { status, body });
        }

        let body: SelectResponse = resp.json().await?;
        debug!(
            "Solr returned {} docs of {} hits",
            body.response.docs.len(),
            body.response.num_found
        );

        Ok(SolrPage {
            hits: body.response.num_found,
            next_cursor_mark: body.next_cursor_mark,
            docs: body.response.docs,
        })
    }
}
