//! Search backend contract.
//!
//! Defines the [`SearchBackend`] trait, the query/response shapes, and the
//! [`Row`] type every assembler reads from, so the HTTP Solr client and the
//! in-memory test backend can be swapped freely.

pub mod client;
#[cfg(test)]
pub mod memory;
pub mod pager;

pub use client::SolrClient;
pub use pager::CursorPager;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which Solr nests child documents.
pub const CHILD_DOCUMENTS_KEY: &str = "_childDocuments_";

/// Cursor mark that starts a fresh cursor walk.
pub const CURSOR_START: &str = "*";

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("search backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search backend returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// One flat search document, with any nested child documents split out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(
        rename = "_childDocuments_",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<Row>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Row {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// A single string field; empty strings count as absent.
    pub fn str(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// The document's `id`, or an empty string if the row has none.
    pub fn id(&self) -> &str {
        self.str("id").unwrap_or_default()
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.fields.get(key) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }

    /// Every value of a field as strings, preserving order. Scalars yield one value.
    pub fn values(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(other) => scalar_to_string(other).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Whether a multi-valued field contains `needle`.
    pub fn contains(&self, key: &str, needle: &str) -> bool {
        self.values(key).iter().any(|v| v == needle)
    }

    /// Loose truthiness: null, "", [], {}, false and 0 are all falsy.
    pub fn is_truthy(&self, key: &str) -> bool {
        match self.fields.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl From<Value> for Row {
    fn from(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// A single backend query. Built with the chaining helpers, e.g.
/// `SolrQuery::new("*:*").filter("type:object").rows(1)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolrQuery {
    pub q: String,
    pub fq: Vec<String>,
    pub fl: Vec<String>,
    pub sort: Option<String>,
    pub rows: Option<u32>,
    pub start: Option<u64>,
    pub cursor_mark: Option<String>,
}

impl SolrQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, fq: impl Into<String>) -> Self {
        self.fq.push(fq.into());
        self
    }

    pub fn fields<I, S>(mut self, fl: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fl.extend(fl.into_iter().map(Into::into));
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn rows(mut self, rows: u32) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn start(mut self, start: u64) -> Self {
        self.start = Some(start);
        self
    }
}

/// One page of backend results.
#[derive(Debug, Clone, Default)]
pub struct SolrPage {
    /// Total matching documents, independent of `rows`.
    pub hits: u64,
    pub next_cursor_mark: Option<String>,
    pub docs: Vec<Row>,
}

impl SolrPage {
    pub fn first(self) -> Option<Row> {
        self.docs.into_iter().next()
    }
}

/// Async trait implemented by each search backend.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &SolrQuery) -> Result<SolrPage, BackendError>;
}
