//! In-memory [`SearchBackend`] for tests.
//!
//! Evaluates the subset of Solr syntax this server emits: `field:value`,
//! `field:"value"`, `!field:value`, `A OR B`, comma-separated sorts, `fl`
//! projection with `[child ...]` expansion, `start`/`rows`, and cursor marks
//! (encoded as the next offset). Every query is recorded.

use std::cmp::Ordering;
use std::sync::Mutex;

use serde_json::Value;

use super::{BackendError, Row, SearchBackend, SolrPage, SolrQuery, CURSOR_START};

const DEFAULT_ROWS: u32 = 10;

#[derive(Default)]
pub struct MemoryBackend {
    docs: Mutex<Vec<Row>>,
    calls: Mutex<Vec<SolrQuery>>,
}

impl MemoryBackend {
    pub fn new(docs: Vec<Value>) -> Self {
        Self {
            docs: Mutex::new(docs.into_iter().map(Row::from).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<SolrQuery> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.docs.lock().unwrap().clear();
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn field_matches(row: &Row, field: &str, expected: &str) -> bool {
    match row.get(field) {
        Some(Value::Array(items)) => items.iter().any(|v| value_eq(v, expected)),
        Some(value) => value_eq(value, expected),
        None => false,
    }
}

fn value_eq(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

fn term_matches(row: &Row, term: &str) -> bool {
    let term = term.trim();
    if term == "*:*" {
        return true;
    }
    let (negate, term) = match term.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, term),
    };
    let Some((field, value)) = term.split_once(':') else {
        return false;
    };
    field_matches(row, field, unquote(value)) != negate
}

fn filter_matches(row: &Row, fq: &str) -> bool {
    fq.split(" OR ").any(|term| term_matches(row, term))
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .unwrap_or_default()
            .partial_cmp(&y.as_f64().unwrap_or_default())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn sort_rows(rows: &mut [Row], sort: &str) {
    let keys: Vec<(String, bool)> = sort
        .split(',')
        .filter_map(|clause| {
            let mut parts = clause.split_whitespace();
            let field = parts.next()?.to_string();
            let desc = parts.next() == Some("desc");
            Some((field, desc))
        })
        .collect();

    rows.sort_by(|a, b| {
        for (field, desc) in &keys {
            let ord = compare_values(a.get(field), b.get(field));
            let ord = if *desc { ord.reverse() } else { ord };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

fn project(row: &Row, fl: &[String]) -> Row {
    let entries: Vec<&str> = fl.iter().flat_map(|f| f.split(',')).map(str::trim).collect();
    let with_children = entries.iter().any(|f| f.starts_with("[child"));

    let fields = if entries.is_empty() || entries.contains(&"*") {
        row.fields.clone()
    } else {
        row.fields
            .iter()
            .filter(|(k, _)| entries.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    };

    Row {
        children: if with_children { row.children.clone() } else { Vec::new() },
        fields,
    }
}

#[async_trait::async_trait]
impl SearchBackend for MemoryBackend {
    async fn search(&self, query: &SolrQuery) -> Result<SolrPage, BackendError> {
        self.calls.lock().unwrap().push(query.clone());

        let mut matched: Vec<Row> = self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|row| query.fq.iter().all(|fq| filter_matches(row, fq)))
            .cloned()
            .collect();

        if let Some(sort) = &query.sort {
            sort_rows(&mut matched, sort);
        }

        let hits = matched.len() as u64;
        let offset = match query.cursor_mark.as_deref() {
            Some(CURSOR_START) => 0,
            Some(mark) => mark.parse().unwrap_or(0),
            None => query.start.unwrap_or(0) as usize,
        };
        let rows = query.rows.unwrap_or(DEFAULT_ROWS) as usize;

        let docs: Vec<Row> = matched
            .iter()
            .skip(offset)
            .take(rows)
            .map(|row| project(row, &query.fl))
            .collect();

        let next_cursor_mark = query
            .cursor_mark
            .as_ref()
            .map(|_| (offset + docs.len()).to_string());

        Ok(SolrPage {
            hits,
            next_cursor_mark,
            docs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_filters_or_and_negation() {
        let backend = MemoryBackend::new(vec![
            json!({"id": "a", "type": "object", "all_collections_id_sm": ["talbot"]}),
            json!({"id": "b", "type": "object", "all_collections_id_sm": ["medieval"]}),
            json!({"id": "c_surface", "type": "surface"}),
        ]);

        let page = backend
            .search(&SolrQuery::new("*:*").filter("type:object").filter("!all_collections_id_sm:talbot"))
            .await
            .unwrap();
        assert_eq!(page.hits, 1);
        assert_eq!(page.docs[0].id(), "b");

        let page = backend
            .search(&SolrQuery::new("*:*").filter("id:\"c_surface\" OR id:c"))
            .await
            .unwrap();
        assert_eq!(page.docs[0].id(), "c_surface");
    }

    #[tokio::test]
    async fn test_projection_drops_children_without_transformer() {
        let backend = MemoryBackend::new(vec![json!({
            "id": "s_surface",
            "label_s": "1r",
            "_childDocuments_": [{"id": "s_image"}]
        })]);

        let page = backend
            .search(&SolrQuery::new("*:*").fields(["id"]))
            .await
            .unwrap();
        assert!(page.docs[0].children.is_empty());
        assert!(page.docs[0].get("label_s").is_none());

        let page = backend
            .search(&SolrQuery::new("*:*").fields(["*,[child parentFilter=type:surface childFilter=type:image]"]))
            .await
            .unwrap();
        assert_eq!(page.docs[0].children.len(), 1);
        assert_eq!(page.docs[0].str("label_s"), Some("1r"));
    }
}
