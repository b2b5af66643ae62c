//! Cursor-based pagination over a [`SearchBackend`].
//!
//! A [`CursorPager`] hides Solr's `cursorMark` protocol: after [`CursorPager::search`],
//! repeated calls to [`CursorPager::next`] yield every matching row in backend
//! order, fetching the next page whenever the current one is drained.
//!
//! The sequence is single-pass. Walking the results again requires a new
//! `search` call, which resets all cursor state.

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::{BackendError, Row, SearchBackend, SolrQuery, CURSOR_START};

/// Tie-break sort on the unique key; cursors require a total order.
const DEFAULT_TIEBREAK: &str = "id asc";

pub struct CursorPager<'a> {
    backend: &'a dyn SearchBackend,
    tiebreak: String,
    query: Option<SolrQuery>,
    buffer: VecDeque<Row>,
    next_cursor_mark: Option<String>,
    hits: u64,
    consumed: u64,
}

impl<'a> CursorPager<'a> {
    pub fn new(backend: &'a dyn SearchBackend) -> Self {
        Self {
            backend,
            tiebreak: DEFAULT_TIEBREAK.to_string(),
            query: None,
            buffer: VecDeque::new(),
            next_cursor_mark: None,
            hits: 0,
            consumed: 0,
        }
    }

    /// Issue the first page of a query, resetting any previous cursor state.
    ///
    /// The tie-break sort is appended to the caller's sort (or used alone),
    /// and the cursor mark is reset to the start sentinel.
    pub async fn search(&mut self, mut query: SolrQuery) -> Result<(), BackendError> {
        query.sort = Some(match query.sort.take() {
            Some(sort) => format!("{}, {}", sort, self.tiebreak),
            None => self.tiebreak.clone(),
        });
        query.cursor_mark = Some(CURSOR_START.to_string());
        query.start = None;

        let page = self.backend.search(&query).await?;
        debug!("Cursor search: {} hits, first page {} docs", page.hits, page.docs.len());

        self.hits = page.hits;
        self.consumed = 0;
        self.next_cursor_mark = page.next_cursor_mark;
        self.buffer = page.docs.into();
        self.query = Some(query);
        Ok(())
    }

    /// Total hits reported by the most recent backend response.
    pub fn hits(&self) -> u64 {
        if self.query.is_none() {
            warn!("A request for number of results was called before a search was initiated");
        }
        self.hits
    }

    /// Whether another row may be available without a backend call settling it.
    pub fn has_next(&self) -> bool {
        self.query.is_some() && self.consumed < self.hits
    }

    /// Advance to the next row, fetching the next cursor page when the buffer is empty.
    ///
    /// Returns `Ok(None)` once every hit has been yielded, or early if a refetch
    /// comes back empty because the index changed underneath the cursor.
    pub async fn next(&mut self) -> Result<Option<Row>, BackendError> {
        let Some(query) = self.query.as_mut() else {
            warn!("A request for results was called before a search was initiated.");
            return Ok(None);
        };

        if self.consumed >= self.hits {
            return Ok(None);
        }

        if self.buffer.is_empty() {
            let Some(mark) = self.next_cursor_mark.take() else {
                return Ok(None);
            };
            query.cursor_mark = Some(mark);

            let page = self.backend.search(query).await?;
            debug!("Fetched next cursor page: {} docs", page.docs.len());

            self.hits = page.hits;
            self.next_cursor_mark = page.next_cursor_mark;
            self.buffer = page.docs.into();
        }

        match self.buffer.pop_front() {
            Some(row) => {
                self.consumed += 1;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    /// Drain the remaining results into a vector.
    pub async fn collect(mut self) -> Result<Vec<Row>, BackendError> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Run a query through a fresh pager and return every matching row.
pub async fn search_all(
    backend: &dyn SearchBackend,
    query: SolrQuery,
) -> Result<Vec<Row>, BackendError> {
    let mut pager = CursorPager::new(backend);
    pager.search(query).await?;
    if pager.hits() == 0 {
        return Ok(Vec::new());
    }
    pager.collect().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solr::memory::MemoryBackend;
    use serde_json::json;

    fn backend_with(n: usize) -> MemoryBackend {
        let docs = (0..n)
            .map(|i| json!({"id": format!("doc{:03}", i), "type": "object", "sort_i": i}))
            .collect();
        MemoryBackend::new(docs)
    }

    #[tokio::test]
    async fn test_yields_all_rows_across_pages() {
        let backend = backend_with(25);
        let mut pager = CursorPager::new(&backend);
        pager
            .search(SolrQuery::new("*:*").filter("type:object").sort("sort_i asc").rows(10))
            .await
            .unwrap();
        assert_eq!(pager.hits(), 25);

        let rows = pager.collect().await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id().to_string()).collect();
        let expected: Vec<_> = (0..25).map(|i| format!("doc{:03}", i)).collect();
        assert_eq!(ids, expected);
        // ceil(25 / 10) backend calls
        assert_eq!(backend.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_exact_multiple_makes_no_extra_call() {
        let backend = backend_with(20);
        let rows = search_all(&backend, SolrQuery::new("*:*").rows(10)).await.unwrap();
        assert_eq!(rows.len(), 20);
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_appends_tiebreak_sort_and_cursor() {
        let backend = backend_with(3);
        let mut pager = CursorPager::new(&backend);
        pager
            .search(SolrQuery::new("*:*").sort("sort_i asc").rows(2))
            .await
            .unwrap();
        pager.search(SolrQuery::new("*:*").rows(2)).await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls[0].sort.as_deref(), Some("sort_i asc, id asc"));
        assert_eq!(calls[0].cursor_mark.as_deref(), Some("*"));
        assert_eq!(calls[1].sort.as_deref(), Some("id asc"));
    }

    #[tokio::test]
    async fn test_stops_early_when_refetch_is_empty() {
        let backend = backend_with(5);
        let mut pager = CursorPager::new(&backend);
        pager.search(SolrQuery::new("*:*").rows(2)).await.unwrap();
        assert!(pager.next().await.unwrap().is_some());
        assert!(pager.next().await.unwrap().is_some());

        // Index shrinks between page fetches.
        backend.clear();
        assert!(pager.next().await.unwrap().is_none());
        assert!(pager.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hits_before_search_is_zero() {
        let backend = backend_with(3);
        let mut pager = CursorPager::new(&backend);
        assert_eq!(pager.hits(), 0);
        assert!(!pager.has_next());
        assert!(pager.next().await.unwrap().is_none());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_new_search_restarts_iteration() {
        let backend = backend_with(3);
        let mut pager = CursorPager::new(&backend);
        pager.search(SolrQuery::new("*:*").rows(10)).await.unwrap();
        while pager.next().await.unwrap().is_some() {}
        assert!(!pager.has_next());

        pager.search(SolrQuery::new("*:*").rows(10)).await.unwrap();
        assert_eq!(pager.next().await.unwrap().unwrap().id(), "doc000");
    }
}
