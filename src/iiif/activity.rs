//! Activity Stream (IIIF Change Discovery) documents.
//!
//! The feed is a virtual ordered collection over every published object,
//! windowed into pages of `solr.pagesize` items. Page boundaries come from the
//! total hit count alone; the root collection never walks its pages.

use serde::Serialize;

use super::{AssemblyContext, Reference, EXCLUDED_COLLECTION};
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

/// Identifier of the root ordered collection.
pub const ALL_CHANGES: &str = "all-changes";

const ACTOR_ID: &str = "http://viaf.org/viaf/173632201";
const ACTIVITY_FIELDS: [&str; 3] = ["id", "accessioned_dt", "full_shelfmark_s"];
const ACTIVITY_SORT: &str = "accessioned_dt asc, shelfmark_sort_ans asc, id asc";

/// Page arithmetic for `hits` items in pages of `page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityPaging {
    pub hits: u64,
    pub page_size: u64,
}

impl ActivityPaging {
    pub fn new(hits: u64, page_size: u32) -> Self {
        Self {
            hits,
            page_size: u64::from(page_size.max(1)),
        }
    }

    pub fn last_page(&self) -> u64 {
        self.hits / self.page_size
    }

    /// 1-based index of the first item on page `n`, saturating at `u64::MAX`.
    pub fn start_index(&self, n: u64) -> u64 {
        self.page_size.saturating_mul(n).saturating_add(1)
    }

    pub fn prev(&self, n: u64) -> Option<u64> {
        n.checked_sub(1)
    }

    pub fn next(&self, n: u64) -> Option<u64> {
        let next = n.checked_add(1)?;
        (next <= self.last_page()).then_some(next)
    }
}

pub fn page_name(n: u64) -> String {
    format!("page-{}", n)
}

/// Parse a `page-{n}` identifier.
pub fn parse_page(name: &str) -> Option<u64> {
    name.strip_prefix("page-")?.parse().ok()
}

#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub id: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    #[serde(rename = "@context")]
    pub context: Option<Context>,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "endTime")]
    pub end_time: Option<String>,
    pub object: ActivityObject,
    pub actor: Actor,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderedCollection {
    #[serde(rename = "@context")]
    pub context: Context,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "totalItems")]
    pub total_items: u64,
    pub first: Reference,
    pub last: Reference,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderedCollectionPage {
    #[serde(rename = "@context")]
    pub context: Context,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "startIndex")]
    pub start_index: u64,
    #[serde(rename = "partOf")]
    pub part_of: Reference,
    pub prev: Option<Reference>,
    pub next: Option<Reference>,
    #[serde(rename = "orderedItems")]
    pub ordered_items: Vec<Activity>,
}

fn published_objects() -> SolrQuery {
    SolrQuery::new("*:*")
        .filter("type:object")
        .filter(format!("!all_collections_id_sm:{}", EXCLUDED_COLLECTION))
        .fields(ACTIVITY_FIELDS)
}

fn page_ref(ctx: &AssemblyContext<'_>, n: u64) -> Reference {
    Reference::new(ctx.activity_id(&page_name(n)), "OrderedCollectionPage")
}

/// A `Create` activity for one object row.
pub fn activity(ctx: &AssemblyContext<'_>, row: &Row, direct: bool) -> Activity {
    Activity {
        context: Context::when(direct, Context::ActivityStreams),
        id: ctx.activity_create_id(row.id()),
        kind: "Create",
        end_time: row.str("accessioned_dt").map(str::to_string),
        object: ActivityObject {
            id: ctx.manifest_id(row.id()),
            kind: "Manifest",
            name: row.str("full_shelfmark_s").map(str::to_string),
        },
        actor: Actor {
            id: ACTOR_ID,
            kind: "Organization",
        },
    }
}

pub async fn create_activity(ctx: &AssemblyContext<'_>, object_id: &str) -> Result<Option<Activity>, BackendError> {
    let query = SolrQuery::new("*:*")
        .filter("type:object")
        .filter(format!("id:{}", object_id))
        .fields(ACTIVITY_FIELDS);

    Ok(ctx.search_one(query).await?.map(|row| activity(ctx, &row, true)))
}

/// The root collection: a hit count and pointers to the first and last pages.
pub async fn create_ordered_collection(ctx: &AssemblyContext<'_>) -> Result<Option<OrderedCollection>, BackendError> {
    let hits = ctx.count(published_objects()).await?;
    if hits == 0 {
        return Ok(None);
    }

    let paging = ActivityPaging::new(hits, ctx.config.solr.pagesize);

    Ok(Some(OrderedCollection {
        context: Context::ActivityStreams,
        id: ctx.activity_id(ALL_CHANGES),
        kind: "OrderedCollection",
        total_items: hits,
        first: page_ref(ctx, 0),
        last: page_ref(ctx, paging.last_page()),
    }))
}

pub async fn create_ordered_collection_page(
    ctx: &AssemblyContext<'_>,
    n: u64,
) -> Result<Option<OrderedCollectionPage>, BackendError> {
    let page_size = ctx.config.solr.pagesize;
    let query = published_objects()
        .sort(ACTIVITY_SORT)
        .rows(page_size)
        .start(n.saturating_mul(u64::from(page_size)));

    let page = ctx.backend.search(&query).await?;
    if page.hits == 0 {
        return Ok(None);
    }

    let paging = ActivityPaging::new(page.hits, page_size);

    Ok(Some(OrderedCollectionPage {
        context: Context::ActivityStreams,
        id: ctx.activity_id(&page_name(n)),
        kind: "OrderedCollectionPage",
        start_index: paging.start_index(n),
        part_of: Reference::new(ctx.activity_id(ALL_CHANGES), "OrderedCollection"),
        prev: paging.prev(n).map(|p| page_ref(ctx, p)),
        next: paging.next(n).map(|p| page_ref(ctx, p)),
        ordered_items: page.docs.iter().map(|row| activity(ctx, row, false)).collect(),
    }))
}
