//! IIIF document assembly.
//!
//! Each schema version has its own family of assemblers under [`v2`] and
//! [`v3`]; the router picks one per request. Every assembler receives an
//! [`AssemblyContext`] by reference and a `direct` flag that is true only for
//! the document at the root of the response.

pub mod activity;
pub mod root;
pub mod v2;
pub mod v3;

use serde::Serialize;

use crate::config::{ServerConfig, Templates};
use crate::hierarchy::{works_from_rows, Work};
use crate::identifiers::{get_identifier, RequestBase};
use crate::metadata::works_field_list;
use crate::solr::pager::search_all;
use crate::solr::{BackendError, Row, SearchBackend, SolrQuery};

/// Rows fetched per cursor page when walking multi-row results.
pub const PAGE_ROWS: u32 = 100;

pub const SURFACE_SUFFIX: &str = "_surface";
pub const IMAGE_SUFFIX: &str = "_image";

/// Collection whose objects get no homepage metadata and are left out of activity streams.
pub const EXCLUDED_COLLECTION: &str = "talbot";

pub const IMAGE_API_V2_CONTEXT: &str = "http://iiif.io/api/image/2/context.json";
pub const IMAGE_API_V2_LEVEL1: &str = "http://iiif.io/api/image/2/level1.json";

/// Child expansion for surfaces with their images.
pub const SURFACE_WITH_IMAGES: &str = "*,[child parentFilter=type:surface childFilter=type:image]";
/// Child expansion for text annotations with their bodies.
pub const ANNOTATION_WITH_BODIES: &str = "[child parentFilter=type:annotation childFilter=type:annotation_body]";

/// Collection that lists every object.
pub const ALL_COLLECTION: &str = "all";

/// Members of a collection: sub-collections or objects, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Members {
    Collections(Vec<Row>),
    Objects(Vec<Row>),
    Empty,
}

/// Requested Presentation API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V2,
    V3,
}

impl Version {
    /// Version 3 iff the `Accept` header mentions `presentation/3`.
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some(a) if a.contains("presentation/3") => Self::V3,
            _ => Self::V2,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::V2 => 2,
            Self::V3 => 3,
        }
    }

    pub fn profile(self) -> String {
        format!("http://iiif.io/api/presentation/{}/context.json", self.number())
    }
}

/// Everything an assembler needs besides the row it is rendering.
#[derive(Clone, Copy)]
pub struct AssemblyContext<'a> {
    pub backend: &'a dyn SearchBackend,
    pub config: &'a ServerConfig,
    pub base: &'a RequestBase,
}

impl<'a> AssemblyContext<'a> {
    pub fn new(backend: &'a dyn SearchBackend, config: &'a ServerConfig, base: &'a RequestBase) -> Self {
        Self { backend, config, base }
    }

    fn templates(&self) -> &Templates {
        &self.config.templates
    }

    fn fill(&self, identifier: &str, template: &str) -> String {
        get_identifier(self.base, identifier, template, None)
    }

    pub fn manifest_id(&self, id: &str) -> String {
        self.fill(id, &self.templates().manifest_id_tmpl)
    }

    /// Canvas URI for a surface id, with or without its `_surface` suffix.
    pub fn canvas_id(&self, surface_id: &str) -> String {
        self.fill(strip_surface(surface_id), &self.templates().canvas_id_tmpl)
    }

    pub fn sequence_id(&self, id: &str) -> String {
        self.fill(id, &self.templates().sequence_id_tmpl)
    }

    /// Annotation URI; image annotations lose their `_image` suffix.
    pub fn annotation_id(&self, id: &str) -> String {
        self.fill(strip_image(id), &self.templates().annotation_id_tmpl)
    }

    pub fn annotation_list_id(&self, id: &str) -> String {
        self.fill(id, &self.templates().annolist_id_tmpl)
    }

    pub fn annotation_page_id(&self, id: &str) -> String {
        self.fill(strip_surface(id), &self.templates().annopage_id_tmpl)
    }

    pub fn image_id(&self, id: &str) -> String {
        self.fill(strip_image(id), &self.templates().image_id_tmpl)
    }

    pub fn range_id(&self, object_id: &str, work_id: &str) -> String {
        get_identifier(self.base, object_id, &self.templates().range_id_tmpl, Some(work_id))
    }

    pub fn collection_id(&self, id: &str) -> String {
        self.fill(id, &self.templates().collection_id_tmpl)
    }

    pub fn activity_id(&self, id: &str) -> String {
        self.fill(id, &self.templates().activitystream_id_tmpl)
    }

    pub fn activity_create_id(&self, id: &str) -> String {
        self.fill(id, &self.templates().activitystream_create_id_tmpl)
    }

    pub fn permalink(&self, id: &str) -> String {
        self.fill(id, &self.templates().digital_bodleian_permalink_tmpl)
    }

    /// `{image}/full/{thumbsize},/0/default.jpg` for an image id.
    pub fn thumbnail_url(&self, image_uri: &str) -> String {
        format!("{}/full/{},/0/default.jpg", image_uri, self.config.common.thumbsize)
    }

    /// First matching row, or `None` on zero hits.
    pub async fn search_one(&self, query: SolrQuery) -> Result<Option<Row>, BackendError> {
        Ok(self.backend.search(&query.rows(1)).await?.first())
    }

    /// Every matching row, walked through the cursor pager.
    pub async fn search_all(&self, query: SolrQuery) -> Result<Vec<Row>, BackendError> {
        search_all(self.backend, query.rows(PAGE_ROWS)).await
    }

    /// Hit count only; no documents are fetched.
    pub async fn count(&self, query: SolrQuery) -> Result<u64, BackendError> {
        Ok(self.backend.search(&query.rows(0)).await?.hits)
    }

    /// Whether any non-image annotation page exists for an object.
    pub async fn has_annotations(&self, object_id: &str) -> Result<bool, BackendError> {
        let query = SolrQuery::new("*:*")
            .filter("type:annotationpage")
            .filter(format!("object_id:{}", object_id));
        Ok(self.count(query).await? > 0)
    }

    /// Annotation page ids attached to a surface.
    pub async fn annotation_page_ids(&self, surface_id: &str) -> Result<Vec<String>, BackendError> {
        let query = SolrQuery::new("*:*")
            .filter("type:annotationpage")
            .filter(format!("surface_id:\"{}\"", surface_id))
            .fields(["id"]);
        let rows = self.search_all(query).await?;
        Ok(rows.iter().map(|r| r.id().to_string()).collect())
    }

    /// Every work row of an object, ordered by `work_id`.
    pub async fn works(&self, object_id: &str) -> Result<Vec<Work>, BackendError> {
        let query = SolrQuery::new("*:*")
            .filter("type:work")
            .filter(format!("object_id:{}", object_id))
            .fields(works_field_list())
            .sort("work_id asc");
        Ok(works_from_rows(self.search_all(query).await?))
    }

    /// Members of a collection. Sub-collections are queried first; member
    /// objects only when there are none, so the two never mix.
    pub async fn collection_members(&self, collection_id: &str) -> Result<Members, BackendError> {
        let sub_collections = SolrQuery::new("*:*")
            .filter("type:collection")
            .filter(format!("parent_collection_id:{}", collection_id))
            .fields(["id", "name_s", "description_s", "collection_id", "parent_collection_id"])
            .sort("name_s asc");

        let collections = self.search_all(sub_collections).await?;
        if !collections.is_empty() {
            return Ok(Members::Collections(collections));
        }

        let mut objects = SolrQuery::new("*:*").filter("type:object");
        if collection_id != ALL_COLLECTION {
            objects = objects.filter(format!("all_collections_id_sm:{}", collection_id));
        }
        let objects = objects
            .fields(["id", "title_s", "full_shelfmark_s", "thumbnail_id"])
            .sort("institution_label_s asc, shelfmark_sort_ans asc");

        let rows = self.search_all(objects).await?;
        if rows.is_empty() {
            Ok(Members::Empty)
        } else {
            Ok(Members::Objects(rows))
        }
    }

    /// The shelfmark of an object, used to label back-references to its manifest.
    pub async fn object_shelfmark(&self, object_id: &str) -> Result<Option<String>, BackendError> {
        let query = SolrQuery::new("*:*")
            .filter(format!("id:\"{}\"", object_id))
            .filter("type:object")
            .fields(["full_shelfmark_s"]);
        let row = self.search_one(query).await?;
        Ok(row.map(|r| r.str("full_shelfmark_s").unwrap_or_default().to_string()))
    }
}

pub fn strip_surface(id: &str) -> &str {
    id.strip_suffix(SURFACE_SUFFIX).unwrap_or(id)
}

pub fn strip_image(id: &str) -> &str {
    id.strip_suffix(IMAGE_SUFFIX).unwrap_or(id)
}

/// Split a composite `{object}/{range}` identifier. Anything but exactly two
/// non-empty parts is rejected.
pub fn split_range_id(composite: &str) -> Option<(&str, &str)> {
    let (object_id, range_id) = composite.split_once('/')?;
    if object_id.is_empty() || range_id.is_empty() || range_id.contains('/') {
        return None;
    }
    Some((object_id, range_id))
}

/// Whether an object row belongs to the excluded collection.
pub fn is_excluded(row: &Row) -> bool {
    row.contains("all_collections_id_sm", EXCLUDED_COLLECTION)
}

/// `individuals` for map, sheet, binding and photo objects; `paged` otherwise.
pub fn viewing_hint(row: &Row) -> &'static str {
    match row.str("viewing_type_s") {
        Some("map" | "sheet" | "binding" | "photo") => "individuals",
        _ => "paged",
    }
}

/// Start year (or end year) as a navigation date.
pub fn nav_date(row: &Row) -> Option<String> {
    row.int("start_date_i")
        .filter(|y| *y != 0)
        .or_else(|| row.int("end_date_i"))
        .map(|year| format!("{}-01-01T00:00:00Z", year))
}

/// Canvas dimensions from the first child image, or zero without one.
pub fn canvas_dimensions(row: &Row) -> (i64, i64) {
    match row.children.first() {
        Some(image) => (
            image.int("width_i").unwrap_or_default(),
            image.int("height_i").unwrap_or_default(),
        ),
        None => (0, 0),
    }
}

/// `xywh=` fragment for an annotated region.
pub fn xywh(row: &Row) -> String {
    format!(
        "xywh={},{},{},{}",
        row.int("ulx_i").unwrap_or_default(),
        row.int("uly_i").unwrap_or_default(),
        row.int("width_i").unwrap_or_default(),
        row.int("height_i").unwrap_or_default()
    )
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// One language-tagged text body of a text annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationBody {
    pub language: Option<String>,
    pub direction: String,
    pub text: String,
}

impl AnnotationBody {
    pub fn from_row(row: &Row) -> Self {
        Self {
            language: row.str("language_s").map(str::to_string),
            direction: row.str("direction_s").unwrap_or("ltr").to_string(),
            text: row.str("text_s").unwrap_or_default().to_string(),
        }
    }

    /// `<p dir="...">escaped text</p>`
    pub fn html(&self) -> String {
        format!("<p dir=\"{}\">{}</p>", self.direction, escape_html(&self.text))
    }
}

pub fn annotation_bodies(row: &Row) -> Vec<AnnotationBody> {
    row.children.iter().map(AnnotationBody::from_row).collect()
}

/// Typed `{"id": ..., "type": ...}` reference used across both versions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl Reference {
    pub fn new(id: String, kind: &'static str) -> Self {
        Self { id, kind }
    }
}
