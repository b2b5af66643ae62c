use serde::Serialize;

use super::canvas::{canvas, Canvas};
use super::structure::{structures, Range};
use super::ImageRef;
use crate::iiif::{is_excluded, nav_date, viewing_hint, AssemblyContext, SURFACE_WITH_IMAGES};
use crate::metadata::{fetch_links, non_empty, v3_link_entries, v3_metadata_block, FieldTable, LanguageMap, V3MetadataEntry};
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

const HOMEPAGE_LABEL: &str = "View on Digital Bodleian";

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    #[serde(rename = "@context")]
    pub context: Context,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: Option<LanguageMap>,
    pub summary: Option<LanguageMap>,
    pub metadata: Option<Vec<V3MetadataEntry>>,
    pub homepage: Option<Vec<Homepage>>,
    pub provider: Option<Vec<Provider>>,
    #[serde(rename = "navDate")]
    pub nav_date: Option<String>,
    pub logo: Option<Vec<ImageRef>>,
    pub thumbnail: Option<Vec<ImageRef>>,
    #[serde(rename = "requiredStatement")]
    pub required_statement: Option<V3MetadataEntry>,
    #[serde(rename = "partOf")]
    pub part_of: Option<Vec<CollectionRef>>,
    pub behavior: Vec<&'static str>,
    #[serde(rename = "viewingDirection")]
    pub viewing_direction: Option<String>,
    pub items: Option<Vec<Canvas>>,
    pub structures: Option<Vec<Range>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Homepage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: LanguageMap,
    pub format: &'static str,
    pub language: Option<Vec<&'static str>>,
}

impl Homepage {
    fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "Text",
            label: LanguageMap::en(label),
            format: "text/html",
            language: Some(vec!["en"]),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Provider {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: Option<LanguageMap>,
    pub homepage: Option<Homepage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: LanguageMap,
}

/// Collections from `id|label` entries; entries without a separator are skipped.
fn part_of(ctx: &AssemblyContext<'_>, row: &Row) -> Option<Vec<CollectionRef>> {
    let refs = row
        .values("all_collections_link_smni")
        .iter()
        .filter_map(|entry| entry.split_once('|'))
        .map(|(id, label)| CollectionRef {
            id: ctx.collection_id(id),
            kind: "Collection",
            label: LanguageMap::en(label),
        })
        .collect();
    non_empty(refs)
}

/// The holding institution, only when it has a URI.
fn provider(row: &Row) -> Option<Vec<Provider>> {
    let id = row.str("institution_uri_s")?;
    let name = row.str("holding_institution_s");
    let homepage = row.str("institution_homepage_sni").map(|page| Homepage {
        id: page.to_string(),
        kind: "Text",
        label: LanguageMap::en(name.unwrap_or_default()),
        format: "text/html",
        language: None,
    });

    Some(vec![Provider {
        id: id.to_string(),
        kind: "Agent",
        label: name.map(LanguageMap::en),
        homepage,
    }])
}

pub async fn manifest(ctx: &AssemblyContext<'_>, row: &Row) -> Result<Manifest, BackendError> {
    let object_id = row.id();
    let links = fetch_links(ctx.backend, object_id).await?;

    let mut metadata = v3_link_entries(&links);
    metadata.extend(v3_metadata_block(row, FieldTable::Object));

    let homepage = (!is_excluded(row)).then(|| {
        let mut pages = vec![Homepage::new(ctx.permalink(object_id), HOMEPAGE_LABEL)];
        pages.extend(links.iter().map(|l| Homepage::new(l.target.clone(), l.label.clone())));
        pages
    });

    let has_annotations = ctx.has_annotations(object_id).await?;
    let surfaces = ctx
        .search_all(
            SolrQuery::new("*:*")
                .filter("type:surface")
                .filter(format!("object_id:{}", object_id))
                .fields([SURFACE_WITH_IMAGES])
                .sort("sort_i asc"),
        )
        .await?;

    let mut items = Vec::with_capacity(surfaces.len());
    for surface in &surfaces {
        items.push(canvas(ctx, surface, has_annotations, false).await?);
    }

    Ok(Manifest {
        context: Context::PresentationV3,
        id: ctx.manifest_id(object_id),
        kind: "Manifest",
        label: row.str("full_shelfmark_s").map(LanguageMap::en),
        summary: row.str("summary_s").map(LanguageMap::en),
        metadata: non_empty(metadata),
        homepage,
        provider: provider(row),
        nav_date: nav_date(row),
        logo: ImageRef::for_image(ctx, row.str("logo_id")),
        thumbnail: ImageRef::for_image(ctx, row.str("thumbnail_id")),
        required_statement: row
            .str("use_terms_sni")
            .map(|terms| V3MetadataEntry::new("Terms of Use", terms)),
        part_of: part_of(ctx, row),
        behavior: vec![viewing_hint(row)],
        viewing_direction: row.str("viewing_direction_s").map(str::to_string),
        items: non_empty(items),
        structures: structures(ctx, object_id).await?,
    })
}

pub async fn create_manifest(ctx: &AssemblyContext<'_>, manifest_id: &str) -> Result<Option<Manifest>, BackendError> {
    let query = SolrQuery::new("*:*")
        .filter("type:object")
        .filter(format!("id:{}", manifest_id));

    match ctx.search_one(query).await? {
        Some(row) => Ok(Some(manifest(ctx, &row).await?)),
        None => Ok(None),
    }
}
