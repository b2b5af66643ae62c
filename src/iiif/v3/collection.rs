use serde::Serialize;

use super::ImageRef;
use crate::iiif::{AssemblyContext, Members};
use crate::metadata::LanguageMap;
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    #[serde(rename = "@context")]
    pub context: Context,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: Option<LanguageMap>,
    pub summary: Option<LanguageMap>,
    pub items: Option<Vec<CollectionItem>>,
}

/// A member manifest or sub-collection. Sub-collections carry a summary,
/// manifests a thumbnail.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: Option<LanguageMap>,
    pub summary: Option<LanguageMap>,
    pub thumbnail: Option<Vec<ImageRef>>,
}

pub async fn collection(ctx: &AssemblyContext<'_>, row: &Row) -> Result<Collection, BackendError> {
    let collection_id = row.str("collection_id").unwrap_or_default();

    let items = match ctx.collection_members(collection_id).await? {
        Members::Collections(rows) => Some(
            rows.iter()
                .map(|c| CollectionItem {
                    id: ctx.collection_id(c.str("collection_id").unwrap_or_default()),
                    kind: "Collection",
                    label: c.str("name_s").map(LanguageMap::en),
                    summary: c.str("description_s").map(LanguageMap::en),
                    thumbnail: None,
                })
                .collect(),
        ),
        Members::Objects(rows) => Some(
            rows.iter()
                .map(|o| CollectionItem {
                    id: ctx.manifest_id(o.id()),
                    kind: "Manifest",
                    label: o.str("full_shelfmark_s").map(LanguageMap::en),
                    summary: None,
                    thumbnail: ImageRef::for_image(ctx, o.str("thumbnail_id")),
                })
                .collect(),
        ),
        Members::Empty => None,
    };

    Ok(Collection {
        context: Context::PresentationV3,
        id: ctx.collection_id(collection_id),
        kind: "Collection",
        label: row.str("name_s").map(LanguageMap::en),
        summary: row.str("description_s").map(LanguageMap::en),
        items,
    })
}

pub async fn create_collection(
    ctx: &AssemblyContext<'_>,
    collection_id: &str,
) -> Result<Option<Collection>, BackendError> {
    let query = SolrQuery::new("*:*")
        .filter("type:collection")
        .filter(format!("collection_id:\"{}\"", collection_id.to_lowercase()));

    match ctx.search_one(query).await? {
        Some(row) => Ok(Some(collection(ctx, &row).await?)),
        None => Ok(None),
    }
}
