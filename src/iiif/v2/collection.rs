use serde::Serialize;

use super::Thumbnail;
use crate::iiif::{AssemblyContext, Members};
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    #[serde(rename = "@context")]
    pub context: Context,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub label: Option<String>,
    pub description: Option<String>,
    pub manifests: Option<Vec<CollectionManifest>>,
    pub collections: Option<Vec<CollectionCollection>>,
}

/// A member object.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionManifest {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub label: Option<String>,
    pub thumbnail: Option<Thumbnail>,
}

/// A nested sub-collection.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionCollection {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub label: Option<String>,
    pub description: Option<String>,
}

pub async fn collection(ctx: &AssemblyContext<'_>, row: &Row) -> Result<Collection, BackendError> {
    let collection_id = row.str("collection_id").unwrap_or_default();

    let (manifests, collections) = match ctx.collection_members(collection_id).await? {
        Members::Collections(rows) => {
            let entries = rows
                .iter()
                .map(|c| CollectionCollection {
                    id: ctx.collection_id(c.str("collection_id").unwrap_or_default()),
                    kind: "sc:Collection",
                    label: c.str("name_s").map(str::to_string),
                    description: c.str("description_s").map(str::to_string),
                })
                .collect();
            (None, Some(entries))
        }
        Members::Objects(rows) => {
            let entries = rows
                .iter()
                .map(|o| CollectionManifest {
                    id: ctx.manifest_id(o.id()),
                    kind: "sc:Manifest",
                    label: o.str("full_shelfmark_s").map(str::to_string),
                    thumbnail: Thumbnail::for_image(ctx, o.str("thumbnail_id")),
                })
                .collect();
            (Some(entries), None)
        }
        Members::Empty => (None, None),
    };

    Ok(Collection {
        context: Context::PresentationV2,
        id: ctx.collection_id(collection_id),
        kind: "sc:Collection",
        label: row.str("name_s").map(str::to_string),
        description: row.str("description_s").map(str::to_string),
        manifests,
        collections,
    })
}

/// Look up a collection by id (case-insensitive) and assemble it.
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
