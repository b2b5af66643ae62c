use serde::Serialize;

use super::sequence::{sequence, Sequence};
use super::structure::{structures, Range};
use super::Thumbnail;
use crate::iiif::{is_excluded, nav_date, viewing_hint, AssemblyContext};
use crate::metadata::{fetch_links, v2_link_entries, v2_metadata_block, FieldTable, V2MetadataEntry};
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

const HOMEPAGE_LABEL: &str = "View on Digital Bodleian";

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    #[serde(rename = "@context")]
    pub context: Context,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub label: Option<String>,
    pub description: Option<String>,
    pub metadata: Option<Vec<V2MetadataEntry>>,
    #[serde(rename = "navDate")]
    pub nav_date: Option<String>,
    pub rendering: Option<Rendering>,
    pub attribution: String,
    pub logo: Option<Thumbnail>,
    pub thumbnail: Option<Thumbnail>,
    #[serde(rename = "viewingHint")]
    pub viewing_hint: &'static str,
    #[serde(rename = "viewingDirection")]
    pub viewing_direction: Option<String>,
    pub sequences: Vec<Sequence>,
    pub structures: Option<Vec<Range>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Rendering {
    #[serde(rename = "@id")]
    pub id: String,
    pub label: &'static str,
    pub format: &'static str,
}

/// Rights and terms joined with `. `, always ending in a single period.
fn attribution(row: &Row) -> String {
    let rights = row.str("access_rights_sni").unwrap_or_default();
    let terms = row.str("use_terms_sni").unwrap_or_default();
    let joined = format!("{}. {}", rights, terms);
    format!("{}.", joined.trim_matches(|c| c == '.' || c == ' '))
}

/// Homepage, then links, then the standard block. Excluded-collection objects get none.
async fn metadata(ctx: &AssemblyContext<'_>, row: &Row) -> Result<Option<Vec<V2MetadataEntry>>, BackendError> {
    if is_excluded(row) {
        return Ok(None);
    }

    let homepage = format!(
        "<span><a href=\"{}\">{}</a></span>",
        ctx.permalink(row.id()),
        HOMEPAGE_LABEL
    );

    let mut entries = vec![V2MetadataEntry::new("Homepage", homepage)];
    entries.extend(v2_link_entries(&fetch_links(ctx.backend, row.id()).await?));
    entries.extend(v2_metadata_block(row, FieldTable::Object));
    Ok(Some(entries))
}

pub async fn manifest(ctx: &AssemblyContext<'_>, row: &Row) -> Result<Manifest, BackendError> {
    let object_id = row.id();

    let rendering = (!is_excluded(row)).then(|| Rendering {
        id: ctx.permalink(object_id),
        label: HOMEPAGE_LABEL,
        format: "text/html",
    });

    Ok(Manifest {
        context: Context::PresentationV2,
        id: ctx.manifest_id(object_id),
        kind: "sc:Manifest",
        label: row.str("full_shelfmark_s").map(str::to_string),
        description: row.str("summary_s").map(str::to_string),
        metadata: metadata(ctx, row).await?,
        nav_date: nav_date(row),
        rendering,
        attribution: attribution(row),
        logo: Thumbnail::for_image(ctx, row.str("logo_id")),
        thumbnail: Thumbnail::for_image(ctx, row.str("thumbnail_id")),
        viewing_hint: viewing_hint(row),
        viewing_direction: row.str("viewing_direction_s").map(str::to_string),
        sequences: vec![sequence(ctx, row, false).await?],
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iiif::testing;
    use crate::render::to_document;
    use crate::solr::memory::MemoryBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_manifest_document() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let doc = to_document(&create_manifest(&ctx, testing::OBJECT).await.unwrap().unwrap()).unwrap();
        assert_eq!(doc["@context"], "http://iiif.io/api/presentation/2/context.json");
        assert_eq!(doc["@type"], "sc:Manifest");
        assert_eq!(doc["label"], "MS. Test 1");
        assert_eq!(doc["navDate"], "1450-01-01T00:00:00Z");
        assert_eq!(doc["viewingHint"], "paged");
        assert_eq!(doc["attribution"], "Photo: Bodleian Libraries. CC-BY-NC 4.0.");
        assert!(doc.get("logo").is_none());
        assert!(doc.get("viewingDirection").is_none());

        let labels: Vec<_> = doc["metadata"].as_array().unwrap().iter().map(|m| m["label"].clone()).collect();
        assert_eq!(
            labels,
            vec![
                json!("Homepage"),
                json!("Additional Information"),
                json!("Title"),
                json!("Language"),
                json!("Language"),
                json!("Record Created")
            ]
        );
        assert_eq!(doc["rendering"]["format"], "text/html");

        // only the root carries a context
        let sequence = &doc["sequences"][0];
        assert!(sequence.get("@context").is_none());
        assert_eq!(sequence["canvases"].as_array().unwrap().len(), 2);
        assert_eq!(doc["structures"].as_array().unwrap().len(), 2);
        assert!(doc["structures"][0].get("@context").is_none());
    }

    #[tokio::test]
    async fn test_excluded_collection_has_no_homepage() {
        let backend = MemoryBackend::new(vec![json!({
            "id": "t1", "type": "object", "full_shelfmark_s": "Talbot 1",
            "all_collections_id_sm": ["talbot"], "title_s": "Photo"
        })]);
        let ctx = testing::ctx(&backend);

        let doc = to_document(&create_manifest(&ctx, "t1").await.unwrap().unwrap()).unwrap();
        assert!(doc.get("metadata").is_none());
        assert!(doc.get("rendering").is_none());
        assert!(doc.get("structures").is_none());
        assert_eq!(doc["attribution"], ".");
    }

    #[test]
    fn test_attribution_single_part() {
        assert_eq!(attribution(&Row::from(json!({"use_terms_sni": "CC-BY"}))), "CC-BY.");
        assert_eq!(attribution(&Row::from(json!({"access_rights_sni": "Rights."}))), "Rights.");
    }

    #[tokio::test]
    async fn test_missing_manifest() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);
        assert!(create_manifest(&ctx, "nope").await.unwrap().is_none());
    }
}
