//! v2 ranges. Every work becomes one flat range; nesting is expressed
//! through `ranges` pointers computed by the hierarchy pointer map.

use std::collections::HashMap;

use serde::Serialize;

use crate::hierarchy::{child_pointers, Work};
use crate::iiif::{split_range_id, AssemblyContext, Reference};
use crate::metadata::{non_empty, v2_metadata_block, FieldTable, V2MetadataEntry};
use crate::render::Context;
use crate::solr::BackendError;

#[derive(Debug, Clone, Serialize)]
pub struct Range {
    #[serde(rename = "@context")]
    pub context: Option<Context>,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub label: Option<String>,
    pub within: Option<Vec<Reference>>,
    #[serde(rename = "viewingHint")]
    pub viewing_hint: Option<&'static str>,
    pub canvases: Option<Vec<String>>,
    pub ranges: Option<Vec<String>>,
    pub metadata: Option<Vec<V2MetadataEntry>>,
}

fn work_range_id(ctx: &AssemblyContext<'_>, work: &Work) -> String {
    ctx.range_id(work.object_id(), &work.work_id)
}

/// One range. Internal works list child ranges; leaf works list canvases.
pub fn range(
    ctx: &AssemblyContext<'_>,
    work: &Work,
    pointers: &HashMap<String, Vec<String>>,
    direct: bool,
) -> Range {
    let children = pointers.get(&work.work_id);

    let canvases = match children {
        Some(_) => None,
        None => Some(work.surfaces().iter().map(|s| ctx.canvas_id(s)).collect()),
    };

    let within = direct.then(|| vec![Reference::new(ctx.manifest_id(work.object_id()), "Manifest")]);

    Range {
        context: Context::when(direct, Context::PresentationV2),
        id: work_range_id(ctx, work),
        kind: "sc:Range",
        label: work.row.str("work_title_s").map(str::to_string),
        within,
        viewing_hint: work.is_root().then_some("top"),
        canvases,
        ranges: children.cloned(),
        metadata: non_empty(v2_metadata_block(&work.row, FieldTable::Works)),
    }
}

/// All ranges of an object, or `None` when it has no works.
pub async fn structures(ctx: &AssemblyContext<'_>, object_id: &str) -> Result<Option<Vec<Range>>, BackendError> {
    let works = ctx.works(object_id).await?;
    if works.is_empty() {
        return Ok(None);
    }

    let pointers = child_pointers(&works, |w| work_range_id(ctx, w));
    Ok(Some(works.iter().map(|w| range(ctx, w, &pointers, false)).collect()))
}

/// Direct range request for a composite `{object}/{range}` identifier.
pub async fn create_range(ctx: &AssemblyContext<'_>, composite: &str) -> Result<Option<Range>, BackendError> {
    let Some((object_id, range_id)) = split_range_id(composite) else {
        return Ok(None);
    };

    let works = ctx.works(object_id).await?;
    let pointers = child_pointers(&works, |w| work_range_id(ctx, w));
    let target = ctx.range_id(object_id, range_id);

    Ok(works
        .iter()
        .find(|w| work_range_id(ctx, w) == target)
        .map(|w| range(ctx, w, &pointers, true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iiif::testing;
    use crate::render::to_document;
    use crate::solr::memory::MemoryBackend;
    use serde_json::json;

    fn range_uri(work: &str) -> String {
        format!("https://iiif.test/iiif/range/{}/{}", testing::OBJECT, work)
    }

    #[tokio::test]
    async fn test_flat_ranges_with_pointers() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let ranges = structures(&ctx, testing::OBJECT).await.unwrap().unwrap();
        let docs: Vec<_> = ranges.iter().map(|r| to_document(r).unwrap()).collect();
        assert_eq!(docs.len(), 2);

        let top = &docs[0];
        assert_eq!(top["@id"], range_uri("LOG_0001"));
        assert_eq!(top["viewingHint"], "top");
        assert_eq!(top["ranges"], json!([range_uri("LOG_0002")]));
        assert!(top.get("canvases").is_none());
        assert!(top.get("@context").is_none());
        assert!(top.get("within").is_none());

        let leaf = &docs[1];
        assert!(leaf.get("viewingHint").is_none());
        assert_eq!(leaf["canvases"], json!(["https://iiif.test/iiif/canvas/s2.json"]));
        assert_eq!(leaf["metadata"], json!([{"label": "Image Range", "value": "1v"}]));
    }

    #[tokio::test]
    async fn test_direct_range() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let composite = format!("{}/LOG_0002", testing::OBJECT);
        let doc = to_document(&create_range(&ctx, &composite).await.unwrap().unwrap()).unwrap();
        assert_eq!(doc["@context"], "http://iiif.io/api/presentation/2/context.json");
        assert_eq!(doc["@id"], range_uri("LOG_0002"));
        assert_eq!(
            doc["within"],
            json!([{"id": format!("https://iiif.test/iiif/manifest/{}.json", testing::OBJECT), "type": "Manifest"}])
        );

        let missing = format!("{}/LOG_9999", testing::OBJECT);
        assert!(create_range(&ctx, &missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_range_id_skips_backend() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);
        assert!(create_range(&ctx, "no-separator").await.unwrap().is_none());
        assert!(backend.calls().is_empty());
    }
}
