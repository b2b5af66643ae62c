//! v3 ranges, nested recursively from the work tree.

use serde::Serialize;

use crate::hierarchy::{build_tree, find_in_tree, Work, WorkNode};
use crate::iiif::{split_range_id, AssemblyContext, Reference};
use crate::metadata::{non_empty, v3_metadata_block, FieldTable, LanguageMap, V3MetadataEntry};
use crate::render::Context;
use crate::solr::BackendError;

#[derive(Debug, Clone, Serialize)]
pub struct Range {
    #[serde(rename = "@context")]
    pub context: Option<Context>,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: Option<LanguageMap>,
    #[serde(rename = "partOf")]
    pub part_of: Option<Vec<Reference>>,
    pub metadata: Option<Vec<V3MetadataEntry>>,
    pub items: Vec<RangeItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RangeItem {
    Range(Range),
    Canvas(Reference),
}

fn work_range_id(ctx: &AssemblyContext<'_>, work: &Work) -> String {
    ctx.range_id(work.object_id(), &work.work_id)
}

/// One range with its subtree. Only `node` itself sees `direct`.
pub fn range(ctx: &AssemblyContext<'_>, node: &WorkNode, direct: bool) -> Range {
    let work = &node.work;

    let items = if node.is_range() {
        node.children
            .iter()
            .map(|child| RangeItem::Range(range(ctx, child, false)))
            .collect()
    } else {
        work.surfaces()
            .iter()
            .map(|s| RangeItem::Canvas(Reference::new(ctx.canvas_id(s), "Canvas")))
            .collect()
    };

    Range {
        context: Context::when(direct, Context::PresentationV3),
        id: work_range_id(ctx, work),
        kind: "Range",
        label: work.row.str("work_title_s").map(LanguageMap::en),
        part_of: direct.then(|| vec![Reference::new(ctx.manifest_id(work.object_id()), "Manifest")]),
        metadata: non_empty(v3_metadata_block(&work.row, FieldTable::Works)),
        items,
    }
}

/// Root ranges of an object, or `None` when it has no works.
pub async fn structures(ctx: &AssemblyContext<'_>, object_id: &str) -> Result<Option<Vec<Range>>, BackendError> {
    let tree = build_tree(ctx.works(object_id).await?);
    Ok(non_empty(tree.iter().map(|node| range(ctx, node, false)).collect()))
}

pub async fn create_range(ctx: &AssemblyContext<'_>, composite: &str) -> Result<Option<Range>, BackendError> {
    let Some((object_id, range_id)) = split_range_id(composite) else {
        return Ok(None);
    };

    let tree = build_tree(ctx.works(object_id).await?);
    let target = ctx.range_id(object_id, range_id);

    Ok(find_in_tree(&tree, &target, &|w: &Work| work_range_id(ctx, w)).map(|node| range(ctx, node, true)))
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
    async fn test_nested_structures() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let ranges = structures(&ctx, testing::OBJECT).await.unwrap().unwrap();
        assert_eq!(ranges.len(), 1);

        let doc = to_document(&ranges[0]).unwrap();
        assert_eq!(doc["id"], range_uri("LOG_0001"));
        assert_eq!(doc["label"], json!({"en": ["Part One"]}));
        assert!(doc.get("@context").is_none());

        let child = &doc["items"][0];
        assert_eq!(child["type"], "Range");
        assert_eq!(child["id"], range_uri("LOG_0002"));
        assert_eq!(
            child["items"],
            json!([{"id": "https://iiif.test/iiif/canvas/s2.json", "type": "Canvas"}])
        );
        assert_eq!(child["metadata"][0]["label"], json!({"en": ["Image Range"]}));
    }

    #[tokio::test]
    async fn test_direct_nested_range_only_root_has_context() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let composite = format!("{}/LOG_0001", testing::OBJECT);
        let doc = to_document(&create_range(&ctx, &composite).await.unwrap().unwrap()).unwrap();
        assert_eq!(doc["@context"][1], "http://iiif.io/api/presentation/3/context.json");
        assert_eq!(doc["partOf"][0]["type"], "Manifest");

        let child = &doc["items"][0];
        assert!(child.get("@context").is_none());
        assert!(child.get("partOf").is_none());
    }

    #[tokio::test]
    async fn test_direct_range_found_by_descent() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let composite = format!("{}/LOG_0002", testing::OBJECT);
        let doc = to_document(&create_range(&ctx, &composite).await.unwrap().unwrap()).unwrap();
        assert_eq!(doc["id"], range_uri("LOG_0002"));
        assert!(doc.get("@context").is_some());
    }

    #[tokio::test]
    async fn test_missing_and_malformed_ranges() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        assert!(create_range(&ctx, "a/b/c").await.unwrap().is_none());
        assert!(backend.calls().is_empty());

        let missing = format!("{}/LOG_9999", testing::OBJECT);
        assert!(create_range(&ctx, &missing).await.unwrap().is_none());
    }
}
