use serde::Serialize;

use super::annotation::{image_annotation, Annotation};
use super::TypedRef;
use crate::iiif::{canvas_dimensions, AssemblyContext, SURFACE_WITH_IMAGES};
use crate::metadata::{non_empty, v2_metadata_block, FieldTable, V2MetadataEntry};
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

#[derive(Debug, Clone, Serialize)]
pub struct Canvas {
    #[serde(rename = "@context")]
    pub context: Option<Context>,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub label: Option<String>,
    pub width: i64,
    pub height: i64,
    pub images: Vec<Annotation>,
    pub within: Option<Vec<ManifestRef>>,
    pub metadata: Option<Vec<V2MetadataEntry>>,
    #[serde(rename = "otherContent")]
    pub other_content: Option<Vec<TypedRef>>,
}

/// Back-reference from a directly requested canvas to its manifest.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestRef {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub label: String,
}

/// Assemble a canvas from a surface row carrying its image children.
///
/// Annotation lists are only looked up when the object has any (`has_annotations`)
/// or the canvas is the response root.
pub async fn canvas(
    ctx: &AssemblyContext<'_>,
    row: &Row,
    has_annotations: bool,
    direct: bool,
) -> Result<Canvas, BackendError> {
    let (width, height) = canvas_dimensions(row);

    let within = if direct {
        let object_id = row.str("object_id").unwrap_or_default();
        ctx.object_shelfmark(object_id).await?.map(|label| {
            vec![ManifestRef {
                id: ctx.manifest_id(object_id),
                kind: "Manifest",
                label,
            }]
        })
    } else {
        None
    };

    let other_content = if has_annotations || direct {
        let pages = ctx.annotation_page_ids(row.id()).await?;
        non_empty(
            pages
                .iter()
                .map(|id| TypedRef::new(ctx.annotation_list_id(id), "sc:AnnotationList"))
                .collect(),
        )
    } else {
        None
    };

    Ok(Canvas {
        context: Context::when(direct, Context::PresentationV2),
        id: ctx.canvas_id(row.id()),
        kind: "sc:Canvas",
        label: row.str("label_s").map(str::to_string),
        width,
        height,
        images: row
            .children
            .iter()
            .map(|image| image_annotation(ctx, image, false))
            .collect(),
        within,
        metadata: non_empty(v2_metadata_block(row, FieldTable::Canvas)),
        other_content,
    })
}

/// Direct canvas request; `canvas_id` lacks the `_surface` suffix.
pub async fn create_canvas(ctx: &AssemblyContext<'_>, canvas_id: &str) -> Result<Option<Canvas>, BackendError> {
    let query = SolrQuery::new("*:*")
        .filter("type:surface")
        .filter(format!("id:{}_surface", canvas_id))
        .fields([SURFACE_WITH_IMAGES])
        .sort("sort_i asc");

    match ctx.search_one(query).await? {
        Some(row) => Ok(Some(canvas(ctx, &row, false, true).await?)),
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
    async fn test_direct_canvas_points_back_to_manifest() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let doc = to_document(&create_canvas(&ctx, "s1").await.unwrap().unwrap()).unwrap();
        assert_eq!(doc["@context"], "http://iiif.io/api/presentation/2/context.json");
        assert_eq!(doc["@id"], "https://iiif.test/iiif/canvas/s1.json");
        assert_eq!(doc["width"], 1000);
        assert_eq!(doc["height"], 1500);
        assert_eq!(
            doc["within"],
            json!([{"@id": format!("https://iiif.test/iiif/manifest/{}.json", testing::OBJECT),
                    "@type": "Manifest", "label": "MS. Test 1"}])
        );
        assert_eq!(doc["metadata"], json!([{"label": "Title", "value": "Psalter"}]));
        assert_eq!(doc["otherContent"][0]["@id"], "https://iiif.test/iiif/annotationlist/ap1.json");

        let image = &doc["images"][0];
        assert!(image.get("@context").is_none());
        assert_eq!(image["on"], "https://iiif.test/iiif/canvas/s1.json");
    }

    #[tokio::test]
    async fn test_embedded_canvas_without_images() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);
        let row = Row::from(json!({"id": "s2_surface", "object_id": testing::OBJECT, "label_s": "1v"}));

        let doc = to_document(&canvas(&ctx, &row, false, false).await.unwrap()).unwrap();
        assert_eq!(doc["width"], 0);
        assert_eq!(doc["height"], 0);
        assert_eq!(doc["images"], json!([]));
        for key in ["@context", "within", "metadata", "otherContent"] {
            assert!(doc.get(key).is_none(), "{} should be omitted", key);
        }
        // no annotation lookup without the object-level flag
        assert!(backend.calls().is_empty());
    }
}
