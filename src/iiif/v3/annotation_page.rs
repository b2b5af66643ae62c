use serde::Serialize;

use super::annotation::{image_annotation, text_annotation, Annotation};
use super::{manifest_part_of, ManifestRef};
use crate::iiif::{AssemblyContext, ANNOTATION_WITH_BODIES};
use crate::metadata::LanguageMap;
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

#[derive(Debug, Clone, Serialize)]
pub struct AnnotationPage {
    #[serde(rename = "@context")]
    pub context: Option<Context>,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: Option<LanguageMap>,
    #[serde(rename = "partOf")]
    pub part_of: Option<Vec<ManifestRef>>,
    pub items: Vec<Annotation>,
}

/// The painting page of a surface: one annotation per child image.
pub async fn image_page(ctx: &AssemblyContext<'_>, row: &Row, direct: bool) -> Result<AnnotationPage, BackendError> {
    Ok(AnnotationPage {
        context: Context::when(direct, Context::PresentationV3),
        id: ctx.annotation_page_id(row.id()),
        kind: "AnnotationPage",
        label: None,
        part_of: manifest_part_of(ctx, row.str("object_id").unwrap_or_default(), direct).await?,
        items: row
            .children
            .iter()
            .map(|image| image_annotation(ctx, image, false))
            .collect(),
    })
}

/// A page of text annotations, fetched by `annotationpage_id`.
pub async fn text_page(ctx: &AssemblyContext<'_>, row: &Row, direct: bool) -> Result<AnnotationPage, BackendError> {
    let query = SolrQuery::new("*:*")
        .filter("type:annotation")
        .filter(format!("annotationpage_id:{}", row.id()))
        .fields(["*", ANNOTATION_WITH_BODIES]);

    let annotations = ctx.search_all(query).await?;

    Ok(AnnotationPage {
        context: Context::when(direct, Context::PresentationV3),
        id: ctx.annotation_page_id(row.id()),
        kind: "AnnotationPage",
        label: row.str("label_s").map(LanguageMap::en),
        part_of: manifest_part_of(ctx, row.str("object_id").unwrap_or_default(), direct).await?,
        items: annotations
            .iter()
            .map(|a| text_annotation(ctx, a, false))
            .collect(),
    })
}

/// Direct page request. The id is either a surface (image page) or a text annotation page.
pub async fn create_annotation_page(
    ctx: &AssemblyContext<'_>,
    page_id: &str,
) -> Result<Option<AnnotationPage>, BackendError> {
    let query = SolrQuery::new("*:*")
        .filter(format!("id:\"{}_surface\" OR id:{}", page_id, page_id))
        .fields([r#"*,[child parentFilter="type:surface OR type:annotationpage" childFilter="type:image"]"#])
        .sort("sort_i asc");

    let Some(row) = ctx.search_one(query).await? else {
        return Ok(None);
    };

    match row.str("type") {
        Some("surface") => Ok(Some(image_page(ctx, &row, true).await?)),
        Some("annotationpage") => Ok(Some(text_page(ctx, &row, true).await?)),
        _ => Ok(None),
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
    async fn test_surface_page_holds_image_annotations() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let doc = to_document(&create_annotation_page(&ctx, "s1").await.unwrap().unwrap()).unwrap();
        assert_eq!(doc["id"], "https://iiif.test/iiif/annotationpage/s1.json");
        assert_eq!(doc["partOf"][0]["label"], json!({"en": ["MS. Test 1"]}));
        assert!(doc.get("label").is_none());

        let items = doc["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["motivation"], "painting");
        assert!(items[0].get("@context").is_none());
    }

    #[tokio::test]
    async fn test_text_page() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let doc = to_document(&create_annotation_page(&ctx, "ap1").await.unwrap().unwrap()).unwrap();
        assert_eq!(doc["@context"][1], "http://iiif.io/api/presentation/3/context.json");
        assert_eq!(doc["label"], json!({"en": ["Transcription"]}));
        assert_eq!(doc["items"][0]["id"], "https://iiif.test/iiif/annotation/a1.json");
        assert_eq!(doc["items"][0]["body"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_page() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);
        assert!(create_annotation_page(&ctx, "nope").await.unwrap().is_none());
        // an object id matches a row, but not one that has a page
        assert!(create_annotation_page(&ctx, testing::OBJECT).await.unwrap().is_none());
    }
}
