use serde::Serialize;

use super::canvas::{canvas, Canvas};
use crate::iiif::{AssemblyContext, SURFACE_WITH_IMAGES};
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

#[derive(Debug, Clone, Serialize)]
pub struct Sequence {
    #[serde(rename = "@context")]
    pub context: Option<Context>,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub label: &'static str,
    pub canvases: Option<Vec<Canvas>>,
}

/// The default sequence of an object: every surface in `sort_i` order.
///
/// One existence query for annotation pages covers the whole object, so
/// canvases of unannotated objects never query for their own pages.
pub async fn sequence(ctx: &AssemblyContext<'_>, row: &Row, direct: bool) -> Result<Sequence, BackendError> {
    let object_id = row.id();
    let has_annotations = ctx.has_annotations(object_id).await?;

    let query = SolrQuery::new("*:*")
        .filter("type:surface")
        .filter(format!("object_id:{}", object_id))
        .fields([SURFACE_WITH_IMAGES])
        .sort("sort_i asc");

    let surfaces = ctx.search_all(query).await?;

    let canvases = if surfaces.is_empty() {
        None
    } else {
        let mut canvases = Vec::with_capacity(surfaces.len());
        for surface in &surfaces {
            canvases.push(canvas(ctx, surface, has_annotations, false).await?);
        }
        Some(canvases)
    };

    Ok(Sequence {
        context: Context::when(direct, Context::PresentationV2),
        id: ctx.sequence_id(object_id),
        kind: "sc:Sequence",
        label: "Default",
        canvases,
    })
}

pub async fn create_sequence(ctx: &AssemblyContext<'_>, sequence_id: &str) -> Result<Option<Sequence>, BackendError> {
    let query = SolrQuery::new("*:*")
        .filter("type:object")
        .filter(format!("id:{}", sequence_id));

    match ctx.search_one(query).await? {
        Some(row) => Ok(Some(sequence(ctx, &row, true).await?)),
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
    async fn test_canvases_in_sort_order() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let doc = to_document(&create_sequence(&ctx, testing::OBJECT).await.unwrap().unwrap()).unwrap();
        assert_eq!(doc["@context"], "http://iiif.io/api/presentation/2/context.json");
        assert_eq!(
            doc["@id"],
            format!("https://iiif.test/iiif/sequence/{}_default.json", testing::OBJECT)
        );
        assert_eq!(doc["label"], "Default");

        let canvases = doc["canvases"].as_array().unwrap();
        let labels: Vec<_> = canvases.iter().map(|c| c["label"].clone()).collect();
        assert_eq!(labels, vec![json!("1r"), json!("1v")]);
        assert!(canvases.iter().all(|c| c.get("@context").is_none()));
        assert_eq!(canvases[0]["otherContent"][0]["@type"], "sc:AnnotationList");
        assert!(canvases[1].get("otherContent").is_none());
    }

    #[tokio::test]
    async fn test_annotation_check_is_one_count_query() {
        let backend = MemoryBackend::new(vec![
            json!({"id": "o", "type": "object"}),
            json!({"id": "a_surface", "type": "surface", "object_id": "o", "sort_i": 1}),
            json!({"id": "b_surface", "type": "surface", "object_id": "o", "sort_i": 2}),
        ]);
        let ctx = testing::ctx(&backend);
        let row = Row::from(json!({"id": "o"}));

        let seq = sequence(&ctx, &row, false).await.unwrap();
        assert_eq!(seq.canvases.as_ref().map(Vec::len), Some(2));

        let calls = backend.calls();
        let annotation_queries: Vec<_> = calls
            .iter()
            .filter(|q| q.fq.iter().any(|f| f == "type:annotationpage"))
            .collect();
        assert_eq!(annotation_queries.len(), 1);
        assert_eq!(annotation_queries[0].rows, Some(0));
    }

    #[tokio::test]
    async fn test_no_surfaces_omits_canvases() {
        let backend = MemoryBackend::new(vec![json!({"id": "o", "type": "object"})]);
        let ctx = testing::ctx(&backend);
        let doc = to_document(&sequence(&ctx, &Row::from(json!({"id": "o"})), false).await.unwrap()).unwrap();
        assert!(doc.get("canvases").is_none());
        assert!(doc.get("@context").is_none());
    }
}
