use serde::Serialize;

use super::annotation::{text_annotation, Annotation};
use crate::iiif::{AssemblyContext, ANNOTATION_WITH_BODIES};
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

/// A page of text annotations. Only ever requested directly.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationList {
    #[serde(rename = "@context")]
    pub context: Context,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub label: Option<String>,
    pub resources: Vec<Annotation>,
}

pub async fn annotation_list(ctx: &AssemblyContext<'_>, row: &Row) -> Result<AnnotationList, BackendError> {
    let query = SolrQuery::new("*:*")
        .filter("type:annotation")
        .filter(format!("annotationpage_id:\"{}\"", row.id()))
        .fields(["*", ANNOTATION_WITH_BODIES]);

    let resources = ctx
        .search_all(query)
        .await?
        .iter()
        .map(|a| text_annotation(ctx, a, false))
        .collect();

    Ok(AnnotationList {
        context: Context::PresentationV2,
        id: ctx.annotation_list_id(row.id()),
        kind: "sc:AnnotationList",
        label: row.str("label_s").map(str::to_string),
        resources,
    })
}

pub async fn create_annotation_list(
    ctx: &AssemblyContext<'_>,
    list_id: &str,
) -> Result<Option<AnnotationList>, BackendError> {
    let query = SolrQuery::new("*:*")
        .filter(format!("id:\"{}\"", list_id))
        .fields(["id", "label_s"]);

    match ctx.search_one(query).await? {
        Some(row) => Ok(Some(annotation_list(ctx, &row).await?)),
        None => Ok(None),
    }
}
