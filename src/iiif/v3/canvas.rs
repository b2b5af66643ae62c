use serde::Serialize;

use super::annotation_page::{image_page, AnnotationPage};
use super::{manifest_part_of, ManifestRef};
use crate::iiif::{canvas_dimensions, AssemblyContext, Reference, SURFACE_WITH_IMAGES};
use crate::metadata::{non_empty, v3_metadata_block, FieldTable, LanguageMap, V3MetadataEntry};
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

#[derive(Debug, Clone, Serialize)]
pub struct Canvas {
    #[serde(rename = "@context")]
    pub context: Option<Context>,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: Option<LanguageMap>,
    pub width: i64,
    pub height: i64,
    #[serde(rename = "partOf")]
    pub part_of: Option<Vec<ManifestRef>>,
    pub metadata: Option<Vec<V3MetadataEntry>>,
    pub items: Vec<AnnotationPage>,
    pub annotations: Option<Vec<Reference>>,
}

pub async fn canvas(
    ctx: &AssemblyContext<'_>,
    row: &Row,
    has_annotations: bool,
    direct: bool,
) -> Result<Canvas, BackendError> {
    let (width, height) = canvas_dimensions(row);

    let annotations = if has_annotations || direct {
        let pages = ctx.annotation_page_ids(row.id()).await?;
        non_empty(
            pages
                .iter()
                .map(|id| Reference::new(ctx.annotation_page_id(id), "AnnotationPage"))
                .collect(),
        )
    } else {
        None
    };

    Ok(Canvas {
        context: Context::when(direct, Context::PresentationV3),
        id: ctx.canvas_id(row.id()),
        kind: "Canvas",
        label: row.str("label_s").map(LanguageMap::en),
        width,
        height,
        part_of: manifest_part_of(ctx, row.str("object_id").unwrap_or_default(), direct).await?,
        metadata: non_empty(v3_metadata_block(row, FieldTable::Canvas)),
        items: vec![image_page(ctx, row, false).await?],
        annotations,
    })
}

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
