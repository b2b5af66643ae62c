//! v3 annotations.
//!
//! Image annotations paint an image onto its canvas; text annotations
//! supplement a canvas region with one textual body per language.

use serde::Serialize;

use super::ImageService;
use crate::iiif::{annotation_bodies, xywh, AssemblyContext, ANNOTATION_WITH_BODIES};
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    #[serde(rename = "@context")]
    pub context: Option<Context>,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub motivation: &'static str,
    pub target: Target,
    pub body: Body,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Target {
    Canvas(String),
    Region(SpecificResource),
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecificResource {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub source: String,
    pub selector: Vec<Selector>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Selector {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Body {
    Image(Image),
    Text(Vec<TextualBody>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Image {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub format: &'static str,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub service: Vec<ImageService>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextualBody {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub format: &'static str,
    pub language: Option<String>,
}

fn canvas_target(ctx: &AssemblyContext<'_>, row: &Row) -> String {
    ctx.canvas_id(row.str("surface_id").unwrap_or_default())
}

pub fn image_annotation(ctx: &AssemblyContext<'_>, row: &Row, direct: bool) -> Annotation {
    let image = ctx.image_id(row.id());

    Annotation {
        context: Context::when(direct, Context::PresentationV3),
        id: ctx.annotation_id(row.id()),
        kind: "Annotation",
        motivation: "painting",
        target: Target::Canvas(canvas_target(ctx, row)),
        body: Body::Image(Image {
            id: image.clone(),
            kind: "Image",
            format: "image/jpeg",
            width: row.int("width_i"),
            height: row.int("height_i"),
            service: vec![ImageService::new(image)],
        }),
    }
}

pub fn text_annotation(ctx: &AssemblyContext<'_>, row: &Row, direct: bool) -> Annotation {
    let canvas = canvas_target(ctx, row);

    let target = match row.str("svg_s") {
        None => Target::Canvas(format!("{}#{}", canvas, xywh(row))),
        Some(svg) => Target::Region(SpecificResource {
            kind: "SpecificResource",
            source: canvas,
            selector: vec![
                Selector {
                    kind: "FragmentSelector",
                    value: xywh(row),
                },
                Selector {
                    kind: "SvgSelector",
                    value: svg.to_string(),
                },
            ],
        }),
    };

    let bodies = annotation_bodies(row)
        .into_iter()
        .map(|b| TextualBody {
            kind: "TextualBody",
            value: b.html(),
            format: "text/html",
            language: b.language,
        })
        .collect();

    Annotation {
        context: Context::when(direct, Context::PresentationV3),
        id: ctx.annotation_id(row.id()),
        kind: "Annotation",
        motivation: "supplementing",
        target,
        body: Body::Text(bodies),
    }
}

/// Direct annotation lookup: the image annotation `{id}_image` first, then a text annotation.
pub async fn create_annotation(
    ctx: &AssemblyContext<'_>,
    annotation_id: &str,
) -> Result<Option<Annotation>, BackendError> {
    let image = SolrQuery::new("*:*")
        .filter("type:image")
        .filter(format!("id:{}_image", annotation_id))
        .fields(["id", "surface_id", "width_i", "height_i", "object_id"]);

    if let Some(row) = ctx.search_one(image).await? {
        return Ok(Some(image_annotation(ctx, &row, true)));
    }

    let text = SolrQuery::new("*:*")
        .filter("type:annotation")
        .filter(format!("id:{}", annotation_id))
        .fields(["*", ANNOTATION_WITH_BODIES]);

    Ok(ctx
        .search_one(text)
        .await?
        .map(|row| text_annotation(ctx, &row, true)))
}
