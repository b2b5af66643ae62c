//! v2 annotations: image painting annotations and text annotations.

use serde::Serialize;

use super::{ImageService, TypedRef};
use crate::iiif::{annotation_bodies, escape_html, xywh, AnnotationBody, AssemblyContext, ANNOTATION_WITH_BODIES};
use crate::render::Context;
use crate::solr::{BackendError, Row, SolrQuery};

/// Section headers for the concatenated body, by language code.
const LANGUAGE_HEADERS: &[(&str, &str)] = &[
    ("ar-latn", "Arabic (Romanized)"),
    ("ar", "Arabic"),
    ("en", "English"),
];

fn language_header(language: Option<&str>) -> Option<&'static str> {
    let language = language?;
    LANGUAGE_HEADERS
        .iter()
        .find(|(code, _)| *code == language)
        .map(|(_, header)| *header)
}

#[derive(Debug, Clone, Serialize)]
pub struct Annotation {
    #[serde(rename = "@context")]
    pub context: Option<Context>,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub motivation: &'static str,
    pub on: Target,
    pub resource: Resource,
}

/// What an annotation is painted on.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Target {
    /// A canvas URI, optionally with an `#xywh=` fragment.
    Canvas(String),
    /// A region with an SVG shape.
    Selector(Vec<SpecificResource>),
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecificResource {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub full: String,
    pub selector: ChoiceSelector,
    pub within: TypedRef,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceSelector {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub default: ValueSelector,
    pub item: ValueSelector,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueSelector {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Image(Image),
    Text(Vec<TextResource>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Image {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub format: &'static str,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub service: ImageService,
}

impl Image {
    pub fn from_row(ctx: &AssemblyContext<'_>, row: &Row) -> Self {
        let id = ctx.image_id(row.id());
        Self {
            id: id.clone(),
            kind: "dctypes:Image",
            format: "image/jpeg",
            width: row.int("width_i"),
            height: row.int("height_i"),
            service: ImageService::new(id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TextResource {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub chars: String,
    pub format: &'static str,
    pub language: Option<String>,
}

impl TextResource {
    fn html(chars: String, language: Option<String>) -> Self {
        Self {
            kind: "dctypes:Text",
            chars,
            format: "text/html",
            language,
        }
    }
}

/// One resource per body. With no bodies a single empty resource is emitted;
/// with several, a final resource concatenates them all under language headers.
fn text_resources(bodies: &[AnnotationBody]) -> Vec<TextResource> {
    if bodies.is_empty() {
        return vec![TextResource::html(String::new(), None)];
    }

    let mut resources: Vec<TextResource> = bodies
        .iter()
        .map(|b| TextResource::html(b.html(), b.language.clone()))
        .collect();

    if bodies.len() > 1 {
        let concatenated: String = bodies
            .iter()
            .map(|b| {
                let text = escape_html(&b.text);
                let contents = match language_header(b.language.as_deref()) {
                    Some(header) => format!("<strong>{}</strong><br/>{}", header, text),
                    None => text,
                };
                format!("<p dir=\"{}\">{}</p>", b.direction, contents)
            })
            .collect();
        resources.push(TextResource::html(concatenated, None));
    }

    resources
}

fn canvas_target(ctx: &AssemblyContext<'_>, row: &Row) -> String {
    ctx.canvas_id(row.str("surface_id").unwrap_or_default())
}

/// Image annotation from an image row.
pub fn image_annotation(ctx: &AssemblyContext<'_>, row: &Row, direct: bool) -> Annotation {
    Annotation {
        context: Context::when(direct, Context::PresentationV2),
        id: ctx.annotation_id(row.id()),
        kind: "oa:Annotation",
        motivation: "sc:painting",
        on: Target::Canvas(canvas_target(ctx, row)),
        resource: Resource::Image(Image::from_row(ctx, row)),
    }
}

/// Text annotation from an annotation row with its body children.
pub fn text_annotation(ctx: &AssemblyContext<'_>, row: &Row, direct: bool) -> Annotation {
    let canvas = canvas_target(ctx, row);

    let on = match row.str("svg_s") {
        None => Target::Canvas(format!("{}#{}", canvas, xywh(row))),
        Some(svg) => Target::Selector(vec![SpecificResource {
            kind: "oa:SpecificResource",
            full: canvas,
            selector: ChoiceSelector {
                kind: "oa:Choice",
                default: ValueSelector {
                    kind: "oa:FragmentSelector",
                    value: xywh(row),
                },
                item: ValueSelector {
                    kind: "oa:SvgSelector",
                    value: svg.to_string(),
                },
            },
            within: TypedRef::new(
                ctx.manifest_id(row.str("object_id").unwrap_or_default()),
                "sc:Manifest",
            ),
        }]),
    };

    Annotation {
        context: Context::when(direct, Context::PresentationV2),
        id: ctx.annotation_id(row.id()),
        kind: "oa:Annotation",
        motivation: "sc:painting",
        on,
        resource: Resource::Text(text_resources(&annotation_bodies(row))),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iiif::testing;
    use crate::render::to_document;
    use crate::solr::memory::MemoryBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_direct_image_annotation_has_context() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let anno = create_annotation(&ctx, "s1").await.unwrap().unwrap();
        let doc = to_document(&anno).unwrap();

        assert_eq!(doc["@context"], "http://iiif.io/api/presentation/2/context.json");
        assert_eq!(doc["@id"], "https://iiif.test/iiif/annotation/s1.json");
        assert_eq!(doc["on"], "https://iiif.test/iiif/canvas/s1.json");
        assert_eq!(doc["resource"]["@id"], "https://iiif.test/iiif/image/s1");
        assert_eq!(doc["resource"]["width"], 1000);
        assert_eq!(doc["resource"]["service"]["profile"], "http://iiif.io/api/image/2/level1.json");
    }

    #[tokio::test]
    async fn test_text_annotation_fallback() {
        let backend = MemoryBackend::new(testing::fixture());
        let ctx = testing::ctx(&backend);

        let anno = create_annotation(&ctx, "a1").await.unwrap().unwrap();
        let doc = to_document(&anno).unwrap();

        assert_eq!(doc["on"], "https://iiif.test/iiif/canvas/s1.json#xywh=10,20,30,40");
        let resources = doc["resource"].as_array().unwrap();
        // two bodies plus the concatenated one
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[0]["chars"], "<p dir=\"ltr\">Hello &amp; &lt;world&gt;</p>");
        assert_eq!(resources[0]["language"], "en");
        assert_eq!(
            resources[2]["chars"],
            "<p dir=\"ltr\"><strong>English</strong><br/>Hello &amp; &lt;world&gt;</p>\
             <p dir=\"rtl\"><strong>Arabic</strong><br/>Marhaba</p>"
        );
        assert!(resources[2].get("language").is_none());

        assert!(create_annotation(&ctx, "missing").await.unwrap().is_none());
    }

    #[test]
    fn test_empty_body_and_svg_selector() {
        let backend = MemoryBackend::default();
        let ctx = testing::ctx(&backend);
        let row = Row::from(json!({
            "id": "a9", "object_id": "obj", "surface_id": "s9_surface",
            "ulx_i": 1, "uly_i": 2, "width_i": 3, "height_i": 4,
            "svg_s": "<svg/>"
        }));

        let doc = to_document(&text_annotation(&ctx, &row, false)).unwrap();
        assert!(doc.get("@context").is_none());
        assert_eq!(doc["resource"], json!([{"@type": "dctypes:Text", "chars": "", "format": "text/html"}]));

        let on = &doc["on"][0];
        assert_eq!(on["full"], "https://iiif.test/iiif/canvas/s9.json");
        assert_eq!(on["selector"]["default"]["value"], "xywh=1,2,3,4");
        assert_eq!(on["selector"]["item"]["value"], "<svg/>");
        assert_eq!(on["within"]["@id"], "https://iiif.test/iiif/manifest/obj.json");
    }

    #[test]
    fn test_unknown_language_has_no_header() {
        let bodies = vec![
            AnnotationBody { language: Some("fr".into()), direction: "ltr".into(), text: "Bonjour".into() },
            AnnotationBody { language: Some("ar-latn".into()), direction: "ltr".into(), text: "Salaam".into() },
        ];
        let resources = text_resources(&bodies);
        assert_eq!(
            resources[2].chars,
            "<p dir=\"ltr\">Bonjour</p><p dir=\"ltr\"><strong>Arabic (Romanized)</strong><br/>Salaam</p>"
        );
    }
}
