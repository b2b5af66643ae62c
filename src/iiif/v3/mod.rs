//! IIIF Presentation 3.0 assemblers.

pub mod annotation;
pub mod annotation_page;
pub mod canvas;
pub mod collection;
pub mod manifest;
pub mod structure;

pub use annotation::create_annotation;
pub use annotation_page::create_annotation_page;
pub use canvas::create_canvas;
pub use collection::create_collection;
pub use manifest::create_manifest;
pub use structure::create_range;

use serde::Serialize;

use super::AssemblyContext;
use crate::metadata::LanguageMap;
use crate::solr::BackendError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageService {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub profile: &'static str,
}

impl ImageService {
    pub fn new(id: String) -> Self {
        Self {
            id,
            kind: "ImageService2",
            profile: "level1",
        }
    }
}

/// Sized rendition of an image with its service, used for logos and thumbnails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub service: Vec<ImageService>,
}

impl ImageRef {
    pub fn for_image(ctx: &AssemblyContext<'_>, image_id: Option<&str>) -> Option<Vec<Self>> {
        let image = ctx.image_id(image_id?);
        Some(vec![Self {
            id: ctx.thumbnail_url(&image),
            kind: "Image",
            service: vec![ImageService::new(image)],
        }])
    }
}

/// Labelled back-reference from a directly requested resource to its manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub label: LanguageMap,
}

/// `partOf` for direct requests; `None` when embedded or the object is gone.
pub async fn manifest_part_of(
    ctx: &AssemblyContext<'_>,
    object_id: &str,
    direct: bool,
) -> Result<Option<Vec<ManifestRef>>, BackendError> {
    if !direct {
        return Ok(None);
    }

    Ok(ctx.object_shelfmark(object_id).await?.map(|shelfmark| {
        vec![ManifestRef {
            id: ctx.manifest_id(object_id),
            kind: "Manifest",
            label: LanguageMap::en(shelfmark),
        }]
    }))
}
