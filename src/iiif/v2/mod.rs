//! IIIF Presentation 2.1 assemblers.

pub mod annotation;
pub mod annotation_list;
pub mod canvas;
pub mod collection;
pub mod manifest;
pub mod sequence;
pub mod structure;

pub use annotation::create_annotation;
pub use annotation_list::create_annotation_list;
pub use canvas::create_canvas;
pub use collection::create_collection;
pub use manifest::create_manifest;
pub use sequence::create_sequence;
pub use structure::create_range;

use serde::Serialize;

use super::{AssemblyContext, IMAGE_API_V2_CONTEXT, IMAGE_API_V2_LEVEL1};

/// Level 1 image service block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageService {
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub profile: &'static str,
    #[serde(rename = "@id")]
    pub id: String,
}

impl ImageService {
    pub fn new(id: String) -> Self {
        Self {
            context: IMAGE_API_V2_CONTEXT,
            profile: IMAGE_API_V2_LEVEL1,
            id,
        }
    }
}

/// A thumbnail or logo: a sized rendition plus its image service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thumbnail {
    #[serde(rename = "@id")]
    pub id: String,
    pub service: ImageService,
}

impl Thumbnail {
    /// `None` when the object names no image.
    pub fn for_image(ctx: &AssemblyContext<'_>, image_id: Option<&str>) -> Option<Self> {
        let image = ctx.image_id(image_id?);
        Some(Self {
            id: ctx.thumbnail_url(&image),
            service: ImageService::new(image),
        })
    }
}

/// `{"@id": ..., "@type": ...}` pointer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedRef {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: &'static str,
}

impl TypedRef {
    pub fn new(id: String, kind: &'static str) -> Self {
        Self { id, kind }
    }
}
