//! HTTP surface: routing, content negotiation and error mapping.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::identifiers::RequestBase;
use crate::iiif::activity::{self, ALL_CHANGES};
use crate::iiif::{root, v2, v3, AssemblyContext, Version};
use crate::render::{self, IIIF_ASTREAMS_CONTEXT};
use crate::solr::{BackendError, SearchBackend};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn SearchBackend>,
    pub config: Arc<ServerConfig>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("An object of ID {0} was not found.")]
    NotFound(String),
    #[error("The requested resource was not found")]
    ResourceNotFound,
    #[error("The requested resource is not available as a IIIFv{} response.", .0.number())]
    NotAcceptable(Version),
    #[error("Search backend failure: {0}")]
    Backend(#[from] BackendError),
    #[error("Could not serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) | Self::ResourceNotFound => StatusCode::NOT_FOUND,
            Self::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            Self::Backend(_) | Self::Serialize(_) => {
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info.json", get(info))
        .route("/iiif/manifest/{file}", get(manifest))
        .route("/iiif/canvas/{file}", get(canvas))
        .route("/iiif/sequence/{file}", get(sequence))
        .route("/iiif/annotationlist/{file}", get(annotation_list))
        .route("/iiif/annotationpage/{file}", get(annotation_page))
        .route("/iiif/annotation/{file}", get(annotation))
        .route("/iiif/collection/{id}", get(collection))
        .route("/iiif/range/{id}/{range}", get(range))
        .route("/iiif/activity/{name}", get(activity_stream))
        .route("/iiif/activity/create/{id}", get(create_activity))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Per-request negotiation result: schema version, base URL and `Accept`.
struct Negotiation {
    version: Version,
    accept: Option<String>,
    base: RequestBase,
}

impl Negotiation {
    fn from_headers(headers: &HeaderMap) -> Self {
        let accept = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            version: Version::from_accept(accept.as_deref()),
            accept,
            base: RequestBase::from_headers(headers),
        }
    }

    fn ctx<'a>(&'a self, state: &'a AppState) -> AssemblyContext<'a> {
        AssemblyContext::new(state.backend.as_ref(), &state.config, &self.base)
    }

    /// Plain JSON for clients that ask for something other than JSON-LD.
    fn content_type(&self, profile: &str) -> String {
        match &self.accept {
            Some(accept) if !accept.contains("ld+json") => "application/json".to_string(),
            _ => format!("application/ld+json;profile=\"{}\"", profile),
        }
    }

    fn respond<T: Serialize>(
        &self,
        state: &AppState,
        id: &str,
        doc: Option<T>,
        profile: &str,
        missing: AppError,
    ) -> Result<Response, AppError> {
        let Some(doc) = doc else {
            debug!("No document for {}", id);
            return Err(missing);
        };

        let body = render::to_body(&render::to_document(&doc)?, state.config.common.debug)?;
        Ok(([(header::CONTENT_TYPE, self.content_type(profile))], body).into_response())
    }

    fn presentation<T: Serialize>(&self, state: &AppState, id: &str, doc: Option<T>) -> Result<Response, AppError> {
        self.respond(state, id, doc, &self.version.profile(), AppError::NotFound(id.to_string()))
    }

    fn activity<T: Serialize>(&self, state: &AppState, id: &str, doc: Option<T>) -> Result<Response, AppError> {
        self.respond(state, id, doc, IIIF_ASTREAMS_CONTEXT[0], AppError::ResourceNotFound)
    }
}

/// Strip `suffix` and require a UUID; anything else is treated as not found.
fn object_id(file: &str, suffix: &str) -> Result<String, AppError> {
    let id = file.strip_suffix(suffix).unwrap_or(file);
    Uuid::parse_str(id).map_err(|_| AppError::NotFound(id.to_string()))?;
    Ok(id.to_string())
}

async fn health() -> &'static str {
    "ok"
}

async fn info(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, AppError> {
    let neg = Negotiation::from_headers(&headers);
    let doc = root::create_root(&neg.ctx(&state));
    neg.activity(&state, "info.json", Some(doc))
}

async fn manifest(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = object_id(&file, ".json")?;
    let neg = Negotiation::from_headers(&headers);
    let ctx = neg.ctx(&state);

    match neg.version {
        Version::V2 => neg.presentation(&state, &id, v2::create_manifest(&ctx, &id).await?),
        Version::V3 => neg.presentation(&state, &id, v3::create_manifest(&ctx, &id).await?),
    }
}

async fn canvas(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = object_id(&file, ".json")?;
    let neg = Negotiation::from_headers(&headers);
    let ctx = neg.ctx(&state);

    match neg.version {
        Version::V2 => neg.presentation(&state, &id, v2::create_canvas(&ctx, &id).await?),
        Version::V3 => neg.presentation(&state, &id, v3::create_canvas(&ctx, &id).await?),
    }
}

async fn sequence(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = object_id(&file, "_default.json")?;
    let neg = Negotiation::from_headers(&headers);
    if neg.version == Version::V3 {
        return Err(AppError::NotAcceptable(neg.version));
    }

    let ctx = neg.ctx(&state);
    neg.presentation(&state, &id, v2::create_sequence(&ctx, &id).await?)
}

async fn annotation_list(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = object_id(&file, ".json")?;
    let neg = Negotiation::from_headers(&headers);
    if neg.version == Version::V3 {
        return Err(AppError::NotAcceptable(neg.version));
    }

    let ctx = neg.ctx(&state);
    neg.presentation(&state, &id, v2::create_annotation_list(&ctx, &id).await?)
}

async fn annotation_page(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = object_id(&file, ".json")?;
    let neg = Negotiation::from_headers(&headers);
    if neg.version == Version::V2 {
        return Err(AppError::NotAcceptable(neg.version));
    }

    let ctx = neg.ctx(&state);
    neg.presentation(&state, &id, v3::create_annotation_page(&ctx, &id).await?)
}

async fn annotation(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = object_id(&file, ".json")?;
    let neg = Negotiation::from_headers(&headers);
    let ctx = neg.ctx(&state);

    match neg.version {
        Version::V2 => neg.presentation(&state, &id, v2::create_annotation(&ctx, &id).await?),
        Version::V3 => neg.presentation(&state, &id, v3::create_annotation(&ctx, &id).await?),
    }
}

async fn collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let neg = Negotiation::from_headers(&headers);
    let ctx = neg.ctx(&state);

    match neg.version {
        Version::V2 => neg.presentation(&state, &id, v2::create_collection(&ctx, &id).await?),
        Version::V3 => neg.presentation(&state, &id, v3::create_collection(&ctx, &id).await?),
    }
}

async fn range(
    State(state): State<AppState>,
    Path((id, range)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = object_id(&id, "")?;
    let composite = format!("{}/{}", id, range);
    let neg = Negotiation::from_headers(&headers);
    let ctx = neg.ctx(&state);

    match neg.version {
        Version::V2 => neg.presentation(&state, &composite, v2::create_range(&ctx, &composite).await?),
        Version::V3 => neg.presentation(&state, &composite, v3::create_range(&ctx, &composite).await?),
    }
}

/// `all-changes` or `page-{n}`; activity streams are not version-negotiated.
async fn activity_stream(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let neg = Negotiation::from_headers(&headers);
    let ctx = neg.ctx(&state);

    if name == ALL_CHANGES {
        return neg.activity(&state, &name, activity::create_ordered_collection(&ctx).await?);
    }

    match activity::parse_page(&name) {
        Some(n) => neg.activity(&state, &name, activity::create_ordered_collection_page(&ctx, n).await?),
        None => Err(AppError::ResourceNotFound),
    }
}

async fn create_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = object_id(&id, "").map_err(|_| AppError::ResourceNotFound)?;
    let neg = Negotiation::from_headers(&headers);
    let ctx = neg.ctx(&state);
    neg.activity(&state, &id, activity::create_activity(&ctx, &id).await?)
}
