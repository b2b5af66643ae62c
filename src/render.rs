//! Document rendering: JSON-LD contexts and null filtering.
//!
//! Assemblers build typed documents whose optional fields serialize as
//! `null`. [`to_document`] strips every null-valued key from the whole tree in
//! one pass, so no emitted document ever carries `"key": null`.

use serde::{Serialize, Serializer};
use serde_json::Value;

pub const IIIF_V2_CONTEXT: &str = "http://iiif.io/api/presentation/2/context.json";

pub const IIIF_V3_CONTEXT: [&str; 2] = [
    "http://www.w3.org/ns/anno.jsonld",
    "http://iiif.io/api/presentation/3/context.json",
];

pub const IIIF_ASTREAMS_CONTEXT: [&str; 2] = [
    "http://iiif.io/api/discovery/0/context.json",
    "https://www.w3.org/ns/activitystreams",
];

/// Presentation 3 `Collection` term missing from the activity streams context.
const ROOT_COLLECTION_TERM: (&str, &str) = ("Collection", "http://iiif.io/api/presentation/3#Collection");

/// Which `@context` block a document root carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    PresentationV2,
    PresentationV3,
    ActivityStreams,
    /// Activity streams plus the Presentation 3 `Collection` term.
    Root,
}

impl Context {
    /// The context only for the root of a response.
    pub fn when(direct: bool, context: Context) -> Option<Context> {
        direct.then_some(context)
    }

    fn to_value(self) -> Value {
        match self {
            Self::PresentationV2 => Value::from(IIIF_V2_CONTEXT),
            Self::PresentationV3 => Value::from(IIIF_V3_CONTEXT.to_vec()),
            Self::ActivityStreams => Value::from(IIIF_ASTREAMS_CONTEXT.to_vec()),
            Self::Root => {
                let mut items: Vec<Value> = IIIF_ASTREAMS_CONTEXT.iter().map(|c| Value::from(*c)).collect();
                let (term, iri) = ROOT_COLLECTION_TERM;
                let mut extra = serde_json::Map::new();
                extra.insert(term.to_string(), Value::from(iri));
                items.push(Value::Object(extra));
                Value::Array(items)
            }
        }
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Remove null-valued object keys at every depth. Array elements are kept.
pub fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}

/// Serialize an assembled document and strip its null fields.
pub fn to_document<T: Serialize>(doc: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(doc).map(strip_nulls)
}

/// Encode a document body, pretty-printed in debug mode. Slashes are never escaped.
pub fn to_body(doc: &Value, pretty: bool) -> Result<Vec<u8>, serde_json::Error> {
    if pretty {
        serde_json::to_vec_pretty(doc)
    } else {
        serde_json::to_vec(doc)
    }
}
