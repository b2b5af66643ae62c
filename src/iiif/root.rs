//! Discovery document served at `/info.json`.

use serde::Serialize;

use super::activity::ALL_CHANGES;
use super::{AssemblyContext, ALL_COLLECTION};
use crate::render::Context;

const TOP_COLLECTION: &str = "top";

#[derive(Debug, Clone, Serialize)]
pub struct Root {
    #[serde(rename = "@context")]
    pub context: Context,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub items: Vec<RootItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RootItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
}

pub fn create_root(ctx: &AssemblyContext<'_>) -> Root {
    Root {
        context: Context::Root,
        id: ctx.base.url("/info.json"),
        kind: "Collection",
        items: vec![
            RootItem {
                id: ctx.collection_id(TOP_COLLECTION),
                kind: "Collection",
                name: "Top-level collection",
            },
            RootItem {
                id: ctx.collection_id(ALL_COLLECTION),
                kind: "Collection",
                name: "All manifests",
            },
            RootItem {
                id: ctx.activity_id(ALL_CHANGES),
                kind: "OrderedCollection",
                name: "ActivityStream",
            },
        ],
    }
}
