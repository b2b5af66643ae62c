//! Server configuration.
//!
//! Loaded from a JSON file (path from `MANIFEST_SERVER_CONFIG`, default
//! `configuration.json`), with `SOLR_URL` and `BIND_ADDR` env overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_PATH_VAR: &str = "MANIFEST_SERVER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "configuration.json";

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub common: Common,
    pub solr: SolrSettings,
    pub templates: Templates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Common {
    /// Pretty-prints responses and raises the default log level.
    #[serde(default)]
    pub debug: bool,
    /// Width in pixels requested for logo and thumbnail images.
    #[serde(default = "default_thumbsize")]
    pub thumbsize: u32,
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolrSettings {
    pub server: String,
    /// Request handler name appended to the core URL.
    #[serde(default = "default_handler")]
    pub handler: String,
    /// Activity stream page size.
    #[serde(default = "default_pagesize")]
    pub pagesize: u32,
}

/// Identifier templates. Placeholders: `{scheme}`, `{host}`, `{identifier}`, `{range}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Templates {
    pub manifest_id_tmpl: String,
    pub canvas_id_tmpl: String,
    pub sequence_id_tmpl: String,
    pub annotation_id_tmpl: String,
    pub annolist_id_tmpl: String,
    pub annopage_id_tmpl: String,
    pub image_id_tmpl: String,
    pub range_id_tmpl: String,
    pub collection_id_tmpl: String,
    pub activitystream_id_tmpl: String,
    pub activitystream_create_id_tmpl: String,
    pub digital_bodleian_permalink_tmpl: String,
}

fn default_thumbsize() -> u32 {
    250
}

fn default_bind() -> String {
    "0.0.0.0:8001".to_string()
}

fn default_handler() -> String {
    "iiif".to_string()
}

fn default_pagesize() -> u32 {
    100
}

impl ServerConfig {
    /// Config file path from `MANIFEST_SERVER_CONFIG`, or the default.
    pub fn path() -> String {
        std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load the config from the path named by `MANIFEST_SERVER_CONFIG`, then apply env overrides.
    pub fn from_env() -> Result<Self> {
        let path = Self::path();
        let mut config = Self::load(Path::new(&path))?;

        if let Ok(url) = std::env::var("SOLR_URL") {
            config.solr.server = url;
        }
        if let Ok(bind) = std::env::var("BIND_ADDR") {
            config.common.bind = bind;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;

        let config: ServerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.solr.server.trim().is_empty() {
            anyhow::bail!("solr.server must be non-empty");
        }
        if self.solr.pagesize == 0 {
            anyhow::bail!("solr.pagesize must be greater than zero");
        }

        let t = &self.templates;
        let templates = [
            ("manifest_id_tmpl", &t.manifest_id_tmpl),
            ("canvas_id_tmpl", &t.canvas_id_tmpl),
            ("sequence_id_tmpl", &t.sequence_id_tmpl),
            ("annotation_id_tmpl", &t.annotation_id_tmpl),
            ("annolist_id_tmpl", &t.annolist_id_tmpl),
            ("annopage_id_tmpl", &t.annopage_id_tmpl),
            ("image_id_tmpl", &t.image_id_tmpl),
            ("range_id_tmpl", &t.range_id_tmpl),
            ("collection_id_tmpl", &t.collection_id_tmpl),
            ("activitystream_id_tmpl", &t.activitystream_id_tmpl),
            ("activitystream_create_id_tmpl", &t.activitystream_create_id_tmpl),
            ("digital_bodleian_permalink_tmpl", &t.digital_bodleian_permalink_tmpl),
        ];
        for (name, value) in templates {
            if value.trim().is_empty() {
                anyhow::bail!("templates.{} must be non-empty", name);
            }
        }

        Ok(())
    }
}

/// Config used by unit tests across the crate.
#[cfg(test)]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        common: Common {
            debug: false,
            thumbsize: 250,
            bind: default_bind(),
        },
        solr: SolrSettings {
            server: "http://localhost:8983/solr/iiif".to_string(),
            handler: default_handler(),
            pagesize: 10,
        },
        templates: Templates {
            manifest_id_tmpl: "{scheme}://{host}/iiif/manifest/{identifier}.json".to_string(),
            canvas_id_tmpl: "{scheme}://{host}/iiif/canvas/{identifier}.json".to_string(),
            sequence_id_tmpl: "{scheme}://{host}/iiif/sequence/{identifier}_default.json".to_string(),
            annotation_id_tmpl: "{scheme}://{host}/iiif/annotation/{identifier}.json".to_string(),
            annolist_id_tmpl: "{scheme}://{host}/iiif/annotationlist/{identifier}.json".to_string(),
            annopage_id_tmpl: "{scheme}://{host}/iiif/annotationpage/{identifier}.json".to_string(),
            image_id_tmpl: "{scheme}://{host}/iiif/image/{identifier}".to_string(),
            range_id_tmpl: "{scheme}://{host}/iiif/range/{identifier}/{range}".to_string(),
            collection_id_tmpl: "{scheme}://{host}/iiif/collection/{identifier}".to_string(),
            activitystream_id_tmpl: "{scheme}://{host}/iiif/activity/{identifier}".to_string(),
            activitystream_create_id_tmpl: "{scheme}://{host}/iiif/activity/create/{identifier}"
                .to_string(),
            digital_bodleian_permalink_tmpl: "https://digital.bodleian.ox.ac.uk/objects/{identifier}/"
                .to_string(),
        },
    }
}
