use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Content API module configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContentApiConfig {
    /// Prefix of every route, without a trailing slash.
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Site segment of the fixed routes (`{base_path}/{site}/category`, ...).
    #[serde(default = "default_site")]
    pub site: String,

    /// Content types exposed by the API.
    #[serde(default = "default_content_types")]
    pub content_types: Vec<String>,

    /// Vocabularies exposed by the API.
    #[serde(default = "default_vocabularies")]
    pub vocabularies: Vec<String>,

    #[serde(default = "default_idea_types")]
    pub idea_types: Vec<String>,

    #[serde(default = "default_contributor_content_types")]
    pub contributor_content_types: Vec<String>,

    #[serde(default = "default_product_content_types")]
    pub product_content_types: Vec<String>,

    #[serde(default = "default_limit")]
    pub default_limit: u64,

    #[serde(default = "default_max_limit")]
    pub max_limit: u64,

    #[serde(default = "default_depth")]
    pub default_depth: u32,

    /// Upper bound for the `depth` parameter; never above 10.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Fixed UTC offset used when rendering dates.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Base URL prepended to public file paths.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// JSON content dump served by the in-memory store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<PathBuf>,
}

impl Default for ContentApiConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            site: default_site(),
            content_types: default_content_types(),
            vocabularies: default_vocabularies(),
            idea_types: default_idea_types(),
            contributor_content_types: default_contributor_content_types(),
            product_content_types: default_product_content_types(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            default_depth: default_depth(),
            max_depth: default_max_depth(),
            utc_offset_minutes: 0,
            public_base_url: default_public_base_url(),
            fixtures: None,
        }
    }
}

impl ContentApiConfig {
    /// Allow-lists and limits handed to the domain service.
    #[must_use]
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            content_types: self.content_types.clone(),
            vocabularies: self.vocabularies.clone(),
            idea_types: self.idea_types.clone(),
            contributor_content_types: self.contributor_content_types.clone(),
            product_content_types: self.product_content_types.clone(),
            max_depth: self.max_depth,
        }
    }

    /// Checks the values that end up in route paths.
    ///
    /// # Errors
    /// Returns an error when `base_path` is neither empty nor rooted at `/`,
    /// or when either value would not form a literal path segment.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            anyhow::bail!("base_path must be empty or start with '/': '{}'", self.base_path);
        }
        if self.base_path.contains(['{', '}']) {
            anyhow::bail!("base_path must not contain route parameters: '{}'", self.base_path);
        }
        if self.site.is_empty() || self.site.contains(['/', '{', '}']) {
            anyhow::bail!("site must be a single non-empty path segment: '{}'", self.site);
        }
        Ok(())
    }
}

fn default_base_path() -> String {
    "/api".to_owned()
}

fn default_site() -> String {
    "fun365".to_owned()
}

fn default_content_types() -> Vec<String> {
    ServiceConfig::default().content_types
}

fn default_vocabularies() -> Vec<String> {
    ServiceConfig::default().vocabularies
}

fn default_idea_types() -> Vec<String> {
    ServiceConfig::default().idea_types
}

fn default_contributor_content_types() -> Vec<String> {
    ServiceConfig::default().contributor_content_types
}

fn default_product_content_types() -> Vec<String> {
    ServiceConfig::default().product_content_types
}

fn default_limit() -> u64 {
    10
}

fn default_max_limit() -> u64 {
    100
}

fn default_depth() -> u32 {
    2
}

fn default_max_depth() -> u32 {
    10
}

fn default_public_base_url() -> String {
    "http://localhost:8087".to_owned()
}
