use serde::Serialize;

use crate::config::ContentApiConfig;
use crate::domain::service::{IdeaFilters, ListParams, LookupParams};

/// Defaults and upper bounds applied to query-string parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDefaults {
    pub default_limit: u64,
    pub max_limit: u64,
    pub default_depth: u32,
    pub max_depth: u32,
}

impl Default for ParamDefaults {
    fn default() -> Self {
        Self::from(&ContentApiConfig::default())
    }
}

impl From<&ContentApiConfig> for ParamDefaults {
    fn from(config: &ContentApiConfig) -> Self {
        Self {
            default_limit: config.default_limit.max(1),
            max_limit: config.max_limit.max(1),
            default_depth: config.default_depth,
            max_depth: config.max_depth,
        }
    }
}

/// Request-independent settings shared by every handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestSettings {
    /// Brand segment of the fixed site routes.
    pub site: String,
    pub params: ParamDefaults,
}

impl From<&ContentApiConfig> for RestSettings {
    fn from(config: &ContentApiConfig) -> Self {
        Self {
            site: config.site.clone(),
            params: ParamDefaults::from(config),
        }
    }
}

/// Decoded query string. Repeated keys are kept in order, and `key[]` is
/// read as a list entry of `key`.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    pairs: Vec<(String, String)>,
}

impl RequestParams {
    #[must_use]
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self { pairs }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn list(&self, key: &str) -> Vec<String> {
        let bracketed = format!("{key}[]");
        self.pairs
            .iter()
            .filter(|(k, v)| (*k == bracketed || k == key) && !v.is_empty())
            .map(|(_, v)| v.clone())
            .collect()
    }

    fn page(&self) -> u64 {
        self.get("page")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    fn limit(&self, defaults: &ParamDefaults) -> u64 {
        match self.get("limit").and_then(|v| v.trim().parse::<u64>().ok()) {
            Some(limit) if limit > 0 => limit.min(defaults.max_limit),
            _ => defaults.default_limit,
        }
    }

    fn recurse(&self) -> bool {
        self.get("recurse")
            .is_some_and(|v| !v.is_empty() && v != "0")
    }

    fn depth(&self, defaults: &ParamDefaults) -> u32 {
        self.get("depth")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(defaults.default_depth)
            .min(defaults.max_depth)
    }

    fn published(&self) -> bool {
        self.get("published") != Some("0")
    }

    #[must_use]
    pub fn list_params(&self, defaults: &ParamDefaults) -> ListParams {
        ListParams {
            page: self.page(),
            limit: self.limit(defaults),
            recurse: self.recurse(),
            depth: self.depth(defaults),
            published: self.published(),
        }
    }

    #[must_use]
    pub fn lookup_params(&self, defaults: &ParamDefaults) -> LookupParams {
        LookupParams {
            recurse: self.recurse(),
            depth: self.depth(defaults),
        }
    }

    #[must_use]
    pub fn idea_filters(&self) -> IdeaFilters {
        IdeaFilters {
            categories: self.list("category"),
            tags: self.list("tag"),
            types: self.list("type"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CountDto {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> ParamDefaults {
        ParamDefaults::default()
    }

    #[test]
    fn missing_parameters_use_defaults() {
        let params = RequestParams::parse(None).list_params(&defaults());
        assert_eq!(params, ListParams::default());
    }

    #[test]
    fn limit_falls_back_and_clamps() {
        let d = defaults();
        assert_eq!(RequestParams::parse(Some("limit=0")).list_params(&d).limit, 10);
        assert_eq!(RequestParams::parse(Some("limit=abc")).list_params(&d).limit, 10);
        assert_eq!(RequestParams::parse(Some("limit=-4")).list_params(&d).limit, 10);
        assert_eq!(RequestParams::parse(Some("limit=2")).list_params(&d).limit, 2);
        assert_eq!(RequestParams::parse(Some("limit=5000")).list_params(&d).limit, 100);
    }

    #[test]
    fn page_is_zero_unless_numeric() {
        let d = defaults();
        assert_eq!(RequestParams::parse(Some("page=3")).list_params(&d).page, 3);
        assert_eq!(RequestParams::parse(Some("page=-1")).list_params(&d).page, 0);
        assert_eq!(RequestParams::parse(Some("page=x")).list_params(&d).page, 0);
    }

    #[test]
    fn depth_accepts_zero_and_clamps() {
        let d = defaults();
        assert_eq!(RequestParams::parse(Some("depth=0")).lookup_params(&d).depth, 0);
        assert_eq!(RequestParams::parse(Some("depth=4")).lookup_params(&d).depth, 4);
        assert_eq!(RequestParams::parse(Some("depth=999")).lookup_params(&d).depth, 10);
        assert_eq!(RequestParams::parse(Some("depth=-3")).lookup_params(&d).depth, 2);
    }

    #[test]
    fn flags_follow_truthiness() {
        let d = defaults();
        assert!(RequestParams::parse(Some("recurse=1")).lookup_params(&d).recurse);
        assert!(RequestParams::parse(Some("recurse=true")).lookup_params(&d).recurse);
        assert!(!RequestParams::parse(Some("recurse=0")).lookup_params(&d).recurse);
        assert!(!RequestParams::parse(Some("recurse=")).lookup_params(&d).recurse);

        assert!(!RequestParams::parse(Some("published=0")).list_params(&d).published);
        assert!(RequestParams::parse(Some("published=false")).list_params(&d).published);
        assert!(RequestParams::parse(Some("published=")).list_params(&d).published);
    }

    #[test]
    fn repeated_list_keys_are_collected() {
        let filters = RequestParams::parse(Some(
            "category%5B%5D=crafts%2Fpaper&category[]=holiday&tag[]=&type[]=article&type=look",
        ))
        .idea_filters();
        assert_eq!(filters.categories, vec!["crafts/paper", "holiday"]);
        assert!(filters.tags.is_empty());
        assert_eq!(filters.types, vec!["article", "look"]);
    }
}
