#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end tests over the full router and the JSON fixture store.
//!
//! These tests verify that:
//! 1. Lookups project fields per the schema and dereference references to the requested depth
//! 2. Listings page consistently and carry the right envelope
//! 3. Classified failures come back as `{"error": ...}` bodies with 403/404

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use content_api::{ContentApiConfig, ContentApiModule};
use serde_json::{Value, json};
use tower::ServiceExt;

const PROJECT: &str = "ccf0cb1a-64e4-456c-8048-971dd0d86ee8";
const CONTRIBUTOR: &str = "abc93123-1234-4f03-a15f-abc1515917b4";
const CRAFTS: &str = "da593707-2796-4f03-b75f-59a1515917b4";
const PAPER: &str = "1f2e3d4c-5b6a-4798-8a7b-6c5d4e3f2a1b";
const DESIGNERS: &str = "5d6e7f80-91a2-43b4-8576-8d9e0f1a2b3c";

fn app() -> Router {
    let config = ContentApiConfig {
        fixtures: Some(PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/content.json"
        ))),
        public_base_url: "http://cdn.test".to_owned(),
        ..ContentApiConfig::default()
    };
    ContentApiModule::init(config).unwrap().router()
}

struct TestResponse {
    status: StatusCode,
    cache_tags: Option<String>,
    body: Value,
}

async fn get(uri: &str) -> TestResponse {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    let status = response.status();
    let cache_tags = response
        .headers()
        .get("cache-tags")
        .map(|value| value.to_str().unwrap().to_owned());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        cache_tags,
        body: serde_json::from_slice(&bytes).unwrap(),
    }
}

fn is_stub(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.len() == 2 && o.contains_key("uuid") && o.contains_key("type"))
}

/// Number of fully projected levels along the project -> contributor -> project cycle.
fn full_levels(root: &Value) -> usize {
    let mut levels = 0;
    let mut current = root;
    loop {
        let key = if current["type"] == "project" {
            "field_contributor"
        } else {
            "field_featured_project"
        };
        let next = &current[key];
        assert!(next.is_object(), "broken reference chain at level {levels}");
        if is_stub(next) {
            return levels;
        }
        levels += 1;
        current = next;
    }
}

#[tokio::test]
async fn project_lookup_renders_every_field_family() {
    let response = get(&format!("/api/fun365/project/{PROJECT}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.cache_tags.as_deref(), Some("node:100"));

    let body = response.body;
    assert_eq!(body["uuid"], json!(PROJECT));
    assert_eq!(body["type"], json!("project"));
    assert_eq!(body["status"], json!(true));
    assert_eq!(body["created"], json!("2017-01-23T19:26:37+0000"));
    assert_eq!(body["path"], json!("projects/paper-wreath"));
    assert_eq!(body["field_display_title"], json!("Paper Wreath"));
    assert_eq!(body["field_items_needed"], json!(["Item 1", "Item 2"]));
    assert_eq!(body["field_project_lite"], json!(false));
    assert_eq!(body["field_suppress_fanreel"], json!(false));
    assert_eq!(body["field_time_max"], json!(10));
    assert_eq!(
        body["field_skyword_related_article"],
        json!({"url": "http://example.com", "title": "Read More"})
    );
    assert_eq!(
        body["field_download_file"],
        json!("http://cdn.test/sites/default/files/downloads/pdf/guide.pdf")
    );
    assert_eq!(
        body["field_896x896_img"],
        json!({
            "full": "http://cdn.test/sites/default/files/projects/tile/desktop/2x/896x896_0.png",
            "400x400_img": "http://cdn.test/sites/default/files/styles/400x400_img/public/projects/tile/desktop/2x/896x896_0.png",
            "414x414_img": "http://cdn.test/sites/default/files/styles/414x414_img/public/projects/tile/desktop/2x/896x896_0.png",
            "448x448_img": "http://cdn.test/sites/default/files/styles/448x448_img/public/projects/tile/desktop/2x/896x896_0.png"
        })
    );
    assert_eq!(body["field_900x677_img"], Value::Null);
    assert_eq!(body["field_step"], Value::Null);
    assert!(body.get("field_layout").is_none());
    assert!(is_stub(&body["field_contributor"]));
    assert!(body["field_category"].as_array().unwrap().iter().all(is_stub));
}

#[tokio::test]
async fn lookup_by_alias_matches_uuid_lookup() {
    let by_alias = get("/api/fun365/project/projects%2Fpaper-wreath").await;
    let by_uuid = get(&format!("/api/fun365/project/{PROJECT}")).await;
    assert_eq!(by_alias.status, StatusCode::OK);
    assert_eq!(by_alias.body, by_uuid.body);
}

#[tokio::test]
async fn depth_zero_stubs_every_reference() {
    let body = get(&format!("/api/fun365/project/{PROJECT}?recurse=1&depth=0"))
        .await
        .body;
    assert_eq!(
        body["field_contributor"],
        json!({"uuid": CONTRIBUTOR, "type": "contributor"})
    );
    assert_eq!(
        body["field_category"],
        json!([
            {"uuid": CRAFTS, "type": "category"},
            {"uuid": PAPER, "type": "category"}
        ])
    );
}

#[tokio::test]
async fn depth_one_resolves_direct_references_only() {
    let body = get(&format!("/api/fun365/project/{PROJECT}?recurse=1&depth=1"))
        .await
        .body;

    let categories = body["field_category"].as_array().unwrap();
    assert_eq!(categories[0]["uuid"], json!(CRAFTS));
    assert_eq!(categories[0]["name"], json!("Crafts"));
    assert_eq!(categories[0]["parent"], json!(""));
    assert_eq!(categories[1]["parent"], json!(CRAFTS));

    let contributor = &body["field_contributor"];
    assert_eq!(contributor["field_full_name"], json!("Bea Crafter"));
    assert_eq!(
        contributor["field_contributor_category"],
        json!([{"uuid": DESIGNERS, "type": "contributor_group"}])
    );
    assert_eq!(
        contributor["field_featured_project"],
        json!({"uuid": PROJECT, "type": "project"})
    );

    assert_eq!(body["field_products"][0]["field_sku"], json!("70/237"));
}

#[tokio::test]
async fn depth_two_resolves_two_levels() {
    let body = get(&format!("/api/fun365/project/{PROJECT}?recurse=1&depth=2"))
        .await
        .body;
    let featured = &body["field_contributor"]["field_featured_project"];
    assert_eq!(featured["field_display_title"], json!("Paper Wreath"));
    assert!(is_stub(&featured["field_contributor"]));
    assert_eq!(full_levels(&body), 2);
}

#[tokio::test]
async fn reference_cycles_stop_at_the_depth_ceiling() {
    for (depth, expected) in [(3, 3), (10, 10), (999, 10)] {
        let body = get(&format!(
            "/api/fun365/project/{PROJECT}?recurse=1&depth={depth}"
        ))
        .await
        .body;
        assert_eq!(full_levels(&body), expected, "depth={depth}");
    }
}

#[tokio::test]
async fn category_listing_pages_and_reports_parents() {
    let response = get("/api/fun365/category?limit=2&page=0").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.cache_tags.as_deref(), Some("taxonomy_term"));

    let body = response.body;
    assert_eq!(body["count"], json!(5));
    assert_eq!(body["limit"], json!(2));
    assert_eq!(body["page"], json!(0));
    assert!(body.get("published").is_none());

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["uuid"], json!(CRAFTS));
    assert_eq!(results[0]["parent"], json!(""));
    assert_eq!(results[1]["uuid"], json!(PAPER));
    assert_eq!(results[1]["parent"], json!(CRAFTS));
}

#[tokio::test]
async fn empty_term_fields_render_as_empty_strings() {
    let response = get("/api/fun365/category/crafts").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.cache_tags.as_deref(), Some("taxonomy_term:501"));
    assert_eq!(response.body["field_synonyms"], json!(""));
    assert_eq!(response.body["field_icon"], json!(""));
    assert_eq!(response.body["path"], json!("crafts"));

    let holiday = get("/api/fun365/category?page=4&limit=1").await.body;
    assert_eq!(holiday["results"][0]["field_synonyms"], json!(["Seasonal"]));
}

#[tokio::test]
async fn pages_together_yield_count_distinct_items() {
    let mut seen = Vec::new();
    for page in 0..4 {
        let body = get(&format!(
            "/api/fun365/article?published=0&limit=1&page={page}"
        ))
        .await
        .body;
        assert_eq!(body["count"], json!(3));
        assert_eq!(body["published"], json!(false));
        for result in body["results"].as_array().unwrap() {
            seen.push(result["uuid"].as_str().unwrap().to_owned());
        }
    }

    assert_eq!(seen.len(), 3);
    let mut distinct = seen.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), 3);
}

#[tokio::test]
async fn published_listing_hides_drafts() {
    let body = get("/api/fun365/article").await.body;
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["published"], json!(true));
}

#[tokio::test]
async fn non_permitted_type_is_forbidden() {
    let single = get("/api/fun365/user/3c2b1a09-8f7e-4d6c-a5b4-c3d2e1f0a9b8").await;
    assert_eq!(single.status, StatusCode::FORBIDDEN);
    assert_eq!(single.body, json!({"error": "Forbidden."}));

    let listing = get("/api/fun365/user").await;
    assert_eq!(listing.status, StatusCode::FORBIDDEN);
    assert_eq!(listing.body, json!({"error": "Forbidden."}));
}

#[tokio::test]
async fn unknown_entities_are_not_found() {
    let missing = get("/api/fun365/project/00000000-0000-4000-8000-000000000000").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body, json!({"error": "Not found."}));

    let unknown_type = get("/api/fun365/gadget").await;
    assert_eq!(unknown_type.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown_type.body, json!({"error": "Not found."}));
}

#[tokio::test]
async fn referenced_content_listings() {
    let category = get("/api/fun365/category/crafts/content").await;
    assert_eq!(category.status, StatusCode::OK);
    assert_eq!(category.cache_tags.as_deref(), Some("node_list"));
    assert_eq!(category.body["count"], json!(1));
    assert_eq!(
        category.body["results"],
        json!([{"uuid": PROJECT, "type": "project"}])
    );

    let contributor = get("/api/fun365/contributor/contributors%2Fbea/content").await;
    assert_eq!(contributor.status, StatusCode::OK);
    assert_eq!(contributor.body["count"], json!(1));

    let product = get("/api/fun365/product/70/237/content").await;
    assert_eq!(product.status, StatusCode::OK);
    let first = product.body["results"][0].as_object().unwrap();
    assert_eq!(first["type"], json!("project"));
    assert_eq!(first["field_896x896_img"]["full"].as_str().map(|s| s.ends_with(".png")), Some(true));
    assert_eq!(first["field_896x896_img"].as_object().unwrap().len(), 1);
    assert!(!first.contains_key("uuid"));

    let count = get("/api/fun365/product/70/237/contentcount").await;
    assert_eq!(count.body, json!({"count": 1}));
}

#[tokio::test]
async fn idea_gallery_filters() {
    let all = get("/api/fun365/idea").await.body;
    assert_eq!(all["count"], json!(3));
    assert_eq!(all["results"][0]["uuid"], json!(PROJECT));

    let crafts = get("/api/fun365/idea?category[]=crafts&category[]=nowhere").await.body;
    assert_eq!(crafts["count"], json!(1));

    let articles = get("/api/fun365/idea?type[]=article").await.body;
    assert_eq!(articles["count"], json!(2));
}
