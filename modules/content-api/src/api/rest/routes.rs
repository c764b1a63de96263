use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};
use tracing::debug;

use crate::api::rest::dto::RestSettings;
use crate::api::rest::error::ApiError;
use crate::api::rest::handlers;
use crate::config::ContentApiConfig;
use crate::domain::service::Service;

/// Adds every content route under `config.base_path`.
///
/// The fixed `{site}` routes are registered explicitly next to the generic
/// `{brand}/{content_type}` pair so that static segments always win.
#[must_use]
pub fn register_routes(router: Router, service: Arc<Service>, config: &ContentApiConfig) -> Router {
    let base = config.base_path.trim_end_matches('/');
    let site = format!("{base}/{}", config.site);
    debug!(%base, %site, "Registering content routes");

    router
        // GET /{site}/idea - Idea gallery
        .route(&format!("{site}/idea"), get(handlers::ideas))
        // Contributors and their content
        .route(&format!("{site}/contributor"), get(handlers::list_contributors))
        .route(&format!("{site}/contributor/{{id}}"), get(handlers::get_contributor))
        .route(
            &format!("{site}/contributor/{{id}}/content"),
            get(handlers::contributor_content),
        )
        // Contributor groups
        .route(
            &format!("{site}/contributor_group"),
            get(handlers::list_contributor_groups),
        )
        .route(
            &format!("{site}/contributor_group/{{id}}"),
            get(handlers::get_contributor_group),
        )
        .route(
            &format!("{site}/contributor_group/{{id}}/content"),
            get(handlers::contributor_group_content),
        )
        // Categories
        .route(&format!("{site}/category"), get(handlers::list_categories))
        .route(&format!("{site}/category/{{id}}"), get(handlers::get_category))
        .route(
            &format!("{site}/category/{{id}}/content"),
            get(handlers::category_content),
        )
        // Tags
        .route(&format!("{site}/tag"), get(handlers::list_tags))
        .route(&format!("{site}/tag/{{id}}"), get(handlers::get_tag))
        .route(&format!("{site}/tag/{{id}}/content"), get(handlers::tag_content))
        // Products and SKU-referenced content
        .route(&format!("{site}/product"), get(handlers::list_products))
        .route(&format!("{site}/product/{{id}}"), get(handlers::get_product))
        .route(
            &format!("{site}/product/{{id}}/content"),
            get(handlers::product_content),
        )
        .route(
            &format!("{site}/product/{{id}}/contentcount"),
            get(handlers::product_content_count),
        )
        .route(
            &format!("{site}/product/{{id}}/{{sku2}}/content"),
            get(handlers::product_content_split),
        )
        .route(
            &format!("{site}/product/{{id}}/{{sku2}}/contentcount"),
            get(handlers::product_content_count_split),
        )
        // Any other content type
        .route(
            &format!("{site}/{{content_type}}"),
            get(handlers::list_site_content),
        )
        .route(
            &format!("{site}/{{content_type}}/{{id}}"),
            get(handlers::get_site_content),
        )
        .route(
            &format!("{base}/{{brand}}/{{content_type}}"),
            get(handlers::list_content),
        )
        .route(
            &format!("{base}/{{brand}}/{{content_type}}/{{id}}"),
            get(handlers::get_content),
        )
        .layer(Extension(service))
        .layer(Extension(Arc::new(RestSettings::from(config))))
        .fallback(|| async { ApiError::not_found() })
}
