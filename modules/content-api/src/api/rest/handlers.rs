use std::sync::Arc;

use axum::extract::{Extension, Path, RawQuery};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::{HeaderName, HeaderValue};
use serde::Serialize;

use crate::domain::error::DomainError;
use crate::domain::model::EntityKind;
use crate::domain::service::{Projected, Service, TermListing};

use super::dto::{CountDto, RequestParams, RestSettings};
use super::error::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

const CACHE_TAGS: HeaderName = HeaderName::from_static("cache-tags");

/// Runs a synchronous service call off the async executor.
async fn blocking<T, F>(svc: Arc<Service>, task: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Service) -> Result<T, DomainError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || task(&svc))
        .await
        .map_err(|e| DomainError::internal(format!("request task failed: {e}")))?;
    Ok(result?)
}

fn tagged(tags: String, body: impl Serialize) -> ApiResult<Response> {
    let value = HeaderValue::try_from(tags)
        .map_err(|e| DomainError::internal(format!("invalid cache tag: {e}")))?;
    Ok(([(CACHE_TAGS, value)], Json(body)).into_response())
}

fn listing_tag(kind: EntityKind) -> String {
    match kind {
        EntityKind::Node => "node_list".to_owned(),
        EntityKind::TaxonomyTerm => "taxonomy_term".to_owned(),
    }
}

fn single(projected: Projected) -> ApiResult<Response> {
    tagged(format!("{}:{}", projected.kind, projected.id), projected.body)
}

async fn content_list(
    svc: Arc<Service>,
    settings: &RestSettings,
    query: Option<&str>,
    brand: String,
    content_type: String,
) -> ApiResult<Response> {
    let params = RequestParams::parse(query).list_params(&settings.params);
    let envelope = blocking(svc, move |svc| {
        svc.list_content(Some(&brand), &content_type, &params)
    })
    .await?;
    tagged(listing_tag(EntityKind::Node), envelope)
}

async fn content_item(
    svc: Arc<Service>,
    settings: &RestSettings,
    query: Option<&str>,
    content_type: String,
    id: String,
) -> ApiResult<Response> {
    let params = RequestParams::parse(query).lookup_params(&settings.params);
    let projected = blocking(svc, move |svc| svc.get_content(&content_type, &id, &params)).await?;
    single(projected)
}

async fn term_list(
    svc: Arc<Service>,
    settings: &RestSettings,
    query: Option<&str>,
    vocabulary: &'static str,
) -> ApiResult<Response> {
    let params = RequestParams::parse(query).list_params(&settings.params);
    let envelope = blocking(svc, move |svc| svc.list_terms(vocabulary, &params)).await?;
    tagged(listing_tag(EntityKind::TaxonomyTerm), envelope)
}

async fn term_item(
    svc: Arc<Service>,
    settings: &RestSettings,
    query: Option<&str>,
    vocabulary: &'static str,
    id: String,
) -> ApiResult<Response> {
    let params = RequestParams::parse(query).lookup_params(&settings.params);
    let projected = blocking(svc, move |svc| svc.get_term(vocabulary, &id, &params)).await?;
    single(projected)
}

async fn term_content(
    svc: Arc<Service>,
    settings: &RestSettings,
    query: Option<&str>,
    listing: TermListing,
    id: String,
) -> ApiResult<Response> {
    let params = RequestParams::parse(query).list_params(&settings.params);
    let envelope = blocking(svc, move |svc| svc.term_content(listing, &id, &params)).await?;
    tagged(listing_tag(EntityKind::Node), envelope)
}

async fn sku_content(
    svc: Arc<Service>,
    settings: &RestSettings,
    query: Option<&str>,
    sku: String,
) -> ApiResult<Response> {
    let params = RequestParams::parse(query).list_params(&settings.params);
    let envelope = blocking(svc, move |svc| svc.product_content(&sku, &params)).await?;
    tagged(listing_tag(EntityKind::Node), envelope)
}

async fn sku_count(
    svc: Arc<Service>,
    settings: &RestSettings,
    query: Option<&str>,
    sku: String,
) -> ApiResult<Response> {
    let published = RequestParams::parse(query)
        .list_params(&settings.params)
        .published;
    let count = blocking(svc, move |svc| svc.product_content_count(&sku, published)).await?;
    tagged(listing_tag(EntityKind::Node), CountDto { count })
}

/// `GET {base}/{brand}/{content_type}`
pub async fn list_content(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path((brand, content_type)): Path<(String, String)>,
) -> ApiResult<Response> {
    content_list(svc, &settings, query.as_deref(), brand, content_type).await
}

/// `GET {base}/{brand}/{content_type}/{id}`
pub async fn get_content(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path((_brand, content_type, id)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    content_item(svc, &settings, query.as_deref(), content_type, id).await
}

/// `GET {base}/{site}/{content_type}`
pub async fn list_site_content(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(content_type): Path<String>,
) -> ApiResult<Response> {
    let brand = settings.site.clone();
    content_list(svc, &settings, query.as_deref(), brand, content_type).await
}

/// `GET {base}/{site}/{content_type}/{id}`
pub async fn get_site_content(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path((content_type, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    content_item(svc, &settings, query.as_deref(), content_type, id).await
}

/// `GET {base}/{site}/contributor`
pub async fn list_contributors(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let brand = settings.site.clone();
    content_list(svc, &settings, query.as_deref(), brand, "contributor".to_owned()).await
}

/// `GET {base}/{site}/contributor/{id}`
pub async fn get_contributor(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    content_item(svc, &settings, query.as_deref(), "contributor".to_owned(), id).await
}

/// `GET {base}/{site}/contributor/{id}/content`
pub async fn contributor_content(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let params = RequestParams::parse(query.as_deref()).list_params(&settings.params);
    let envelope = blocking(svc, move |svc| svc.contributor_content(&id, &params)).await?;
    tagged(listing_tag(EntityKind::Node), envelope)
}

/// `GET {base}/{site}/product`
pub async fn list_products(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let brand = settings.site.clone();
    content_list(svc, &settings, query.as_deref(), brand, "product".to_owned()).await
}

/// `GET {base}/{site}/product/{id}`
pub async fn get_product(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    content_item(svc, &settings, query.as_deref(), "product".to_owned(), id).await
}

/// `GET {base}/{site}/product/{sku}/content`
pub async fn product_content(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(sku): Path<String>,
) -> ApiResult<Response> {
    sku_content(svc, &settings, query.as_deref(), sku).await
}

/// `GET {base}/{site}/product/{sku1}/{sku2}/content`, for SKUs containing a slash.
pub async fn product_content_split(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path((first, second)): Path<(String, String)>,
) -> ApiResult<Response> {
    sku_content(svc, &settings, query.as_deref(), format!("{first}/{second}")).await
}

/// `GET {base}/{site}/product/{sku}/contentcount`
pub async fn product_content_count(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(sku): Path<String>,
) -> ApiResult<Response> {
    sku_count(svc, &settings, query.as_deref(), sku).await
}

/// `GET {base}/{site}/product/{sku1}/{sku2}/contentcount`
pub async fn product_content_count_split(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path((first, second)): Path<(String, String)>,
) -> ApiResult<Response> {
    sku_count(svc, &settings, query.as_deref(), format!("{first}/{second}")).await
}

/// `GET {base}/{site}/idea`
pub async fn ideas(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let request = RequestParams::parse(query.as_deref());
    let params = request.list_params(&settings.params);
    let filters = request.idea_filters();
    let envelope = blocking(svc, move |svc| svc.ideas(&filters, &params)).await?;
    tagged(listing_tag(EntityKind::Node), envelope)
}

/// `GET {base}/{site}/category`
pub async fn list_categories(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    term_list(svc, &settings, query.as_deref(), "category").await
}

/// `GET {base}/{site}/category/{id}`
pub async fn get_category(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    term_item(svc, &settings, query.as_deref(), "category", id).await
}

/// `GET {base}/{site}/category/{id}/content`
pub async fn category_content(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    term_content(svc, &settings, query.as_deref(), TermListing::Category, id).await
}

/// `GET {base}/{site}/tag`
pub async fn list_tags(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    term_list(svc, &settings, query.as_deref(), "tag").await
}

/// `GET {base}/{site}/tag/{id}`
pub async fn get_tag(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    term_item(svc, &settings, query.as_deref(), "tag", id).await
}

/// `GET {base}/{site}/tag/{id}/content`
pub async fn tag_content(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    term_content(svc, &settings, query.as_deref(), TermListing::Tag, id).await
}

/// `GET {base}/{site}/contributor_group`
pub async fn list_contributor_groups(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    term_list(svc, &settings, query.as_deref(), "contributor_group").await
}

/// `GET {base}/{site}/contributor_group/{id}`
pub async fn get_contributor_group(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    term_item(svc, &settings, query.as_deref(), "contributor_group", id).await
}

/// `GET {base}/{site}/contributor_group/{id}/content`
pub async fn contributor_group_content(
    Extension(svc): Extension<Arc<Service>>,
    Extension(settings): Extension<Arc<RestSettings>>,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    term_content(
        svc,
        &settings,
        query.as_deref(),
        TermListing::ContributorGroup,
        id,
    )
    .await
}
