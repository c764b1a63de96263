use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::collection::{CollectionFetcher, Envelope, ResultShape};
use super::context::{DEPTH_CEILING, ProjectionContext};
use super::error::DomainError;
use super::formatter::DateFormat;
use super::identifier::IdentifierResolver;
use super::model::{Entity, EntityId, EntityKind};
use super::ports::{ContentPorts, ContentRepository};
use super::projector::EntityProjector;
use super::query::{QuerySpec, SortKey};
use super::schema::SchemaIntrospector;

/// Fields kept on content listed for a product SKU.
pub const PRODUCT_CONTENT_FIELDS: [&str; 5] = [
    "type",
    "created",
    "path",
    "field_896x896_img",
    "field_display_title",
];

/// Allow-lists and limits enforced by the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub content_types: Vec<String>,
    pub vocabularies: Vec<String>,
    pub idea_types: Vec<String>,
    pub contributor_content_types: Vec<String>,
    pub product_content_types: Vec<String>,
    pub max_depth: u32,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            content_types: strings(&[
                "landing",
                "article",
                "contributor",
                "download",
                "featured_content",
                "look",
                "product",
                "project",
                "recipe",
                "step",
                "bricky",
            ]),
            vocabularies: strings(&["category", "tag", "contributor_group"]),
            idea_types: strings(&["look", "project", "article", "recipe", "download", "bricky"]),
            contributor_content_types: strings(&[
                "article", "look", "project", "recipe", "download", "bricky",
            ]),
            product_content_types: strings(&[
                "article", "step", "project", "look", "recipe", "bricky",
            ]),
            max_depth: DEPTH_CEILING,
        }
    }
}

/// Paging and projection parameters of a listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u64,
    pub limit: u64,
    pub recurse: bool,
    pub depth: u32,
    pub published: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 0,
            limit: 10,
            recurse: false,
            depth: 2,
            published: true,
        }
    }
}

/// Projection parameters of a single-entity request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupParams {
    pub recurse: bool,
    pub depth: u32,
}

impl Default for LookupParams {
    fn default() -> Self {
        Self {
            recurse: false,
            depth: 2,
        }
    }
}

/// Filters of the idea gallery; category and tag entries are uuids or aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdeaFilters {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub types: Vec<String>,
}

/// A single projected entity with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Projected {
    pub kind: EntityKind,
    pub id: EntityId,
    pub body: Value,
}

/// Term vocabularies that carry referenced-content listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermListing {
    Category,
    Tag,
    ContributorGroup,
}

impl TermListing {
    /// Node field that references terms of this listing.
    #[must_use]
    pub fn reference_field(self) -> &'static str {
        match self {
            TermListing::Category => "field_category",
            TermListing::Tag => "field_tag",
            TermListing::ContributorGroup => "field_contributor_category",
        }
    }

    fn sorts(self) -> Vec<SortKey> {
        match self {
            TermListing::Category => vec![
                SortKey::desc("field_sort_by_date"),
                SortKey::desc("changed"),
            ],
            TermListing::Tag => Vec::new(),
            TermListing::ContributorGroup => {
                vec![SortKey::asc("field_full_name"), SortKey::desc("changed")]
            }
        }
    }
}

/// Read-only content API over injected storage ports.
pub struct Service {
    repository: Arc<dyn ContentRepository>,
    projector: Arc<EntityProjector>,
    fetcher: CollectionFetcher,
    identifiers: IdentifierResolver,
    config: ServiceConfig,
}

impl Service {
    #[must_use]
    pub fn new(ports: &ContentPorts, dates: DateFormat, config: ServiceConfig) -> Self {
        let schema = Arc::new(SchemaIntrospector::new(Arc::clone(&ports.schema)));
        let projector = Arc::new(EntityProjector::new(ports, schema, dates));
        Self {
            repository: Arc::clone(&ports.repository),
            fetcher: CollectionFetcher::new(Arc::clone(&ports.repository), Arc::clone(&projector)),
            identifiers: IdentifierResolver::new(
                Arc::clone(&ports.repository),
                Arc::clone(&ports.aliases),
            ),
            projector,
            config,
        }
    }

    /// Lists published (or all) content of one type.
    ///
    /// `brand` names a brand term; when it exists the listing is restricted to it.
    ///
    /// # Errors
    /// `NotFound` for an unknown type, `Forbidden` for a type outside the allow-list.
    #[instrument(skip(self, params), fields(content_type = %content_type, page = params.page))]
    pub fn list_content(
        &self,
        brand: Option<&str>,
        content_type: &str,
        params: &ListParams,
    ) -> Result<Envelope, DomainError> {
        debug!("Listing content");
        if !self.repository.bundle_exists(EntityKind::Node, content_type)? {
            warn!("Unknown content type");
            return Err(DomainError::NotFound);
        }
        if !self.content_type_permitted(content_type) {
            warn!("Content type not permitted");
            return Err(DomainError::Forbidden);
        }

        let mut spec = QuerySpec::nodes(params.published)
            .with_condition("type", content_type)
            .paged(params.page, params.limit);
        if let Some(brand_id) = self.brand_id(brand)? {
            spec = spec.with_condition("field_brand", brand_id.to_string());
        }
        if content_type == "contributor" {
            spec = spec
                .sorted_by(SortKey::asc("field_full_name"))
                .sorted_by(SortKey::desc("changed"));
        }

        self.fetcher
            .fetch_page(&spec, &self.list_context(params), ResultShape::Projected)
    }

    /// Fetches one content item of `content_type` by uuid or alias.
    ///
    /// # Errors
    /// `Forbidden` for a type outside the allow-list, `NotFound` when the token
    /// does not resolve or resolves to another type.
    #[instrument(skip(self, params), fields(content_type = %content_type, id = %token))]
    pub fn get_content(
        &self,
        content_type: &str,
        token: &str,
        params: &LookupParams,
    ) -> Result<Projected, DomainError> {
        debug!("Fetching content");
        if !self.content_type_permitted(content_type) {
            warn!("Content type not permitted");
            return Err(DomainError::Forbidden);
        }

        let node = self
            .identifiers
            .resolve_entity(EntityKind::Node, token)?
            .filter(|node| node.bundle == content_type)
            .ok_or(DomainError::NotFound)?;

        self.project_one(&node, &self.lookup_context(params))
    }

    /// Lists the terms of a vocabulary in id order.
    ///
    /// # Errors
    /// `NotFound` for an unknown vocabulary, `Forbidden` outside the allow-list.
    #[instrument(skip(self, params), fields(vocabulary = %vocabulary, page = params.page))]
    pub fn list_terms(&self, vocabulary: &str, params: &ListParams) -> Result<Envelope, DomainError> {
        debug!("Listing terms");
        if !self.repository.bundle_exists(EntityKind::TaxonomyTerm, vocabulary)? {
            warn!("Unknown vocabulary");
            return Err(DomainError::NotFound);
        }
        if !self.vocabulary_permitted(vocabulary) {
            warn!("Vocabulary not permitted");
            return Err(DomainError::Forbidden);
        }

        let spec = QuerySpec::terms()
            .with_condition("vid", vocabulary)
            .sorted_by(SortKey::asc("tid"))
            .paged(params.page, params.limit);
        self.fetcher
            .fetch_page(&spec, &self.list_context(params), ResultShape::Projected)
    }

    /// Fetches one term of `vocabulary` by uuid or alias.
    ///
    /// # Errors
    /// `Forbidden` outside the allow-list, `NotFound` when the token does not
    /// resolve to a term of that vocabulary.
    #[instrument(skip(self, params), fields(vocabulary = %vocabulary, id = %token))]
    pub fn get_term(
        &self,
        vocabulary: &str,
        token: &str,
        params: &LookupParams,
    ) -> Result<Projected, DomainError> {
        debug!("Fetching term");
        if !self.vocabulary_permitted(vocabulary) {
            warn!("Vocabulary not permitted");
            return Err(DomainError::Forbidden);
        }

        let term = self
            .identifiers
            .resolve_entity(EntityKind::TaxonomyTerm, token)?
            .filter(|term| term.bundle == vocabulary)
            .ok_or(DomainError::NotFound)?;

        self.project_one(&term, &self.lookup_context(params))
    }

    /// Lists content referencing a category, tag or contributor group.
    ///
    /// # Errors
    /// `NotFound` when the token does not resolve to a term.
    #[instrument(skip(self, params), fields(listing = ?listing, id = %token, page = params.page))]
    pub fn term_content(
        &self,
        listing: TermListing,
        token: &str,
        params: &ListParams,
    ) -> Result<Envelope, DomainError> {
        debug!("Listing term content");
        let term = self
            .identifiers
            .resolve_entity(EntityKind::TaxonomyTerm, token)?
            .ok_or(DomainError::NotFound)?;

        let mut spec = QuerySpec::nodes(params.published)
            .with_condition(reference_path(listing.reference_field()), term.uuid.to_string())
            .paged(params.page, params.limit);
        for sort in listing.sorts() {
            spec = spec.sorted_by(sort);
        }

        self.fetcher.fetch_page(
            &spec,
            &self.list_context(params),
            ResultShape::StubUnlessRecursing,
        )
    }

    /// Lists content attributed to a contributor.
    ///
    /// # Errors
    /// `NotFound` when the token does not resolve to a content item.
    #[instrument(skip(self, params), fields(id = %token, page = params.page))]
    pub fn contributor_content(
        &self,
        token: &str,
        params: &ListParams,
    ) -> Result<Envelope, DomainError> {
        debug!("Listing contributor content");
        let contributor = self
            .identifiers
            .resolve_entity(EntityKind::Node, token)?
            .ok_or(DomainError::NotFound)?;

        let spec = QuerySpec::nodes(params.published)
            .with_any_of("type", self.config.contributor_content_types.iter().cloned())
            .with_condition(
                reference_path("field_contributor"),
                contributor.uuid.to_string(),
            )
            .paged(params.page, params.limit);

        self.fetcher.fetch_page(
            &spec,
            &self.list_context(params),
            ResultShape::StubUnlessRecursing,
        )
    }

    /// Lists content referencing the product with `sku`, in a reduced shape.
    ///
    /// # Errors
    /// `NotFound` when no product carries the SKU.
    #[instrument(skip(self, params), fields(sku = %sku, page = params.page))]
    pub fn product_content(&self, sku: &str, params: &ListParams) -> Result<Envelope, DomainError> {
        debug!("Listing product content");
        let spec = self.product_spec(sku, params)?;
        let ctx = self
            .list_context(params)
            .with_recurse(true)
            .with_full_image_only(true)
            .with_field_allow_list(PRODUCT_CONTENT_FIELDS);

        self.fetcher
            .fetch_page(&spec, &ctx, ResultShape::StubUnlessRecursing)
    }

    /// Number of content items referencing the product with `sku`.
    ///
    /// # Errors
    /// `NotFound` when no product carries the SKU.
    #[instrument(skip(self, published))]
    pub fn product_content_count(&self, sku: &str, published: bool) -> Result<u64, DomainError> {
        let params = ListParams {
            published,
            ..ListParams::default()
        };
        let spec = self.product_spec(sku, &params)?;
        self.fetcher.count(&spec)
    }

    /// Idea gallery: idea types, optionally narrowed by categories, tags and types.
    ///
    /// # Errors
    /// Only storage failures; unresolvable filters are ignored.
    #[instrument(skip(self, filters, params), fields(page = params.page))]
    pub fn ideas(&self, filters: &IdeaFilters, params: &ListParams) -> Result<Envelope, DomainError> {
        debug!("Listing ideas");
        let mut spec = QuerySpec::nodes(params.published)
            .sorted_by(SortKey::desc("field_sort_by_date"))
            .sorted_by(SortKey::desc("changed"))
            .paged(params.page, params.limit);

        let categories = self
            .identifiers
            .resolve_uuids(EntityKind::TaxonomyTerm, &filters.categories)?;
        if !categories.is_empty() {
            spec = spec.with_any_of(reference_path("field_category"), categories);
        }
        let tags = self
            .identifiers
            .resolve_uuids(EntityKind::TaxonomyTerm, &filters.tags)?;
        if !tags.is_empty() {
            spec = spec.with_any_of(reference_path("field_tag"), tags);
        }

        let requested: Vec<&String> = filters
            .types
            .iter()
            .filter(|t| self.config.idea_types.contains(*t))
            .collect();
        spec = if requested.is_empty() {
            spec.with_any_of("type", self.config.idea_types.iter().cloned())
        } else {
            spec.with_any_of("type", requested.into_iter().cloned())
        };

        self.fetcher
            .fetch_page(&spec, &self.list_context(params), ResultShape::Projected)
    }

    fn product_spec(&self, sku: &str, params: &ListParams) -> Result<QuerySpec, DomainError> {
        let product = self
            .repository
            .load_by_field(EntityKind::Node, "field_sku", sku)?
            .into_iter()
            .next()
            .ok_or(DomainError::NotFound)?;

        Ok(QuerySpec::nodes(params.published)
            .with_any_of("type", self.config.product_content_types.iter().cloned())
            .with_condition(reference_path("field_products"), product.uuid.to_string())
            .sorted_by(SortKey::desc("created"))
            .paged(params.page, params.limit))
    }

    fn project_one(&self, entity: &Entity, ctx: &ProjectionContext) -> Result<Projected, DomainError> {
        Ok(Projected {
            kind: entity.kind,
            id: entity.id,
            body: self.projector.project(entity, ctx)?,
        })
    }

    fn brand_id(&self, brand: Option<&str>) -> Result<Option<EntityId>, DomainError> {
        let Some(name) = brand.filter(|name| !name.is_empty()) else {
            return Ok(None);
        };
        Ok(self.repository.find_term_by_name(name)?.map(|term| term.id))
    }

    fn list_context(&self, params: &ListParams) -> ProjectionContext {
        ProjectionContext::new(
            params.recurse,
            params.depth.min(self.config.max_depth),
            params.published,
        )
    }

    fn lookup_context(&self, params: &LookupParams) -> ProjectionContext {
        ProjectionContext::new(params.recurse, params.depth.min(self.config.max_depth), true)
    }

    fn content_type_permitted(&self, content_type: &str) -> bool {
        self.config.content_types.iter().any(|t| t == content_type)
    }

    fn vocabulary_permitted(&self, vocabulary: &str) -> bool {
        self.config.vocabularies.iter().any(|v| v == vocabulary)
    }
}

/// Condition path matching on the uuid of the entity referenced by `field`.
fn reference_path(field: &str) -> String {
    format!("{field}.entity.uuid")
}
