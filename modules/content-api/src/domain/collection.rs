//! Paginated listings: count, fetch a page of ids, load and project.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::context::{Depth, ProjectionContext};
use super::error::DomainError;
use super::ports::ContentRepository;
use super::projector::EntityProjector;
use super::query::{QueryBuilder, QuerySpec};

/// Response wrapper of every listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub limit: u64,
    pub page: u64,
    /// Absent for vocabulary listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    pub count: u64,
    pub results: Vec<Value>,
}

/// How top-level results of a page are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    /// Always fully projected; `recurse` only governs references.
    Projected,
    /// Stubs unless the request recurses.
    StubUnlessRecursing,
}

pub struct CollectionFetcher {
    repository: Arc<dyn ContentRepository>,
    projector: Arc<EntityProjector>,
}

impl CollectionFetcher {
    #[must_use]
    pub fn new(repository: Arc<dyn ContentRepository>, projector: Arc<EntityProjector>) -> Self {
        Self {
            repository,
            projector,
        }
    }

    /// Number of entities matching `spec`, regardless of its page window.
    ///
    /// # Errors
    /// Returns `DomainError::Storage` when the query fails.
    pub fn count(&self, spec: &QuerySpec) -> Result<u64, DomainError> {
        Ok(self.repository.count(&QueryBuilder::build(spec))?)
    }

    /// Runs the count and the ranged fetch over the same filter and projects the page.
    ///
    /// # Errors
    /// Storage and projection failures abort the whole page.
    pub fn fetch_page(
        &self,
        spec: &QuerySpec,
        ctx: &ProjectionContext,
        shape: ResultShape,
    ) -> Result<Envelope, DomainError> {
        let query = QueryBuilder::build(spec);
        let count = self.repository.count(&query)?;
        let ids = self.repository.fetch_ids(&query.with_range(spec.range()))?;
        debug!(kind = %spec.kind, count, page = spec.page, fetched = ids.len(), "Listing fetched");

        let mut envelope = Envelope {
            limit: spec.limit,
            page: spec.page,
            published: spec.published_only,
            count,
            results: Vec::new(),
        };
        if ids.is_empty() {
            return Ok(envelope);
        }

        let descend = match shape {
            ResultShape::Projected => true,
            ResultShape::StubUnlessRecursing => ctx.recurse,
        };
        let entities = self.repository.load_many(spec.kind, &ids)?;
        envelope.results.reserve(entities.len());
        for entity in &entities {
            envelope
                .results
                .push(self.projector.render_reference(entity, ctx, descend, Depth::ROOT)?);
        }
        Ok(envelope)
    }
}
