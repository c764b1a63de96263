use std::sync::Arc;

use uuid::Uuid;

use super::model::{Entity, EntityId, EntityKind};
use super::query::EntityQuery;
use super::schema::FieldDefinition;

/// Read access to stored entities.
///
/// Implementations must be safe to share across request workers.
pub trait ContentRepository: Send + Sync {
    /// Load a single entity; `Ok(None)` when it does not exist.
    fn load(&self, kind: EntityKind, id: EntityId) -> anyhow::Result<Option<Entity>>;

    /// Load many entities, preserving the order of `ids` and skipping missing ones.
    fn load_many(&self, kind: EntityKind, ids: &[EntityId]) -> anyhow::Result<Vec<Entity>> {
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.load(kind, *id)? {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    fn load_by_uuid(&self, kind: EntityKind, uuid: Uuid) -> anyhow::Result<Option<Entity>>;

    /// All entities of `kind` whose `field` holds `value`, in id order.
    fn load_by_field(
        &self,
        kind: EntityKind,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Vec<Entity>>;

    /// First term named `name` in any vocabulary.
    fn find_term_by_name(&self, name: &str) -> anyhow::Result<Option<Entity>>;

    /// Parent term ids of `tid`, in storage order.
    fn parents_of(&self, tid: EntityId) -> anyhow::Result<Vec<EntityId>>;

    fn bundle_exists(&self, kind: EntityKind, bundle: &str) -> anyhow::Result<bool>;

    /// Total number of entities matching `query`, ignoring its range.
    fn count(&self, query: &EntityQuery) -> anyhow::Result<u64>;

    /// Ids of the requested page of `query`, in query order.
    fn fetch_ids(&self, query: &EntityQuery) -> anyhow::Result<Vec<EntityId>>;
}

/// Field definitions per bundle.
pub trait SchemaSource: Send + Sync {
    /// Ordered field definitions of `bundle`; empty for an unknown bundle.
    fn field_definitions(
        &self,
        kind: EntityKind,
        bundle: &str,
    ) -> anyhow::Result<Vec<FieldDefinition>>;
}

/// Two-way mapping between public aliases and internal paths.
pub trait AliasResolver: Send + Sync {
    /// Internal path behind a public alias such as `/my-article`.
    fn source_for_alias(&self, alias: &str) -> anyhow::Result<Option<String>>;

    /// Public alias of an internal path such as `/node/12`.
    fn alias_for_source(&self, source: &str) -> anyhow::Result<Option<String>>;
}

/// Public URLs for stored files.
pub trait FileUrlGenerator: Send + Sync {
    /// Absolute URL of a stored file, `None` when the file id is unknown.
    fn file_url(&self, file_id: EntityId) -> anyhow::Result<Option<String>>;

    /// Absolute URL of a derived image style, `None` when the style is not defined.
    fn style_url(&self, file_id: EntityId, style: &str) -> anyhow::Result<Option<String>>;
}

/// Bundle of the storage-side collaborators used by the domain service.
#[derive(Clone)]
pub struct ContentPorts {
    pub repository: Arc<dyn ContentRepository>,
    pub schema: Arc<dyn SchemaSource>,
    pub aliases: Arc<dyn AliasResolver>,
    pub files: Arc<dyn FileUrlGenerator>,
}

impl ContentPorts {
    /// Ports backed by a single store implementing every trait.
    #[must_use]
    pub fn from_store<S>(store: &Arc<S>) -> Self
    where
        S: ContentRepository + SchemaSource + AliasResolver + FileUrlGenerator + 'static,
    {
        Self {
            repository: store.clone(),
            schema: store.clone(),
            aliases: store.clone(),
            files: store.clone(),
        }
    }
}
