//! Classification and resolution of "uuid or path alias" tokens.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;
use uuid::Uuid;

use super::error::DomainError;
use super::model::{Entity, EntityId, EntityKind};
use super::ports::{AliasResolver, ContentRepository};

#[allow(clippy::expect_used)] // good regex, it doesn't panic
static UUID_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$")
        .expect("static regex should not panic")
});
#[allow(clippy::expect_used)] // good regex, it doesn't panic
static NODE_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"node/(\d+)").expect("static regex should not panic"));
#[allow(clippy::expect_used)] // good regex, it doesn't panic
static TERM_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"taxonomy/term/(\d+)").expect("static regex should not panic"));

/// Lowercase hyphenated 8-4-4-4-12 hex string.
#[must_use]
pub fn is_uuid(token: &str) -> bool {
    UUID_SHAPE.is_match(token)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Uuid(Uuid),
    Alias(String),
}

impl Identifier {
    #[must_use]
    pub fn classify(token: &str) -> Identifier {
        match Uuid::parse_str(token) {
            Ok(uuid) if is_uuid(token) => Identifier::Uuid(uuid),
            _ => Identifier::Alias(token.to_owned()),
        }
    }
}

/// Id carried by an internal source path of `kind`, e.g. `/taxonomy/term/12`.
#[must_use]
pub fn id_from_source(kind: EntityKind, source: &str) -> Option<EntityId> {
    let pattern = match kind {
        EntityKind::Node => &*NODE_SOURCE,
        EntityKind::TaxonomyTerm => &*TERM_SOURCE,
    };
    pattern.captures(source)?.get(1)?.as_str().parse().ok()
}

/// Resolves tokens to entities through uuid lookup or the alias table.
pub struct IdentifierResolver {
    repository: Arc<dyn ContentRepository>,
    aliases: Arc<dyn AliasResolver>,
}

impl IdentifierResolver {
    #[must_use]
    pub fn new(repository: Arc<dyn ContentRepository>, aliases: Arc<dyn AliasResolver>) -> Self {
        Self {
            repository,
            aliases,
        }
    }

    /// Internal id behind `token`, `None` when nothing matches at any stage.
    ///
    /// # Errors
    /// Returns `DomainError::Storage` on lookup failure.
    pub fn resolve(&self, kind: EntityKind, token: &str) -> Result<Option<EntityId>, DomainError> {
        Ok(self.resolve_entity(kind, token)?.map(|entity| entity.id))
    }

    /// Entity behind `token`, `None` when nothing matches at any stage.
    ///
    /// # Errors
    /// Returns `DomainError::Storage` on lookup failure.
    pub fn resolve_entity(
        &self,
        kind: EntityKind,
        token: &str,
    ) -> Result<Option<Entity>, DomainError> {
        if token.is_empty() {
            return Ok(None);
        }

        match Identifier::classify(token) {
            Identifier::Uuid(uuid) => Ok(self.repository.load_by_uuid(kind, uuid)?),
            Identifier::Alias(alias) => {
                let Some(source) = self.aliases.source_for_alias(&format!("/{alias}"))? else {
                    debug!(%kind, %alias, "Alias not found");
                    return Ok(None);
                };
                let Some(id) = id_from_source(kind, &source) else {
                    debug!(%kind, %alias, %source, "Alias points elsewhere");
                    return Ok(None);
                };
                Ok(self.repository.load(kind, id)?)
            }
        }
    }

    /// UUIDs for a list of tokens: uuid-shaped tokens pass through, aliases
    /// are resolved, and unresolvable tokens are dropped.
    ///
    /// # Errors
    /// Returns `DomainError::Storage` on lookup failure.
    pub fn resolve_uuids(
        &self,
        kind: EntityKind,
        tokens: &[String],
    ) -> Result<Vec<String>, DomainError> {
        let mut uuids = Vec::with_capacity(tokens.len());
        for token in tokens {
            if is_uuid(token) {
                uuids.push(token.clone());
            } else if let Some(entity) = self.resolve_entity(kind, token)? {
                uuids.push(entity.uuid.to_string());
            }
        }
        Ok(uuids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ContentPorts;
    use crate::infra::storage::InMemoryContentStore;

    const FIXTURE: &str = r#"{
        "bundles": {"node": {"article": []}, "taxonomy_term": {"category": []}},
        "nodes": [
            {"nid": 12, "uuid": "3f0b1c7e-9d2a-4e5b-8c6d-0a1b2c3d4e5f", "type": "article", "created": 1}
        ],
        "terms": [
            {"tid": 7, "uuid": "5d6e7f80-91a2-43b4-8576-8d9e0f1a2b3c", "vid": "category", "name": "Paper"}
        ],
        "aliases": [
            {"source": "/node/12", "alias": "/folding-basics"},
            {"source": "/taxonomy/term/7", "alias": "/crafts/paper"}
        ]
    }"#;

    fn resolver() -> IdentifierResolver {
        let store = Arc::new(InMemoryContentStore::from_json_str(FIXTURE, "http://cdn.test").unwrap());
        let ports = ContentPorts::from_store(&store);
        IdentifierResolver::new(ports.repository, ports.aliases)
    }

    #[test]
    fn resolve_maps_uuid_and_alias_to_ids() {
        let resolver = resolver();
        assert_eq!(
            resolver
                .resolve(EntityKind::Node, "3f0b1c7e-9d2a-4e5b-8c6d-0a1b2c3d4e5f")
                .unwrap(),
            Some(12)
        );
        assert_eq!(
            resolver.resolve(EntityKind::Node, "folding-basics").unwrap(),
            Some(12)
        );
        assert_eq!(
            resolver.resolve(EntityKind::TaxonomyTerm, "crafts/paper").unwrap(),
            Some(7)
        );
    }

    #[test]
    fn resolve_misses_are_none() {
        let resolver = resolver();
        // alias of a term looked up as content, and the other way round
        assert_eq!(resolver.resolve(EntityKind::Node, "crafts/paper").unwrap(), None);
        assert_eq!(
            resolver.resolve(EntityKind::TaxonomyTerm, "folding-basics").unwrap(),
            None
        );
        // uuid of a content item looked up as a term
        assert_eq!(
            resolver
                .resolve(EntityKind::TaxonomyTerm, "3f0b1c7e-9d2a-4e5b-8c6d-0a1b2c3d4e5f")
                .unwrap(),
            None
        );
        assert_eq!(resolver.resolve(EntityKind::Node, "no-such-page").unwrap(), None);
        assert_eq!(resolver.resolve(EntityKind::Node, "").unwrap(), None);
    }

    #[test]
    fn resolve_uuids_drops_unresolvable_tokens() {
        let tokens = vec![
            "crafts/paper".to_owned(),
            "unknown".to_owned(),
            "00000000-0000-4000-8000-000000000099".to_owned(),
        ];
        assert_eq!(
            resolver()
                .resolve_uuids(EntityKind::TaxonomyTerm, &tokens)
                .unwrap(),
            vec![
                "5d6e7f80-91a2-43b4-8576-8d9e0f1a2b3c".to_owned(),
                "00000000-0000-4000-8000-000000000099".to_owned(),
            ]
        );
    }

    #[test]
    fn uuid_shape_is_lowercase_hyphenated_hex() {
        assert!(is_uuid("3f0b1c7e-9d2a-4e5b-8c6d-0a1b2c3d4e5f"));
        assert!(!is_uuid("3F0B1C7E-9D2A-4E5B-8C6D-0A1B2C3D4E5F"));
        assert!(!is_uuid("3f0b1c7e9d2a4e5b8c6d0a1b2c3d4e5f"));
        assert!(!is_uuid("my-project"));
        assert!(!is_uuid(" 3f0b1c7e-9d2a-4e5b-8c6d-0a1b2c3d4e5f"));
    }

    #[test]
    fn classify_splits_uuids_from_aliases() {
        assert!(matches!(
            Identifier::classify("3f0b1c7e-9d2a-4e5b-8c6d-0a1b2c3d4e5f"),
            Identifier::Uuid(_)
        ));
        assert_eq!(
            Identifier::classify("crafts/paper"),
            Identifier::Alias("crafts/paper".to_owned())
        );
    }

    #[test]
    fn ids_are_extracted_per_kind() {
        assert_eq!(id_from_source(EntityKind::Node, "/node/42"), Some(42));
        assert_eq!(id_from_source(EntityKind::TaxonomyTerm, "/taxonomy/term/7"), Some(7));
        assert_eq!(id_from_source(EntityKind::Node, "/taxonomy/term/7"), None);
        assert_eq!(id_from_source(EntityKind::TaxonomyTerm, "/node/42"), None);
        assert_eq!(id_from_source(EntityKind::Node, "/user/3"), None);
    }
}
