//! Field schemas per (entity kind, bundle) and the process-wide cache over them.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use tracing::debug;

use super::error::DomainError;
use super::model::EntityKind;
use super::ports::SchemaSource;

/// What an entity-reference field points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    Node,
    TaxonomyTerm,
    /// Reference to a content type; rendered as the bundle name.
    NodeType,
    Other(String),
}

impl TargetKind {
    fn from_storage(target_type: Option<&str>) -> Self {
        match target_type {
            Some("node") => TargetKind::Node,
            Some("taxonomy_term") => TargetKind::TaxonomyTerm,
            Some("node_type") => TargetKind::NodeType,
            other => TargetKind::Other(other.unwrap_or_default().to_owned()),
        }
    }

    #[must_use]
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            TargetKind::Node => Some(EntityKind::Node),
            TargetKind::TaxonomyTerm => Some(EntityKind::TaxonomyTerm),
            TargetKind::NodeType | TargetKind::Other(_) => None,
        }
    }
}

/// Declared value type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Text,
    LongText,
    Uuid,
    Integer,
    Float,
    Boolean,
    Date,
    PathAlias,
    Link,
    File,
    Image { max_resolution: Option<String> },
    EntityReference { target: TargetKind },
    Unsupported(String),
}

impl ValueType {
    /// Maps a storage type name onto the value-type enumeration.
    #[must_use]
    pub fn from_storage(
        type_name: &str,
        target_type: Option<&str>,
        max_resolution: Option<&str>,
    ) -> Self {
        match type_name {
            "string" | "text" => ValueType::Text,
            "string_long" | "text_long" => ValueType::LongText,
            "uuid" => ValueType::Uuid,
            "integer" => ValueType::Integer,
            "float" => ValueType::Float,
            "boolean" => ValueType::Boolean,
            "created" | "changed" => ValueType::Date,
            "path" => ValueType::PathAlias,
            "link" => ValueType::Link,
            "file" => ValueType::File,
            "image" => ValueType::Image {
                max_resolution: max_resolution.map(str::to_owned),
            },
            "entity_reference" => ValueType::EntityReference {
                target: TargetKind::from_storage(target_type),
            },
            other => ValueType::Unsupported(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    Multiple,
}

impl Cardinality {
    /// Storage cardinality: `1` is single, `-1` (unlimited) or anything above 1 is multiple.
    #[must_use]
    pub fn from_limit(limit: i32) -> Self {
        if limit == 1 || limit == 0 {
            Cardinality::Single
        } else {
            Cardinality::Multiple
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "StoredFieldDefinition")]
pub struct FieldDefinition {
    pub name: String,
    pub value_type: ValueType,
    pub cardinality: Cardinality,
}

impl FieldDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, value_type: ValueType, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            value_type,
            cardinality,
        }
    }

    #[must_use]
    pub fn single(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, value_type, Cardinality::Single)
    }

    #[must_use]
    pub fn multiple(name: impl Into<String>, value_type: ValueType) -> Self {
        Self::new(name, value_type, Cardinality::Multiple)
    }

    #[must_use]
    pub fn is_multiple(&self) -> bool {
        self.cardinality == Cardinality::Multiple
    }
}

/// Field definition as exported by the storage engine.
#[derive(Deserialize)]
struct StoredFieldDefinition {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default = "single_cardinality")]
    cardinality: i32,
    #[serde(default)]
    target_type: Option<String>,
    #[serde(default)]
    max_resolution: Option<String>,
}

fn single_cardinality() -> i32 {
    1
}

impl From<StoredFieldDefinition> for FieldDefinition {
    fn from(stored: StoredFieldDefinition) -> Self {
        Self {
            value_type: ValueType::from_storage(
                &stored.type_name,
                stored.target_type.as_deref(),
                stored.max_resolution.as_deref(),
            ),
            cardinality: Cardinality::from_limit(stored.cardinality),
            name: stored.name,
        }
    }
}

/// Ordered field definitions of one bundle.
pub type FieldSchema = Arc<[FieldDefinition]>;

/// Read-through cache over a [`SchemaSource`].
///
/// Schemas are immutable at runtime, so entries live for the process lifetime.
pub struct SchemaIntrospector {
    source: Arc<dyn SchemaSource>,
    cache: DashMap<(EntityKind, String), FieldSchema>,
}

impl SchemaIntrospector {
    #[must_use]
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            source,
            cache: DashMap::new(),
        }
    }

    /// Field definitions of `bundle`, in declaration order.
    ///
    /// An unknown bundle yields an empty schema; existence checks belong to the caller.
    ///
    /// # Errors
    /// Returns `DomainError::Storage` when the schema source fails.
    pub fn fields(&self, kind: EntityKind, bundle: &str) -> Result<FieldSchema, DomainError> {
        let key = (kind, bundle.to_owned());
        if let Some(schema) = self.cache.get(&key) {
            return Ok(Arc::clone(schema.value()));
        }

        let definitions = self.source.field_definitions(kind, bundle)?;
        debug!(%kind, bundle, fields = definitions.len(), "Schema loaded");

        let schema: FieldSchema = definitions.into();
        self.cache.insert(key, Arc::clone(&schema));
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    impl SchemaSource for CountingSource {
        fn field_definitions(
            &self,
            _kind: EntityKind,
            bundle: &str,
        ) -> anyhow::Result<Vec<FieldDefinition>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if bundle == "project" {
                Ok(vec![
                    FieldDefinition::single("uuid", ValueType::Uuid),
                    FieldDefinition::single("field_rating", ValueType::Float),
                ])
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[test]
    fn schema_is_cached_per_kind_and_bundle() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let introspector = SchemaIntrospector::new(source.clone());

        let first = introspector.fields(EntityKind::Node, "project").unwrap();
        let second = introspector.fields(EntityKind::Node, "project").unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "uuid");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        introspector
            .fields(EntityKind::TaxonomyTerm, "project")
            .unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_bundle_is_empty() {
        let introspector = SchemaIntrospector::new(Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        }));
        assert!(introspector.fields(EntityKind::Node, "user").unwrap().is_empty());
    }

    #[test]
    fn stored_definitions_map_onto_value_types() {
        let defs: Vec<FieldDefinition> = serde_json::from_str(
            r#"[
                {"name":"field_category","type":"entity_reference","target_type":"taxonomy_term","cardinality":-1},
                {"name":"type","type":"entity_reference","target_type":"node_type"},
                {"name":"field_hero","type":"image","max_resolution":"1600x696"},
                {"name":"langcode","type":"language"}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            defs[0].value_type,
            ValueType::EntityReference {
                target: TargetKind::TaxonomyTerm
            }
        );
        assert!(defs[0].is_multiple());
        assert_eq!(
            defs[1].value_type,
            ValueType::EntityReference {
                target: TargetKind::NodeType
            }
        );
        assert!(!defs[1].is_multiple());
        assert_eq!(
            defs[2].value_type,
            ValueType::Image {
                max_resolution: Some("1600x696".to_owned())
            }
        );
        assert_eq!(defs[3].value_type, ValueType::Unsupported("language".to_owned()));
    }

    #[test]
    fn cardinality_from_storage_limit() {
        assert_eq!(Cardinality::from_limit(1), Cardinality::Single);
        assert_eq!(Cardinality::from_limit(-1), Cardinality::Multiple);
        assert_eq!(Cardinality::from_limit(4), Cardinality::Multiple);
    }
}
