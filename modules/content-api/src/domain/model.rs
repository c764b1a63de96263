//! Read-only view of the entities handed out by the storage engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Internal numeric identifier (`nid` for content items, `tid` for terms).
pub type EntityId = u64;

/// The two entity families exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Node,
    TaxonomyTerm,
}

impl EntityKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::TaxonomyTerm => "taxonomy_term",
        }
    }

    /// Canonical internal path of an entity, the key used by the alias table.
    #[must_use]
    pub fn internal_path(self, id: EntityId) -> String {
        match self {
            EntityKind::Node => format!("/node/{id}"),
            EntityKind::TaxonomyTerm => format!("/taxonomy/term/{id}"),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored item of a field, in the shape the storage engine keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldItem {
    /// Reference to another entity, a file, or a bundle name.
    Target { target_id: String },
    Link {
        uri: String,
        #[serde(default)]
        title: String,
    },
    Value { value: String },
}

impl FieldItem {
    #[must_use]
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value {
            value: value.into(),
        }
    }

    #[must_use]
    pub fn target(target_id: impl ToString) -> Self {
        Self::Target {
            target_id: target_id.to_string(),
        }
    }

    #[must_use]
    pub fn link(uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self::Link {
            uri: uri.into(),
            title: title.into(),
        }
    }

    #[must_use]
    pub fn target_id(&self) -> Option<&str> {
        match self {
            FieldItem::Target { target_id } => Some(target_id),
            _ => None,
        }
    }

    /// Numeric target id; `None` for non-numeric targets such as bundle names.
    #[must_use]
    pub fn target_entity_id(&self) -> Option<EntityId> {
        self.target_id().and_then(|id| id.trim().parse().ok())
    }

    /// The comparable scalar carried by the item, whatever its shape.
    #[must_use]
    pub fn scalar(&self) -> &str {
        match self {
            FieldItem::Target { target_id } => target_id,
            FieldItem::Link { uri, .. } => uri,
            FieldItem::Value { value } => value,
        }
    }
}

/// A content item or taxonomy term.
///
/// `bundle` is the content type for nodes and the vocabulary for terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub uuid: Uuid,
    pub kind: EntityKind,
    pub bundle: String,
    pub published: bool,
    fields: HashMap<String, Vec<FieldItem>>,
}

impl Entity {
    #[must_use]
    pub fn new(kind: EntityKind, id: EntityId, uuid: Uuid, bundle: impl Into<String>) -> Self {
        Self {
            id,
            uuid,
            kind,
            bundle: bundle.into(),
            published: true,
            fields: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, items: Vec<FieldItem>) -> Self {
        self.set_field(name, items);
        self
    }

    pub fn set_field(&mut self, name: impl Into<String>, items: Vec<FieldItem>) {
        self.fields.insert(name.into(), items);
    }

    /// Stored items of a field; empty when the entity has no value for it.
    #[must_use]
    pub fn field(&self, name: &str) -> &[FieldItem] {
        self.fields.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn internal_path(&self) -> String {
        self.kind.internal_path(self.id)
    }
}
