//! JSON content dump consumed by the in-memory store.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::model::{Entity, EntityId, EntityKind, FieldItem};
use crate::domain::schema::{FieldDefinition, TargetKind, ValueType};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContentFixture {
    pub bundles: BundleSchemas,
    pub nodes: Vec<NodeRecord>,
    pub terms: Vec<TermRecord>,
    pub files: Vec<FileRecord>,
    pub aliases: Vec<AliasRecord>,
    /// Defined image styles; every style of the aspect-ratio table when absent.
    pub image_styles: Option<Vec<String>>,
}

/// Configurable fields per content type and per vocabulary.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BundleSchemas {
    pub node: BTreeMap<String, Vec<FieldDefinition>>,
    pub taxonomy_term: BTreeMap<String, Vec<FieldDefinition>>,
}

#[derive(Debug, Deserialize)]
pub struct NodeRecord {
    pub nid: EntityId,
    pub uuid: Uuid,
    #[serde(rename = "type")]
    pub bundle: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "published")]
    pub status: bool,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub changed: Option<i64>,
    #[serde(default)]
    pub fields: HashMap<String, Vec<FieldItem>>,
}

#[derive(Debug, Deserialize)]
pub struct TermRecord {
    pub tid: EntityId,
    pub uuid: Uuid,
    pub vid: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub weight: i64,
    #[serde(default)]
    pub parent: Option<EntityId>,
    #[serde(default)]
    pub changed: i64,
    #[serde(default)]
    pub fields: HashMap<String, Vec<FieldItem>>,
}

#[derive(Debug, Deserialize)]
pub struct FileRecord {
    pub fid: EntityId,
    /// Stream URI such as `public://2021/05/hero.jpg`, or an absolute URL.
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub struct AliasRecord {
    pub source: String,
    pub alias: String,
}

fn published() -> bool {
    true
}

fn reference(target: TargetKind) -> ValueType {
    ValueType::EntityReference { target }
}

/// Storage-level fields every content item carries ahead of its bundle fields.
#[must_use]
pub fn node_base_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::single("nid", ValueType::Integer),
        FieldDefinition::single("uuid", ValueType::Uuid),
        FieldDefinition::single("vid", ValueType::Integer),
        FieldDefinition::single("langcode", ValueType::Unsupported("language".to_owned())),
        FieldDefinition::single("type", reference(TargetKind::NodeType)),
        FieldDefinition::single("status", ValueType::Boolean),
        FieldDefinition::single("title", ValueType::Text),
        FieldDefinition::single("uid", reference(TargetKind::Other("user".to_owned()))),
        FieldDefinition::single("created", ValueType::Date),
        FieldDefinition::single("changed", ValueType::Date),
        FieldDefinition::single("promote", ValueType::Boolean),
        FieldDefinition::single("sticky", ValueType::Boolean),
        FieldDefinition::single("path", ValueType::PathAlias),
    ]
}

/// Storage-level fields every term carries ahead of its vocabulary fields.
#[must_use]
pub fn term_base_fields() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::single("tid", ValueType::Integer),
        FieldDefinition::single("uuid", ValueType::Uuid),
        FieldDefinition::single("langcode", ValueType::Unsupported("language".to_owned())),
        FieldDefinition::single(
            "vid",
            reference(TargetKind::Other("taxonomy_vocabulary".to_owned())),
        ),
        FieldDefinition::single("name", ValueType::Text),
        FieldDefinition::single("description", ValueType::LongText),
        FieldDefinition::single("weight", ValueType::Integer),
        FieldDefinition::multiple("parent", reference(TargetKind::TaxonomyTerm)),
        FieldDefinition::single("changed", ValueType::Date),
        FieldDefinition::single("default_langcode", ValueType::Boolean),
        FieldDefinition::single("path", ValueType::PathAlias),
    ]
}

fn flag(value: bool) -> FieldItem {
    FieldItem::value(if value { "1" } else { "0" })
}

impl NodeRecord {
    /// Entity with base fields synthesized from the record header.
    #[must_use]
    pub fn into_entity(self) -> Entity {
        let changed = self.changed.unwrap_or(self.created);
        let mut entity = Entity::new(EntityKind::Node, self.nid, self.uuid, self.bundle.clone())
            .with_published(self.status)
            .with_field("nid", vec![FieldItem::value(self.nid.to_string())])
            .with_field("uuid", vec![FieldItem::value(self.uuid.to_string())])
            .with_field("vid", vec![FieldItem::value(self.nid.to_string())])
            .with_field("langcode", vec![FieldItem::value("en")])
            .with_field("type", vec![FieldItem::target(&self.bundle)])
            .with_field("status", vec![flag(self.status)])
            .with_field("uid", vec![FieldItem::target(1)])
            .with_field("created", vec![FieldItem::value(self.created.to_string())])
            .with_field("changed", vec![FieldItem::value(changed.to_string())])
            .with_field("promote", vec![flag(false)])
            .with_field("sticky", vec![flag(false)]);
        if !self.title.is_empty() {
            entity.set_field("title", vec![FieldItem::value(self.title)]);
        }
        for (name, items) in self.fields {
            entity.set_field(name, items);
        }
        entity
    }
}

impl TermRecord {
    /// Entity with base fields synthesized from the record header.
    #[must_use]
    pub fn into_entity(self) -> Entity {
        let mut entity =
            Entity::new(EntityKind::TaxonomyTerm, self.tid, self.uuid, self.vid.clone())
                .with_field("tid", vec![FieldItem::value(self.tid.to_string())])
                .with_field("uuid", vec![FieldItem::value(self.uuid.to_string())])
                .with_field("langcode", vec![FieldItem::value("en")])
                .with_field("vid", vec![FieldItem::target(&self.vid)])
                .with_field("name", vec![FieldItem::value(self.name)])
                .with_field("weight", vec![FieldItem::value(self.weight.to_string())])
                .with_field(
                    "parent",
                    vec![FieldItem::target(self.parent.unwrap_or_default())],
                )
                .with_field("changed", vec![FieldItem::value(self.changed.to_string())])
                .with_field("default_langcode", vec![flag(true)]);
        if !self.description.is_empty() {
            entity.set_field("description", vec![FieldItem::value(self.description)]);
        }
        for (name, items) in self.fields {
            entity.set_field(name, items);
        }
        entity
    }
}
