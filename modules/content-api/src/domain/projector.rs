//! Schema-driven entity to JSON projection.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::trace;

use super::context::{Depth, ProjectionContext};
use super::error::DomainError;
use super::formatter::{DateFormat, Formatter, is_ignored_field};
use super::model::{Entity, EntityKind, FieldItem};
use super::ports::{AliasResolver, ContentPorts, ContentRepository, FileUrlGenerator};
use super::schema::SchemaIntrospector;

/// Turns entities into plain JSON objects.
///
/// Field rendering lives in `formatter.rs` and reference handling in
/// `reference.rs`; both extend this type.
pub struct EntityProjector {
    pub(crate) repository: Arc<dyn ContentRepository>,
    pub(crate) schema: Arc<SchemaIntrospector>,
    pub(crate) aliases: Arc<dyn AliasResolver>,
    pub(crate) files: Arc<dyn FileUrlGenerator>,
    pub(crate) dates: DateFormat,
}

/// What a projected entity renders for a supported field with no stored value.
#[derive(Clone, Copy)]
enum EmptyValue {
    Null,
    EmptyString,
    Omit,
}

impl EntityProjector {
    #[must_use]
    pub fn new(ports: &ContentPorts, schema: Arc<SchemaIntrospector>, dates: DateFormat) -> Self {
        Self {
            repository: Arc::clone(&ports.repository),
            schema,
            aliases: Arc::clone(&ports.aliases),
            files: Arc::clone(&ports.files),
            dates,
        }
    }

    /// Projects a top-level entity.
    ///
    /// # Errors
    /// Any failure here is an internal fault: not-found and permission checks
    /// happen before projection starts.
    pub fn project(&self, entity: &Entity, ctx: &ProjectionContext) -> Result<Value, DomainError> {
        self.project_at(entity, ctx, Depth::ROOT).map(Value::Object)
    }

    /// Projects `entity` whose references are met at `depth`.
    pub(crate) fn project_at(
        &self,
        entity: &Entity,
        ctx: &ProjectionContext,
        depth: Depth,
    ) -> Result<Map<String, Value>, DomainError> {
        trace!(kind = %entity.kind, id = entity.id, depth = depth.get(), "Projecting entity");
        match entity.kind {
            EntityKind::Node => self.project_node(entity, ctx, depth),
            EntityKind::TaxonomyTerm => self.project_term(entity, ctx, depth),
        }
    }

    fn project_node(
        &self,
        entity: &Entity,
        ctx: &ProjectionContext,
        depth: Depth,
    ) -> Result<Map<String, Value>, DomainError> {
        let empty = if ctx.omits_empty_values() {
            EmptyValue::Omit
        } else {
            EmptyValue::Null
        };
        let mut view = Map::new();
        self.project_fields(entity, ctx, depth, empty, &mut view)?;
        Ok(view)
    }

    /// Terms get `parent` and `type` ahead of their schema fields.
    fn project_term(
        &self,
        entity: &Entity,
        ctx: &ProjectionContext,
        depth: Depth,
    ) -> Result<Map<String, Value>, DomainError> {
        let mut view = Map::new();
        view.insert("parent".to_owned(), Value::String(self.parent_uuid(entity)?));
        view.insert("type".to_owned(), Value::String(entity.bundle.clone()));
        self.project_fields(entity, ctx, depth, EmptyValue::EmptyString, &mut view)?;
        Ok(view)
    }

    fn project_fields(
        &self,
        entity: &Entity,
        ctx: &ProjectionContext,
        depth: Depth,
        empty: EmptyValue,
        view: &mut Map<String, Value>,
    ) -> Result<(), DomainError> {
        let schema = self.schema.fields(entity.kind, &entity.bundle)?;
        let node = entity.kind == EntityKind::Node;

        for definition in schema.iter() {
            if node && !ctx.allows_field(&definition.name) {
                continue;
            }
            if is_ignored_field(&definition.name) {
                continue;
            }
            let Some(formatter) = Formatter::for_type(&definition.value_type) else {
                continue;
            };

            if !formatter.is_computed() && has_no_value(formatter, entity.field(&definition.name)) {
                match empty {
                    EmptyValue::Null => {
                        view.insert(definition.name.clone(), Value::Null);
                    }
                    EmptyValue::EmptyString => {
                        view.insert(definition.name.clone(), Value::String(String::new()));
                    }
                    EmptyValue::Omit => {}
                }
                continue;
            }

            let value = self.format_field(formatter, entity, definition, ctx, depth)?;
            view.insert(definition.name.clone(), value);
        }
        Ok(())
    }

    /// UUID of the first parent term, or `""` for a root term.
    fn parent_uuid(&self, term: &Entity) -> Result<String, DomainError> {
        let Some(parent_id) = self.repository.parents_of(term.id)?.into_iter().next() else {
            return Ok(String::new());
        };
        Ok(self
            .repository
            .load(EntityKind::TaxonomyTerm, parent_id)?
            .map(|parent| parent.uuid.to_string())
            .unwrap_or_default())
    }
}

/// No stored items, or only blank scalars for a non-reference field.
fn has_no_value(formatter: Formatter, items: &[FieldItem]) -> bool {
    match formatter {
        Formatter::Reference => items.is_empty(),
        _ => items.iter().all(|item| item.scalar().is_empty()),
    }
}
