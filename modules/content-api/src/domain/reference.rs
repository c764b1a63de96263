//! Entity-reference resolution: full projection while depth budget remains, stubs afterwards.

use serde_json::{Map, Value};

use super::context::{Depth, ProjectionContext};
use super::error::DomainError;
use super::model::{Entity, EntityKind, FieldItem};
use super::projector::EntityProjector;
use super::schema::TargetKind;

/// Minimal `{uuid, type}` form of an entity; `type` is the bundle or vocabulary.
#[must_use]
pub fn stub(entity: &Entity) -> Value {
    let mut stub = Map::new();
    stub.insert("uuid".to_owned(), Value::String(entity.uuid.to_string()));
    stub.insert("type".to_owned(), Value::String(entity.bundle.clone()));
    Value::Object(stub)
}

impl EntityProjector {
    /// Renders the targets of a reference field met at `depth`.
    ///
    /// Single-valued fields yield one object or `null`; multi-valued ones an
    /// array that skips targets which no longer load.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub(crate) fn resolve_references(
        &self,
        items: &[FieldItem],
        target: &TargetKind,
        multiple: bool,
        ctx: &ProjectionContext,
        depth: Depth,
    ) -> Result<Value, DomainError> {
        let kind = match target {
            TargetKind::Node => EntityKind::Node,
            TargetKind::TaxonomyTerm => EntityKind::TaxonomyTerm,
            TargetKind::NodeType => {
                let bundle = items.first().map(FieldItem::scalar).unwrap_or_default();
                return Ok(Value::String(bundle.to_owned()));
            }
            TargetKind::Other(_) => return Ok(Value::Null),
        };

        let descend = ctx.should_descend(depth);
        let child_depth = if descend { depth.descend() } else { depth };

        if !multiple {
            let Some(target) = self.load_target(kind, items.first())? else {
                return Ok(Value::Null);
            };
            return self.render_reference(&target, ctx, descend, child_depth);
        }

        let mut rendered = Vec::with_capacity(items.len());
        for item in items {
            if let Some(target) = self.load_target(kind, Some(item))? {
                rendered.push(self.render_reference(&target, ctx, descend, child_depth)?);
            }
        }
        Ok(Value::Array(rendered))
    }

    /// Full projection at `depth` when `descend`, otherwise a stub.
    ///
    /// # Errors
    /// Propagates projection failures.
    pub(crate) fn render_reference(
        &self,
        entity: &Entity,
        ctx: &ProjectionContext,
        descend: bool,
        depth: Depth,
    ) -> Result<Value, DomainError> {
        if descend {
            self.project_at(entity, ctx, depth).map(Value::Object)
        } else {
            Ok(stub(entity))
        }
    }

    fn load_target(
        &self,
        kind: EntityKind,
        item: Option<&FieldItem>,
    ) -> Result<Option<Entity>, DomainError> {
        let Some(id) = item.and_then(FieldItem::target_entity_id) else {
            return Ok(None);
        };
        Ok(self.repository.load(kind, id)?)
    }
}
