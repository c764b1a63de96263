//! In-memory implementation of every storage port, backed by a [`ContentFixture`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::Context;
use tracing::info;
use uuid::Uuid;

use super::fixture::{ContentFixture, node_base_fields, term_base_fields};
use crate::domain::image_styles::known_styles;
use crate::domain::model::{Entity, EntityId, EntityKind, FieldItem};
use crate::domain::ports::{AliasResolver, ContentRepository, FileUrlGenerator, SchemaSource};
use crate::domain::query::{Condition, EntityQuery, SortDirection, SortKey};
use crate::domain::schema::{FieldDefinition, ValueType};

const PUBLIC_SCHEME: &str = "public://";
const PUBLIC_FILES_PATH: &str = "sites/default/files";

#[derive(Default)]
struct KindStore {
    entities: BTreeMap<EntityId, Entity>,
    by_uuid: HashMap<Uuid, EntityId>,
    bundles: BTreeMap<String, Vec<FieldDefinition>>,
}

impl KindStore {
    fn insert(&mut self, entity: Entity) {
        self.bundles.entry(entity.bundle.clone()).or_default();
        self.by_uuid.insert(entity.uuid, entity.id);
        self.entities.insert(entity.id, entity);
    }
}

/// Content repository held entirely in memory.
///
/// Query evaluation mirrors an SQL entity query: conditions match when any
/// stored item of the field matches, dotted `field.entity.<property>` paths
/// follow references, and sorts place missing values first in ascending order.
pub struct InMemoryContentStore {
    nodes: KindStore,
    terms: KindStore,
    files: HashMap<EntityId, String>,
    alias_to_source: HashMap<String, String>,
    source_to_alias: HashMap<String, String>,
    image_styles: HashSet<String>,
    public_base_url: String,
}

impl InMemoryContentStore {
    #[must_use]
    pub fn from_fixture(fixture: ContentFixture, public_base_url: &str) -> Self {
        let mut nodes = KindStore {
            bundles: fixture.bundles.node,
            ..KindStore::default()
        };
        let mut terms = KindStore {
            bundles: fixture.bundles.taxonomy_term,
            ..KindStore::default()
        };
        for record in fixture.nodes {
            nodes.insert(record.into_entity());
        }
        for record in fixture.terms {
            terms.insert(record.into_entity());
        }

        let mut alias_to_source = HashMap::new();
        let mut source_to_alias = HashMap::new();
        for record in fixture.aliases {
            alias_to_source.insert(record.alias.clone(), record.source.clone());
            source_to_alias.entry(record.source).or_insert(record.alias);
        }

        let image_styles = fixture.image_styles.map_or_else(
            || known_styles().map(str::to_owned).collect(),
            |styles| styles.into_iter().collect(),
        );

        info!(
            nodes = nodes.entities.len(),
            terms = terms.entities.len(),
            files = fixture.files.len(),
            aliases = alias_to_source.len(),
            "Content store loaded"
        );

        Self {
            nodes,
            terms,
            files: fixture
                .files
                .into_iter()
                .map(|file| (file.fid, file.uri))
                .collect(),
            alias_to_source,
            source_to_alias,
            image_styles,
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// # Errors
    /// Returns an error when `json` is not a valid content dump.
    pub fn from_json_str(json: &str, public_base_url: &str) -> anyhow::Result<Self> {
        let fixture: ContentFixture =
            serde_json::from_str(json).context("invalid content fixture")?;
        Ok(Self::from_fixture(fixture, public_base_url))
    }

    /// # Errors
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_path(path: &Path, public_base_url: &str) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read content fixture {}", path.display()))?;
        Self::from_json_str(&json, public_base_url)
            .with_context(|| format!("failed to load content fixture {}", path.display()))
    }

    /// A store with no content at all.
    #[must_use]
    pub fn empty(public_base_url: &str) -> Self {
        Self::from_fixture(ContentFixture::default(), public_base_url)
    }

    fn kind(&self, kind: EntityKind) -> &KindStore {
        match kind {
            EntityKind::Node => &self.nodes,
            EntityKind::TaxonomyTerm => &self.terms,
        }
    }

    fn get(&self, kind: EntityKind, id: EntityId) -> Option<&Entity> {
        self.kind(kind).entities.get(&id)
    }

    fn matching<'a>(&'a self, query: &'a EntityQuery) -> impl Iterator<Item = &'a Entity> + 'a {
        self.kind(query.kind)
            .entities
            .values()
            .filter(move |entity| {
                query
                    .conditions
                    .iter()
                    .all(|condition| self.satisfies(entity, condition))
            })
    }

    fn satisfies(&self, entity: &Entity, condition: &Condition) -> bool {
        match condition {
            Condition::Equals { field, value } => self.field_values(entity, field).contains(value),
            Condition::AnyOf(members) => members.iter().any(|member| self.satisfies(entity, member)),
        }
    }

    /// Values stored under `path`, following `field.entity.property` references.
    fn field_values(&self, entity: &Entity, path: &str) -> Vec<String> {
        let Some((field, property)) = path.split_once(".entity.") else {
            return entity
                .field(path)
                .iter()
                .map(|item| item.scalar().to_owned())
                .collect();
        };

        let target_kind = self.reference_target(entity, field);
        entity
            .field(field)
            .iter()
            .filter_map(FieldItem::target_entity_id)
            .filter_map(|id| self.get(target_kind, id))
            .flat_map(|target| self.field_values(target, property))
            .collect()
    }

    /// Entity kind a reference field of `entity` points at; content items by default.
    fn reference_target(&self, entity: &Entity, field: &str) -> EntityKind {
        self.kind(entity.kind)
            .bundles
            .get(&entity.bundle)
            .and_then(|fields| fields.iter().find(|definition| definition.name == field))
            .and_then(|definition| match &definition.value_type {
                ValueType::EntityReference { target } => target.entity_kind(),
                _ => None,
            })
            .unwrap_or(EntityKind::Node)
    }

    fn compare(a: &Entity, b: &Entity, sorts: &[SortKey]) -> Ordering {
        for sort in sorts {
            let ordering = compare_values(
                a.field(&sort.field).first().map(FieldItem::scalar),
                b.field(&sort.field).first().map(FieldItem::scalar),
            );
            let ordering = match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.id.cmp(&b.id)
    }

    fn public_url(&self, uri: &str) -> String {
        match uri.strip_prefix(PUBLIC_SCHEME) {
            Some(relative) => format!("{}/{PUBLIC_FILES_PATH}/{relative}", self.public_base_url),
            None => uri.to_owned(),
        }
    }
}

/// Numeric when both sides are numbers, lexical otherwise; missing values first.
fn compare_values(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => a.cmp(b),
        },
    }
}

impl ContentRepository for InMemoryContentStore {
    fn load(&self, kind: EntityKind, id: EntityId) -> anyhow::Result<Option<Entity>> {
        Ok(self.get(kind, id).cloned())
    }

    fn load_by_uuid(&self, kind: EntityKind, uuid: Uuid) -> anyhow::Result<Option<Entity>> {
        let store = self.kind(kind);
        Ok(store
            .by_uuid
            .get(&uuid)
            .and_then(|id| store.entities.get(id))
            .cloned())
    }

    fn load_by_field(
        &self,
        kind: EntityKind,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Vec<Entity>> {
        Ok(self
            .kind(kind)
            .entities
            .values()
            .filter(|entity| entity.field(field).iter().any(|item| item.scalar() == value))
            .cloned()
            .collect())
    }

    fn find_term_by_name(&self, name: &str) -> anyhow::Result<Option<Entity>> {
        Ok(self
            .terms
            .entities
            .values()
            .find(|term| term.field("name").iter().any(|item| item.scalar() == name))
            .cloned())
    }

    fn parents_of(&self, tid: EntityId) -> anyhow::Result<Vec<EntityId>> {
        Ok(self
            .terms
            .entities
            .get(&tid)
            .map(|term| {
                term.field("parent")
                    .iter()
                    .filter_map(FieldItem::target_entity_id)
                    .filter(|parent| *parent != 0)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn bundle_exists(&self, kind: EntityKind, bundle: &str) -> anyhow::Result<bool> {
        Ok(self.kind(kind).bundles.contains_key(bundle))
    }

    fn count(&self, query: &EntityQuery) -> anyhow::Result<u64> {
        Ok(u64::try_from(self.matching(query).count())?)
    }

    fn fetch_ids(&self, query: &EntityQuery) -> anyhow::Result<Vec<EntityId>> {
        let mut matched: Vec<&Entity> = self.matching(query).collect();
        matched.sort_by(|a, b| Self::compare(a, b, &query.sorts));

        let (offset, length) = match query.range {
            Some(range) => (
                usize::try_from(range.offset).unwrap_or(usize::MAX),
                usize::try_from(range.length).unwrap_or(usize::MAX),
            ),
            None => (0, usize::MAX),
        };
        Ok(matched
            .into_iter()
            .skip(offset)
            .take(length)
            .map(|entity| entity.id)
            .collect())
    }
}

impl SchemaSource for InMemoryContentStore {
    fn field_definitions(
        &self,
        kind: EntityKind,
        bundle: &str,
    ) -> anyhow::Result<Vec<FieldDefinition>> {
        let Some(bundle_fields) = self.kind(kind).bundles.get(bundle) else {
            return Ok(Vec::new());
        };
        let mut fields = match kind {
            EntityKind::Node => node_base_fields(),
            EntityKind::TaxonomyTerm => term_base_fields(),
        };
        fields.extend(bundle_fields.iter().cloned());
        Ok(fields)
    }
}

impl AliasResolver for InMemoryContentStore {
    fn source_for_alias(&self, alias: &str) -> anyhow::Result<Option<String>> {
        Ok(self.alias_to_source.get(alias).cloned())
    }

    fn alias_for_source(&self, source: &str) -> anyhow::Result<Option<String>> {
        Ok(self.source_to_alias.get(source).cloned())
    }
}

impl FileUrlGenerator for InMemoryContentStore {
    fn file_url(&self, file_id: EntityId) -> anyhow::Result<Option<String>> {
        Ok(self.files.get(&file_id).map(|uri| self.public_url(uri)))
    }

    fn style_url(&self, file_id: EntityId, style: &str) -> anyhow::Result<Option<String>> {
        if !self.image_styles.contains(style) {
            return Ok(None);
        }
        Ok(self.files.get(&file_id).map(|uri| {
            let relative = uri.strip_prefix(PUBLIC_SCHEME).unwrap_or(uri);
            format!(
                "{}/{PUBLIC_FILES_PATH}/styles/{style}/public/{relative}",
                self.public_base_url
            )
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::{QueryBuilder, QuerySpec};

    const FIXTURE: &str = r#"{
        "bundles": {
            "node": {"article": [
                {"name": "field_category", "type": "entity_reference", "target_type": "taxonomy_term", "cardinality": -1},
                {"name": "field_full_name", "type": "string"}
            ]},
            "taxonomy_term": {"category": []}
        },
        "nodes": [
            {"nid": 1, "uuid": "00000000-0000-4000-8000-000000000001", "type": "article", "created": 10, "changed": 30,
             "fields": {"field_category": [{"target_id": "7"}], "field_full_name": [{"value": "Bea"}]}},
            {"nid": 2, "uuid": "00000000-0000-4000-8000-000000000002", "type": "article", "created": 20, "changed": 20,
             "fields": {"field_full_name": [{"value": "Al"}]}},
            {"nid": 3, "uuid": "00000000-0000-4000-8000-000000000003", "type": "article", "status": false, "created": 5, "changed": 100}
        ],
        "terms": [
            {"tid": 7, "uuid": "00000000-0000-4000-8000-000000000007", "vid": "category", "name": "Paper", "parent": 8},
            {"tid": 8, "uuid": "00000000-0000-4000-8000-000000000008", "vid": "category", "name": "Crafts"}
        ],
        "files": [
            {"fid": 40, "uri": "public://2021/hero.jpg"},
            {"fid": 41, "uri": "https://cdn.example.com/remote.png"}
        ],
        "aliases": [{"source": "/taxonomy/term/7", "alias": "/crafts/paper"}],
        "image_styles": ["400x400_img"]
    }"#;

    fn store() -> InMemoryContentStore {
        InMemoryContentStore::from_json_str(FIXTURE, "http://localhost:8087/").unwrap()
    }

    #[test]
    fn published_listing_sorts_by_changed_desc() {
        let store = store();
        let query = QueryBuilder::build(&QuerySpec::nodes(true).with_condition("type", "article"));
        assert_eq!(store.count(&query).unwrap(), 2);
        assert_eq!(store.fetch_ids(&query).unwrap(), vec![1, 2]);

        let all = QueryBuilder::build(&QuerySpec::nodes(false));
        assert_eq!(store.fetch_ids(&all).unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn dotted_paths_follow_references() {
        let store = store();
        let query = QueryBuilder::build(
            &QuerySpec::nodes(true)
                .with_condition("field_category.entity.uuid", "00000000-0000-4000-8000-000000000007"),
        );
        assert_eq!(store.fetch_ids(&query).unwrap(), vec![1]);
    }

    #[test]
    fn sorts_put_missing_values_first_and_ranges_apply() {
        let store = store();
        let spec = QuerySpec::nodes(false)
            .sorted_by(SortKey::asc("field_full_name"))
            .paged(0, 2);
        let query = QueryBuilder::build(&spec).with_range(spec.range());
        assert_eq!(store.fetch_ids(&query).unwrap(), vec![3, 2]);
        assert_eq!(store.count(&query).unwrap(), 3);
    }

    #[test]
    fn terms_know_their_parents() {
        let store = store();
        assert_eq!(store.parents_of(7).unwrap(), vec![8]);
        assert!(store.parents_of(8).unwrap().is_empty());
        assert_eq!(
            store.find_term_by_name("Crafts").unwrap().map(|t| t.id),
            Some(8)
        );
    }

    #[test]
    fn file_urls_are_public() {
        let store = store();
        assert_eq!(
            store.file_url(40).unwrap().as_deref(),
            Some("http://localhost:8087/sites/default/files/2021/hero.jpg")
        );
        assert_eq!(
            store.file_url(41).unwrap().as_deref(),
            Some("https://cdn.example.com/remote.png")
        );
        assert_eq!(
            store.style_url(40, "400x400_img").unwrap().as_deref(),
            Some("http://localhost:8087/sites/default/files/styles/400x400_img/public/2021/hero.jpg")
        );
        assert_eq!(store.style_url(40, "465x620_img").unwrap(), None);
        assert_eq!(store.file_url(99).unwrap(), None);
    }

    #[test]
    fn schema_prepends_base_fields() {
        let store = store();
        let fields = store.field_definitions(EntityKind::Node, "article").unwrap();
        assert_eq!(fields[0].name, "nid");
        assert_eq!(fields.last().map(|f| f.name.as_str()), Some("field_full_name"));
        assert!(store.field_definitions(EntityKind::Node, "user").unwrap().is_empty());
        assert!(store.bundle_exists(EntityKind::TaxonomyTerm, "category").unwrap());
    }

    #[test]
    fn aliases_resolve_both_ways() {
        let store = store();
        assert_eq!(
            store.source_for_alias("/crafts/paper").unwrap().as_deref(),
            Some("/taxonomy/term/7")
        );
        assert_eq!(
            store.alias_for_source("/taxonomy/term/7").unwrap().as_deref(),
            Some("/crafts/paper")
        );
        assert_eq!(store.alias_for_source("/node/1").unwrap(), None);
    }
}
