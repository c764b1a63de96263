//! Logical query specifications and their translation into storage queries.

use std::fmt;

use super::model::EntityKind;

/// Field holding the publication flag of content items.
pub const STATUS_FIELD: &str = "status";
/// Default sort key when the caller names none.
pub const DEFAULT_SORT_FIELD: &str = "changed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("ASC"),
            SortDirection::Desc => f.write_str("DESC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// One node of a storage condition tree.
///
/// `field` may be a dotted path such as `field_category.entity.uuid`, which
/// matches on a property of the referenced entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals { field: String, value: String },
    /// Disjunction of its members.
    AnyOf(Vec<Condition>),
}

impl Condition {
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Condition::Equals {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Offset/length window of a ranged fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub offset: u64,
    pub length: u64,
}

impl PageRange {
    /// Window of page `page` (0-based) with `limit` items per page.
    #[must_use]
    pub fn for_page(page: u64, limit: u64) -> Self {
        Self {
            offset: page.saturating_mul(limit),
            length: limit,
        }
    }
}

/// Executable query handed to the storage engine.
///
/// `conditions` combine conjunctively. `range` is ignored by `count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub kind: EntityKind,
    pub conditions: Vec<Condition>,
    pub sorts: Vec<SortKey>,
    pub range: Option<PageRange>,
}

impl EntityQuery {
    /// Same filter and order, restricted to `range`.
    #[must_use]
    pub fn with_range(&self, range: PageRange) -> Self {
        Self {
            range: Some(range),
            ..self.clone()
        }
    }
}

/// Logical description of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub kind: EntityKind,
    /// `None` disables the publication filter entirely (terms).
    pub published_only: Option<bool>,
    pub or_groups: Vec<Vec<(String, String)>>,
    pub multi_value_groups: Vec<(String, Vec<String>)>,
    pub conditions: Vec<(String, String)>,
    pub sorts: Vec<SortKey>,
    pub page: u64,
    pub limit: u64,
}

impl QuerySpec {
    #[must_use]
    pub fn nodes(published_only: bool) -> Self {
        Self::new(EntityKind::Node, Some(published_only))
    }

    #[must_use]
    pub fn terms() -> Self {
        Self::new(EntityKind::TaxonomyTerm, None)
    }

    fn new(kind: EntityKind, published_only: Option<bool>) -> Self {
        Self {
            kind,
            published_only,
            or_groups: Vec::new(),
            multi_value_groups: Vec::new(),
            conditions: Vec::new(),
            sorts: Vec::new(),
            page: 0,
            limit: 10,
        }
    }

    #[must_use]
    pub fn with_condition(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    /// Adds a "field matches any of `values`" group.
    #[must_use]
    pub fn with_any_of<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.multi_value_groups
            .push((field.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Adds a disjunction of heterogeneous `field = value` pairs.
    #[must_use]
    pub fn with_or_group(mut self, pairs: Vec<(String, String)>) -> Self {
        self.or_groups.push(pairs);
        self
    }

    #[must_use]
    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sorts.push(sort);
        self
    }

    #[must_use]
    pub fn paged(mut self, page: u64, limit: u64) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn range(&self) -> PageRange {
        PageRange::for_page(self.page, self.limit)
    }
}

/// Translates [`QuerySpec`]s into [`EntityQuery`]s.
pub struct QueryBuilder;

impl QueryBuilder {
    /// Builds the unranged query; pair with [`QuerySpec::range`] for a page fetch.
    ///
    /// Conditions are applied in a fixed order: publication filter, OR groups,
    /// multi-value groups, plain equalities. Empty groups are skipped.
    #[must_use]
    pub fn build(spec: &QuerySpec) -> EntityQuery {
        let mut conditions = Vec::new();

        match spec.published_only {
            Some(true) => conditions.push(Condition::equals(STATUS_FIELD, "1")),
            Some(false) => conditions.push(Condition::AnyOf(vec![
                Condition::equals(STATUS_FIELD, "1"),
                Condition::equals(STATUS_FIELD, "0"),
            ])),
            None => {}
        }

        for group in spec.or_groups.iter().filter(|group| !group.is_empty()) {
            conditions.push(Condition::AnyOf(
                group
                    .iter()
                    .map(|(field, value)| Condition::equals(field.as_str(), value.as_str()))
                    .collect(),
            ));
        }

        for (field, values) in spec
            .multi_value_groups
            .iter()
            .filter(|(_, values)| !values.is_empty())
        {
            conditions.push(Condition::AnyOf(
                values
                    .iter()
                    .map(|value| Condition::equals(field.as_str(), value.as_str()))
                    .collect(),
            ));
        }

        conditions.extend(
            spec.conditions
                .iter()
                .map(|(field, value)| Condition::equals(field.as_str(), value.as_str())),
        );

        let sorts = if spec.sorts.is_empty() {
            vec![SortKey::desc(DEFAULT_SORT_FIELD)]
        } else {
            spec.sorts.clone()
        };

        EntityQuery {
            kind: spec.kind,
            conditions,
            sorts,
            range: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_listing_filters_status_and_sorts_by_changed() {
        let query = QueryBuilder::build(&QuerySpec::nodes(true).with_condition("type", "article"));

        assert_eq!(
            query.conditions,
            vec![
                Condition::equals("status", "1"),
                Condition::equals("type", "article"),
            ]
        );
        assert_eq!(query.sorts, vec![SortKey::desc("changed")]);
        assert_eq!(query.range, None);
    }

    #[test]
    fn unpublished_listing_allows_every_status() {
        let query = QueryBuilder::build(&QuerySpec::nodes(false));
        assert_eq!(
            query.conditions,
            vec![Condition::AnyOf(vec![
                Condition::equals("status", "1"),
                Condition::equals("status", "0"),
            ])]
        );
    }

    #[test]
    fn groups_are_applied_in_order_and_empty_groups_skipped() {
        let spec = QuerySpec::terms()
            .with_condition("vid", "category")
            .with_any_of("type", ["look", "recipe"])
            .with_any_of("field_tag.entity.uuid", Vec::<String>::new())
            .with_or_group(vec![
                ("field_a".to_owned(), "1".to_owned()),
                ("field_b".to_owned(), "2".to_owned()),
            ])
            .with_or_group(Vec::new())
            .sorted_by(SortKey::asc("tid"));

        let query = QueryBuilder::build(&spec);
        assert_eq!(
            query.conditions,
            vec![
                Condition::AnyOf(vec![
                    Condition::equals("field_a", "1"),
                    Condition::equals("field_b", "2"),
                ]),
                Condition::AnyOf(vec![
                    Condition::equals("type", "look"),
                    Condition::equals("type", "recipe"),
                ]),
                Condition::equals("vid", "category"),
            ]
        );
        assert_eq!(query.sorts, vec![SortKey::asc("tid")]);
    }

    #[test]
    fn range_is_page_times_limit() {
        let spec = QuerySpec::nodes(true).paged(3, 20);
        assert_eq!(
            spec.range(),
            PageRange {
                offset: 60,
                length: 20
            }
        );
        let ranged = QueryBuilder::build(&spec).with_range(spec.range());
        assert_eq!(ranged.range.map(|r| r.offset), Some(60));
        assert_eq!(PageRange::for_page(u64::MAX, 2).offset, u64::MAX);
    }
}
