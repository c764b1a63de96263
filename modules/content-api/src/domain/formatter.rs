//! Type-directed rendering of a single field.
//!
//! [`Formatter::for_type`] is the registry: every supported [`ValueType`]
//! maps onto exactly one formatter, everything else is dropped from output.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde_json::{Map, Value};

use super::context::{Depth, ProjectionContext};
use super::error::DomainError;
use super::image_styles::styles_for_resolution;
use super::model::{Entity, EntityId, FieldItem};
use super::projector::EntityProjector;
use super::schema::{FieldDefinition, ValueType};

/// Structural fields that are never emitted, whatever their type.
pub const IGNORED_FIELD_NAMES: [&str; 15] = [
    "parent",
    "tid",
    "vid",
    "title",
    "langcode",
    "uid",
    "promote",
    "sticky",
    "revision_timestamp",
    "revision_uid",
    "revision_log",
    "revision_translation_affected",
    "default_langcode",
    "publish_on",
    "unpublish_on",
];

#[must_use]
pub fn is_ignored_field(name: &str) -> bool {
    IGNORED_FIELD_NAMES.contains(&name)
}

/// Rendering strategy for one value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    Plain,
    Integer,
    Float,
    Boolean,
    Date,
    PathAlias,
    Link,
    File,
    Image,
    Reference,
}

impl Formatter {
    /// `None` for value types the API does not render.
    #[must_use]
    pub fn for_type(value_type: &ValueType) -> Option<Formatter> {
        let formatter = match value_type {
            ValueType::Text | ValueType::LongText | ValueType::Uuid => Formatter::Plain,
            ValueType::Integer => Formatter::Integer,
            ValueType::Float => Formatter::Float,
            ValueType::Boolean => Formatter::Boolean,
            ValueType::Date => Formatter::Date,
            ValueType::PathAlias => Formatter::PathAlias,
            ValueType::Link => Formatter::Link,
            ValueType::File => Formatter::File,
            ValueType::Image { .. } => Formatter::Image,
            ValueType::EntityReference { .. } => Formatter::Reference,
            ValueType::Unsupported(_) => return None,
        };
        Some(formatter)
    }

    /// Computed formatters produce a value even when nothing is stored.
    #[must_use]
    pub fn is_computed(self) -> bool {
        self == Formatter::PathAlias
    }
}

/// Renders unix-second timestamps in a fixed UTC offset.
#[derive(Debug, Clone)]
pub struct DateFormat {
    offset: FixedOffset,
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }
}

impl DateFormat {
    /// `None` when the offset is outside +/- 24h.
    #[must_use]
    pub fn with_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes.checked_mul(60)?).map(|offset| Self { offset })
    }

    #[must_use]
    pub fn render(&self, raw: &str) -> Value {
        raw.trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map_or(Value::Null, |utc| {
                Value::String(
                    utc.with_timezone(&self.offset)
                        .format("%Y-%m-%dT%H:%M:%S%z")
                        .to_string(),
                )
            })
    }
}

/// Leading-integer coercion: optional sign then digits, anything else is 0.
#[must_use]
pub fn coerce_integer(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return 0;
    }

    let magnitude = rest[..digits_len].parse::<i64>().unwrap_or(i64::MAX);
    if negative { -magnitude } else { magnitude }
}

/// Leading-float coercion; non-numeric or non-finite input is 0.0.
#[must_use]
pub fn coerce_float(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        end += 1;
    }
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return 0.0;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'-' | b'+')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end.min(bytes.len())..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    trimmed[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn json_number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

/// Renders each item, or only the first one for single-valued fields.
fn per_cardinality(
    items: &[FieldItem],
    multiple: bool,
    render: impl Fn(&FieldItem) -> Value,
) -> Value {
    if multiple {
        Value::Array(items.iter().map(render).collect())
    } else {
        items.first().map_or(Value::Null, render)
    }
}

impl EntityProjector {
    /// Renders one non-empty (or computed) field of `entity`.
    ///
    /// # Errors
    /// Propagates storage failures raised while resolving files, aliases or references.
    pub(crate) fn format_field(
        &self,
        formatter: Formatter,
        entity: &Entity,
        definition: &FieldDefinition,
        ctx: &ProjectionContext,
        depth: Depth,
    ) -> Result<Value, DomainError> {
        let items = entity.field(&definition.name);
        let multiple = definition.is_multiple();

        let value = match formatter {
            Formatter::Plain => per_cardinality(items, multiple, |item| {
                Value::String(item.scalar().to_owned())
            }),
            Formatter::Integer => per_cardinality(items, multiple, |item| {
                Value::from(coerce_integer(item.scalar()))
            }),
            Formatter::Float => per_cardinality(items, multiple, |item| {
                json_number(coerce_float(item.scalar()))
            }),
            Formatter::Boolean => {
                Value::Bool(items.first().is_some_and(|item| item.scalar() == "1"))
            }
            Formatter::Date => {
                per_cardinality(items, multiple, |item| self.dates.render(item.scalar()))
            }
            Formatter::PathAlias => self.format_path(entity)?,
            Formatter::Link => per_cardinality(items, multiple, format_link),
            Formatter::File => self.format_files(items, multiple)?,
            Formatter::Image => self.format_images(definition, items, multiple, ctx)?,
            Formatter::Reference => {
                let ValueType::EntityReference { target } = &definition.value_type else {
                    return Err(DomainError::internal(format!(
                        "field {} is not a reference",
                        definition.name
                    )));
                };
                self.resolve_references(items, target, multiple, ctx, depth)?
            }
        };
        Ok(value)
    }

    fn format_path(&self, entity: &Entity) -> Result<Value, DomainError> {
        let alias = self
            .aliases
            .alias_for_source(&entity.internal_path())?
            .unwrap_or_default();
        Ok(Value::String(alias.trim_start_matches('/').to_owned()))
    }

    fn format_files(&self, items: &[FieldItem], multiple: bool) -> Result<Value, DomainError> {
        let mut urls = Vec::with_capacity(items.len());
        for item in items {
            let url = match item.target_entity_id() {
                Some(file_id) => self.files.file_url(file_id)?,
                None => None,
            };
            if !multiple {
                return Ok(url.map_or(Value::Null, Value::String));
            }
            urls.extend(url.map(Value::String));
        }

        Ok(if multiple { Value::Array(urls) } else { Value::Null })
    }

    fn format_images(
        &self,
        definition: &FieldDefinition,
        items: &[FieldItem],
        multiple: bool,
        ctx: &ProjectionContext,
    ) -> Result<Value, DomainError> {
        let styles: &[&str] = if ctx.full_image_only {
            &[]
        } else if let ValueType::Image { max_resolution } = &definition.value_type {
            styles_for_resolution(max_resolution.as_deref())
        } else {
            &[]
        };

        let mut images = Vec::with_capacity(items.len());
        for item in items {
            let image = match item.target_entity_id() {
                Some(file_id) => self.render_image(file_id, styles)?,
                None => None,
            };
            if !multiple {
                return Ok(image.unwrap_or(Value::Null));
            }
            images.extend(image);
        }

        Ok(if multiple { Value::Array(images) } else { Value::Null })
    }

    fn render_image(&self, file_id: EntityId, styles: &[&str]) -> Result<Option<Value>, DomainError> {
        let Some(full) = self.files.file_url(file_id)? else {
            return Ok(None);
        };

        let mut image = Map::new();
        image.insert("full".to_owned(), Value::String(full));
        for style in styles {
            if let Some(url) = self.files.style_url(file_id, style)? {
                image.insert((*style).to_owned(), Value::String(url));
            }
        }
        Ok(Some(Value::Object(image)))
    }
}

fn format_link(item: &FieldItem) -> Value {
    let (url, title) = match item {
        FieldItem::Link { uri, title } => (uri.as_str(), title.as_str()),
        other => (other.scalar(), ""),
    };
    let mut link = Map::new();
    link.insert("url".to_owned(), Value::String(url.to_owned()));
    link.insert("title".to_owned(), Value::String(title.to_owned()));
    Value::Object(link)
}
