//! Field specifications.
//!
//! A [`FieldSpec`] names the kind of a configuration field, its default and
//! an optional [`Condition`] on sibling values. A [`SchemaField`] is either a
//! single spec or an ordered list of variant specs, the first applicable one
//! supplying the default.

use std::collections::BTreeMap;
use std::fmt;

use engine_math::{Color, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::value::{Record, Value};

/// The value kind of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    #[serde(alias = "int")]
    Integer,
    #[serde(alias = "bool")]
    Boolean,
    Color,
    Vector2,
    Vector3,
    Vector4,
    /// One option out of a fixed set of strings.
    Select,
    /// Reference to another entity.
    Entity,
    /// Key of an asset in an asset store.
    Asset,
}

impl FieldKind {
    /// The value a field of this kind receives when its spec declares no
    /// default.
    #[must_use]
    pub fn default_value(self) -> Value {
        match self {
            Self::String | Self::Asset => Value::String(String::new()),
            Self::Number => Value::Number(0.0),
            Self::Integer => Value::Integer(0),
            Self::Boolean => Value::Bool(false),
            Self::Color => Value::Color(Color::DEFAULT),
            Self::Vector2 => Value::Vec2(Vec2::ZERO),
            Self::Vector3 => Value::Vec3(Vec3::ZERO),
            Self::Vector4 => Value::Vec4(Vec4::ZERO),
            Self::Select | Self::Entity => Value::Null,
        }
    }

    /// Guess the kind from a JSON default, for specs written as
    /// `{ "default": 1 }` without an explicit type.
    #[must_use]
    pub fn infer(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Bool(_) => Some(Self::Boolean),
            serde_json::Value::Number(_) => Some(Self::Number),
            serde_json::Value::String(_) => Some(Self::String),
            serde_json::Value::Array(items) => match items.len() {
                2 => Some(Self::Vector2),
                3 => Some(Self::Vector3),
                4 => Some(Self::Vector4),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether `value` is a valid value of this kind.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Select | Self::Entity, Value::Null) => true,
            (Self::String | Self::Asset | Self::Select, Value::String(_)) => true,
            (Self::Number, Value::Number(_) | Value::Integer(_)) => true,
            (Self::Integer, Value::Integer(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            (Self::Color, Value::Color(_)) => true,
            (Self::Vector2, Value::Vec2(_)) => true,
            (Self::Vector3, Value::Vec3(_)) => true,
            (Self::Vector4, Value::Vec4(_)) => true,
            (Self::Entity, Value::Entity(_)) => true,
            _ => false,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Color => "color",
            Self::Vector2 => "vector2",
            Self::Vector3 => "vector3",
            Self::Vector4 => "vector4",
            Self::Select => "select",
            Self::Entity => "entity",
            Self::Asset => "asset",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applicability condition: sibling field name → values for which the
/// conditioned field exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    allowed: BTreeMap<String, Vec<Value>>,
}

impl Condition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `sibling` to hold one of `values`.
    #[must_use]
    pub fn on<V: Into<Value>>(
        mut self,
        sibling: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.allowed
            .insert(sibling.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Names of the sibling fields this condition reads.
    pub fn siblings(&self) -> impl Iterator<Item = &str> {
        self.allowed.keys().map(String::as_str)
    }

    /// `true` if every referenced sibling is present in `record` with one of
    /// its allowed values. An absent (dropped) sibling never satisfies.
    #[must_use]
    pub fn satisfied_by(&self, record: &Record) -> bool {
        self.allowed.iter().all(|(sibling, allowed)| {
            record
                .get(sibling)
                .is_some_and(|value| allowed.iter().any(|a| a.matches(value)))
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// Specification of one configuration field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    /// Explicit default; falls back to [`FieldKind::default_value`].
    pub default: Option<Value>,
    /// Allowed options for [`FieldKind::Select`].
    pub options: Vec<String>,
    pub condition: Option<Condition>,
}

impl FieldSpec {
    #[must_use]
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            default: None,
            options: Vec::new(),
            condition: None,
        }
    }

    /// A select field over the given options.
    #[must_use]
    pub fn select<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            ..Self::new(FieldKind::Select)
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restrict the field to records where `sibling` holds one of `values`.
    ///
    /// Calling this repeatedly adds further siblings to the same condition.
    #[must_use]
    pub fn when<V: Into<Value>>(
        mut self,
        sibling: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let condition = self.condition.take().unwrap_or_default();
        self.condition = Some(condition.on(sibling, values));
        self
    }

    /// Sibling fields named by this spec's condition.
    pub fn siblings(&self) -> impl Iterator<Item = &str> {
        self.condition.iter().flat_map(Condition::siblings)
    }

    /// Whether this spec applies given the values resolved so far.
    #[must_use]
    pub fn applies_to(&self, record: &Record) -> bool {
        self.condition
            .as_ref()
            .is_none_or(|condition| condition.satisfied_by(record))
    }

    /// The concrete default value for this spec.
    #[must_use]
    pub fn materialize_default(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.kind.default_value())
    }
}

/// A schema entry: a plain field or an ordered list of variants.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaField {
    Plain(FieldSpec),
    /// Candidates keyed by differing conditions; the first one that applies
    /// supplies the default.
    Variant(Vec<FieldSpec>),
}

impl SchemaField {
    /// All candidate specs, a single one for plain fields.
    #[must_use]
    pub fn candidates(&self) -> &[FieldSpec] {
        match self {
            Self::Plain(spec) => std::slice::from_ref(spec),
            Self::Variant(specs) => specs,
        }
    }

    /// Every sibling named by any candidate's condition.
    pub fn siblings(&self) -> impl Iterator<Item = &str> {
        self.candidates().iter().flat_map(FieldSpec::siblings)
    }

    /// Pick the default for `record`, or `None` if no candidate applies.
    #[must_use]
    pub fn default_for(&self, record: &Record) -> Option<Value> {
        self.candidates()
            .iter()
            .find(|spec| spec.applies_to(record))
            .map(FieldSpec::materialize_default)
    }
}

impl From<FieldSpec> for SchemaField {
    fn from(spec: FieldSpec) -> Self {
        Self::Plain(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_defaults_are_native_types() {
        assert_eq!(FieldKind::Vector3.default_value(), Value::Vec3(Vec3::ZERO));
        assert_eq!(FieldKind::Color.default_value(), Value::Color(Color::DEFAULT));
        assert_eq!(FieldKind::Asset.default_value(), Value::String(String::new()));
        assert_eq!(FieldKind::Entity.default_value(), Value::Null);
    }

    #[test]
    fn test_condition_requires_present_sibling() {
        let condition = Condition::new().on("type", ["point", "spot"]);
        let mut record = Record::new();
        assert!(!condition.satisfied_by(&record));
        record.insert("type".into(), Value::from("spot"));
        assert!(condition.satisfied_by(&record));
        record.insert("type".into(), Value::from("ambient"));
        assert!(!condition.satisfied_by(&record));
    }

    #[test]
    fn test_variant_picks_first_applicable() {
        let field = SchemaField::Variant(vec![
            FieldSpec::new(FieldKind::Number).with_default(5.0).when("shape", ["sphere"]),
            FieldSpec::new(FieldKind::Number).with_default(1.0),
        ]);
        let mut record = Record::new();
        record.insert("shape".into(), Value::from("sphere"));
        assert_eq!(field.default_for(&record), Some(Value::Number(5.0)));
        record.insert("shape".into(), Value::from("box"));
        assert_eq!(field.default_for(&record), Some(Value::Number(1.0)));
    }

    #[test]
    fn test_kind_accepts() {
        assert!(FieldKind::Number.accepts(&Value::Integer(1)));
        assert!(!FieldKind::Integer.accepts(&Value::Number(1.0)));
        assert!(FieldKind::Select.accepts(&Value::Null));
        assert!(!FieldKind::Vector3.accepts(&Value::Vec2(Vec2::ZERO)));
    }
}
