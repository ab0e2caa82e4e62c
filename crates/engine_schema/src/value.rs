//! Resolved field values.
//!
//! A [`Record`] is the configuration of one component instance after schema
//! resolution. Composite kinds are stored as native math types, never as raw
//! arrays, so component code can read a `Vec3` or [`Color`] directly.

use std::collections::BTreeMap;

use engine_math::{Color, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::field::FieldKind;

/// A configuration record: field name → value.
pub type Record = BTreeMap<String, Value>;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// No value (unset selection or entity reference).
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    /// Plain strings, selection options and asset keys.
    String(String),
    Color(Color),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    /// Raw id of a referenced entity.
    Entity(u64),
}

impl Value {
    /// Convert a JSON value into the native representation for `kind`.
    ///
    /// `null` is accepted for every kind. Vectors may be given as arrays or as
    /// `{x, y, z, w}` objects; colors as `0xRRGGBB` integers, `#rrggbb`
    /// strings, `{r, g, b}` objects or `[r, g, b]` arrays.
    pub fn from_json(kind: FieldKind, json: &serde_json::Value) -> Result<Self, SchemaError> {
        use serde_json::Value as Json;

        let invalid = || SchemaError::InvalidValue {
            kind,
            value: json.to_string(),
        };

        if json.is_null() {
            return Ok(Self::Null);
        }

        match kind {
            FieldKind::String | FieldKind::Asset | FieldKind::Select => json
                .as_str()
                .map(|s| Self::String(s.to_owned()))
                .ok_or_else(invalid),
            FieldKind::Number => json.as_f64().map(Self::Number).ok_or_else(invalid),
            FieldKind::Integer => match json.as_i64() {
                Some(i) => Ok(Self::Integer(i)),
                None => json
                    .as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| Self::Integer(f as i64))
                    .ok_or_else(invalid),
            },
            FieldKind::Boolean => json.as_bool().map(Self::Bool).ok_or_else(invalid),
            FieldKind::Entity => json.as_u64().map(Self::Entity).ok_or_else(invalid),
            FieldKind::Color => match json {
                Json::Number(n) => n
                    .as_u64()
                    .and_then(|hex| u32::try_from(hex).ok())
                    .map(|hex| Self::Color(Color::from_hex(hex)))
                    .ok_or_else(invalid),
                Json::String(s) => Color::from_hex_str(s).map(Self::Color).ok_or_else(invalid),
                _ => components(json, &["r", "g", "b"])
                    .map(|c| Self::Color(Color::new(c[0], c[1], c[2])))
                    .ok_or_else(invalid),
            },
            FieldKind::Vector2 => components(json, &["x", "y"])
                .map(|c| Self::Vec2(Vec2::new(c[0], c[1])))
                .ok_or_else(invalid),
            FieldKind::Vector3 => components(json, &["x", "y", "z"])
                .map(|c| Self::Vec3(Vec3::new(c[0], c[1], c[2])))
                .ok_or_else(invalid),
            FieldKind::Vector4 => components(json, &["x", "y", "z", "w"])
                .map(|c| Self::Vec4(Vec4::new(c[0], c[1], c[2], c[3])))
                .ok_or_else(invalid),
        }
    }

    /// Convert a scalar JSON literal without a kind hint.
    ///
    /// Used for condition values and for record keys the schema does not
    /// describe. Arrays and objects are rejected.
    pub fn from_json_literal(json: &serde_json::Value) -> Result<Self, SchemaError> {
        use serde_json::Value as Json;

        match json {
            Json::Null => Ok(Self::Null),
            Json::Bool(b) => Ok(Self::Bool(*b)),
            Json::Number(n) => Ok(n
                .as_i64()
                .map(Self::Integer)
                .unwrap_or_else(|| Self::Number(n.as_f64().unwrap_or_default()))),
            Json::String(s) => Ok(Self::String(s.clone())),
            _ => Err(SchemaError::InvalidLiteral(json.to_string())),
        }
    }

    /// Equality used by field conditions: integers and numbers compare by
    /// numeric value, everything else structurally.
    #[must_use]
    pub fn matches(&self, other: &Value) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric value of a number or integer.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        self.as_f64().map(|n| n as f32)
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Self::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec4(&self) -> Option<Vec4> {
        match self {
            Self::Vec4(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_entity(&self) -> Option<u64> {
        match self {
            Self::Entity(id) => Some(*id),
            _ => None,
        }
    }
}

/// Read `N` float components from an array or a keyed object.
fn components(json: &serde_json::Value, keys: &[&str]) -> Option<Vec<f32>> {
    let values: Vec<f32> = match json {
        serde_json::Value::Array(items) if items.len() == keys.len() => items
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<_>>()?,
        serde_json::Value::Object(map) => keys
            .iter()
            .map(|k| map.get(*k).and_then(serde_json::Value::as_f64).map(|f| f as f32))
            .collect::<Option<_>>()?,
        _ => return None,
    };
    Some(values)
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Color> for Value {
    fn from(c: Color) -> Self {
        Self::Color(c)
    }
}

impl From<Vec2> for Value {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec3> for Value {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec4> for Value {
    fn from(v: Vec4) -> Self {
        Self::Vec4(v)
    }
}
