//! The field table of one component type, with its JSON form and the checks
//! run when a component type is registered.
use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::SchemaError;
use crate::field::{Condition, FieldKind, FieldSpec, SchemaField};
use crate::resolve::{Resolution, resolve, sanitize};
use crate::value::{Record, Value};

/// The declarative field table of a component type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: BTreeMap<String, SchemaField>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), SchemaField::Plain(spec));
        self
    }

    /// Add a variant field whose candidates are tried in order.
    #[must_use]
    pub fn variant(mut self, name: impl Into<String>, candidates: Vec<FieldSpec>) -> Self {
        self.fields.insert(name.into(), SchemaField::Variant(candidates));
        self
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&SchemaField> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over all fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &SchemaField)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a schema written in the authoring format:
    ///
    /// ```json
    /// {
    ///   "type":      { "type": "select", "default": "point", "select": ["point", "spot"] },
    ///   "intensity": { "default": 1 },
    ///   "angle":     { "default": 1.047, "if": { "type": ["spot"] } },
    ///   "size":      [ { "type": "vector3", "if": { "shape": ["box"] } }, { "default": 0.5 } ]
    /// }
    /// ```
    ///
    /// A field given as an array is a variant field. A missing `type` is
    /// inferred from the default. Unknown keys in a field spec are ignored.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, SchemaError> {
        let raw: BTreeMap<String, RawField> = serde_json::from_value(json.clone())?;
        let mut fields = BTreeMap::new();
        for (name, raw_field) in raw {
            let field = match raw_field {
                RawField::Plain(spec) => SchemaField::Plain(spec.into_spec(&name)?),
                RawField::Variant(specs) => SchemaField::Variant(
                    specs
                        .into_iter()
                        .map(|spec| spec.into_spec(&name))
                        .collect::<Result<_, _>>()?,
                ),
            };
            fields.insert(name, field);
        }
        Ok(Self { fields })
    }

    /// Validate the schema. Run once per component type at registration.
    ///
    /// Checks that every condition names a field of this schema, that
    /// defaults match their kind, that select fields have options and a
    /// default among them, and that resolving an empty record leaves no field
    /// pending.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (name, field) in self.fields() {
            let candidates = field.candidates();
            if candidates.is_empty() {
                return Err(SchemaError::configuration(name, "variant field has no candidates"));
            }
            for spec in candidates {
                self.validate_spec(name, spec)?;
            }
        }

        // Pending status depends only on which fields are present, never on
        // their values, so an empty record is the worst case.
        let Resolution { unresolved, .. } = resolve(Record::new(), self);
        if let Some(field) = unresolved.first() {
            return Err(SchemaError::configuration(
                field,
                format!("circular or unsatisfiable condition (unresolved: {unresolved:?})"),
            ));
        }

        Ok(())
    }

    fn validate_spec(&self, name: &str, spec: &FieldSpec) -> Result<(), SchemaError> {
        for sibling in spec.siblings() {
            if !self.contains(sibling) {
                return Err(SchemaError::configuration(
                    name,
                    format!("condition references unknown field '{sibling}'"),
                ));
            }
        }

        if let Some(default) = &spec.default
            && !spec.kind.accepts(default)
        {
            return Err(SchemaError::configuration(
                name,
                format!("default {default:?} is not a {} value", spec.kind),
            ));
        }

        if spec.kind == FieldKind::Select {
            if spec.options.is_empty() {
                return Err(SchemaError::configuration(name, "select field has no options"));
            }
            if let Some(Value::String(option)) = &spec.default
                && !spec.options.contains(option)
            {
                return Err(SchemaError::configuration(
                    name,
                    format!("default '{option}' is not one of {:?}", spec.options),
                ));
            }
        }

        Ok(())
    }

    /// Complete `data` with defaults. See [`sanitize`].
    #[must_use]
    pub fn sanitize(&self, data: Record) -> Record {
        sanitize(data, self)
    }

    /// Convert a JSON object of instance data into a [`Record`], using each
    /// field's kind to build native values. Keys the schema does not describe
    /// are converted as scalar literals. `null` is an empty record.
    pub fn record_from_json(&self, json: &serde_json::Value) -> Result<Record, SchemaError> {
        if json.is_null() {
            return Ok(Record::new());
        }
        let Some(object) = json.as_object() else {
            return Err(SchemaError::InvalidLiteral(json.to_string()));
        };

        let mut record = Record::new();
        for (name, value) in object {
            let converted = match self.get(name) {
                Some(field) => convert_for_field(field, value)?,
                None => Value::from_json_literal(value)?,
            };
            record.insert(name.clone(), converted);
        }
        Ok(record)
    }
}

/// Convert using the first candidate kind that accepts the JSON value.
fn convert_for_field(field: &SchemaField, json: &serde_json::Value) -> Result<Value, SchemaError> {
    let mut last_error = None;
    for spec in field.candidates() {
        match Value::from_json(spec.kind, json) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| SchemaError::InvalidLiteral(json.to_string())))
}

// ---------------------------------------------------------------------------
// JSON authoring format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawField {
    Variant(Vec<RawFieldSpec>),
    Plain(RawFieldSpec),
}

#[derive(Debug, Deserialize)]
struct RawFieldSpec {
    #[serde(rename = "type")]
    kind: Option<FieldKind>,
    #[serde(default)]
    default: Option<serde_json::Value>,
    #[serde(default)]
    select: Vec<String>,
    #[serde(rename = "if", default)]
    condition: Option<BTreeMap<String, Vec<serde_json::Value>>>,
}

impl RawFieldSpec {
    fn into_spec(self, name: &str) -> Result<FieldSpec, SchemaError> {
        let kind = self
            .kind
            .or_else(|| self.default.as_ref().and_then(FieldKind::infer))
            .ok_or_else(|| {
                SchemaError::configuration(
                    name,
                    "no type given and none can be inferred from the default",
                )
            })?;

        let default = self
            .default
            .as_ref()
            .map(|json| Value::from_json(kind, json))
            .transpose()
            .map_err(|e| SchemaError::configuration(name, e.to_string()))?;

        let condition = match self.condition {
            Some(raw) => {
                let mut condition = Condition::new();
                for (sibling, values) in raw {
                    let values = values
                        .iter()
                        .map(Value::from_json_literal)
                        .collect::<Result<Vec<_>, _>>()?;
                    condition = condition.on(sibling, values);
                }
                Some(condition)
            }
            None => None,
        };

        Ok(FieldSpec {
            kind,
            default,
            options: self.select,
            condition,
        })
    }
}

#[cfg(test)]
mod tests {
    use engine_math::{Color, Vec3};
    use serde_json::json;

    use super::*;

    fn light_schema_json() -> serde_json::Value {
        json!({
            "type": { "type": "select", "default": "ambient",
                      "select": ["ambient", "directional", "hemisphere", "point", "spot"] },
            "color": {
                "type": "color",
                "if": { "type": ["ambient", "directional", "point", "spot"] }
            },
            "intensity": { "default": 1 },
            "skyColor": { "type": "color", "if": { "type": ["hemisphere"] } },
            "distance": { "default": 0, "if": { "type": ["point", "spot"] } },
            "angle": { "default": 1.0471976, "angle": "deg", "if": { "type": ["spot"] } }
        })
    }

    #[test]
    fn test_load_and_validate() {
        let schema = Schema::from_json(&light_schema_json()).unwrap();
        schema.validate().unwrap();
        assert_eq!(schema.len(), 6);
        let intensity = &schema.get("intensity").unwrap().candidates()[0];
        assert_eq!(intensity.kind, FieldKind::Number);
    }

    #[test]
    fn test_light_defaults_follow_type() {
        let schema = Schema::from_json(&light_schema_json()).unwrap();

        let ambient = schema.sanitize(Record::new());
        assert_eq!(ambient.get("type"), Some(&Value::from("ambient")));
        assert_eq!(ambient.get("color"), Some(&Value::Color(Color::DEFAULT)));
        assert!(!ambient.contains_key("distance"));
        assert!(!ambient.contains_key("skyColor"));

        let data = schema.record_from_json(&json!({ "type": "spot" })).unwrap();
        let spot = schema.sanitize(data);
        assert_eq!(spot.get("distance"), Some(&Value::Number(0.0)));
        assert!(spot.contains_key("angle"));
    }

    #[test]
    fn test_variant_from_json() {
        let schema = Schema::from_json(&json!({
            "shape": { "type": "select", "default": "box", "select": ["box", "sphere"] },
            "size": [
                { "type": "vector3", "default": [1, 2, 3], "if": { "shape": ["box"] } },
                { "default": 0.5 }
            ]
        }))
        .unwrap();
        schema.validate().unwrap();
        let out = schema.sanitize(Record::new());
        assert_eq!(out.get("size"), Some(&Value::Vec3(Vec3::new(1.0, 2.0, 3.0))));
    }

    #[test]
    fn test_record_from_json_builds_native_values() {
        let schema = Schema::new()
            .field("offset", FieldSpec::new(FieldKind::Vector3))
            .field("tint", FieldSpec::new(FieldKind::Color));
        let record = schema
            .record_from_json(&json!({
                "offset": { "x": 1, "y": 0, "z": 0 },
                "tint": "#000000",
                "tag": 3
            }))
            .unwrap();
        assert_eq!(record.get("offset"), Some(&Value::Vec3(Vec3::X)));
        assert_eq!(record.get("tint"), Some(&Value::Color(Color::BLACK)));
        assert_eq!(record.get("tag"), Some(&Value::Integer(3)));
    }

    #[test]
    fn test_record_from_json_null_is_empty_and_arrays_rejected() {
        let schema = Schema::new();
        assert!(schema.record_from_json(&serde_json::Value::Null).unwrap().is_empty());
        assert!(schema.record_from_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_unknown_condition_sibling_rejected() {
        let schema = Schema::new().field(
            "b",
            FieldSpec::new(FieldKind::Number).when("missing", [true]),
        );
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::Configuration { field, .. }) if field == "b"
        ));
    }

    #[test]
    fn test_circular_condition_rejected() {
        let schema = Schema::new()
            .field("x", FieldSpec::new(FieldKind::Boolean).when("y", [true]))
            .field("y", FieldSpec::new(FieldKind::Boolean).when("x", [true]));
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::Configuration { .. })
        ));
    }

    #[test]
    fn test_self_reference_rejected() {
        let schema = Schema::new().field("x", FieldSpec::new(FieldKind::Boolean).when("x", [true]));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_select_default_must_be_an_option() {
        let schema = Schema::new().field("mode", FieldSpec::select(["a", "b"]).with_default("c"));
        assert!(schema.validate().is_err());
        let schema = Schema::new().field("mode", FieldSpec::new(FieldKind::Select));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_default_kind_mismatch_rejected() {
        let schema = Schema::new().field("v", FieldSpec::new(FieldKind::Vector3).with_default(1.0));
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_untyped_field_without_default_rejected() {
        let err = Schema::from_json(&json!({ "velocity": {} }));
        assert!(matches!(err, Err(SchemaError::Configuration { .. })));
    }
}
