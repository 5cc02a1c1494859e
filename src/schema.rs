//! Declarative tool schemas.
//!
//! An [`ObjectSchema`] is an ordered list of [`FieldSpec`]s. It renders to a
//! fully inlined JSON Schema for `tools/list` and validates raw call arguments
//! into [`ValidatedArgs`], collecting every violation into a
//! [`ValidationReport`] rather than stopping at the first one. The report
//! carries the dotted field path, the violated constraint, the offending value,
//! the accepted values for enumerations, and the schema of each offending
//! top-level field so a calling agent can repair its call in one step.

use std::fmt;

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::error::PortMcpError;

/// A JSON object, as carried in MCP tool arguments and schemas.
pub type JsonObject = Map<String, Value>;

/// Constraints applicable to string fields.
#[derive(Debug, Clone, Default)]
pub struct StringRules {
    pub enum_values: Vec<String>,
    pub pattern: Option<Regex>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

/// The value type of a field and its type-specific constraints.
#[derive(Debug, Clone)]
pub enum FieldKind {
    String(StringRules),
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Number,
    Boolean,
    /// `None` is a free-form property bag; `Some` validates nested fields.
    Object(Option<ObjectSchema>),
    Array(Box<FieldKind>),
    Any,
}

/// One named field of an object schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    description: Option<String>,
    kind: FieldKind,
    required: bool,
    default: Option<Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            required: false,
            default: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String(StringRules::default()))
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Integer {
                minimum: None,
                maximum: None,
            },
        )
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    /// Free-form object (mapping of string to arbitrary value).
    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Object(None))
    }

    /// Object whose keys are validated against `schema`.
    pub fn nested(name: impl Into<String>, schema: ObjectSchema) -> Self {
        Self::new(name, FieldKind::Object(Some(schema)))
    }

    pub fn array(name: impl Into<String>, items: FieldKind) -> Self {
        Self::new(name, FieldKind::Array(Box::new(items)))
    }

    pub fn any(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Any)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Value used when the field is omitted or null.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Restrict a string field to the given values.
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let FieldKind::String(rules) = &mut self.kind {
            rules.enum_values = values.into_iter().map(Into::into).collect();
        }
        self
    }

    /// Require a string field to match `pattern`.
    ///
    /// # Panics
    ///
    /// If `pattern` is not a valid regex or the field is not a string. Use
    /// [`try_pattern`](Self::try_pattern) for patterns that are not constants.
    pub fn pattern(self, pattern: &str) -> Self {
        self.try_pattern(pattern).expect("valid field pattern")
    }

    /// Fallible form of [`pattern`](Self::pattern).
    pub fn try_pattern(mut self, pattern: &str) -> crate::Result<Self> {
        let FieldKind::String(rules) = &mut self.kind else {
            return Err(PortMcpError::InvalidArguments(format!(
                "field '{}': pattern on a non-string field",
                self.name
            )));
        };
        let re = Regex::new(pattern).map_err(|e| {
            PortMcpError::InvalidArguments(format!("field '{}': invalid pattern: {e}", self.name))
        })?;
        rules.pattern = Some(re);
        Ok(self)
    }

    pub fn max_length(mut self, max: usize) -> Self {
        if let FieldKind::String(rules) = &mut self.kind {
            rules.max_length = Some(max);
        }
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        if let FieldKind::String(rules) = &mut self.kind {
            rules.min_length = Some(min);
        }
        self
    }

    pub fn range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        if let FieldKind::Integer { minimum, maximum } = &mut self.kind {
            *minimum = min;
            *maximum = max;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    fn to_json_schema(&self) -> Value {
        let mut schema = kind_schema(&self.kind);
        if let Value::Object(obj) = &mut schema {
            if let Some(desc) = &self.description {
                obj.insert("description".into(), Value::String(desc.clone()));
            }
            if let Some(default) = &self.default {
                obj.insert("default".into(), default.clone());
            }
        }
        schema
    }
}

/// An ordered set of named fields describing a JSON object.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<FieldSpec>,
    allow_additional: bool,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. A later field with the same name replaces the earlier one.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    /// Keep keys not declared in the schema instead of dropping them.
    pub fn allow_additional(mut self) -> Self {
        self.allow_additional = true;
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Render as an inlined JSON Schema object (no `$ref`, no `$defs`).
    pub fn to_json_schema(&self) -> JsonObject {
        let mut properties = JsonObject::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(field.name.clone(), field.to_json_schema());
            if field.required {
                required.push(Value::String(field.name.clone()));
            }
        }

        let mut schema = JsonObject::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), Value::Array(required));
        }
        if self.allow_additional {
            schema.insert("additionalProperties".into(), json!(true));
        }
        schema
    }

    /// Schema fragment for a single top-level property.
    pub fn property_schema(&self, name: &str) -> Option<Value> {
        self.get(name).map(FieldSpec::to_json_schema)
    }

    /// Validate `raw` against this schema.
    ///
    /// On success the returned arguments contain every declared field that
    /// was supplied (coerced where a lax conversion applies) plus defaults
    /// for omitted optional fields.
    pub fn validate(&self, raw: &JsonObject) -> Result<ValidatedArgs, ValidationReport> {
        let mut errors = Vec::new();
        let validated = self.validate_object(raw, "", &mut errors);
        if errors.is_empty() {
            return Ok(ValidatedArgs(validated));
        }

        let mut schema_info = JsonObject::new();
        for error in &errors {
            let top = error.field.split('.').next().unwrap_or_default();
            if schema_info.contains_key(top) {
                continue;
            }
            if let Some(fragment) = self.property_schema(top) {
                schema_info.insert(top.to_string(), fragment);
            }
        }

        Err(ValidationReport {
            errors,
            schema_info,
            failed_validation: true,
        })
    }

    fn validate_object(
        &self,
        raw: &JsonObject,
        prefix: &str,
        errors: &mut Vec<FieldError>,
    ) -> JsonObject {
        let mut out = JsonObject::new();

        for field in &self.fields {
            let path = join_path(prefix, &field.name);
            match raw.get(&field.name) {
                None | Some(Value::Null) if !field.required => {
                    if let Some(default) = &field.default {
                        out.insert(field.name.clone(), default.clone());
                    }
                }
                None => errors.push(FieldError::new(
                    path,
                    "missing",
                    "Field required",
                    Value::Object(raw.clone()),
                )),
                Some(value) => {
                    if let Some(v) = validate_value(&field.kind, value, &path, errors) {
                        out.insert(field.name.clone(), v);
                    }
                }
            }
        }

        if self.allow_additional {
            for (key, value) in raw {
                if self.get(key).is_none() {
                    out.insert(key.clone(), value.clone());
                }
            }
        }

        out
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Integer value of a JSON float, if it has one that fits in `i64`.
fn integral_f64(f: Option<f64>) -> Result<i64, (&'static str, &'static str)> {
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    match f {
        Some(f) if f.fract() != 0.0 => Err((
            "int_from_float",
            "Input should be a valid integer, got a number with a fractional part",
        )),
        Some(f) if f >= -LIMIT && f < LIMIT => Ok(f as i64),
        _ => Err((
            "int_out_of_range",
            "Input should be an integer that fits in 64 bits",
        )),
    }
}

fn kind_schema(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::String(rules) => {
            let mut obj = JsonObject::new();
            obj.insert("type".into(), json!("string"));
            if !rules.enum_values.is_empty() {
                obj.insert("enum".into(), json!(rules.enum_values));
            }
            if let Some(re) = &rules.pattern {
                obj.insert("pattern".into(), json!(re.as_str()));
            }
            if let Some(min) = rules.min_length {
                obj.insert("minLength".into(), json!(min));
            }
            if let Some(max) = rules.max_length {
                obj.insert("maxLength".into(), json!(max));
            }
            Value::Object(obj)
        }
        FieldKind::Integer { minimum, maximum } => {
            let mut obj = JsonObject::new();
            obj.insert("type".into(), json!("integer"));
            if let Some(min) = minimum {
                obj.insert("minimum".into(), json!(min));
            }
            if let Some(max) = maximum {
                obj.insert("maximum".into(), json!(max));
            }
            Value::Object(obj)
        }
        FieldKind::Number => json!({"type": "number"}),
        FieldKind::Boolean => json!({"type": "boolean"}),
        FieldKind::Object(None) => json!({"type": "object", "additionalProperties": true}),
        FieldKind::Object(Some(schema)) => Value::Object(schema.to_json_schema()),
        FieldKind::Array(items) => json!({"type": "array", "items": kind_schema(items)}),
        FieldKind::Any => json!({}),
    }
}

/// Validate one value, pushing errors and returning the coerced value on success.
fn validate_value(
    kind: &FieldKind,
    value: &Value,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    match kind {
        FieldKind::String(rules) => {
            let Some(s) = value.as_str() else {
                errors.push(FieldError::new(
                    path,
                    "string_type",
                    "Input should be a valid string",
                    value.clone(),
                ));
                return None;
            };
            let before = errors.len();
            if !rules.enum_values.is_empty() && !rules.enum_values.iter().any(|v| v == s) {
                let quoted: Vec<String> =
                    rules.enum_values.iter().map(|v| format!("'{v}'")).collect();
                errors.push(
                    FieldError::new(
                        path,
                        "literal_error",
                        format!("Input should be {}", quoted.join(" or ")),
                        value.clone(),
                    )
                    .with_expected(rules.enum_values.iter().map(|v| json!(v)).collect()),
                );
            }
            if let Some(re) = &rules.pattern {
                if !re.is_match(s) {
                    errors.push(FieldError::new(
                        path,
                        "string_pattern_mismatch",
                        format!("String should match pattern '{}'", re.as_str()),
                        value.clone(),
                    ));
                }
            }
            let len = s.chars().count();
            if let Some(min) = rules.min_length {
                if len < min {
                    errors.push(FieldError::new(
                        path,
                        "string_too_short",
                        format!("String should have at least {min} characters"),
                        value.clone(),
                    ));
                }
            }
            if let Some(max) = rules.max_length {
                if len > max {
                    errors.push(FieldError::new(
                        path,
                        "string_too_long",
                        format!("String should have at most {max} characters"),
                        value.clone(),
                    ));
                }
            }
            (errors.len() == before).then(|| value.clone())
        }
        FieldKind::Integer { minimum, maximum } => {
            let parsed = match value {
                Value::Number(n) => match n.as_i64() {
                    Some(i) => Some(i),
                    None => match integral_f64(n.as_f64()) {
                        Ok(i) => Some(i),
                        Err((kind, message)) => {
                            errors.push(FieldError::new(path, kind, message, value.clone()));
                            return None;
                        }
                    },
                },
                Value::String(s) => match s.trim().parse::<i64>() {
                    Ok(i) => Some(i),
                    Err(_) => {
                        errors.push(FieldError::new(
                            path,
                            "int_parsing",
                            "Input should be a valid integer, unable to parse string as an integer",
                            value.clone(),
                        ));
                        return None;
                    }
                },
                _ => None,
            };
            let Some(i) = parsed else {
                errors.push(FieldError::new(
                    path,
                    "int_type",
                    "Input should be a valid integer",
                    value.clone(),
                ));
                return None;
            };
            if let Some(min) = minimum {
                if i < *min {
                    errors.push(FieldError::new(
                        path,
                        "greater_than_equal",
                        format!("Input should be greater than or equal to {min}"),
                        value.clone(),
                    ));
                    return None;
                }
            }
            if let Some(max) = maximum {
                if i > *max {
                    errors.push(FieldError::new(
                        path,
                        "less_than_equal",
                        format!("Input should be less than or equal to {max}"),
                        value.clone(),
                    ));
                    return None;
                }
            }
            Some(json!(i))
        }
        FieldKind::Number => {
            let parsed = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            match parsed {
                Some(_) if value.is_number() => Some(value.clone()),
                Some(f) if !f.is_finite() => {
                    errors.push(FieldError::new(
                        path,
                        "finite_number",
                        "Input should be a finite number",
                        value.clone(),
                    ));
                    None
                }
                Some(f) => Some(json!(f)),
                None => {
                    errors.push(FieldError::new(
                        path,
                        "float_type",
                        "Input should be a valid number",
                        value.clone(),
                    ));
                    None
                }
            }
        }
        FieldKind::Boolean => {
            let parsed = match value {
                Value::Bool(b) => Some(*b),
                Value::String(s) => match s.to_ascii_lowercase().as_str() {
                    "true" | "yes" | "1" | "on" => Some(true),
                    "false" | "no" | "0" | "off" => Some(false),
                    _ => None,
                },
                Value::Number(n) => match n.as_i64() {
                    Some(1) => Some(true),
                    Some(0) => Some(false),
                    _ => None,
                },
                _ => None,
            };
            match parsed {
                Some(b) => Some(Value::Bool(b)),
                None => {
                    errors.push(FieldError::new(
                        path,
                        "bool_parsing",
                        "Input should be a valid boolean",
                        value.clone(),
                    ));
                    None
                }
            }
        }
        FieldKind::Object(nested) => {
            let Some(obj) = value.as_object() else {
                errors.push(FieldError::new(
                    path,
                    "dict_type",
                    "Input should be a valid dictionary",
                    value.clone(),
                ));
                return None;
            };
            match nested {
                None => Some(value.clone()),
                Some(schema) => {
                    let before = errors.len();
                    let out = schema.validate_object(obj, path, errors);
                    (errors.len() == before).then_some(Value::Object(out))
                }
            }
        }
        FieldKind::Array(items) => {
            let Some(arr) = value.as_array() else {
                errors.push(FieldError::new(
                    path,
                    "list_type",
                    "Input should be a valid list",
                    value.clone(),
                ));
                return None;
            };
            let before = errors.len();
            let out: Vec<Value> = arr
                .iter()
                .enumerate()
                .filter_map(|(i, item)| validate_value(items, item, &join_path(path, &i.to_string()), errors))
                .collect();
            (errors.len() == before).then_some(Value::Array(out))
        }
        FieldKind::Any => Some(value.clone()),
    }
}

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Dotted path to the offending value, e.g. `entity.identifier` or `levels.0`.
    pub field: String,
    pub error_type: String,
    pub message: String,
    pub input_value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_values: Option<Vec<Value>>,
}

impl FieldError {
    fn new(
        field: impl Into<String>,
        error_type: &str,
        message: impl Into<String>,
        input_value: Value,
    ) -> Self {
        Self {
            field: field.into(),
            error_type: error_type.to_string(),
            message: message.into(),
            input_value,
            expected_values: None,
        }
    }

    fn with_expected(mut self, values: Vec<Value>) -> Self {
        self.expected_values = Some(values);
        self
    }
}

/// Structured description of every way a call's arguments missed the schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<FieldError>,
    /// Schema fragment for each offending top-level field.
    pub schema_info: JsonObject,
    pub failed_validation: bool,
}

impl ValidationReport {
    /// Dotted paths of every offending field, in report order.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(
            f,
            "{} validation error(s) [{}]; detailed errors: {}",
            self.errors.len(),
            summary.join("; "),
            self.to_value()
        )
    }
}

/// Arguments that passed an [`ObjectSchema`]; only the schema can build one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs(JsonObject);

impl ValidatedArgs {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn as_map(&self) -> &JsonObject {
        &self.0
    }

    pub fn into_map(self) -> JsonObject {
        self.0
    }

    /// Bind the arguments to a typed input struct.
    pub fn parse<T: DeserializeOwned>(&self) -> crate::Result<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| PortMcpError::InvalidArguments(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blueprint_schema() -> ObjectSchema {
        ObjectSchema::new()
            .field(
                FieldSpec::string("blueprint_identifier")
                    .required()
                    .description("The identifier of the blueprint"),
            )
            .field(FieldSpec::boolean("detailed").default_value(json!(false)))
    }

    fn args(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_missing_required_field_reported() {
        let report = blueprint_schema().validate(&JsonObject::new()).unwrap_err();
        assert_eq!(report.fields(), vec!["blueprint_identifier"]);
        assert_eq!(report.errors[0].error_type, "missing");
        assert!(report.failed_validation);
        assert_eq!(
            report.schema_info["blueprint_identifier"]["type"],
            json!("string")
        );
    }

    #[test]
    fn test_valid_input_gets_defaults() {
        let validated = blueprint_schema()
            .validate(&args(json!({"blueprint_identifier": "service"})))
            .unwrap();
        assert_eq!(validated.str("blueprint_identifier"), Some("service"));
        assert_eq!(validated.get("detailed"), Some(&json!(false)));
    }

    #[test]
    fn test_null_optional_uses_default() {
        let validated = blueprint_schema()
            .validate(&args(json!({"blueprint_identifier": "service", "detailed": null})))
            .unwrap();
        assert!(!validated.bool_or("detailed", true));
    }

    #[test]
    fn test_undeclared_keys_dropped() {
        let validated = blueprint_schema()
            .validate(&args(json!({"blueprint_identifier": "svc", "extra": 1})))
            .unwrap();
        assert!(validated.get("extra").is_none());
    }

    #[test]
    fn test_additional_keys_kept_when_allowed() {
        let schema = blueprint_schema().allow_additional();
        let validated = schema
            .validate(&args(json!({"blueprint_identifier": "svc", "extra": 1})))
            .unwrap();
        assert_eq!(validated.get("extra"), Some(&json!(1)));
        assert_eq!(schema.to_json_schema()["additionalProperties"], json!(true));
    }

    #[test]
    fn test_enum_violation_lists_expected_values() {
        let schema =
            ObjectSchema::new().field(FieldSpec::string("region").one_of(["EU", "US"]).required());
        let report = schema.validate(&args(json!({"region": "APAC"}))).unwrap_err();
        let err = &report.errors[0];
        assert_eq!(err.error_type, "literal_error");
        assert_eq!(err.input_value, json!("APAC"));
        assert_eq!(err.expected_values, Some(vec![json!("EU"), json!("US")]));
        assert_eq!(err.message, "Input should be 'EU' or 'US'");
    }

    #[test]
    fn test_pattern_and_length_constraints() {
        let schema = ObjectSchema::new().field(
            FieldSpec::string("identifier")
                .pattern("^[A-Za-z0-9@_.:\\\\/=-]+$")
                .max_length(5),
        );
        let report = schema
            .validate(&args(json!({"identifier": "has spaces here"})))
            .unwrap_err();
        let kinds: Vec<&str> = report.errors.iter().map(|e| e.error_type.as_str()).collect();
        assert_eq!(kinds, vec!["string_pattern_mismatch", "string_too_long"]);
    }

    #[test]
    fn test_all_errors_collected() {
        let schema = ObjectSchema::new()
            .field(FieldSpec::string("a").required())
            .field(FieldSpec::integer("b").required())
            .field(FieldSpec::object("c"));
        let report = schema
            .validate(&args(json!({"b": "not-a-number", "c": [1]})))
            .unwrap_err();
        assert_eq!(report.fields(), vec!["a", "b", "c"]);
        assert_eq!(report.errors[1].error_type, "int_parsing");
        assert_eq!(report.errors[2].error_type, "dict_type");
    }

    #[test]
    fn test_lax_coercions() {
        let schema = ObjectSchema::new()
            .field(FieldSpec::integer("n").range(Some(1), Some(10)))
            .field(FieldSpec::boolean("flag"));
        let validated = schema
            .validate(&args(json!({"n": "7", "flag": "true"})))
            .unwrap();
        assert_eq!(validated.get("n"), Some(&json!(7)));
        assert_eq!(validated.get("flag"), Some(&json!(true)));

        let report = schema.validate(&args(json!({"n": 11}))).unwrap_err();
        assert_eq!(report.errors[0].error_type, "less_than_equal");
    }

    #[test]
    fn test_integer_rejects_lossy_floats() {
        let schema = ObjectSchema::new().field(FieldSpec::integer("n"));
        assert_eq!(
            schema.validate(&args(json!({"n": 3.0}))).unwrap().get("n"),
            Some(&json!(3))
        );

        for (input, kind) in [
            (json!(1e30), "int_out_of_range"),
            (json!(-1e30), "int_out_of_range"),
            (json!(u64::MAX), "int_out_of_range"),
            (json!(2.5), "int_from_float"),
        ] {
            let report = schema.validate(&args(json!({"n": input}))).unwrap_err();
            assert_eq!(report.errors[0].error_type, kind, "{input}");
        }
    }

    #[test]
    fn test_number_rejects_non_finite_strings() {
        let schema = ObjectSchema::new().field(FieldSpec::number("x"));
        assert_eq!(
            schema.validate(&args(json!({"x": "2.5"}))).unwrap().get("x"),
            Some(&json!(2.5))
        );
        for input in ["nan", "inf", "-infinity", "1e400"] {
            let report = schema.validate(&args(json!({"x": input}))).unwrap_err();
            assert_eq!(report.errors[0].error_type, "finite_number", "{input}");
        }
    }

    #[test]
    fn test_try_pattern_reports_bad_patterns() {
        assert!(FieldSpec::string("id").try_pattern("^[a-z]+$").is_ok());
        let err = FieldSpec::string("id").try_pattern("([a-z]").err().unwrap();
        assert!(matches!(err, PortMcpError::InvalidArguments(msg) if msg.contains("'id'")));
        let err = FieldSpec::integer("n").try_pattern("^[0-9]+$").err().unwrap();
        assert!(matches!(err, PortMcpError::InvalidArguments(msg) if msg.contains("non-string")));
    }

    #[test]
    #[should_panic(expected = "valid field pattern")]
    fn test_invalid_constant_pattern_panics() {
        let _ = FieldSpec::string("id").pattern("([a-z]");
    }

    #[test]
    fn test_nested_paths_are_dotted() {
        let entity = ObjectSchema::new()
            .field(FieldSpec::string("identifier").required())
            .field(FieldSpec::object("properties"));
        let schema = ObjectSchema::new()
            .field(FieldSpec::nested("entity", entity).required())
            .field(FieldSpec::array("tags", FieldKind::String(StringRules::default())));
        let report = schema
            .validate(&args(json!({"entity": {"properties": {}}, "tags": ["ok", 3]})))
            .unwrap_err();
        assert_eq!(report.fields(), vec!["entity.identifier", "tags.1"]);
        assert!(report.schema_info.contains_key("entity"));
        assert!(report.schema_info.contains_key("tags"));
    }

    #[test]
    fn test_json_schema_is_inlined() {
        let entity = ObjectSchema::new().field(FieldSpec::string("identifier").required());
        let schema = ObjectSchema::new()
            .field(FieldSpec::nested("entity", entity).required().description("The entity"));
        let rendered = Value::Object(schema.to_json_schema());
        assert_eq!(rendered["required"], json!(["entity"]));
        assert_eq!(rendered["properties"]["entity"]["type"], json!("object"));
        assert_eq!(
            rendered["properties"]["entity"]["required"],
            json!(["identifier"])
        );
        assert!(!rendered.to_string().contains("$ref"));
    }

    #[test]
    fn test_parse_into_typed_struct() {
        #[derive(serde::Deserialize)]
        struct Input {
            blueprint_identifier: String,
            detailed: bool,
        }
        let validated = blueprint_schema()
            .validate(&args(json!({"blueprint_identifier": "svc"})))
            .unwrap();
        let input: Input = validated.parse().unwrap();
        assert_eq!(input.blueprint_identifier, "svc");
        assert!(!input.detailed);
    }

    #[test]
    fn test_report_display_embeds_fields() {
        let report = blueprint_schema().validate(&JsonObject::new()).unwrap_err();
        let text = report.to_string();
        assert!(text.contains("blueprint_identifier: Field required"));
        assert!(text.contains("\"failed_validation\":true"));
    }
}
