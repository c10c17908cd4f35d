//! Explicit parameter schemas, checked before a tool handler runs.

use serde_json::{json, Map, Value};

use crate::types::{FieldViolation, McpError, McpResult};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Number,
    Integer,
    /// Non-negative integer, advertised as a JSON number.
    Count,
    Boolean,
    Array(Box<FieldKind>),
    Object(Vec<FieldSpec>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    pub description: Option<String>,
}

impl FieldSpec {
    pub fn required(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            description: None,
        }
    }

    pub fn optional(name: &str, kind: FieldKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Field name → type + optionality, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    fields: Vec<FieldSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Check `args` against the schema, collecting every violation.
    ///
    /// Fields not named in the schema are ignored.
    pub fn validate(&self, args: &Value) -> McpResult<()> {
        let mut violations = Vec::new();

        match args.as_object() {
            Some(map) => check_fields("", &self.fields, map, &mut violations),
            None => violations.push(FieldViolation {
                field: "arguments".to_string(),
                reason: format!("expected object, got {}", type_name(args)),
            }),
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(McpError::Validation(violations))
        }
    }

    /// JSON Schema for the `inputSchema` of `tools/list`.
    pub fn to_json_schema(&self) -> Value {
        object_schema(&self.fields)
    }
}

fn check_fields(
    prefix: &str,
    fields: &[FieldSpec],
    map: &Map<String, Value>,
    out: &mut Vec<FieldViolation>,
) {
    for spec in fields {
        let path = format!("{prefix}{}", spec.name);
        match map.get(&spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    out.push(FieldViolation {
                        field: path,
                        reason: "is required".to_string(),
                    });
                }
            }
            Some(value) => check_kind(&path, &spec.kind, value, out),
        }
    }
}

fn check_kind(path: &str, kind: &FieldKind, value: &Value, out: &mut Vec<FieldViolation>) {
    let ok = match kind {
        FieldKind::String => value.is_string(),
        FieldKind::Number => value.is_number(),
        FieldKind::Integer => value.is_i64() || value.is_u64(),
        FieldKind::Count => value.is_u64(),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Array(item) => match value.as_array() {
            Some(items) => {
                for (i, v) in items.iter().enumerate() {
                    check_kind(&format!("{path}[{i}]"), item, v, out);
                }
                true
            }
            None => false,
        },
        FieldKind::Object(fields) => match value.as_object() {
            Some(map) => {
                check_fields(&format!("{path}."), fields, map, out);
                true
            }
            None => false,
        },
    };

    if !ok {
        out.push(FieldViolation {
            field: path.to_string(),
            reason: format!("expected {}, got {}", kind_name(kind), type_name(value)),
        });
    }
}

fn kind_name(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::String => "string",
        FieldKind::Number => "number",
        FieldKind::Integer => "integer",
        FieldKind::Count => "non-negative integer",
        FieldKind::Boolean => "boolean",
        FieldKind::Array(_) => "array",
        FieldKind::Object(_) => "object",
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn kind_schema(kind: &FieldKind) -> Value {
    match kind {
        FieldKind::Array(item) => json!({ "type": "array", "items": kind_schema(item) }),
        FieldKind::Object(fields) => object_schema(fields),
        FieldKind::Count => json!({ "type": "number", "minimum": 0 }),
        other => json!({ "type": kind_name(other) }),
    }
}

fn object_schema(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    for spec in fields {
        let mut schema = kind_schema(&spec.kind);
        if let (Some(desc), Some(obj)) = (&spec.description, schema.as_object_mut()) {
            obj.insert("description".to_string(), json!(desc));
        }
        properties.insert(spec.name.clone(), schema);
    }

    let required: Vec<&str> = fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name.as_str())
        .collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}
