use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DEFAULT_EMPTY_SELECTION_MESSAGE, ObjectSchema, Schema};

/// One way a value failed to match its schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    TypeMismatch {
        expected: String,
        found: String,
    },
    NotInEnum {
        allowed: Vec<String>,
        found: String,
    },
    EmptySelection {
        message: String,
    },
    MissingField,
    UnknownField,
}

/// A violation located at a field path such as `travelPreferences.pace` or
/// `alerts[2].severity`. The root value has an empty path.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Violation {
    pub path: String,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl Violation {
    pub fn new(
        path: impl Into<String>,
        kind: ViolationKind,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Name of the innermost field, e.g. `severity` for `alerts[2].severity`.
    pub fn field(&self) -> &str {
        let tail = self.path.rsplit('.').next().unwrap_or(&self.path);
        tail.split('[').next().unwrap_or(tail)
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ViolationKind::TypeMismatch {
                expected,
                found,
            } => write!(f, "expected {}, found {}", expected, found),
            ViolationKind::NotInEnum {
                allowed,
                found,
            } => write!(f, "'{}' is not one of [{}]", found, allowed.join(", ")),
            ViolationKind::EmptySelection {
                message,
            } => f.write_str(message),
            ViolationKind::MissingField => f.write_str("required field is missing"),
            ViolationKind::UnknownField => f.write_str("field is not declared in the schema"),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "value: {}", self.kind)
        } else {
            write!(f, "{}: {}", self.path, self.kind)
        }
    }
}

/// Validates `value` against `schema`.
///
/// Returns the validated value, or every violation found. Arrays and objects
/// are walked completely; nothing short-circuits after the first problem.
pub fn validate(
    schema: &Schema,
    value: &Value,
) -> Result<Value, Vec<Violation>> {
    let mut violations = Vec::new();
    check(schema, value, "", &mut violations);
    if violations.is_empty() {
        Ok(value.clone())
    } else {
        Err(violations)
    }
}

fn check(
    schema: &Schema,
    value: &Value,
    path: &str,
    out: &mut Vec<Violation>,
) {
    match schema {
        Schema::String => {
            if !value.is_string() {
                out.push(mismatch(path, "string", value));
            }
        }
        Schema::Number => {
            if !value.is_number() {
                out.push(mismatch(path, "number", value));
            }
        }
        Schema::Boolean => {
            if !value.is_boolean() {
                out.push(mismatch(path, "boolean", value));
            }
        }
        Schema::Enum {
            values,
        } => match value.as_str() {
            Some(s) if values.iter().any(|v| v == s) => {}
            Some(s) => out.push(Violation::new(
                path,
                ViolationKind::NotInEnum {
                    allowed: values.clone(),
                    found: s.to_string(),
                },
            )),
            None => out.push(mismatch(path, "string", value)),
        },
        Schema::Array {
            items,
            non_empty,
            message,
        } => match value.as_array() {
            Some(elements) => {
                if *non_empty && elements.is_empty() {
                    out.push(Violation::new(
                        path,
                        ViolationKind::EmptySelection {
                            message: message.clone().unwrap_or_else(|| DEFAULT_EMPTY_SELECTION_MESSAGE.to_string()),
                        },
                    ));
                }
                for (i, element) in elements.iter().enumerate() {
                    check(items, element, &format!("{}[{}]", path, i), out);
                }
            }
            None => out.push(mismatch(path, "array", value)),
        },
        Schema::Object(obj) => check_object(obj, value, path, out),
        Schema::Optional {
            schema,
        } => {
            if !value.is_null() {
                check(schema, value, path, out);
            }
        }
    }
}

fn check_object(
    obj: &ObjectSchema,
    value: &Value,
    path: &str,
    out: &mut Vec<Violation>,
) {
    let Some(map) = value.as_object() else {
        out.push(mismatch(path, "object", value));
        return;
    };

    for field in &obj.fields {
        let field_path = join(path, &field.name);
        match map.get(&field.name) {
            Some(v) => check(&field.schema, v, &field_path, out),
            None if field.required => out.push(Violation::new(field_path, ViolationKind::MissingField)),
            None => {}
        }
    }

    for key in map.keys() {
        if obj.field(key).is_none() {
            out.push(Violation::new(join(path, key), ViolationKind::UnknownField));
        }
    }
}

fn join(
    path: &str,
    key: &str,
) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn mismatch(
    path: &str,
    expected: &str,
    found: &Value,
) -> Violation {
    Violation::new(
        path,
        ViolationKind::TypeMismatch {
            expected: expected.to_string(),
            found: json_type(found).to_string(),
        },
    )
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
