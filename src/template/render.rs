use serde_json::Value;

use super::{DataVar, Path, Segment};

/// One level of the render scope: the root input or an `#each` element.
struct Scope<'a> {
    value: &'a Value,
    index: usize,
    len: usize,
    iterating: bool,
}

/// A resolved path: either a borrowed input value or loop metadata.
enum Resolved<'a> {
    Value(&'a Value),
    Index(usize),
    Flag(bool),
}

pub(super) fn render(
    segments: &[Segment],
    input: &Value,
) -> String {
    let mut out = String::new();
    let mut scopes = vec![Scope {
        value: input,
        index: 0,
        len: 0,
        iterating: false,
    }];
    render_into(segments, &mut scopes, &mut out);
    out
}

fn render_into<'a>(
    segments: &[Segment],
    scopes: &mut Vec<Scope<'a>>,
    out: &mut String,
) {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Field(path) => {
                if let Some(resolved) = resolve(scopes, path) {
                    write_resolved(&resolved, out);
                }
            }
            Segment::If {
                path,
                then,
                otherwise,
            } => {
                let branch = if is_truthy(resolve(scopes, path)) {
                    then
                } else {
                    otherwise
                };
                render_into(branch, scopes, out);
            }
            Segment::Unless {
                path,
                then,
                otherwise,
            } => {
                let branch = if is_truthy(resolve(scopes, path)) {
                    otherwise
                } else {
                    then
                };
                render_into(branch, scopes, out);
            }
            Segment::Each {
                path,
                body,
                otherwise,
            } => {
                let items = match resolve(scopes, path) {
                    Some(Resolved::Value(Value::Array(items))) if !items.is_empty() => items,
                    _ => {
                        render_into(otherwise, scopes, out);
                        continue;
                    }
                };
                for (index, item) in items.iter().enumerate() {
                    scopes.push(Scope {
                        value: item,
                        index,
                        len: items.len(),
                        iterating: true,
                    });
                    render_into(body, scopes, out);
                    scopes.pop();
                }
            }
        }
    }
}

fn resolve<'a>(
    scopes: &[Scope<'a>],
    path: &Path,
) -> Option<Resolved<'a>> {
    match path {
        Path::This(keys) => {
            let scope = scopes.last()?;
            traverse(scope.value, keys).map(Resolved::Value)
        }
        Path::Data(var) => {
            let scope = scopes.last().filter(|s| s.iterating)?;
            Some(match var {
                DataVar::Index => Resolved::Index(scope.index),
                DataVar::First => Resolved::Flag(scope.index == 0),
                DataVar::Last => Resolved::Flag(scope.index + 1 == scope.len),
            })
        }
        Path::Named(keys) => {
            let first = keys.first()?;
            // innermost scope that has the first key owns the whole path
            let head = scopes.iter().rev().find_map(|scope| scope.value.get(first.as_str()))?;
            traverse(head, &keys[1..]).map(Resolved::Value)
        }
    }
}

fn traverse<'a>(
    value: &'a Value,
    keys: &[String],
) -> Option<&'a Value> {
    keys.iter().try_fold(value, |current, key| current.get(key.as_str()))
}

fn is_truthy(resolved: Option<Resolved<'_>>) -> bool {
    match resolved {
        None => false,
        Some(Resolved::Index(i)) => i != 0,
        Some(Resolved::Flag(b)) => b,
        Some(Resolved::Value(value)) => match value {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(_) => true,
        },
    }
}

fn write_resolved(
    resolved: &Resolved<'_>,
    out: &mut String,
) {
    match resolved {
        Resolved::Index(i) => out.push_str(&i.to_string()),
        Resolved::Flag(b) => out.push_str(if *b { "true" } else { "false" }),
        Resolved::Value(value) => match value {
            Value::Null => {}
            Value::String(s) => out.push_str(s),
            Value::Number(n) => write_number(n, out),
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            // For objects/arrays, use JSON string
            other => out.push_str(&other.to_string()),
        },
    }
}

/// Integral floats print without a fraction, so `29.0` renders as `29`.
fn write_number(
    n: &serde_json::Number,
    out: &mut String,
) {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => out.push_str(&format!("{}", f as i64)),
        _ => out.push_str(&n.to_string()),
    }
}
