//! Prompt templates.
//!
//! Templates use a handlebars-style syntax:
//!
//! - `{{path}}` / `{{{path}}}` interpolate a value as plain text
//! - `{{#if path}}…{{else}}…{{/if}}` and `{{#unless path}}…{{/unless}}`
//! - `{{#each path}}…{{else}}…{{/each}}` with `this`, `@index`, `@first`, `@last`
//! - `{{! comment}}`
//!
//! A template is parsed once into a list of [`Segment`]s and can then be
//! rendered any number of times. Rendering is pure: it never fails, and a
//! reference to anything missing renders as the empty string.

mod parser;
mod render;

use serde_json::Value;

use crate::Result;

/// Loop metadata addressable as `@name` inside `#each`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum DataVar {
    Index,
    First,
    Last,
}

/// A reference to a value in the render scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path {
    /// `this`, `.` or `this.a.b`: the current element and keys below it.
    This(Vec<String>),
    /// `@index`, `@first`, `@last`.
    Data(DataVar),
    /// `a.b.c`, looked up from the innermost scope outwards.
    Named(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Field(Path),
    If {
        path: Path,
        then: Vec<Segment>,
        otherwise: Vec<Segment>,
    },
    Unless {
        path: Path,
        then: Vec<Segment>,
        otherwise: Vec<Segment>,
    },
    Each {
        path: Path,
        body: Vec<Segment>,
        otherwise: Vec<Segment>,
    },
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `source`; malformed block structure is reported as an error.
    pub fn parse(source: &str) -> Result<Self> {
        let segments = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Expands the template against `input`.
    pub fn render(
        &self,
        input: &Value,
    ) -> String {
        render::render(&self.segments, input)
    }

    /// Key paths this template reads from the root input.
    ///
    /// Paths used inside `#each` bodies are relative to the element and are
    /// not included; the iterated path itself is.
    pub fn references(&self) -> Vec<Vec<String>> {
        let mut out = Vec::new();
        collect_references(&self.segments, &mut out);
        out
    }
}

fn collect_references(
    segments: &[Segment],
    out: &mut Vec<Vec<String>>,
) {
    fn push(
        path: &Path,
        out: &mut Vec<Vec<String>>,
    ) {
        if let Path::Named(keys) = path {
            if !out.contains(keys) {
                out.push(keys.clone());
            }
        }
    }

    for segment in segments {
        match segment {
            Segment::Text(_) => {}
            Segment::Field(path) => push(path, out),
            Segment::If {
                path,
                then,
                otherwise,
            }
            | Segment::Unless {
                path,
                then,
                otherwise,
            } => {
                push(path, out);
                collect_references(then, out);
                collect_references(otherwise, out);
            }
            Segment::Each {
                path,
                otherwise,
                ..
            } => {
                push(path, out);
                collect_references(otherwise, out);
            }
        }
    }
}

/// Parses and renders in one step.
pub fn render_str(
    source: &str,
    input: &Value,
) -> Result<String> {
    Ok(Template::parse(source)?.render(input))
}
