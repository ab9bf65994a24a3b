use regex::Regex;

use super::{DataVar, Path, Segment};
use crate::{Result, RoadhogError};

/// Regex pattern for template tags.
/// Format: `{{{ expr }}}` (group 1) or `{{ expr }}` (group 2)
const TAG_PATTERN: &str = r"\{\{\{\s*(.*?)\s*\}\}\}|\{\{\s*(.*?)\s*\}\}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
enum BlockKind {
    If,
    Unless,
    Each,
}

enum Tag {
    Comment,
    Field(Path),
    Open(BlockKind, Path),
    Else,
    Close(BlockKind),
}

/// An open block waiting for its closing tag.
struct Frame {
    kind: BlockKind,
    path: Path,
    then: Vec<Segment>,
    otherwise: Option<Vec<Segment>>,
}

impl Frame {
    fn into_segment(self) -> Segment {
        let otherwise = self.otherwise.unwrap_or_default();
        match self.kind {
            BlockKind::If => Segment::If {
                path: self.path,
                then: self.then,
                otherwise,
            },
            BlockKind::Unless => Segment::Unless {
                path: self.path,
                then: self.then,
                otherwise,
            },
            BlockKind::Each => Segment::Each {
                path: self.path,
                body: self.then,
                otherwise,
            },
        }
    }
}

pub(super) fn parse(source: &str) -> Result<Vec<Segment>> {
    let re = Regex::new(TAG_PATTERN).map_err(|err| RoadhogError::Template(err.to_string()))?;

    let mut root: Vec<Segment> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut last = 0;

    for caps in re.captures_iter(source) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            push_text(&mut stack, &mut root, &source[last..whole.start()])?;
        }
        last = whole.end();

        let triple = caps.get(1).is_some();
        let expr = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().trim()).unwrap_or("");

        match parse_tag(expr)? {
            Tag::Comment => {}
            Tag::Field(path) => push(&mut stack, &mut root, Segment::Field(path)),
            Tag::Open(kind, path) => {
                if triple {
                    return Err(RoadhogError::Template(format!("block '{}' cannot use triple braces", expr)));
                }
                stack.push(Frame {
                    kind,
                    path,
                    then: Vec::new(),
                    otherwise: None,
                });
            }
            Tag::Else => {
                let frame = stack.last_mut().ok_or_else(|| RoadhogError::Template("'{{else}}' outside of a block".to_string()))?;
                if frame.otherwise.is_some() {
                    return Err(RoadhogError::Template(format!("'#{}' block has more than one '{{{{else}}}}'", frame.kind.as_ref())));
                }
                frame.otherwise = Some(Vec::new());
            }
            Tag::Close(kind) => {
                let frame = stack.pop().ok_or_else(|| RoadhogError::Template(format!("'/{}' closes no open block", kind.as_ref())))?;
                if frame.kind != kind {
                    return Err(RoadhogError::Template(format!(
                        "'#{}' block closed by '/{}'",
                        frame.kind.as_ref(),
                        kind.as_ref()
                    )));
                }
                push(&mut stack, &mut root, frame.into_segment());
            }
        }
    }

    if last < source.len() {
        push_text(&mut stack, &mut root, &source[last..])?;
    }

    if let Some(frame) = stack.last() {
        return Err(RoadhogError::Template(format!("'#{}' block is never closed", frame.kind.as_ref())));
    }

    Ok(root)
}

fn push(
    stack: &mut [Frame],
    root: &mut Vec<Segment>,
    segment: Segment,
) {
    match stack.last_mut() {
        Some(frame) => match frame.otherwise.as_mut() {
            Some(otherwise) => otherwise.push(segment),
            None => frame.then.push(segment),
        },
        None => root.push(segment),
    }
}

fn push_text(
    stack: &mut [Frame],
    root: &mut Vec<Segment>,
    text: &str,
) -> Result<()> {
    if text.contains("{{") {
        return Err(RoadhogError::Template(format!("unterminated tag near '{}'", text.trim())));
    }
    push(stack, root, Segment::Text(text.to_string()));
    Ok(())
}

fn parse_tag(expr: &str) -> Result<Tag> {
    if expr.is_empty() {
        return Err(RoadhogError::Template("empty tag '{{}}'".to_string()));
    }

    if expr.starts_with('!') {
        return Ok(Tag::Comment);
    }

    if let Some(rest) = expr.strip_prefix('#') {
        let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let kind = name.parse::<BlockKind>().map_err(|_| RoadhogError::Template(format!("unknown block helper '#{}'", name)))?;
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(RoadhogError::Template(format!("'#{}' needs a path", name)));
        }
        return Ok(Tag::Open(kind, parse_path(arg)?));
    }

    if let Some(name) = expr.strip_prefix('/') {
        let kind = name.trim().parse::<BlockKind>().map_err(|_| RoadhogError::Template(format!("unknown closing tag '/{}'", name)))?;
        return Ok(Tag::Close(kind));
    }

    if expr == "else" {
        return Ok(Tag::Else);
    }

    Ok(Tag::Field(parse_path(expr)?))
}

fn parse_path(expr: &str) -> Result<Path> {
    if let Some(name) = expr.strip_prefix('@') {
        let var = name.parse::<DataVar>().map_err(|_| RoadhogError::Template(format!("unknown data variable '@{}'", name)))?;
        return Ok(Path::Data(var));
    }

    if expr == "this" || expr == "." {
        return Ok(Path::This(Vec::new()));
    }

    if let Some(rest) = expr.strip_prefix("this.").or_else(|| expr.strip_prefix("./")) {
        return Ok(Path::This(split_keys(expr, rest)?));
    }

    Ok(Path::Named(split_keys(expr, expr)?))
}

fn split_keys(
    expr: &str,
    keys: &str,
) -> Result<Vec<String>> {
    keys.split('.')
        .map(|key| {
            if key.is_empty() || key.contains(char::is_whitespace) || key.contains(['{', '}', '#', '/']) {
                Err(RoadhogError::Template(format!("invalid path '{}'", expr)))
            } else {
                Ok(key.to_string())
            }
        })
        .collect()
}
