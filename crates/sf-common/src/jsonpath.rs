//! A JSONPath subset for addressing job state.
//!
//! Supported syntax:
//!
//! | expression        | selects                                   |
//! |-------------------|-------------------------------------------|
//! | `$`               | the root                                  |
//! | `.name`, `['name']` | an object member                        |
//! | `[0]`, `[-1]`     | an array element, negative from the end   |
//! | `.*`, `[*]`       | every array element or object member      |
//! | `..name`, `..*`   | recursive descent                         |
//!
//! A leading `$` is optional; `firstName` is read as `$.firstName`.

use serde_json::Value;

use crate::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Field(String),
    Index(i64),
    Wildcard,
    /// The current node and all of its descendants.
    Descendants,
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    expression: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse `expression`; a malformed path is an error.
    pub fn compile(expression: &str) -> Result<Self> {
        let segments = Parser::new(expression).parse()?;
        Ok(Self {
            expression: expression.to_string(),
            segments,
        })
    }

    /// The source text.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Every match, in document order.
    pub fn select<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];

        for segment in &self.segments {
            let mut next = Vec::new();
            for value in current {
                match segment {
                    Segment::Field(name) => {
                        if let Some(v) = value.get(name.as_str()) {
                            next.push(v);
                        }
                    }
                    Segment::Index(index) => {
                        if let Value::Array(items) = value {
                            let len = items.len() as i64;
                            let position = if *index < 0 { len + index } else { *index };
                            if (0..len).contains(&position) {
                                next.push(&items[position as usize]);
                            }
                        }
                    }
                    Segment::Wildcard => children(value, &mut next),
                    Segment::Descendants => descendants(value, &mut next),
                }
            }
            current = next;
        }

        current
    }

    /// The first match, if any.
    pub fn first<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.select(root).into_iter().next()
    }
}

fn children<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => out.extend(items.iter()),
        Value::Object(map) => out.extend(map.values()),
        _ => {}
    }
}

fn descendants<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    out.push(value);
    match value {
        Value::Array(items) => items.iter().for_each(|v| descendants(v, out)),
        Value::Object(map) => map.values().for_each(|v| descendants(v, out)),
        _ => {}
    }
}

struct Parser<'a> {
    expression: &'a str,
    rest: &'a str,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        Self {
            expression,
            rest: expression.trim(),
        }
    }

    fn error(&self, reason: &str) -> Error {
        Error::new(ErrorKind::Path(format!("{:?}: {}", self.expression, reason)))
    }

    fn parse(mut self) -> Result<Vec<Segment>> {
        let mut segments = Vec::new();

        if let Some(rest) = self.rest.strip_prefix('$') {
            self.rest = rest;
        } else if !self.rest.is_empty() && !self.rest.starts_with(['.', '[']) {
            segments.push(self.member()?);
        }

        while !self.rest.is_empty() {
            if let Some(rest) = self.rest.strip_prefix("..") {
                self.rest = rest;
                segments.push(Segment::Descendants);
                if !self.rest.starts_with('[') {
                    segments.push(self.member()?);
                }
            } else if let Some(rest) = self.rest.strip_prefix('.') {
                self.rest = rest;
                // `$.[*]` is accepted as `$[*]`.
                if !self.rest.starts_with('[') {
                    segments.push(self.member()?);
                }
            } else if let Some(rest) = self.rest.strip_prefix('[') {
                self.rest = rest;
                segments.push(self.bracket()?);
            } else {
                return Err(self.error("expected '.' or '['"));
            }
        }

        Ok(segments)
    }

    /// A dotted member name or `*`.
    fn member(&mut self) -> Result<Segment> {
        let end = self.rest.find(['.', '[']).unwrap_or(self.rest.len());
        let name = &self.rest[..end];
        self.rest = &self.rest[end..];

        match name {
            "" => Err(self.error("empty member name")),
            "*" => Ok(Segment::Wildcard),
            _ => Ok(Segment::Field(name.to_string())),
        }
    }

    /// Contents of `[...]`, the opening bracket already consumed.
    fn bracket(&mut self) -> Result<Segment> {
        let rest = self.rest.trim_start();

        if let Some(quote) = rest.chars().next().filter(|c| *c == '\'' || *c == '"') {
            let body = &rest[1..];
            let close = body
                .find(quote)
                .ok_or_else(|| self.error("unterminated quoted member"))?;
            let name = &body[..close];
            let after = body[close + 1..].trim_start();
            self.rest = after
                .strip_prefix(']')
                .ok_or_else(|| self.error("expected ']'"))?;
            return Ok(Segment::Field(name.to_string()));
        }

        let close = rest.find(']').ok_or_else(|| self.error("expected ']'"))?;
        let inner = rest[..close].trim();
        self.rest = &rest[close + 1..];

        if inner == "*" {
            return Ok(Segment::Wildcard);
        }
        inner
            .parse::<i64>()
            .map(Segment::Index)
            .map_err(|_| self.error("unsupported bracket expression"))
    }
}

/// All matches of `expression` against `root`, cloned.
pub fn select(expression: &str, root: &Value) -> Result<Vec<Value>> {
    Ok(JsonPath::compile(expression)?
        .select(root)
        .into_iter()
        .cloned()
        .collect())
}
