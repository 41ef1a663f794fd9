//! Line lexer for the bracketed-section grammar shared by scene and
//! resource files.
//!
//! A file is a sequence of `[tag attr="value" ...]` section headers, each
//! optionally followed by `key = value` assignment lines until the next
//! header. Assignment values are either reference expressions
//! (`ExtResource("id")`, `SubResource("id")`) or opaque scalar literals;
//! scalar values spanning multiple lines (arrays, transforms) are folded
//! into the assignment that opened them.

use thiserror::Error;

/// A structural parse failure, positioned by 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("section header is missing its closing ']'")]
    UnclosedSection,
    #[error("unterminated string in section attribute")]
    UnterminatedString,
    #[error("malformed attribute `{0}`")]
    MalformedAttribute(String),
    #[error("malformed reference expression `{0}`")]
    MalformedReference(String),
    #[error("assignment line has no key")]
    MissingKey,
    #[error("missing `{0}` file header section")]
    MissingHeader(&'static str),
    #[error("header section has no `{0}` attribute")]
    MissingAttribute(&'static str),
}

/// A parsed `[tag key="value" ...]` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub line: usize,
}

impl SectionHeader {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a required attribute, failing with the header's position.
    pub fn require_attr(&self, name: &'static str) -> Result<&str, ParseError> {
        self.attr(name).ok_or(ParseError {
            line: self.line,
            kind: ParseErrorKind::MissingAttribute(name),
        })
    }
}

/// The right-hand side of an assignment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Opaque literal text, stored as written.
    Scalar(String),
    /// `ExtResource("id")` reference expression.
    ExtResource(String),
    /// `SubResource("id")` reference expression.
    SubResource(String),
}

/// A `key = value` line inside a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub key: String,
    pub value: Value,
    pub line: usize,
}

/// One lexical event in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Section(SectionHeader),
    Assignment(Assignment),
}

/// Streaming reader over a file's sections and assignments.
pub struct SectionReader<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> SectionReader<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
            pos: 0,
        }
    }

    /// Next event, or `None` at end of file.
    pub fn next_event(&mut self) -> Result<Option<Event>, ParseError> {
        while self.pos < self.lines.len() {
            let line_no = self.pos + 1;
            let line = self.lines[self.pos].trim();
            self.pos += 1;

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let inner = rest.strip_suffix(']').ok_or(ParseError {
                    line: line_no,
                    kind: ParseErrorKind::UnclosedSection,
                })?;
                return parse_header(inner, line_no).map(|h| Some(Event::Section(h)));
            }

            let Some((key, rhs)) = line.split_once('=') else {
                return Err(ParseError {
                    line: line_no,
                    kind: ParseErrorKind::MissingKey,
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ParseError {
                    line: line_no,
                    kind: ParseErrorKind::MissingKey,
                });
            }

            let mut raw = rhs.trim().to_string();
            // Fold continuation lines of a multi-line scalar (arrays,
            // transforms) into this assignment.
            while self.pos < self.lines.len() {
                let next = self.lines[self.pos].trim();
                if next.is_empty() || next.starts_with('[') || is_assignment_line(next) {
                    break;
                }
                raw.push(' ');
                raw.push_str(next);
                self.pos += 1;
            }

            let value = parse_value(&raw, line_no)?;
            return Ok(Some(Event::Assignment(Assignment {
                key: key.to_string(),
                value,
                line: line_no,
            })));
        }
        Ok(None)
    }
}

/// Heuristic for `key = ...` at the start of a line, used to delimit
/// multi-line scalar values.
fn is_assignment_line(line: &str) -> bool {
    let Some((key, _)) = line.split_once('=') else {
        return false;
    };
    let key = key.trim_end();
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '/' || c == '.')
}

fn parse_value(raw: &str, line: usize) -> Result<Value, ParseError> {
    let ctors: [(&str, fn(String) -> Value); 2] = [
        ("ExtResource", Value::ExtResource),
        ("SubResource", Value::SubResource),
    ];
    for (ctor, make) in ctors {
        if let Some(rest) = raw.strip_prefix(ctor) {
            let rest = rest.trim_start();
            let Some(inner) = rest
                .strip_prefix('(')
                .and_then(|r| r.strip_suffix(')'))
                .map(str::trim)
            else {
                return Err(ParseError {
                    line,
                    kind: ParseErrorKind::MalformedReference(raw.to_string()),
                });
            };
            let Some(id) = inner
                .strip_prefix('"')
                .and_then(|r| r.strip_suffix('"'))
            else {
                return Err(ParseError {
                    line,
                    kind: ParseErrorKind::MalformedReference(raw.to_string()),
                });
            };
            return Ok(make(id.to_string()));
        }
    }
    Ok(Value::Scalar(raw.to_string()))
}

fn parse_header(inner: &str, line: usize) -> Result<SectionHeader, ParseError> {
    let mut chars = inner.char_indices().peekable();
    let mut tag = String::new();

    // Tag: first whitespace-delimited token.
    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() {
            break;
        }
        tag.push(c);
        chars.next();
    }
    if tag.is_empty() {
        return Err(ParseError {
            line,
            kind: ParseErrorKind::MalformedAttribute(inner.to_string()),
        });
    }

    let mut attrs = Vec::new();
    loop {
        while matches!(chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(&(_, c)) = chars.peek() {
            if c == '=' || c.is_whitespace() {
                break;
            }
            key.push(c);
            chars.next();
        }
        if !matches!(chars.peek(), Some(&(_, '='))) {
            return Err(ParseError {
                line,
                kind: ParseErrorKind::MalformedAttribute(key),
            });
        }
        chars.next(); // consume '='

        let value = match chars.peek() {
            Some(&(_, '"')) => {
                chars.next();
                let mut v = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    v.push(c);
                }
                if !closed {
                    return Err(ParseError {
                        line,
                        kind: ParseErrorKind::UnterminatedString,
                    });
                }
                v
            }
            Some(_) => {
                let mut v = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() {
                        break;
                    }
                    v.push(c);
                    chars.next();
                }
                v
            }
            None => {
                return Err(ParseError {
                    line,
                    kind: ParseErrorKind::MalformedAttribute(key),
                });
            }
        };
        attrs.push((key, value));
    }

    Ok(SectionHeader { tag, attrs, line })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(src: &str) -> Vec<Event> {
        let mut reader = SectionReader::new(src);
        let mut out = Vec::new();
        while let Some(ev) = reader.next_event().unwrap() {
            out.push(ev);
        }
        out
    }

    #[test]
    fn test_section_with_attrs() {
        let evs = events("[gd_scene load_steps=4 format=3 uid=\"uid://abc\"]\n");
        let Event::Section(h) = &evs[0] else {
            panic!("expected section");
        };
        assert_eq!(h.tag, "gd_scene");
        assert_eq!(h.attr("load_steps"), Some("4"));
        assert_eq!(h.attr("uid"), Some("uid://abc"));
        assert_eq!(h.attr("missing"), None);
    }

    #[test]
    fn test_assignment_values() {
        let evs = events(
            "[node name=\"Root\" type=\"Node2D\"]\n\
             position = Vector2(1, 2)\n\
             texture = ExtResource(\"1_abc\")\n\
             shape = SubResource(\"RectangleShape2D_1\")\n",
        );
        assert_eq!(evs.len(), 4);
        let Event::Assignment(a) = &evs[1] else {
            panic!("expected assignment");
        };
        assert_eq!(a.key, "position");
        assert_eq!(a.value, Value::Scalar("Vector2(1, 2)".to_string()));
        let Event::Assignment(a) = &evs[2] else {
            panic!("expected assignment");
        };
        assert_eq!(a.value, Value::ExtResource("1_abc".to_string()));
        let Event::Assignment(a) = &evs[3] else {
            panic!("expected assignment");
        };
        assert_eq!(a.value, Value::SubResource("RectangleShape2D_1".to_string()));
    }

    #[test]
    fn test_multiline_scalar_folds() {
        let evs = events(
            "[resource]\npoints = PackedVector2Array(0, 0,\n1, 1,\n2, 2)\nnext = 1\n",
        );
        assert_eq!(evs.len(), 3);
        let Event::Assignment(a) = &evs[1] else {
            panic!("expected assignment");
        };
        assert_eq!(
            a.value,
            Value::Scalar("PackedVector2Array(0, 0, 1, 1, 2, 2)".to_string())
        );
        let Event::Assignment(a) = &evs[2] else {
            panic!("expected assignment");
        };
        assert_eq!(a.key, "next");
    }

    #[test]
    fn test_unclosed_section_is_an_error() {
        let mut reader = SectionReader::new("[node name=\"Root\"\n");
        let err = reader.next_event().unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, ParseErrorKind::UnclosedSection);
    }

    #[test]
    fn test_unterminated_attr_string_is_an_error() {
        let mut reader = SectionReader::new("[node name=\"Root]\n");
        let err = reader.next_event().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
    }

    #[test]
    fn test_malformed_reference_is_an_error() {
        let mut reader = SectionReader::new("[resource]\nshape = SubResource(oops\n");
        reader.next_event().unwrap();
        let err = reader.next_event().unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::MalformedReference(_)));
    }
}
