//! Single-pass script parser: doc-comment/declaration snippets and class
//! metadata.
//!
//! Scans for contiguous `##` doc-comment blocks and the declaration that
//! immediately follows, recording each pair as byte ranges into the
//! original source. Parsing is best-effort per declaration: a malformed
//! line is skipped, it never fails the file or the run. Only GDScript
//! declarations are understood; other script sources yield an empty class.

use sgraph_core::entity::{
    Argument, CodeSnippet, FunctionSig, ScriptClass, Variable, VariableCategory,
};

/// Parse a script source into snippets and derived class metadata.
pub fn parse(source: &str) -> (Vec<CodeSnippet>, ScriptClass) {
    let mut snippets = Vec::new();
    let mut class = ScriptClass::default();

    // Pending doc block: byte range plus stripped comment lines. Reset by
    // any line that is not a doc comment, so a doc only attaches to the
    // declaration immediately following it.
    let mut doc_range: Option<std::ops::Range<usize>> = None;
    let mut doc_lines: Vec<String> = Vec::new();

    let mut offset = 0usize;
    for raw_line in source.split_inclusive('\n') {
        let start = offset;
        offset += raw_line.len();
        let line = raw_line.trim_end_matches(['\n', '\r']);
        let trimmed = line.trim();
        let code_range = start..start + line.len();

        if let Some(text) = trimmed.strip_prefix("##") {
            let text = text.trim();
            match &mut doc_range {
                Some(range) => range.end = code_range.end,
                None => doc_range = Some(code_range.clone()),
            }
            doc_lines.push(text.to_string());
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            doc_range = None;
            doc_lines.clear();
            continue;
        }

        let doc = doc_range.take();
        let doc_lines_taken = std::mem::take(&mut doc_lines);
        let recognized = parse_declaration(trimmed, &doc_lines_taken, &mut class);

        if recognized && let Some(doc) = doc {
            snippets.push(CodeSnippet {
                doc,
                code: code_range,
            });
        }
    }

    (snippets, class)
}

/// Dispatch one declaration line. Returns false when the line is not a
/// declaration this parser understands.
fn parse_declaration(line: &str, doc: &[String], class: &mut ScriptClass) -> bool {
    if let Some(rest) = line.strip_prefix("class_name ") {
        let mut parts = rest.split_whitespace();
        match parts.next() {
            Some(name) => class.name = Some(name.to_string()),
            None => return false,
        }
        // `class_name Foo extends Bar` one-liner form.
        if let (Some("extends"), Some(parent)) = (parts.next(), parts.next()) {
            class.parent = Some(parent.to_string());
        }
        attach_class_doc(doc, class);
        return true;
    }

    if let Some(rest) = line.strip_prefix("extends ") {
        if let Some(parent) = rest.split_whitespace().next() {
            class.parent = Some(parent.to_string());
        }
        attach_class_doc(doc, class);
        return true;
    }

    if let Some(name) = category_marker(line) {
        class.categories.push(VariableCategory {
            name: Some(name),
            variables: Vec::new(),
        });
        return true;
    }

    if let Some(variable) = parse_variable(line, doc) {
        current_category(class).variables.push(variable);
        return true;
    }

    if let Some(function) = parse_function(line, doc) {
        class.functions.push(function);
        return true;
    }

    // Standalone class-level annotations (@tool, @icon(...)) become tags.
    if let Some(rest) = line.strip_prefix('@')
        && !rest.starts_with("export")
        && !rest.starts_with("onready")
    {
        let tag: String = rest
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if !tag.is_empty() {
            class.tags.push(tag);
            return true;
        }
    }

    false
}

/// Class doc block: lines starting with `@` are tags, the rest is the
/// short description. Only the first attaching block wins.
fn attach_class_doc(doc: &[String], class: &mut ScriptClass) {
    if doc.is_empty() {
        return;
    }
    let mut brief_lines = Vec::new();
    for line in doc {
        if let Some(tag) = line.strip_prefix('@') {
            class.tags.push(tag.trim().to_string());
        } else if !line.is_empty() {
            brief_lines.push(line.as_str());
        }
    }
    if class.brief.is_none() && !brief_lines.is_empty() {
        class.brief = Some(brief_lines.join(" "));
    }
}

fn brief_from(doc: &[String]) -> Option<String> {
    let text = doc
        .iter()
        .filter(|l| !l.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() { None } else { Some(text) }
}

/// `@export_category("X")` / `@export_group("X")` open a new category.
fn category_marker(line: &str) -> Option<String> {
    let rest = line
        .strip_prefix("@export_category")
        .or_else(|| line.strip_prefix("@export_group"))?;
    let inner = rest.trim().strip_prefix('(')?.trim_end().strip_suffix(')')?;
    let name = inner.trim().strip_prefix('"')?.strip_suffix('"')?;
    Some(name.to_string())
}

/// The category open for new variables, creating the implicit unnamed
/// default category when none has been opened yet.
fn current_category(class: &mut ScriptClass) -> &mut VariableCategory {
    if class.categories.is_empty() {
        class.categories.push(VariableCategory::default());
    }
    class.categories.last_mut().expect("just ensured non-empty")
}

/// `var name: Type = ...`, with optional annotation prefixes on the line
/// (`@export var speed: float`).
fn parse_variable(line: &str, doc: &[String]) -> Option<Variable> {
    let decl = if line.starts_with("var ") {
        line
    } else if line.starts_with('@') {
        let at = line.find("var ")?;
        &line[at..]
    } else {
        return None;
    };
    let rest = decl.strip_prefix("var ")?.trim();

    let name_end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() {
        return None;
    }

    let after = rest[name_end..].trim_start();
    let type_name = if let Some(annotated) = after.strip_prefix(':') {
        let annotated = annotated.trim_start();
        if annotated.starts_with('=') {
            // `var x := value` infers its type.
            "Variant".to_string()
        } else {
            let end = annotated.find('=').unwrap_or(annotated.len());
            let ty = annotated[..end].trim();
            if ty.is_empty() {
                return None;
            }
            ty.to_string()
        }
    } else {
        "Variant".to_string()
    };

    Some(Variable {
        name: name.to_string(),
        type_name,
        brief: brief_from(doc),
    })
}

/// `func name(args) -> Ret:`, including `static func`. Signatures must fit
/// on one line; anything else is skipped.
fn parse_function(line: &str, doc: &[String]) -> Option<FunctionSig> {
    let decl = line.strip_prefix("static ").unwrap_or(line);
    let rest = decl.strip_prefix("func ")?;

    let open = rest.find('(')?;
    let name = rest[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }

    let after_open = &rest[open + 1..];
    let close = matching_paren(after_open)?;
    let args = split_top_level(&after_open[..close])
        .into_iter()
        .filter_map(parse_argument)
        .collect();

    let tail = &after_open[close + 1..];
    let return_type = match tail.find("->") {
        Some(arrow) => {
            let ty = tail[arrow + 2..].trim().trim_end_matches(':').trim();
            if ty.is_empty() {
                return None;
            }
            ty.to_string()
        }
        None => "void".to_string(),
    };

    Some(FunctionSig {
        name: name.to_string(),
        args,
        return_type,
        brief: brief_from(doc),
    })
}

fn parse_argument(arg: &str) -> Option<Argument> {
    let arg = arg.trim();
    if arg.is_empty() {
        return None;
    }
    // Strip a default value, then split off the type annotation.
    let (head, _) = arg.split_once('=').map_or((arg, ""), |(h, t)| (h, t));
    let (name, type_name) = match head.split_once(':') {
        Some((n, t)) => (n.trim(), t.trim()),
        None => (head.trim(), ""),
    };
    if name.is_empty() {
        return None;
    }
    Some(Argument {
        name: name.to_string(),
        type_name: if type_name.is_empty() {
            "Variant".to_string()
        } else {
            type_name.to_string()
        },
    })
}

/// Index of the `)` closing the argument list, depth-aware for nested
/// parentheses in default values.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Split an argument list on commas outside any bracket nesting.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                out.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}
