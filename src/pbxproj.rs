//! Xcode `project.pbxproj` text.
//!
//! The file is an old-style property list whose `objects` dictionary maps
//! object ids to records:
//!
//! ```text
//! 1A2B3C /* main.m in Sources */ = {isa = PBXBuildFile; fileRef = 4D5E6F /* main.m */; };
//! ```
//!
//! [`split_objects`] walks the text with an explicit brace-depth scan (string
//! and comment aware) to isolate each record body; [`field`] then reads a
//! single `key = value;` entry from a body with a [`chumsky`] value grammar.
//! Lookups are independent, so one malformed entry only loses that entry.

use std::collections::HashMap;

use chumsky::prelude::*;

use crate::args::split_args;

// ═══════════════════════════════════════════════════════════════════════════════
//  Object graph
// ═══════════════════════════════════════════════════════════════════════════════

/// Object id → raw record body (the text between the record's braces).
#[derive(Debug, Default, Clone)]
pub struct ObjectGraph<'a> {
    order: Vec<&'a str>,
    bodies: HashMap<&'a str, &'a str>,
}

impl<'a> ObjectGraph<'a> {
    pub fn get(&self, id: &str) -> Option<&'a str> {
        self.bodies.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// `(id, body)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.order.iter().map(|id| (*id, self.bodies[id]))
    }

    /// The `isa` tag of object `id`.
    pub fn isa(&self, id: &str) -> Option<String> {
        self.get(id).and_then(|body| field_str(body, "isa"))
    }

    /// Ids of every object tagged `isa`, in document order.
    pub fn of_isa<'s>(&'s self, isa: &'s str) -> impl Iterator<Item = &'a str> + 's {
        self.iter()
            .filter(move |(_, body)| field_str(body, "isa").as_deref() == Some(isa))
            .map(|(id, _)| id)
    }

    fn insert(&mut self, id: &'a str, body: &'a str) {
        if self.bodies.insert(id, body).is_none() {
            self.order.push(id);
        } else {
            tracing::debug!(id, "duplicate object id; keeping the last record");
        }
    }
}

/// A record header `ID /* comment */ = {`, with the position of its `{`.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    id: &'a str,
    start: usize,
    brace: usize,
}

/// Split the `objects = { … }` dictionary into per-object bodies.
///
/// Each record is scanned until its own brace depth returns to zero, bounded
/// by the start of the next record.  A record that is still open at that
/// point keeps the text up to the bound.  Candidates inside a body that has
/// already been captured belong to that body and are skipped.
pub fn split_objects(text: &str) -> ObjectGraph<'_> {
    let section = match objects_section(text) {
        Some(section) => section,
        None => {
            tracing::debug!("no objects dictionary; scanning the whole text");
            text
        }
    };

    let mut candidates = commented_candidates(section);
    if candidates.is_empty() {
        candidates = top_level_candidates(section);
    }

    let mut graph = ObjectGraph::default();
    let mut captured_to = 0;
    for (i, candidate) in candidates.iter().enumerate() {
        if candidate.start < captured_to {
            continue;
        }
        let bound = candidates[i + 1..]
            .iter()
            .map(|c| c.start)
            .find(|&s| s > candidate.brace)
            .unwrap_or(section.len());

        let (body, end) = match matching_close(section, candidate.brace, bound) {
            Some(close) => (&section[candidate.brace + 1..close], close + 1),
            None => {
                tracing::debug!(id = candidate.id, "unterminated object; truncating at next record");
                (&section[candidate.brace + 1..bound], bound)
            }
        };
        graph.insert(candidate.id, body);
        captured_to = end;
    }
    graph
}

/// The text inside `objects = { … }`.
fn objects_section(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(rel) = text[from..].find("objects") {
        let at = from + rel;
        from = at + "objects".len();
        let eq = skip_trivia(bytes, from);
        if bytes.get(eq) != Some(&b'=') {
            continue;
        }
        let brace = skip_trivia(bytes, eq + 1);
        if bytes.get(brace) != Some(&b'{') {
            continue;
        }
        let close = matching_close(text, brace, text.len()).unwrap_or(text.len());
        return Some(&text[brace + 1..close]);
    }
    None
}

/// Lines of the form `ID /* … */ = {`.
fn commented_candidates(section: &str) -> Vec<Candidate<'_>> {
    let bytes = section.as_bytes();
    let mut found = Vec::new();
    let mut line_start = 0;

    for line in section.split_inclusive('\n') {
        let start = line_start;
        line_start += line.len();

        let id_start = start + (line.len() - line.trim_start().len());
        let id_end = id_start
            + bytes[id_start..]
                .iter()
                .take_while(|b| is_bare_byte(**b))
                .count();
        if id_end == id_start {
            continue;
        }
        let mut pos = id_end;
        while matches!(bytes.get(pos), Some(b' ' | b'\t')) {
            pos += 1;
        }
        if !bytes[pos..].starts_with(b"/*") {
            continue;
        }
        let Some(end) = section[pos..].find("*/") else { continue };
        let eq = skip_trivia(bytes, pos + end + 2);
        if bytes.get(eq) != Some(&b'=') {
            continue;
        }
        let brace = skip_trivia(bytes, eq + 1);
        if bytes.get(brace) == Some(&b'{') {
            found.push(Candidate { id: &section[id_start..id_end], start: id_start, brace });
        }
    }
    found
}

/// Fallback for files without `/* … */` annotations: every `ID = {` entry at
/// the top level of the dictionary.
fn top_level_candidates(section: &str) -> Vec<Candidate<'_>> {
    entries(section)
        .into_iter()
        .filter_map(|entry| {
            let brace = entry.value;
            (section.as_bytes().get(brace) == Some(&b'{')).then_some(Candidate {
                id: entry.key,
                start: entry.key_start,
                brace,
            })
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Low-level scanning
// ═══════════════════════════════════════════════════════════════════════════════

fn is_bare_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"_$/.-+:<>@~".contains(&b)
}

/// Position after a `"…"` string starting at `pos` (backslash escapes honoured).
fn skip_string(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Position after a comment starting at `pos`, or `None` if there is none.
fn skip_comment(bytes: &[u8], pos: usize) -> Option<usize> {
    let rest = &bytes[pos..];
    if rest.starts_with(b"/*") {
        let end = rest[2..].windows(2).position(|w| w == b"*/");
        Some(end.map_or(bytes.len(), |e| pos + 2 + e + 2))
    } else if rest.starts_with(b"//") {
        let end = rest.iter().position(|&b| b == b'\n');
        Some(end.map_or(bytes.len(), |e| pos + e + 1))
    } else {
        None
    }
}

/// Skip whitespace and comments.
fn skip_trivia(bytes: &[u8], mut pos: usize) -> usize {
    loop {
        while bytes.get(pos).is_some_and(|b| b.is_ascii_whitespace()) {
            pos += 1;
        }
        match skip_comment(bytes, pos) {
            Some(next) if pos < bytes.len() => pos = next,
            _ => return pos,
        }
    }
}

/// Index of the `}` closing the `{` at `open`, searching no further than
/// `bound`.  Braces inside strings and comments do not count.
fn matching_close(text: &str, open: usize, bound: usize) -> Option<usize> {
    let bytes = &text.as_bytes()[..bound.min(text.len())];
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'/' => {
                if let Some(next) = skip_comment(bytes, i) {
                    i = next;
                    continue;
                }
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// A `key = …` entry at nesting depth zero of a dictionary body.
#[derive(Debug, Clone, Copy)]
struct Entry<'a> {
    key: &'a str,
    key_start: usize,
    /// Position of the first value character.
    value: usize,
}

/// Top-level entries of a dictionary body, in order.
fn entries(body: &str) -> Vec<Entry<'_>> {
    let bytes = body.as_bytes();
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut expect_key = true;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'/' {
            if let Some(next) = skip_comment(bytes, i) {
                i = next;
                continue;
            }
        }
        if depth == 0 && expect_key && (b == b'"' || is_bare_byte(b)) {
            let (key, end) = if b == b'"' {
                let end = skip_string(bytes, i);
                let close = if end > i + 1 && bytes[end - 1] == b'"' { end - 1 } else { end };
                (&body[i + 1..close], end)
            } else {
                let len = bytes[i..].iter().take_while(|b| is_bare_byte(**b)).count();
                (&body[i..i + len], i + len)
            };
            expect_key = false;
            let eq = skip_trivia(bytes, end);
            if bytes.get(eq) == Some(&b'=') {
                let value = skip_trivia(bytes, eq + 1);
                found.push(Entry { key, key_start: i, value });
                i = value;
            } else {
                i = end;
            }
            continue;
        }
        match b {
            b'"' => {
                i = skip_string(bytes, i);
                continue;
            }
            b'{' | b'(' => depth += 1,
            b'}' | b')' => depth = depth.saturating_sub(1),
            b';' if depth == 0 => expect_key = true,
            _ => {}
        }
        i += 1;
    }
    found
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Value grammar
// ═══════════════════════════════════════════════════════════════════════════════

/// A property-list value.  Dictionaries keep their entry order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlistValue {
    String(String),
    List(Vec<PlistValue>),
    Dict(Vec<(String, PlistValue)>),
}

impl PlistValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlistValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Dictionary lookup.
    pub fn get(&self, key: &str) -> Option<&PlistValue> {
        match self {
            PlistValue::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Flatten a setting to its tokens: list items in order, or a single
    /// string split shell-style.
    pub fn tokens(&self) -> Vec<String> {
        match self {
            PlistValue::String(s) => split_args(s),
            PlistValue::List(items) => items
                .iter()
                .filter_map(PlistValue::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            PlistValue::Dict(_) => Vec::new(),
        }
    }
}

fn value_parser<'a>() -> impl Parser<'a, &'a str, PlistValue, extra::Err<Simple<'a, char>>> {
    let block_comment = just("/*")
        .then(any().and_is(just("*/").not()).repeated())
        .then(just("*/"))
        .ignored();
    let line_comment = just("//").then(none_of('\n').repeated()).ignored();
    let space = any().filter(|c: &char| c.is_whitespace()).ignored();
    let trivia = choice((space, block_comment, line_comment)).repeated();

    let escape = just('\\').ignore_then(any().map(|c| match c {
        'n' => '\n',
        't' => '\t',
        other => other,
    }));
    let quoted = just('"')
        .ignore_then(none_of("\\\"").or(escape).repeated().collect::<String>())
        .then_ignore(just('"'));
    let bare = any()
        .filter(|c: &char| c.is_ascii() && is_bare_byte(*c as u8))
        .repeated()
        .at_least(1)
        .collect::<String>();
    let string = quoted.or(bare);

    let value = recursive(|value| {
        let item = value.padded_by(trivia.clone());

        let list = item
            .clone()
            .separated_by(just(','))
            .allow_trailing()
            .collect::<Vec<_>>()
            .then_ignore(trivia.clone())
            .delimited_by(just('('), just(')'))
            .map(PlistValue::List);

        let entry = string
            .clone()
            .padded_by(trivia.clone())
            .then_ignore(just('='))
            .then(item)
            .then_ignore(just(';'));
        let dict = entry
            .repeated()
            .collect::<Vec<_>>()
            .then_ignore(trivia.clone())
            .delimited_by(just('{'), just('}'))
            .map(PlistValue::Dict);

        choice((list, dict, string.clone().map(PlistValue::String)))
    });

    trivia.ignore_then(value)
}

/// Read entry `key` from a dictionary body (the text between its braces).
///
/// Only top-level entries match; a key nested inside a sub-dictionary is
/// not found.  An entry whose value does not parse reads as absent.
pub fn field(body: &str, key: &str) -> Option<PlistValue> {
    let entry = entries(body).into_iter().find(|e| e.key == key)?;
    match value_parser().lazy().parse(&body[entry.value..]).into_result() {
        Ok(value) => Some(value),
        Err(errors) => {
            tracing::debug!(key, errors = errors.len(), "unreadable property-list value");
            None
        }
    }
}

/// String value of entry `key`.
pub fn field_str(body: &str, key: &str) -> Option<String> {
    match field(body, key)? {
        PlistValue::String(s) => Some(s),
        _ => None,
    }
}

/// Raw body of a dictionary-valued entry, so its entries can be read one at
/// a time with [`field`].
pub fn dict_body<'a>(body: &'a str, key: &str) -> Option<&'a str> {
    let entry = entries(body).into_iter().find(|e| e.key == key)?;
    if body.as_bytes().get(entry.value) != Some(&b'{') {
        return None;
    }
    let close = matching_close(body, entry.value, body.len())?;
    Some(&body[entry.value + 1..close])
}

/// Object ids listed in a list-valued entry such as `files` or `buildPhases`.
pub fn id_list(body: &str, key: &str) -> Vec<String> {
    field(body, key).map(|v| v.tokens()).unwrap_or_default()
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
