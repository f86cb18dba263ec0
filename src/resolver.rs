//! `${NAME}` / `$ENV{NAME}` resolution over CMake script text.
//!
//! A [`VariableResolver`] owns a variable map, an environment overlay and the
//! identity of the last ingested file.  Variables come from the workspace
//! root passed to [`VariableResolver::initialize`] and from `set()`,
//! `project()` and `option()` statements ingested from CMakeLists-like text.
//!
//! Substitution is whole-string and repeated: each pass replaces every
//! reference it can, and passing stops once a pass replaces nothing or the
//! depth bound is reached.  Because stored values never change during a
//! resolve call, cyclic definitions cannot expand without bound.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use chumsky::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ProjectError;

pub const DEFAULT_MAX_DEPTH: usize = 10;
pub const DEFAULT_BUILD_DIRECTORY: &str = "build";

// ═══════════════════════════════════════════════════════════════════════════════
//  Settings and builder
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolver configuration, usually deserialized from editor settings JSON:
///
/// ```json
/// { "buildDirectory": "out", "environment": { "SDK": "/opt/sdk" }, "maxDepth": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverSettings {
    /// Subdirectory of the workspace root used for the binary-dir variables.
    pub build_directory: String,
    /// Overrides layered on top of the process environment.
    pub environment: BTreeMap<String, String>,
    pub max_depth: usize,
    /// Seed the environment overlay from the process environment.
    pub system_environment: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            build_directory: DEFAULT_BUILD_DIRECTORY.to_string(),
            environment: BTreeMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            system_environment: true,
        }
    }
}

impl ResolverSettings {
    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Builder for a [`VariableResolver`] with a custom environment.
///
/// ```
/// use projconv::resolver::ResolverBuilder;
///
/// let mut resolver = ResolverBuilder::new()
///     .env_var("SDK", "/opt/sdk")
///     .build_directory("out")
///     .build();
/// resolver.initialize(&["/work"]);
/// assert_eq!(resolver.resolve("$ENV{SDK}/include").text, "/opt/sdk/include");
/// assert_eq!(resolver.get("CMAKE_BINARY_DIR"), Some("/work/out"));
/// ```
#[derive(Debug, Clone)]
pub struct ResolverBuilder {
    env: BTreeMap<String, String>,
    system_env: bool,
    build_directory: String,
    max_depth: usize,
}

impl Default for ResolverBuilder {
    fn default() -> Self {
        Self {
            env: BTreeMap::new(),
            system_env: false,
            build_directory: DEFAULT_BUILD_DIRECTORY.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ResolverBuilder {
    /// A builder with an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a variable map into the environment overrides.  Later calls
    /// override earlier values for the same key.
    pub fn env<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env.insert(k.into(), v.into());
        }
        self
    }

    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Seed the environment from the process environment.  Overrides set on
    /// the builder always win over process values.
    pub fn system_env(mut self) -> Self {
        self.system_env = true;
        self
    }

    pub fn build_directory(mut self, name: impl Into<String>) -> Self {
        self.build_directory = name.into();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Apply deserialized settings.
    pub fn settings(mut self, settings: &ResolverSettings) -> Self {
        self.build_directory.clone_from(&settings.build_directory);
        self.max_depth = settings.max_depth;
        self.system_env = settings.system_environment;
        self.env(settings.environment.clone())
    }

    pub fn build(self) -> VariableResolver {
        let mut resolver = VariableResolver {
            variables: BTreeMap::new(),
            environment: HashMap::new(),
            overrides: self.env,
            system_env: self.system_env,
            build_directory: self.build_directory,
            max_depth: self.max_depth,
            current_file: None,
            unresolved: BTreeSet::new(),
        };
        resolver.seed_environment();
        resolver
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Resolver
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of [`VariableResolver::resolve_path`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    /// Substituted text with `/` separators.
    pub text: String,
    /// Names that had no value, each reported once.
    pub unresolved: BTreeSet<String>,
    /// Whether `text` names an existing file or directory.  Relative paths
    /// are probed against `CMAKE_CURRENT_SOURCE_DIR`.
    pub exists: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Variable,
    Environment,
}

#[derive(Debug, Clone)]
pub struct VariableResolver {
    variables: BTreeMap<String, String>,
    environment: HashMap<String, String>,
    overrides: BTreeMap<String, String>,
    system_env: bool,
    build_directory: String,
    max_depth: usize,
    current_file: Option<PathBuf>,
    unresolved: BTreeSet<String>,
}

impl Default for VariableResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

impl VariableResolver {
    /// An empty resolver whose environment overlay mirrors the process
    /// environment.
    pub fn new() -> Self {
        ResolverBuilder::new().system_env().build()
    }

    fn seed_environment(&mut self) {
        self.environment.clear();
        if self.system_env {
            self.environment.extend(std::env::vars_os().filter_map(|(k, v)| {
                Some((k.into_string().ok()?, v.into_string().ok()?))
            }));
        }
        self.environment
            .extend(self.overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Reset, then seed the built-in directory variables from the first
    /// workspace root.  With no roots nothing is seeded.
    pub fn initialize<P: AsRef<Path>>(&mut self, workspace_roots: &[P]) {
        self.clear();
        let Some(root) = workspace_roots.first() else {
            tracing::debug!("no workspace root; directory variables left unset");
            return;
        };

        let source = path_text(root.as_ref()).trim_end_matches('/').to_string();
        let binary = format!("{source}/{}", self.build_directory);
        for name in [
            "CMAKE_SOURCE_DIR",
            "CMAKE_CURRENT_SOURCE_DIR",
            "PROJECT_SOURCE_DIR",
            "CMAKE_CURRENT_LIST_DIR",
        ] {
            self.set(name, source.as_str());
        }
        for name in ["CMAKE_BINARY_DIR", "CMAKE_CURRENT_BINARY_DIR", "PROJECT_BINARY_DIR"] {
            self.set(name, binary.as_str());
        }
    }

    /// Drop every variable, the unresolved set and the current file, and
    /// re-seed the environment overlay.
    pub fn clear(&mut self) {
        self.variables.clear();
        self.unresolved.clear();
        self.current_file = None;
        self.seed_environment();
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn env(&self, name: &str) -> Option<&str> {
        self.environment.get(name).map(String::as_str)
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    pub fn current_file(&self) -> Option<&Path> {
        self.current_file.as_deref()
    }

    /// Every name reported unresolved since the last [`clear`](Self::clear).
    pub fn unresolved(&self) -> &BTreeSet<String> {
        &self.unresolved
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    // ── Ingestion ────────────────────────────────────────────────────────

    /// Read `path`, make it the current file and ingest its statements.
    /// Returns `false`, leaving all state unchanged, when the file cannot be
    /// read.
    pub fn ingest_file(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot ingest file");
                return false;
            }
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            self.set("CMAKE_CURRENT_LIST_DIR", path_text(dir));
        }
        self.parse_content(&text, Some(path));
        true
    }

    /// Ingest `set()`, `project()` and `option()` statements from `text`.
    /// Other commands are ignored.  Returns the number of statements
    /// applied.
    pub fn parse_content(&mut self, text: &str, file: Option<&Path>) -> usize {
        if let Some(file) = file {
            self.current_file = Some(file.to_path_buf());
        }

        let mut applied = 0;
        for command in commands(text) {
            let name = command.name.to_ascii_lowercase();
            if !matches!(name.as_str(), "set" | "project" | "option") {
                continue;
            }
            let args = match arguments_parser().parse(command.args).into_result() {
                Ok(args) => args,
                Err(_) => {
                    tracing::debug!(command = command.name, "unparseable arguments");
                    continue;
                }
            };
            let ok = match name.as_str() {
                "set" => self.apply_set(&args),
                "project" => self.apply_project(&args),
                _ => self.apply_option(&args),
            };
            if ok {
                applied += 1;
            }
        }
        applied
    }

    /// Expand against the current variables without reporting.
    fn expand(&self, text: &str) -> String {
        let mut ignored = BTreeSet::new();
        self.substitute(text, self.max_depth, &mut ignored)
    }

    fn apply_set(&mut self, args: &[String]) -> bool {
        let Some((name, values)) = args.split_first() else {
            return false;
        };
        let name = self.expand(name);
        let values: Vec<&str> = values
            .iter()
            .map(String::as_str)
            .take_while(|v| !matches!(*v, "CACHE" | "PARENT_SCOPE"))
            .collect();

        if let Some(env) = name.strip_prefix("ENV{").and_then(|n| n.strip_suffix('}')) {
            let value = self.expand(&values.join(";"));
            self.environment.insert(env.to_string(), value);
            return true;
        }
        if values.is_empty() {
            self.variables.remove(&name);
        } else {
            let value = self.expand(&values.join(";"));
            self.variables.insert(name, value);
        }
        true
    }

    fn apply_project(&mut self, args: &[String]) -> bool {
        let Some(name) = args.first() else {
            return false;
        };
        let name = self.expand(name);

        let source_dir = self.get("CMAKE_CURRENT_SOURCE_DIR").map(String::from).or_else(|| {
            self.current_file
                .as_deref()
                .and_then(Path::parent)
                .filter(|d| !d.as_os_str().is_empty())
                .map(path_text)
        });
        let binary_dir = self.get("CMAKE_CURRENT_BINARY_DIR").map(String::from);

        self.set("PROJECT_NAME", name.as_str());
        if !self.variables.contains_key("CMAKE_PROJECT_NAME") {
            self.set("CMAKE_PROJECT_NAME", name.as_str());
        }
        if let Some(dir) = source_dir {
            self.set(format!("{name}_SOURCE_DIR"), dir.as_str());
            self.set("PROJECT_SOURCE_DIR", dir);
        }
        if let Some(dir) = binary_dir {
            self.set(format!("{name}_BINARY_DIR"), dir.as_str());
            self.set("PROJECT_BINARY_DIR", dir);
        }
        let version = args.iter().position(|a| a == "VERSION").and_then(|i| args.get(i + 1));
        if let Some(version) = version {
            let version = self.expand(version);
            self.set(format!("{name}_VERSION"), version.as_str());
            self.set("PROJECT_VERSION", version);
        }
        true
    }

    fn apply_option(&mut self, args: &[String]) -> bool {
        let Some(name) = args.first() else {
            return false;
        };
        let name = self.expand(name);
        if self.variables.contains_key(&name) {
            return true;
        }
        let value = args.get(2).map(|v| self.expand(v)).unwrap_or_else(|| "OFF".to_string());
        self.variables.insert(name, value);
        true
    }

    // ── Resolution ───────────────────────────────────────────────────────

    /// [`resolve_path`](Self::resolve_path) with the configured depth.
    pub fn resolve(&mut self, text: &str) -> ResolvedPath {
        self.resolve_path(text, self.max_depth)
    }

    /// Substitute references for up to `max_depth` passes, normalize
    /// separators and probe the result once.
    pub fn resolve_path(&mut self, text: &str, max_depth: usize) -> ResolvedPath {
        let mut unresolved = BTreeSet::new();
        let resolved = self.substitute(text, max_depth, &mut unresolved).replace('\\', "/");
        let exists = self.probe(&resolved);
        self.unresolved.extend(unresolved.iter().cloned());
        ResolvedPath { text: resolved, unresolved, exists }
    }

    fn substitute(&self, text: &str, max_depth: usize, unresolved: &mut BTreeSet<String>) -> String {
        let mut current = text.to_string();
        for pass in 0..max_depth {
            let (next, replaced) = self.substitute_once(&current, unresolved);
            current = next;
            if replaced == 0 {
                break;
            }
            if pass + 1 == max_depth {
                tracing::debug!(max_depth, "substitution pass bound reached");
            }
        }
        current
    }

    fn substitute_once(&self, text: &str, unresolved: &mut BTreeSet<String>) -> (String, usize) {
        let mut out = String::with_capacity(text.len());
        let mut replaced = 0;
        let mut rest = text;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            let Some((namespace, name, len)) = reference_at(tail) else {
                out.push('$');
                rest = &tail[1..];
                continue;
            };
            let value = match namespace {
                Namespace::Variable => self.variables.get(name),
                Namespace::Environment => self.environment.get(name),
            };
            match value {
                Some(value) => {
                    out.push_str(value);
                    replaced += 1;
                }
                None => {
                    unresolved.insert(name.to_string());
                    out.push_str(&tail[..len]);
                }
            }
            rest = &tail[len..];
        }
        out.push_str(rest);
        (out, replaced)
    }

    fn probe(&self, path: &str) -> bool {
        if path.is_empty() {
            return false;
        }
        let candidate = Path::new(path);
        let full = match self.get("CMAKE_CURRENT_SOURCE_DIR") {
            Some(dir) if candidate.is_relative() => Path::new(dir).join(candidate),
            _ => candidate.to_path_buf(),
        };
        full.try_exists().unwrap_or(false)
    }
}

/// Recognize `${NAME}` or `$ENV{NAME}` at the start of `text`.  The name
/// may not contain `$`, `{` or `}`, so in `${A_${B}}` only the inner
/// reference matches.  Returns the namespace, the name and the reference
/// length.
fn reference_at(text: &str) -> Option<(Namespace, &str, usize)> {
    let (namespace, open) = if text.starts_with("${") {
        (Namespace::Variable, 2)
    } else if text.starts_with("$ENV{") {
        (Namespace::Environment, 5)
    } else {
        return None;
    };
    let body = &text[open..];
    let end = body.find(['}', '{', '$'])?;
    if end == 0 || !body[end..].starts_with('}') {
        return None;
    }
    Some((namespace, &body[..end], open + end + 1))
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Command scanning
// ═══════════════════════════════════════════════════════════════════════════════

/// `name(args)` with `args` the raw text between the parentheses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Command<'a> {
    name: &'a str,
    args: &'a str,
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |p| from + p)
}

/// End of a `#` comment starting at `from`: a bracket comment runs to its
/// `]]`, any other to the end of the line.
fn comment_end(text: &str, from: usize) -> usize {
    if text[from..].starts_with("#[[") {
        if let Some(p) = text[from + 3..].find("]]") {
            return from + 3 + p + 2;
        }
    }
    line_end(text, from)
}

/// Index of the `)` closing the `(` at `open`, skipping quoted arguments,
/// bracket arguments and comments.
fn closing_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'#' => {
                i = comment_end(text, i);
                continue;
            }
            b'[' if bytes.get(i + 1) == Some(&b'[') => {
                i += text[i..].find("]]")? + 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Command invocations in document order.  Scanning stops at a command
/// whose argument list is not closed.
fn commands(text: &str) -> Vec<Command<'_>> {
    let bytes = text.as_bytes();
    let mut found = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'#' {
            i = comment_end(text, i);
            continue;
        }
        if !(b.is_ascii_alphabetic() || b == b'_') {
            i += 1;
            continue;
        }

        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
        let name = &text[start..i];
        let mut open = i;
        while open < bytes.len() && matches!(bytes[open], b' ' | b'\t') {
            open += 1;
        }
        if bytes.get(open) != Some(&b'(') {
            continue;
        }
        let Some(close) = closing_paren(text, open) else {
            tracing::debug!(command = name, "unterminated command");
            break;
        };
        found.push(Command { name, args: &text[open + 1..close] });
        i = close + 1;
    }
    found
}

/// CMake argument list: bracket, quoted and unquoted arguments separated by
/// whitespace and line comments.
fn arguments_parser<'a>() -> impl Parser<'a, &'a str, Vec<String>, extra::Err<Simple<'a, char>>> {
    let line_comment = just('#').then(none_of('\n').repeated()).ignored();
    let space = any().filter(|c: &char| c.is_whitespace()).ignored();
    let trivia = choice((space, line_comment)).repeated();

    let escape = just('\\').ignore_then(any().map(|c| match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }));
    let quoted = just('"')
        .ignore_then(none_of("\\\"").or(escape).repeated().collect::<String>())
        .then_ignore(just('"'));
    let bracket = just("[[")
        .ignore_then(any().and_is(just("]]").not()).repeated().to_slice())
        .then_ignore(just("]]"))
        .map(String::from);
    let paren = one_of("()").map(String::from);
    let unquoted = none_of("()\"#")
        .filter(|c: &char| !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .map(String::from);

    let argument = choice((bracket, quoted, paren, unquoted));
    trivia
        .clone()
        .ignore_then(argument.then_ignore(trivia).repeated().collect::<Vec<_>>())
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn isolated() -> VariableResolver {
        ResolverBuilder::new().build()
    }

    fn names(pairs: &[&str]) -> BTreeSet<String> {
        pairs.iter().map(|s| s.to_string()).collect()
    }

    // ── Substitution ─────────────────────────────────────────────────────

    #[test]
    fn cyclic_definitions_terminate() {
        let mut r = isolated();
        r.set("A", "${B}");
        r.set("B", "${A}");
        let resolved = r.resolve_path("${A}", DEFAULT_MAX_DEPTH);
        assert!(resolved.text == "${A}" || resolved.text == "${B}");
        assert!(resolved.unresolved.is_empty());
    }

    #[test]
    fn self_reference_is_bounded() {
        let mut r = isolated();
        r.set("A", "x${A}");
        let resolved = r.resolve_path("${A}", 3);
        assert_eq!(resolved.text, "xxx${A}");
    }

    #[test]
    fn depth_zero_returns_input() {
        let mut r = isolated();
        r.set("ROOT", "/work");
        assert_eq!(r.resolve_path("${ROOT}", 0).text, "${ROOT}");
    }

    #[test]
    fn unresolved_names_are_reported_once() {
        let mut r = isolated();
        let resolved = r.resolve("${X}/${X}");
        assert_eq!(resolved.text, "${X}/${X}");
        assert_eq!(resolved.unresolved, names(&["X"]));
        assert!(!resolved.exists);
        assert!(r.unresolved().contains("X"));
    }

    #[test]
    fn nested_references_resolve_inside_out() {
        let mut r = isolated();
        r.set("KIND", "debug");
        r.set("DIR_debug", "/out/debug");
        assert_eq!(r.resolve("${DIR_${KIND}}/bin").text, "/out/debug/bin");
    }

    #[test]
    fn environment_overlay() {
        let mut r = ResolverBuilder::new()
            .env([("SDK", "/opt/sdk")])
            .env_var("SDK", "/opt/sdk2")
            .build();
        let resolved = r.resolve("$ENV{SDK}/include:$ENV{PROJCONV_SURELY_UNSET}");
        assert_eq!(resolved.text, "/opt/sdk2/include:$ENV{PROJCONV_SURELY_UNSET}");
        assert_eq!(resolved.unresolved, names(&["PROJCONV_SURELY_UNSET"]));
    }

    #[test]
    fn separators_are_normalized() {
        let mut r = isolated();
        r.set("SDK", r"C:\sdk");
        assert_eq!(r.resolve(r"${SDK}\include").text, "C:/sdk/include");
    }

    #[test]
    fn stray_dollars_are_kept() {
        let mut r = isolated();
        assert_eq!(r.resolve("$$ ${} $ENV ${A").text, "$$ ${} $ENV ${A");
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    #[test]
    fn initialize_seeds_directory_variables() {
        let mut r = isolated();
        r.initialize(&["/work/app/"]);
        assert_eq!(r.get("CMAKE_SOURCE_DIR"), Some("/work/app"));
        assert_eq!(r.get("CMAKE_CURRENT_LIST_DIR"), Some("/work/app"));
        assert_eq!(r.get("PROJECT_BINARY_DIR"), Some("/work/app/build"));
        assert_eq!(r.variables().len(), 7);

        r.initialize::<&str>(&[]);
        assert!(r.variables().is_empty());
    }

    #[test]
    fn clear_resets_state() {
        let mut r = isolated();
        r.parse_content("set(A 1)", Some(Path::new("CMakeLists.txt")));
        r.resolve("${MISSING}");
        r.clear();
        assert!(r.variables().is_empty());
        assert!(r.unresolved().is_empty());
        assert_eq!(r.current_file(), None);
    }

    #[test]
    fn clear_reseeds_environment() {
        let mut r = ResolverBuilder::new().env_var("K", "v").build();
        r.parse_content("set(ENV{K} changed)", None);
        assert_eq!(r.env("K"), Some("changed"));
        r.clear();
        assert_eq!(r.env("K"), Some("v"));
    }

    #[test]
    fn missing_file_leaves_state_unchanged() {
        let mut r = isolated();
        r.set("KEEP", "1");
        assert!(!r.ingest_file("does/not/exist/CMakeLists.txt"));
        assert_eq!(r.variables().len(), 1);
        assert_eq!(r.current_file(), None);
    }

    // ── Statements ───────────────────────────────────────────────────────

    #[test]
    fn set_statements() {
        let mut r = isolated();
        let applied = r.parse_content(
            r#"
            set(A one)
            set(LIST a b
                c)   # trailing comment
            set(Q "x \"y\" ${A}")
            set(C cached CACHE STRING "doc" FORCE)
            set(P parent PARENT_SCOPE)
            # set(IGNORED 1)
            set(B [[raw value]])
            set(GONE 1)
            set(GONE)
            "#,
            None,
        );
        assert_eq!(applied, 8);
        assert_eq!(r.get("A"), Some("one"));
        assert_eq!(r.get("LIST"), Some("a;b;c"));
        assert_eq!(r.get("Q"), Some("x \"y\" one"));
        assert_eq!(r.get("C"), Some("cached"));
        assert_eq!(r.get("P"), Some("parent"));
        assert_eq!(r.get("IGNORED"), None);
        assert_eq!(r.get("B"), Some("raw value"));
        assert_eq!(r.get("GONE"), None);
    }

    #[test]
    fn option_defaults_and_never_overwrites() {
        let mut r = isolated();
        r.parse_content("set(X ON)\noption(X \"doc\" OFF)\noption(Y \"doc\")\nOPTION(Z \"doc\" ON)", None);
        assert_eq!(r.get("X"), Some("ON"));
        assert_eq!(r.get("Y"), Some("OFF"));
        assert_eq!(r.get("Z"), Some("ON"));
    }

    #[test]
    fn project_without_directories() {
        let mut r = isolated();
        r.parse_content("project(First)\nproject(Second VERSION 2.0)", None);
        assert_eq!(r.get("PROJECT_NAME"), Some("Second"));
        assert_eq!(r.get("CMAKE_PROJECT_NAME"), Some("First"));
        assert_eq!(r.get("Second_VERSION"), Some("2.0"));
        assert_eq!(r.get("Second_SOURCE_DIR"), None);
    }

    #[test]
    fn unterminated_statement_stops_scanning() {
        let mut r = isolated();
        assert_eq!(r.parse_content("set(A 1)\nset(B 2", None), 1);
        assert_eq!(r.get("B"), None);
    }

    #[test]
    fn command_scanner_skips_comments_and_strings() {
        let found = commands("#[[ set(X 1)\n]]\nfoo (\"a)b\" # )\n)\nbar");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "foo");
        assert_eq!(found[0].args, "\"a)b\" # )\n");
    }

    #[test]
    fn example_file() {
        let mut r = ResolverBuilder::new().env_var("DEMO_TOOLS", "/opt/tools").build();
        r.initialize(&["/work/demo"]);
        assert!(r.ingest_file("example.cmake"));

        assert_eq!(r.current_file(), Some(Path::new("example.cmake")));
        assert_eq!(r.get("PROJECT_NAME"), Some("Demo"));
        assert_eq!(r.get("Demo_SOURCE_DIR"), Some("/work/demo"));
        assert_eq!(r.get("Demo_BINARY_DIR"), Some("/work/demo/build"));
        assert_eq!(r.get("PROJECT_VERSION"), Some("1.4.0"));
        assert_eq!(r.get("SRC_DIR"), Some("/work/demo/src"));
        assert_eq!(r.get("GENERATED_DIR"), Some("/work/demo/build/generated"));
        assert_eq!(r.get("DEMO_SOURCES"), Some("/work/demo/src/main.cpp;/work/demo/src/app.cpp"));
        assert_eq!(r.get("DEMO_WITH_TESTS"), Some("ON"));
        assert_eq!(r.get("DEMO_STATIC"), Some("OFF"));
        assert_eq!(r.get("TOOLS_DIR"), Some("/opt/tools/bin"));
        assert_eq!(r.get("OUTPUT_NAME"), Some("Demo-1.4.0"));

        let resolved = r.resolve("${SRC_DIR}/main.cpp");
        assert_eq!(resolved.text, "/work/demo/src/main.cpp");
        assert!(resolved.unresolved.is_empty());
    }

    #[test]
    fn existence_probe() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("CMakeLists.txt"), "project(Probe)\n").unwrap();

        let mut r = isolated();
        r.initialize(&[dir.path()]);
        assert!(r.resolve("${CMAKE_SOURCE_DIR}/CMakeLists.txt").exists);
        assert!(r.resolve("CMakeLists.txt").exists);
        assert!(!r.resolve("${CMAKE_SOURCE_DIR}/missing.txt").exists);
        assert!(!r.resolve("").exists);
    }

    #[test]
    fn ingest_sets_current_list_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("CMakeLists.txt");
        std::fs::write(&file, "project(Probe)\nset(HERE ${CMAKE_CURRENT_LIST_DIR})\n").unwrap();

        let mut r = isolated();
        assert!(r.ingest_file(&file));
        let expected = path_text(dir.path());
        assert_eq!(r.get("HERE"), Some(expected.as_str()));
        assert_eq!(r.get("Probe_SOURCE_DIR"), Some(expected.as_str()));
        assert_eq!(r.current_file(), Some(file.as_path()));
    }

    // ── Settings ─────────────────────────────────────────────────────────

    #[test]
    fn settings_from_json() {
        let settings = ResolverSettings::from_json(
            r#"{ "buildDirectory": "out", "environment": { "K": "V" }, "maxDepth": 3, "systemEnvironment": false }"#,
        )
        .unwrap();
        assert_eq!(settings.build_directory, "out");
        assert_eq!(settings.max_depth, 3);

        let mut r = ResolverBuilder::new().settings(&settings).build();
        r.initialize(&["/w"]);
        assert_eq!(r.get("CMAKE_BINARY_DIR"), Some("/w/out"));
        assert_eq!(r.env("K"), Some("V"));
        assert_eq!(r.max_depth(), 3);
    }

    #[test]
    fn settings_defaults_and_errors() {
        let settings = ResolverSettings::from_json("{}").unwrap();
        assert_eq!(settings, ResolverSettings::default());
        assert!(settings.system_environment);
        assert!(matches!(
            ResolverSettings::from_json("{ \"maxDepth\": \"deep\" }"),
            Err(ProjectError::Settings(_))
        ));
    }
}
