//! Visual Studio `.vcxproj` descriptor parser.
//!
//! The MSBuild XML is scanned as semi-structured text rather than loaded into
//! a document tree: group elements are located by tag, each group is read
//! with the same field extractors, and values are normalized on the way into
//! the [`ProjectModel`] (`;`-lists split, `%(Field)` placeholders dropped,
//! entities decoded).  Individual item elements are small and self-contained,
//! so those fragments are read with `roxmltree`.
//!
//! Parsing never fails.  A field that cannot be found is simply left absent.

use std::collections::BTreeSet;
use std::path::Path;

use crate::args::split_args;
use crate::condition::configuration_selector;
use crate::error::ProjectError;
use crate::model::{
    BuildEvent, BuildEventKind, CharacterSet, ConfigOverrides, PchConfig, ProjectModel,
    Subsystem, TargetKind, UniqueList, is_inheritance_placeholder, normalize_path,
};

/// MSBuild macros with a direct CMake counterpart, applied to paths.
const MSBUILD_PATH_MACROS: &[(&str, &str)] = &[
    ("$(ProjectDir)", "${CMAKE_CURRENT_SOURCE_DIR}/"),
    ("$(MSBuildProjectDirectory)", "${CMAKE_CURRENT_SOURCE_DIR}"),
    ("$(MSBuildThisFileDirectory)", "${CMAKE_CURRENT_SOURCE_DIR}/"),
    ("$(SolutionDir)", "${CMAKE_SOURCE_DIR}/"),
    ("$(OutDir)", "${CMAKE_CURRENT_BINARY_DIR}/"),
    ("$(IntDir)", "${CMAKE_CURRENT_BINARY_DIR}/"),
    ("$(Configuration)", "$<CONFIG>"),
    ("$(ProjectName)", "${PROJECT_NAME}"),
];

// ═══════════════════════════════════════════════════════════════════════════════
//  Entry points
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse `.vcxproj` text into a [`ProjectModel`].
///
/// `fallback_name` names the project when neither `<ProjectName>` nor
/// `<RootNamespace>` is present (typically the file stem).
pub fn parse(text: &str, fallback_name: &str) -> ProjectModel {
    let mut model = ProjectModel::new(fallback_name);
    let mut pch = PchScan::default();

    read_property_groups(text, &mut model);
    read_definition_groups(text, &mut model, &mut pch);
    read_item_groups(text, &mut model, &mut pch);

    // Declared configurations without any definition group still take part
    // in hoisting, so nothing is promoted that one of them lacks.
    for include in elements(text, "ProjectConfiguration")
        .iter()
        .filter_map(|e| attribute(e.attrs, "Include"))
    {
        if let Some(name) = include.split('|').next().map(str::trim).filter(|n| !n.is_empty()) {
            model.configurations.entry(name.to_string()).or_default();
        }
    }
    model.hoist_shared_settings();

    model.pch = pch.finish();
    tracing::debug!(
        name = %model.name,
        sources = model.source_files.len(),
        configurations = model.configurations.len(),
        "parsed vcxproj"
    );
    model
}

/// Read and parse a `.vcxproj` file; the file stem is the fallback name.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ProjectModel, ProjectError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("project");
    Ok(parse(&text, stem))
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Property groups – project globals
// ═══════════════════════════════════════════════════════════════════════════════

fn read_property_groups(text: &str, model: &mut ProjectModel) {
    let mut project_name = None;
    let mut root_namespace = None;
    let mut configuration_type = None;

    for group in elements(text, "PropertyGroup") {
        let Some(body) = group.body else { continue };

        first_set(&mut project_name, child_text(body, "ProjectName"));
        first_set(&mut root_namespace, child_text(body, "RootNamespace"));
        first_set(&mut configuration_type, child_text(body, "ConfigurationType"));

        let platform = &mut model.platform;
        first_set(&mut platform.sdk_version, child_text(body, "WindowsTargetPlatformVersion"));
        first_set(&mut platform.toolset, child_text(body, "PlatformToolset"));
        if platform.character_set.is_none() {
            platform.character_set = child_text(body, "CharacterSet").and_then(|v| character_set(&v));
        }
    }

    if let Some(name) = project_name.or(root_namespace) {
        model.name = name;
    }
    if let Some(kind) = configuration_type {
        model.kind = target_kind(&kind);
    }
}

fn first_set(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn target_kind(value: &str) -> TargetKind {
    match value {
        "Application" => TargetKind::Application,
        "StaticLibrary" => TargetKind::StaticLibrary,
        "DynamicLibrary" => TargetKind::DynamicLibrary,
        other => {
            tracing::debug!(configuration_type = other, "treating as application");
            TargetKind::Application
        }
    }
}

fn character_set(value: &str) -> Option<CharacterSet> {
    match value {
        "Unicode" => Some(CharacterSet::Unicode),
        "MultiByte" => Some(CharacterSet::MultiByte),
        "NotSet" => Some(CharacterSet::NotSet),
        _ => None,
    }
}

fn subsystem(value: &str) -> Option<Subsystem> {
    match value {
        "Console" => Some(Subsystem::Console),
        "Windows" => Some(Subsystem::Windows),
        _ => None,
    }
}

/// `LanguageStandard` → C++ standard number.  `stdcpplatest` is pinned to
/// the newest standard known here.
pub fn cxx_standard(value: &str) -> Option<u32> {
    match value {
        "stdcpp14" => Some(14),
        "stdcpp17" => Some(17),
        "stdcpp20" => Some(20),
        "stdcpp23" => Some(23),
        "stdcpplatest" => Some(23),
        _ => None,
    }
}

/// `LanguageStandard_C` → C standard number.
pub fn c_standard(value: &str) -> Option<u32> {
    match value {
        "stdc11" => Some(11),
        "stdc17" => Some(17),
        "stdclatest" => Some(17),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Item definition groups – global and per-configuration settings
// ═══════════════════════════════════════════════════════════════════════════════

/// Precompiled-header evidence gathered across the whole file.
#[derive(Debug, Default)]
struct PchScan {
    use_seen: bool,
    create_seen: bool,
    header: Option<String>,
    source: Option<String>,
    excluded: BTreeSet<String>,
}

impl PchScan {
    /// The first header found wins; later findings are ignored.
    fn offer_header(&mut self, header: &str) {
        if self.header.is_none() {
            self.header = Some(header.to_string());
        }
    }

    fn finish(self) -> Option<PchConfig> {
        if !self.use_seen && !self.create_seen {
            return None;
        }
        Some(PchConfig {
            enabled: self.use_seen,
            header: self.header,
            source: self.source,
            excluded: self.excluded,
        })
    }
}

/// Everything one `ItemDefinitionGroup` contributes.
#[derive(Debug, Default)]
struct GroupSettings {
    overrides: ConfigOverrides,
    subsystem: Option<Subsystem>,
    events: Vec<BuildEvent>,
}

fn read_definition_groups(text: &str, model: &mut ProjectModel, pch: &mut PchScan) {
    for group in elements(text, "ItemDefinitionGroup") {
        let Some(body) = group.body else { continue };

        let configuration = match attribute(group.attrs, "Condition") {
            None => None,
            Some(condition) => match configuration_selector(&condition) {
                Some(selector) => Some(selector.configuration),
                None => {
                    tracing::debug!(%condition, "skipping group with unrecognized condition");
                    continue;
                }
            },
        };

        let settings = scan_group(body, configuration.as_deref(), pch);

        if model.platform.subsystem.is_none() {
            model.platform.subsystem = settings.subsystem;
        }
        model.build_events.extend(settings.events);

        match configuration {
            None => apply_global(model, settings.overrides),
            Some(name) => model
                .configurations
                .entry(name)
                .or_default()
                .absorb(&settings.overrides),
        }
    }
}

/// Extract every supported field from one group body.  Shared by the
/// unconditioned and the per-configuration groups.
fn scan_group(body: &str, configuration: Option<&str>, pch: &mut PchScan) -> GroupSettings {
    let mut settings = GroupSettings::default();
    let o = &mut settings.overrides;

    if let Some(cl) = first_body(body, "ClCompile") {
        o.include_dirs = path_list(cl, "AdditionalIncludeDirectories");
        o.definitions = plain_list(cl, "PreprocessorDefinitions");
        o.compile_options = option_list(cl, "AdditionalOptions");
        o.cxx_standard = child_text(cl, "LanguageStandard").and_then(|v| cxx_standard(&v));
        o.c_standard = child_text(cl, "LanguageStandard_C").and_then(|v| c_standard(&v));
        o.runtime_library = child_text(cl, "RuntimeLibrary");
        o.optimization = child_text(cl, "Optimization");
        o.warning_level = child_text(cl, "WarningLevel");
        o.treat_warnings_as_errors =
            child_text(cl, "TreatWarningAsError").map(|v| v.eq_ignore_ascii_case("true"));

        match child_text(cl, "PrecompiledHeader").as_deref() {
            Some("Use") => pch.use_seen = true,
            Some("Create") => pch.create_seen = true,
            _ => {}
        }
        if let Some(header) = child_text(cl, "PrecompiledHeaderFile") {
            let header = normalize_path(&header, MSBUILD_PATH_MACROS);
            pch.offer_header(&header);
            if configuration.is_some() {
                o.pch_header = Some(header);
            }
        }
    }

    for linker in ["Link", "Lib"] {
        let Some(link) = first_body(body, linker) else { continue };
        if let Some(libs) = child_text(link, "AdditionalDependencies") {
            let libs: UniqueList = split_list(&libs).map(strip_lib_suffix).collect();
            if !libs.is_empty() {
                o.link_libraries.get_or_insert_with(UniqueList::new).extend(libs.iter());
            }
        }
        if let Some(dirs) = path_list(link, "AdditionalLibraryDirectories") {
            o.library_dirs.get_or_insert_with(UniqueList::new).extend(dirs.iter());
        }
        if let Some(options) = option_list(link, "AdditionalOptions") {
            o.link_options.get_or_insert_with(UniqueList::new).extend(options.iter());
        }
        if settings.subsystem.is_none() {
            settings.subsystem = child_text(link, "SubSystem").and_then(|v| subsystem(&v));
        }
    }

    for kind in BuildEventKind::ALL {
        if let Some(event) = first_body(body, kind.msbuild_tag())
            .and_then(|block| read_event(block, kind, configuration))
        {
            settings.events.push(event);
        }
    }

    settings
}

fn read_event(block: &str, kind: BuildEventKind, configuration: Option<&str>) -> Option<BuildEvent> {
    let command = child_text(block, "Command")?.replace("\r\n", "\n");
    let outputs = match kind {
        BuildEventKind::CustomBuild => child_text(block, "Outputs")
            .map(|o| {
                split_list(&o)
                    .map(|p| normalize_path(p, MSBUILD_PATH_MACROS))
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    let enabled = child_text(block, "UseInBuild").is_none_or(|v| !v.eq_ignore_ascii_case("false"));

    Some(BuildEvent {
        kind,
        command,
        message: child_text(block, "Message"),
        outputs,
        configuration: configuration.map(String::from),
        enabled,
    })
}

/// Unconditioned values land on the model itself.  Lists accumulate;
/// scalars keep the first value seen.
fn apply_global(model: &mut ProjectModel, o: ConfigOverrides) {
    fn add(list: &mut UniqueList, items: Option<UniqueList>) {
        if let Some(items) = items {
            list.extend(items.iter());
        }
    }
    fn keep<T>(slot: &mut Option<T>, value: Option<T>) {
        if slot.is_none() {
            *slot = value;
        }
    }

    add(&mut model.include_dirs, o.include_dirs);
    add(&mut model.definitions, o.definitions);
    add(&mut model.link_libraries, o.link_libraries);
    add(&mut model.library_dirs, o.library_dirs);
    add(&mut model.compile_options, o.compile_options);
    add(&mut model.link_options, o.link_options);
    keep(&mut model.c_standard, o.c_standard);
    keep(&mut model.cxx_standard, o.cxx_standard);
    keep(&mut model.runtime_library, o.runtime_library);
    keep(&mut model.optimization, o.optimization);
    keep(&mut model.warning_level, o.warning_level);
    keep(&mut model.treat_warnings_as_errors, o.treat_warnings_as_errors);
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Item groups – files, per-file PCH settings, project references
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Source,
    Header,
    Resource,
    Other,
    Reference,
}

const ITEM_TAGS: &[(&str, ItemKind)] = &[
    ("ClCompile", ItemKind::Source),
    ("ClInclude", ItemKind::Header),
    ("ResourceCompile", ItemKind::Resource),
    ("None", ItemKind::Other),
    ("Text", ItemKind::Other),
    ("Image", ItemKind::Other),
    ("ProjectReference", ItemKind::Reference),
];

/// One item element read from its fragment.
#[derive(Debug)]
struct Item {
    include: String,
    /// `(metadata name, has Condition attribute, text)`.
    metadata: Vec<(String, bool, String)>,
}

impl Item {
    fn values<'s>(&'s self, name: &'s str) -> impl Iterator<Item = (bool, &'s str)> + 's {
        self.metadata
            .iter()
            .filter(move |(n, _, _)| n == name)
            .map(|(_, conditioned, v)| (*conditioned, v.as_str()))
    }
}

fn read_item(raw: &str) -> Option<Item> {
    let doc = match roxmltree::Document::parse(raw) {
        Ok(doc) => doc,
        Err(error) => {
            tracing::debug!(%error, "skipping unreadable item element");
            return None;
        }
    };
    let root = doc.root_element();
    let include = root.attribute("Include")?.to_string();
    let metadata = root
        .children()
        .filter(|n| n.is_element())
        .map(|n| {
            (
                n.tag_name().name().to_string(),
                n.attribute("Condition").is_some(),
                n.text().unwrap_or("").trim().to_string(),
            )
        })
        .collect();
    Some(Item { include, metadata })
}

fn read_item_groups(text: &str, model: &mut ProjectModel, pch: &mut PchScan) {
    for group in elements(text, "ItemGroup") {
        let Some(body) = group.body else { continue };
        for &(tag, kind) in ITEM_TAGS {
            for element in elements(body, tag) {
                let Some(item) = read_item(element.raw) else { continue };
                for path in split_list(&item.include) {
                    let path = normalize_path(path, MSBUILD_PATH_MACROS);
                    add_item(model, pch, kind, &item, path);
                }
            }
        }
    }
}

fn add_item(model: &mut ProjectModel, pch: &mut PchScan, kind: ItemKind, item: &Item, path: String) {
    match kind {
        ItemKind::Source => {
            for (_, value) in item.values("PrecompiledHeader") {
                match value {
                    "Create" => {
                        pch.create_seen = true;
                        if pch.source.is_none() {
                            pch.source = Some(path.clone());
                        }
                    }
                    "NotUsing" => {
                        pch.excluded.insert(path.clone());
                    }
                    _ => {}
                }
            }
            if let Some((_, header)) = item.values("PrecompiledHeaderFile").next() {
                pch.offer_header(&normalize_path(header, MSBUILD_PATH_MACROS));
            }
            let excluded = item
                .values("ExcludedFromBuild")
                .any(|(conditioned, v)| !conditioned && v.eq_ignore_ascii_case("true"));
            if excluded {
                model.other_files.push(path);
            } else {
                model.source_files.push(path);
            }
        }
        ItemKind::Header => {
            model.header_files.push(path);
        }
        ItemKind::Resource => {
            model.resource_files.push(path);
        }
        ItemKind::Other => {
            model.other_files.push(path);
        }
        ItemKind::Reference => {
            if let Some(stem) = Path::new(&path).file_stem().and_then(|s| s.to_str()) {
                model.dependencies.push(stem);
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Field extraction
// ═══════════════════════════════════════════════════════════════════════════════

/// `;`-separated list entries, trimmed, without placeholders or blanks.
fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(';')
        .map(str::trim)
        .filter(|t| !t.is_empty() && !is_inheritance_placeholder(t))
}

fn plain_list(span: &str, tag: &str) -> Option<UniqueList> {
    let list: UniqueList = split_list(&child_text(span, tag)?).collect();
    (!list.is_empty()).then_some(list)
}

fn path_list(span: &str, tag: &str) -> Option<UniqueList> {
    let list: UniqueList = split_list(&child_text(span, tag)?)
        .map(|p| normalize_path(p, MSBUILD_PATH_MACROS))
        .collect();
    (!list.is_empty()).then_some(list)
}

fn option_list(span: &str, tag: &str) -> Option<UniqueList> {
    let list: UniqueList = split_args(&child_text(span, tag)?)
        .into_iter()
        .filter(|t| !is_inheritance_placeholder(t))
        .collect();
    (!list.is_empty()).then_some(list)
}

fn strip_lib_suffix(name: &str) -> String {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".lib") {
        name[..len - 4].to_string()
    } else {
        name.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Text scanning
// ═══════════════════════════════════════════════════════════════════════════════

/// One `<Tag …>…</Tag>` or `<Tag …/>` occurrence.
#[derive(Debug, Clone, Copy)]
struct Element<'a> {
    attrs: &'a str,
    /// `None` for the self-closing form.
    body: Option<&'a str>,
    raw: &'a str,
}

fn is_name_end(c: Option<char>) -> bool {
    matches!(c, Some(' ' | '\t' | '\r' | '\n' | '>' | '/'))
}

/// Index of the `>` closing a start tag, skipping quoted attribute values.
fn start_tag_end(text: &str, from: usize) -> Option<usize> {
    let mut quote = None;
    for (i, b) in text.as_bytes()[from..].iter().copied().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => return Some(from + i),
            None => {}
        }
    }
    None
}

/// Find the start index of the `close` tag matching an already-open element,
/// accounting for nested elements of the same name.
fn matching_close(text: &str, from: usize, open: &str, close: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut pos = from;
    loop {
        let close_at = pos + text[pos..].find(close)?;
        let mut scan = pos;
        while let Some(rel) = text[scan..close_at].find(open) {
            let start = scan + rel;
            let after = start + open.len();
            scan = after;
            if !is_name_end(text[after..].chars().next()) {
                continue;
            }
            if let Some(gt) = start_tag_end(text, after).filter(|&gt| gt < close_at) {
                if !text[..gt].ends_with('/') {
                    depth += 1;
                }
                scan = gt + 1;
            }
        }
        depth -= 1;
        if depth == 0 {
            return Some(close_at);
        }
        pos = close_at + close.len();
    }
}

/// Every `tag` element in `text`, in document order.  Elements nested in a
/// matched element of the same name are part of that element's body.
fn elements<'a>(text: &'a str, tag: &str) -> Vec<Element<'a>> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(rel) = text[pos..].find(&open) {
        let start = pos + rel;
        let after = start + open.len();
        if !is_name_end(text[after..].chars().next()) {
            pos = after;
            continue;
        }
        let Some(gt) = start_tag_end(text, after) else { break };

        if text[..gt].ends_with('/') {
            found.push(Element { attrs: &text[after..gt - 1], body: None, raw: &text[start..=gt] });
            pos = gt + 1;
            continue;
        }

        match matching_close(text, gt + 1, &open, &close) {
            Some(close_at) => {
                let end = close_at + close.len();
                found.push(Element {
                    attrs: &text[after..gt],
                    body: Some(&text[gt + 1..close_at]),
                    raw: &text[start..end],
                });
                pos = end;
            }
            None => {
                tracing::debug!(tag, "unterminated element");
                pos = gt + 1;
            }
        }
    }

    found
}

fn first_body<'a>(span: &'a str, tag: &str) -> Option<&'a str> {
    elements(span, tag).into_iter().find_map(|e| e.body)
}

/// Decoded, trimmed text of the first non-empty `tag` element in `span`.
fn child_text(span: &str, tag: &str) -> Option<String> {
    elements(span, tag)
        .into_iter()
        .filter_map(|e| e.body)
        .map(|body| decode_entities(body.trim()))
        .find(|text| !text.is_empty())
}

/// Decoded value of attribute `name` in a start tag's attribute text.
fn attribute(attrs: &str, name: &str) -> Option<String> {
    let mut offset = 0;
    while let Some(rel) = attrs[offset..].find(name) {
        let at = offset + rel;
        offset = at + name.len();

        let preceded_by_space = attrs[..at].chars().last().is_none_or(char::is_whitespace);
        let rest = attrs[offset..].trim_start();
        if !preceded_by_space || !rest.starts_with('=') {
            continue;
        }
        let value = rest[1..].trim_start();
        let quote = value.chars().next().filter(|&q| q == '"' || q == '\'')?;
        let inner = &value[1..];
        let end = inner.find(quote)?;
        return Some(decode_entities(&inner[..end]));
    }
    None
}

/// Decode the XML entities found in MSBuild text: the five named ones plus
/// decimal and hexadecimal character references.  `CR LF` reference pairs
/// collapse to a single newline.  Malformed references are kept verbatim.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let s = s
        .replace("&#13;&#10;", "\n")
        .replace("&#xD;&#xA;", "\n")
        .replace("&#xd;&#xa;", "\n");

    let mut out = String::with_capacity(s.len());
    let mut rest = s.as_str();
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&tail[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════
