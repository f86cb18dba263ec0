//! CMake script generation.
//!
//! Serializes a [`ProjectModel`] into `CMakeLists.txt` text.  Output is a
//! pure function of the model: sections are emitted in a fixed order,
//! per-configuration values follow the configuration map's name order, and
//! nothing depends on the clock or the environment.
//!
//! Section order:
//!
//! 1. `cmake_minimum_required` / `project` / language standards
//! 2. platform and SDK metadata
//! 3. character-set macros
//! 4. source lists
//! 5. target declaration (plus bundle properties)
//! 6. include directories
//! 7. preprocessor definitions
//! 8. link libraries
//! 9. link directories
//! 10. compile options
//! 11. link options
//! 12. MSVC runtime library
//! 13. precompiled header and exclusions
//! 14. build events, script phases, copy phases
//! 15. subsystem

use std::fmt;

use crate::args::split_args;
use crate::model::{
    BuildEvent, BuildEventKind, CharacterSet, ConfigOverrides, CopyFilesPhase, ProjectModel,
    ShellScriptPhase, Subsystem, TargetKind, UniqueList,
};

// ═══════════════════════════════════════════════════════════════════════════════
//  Versions
// ═══════════════════════════════════════════════════════════════════════════════

/// A `cmake_minimum_required` version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CMakeVersion {
    pub major: u32,
    pub minor: u32,
}

impl CMakeVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for CMakeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

pub const BASELINE: CMakeVersion = CMakeVersion::new(3, 10);
/// `add_executable` / `add_library` without source arguments.
pub const SOURCELESS_TARGETS: CMakeVersion = CMakeVersion::new(3, 11);
/// `target_link_options`, `target_link_directories`.
pub const LINK_OPTIONS: CMakeVersion = CMakeVersion::new(3, 13);
/// `FRAMEWORK` / `BUNDLE` targets with `MACOSX_FRAMEWORK_IDENTIFIER`.
pub const APPLE_BUNDLES: CMakeVersion = CMakeVersion::new(3, 14);
/// `MSVC_RUNTIME_LIBRARY`.
pub const MSVC_RUNTIME: CMakeVersion = CMakeVersion::new(3, 15);
/// `target_precompile_headers`, `SKIP_PRECOMPILE_HEADERS`.
pub const PRECOMPILED_HEADERS: CMakeVersion = CMakeVersion::new(3, 16);
/// `OBJC` / `OBJCXX` languages.
pub const OBJC_LANGUAGES: CMakeVersion = CMakeVersion::new(3, 16);

/// Descriptor format the model came from.  Selects the flag vocabulary and
/// the Apple-specific sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Vcxproj,
    Xcode,
}

/// Oldest CMake accepting `CMAKE_CXX_STANDARD` / `CMAKE_C_STANDARD` values.
fn standard_floor(cxx: Option<u32>, c: Option<u32>) -> CMakeVersion {
    let cxx_floor = match cxx {
        Some(20) => CMakeVersion::new(3, 12),
        Some(23) => CMakeVersion::new(3, 20),
        _ => BASELINE,
    };
    let c_floor = match c {
        Some(17) | Some(23) => CMakeVersion::new(3, 21),
        _ => BASELINE,
    };
    cxx_floor.max(c_floor)
}

fn has_objc(model: &ProjectModel) -> (bool, bool) {
    let ext = |e: &str| model.source_files.iter().any(|s| s.ends_with(e));
    (ext(".m"), ext(".mm"))
}

/// Minimum CMake version: the maximum over the floors of every feature the
/// generated script uses.
pub fn minimum_version(model: &ProjectModel, flavor: Flavor) -> CMakeVersion {
    let any = |global: &UniqueList, pick: fn(&ConfigOverrides) -> Option<&UniqueList>| {
        !global.is_empty() || model.any_list(pick)
    };

    let mut floors = vec![
        BASELINE,
        standard_floor(model.cxx_standard, model.c_standard),
    ];
    if model.source_files.is_empty() && model.header_files.is_empty() && model.resource_files.is_empty() {
        floors.push(SOURCELESS_TARGETS);
    }
    if any(&model.link_options, |o| o.link_options.as_ref())
        || any(&model.library_dirs, |o| o.library_dirs.as_ref())
        || any(&model.framework_dirs, |o| o.framework_dirs.as_ref())
    {
        floors.push(LINK_OPTIONS);
    }
    if !scoped(model, model.runtime_library.as_ref(), |o| o.runtime_library.as_ref())
        .iter()
        .all(|(_, v)| runtime_library(v).is_none())
    {
        floors.push(MSVC_RUNTIME);
    }
    if model.uses_precompiled_header() {
        floors.push(PRECOMPILED_HEADERS);
    }

    if flavor == Flavor::Xcode {
        let strips = model.dead_code_stripping == Some(true)
            || model.configurations.values().any(|o| o.dead_code_stripping == Some(true));
        if strips || any(&model.rpaths, |o| o.rpaths.as_ref()) {
            floors.push(LINK_OPTIONS);
        }
        if matches!(model.kind, TargetKind::Framework | TargetKind::Bundle) {
            floors.push(APPLE_BUNDLES);
        }
        let (objc, objcxx) = has_objc(model);
        if objc || objcxx {
            floors.push(OBJC_LANGUAGES);
        }
    }

    floors.into_iter().max().unwrap_or(BASELINE)
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Output buffer and argument quoting
// ═══════════════════════════════════════════════════════════════════════════════

struct CMakeBuf(String);

impl CMakeBuf {
    fn new() -> Self {
        Self(String::new())
    }

    fn push(&mut self, line: &str) {
        self.0.push_str(line);
        self.0.push('\n');
    }

    /// Append non-empty sections separated by one blank line.
    fn sections(&mut self, sections: Vec<Vec<String>>) {
        for (i, section) in sections.into_iter().filter(|s| !s.is_empty()).enumerate() {
            if i > 0 {
                self.push("");
            }
            for line in &section {
                self.push(line);
            }
        }
    }

    fn finish(self) -> String {
        self.0
    }
}

/// Render one CMake argument, quoting when the text would otherwise split
/// or be misread.
fn arg(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    let needs_quotes = text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | '(' | ')' | '#' | '"'));
    if needs_quotes { format!("\"{escaped}\"") } else { escaped }
}

/// `head` on its own line, one argument per indented line, closing paren.
fn block(head: String, items: Vec<String>) -> Vec<String> {
    if items.is_empty() {
        return Vec::new();
    }
    let mut lines = Vec::with_capacity(items.len() + 2);
    lines.push(head);
    lines.extend(items.into_iter().map(|i| format!("    {i}")));
    lines.push(")".to_string());
    lines
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Generator expressions
// ═══════════════════════════════════════════════════════════════════════════════

/// Which configurations a value applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope<'m> {
    All,
    Config(&'m str),
    /// Every configuration not named.
    Otherwise(Vec<&'m str>),
}

impl Scope<'_> {
    fn condition(&self) -> Option<String> {
        match self {
            Scope::All => None,
            Scope::Config(name) => Some(format!("$<CONFIG:{name}>")),
            Scope::Otherwise(names) => {
                let any: Vec<String> = names.iter().map(|n| format!("$<CONFIG:{n}>")).collect();
                Some(format!("$<NOT:$<OR:{}>>", any.join(",")))
            }
        }
    }

    /// Wrap `value`: configuration conditional outside, MSVC conditional
    /// inside.
    fn wrap(&self, value: &str, msvc: bool) -> String {
        let inner = if msvc {
            format!("$<$<CXX_COMPILER_ID:MSVC>:{value}>")
        } else {
            value.to_string()
        };
        match self.condition() {
            None => inner,
            Some(condition) => format!("$<{condition}:{inner}>"),
        }
    }
}

/// Scalar values per scope.  When no configuration sets a different value
/// the global value applies to all; otherwise each configuration gets its
/// effective value and the global value covers configurations not in the
/// map.
fn scoped<'m, T: Clone + PartialEq + 'm>(
    model: &'m ProjectModel,
    global: Option<&T>,
    pick: impl Fn(&'m ConfigOverrides) -> Option<&'m T>,
) -> Vec<(Scope<'m>, T)> {
    let differs = model
        .configurations
        .values()
        .any(|o| pick(o).is_some_and(|v| Some(v) != global));
    if !differs {
        return global.map(|v| vec![(Scope::All, v.clone())]).unwrap_or_default();
    }

    let mut values: Vec<(Scope<'m>, T)> = model
        .configurations
        .iter()
        .filter_map(|(name, o)| pick(o).or(global).map(|v| (Scope::Config(name.as_str()), v.clone())))
        .collect();
    if let Some(v) = global {
        let names = model.configurations.keys().map(String::as_str).collect();
        values.push((Scope::Otherwise(names), v.clone()));
    }
    values
}

/// Global entries followed by each configuration's additional entries.
fn scoped_list<'m>(
    model: &'m ProjectModel,
    global: &UniqueList,
    pick: impl Fn(&'m ConfigOverrides) -> Option<&'m UniqueList>,
) -> Vec<(Scope<'m>, String)> {
    let mut items: Vec<(Scope<'m>, String)> =
        global.iter().map(|e| (Scope::All, e.to_string())).collect();
    for (name, o) in &model.configurations {
        let Some(list) = pick(o) else { continue };
        items.extend(
            list.iter()
                .filter(|e| !global.contains(e))
                .map(|e| (Scope::Config(name.as_str()), e.to_string())),
        );
    }
    items
}

fn is_msvc_flag(flavor: Flavor, option: &str) -> bool {
    flavor == Flavor::Vcxproj && option.starts_with('/')
}

/// Escape characters that would end or split a `$<…:value>` expression,
/// leaving nested expressions intact.
fn genex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' if chars.peek() == Some(&'<') => {
                depth += 1;
                out.push(c);
            }
            '>' if depth > 0 => {
                depth -= 1;
                out.push(c);
            }
            '>' => out.push_str("$<ANGLE-R>"),
            ',' if depth == 0 => out.push_str("$<COMMA>"),
            ';' if depth == 0 => out.push_str("$<SEMICOLON>"),
            _ => out.push(c),
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Value vocabularies
// ═══════════════════════════════════════════════════════════════════════════════

fn runtime_library(value: &str) -> Option<&'static str> {
    match value {
        "MultiThreaded" => Some("MultiThreaded"),
        "MultiThreadedDebug" => Some("MultiThreadedDebug"),
        "MultiThreadedDLL" => Some("MultiThreadedDLL"),
        "MultiThreadedDebugDLL" => Some("MultiThreadedDebugDLL"),
        _ => None,
    }
}

fn optimization_flag(flavor: Flavor, value: &str) -> Option<&'static str> {
    match (flavor, value) {
        (Flavor::Vcxproj, "Disabled") => Some("/Od"),
        (Flavor::Vcxproj, "MinSpace") => Some("/O1"),
        (Flavor::Vcxproj, "MaxSpeed") => Some("/O2"),
        (Flavor::Vcxproj, "Full") => Some("/Ox"),
        (Flavor::Xcode, "0") => Some("-O0"),
        (Flavor::Xcode, "1") => Some("-O1"),
        (Flavor::Xcode, "2") => Some("-O2"),
        (Flavor::Xcode, "3") => Some("-O3"),
        (Flavor::Xcode, "s") => Some("-Os"),
        (Flavor::Xcode, "fast") => Some("-Ofast"),
        (Flavor::Xcode, "z") => Some("-Oz"),
        _ => None,
    }
}

fn warning_flag(value: &str) -> Option<&'static str> {
    match value {
        "TurnOffAllWarnings" | "Level0" => Some("/W0"),
        "Level1" => Some("/W1"),
        "Level2" => Some("/W2"),
        "Level3" => Some("/W3"),
        "Level4" => Some("/W4"),
        "EnableAllWarnings" => Some("/Wall"),
        _ => None,
    }
}

/// Map scoped scalar tokens through `vocabulary`, dropping (and tracing)
/// tokens it does not know.
fn mapped_flags<'m>(
    values: Vec<(Scope<'m>, String)>,
    setting: &str,
    vocabulary: impl Fn(&str) -> Option<&'static str>,
) -> Vec<(Scope<'m>, String)> {
    values
        .into_iter()
        .filter_map(|(scope, value)| match vocabulary(&value) {
            Some(flag) => Some((scope, flag.to_string())),
            None => {
                tracing::trace!(setting, value = %value, "omitting unrecognized value");
                None
            }
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Entry points
// ═══════════════════════════════════════════════════════════════════════════════

/// Generate `CMakeLists.txt` text for a model parsed from a `.vcxproj`.
pub fn generate_vcxproj(model: &ProjectModel) -> String {
    generate(model, Flavor::Vcxproj)
}

/// Generate `CMakeLists.txt` text for a model parsed from a `.pbxproj`.
pub fn generate_xcode(model: &ProjectModel) -> String {
    generate(model, Flavor::Xcode)
}

pub fn generate(model: &ProjectModel, flavor: Flavor) -> String {
    let g = Generator { model, flavor, target: arg(&model.name) };
    let mut buf = CMakeBuf::new();
    buf.sections(vec![
        g.header(),
        g.platform(),
        g.character_set(),
        g.source_lists(),
        g.target(),
        g.include_directories(),
        g.definitions(),
        g.link_libraries(),
        g.link_directories(),
        g.compile_options(),
        g.link_options(),
        g.runtime_library(),
        g.precompiled_header(),
        g.build_steps(),
        g.subsystem(),
    ]);
    buf.finish()
}

struct Generator<'m> {
    model: &'m ProjectModel,
    flavor: Flavor,
    /// Target name as a CMake argument.
    target: String,
}

impl<'m> Generator<'m> {
    fn render(&self, items: Vec<(Scope<'m>, String)>, msvc_aware: bool) -> Vec<String> {
        items
            .into_iter()
            .map(|(scope, value)| {
                let msvc = msvc_aware && is_msvc_flag(self.flavor, &value);
                arg(&scope.wrap(&value, msvc))
            })
            .collect()
    }

    fn header(&self) -> Vec<String> {
        let m = self.model;
        let mut lines = vec![format!(
            "cmake_minimum_required(VERSION {})",
            minimum_version(m, self.flavor)
        )];

        let (objc, objcxx) = has_objc(m);
        if self.flavor == Flavor::Xcode && (objc || objcxx) {
            let mut languages = vec!["C", "CXX"];
            if objc {
                languages.push("OBJC");
            }
            if objcxx {
                languages.push("OBJCXX");
            }
            lines.push(format!("project({} LANGUAGES {})", self.target, languages.join(" ")));
        } else {
            lines.push(format!("project({})", self.target));
        }

        if let Some(std) = m.cxx_standard {
            lines.push(String::new());
            lines.push(format!("set(CMAKE_CXX_STANDARD {std})"));
            lines.push("set(CMAKE_CXX_STANDARD_REQUIRED ON)".to_string());
        }
        if let Some(std) = m.c_standard {
            if m.cxx_standard.is_none() {
                lines.push(String::new());
            }
            lines.push(format!("set(CMAKE_C_STANDARD {std})"));
        }
        lines
    }

    fn platform(&self) -> Vec<String> {
        let p = &self.model.platform;
        let mut lines = Vec::new();
        match self.flavor {
            Flavor::Vcxproj => {
                if let Some(sdk) = &p.sdk_version {
                    lines.push(format!("# Windows SDK: {sdk}"));
                }
                if let Some(toolset) = &p.toolset {
                    lines.push(format!("# Platform toolset: {toolset}"));
                }
            }
            Flavor::Xcode => {
                if let Some(target) = &p.deployment_target {
                    lines.push(format!("set(CMAKE_OSX_DEPLOYMENT_TARGET {})", arg(target)));
                }
                if let Some(archs) = &p.architecture {
                    lines.push(format!("set(CMAKE_OSX_ARCHITECTURES {})", arg(&archs.replace(' ', ";"))));
                }
                if let Some(sdk) = &p.sdk_version {
                    lines.push(format!("set(CMAKE_OSX_SYSROOT {})", arg(sdk)));
                }
            }
        }
        lines
    }

    fn character_set(&self) -> Vec<String> {
        match self.model.platform.character_set {
            Some(CharacterSet::Unicode) => vec!["add_definitions(-DUNICODE -D_UNICODE)".to_string()],
            Some(CharacterSet::MultiByte) => vec!["add_definitions(-D_MBCS)".to_string()],
            Some(CharacterSet::NotSet) | None => Vec::new(),
        }
    }

    fn source_lists(&self) -> Vec<String> {
        let m = self.model;
        let mut lines = Vec::new();
        for (var, list) in [
            ("SOURCES", &m.source_files),
            ("HEADERS", &m.header_files),
            ("RESOURCES", &m.resource_files),
        ] {
            lines.extend(block(format!("set({var}"), list.iter().map(arg).collect()));
        }
        lines
    }

    fn is_bundle_like(&self) -> bool {
        let m = self.model;
        match m.kind {
            TargetKind::Framework | TargetKind::Bundle => true,
            TargetKind::Application => {
                self.flavor == Flavor::Xcode && m.platform.info_plist.is_some()
            }
            _ => false,
        }
    }

    fn target(&self) -> Vec<String> {
        let m = self.model;
        let mut inputs = Vec::new();
        for (var, list) in [
            ("SOURCES", &m.source_files),
            ("HEADERS", &m.header_files),
            ("RESOURCES", &m.resource_files),
        ] {
            if !list.is_empty() {
                inputs.push(format!("${{{var}}}"));
            }
        }
        let inputs = if inputs.is_empty() { String::new() } else { format!(" {}", inputs.join(" ")) };

        let t = &self.target;
        let mut lines = vec![match m.kind {
            TargetKind::Application if self.is_bundle_like() => {
                format!("add_executable({t} MACOSX_BUNDLE{inputs})")
            }
            TargetKind::Application => format!("add_executable({t}{inputs})"),
            TargetKind::StaticLibrary => format!("add_library({t} STATIC{inputs})"),
            TargetKind::DynamicLibrary | TargetKind::Framework => {
                format!("add_library({t} SHARED{inputs})")
            }
            TargetKind::Bundle => format!("add_library({t} MODULE{inputs})"),
        }];

        let mut properties = Vec::new();
        if self.flavor == Flavor::Xcode {
            let p = &m.platform;
            let info_plist = p.info_plist.as_deref().map(source_relative);
            match m.kind {
                TargetKind::Framework => {
                    properties.push("FRAMEWORK TRUE".to_string());
                    if let Some(id) = &p.bundle_id {
                        properties.push(format!("MACOSX_FRAMEWORK_IDENTIFIER {}", arg(id)));
                    }
                    if let Some(plist) = &info_plist {
                        properties.push(format!("MACOSX_FRAMEWORK_INFO_PLIST {}", arg(plist)));
                    }
                }
                TargetKind::Bundle => {
                    properties.push("BUNDLE TRUE".to_string());
                    if let Some(plist) = &info_plist {
                        properties.push(format!("MACOSX_BUNDLE_INFO_PLIST {}", arg(plist)));
                    }
                }
                TargetKind::Application if self.is_bundle_like() => {
                    if let Some(id) = &p.bundle_id {
                        properties.push(format!("MACOSX_BUNDLE_GUI_IDENTIFIER {}", arg(id)));
                    }
                    if let Some(plist) = &info_plist {
                        properties.push(format!("MACOSX_BUNDLE_INFO_PLIST {}", arg(plist)));
                    }
                }
                _ => {}
            }
        }
        if let Some(product) = m.product_name.as_deref().filter(|p| *p != m.name) {
            properties.push(format!("OUTPUT_NAME {}", arg(product)));
        }
        if !properties.is_empty() {
            lines.extend(block(format!("set_target_properties({t} PROPERTIES"), properties));
        }

        if self.flavor == Flavor::Xcode && self.is_bundle_like() && !m.resource_files.is_empty() {
            lines.push(
                "set_source_files_properties(${RESOURCES} PROPERTIES MACOSX_PACKAGE_LOCATION Resources)"
                    .to_string(),
            );
        }
        lines
    }

    fn include_directories(&self) -> Vec<String> {
        let m = self.model;
        let items = scoped_list(m, &m.include_dirs, |o| o.include_dirs.as_ref());
        block(
            format!("target_include_directories({} PRIVATE", self.target),
            self.render(items, false),
        )
    }

    fn definitions(&self) -> Vec<String> {
        let m = self.model;
        let items = scoped_list(m, &m.definitions, |o| o.definitions.as_ref());
        block(
            format!("target_compile_definitions({} PRIVATE", self.target),
            self.render(items, false),
        )
    }

    fn link_libraries(&self) -> Vec<String> {
        let m = self.model;
        let mut items = self.render(scoped_list(m, &m.link_libraries, |o| o.link_libraries.as_ref()), false);
        items.extend(m.frameworks.iter().map(|f| arg(&format!("-framework {f}"))));

        let mut lines = block(format!("target_link_libraries({} PRIVATE", self.target), items);
        if !m.dependencies.is_empty() {
            let deps: Vec<&str> = m.dependencies.iter().collect();
            lines.push(format!("# Project dependencies: {}", deps.join(", ")));
        }
        lines
    }

    fn link_directories(&self) -> Vec<String> {
        let m = self.model;
        let items = scoped_list(m, &m.library_dirs, |o| o.library_dirs.as_ref());
        block(
            format!("target_link_directories({} PRIVATE", self.target),
            self.render(items, false),
        )
    }

    fn compile_options(&self) -> Vec<String> {
        let m = self.model;
        let mut items = scoped_list(m, &m.compile_options, |o| o.compile_options.as_ref());

        let flavor = self.flavor;
        items.extend(mapped_flags(
            scoped(m, m.optimization.as_ref(), |o| o.optimization.as_ref()),
            "optimization",
            |v| optimization_flag(flavor, v),
        ));
        if flavor == Flavor::Vcxproj {
            items.extend(mapped_flags(
                scoped(m, m.warning_level.as_ref(), |o| o.warning_level.as_ref()),
                "warning level",
                warning_flag,
            ));
            items.extend(
                scoped(m, m.treat_warnings_as_errors.as_ref(), |o| o.treat_warnings_as_errors.as_ref())
                    .into_iter()
                    .filter(|(_, on)| *on)
                    .map(|(scope, _)| (scope, "/WX".to_string())),
            );
        }
        if flavor == Flavor::Xcode {
            if m.platform.arc == Some(true) {
                items.push((Scope::All, "-fobjc-arc".to_string()));
            }
            if m.platform.modules == Some(true) {
                items.push((Scope::All, "-fmodules".to_string()));
            }
            items.extend(self.framework_dir_flags());
        }

        block(
            format!("target_compile_options({} PRIVATE", self.target),
            self.render(items, true),
        )
    }

    fn framework_dir_flags(&self) -> Vec<(Scope<'m>, String)> {
        let m = self.model;
        scoped_list(m, &m.framework_dirs, |o| o.framework_dirs.as_ref())
            .into_iter()
            .map(|(scope, dir)| (scope, format!("-F{dir}")))
            .collect()
    }

    fn link_options(&self) -> Vec<String> {
        let m = self.model;
        let mut items = scoped_list(m, &m.link_options, |o| o.link_options.as_ref());

        if self.flavor == Flavor::Xcode {
            items.extend(
                scoped_list(m, &m.rpaths, |o| o.rpaths.as_ref())
                    .into_iter()
                    .map(|(scope, path)| (scope, format!("-Wl,-rpath,{path}"))),
            );
            items.extend(
                scoped(m, m.dead_code_stripping.as_ref(), |o| o.dead_code_stripping.as_ref())
                    .into_iter()
                    .filter(|(_, on)| *on)
                    .map(|(scope, _)| (scope, "-Wl,-dead_strip".to_string())),
            );
            items.extend(self.framework_dir_flags());
        }

        block(
            format!("target_link_options({} PRIVATE", self.target),
            self.render(items, true),
        )
    }

    fn runtime_library(&self) -> Vec<String> {
        let m = self.model;
        let values = mapped_flags(
            scoped(m, m.runtime_library.as_ref(), |o| o.runtime_library.as_ref()),
            "runtime library",
            runtime_library,
        );
        if values.is_empty() {
            return Vec::new();
        }
        let value: String = values
            .iter()
            .map(|(scope, v)| scope.wrap(v, false))
            .collect();
        vec![format!(
            "set_property(TARGET {} PROPERTY MSVC_RUNTIME_LIBRARY {})",
            self.target,
            arg(&value)
        )]
    }

    fn precompiled_header(&self) -> Vec<String> {
        let m = self.model;
        if !m.uses_precompiled_header() {
            return Vec::new();
        }
        let Some(pch) = &m.pch else { return Vec::new() };
        let Some(header) = &pch.header else { return Vec::new() };

        let mut lines = vec![format!("target_precompile_headers({} PRIVATE {})", self.target, arg(header))];
        if !pch.excluded.is_empty() {
            let mut items: Vec<String> = pch.excluded.iter().map(|f| arg(f)).collect();
            items.push("PROPERTIES SKIP_PRECOMPILE_HEADERS ON".to_string());
            lines.extend(block("set_source_files_properties(".to_string(), items));
        }
        lines
    }

    fn subsystem(&self) -> Vec<String> {
        let m = self.model;
        if m.kind == TargetKind::Application && m.platform.subsystem == Some(Subsystem::Windows) {
            vec![format!("set_target_properties({} PROPERTIES WIN32_EXECUTABLE TRUE)", self.target)]
        } else {
            Vec::new()
        }
    }

    // ── Build steps ──────────────────────────────────────────────────────

    fn build_steps(&self) -> Vec<String> {
        let m = self.model;
        let mut commands: Vec<Vec<String>> = Vec::new();
        let mut claimed: Vec<&[String]> = Vec::new();
        for event in &m.build_events {
            if event.kind != BuildEventKind::CustomBuild {
                commands.push(self.build_event(event));
                continue;
            }
            if claimed.contains(&event.outputs.as_slice()) {
                continue;
            }
            claimed.push(event.outputs.as_slice());
            let group: Vec<&BuildEvent> = m
                .build_events
                .iter()
                .filter(|e| e.kind == BuildEventKind::CustomBuild && e.outputs == event.outputs)
                .collect();
            commands.push(self.custom_build(&event.outputs, &group));
        }
        for phase in &m.shell_phases {
            commands.push(self.shell_phase(phase));
        }
        for phase in &m.copy_phases {
            commands.push(self.copy_phase(phase));
        }

        let mut lines = Vec::new();
        for command in commands.into_iter().filter(|c| !c.is_empty()) {
            if !lines.is_empty() {
                lines.push(String::new());
            }
            lines.extend(command);
        }
        lines
    }

    /// MSBuild macros usable in build-event commands.
    fn command_macros(&self) -> Vec<(&'static str, String)> {
        let name = &self.model.name;
        vec![
            ("$(OutDir)", format!("$<TARGET_FILE_DIR:{name}>/")),
            ("$(TargetDir)", format!("$<TARGET_FILE_DIR:{name}>/")),
            ("$(TargetPath)", format!("$<TARGET_FILE:{name}>")),
            ("$(TargetFileName)", format!("$<TARGET_FILE_NAME:{name}>")),
            ("$(ProjectDir)", "${CMAKE_CURRENT_SOURCE_DIR}/".to_string()),
            ("$(SolutionDir)", "${CMAKE_SOURCE_DIR}/".to_string()),
            ("$(IntDir)", "${CMAKE_CURRENT_BINARY_DIR}/".to_string()),
            ("$(Configuration)", "$<CONFIG>".to_string()),
            ("$(ProjectName)", "${PROJECT_NAME}".to_string()),
        ]
    }

    fn translate_command(&self, line: &str) -> String {
        let mut text = line.to_string();
        for (from, to) in self.command_macros() {
            if text.contains(from) {
                text = text.replace(from, &to);
            }
        }
        while text.contains(">//") || text.contains("}//") {
            text = text.replace(">//", ">/").replace("}//", "}/");
        }
        text
    }

    /// One `COMMAND …` item per non-empty command line.
    fn command_items(&self, command: &str, configuration: Option<&str>) -> Vec<String> {
        command
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|line| {
                let tokens = split_args(&self.translate_command(line));
                match configuration {
                    None => {
                        let args: Vec<String> = tokens.iter().map(|t| arg(t)).collect();
                        format!("COMMAND {}", args.join(" "))
                    }
                    Some(name) => {
                        let list: Vec<String> = tokens.iter().map(|t| genex_escape(t)).collect();
                        format!("COMMAND {}", arg(&Scope::Config(name).wrap(&list.join(";"), false)))
                    }
                }
            })
            .collect()
    }

    /// One `add_custom_command(OUTPUT …)` for every custom build step that
    /// produces `outputs`, with each configuration's commands wrapped in its
    /// own `$<CONFIG:…>` expression.
    fn custom_build(&self, outputs: &[String], events: &[&BuildEvent]) -> Vec<String> {
        if outputs.is_empty() {
            tracing::trace!("skipping custom build step without outputs");
            return Vec::new();
        }
        let events: Vec<&BuildEvent> = events.iter().copied().filter(|e| e.enabled).collect();
        let mut items: Vec<String> = events
            .iter()
            .flat_map(|e| self.command_items(&e.command, e.configuration.as_deref()))
            .collect();
        if items.is_empty() {
            return Vec::new();
        }
        if let Some(message) = events.iter().find_map(|e| e.message.as_ref()) {
            items.push(format!("COMMENT {}", arg(message)));
        }
        items.push("VERBATIM".to_string());
        if events.iter().any(|e| e.configuration.is_some()) {
            items.push("COMMAND_EXPAND_LISTS".to_string());
        }

        let outputs: Vec<String> = outputs.iter().map(|o| arg(o)).collect();
        let mut lines = block(format!("add_custom_command(OUTPUT {}", outputs.join(" ")), items);
        lines.push(format!("target_sources({} PRIVATE {})", self.target, outputs.join(" ")));
        lines
    }

    fn build_event(&self, event: &BuildEvent) -> Vec<String> {
        let stage = match event.kind {
            BuildEventKind::PreBuild => "PRE_BUILD",
            BuildEventKind::PreLink => "PRE_LINK",
            BuildEventKind::PostBuild => "POST_BUILD",
            BuildEventKind::CustomBuild => return self.custom_build(&event.outputs, &[event]),
        };
        if !event.enabled {
            tracing::trace!(kind = ?event.kind, "skipping disabled build event");
            return Vec::new();
        }
        let configuration = event.configuration.as_deref();
        let mut items = self.command_items(&event.command, configuration);
        if items.is_empty() {
            return Vec::new();
        }
        if let Some(message) = &event.message {
            items.push(format!("COMMENT {}", arg(message)));
        }
        items.push("VERBATIM".to_string());
        if configuration.is_some() {
            items.push("COMMAND_EXPAND_LISTS".to_string());
        }

        block(format!("add_custom_command(TARGET {} {stage}", self.target), items)
    }

    fn shell_phase(&self, phase: &ShellScriptPhase) -> Vec<String> {
        let script = phase.script.trim_end();
        if script.is_empty() {
            return Vec::new();
        }
        let shell = phase.shell.as_deref().unwrap_or("/bin/sh");
        let mut items = vec![format!("COMMAND {} -c {}", arg(shell), script_arg(script))];

        let byproducts: Vec<String> = phase
            .output_paths
            .iter()
            .filter(|p| !p.contains("$("))
            .map(|p| arg(p))
            .collect();
        if !byproducts.is_empty() {
            items.push(format!("BYPRODUCTS {}", byproducts.join(" ")));
        }
        if let Some(name) = &phase.name {
            items.push(format!("COMMENT {}", arg(name)));
        }
        items.push("VERBATIM".to_string());

        let stage = if phase.before_compile { "PRE_BUILD" } else { "POST_BUILD" };
        block(format!("add_custom_command(TARGET {} {stage}", self.target), items)
    }

    /// Destination directory for an Xcode `dstSubfolderSpec`.
    fn copy_destination(&self, phase: &CopyFilesPhase) -> Option<String> {
        let name = &self.model.name;
        let contents = if self.is_bundle_like() {
            format!("$<TARGET_BUNDLE_CONTENT_DIR:{name}>")
        } else {
            format!("$<TARGET_FILE_DIR:{name}>")
        };
        let base = match phase.subfolder_spec? {
            0 => return (!phase.dst_path.is_empty()).then(|| phase.dst_path.clone()),
            1 if self.is_bundle_like() => format!("$<TARGET_BUNDLE_DIR:{name}>"),
            1 | 6 | 16 => format!("$<TARGET_FILE_DIR:{name}>"),
            7 => format!("{contents}/Resources"),
            10 => format!("{contents}/Frameworks"),
            11 => format!("{contents}/SharedFrameworks"),
            12 => format!("{contents}/SharedSupport"),
            13 => format!("{contents}/PlugIns"),
            other => {
                tracing::trace!(spec = other, "omitting copy phase with unknown destination");
                return None;
            }
        };
        let dst = phase.dst_path.trim_matches('/');
        Some(if dst.is_empty() { base } else { format!("{base}/{dst}") })
    }

    fn copy_phase(&self, phase: &CopyFilesPhase) -> Vec<String> {
        if phase.files.is_empty() {
            return Vec::new();
        }
        let Some(dst) = self.copy_destination(phase) else { return Vec::new() };

        let mut items = vec![format!("COMMAND ${{CMAKE_COMMAND}} -E make_directory {}", arg(&dst))];
        for file in &phase.files {
            let src = source_relative(file);
            let base = file.rsplit('/').next().unwrap_or(file);
            let is_dir = [".framework", ".bundle", ".app", ".appex", ".xpc"]
                .iter()
                .any(|ext| base.ends_with(ext));
            items.push(if is_dir {
                format!(
                    "COMMAND ${{CMAKE_COMMAND}} -E copy_directory {} {}",
                    arg(&src),
                    arg(&format!("{dst}/{base}"))
                )
            } else {
                format!("COMMAND ${{CMAKE_COMMAND}} -E copy_if_different {} {}", arg(&src), arg(&dst))
            });
        }
        if let Some(name) = &phase.name {
            items.push(format!("COMMENT {}", arg(name)));
        }
        items.push("VERBATIM".to_string());
        block(format!("add_custom_command(TARGET {} POST_BUILD", self.target), items)
    }
}

/// Anchor a relative path at the source directory.
fn source_relative(path: &str) -> String {
    if path.starts_with('/') || path.starts_with('$') {
        path.to_string()
    } else {
        format!("${{CMAKE_CURRENT_SOURCE_DIR}}/{path}")
    }
}

/// Xcode script text as one quoted argument.  Known Xcode directory
/// variables become their CMake counterparts; every other `$` is escaped so
/// the shell, not CMake, expands it.
fn script_arg(script: &str) -> String {
    const KNOWN: &[(&str, &str)] = &[
        ("${SRCROOT}", "${CMAKE_CURRENT_SOURCE_DIR}"),
        ("$(SRCROOT)", "${CMAKE_CURRENT_SOURCE_DIR}"),
        ("${PROJECT_DIR}", "${CMAKE_CURRENT_SOURCE_DIR}"),
        ("$(PROJECT_DIR)", "${CMAKE_CURRENT_SOURCE_DIR}"),
        ("${BUILT_PRODUCTS_DIR}", "${CMAKE_CURRENT_BINARY_DIR}"),
        ("$(BUILT_PRODUCTS_DIR)", "${CMAKE_CURRENT_BINARY_DIR}"),
    ];
    let mut text = script.to_string();
    for (from, to) in KNOWN {
        text = text.replace(from, to);
    }
    let escaped = text
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
        .replace('\n', "\\n")
        .replace("\\${CMAKE_CURRENT_SOURCE_DIR}", "${CMAKE_CURRENT_SOURCE_DIR}")
        .replace("\\${CMAKE_CURRENT_BINARY_DIR}", "${CMAKE_CURRENT_BINARY_DIR}");
    format!("\"{escaped}\"")
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PchConfig;
    use pretty_assertions::assert_eq;

    fn main_only() -> ProjectModel {
        let mut model = ProjectModel::new("Hello");
        model.source_files.push("main.cpp");
        model
    }

    fn position(text: &str, needle: &str) -> usize {
        text.find(needle).unwrap_or_else(|| panic!("missing `{needle}` in:\n{text}"))
    }

    // ── Versions ─────────────────────────────────────────────────────────

    #[test]
    fn baseline_version() {
        assert_eq!(minimum_version(&main_only(), Flavor::Vcxproj), BASELINE);
        assert_eq!(BASELINE.to_string(), "3.10");
    }

    #[test]
    fn target_without_files_needs_3_11() {
        let model = ProjectModel::new("Empty");
        assert_eq!(minimum_version(&model, Flavor::Vcxproj), SOURCELESS_TARGETS);
        let text = generate_vcxproj(&model);
        assert!(text.starts_with("cmake_minimum_required(VERSION 3.11)\nproject(Empty)\n"));
        assert!(text.contains("add_executable(Empty)\n"));

        let mut model = model;
        model.header_files.push("api.h");
        assert_eq!(minimum_version(&model, Flavor::Vcxproj), BASELINE);
    }

    #[test]
    fn link_options_alone_need_3_13() {
        let mut model = main_only();
        model.link_options.push("/LTCG");
        assert_eq!(minimum_version(&model, Flavor::Vcxproj), CMakeVersion::new(3, 13));
    }

    #[test]
    fn per_configuration_library_dirs_need_3_13() {
        let mut model = main_only();
        model.configurations.entry("Debug".into()).or_default().library_dirs =
            Some(["lib/debug"].into_iter().collect());
        assert_eq!(minimum_version(&model, Flavor::Vcxproj), LINK_OPTIONS);
    }

    #[test]
    fn runtime_and_pch_floors() {
        let mut model = main_only();
        model.runtime_library = Some("MultiThreaded".into());
        assert_eq!(minimum_version(&model, Flavor::Vcxproj), MSVC_RUNTIME);

        model.pch = Some(PchConfig { enabled: true, header: Some("pch.h".into()), ..Default::default() });
        assert_eq!(minimum_version(&model, Flavor::Vcxproj), PRECOMPILED_HEADERS);
    }

    #[test]
    fn unknown_runtime_library_has_no_floor() {
        let mut model = main_only();
        model.runtime_library = Some("SomethingNew".into());
        assert_eq!(minimum_version(&model, Flavor::Vcxproj), BASELINE);
        assert!(!generate_vcxproj(&model).contains("MSVC_RUNTIME_LIBRARY"));
    }

    #[test]
    fn xcode_floors() {
        let mut model = main_only();
        model.dead_code_stripping = Some(true);
        assert_eq!(minimum_version(&model, Flavor::Xcode), LINK_OPTIONS);
        assert_eq!(minimum_version(&model, Flavor::Vcxproj), BASELINE);

        model.kind = TargetKind::Framework;
        assert_eq!(minimum_version(&model, Flavor::Xcode), APPLE_BUNDLES);
    }

    // ── Basic output ─────────────────────────────────────────────────────

    #[test]
    fn minimal_application() {
        let text = generate_vcxproj(&main_only());
        assert_eq!(
            text,
            "cmake_minimum_required(VERSION 3.10)\n\
             project(Hello)\n\
             \n\
             set(SOURCES\n    main.cpp\n)\n\
             \n\
             add_executable(Hello ${SOURCES})\n"
        );
    }

    #[test]
    fn generation_is_idempotent() {
        let model = crate::vcxproj::parse_file("example.vcxproj").unwrap();
        assert_eq!(generate_vcxproj(&model), generate_vcxproj(&model));
        let model = crate::xcode::parse_file("example.pbxproj").unwrap();
        assert_eq!(generate_xcode(&model), generate_xcode(&model));
    }

    #[test]
    fn library_kinds() {
        let mut model = main_only();
        model.kind = TargetKind::StaticLibrary;
        assert!(generate_vcxproj(&model).contains("add_library(Hello STATIC ${SOURCES})"));
        model.kind = TargetKind::DynamicLibrary;
        assert!(generate_vcxproj(&model).contains("add_library(Hello SHARED ${SOURCES})"));
    }

    #[test]
    fn pch_without_header_is_not_emitted() {
        let mut model = main_only();
        model.pch = Some(PchConfig { enabled: true, ..Default::default() });
        let text = generate_vcxproj(&model);
        assert!(!text.contains("target_precompile_headers"));
        assert!(text.starts_with("cmake_minimum_required(VERSION 3.10)"));
    }

    #[test]
    fn disabled_pch_is_not_emitted() {
        let mut model = main_only();
        model.pch = Some(PchConfig { enabled: false, header: Some("pch.h".into()), ..Default::default() });
        assert!(!generate_vcxproj(&model).contains("target_precompile_headers"));
    }

    #[test]
    fn unknown_tokens_are_omitted() {
        let mut model = main_only();
        model.optimization = Some("Turbo".into());
        model.warning_level = Some("Level9".into());
        let text = generate_vcxproj(&model);
        assert!(!text.contains("target_compile_options"));
        assert!(!text.contains("Turbo"));
    }

    #[test]
    fn quoting() {
        assert_eq!(arg("plain"), "plain");
        assert_eq!(arg("two words"), "\"two words\"");
        assert_eq!(arg("a;b"), "\"a;b\"");
        assert_eq!(arg(r"dir\"), r"dir\\");
        assert_eq!(arg(""), "\"\"");
    }

    #[test]
    fn genex_escaping_keeps_nested_expressions() {
        assert_eq!(genex_escape("$<TARGET_FILE_DIR:App>/x"), "$<TARGET_FILE_DIR:App>/x");
        assert_eq!(genex_escape(">"), "$<ANGLE-R>");
        assert_eq!(genex_escape("a,b;c"), "a$<COMMA>b$<SEMICOLON>c");
    }

    // ── Configuration scoping ────────────────────────────────────────────

    #[test]
    fn configuration_outside_toolchain_inside() {
        let mut model = main_only();
        model.compile_options.push("/utf-8");
        model.compile_options.push("-fno-rtti");
        model.configurations.entry("Debug".into()).or_default().compile_options =
            Some(["/JMC", "/utf-8"].into_iter().collect());
        let text = generate_vcxproj(&model);
        assert!(text.contains("    $<$<CXX_COMPILER_ID:MSVC>:/utf-8>\n"));
        assert!(text.contains("    -fno-rtti\n"));
        assert!(text.contains("    $<$<CONFIG:Debug>:$<$<CXX_COMPILER_ID:MSVC>:/JMC>>\n"));
        assert_eq!(text.matches("/utf-8").count(), 1);
    }

    #[test]
    fn per_configuration_entries_follow_globals_in_name_order() {
        let mut model = main_only();
        model.definitions.push("SHARED");
        model.configurations.entry("Release".into()).or_default().definitions =
            Some(["NDEBUG"].into_iter().collect());
        model.configurations.entry("Debug".into()).or_default().definitions =
            Some(["_DEBUG", "SHARED"].into_iter().collect());
        let text = generate_vcxproj(&model);
        let shared = position(&text, "    SHARED\n");
        let debug = position(&text, "$<$<CONFIG:Debug>:_DEBUG>");
        let release = position(&text, "$<$<CONFIG:Release>:NDEBUG>");
        assert!(shared < debug && debug < release);
    }

    #[test]
    fn scalar_overrides_fall_back_to_global() {
        let mut model = main_only();
        model.optimization = Some("MaxSpeed".into());
        model.configurations.entry("Debug".into()).or_default().optimization = Some("Disabled".into());
        model.configurations.entry("Release".into()).or_default();
        let text = generate_vcxproj(&model);
        assert!(text.contains("$<$<CONFIG:Debug>:$<$<CXX_COMPILER_ID:MSVC>:/Od>>"));
        assert!(text.contains("$<$<CONFIG:Release>:$<$<CXX_COMPILER_ID:MSVC>:/O2>>"));
        assert!(text.contains(
            "$<$<NOT:$<OR:$<CONFIG:Debug>,$<CONFIG:Release>>>:$<$<CXX_COMPILER_ID:MSVC>:/O2>>"
        ));
    }

    // ── Full examples ────────────────────────────────────────────────────

    #[test]
    fn vcxproj_example_section_order() {
        let model = crate::vcxproj::parse_file("example.vcxproj").unwrap();
        let text = generate_vcxproj(&model);

        let order = [
            "cmake_minimum_required(VERSION 3.16)",
            "project(Example)",
            "set(CMAKE_CXX_STANDARD 17)",
            "# Windows SDK: 10.0",
            "add_definitions(-DUNICODE -D_UNICODE)",
            "set(SOURCES",
            "add_executable(Example ${SOURCES} ${HEADERS} ${RESOURCES})",
            "target_include_directories(Example PRIVATE",
            "target_compile_definitions(Example PRIVATE",
            "target_link_libraries(Example PRIVATE",
            "target_link_directories(Example PRIVATE",
            "target_compile_options(Example PRIVATE",
            "target_link_options(Example PRIVATE",
            "set_property(TARGET Example PROPERTY MSVC_RUNTIME_LIBRARY",
            "target_precompile_headers(Example PRIVATE pch.h)",
            "add_custom_command(TARGET Example POST_BUILD",
        ];
        let positions: Vec<usize> = order.iter().map(|n| position(&text, n)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "out of order:\n{text}");
    }

    #[test]
    fn vcxproj_example_details() {
        let model = crate::vcxproj::parse_file("example.vcxproj").unwrap();
        let text = generate_vcxproj(&model);

        assert!(text.contains("    \"$<$<CXX_COMPILER_ID:MSVC>:/DAPP_TITLE=Example App>\"\n"));
        assert!(text.contains("    $<$<CONFIG:Debug>:fmtd>\n"));
        assert!(text.contains("    $<$<CONFIG:Release>:$<$<CXX_COMPILER_ID:MSVC>:/LTCG>>\n"));
        assert!(text.contains(
            "set_property(TARGET Example PROPERTY MSVC_RUNTIME_LIBRARY $<$<CONFIG:Debug>:MultiThreadedDebugDLL>$<$<CONFIG:Release>:MultiThreadedDLL>)\n"
        ));
        assert!(text.contains("    third_party/sqlite/sqlite3.c\n    PROPERTIES SKIP_PRECOMPILE_HEADERS ON\n"));
        assert!(text.contains("# Project dependencies: core"));
        assert!(text.contains("    COMMENT \"Copying assets\"\n"));
        assert!(text.contains("    COMMAND \"$<$<CONFIG:Debug>:echo;done;&&;exit;0>\"\n"));
        assert!(text.contains("$<TARGET_FILE_DIR:Example>/assets\\\\>\"\n"));
        assert!(!text.contains("echo building release"));
        assert!(!text.contains("WIN32_EXECUTABLE"));
    }

    #[test]
    fn windows_subsystem_sets_property_last() {
        let mut model = main_only();
        model.platform.subsystem = Some(Subsystem::Windows);
        let text = generate_vcxproj(&model);
        assert!(text.ends_with("set_target_properties(Hello PROPERTIES WIN32_EXECUTABLE TRUE)\n"));
    }

    #[test]
    fn custom_build_step_needs_outputs() {
        let mut model = main_only();
        model.build_events.push(BuildEvent {
            kind: BuildEventKind::CustomBuild,
            command: "gen.exe".into(),
            message: None,
            outputs: vec![],
            configuration: None,
            enabled: true,
        });
        assert!(!generate_vcxproj(&model).contains("add_custom_command"));

        model.build_events[0].outputs = vec!["${CMAKE_CURRENT_BINARY_DIR}/out.h".into()];
        let text = generate_vcxproj(&model);
        assert!(text.contains("add_custom_command(OUTPUT ${CMAKE_CURRENT_BINARY_DIR}/out.h\n    COMMAND gen.exe\n    VERBATIM\n)\n"));
        assert!(text.contains("target_sources(Hello PRIVATE ${CMAKE_CURRENT_BINARY_DIR}/out.h)"));
    }

    #[test]
    fn custom_build_steps_sharing_outputs_form_one_rule() {
        let mut model = main_only();
        for (configuration, command) in [("Debug", "gen.exe -d"), ("Release", "gen.exe")] {
            model.build_events.push(BuildEvent {
                kind: BuildEventKind::CustomBuild,
                command: command.into(),
                message: None,
                outputs: vec!["out.h".into()],
                configuration: Some(configuration.into()),
                enabled: true,
            });
        }
        let text = generate_vcxproj(&model);
        assert_eq!(text.matches("add_custom_command(OUTPUT out.h").count(), 1);
        assert_eq!(text.matches("target_sources(Hello PRIVATE out.h)").count(), 1);
        assert!(text.contains(
            "add_custom_command(OUTPUT out.h\n    COMMAND \"$<$<CONFIG:Debug>:gen.exe;-d>\"\n    COMMAND $<$<CONFIG:Release>:gen.exe>\n    VERBATIM\n    COMMAND_EXPAND_LISTS\n)\n"
        ));
    }

    #[test]
    fn xcode_example() {
        let model = crate::xcode::parse_file("example.pbxproj").unwrap();
        let text = generate_xcode(&model);

        assert!(text.starts_with(
            "cmake_minimum_required(VERSION 3.16)\nproject(Demo LANGUAGES C CXX OBJC OBJCXX)\n"
        ));
        let order = [
            "set(CMAKE_C_STANDARD 11)",
            "set(CMAKE_OSX_DEPLOYMENT_TARGET 12.0)",
            "set(CMAKE_OSX_ARCHITECTURES arm64)",
            "set(CMAKE_OSX_SYSROOT macosx)",
            "add_executable(Demo MACOSX_BUNDLE ${SOURCES} ${HEADERS} ${RESOURCES})",
            "MACOSX_BUNDLE_GUI_IDENTIFIER com.example.demo",
            "OUTPUT_NAME DemoApp",
            "target_link_libraries(Demo PRIVATE",
            "target_compile_options(Demo PRIVATE",
            "target_link_options(Demo PRIVATE",
            "target_precompile_headers(Demo PRIVATE Demo/Prefix.pch)",
            "add_custom_command(TARGET Demo PRE_BUILD",
            "add_custom_command(TARGET Demo POST_BUILD",
        ];
        let positions: Vec<usize> = order.iter().map(|n| position(&text, n)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "out of order:\n{text}");

        assert!(text.contains("    \"-framework Cocoa\"\n"));
        assert!(text.contains("    $<$<CONFIG:Release>:-Os>\n"));
        assert!(text.contains("    -fobjc-arc\n"));
        assert!(text.contains("    -Wl,-rpath,@executable_path/../Frameworks\n"));
        assert!(text.contains("    -Wl,-dead_strip\n"));
        assert!(text.contains("    COMMAND /bin/sh -c \""));
        assert!(text.contains("\\${DERIVED_FILE_DIR}/version.h"));
        assert!(text.contains("${CMAKE_CURRENT_SOURCE_DIR}/scripts/version.sh"));
        assert!(text.contains(
            "copy_directory ${CMAKE_CURRENT_SOURCE_DIR}/Helper.framework $<TARGET_BUNDLE_CONTENT_DIR:Demo>/Frameworks/Helper.framework"
        ));
        assert!(!text.contains("MSVC"));
    }

    #[test]
    fn script_argument_escaping() {
        assert_eq!(
            script_arg("echo \"$HOME\" ${SRCROOT}\nexit 0"),
            "\"echo \\\"\\$HOME\\\" ${CMAKE_CURRENT_SOURCE_DIR}\\nexit 0\""
        );
    }
}
