//! Xcode project parser.
//!
//! Resolves the first native target of a `project.pbxproj` into a
//! [`ProjectModel`]: its build phases, its configurations (layered over the
//! project-level configurations of the same name) and its target
//! dependencies.  The only fatal condition is a project without a native
//! target; every other gap leaves the corresponding field empty.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ProjectError;
use crate::model::{
    ConfigOverrides, CopyFilesPhase, PchConfig, ProjectModel, ShellScriptPhase, TargetKind,
    UniqueList, normalize_path,
};
use crate::pbxproj::{ObjectGraph, PlistValue, dict_body, field, field_str, id_list, split_objects};

/// Xcode build-setting macros with a direct CMake counterpart.
const XCODE_PATH_MACROS: &[(&str, &str)] = &[
    ("$(SRCROOT)", "${CMAKE_CURRENT_SOURCE_DIR}"),
    ("${SRCROOT}", "${CMAKE_CURRENT_SOURCE_DIR}"),
    ("$(PROJECT_DIR)", "${CMAKE_CURRENT_SOURCE_DIR}"),
    ("${PROJECT_DIR}", "${CMAKE_CURRENT_SOURCE_DIR}"),
    ("$(BUILT_PRODUCTS_DIR)", "${CMAKE_CURRENT_BINARY_DIR}"),
    ("${BUILT_PRODUCTS_DIR}", "${CMAKE_CURRENT_BINARY_DIR}"),
    ("$(TARGET_NAME)", "${PROJECT_NAME}"),
    ("$(PROJECT_NAME)", "${PROJECT_NAME}"),
    ("$(CONFIGURATION)", "$<CONFIG>"),
];

const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "inl", "ipp", "tpp", "pch"];

// ═══════════════════════════════════════════════════════════════════════════════
//  Entry points
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse `project.pbxproj` text.
///
/// `fallback_name` names the project when the target has no `name`.
pub fn parse(text: &str, fallback_name: &str) -> Result<ProjectModel, ProjectError> {
    let graph = split_objects(text);
    let target_id = graph.of_isa("PBXNativeTarget").next().ok_or(ProjectError::NoTarget)?;
    let target = graph.get(target_id).unwrap_or_default();

    let name = field_str(target, "name").unwrap_or_else(|| fallback_name.to_string());
    let mut model = ProjectModel::new(name);
    model.product_name = field_str(target, "productName");
    model.kind = field_str(target, "productType")
        .map(|t| product_kind(&t))
        .unwrap_or_default();

    read_phases(&graph, target, &mut model);
    read_configurations(&graph, target, &mut model);
    read_dependencies(&graph, target, &mut model);

    tracing::debug!(
        name = %model.name,
        objects = graph.len(),
        sources = model.source_files.len(),
        configurations = model.configurations.len(),
        "parsed pbxproj"
    );
    Ok(model)
}

/// Read and parse a `.pbxproj` file.  The fallback name is the stem of the
/// enclosing `.xcodeproj` bundle when there is one, else the file stem.
pub fn parse_file(path: impl AsRef<Path>) -> Result<ProjectModel, ProjectError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
    let bundle = path
        .parent()
        .filter(|p| p.extension().is_some_and(|e| e == "xcodeproj"))
        .unwrap_or(path);
    let stem = bundle.file_stem().and_then(|s| s.to_str()).unwrap_or("project");
    parse(&text, stem)
}

fn product_kind(product_type: &str) -> TargetKind {
    let kind = product_type.trim_start_matches("com.apple.product-type.");
    match kind {
        "application" | "tool" => TargetKind::Application,
        "library.static" => TargetKind::StaticLibrary,
        "library.dynamic" => TargetKind::DynamicLibrary,
        "framework" | "framework.static" => TargetKind::Framework,
        _ if kind.starts_with("bundle") => TargetKind::Bundle,
        other => {
            tracing::debug!(product_type = other, "treating as application");
            TargetKind::Application
        }
    }
}

/// `CLANG_CXX_LANGUAGE_STANDARD` → C++ standard number.
pub fn cxx_standard(value: &str) -> Option<u32> {
    match value {
        "c++98" | "gnu++98" => Some(98),
        "c++0x" | "gnu++0x" | "c++11" | "gnu++11" => Some(11),
        "c++14" | "gnu++14" => Some(14),
        "c++17" | "gnu++17" | "c++1z" | "gnu++1z" => Some(17),
        "c++20" | "gnu++20" | "c++2a" | "gnu++2a" => Some(20),
        "c++23" | "gnu++23" | "c++2b" | "gnu++2b" => Some(23),
        _ => None,
    }
}

/// `GCC_C_LANGUAGE_STANDARD` → C standard number.
pub fn c_standard(value: &str) -> Option<u32> {
    match value {
        "ansi" | "c89" | "gnu89" => Some(90),
        "c99" | "gnu99" => Some(99),
        "c11" | "gnu11" => Some(11),
        "c17" | "gnu17" => Some(17),
        "c2x" | "gnu2x" | "c23" | "gnu23" => Some(23),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Build phases
// ═══════════════════════════════════════════════════════════════════════════════

/// File path behind a `PBXBuildFile` id.  Either hop may dangle.
fn build_file_path(graph: &ObjectGraph<'_>, build_file: &str) -> Option<String> {
    let Some(body) = graph.get(build_file) else {
        tracing::debug!(id = build_file, "dangling build file");
        return None;
    };
    let file_ref = field_str(body, "fileRef")?;
    let Some(reference) = graph.get(&file_ref) else {
        tracing::debug!(id = %file_ref, "dangling file reference");
        return None;
    };
    field_str(reference, "path").or_else(|| field_str(reference, "name"))
}

fn phase_files(graph: &ObjectGraph<'_>, phase: &str) -> Vec<String> {
    id_list(phase, "files")
        .iter()
        .filter_map(|id| build_file_path(graph, id))
        .collect()
}

fn is_header(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| HEADER_EXTENSIONS.iter().any(|h| h.eq_ignore_ascii_case(e)))
}

/// What a Frameworks-phase entry links against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkedItem {
    Framework(String),
    Library(String),
}

/// Classify a Frameworks-phase path by suffix.
pub fn classify_linked(path: &str) -> LinkedItem {
    let file = path.rsplit('/').next().unwrap_or(path);
    if let Some(stem) = file.strip_suffix(".framework") {
        return LinkedItem::Framework(stem.to_string());
    }
    for ext in [".tbd", ".dylib", ".a"] {
        if let Some(stem) = file.strip_suffix(ext) {
            let name = stem.strip_prefix("lib").filter(|n| !n.is_empty()).unwrap_or(stem);
            return LinkedItem::Library(name.to_string());
        }
    }
    LinkedItem::Library(file.to_string())
}

fn read_phases(graph: &ObjectGraph<'_>, target: &str, model: &mut ProjectModel) {
    let mut compiled = false;

    for phase_id in id_list(target, "buildPhases") {
        let Some(phase) = graph.get(&phase_id) else {
            tracing::debug!(id = %phase_id, "dangling build phase");
            continue;
        };
        let isa = field_str(phase, "isa").unwrap_or_default();
        match isa.as_str() {
            "PBXSourcesBuildPhase" => {
                compiled = true;
                for path in phase_files(graph, phase) {
                    if is_header(&path) {
                        model.header_files.push(path);
                    } else {
                        model.source_files.push(path);
                    }
                }
            }
            "PBXFrameworksBuildPhase" => {
                for path in phase_files(graph, phase) {
                    match classify_linked(&path) {
                        LinkedItem::Framework(name) => model.frameworks.push(name),
                        LinkedItem::Library(name) => model.link_libraries.push(name),
                    };
                }
            }
            "PBXResourcesBuildPhase" => {
                model.resource_files.extend(phase_files(graph, phase));
            }
            "PBXHeadersBuildPhase" => {
                model.header_files.extend(phase_files(graph, phase));
            }
            "PBXCopyFilesBuildPhase" => {
                model.copy_phases.push(CopyFilesPhase {
                    name: field_str(phase, "name"),
                    subfolder_spec: field_str(phase, "dstSubfolderSpec").and_then(|s| s.parse().ok()),
                    dst_path: field_str(phase, "dstPath").unwrap_or_default(),
                    files: phase_files(graph, phase),
                });
            }
            "PBXShellScriptBuildPhase" => {
                let paths = |key: &str| -> Vec<String> {
                    id_list(phase, key)
                        .iter()
                        .map(|p| normalize_path(p, XCODE_PATH_MACROS))
                        .collect()
                };
                model.shell_phases.push(ShellScriptPhase {
                    name: field_str(phase, "name"),
                    shell: field_str(phase, "shellPath"),
                    script: field_str(phase, "shellScript").unwrap_or_default(),
                    input_paths: paths("inputPaths"),
                    output_paths: paths("outputPaths"),
                    before_compile: !compiled,
                });
            }
            other => tracing::trace!(isa = other, "ignoring build phase"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Build configurations
// ═══════════════════════════════════════════════════════════════════════════════

/// `(name, buildSettings body)` for each configuration in a list.
fn configuration_list<'a>(graph: &ObjectGraph<'a>, owner: &str) -> Vec<(String, Option<&'a str>)> {
    let Some(list_id) = field_str(owner, "buildConfigurationList") else {
        return Vec::new();
    };
    let Some(list) = graph.get(&list_id) else {
        tracing::debug!(id = %list_id, "dangling configuration list");
        return Vec::new();
    };
    id_list(list, "buildConfigurations")
        .iter()
        .filter_map(|id| graph.get(id))
        .filter_map(|config| {
            let name = field_str(config, "name")?;
            Some((name, dict_body(config, "buildSettings")))
        })
        .collect()
}

fn is_setting_reference(token: &str) -> bool {
    (token.starts_with("$(") && token.ends_with(')') && token.matches("$(").count() == 1)
        || (token.starts_with("${") && token.ends_with('}') && token.matches("${").count() == 1)
}

fn is_inherited(token: &str) -> bool {
    token == "$(inherited)" || token == "${inherited}"
}

/// Target settings layered over the project-level settings of the same
/// configuration.
#[derive(Debug, Clone, Copy)]
struct LayeredSettings<'a> {
    target: Option<&'a str>,
    project: Option<&'a str>,
}

impl LayeredSettings<'_> {
    fn value(&self, key: &str) -> Option<PlistValue> {
        self.target
            .and_then(|body| field(body, key))
            .or_else(|| self.project.and_then(|body| field(body, key)))
    }

    fn string(&self, key: &str) -> Option<String> {
        self.value(key)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    fn flag(&self, key: &str) -> Option<bool> {
        self.string(key).map(|v| v.eq_ignore_ascii_case("YES"))
    }

    /// List setting with `$(inherited)` replaced by the project-level value.
    /// Bare references to other settings are dropped.
    fn list(&self, key: &str) -> Vec<String> {
        let inherited: Vec<String> = self
            .project
            .and_then(|body| field(body, key))
            .map(|v| v.tokens())
            .unwrap_or_default();

        let tokens = match self.target.and_then(|body| field(body, key)) {
            None => inherited,
            Some(value) => value
                .tokens()
                .into_iter()
                .flat_map(|t| if is_inherited(&t) { inherited.clone() } else { vec![t] })
                .collect(),
        };
        tokens.into_iter().filter(|t| !is_setting_reference(t)).collect()
    }

    fn paths(&self, keys: &[&str]) -> Option<UniqueList> {
        let list: UniqueList = keys
            .iter()
            .flat_map(|k| self.list(k))
            .map(|p| {
                let p = p.strip_suffix("/**").unwrap_or(&p);
                normalize_path(p, XCODE_PATH_MACROS)
            })
            .collect();
        (!list.is_empty()).then_some(list)
    }

    fn tokens(&self, keys: &[&str]) -> Option<UniqueList> {
        let list: UniqueList = keys.iter().flat_map(|k| self.list(k)).collect();
        (!list.is_empty()).then_some(list)
    }
}

/// Settings of one configuration that do not fit [`ConfigOverrides`].
#[derive(Debug, Default)]
struct ConfigExtras {
    frameworks: Vec<String>,
    sdk: Option<String>,
    arc: Option<bool>,
    modules: Option<bool>,
    product_name: Option<String>,
    precompile: bool,
}

fn read_settings(settings: &LayeredSettings<'_>) -> (ConfigOverrides, ConfigExtras) {
    let mut o = ConfigOverrides::default();
    let mut extras = ConfigExtras::default();

    o.cxx_standard = settings
        .string("CLANG_CXX_LANGUAGE_STANDARD")
        .and_then(|v| cxx_standard(&v));
    o.c_standard = settings.string("GCC_C_LANGUAGE_STANDARD").and_then(|v| c_standard(&v));
    o.deployment_target = settings
        .string("MACOSX_DEPLOYMENT_TARGET")
        .or_else(|| settings.string("IPHONEOS_DEPLOYMENT_TARGET"));
    o.architecture = settings.string("ARCHS").filter(|a| !a.contains('$'));
    o.bundle_id = settings.string("PRODUCT_BUNDLE_IDENTIFIER");
    o.info_plist = settings
        .string("INFOPLIST_FILE")
        .map(|p| normalize_path(&p, XCODE_PATH_MACROS));
    o.optimization = settings.string("GCC_OPTIMIZATION_LEVEL");
    o.dead_code_stripping = settings.flag("DEAD_CODE_STRIPPING");

    o.include_dirs = settings.paths(&["HEADER_SEARCH_PATHS", "USER_HEADER_SEARCH_PATHS"]);
    o.library_dirs = settings.paths(&["LIBRARY_SEARCH_PATHS"]);
    o.framework_dirs = settings.paths(&["FRAMEWORK_SEARCH_PATHS"]);
    o.definitions = settings.tokens(&["GCC_PREPROCESSOR_DEFINITIONS"]);
    o.compile_options = settings.tokens(&["OTHER_CFLAGS", "OTHER_CPLUSPLUSFLAGS"]);
    o.rpaths = settings.tokens(&["LD_RUNPATH_SEARCH_PATHS"]);

    let mut libraries = UniqueList::new();
    let mut link_options = UniqueList::new();
    let mut flags = settings.list("OTHER_LDFLAGS").into_iter();
    while let Some(flag) = flags.next() {
        if flag == "-framework" || flag == "-weak_framework" {
            extras.frameworks.extend(flags.next());
        } else if let Some(lib) = flag.strip_prefix("-l").filter(|l| !l.is_empty()) {
            libraries.push(lib);
        } else {
            link_options.push(flag);
        }
    }
    o.link_libraries = (!libraries.is_empty()).then_some(libraries);
    o.link_options = (!link_options.is_empty()).then_some(link_options);

    extras.precompile = settings.flag("GCC_PRECOMPILE_PREFIX_HEADER").unwrap_or(false);
    o.pch_header = settings
        .string("GCC_PREFIX_HEADER")
        .map(|p| normalize_path(&p, XCODE_PATH_MACROS));

    extras.sdk = settings.string("SDKROOT");
    extras.arc = settings.flag("CLANG_ENABLE_OBJC_ARC");
    extras.modules = settings.flag("CLANG_ENABLE_MODULES");
    extras.product_name = settings.string("PRODUCT_NAME").filter(|n| !n.contains('$'));

    (o, extras)
}

/// Scalars of the first configuration become the model's defaults.
fn apply_defaults(model: &mut ProjectModel, o: &ConfigOverrides, extras: &ConfigExtras) {
    model.c_standard = o.c_standard;
    model.cxx_standard = o.cxx_standard;
    model.optimization = o.optimization.clone();
    model.dead_code_stripping = o.dead_code_stripping;

    let p = &mut model.platform;
    p.deployment_target = o.deployment_target.clone();
    p.architecture = o.architecture.clone();
    p.bundle_id = o.bundle_id.clone();
    p.info_plist = o.info_plist.clone();
    p.sdk_version = extras.sdk.clone();
    p.arc = extras.arc;
    p.modules = extras.modules;

    if let Some(name) = &extras.product_name {
        model.product_name = Some(name.clone());
    }
    if let Some(header) = &o.pch_header {
        if extras.precompile {
            model.pch = Some(PchConfig {
                enabled: true,
                header: Some(header.clone()),
                ..PchConfig::default()
            });
        }
    }
}

fn read_configurations(graph: &ObjectGraph<'_>, target: &str, model: &mut ProjectModel) {
    let project: HashMap<String, Option<&str>> = graph
        .of_isa("PBXProject")
        .next()
        .and_then(|id| graph.get(id))
        .map(|body| configuration_list(graph, body).into_iter().collect())
        .unwrap_or_default();

    for (index, (name, target_settings)) in configuration_list(graph, target).into_iter().enumerate() {
        let settings = LayeredSettings {
            target: target_settings,
            project: project.get(&name).copied().flatten(),
        };
        let (overrides, extras) = read_settings(&settings);
        if index == 0 {
            apply_defaults(model, &overrides, &extras);
        }
        model.frameworks.extend(extras.frameworks);
        model.configurations.entry(name).or_default().absorb(&overrides);
    }

    model.hoist_shared_settings();
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Dependencies
// ═══════════════════════════════════════════════════════════════════════════════

fn read_dependencies(graph: &ObjectGraph<'_>, target: &str, model: &mut ProjectModel) {
    for dep_id in id_list(target, "dependencies") {
        let Some(dep) = graph.get(&dep_id) else {
            tracing::debug!(id = %dep_id, "dangling target dependency");
            continue;
        };
        let name = field_str(dep, "target")
            .and_then(|id| graph.get(&id))
            .and_then(|t| field_str(t, "name"))
            .or_else(|| field_str(dep, "name"))
            .or_else(|| {
                field_str(dep, "targetProxy")
                    .and_then(|id| graph.get(&id))
                    .and_then(|proxy| field_str(proxy, "remoteInfo"))
            });
        match name {
            Some(name) => {
                model.dependencies.push(name);
            }
            None => tracing::debug!(id = %dep_id, "unnamed target dependency"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn example() -> ProjectModel {
        parse_file("example.pbxproj").unwrap()
    }

    #[test]
    fn no_native_target_is_fatal() {
        let text = "{ objects = {\n\t\tA /* g */ = {isa = PBXGroup; children = (); };\n\t}; }";
        assert!(matches!(parse(text, "x"), Err(ProjectError::NoTarget)));
        assert!(matches!(parse("", "x"), Err(ProjectError::NoTarget)));
    }

    #[test]
    fn minimal_target_uses_fallback_name() {
        let text = "{ objects = {\n\t\tT /* t */ = {isa = PBXNativeTarget; buildPhases = (); };\n\t}; }";
        let model = parse(text, "Fallback").unwrap();
        assert_eq!(model.name, "Fallback");
        assert_eq!(model.kind, TargetKind::Application);
        assert!(model.configurations.is_empty());
    }

    #[test]
    fn example_target() {
        let model = example();
        assert_eq!(model.name, "Demo");
        assert_eq!(model.product_name.as_deref(), Some("DemoApp"));
        assert_eq!(model.kind, TargetKind::Application);
        assert_eq!(model.dependencies.as_slice(), ["Helper"]);
    }

    #[test]
    fn example_phases_classify_files() {
        let model = example();
        assert_eq!(
            model.source_files.as_slice(),
            ["main.mm", "Demo/AppDelegate.m", "Demo/Util Files/Util.cpp"]
        );
        assert_eq!(model.header_files.as_slice(), ["Shared.hpp", "Demo/AppDelegate.h"]);
        assert_eq!(model.resource_files.as_slice(), ["Demo/Assets.xcassets", "Demo/Credits.rtf"]);
    }

    #[test]
    fn example_linked_items() {
        let model = example();
        assert_eq!(model.frameworks.as_slice(), ["Cocoa", "Helper", "Metal"]);
        assert_eq!(model.link_libraries.as_slice(), ["z", "foo", "sqlite3"]);
        assert_eq!(model.link_options.as_slice(), ["-ObjC"]);
    }

    #[test]
    fn example_script_and_copy_phases() {
        let model = example();
        assert_eq!(model.shell_phases.len(), 2);

        let version = &model.shell_phases[0];
        assert_eq!(version.name.as_deref(), Some("Generate Version"));
        assert_eq!(version.shell.as_deref(), Some("/bin/sh"));
        assert!(version.before_compile);
        assert_eq!(version.input_paths, ["${CMAKE_CURRENT_SOURCE_DIR}/version.txt"]);
        assert_eq!(version.output_paths, ["$(DERIVED_FILE_DIR)/version.h"]);
        assert_eq!(
            version.script,
            "\"${SRCROOT}/scripts/version.sh\" > \"${DERIVED_FILE_DIR}/version.h\"\n"
        );

        let lint = &model.shell_phases[1];
        assert!(!lint.before_compile);
        assert!(lint.input_paths.is_empty());

        assert_eq!(
            model.copy_phases,
            [CopyFilesPhase {
                name: Some("Embed Frameworks".into()),
                subfolder_spec: Some(10),
                dst_path: String::new(),
                files: vec!["Helper.framework".into()],
            }]
        );
    }

    #[test]
    fn example_settings_layer_over_project() {
        let model = example();
        assert_eq!(model.configurations.keys().collect::<Vec<_>>(), ["Debug", "Release"]);

        let debug = &model.configurations["Debug"];
        assert_eq!(
            debug.definitions.as_ref().unwrap().as_slice(),
            ["DEBUG=1", "APP_DEBUG=1"]
        );
        let release = &model.configurations["Release"];
        assert_eq!(release.definitions.as_ref().unwrap().as_slice(), ["NDEBUG=1"]);
        assert_eq!(release.optimization.as_deref(), Some("s"));
        assert_eq!(release.cxx_standard, Some(17));
    }

    #[test]
    fn example_shared_settings_are_hoisted() {
        let model = example();
        assert_eq!(model.include_dirs.as_slice(), ["${CMAKE_CURRENT_SOURCE_DIR}/include"]);
        assert_eq!(model.library_dirs.as_slice(), ["${CMAKE_CURRENT_SOURCE_DIR}/vendor"]);
        assert_eq!(model.compile_options.as_slice(), ["-Wall", "-Wextra"]);
        assert_eq!(model.rpaths.as_slice(), ["@executable_path/../Frameworks"]);
        assert!(model.definitions.is_empty());
        assert_eq!(
            model.configurations["Debug"].include_dirs.as_ref().unwrap().as_slice(),
            ["${CMAKE_CURRENT_SOURCE_DIR}/include", "${CMAKE_CURRENT_SOURCE_DIR}/third_party"]
        );
    }

    #[test]
    fn example_first_configuration_defaults() {
        let model = example();
        assert_eq!(model.cxx_standard, Some(17));
        assert_eq!(model.c_standard, Some(11));
        assert_eq!(model.optimization.as_deref(), Some("0"));
        assert_eq!(model.dead_code_stripping, Some(true));

        let p = &model.platform;
        assert_eq!(p.deployment_target.as_deref(), Some("12.0"));
        assert_eq!(p.architecture.as_deref(), Some("arm64"));
        assert_eq!(p.sdk_version.as_deref(), Some("macosx"));
        assert_eq!(p.bundle_id.as_deref(), Some("com.example.demo"));
        assert_eq!(p.info_plist.as_deref(), Some("Demo/Info.plist"));
        assert_eq!(p.arc, Some(true));
        assert_eq!(p.modules, Some(true));

        let pch = model.pch.as_ref().unwrap();
        assert!(pch.enabled);
        assert_eq!(pch.header.as_deref(), Some("Demo/Prefix.pch"));
    }

    #[test]
    fn linked_item_classification() {
        assert_eq!(classify_linked("System/Library/Frameworks/Cocoa.framework"), LinkedItem::Framework("Cocoa".into()));
        assert_eq!(classify_linked("usr/lib/libz.tbd"), LinkedItem::Library("z".into()));
        assert_eq!(classify_linked("libc++.dylib"), LinkedItem::Library("c++".into()));
        assert_eq!(classify_linked("vendor/libfoo.a"), LinkedItem::Library("foo".into()));
        assert_eq!(classify_linked("Custom.o"), LinkedItem::Library("Custom.o".into()));
    }

    #[test]
    fn product_types() {
        assert_eq!(product_kind("com.apple.product-type.library.static"), TargetKind::StaticLibrary);
        assert_eq!(product_kind("com.apple.product-type.bundle.unit-test"), TargetKind::Bundle);
        assert_eq!(product_kind("com.apple.product-type.tool"), TargetKind::Application);
        assert_eq!(product_kind("com.apple.product-type.framework"), TargetKind::Framework);
    }

    #[test]
    fn language_standards() {
        assert_eq!(cxx_standard("gnu++2a"), Some(20));
        assert_eq!(cxx_standard("compiler-default"), None);
        assert_eq!(c_standard("ansi"), Some(90));
    }

    #[test]
    fn references_are_recognized() {
        assert!(is_setting_reference("$(OTHER_CFLAGS)"));
        assert!(is_setting_reference("${inherited}"));
        assert!(!is_setting_reference("$(SRCROOT)/include"));
        assert!(!is_setting_reference("$(A)$(B)"));
    }
}
