//! Normalized project model shared by the descriptor parsers and the CMake
//! generator.
//!
//! A [`ProjectModel`] is built once per parse call and then handed, read
//! only, to the generator.  Top-level fields hold values that apply to every
//! configuration; [`ConfigOverrides`] hold what a single configuration adds
//! or replaces, and only contain fields that were actually observed.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

// ═══════════════════════════════════════════════════════════════════════════════
//  UniqueList
// ═══════════════════════════════════════════════════════════════════════════════

/// Insertion-ordered list of strings without duplicates.
///
/// Empty entries and MSBuild inheritance placeholders (`%(Field)`) are
/// rejected on insertion, so a finished list never contains either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UniqueList(Vec<String>);

impl UniqueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `item` unless it is empty, a placeholder, or already present.
    /// Returns `true` when the item was added.
    pub fn push(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if item.is_empty() || is_inheritance_placeholder(&item) || self.contains(&item) {
            return false;
        }
        self.0.push(item);
        true
    }

    pub fn extend<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for item in items {
            self.push(item);
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.iter().any(|i| i == item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

}

impl<S: Into<String>> FromIterator<S> for UniqueList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<'a> IntoIterator for &'a UniqueList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// `true` for the MSBuild `%(FieldName)` "inherit parent value" token.
pub fn is_inheritance_placeholder(token: &str) -> bool {
    token.starts_with("%(") && token.ends_with(')')
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Enumerations
// ═══════════════════════════════════════════════════════════════════════════════

/// What kind of artifact the target produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum TargetKind {
    #[default]
    Application,
    StaticLibrary,
    DynamicLibrary,
    Framework,
    Bundle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CharacterSet {
    Unicode,
    MultiByte,
    NotSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Subsystem {
    Console,
    Windows,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Records
// ═══════════════════════════════════════════════════════════════════════════════

/// Platform and SDK metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub sdk_version: Option<String>,
    pub toolset: Option<String>,
    pub deployment_target: Option<String>,
    pub architecture: Option<String>,
    pub bundle_id: Option<String>,
    pub info_plist: Option<String>,
    pub arc: Option<bool>,
    pub modules: Option<bool>,
    pub character_set: Option<CharacterSet>,
    pub subsystem: Option<Subsystem>,
}

/// Precompiled-header descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PchConfig {
    /// Set when the project-wide setting asks translation units to use the PCH.
    pub enabled: bool,
    pub header: Option<String>,
    /// The source file that produces the PCH.
    pub source: Option<String>,
    /// Files compiled without the PCH.
    pub excluded: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildEventKind {
    PreBuild,
    PreLink,
    PostBuild,
    CustomBuild,
}

impl BuildEventKind {
    pub const ALL: [BuildEventKind; 4] = [
        BuildEventKind::PreBuild,
        BuildEventKind::PreLink,
        BuildEventKind::PostBuild,
        BuildEventKind::CustomBuild,
    ];

    /// The MSBuild element that carries this event inside an
    /// `ItemDefinitionGroup`.
    pub fn msbuild_tag(self) -> &'static str {
        match self {
            BuildEventKind::PreBuild => "PreBuildEvent",
            BuildEventKind::PreLink => "PreLinkEvent",
            BuildEventKind::PostBuild => "PostBuildEvent",
            BuildEventKind::CustomBuild => "CustomBuildStep",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildEvent {
    pub kind: BuildEventKind,
    pub command: String,
    pub message: Option<String>,
    /// Only meaningful for [`BuildEventKind::CustomBuild`].
    pub outputs: Vec<String>,
    /// Configuration the event is restricted to, `None` for all.
    pub configuration: Option<String>,
    pub enabled: bool,
}

/// An Xcode `PBXShellScriptBuildPhase`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShellScriptPhase {
    pub name: Option<String>,
    pub shell: Option<String>,
    pub script: String,
    pub input_paths: Vec<String>,
    pub output_paths: Vec<String>,
    /// Whether the phase is listed before the target's Sources phase.
    pub before_compile: bool,
}

/// An Xcode `PBXCopyFilesBuildPhase`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyFilesPhase {
    pub name: Option<String>,
    /// Raw `dstSubfolderSpec` code (1 absolute, 7 resources, 10 frameworks …).
    pub subfolder_spec: Option<u32>,
    pub dst_path: String,
    pub files: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Per-configuration overrides
// ═══════════════════════════════════════════════════════════════════════════════

/// Values observed for a single configuration.  A field is `Some` only if
/// the descriptor set it for that configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigOverrides {
    pub include_dirs: Option<UniqueList>,
    pub definitions: Option<UniqueList>,
    pub link_libraries: Option<UniqueList>,
    pub library_dirs: Option<UniqueList>,
    pub framework_dirs: Option<UniqueList>,
    pub compile_options: Option<UniqueList>,
    pub link_options: Option<UniqueList>,
    pub rpaths: Option<UniqueList>,
    pub c_standard: Option<u32>,
    pub cxx_standard: Option<u32>,
    pub runtime_library: Option<String>,
    pub optimization: Option<String>,
    pub warning_level: Option<String>,
    pub treat_warnings_as_errors: Option<bool>,
    pub dead_code_stripping: Option<bool>,
    pub deployment_target: Option<String>,
    pub architecture: Option<String>,
    pub bundle_id: Option<String>,
    pub info_plist: Option<String>,
    pub pch_header: Option<String>,
}

/// Fill `slot` from `other` when `slot` is still empty.
fn absorb_scalar<T: Clone>(slot: &mut Option<T>, other: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(other);
    }
}

fn absorb_list(slot: &mut Option<UniqueList>, other: &Option<UniqueList>) {
    if let Some(items) = other {
        slot.get_or_insert_with(UniqueList::new).extend(items.iter());
    }
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combine another record for the same configuration (e.g. a second
    /// platform's group).  Lists are concatenated; scalars already present
    /// in `self` win.
    pub fn absorb(&mut self, other: &ConfigOverrides) {
        absorb_list(&mut self.include_dirs, &other.include_dirs);
        absorb_list(&mut self.definitions, &other.definitions);
        absorb_list(&mut self.link_libraries, &other.link_libraries);
        absorb_list(&mut self.library_dirs, &other.library_dirs);
        absorb_list(&mut self.framework_dirs, &other.framework_dirs);
        absorb_list(&mut self.compile_options, &other.compile_options);
        absorb_list(&mut self.link_options, &other.link_options);
        absorb_list(&mut self.rpaths, &other.rpaths);
        absorb_scalar(&mut self.c_standard, &other.c_standard);
        absorb_scalar(&mut self.cxx_standard, &other.cxx_standard);
        absorb_scalar(&mut self.runtime_library, &other.runtime_library);
        absorb_scalar(&mut self.optimization, &other.optimization);
        absorb_scalar(&mut self.warning_level, &other.warning_level);
        absorb_scalar(&mut self.treat_warnings_as_errors, &other.treat_warnings_as_errors);
        absorb_scalar(&mut self.dead_code_stripping, &other.dead_code_stripping);
        absorb_scalar(&mut self.deployment_target, &other.deployment_target);
        absorb_scalar(&mut self.architecture, &other.architecture);
        absorb_scalar(&mut self.bundle_id, &other.bundle_id);
        absorb_scalar(&mut self.info_plist, &other.info_plist);
        absorb_scalar(&mut self.pch_header, &other.pch_header);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  ProjectModel
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectModel {
    pub name: String,
    pub kind: TargetKind,
    pub product_name: Option<String>,

    pub source_files: UniqueList,
    pub header_files: UniqueList,
    pub resource_files: UniqueList,
    pub other_files: UniqueList,

    pub include_dirs: UniqueList,
    pub definitions: UniqueList,
    pub link_libraries: UniqueList,
    pub frameworks: UniqueList,
    pub compile_options: UniqueList,
    pub link_options: UniqueList,
    pub library_dirs: UniqueList,
    pub framework_dirs: UniqueList,
    pub rpaths: UniqueList,

    pub c_standard: Option<u32>,
    pub cxx_standard: Option<u32>,
    pub runtime_library: Option<String>,
    pub optimization: Option<String>,
    pub warning_level: Option<String>,
    pub treat_warnings_as_errors: Option<bool>,
    pub dead_code_stripping: Option<bool>,

    pub platform: PlatformInfo,
    pub pch: Option<PchConfig>,
    pub build_events: Vec<BuildEvent>,
    pub shell_phases: Vec<ShellScriptPhase>,
    pub copy_phases: Vec<CopyFilesPhase>,
    pub dependencies: UniqueList,

    pub configurations: BTreeMap<String, ConfigOverrides>,
}

impl ProjectModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Flatten the model for one configuration: the top-level values with
    /// that configuration's overrides merged on top.  The returned model has
    /// no per-configuration map.
    pub fn effective(&self, configuration: &str) -> ProjectModel {
        let mut flat = self.clone();
        flat.configurations.clear();
        flat.build_events.retain(|e| match &e.configuration {
            Some(c) => c == configuration,
            None => true,
        });
        let Some(o) = self.configurations.get(configuration) else {
            return flat;
        };

        flat.include_dirs = merge_list(&self.include_dirs, o.include_dirs.as_ref());
        flat.definitions = merge_list(&self.definitions, o.definitions.as_ref());
        flat.link_libraries = merge_list(&self.link_libraries, o.link_libraries.as_ref());
        flat.library_dirs = merge_list(&self.library_dirs, o.library_dirs.as_ref());
        flat.framework_dirs = merge_list(&self.framework_dirs, o.framework_dirs.as_ref());
        flat.compile_options = merge_list(&self.compile_options, o.compile_options.as_ref());
        flat.link_options = merge_list(&self.link_options, o.link_options.as_ref());
        flat.rpaths = merge_list(&self.rpaths, o.rpaths.as_ref());

        flat.c_standard = merge_scalar(self.c_standard.as_ref(), o.c_standard.as_ref());
        flat.cxx_standard = merge_scalar(self.cxx_standard.as_ref(), o.cxx_standard.as_ref());
        flat.runtime_library = merge_scalar(self.runtime_library.as_ref(), o.runtime_library.as_ref());
        flat.optimization = merge_scalar(self.optimization.as_ref(), o.optimization.as_ref());
        flat.warning_level = merge_scalar(self.warning_level.as_ref(), o.warning_level.as_ref());
        flat.treat_warnings_as_errors = merge_scalar(
            self.treat_warnings_as_errors.as_ref(),
            o.treat_warnings_as_errors.as_ref(),
        );
        flat.dead_code_stripping =
            merge_scalar(self.dead_code_stripping.as_ref(), o.dead_code_stripping.as_ref());

        let p = &mut flat.platform;
        p.deployment_target =
            merge_scalar(self.platform.deployment_target.as_ref(), o.deployment_target.as_ref());
        p.architecture = merge_scalar(self.platform.architecture.as_ref(), o.architecture.as_ref());
        p.bundle_id = merge_scalar(self.platform.bundle_id.as_ref(), o.bundle_id.as_ref());
        p.info_plist = merge_scalar(self.platform.info_plist.as_ref(), o.info_plist.as_ref());

        if let (Some(pch), Some(header)) = (flat.pch.as_mut(), o.pch_header.as_ref()) {
            pch.header = Some(header.clone());
        }

        flat
    }

    /// Copy settings every configuration agrees on to the top level.
    ///
    /// List entries present in all configurations are appended to the
    /// top-level list; the language standards, which cannot vary per
    /// configuration in a build script, are taken from the first
    /// configuration that sets them when the top level has none.  Override
    /// records are left untouched.
    pub fn hoist_shared_settings(&mut self) {
        if self.configurations.is_empty() {
            return;
        }

        let shared = |pick: fn(&ConfigOverrides) -> Option<&UniqueList>| -> Vec<String> {
            let mut configs = self.configurations.values();
            let Some(first) = configs.next().and_then(pick) else {
                return Vec::new();
            };
            first
                .iter()
                .filter(|entry| {
                    self.configurations
                        .values()
                        .all(|o| pick(o).is_some_and(|l| l.contains(entry)))
                })
                .map(String::from)
                .collect()
        };

        let include_dirs = shared(|o| o.include_dirs.as_ref());
        let definitions = shared(|o| o.definitions.as_ref());
        let link_libraries = shared(|o| o.link_libraries.as_ref());
        let library_dirs = shared(|o| o.library_dirs.as_ref());
        let framework_dirs = shared(|o| o.framework_dirs.as_ref());
        let compile_options = shared(|o| o.compile_options.as_ref());
        let link_options = shared(|o| o.link_options.as_ref());
        let rpaths = shared(|o| o.rpaths.as_ref());

        self.include_dirs.extend(include_dirs);
        self.definitions.extend(definitions);
        self.link_libraries.extend(link_libraries);
        self.library_dirs.extend(library_dirs);
        self.framework_dirs.extend(framework_dirs);
        self.compile_options.extend(compile_options);
        self.link_options.extend(link_options);
        self.rpaths.extend(rpaths);

        if self.c_standard.is_none() {
            self.c_standard = self.configurations.values().find_map(|o| o.c_standard);
        }
        if self.cxx_standard.is_none() {
            self.cxx_standard = self.configurations.values().find_map(|o| o.cxx_standard);
        }
    }

    /// `true` when a precompiled-header directive can actually be emitted.
    pub fn uses_precompiled_header(&self) -> bool {
        self.pch.as_ref().is_some_and(|p| p.enabled && p.header.is_some())
    }

    /// `true` when any configuration carries a non-empty override list.
    pub(crate) fn any_list<F>(&self, pick: F) -> bool
    where
        F: Fn(&ConfigOverrides) -> Option<&UniqueList>,
    {
        self.configurations
            .values()
            .any(|o| pick(o).is_some_and(|l| !l.is_empty()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Merge functions
// ═══════════════════════════════════════════════════════════════════════════════

/// List fields: base entries followed by override entries, de-duplicated.
pub fn merge_list(base: &UniqueList, over: Option<&UniqueList>) -> UniqueList {
    let mut merged = base.clone();
    if let Some(over) = over {
        merged.extend(over.iter());
    }
    merged
}

/// Scalar fields: the override when present, the base otherwise.
pub fn merge_scalar<T: Clone>(base: Option<&T>, over: Option<&T>) -> Option<T> {
    over.or(base).cloned()
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Path helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Convert separators to `/` and rewrite build-system macros through
/// `table`, collapsing the doubled separator left behind when a macro
/// already ends in `/`.
pub(crate) fn normalize_path(raw: &str, table: &[(&str, &str)]) -> String {
    let mut path = raw.trim().replace('\\', "/");
    for (from, to) in table {
        if path.contains(from) {
            path = path.replace(from, to);
        }
    }
    while path.contains("}//") {
        path = path.replace("}//", "}/");
    }
    path
}

// ═══════════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_list_keeps_first_occurrence_order() {
        let list: UniqueList = ["b", "a", "b", "c", "a"].into_iter().collect();
        assert_eq!(list.as_slice(), ["b", "a", "c"]);
    }

    #[test]
    fn unique_list_rejects_placeholders_and_empty() {
        let mut list = UniqueList::new();
        assert!(!list.push("%(AdditionalIncludeDirectories)"));
        assert!(!list.push(""));
        assert!(list.push("include"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn merge_list_concatenates_and_dedupes() {
        let base: UniqueList = ["WIN32", "_CONSOLE"].into_iter().collect();
        let over: UniqueList = ["_DEBUG", "WIN32"].into_iter().collect();
        let merged = merge_list(&base, Some(&over));
        assert_eq!(merged.as_slice(), ["WIN32", "_CONSOLE", "_DEBUG"]);
        assert_eq!(merge_list(&base, None), base);
    }

    #[test]
    fn merge_scalar_prefers_override() {
        assert_eq!(merge_scalar(Some(&14), Some(&17)), Some(17));
        assert_eq!(merge_scalar(Some(&14), None), Some(14));
        assert_eq!(merge_scalar::<u32>(None, None), None);
    }

    #[test]
    fn effective_applies_one_configuration() {
        let mut model = ProjectModel::new("app");
        model.definitions.push("WIN32");
        model.cxx_standard = Some(14);
        model.configurations.insert(
            "Debug".into(),
            ConfigOverrides {
                definitions: Some(["_DEBUG"].into_iter().collect()),
                cxx_standard: Some(17),
                ..Default::default()
            },
        );

        let debug = model.effective("Debug");
        assert_eq!(debug.definitions.as_slice(), ["WIN32", "_DEBUG"]);
        assert_eq!(debug.cxx_standard, Some(17));
        assert!(debug.configurations.is_empty());

        let release = model.effective("Release");
        assert_eq!(release.definitions.as_slice(), ["WIN32"]);
        assert_eq!(release.cxx_standard, Some(14));
    }

    #[test]
    fn effective_filters_build_events_by_configuration() {
        let mut model = ProjectModel::new("app");
        for cfg in [None, Some("Debug"), Some("Release")] {
            model.build_events.push(BuildEvent {
                kind: BuildEventKind::PostBuild,
                command: "echo".into(),
                message: None,
                outputs: Vec::new(),
                configuration: cfg.map(String::from),
                enabled: true,
            });
        }
        assert_eq!(model.effective("Debug").build_events.len(), 2);

        model.configurations.insert("Debug".into(), ConfigOverrides::default());
        let release = model.effective("Release");
        assert_eq!(release.build_events.len(), 2);
        assert!(release.build_events.iter().all(|e| e.configuration.as_deref() != Some("Debug")));
        assert_eq!(model.effective("Debug").build_events.len(), 2);
    }

    #[test]
    fn absorb_keeps_existing_scalars() {
        let mut a = ConfigOverrides {
            runtime_library: Some("MultiThreadedDebug".into()),
            include_dirs: Some(["x86"].into_iter().collect()),
            ..Default::default()
        };
        let b = ConfigOverrides {
            runtime_library: Some("MultiThreadedDebugDLL".into()),
            include_dirs: Some(["x64"].into_iter().collect()),
            ..Default::default()
        };
        a.absorb(&b);
        assert_eq!(a.runtime_library.as_deref(), Some("MultiThreadedDebug"));
        assert_eq!(a.include_dirs.unwrap().as_slice(), ["x86", "x64"]);
    }

    #[test]
    fn normalize_path_rewrites_macros() {
        let table = [("$(ProjectDir)", "${CMAKE_CURRENT_SOURCE_DIR}/")];
        assert_eq!(
            normalize_path("$(ProjectDir)\\include", &table),
            "${CMAKE_CURRENT_SOURCE_DIR}/include"
        );
        assert_eq!(normalize_path("src\\main.cpp", &[]), "src/main.cpp");
    }

    #[test]
    fn hoist_moves_common_entries_to_top_level() {
        let mut model = ProjectModel::new("app");
        model.definitions.push("GLOBAL");
        for (name, defs, std) in [("Debug", ["_DEBUG", "_CONSOLE"], None), ("Release", ["NDEBUG", "_CONSOLE"], Some(20))] {
            model.configurations.insert(
                name.into(),
                ConfigOverrides {
                    definitions: Some(defs.into_iter().collect()),
                    cxx_standard: std,
                    ..Default::default()
                },
            );
        }
        model.hoist_shared_settings();
        assert_eq!(model.definitions.as_slice(), ["GLOBAL", "_CONSOLE"]);
        assert_eq!(model.cxx_standard, Some(20));
        // Overrides keep exactly what was observed.
        let debug = model.configurations["Debug"].definitions.as_ref().unwrap();
        assert_eq!(debug.as_slice(), ["_DEBUG", "_CONSOLE"]);
    }

    #[test]
    fn hoist_skips_entries_missing_from_a_configuration() {
        let mut model = ProjectModel::new("app");
        model.configurations.insert(
            "Debug".into(),
            ConfigOverrides { include_dirs: Some(["inc"].into_iter().collect()), ..Default::default() },
        );
        model.configurations.insert("Release".into(), ConfigOverrides::default());
        model.hoist_shared_settings();
        assert!(model.include_dirs.is_empty());
    }

    #[test]
    fn pch_requires_header_to_be_used() {
        let mut model = ProjectModel::new("app");
        model.pch = Some(PchConfig { enabled: true, ..Default::default() });
        assert!(!model.uses_precompiled_header());
        model.pch.as_mut().unwrap().header = Some("pch.h".into());
        assert!(model.uses_precompiled_header());
    }
}
