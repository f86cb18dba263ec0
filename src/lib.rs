//! Convert Visual Studio `.vcxproj` and Xcode `.pbxproj` project descriptors
//! into CMake build scripts.
//!
//! ```no_run
//! let model = projconv::vcxproj::parse_file("app.vcxproj")?;
//! std::fs::write("CMakeLists.txt", projconv::generate_vcxproj(&model))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod args;
pub mod condition;
pub mod error;
pub mod generator;
pub mod model;
pub mod pbxproj;
pub mod resolver;
pub mod vcxproj;
pub mod xcode;

pub use error::ProjectError;
pub use generator::{CMakeVersion, Flavor, generate_vcxproj, generate_xcode, minimum_version};
pub use model::{ConfigOverrides, ProjectModel, TargetKind, UniqueList};
pub use resolver::{ResolvedPath, ResolverBuilder, ResolverSettings, VariableResolver};
