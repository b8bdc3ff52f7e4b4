//! apiscope: framework-aware static analysis engine. Discovers which web
//! framework(s) a source tree uses and extracts its HTTP API surface
//! (routes, parameters, request/response schemas) into a language-neutral
//! intermediate representation an OpenAPI emitter can consume.
//!
//! This crate is the engine only (spec.md §1's "hard core"): the caller
//! supplies a project root and a pre-classified file list (via [`scan`]),
//! and is responsible for argument parsing, logging setup, and assembling
//! the final document.

pub mod error;
pub mod plugins;
pub mod scan;

pub use error::{EngineError, ResultExt};
pub use plugins::{global_registry, DispatchResult, FrameworkPlugin, PluginInfo, Registry};
pub use scan::{DefaultWalker, FileWalker, WalkConfig};
