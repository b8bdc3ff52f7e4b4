//! apiscope-ir: language-agnostic intermediate representation, schema model
//! and source parsers that back the apiscope route/schema extractor.
//!
//! # Design philosophy
//!
//! Framework plugins are best-effort observation instruments, not compilers:
//! a route declaration the walker can't make sense of is skipped with a
//! diagnostic, not a hard failure. The crate is organized in four layers:
//!
//! 1. **Data model** ([`model`], [`schema`]) — the `Route`/`Parameter`/
//!    `Schema` records every plugin produces, plus the shared
//!    `SchemaRegistry`.
//! 2. **Shared utilities** ([`path_utils`]) — path combination, parameter
//!    conversion, operation-id and tag derivation, factored out so every
//!    plugin applies the same rules.
//! 3. **Schema extraction** ([`validator_dsl`], [`struct_translate`]) —
//!    turning validator-chain calls and struct/interface/case-class
//!    declarations into `Schema` values.
//! 4. **Parsing** ([`parser`]) — tree-sitter-backed parsing for
//!    TypeScript/JavaScript/Go, and a line-oriented parser for Ruby/Scala/
//!    Kotlin source the pack carries no grammar crate for.

pub mod error;
pub mod model;
pub mod parser;
pub mod path_utils;
pub mod schema;
pub mod struct_translate;
pub mod validator_dsl;

pub use error::{AstError, ResultExt};
pub use model::{
    Language, MediaTypeContent, Method, Parameter, ParameterLocation, RequestBody, Response,
    Route, SourceFile, Span,
};
pub use schema::{Schema, SchemaRegistry, SchemaType};

/// Version of the IR schema emitted in the `{routes, schemas}` document.
pub const IR_VERSION: &str = "v1";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
