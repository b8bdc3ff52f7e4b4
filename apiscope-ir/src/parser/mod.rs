//! Parser layer (spec.md §2.1, §4.3): per-host-language concrete-syntax
//! parsing, split into a tree-sitter-backed family (TypeScript/JavaScript/
//! Go) and a line-oriented family (Ruby/Scala/Kotlin).

pub mod line_oriented;
pub mod treesitter;

pub use treesitter::ParsedFile;
