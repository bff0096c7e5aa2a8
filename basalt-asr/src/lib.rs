//  LIB.rs
//    by Lut99
//
//  Created:
//    12 Mar 2024, 13:40:22
//  Last edited:
//    22 Jul 2024, 16:01:37
//  Auto updated?
//    Yes
//
//  Description:
//!   The `basalt-asr` crate defines the Abstract Semantic Representation
//!   (ASR) at the heart of the Basalt compiler: the typed,
//!   fully-resolved form every program passes through between semantic
//!   analysis and code generation.
//!
//!   The crate owns the node algebra and its invariants, the scoped
//!   symbol tables, the arena binding one translation unit together, the
//!   builder the semantic analyser constructs trees through, the
//!   visitor/transformer framework passes are written against, the
//!   module-interface codec, and the canonical pickle used for reference
//!   tests. Parsing, semantic analysis itself, the backends and the
//!   driver all live in their own crates and only meet this one through
//!   the types defined here.
//

// Declare modules
pub mod errors;
pub mod arena;
pub mod asr;
pub mod builder;
pub mod compiler;
pub mod serial;

// Bring the everyday surface into the crate namespace
pub use arena::{AsrArena, ScopeId, SymbolId};
pub use asr::TranslationUnit;
pub use builder::UnitBuilder;
pub use compiler::traversals::pickle::{pickle, structurally_eq};
pub use compiler::visitor::{transform_unit, visit_unit, AsrTransformer, AsrVisitor};
pub use errors::{BuildError, SerialError, Violation};
pub use serial::{decode, encode, read_module_file, write_module_file};

/// Checks a whole unit against the well-formedness invariants, collecting every violation.
///
/// Shorthand for the validation traversal; see
/// [`compiler::traversals::validate::traverse()`].
#[inline]
pub fn validate(unit: &TranslationUnit) -> Vec<Violation> {
    compiler::traversals::validate::traverse(unit)
}
