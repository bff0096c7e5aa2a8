//  ERRORS.rs
//    by Lut99
//
//  Created:
//    14 Mar 2024, 16:20:05
//  Last edited:
//    11 Jul 2024, 13:44:19
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines errors originating from the `basalt-asr` crate.
//!
//!   There is one enum per concern: [`BuildError`] for rejections raised
//!   at the offending builder call, [`Violation`] for invariant breaches
//!   collected by the validation traversal, and [`SerialError`] for
//!   failures of the module-interface codec. The core never prints;
//!   collaborators render these however they see fit.
//

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};
use std::path::PathBuf;

use enum_debug::EnumDebug;

use crate::arena::ScopeId;
use crate::asr::spec::{Abi, Deftype};
use crate::asr::types::Ttype;


/***** LIBRARY *****/
/// Defines errors raised by the builder at the offending call.
///
/// These are never recovered internally; the elaboration collaborator decides what to do with the
/// construction attempt.
#[derive(Debug, EnumDebug)]
pub enum BuildError {
    /// Inserting a symbol collided with an existing name in the target scope.
    DuplicateName { name: String, scope: ScopeId },
    /// A lookup from some site produced nothing, and the site is not an external symbol.
    UnresolvedName { name: String, scope: ScopeId },
    /// An external symbol's `(module_name, scope_names)` path does not locate its target.
    UnresolvedExternal { module_name: String, scope_names: Vec<String>, name: String },

    /// A comparison or logical operation was declared with a non-logical type.
    NotLogical { what: &'static str, got: Ttype },
    /// An arithmetic operation was given a non-numeric operand.
    NonNumericOperand { op: String, got: Ttype },
    /// A string operation was given a non-character operand.
    NonCharacterOperand { op: String, got: Ttype },
    /// A folded value was attached whose node is not a constant.
    ValueNotConstant { variant: String },
    /// A folded value was attached whose type differs from the expression's type.
    ValueTypeMismatch { expected: Ttype, got: Ttype },

    /// A function was finalized without exactly one return variable.
    ReturnVarMissing { function: String },
    /// A function was finalized with more than one return variable.
    ReturnVarDuplicated { function: String, count: usize },
    /// A function's recorded return variable is not the `ReturnVar`-intent variable in its scope.
    ReturnVarMismatch { function: String },
    /// A procedure was finalized with an unpaired goto label.
    UnmatchedGoTo { procedure: String, id: u32 },
    /// A procedure was finalized with an unpaired goto target label.
    UnmatchedGoToTarget { procedure: String, id: u32 },
    /// A procedure's ABI and definition type contradict each other.
    AbiBodyMismatch { procedure: String, abi: Abi, deftype: Deftype, body_len: usize },
}
impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use BuildError::*;
        match self {
            DuplicateName { name, scope }  => write!(f, "Name '{name}' already exists in scope {scope}"),
            UnresolvedName { name, scope } => write!(f, "Name '{name}' is not reachable from scope {scope}"),
            UnresolvedExternal { module_name, scope_names, name } => write!(
                f,
                "External path '{}' does not locate a symbol",
                std::iter::once(module_name.as_str()).chain(scope_names.iter().map(|s| s.as_str())).chain(std::iter::once(name.as_str())).collect::<Vec<&str>>().join("::"),
            ),

            NotLogical { what, got }       => write!(f, "A {what} must have a logical type, got {got}"),
            NonNumericOperand { op, got }  => write!(f, "Operator '{op}' requires numeric operands, got {got}"),
            NonCharacterOperand { op, got } => write!(f, "Operator '{op}' requires character operands, got {got}"),
            ValueNotConstant { variant }   => write!(f, "Folded value must be a constant node, got {variant}"),
            ValueTypeMismatch { expected, got } => write!(f, "Folded value has type {got}, but the expression has type {expected}"),

            ReturnVarMissing { function }  => write!(f, "Function '{function}' has no return variable"),
            ReturnVarDuplicated { function, count } => write!(f, "Function '{function}' has {count} return variables (expected exactly 1)"),
            ReturnVarMismatch { function } => write!(f, "Function '{function}' records a return variable that is not its ReturnVar-intent variable"),
            UnmatchedGoTo { procedure, id } => write!(f, "GoTo label {id} in procedure '{procedure}' has no matching target"),
            UnmatchedGoToTarget { procedure, id } => write!(f, "GoTo target label {id} in procedure '{procedure}' has no matching goto"),
            AbiBodyMismatch { procedure, abi, deftype, body_len } => write!(f, "Procedure '{procedure}' combines abi '{abi}' and deftype '{deftype}' with a body of {body_len} statement(s)"),
        }
    }
}
impl Error for BuildError {}



/// Defines one invariant breach found by the validation traversal.
///
/// Validation does not stop at the first breach; it traverses the whole unit and collects every
/// violation it can find.
#[derive(Debug, EnumDebug)]
pub enum Violation {
    /// An expression's declared type is inconsistent with its node kind.
    ExprTypeInconsistent { variant: String, got: Ttype },
    /// A folded value is not a constant node.
    ValueNotConstant { variant: String },
    /// A folded value's type differs from its expression's type.
    ValueTypeMismatch { expected: Ttype, got: Ttype },
    /// A function does not have exactly one `ReturnVar`-intent variable.
    ReturnVarCount { function: String, count: usize },
    /// A function's recorded return variable disagrees with its scope.
    ReturnVarMismatch { function: String },
    /// A procedure with `Source` ABI has no body, or an interface procedure has one.
    AbiBodyMismatch { procedure: String, abi: Abi, deftype: Deftype, body_len: usize },
    /// A goto label has no matching target in its procedure.
    UnmatchedGoTo { procedure: String, id: u32 },
    /// A goto target label has no matching goto in its procedure.
    UnmatchedGoToTarget { procedure: String, id: u32 },
    /// A derived type's parent is not a derived type.
    DerivedParentNotDerived { name: String },
    /// A scope is its own ancestor.
    ScopeCycle { scope: ScopeId },
    /// A symbol reference in a body neither resolves by walking parent scopes nor is external.
    UnreachableReference { procedure: String, symbol: String },
}
impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use Violation::*;
        match self {
            ExprTypeInconsistent { variant, got } => write!(f, "Invariant violation: {variant} expression carries inconsistent type {got}"),
            ValueNotConstant { variant }          => write!(f, "Invariant violation: folded value is a non-constant {variant} node"),
            ValueTypeMismatch { expected, got }   => write!(f, "Invariant violation: folded value has type {got}, expression has type {expected}"),
            ReturnVarCount { function, count }    => write!(f, "Invariant violation: function '{function}' has {count} ReturnVar variables (expected exactly 1)"),
            ReturnVarMismatch { function }        => write!(f, "Invariant violation: function '{function}' records a return variable that is not its ReturnVar-intent variable"),
            AbiBodyMismatch { procedure, abi, deftype, body_len } => write!(f, "Invariant violation: procedure '{procedure}' combines abi '{abi}' and deftype '{deftype}' with a body of {body_len} statement(s)"),
            UnmatchedGoTo { procedure, id }       => write!(f, "Invariant violation: GoTo label {id} in procedure '{procedure}' has no matching target"),
            UnmatchedGoToTarget { procedure, id } => write!(f, "Invariant violation: GoTo target label {id} in procedure '{procedure}' has no matching goto"),
            DerivedParentNotDerived { name }      => write!(f, "Invariant violation: parent of derived type '{name}' is not a derived type"),
            ScopeCycle { scope }                  => write!(f, "Invariant violation: scope {scope} is its own ancestor"),
            UnreachableReference { procedure, symbol } => write!(f, "Invariant violation: '{symbol}' referenced in procedure '{procedure}' is neither reachable through parent scopes nor external"),
        }
    }
}
impl Error for Violation {}



/// Defines errors raised by the module-interface codec.
///
/// A failure aborts the load of that module only; previously loaded units are untouched.
#[derive(Debug, EnumDebug)]
pub enum SerialError {
    /// The stream does not start with the module-file magic.
    BadMagic { got: [u8; 4] },
    /// The stream's schema version is not the one this reader implements.
    SchemaMismatch { got: u16, expected: u16 },

    /// The stream ended in the middle of a value.
    UnexpectedEof { what: &'static str },
    /// A variant tag is not part of the schema.
    BadTag { what: &'static str, tag: u8 },
    /// A string is not valid UTF-8.
    BadUtf8 { what: &'static str },
    /// A symbol ordinal skips ahead of the ordinals handed out so far.
    BadOrdinal { ordinal: u32, count: u32 },
    /// A symbol ordinal was referenced but its definition never arrived.
    UndefinedOrdinal { ordinal: u32 },
    /// A symbol table defines the same name twice.
    DuplicateEntry { name: String },
    /// The stream continues past the end of the root node.
    TrailingBytes { count: usize },

    /// The module file could not be read or written.
    Io { path: PathBuf, err: std::io::Error },
}
impl Display for SerialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use SerialError::*;
        match self {
            BadMagic { got }                 => write!(f, "Malformed stream: magic {got:?} is not a module-file magic"),
            SchemaMismatch { got, expected } => write!(f, "Schema mismatch: stream has version {got}, this reader implements version {expected}"),

            UnexpectedEof { what }       => write!(f, "Malformed stream: unexpected end-of-stream while reading {what}"),
            BadTag { what, tag }         => write!(f, "Malformed stream: tag {tag} is not a valid {what}"),
            BadUtf8 { what }             => write!(f, "Malformed stream: {what} is not valid UTF-8"),
            BadOrdinal { ordinal, count } => write!(f, "Malformed stream: symbol ordinal {ordinal} skips ahead of the {count} handed out so far"),
            UndefinedOrdinal { ordinal } => write!(f, "Malformed stream: symbol ordinal {ordinal} is referenced but never defined"),
            DuplicateEntry { name } => write!(f, "Malformed stream: symbol table defines '{name}' twice"),
            TrailingBytes { count }      => write!(f, "Malformed stream: {count} trailing byte(s) after the root node"),

            Io { path, .. } => write!(f, "Failed to access module file '{}'", path.display()),
        }
    }
}
impl Error for SerialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { err, .. } => Some(err),
            _ => None,
        }
    }
}
