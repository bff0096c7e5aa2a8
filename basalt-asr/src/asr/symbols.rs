//  SYMBOLS.rs
//    by Lut99
//
//  Created:
//    14 Mar 2024, 13:05:32
//  Last edited:
//    09 Jul 2024, 15:27:44
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the symbol nodes of the ASR: the named entities that live in
//!   symbol tables.
//!
//!   Scope-owning symbols (programs, modules, procedures, type
//!   definitions) carry the handle of their own table; leaf symbols
//!   reside in an enclosing table, which the arena records at insertion.
//!   Navigation is therefore always possible in both directions.
//

use enum_debug::EnumDebug;

use super::expressions::Expr;
use super::spec::{Abi, Access, Deftype, Intent, Node, Presence, SourceRange, StorageType};
use super::statements::Stmt;
use super::types::Ttype;
use crate::arena::{ScopeId, SymbolId};


/***** LIBRARY *****/
/// A Symbol is a named entity residing in some symbol table.
#[derive(Clone, Debug)]
pub struct Symbol {
    /// The name under which this symbol is found in its table.
    pub name  : String,
    /// Any specific implementations of a symbol.
    pub kind  : SymbolKind,
    /// The range in the source text for this symbol's declaration.
    pub range : Option<SourceRange>,
}
impl Symbol {
    /// Constructor for a Symbol without a source range.
    ///
    /// # Arguments
    /// - `name`: The name of the symbol.
    /// - `kind`: The specific kind of symbol to wrap.
    #[inline]
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self { name: name.into(), kind, range: None }
    }

    /// Constructor for the placeholder the decoder pre-allocates before a symbol's definition
    /// arrives from the stream. Never observable in a well-formed unit.
    #[inline]
    pub(crate) fn placeholder() -> Self {
        Self {
            name  : String::new(),
            kind  : SymbolKind::Variable {
                data_type   : Ttype::Integer { kind: 4, dims: vec![] },
                intent      : Intent::Local,
                storage     : StorageType::Default,
                abi         : Abi::Source,
                access      : Access::Private,
                presence    : Presence::Required,
                initializer : None,
            },
            range : None,
        }
    }

    /// Returns the handle of the symbol table this symbol owns, if it owns one.
    #[inline]
    pub fn symtab(&self) -> Option<ScopeId> {
        use SymbolKind::*;
        match &self.kind {
            Program { symtab, .. }     |
            Module { symtab, .. }      |
            Subroutine { symtab, .. }  |
            Function { symtab, .. }    |
            DerivedType { symtab, .. } |
            ClassType { symtab, .. }   => Some(*symtab),

            GenericProcedure { .. } | CustomOperator { .. } | ExternalSymbol { .. } | Variable { .. } | ClassProcedure { .. } => None,
        }
    }

    /// Returns the visibility of this symbol within its module.
    ///
    /// Symbols without an access tag (programs, modules) report [`Access::Public`].
    #[inline]
    pub fn access(&self) -> Access {
        use SymbolKind::*;
        match &self.kind {
            Subroutine { access, .. }       |
            Function { access, .. }         |
            GenericProcedure { access, .. } |
            CustomOperator { access, .. }   |
            ExternalSymbol { access, .. }   |
            DerivedType { access, .. }      |
            Variable { access, .. }         |
            ClassType { access, .. }        |
            ClassProcedure { access, .. }   => *access,

            Program { .. } | Module { .. } => Access::Public,
        }
    }

    /// Returns the body of this symbol, if it is a body-carrying procedure or program.
    #[inline]
    pub fn body(&self) -> Option<&[Stmt]> {
        use SymbolKind::*;
        match &self.kind {
            Program { body, .. } | Subroutine { body, .. } | Function { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns whether this symbol is a callable procedure (subroutine or function).
    #[inline]
    pub fn is_procedure(&self) -> bool {
        matches!(self.kind, SymbolKind::Subroutine { .. } | SymbolKind::Function { .. })
    }
}
impl Node for Symbol {
    #[inline]
    fn range(&self) -> Option<SourceRange> { self.range }
}

/// Defines the SymbolKind, which implements the specifics for each of the various symbols.
#[derive(Clone, Debug, EnumDebug)]
pub enum SymbolKind {
    /// The main program; owns its own scope and body.
    Program {
        /// The symbol table of the program's local scope.
        symtab : ScopeId,
        /// The executable part.
        body   : Vec<Stmt>,
    },
    /// A module: a named collection of symbols that other units import.
    Module {
        /// The symbol table of the module's scope.
        symtab  : ScopeId,
        /// Where the module's implementations live.
        abi     : Abi,
        /// Whether this is a full module or an interface projection.
        deftype : Deftype,
    },
    /// A procedure without a result value.
    Subroutine {
        /// The symbol table of the subroutine's local scope.
        symtab  : ScopeId,
        /// The dummy arguments, in declaration order; all `Variable`s in `symtab`.
        args    : Vec<SymbolId>,
        /// The executable part; empty exactly when `deftype` is [`Deftype::Interface`].
        body    : Vec<Stmt>,
        /// Where the implementation lives.
        abi     : Abi,
        /// The visibility within the enclosing module.
        access  : Access,
        /// Whether the body is given here or only declared.
        deftype : Deftype,
    },
    /// A procedure with a result value.
    Function {
        /// The symbol table of the function's local scope.
        symtab     : ScopeId,
        /// The dummy arguments, in declaration order; all `Variable`s in `symtab`.
        args       : Vec<SymbolId>,
        /// The executable part; empty exactly when `deftype` is [`Deftype::Interface`].
        body       : Vec<Stmt>,
        /// The `Variable` in `symtab` that carries the result; its intent is
        /// [`Intent::ReturnVar`], and it is the only such variable in the scope.
        return_var : SymbolId,
        /// Where the implementation lives.
        abi        : Abi,
        /// The visibility within the enclosing module.
        access     : Access,
        /// Whether the body is given here or only declared.
        deftype    : Deftype,
    },

    /// A named set of procedures the elaboration pass picks from per call site.
    GenericProcedure {
        /// The candidate procedures.
        procs  : Vec<SymbolId>,
        /// The visibility within the enclosing module.
        access : Access,
    },
    /// A user-defined operator backed by a set of procedures.
    CustomOperator {
        /// The candidate procedures.
        procs  : Vec<SymbolId>,
        /// The visibility within the enclosing module.
        access : Access,
    },

    /// A reference to a symbol that is not reachable by walking parent scopes from the referring
    /// site. The single permitted cross-module handle.
    ExternalSymbol {
        /// The name of the module that owns the target.
        module_name   : String,
        /// The names of the scopes between the module scope and the target, outermost first.
        scope_names   : Vec<String>,
        /// The resolved target symbol.
        external      : SymbolId,
        /// The name of the target in its defining scope. Kept for diagnostic provenance and for
        /// disambiguation when the target is a `GenericProcedure`.
        original_name : String,
        /// The visibility of this re-export within the importing scope.
        access        : Access,
    },

    /// A user-defined composite type; its members are the `Variable`s of its scope, in insertion
    /// order.
    DerivedType {
        /// The symbol table holding the members.
        symtab : ScopeId,
        /// Where the type's implementation lives.
        abi    : Abi,
        /// The visibility within the enclosing module.
        access : Access,
        /// The parent type this one extends, if any; always another `DerivedType` (possibly
        /// behind an `ExternalSymbol`).
        parent : Option<SymbolId>,
    },
    /// A variable: a named, typed storage location.
    Variable {
        /// The type of the stored value.
        data_type   : Ttype,
        /// The dataflow direction.
        intent      : Intent,
        /// Where the storage lives.
        storage     : StorageType,
        /// The linkage of the storage.
        abi         : Abi,
        /// The visibility within the enclosing module.
        access      : Access,
        /// Whether the variable must be passed when it is a dummy argument.
        presence    : Presence,
        /// The initializer; required when `storage` is [`StorageType::Parameter`].
        initializer : Option<Box<Expr>>,
    },
    /// A polymorphic type with bound procedures; members and bindings live in its scope.
    ClassType {
        /// The symbol table holding members and `ClassProcedure` bindings.
        symtab : ScopeId,
        /// Where the class's implementation lives.
        abi    : Abi,
        /// The visibility within the enclosing module.
        access : Access,
    },
    /// A binding of a class method name to its implementing procedure.
    ClassProcedure {
        /// The implementing procedure.
        proc   : SymbolId,
        /// The visibility within the enclosing module.
        access : Access,
    },
}
