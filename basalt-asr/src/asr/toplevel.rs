//  TOPLEVEL.rs
//    by Lut99
//
//  Created:
//    14 Mar 2024, 15:58:33
//  Last edited:
//    11 Jul 2024, 14:22:51
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the toplevel struct of the ASR: the translation unit.
//

use enum_debug::EnumDebug as _;

use super::spec::{Node, SourceRange};
use super::symbols::SymbolKind;
use crate::arena::{AsrArena, ScopeId, SymbolId};
use crate::errors::BuildError;


/***** LIBRARY *****/
/// Defines a translation unit: one compilation input with its own arena and global scope.
///
/// The unit exclusively owns every node of its tree. Multiple units may be compiled in parallel
/// as long as they do not share arenas; the only cross-unit channel is the serialized module
/// file.
#[derive(Clone, Debug)]
pub struct TranslationUnit {
    /// The arena owning all symbols and symbol tables of this unit.
    pub arena        : AsrArena,
    /// The global scope; the root of the scope forest.
    pub global_scope : ScopeId,
    /// The top-level items, in declaration order. Every item resides in the global scope.
    pub items        : Vec<SymbolId>,
    /// The range in the source text for the whole unit.
    pub range        : Option<SourceRange>,
}

impl TranslationUnit {
    /// Constructor for an empty TranslationUnit with a fresh global scope.
    pub fn new() -> Self {
        let mut arena: AsrArena = AsrArena::new();
        let global_scope: ScopeId = arena.alloc_scope(None);
        Self { arena, global_scope, items: Vec::new(), range: None }
    }

    /// Resolves an external symbol to its target.
    ///
    /// Opens the named module from the global scope, descends the declared scope names and
    /// performs a local lookup of the original name in the leaf scope.
    ///
    /// # Arguments
    /// - `ext`: The `ExternalSymbol` to resolve.
    ///
    /// # Returns
    /// The handle of the target symbol.
    ///
    /// # Errors
    /// This function errors with [`BuildError::UnresolvedExternal`] if any step of the path does
    /// not locate a symbol.
    ///
    /// # Panics
    /// This function panics if `ext` is not an `ExternalSymbol`; referring any other kind here is
    /// a programming error in the caller, not a malformed tree.
    pub fn resolve_external(&self, ext: SymbolId) -> Result<SymbolId, BuildError> {
        // Take the path out of the external, then the walk is shared with the builder's check
        match &self.arena.symbol(ext).kind {
            SymbolKind::ExternalSymbol { module_name, scope_names, original_name, .. } => self.resolve_path(module_name, scope_names, original_name),
            kind => panic!("Cannot resolve a SymbolKind::{} as an external symbol", kind.variant()),
        }
    }

    /// Resolves an external path `(module_name, scope_names, name)` to the symbol it locates.
    ///
    /// This is [`resolve_external()`](TranslationUnit::resolve_external()) without the external
    /// symbol itself; the builder uses it to check a path before allocating the external.
    ///
    /// # Errors
    /// This function errors with [`BuildError::UnresolvedExternal`] if any step of the path does
    /// not locate a symbol.
    pub fn resolve_path(&self, module_name: &str, scope_names: &[String], name: &str) -> Result<SymbolId, BuildError> {
        let err = || BuildError::UnresolvedExternal {
            module_name : module_name.into(),
            scope_names : scope_names.to_vec(),
            name        : name.into(),
        };

        // Open the module
        let module: SymbolId = self.arena.lookup_local(self.global_scope, module_name).ok_or_else(err)?;
        let mut scope: ScopeId = self.arena.symbol(module).symtab().ok_or_else(err)?;

        // Descend the enclosing scopes
        for scope_name in scope_names {
            let next: SymbolId = self.arena.lookup_local(scope, scope_name).ok_or_else(err)?;
            scope = self.arena.symbol(next).symtab().ok_or_else(err)?;
        }

        // The leaf is a plain local lookup
        self.arena.lookup_local(scope, name).ok_or_else(err)
    }

    /// Returns the top-level `Module` item with the given name, if there is one.
    pub fn find_module(&self, name: &str) -> Option<SymbolId> {
        self.items.iter().copied().find(|id| {
            let symbol = self.arena.symbol(*id);
            symbol.name == name && matches!(symbol.kind, SymbolKind::Module { .. })
        })
    }
}

impl Default for TranslationUnit {
    #[inline]
    fn default() -> Self { Self::new() }
}

impl Node for TranslationUnit {
    #[inline]
    fn range(&self) -> Option<SourceRange> { self.range }
}
