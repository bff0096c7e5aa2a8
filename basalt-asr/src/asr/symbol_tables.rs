//  SYMBOL TABLES.rs
//    by Lut99
//
//  Created:
//    14 Mar 2024, 14:12:50
//  Last edited:
//    11 Jul 2024, 14:06:09
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines SymbolTables, the scoped name-to-symbol maps of the ASR.
//!
//!   Tables chain through parent links, set once at creation so lookups
//!   can walk outwards without any separate registration step. Iteration
//!   is in insertion order, which the pickle and the codec both depend
//!   on. Tables never de-duplicate across modules; the external-symbol
//!   mechanism is the sole cross-module handle.
//

use std::collections::HashMap;

use crate::arena::{AsrArena, ScopeId, SymbolId};
use crate::errors::BuildError;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use crate::asr::spec::{Abi, Access, Deftype};
    use crate::asr::symbols::{Symbol, SymbolKind};
    use crate::asr::toplevel::TranslationUnit;
    use super::*;


    /// Builds a variable symbol for test purposes.
    fn test_var(unit: &mut TranslationUnit, name: &str) -> SymbolId {
        use crate::asr::spec::{Intent, Presence, StorageType};
        use crate::asr::types::Ttype;
        unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::Variable {
            data_type   : Ttype::Integer { kind: 4, dims: vec![] },
            intent      : Intent::Local,
            storage     : StorageType::Default,
            abi         : Abi::Source,
            access      : Access::Public,
            presence    : Presence::Required,
            initializer : None,
        }))
    }

    /// Tests that insertion fails on duplicates and that iteration is in insertion order,
    /// regardless of the inserted names.
    #[test]
    fn test_insert_and_iterate() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let scope: ScopeId = unit.global_scope;

        // Insert in a deliberately non-alphabetical order
        for name in ["zeta", "alpha", "mu", "beta"] {
            let id: SymbolId = test_var(&mut unit, name);
            unit.arena.insert(scope, id).unwrap();
        }

        // A second insertion of any of them collides
        let dup: SymbolId = test_var(&mut unit, "mu");
        assert!(matches!(unit.arena.insert(scope, dup), Err(BuildError::DuplicateName { .. })));

        // Iteration preserves insertion order
        let names: Vec<&str> = unit.arena.scope(scope).iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mu", "beta"]);
    }

    /// Tests that lookups walk parent scopes and that the first hit wins.
    #[test]
    fn test_lookup_walks_parents() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let outer: ScopeId = unit.global_scope;
        let inner: ScopeId = unit.arena.alloc_scope(Some(outer));

        let shadowed: SymbolId = test_var(&mut unit, "x");
        let shadowing: SymbolId = test_var(&mut unit, "x");
        let only_outer: SymbolId = test_var(&mut unit, "y");
        unit.arena.insert(outer, shadowed).unwrap();
        unit.arena.insert(inner, shadowing).unwrap();
        unit.arena.insert(outer, only_outer).unwrap();

        // Local lookup sees only the scope itself
        assert_eq!(unit.arena.lookup_local(inner, "x"), Some(shadowing));
        assert_eq!(unit.arena.lookup_local(inner, "y"), None);

        // Chained lookup prefers the innermost hit, then walks out
        assert_eq!(unit.arena.lookup(inner, "x"), Some(shadowing));
        assert_eq!(unit.arena.lookup(inner, "y"), Some(only_outer));
        assert_eq!(unit.arena.lookup(outer, "x"), Some(shadowed));
        assert_eq!(unit.arena.lookup(inner, "z"), None);

        // Insertion recorded the residence scope
        assert_eq!(unit.arena.parent_of(shadowing), Some(inner));
        assert_eq!(unit.arena.parent_of(shadowed), Some(outer));
    }

    /// Tests external resolution through a module scope (scenario: unit imports `M::f`).
    #[test]
    fn test_resolve_external() {
        let mut unit: TranslationUnit = TranslationUnit::new();

        // Build module 'M' with a public function-ish symbol 'f' (a variable suffices for
        // resolution purposes)
        let mscope: ScopeId = unit.arena.alloc_scope(Some(unit.global_scope));
        let module: SymbolId = unit.arena.alloc_symbol(Symbol::new("M", SymbolKind::Module {
            symtab  : mscope,
            abi     : Abi::Source,
            deftype : Deftype::Implementation,
        }));
        unit.arena.insert(unit.global_scope, module).unwrap();
        unit.items.push(module);
        let f: SymbolId = test_var(&mut unit, "f");
        unit.arena.insert(mscope, f).unwrap();

        // Build the external referring to it, visible from the unit's own scope
        let ext: SymbolId = unit.arena.alloc_symbol(Symbol::new("f", SymbolKind::ExternalSymbol {
            module_name   : "M".into(),
            scope_names   : vec![],
            external      : f,
            original_name : "f".into(),
            access        : Access::Public,
        }));
        let uscope: ScopeId = unit.arena.alloc_scope(Some(unit.global_scope));
        unit.arena.insert(uscope, ext).unwrap();

        // A plain lookup finds the external itself; resolution follows it to the target
        assert_eq!(unit.arena.lookup(uscope, "f"), Some(ext));
        assert_eq!(unit.resolve_external(ext).unwrap(), f);

        // A bogus path fails with UnresolvedExternal
        let bogus: SymbolId = unit.arena.alloc_symbol(Symbol::new("g", SymbolKind::ExternalSymbol {
            module_name   : "M".into(),
            scope_names   : vec![],
            external      : f,
            original_name : "g".into(),
            access        : Access::Public,
        }));
        assert!(matches!(unit.resolve_external(bogus), Err(BuildError::UnresolvedExternal { .. })));
    }
}





/***** LIBRARY *****/
/// Defines a SymbolTable, which maps names to symbols within one scope.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    /// The entries in this table.
    entries : HashMap<String, SymbolId>,
    /// The names in this table, in insertion order.
    order   : Vec<String>,
    /// The table that encloses this one, or [`None`] for a global scope.
    parent  : Option<ScopeId>,
}

impl SymbolTable {
    /// Constructor for an empty SymbolTable.
    ///
    /// # Arguments
    /// - `parent`: The table that encloses the new one, if any.
    #[inline]
    pub(crate) fn new(parent: Option<ScopeId>) -> Self {
        Self { entries: HashMap::new(), order: Vec::new(), parent }
    }

    /// Returns the table that encloses this one, if any.
    #[inline]
    pub fn parent(&self) -> Option<ScopeId> { self.parent }

    /// Returns the number of entries in this table.
    #[inline]
    pub fn len(&self) -> usize { self.order.len() }

    /// Returns whether this table has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool { self.order.is_empty() }

    /// Returns the symbol registered under the given name in this table only.
    #[inline]
    pub fn get(&self, name: &str) -> Option<SymbolId> { self.entries.get(name).copied() }

    /// Returns an iterator over `(name, symbol)` pairs in insertion order.
    ///
    /// The order is deterministic and observable: pickles, the codec and the interface
    /// projection all iterate through this.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, SymbolId)> {
        self.order.iter().map(|name| (name.as_str(), self.entries[name]))
    }

    /// Registers the given symbol under the given name.
    ///
    /// Crate-internal; [`AsrArena::insert()`] is the public entry, since it also records the
    /// symbol's residence scope.
    #[inline]
    pub(crate) fn push(&mut self, name: String, id: SymbolId) {
        self.order.push(name.clone());
        self.entries.insert(name, id);
    }

    /// Removes the entry with the given name, preserving the order of the rest.
    ///
    /// The symbol itself stays in the arena (nodes are never freed individually); it merely stops
    /// being findable through this table. Used by the interface projection to drop private
    /// symbols.
    ///
    /// # Returns
    /// The removed symbol, or [`None`] if the name was not present.
    pub(crate) fn remove(&mut self, name: &str) -> Option<SymbolId> {
        let id: SymbolId = self.entries.remove(name)?;
        self.order.retain(|n| n != name);
        Some(id)
    }
}



impl AsrArena {
    /// Inserts an already-allocated symbol into the given scope under its own name.
    ///
    /// Also records the scope as the symbol's residence, so navigation from symbol to enclosing
    /// table needs no separate registration step.
    ///
    /// # Arguments
    /// - `scope`: The scope to insert into.
    /// - `id`: The symbol to insert.
    ///
    /// # Errors
    /// This function errors with [`BuildError::DuplicateName`] if the symbol's name already
    /// exists in `scope`. Shadowing requires a distinct child scope.
    pub fn insert(&mut self, scope: ScopeId, id: SymbolId) -> Result<(), BuildError> {
        let name: String = self.symbol(id).name.clone();
        if self.scope(scope).get(&name).is_some() {
            return Err(BuildError::DuplicateName { name, scope });
        }
        self.scope_mut(scope).push(name, id);
        self.set_parent_of(id, scope);
        Ok(())
    }

    /// Looks up a name in the given scope only.
    ///
    /// # Returns
    /// The symbol registered under `name` in `scope`, or [`None`].
    #[inline]
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scope(scope).get(name)
    }

    /// Looks up a name in the given scope, then walks parent scopes outwards.
    ///
    /// The first hit wins, which is what makes shadowing through child scopes work.
    ///
    /// # Returns
    /// The first symbol found, or [`None`] if no scope on the parent chain knows the name.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current: Option<ScopeId> = Some(scope);
        while let Some(scope) = current {
            if let Some(id) = self.lookup_local(scope, name) {
                return Some(id);
            }
            current = self.scope(scope).parent();
        }
        None
    }

    /// Returns whether `ancestor` is reachable from `scope` by walking parent links (a scope is
    /// considered an ancestor of itself).
    pub fn is_ancestor(&self, ancestor: ScopeId, scope: ScopeId) -> bool {
        let mut current: Option<ScopeId> = Some(scope);
        while let Some(scope) = current {
            if scope == ancestor { return true; }
            current = self.scope(scope).parent();
        }
        false
    }
}
