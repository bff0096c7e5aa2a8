//  INTERFACE.rs
//    by Lut99
//
//  Created:
//    02 Apr 2024, 09:30:25
//  Last edited:
//    18 Jul 2024, 16:02:47
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the traversal that projects a full-bodied module onto its
//!   interface form, which is what gets stored in module files.
//!
//!   The projection empties every procedure body, rewrites the ABI of
//!   the module and its procedures to the module's interface ABI, marks
//!   everything as `Interface`, drops private symbols, and restricts
//!   generic and custom-operator sets to their public candidates. It
//!   preserves all externally observable typing information (argument
//!   types, return types, intent, presence) and it is idempotent.
//

use enum_debug::EnumDebug as _;
use log::debug;

use crate::arena::{ScopeId, SymbolId};
use crate::asr::spec::{Abi, Access, Deftype};
use crate::asr::symbols::SymbolKind;
use crate::asr::toplevel::TranslationUnit;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use enum_debug::EnumDebug as _;

    use crate::asr::statements::{Stmt, StmtKind};
    use crate::asr::types::Ttype;
    use crate::builder::UnitBuilder;
    use crate::compiler::traversals::pickle::pickle;
    use super::*;


    /// The projection scenario: a source module with a public and a private function becomes a
    /// one-symbol interface module, and projecting again changes nothing.
    #[test]
    fn test_projection_and_idempotence() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (module, mscope) = builder.add_module("m", Abi::Source, Deftype::Implementation).unwrap();
        for (name, access) in [("pub_f", Access::Public), ("priv_f", Access::Private)] {
            let (func, _, _) = builder
                .add_function(mscope, name, Ttype::Integer { kind: 4, dims: vec![] }, Abi::Source, access, Deftype::Implementation)
                .unwrap();
            builder.set_body(func, vec![Stmt::new(StmtKind::Return)]);
            builder.finalize_procedure(func).unwrap();
        }

        traverse(&mut unit, module);

        // One public symbol survives, bodyless and in interface form
        let mscope: ScopeId = unit.arena.symbol(module).symtab().unwrap();
        let survivors: Vec<SymbolId> = unit.arena.scope(mscope).iter().map(|(_, id)| id).collect();
        assert_eq!(survivors.len(), 1);
        let survivor = unit.arena.symbol(survivors[0]);
        assert_eq!(survivor.name, "pub_f");
        match &survivor.kind {
            SymbolKind::Function { body, abi, deftype, .. } => {
                assert!(body.is_empty());
                assert_eq!(*abi, Abi::BasaltModule);
                assert_eq!(*deftype, Deftype::Interface);
            },
            kind => panic!("Survivor became a SymbolKind::{}", kind.variant()),
        }
        match &unit.arena.symbol(module).kind {
            SymbolKind::Module { abi, deftype, .. } => {
                assert_eq!(*abi, Abi::BasaltModule);
                assert_eq!(*deftype, Deftype::Interface);
            },
            kind => panic!("Module became a SymbolKind::{}", kind.variant()),
        }

        // Projecting the projection is a no-op
        let first: String = pickle(&unit);
        traverse(&mut unit, module);
        assert_eq!(pickle(&unit), first);
    }

    /// A generic procedure keeps only its public candidates.
    #[test]
    fn test_generic_restricted_to_public() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (module, mscope) = builder.add_module("m", Abi::Source, Deftype::Implementation).unwrap();
        let mut procs: Vec<SymbolId> = vec![];
        for (name, access) in [("f4", Access::Public), ("f8", Access::Private)] {
            let (func, _, _) = builder
                .add_function(mscope, name, Ttype::Integer { kind: 4, dims: vec![] }, Abi::Source, access, Deftype::Implementation)
                .unwrap();
            builder.set_body(func, vec![Stmt::new(StmtKind::Return)]);
            procs.push(func);
        }
        let generic: SymbolId = builder.add_generic_procedure(mscope, "f", procs, Access::Public).unwrap();

        traverse(&mut unit, module);

        match &unit.arena.symbol(generic).kind {
            SymbolKind::GenericProcedure { procs, .. } => {
                assert_eq!(procs.len(), 1);
                assert_eq!(unit.arena.symbol(procs[0]).name, "f4");
            },
            kind => panic!("Generic became a SymbolKind::{}", kind.variant()),
        }
    }
}





/***** LIBRARY *****/
/// Runs the interface projection on the given module, in place.
///
/// # Arguments
/// - `unit`: The unit owning the module.
/// - `module`: The `Module` symbol to project.
///
/// # Panics
/// This function panics if `module` is not a `Module`; projecting anything else is a programming
/// error in the caller.
pub fn traverse(unit: &mut TranslationUnit, module: SymbolId) {
    // Rewrite the module tag itself; the interface ABI of a source module is the native module
    // ABI, foreign ABIs pass through untouched
    let (scope, interface_abi): (ScopeId, Abi) = match &mut unit.arena.symbol_mut(module).kind {
        SymbolKind::Module { symtab, abi, deftype } => {
            let interface_abi: Abi = match *abi {
                Abi::Source | Abi::Interactive => Abi::BasaltModule,
                other => other,
            };
            *abi = interface_abi;
            *deftype = Deftype::Interface;
            (*symtab, interface_abi)
        },
        kind => panic!("Cannot project a SymbolKind::{} onto its interface", kind.variant()),
    };
    debug!(target: "interface", "Projecting module '{}' to abi '{interface_abi}'", unit.arena.symbol(module).name);

    // Drop private symbols from the module scope first
    let private: Vec<String> = unit
        .arena
        .scope(scope)
        .iter()
        .filter(|(_, id)| unit.arena.symbol(*id).access() == Access::Private)
        .map(|(name, _)| name.to_string())
        .collect();
    for name in private {
        debug!(target: "interface", "Dropping private symbol '{name}'");
        unit.arena.scope_mut(scope).remove(&name);
    }

    // Then bring the survivors into interface form
    let survivors: Vec<SymbolId> = unit.arena.scope(scope).iter().map(|(_, id)| id).collect();
    for id in survivors {
        // Overload sets keep their public candidates only; the list is taken out of the symbol
        // while the candidates' visibilities are read
        if matches!(unit.arena.symbol(id).kind, SymbolKind::GenericProcedure { .. } | SymbolKind::CustomOperator { .. }) {
            let taken: Vec<SymbolId> = match &mut unit.arena.symbol_mut(id).kind {
                SymbolKind::GenericProcedure { procs, .. } | SymbolKind::CustomOperator { procs, .. } => std::mem::take(procs),
                _ => unreachable!(),
            };
            let kept: Vec<SymbolId> = taken.into_iter().filter(|proc| unit.arena.symbol(*proc).access() == Access::Public).collect();
            match &mut unit.arena.symbol_mut(id).kind {
                SymbolKind::GenericProcedure { procs, .. } | SymbolKind::CustomOperator { procs, .. } => *procs = kept,
                _ => unreachable!(),
            }
            continue;
        }

        match &mut unit.arena.symbol_mut(id).kind {
            SymbolKind::Subroutine { body, abi, deftype, .. } | SymbolKind::Function { body, abi, deftype, .. } => {
                body.clear();
                *abi = interface_abi;
                *deftype = Deftype::Interface;
            },

            // Variables, types and bindings carry their typing information through as-is
            _ => {},
        }
    }
}
