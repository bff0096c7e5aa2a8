//  VALIDATE.rs
//    by Lut99
//
//  Created:
//    27 Mar 2024, 10:44:19
//  Last edited:
//    18 Jul 2024, 15:31:06
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the traversal that checks a whole unit against the
//!   well-formedness invariants the builder cannot check call-locally.
//!
//!   Unlike the builder, this traversal never stops early: it walks the
//!   complete unit and collects every violation it finds, so a
//!   collaborator gets the full picture in one run. An empty result is
//!   the definition of a well-formed unit.
//

use enum_debug::EnumDebug as _;
use log::{debug, trace};

use crate::arena::{ScopeId, SymbolId};
use crate::asr::expressions::{Expr, ExprKind};
use crate::asr::spec::{Abi, Deftype, Intent};
use crate::asr::symbols::{Symbol, SymbolKind};
use crate::asr::toplevel::TranslationUnit;
use crate::asr::types::Ttype;
use crate::builder::collect_labels;
use crate::compiler::visitor::{visit_unit, AsrVisitor};
use crate::errors::Violation;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use crate::asr::expressions::BinOperator;
    use crate::asr::spec::{Abi, Access, Deftype};
    use crate::asr::statements::{Stmt, StmtKind};
    use crate::builder::UnitBuilder;
    use super::*;


    /// A well-formed unit validates cleanly.
    #[test]
    fn test_well_formed_is_empty() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (_, mscope) = builder.add_module("m", Abi::Source, Deftype::Implementation).unwrap();
        let (func, _, ret) = builder
            .add_function(mscope, "f", Ttype::Integer { kind: 4, dims: vec![] }, Abi::Source, Access::Public, Deftype::Implementation)
            .unwrap();
        builder.set_body(func, vec![Stmt::new(StmtKind::Assignment {
            target : Expr::var(ret, Ttype::Integer { kind: 4, dims: vec![] }),
            value  : Expr::constant_integer(1, 4),
        })]);
        builder.finalize_procedure(func).unwrap();

        assert!(traverse(&unit).is_empty());
    }

    /// An unmatched goto is reported as exactly one violation, at the goto.
    #[test]
    fn test_unmatched_goto() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (program, _) = builder.add_program("main").unwrap();
        builder.set_body(program, vec![
            Stmt::new(StmtKind::GoTo { id: 7 }),
            Stmt::new(StmtKind::Return),
        ]);

        let violations: Vec<Violation> = traverse(&unit);
        assert_eq!(violations.len(), 1);
        assert!(matches!(violations[0], Violation::UnmatchedGoTo { id: 7, .. }));
    }

    /// Validation keeps going: a unit with two independent breaches reports both.
    #[test]
    fn test_collects_all_violations() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (program, _) = builder.add_program("main").unwrap();

        // Breach one: unmatched goto target. Breach two: an expression whose folded value has
        // the wrong type, smuggled past the builder by hand.
        let mut sum: Expr = Expr::binop(
            Expr::constant_integer(2, 4),
            BinOperator::Add,
            Expr::constant_integer(3, 4),
            Ttype::Integer { kind: 4, dims: vec![] },
            None,
        )
        .unwrap();
        sum.value = Some(Box::new(Expr::constant_real(5.0, 8)));
        builder.set_body(program, vec![
            Stmt::new(StmtKind::GoToTarget { id: 3 }),
            Stmt::new(StmtKind::Print { fmt: None, values: vec![sum] }),
        ]);

        let violations: Vec<Violation> = traverse(&unit);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().any(|v| matches!(v, Violation::UnmatchedGoToTarget { id: 3, .. })));
        assert!(violations.iter().any(|v| matches!(v, Violation::ValueTypeMismatch { .. })));
    }

    /// A reference to a variable from a sibling scope is neither reachable nor external.
    #[test]
    fn test_unreachable_reference() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (_, mscope) = builder.add_module("m", Abi::Source, Deftype::Implementation).unwrap();
        let (f, _, _) = builder
            .add_function(mscope, "f", Ttype::Integer { kind: 4, dims: vec![] }, Abi::Source, Access::Public, Deftype::Implementation)
            .unwrap();
        let (g, _, gret) = builder
            .add_function(mscope, "g", Ttype::Integer { kind: 4, dims: vec![] }, Abi::Source, Access::Public, Deftype::Implementation)
            .unwrap();
        // f's body reads g's return variable, which lives in a sibling scope
        builder.set_body(f, vec![Stmt::new(StmtKind::Print {
            fmt    : None,
            values : vec![Expr::var(gret, Ttype::Integer { kind: 4, dims: vec![] })],
        })]);
        builder.set_body(g, vec![Stmt::new(StmtKind::Return)]);

        let violations: Vec<Violation> = traverse(&unit);
        assert!(violations.iter().any(|v| matches!(v, Violation::UnreachableReference { .. })));
    }
}





/***** TRAVERSAL STRUCTS *****/
/// The visitor that performs the actual checking.
struct Validator {
    /// The violations found so far.
    violations : Vec<Violation>,
    /// The stack of procedures being walked, with their scopes; the reference-reachability check
    /// is relative to the innermost one.
    procedures : Vec<(String, ScopeId)>,
}

impl Validator {
    /// Checks whether a symbol referenced from the current procedure is reachable by walking
    /// parent scopes, or is an external symbol. Anything else breaches the resolution invariant.
    fn check_reference(&mut self, unit: &TranslationUnit, referenced: SymbolId) {
        let (procedure, site): (&String, ScopeId) = match self.procedures.last() {
            Some((name, scope)) => (name, *scope),
            // References outside any procedure (initializers of module variables, for one) are
            // covered by the scope they reside in; nothing to relate them to here
            None => return,
        };

        let symbol: &Symbol = unit.arena.symbol(referenced);
        if matches!(symbol.kind, SymbolKind::ExternalSymbol { .. }) { return; }
        match unit.arena.parent_of(referenced) {
            Some(home) if unit.arena.is_ancestor(home, site) => {},
            _ => self.violations.push(Violation::UnreachableReference {
                procedure : procedure.clone(),
                symbol    : symbol.name.clone(),
            }),
        }
    }
}

impl AsrVisitor for Validator {
    fn enter_symbol(&mut self, unit: &TranslationUnit, id: SymbolId) {
        let symbol: &Symbol = unit.arena.symbol(id);
        trace!(target: "validate", "Checking symbol '{}'", symbol.name);

        use SymbolKind::*;
        match &symbol.kind {
            Program { symtab, body } => {
                self.procedures.push((symbol.name.clone(), *symtab));
                self.check_goto_pairs(&symbol.name, body);
            },
            Subroutine { symtab, body, abi, deftype, .. } => {
                self.procedures.push((symbol.name.clone(), *symtab));
                self.check_goto_pairs(&symbol.name, body);
                self.check_abi_body(&symbol.name, *abi, *deftype, body.len());
            },
            Function { symtab, body, return_var, abi, deftype, .. } => {
                self.procedures.push((symbol.name.clone(), *symtab));
                self.check_goto_pairs(&symbol.name, body);
                self.check_abi_body(&symbol.name, *abi, *deftype, body.len());

                // Exactly one ReturnVar-intent variable, and it is the recorded one
                let return_vars: Vec<SymbolId> = unit
                    .arena
                    .scope(*symtab)
                    .iter()
                    .map(|(_, id)| id)
                    .filter(|id| matches!(unit.arena.symbol(*id).kind, Variable { intent: Intent::ReturnVar, .. }))
                    .collect();
                match return_vars[..] {
                    [] => self.violations.push(Violation::ReturnVarCount { function: symbol.name.clone(), count: 0 }),
                    [rv] => {
                        if rv != *return_var {
                            self.violations.push(Violation::ReturnVarMismatch { function: symbol.name.clone() });
                        }
                    },
                    _ => self.violations.push(Violation::ReturnVarCount { function: symbol.name.clone(), count: return_vars.len() }),
                }
            },

            DerivedType { parent: Some(parent), .. } => {
                // The parent must be a derived type, possibly behind an external
                let target: SymbolId = match &unit.arena.symbol(*parent).kind {
                    ExternalSymbol { external, .. } => *external,
                    _ => *parent,
                };
                if !matches!(unit.arena.symbol(target).kind, DerivedType { .. }) {
                    self.violations.push(Violation::DerivedParentNotDerived { name: symbol.name.clone() });
                }
            },

            _ => {},
        }
    }

    fn exit_symbol(&mut self, unit: &TranslationUnit, id: SymbolId) {
        if matches!(unit.arena.symbol(id).kind, SymbolKind::Program { .. } | SymbolKind::Subroutine { .. } | SymbolKind::Function { .. }) {
            self.procedures.pop();
        }
    }

    fn enter_expr(&mut self, unit: &TranslationUnit, expr: &Expr) {
        // Kind/type consistency
        use ExprKind::*;
        let consistent: bool = match &expr.kind {
            BoolOp { .. } | Compare { .. } => expr.data_type.is_logical(),
            BinOp { .. }                   => expr.data_type.is_numeric(),
            StrOp { .. }                   => expr.data_type.is_character(),

            ConstantInteger { .. } | BozConstant { .. } => matches!(expr.data_type, Ttype::Integer { .. }),
            ConstantReal { .. }    => matches!(expr.data_type, Ttype::Real { .. }),
            ConstantComplex { .. } => matches!(expr.data_type, Ttype::Complex { .. }),
            ConstantLogical { .. } => expr.data_type.is_logical(),
            ConstantString { .. }  => expr.data_type.is_character(),

            _ => true,
        };
        if !consistent {
            self.violations.push(Violation::ExprTypeInconsistent {
                variant : expr.kind.variant().to_string(),
                got     : expr.data_type.clone(),
            });
        }

        // Folded values are constants of the expression's own type
        if let Some(value) = &expr.value {
            if !value.is_constant() {
                self.violations.push(Violation::ValueNotConstant { variant: value.kind.variant().to_string() });
            } else if value.data_type != expr.data_type {
                self.violations.push(Violation::ValueTypeMismatch {
                    expected : expr.data_type.clone(),
                    got      : value.data_type.clone(),
                });
            }
        }

        // Direct symbol reads resolve through parent scopes or are external
        match &expr.kind {
            Var { name } => self.check_reference(unit, *name),
            ArrayRef { array, .. } => self.check_reference(unit, *array),
            FunctionCall { name, .. } => self.check_reference(unit, *name),
            _ => {},
        }
    }

    fn enter_stmt(&mut self, unit: &TranslationUnit, stmt: &crate::asr::statements::Stmt) {
        use crate::asr::statements::StmtKind::*;
        match &stmt.kind {
            SubroutineCall { name, .. } => self.check_reference(unit, *name),
            DoLoop { head, .. } => self.check_reference(unit, head.var),
            ExplicitDeallocate { vars } | ImplicitDeallocate { vars } | Nullify { vars } => {
                for var in vars { self.check_reference(unit, *var); }
            },
            Allocate { args } => {
                for arg in args { self.check_reference(unit, arg.target); }
            },
            _ => {},
        }
    }
}

impl Validator {
    /// Checks that the goto and goto-target labels of a body pair up, pushing one violation per
    /// unpaired label.
    fn check_goto_pairs(&mut self, procedure: &str, body: &[crate::asr::statements::Stmt]) {
        let (mut gotos, mut targets): (Vec<u32>, Vec<u32>) = (vec![], vec![]);
        collect_labels(body, &mut gotos, &mut targets);
        for id in &gotos {
            if !targets.contains(id) {
                self.violations.push(Violation::UnmatchedGoTo { procedure: procedure.into(), id: *id });
            }
        }
        for id in &targets {
            if !gotos.contains(id) {
                self.violations.push(Violation::UnmatchedGoToTarget { procedure: procedure.into(), id: *id });
            }
        }
    }

    /// Checks that a procedure's ABI, definition type and body presence agree.
    fn check_abi_body(&mut self, procedure: &str, abi: Abi, deftype: Deftype, body_len: usize) {
        let consistent: bool = match deftype {
            Deftype::Implementation => abi != Abi::Source || body_len > 0,
            Deftype::Interface      => body_len == 0 && abi != Abi::Source,
        };
        if !consistent {
            self.violations.push(Violation::AbiBodyMismatch { procedure: procedure.into(), abi, deftype, body_len });
        }
    }
}





/***** LIBRARY *****/
/// Runs a full traversal on the given unit, checking every well-formedness invariant and
/// collecting every breach.
///
/// # Arguments
/// - `unit`: The unit to check.
///
/// # Returns
/// All violations found, in traversal order. Empty exactly when the unit is well-formed.
pub fn traverse(unit: &TranslationUnit) -> Vec<Violation> {
    debug!(target: "validate", "Validating unit with {} symbol(s)", unit.arena.symbol_count());
    let mut validator: Validator = Validator { violations: vec![], procedures: vec![] };

    // The node-local and procedure-local invariants ride on the visitor
    visit_unit(&mut validator, unit);

    // The scope forest is checked arena-wide: no scope may be its own ancestor
    for scope in unit.arena.scope_ids() {
        let mut seen: Vec<ScopeId> = vec![scope];
        let mut current: Option<ScopeId> = unit.arena.scope(scope).parent();
        while let Some(parent) = current {
            if seen.contains(&parent) {
                validator.violations.push(Violation::ScopeCycle { scope });
                break;
            }
            seen.push(parent);
            current = unit.arena.scope(parent).parent();
        }
    }

    debug!(target: "validate", "Found {} violation(s)", validator.violations.len());
    validator.violations
}
