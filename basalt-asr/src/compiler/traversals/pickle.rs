//  PICKLE.rs
//    by Lut99
//
//  Created:
//    25 Mar 2024, 13:20:36
//  Last edited:
//    18 Jul 2024, 14:55:12
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the traversal that renders an ASR subtree as its canonical
//!   textual form, and the structural equality built on top of it.
//!
//!   The pickle is a parenthesized S-expression: variant names in
//!   PascalCase, fields in declared order, absent optionals elided,
//!   sequences in brackets. Symbols are numbered in deterministic
//!   pre-order on first encounter and referenced as `s<N>`, so two units
//!   pickle identically exactly when they are isomorphic as node graphs
//!   (same variants, fields and table structure, regardless of arena
//!   identity). Source ranges are elided: the canonical text of a tree
//!   must not depend on where it was written.
//

use std::collections::HashMap;
use std::fmt::Write as _;

use enum_debug::EnumDebug as _;

use crate::arena::SymbolId;
use crate::asr::expressions::{ArrayIndex, Expr, ExprKind};
use crate::asr::statements::{Case, Stmt, StmtKind};
use crate::asr::symbols::{Symbol, SymbolKind};
use crate::asr::toplevel::TranslationUnit;
use crate::asr::types::{Dimension, Ttype};


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use crate::asr::expressions::BinOperator;
    use super::*;


    /// Pickles the folded `2 + 3` and pins its canonical form: fields in declared order, the
    /// folded value present, the absent overload elided.
    #[test]
    fn test_pickle_folded_binop() {
        let sum: Expr = Expr::binop(
            Expr::constant_integer(2, 4),
            BinOperator::Add,
            Expr::constant_integer(3, 4),
            Ttype::Integer { kind: 4, dims: vec![] },
            Some(Expr::constant_integer(5, 4)),
        )
        .unwrap();

        assert_eq!(
            pickle_expr(&sum),
            "(BinOp (ConstantInteger 2 (Integer 4 [])) Add (ConstantInteger 3 (Integer 4 [])) (Integer 4 []) (ConstantInteger 5 (Integer 4 [])))",
        );
    }

    /// Checks that two separately built, identical units pickle identically, while a third with
    /// a different table order does not.
    #[test]
    fn test_structural_equality() {
        use crate::asr::spec::{Abi, Access, Deftype, StorageType};
        use crate::builder::UnitBuilder;

        let build = |swap: bool| -> TranslationUnit {
            let mut unit: TranslationUnit = TranslationUnit::new();
            let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
            let (_, mscope) = builder.add_module("m", Abi::Source, Deftype::Implementation).unwrap();
            let names: [&str; 2] = if swap { ["b", "a"] } else { ["a", "b"] };
            for name in names {
                builder.add_variable(mscope, name, Ttype::Real { kind: 8, dims: vec![] }, StorageType::Default, Access::Public, None).unwrap();
            }
            unit
        };

        assert!(structurally_eq(&build(false), &build(false)));
        assert!(!structurally_eq(&build(false), &build(true)));
    }
}





/***** HELPERS *****/
/// The state of one pickling walk: the output buffer plus the symbol numbering.
struct Pickler<'u> {
    /// The unit being pickled, if a whole unit is being pickled. Subtree pickles run without
    /// one and render any symbol reference by ordinal only.
    unit     : Option<&'u TranslationUnit>,
    /// The output buffer.
    out      : String,
    /// The ordinals handed out so far.
    ordinals : HashMap<SymbolId, u32>,
}

impl<'u> Pickler<'u> {
    /// Constructor for a Pickler.
    #[inline]
    fn new(unit: Option<&'u TranslationUnit>) -> Self {
        Self { unit, out: String::new(), ordinals: HashMap::new() }
    }

    /// Returns the ordinal for the given symbol, assigning the next free one on first encounter.
    fn ordinal(&mut self, id: SymbolId) -> u32 {
        let next: u32 = self.ordinals.len() as u32;
        *self.ordinals.entry(id).or_insert(next)
    }

    /// Writes a symbol reference as `s<N>`.
    #[inline]
    fn sref(&mut self, id: SymbolId) {
        let ord: u32 = self.ordinal(id);
        write!(self.out, "s{ord}").unwrap();
    }



    /// Pickles the whole unit.
    fn unit(&mut self) {
        let unit: &'u TranslationUnit = self.unit.expect("Cannot pickle a unit without one");
        self.out.push_str("(TranslationUnit ");
        self.scope(unit.global_scope);
        self.out.push_str(" [");
        for (i, item) in unit.items.iter().enumerate() {
            if i > 0 { self.out.push(' '); }
            self.sref(*item);
        }
        self.out.push_str("])");
    }

    /// Pickles a symbol table: its entries in insertion order, each a full definition.
    fn scope(&mut self, scope: crate::arena::ScopeId) {
        let unit: &'u TranslationUnit = self.unit.expect("Cannot pickle a symbol table without a unit");
        self.out.push_str("(SymbolTable [");
        let entries: Vec<SymbolId> = unit.arena.scope(scope).iter().map(|(_, id)| id).collect();
        for (i, entry) in entries.into_iter().enumerate() {
            if i > 0 { self.out.push(' '); }
            self.symbol(entry);
        }
        self.out.push_str("])");
    }

    /// Pickles a symbol definition: variant name, ordinal, name, then the kind's fields in
    /// declared order.
    fn symbol(&mut self, id: SymbolId) {
        let unit: &'u TranslationUnit = self.unit.expect("Cannot pickle a symbol definition without a unit");
        let symbol: &'u Symbol = unit.arena.symbol(id);

        write!(self.out, "({} ", symbol.kind.variant()).unwrap();
        self.sref(id);
        write!(self.out, " \"{}\"", symbol.name).unwrap();

        use SymbolKind::*;
        match &symbol.kind {
            Program { symtab, body } => {
                self.out.push(' ');
                self.scope(*symtab);
                self.out.push(' ');
                self.stmts(body);
            },
            Module { symtab, abi, deftype } => {
                self.out.push(' ');
                self.scope(*symtab);
                write!(self.out, " {} {}", abi.variant(), deftype.variant()).unwrap();
            },
            Subroutine { symtab, args, body, abi, access, deftype } => {
                self.out.push(' ');
                self.scope(*symtab);
                self.out.push(' ');
                self.srefs(args);
                self.out.push(' ');
                self.stmts(body);
                write!(self.out, " {} {} {}", abi.variant(), access.variant(), deftype.variant()).unwrap();
            },
            Function { symtab, args, body, return_var, abi, access, deftype } => {
                self.out.push(' ');
                self.scope(*symtab);
                self.out.push(' ');
                self.srefs(args);
                self.out.push(' ');
                self.stmts(body);
                self.out.push(' ');
                self.sref(*return_var);
                write!(self.out, " {} {} {}", abi.variant(), access.variant(), deftype.variant()).unwrap();
            },

            GenericProcedure { procs, access } | CustomOperator { procs, access } => {
                self.out.push(' ');
                self.srefs(procs);
                write!(self.out, " {}", access.variant()).unwrap();
            },
            ExternalSymbol { module_name, scope_names, external, original_name, access } => {
                write!(self.out, " \"{module_name}\" [").unwrap();
                for (i, name) in scope_names.iter().enumerate() {
                    if i > 0 { self.out.push(' '); }
                    write!(self.out, "\"{name}\"").unwrap();
                }
                self.out.push_str("] ");
                self.sref(*external);
                write!(self.out, " \"{original_name}\" {}", access.variant()).unwrap();
            },

            DerivedType { symtab, abi, access, parent } => {
                self.out.push(' ');
                self.scope(*symtab);
                write!(self.out, " {} {}", abi.variant(), access.variant()).unwrap();
                if let Some(parent) = parent {
                    self.out.push(' ');
                    self.sref(*parent);
                }
            },
            Variable { data_type, intent, storage, abi, access, presence, initializer } => {
                self.out.push(' ');
                self.ttype(data_type);
                write!(self.out, " {} {} {} {} {}", intent.variant(), storage.variant(), abi.variant(), access.variant(), presence.variant()).unwrap();
                if let Some(init) = initializer {
                    self.out.push(' ');
                    self.expr(init);
                }
            },
            ClassType { symtab, abi, access } => {
                self.out.push(' ');
                self.scope(*symtab);
                write!(self.out, " {} {}", abi.variant(), access.variant()).unwrap();
            },
            ClassProcedure { proc, access } => {
                self.out.push(' ');
                self.sref(*proc);
                write!(self.out, " {}", access.variant()).unwrap();
            },
        }

        self.out.push(')');
    }

    /// Pickles a bracketed list of symbol references.
    fn srefs(&mut self, ids: &[SymbolId]) {
        self.out.push('[');
        for (i, id) in ids.iter().enumerate() {
            if i > 0 { self.out.push(' '); }
            self.sref(*id);
        }
        self.out.push(']');
    }

    /// Pickles a bracketed list of statements.
    fn stmts(&mut self, stmts: &[Stmt]) {
        self.out.push('[');
        for (i, stmt) in stmts.iter().enumerate() {
            if i > 0 { self.out.push(' '); }
            self.stmt(stmt);
        }
        self.out.push(']');
    }

    /// Pickles a bracketed list of expressions.
    fn exprs(&mut self, exprs: &[Expr]) {
        self.out.push('[');
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 { self.out.push(' '); }
            self.expr(expr);
        }
        self.out.push(']');
    }

    /// Pickles one optional expression, preceded by a space when present.
    fn opt_expr(&mut self, expr: &Option<Expr>) {
        if let Some(expr) = expr {
            self.out.push(' ');
            self.expr(expr);
        }
    }

    /// Pickles one statement.
    fn stmt(&mut self, stmt: &Stmt) {
        write!(self.out, "({}", stmt.kind.variant()).unwrap();

        use StmtKind::*;
        match &stmt.kind {
            Assignment { target, value } => {
                self.out.push(' ');
                self.expr(target);
                self.out.push(' ');
                self.expr(value);
            },
            SubroutineCall { name, original_name, args } => {
                self.out.push(' ');
                self.sref(*name);
                if let Some(original) = original_name {
                    self.out.push(' ');
                    self.sref(*original);
                }
                self.out.push(' ');
                self.exprs(args);
            },

            If { test, body, orelse } => {
                self.out.push(' ');
                self.expr(test);
                self.out.push(' ');
                self.stmts(body);
                self.out.push(' ');
                self.stmts(orelse);
            },
            WhileLoop { test, body } => {
                self.out.push(' ');
                self.expr(test);
                self.out.push(' ');
                self.stmts(body);
            },
            DoLoop { head, body } => {
                self.out.push(' ');
                self.sref(head.var);
                self.out.push(' ');
                self.expr(&head.start);
                self.out.push(' ');
                self.expr(&head.end);
                self.opt_expr(&head.increment);
                self.out.push(' ');
                self.stmts(body);
            },
            Exit | Cycle | Return => {},
            Select { selector, cases, default } => {
                self.out.push(' ');
                self.expr(selector);
                self.out.push_str(" [");
                for (i, Case { values, body }) in cases.iter().enumerate() {
                    if i > 0 { self.out.push(' '); }
                    self.out.push_str("(Case ");
                    self.exprs(values);
                    self.out.push(' ');
                    self.stmts(body);
                    self.out.push(')');
                }
                self.out.push_str("] ");
                self.stmts(default);
            },

            Print { fmt, values } => {
                self.opt_expr(fmt);
                self.out.push(' ');
                self.exprs(values);
            },
            Open { unit, file, status } => {
                self.out.push(' ');
                self.expr(unit);
                self.opt_expr(file);
                self.opt_expr(status);
            },
            Close { unit, status } => {
                self.out.push(' ');
                self.expr(unit);
                self.opt_expr(status);
            },
            Read { unit, values } | Write { unit, values } => {
                self.opt_expr(unit);
                self.out.push(' ');
                self.exprs(values);
            },
            Inquire { unit, file } => {
                self.opt_expr(unit);
                self.opt_expr(file);
            },
            Rewind { unit } | Flush { unit } => {
                self.out.push(' ');
                self.expr(unit);
            },

            Allocate { args } => {
                self.out.push_str(" [");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 { self.out.push(' '); }
                    self.out.push_str("(AllocArg ");
                    self.sref(arg.target);
                    self.out.push(' ');
                    self.dims(&arg.dims);
                    self.out.push(')');
                }
                self.out.push(']');
            },
            ExplicitDeallocate { vars } | ImplicitDeallocate { vars } | Nullify { vars } => {
                self.out.push(' ');
                self.srefs(vars);
            },

            Assert { test, msg } => {
                self.out.push(' ');
                self.expr(test);
                self.opt_expr(msg);
            },
            GoTo { id } | GoToTarget { id } => {
                write!(self.out, " {id}").unwrap();
            },
            Stop { code } | ErrorStop { code } => self.opt_expr(code),
        }

        self.out.push(')');
    }

    /// Pickles one expression: variant name, kind fields, then type, then the folded value.
    fn expr(&mut self, expr: &Expr) {
        write!(self.out, "({}", expr.kind.variant()).unwrap();

        use ExprKind::*;
        match &expr.kind {
            BoolOp { left, op, right } => {
                self.out.push(' ');
                self.expr(left);
                write!(self.out, " {} ", op.variant()).unwrap();
                self.expr(right);
            },
            BinOp { left, op, right, overloaded } => {
                self.out.push(' ');
                self.expr(left);
                write!(self.out, " {} ", op.variant()).unwrap();
                self.expr(right);
                if let Some(overloaded) = overloaded {
                    self.out.push(' ');
                    self.expr(overloaded);
                }
            },
            StrOp { left, op, right } => {
                self.out.push(' ');
                self.expr(left);
                write!(self.out, " {} ", op.variant()).unwrap();
                self.expr(right);
            },
            UnaryOp { op, operand, overloaded } => {
                write!(self.out, " {} ", op.variant()).unwrap();
                self.expr(operand);
                if let Some(overloaded) = overloaded {
                    self.out.push(' ');
                    self.expr(overloaded);
                }
            },
            Compare { left, op, right, overloaded } => {
                self.out.push(' ');
                self.expr(left);
                write!(self.out, " {} ", op.variant()).unwrap();
                self.expr(right);
                if let Some(overloaded) = overloaded {
                    self.out.push(' ');
                    self.expr(overloaded);
                }
            },

            FunctionCall { name, original_name, args } => {
                self.out.push(' ');
                self.sref(*name);
                if let Some(original) = original_name {
                    self.out.push(' ');
                    self.sref(*original);
                }
                self.out.push(' ');
                self.exprs(args);
            },
            DerivedTypeConstructor { name, args } => {
                self.out.push(' ');
                self.sref(*name);
                self.out.push(' ');
                self.exprs(args);
            },

            ConstantArray { elements } => {
                self.out.push(' ');
                self.exprs(elements);
            },
            ConstantInteger { value } => write!(self.out, " {value}").unwrap(),
            ConstantReal { value } => write!(self.out, " {value:?}").unwrap(),
            ConstantComplex { real, imag } => write!(self.out, " {real:?} {imag:?}").unwrap(),
            ConstantLogical { value } => write!(self.out, " {value}").unwrap(),
            ConstantString { value } => write!(self.out, " \"{value}\"").unwrap(),
            BozConstant { value, repr } => write!(self.out, " {value} {}", repr.variant()).unwrap(),

            Var { name } => {
                self.out.push(' ');
                self.sref(*name);
            },
            ArrayRef { array, indices } => {
                self.out.push(' ');
                self.sref(*array);
                self.out.push_str(" [");
                for (i, ArrayIndex { left, right, step }) in indices.iter().enumerate() {
                    if i > 0 { self.out.push(' '); }
                    self.out.push_str("(ArrayIndex");
                    if let Some(left) = left { self.out.push(' '); self.expr(left); }
                    if let Some(right) = right { self.out.push(' '); self.expr(right); }
                    if let Some(step) = step { self.out.push(' '); self.expr(step); }
                    self.out.push(')');
                }
                self.out.push(']');
            },
            DerivedRef { target, member } => {
                self.out.push(' ');
                self.expr(target);
                self.out.push(' ');
                self.sref(*member);
            },

            ImplicitCast { arg, cast_kind } | ExplicitCast { arg, cast_kind } => {
                self.out.push(' ');
                self.expr(arg);
                write!(self.out, " {}", cast_kind.variant()).unwrap();
            },
        }

        self.out.push(' ');
        self.ttype(&expr.data_type);
        if let Some(value) = &expr.value {
            self.out.push(' ');
            self.expr(value);
        }

        self.out.push(')');
    }

    /// Pickles one type.
    fn ttype(&mut self, ttype: &Ttype) {
        write!(self.out, "({}", ttype.variant()).unwrap();

        use Ttype::*;
        match ttype {
            Integer { kind, dims } | Real { kind, dims } | Complex { kind, dims } | Logical { kind, dims } => {
                write!(self.out, " {kind} ").unwrap();
                self.dims(dims);
            },
            Character { kind, len, len_expr, dims } => {
                write!(self.out, " {kind} {len}").unwrap();
                if let Some(len_expr) = len_expr {
                    self.out.push(' ');
                    self.expr(len_expr);
                }
                self.out.push(' ');
                self.dims(dims);
            },

            List(inner) | Set(inner) | Pointer(inner) => {
                self.out.push(' ');
                self.ttype(inner);
            },
            Tuple(elems) => {
                self.out.push_str(" [");
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 { self.out.push(' '); }
                    self.ttype(elem);
                }
                self.out.push(']');
            },
            Dict { key, value } => {
                self.out.push(' ');
                self.ttype(key);
                self.out.push(' ');
                self.ttype(value);
            },

            Derived { symbol, dims } | Class { symbol, dims } => {
                self.out.push(' ');
                self.sref(*symbol);
                self.out.push(' ');
                self.dims(dims);
            },
        }

        self.out.push(')');
    }

    /// Pickles a bracketed list of dimensions.
    fn dims(&mut self, dims: &[Dimension]) {
        self.out.push('[');
        for (i, dim) in dims.iter().enumerate() {
            if i > 0 { self.out.push(' '); }
            self.out.push_str("(Dimension");
            if let Some(start) = &dim.start { self.out.push(' '); self.expr(start); }
            if let Some(end) = &dim.end { self.out.push(' '); self.expr(end); }
            self.out.push(')');
        }
        self.out.push(']');
    }
}





/***** LIBRARY *****/
/// Renders the canonical textual form of a whole unit.
///
/// # Returns
/// The pickle. Deterministic: equal (isomorphic) units yield equal strings.
pub fn pickle(unit: &TranslationUnit) -> String {
    let mut pickler: Pickler = Pickler::new(Some(unit));
    pickler.unit();
    pickler.out
}

/// Renders the canonical textual form of a single expression subtree.
///
/// Symbol references are numbered from zero within the subtree; a whole-unit pickle numbers them
/// across the unit instead.
pub fn pickle_expr(expr: &Expr) -> String {
    let mut pickler: Pickler = Pickler::new(None);
    pickler.expr(expr);
    pickler.out
}

/// Renders the canonical textual form of a single statement subtree.
pub fn pickle_stmt(stmt: &Stmt) -> String {
    let mut pickler: Pickler = Pickler::new(None);
    pickler.stmt(stmt);
    pickler.out
}

/// Runs a full traversal on the given unit to print its pickle to the given writer.
///
/// # Arguments
/// - `out`: The `Write`r on which to print the given tree.
/// - `unit`: The unit to print.
///
/// # Errors
/// This function errors if we failed to write to the given writer.
pub fn traverse(out: &mut impl std::io::Write, unit: &TranslationUnit) -> Result<(), std::io::Error> {
    writeln!(out, "{}", pickle(unit))
}

/// Returns whether two units are structurally equal: isomorphic as node graphs, preserving
/// variants, fields and symbol-table structure, modulo arena identity.
///
/// Defined as equality of pickles; the deterministic pre-order numbering makes ordinal renaming
/// implicit.
#[inline]
pub fn structurally_eq(a: &TranslationUnit, b: &TranslationUnit) -> bool {
    pickle(a) == pickle(b)
}
