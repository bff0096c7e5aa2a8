//  VISITOR.rs
//    by Lut99
//
//  Created:
//    20 Mar 2024, 10:12:44
//  Last edited:
//    15 Jul 2024, 11:03:29
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the uniform traversal framework that passes are written
//!   against.
//!
//!   Two modes are offered. The read-only [`AsrVisitor`] gets pre- and
//!   post-order hooks per node category and a default descent that walks
//!   children in declared field order, including descents through symbol
//!   tables; an identity set guarantees every reachable symbol is visited
//!   exactly once even though the graph shares nodes. The
//!   [`AsrTransformer`] rebuilds statement and expression trees bottom-up
//!   through replace-or-keep hooks; a hook that returns its input moves
//!   it unchanged, allocating nothing.
//

use std::collections::HashSet;

use crate::arena::SymbolId;
use crate::asr::expressions::{ArrayIndex, Expr, ExprKind};
use crate::asr::statements::{Case, Stmt, StmtKind};
use crate::asr::symbols::SymbolKind;
use crate::asr::toplevel::TranslationUnit;
use crate::asr::types::{Dimension, Ttype};


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use crate::asr::spec::{Abi, Access, Deftype};
    use crate::asr::types::Ttype;
    use crate::builder::UnitBuilder;
    use super::*;


    /// A visitor that counts what it sees.
    #[derive(Default)]
    struct Counter {
        symbols : usize,
        stmts   : usize,
        exprs   : usize,
    }
    impl AsrVisitor for Counter {
        fn enter_symbol(&mut self, _unit: &TranslationUnit, _id: SymbolId) { self.symbols += 1; }
        fn enter_stmt(&mut self, _unit: &TranslationUnit, _stmt: &Stmt) { self.stmts += 1; }
        fn enter_expr(&mut self, _unit: &TranslationUnit, _expr: &Expr) { self.exprs += 1; }
    }

    /// Builds a module with a function whose generic set mentions the function itself, then
    /// checks the walk terminates and visits each symbol once.
    #[test]
    fn test_visit_once_with_sharing() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (_, mscope) = builder.add_module("m", Abi::Source, Deftype::Implementation).unwrap();
        let (func, _, _) = builder
            .add_function(mscope, "f", Ttype::Integer { kind: 4, dims: vec![] }, Abi::Source, Access::Public, Deftype::Implementation)
            .unwrap();
        builder.set_body(func, vec![Stmt::new(StmtKind::Return)]);
        // The generic mentions the function that sits next to it; the identity set keeps this
        // from being visited twice
        builder.add_generic_procedure(mscope, "g", vec![func, func], Access::Public).unwrap();

        let mut counter: Counter = Counter::default();
        visit_unit(&mut counter, &unit);
        // module + function + return var + generic
        assert_eq!(counter.symbols, 4);
        assert_eq!(counter.stmts, 1);
    }

    /// A transformer that rewrites every integer constant to 42 and checks identity returns
    /// leave the rest untouched.
    #[test]
    fn test_transform_rewrites_in_place() {
        struct FortyTwo;
        impl AsrTransformer for FortyTwo {
            fn transform_expr(&mut self, mut expr: Expr) -> Expr {
                if let ExprKind::ConstantInteger { value } = &mut expr.kind {
                    *value = 42;
                }
                expr
            }
        }

        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (program, _) = builder.add_program("main").unwrap();
        builder.set_body(program, vec![Stmt::new(StmtKind::Print {
            fmt    : None,
            values : vec![Expr::constant_integer(7, 4)],
        })]);

        transform_unit(&mut FortyTwo, &mut unit);
        match &unit.arena.symbol(program).body().unwrap()[0].kind {
            StmtKind::Print { values, .. } => assert!(matches!(values[0].kind, ExprKind::ConstantInteger { value: 42 })),
            kind => panic!("Body statement became {kind:?}"),
        }
    }
}





/***** LIBRARY *****/
/// The read-only traversal hooks.
///
/// Implementors override only the hooks they care about; every hook defaults to doing nothing,
/// and the walker performs the descent itself. Traversal order is deterministic: unit items in
/// declaration order, symbol tables in insertion order, node children in declared field order.
pub trait AsrVisitor {
    /// Called before a symbol's children are walked.
    #[inline]
    fn enter_symbol(&mut self, unit: &TranslationUnit, id: SymbolId) { let _ = (unit, id); }
    /// Called after a symbol's children have been walked.
    #[inline]
    fn exit_symbol(&mut self, unit: &TranslationUnit, id: SymbolId) { let _ = (unit, id); }

    /// Called before a statement's children are walked.
    #[inline]
    fn enter_stmt(&mut self, unit: &TranslationUnit, stmt: &Stmt) { let _ = (unit, stmt); }
    /// Called after a statement's children have been walked.
    #[inline]
    fn exit_stmt(&mut self, unit: &TranslationUnit, stmt: &Stmt) { let _ = (unit, stmt); }

    /// Called before an expression's children are walked.
    #[inline]
    fn enter_expr(&mut self, unit: &TranslationUnit, expr: &Expr) { let _ = (unit, expr); }
    /// Called after an expression's children have been walked.
    #[inline]
    fn exit_expr(&mut self, unit: &TranslationUnit, expr: &Expr) { let _ = (unit, expr); }

    /// Called before a type's embedded expressions are walked.
    #[inline]
    fn enter_ttype(&mut self, unit: &TranslationUnit, ttype: &Ttype) { let _ = (unit, ttype); }
    /// Called after a type's embedded expressions have been walked.
    #[inline]
    fn exit_ttype(&mut self, unit: &TranslationUnit, ttype: &Ttype) { let _ = (unit, ttype); }
}

/// Walks the given unit with the given visitor.
///
/// Every node reachable from the unit's items is visited exactly once, including nodes reached
/// through symbol-table descents and through symbol references in bodies; sharing and cycles are
/// cut by an identity set over symbols.
pub fn visit_unit(visitor: &mut impl AsrVisitor, unit: &TranslationUnit) {
    let mut walk: Walk = Walk { unit, visited: HashSet::new() };
    for item in &unit.items {
        walk.symbol(visitor, *item);
    }
}

/// The state of one read-only walk.
struct Walk<'u> {
    /// The unit being walked.
    unit    : &'u TranslationUnit,
    /// The symbols already visited; the cycle breaker.
    visited : HashSet<SymbolId>,
}
impl<'u> Walk<'u> {
    /// Walks one symbol, if it has not been walked before.
    fn symbol(&mut self, v: &mut impl AsrVisitor, id: SymbolId) {
        if !self.visited.insert(id) { return; }
        v.enter_symbol(self.unit, id);

        // Children in declared field order per kind. The symbol borrows the unit, not the walk
        // state, so recursion is free to update the identity set.
        let symbol: &'u crate::asr::symbols::Symbol = self.unit.arena.symbol(id);
        use SymbolKind::*;
        match &symbol.kind {
            Program { symtab, body } => {
                self.scope(v, *symtab);
                for stmt in body { self.stmt(v, stmt); }
            },
            Module { symtab, .. } => self.scope(v, *symtab),
            Subroutine { symtab, body, .. } | Function { symtab, body, .. } => {
                self.scope(v, *symtab);
                for stmt in body { self.stmt(v, stmt); }
            },

            GenericProcedure { procs, .. } | CustomOperator { procs, .. } => {
                for proc in procs { self.symbol(v, *proc); }
            },
            ExternalSymbol { external, .. } => self.symbol(v, *external),

            DerivedType { symtab, parent, .. } => {
                self.scope(v, *symtab);
                if let Some(parent) = parent { self.symbol(v, *parent); }
            },
            Variable { data_type, initializer, .. } => {
                self.ttype(v, data_type);
                if let Some(init) = initializer { self.expr(v, init); }
            },
            ClassType { symtab, .. } => self.scope(v, *symtab),
            ClassProcedure { proc, .. } => self.symbol(v, *proc),
        }

        v.exit_symbol(self.unit, id);
    }

    /// Walks the entries of one symbol table, in insertion order.
    fn scope(&mut self, v: &mut impl AsrVisitor, scope: crate::arena::ScopeId) {
        let table: &'u crate::asr::symbol_tables::SymbolTable = self.unit.arena.scope(scope);
        for (_, entry) in table.iter() {
            self.symbol(v, entry);
        }
    }

    /// Walks one statement.
    fn stmt(&mut self, v: &mut impl AsrVisitor, stmt: &Stmt) {
        v.enter_stmt(self.unit, stmt);

        use StmtKind::*;
        match &stmt.kind {
            Assignment { target, value } => { self.expr(v, target); self.expr(v, value); },
            SubroutineCall { name, original_name, args } => {
                self.symbol(v, *name);
                if let Some(original) = original_name { self.symbol(v, *original); }
                for arg in args { self.expr(v, arg); }
            },

            If { test, body, orelse } => {
                self.expr(v, test);
                for stmt in body { self.stmt(v, stmt); }
                for stmt in orelse { self.stmt(v, stmt); }
            },
            WhileLoop { test, body } => {
                self.expr(v, test);
                for stmt in body { self.stmt(v, stmt); }
            },
            DoLoop { head, body } => {
                self.symbol(v, head.var);
                self.expr(v, &head.start);
                self.expr(v, &head.end);
                if let Some(step) = &head.increment { self.expr(v, step); }
                for stmt in body { self.stmt(v, stmt); }
            },
            Exit | Cycle => {},
            Select { selector, cases, default } => {
                self.expr(v, selector);
                for case in cases {
                    for value in &case.values { self.expr(v, value); }
                    for stmt in &case.body { self.stmt(v, stmt); }
                }
                for stmt in default { self.stmt(v, stmt); }
            },

            Print { fmt, values } => {
                if let Some(fmt) = fmt { self.expr(v, fmt); }
                for value in values { self.expr(v, value); }
            },
            Open { unit, file, status } => {
                self.expr(v, unit);
                if let Some(file) = file { self.expr(v, file); }
                if let Some(status) = status { self.expr(v, status); }
            },
            Close { unit, status } => {
                self.expr(v, unit);
                if let Some(status) = status { self.expr(v, status); }
            },
            Read { unit, values } | Write { unit, values } => {
                if let Some(unit) = unit { self.expr(v, unit); }
                for value in values { self.expr(v, value); }
            },
            Inquire { unit, file } => {
                if let Some(unit) = unit { self.expr(v, unit); }
                if let Some(file) = file { self.expr(v, file); }
            },
            Rewind { unit } | Flush { unit } => self.expr(v, unit),

            Allocate { args } => {
                for arg in args {
                    self.symbol(v, arg.target);
                    for dim in &arg.dims { self.dimension(v, dim); }
                }
            },
            ExplicitDeallocate { vars } | ImplicitDeallocate { vars } | Nullify { vars } => {
                for var in vars { self.symbol(v, *var); }
            },

            Assert { test, msg } => {
                self.expr(v, test);
                if let Some(msg) = msg { self.expr(v, msg); }
            },
            GoTo { .. } | GoToTarget { .. } | Return => {},
            Stop { code } | ErrorStop { code } => {
                if let Some(code) = code { self.expr(v, code); }
            },
        }

        v.exit_stmt(self.unit, stmt);
    }

    /// Walks one expression: kind children first, then the type, then the folded value, which is
    /// the declared field order of [`Expr`].
    fn expr(&mut self, v: &mut impl AsrVisitor, expr: &Expr) {
        v.enter_expr(self.unit, expr);

        use ExprKind::*;
        match &expr.kind {
            BoolOp { left, right, .. } | StrOp { left, right, .. } => {
                self.expr(v, left);
                self.expr(v, right);
            },
            BinOp { left, right, overloaded, .. } | Compare { left, right, overloaded, .. } => {
                self.expr(v, left);
                self.expr(v, right);
                if let Some(overloaded) = overloaded { self.expr(v, overloaded); }
            },
            UnaryOp { operand, overloaded, .. } => {
                self.expr(v, operand);
                if let Some(overloaded) = overloaded { self.expr(v, overloaded); }
            },

            FunctionCall { name, original_name, args } => {
                self.symbol(v, *name);
                if let Some(original) = original_name { self.symbol(v, *original); }
                for arg in args { self.expr(v, arg); }
            },
            DerivedTypeConstructor { name, args } => {
                self.symbol(v, *name);
                for arg in args { self.expr(v, arg); }
            },

            ConstantArray { elements } => {
                for element in elements { self.expr(v, element); }
            },
            ConstantInteger { .. } | ConstantReal { .. } | ConstantComplex { .. } | ConstantLogical { .. } | ConstantString { .. } | BozConstant { .. } => {},

            Var { name } => self.symbol(v, *name),
            ArrayRef { array, indices } => {
                self.symbol(v, *array);
                for index in indices {
                    let ArrayIndex { left, right, step } = index;
                    if let Some(left) = left { self.expr(v, left); }
                    if let Some(right) = right { self.expr(v, right); }
                    if let Some(step) = step { self.expr(v, step); }
                }
            },
            DerivedRef { target, member } => {
                self.expr(v, target);
                self.symbol(v, *member);
            },

            ImplicitCast { arg, .. } | ExplicitCast { arg, .. } => self.expr(v, arg),
        }

        self.ttype(v, &expr.data_type);
        if let Some(value) = &expr.value { self.expr(v, value); }

        v.exit_expr(self.unit, expr);
    }

    /// Walks one type's embedded expressions and symbol references.
    fn ttype(&mut self, v: &mut impl AsrVisitor, ttype: &Ttype) {
        v.enter_ttype(self.unit, ttype);

        use Ttype::*;
        match ttype {
            Integer { dims, .. } | Real { dims, .. } | Complex { dims, .. } | Logical { dims, .. } => {
                for dim in dims { self.dimension(v, dim); }
            },
            Character { len_expr, dims, .. } => {
                if let Some(len_expr) = len_expr { self.expr(v, len_expr); }
                for dim in dims { self.dimension(v, dim); }
            },

            List(inner) | Set(inner) | Pointer(inner) => self.ttype(v, inner),
            Tuple(elems) => {
                for elem in elems { self.ttype(v, elem); }
            },
            Dict { key, value } => {
                self.ttype(v, key);
                self.ttype(v, value);
            },

            Derived { symbol, dims } | Class { symbol, dims } => {
                self.symbol(v, *symbol);
                for dim in dims { self.dimension(v, dim); }
            },
        }

        v.exit_ttype(self.unit, ttype);
    }

    /// Walks one dimension's bound expressions.
    fn dimension(&mut self, v: &mut impl AsrVisitor, dim: &Dimension) {
        if let Some(start) = &dim.start { self.expr(v, start); }
        if let Some(end) = &dim.end { self.expr(v, end); }
    }
}



/// The rewrite hooks.
///
/// The walker rebuilds statement and expression trees bottom-up: children are rewritten first,
/// then the rebuilt node is offered to the hook, which either returns it unchanged (a move, no
/// allocation) or replaces it. Replacements keep the parent's field cardinality and type by
/// construction, since the hooks are typed. Symbols are rewritten through
/// [`AsrArena::replace_symbol()`](crate::arena::AsrArena::replace_symbol()) instead; the
/// transformer walk only enters them to reach their bodies and initializers.
pub trait AsrTransformer {
    /// Offers a rebuilt expression for replacement.
    #[inline]
    fn transform_expr(&mut self, expr: Expr) -> Expr { expr }
    /// Offers a rebuilt statement for replacement.
    #[inline]
    fn transform_stmt(&mut self, stmt: Stmt) -> Stmt { stmt }
}

/// Rewrites every body and initializer of the unit through the given transformer.
///
/// Symbols are processed in allocation order, so repeated runs see the same order; within a
/// body, statements are processed in source order.
pub fn transform_unit(transformer: &mut impl AsrTransformer, unit: &mut TranslationUnit) {
    let ids: Vec<SymbolId> = unit.arena.symbol_ids().collect();
    for id in ids {
        // Take the body (or initializer) out of the symbol, rewrite it, put it back. The symbol
        // keeps its identity throughout; only its fields move.
        use SymbolKind::*;
        match &mut unit.arena.symbol_mut(id).kind {
            Program { body, .. } | Subroutine { body, .. } | Function { body, .. } => {
                let taken: Vec<Stmt> = std::mem::take(body);
                let rebuilt: Vec<Stmt> = taken.into_iter().map(|s| rewrite_stmt(transformer, s)).collect();
                // Re-borrow: the arena access above ended at the take
                match &mut unit.arena.symbol_mut(id).kind {
                    Program { body, .. } | Subroutine { body, .. } | Function { body, .. } => *body = rebuilt,
                    _ => unreachable!(),
                }
            },
            Variable { initializer, .. } => {
                if let Some(init) = initializer.take() {
                    let rebuilt: Expr = rewrite_expr(transformer, *init);
                    match &mut unit.arena.symbol_mut(id).kind {
                        Variable { initializer, .. } => *initializer = Some(Box::new(rebuilt)),
                        _ => unreachable!(),
                    }
                }
            },
            _ => {},
        }
    }
}

/// Rewrites one statement bottom-up.
fn rewrite_stmt(t: &mut impl AsrTransformer, stmt: Stmt) -> Stmt {
    let Stmt { kind, range } = stmt;

    use StmtKind::*;
    let kind: StmtKind = match kind {
        Assignment { target, value } => Assignment { target: rewrite_expr(t, target), value: rewrite_expr(t, value) },
        SubroutineCall { name, original_name, args } => SubroutineCall {
            name,
            original_name,
            args : args.into_iter().map(|a| rewrite_expr(t, a)).collect(),
        },

        If { test, body, orelse } => If {
            test   : rewrite_expr(t, test),
            body   : body.into_iter().map(|s| rewrite_stmt(t, s)).collect(),
            orelse : orelse.into_iter().map(|s| rewrite_stmt(t, s)).collect(),
        },
        WhileLoop { test, body } => WhileLoop {
            test : rewrite_expr(t, test),
            body : body.into_iter().map(|s| rewrite_stmt(t, s)).collect(),
        },
        DoLoop { mut head, body } => {
            head.start = rewrite_expr(t, head.start);
            head.end = rewrite_expr(t, head.end);
            head.increment = head.increment.map(|e| rewrite_expr(t, e));
            DoLoop { head, body: body.into_iter().map(|s| rewrite_stmt(t, s)).collect() }
        },
        Exit => Exit,
        Cycle => Cycle,
        Select { selector, cases, default } => Select {
            selector : rewrite_expr(t, selector),
            cases    : cases
                .into_iter()
                .map(|case| Case {
                    values : case.values.into_iter().map(|e| rewrite_expr(t, e)).collect(),
                    body   : case.body.into_iter().map(|s| rewrite_stmt(t, s)).collect(),
                })
                .collect(),
            default  : default.into_iter().map(|s| rewrite_stmt(t, s)).collect(),
        },

        Print { fmt, values } => Print {
            fmt    : fmt.map(|e| rewrite_expr(t, e)),
            values : values.into_iter().map(|e| rewrite_expr(t, e)).collect(),
        },
        Open { unit, file, status } => Open {
            unit   : rewrite_expr(t, unit),
            file   : file.map(|e| rewrite_expr(t, e)),
            status : status.map(|e| rewrite_expr(t, e)),
        },
        Close { unit, status } => Close { unit: rewrite_expr(t, unit), status: status.map(|e| rewrite_expr(t, e)) },
        Read { unit, values } => Read {
            unit   : unit.map(|e| rewrite_expr(t, e)),
            values : values.into_iter().map(|e| rewrite_expr(t, e)).collect(),
        },
        Write { unit, values } => Write {
            unit   : unit.map(|e| rewrite_expr(t, e)),
            values : values.into_iter().map(|e| rewrite_expr(t, e)).collect(),
        },
        Inquire { unit, file } => Inquire { unit: unit.map(|e| rewrite_expr(t, e)), file: file.map(|e| rewrite_expr(t, e)) },
        Rewind { unit } => Rewind { unit: rewrite_expr(t, unit) },
        Flush { unit } => Flush { unit: rewrite_expr(t, unit) },

        Allocate { args } => Allocate { args },
        ExplicitDeallocate { vars } => ExplicitDeallocate { vars },
        ImplicitDeallocate { vars } => ImplicitDeallocate { vars },
        Nullify { vars } => Nullify { vars },

        Assert { test, msg } => Assert { test: rewrite_expr(t, test), msg: msg.map(|e| rewrite_expr(t, e)) },
        GoTo { id } => GoTo { id },
        GoToTarget { id } => GoToTarget { id },
        Return => Return,
        Stop { code } => Stop { code: code.map(|e| rewrite_expr(t, e)) },
        ErrorStop { code } => ErrorStop { code: code.map(|e| rewrite_expr(t, e)) },
    };

    t.transform_stmt(Stmt { kind, range })
}

/// Rewrites one expression bottom-up. The type is carried through untouched; rewrites that
/// change a node's type are a different operation than this interface offers.
fn rewrite_expr(t: &mut impl AsrTransformer, expr: Expr) -> Expr {
    let Expr { kind, data_type, value, range } = expr;

    use ExprKind::*;
    let kind: ExprKind = match kind {
        BoolOp { left, op, right } => BoolOp { left: Box::new(rewrite_expr(t, *left)), op, right: Box::new(rewrite_expr(t, *right)) },
        BinOp { left, op, right, overloaded } => BinOp {
            left       : Box::new(rewrite_expr(t, *left)),
            op,
            right      : Box::new(rewrite_expr(t, *right)),
            overloaded : overloaded.map(|e| Box::new(rewrite_expr(t, *e))),
        },
        StrOp { left, op, right } => StrOp { left: Box::new(rewrite_expr(t, *left)), op, right: Box::new(rewrite_expr(t, *right)) },
        UnaryOp { op, operand, overloaded } => UnaryOp {
            op,
            operand    : Box::new(rewrite_expr(t, *operand)),
            overloaded : overloaded.map(|e| Box::new(rewrite_expr(t, *e))),
        },
        Compare { left, op, right, overloaded } => Compare {
            left       : Box::new(rewrite_expr(t, *left)),
            op,
            right      : Box::new(rewrite_expr(t, *right)),
            overloaded : overloaded.map(|e| Box::new(rewrite_expr(t, *e))),
        },

        FunctionCall { name, original_name, args } => FunctionCall {
            name,
            original_name,
            args : args.into_iter().map(|a| rewrite_expr(t, a)).collect(),
        },
        DerivedTypeConstructor { name, args } => DerivedTypeConstructor {
            name,
            args : args.into_iter().map(|a| rewrite_expr(t, a)).collect(),
        },

        ConstantArray { elements } => ConstantArray { elements: elements.into_iter().map(|e| rewrite_expr(t, e)).collect() },
        kind @ (ConstantInteger { .. } | ConstantReal { .. } | ConstantComplex { .. } | ConstantLogical { .. } | ConstantString { .. } | BozConstant { .. }) => kind,

        Var { name } => Var { name },
        ArrayRef { array, indices } => ArrayRef {
            array,
            indices : indices
                .into_iter()
                .map(|index| ArrayIndex {
                    left  : index.left.map(|e| Box::new(rewrite_expr(t, *e))),
                    right : index.right.map(|e| Box::new(rewrite_expr(t, *e))),
                    step  : index.step.map(|e| Box::new(rewrite_expr(t, *e))),
                })
                .collect(),
        },
        DerivedRef { target, member } => DerivedRef { target: Box::new(rewrite_expr(t, *target)), member },

        ImplicitCast { arg, cast_kind } => ImplicitCast { arg: Box::new(rewrite_expr(t, *arg)), cast_kind },
        ExplicitCast { arg, cast_kind } => ExplicitCast { arg: Box::new(rewrite_expr(t, *arg)), cast_kind },
    };

    let value = value.map(|v| Box::new(rewrite_expr(t, *v)));
    t.transform_expr(Expr {
        kind,
        data_type,
        value,
        range,
    })
}
