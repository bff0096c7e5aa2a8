//  CONST FOLD.rs
//    by Lut99
//
//  Created:
//    05 Apr 2024, 11:21:19
//  Last edited:
//    18 Jul 2024, 16:44:28
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the traversal that folds scalar constant expressions,
//!   recording the result in each node's `value` slot.
//!
//!   The fold never replaces a node; it annotates it, so pretty-printers
//!   keep the user's syntax while backends read the folded constant.
//!   Operations that would wrap, divide by zero or otherwise leave the
//!   value representable only at runtime are left unfolded.
//

use log::{debug, trace};

use crate::asr::expressions::{BinOperator, BoolOperator, CmpOperator, Expr, ExprKind, UnaryOperator};
use crate::asr::toplevel::TranslationUnit;
use crate::compiler::visitor::{transform_unit, AsrTransformer};


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use crate::asr::types::Ttype;
    use super::*;


    /// Folds `2 + 3` and finds `5` in the value slot.
    #[test]
    fn test_fold_add() {
        let sum: Expr = Expr::binop(
            Expr::constant_integer(2, 4),
            BinOperator::Add,
            Expr::constant_integer(3, 4),
            Ttype::Integer { kind: 4, dims: vec![] },
            None,
        )
        .unwrap();

        let folded: Expr = Folder.fold(sum);
        assert!(matches!(folded.value.as_deref(), Some(Expr { kind: ExprKind::ConstantInteger { value: 5 }, .. })));
    }

    /// Folds bottom-up through the transformer: `(2 + 3) < 6` becomes true, reached through a
    /// whole-unit rewrite.
    #[test]
    fn test_fold_through_unit() {
        use crate::asr::statements::{Stmt, StmtKind};
        use crate::builder::UnitBuilder;

        let int4: Ttype = Ttype::Integer { kind: 4, dims: vec![] };
        let sum: Expr = Expr::binop(Expr::constant_integer(2, 4), BinOperator::Add, Expr::constant_integer(3, 4), int4.clone(), None).unwrap();
        let test: Expr = Expr::compare(sum, CmpOperator::Lt, Expr::constant_integer(6, 4), Ttype::Logical { kind: 4, dims: vec![] }, None).unwrap();

        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (program, _) = builder.add_program("main").unwrap();
        builder.set_body(program, vec![Stmt::new(StmtKind::If { test, body: vec![Stmt::new(StmtKind::Return)], orelse: vec![] })]);

        traverse(&mut unit);

        match &unit.arena.symbol(program).body().unwrap()[0].kind {
            StmtKind::If { test, .. } => {
                assert!(matches!(test.value.as_deref(), Some(Expr { kind: ExprKind::ConstantLogical { value: true }, .. })));
            },
            kind => panic!("Body statement became {kind:?}"),
        }
    }

    /// Integer division by zero stays unfolded instead of poisoning the tree.
    #[test]
    fn test_no_fold_on_division_by_zero() {
        let div: Expr = Expr::binop(
            Expr::constant_integer(1, 4),
            BinOperator::Div,
            Expr::constant_integer(0, 4),
            Ttype::Integer { kind: 4, dims: vec![] },
            None,
        )
        .unwrap();
        assert!(Folder.fold(div).value.is_none());
    }
}





/***** HELPER FUNCTIONS *****/
/// Evaluates an integer operation, refusing anything not exactly representable.
fn eval_int(left: i64, op: BinOperator, right: i64) -> Option<i64> {
    use BinOperator::*;
    match op {
        Add => left.checked_add(right),
        Sub => left.checked_sub(right),
        Mul => left.checked_mul(right),
        Div => left.checked_div(right),
        Pow => u32::try_from(right).ok().and_then(|exp| left.checked_pow(exp)),
    }
}

/// Evaluates a real operation.
fn eval_real(left: f64, op: BinOperator, right: f64) -> f64 {
    use BinOperator::*;
    match op {
        Add => left + right,
        Sub => left - right,
        Mul => left * right,
        Div => left / right,
        Pow => left.powf(right),
    }
}





/***** TRAVERSAL STRUCTS *****/
/// The transformer that annotates foldable expressions.
struct Folder;

impl Folder {
    /// Folds one already-rebuilt expression, annotating its `value` slot when the operands are
    /// known scalars. Exposed for the tests; the traversal drives it through the transformer.
    fn fold(&mut self, mut expr: Expr) -> Expr {
        // Already-folded nodes and non-scalar results are left alone
        if expr.value.is_some() || !expr.data_type.dims().is_empty() {
            return expr;
        }

        let folded: Option<ExprKind> = match &expr.kind {
            ExprKind::BinOp { left, op, right, overloaded: None } => {
                match (left.compile_time_value().map(|e| &e.kind), right.compile_time_value().map(|e| &e.kind)) {
                    (Some(ExprKind::ConstantInteger { value: l }), Some(ExprKind::ConstantInteger { value: r })) => {
                        eval_int(*l, *op, *r).map(|value| ExprKind::ConstantInteger { value })
                    },
                    (Some(ExprKind::ConstantReal { value: l }), Some(ExprKind::ConstantReal { value: r })) => {
                        Some(ExprKind::ConstantReal { value: eval_real(*l, *op, *r) })
                    },
                    _ => None,
                }
            },

            ExprKind::UnaryOp { op, operand, overloaded: None } => match (op, operand.compile_time_value().map(|e| &e.kind)) {
                (UnaryOperator::USub, Some(ExprKind::ConstantInteger { value })) => value.checked_neg().map(|value| ExprKind::ConstantInteger { value }),
                (UnaryOperator::USub, Some(ExprKind::ConstantReal { value })) => Some(ExprKind::ConstantReal { value: -value }),
                (UnaryOperator::UAdd, Some(kind @ (ExprKind::ConstantInteger { .. } | ExprKind::ConstantReal { .. }))) => Some(kind.clone()),
                (UnaryOperator::Not, Some(ExprKind::ConstantLogical { value })) => Some(ExprKind::ConstantLogical { value: !value }),
                _ => None,
            },

            ExprKind::Compare { left, op, right, overloaded: None } => {
                match (left.compile_time_value().map(|e| &e.kind), right.compile_time_value().map(|e| &e.kind)) {
                    (Some(ExprKind::ConstantInteger { value: l }), Some(ExprKind::ConstantInteger { value: r })) => {
                        use CmpOperator::*;
                        Some(ExprKind::ConstantLogical {
                            value : match op {
                                Eq    => l == r,
                                NotEq => l != r,
                                Lt    => l < r,
                                LtE   => l <= r,
                                Gt    => l > r,
                                GtE   => l >= r,
                            },
                        })
                    },
                    _ => None,
                }
            },

            ExprKind::BoolOp { left, op, right } => {
                match (left.compile_time_value().map(|e| &e.kind), right.compile_time_value().map(|e| &e.kind)) {
                    (Some(ExprKind::ConstantLogical { value: l }), Some(ExprKind::ConstantLogical { value: r })) => {
                        use BoolOperator::*;
                        Some(ExprKind::ConstantLogical {
                            value : match op {
                                And  => *l && *r,
                                Or   => *l || *r,
                                Xor  => l != r,
                                Eqv  => l == r,
                                NEqv => l != r,
                            },
                        })
                    },
                    _ => None,
                }
            },

            _ => None,
        };

        // The folded constant carries the expression's own type, which is exactly what the value
        // invariant demands
        if let Some(kind) = folded {
            trace!(target: "const_fold", "Folded a {:?}", kind);
            expr.value = Some(Box::new(Expr {
                kind,
                data_type : expr.data_type.clone(),
                value     : None,
                range     : None,
            }));
        }
        expr
    }
}

impl AsrTransformer for Folder {
    #[inline]
    fn transform_expr(&mut self, expr: Expr) -> Expr { self.fold(expr) }
}





/***** LIBRARY *****/
/// Runs the constant fold over every body and initializer of the given unit, in place.
///
/// # Arguments
/// - `unit`: The unit to fold.
pub fn traverse(unit: &mut TranslationUnit) {
    debug!(target: "const_fold", "Folding unit with {} symbol(s)", unit.arena.symbol_count());
    transform_unit(&mut Folder, unit);
}
