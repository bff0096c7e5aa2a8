//  EXPRESSIONS.rs
//    by Lut99
//
//  Created:
//    13 Mar 2024, 09:12:55
//  Last edited:
//    02 Jul 2024, 14:50:03
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the expression nodes of the ASR.
//!
//!   Every expression carries the type it evaluates to, and optionally
//!   the constant it folds to. Overloadable operator nodes additionally
//!   carry the call they resolved to, so pretty-printers can restore the
//!   user-visible syntax while backends see only the resolved target.
//

use std::fmt::{Display, Formatter, Result as FResult};

use enum_debug::EnumDebug;

use super::spec::{Node, SourceRange};
use super::types::Ttype;
use crate::arena::SymbolId;


/***** LIBRARY *****/
/// An Expression is a typed, computable value inside a statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// Any specific implementations of an expression.
    pub kind      : ExprKind,
    /// The type this expression evaluates to.
    pub data_type : Ttype,
    /// The compile-time constant this expression folds to, if known.
    ///
    /// When present, the node is one of the `Constant*` kinds and its type equals `data_type`.
    pub value     : Option<Box<Expr>>,
    /// The range in the source text for this expression.
    pub range     : Option<SourceRange>,
}
impl Expr {
    /// Returns whether this expression's kind is one of the `Constant*` kinds (including BOZ).
    #[inline]
    pub fn is_constant(&self) -> bool {
        use ExprKind::*;
        matches!(
            self.kind,
            ConstantArray { .. }
                | ConstantInteger { .. }
                | ConstantReal { .. }
                | ConstantComplex { .. }
                | ConstantLogical { .. }
                | ConstantString { .. }
                | BozConstant { .. }
        )
    }

    /// Returns the compile-time value of this expression, if it has one.
    ///
    /// # Returns
    /// The expression itself when it is already a constant, the folded `value` when one was
    /// recorded, or [`None`] when the expression is not known at compile time.
    #[inline]
    pub fn compile_time_value(&self) -> Option<&Expr> {
        if self.is_constant() { return Some(self); }
        self.value.as_deref()
    }
}
impl Node for Expr {
    #[inline]
    fn range(&self) -> Option<SourceRange> { self.range }
}

/// Defines the ExprKind, which implements the specifics for each of the various expressions.
#[derive(Clone, Debug, EnumDebug, PartialEq)]
pub enum ExprKind {
    // Operators
    /// A short-circuiting or bitwise-equivalence operation on two logicals.
    BoolOp {
        /// The lefthand-side operand.
        left  : Box<Expr>,
        /// The operation to perform.
        op    : BoolOperator,
        /// The righthand-side operand.
        right : Box<Expr>,
    },
    /// An arithmetic operation on two numeric values.
    BinOp {
        /// The lefthand-side operand.
        left       : Box<Expr>,
        /// The operation to perform.
        op         : BinOperator,
        /// The righthand-side operand.
        right      : Box<Expr>,
        /// The call this operator resolved to, if the elaboration pass found a user overload.
        overloaded : Option<Box<Expr>>,
    },
    /// A string operation on two characters.
    StrOp {
        /// The lefthand-side operand.
        left  : Box<Expr>,
        /// The operation to perform.
        op    : StrOperator,
        /// The righthand-side operand.
        right : Box<Expr>,
    },
    /// An operation on a single value.
    UnaryOp {
        /// The operation to perform.
        op         : UnaryOperator,
        /// The operand.
        operand    : Box<Expr>,
        /// The call this operator resolved to, if the elaboration pass found a user overload.
        overloaded : Option<Box<Expr>>,
    },
    /// A comparison of two values; always evaluates to a logical.
    Compare {
        /// The lefthand-side operand.
        left       : Box<Expr>,
        /// The comparison to perform.
        op         : CmpOperator,
        /// The righthand-side operand.
        right      : Box<Expr>,
        /// The call this operator resolved to, if the elaboration pass found a user overload.
        overloaded : Option<Box<Expr>>,
    },

    // Calls & construction
    /// Calls a function.
    FunctionCall {
        /// The resolved target; always a `Function` or an `ExternalSymbol` wrapping one.
        name          : SymbolId,
        /// The symbol the source named before resolution, when that differs from `name` (a
        /// `GenericProcedure` or an `ExternalSymbol`).
        original_name : Option<SymbolId>,
        /// The actual arguments, in declaration order of the dummies.
        args          : Vec<Expr>,
    },
    /// Constructs an instance of a derived type.
    DerivedTypeConstructor {
        /// The `DerivedType` symbol being constructed.
        name : SymbolId,
        /// One value per member, in member order.
        args : Vec<Expr>,
    },

    // Values
    /// An array constant; all elements share the element type.
    ConstantArray {
        /// The elements of the array.
        elements : Vec<Expr>,
    },
    /// An integer constant.
    ConstantInteger {
        value : i64,
    },
    /// A real constant.
    ConstantReal {
        value : f64,
    },
    /// A complex constant.
    ConstantComplex {
        real : f64,
        imag : f64,
    },
    /// A logical constant.
    ConstantLogical {
        value : bool,
    },
    /// A character constant.
    ConstantString {
        value : String,
    },
    /// A bit-pattern constant, remembering the base it was written in.
    BozConstant {
        /// The bit pattern.
        value : u64,
        /// The base of the literal in the source.
        repr  : super::spec::Boz,
    },

    // References
    /// Reads a variable.
    Var {
        /// The `Variable` (or `ExternalSymbol`) referenced.
        name : SymbolId,
    },
    /// Subscripts an array variable.
    ArrayRef {
        /// The array variable being subscripted.
        array   : SymbolId,
        /// One index (or section) per dimension.
        indices : Vec<ArrayIndex>,
    },
    /// Projects a member out of a derived-type value.
    DerivedRef {
        /// The value being projected.
        target : Box<Expr>,
        /// The member `Variable` inside the derived type's scope.
        member : SymbolId,
    },

    // Casts
    /// A conversion the elaboration pass inserted.
    ImplicitCast {
        /// The value being converted.
        arg       : Box<Expr>,
        /// The conversion performed.
        cast_kind : super::spec::CastKind,
    },
    /// A conversion the source spelled out.
    ExplicitCast {
        /// The value being converted.
        arg       : Box<Expr>,
        /// The conversion performed.
        cast_kind : super::spec::CastKind,
    },
}



/// Defines one subscript of an [`ArrayRef`](ExprKind::ArrayRef): either a single index (only
/// `right` present) or a section with optional bounds and stride.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayIndex {
    /// The lower bound of a section, if any.
    pub left  : Option<Box<Expr>>,
    /// The single index, or the upper bound of a section.
    pub right : Option<Box<Expr>>,
    /// The stride of a section, if any.
    pub step  : Option<Box<Expr>>,
}
impl ArrayIndex {
    /// Constructor for an ArrayIndex that subscripts a single element.
    ///
    /// # Arguments
    /// - `index`: The index expression.
    ///
    /// # Returns
    /// A new ArrayIndex with only `right` populated.
    #[inline]
    pub fn single(index: Expr) -> Self {
        Self { left: None, right: Some(Box::new(index)), step: None }
    }
}



/// Defines the logical operations.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum BoolOperator {
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Exclusive disjunction.
    Xor,
    /// Logical equivalence.
    Eqv,
    /// Logical non-equivalence.
    NEqv,
}
impl Display for BoolOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use BoolOperator::*;
        match self {
            And  => write!(f, ".and."),
            Or   => write!(f, ".or."),
            Xor  => write!(f, ".xor."),
            Eqv  => write!(f, ".eqv."),
            NEqv => write!(f, ".neqv."),
        }
    }
}

/// Defines the arithmetic operations.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum BinOperator {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Exponentiation.
    Pow,
}
impl Display for BinOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use BinOperator::*;
        match self {
            Add => write!(f, "+"),
            Sub => write!(f, "-"),
            Mul => write!(f, "*"),
            Div => write!(f, "/"),
            Pow => write!(f, "**"),
        }
    }
}

/// Defines the unary operations.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum UnaryOperator {
    /// Logical negation.
    Not,
    /// Arithmetic identity.
    UAdd,
    /// Arithmetic negation.
    USub,
    /// Bitwise inversion.
    Invert,
}
impl Display for UnaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use UnaryOperator::*;
        match self {
            Not    => write!(f, ".not."),
            UAdd   => write!(f, "+"),
            USub   => write!(f, "-"),
            Invert => write!(f, "~"),
        }
    }
}

/// Defines the string operations.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum StrOperator {
    /// Concatenation.
    Concat,
    /// Repetition by an integer count.
    Repeat,
}
impl Display for StrOperator {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Concat => write!(f, "//"),
            Self::Repeat => write!(f, "**"),
        }
    }
}

/// Defines the comparisons.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum CmpOperator {
    /// Equality.
    Eq,
    /// Inequality.
    NotEq,
    /// Strictly smaller than.
    Lt,
    /// Smaller than or equal to.
    LtE,
    /// Strictly greater than.
    Gt,
    /// Greater than or equal to.
    GtE,
}
impl Display for CmpOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use CmpOperator::*;
        match self {
            Eq    => write!(f, "=="),
            NotEq => write!(f, "/="),
            Lt    => write!(f, "<"),
            LtE   => write!(f, "<="),
            Gt    => write!(f, ">"),
            GtE   => write!(f, ">="),
        }
    }
}
