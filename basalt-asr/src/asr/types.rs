//  TYPES.rs
//    by Lut99
//
//  Created:
//    12 Mar 2024, 15:44:09
//  Last edited:
//    02 Jul 2024, 11:18:26
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the value types (`Ttype`) that every ASR expression and
//!   variable carries, as well as the array dimensions attached to them.
//

use std::fmt::{Display, Formatter, Result as FResult};

use enum_debug::EnumDebug;

use super::expressions::Expr;
use crate::arena::SymbolId;


/***** CONSTANTS *****/
/// The [`Character`](Ttype::Character) length that marks an inferred length.
pub const CHAR_LEN_INFERRED: i64 = -1;
/// The [`Character`](Ttype::Character) length that marks an allocatable (deferred) length.
pub const CHAR_LEN_ALLOCATABLE: i64 = -2;
/// The [`Character`](Ttype::Character) length that marks a runtime length held in the attached length expression.
pub const CHAR_LEN_EXPR: i64 = -3;





/***** AUXILLARY *****/
/// Defines one dimension of an array type as a pair of optional bound expressions.
///
/// Omitting a bound models assumed or deferred shape; which of the two it is follows from the
/// storage of the variable carrying the type, not from the type itself.
#[derive(Clone, Debug, PartialEq)]
pub struct Dimension {
    /// The lower bound, if declared.
    pub start : Option<Box<Expr>>,
    /// The upper bound, if declared.
    pub end   : Option<Box<Expr>>,
}
impl Dimension {
    /// Constructor for a Dimension with both bounds omitted (assumed/deferred shape).
    #[inline]
    pub const fn assumed() -> Self {
        Self { start: None, end: None }
    }

    /// Constructor for a Dimension with explicit bounds.
    ///
    /// # Arguments
    /// - `start`: The lower bound expression.
    /// - `end`: The upper bound expression.
    ///
    /// # Returns
    /// A new Dimension carrying both bounds.
    #[inline]
    pub fn explicit(start: Expr, end: Expr) -> Self {
        Self { start: Some(Box::new(start)), end: Some(Box::new(end)) }
    }
}





/***** LIBRARY *****/
/// Defines the value types of the ASR.
///
/// The algebra is closed: producers and consumers share this exact list per schema version.
#[derive(Clone, Debug, EnumDebug, PartialEq)]
pub enum Ttype {
    // Numeric types
    /// A signed integer of the given kind (width selector, in bytes).
    Integer {
        /// The precision selector (1, 2, 4 or 8 bytes).
        kind : u8,
        /// Zero or more array dimensions.
        dims : Vec<Dimension>,
    },
    /// An IEEE real of the given kind.
    Real {
        /// The precision selector (4 or 8 bytes).
        kind : u8,
        /// Zero or more array dimensions.
        dims : Vec<Dimension>,
    },
    /// A complex number; kind selects the width of each component.
    Complex {
        /// The precision selector (4 or 8 bytes per component).
        kind : u8,
        /// Zero or more array dimensions.
        dims : Vec<Dimension>,
    },

    /// A character sequence.
    Character {
        /// The character kind.
        kind     : u8,
        /// The compile-time length: `>= 0` is a literal length, and the negative sentinels are
        /// [`CHAR_LEN_INFERRED`], [`CHAR_LEN_ALLOCATABLE`] and [`CHAR_LEN_EXPR`].
        len      : i64,
        /// The runtime length expression; present exactly when `len` is [`CHAR_LEN_EXPR`].
        len_expr : Option<Box<Expr>>,
        /// Zero or more array dimensions.
        dims     : Vec<Dimension>,
    },
    /// A logical (boolean) of the given kind.
    Logical {
        /// The width selector.
        kind : u8,
        /// Zero or more array dimensions.
        dims : Vec<Dimension>,
    },

    // Aggregate types
    /// A homogeneous growable sequence.
    List(Box<Ttype>),
    /// A homogeneous unordered collection without duplicates.
    Set(Box<Ttype>),
    /// A fixed-arity heterogeneous product.
    Tuple(Vec<Ttype>),
    /// A homogeneous map.
    Dict {
        /// The key type.
        key   : Box<Ttype>,
        /// The value type.
        value : Box<Ttype>,
    },

    // User types
    /// An instance of a derived type; the symbol is the defining [`DerivedType`](super::symbols::SymbolKind::DerivedType).
    Derived {
        /// The defining type symbol.
        symbol : SymbolId,
        /// Zero or more array dimensions.
        dims   : Vec<Dimension>,
    },
    /// A polymorphic instance of a class; the symbol is the defining [`ClassType`](super::symbols::SymbolKind::ClassType).
    Class {
        /// The defining class symbol.
        symbol : SymbolId,
        /// Zero or more array dimensions.
        dims   : Vec<Dimension>,
    },

    /// A pointer to a value of the wrapped type.
    ///
    /// Dimensions of a non-scalar target stay on the wrapped type; the core passes them through
    /// untouched and leaves their meaning to the elaboration collaborator.
    Pointer(Box<Ttype>),
}

impl Ttype {
    /// Returns whether this type is one of the numeric types (integer, real or complex).
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer { .. } | Self::Real { .. } | Self::Complex { .. })
    }

    /// Returns whether this type is a logical.
    #[inline]
    pub fn is_logical(&self) -> bool { matches!(self, Self::Logical { .. }) }

    /// Returns whether this type is a character.
    #[inline]
    pub fn is_character(&self) -> bool { matches!(self, Self::Character { .. }) }

    /// Returns the precision selector of this type, if it has one.
    ///
    /// # Returns
    /// The kind of the numeric, character or logical type, or [`None`] for aggregate, user and
    /// pointer types.
    #[inline]
    pub fn kind(&self) -> Option<u8> {
        use Ttype::*;
        match self {
            Integer { kind, .. }   |
            Real { kind, .. }      |
            Complex { kind, .. }   |
            Character { kind, .. } |
            Logical { kind, .. }   => Some(*kind),

            List(_) | Set(_) | Tuple(_) | Dict { .. } | Derived { .. } | Class { .. } | Pointer(_) => None,
        }
    }

    /// Returns the array dimensions of this type.
    ///
    /// # Returns
    /// A slice of the type's [`Dimension`]s. Aggregate and pointer types have no dimensions of
    /// their own and return the empty slice.
    pub fn dims(&self) -> &[Dimension] {
        use Ttype::*;
        match self {
            Integer { dims, .. }   |
            Real { dims, .. }      |
            Complex { dims, .. }   |
            Character { dims, .. } |
            Logical { dims, .. }   |
            Derived { dims, .. }   |
            Class { dims, .. }     => dims,

            List(_) | Set(_) | Tuple(_) | Dict { .. } | Pointer(_) => &[],
        }
    }

    /// Returns whether two types agree on variant and kind, ignoring dimensions and length
    /// expressions.
    ///
    /// This is the comparison the builder uses when relating an expression's type to the type of
    /// its folded value, where shape information may legitimately differ in representation.
    pub fn same_kind(&self, other: &Self) -> bool {
        use Ttype::*;
        match (self, other) {
            (Integer { kind: l, .. }, Integer { kind: r, .. })     => l == r,
            (Real { kind: l, .. }, Real { kind: r, .. })           => l == r,
            (Complex { kind: l, .. }, Complex { kind: r, .. })     => l == r,
            (Character { kind: l, .. }, Character { kind: r, .. }) => l == r,
            (Logical { kind: l, .. }, Logical { kind: r, .. })     => l == r,

            (List(l), List(r)) => l.same_kind(r),
            (Set(l), Set(r))   => l.same_kind(r),
            (Tuple(l), Tuple(r)) => l.len() == r.len() && l.iter().zip(r.iter()).all(|(l, r)| l.same_kind(r)),
            (Dict { key: lk, value: lv }, Dict { key: rk, value: rv }) => lk.same_kind(rk) && lv.same_kind(rv),

            (Derived { symbol: l, .. }, Derived { symbol: r, .. }) => l == r,
            (Class { symbol: l, .. }, Class { symbol: r, .. })     => l == r,

            (Pointer(l), Pointer(r)) => l.same_kind(r),

            _ => false,
        }
    }
}

impl Display for Ttype {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use Ttype::*;
        match self {
            Integer { kind, dims }   => { write!(f, "integer({kind})")?; write_dims(f, dims) },
            Real { kind, dims }      => { write!(f, "real({kind})")?; write_dims(f, dims) },
            Complex { kind, dims }   => { write!(f, "complex({kind})")?; write_dims(f, dims) },
            Character { kind, len, dims, .. } => { write!(f, "character({kind},{len})")?; write_dims(f, dims) },
            Logical { kind, dims }   => { write!(f, "logical({kind})")?; write_dims(f, dims) },

            List(inner)          => write!(f, "list[{inner}]"),
            Set(inner)           => write!(f, "set[{inner}]"),
            Tuple(elems)         => write!(f, "tuple[{}]", elems.iter().map(|e| e.to_string()).collect::<Vec<String>>().join(", ")),
            Dict { key, value }  => write!(f, "dict[{key}, {value}]"),

            Derived { symbol, dims } => { write!(f, "derived(#{})", symbol.raw())?; write_dims(f, dims) },
            Class { symbol, dims }   => { write!(f, "class(#{})", symbol.raw())?; write_dims(f, dims) },

            Pointer(inner) => write!(f, "pointer[{inner}]"),
        }
    }
}

/// Writes the rank of the given dimension list behind a type, if it is non-scalar.
///
/// # Arguments
/// - `f`: The Formatter to write to.
/// - `dims`: The dimensions to summarize.
///
/// # Errors
/// This function errors if we failed to write to the given formatter.
fn write_dims(f: &mut Formatter<'_>, dims: &[Dimension]) -> FResult {
    if dims.is_empty() { return Ok(()); }
    write!(f, " dims({})", dims.len())
}
