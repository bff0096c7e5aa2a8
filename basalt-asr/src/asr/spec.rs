//  SPEC.rs
//    by Lut99
//
//  Created:
//    12 Mar 2024, 14:02:11
//  Last edited:
//    17 Jun 2024, 10:31:48
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines non-node things for the ASR, such as debug structures
//!   (SourceRange) and the leaf enums that tag symbols (ABI, access,
//!   intent and friends).
//!
//!   The leaf enums are total and closed: every variant a producer can
//!   write is listed here, and adding one is a schema change that bumps
//!   [`crate::serial::SCHEMA_VERSION`].
//

use std::fmt::{Debug, Display, Formatter, Result as FResult};

use enum_debug::EnumDebug;


/***** LIBRARY *****/
/// Defines a SourceRange, which is a continuous byte range within the source text of a translation unit.
///
/// The elaboration collaborator attaches these for diagnostics provenance; the core itself never
/// interprets them. They are carried through the codec but elided from pickles, since the canonical
/// text of a tree must not depend on where it was written.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct SourceRange {
    /// The first byte of the range, inclusive.
    pub first : u32,
    /// The last byte of the range, inclusive.
    pub last  : u32,
}
impl SourceRange {
    /// Constructor for the SourceRange.
    ///
    /// # Arguments
    /// - `first`: The first byte of the range, inclusive.
    /// - `last`: The last byte of the range, inclusive.
    ///
    /// # Returns
    /// A new SourceRange covering the given bytes.
    #[inline]
    pub const fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }
}
impl Display for SourceRange {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "{}-{}", self.first, self.last)
    }
}



/// Provides a generalization over ASR nodes that allows passes to get some common properties.
pub trait Node: Clone + Debug {
    /// Returns the internal SourceRange of the node if it had any.
    fn range(&self) -> Option<SourceRange>;
}



/// Declares where a symbol's implementation lives and under what linkage convention.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum Abi {
    /// The implementation is given in this very unit, in the source language.
    Source,
    /// The implementation lives in a compiled Basalt module file.
    BasaltModule,
    /// The implementation lives in a module compiled by gfortran.
    GFortranModule,
    /// The implementation is reached over the C ABI, declared out-of-band.
    BindC,
    /// The implementation was entered interactively and may be redefined.
    ///
    /// Possibly transitional; nothing in the core branches on this beyond the interface
    /// projection, and backends must not grow assumptions about it.
    Interactive,
    /// The implementation is a compiler intrinsic.
    Intrinsic,
}
impl Display for Abi {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use Abi::*;
        match self {
            Source         => write!(f, "source"),
            BasaltModule   => write!(f, "basalt-module"),
            GFortranModule => write!(f, "gfortran-module"),
            BindC          => write!(f, "bind-c"),
            Interactive    => write!(f, "interactive"),
            Intrinsic      => write!(f, "intrinsic"),
        }
    }
}

/// Determines whether a symbol is visible outside of the scope that declares it.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum Access {
    /// Visible to importers of the enclosing module.
    Public,
    /// Dropped by the interface projection; only visible within the module itself.
    Private,
}
impl Display for Access {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Public  => write!(f, "public"),
            Self::Private => write!(f, "private"),
        }
    }
}

/// Determines the dataflow direction of a variable.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum Intent {
    /// A plain local variable.
    Local,
    /// A dummy argument that is only read.
    In,
    /// A dummy argument that is only written.
    Out,
    /// A dummy argument that is both read and written.
    InOut,
    /// The variable that carries a function's result. Exactly one per function.
    ReturnVar,
    /// A dummy argument whose intent the source did not declare.
    Unspecified,
}
impl Display for Intent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use Intent::*;
        match self {
            Local       => write!(f, "local"),
            In          => write!(f, "in"),
            Out         => write!(f, "out"),
            InOut       => write!(f, "inout"),
            ReturnVar   => write!(f, "returnvar"),
            Unspecified => write!(f, "unspecified"),
        }
    }
}

/// Determines where a variable's storage lives.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum StorageType {
    /// Automatic storage in the enclosing procedure.
    Default,
    /// Storage that survives across calls of the enclosing procedure.
    Save,
    /// A compile-time constant; must carry an initializer.
    Parameter,
    /// Storage acquired at runtime through an `Allocate` statement.
    Allocatable,
}
impl Display for StorageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use StorageType::*;
        match self {
            Default     => write!(f, "default"),
            Save        => write!(f, "save"),
            Parameter   => write!(f, "parameter"),
            Allocatable => write!(f, "allocatable"),
        }
    }
}

/// Determines whether a dummy argument must be passed at a call site.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum Presence {
    /// The argument must be given.
    Required,
    /// The argument may be omitted.
    Optional,
}
impl Display for Presence {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Required => write!(f, "required"),
            Self::Optional => write!(f, "optional"),
        }
    }
}

/// Determines whether a procedure carries a body or only declares a signature.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum Deftype {
    /// The procedure carries its body. Implied by [`Abi::Source`].
    Implementation,
    /// The procedure only declares its signature; its body is empty.
    Interface,
}
impl Display for Deftype {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Implementation => write!(f, "implementation"),
            Self::Interface      => write!(f, "interface"),
        }
    }
}

/// Determines the base in which a BOZ literal was written.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum Boz {
    /// Base 2, `b'...'`.
    Binary,
    /// Base 8, `o'...'`.
    Octal,
    /// Base 16, `z'...'`.
    Hex,
}
impl Display for Boz {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Binary => write!(f, "binary"),
            Self::Octal  => write!(f, "octal"),
            Self::Hex    => write!(f, "hex"),
        }
    }
}

/// Determines the conversion performed by a cast node.
///
/// The elaboration pass picks the kind; backends only translate it. The list is closed per schema
/// version like every other leaf enum.
#[derive(Clone, Copy, Debug, EnumDebug, Eq, Hash, PartialEq)]
pub enum CastKind {
    /// Truncating conversion from a real to an integer.
    RealToInteger,
    /// Widening conversion from an integer to a real.
    IntegerToReal,
    /// Precision change between two real kinds.
    RealToReal,
    /// Width change between two integer kinds.
    IntegerToInteger,
    /// An integer promoted to the real part of a complex.
    IntegerToComplex,
    /// A real promoted to the real part of a complex.
    RealToComplex,
    /// Precision change between two complex kinds.
    ComplexToComplex,
    /// Zero-test conversion from an integer to a logical.
    IntegerToLogical,
    /// Kind change between two character types.
    CharacterToCharacter,
}
impl Display for CastKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use CastKind::*;
        match self {
            RealToInteger        => write!(f, "real->integer"),
            IntegerToReal        => write!(f, "integer->real"),
            RealToReal           => write!(f, "real->real"),
            IntegerToInteger     => write!(f, "integer->integer"),
            IntegerToComplex     => write!(f, "integer->complex"),
            RealToComplex        => write!(f, "real->complex"),
            ComplexToComplex     => write!(f, "complex->complex"),
            IntegerToLogical     => write!(f, "integer->logical"),
            CharacterToCharacter => write!(f, "character->character"),
        }
    }
}
