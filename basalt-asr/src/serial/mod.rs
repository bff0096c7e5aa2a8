//  MOD.rs
//    by Lut99
//
//  Created:
//    08 Apr 2024, 10:14:36
//  Last edited:
//    22 Jul 2024, 13:40:55
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the versioned binary codec behind persisted module
//!   interfaces.
//!
//!   The wire layout is fixed per schema version: a four-byte magic and
//!   a little-endian `u16` version, then the root unit. Variant tags are
//!   one byte, in declaration order; optionals are a one-byte presence
//!   flag plus payload; sequences are a `u32` length prefix plus
//!   elements; strings are length-prefixed UTF-8; integers and floats
//!   are little-endian fixed widths. Symbols are numbered by in-stream
//!   first encounter in deterministic pre-order and every later
//!   occurrence is just that ordinal, which is how the cyclic symbol
//!   graph linearizes without loops.
//!
//!   For any well-formed unit, decoding an encoding yields a
//!   structurally equal unit, and re-encoding that yields the exact same
//!   bytes: the encoding is canonical. Readers refuse versions they do
//!   not implement, and refuse trailing bytes.
//

// Declare submodules
pub mod encode;
pub mod decode;

use std::fs;
use std::path::Path;

use crate::asr::toplevel::TranslationUnit;
use crate::errors::SerialError;

pub use decode::decode;
pub use encode::encode;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::asr::spec::{Abi, Deftype};
    use crate::builder::UnitBuilder;
    use crate::compiler::traversals::{interface, pickle};
    use super::*;


    /// Writes an interface module to disk and reads it back: the file carries our producer id
    /// and the unit survives structurally.
    #[test]
    fn test_module_file_round_trip() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (module, _) = builder.add_module("geometry", Abi::Source, Deftype::Implementation).unwrap();
        interface::traverse(&mut unit, module);

        let path: PathBuf = std::env::temp_dir().join(format!("basalt-asr-test-{}.{MODULE_EXT}", std::process::id()));
        write_module_file(&path, &unit).unwrap();
        let (read, producer): (TranslationUnit, u16) = read_module_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(producer, PRODUCER_ID);
        assert!(pickle::structurally_eq(&unit, &read));
    }

    /// A module file that keeps going after the root node is refused.
    #[test]
    fn test_module_file_trailing_bytes() {
        let unit: TranslationUnit = TranslationUnit::new();

        let path: PathBuf = std::env::temp_dir().join(format!("basalt-asr-test-trailing-{}.{MODULE_EXT}", std::process::id()));
        write_module_file(&path, &unit).unwrap();
        let mut bytes: Vec<u8> = fs::read(&path).unwrap();
        bytes.push(0xFF);
        fs::write(&path, bytes).unwrap();

        let result = read_module_file(&path);
        fs::remove_file(&path).ok();
        assert!(matches!(result, Err(SerialError::TrailingBytes { count: 1 })));
    }
}


/***** CONSTANTS *****/
/// The four magic bytes opening every encoded unit and module file.
pub const MAGIC: [u8; 4] = *b"BASR";
/// The schema version this build reads and writes. Any change to the node algebra bumps this.
pub const SCHEMA_VERSION: u16 = 1;
/// The producer id this compiler stamps into module files.
pub const PRODUCER_ID: u16 = 0x0001;
/// The conventional extension of module files.
pub const MODULE_EXT: &str = "bmod";





/***** HELPERS *****/
/// Maps a leaf enum onto its one-byte wire tag and back.
///
/// Tags are declaration indices, so the mapping is as closed as the enums themselves: a tag the
/// build does not know is a malformed stream, never a fall-through.
pub(crate) trait Tagged: Sized {
    /// The name used in decode errors.
    const WHAT: &'static str;

    /// Returns the wire tag of this value.
    fn tag(&self) -> u8;
    /// Returns the value behind a wire tag, or [`None`] if the tag is not part of the schema.
    fn from_tag(tag: u8) -> Option<Self>;
}

/// Implements [`Tagged`] for a fieldless enum by pinning each variant to its wire tag.
macro_rules! tagged {
    ($what:literal, $name:ty, [ $($variant:ident = $tag:literal),+ $(,)? ]) => {
        impl Tagged for $name {
            const WHAT: &'static str = $what;

            fn tag(&self) -> u8 {
                match self {
                    $(<$name>::$variant => $tag,)+
                }
            }

            fn from_tag(tag: u8) -> Option<Self> {
                match tag {
                    $($tag => Some(<$name>::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

use crate::asr::expressions::{BinOperator, BoolOperator, CmpOperator, StrOperator, UnaryOperator};
use crate::asr::spec::{Abi, Access, Boz, CastKind, Deftype, Intent, Presence, StorageType};

tagged!("abi", Abi, [Source = 0, BasaltModule = 1, GFortranModule = 2, BindC = 3, Interactive = 4, Intrinsic = 5]);
tagged!("access", Access, [Public = 0, Private = 1]);
tagged!("intent", Intent, [Local = 0, In = 1, Out = 2, InOut = 3, ReturnVar = 4, Unspecified = 5]);
tagged!("storage type", StorageType, [Default = 0, Save = 1, Parameter = 2, Allocatable = 3]);
tagged!("presence", Presence, [Required = 0, Optional = 1]);
tagged!("deftype", Deftype, [Implementation = 0, Interface = 1]);
tagged!("boz base", Boz, [Binary = 0, Octal = 1, Hex = 2]);
tagged!("cast kind", CastKind, [
    RealToInteger = 0,
    IntegerToReal = 1,
    RealToReal = 2,
    IntegerToInteger = 3,
    IntegerToComplex = 4,
    RealToComplex = 5,
    ComplexToComplex = 6,
    IntegerToLogical = 7,
    CharacterToCharacter = 8,
]);
tagged!("boolean operator", BoolOperator, [And = 0, Or = 1, Xor = 2, Eqv = 3, NEqv = 4]);
tagged!("binary operator", BinOperator, [Add = 0, Sub = 1, Mul = 2, Div = 3, Pow = 4]);
tagged!("unary operator", UnaryOperator, [Not = 0, UAdd = 1, USub = 2, Invert = 3]);
tagged!("string operator", StrOperator, [Concat = 0, Repeat = 1]);
tagged!("comparison operator", CmpOperator, [Eq = 0, NotEq = 1, Lt = 2, LtE = 3, Gt = 4, GtE = 5]);



/// The wire tags of the node enums, shared between the encoder and the decoder.
///
/// One byte each, pinned per schema version; renumbering anything here is a version bump.
pub(crate) mod tag {
    // Types
    pub const TYPE_INTEGER: u8 = 0;
    pub const TYPE_REAL: u8 = 1;
    pub const TYPE_COMPLEX: u8 = 2;
    pub const TYPE_CHARACTER: u8 = 3;
    pub const TYPE_LOGICAL: u8 = 4;
    pub const TYPE_LIST: u8 = 5;
    pub const TYPE_SET: u8 = 6;
    pub const TYPE_TUPLE: u8 = 7;
    pub const TYPE_DICT: u8 = 8;
    pub const TYPE_DERIVED: u8 = 9;
    pub const TYPE_CLASS: u8 = 10;
    pub const TYPE_POINTER: u8 = 11;

    // Expressions
    pub const EXPR_BOOL_OP: u8 = 0;
    pub const EXPR_BIN_OP: u8 = 1;
    pub const EXPR_STR_OP: u8 = 2;
    pub const EXPR_UNARY_OP: u8 = 3;
    pub const EXPR_COMPARE: u8 = 4;
    pub const EXPR_FUNCTION_CALL: u8 = 5;
    pub const EXPR_DERIVED_TYPE_CONSTRUCTOR: u8 = 6;
    pub const EXPR_CONSTANT_ARRAY: u8 = 7;
    pub const EXPR_CONSTANT_INTEGER: u8 = 8;
    pub const EXPR_CONSTANT_REAL: u8 = 9;
    pub const EXPR_CONSTANT_COMPLEX: u8 = 10;
    pub const EXPR_CONSTANT_LOGICAL: u8 = 11;
    pub const EXPR_CONSTANT_STRING: u8 = 12;
    pub const EXPR_BOZ_CONSTANT: u8 = 13;
    pub const EXPR_VAR: u8 = 14;
    pub const EXPR_ARRAY_REF: u8 = 15;
    pub const EXPR_DERIVED_REF: u8 = 16;
    pub const EXPR_IMPLICIT_CAST: u8 = 17;
    pub const EXPR_EXPLICIT_CAST: u8 = 18;

    // Statements
    pub const STMT_ASSIGNMENT: u8 = 0;
    pub const STMT_SUBROUTINE_CALL: u8 = 1;
    pub const STMT_IF: u8 = 2;
    pub const STMT_WHILE_LOOP: u8 = 3;
    pub const STMT_DO_LOOP: u8 = 4;
    pub const STMT_EXIT: u8 = 5;
    pub const STMT_CYCLE: u8 = 6;
    pub const STMT_SELECT: u8 = 7;
    pub const STMT_PRINT: u8 = 8;
    pub const STMT_OPEN: u8 = 9;
    pub const STMT_CLOSE: u8 = 10;
    pub const STMT_READ: u8 = 11;
    pub const STMT_WRITE: u8 = 12;
    pub const STMT_INQUIRE: u8 = 13;
    pub const STMT_REWIND: u8 = 14;
    pub const STMT_FLUSH: u8 = 15;
    pub const STMT_ALLOCATE: u8 = 16;
    pub const STMT_EXPLICIT_DEALLOCATE: u8 = 17;
    pub const STMT_IMPLICIT_DEALLOCATE: u8 = 18;
    pub const STMT_NULLIFY: u8 = 19;
    pub const STMT_ASSERT: u8 = 20;
    pub const STMT_GO_TO: u8 = 21;
    pub const STMT_GO_TO_TARGET: u8 = 22;
    pub const STMT_RETURN: u8 = 23;
    pub const STMT_STOP: u8 = 24;
    pub const STMT_ERROR_STOP: u8 = 25;

    // Symbols
    pub const SYMBOL_PROGRAM: u8 = 0;
    pub const SYMBOL_MODULE: u8 = 1;
    pub const SYMBOL_SUBROUTINE: u8 = 2;
    pub const SYMBOL_FUNCTION: u8 = 3;
    pub const SYMBOL_GENERIC_PROCEDURE: u8 = 4;
    pub const SYMBOL_CUSTOM_OPERATOR: u8 = 5;
    pub const SYMBOL_EXTERNAL_SYMBOL: u8 = 6;
    pub const SYMBOL_DERIVED_TYPE: u8 = 7;
    pub const SYMBOL_VARIABLE: u8 = 8;
    pub const SYMBOL_CLASS_TYPE: u8 = 9;
    pub const SYMBOL_CLASS_PROCEDURE: u8 = 10;
}





/***** LIBRARY *****/
/// Writes the given unit to a module file at the given path.
///
/// The file is the standard encoding with the producer id spliced into the header:
/// magic, version, producer, then the unit. By contract, the unit's items should be a single
/// interface-form module (see the interface projection); this function does not check that, as
/// the cache layer also stores intermediate shapes.
///
/// # Arguments
/// - `path`: The path to write to.
/// - `unit`: The unit to persist.
///
/// # Errors
/// This function errors if the file could not be written.
pub fn write_module_file(path: impl AsRef<Path>, unit: &TranslationUnit) -> Result<(), SerialError> {
    let path: &Path = path.as_ref();

    let mut bytes: Vec<u8> = Vec::new();
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    bytes.extend_from_slice(&PRODUCER_ID.to_le_bytes());
    bytes.extend_from_slice(&encode::encode_payload(unit));

    fs::write(path, bytes).map_err(|err| SerialError::Io { path: path.into(), err })
}

/// Reads a module file from the given path.
///
/// # Arguments
/// - `path`: The path to read from.
///
/// # Returns
/// The decoded unit together with the producer id stamped into the file.
///
/// # Errors
/// This function errors if the file could not be read, carries the wrong magic or version, does
/// not decode, or has trailing bytes. A failure aborts this load only; nothing shared is
/// touched.
pub fn read_module_file(path: impl AsRef<Path>) -> Result<(TranslationUnit, u16), SerialError> {
    let path: &Path = path.as_ref();
    let bytes: Vec<u8> = fs::read(path).map_err(|err| SerialError::Io { path: path.into(), err })?;
    decode::decode_module(&bytes)
}
