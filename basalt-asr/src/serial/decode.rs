//  DECODE.rs
//    by Lut99
//
//  Created:
//    09 Apr 2024, 09:46:12
//  Last edited:
//    22 Jul 2024, 15:36:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the decoder half of the module-interface codec.
//!
//!   The decoder is the left inverse of the encoder up to arena
//!   identity: the decoded unit is structurally equal to the encoded
//!   one and re-encodes to the same bytes. Symbol ordinals resolve
//!   through a table built by in-stream first encounter; an ordinal met
//!   before its definition gets a placeholder slot in the arena, which
//!   its definition later fills in place, so cycles and forward
//!   references bind without a second pass. An ordinal whose definition
//!   never arrives is a malformed stream, as is a wrong magic, an
//!   unknown version, any impossible tag, length or end-of-stream, and
//!   any trailing byte.
//

use log::debug;

use crate::arena::{ScopeId, SymbolId};
use crate::asr::expressions::{ArrayIndex, Expr, ExprKind};
use crate::asr::spec::SourceRange;
use crate::asr::statements::{AllocArg, Case, DoLoopHead, Stmt, StmtKind};
use crate::asr::symbols::{Symbol, SymbolKind};
use crate::asr::toplevel::TranslationUnit;
use crate::asr::types::{Dimension, Ttype};
use crate::errors::SerialError;
use super::{tag, Tagged, MAGIC, SCHEMA_VERSION};


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use crate::asr::expressions::BinOperator;
    use crate::asr::spec::{Abi, Access, Deftype, Intent, Presence};
    use crate::asr::statements::{Stmt, StmtKind};
    use crate::builder::UnitBuilder;
    use crate::compiler::traversals::pickle::{pickle, structurally_eq};
    use crate::serial::encode::encode;
    use super::*;


    /// Builds a unit that exercises most of the graph: two modules, a function with arguments
    /// and a folded body, a generic set, and a cross-module external.
    fn rich_unit() -> TranslationUnit {
        let int4: Ttype = Ttype::Integer { kind: 4, dims: vec![] };

        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);

        // Module 'm' with function 'f(x)' and a generic 'g' over it
        let (_, mscope) = builder.add_module("m", Abi::Source, Deftype::Implementation).unwrap();
        let (f, _, fret) = builder.add_function(mscope, "f", int4.clone(), Abi::Source, Access::Public, Deftype::Implementation).unwrap();
        let x: SymbolId = builder.add_argument(f, "x", int4.clone(), Intent::In, Presence::Required).unwrap();
        let sum: Expr = Expr::binop(
            Expr::var(x, int4.clone()),
            BinOperator::Add,
            Expr::constant_integer(3, 4),
            int4.clone(),
            None,
        )
        .unwrap();
        builder.set_body(f, vec![
            Stmt::new(StmtKind::GoTo { id: 7 }),
            Stmt::new(StmtKind::Assignment { target: Expr::var(fret, int4.clone()), value: sum }),
            Stmt::new(StmtKind::GoToTarget { id: 7 }),
            Stmt::new(StmtKind::Return),
        ]);
        builder.finalize_procedure(f).unwrap();
        builder.add_generic_procedure(mscope, "g", vec![f], Access::Public).unwrap();

        // Module 'n' re-exports 'f' through an external
        let (_, nscope) = builder.add_module("n", Abi::Source, Deftype::Implementation).unwrap();
        builder.add_external_symbol(nscope, "f", "m", vec![], "f", f, Access::Public).unwrap();

        unit
    }

    /// The round-trip law: decode(encode(U)) is structurally equal to U, pickles identically,
    /// and re-encodes to the same bytes.
    #[test]
    fn test_round_trip() {
        let unit: TranslationUnit = rich_unit();
        let bytes: Vec<u8> = encode(&unit);

        let decoded: TranslationUnit = decode(&bytes).unwrap();
        assert!(structurally_eq(&unit, &decoded));
        assert_eq!(pickle(&unit), pickle(&decoded));
        assert_eq!(encode(&decoded), bytes);
    }

    /// A call resolved through a generic keeps both the resolved target and the pre-resolution
    /// symbol across a round trip.
    #[test]
    fn test_generic_dispatch_round_trip() {
        let int4: Ttype = Ttype::Integer { kind: 4, dims: vec![] };

        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (_, mscope) = builder.add_module("m", Abi::Source, Deftype::Implementation).unwrap();

        // A generic 'dist' over three candidates, resolved to the second at this call site
        let mut candidates: Vec<SymbolId> = vec![];
        for name in ["dist_i32", "dist_i64", "dist_r64"] {
            let (f, _, _) = builder.add_function(mscope, name, int4.clone(), Abi::Source, Access::Public, Deftype::Implementation).unwrap();
            builder.set_body(f, vec![Stmt::new(StmtKind::Return)]);
            candidates.push(f);
        }
        let generic: SymbolId = builder.add_generic_procedure(mscope, "dist", candidates.clone(), Access::Public).unwrap();

        let (program, pscope) = builder.add_program("main").unwrap();
        let result: SymbolId = builder
            .add_variable(pscope, "result", int4.clone(), crate::asr::spec::StorageType::Default, Access::Private, None)
            .unwrap();
        let call: Expr = Expr::function_call(candidates[1], Some(generic), vec![Expr::constant_integer(1, 4)], int4.clone(), None).unwrap();
        builder.set_body(program, vec![Stmt::new(StmtKind::Assignment { target: Expr::var(result, int4), value: call })]);

        let decoded: TranslationUnit = decode(&encode(&unit)).unwrap();
        assert_eq!(pickle(&unit), pickle(&decoded));

        // Find the call again in the decoded unit and check both symbols survived
        let program: SymbolId = decoded.items.iter().copied().find(|id| decoded.arena.symbol(*id).name == "main").unwrap();
        match &decoded.arena.symbol(program).body().unwrap()[0].kind {
            StmtKind::Assignment { value, .. } => match &value.kind {
                crate::asr::expressions::ExprKind::FunctionCall { name, original_name, .. } => {
                    assert_eq!(decoded.arena.symbol(*name).name, "dist_i64");
                    assert_eq!(decoded.arena.symbol(original_name.unwrap()).name, "dist");
                },
                kind => panic!("Assignment value became {kind:?}"),
            },
            kind => panic!("Body statement became {kind:?}"),
        }
    }

    /// A reader refuses a version it does not implement.
    #[test]
    fn test_version_mismatch() {
        let mut bytes: Vec<u8> = encode(&rich_unit());
        let bumped: u16 = SCHEMA_VERSION + 1;
        bytes[4..6].copy_from_slice(&bumped.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(SerialError::SchemaMismatch { .. })));
    }

    /// A reader refuses the wrong magic.
    #[test]
    fn test_bad_magic() {
        let mut bytes: Vec<u8> = encode(&rich_unit());
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(SerialError::BadMagic { .. })));
    }

    /// Truncating a well-formed stream anywhere yields a malformed-stream failure, never a
    /// panic, and never a unit.
    #[test]
    fn test_truncation() {
        let bytes: Vec<u8> = encode(&rich_unit());
        for len in 0..bytes.len() {
            assert!(decode(&bytes[..len]).is_err(), "Decoding a stream truncated to {len} byte(s) did not fail");
        }
    }

    /// A stream with trailing bytes is rejected.
    #[test]
    fn test_trailing_bytes() {
        let mut bytes: Vec<u8> = encode(&rich_unit());
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(SerialError::TrailingBytes { count: 1 })));
    }
}





/***** LIBRARY *****/
/// Decodes a unit from its canonical byte stream: magic, schema version, then the unit.
///
/// # Errors
/// This function errors with [`SerialError::BadMagic`] or [`SerialError::SchemaMismatch`] on a
/// foreign header, and with one of the malformed-stream kinds on anything that does not decode
/// exactly. A failure leaves nothing behind; previously decoded units are untouched by
/// construction, since every decode builds a fresh arena.
pub fn decode(bytes: &[u8]) -> Result<TranslationUnit, SerialError> {
    let rest: &[u8] = check_header(bytes)?;
    decode_payload(rest)
}

/// Decodes a module file: magic, schema version, producer id, then the unit.
///
/// # Returns
/// The decoded unit together with the producer id stamped into the header.
///
/// # Errors
/// As [`decode()`].
pub(crate) fn decode_module(bytes: &[u8]) -> Result<(TranslationUnit, u16), SerialError> {
    let rest: &[u8] = check_header(bytes)?;
    if rest.len() < 2 {
        return Err(SerialError::UnexpectedEof { what: "producer id" });
    }
    let producer: u16 = u16::from_le_bytes([rest[0], rest[1]]);
    Ok((decode_payload(&rest[2..])?, producer))
}

/// Checks the magic and schema version opening every stream.
///
/// # Returns
/// The remainder of the stream after the header.
fn check_header(bytes: &[u8]) -> Result<&[u8], SerialError> {
    if bytes.len() < 4 {
        return Err(SerialError::UnexpectedEof { what: "magic" });
    }
    if bytes[..4] != MAGIC {
        return Err(SerialError::BadMagic { got: [bytes[0], bytes[1], bytes[2], bytes[3]] });
    }
    if bytes.len() < 6 {
        return Err(SerialError::UnexpectedEof { what: "schema version" });
    }
    let version: u16 = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != SCHEMA_VERSION {
        return Err(SerialError::SchemaMismatch { got: version, expected: SCHEMA_VERSION });
    }
    Ok(&bytes[6..])
}

/// Decodes a headerless unit payload, consuming the whole input.
fn decode_payload(bytes: &[u8]) -> Result<TranslationUnit, SerialError> {
    let mut decoder: Decoder = Decoder {
        bytes,
        pos     : 0,
        unit    : TranslationUnit::new(),
        ids     : Vec::new(),
        defined : Vec::new(),
    };
    decoder.unit()?;

    // Every ordinal handed out must have found its definition
    if let Some(ordinal) = decoder.defined.iter().position(|defined| !defined) {
        return Err(SerialError::UndefinedOrdinal { ordinal: ordinal as u32 });
    }
    // And nothing may follow the root node
    if decoder.pos < bytes.len() {
        return Err(SerialError::TrailingBytes { count: bytes.len() - decoder.pos });
    }

    debug!(target: "decode", "Decoded unit with {} symbol(s)", decoder.unit.arena.symbol_count());
    Ok(decoder.unit)
}





/***** DECODER *****/
/// The state of one decoding run.
struct Decoder<'b> {
    /// The stream being decoded.
    bytes   : &'b [u8],
    /// The read head.
    pos     : usize,
    /// The unit being rebuilt.
    unit    : TranslationUnit,
    /// The arena slot behind each ordinal handed out so far.
    ids     : Vec<SymbolId>,
    /// Whether each ordinal's definition has arrived yet.
    defined : Vec<bool>,
}

impl<'b> Decoder<'b> {
    // Primitives
    /// Takes the next `n` bytes off the stream.
    fn take(&mut self, n: usize, what: &'static str) -> Result<&'b [u8], SerialError> {
        if self.pos + n > self.bytes.len() {
            return Err(SerialError::UnexpectedEof { what });
        }
        let slice: &'b [u8] = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8, SerialError> {
        Ok(self.take(1, what)?[0])
    }
    fn u32(&mut self, what: &'static str) -> Result<u32, SerialError> {
        Ok(u32::from_le_bytes(self.take(4, what)?.try_into().unwrap()))
    }
    fn u64(&mut self, what: &'static str) -> Result<u64, SerialError> {
        Ok(u64::from_le_bytes(self.take(8, what)?.try_into().unwrap()))
    }
    fn i64(&mut self, what: &'static str) -> Result<i64, SerialError> {
        Ok(i64::from_le_bytes(self.take(8, what)?.try_into().unwrap()))
    }
    fn f64(&mut self, what: &'static str) -> Result<f64, SerialError> {
        Ok(f64::from_le_bytes(self.take(8, what)?.try_into().unwrap()))
    }

    /// Reads a boolean, strictly `0` or `1`; anything else cannot have come from the encoder.
    fn boolean(&mut self, what: &'static str) -> Result<bool, SerialError> {
        match self.u8(what)? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(SerialError::BadTag { what, tag }),
        }
    }

    /// Reads the one-byte presence flag of an optional.
    #[inline]
    fn presence(&mut self, what: &'static str) -> Result<bool, SerialError> {
        self.boolean(what)
    }

    /// Reads a length-prefixed UTF-8 string.
    fn string(&mut self, what: &'static str) -> Result<String, SerialError> {
        let len: u32 = self.u32(what)?;
        let bytes: &[u8] = self.take(len as usize, what)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerialError::BadUtf8 { what })
    }

    /// Reads a leaf enum from its wire tag.
    fn tagged<T: Tagged>(&mut self) -> Result<T, SerialError> {
        let tag: u8 = self.u8(T::WHAT)?;
        T::from_tag(tag).ok_or(SerialError::BadTag { what: T::WHAT, tag })
    }

    /// Reads a symbol occurrence, mapping its ordinal onto an arena slot.
    #[inline]
    fn sref(&mut self) -> Result<SymbolId, SerialError> {
        let ordinal: u32 = self.u32("symbol ordinal")?;
        self.resolve_ordinal(ordinal)
    }

    /// Maps an ordinal onto an arena slot.
    ///
    /// A fresh ordinal (the next free one) gets a placeholder slot; its definition fills the
    /// slot in place when it arrives. An ordinal skipping ahead cannot have come from the
    /// encoder.
    fn resolve_ordinal(&mut self, ordinal: u32) -> Result<SymbolId, SerialError> {
        if (ordinal as usize) < self.ids.len() {
            return Ok(self.ids[ordinal as usize]);
        }
        if ordinal as usize == self.ids.len() {
            let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::placeholder());
            self.ids.push(id);
            self.defined.push(false);
            return Ok(id);
        }
        Err(SerialError::BadOrdinal { ordinal, count: self.ids.len() as u32 })
    }

    /// Reads an optional source range.
    fn range(&mut self) -> Result<Option<SourceRange>, SerialError> {
        if !self.presence("source range presence flag")? {
            return Ok(None);
        }
        let first: u32 = self.u32("source range start")?;
        let last: u32 = self.u32("source range end")?;
        Ok(Some(SourceRange { first, last }))
    }



    // Nodes
    /// Decodes the root unit into the fresh unit's global scope.
    fn unit(&mut self) -> Result<(), SerialError> {
        let global_scope: ScopeId = self.unit.global_scope;
        self.scope_into(global_scope)?;

        let count: u32 = self.u32("item count")?;
        for _ in 0..count {
            let item: SymbolId = self.sref()?;
            self.unit.items.push(item);
        }
        self.unit.range = self.range()?;
        Ok(())
    }

    /// Decodes a symbol table's entries into an already-allocated scope.
    fn scope_into(&mut self, scope: ScopeId) -> Result<(), SerialError> {
        let count: u32 = self.u32("symbol table entry count")?;
        for _ in 0..count {
            self.symbol_def(scope)?;
        }
        Ok(())
    }

    /// Decodes one symbol definition into the given scope.
    fn symbol_def(&mut self, scope: ScopeId) -> Result<(), SerialError> {
        let ordinal: u32 = self.u32("symbol ordinal")?;
        let id: SymbolId = self.resolve_ordinal(ordinal)?;
        let name: String = self.string("symbol name")?;
        let range: Option<SourceRange> = self.range()?;

        let kind: SymbolKind = match self.u8("symbol kind tag")? {
            tag::SYMBOL_PROGRAM => {
                let symtab: ScopeId = self.unit.arena.alloc_scope(Some(scope));
                self.scope_into(symtab)?;
                let body: Vec<Stmt> = self.stmts()?;
                SymbolKind::Program { symtab, body }
            },
            tag::SYMBOL_MODULE => {
                let symtab: ScopeId = self.unit.arena.alloc_scope(Some(scope));
                self.scope_into(symtab)?;
                SymbolKind::Module { symtab, abi: self.tagged()?, deftype: self.tagged()? }
            },
            tag::SYMBOL_SUBROUTINE => {
                let symtab: ScopeId = self.unit.arena.alloc_scope(Some(scope));
                self.scope_into(symtab)?;
                SymbolKind::Subroutine {
                    symtab,
                    args    : self.srefs()?,
                    body    : self.stmts()?,
                    abi     : self.tagged()?,
                    access  : self.tagged()?,
                    deftype : self.tagged()?,
                }
            },
            tag::SYMBOL_FUNCTION => {
                let symtab: ScopeId = self.unit.arena.alloc_scope(Some(scope));
                self.scope_into(symtab)?;
                SymbolKind::Function {
                    symtab,
                    args       : self.srefs()?,
                    body       : self.stmts()?,
                    return_var : self.sref()?,
                    abi        : self.tagged()?,
                    access     : self.tagged()?,
                    deftype    : self.tagged()?,
                }
            },

            tag::SYMBOL_GENERIC_PROCEDURE => SymbolKind::GenericProcedure { procs: self.srefs()?, access: self.tagged()? },
            tag::SYMBOL_CUSTOM_OPERATOR => SymbolKind::CustomOperator { procs: self.srefs()?, access: self.tagged()? },
            tag::SYMBOL_EXTERNAL_SYMBOL => {
                let module_name: String = self.string("external module name")?;
                let count: u32 = self.u32("external scope name count")?;
                let mut scope_names: Vec<String> = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    scope_names.push(self.string("external scope name")?);
                }
                SymbolKind::ExternalSymbol {
                    module_name,
                    scope_names,
                    external      : self.sref()?,
                    original_name : self.string("external original name")?,
                    access        : self.tagged()?,
                }
            },

            tag::SYMBOL_DERIVED_TYPE => {
                let symtab: ScopeId = self.unit.arena.alloc_scope(Some(scope));
                self.scope_into(symtab)?;
                let abi = self.tagged()?;
                let access = self.tagged()?;
                let parent: Option<SymbolId> = if self.presence("derived type parent presence flag")? { Some(self.sref()?) } else { None };
                SymbolKind::DerivedType { symtab, abi, access, parent }
            },
            tag::SYMBOL_VARIABLE => SymbolKind::Variable {
                data_type   : self.ttype()?,
                intent      : self.tagged()?,
                storage     : self.tagged()?,
                abi         : self.tagged()?,
                access      : self.tagged()?,
                presence    : self.tagged()?,
                initializer : self.opt_expr()?.map(Box::new),
            },
            tag::SYMBOL_CLASS_TYPE => {
                let symtab: ScopeId = self.unit.arena.alloc_scope(Some(scope));
                self.scope_into(symtab)?;
                SymbolKind::ClassType { symtab, abi: self.tagged()?, access: self.tagged()? }
            },
            tag::SYMBOL_CLASS_PROCEDURE => SymbolKind::ClassProcedure { proc: self.sref()?, access: self.tagged()? },

            tag => return Err(SerialError::BadTag { what: "symbol kind", tag }),
        };

        // Fill the slot in place and register the entry. A second definition of the same
        // ordinal, like a name collision, cannot have come from the encoder.
        if std::mem::replace(&mut self.defined[ordinal as usize], true) {
            return Err(SerialError::DuplicateEntry { name });
        }
        self.unit.arena.replace_symbol(id, Symbol { name, kind, range });
        if self.unit.arena.insert(scope, id).is_err() {
            return Err(SerialError::DuplicateEntry { name: self.unit.arena.symbol(id).name.clone() });
        }
        Ok(())
    }

    /// Decodes a length-prefixed run of symbol references.
    fn srefs(&mut self) -> Result<Vec<SymbolId>, SerialError> {
        let count: u32 = self.u32("symbol reference count")?;
        let mut ids: Vec<SymbolId> = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            ids.push(self.sref()?);
        }
        Ok(ids)
    }

    /// Decodes a length-prefixed run of statements.
    fn stmts(&mut self) -> Result<Vec<Stmt>, SerialError> {
        let count: u32 = self.u32("statement count")?;
        let mut stmts: Vec<Stmt> = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            stmts.push(self.stmt()?);
        }
        Ok(stmts)
    }

    /// Decodes a length-prefixed run of expressions.
    fn exprs(&mut self) -> Result<Vec<Expr>, SerialError> {
        let count: u32 = self.u32("expression count")?;
        let mut exprs: Vec<Expr> = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            exprs.push(self.expr()?);
        }
        Ok(exprs)
    }

    /// Decodes an optional expression.
    fn opt_expr(&mut self) -> Result<Option<Expr>, SerialError> {
        if self.presence("expression presence flag")? { Ok(Some(self.expr()?)) } else { Ok(None) }
    }

    /// Decodes one statement.
    fn stmt(&mut self) -> Result<Stmt, SerialError> {
        let kind: StmtKind = match self.u8("statement kind tag")? {
            tag::STMT_ASSIGNMENT => StmtKind::Assignment { target: self.expr()?, value: self.expr()? },
            tag::STMT_SUBROUTINE_CALL => StmtKind::SubroutineCall {
                name          : self.sref()?,
                original_name : if self.presence("original name presence flag")? { Some(self.sref()?) } else { None },
                args          : self.exprs()?,
            },

            tag::STMT_IF => StmtKind::If { test: self.expr()?, body: self.stmts()?, orelse: self.stmts()? },
            tag::STMT_WHILE_LOOP => StmtKind::WhileLoop { test: self.expr()?, body: self.stmts()? },
            tag::STMT_DO_LOOP => StmtKind::DoLoop {
                head : DoLoopHead {
                    var       : self.sref()?,
                    start     : self.expr()?,
                    end       : self.expr()?,
                    increment : self.opt_expr()?,
                },
                body : self.stmts()?,
            },
            tag::STMT_EXIT => StmtKind::Exit,
            tag::STMT_CYCLE => StmtKind::Cycle,
            tag::STMT_SELECT => {
                let selector: Expr = self.expr()?;
                let count: u32 = self.u32("case count")?;
                let mut cases: Vec<Case> = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    cases.push(Case { values: self.exprs()?, body: self.stmts()? });
                }
                StmtKind::Select { selector, cases, default: self.stmts()? }
            },

            tag::STMT_PRINT => StmtKind::Print { fmt: self.opt_expr()?, values: self.exprs()? },
            tag::STMT_OPEN => StmtKind::Open { unit: self.expr()?, file: self.opt_expr()?, status: self.opt_expr()? },
            tag::STMT_CLOSE => StmtKind::Close { unit: self.expr()?, status: self.opt_expr()? },
            tag::STMT_READ => StmtKind::Read { unit: self.opt_expr()?, values: self.exprs()? },
            tag::STMT_WRITE => StmtKind::Write { unit: self.opt_expr()?, values: self.exprs()? },
            tag::STMT_INQUIRE => StmtKind::Inquire { unit: self.opt_expr()?, file: self.opt_expr()? },
            tag::STMT_REWIND => StmtKind::Rewind { unit: self.expr()? },
            tag::STMT_FLUSH => StmtKind::Flush { unit: self.expr()? },

            tag::STMT_ALLOCATE => {
                let count: u32 = self.u32("allocation count")?;
                let mut args: Vec<AllocArg> = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    args.push(AllocArg { target: self.sref()?, dims: self.dims()? });
                }
                StmtKind::Allocate { args }
            },
            tag::STMT_EXPLICIT_DEALLOCATE => StmtKind::ExplicitDeallocate { vars: self.srefs()? },
            tag::STMT_IMPLICIT_DEALLOCATE => StmtKind::ImplicitDeallocate { vars: self.srefs()? },
            tag::STMT_NULLIFY => StmtKind::Nullify { vars: self.srefs()? },

            tag::STMT_ASSERT => StmtKind::Assert { test: self.expr()?, msg: self.opt_expr()? },
            tag::STMT_GO_TO => StmtKind::GoTo { id: self.u32("goto label")? },
            tag::STMT_GO_TO_TARGET => StmtKind::GoToTarget { id: self.u32("goto target label")? },
            tag::STMT_RETURN => StmtKind::Return,
            tag::STMT_STOP => StmtKind::Stop { code: self.opt_expr()? },
            tag::STMT_ERROR_STOP => StmtKind::ErrorStop { code: self.opt_expr()? },

            tag => return Err(SerialError::BadTag { what: "statement kind", tag }),
        };

        Ok(Stmt { kind, range: self.range()? })
    }

    /// Decodes one expression.
    fn expr(&mut self) -> Result<Expr, SerialError> {
        let kind: ExprKind = match self.u8("expression kind tag")? {
            tag::EXPR_BOOL_OP => ExprKind::BoolOp {
                left  : Box::new(self.expr()?),
                op    : self.tagged()?,
                right : Box::new(self.expr()?),
            },
            tag::EXPR_BIN_OP => ExprKind::BinOp {
                left       : Box::new(self.expr()?),
                op         : self.tagged()?,
                right      : Box::new(self.expr()?),
                overloaded : self.opt_expr()?.map(Box::new),
            },
            tag::EXPR_STR_OP => ExprKind::StrOp {
                left  : Box::new(self.expr()?),
                op    : self.tagged()?,
                right : Box::new(self.expr()?),
            },
            tag::EXPR_UNARY_OP => ExprKind::UnaryOp {
                op         : self.tagged()?,
                operand    : Box::new(self.expr()?),
                overloaded : self.opt_expr()?.map(Box::new),
            },
            tag::EXPR_COMPARE => ExprKind::Compare {
                left       : Box::new(self.expr()?),
                op         : self.tagged()?,
                right      : Box::new(self.expr()?),
                overloaded : self.opt_expr()?.map(Box::new),
            },

            tag::EXPR_FUNCTION_CALL => ExprKind::FunctionCall {
                name          : self.sref()?,
                original_name : if self.presence("original name presence flag")? { Some(self.sref()?) } else { None },
                args          : self.exprs()?,
            },
            tag::EXPR_DERIVED_TYPE_CONSTRUCTOR => ExprKind::DerivedTypeConstructor { name: self.sref()?, args: self.exprs()? },

            tag::EXPR_CONSTANT_ARRAY => ExprKind::ConstantArray { elements: self.exprs()? },
            tag::EXPR_CONSTANT_INTEGER => ExprKind::ConstantInteger { value: self.i64("integer constant")? },
            tag::EXPR_CONSTANT_REAL => ExprKind::ConstantReal { value: self.f64("real constant")? },
            tag::EXPR_CONSTANT_COMPLEX => ExprKind::ConstantComplex {
                real : self.f64("complex constant real part")?,
                imag : self.f64("complex constant imaginary part")?,
            },
            tag::EXPR_CONSTANT_LOGICAL => ExprKind::ConstantLogical { value: self.boolean("logical constant")? },
            tag::EXPR_CONSTANT_STRING => ExprKind::ConstantString { value: self.string("string constant")? },
            tag::EXPR_BOZ_CONSTANT => ExprKind::BozConstant { value: self.u64("boz constant")?, repr: self.tagged()? },

            tag::EXPR_VAR => ExprKind::Var { name: self.sref()? },
            tag::EXPR_ARRAY_REF => {
                let array: SymbolId = self.sref()?;
                let count: u32 = self.u32("subscript count")?;
                let mut indices: Vec<ArrayIndex> = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    indices.push(ArrayIndex {
                        left  : self.opt_expr()?.map(Box::new),
                        right : self.opt_expr()?.map(Box::new),
                        step  : self.opt_expr()?.map(Box::new),
                    });
                }
                ExprKind::ArrayRef { array, indices }
            },
            tag::EXPR_DERIVED_REF => ExprKind::DerivedRef { target: Box::new(self.expr()?), member: self.sref()? },

            tag::EXPR_IMPLICIT_CAST => ExprKind::ImplicitCast { arg: Box::new(self.expr()?), cast_kind: self.tagged()? },
            tag::EXPR_EXPLICIT_CAST => ExprKind::ExplicitCast { arg: Box::new(self.expr()?), cast_kind: self.tagged()? },

            tag => return Err(SerialError::BadTag { what: "expression kind", tag }),
        };

        Ok(Expr {
            kind,
            data_type : self.ttype()?,
            value     : self.opt_expr()?.map(Box::new),
            range     : self.range()?,
        })
    }

    /// Decodes one type.
    fn ttype(&mut self) -> Result<Ttype, SerialError> {
        Ok(match self.u8("type kind tag")? {
            tag::TYPE_INTEGER => Ttype::Integer { kind: self.u8("integer kind")?, dims: self.dims()? },
            tag::TYPE_REAL => Ttype::Real { kind: self.u8("real kind")?, dims: self.dims()? },
            tag::TYPE_COMPLEX => Ttype::Complex { kind: self.u8("complex kind")?, dims: self.dims()? },
            tag::TYPE_CHARACTER => Ttype::Character {
                kind     : self.u8("character kind")?,
                len      : self.i64("character length")?,
                len_expr : self.opt_expr()?.map(Box::new),
                dims     : self.dims()?,
            },
            tag::TYPE_LOGICAL => Ttype::Logical { kind: self.u8("logical kind")?, dims: self.dims()? },

            tag::TYPE_LIST => Ttype::List(Box::new(self.ttype()?)),
            tag::TYPE_SET => Ttype::Set(Box::new(self.ttype()?)),
            tag::TYPE_TUPLE => {
                let count: u32 = self.u32("tuple element count")?;
                let mut elems: Vec<Ttype> = Vec::with_capacity(count.min(1024) as usize);
                for _ in 0..count {
                    elems.push(self.ttype()?);
                }
                Ttype::Tuple(elems)
            },
            tag::TYPE_DICT => Ttype::Dict { key: Box::new(self.ttype()?), value: Box::new(self.ttype()?) },

            tag::TYPE_DERIVED => Ttype::Derived { symbol: self.sref()?, dims: self.dims()? },
            tag::TYPE_CLASS => Ttype::Class { symbol: self.sref()?, dims: self.dims()? },

            tag::TYPE_POINTER => Ttype::Pointer(Box::new(self.ttype()?)),

            tag => return Err(SerialError::BadTag { what: "type kind", tag }),
        })
    }

    /// Decodes a length-prefixed run of dimensions.
    fn dims(&mut self) -> Result<Vec<Dimension>, SerialError> {
        let count: u32 = self.u32("dimension count")?;
        let mut dims: Vec<Dimension> = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            dims.push(Dimension {
                start : self.opt_expr()?.map(Box::new),
                end   : self.opt_expr()?.map(Box::new),
            });
        }
        Ok(dims)
    }
}
