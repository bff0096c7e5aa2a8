//  ENCODE.rs
//    by Lut99
//
//  Created:
//    08 Apr 2024, 11:02:51
//  Last edited:
//    22 Jul 2024, 14:19:06
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the encoder half of the module-interface codec.
//!
//!   Encoding is total over well-formed units and deterministic: the
//!   walk follows declaration order (unit items, then per symbol table
//!   the insertion order, then per node the declared field order), and
//!   symbol ordinals are handed out by in-stream first encounter. The
//!   same unit therefore always yields the same bytes.
//

use std::collections::HashMap;

use log::debug;

use crate::arena::{ScopeId, SymbolId};
use crate::asr::expressions::{ArrayIndex, Expr, ExprKind};
use crate::asr::spec::SourceRange;
use crate::asr::statements::{AllocArg, Case, Stmt, StmtKind};
use crate::asr::symbols::{Symbol, SymbolKind};
use crate::asr::toplevel::TranslationUnit;
use crate::asr::types::{Dimension, Ttype};
use super::{tag, Tagged, MAGIC, SCHEMA_VERSION};


/***** LIBRARY *****/
/// Encodes the given unit to its canonical byte stream: magic, schema version, then the unit.
///
/// Encoding cannot fail on a well-formed unit; feed anything else to the validation traversal
/// first.
pub fn encode(unit: &TranslationUnit) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    out.extend_from_slice(&encode_payload(unit));
    out
}

/// Encodes only the unit payload, without any header. The module-file writer splices its own
/// header in front of this.
pub(crate) fn encode_payload(unit: &TranslationUnit) -> Vec<u8> {
    debug!(target: "encode", "Encoding unit with {} symbol(s)", unit.arena.symbol_count());
    let mut encoder: Encoder = Encoder { unit, out: Vec::new(), ordinals: HashMap::new() };
    encoder.unit();
    encoder.out
}





/***** ENCODER *****/
/// The state of one encoding run.
struct Encoder<'u> {
    /// The unit being encoded.
    unit     : &'u TranslationUnit,
    /// The stream built so far.
    out      : Vec<u8>,
    /// The ordinals handed out so far, by in-stream first encounter.
    ordinals : HashMap<SymbolId, u32>,
}

impl<'u> Encoder<'u> {
    // Primitives
    #[inline]
    fn u8(&mut self, value: u8) { self.out.push(value); }
    #[inline]
    fn u32(&mut self, value: u32) { self.out.extend_from_slice(&value.to_le_bytes()); }
    #[inline]
    fn u64(&mut self, value: u64) { self.out.extend_from_slice(&value.to_le_bytes()); }
    #[inline]
    fn i64(&mut self, value: i64) { self.out.extend_from_slice(&value.to_le_bytes()); }
    #[inline]
    fn f64(&mut self, value: f64) { self.out.extend_from_slice(&value.to_le_bytes()); }
    #[inline]
    fn boolean(&mut self, value: bool) { self.out.push(value as u8); }

    /// Writes a length-prefixed UTF-8 string.
    fn string(&mut self, value: &str) {
        self.u32(value.len() as u32);
        self.out.extend_from_slice(value.as_bytes());
    }

    /// Writes the one-byte presence flag of an optional.
    #[inline]
    fn presence(&mut self, present: bool) { self.out.push(present as u8); }

    /// Writes a leaf enum as its wire tag.
    #[inline]
    fn tagged(&mut self, value: &impl Tagged) { self.out.push(value.tag()); }

    /// Writes a symbol occurrence as its ordinal, handing out the next free one on first
    /// encounter.
    fn sref(&mut self, id: SymbolId) {
        let next: u32 = self.ordinals.len() as u32;
        let ord: u32 = *self.ordinals.entry(id).or_insert(next);
        self.u32(ord);
    }

    /// Writes an optional source range.
    fn range(&mut self, range: &Option<SourceRange>) {
        match range {
            Some(range) => {
                self.presence(true);
                self.u32(range.first);
                self.u32(range.last);
            },
            None => self.presence(false),
        }
    }



    // Nodes
    /// Encodes the root unit: global scope table, items, range.
    fn unit(&mut self) {
        let (global_scope, range): (ScopeId, Option<SourceRange>) = (self.unit.global_scope, self.unit.range);
        self.scope(global_scope);
        let items: Vec<SymbolId> = self.unit.items.clone();
        self.u32(items.len() as u32);
        for item in items {
            self.sref(item);
        }
        self.range(&range);
    }

    /// Encodes a symbol table: entry count, then per entry the full symbol definition, in
    /// insertion order. Parent links are structural and not written.
    fn scope(&mut self, scope: ScopeId) {
        let entries: Vec<SymbolId> = self.unit.arena.scope(scope).iter().map(|(_, id)| id).collect();
        self.u32(entries.len() as u32);
        for entry in entries {
            self.symbol_def(entry);
        }
    }

    /// Encodes a symbol definition: ordinal, name, range, kind tag, kind fields.
    fn symbol_def(&mut self, id: SymbolId) {
        self.sref(id);
        let symbol: &'u Symbol = self.unit.arena.symbol(id);
        self.string(&symbol.name);
        self.range(&symbol.range);

        use SymbolKind::*;
        match &symbol.kind {
            Program { symtab, body } => {
                self.u8(tag::SYMBOL_PROGRAM);
                self.scope(*symtab);
                self.stmts(body);
            },
            Module { symtab, abi, deftype } => {
                self.u8(tag::SYMBOL_MODULE);
                self.scope(*symtab);
                self.tagged(abi);
                self.tagged(deftype);
            },
            Subroutine { symtab, args, body, abi, access, deftype } => {
                self.u8(tag::SYMBOL_SUBROUTINE);
                self.scope(*symtab);
                self.srefs(args);
                self.stmts(body);
                self.tagged(abi);
                self.tagged(access);
                self.tagged(deftype);
            },
            Function { symtab, args, body, return_var, abi, access, deftype } => {
                self.u8(tag::SYMBOL_FUNCTION);
                self.scope(*symtab);
                self.srefs(args);
                self.stmts(body);
                self.sref(*return_var);
                self.tagged(abi);
                self.tagged(access);
                self.tagged(deftype);
            },

            GenericProcedure { procs, access } => {
                self.u8(tag::SYMBOL_GENERIC_PROCEDURE);
                self.srefs(procs);
                self.tagged(access);
            },
            CustomOperator { procs, access } => {
                self.u8(tag::SYMBOL_CUSTOM_OPERATOR);
                self.srefs(procs);
                self.tagged(access);
            },
            ExternalSymbol { module_name, scope_names, external, original_name, access } => {
                self.u8(tag::SYMBOL_EXTERNAL_SYMBOL);
                self.string(module_name);
                self.u32(scope_names.len() as u32);
                for name in scope_names {
                    self.string(name);
                }
                self.sref(*external);
                self.string(original_name);
                self.tagged(access);
            },

            DerivedType { symtab, abi, access, parent } => {
                self.u8(tag::SYMBOL_DERIVED_TYPE);
                self.scope(*symtab);
                self.tagged(abi);
                self.tagged(access);
                match parent {
                    Some(parent) => {
                        self.presence(true);
                        self.sref(*parent);
                    },
                    None => self.presence(false),
                }
            },
            Variable { data_type, intent, storage, abi, access, presence, initializer } => {
                self.u8(tag::SYMBOL_VARIABLE);
                self.ttype(data_type);
                self.tagged(intent);
                self.tagged(storage);
                self.tagged(abi);
                self.tagged(access);
                self.tagged(presence);
                self.opt_expr(initializer.as_deref());
            },
            ClassType { symtab, abi, access } => {
                self.u8(tag::SYMBOL_CLASS_TYPE);
                self.scope(*symtab);
                self.tagged(abi);
                self.tagged(access);
            },
            ClassProcedure { proc, access } => {
                self.u8(tag::SYMBOL_CLASS_PROCEDURE);
                self.sref(*proc);
                self.tagged(access);
            },
        }
    }

    /// Encodes a length-prefixed run of symbol references.
    fn srefs(&mut self, ids: &[SymbolId]) {
        self.u32(ids.len() as u32);
        for id in ids {
            self.sref(*id);
        }
    }

    /// Encodes a length-prefixed run of statements.
    fn stmts(&mut self, stmts: &[Stmt]) {
        self.u32(stmts.len() as u32);
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    /// Encodes a length-prefixed run of expressions.
    fn exprs(&mut self, exprs: &[Expr]) {
        self.u32(exprs.len() as u32);
        for expr in exprs {
            self.expr(expr);
        }
    }

    /// Encodes an optional expression: presence flag plus payload.
    fn opt_expr(&mut self, expr: Option<&Expr>) {
        match expr {
            Some(expr) => {
                self.presence(true);
                self.expr(expr);
            },
            None => self.presence(false),
        }
    }

    /// Encodes one statement: kind tag, kind fields, range.
    fn stmt(&mut self, stmt: &Stmt) {
        use StmtKind::*;
        match &stmt.kind {
            Assignment { target, value } => {
                self.u8(tag::STMT_ASSIGNMENT);
                self.expr(target);
                self.expr(value);
            },
            SubroutineCall { name, original_name, args } => {
                self.u8(tag::STMT_SUBROUTINE_CALL);
                self.sref(*name);
                match original_name {
                    Some(original) => {
                        self.presence(true);
                        self.sref(*original);
                    },
                    None => self.presence(false),
                }
                self.exprs(args);
            },

            If { test, body, orelse } => {
                self.u8(tag::STMT_IF);
                self.expr(test);
                self.stmts(body);
                self.stmts(orelse);
            },
            WhileLoop { test, body } => {
                self.u8(tag::STMT_WHILE_LOOP);
                self.expr(test);
                self.stmts(body);
            },
            DoLoop { head, body } => {
                self.u8(tag::STMT_DO_LOOP);
                self.sref(head.var);
                self.expr(&head.start);
                self.expr(&head.end);
                self.opt_expr(head.increment.as_ref());
                self.stmts(body);
            },
            Exit => self.u8(tag::STMT_EXIT),
            Cycle => self.u8(tag::STMT_CYCLE),
            Select { selector, cases, default } => {
                self.u8(tag::STMT_SELECT);
                self.expr(selector);
                self.u32(cases.len() as u32);
                for Case { values, body } in cases {
                    self.exprs(values);
                    self.stmts(body);
                }
                self.stmts(default);
            },

            Print { fmt, values } => {
                self.u8(tag::STMT_PRINT);
                self.opt_expr(fmt.as_ref());
                self.exprs(values);
            },
            Open { unit, file, status } => {
                self.u8(tag::STMT_OPEN);
                self.expr(unit);
                self.opt_expr(file.as_ref());
                self.opt_expr(status.as_ref());
            },
            Close { unit, status } => {
                self.u8(tag::STMT_CLOSE);
                self.expr(unit);
                self.opt_expr(status.as_ref());
            },
            Read { unit, values } => {
                self.u8(tag::STMT_READ);
                self.opt_expr(unit.as_ref());
                self.exprs(values);
            },
            Write { unit, values } => {
                self.u8(tag::STMT_WRITE);
                self.opt_expr(unit.as_ref());
                self.exprs(values);
            },
            Inquire { unit, file } => {
                self.u8(tag::STMT_INQUIRE);
                self.opt_expr(unit.as_ref());
                self.opt_expr(file.as_ref());
            },
            Rewind { unit } => {
                self.u8(tag::STMT_REWIND);
                self.expr(unit);
            },
            Flush { unit } => {
                self.u8(tag::STMT_FLUSH);
                self.expr(unit);
            },

            Allocate { args } => {
                self.u8(tag::STMT_ALLOCATE);
                self.u32(args.len() as u32);
                for AllocArg { target, dims } in args {
                    self.sref(*target);
                    self.dims(dims);
                }
            },
            ExplicitDeallocate { vars } => {
                self.u8(tag::STMT_EXPLICIT_DEALLOCATE);
                self.srefs(vars);
            },
            ImplicitDeallocate { vars } => {
                self.u8(tag::STMT_IMPLICIT_DEALLOCATE);
                self.srefs(vars);
            },
            Nullify { vars } => {
                self.u8(tag::STMT_NULLIFY);
                self.srefs(vars);
            },

            Assert { test, msg } => {
                self.u8(tag::STMT_ASSERT);
                self.expr(test);
                self.opt_expr(msg.as_ref());
            },
            GoTo { id } => {
                self.u8(tag::STMT_GO_TO);
                self.u32(*id);
            },
            GoToTarget { id } => {
                self.u8(tag::STMT_GO_TO_TARGET);
                self.u32(*id);
            },
            Return => self.u8(tag::STMT_RETURN),
            Stop { code } => {
                self.u8(tag::STMT_STOP);
                self.opt_expr(code.as_ref());
            },
            ErrorStop { code } => {
                self.u8(tag::STMT_ERROR_STOP);
                self.opt_expr(code.as_ref());
            },
        }

        self.range(&stmt.range);
    }

    /// Encodes one expression: kind tag, kind fields, type, folded value, range.
    fn expr(&mut self, expr: &Expr) {
        use ExprKind::*;
        match &expr.kind {
            BoolOp { left, op, right } => {
                self.u8(tag::EXPR_BOOL_OP);
                self.expr(left);
                self.tagged(op);
                self.expr(right);
            },
            BinOp { left, op, right, overloaded } => {
                self.u8(tag::EXPR_BIN_OP);
                self.expr(left);
                self.tagged(op);
                self.expr(right);
                self.opt_expr(overloaded.as_deref());
            },
            StrOp { left, op, right } => {
                self.u8(tag::EXPR_STR_OP);
                self.expr(left);
                self.tagged(op);
                self.expr(right);
            },
            UnaryOp { op, operand, overloaded } => {
                self.u8(tag::EXPR_UNARY_OP);
                self.tagged(op);
                self.expr(operand);
                self.opt_expr(overloaded.as_deref());
            },
            Compare { left, op, right, overloaded } => {
                self.u8(tag::EXPR_COMPARE);
                self.expr(left);
                self.tagged(op);
                self.expr(right);
                self.opt_expr(overloaded.as_deref());
            },

            FunctionCall { name, original_name, args } => {
                self.u8(tag::EXPR_FUNCTION_CALL);
                self.sref(*name);
                match original_name {
                    Some(original) => {
                        self.presence(true);
                        self.sref(*original);
                    },
                    None => self.presence(false),
                }
                self.exprs(args);
            },
            DerivedTypeConstructor { name, args } => {
                self.u8(tag::EXPR_DERIVED_TYPE_CONSTRUCTOR);
                self.sref(*name);
                self.exprs(args);
            },

            ConstantArray { elements } => {
                self.u8(tag::EXPR_CONSTANT_ARRAY);
                self.exprs(elements);
            },
            ConstantInteger { value } => {
                self.u8(tag::EXPR_CONSTANT_INTEGER);
                self.i64(*value);
            },
            ConstantReal { value } => {
                self.u8(tag::EXPR_CONSTANT_REAL);
                self.f64(*value);
            },
            ConstantComplex { real, imag } => {
                self.u8(tag::EXPR_CONSTANT_COMPLEX);
                self.f64(*real);
                self.f64(*imag);
            },
            ConstantLogical { value } => {
                self.u8(tag::EXPR_CONSTANT_LOGICAL);
                self.boolean(*value);
            },
            ConstantString { value } => {
                self.u8(tag::EXPR_CONSTANT_STRING);
                self.string(value);
            },
            BozConstant { value, repr } => {
                self.u8(tag::EXPR_BOZ_CONSTANT);
                self.u64(*value);
                self.tagged(repr);
            },

            Var { name } => {
                self.u8(tag::EXPR_VAR);
                self.sref(*name);
            },
            ArrayRef { array, indices } => {
                self.u8(tag::EXPR_ARRAY_REF);
                self.sref(*array);
                self.u32(indices.len() as u32);
                for ArrayIndex { left, right, step } in indices {
                    self.opt_expr(left.as_deref());
                    self.opt_expr(right.as_deref());
                    self.opt_expr(step.as_deref());
                }
            },
            DerivedRef { target, member } => {
                self.u8(tag::EXPR_DERIVED_REF);
                self.expr(target);
                self.sref(*member);
            },

            ImplicitCast { arg, cast_kind } => {
                self.u8(tag::EXPR_IMPLICIT_CAST);
                self.expr(arg);
                self.tagged(cast_kind);
            },
            ExplicitCast { arg, cast_kind } => {
                self.u8(tag::EXPR_EXPLICIT_CAST);
                self.expr(arg);
                self.tagged(cast_kind);
            },
        }

        self.ttype(&expr.data_type);
        self.opt_expr(expr.value.as_deref());
        self.range(&expr.range);
    }

    /// Encodes one type: kind tag plus fields.
    fn ttype(&mut self, ttype: &Ttype) {
        use Ttype::*;
        match ttype {
            Integer { kind, dims } => {
                self.u8(tag::TYPE_INTEGER);
                self.u8(*kind);
                self.dims(dims);
            },
            Real { kind, dims } => {
                self.u8(tag::TYPE_REAL);
                self.u8(*kind);
                self.dims(dims);
            },
            Complex { kind, dims } => {
                self.u8(tag::TYPE_COMPLEX);
                self.u8(*kind);
                self.dims(dims);
            },
            Character { kind, len, len_expr, dims } => {
                self.u8(tag::TYPE_CHARACTER);
                self.u8(*kind);
                self.i64(*len);
                self.opt_expr(len_expr.as_deref());
                self.dims(dims);
            },
            Logical { kind, dims } => {
                self.u8(tag::TYPE_LOGICAL);
                self.u8(*kind);
                self.dims(dims);
            },

            List(inner) => {
                self.u8(tag::TYPE_LIST);
                self.ttype(inner);
            },
            Set(inner) => {
                self.u8(tag::TYPE_SET);
                self.ttype(inner);
            },
            Tuple(elems) => {
                self.u8(tag::TYPE_TUPLE);
                self.u32(elems.len() as u32);
                for elem in elems {
                    self.ttype(elem);
                }
            },
            Dict { key, value } => {
                self.u8(tag::TYPE_DICT);
                self.ttype(key);
                self.ttype(value);
            },

            Derived { symbol, dims } => {
                self.u8(tag::TYPE_DERIVED);
                self.sref(*symbol);
                self.dims(dims);
            },
            Class { symbol, dims } => {
                self.u8(tag::TYPE_CLASS);
                self.sref(*symbol);
                self.dims(dims);
            },

            Pointer(inner) => {
                self.u8(tag::TYPE_POINTER);
                self.ttype(inner);
            },
        }
    }

    /// Encodes a length-prefixed run of dimensions, each two optional bound expressions.
    fn dims(&mut self, dims: &[Dimension]) {
        self.u32(dims.len() as u32);
        for dim in dims {
            self.opt_expr(dim.start.as_deref());
            self.opt_expr(dim.end.as_deref());
        }
    }
}
