//  BUILDER.rs
//    by Lut99
//
//  Created:
//    18 Mar 2024, 09:34:16
//  Last edited:
//    12 Jul 2024, 16:40:58
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the smart constructors through which the elaboration pass
//!   builds ASR.
//!
//!   Everything that can be checked cheaply at construction time is
//!   checked here and rejected at the offending call; anything that
//!   needs whole-tree context (reachability of references, for one)
//!   is left to the validation traversal, which collects all breaches
//!   instead of stopping at the first.
//

use enum_debug::EnumDebug as _;
use log::trace;

use crate::arena::{ScopeId, SymbolId};
use crate::asr::expressions::{BinOperator, BoolOperator, CmpOperator, Expr, ExprKind, StrOperator, UnaryOperator};
use crate::asr::spec::{Abi, Access, Boz, CastKind, Deftype, Intent, Presence, StorageType};
use crate::asr::statements::{Stmt, StmtKind};
use crate::asr::symbols::{Symbol, SymbolKind};
use crate::asr::toplevel::TranslationUnit;
use crate::asr::types::Ttype;
use crate::errors::BuildError;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    /// Builds the folded `2 + 3` of the classic constant-folding scenario and checks the
    /// constructor accepts it.
    #[test]
    fn test_binop_folded() {
        let two: Expr = Expr::constant_integer(2, 4);
        let three: Expr = Expr::constant_integer(3, 4);
        let five: Expr = Expr::constant_integer(5, 4);
        let sum: Expr = Expr::binop(two, BinOperator::Add, three, Ttype::Integer { kind: 4, dims: vec![] }, Some(five)).unwrap();

        assert!(matches!(sum.kind, ExprKind::BinOp { op: BinOperator::Add, .. }));
        assert!(sum.value.as_deref().map(|v| v.is_constant()).unwrap_or(false));
    }

    /// Checks that a folded value of the wrong type is rejected at the call.
    #[test]
    fn test_binop_value_type_mismatch() {
        let two: Expr = Expr::constant_integer(2, 4);
        let three: Expr = Expr::constant_integer(3, 4);
        let wrong: Expr = Expr::constant_real(5.0, 8);
        assert!(matches!(
            Expr::binop(two, BinOperator::Add, three, Ttype::Integer { kind: 4, dims: vec![] }, Some(wrong)),
            Err(BuildError::ValueTypeMismatch { .. })
        ));
    }

    /// Checks that a comparison must be declared logical.
    #[test]
    fn test_compare_must_be_logical() {
        let two: Expr = Expr::constant_integer(2, 4);
        let three: Expr = Expr::constant_integer(3, 4);
        assert!(matches!(
            Expr::compare(two, CmpOperator::Lt, three, Ttype::Integer { kind: 4, dims: vec![] }, None),
            Err(BuildError::NotLogical { .. })
        ));
    }

    /// Checks the goto-pair check on procedure finalization, matching and non-matching.
    #[test]
    fn test_finalize_goto_pairs() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (program, _): (SymbolId, ScopeId) = builder.add_program("main").unwrap();

        // [GoTo(7), GoToTarget(7), Return()] validates...
        builder.set_body(program, vec![
            Stmt::new(StmtKind::GoTo { id: 7 }),
            Stmt::new(StmtKind::GoToTarget { id: 7 }),
            Stmt::new(StmtKind::Return),
        ]);
        assert!(builder.finalize_procedure(program).is_ok());

        // ...and removing the target fails on exactly the goto
        builder.set_body(program, vec![
            Stmt::new(StmtKind::GoTo { id: 7 }),
            Stmt::new(StmtKind::Return),
        ]);
        assert!(matches!(builder.finalize_procedure(program), Err(BuildError::UnmatchedGoTo { id: 7, .. })));
    }

    /// Checks that a function without a ReturnVar-intent variable does not finalize.
    #[test]
    fn test_finalize_return_var() {
        let mut unit: TranslationUnit = TranslationUnit::new();
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        let (module, mscope): (SymbolId, ScopeId) = builder.add_module("m", Abi::Source, Deftype::Implementation).unwrap();
        let (func, _, ret): (SymbolId, ScopeId, SymbolId) = builder
            .add_function(mscope, "f", Ttype::Integer { kind: 4, dims: vec![] }, Abi::Source, Access::Public, Deftype::Implementation)
            .unwrap();
        builder.set_body(func, vec![Stmt::new(StmtKind::Return)]);
        assert!(builder.finalize_procedure(func).is_ok());
        assert!(builder.finalize_procedure(module).is_ok());

        // Demote the return variable's intent behind the builder's back; finalization notices
        if let SymbolKind::Variable { intent, .. } = &mut unit.arena.symbol_mut(ret).kind {
            *intent = Intent::Local;
        }
        let mut builder: UnitBuilder = UnitBuilder::new(&mut unit);
        assert!(matches!(builder.finalize_procedure(func), Err(BuildError::ReturnVarMissing { .. })));
    }
}





/***** HELPER FUNCTIONS *****/
/// Checks that an optional folded value is a constant of the expected type, boxing it on success.
///
/// # Arguments
/// - `data_type`: The declared type of the expression carrying the value.
/// - `value`: The folded value to check, if any.
///
/// # Errors
/// This function errors if the value is a non-constant node or if its type differs from
/// `data_type`.
fn check_value(data_type: &Ttype, value: Option<Expr>) -> Result<Option<Box<Expr>>, BuildError> {
    let value: Expr = match value {
        Some(value) => value,
        None        => return Ok(None),
    };
    if !value.is_constant() {
        return Err(BuildError::ValueNotConstant { variant: value.kind.variant().to_string() });
    }
    if value.data_type != *data_type {
        return Err(BuildError::ValueTypeMismatch { expected: data_type.clone(), got: value.data_type });
    }
    Ok(Some(Box::new(value)))
}

/// Collects the goto and goto-target labels of a body, recursing into nested bodies.
pub(crate) fn collect_labels(body: &[Stmt], gotos: &mut Vec<u32>, targets: &mut Vec<u32>) {
    for stmt in body {
        use StmtKind::*;
        match &stmt.kind {
            GoTo { id }       => gotos.push(*id),
            GoToTarget { id } => targets.push(*id),

            If { body, orelse, .. } => { collect_labels(body, gotos, targets); collect_labels(orelse, gotos, targets); },
            WhileLoop { body, .. } | DoLoop { body, .. } => collect_labels(body, gotos, targets),
            Select { cases, default, .. } => {
                for case in cases { collect_labels(&case.body, gotos, targets); }
                collect_labels(default, gotos, targets);
            },

            _ => {},
        }
    }
}





/***** EXPRESSION CONSTRUCTORS *****/
impl Expr {
    /// Constructor for an integer constant of the given kind.
    #[inline]
    pub fn constant_integer(value: i64, kind: u8) -> Self {
        Self {
            kind      : ExprKind::ConstantInteger { value },
            data_type : Ttype::Integer { kind, dims: vec![] },
            value     : None,
            range     : None,
        }
    }

    /// Constructor for a real constant of the given kind.
    #[inline]
    pub fn constant_real(value: f64, kind: u8) -> Self {
        Self {
            kind      : ExprKind::ConstantReal { value },
            data_type : Ttype::Real { kind, dims: vec![] },
            value     : None,
            range     : None,
        }
    }

    /// Constructor for a complex constant of the given kind.
    #[inline]
    pub fn constant_complex(real: f64, imag: f64, kind: u8) -> Self {
        Self {
            kind      : ExprKind::ConstantComplex { real, imag },
            data_type : Ttype::Complex { kind, dims: vec![] },
            value     : None,
            range     : None,
        }
    }

    /// Constructor for a logical constant of the given kind.
    #[inline]
    pub fn constant_logical(value: bool, kind: u8) -> Self {
        Self {
            kind      : ExprKind::ConstantLogical { value },
            data_type : Ttype::Logical { kind, dims: vec![] },
            value     : None,
            range     : None,
        }
    }

    /// Constructor for a character constant; the type's length is the literal's length.
    #[inline]
    pub fn constant_string(value: impl Into<String>, kind: u8) -> Self {
        let value: String = value.into();
        Self {
            data_type : Ttype::Character { kind, len: value.len() as i64, len_expr: None, dims: vec![] },
            kind      : ExprKind::ConstantString { value },
            value     : None,
            range     : None,
        }
    }

    /// Constructor for a BOZ bit-pattern constant. Carries a default integer type until a cast
    /// gives it a real one.
    #[inline]
    pub fn boz_constant(value: u64, repr: Boz) -> Self {
        Self {
            kind      : ExprKind::BozConstant { value, repr },
            data_type : Ttype::Integer { kind: 4, dims: vec![] },
            value     : None,
            range     : None,
        }
    }

    /// Constructor for a variable read.
    ///
    /// # Arguments
    /// - `name`: The `Variable` (or `ExternalSymbol`) read.
    /// - `data_type`: The type of the stored value.
    #[inline]
    pub fn var(name: SymbolId, data_type: Ttype) -> Self {
        Self { kind: ExprKind::Var { name }, data_type, value: None, range: None }
    }

    /// Constructor for an arithmetic operation.
    ///
    /// # Arguments
    /// - `left`: The lefthand-side operand.
    /// - `op`: The operation to perform.
    /// - `right`: The righthand-side operand.
    /// - `data_type`: The type the operation evaluates to.
    /// - `value`: The folded constant, if the elaboration pass knows one.
    ///
    /// # Errors
    /// This function errors if the declared type or either operand is non-numeric, or if the
    /// folded value is inconsistent (non-constant, or differently typed).
    pub fn binop(left: Expr, op: BinOperator, right: Expr, data_type: Ttype, value: Option<Expr>) -> Result<Self, BuildError> {
        if !data_type.is_numeric() {
            return Err(BuildError::NonNumericOperand { op: op.to_string(), got: data_type });
        }
        for operand in [&left, &right] {
            if !operand.data_type.is_numeric() {
                return Err(BuildError::NonNumericOperand { op: op.to_string(), got: operand.data_type.clone() });
            }
        }
        let value: Option<Box<Expr>> = check_value(&data_type, value)?;
        Ok(Self {
            kind : ExprKind::BinOp { left: Box::new(left), op, right: Box::new(right), overloaded: None },
            data_type,
            value,
            range : None,
        })
    }

    /// Constructor for a logical operation.
    ///
    /// # Errors
    /// This function errors if the declared type or either operand is not logical, or if the
    /// folded value is inconsistent.
    pub fn boolop(left: Expr, op: BoolOperator, right: Expr, data_type: Ttype, value: Option<Expr>) -> Result<Self, BuildError> {
        if !data_type.is_logical() {
            return Err(BuildError::NotLogical { what: "logical operation", got: data_type });
        }
        for operand in [&left, &right] {
            if !operand.data_type.is_logical() {
                return Err(BuildError::NotLogical { what: "logical operand", got: operand.data_type.clone() });
            }
        }
        let value: Option<Box<Expr>> = check_value(&data_type, value)?;
        Ok(Self {
            kind : ExprKind::BoolOp { left: Box::new(left), op, right: Box::new(right) },
            data_type,
            value,
            range : None,
        })
    }

    /// Constructor for a string operation.
    ///
    /// # Errors
    /// This function errors if the declared type or the lefthand operand is not a character
    /// type, or if the folded value is inconsistent. The righthand side of a
    /// [`StrOperator::Repeat`] is its integer count and stays unchecked here.
    pub fn strop(left: Expr, op: StrOperator, right: Expr, data_type: Ttype, value: Option<Expr>) -> Result<Self, BuildError> {
        if !data_type.is_character() {
            return Err(BuildError::NonCharacterOperand { op: op.to_string(), got: data_type });
        }
        if !left.data_type.is_character() {
            return Err(BuildError::NonCharacterOperand { op: op.to_string(), got: left.data_type });
        }
        if op == StrOperator::Concat && !right.data_type.is_character() {
            return Err(BuildError::NonCharacterOperand { op: op.to_string(), got: right.data_type });
        }
        let value: Option<Box<Expr>> = check_value(&data_type, value)?;
        Ok(Self {
            kind : ExprKind::StrOp { left: Box::new(left), op, right: Box::new(right) },
            data_type,
            value,
            range : None,
        })
    }

    /// Constructor for a unary operation.
    ///
    /// # Errors
    /// This function errors if the folded value is inconsistent, or if a [`UnaryOperator::Not`]
    /// is declared non-logical.
    pub fn unaryop(op: UnaryOperator, operand: Expr, data_type: Ttype, value: Option<Expr>) -> Result<Self, BuildError> {
        if op == UnaryOperator::Not && !data_type.is_logical() {
            return Err(BuildError::NotLogical { what: "logical negation", got: data_type });
        }
        let value: Option<Box<Expr>> = check_value(&data_type, value)?;
        Ok(Self {
            kind : ExprKind::UnaryOp { op, operand: Box::new(operand), overloaded: None },
            data_type,
            value,
            range : None,
        })
    }

    /// Constructor for a comparison.
    ///
    /// # Errors
    /// This function errors if the declared type is not logical, or if the folded value is
    /// inconsistent.
    pub fn compare(left: Expr, op: CmpOperator, right: Expr, data_type: Ttype, value: Option<Expr>) -> Result<Self, BuildError> {
        if !data_type.is_logical() {
            return Err(BuildError::NotLogical { what: "comparison", got: data_type });
        }
        let value: Option<Box<Expr>> = check_value(&data_type, value)?;
        Ok(Self {
            kind : ExprKind::Compare { left: Box::new(left), op, right: Box::new(right), overloaded: None },
            data_type,
            value,
            range : None,
        })
    }

    /// Constructor for a function call.
    ///
    /// # Arguments
    /// - `name`: The resolved target.
    /// - `original_name`: The pre-resolution symbol, when that differs from `name`.
    /// - `args`: The actual arguments.
    /// - `data_type`: The function's return type.
    /// - `value`: The folded constant, for calls the elaboration pass evaluated.
    ///
    /// # Errors
    /// This function errors if the folded value is inconsistent.
    pub fn function_call(name: SymbolId, original_name: Option<SymbolId>, args: Vec<Expr>, data_type: Ttype, value: Option<Expr>) -> Result<Self, BuildError> {
        let value: Option<Box<Expr>> = check_value(&data_type, value)?;
        Ok(Self {
            kind : ExprKind::FunctionCall { name, original_name, args },
            data_type,
            value,
            range : None,
        })
    }

    /// Constructor for a cast the elaboration pass inserted.
    ///
    /// # Errors
    /// This function errors if the folded value is inconsistent.
    pub fn implicit_cast(arg: Expr, cast_kind: CastKind, data_type: Ttype, value: Option<Expr>) -> Result<Self, BuildError> {
        let value: Option<Box<Expr>> = check_value(&data_type, value)?;
        Ok(Self { kind: ExprKind::ImplicitCast { arg: Box::new(arg), cast_kind }, data_type, value, range: None })
    }

    /// Constructor for a cast the source spelled out.
    ///
    /// # Errors
    /// This function errors if the folded value is inconsistent.
    pub fn explicit_cast(arg: Expr, cast_kind: CastKind, data_type: Ttype, value: Option<Expr>) -> Result<Self, BuildError> {
        let value: Option<Box<Expr>> = check_value(&data_type, value)?;
        Ok(Self { kind: ExprKind::ExplicitCast { arg: Box::new(arg), cast_kind }, data_type, value, range: None })
    }

    /// Records the overload a binary, unary or comparison operator resolved to.
    ///
    /// Both the operator spelling and the resolved call are kept: pretty-printing restores the
    /// user-visible syntax, backends see only the resolved target.
    ///
    /// # Panics
    /// This function panics if the expression is not an overloadable operator node.
    pub fn set_overload(&mut self, call: Expr) {
        use ExprKind::*;
        match &mut self.kind {
            BinOp { overloaded, .. } | UnaryOp { overloaded, .. } | Compare { overloaded, .. } => {
                *overloaded = Some(Box::new(call));
            },
            kind => panic!("Cannot attach an overload to an ExprKind::{}", kind.variant()),
        }
    }
}





/***** LIBRARY *****/
/// Mediates building the symbols of a [`TranslationUnit`].
///
/// The builder enforces at insertion what can be enforced locally (fresh names, reachable
/// external paths) and at [`finalize_procedure()`](UnitBuilder::finalize_procedure()) what needs
/// a complete body (paired goto labels, exactly one return variable).
#[derive(Debug)]
pub struct UnitBuilder<'u> {
    /// The unit being built.
    unit : &'u mut TranslationUnit,
}

impl<'u> UnitBuilder<'u> {
    /// Constructor for a UnitBuilder wrapping the given unit.
    #[inline]
    pub fn new(unit: &'u mut TranslationUnit) -> Self { Self { unit } }

    /// Returns the global scope of the unit under construction.
    #[inline]
    pub fn global_scope(&self) -> ScopeId { self.unit.global_scope }

    /// Resolves a name from the given scope, walking parent scopes outwards.
    ///
    /// The checked twin of [`AsrArena::lookup()`](crate::arena::AsrArena::lookup()): sites that
    /// must resolve call this and forward the error instead of inventing a fallback.
    ///
    /// # Errors
    /// This function errors with [`BuildError::UnresolvedName`] if no scope on the parent chain
    /// knows the name.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Result<SymbolId, BuildError> {
        self.unit.arena.lookup(scope, name).ok_or_else(|| BuildError::UnresolvedName { name: name.into(), scope })
    }



    /// Adds a program to the unit's global scope.
    ///
    /// # Arguments
    /// - `name`: The name of the program.
    ///
    /// # Returns
    /// The handles of the new symbol and its local scope.
    ///
    /// # Errors
    /// This function errors if the name collides in the global scope.
    pub fn add_program(&mut self, name: impl Into<String>) -> Result<(SymbolId, ScopeId), BuildError> {
        let name: String = name.into();
        trace!(target: "builder", "Adding program '{name}'");
        let symtab: ScopeId = self.unit.arena.alloc_scope(Some(self.unit.global_scope));
        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::Program { symtab, body: vec![] }));
        self.unit.arena.insert(self.unit.global_scope, id)?;
        self.unit.items.push(id);
        Ok((id, symtab))
    }

    /// Adds a module to the unit's global scope.
    ///
    /// # Arguments
    /// - `name`: The name of the module.
    /// - `abi`: Where the module's implementations live.
    /// - `deftype`: Whether this is a full module or an interface projection.
    ///
    /// # Returns
    /// The handles of the new symbol and its scope.
    ///
    /// # Errors
    /// This function errors if the name collides in the global scope.
    pub fn add_module(&mut self, name: impl Into<String>, abi: Abi, deftype: Deftype) -> Result<(SymbolId, ScopeId), BuildError> {
        let name: String = name.into();
        trace!(target: "builder", "Adding module '{name}' (abi {abi}, {deftype})");
        let symtab: ScopeId = self.unit.arena.alloc_scope(Some(self.unit.global_scope));
        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::Module { symtab, abi, deftype }));
        self.unit.arena.insert(self.unit.global_scope, id)?;
        self.unit.items.push(id);
        Ok((id, symtab))
    }

    /// Adds a subroutine to the given scope, with an empty body and no arguments yet.
    ///
    /// # Returns
    /// The handles of the new symbol and its local scope.
    ///
    /// # Errors
    /// This function errors if the name collides in `scope`.
    pub fn add_subroutine(&mut self, scope: ScopeId, name: impl Into<String>, abi: Abi, access: Access, deftype: Deftype) -> Result<(SymbolId, ScopeId), BuildError> {
        let name: String = name.into();
        trace!(target: "builder", "Adding subroutine '{name}' to scope {scope}");
        let symtab: ScopeId = self.unit.arena.alloc_scope(Some(scope));
        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::Subroutine {
            symtab,
            args : vec![],
            body : vec![],
            abi,
            access,
            deftype,
        }));
        self.unit.arena.insert(scope, id)?;
        Ok((id, symtab))
    }

    /// Adds a function to the given scope, with an empty body and no arguments yet.
    ///
    /// The return variable is created along with the function, named after it, with intent
    /// [`Intent::ReturnVar`]; it is the only way a return variable comes into existence.
    ///
    /// # Arguments
    /// - `scope`: The scope to declare the function in.
    /// - `name`: The name of the function.
    /// - `return_type`: The type of the function's result.
    /// - `abi`: Where the implementation lives.
    /// - `access`: The visibility within the enclosing module.
    /// - `deftype`: Whether the body is given here or only declared.
    ///
    /// # Returns
    /// The handles of the new symbol, its local scope and its return variable.
    ///
    /// # Errors
    /// This function errors if the name collides in `scope`.
    pub fn add_function(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        return_type: Ttype,
        abi: Abi,
        access: Access,
        deftype: Deftype,
    ) -> Result<(SymbolId, ScopeId, SymbolId), BuildError> {
        let name: String = name.into();
        trace!(target: "builder", "Adding function '{name}' to scope {scope}");
        let symtab: ScopeId = self.unit.arena.alloc_scope(Some(scope));

        // The return variable carries the function's name within the function's own scope
        let return_var: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name.clone(), SymbolKind::Variable {
            data_type   : return_type,
            intent      : Intent::ReturnVar,
            storage     : StorageType::Default,
            abi         : Abi::Source,
            access      : Access::Private,
            presence    : Presence::Required,
            initializer : None,
        }));
        self.unit.arena.insert(symtab, return_var)?;

        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::Function {
            symtab,
            args : vec![],
            body : vec![],
            return_var,
            abi,
            access,
            deftype,
        }));
        self.unit.arena.insert(scope, id)?;
        Ok((id, symtab, return_var))
    }

    /// Adds a dummy argument to a procedure: a variable in its scope, appended to its argument
    /// list.
    ///
    /// # Errors
    /// This function errors if the name collides in the procedure's scope.
    ///
    /// # Panics
    /// This function panics if `proc` is not a subroutine or function.
    pub fn add_argument(&mut self, proc: SymbolId, name: impl Into<String>, data_type: Ttype, intent: Intent, presence: Presence) -> Result<SymbolId, BuildError> {
        let symtab: ScopeId = self.unit.arena.symbol(proc).symtab().unwrap_or_else(|| panic!("Cannot add an argument to non-procedure symbol {proc}"));
        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::Variable {
            data_type,
            intent,
            storage     : StorageType::Default,
            abi         : Abi::Source,
            access      : Access::Private,
            presence,
            initializer : None,
        }));
        self.unit.arena.insert(symtab, id)?;
        match &mut self.unit.arena.symbol_mut(proc).kind {
            SymbolKind::Subroutine { args, .. } | SymbolKind::Function { args, .. } => args.push(id),
            kind => panic!("Cannot add an argument to a SymbolKind::{}", kind.variant()),
        }
        Ok(id)
    }

    /// Adds a local variable to the given scope.
    ///
    /// # Errors
    /// This function errors if the name collides in `scope`.
    pub fn add_variable(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        data_type: Ttype,
        storage: StorageType,
        access: Access,
        initializer: Option<Expr>,
    ) -> Result<SymbolId, BuildError> {
        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::Variable {
            data_type,
            intent      : Intent::Local,
            storage,
            abi         : Abi::Source,
            access,
            presence    : Presence::Required,
            initializer : initializer.map(Box::new),
        }));
        self.unit.arena.insert(scope, id)?;
        Ok(id)
    }

    /// Adds a derived type to the given scope.
    ///
    /// # Returns
    /// The handles of the new symbol and the scope holding its members.
    ///
    /// # Errors
    /// This function errors if the name collides in `scope`.
    pub fn add_derived_type(&mut self, scope: ScopeId, name: impl Into<String>, abi: Abi, access: Access, parent: Option<SymbolId>) -> Result<(SymbolId, ScopeId), BuildError> {
        let symtab: ScopeId = self.unit.arena.alloc_scope(Some(scope));
        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::DerivedType { symtab, abi, access, parent }));
        self.unit.arena.insert(scope, id)?;
        Ok((id, symtab))
    }

    /// Adds a class type to the given scope.
    ///
    /// # Returns
    /// The handles of the new symbol and the scope holding its members and bindings.
    ///
    /// # Errors
    /// This function errors if the name collides in `scope`.
    pub fn add_class_type(&mut self, scope: ScopeId, name: impl Into<String>, abi: Abi, access: Access) -> Result<(SymbolId, ScopeId), BuildError> {
        let symtab: ScopeId = self.unit.arena.alloc_scope(Some(scope));
        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::ClassType { symtab, abi, access }));
        self.unit.arena.insert(scope, id)?;
        Ok((id, symtab))
    }

    /// Adds a class-procedure binding to the given scope.
    ///
    /// # Errors
    /// This function errors if the name collides in `scope`.
    pub fn add_class_procedure(&mut self, scope: ScopeId, name: impl Into<String>, proc: SymbolId, access: Access) -> Result<SymbolId, BuildError> {
        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::ClassProcedure { proc, access }));
        self.unit.arena.insert(scope, id)?;
        Ok(id)
    }

    /// Adds a generic procedure (a named overload set) to the given scope.
    ///
    /// # Errors
    /// This function errors if the name collides in `scope`.
    pub fn add_generic_procedure(&mut self, scope: ScopeId, name: impl Into<String>, procs: Vec<SymbolId>, access: Access) -> Result<SymbolId, BuildError> {
        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::GenericProcedure { procs, access }));
        self.unit.arena.insert(scope, id)?;
        Ok(id)
    }

    /// Adds a custom operator (an operator overload set) to the given scope.
    ///
    /// # Errors
    /// This function errors if the name collides in `scope`.
    pub fn add_custom_operator(&mut self, scope: ScopeId, name: impl Into<String>, procs: Vec<SymbolId>, access: Access) -> Result<SymbolId, BuildError> {
        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::CustomOperator { procs, access }));
        self.unit.arena.insert(scope, id)?;
        Ok(id)
    }

    /// Adds an external symbol to the given scope.
    ///
    /// The declared `(module_name, scope_names, original_name)` path is walked before anything is
    /// inserted, and must locate exactly the given target.
    ///
    /// # Arguments
    /// - `scope`: The scope to declare the external in.
    /// - `name`: The name of the external within `scope`.
    /// - `module_name`: The name of the module that owns the target.
    /// - `scope_names`: The names of the scopes between the module scope and the target.
    /// - `original_name`: The name of the target in its defining scope.
    /// - `external`: The target symbol.
    /// - `access`: The visibility of the re-export.
    ///
    /// # Errors
    /// This function errors with [`BuildError::UnresolvedExternal`] if the path does not locate
    /// `external`, or with [`BuildError::DuplicateName`] if the name collides in `scope`.
    pub fn add_external_symbol(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        module_name: impl Into<String>,
        scope_names: Vec<String>,
        original_name: impl Into<String>,
        external: SymbolId,
        access: Access,
    ) -> Result<SymbolId, BuildError> {
        let (module_name, original_name): (String, String) = (module_name.into(), original_name.into());

        // The path must locate the declared target before we commit anything
        let located: SymbolId = self.unit.resolve_path(&module_name, &scope_names, &original_name)?;
        if located != external {
            return Err(BuildError::UnresolvedExternal { module_name, scope_names, name: original_name });
        }

        let id: SymbolId = self.unit.arena.alloc_symbol(Symbol::new(name, SymbolKind::ExternalSymbol {
            module_name,
            scope_names,
            external,
            original_name,
            access,
        }));
        self.unit.arena.insert(scope, id)?;
        Ok(id)
    }



    /// Replaces the body of a body-carrying symbol.
    ///
    /// Consistency with the symbol's ABI and definition type is checked on finalization, so
    /// bodies can be grown statement-wise in any order.
    ///
    /// # Panics
    /// This function panics if `proc` carries no body.
    pub fn set_body(&mut self, proc: SymbolId, body: Vec<Stmt>) {
        use SymbolKind::*;
        match &mut self.unit.arena.symbol_mut(proc).kind {
            Program { body: b, .. } | Subroutine { body: b, .. } | Function { body: b, .. } => *b = body,
            kind => panic!("Cannot set a body on a SymbolKind::{}", kind.variant()),
        }
    }

    /// Finalizes a procedure, performing the checks that need a complete body.
    ///
    /// Checked here: every `GoTo(k)` has its `GoToTarget(k)` and vice versa; a function has
    /// exactly one `ReturnVar`-intent variable, which is its recorded return variable; the
    /// combination of ABI, definition type and body presence is consistent.
    ///
    /// # Errors
    /// This function errors with the first failed check; the validation traversal can be used
    /// afterwards to gather the full list over a whole unit.
    pub fn finalize_procedure(&mut self, proc: SymbolId) -> Result<(), BuildError> {
        let symbol: &Symbol = self.unit.arena.symbol(proc);
        let name: String = symbol.name.clone();
        trace!(target: "builder", "Finalizing procedure '{name}'");

        // Goto labels must pair up within this body
        if let Some(body) = symbol.body() {
            let (mut gotos, mut targets): (Vec<u32>, Vec<u32>) = (vec![], vec![]);
            collect_labels(body, &mut gotos, &mut targets);
            for id in &gotos {
                if !targets.contains(id) { return Err(BuildError::UnmatchedGoTo { procedure: name, id: *id }); }
            }
            for id in &targets {
                if !gotos.contains(id) { return Err(BuildError::UnmatchedGoToTarget { procedure: name, id: *id }); }
            }
        }

        // Functions need their one return variable
        let symbol: &Symbol = self.unit.arena.symbol(proc);
        if let SymbolKind::Function { symtab, return_var, .. } = &symbol.kind {
            let return_vars: Vec<SymbolId> = self
                .unit
                .arena
                .scope(*symtab)
                .iter()
                .map(|(_, id)| id)
                .filter(|id| matches!(self.unit.arena.symbol(*id).kind, SymbolKind::Variable { intent: Intent::ReturnVar, .. }))
                .collect();
            match return_vars[..] {
                []   => return Err(BuildError::ReturnVarMissing { function: name }),
                [rv] => if rv != *return_var { return Err(BuildError::ReturnVarMismatch { function: name }); },
                _    => return Err(BuildError::ReturnVarDuplicated { function: name, count: return_vars.len() }),
            }
        }

        // ABI, deftype and body must agree
        let symbol: &Symbol = self.unit.arena.symbol(proc);
        if let SymbolKind::Subroutine { abi, deftype, body, .. } | SymbolKind::Function { abi, deftype, body, .. } = &symbol.kind {
            let consistent: bool = match deftype {
                Deftype::Implementation => *abi != Abi::Source || !body.is_empty(),
                Deftype::Interface      => body.is_empty() && *abi != Abi::Source,
            };
            if !consistent {
                return Err(BuildError::AbiBodyMismatch { procedure: name, abi: *abi, deftype: *deftype, body_len: body.len() });
            }
        }

        Ok(())
    }
}
