//  STATEMENTS.rs
//    by Lut99
//
//  Created:
//    13 Mar 2024, 10:41:12
//  Last edited:
//    28 Jun 2024, 16:09:37
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the statement nodes of the ASR, which model the imperative
//!   control flow, I/O, memory management and labelled jumps of
//!   procedure bodies.
//

use enum_debug::EnumDebug;

use super::expressions::Expr;
use super::spec::{Node, SourceRange};
use super::types::Dimension;
use crate::arena::SymbolId;


/***** LIBRARY *****/
/// A Statement is the smallest executable unit of a procedure body.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    /// Any specific implementations of a statement.
    pub kind  : StmtKind,
    /// The range in the source text for this statement.
    pub range : Option<SourceRange>,
}
impl Stmt {
    /// Constructor for a Stmt without a source range.
    ///
    /// # Arguments
    /// - `kind`: The specific kind of statement to wrap.
    #[inline]
    pub const fn new(kind: StmtKind) -> Self {
        Self { kind, range: None }
    }
}
impl Node for Stmt {
    #[inline]
    fn range(&self) -> Option<SourceRange> { self.range }
}

/// Defines the StmtKind, which implements the specifics for each of the various statements.
#[derive(Clone, Debug, EnumDebug, PartialEq)]
pub enum StmtKind {
    // Dataflow
    /// Assigns a value to a target.
    Assignment {
        /// The target; a `Var`, `ArrayRef` or `DerivedRef` expression.
        target : Expr,
        /// The value to assign.
        value  : Expr,
    },
    /// Calls a subroutine.
    SubroutineCall {
        /// The resolved target; always a `Subroutine` or an `ExternalSymbol` wrapping one.
        name          : SymbolId,
        /// The symbol the source named before resolution, when that differs from `name`.
        original_name : Option<SymbolId>,
        /// The actual arguments, in declaration order of the dummies.
        args          : Vec<Expr>,
    },

    // Control flow
    /// Branches on a logical test.
    If {
        /// The condition.
        test   : Expr,
        /// The statements executed when the condition holds.
        body   : Vec<Stmt>,
        /// The statements executed otherwise.
        orelse : Vec<Stmt>,
    },
    /// Repeats a body for as long as a logical test holds.
    WhileLoop {
        /// The condition, evaluated before every iteration.
        test : Expr,
        /// The statements executed repeatedly.
        body : Vec<Stmt>,
    },
    /// Repeats a body over a counted range.
    DoLoop {
        /// The loop variable and its bounds.
        head : DoLoopHead,
        /// The statements executed repeatedly.
        body : Vec<Stmt>,
    },
    /// Escapes the innermost enclosing loop.
    Exit,
    /// Skips to the next iteration of the innermost enclosing loop.
    Cycle,
    /// Dispatches over the value of a selector.
    Select {
        /// The value being dispatched on.
        selector : Expr,
        /// The cases, tried in order.
        cases    : Vec<Case>,
        /// The statements executed when no case matches.
        default  : Vec<Stmt>,
    },

    // I/O
    /// Prints values to the standard output unit.
    Print {
        /// An optional format expression.
        fmt    : Option<Expr>,
        /// The values to print.
        values : Vec<Expr>,
    },
    /// Connects a unit to a file.
    Open {
        /// The unit to connect.
        unit   : Expr,
        /// The file to connect it to, if named.
        file   : Option<Expr>,
        /// The requested status (`old`, `new`, `replace`, ...), if given.
        status : Option<Expr>,
    },
    /// Disconnects a unit.
    Close {
        /// The unit to disconnect.
        unit   : Expr,
        /// The disposition (`keep`, `delete`), if given.
        status : Option<Expr>,
    },
    /// Reads values from a unit.
    Read {
        /// The unit to read from; the default input unit when omitted.
        unit   : Option<Expr>,
        /// The targets to read into.
        values : Vec<Expr>,
    },
    /// Writes values to a unit.
    Write {
        /// The unit to write to; the default output unit when omitted.
        unit   : Option<Expr>,
        /// The values to write.
        values : Vec<Expr>,
    },
    /// Queries the state of a unit or file.
    Inquire {
        /// The unit to query, if querying by unit.
        unit : Option<Expr>,
        /// The file to query, if querying by name.
        file : Option<Expr>,
    },
    /// Repositions a unit to its first record.
    Rewind {
        /// The unit to reposition.
        unit : Expr,
    },
    /// Flushes buffered output on a unit.
    Flush {
        /// The unit to flush.
        unit : Expr,
    },

    // Memory management
    /// Acquires storage for allocatable variables.
    Allocate {
        /// The variables to allocate, each with its runtime shape.
        args : Vec<AllocArg>,
    },
    /// Releases storage the source asked to release.
    ExplicitDeallocate {
        /// The variables to deallocate.
        vars : Vec<SymbolId>,
    },
    /// Releases storage at a scope exit the elaboration pass inserted.
    ImplicitDeallocate {
        /// The variables to deallocate.
        vars : Vec<SymbolId>,
    },
    /// Disassociates pointers.
    Nullify {
        /// The pointer variables to disassociate.
        vars : Vec<SymbolId>,
    },

    // Checks & jumps
    /// Aborts when a logical test does not hold.
    Assert {
        /// The condition to check.
        test : Expr,
        /// The message to report on failure, if given.
        msg  : Option<Expr>,
    },
    /// Jumps to the [`GoToTarget`](StmtKind::GoToTarget) with the same label in this procedure.
    GoTo {
        /// The label; unique per (GoTo, GoToTarget) pair within a procedure.
        id : u32,
    },
    /// The landing site of the [`GoTo`](StmtKind::GoTo) with the same label in this procedure.
    GoToTarget {
        /// The label.
        id : u32,
    },
    /// Returns from the enclosing procedure.
    Return,
    /// Terminates the program normally.
    Stop {
        /// The exit code, if given.
        code : Option<Expr>,
    },
    /// Terminates the program abnormally.
    ErrorStop {
        /// The exit code, if given.
        code : Option<Expr>,
    },
}



/// Defines the head of a [`DoLoop`](StmtKind::DoLoop): the loop variable and its range.
#[derive(Clone, Debug, PartialEq)]
pub struct DoLoopHead {
    /// The loop `Variable`.
    pub var       : SymbolId,
    /// The first value of the loop variable.
    pub start     : Expr,
    /// The last value of the loop variable, inclusive.
    pub end       : Expr,
    /// The step; `1` when omitted.
    pub increment : Option<Expr>,
}

/// Defines one case of a [`Select`](StmtKind::Select) statement.
#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    /// The values that select this case.
    pub values : Vec<Expr>,
    /// The statements executed when one of them matches.
    pub body   : Vec<Stmt>,
}

/// Defines one allocation of an [`Allocate`](StmtKind::Allocate) statement.
#[derive(Clone, Debug, PartialEq)]
pub struct AllocArg {
    /// The allocatable `Variable` to acquire storage for.
    pub target : SymbolId,
    /// The runtime shape to allocate it with.
    pub dims   : Vec<Dimension>,
}
