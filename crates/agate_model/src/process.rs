//! Process descriptors for concurrent hardware behavior.
//!
//! A [`Process`] is one concurrent unit of the design: a clocked or
//! combinational process, a one-shot testbench block, or a callable helper
//! (function/procedure). It arrives pre-classified from the analysis stage
//! with its symbol table populated; the translation engine annotates it
//! with types and emits it exactly once.

use crate::expr::{EdgeKind, Expr};
use crate::ids::{CallableId, EnumTypeId, ExprId, MemoryId, SignalId};
use crate::pool::Pool;
use crate::stmt::Stmt;
use agate_common::{Ident, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of process, determining header, body wrapping, and suspend
/// handling during code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessKind {
    /// Clocked logic; body runs on the listed triggers, usually one edge.
    Sequential,
    /// Level-sensitive logic over an explicit signal list.
    Combinational,
    /// A single continuous assignment per statement, no process wrapper.
    SimpleCombinational,
    /// Like [`Sequential`](ProcessKind::Sequential) but with an externally
    /// supplied sensitivity list.
    CustomSensitivity,
    /// A testbench block that runs once then suspends forever.
    Initial,
    /// A value-returning subprogram.
    Function,
    /// A subprogram without a return value.
    Procedure,
}

impl ProcessKind {
    /// Returns `true` for the callable kinds.
    pub fn is_callable(self) -> bool {
        matches!(self, ProcessKind::Function | ProcessKind::Procedure)
    }
}

/// An entry in a sensitivity list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensItem {
    /// An edge-waiter on a signal.
    Edge {
        /// The monitored signal.
        signal: SignalId,
        /// The transition kind.
        edge: EdgeKind,
    },
    /// A plain level-sensitive signal.
    Signal(SignalId),
    /// A timed trigger, in nanoseconds.
    Delay(u64),
}

/// The declared shape of a local variable, callable argument, or function
/// return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarShape {
    /// A boolean-like single wire.
    Logic,
    /// A fixed-width vector.
    Vector {
        /// The number of bits.
        width: u32,
        /// Whether the vector is signed.
        signed: bool,
    },
    /// A plain integer.
    Int,
}

/// A design object bound to a name in a process's symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Object {
    /// A signal.
    Signal(SignalId),
    /// A memory or ROM.
    Memory(MemoryId),
    /// An enumerated type.
    Enum(EnumTypeId),
    /// One member of an enumerated type.
    EnumMember {
        /// The owning type.
        ty: EnumTypeId,
        /// The member's position within the type.
        index: u32,
    },
    /// A compile-time integer constant.
    Const(i64),
    /// A user-defined callable.
    Callable(CallableId),
}

/// Maps identifiers to the design objects they denote within one process.
pub type SymbolTable = HashMap<Ident, Object>;

/// One concurrent process (or callable) of the design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    /// The process name, used as block label or subprogram name.
    pub name: Ident,
    /// The pre-classified kind.
    pub kind: ProcessKind,
    /// The sensitivity list; meaning depends on `kind`.
    pub sensitivity: Vec<SensItem>,
    /// Identifier-to-object bindings visible in the body.
    pub symbols: SymbolTable,
    /// Ordered local variables, declared in the process/subprogram header.
    pub vars: Vec<(Ident, VarShape)>,
    /// Argument names in declaration order (callables only).
    pub args: Vec<Ident>,
    /// Argument names that are read within the callable body.
    pub inputs: Vec<Ident>,
    /// Argument names that are written within the callable body.
    pub outputs: Vec<Ident>,
    /// The return shape, for functions.
    pub ret: Option<VarShape>,
    /// Whether the body produces formatted text output (declares `L: line`).
    pub uses_text_output: bool,
    /// The statement tree.
    pub body: Vec<Stmt>,
    /// The expression pool referenced by the body.
    pub exprs: Pool<ExprId, Expr>,
    /// The source span of the process definition.
    pub span: Span,
}

impl Process {
    /// Creates an empty process of the given name and kind, convenient for
    /// construction by the analysis stage and by tests.
    pub fn new(name: Ident, kind: ProcessKind) -> Self {
        Self {
            name,
            kind,
            sensitivity: Vec::new(),
            symbols: SymbolTable::new(),
            vars: Vec::new(),
            args: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            ret: None,
            uses_text_output: false,
            body: Vec::new(),
            exprs: Pool::new(),
            span: Span::DUMMY,
        }
    }

    /// Looks up a name in the symbol table.
    pub fn lookup(&self, name: Ident) -> Option<Object> {
        self.symbols.get(&name).copied()
    }

    /// Returns the declared shape of a local variable, if one exists.
    pub fn var_shape(&self, name: Ident) -> Option<VarShape> {
        self.vars
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, shape)| *shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_process() {
        let p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        assert_eq!(p.kind, ProcessKind::Combinational);
        assert!(p.body.is_empty());
        assert!(p.lookup(Ident::from_raw(1)).is_none());
    }

    #[test]
    fn symbol_lookup() {
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Sequential);
        let name = Ident::from_raw(5);
        p.symbols.insert(name, Object::Signal(SignalId::from_raw(3)));
        assert_eq!(p.lookup(name), Some(Object::Signal(SignalId::from_raw(3))));
    }

    #[test]
    fn var_shape_lookup() {
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Function);
        let v = Ident::from_raw(9);
        p.vars.push((
            v,
            VarShape::Vector {
                width: 4,
                signed: false,
            },
        ));
        assert_eq!(
            p.var_shape(v),
            Some(VarShape::Vector {
                width: 4,
                signed: false
            })
        );
        assert_eq!(p.var_shape(Ident::from_raw(10)), None);
    }

    #[test]
    fn callable_kinds() {
        assert!(ProcessKind::Function.is_callable());
        assert!(ProcessKind::Procedure.is_callable());
        assert!(!ProcessKind::Sequential.is_callable());
    }

    #[test]
    fn sens_items_distinct() {
        let clk = SignalId::from_raw(0);
        assert_ne!(
            SensItem::Edge {
                signal: clk,
                edge: EdgeKind::Rising
            },
            SensItem::Signal(clk)
        );
    }
}
