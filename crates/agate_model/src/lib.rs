//! The design model consumed by the Agate VHDL emission backend.
//!
//! This crate defines the in-memory description of a digital design as it
//! arrives from the analysis stage: [`Design`], [`Signal`], [`EnumType`],
//! [`Memory`], and [`Process`] descriptors whose bodies are statement trees
//! over a pooled expression arena. The translation engine consumes these
//! read-only, except for the terminal port-rename step and the post-emission
//! reset of transient annotation fields.

#![warn(missing_docs)]

pub mod design;
pub mod enums;
pub mod expr;
pub mod ids;
pub mod memory;
pub mod pool;
pub mod process;
pub mod signal;
pub mod stmt;

pub use design::{Design, PortArg};
pub use enums::EnumType;
pub use expr::{BinOp, CmpOp, EdgeKind, Expr, LogicOp, UnaryOp};
pub use ids::{CallableId, EnumTypeId, ExprId, MemoryId, SignalId};
pub use memory::Memory;
pub use pool::{Pool, PoolId};
pub use process::{Object, Process, ProcessKind, SensItem, SymbolTable, VarShape};
pub use signal::{Signal, SignalCategory};
pub use stmt::{IfArm, RangeDir, Stmt, WaitSpec};
