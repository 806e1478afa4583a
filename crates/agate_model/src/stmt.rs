//! Behavioral statements for process bodies.
//!
//! A process body is an ordinary statement sequence; suspension is the
//! explicit [`WaitSpec`] statement, consumed only at the one permitted
//! position per process kind.

use crate::expr::{BinOp, EdgeKind};
use crate::ids::ExprId;
use agate_common::{Ident, Span};
use serde::{Deserialize, Serialize};

/// One `if`/`elsif` arm of a conditional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfArm {
    /// The test expression.
    pub test: ExprId,
    /// The body executed when the test holds.
    pub body: Vec<Stmt>,
    /// Source location.
    pub span: Span,
}

/// The direction of a bounded range iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeDir {
    /// `start to stop-1` with an implicit `+1` step.
    Ascending,
    /// `start-1 downto stop` with an implicit `-1` step.
    Descending,
}

/// A suspend-point specification.
///
/// Exactly one suspend point is permitted per process body, at the position
/// defined by the process kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WaitSpec {
    /// A timed wait (`wait for <n> ns`).
    Delay(ExprId),
    /// An edge wait (`wait until rising_edge(a) or falling_edge(b)`).
    EdgeList(Vec<(Ident, EdgeKind)>),
    /// A level wait (`wait until <condition>`).
    Level(ExprId),
}

/// A behavioral statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// An assignment to a signal's next value (`<=`) or a variable (`:=`).
    Assign {
        /// The assignment target expression (name, subscript, or slice).
        lhs: ExprId,
        /// `true` when the target is a signal's next value.
        sig_assign: bool,
        /// The augmenting operator for `x op= value` forms, if any.
        op: Option<BinOp>,
        /// The assigned value.
        value: ExprId,
        /// Source location.
        span: Span,
    },
    /// A multi-branch conditional.
    If {
        /// The `if`/`elsif` arms in source order.
        arms: Vec<IfArm>,
        /// The trailing `else` body, if present.
        else_body: Option<Vec<Stmt>>,
        /// Source location.
        span: Span,
    },
    /// A bounded range iteration with implicit unit step.
    For {
        /// The loop induction variable.
        var: Ident,
        /// The iteration direction.
        dir: RangeDir,
        /// The range start (defaults to zero when absent).
        start: Option<ExprId>,
        /// The range stop (defaults to zero when absent).
        stop: Option<ExprId>,
        /// An explicit step expression; anything but the implicit unit
        /// step is unsupported.
        step: Option<ExprId>,
        /// The loop body.
        body: Vec<Stmt>,
        /// Source location.
        span: Span,
    },
    /// A while loop.
    While {
        /// The loop condition.
        cond: ExprId,
        /// The loop body.
        body: Vec<Stmt>,
        /// Source location.
        span: Span,
    },
    /// Exit the innermost loop (`exit;`).
    Break {
        /// Source location.
        span: Span,
    },
    /// Skip to the next iteration of the innermost loop (`next;`).
    Continue {
        /// Source location.
        span: Span,
    },
    /// Return from a callable.
    Return {
        /// The returned value, for functions.
        value: Option<ExprId>,
        /// Source location.
        span: Span,
    },
    /// A procedure call statement.
    CallProc {
        /// The callable's name.
        func: Ident,
        /// The argument expressions.
        args: Vec<ExprId>,
        /// Source location.
        span: Span,
    },
    /// Formatted text output via `std.textio`.
    Print {
        /// The printed expressions.
        args: Vec<ExprId>,
        /// Source location.
        span: Span,
    },
    /// End-of-simulation marker.
    Finish {
        /// Source location.
        span: Span,
    },
    /// An explicit suspend point.
    Wait {
        /// The wait category and payload.
        spec: WaitSpec,
        /// Source location.
        span: Span,
    },
    /// A no-operation (`null;`).
    Pass {
        /// Source location.
        span: Span,
    },
}

impl Stmt {
    /// Returns the source span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::For { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Return { span, .. }
            | Stmt::CallProc { span, .. }
            | Stmt::Print { span, .. }
            | Stmt::Finish { span }
            | Stmt::Wait { span, .. }
            | Stmt::Pass { span } => *span,
        }
    }
}
