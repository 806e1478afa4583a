//! Expression trees for process bodies.
//!
//! Expression nodes live in a per-process [`Pool`](crate::pool::Pool) and
//! reference their children by [`ExprId`]. The nodes themselves are
//! immutable input; the type-inference pass records its results in a side
//! table keyed by `ExprId`.

use crate::ids::ExprId;
use agate_common::{Ident, Span};
use serde::{Deserialize, Serialize};

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Unary plus (`+`).
    Plus,
    /// Arithmetic negation (`-`).
    Minus,
    /// Bit inversion (`not`).
    Invert,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Flooring division (`/`).
    Div,
    /// Modulo (`mod`).
    Mod,
    /// Exponentiation (`**`).
    Pow,
    /// Left shift.
    Shl,
    /// Right shift.
    Shr,
    /// Bitwise AND (`and`).
    BitAnd,
    /// Bitwise OR (`or`).
    BitOr,
    /// Bitwise XOR (`xor`).
    BitXor,
}

/// A boolean connective over two or more terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicOp {
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    /// Equality (`=`).
    Eq,
    /// Inequality (`/=`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl CmpOp {
    /// Returns the VHDL spelling of this operator.
    pub fn vhdl(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "/=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// A signal transition kind for edge tests and edge waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// A 0-to-1 transition (`rising_edge`).
    Rising,
    /// A 1-to-0 transition (`falling_edge`).
    Falling,
}

/// An expression node in a process's pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// An integer literal.
    Literal {
        /// The literal value.
        value: i64,
        /// Source location.
        span: Span,
    },
    /// A boolean literal.
    BoolLit {
        /// The literal value.
        value: bool,
        /// Source location.
        span: Span,
    },
    /// A name resolved through the process's symbol or local-variable table.
    Name {
        /// The referenced identifier.
        name: Ident,
        /// Source location.
        span: Span,
    },
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: ExprId,
        /// Source location.
        span: Span,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinOp,
        /// The left-hand side.
        lhs: ExprId,
        /// The right-hand side.
        rhs: ExprId,
        /// Source location.
        span: Span,
    },
    /// An n-ary boolean connective (`a and b and c`).
    Logic {
        /// The connective.
        op: LogicOp,
        /// The terms, at least two.
        terms: Vec<ExprId>,
        /// Source location.
        span: Span,
    },
    /// Logical negation.
    Not {
        /// The operand.
        operand: ExprId,
        /// Source location.
        span: Span,
    },
    /// A comparison yielding a boolean.
    Compare {
        /// The operator.
        op: CmpOp,
        /// The left-hand side.
        lhs: ExprId,
        /// The right-hand side.
        rhs: ExprId,
        /// Source location.
        span: Span,
    },
    /// A single-bit subscript (`base(index)`).
    Index {
        /// The indexed expression.
        base: ExprId,
        /// The index expression.
        index: ExprId,
        /// Source location.
        span: Span,
    },
    /// A slice (`base(upper-1 downto lower)`).
    ///
    /// A missing `upper` means the operand's full width; a missing `lower`
    /// means zero. Bounds must be compile-time constants.
    Slice {
        /// The sliced expression.
        base: ExprId,
        /// The exclusive upper bound.
        upper: Option<ExprId>,
        /// The inclusive lower bound.
        lower: Option<ExprId>,
        /// Source location.
        span: Span,
    },
    /// A concatenation (`a & b & c`), unsigned with summed width.
    Concat {
        /// The concatenated parts, most significant first.
        parts: Vec<ExprId>,
        /// Source location.
        span: Span,
    },
    /// An edge test on a signal, used in async-reset conditionals and waits.
    Edge {
        /// The tested signal's name.
        signal: Ident,
        /// The transition kind.
        edge: EdgeKind,
        /// Source location.
        span: Span,
    },
    /// A call of a user-defined function.
    Call {
        /// The callable's name.
        func: Ident,
        /// The argument expressions.
        args: Vec<ExprId>,
        /// Source location.
        span: Span,
    },
}

impl Expr {
    /// Returns the source span of this node.
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::BoolLit { span, .. }
            | Expr::Name { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Logic { span, .. }
            | Expr::Not { span, .. }
            | Expr::Compare { span, .. }
            | Expr::Index { span, .. }
            | Expr::Slice { span, .. }
            | Expr::Concat { span, .. }
            | Expr::Edge { span, .. }
            | Expr::Call { span, .. } => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ExprId;
    use crate::pool::Pool;

    #[test]
    fn literal_node() {
        let mut pool: Pool<ExprId, Expr> = Pool::new();
        let id = pool.push(Expr::Literal {
            value: 42,
            span: Span::DUMMY,
        });
        assert!(matches!(pool[id], Expr::Literal { value: 42, .. }));
    }

    #[test]
    fn binary_references_children() {
        let mut pool: Pool<ExprId, Expr> = Pool::new();
        let a = pool.push(Expr::Literal {
            value: 1,
            span: Span::DUMMY,
        });
        let b = pool.push(Expr::Literal {
            value: 2,
            span: Span::DUMMY,
        });
        let sum = pool.push(Expr::Binary {
            op: BinOp::Add,
            lhs: a,
            rhs: b,
            span: Span::DUMMY,
        });
        if let Expr::Binary { lhs, rhs, .. } = pool[sum] {
            assert_eq!(lhs, a);
            assert_eq!(rhs, b);
        } else {
            panic!("expected Binary");
        }
    }

    #[test]
    fn cmp_op_spellings() {
        assert_eq!(CmpOp::Eq.vhdl(), "=");
        assert_eq!(CmpOp::Ne.vhdl(), "/=");
        assert_eq!(CmpOp::Le.vhdl(), "<=");
    }

    #[test]
    fn span_accessor() {
        let e = Expr::Edge {
            signal: Ident::from_raw(0),
            edge: EdgeKind::Rising,
            span: Span::DUMMY,
        };
        assert!(e.span().is_dummy());
    }

    #[test]
    fn edge_kinds_distinct() {
        assert_ne!(EdgeKind::Rising, EdgeKind::Falling);
    }
}
