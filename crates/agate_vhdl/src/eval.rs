//! Compile-time constant evaluation over pooled expressions.
//!
//! Used wherever the translation needs an actual number: slice bounds, loop
//! bounds, and detection of read-only table lookups. Returns `None` for
//! anything that is not a compile-time constant; the caller decides whether
//! that is an error at its site.

use agate_model::{BinOp, Expr, ExprId, Object, Process, UnaryOp};

/// Evaluates `id` within `process` to a constant, if it is one.
pub fn eval(process: &Process, id: ExprId) -> Option<i64> {
    match &process.exprs[id] {
        Expr::Literal { value, .. } => Some(*value),
        Expr::BoolLit { value, .. } => Some(i64::from(*value)),
        Expr::Name { name, .. } => match process.lookup(*name)? {
            Object::Const(v) => Some(v),
            Object::EnumMember { index, .. } => Some(i64::from(index)),
            _ => None,
        },
        Expr::Unary { op, operand, .. } => {
            let v = eval(process, *operand)?;
            match op {
                UnaryOp::Plus => Some(v),
                UnaryOp::Minus => v.checked_neg(),
                UnaryOp::Invert => None,
            }
        }
        Expr::Binary { op, lhs, rhs, .. } => {
            let l = eval(process, *lhs)?;
            let r = eval(process, *rhs)?;
            match op {
                BinOp::Add => l.checked_add(r),
                BinOp::Sub => l.checked_sub(r),
                BinOp::Mul => l.checked_mul(r),
                BinOp::Div => l.checked_div(r),
                BinOp::Mod => l.checked_rem_euclid(r),
                BinOp::Pow => u32::try_from(r).ok().and_then(|e| l.checked_pow(e)),
                BinOp::Shl => u32::try_from(r).ok().and_then(|s| l.checked_shl(s)),
                BinOp::Shr => u32::try_from(r).ok().map(|s| l >> s.min(63)),
                BinOp::BitAnd => Some(l & r),
                BinOp::BitOr => Some(l | r),
                BinOp::BitXor => Some(l ^ r),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agate_common::{Ident, Span};
    use agate_model::ProcessKind;

    fn lit(p: &mut Process, v: i64) -> ExprId {
        p.exprs.push(Expr::Literal {
            value: v,
            span: Span::DUMMY,
        })
    }

    #[test]
    fn folds_arithmetic() {
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        let a = lit(&mut p, 6);
        let b = lit(&mut p, 7);
        let mul = p.exprs.push(Expr::Binary {
            op: BinOp::Mul,
            lhs: a,
            rhs: b,
            span: Span::DUMMY,
        });
        assert_eq!(eval(&p, mul), Some(42));
    }

    #[test]
    fn folds_symbolic_constants() {
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        let n = Ident::from_raw(1);
        p.symbols.insert(n, Object::Const(16));
        let name = p.exprs.push(Expr::Name {
            name: n,
            span: Span::DUMMY,
        });
        let one = lit(&mut p, 1);
        let sub = p.exprs.push(Expr::Binary {
            op: BinOp::Sub,
            lhs: name,
            rhs: one,
            span: Span::DUMMY,
        });
        assert_eq!(eval(&p, sub), Some(15));
    }

    #[test]
    fn power_of_two() {
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        let b = lit(&mut p, 2);
        let e = lit(&mut p, 10);
        let pow = p.exprs.push(Expr::Binary {
            op: BinOp::Pow,
            lhs: b,
            rhs: e,
            span: Span::DUMMY,
        });
        assert_eq!(eval(&p, pow), Some(1024));
    }

    #[test]
    fn signal_names_are_not_constant() {
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        let n = Ident::from_raw(1);
        p.symbols
            .insert(n, Object::Signal(agate_model::SignalId::from_raw(0)));
        let name = p.exprs.push(Expr::Name {
            name: n,
            span: Span::DUMMY,
        });
        assert_eq!(eval(&p, name), None);
    }

    #[test]
    fn division_by_zero_is_not_constant() {
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        let a = lit(&mut p, 1);
        let z = lit(&mut p, 0);
        let div = p.exprs.push(Expr::Binary {
            op: BinOp::Div,
            lhs: a,
            rhs: z,
            span: Span::DUMMY,
        });
        assert_eq!(eval(&p, div), None);
    }
}
