//! The type inference pass.
//!
//! A single bottom-up traversal per process annotates every expression node
//! with a type; no fixpoint iteration is needed because the trees contain
//! no forward references. The results land in an immutable [`Annotations`]
//! side table keyed by pooled [`ExprId`], leaving the input nodes untouched
//! so the pass stays referentially transparent and independently testable.

use crate::errors::{
    error_list_element_not_unique, error_non_constant_bound, error_non_unit_step,
    error_not_supported, error_unsupported_type, TranslateResult,
};
use crate::eval::eval;
use crate::types::VhdlType;
use agate_common::{Ident, Interner, Span};
use agate_model::{
    BinOp, Design, EnumTypeId, Expr, ExprId, Object, Process, SignalCategory, Stmt, WaitSpec,
};
use std::collections::{HashMap, HashSet};

/// The inferred type of one expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredType {
    /// A numeric or logic value in the VHDL type algebra.
    Std(VhdlType),
    /// A symbolic value of an enumerated type.
    Enum(EnumTypeId),
}

/// The inference results for one process or callable body.
#[derive(Debug, Default)]
pub struct Annotations {
    types: HashMap<ExprId, InferredType>,
    loop_vars: HashSet<Ident>,
}

impl Annotations {
    /// Returns the inferred type of a node, if the pass reached it.
    pub fn ty(&self, id: ExprId) -> Option<InferredType> {
        self.types.get(&id).copied()
    }

    /// Returns `true` if `name` is a loop induction variable.
    ///
    /// Loop variables become loop-scoped indices in the output, so the
    /// declaration writer skips them.
    pub fn is_loop_var(&self, name: Ident) -> bool {
        self.loop_vars.contains(&name)
    }
}

/// The inference results for a whole design, indexed in parallel with the
/// design's process list and callable pool.
#[derive(Debug, Default)]
pub struct DesignAnnotations {
    /// One table per entry of `design.processes`.
    pub processes: Vec<Annotations>,
    /// One table per entry of `design.callables`.
    pub callables: Vec<Annotations>,
}

/// Runs inference over every process and callable of the design.
pub fn annotate_design(
    design: &Design,
    interner: &Interner,
) -> TranslateResult<DesignAnnotations> {
    let mut anns = DesignAnnotations::default();
    for callable in design.callables.values() {
        anns.callables.push(annotate_process(design, callable, interner)?);
    }
    for process in &design.processes {
        anns.processes.push(annotate_process(design, process, interner)?);
    }
    Ok(anns)
}

/// Runs inference over one process body.
pub fn annotate_process(
    design: &Design,
    process: &Process,
    interner: &Interner,
) -> TranslateResult<Annotations> {
    let mut inf = Inferencer {
        design,
        process,
        interner,
        ann: Annotations::default(),
    };
    inf.stmts(&process.body)?;
    Ok(inf.ann)
}

struct Inferencer<'a> {
    design: &'a Design,
    process: &'a Process,
    interner: &'a Interner,
    ann: Annotations,
}

impl<'a> Inferencer<'a> {
    fn stmts(&mut self, list: &[Stmt]) -> TranslateResult<()> {
        for stmt in list {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> TranslateResult<()> {
        match stmt {
            Stmt::Assign { lhs, value, .. } => {
                self.expr(*lhs)?;
                self.expr(*value)?;
            }
            Stmt::If {
                arms, else_body, ..
            } => {
                for arm in arms {
                    self.expr(arm.test)?;
                    self.stmts(&arm.body)?;
                }
                if let Some(body) = else_body {
                    self.stmts(body)?;
                }
            }
            Stmt::For {
                var,
                start,
                stop,
                step,
                body,
                span,
                ..
            } => {
                self.constant_bound(*start, *span)?;
                self.constant_bound(*stop, *span)?;
                if let Some(step) = step {
                    if eval(self.process, *step) != Some(1) {
                        return Err(error_non_unit_step(*span).into());
                    }
                }
                self.ann.loop_vars.insert(*var);
                self.stmts(body)?;
            }
            Stmt::While { cond, body, .. } => {
                self.expr(*cond)?;
                self.stmts(body)?;
            }
            Stmt::Return { value, .. } => {
                if let Some(value) = value {
                    self.expr(*value)?;
                }
            }
            Stmt::CallProc { func, args, span } => {
                if !matches!(self.process.lookup(*func), Some(Object::Callable(_))) {
                    return Err(error_unsupported_type(
                        format!("`{}` is not a callable", self.interner.resolve(*func)),
                        *span,
                    )
                    .into());
                }
                for arg in args {
                    self.expr(*arg)?;
                }
            }
            Stmt::Print { args, .. } => {
                for arg in args {
                    self.expr(*arg)?;
                }
            }
            Stmt::Wait { spec, .. } => match spec {
                WaitSpec::Delay(e) | WaitSpec::Level(e) => {
                    self.expr(*e)?;
                }
                WaitSpec::EdgeList(_) => {}
            },
            Stmt::Break { .. }
            | Stmt::Continue { .. }
            | Stmt::Finish { .. }
            | Stmt::Pass { .. } => {}
        }
        Ok(())
    }

    fn constant_bound(&self, bound: Option<ExprId>, span: Span) -> TranslateResult<()> {
        if let Some(bound) = bound {
            if eval(self.process, bound).is_none() {
                return Err(
                    error_non_constant_bound("loop bound is not a constant", span).into(),
                );
            }
        }
        Ok(())
    }

    fn expr(&mut self, id: ExprId) -> TranslateResult<InferredType> {
        let ty = self.expr_uncached(id)?;
        self.ann.types.insert(id, ty);
        Ok(ty)
    }

    /// Requires a node in the numeric algebra, rejecting enum values.
    fn std(&mut self, id: ExprId) -> TranslateResult<VhdlType> {
        match self.expr(id)? {
            InferredType::Std(t) => Ok(t),
            InferredType::Enum(_) => Err(error_unsupported_type(
                "enumerated value used in a numeric operation",
                self.process.exprs[id].span(),
            )
            .into()),
        }
    }

    fn expr_uncached(&mut self, id: ExprId) -> TranslateResult<InferredType> {
        use VhdlType::*;
        let span = self.process.exprs[id].span();
        // Clone the node up front so child recursion can borrow freely.
        let node = self.process.exprs[id].clone();
        let ty = match node {
            Expr::Literal { .. } => InferredType::Std(Integer),
            Expr::BoolLit { .. } => InferredType::Std(Boolean),
            Expr::Name { name, .. } => self.name_type(name, span)?,
            Expr::Unary { operand, .. } => InferredType::Std(self.std(operand)?),
            Expr::Binary { op, lhs, rhs, .. } => {
                let l = self.std(lhs)?;
                let r = self.std(rhs)?;
                self.check_signed_operand(op, l, r, span)?;
                let out = match op {
                    BinOp::Add
                    | BinOp::Sub
                    | BinOp::Mul
                    | BinOp::Div
                    | BinOp::Mod
                    | BinOp::Pow => VhdlType::combine_arith(l, r),
                    BinOp::Shl | BinOp::Shr => l,
                    BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor => {
                        VhdlType::combine(l, r).ok_or_else(|| {
                            error_unsupported_type(
                                "cannot combine operand types of bitwise operation",
                                span,
                            )
                        })?
                    }
                };
                InferredType::Std(out)
            }
            Expr::Logic { terms, .. } => {
                for term in terms {
                    self.expr(term)?;
                }
                InferredType::Std(Boolean)
            }
            Expr::Not { operand, .. } => {
                self.expr(operand)?;
                InferredType::Std(Boolean)
            }
            Expr::Compare { lhs, rhs, .. } => {
                let l = self.expr(lhs)?;
                let r = self.expr(rhs)?;
                match (l, r) {
                    (InferredType::Enum(a), InferredType::Enum(b)) if a == b => {}
                    (InferredType::Std(a), InferredType::Std(b)) => {
                        VhdlType::combine(a, b).ok_or_else(|| {
                            error_unsupported_type(
                                "cannot unify comparison operand types",
                                span,
                            )
                        })?;
                    }
                    _ => {
                        return Err(error_unsupported_type(
                            "cannot unify comparison operand types",
                            span,
                        )
                        .into())
                    }
                }
                InferredType::Std(Boolean)
            }
            Expr::Index { base, index, .. } => {
                self.std(index)?;
                if let Some(mem_id) = self.memory_base(base) {
                    let mem = self.design.memories.get(mem_id);
                    if !mem.decl && mem.rom.is_none() {
                        return Err(error_list_element_not_unique(
                            self.interner.resolve(mem.name),
                            span,
                        )
                        .into());
                    }
                    let elem = if mem.elem_signed {
                        Signed(mem.elem_width)
                    } else {
                        Unsigned(mem.elem_width)
                    };
                    self.ann.types.insert(base, InferredType::Std(elem));
                    InferredType::Std(elem)
                } else {
                    let bt = self.std(base)?;
                    if !bt.is_vector() {
                        return Err(error_unsupported_type(
                            "subscript of a non-vector value",
                            span,
                        )
                        .into());
                    }
                    InferredType::Std(StdLogic)
                }
            }
            Expr::Slice {
                base, upper, lower, ..
            } => {
                let bt = self.std(base)?;
                let hi = match bt.size() {
                    Some(width) => {
                        let hi = self.slice_bound(upper, i64::from(width), span)?;
                        if hi > i64::from(width) {
                            return Err(error_unsupported_type(
                                "slice bounds outside the operand",
                                span,
                            )
                            .into());
                        }
                        hi
                    }
                    // A constant operand carries no declared width, so the
                    // upper bound must be explicit. The bits are extracted
                    // at emission.
                    None if eval(self.process, base).is_some() => {
                        let Some(up) = upper else {
                            return Err(error_non_constant_bound(
                                "slice of a constant without an upper bound",
                                span,
                            )
                            .into());
                        };
                        self.slice_bound(Some(up), 0, span)?
                    }
                    None => {
                        return Err(
                            error_unsupported_type("slice of a non-vector value", span).into()
                        )
                    }
                };
                let lo = self.slice_bound(lower, 0, span)?;
                if lo < 0 || hi < lo {
                    return Err(
                        error_unsupported_type("slice bounds outside the operand", span).into(),
                    );
                }
                let w = (hi - lo) as u32;
                InferredType::Std(match bt {
                    Signed(_) => Signed(w),
                    _ => Unsigned(w),
                })
            }
            Expr::Concat { parts, .. } => {
                let mut width = 0;
                for part in parts {
                    width += match self.std(part)? {
                        StdLogic => 1,
                        Unsigned(n) | Signed(n) => n,
                        _ => {
                            return Err(error_unsupported_type(
                                "unsized operand in concatenation",
                                self.process.exprs[part].span(),
                            )
                            .into())
                        }
                    };
                }
                InferredType::Std(Unsigned(width))
            }
            Expr::Edge { .. } => InferredType::Std(Boolean),
            Expr::Call { func, args, .. } => {
                for arg in args {
                    self.expr(arg)?;
                }
                let Some(Object::Callable(id)) = self.process.lookup(func) else {
                    return Err(error_unsupported_type(
                        format!("`{}` is not a callable", self.interner.resolve(func)),
                        span,
                    )
                    .into());
                };
                let callee = self.design.callables.get(id);
                let ret = callee.ret.ok_or_else(|| {
                    error_not_supported("calling a procedure in an expression", span)
                })?;
                InferredType::Std(VhdlType::from_shape(ret))
            }
        };
        Ok(ty)
    }

    fn name_type(&self, name: Ident, span: Span) -> TranslateResult<InferredType> {
        if self.ann.is_loop_var(name) {
            return Ok(InferredType::Std(VhdlType::Integer));
        }
        if let Some(shape) = self.process.var_shape(name) {
            return Ok(InferredType::Std(VhdlType::from_shape(shape)));
        }
        match self.process.lookup(name) {
            Some(Object::Signal(id)) => {
                let sig = self.design.signals.get(id);
                Ok(match sig.category {
                    SignalCategory::Enum(ty) => InferredType::Enum(ty),
                    other => InferredType::Std(
                        VhdlType::from_signal(other).ok_or_else(|| {
                            error_unsupported_type("cannot classify signal type", span)
                        })?,
                    ),
                })
            }
            Some(Object::Const(_)) => Ok(InferredType::Std(VhdlType::Integer)),
            Some(Object::EnumMember { ty, .. }) => Ok(InferredType::Enum(ty)),
            Some(Object::Memory(_)) | Some(Object::Enum(_)) | Some(Object::Callable(_)) => {
                Err(error_unsupported_type(
                    format!(
                        "`{}` cannot be used as a value here",
                        self.interner.resolve(name)
                    ),
                    span,
                )
                .into())
            }
            None => Err(error_unsupported_type(
                format!(
                    "`{}` does not resolve to a design object",
                    self.interner.resolve(name)
                ),
                span,
            )
            .into()),
        }
    }

    fn memory_base(&self, base: ExprId) -> Option<agate_model::MemoryId> {
        if let Expr::Name { name, .. } = self.process.exprs[base] {
            if let Some(Object::Memory(id)) = self.process.lookup(name) {
                return Some(id);
            }
        }
        None
    }

    fn slice_bound(
        &self,
        bound: Option<ExprId>,
        default: i64,
        span: Span,
    ) -> TranslateResult<i64> {
        match bound {
            None => Ok(default),
            Some(b) => eval(self.process, b).ok_or_else(|| {
                error_non_constant_bound("slice bound is not a constant", span).into()
            }),
        }
    }

    /// Negative-capable vector operands are only defined for a small set of
    /// operators; anything else cannot be mapped.
    fn check_signed_operand(
        &self,
        op: BinOp,
        l: VhdlType,
        r: VhdlType,
        span: Span,
    ) -> TranslateResult<()> {
        let signed = matches!(l, VhdlType::Signed(_)) || matches!(r, VhdlType::Signed(_));
        let allowed = matches!(
            op,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::BitAnd | BinOp::BitOr
        );
        if signed && !allowed {
            return Err(error_not_supported(
                "this operator on a negative-capable vector operand",
                span,
            )
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agate_model::{CmpOp, IfArm, ProcessKind, RangeDir, Signal, SignalId};

    struct Fixture {
        design: Design,
        interner: Interner,
    }

    fn fixture() -> Fixture {
        let mut interner = Interner::new();
        let design = Design::new(interner.intern("top"));
        Fixture { design, interner }
    }

    fn vector_signal(f: &mut Fixture, name: &str, width: u32, signed: bool) -> SignalId {
        let ident = f.interner.intern(name);
        f.design.signals.push(Signal {
            name: Some(ident),
            category: SignalCategory::Vector { width, signed },
            value: 0,
            driven: true,
            read: true,
            span: Span::DUMMY,
        })
    }

    fn lit(p: &mut Process, v: i64) -> ExprId {
        p.exprs.push(Expr::Literal {
            value: v,
            span: Span::DUMMY,
        })
    }

    fn name(p: &mut Process, n: Ident) -> ExprId {
        p.exprs.push(Expr::Name {
            name: n,
            span: Span::DUMMY,
        })
    }

    #[test]
    fn literal_is_integer() {
        let f = fixture();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        let e = lit(&mut p, 5);
        p.body.push(Stmt::Assign {
            lhs: e,
            sig_assign: false,
            op: None,
            value: e,
            span: Span::DUMMY,
        });
        let ann = annotate_process(&f.design, &p, &f.interner).unwrap();
        assert_eq!(ann.ty(e), Some(InferredType::Std(VhdlType::Integer)));
    }

    #[test]
    fn vector_arithmetic_keeps_width() {
        let mut f = fixture();
        let sid = vector_signal(&mut f, "count", 8, false);
        let n = f.interner.get("count").unwrap();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        p.symbols.insert(n, Object::Signal(sid));
        let a = name(&mut p, n);
        let b = lit(&mut p, 1);
        let sum = p.exprs.push(Expr::Binary {
            op: BinOp::Add,
            lhs: a,
            rhs: b,
            span: Span::DUMMY,
        });
        p.body.push(Stmt::Assign {
            lhs: a,
            sig_assign: true,
            op: None,
            value: sum,
            span: Span::DUMMY,
        });
        let ann = annotate_process(&f.design, &p, &f.interner).unwrap();
        assert_eq!(ann.ty(sum), Some(InferredType::Std(VhdlType::Unsigned(8))));
    }

    #[test]
    fn comparison_yields_boolean() {
        let mut f = fixture();
        let sid = vector_signal(&mut f, "x", 4, false);
        let n = f.interner.get("x").unwrap();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        p.symbols.insert(n, Object::Signal(sid));
        let a = name(&mut p, n);
        let b = lit(&mut p, 3);
        let cmp = p.exprs.push(Expr::Compare {
            op: CmpOp::Lt,
            lhs: a,
            rhs: b,
            span: Span::DUMMY,
        });
        p.body.push(Stmt::If {
            arms: vec![IfArm {
                test: cmp,
                body: vec![Stmt::Pass { span: Span::DUMMY }],
                span: Span::DUMMY,
            }],
            else_body: None,
            span: Span::DUMMY,
        });
        let ann = annotate_process(&f.design, &p, &f.interner).unwrap();
        assert_eq!(ann.ty(cmp), Some(InferredType::Std(VhdlType::Boolean)));
    }

    #[test]
    fn subscript_yields_std_logic() {
        let mut f = fixture();
        let sid = vector_signal(&mut f, "v", 8, false);
        let n = f.interner.get("v").unwrap();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        p.symbols.insert(n, Object::Signal(sid));
        let base = name(&mut p, n);
        let idx = lit(&mut p, 2);
        let bit = p.exprs.push(Expr::Index {
            base,
            index: idx,
            span: Span::DUMMY,
        });
        p.body.push(Stmt::Assign {
            lhs: bit,
            sig_assign: true,
            op: None,
            value: idx,
            span: Span::DUMMY,
        });
        let ann = annotate_process(&f.design, &p, &f.interner).unwrap();
        assert_eq!(ann.ty(bit), Some(InferredType::Std(VhdlType::StdLogic)));
    }

    #[test]
    fn slice_width_is_upper_minus_lower() {
        let mut f = fixture();
        let sid = vector_signal(&mut f, "v", 8, true);
        let n = f.interner.get("v").unwrap();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        p.symbols.insert(n, Object::Signal(sid));
        let base = name(&mut p, n);
        let hi = lit(&mut p, 6);
        let lo = lit(&mut p, 2);
        let slice = p.exprs.push(Expr::Slice {
            base,
            upper: Some(hi),
            lower: Some(lo),
            span: Span::DUMMY,
        });
        p.body.push(Stmt::Assign {
            lhs: base,
            sig_assign: true,
            op: None,
            value: slice,
            span: Span::DUMMY,
        });
        let ann = annotate_process(&f.design, &p, &f.interner).unwrap();
        assert_eq!(ann.ty(slice), Some(InferredType::Std(VhdlType::Signed(4))));
    }

    #[test]
    fn slice_of_a_constant_is_typed_by_its_bounds() {
        let mut f = fixture();
        let sid = vector_signal(&mut f, "q", 4, false);
        let n = f.interner.get("q").unwrap();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        p.symbols.insert(n, Object::Signal(sid));
        let lhs = name(&mut p, n);
        let base = lit(&mut p, 0b1011_0101);
        let hi = lit(&mut p, 4);
        let slice = p.exprs.push(Expr::Slice {
            base,
            upper: Some(hi),
            lower: None,
            span: Span::DUMMY,
        });
        p.body.push(Stmt::Assign {
            lhs,
            sig_assign: true,
            op: None,
            value: slice,
            span: Span::DUMMY,
        });
        let ann = annotate_process(&f.design, &p, &f.interner).unwrap();
        assert_eq!(ann.ty(slice), Some(InferredType::Std(VhdlType::Unsigned(4))));
    }

    #[test]
    fn constant_slice_needs_an_explicit_upper_bound() {
        let mut f = fixture();
        let sid = vector_signal(&mut f, "q", 4, false);
        let n = f.interner.get("q").unwrap();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        p.symbols.insert(n, Object::Signal(sid));
        let lhs = name(&mut p, n);
        let base = lit(&mut p, 0b1011_0101);
        let slice = p.exprs.push(Expr::Slice {
            base,
            upper: None,
            lower: None,
            span: Span::DUMMY,
        });
        p.body.push(Stmt::Assign {
            lhs,
            sig_assign: true,
            op: None,
            value: slice,
            span: Span::DUMMY,
        });
        let err = annotate_process(&f.design, &p, &f.interner).unwrap_err();
        assert!(format!("{err}").contains("E307"));
    }

    #[test]
    fn non_constant_slice_bound_rejected() {
        let mut f = fixture();
        let sid = vector_signal(&mut f, "v", 8, false);
        let iid = vector_signal(&mut f, "i", 3, false);
        let n = f.interner.get("v").unwrap();
        let ni = f.interner.get("i").unwrap();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        p.symbols.insert(n, Object::Signal(sid));
        p.symbols.insert(ni, Object::Signal(iid));
        let base = name(&mut p, n);
        let hi = name(&mut p, ni);
        let slice = p.exprs.push(Expr::Slice {
            base,
            upper: Some(hi),
            lower: None,
            span: Span::DUMMY,
        });
        p.body.push(Stmt::Assign {
            lhs: base,
            sig_assign: true,
            op: None,
            value: slice,
            span: Span::DUMMY,
        });
        let err = annotate_process(&f.design, &p, &f.interner).unwrap_err();
        assert!(format!("{err}").contains("E307"));
    }

    #[test]
    fn non_unit_step_rejected() {
        let f = fixture();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        let stop = lit(&mut p, 8);
        let step = lit(&mut p, 2);
        p.body.push(Stmt::For {
            var: Ident::from_raw(9),
            dir: RangeDir::Ascending,
            start: None,
            stop: Some(stop),
            step: Some(step),
            body: vec![],
            span: Span::DUMMY,
        });
        let err = annotate_process(&f.design, &p, &f.interner).unwrap_err();
        assert!(format!("{err}").contains("E308"));
    }

    #[test]
    fn loop_var_is_integer_and_marked() {
        let f = fixture();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        let var = Ident::from_raw(9);
        let stop = lit(&mut p, 8);
        let use_var = name(&mut p, var);
        p.body.push(Stmt::For {
            var,
            dir: RangeDir::Ascending,
            start: None,
            stop: Some(stop),
            step: None,
            body: vec![Stmt::Assign {
                lhs: use_var,
                sig_assign: false,
                op: None,
                value: use_var,
                span: Span::DUMMY,
            }],
            span: Span::DUMMY,
        });
        let ann = annotate_process(&f.design, &p, &f.interner).unwrap();
        assert!(ann.is_loop_var(var));
        assert_eq!(ann.ty(use_var), Some(InferredType::Std(VhdlType::Integer)));
    }

    #[test]
    fn signed_modulo_not_supported() {
        let mut f = fixture();
        let sid = vector_signal(&mut f, "s", 8, true);
        let n = f.interner.get("s").unwrap();
        let mut p = Process::new(Ident::from_raw(0), ProcessKind::Combinational);
        p.symbols.insert(n, Object::Signal(sid));
        let a = name(&mut p, n);
        let b = lit(&mut p, 3);
        let m = p.exprs.push(Expr::Binary {
            op: BinOp::Mod,
            lhs: a,
            rhs: b,
            span: Span::DUMMY,
        });
        p.body.push(Stmt::Assign {
            lhs: a,
            sig_assign: true,
            op: None,
            value: m,
            span: Span::DUMMY,
        });
        let err = annotate_process(&f.design, &p, &f.interner).unwrap_err();
        assert!(format!("{err}").contains("E303"));
    }
}
