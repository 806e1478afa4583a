//! Code generation over annotated process trees.
//!
//! One [`ProcessEmitter`] drives statement and expression emission for every
//! process kind. Expressions are rendered fully parenthesized with their
//! original evaluation order; a small emission context tells leaf nodes when
//! the surrounding syntax needs a boolean, an integer, or a `std_logic`
//! value so the correct coercion (`(x = '1')`, `to_integer(x)`,
//! `to_std_logic(...)`) can be inserted.

use crate::errors::{error_not_supported, error_sensitivity, TranslateError, TranslateResult};
use crate::eval::eval;
use crate::infer::{Annotations, InferredType};
use crate::types::VhdlType;
use crate::writer::CodeWriter;
use agate_common::{bin_str, Ident, Interner, Span};
use agate_model::{
    BinOp, CallableId, CmpOp, Design, EdgeKind, Expr, ExprId, IfArm, LogicOp, MemoryId, Object,
    Process, ProcessKind, RangeDir, SensItem, SignalId, Stmt, UnaryOp, VarShape, WaitSpec,
};
use std::collections::HashSet;

/// What the surrounding syntax expects from an emitted expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ctx {
    /// No expectation; the node's natural rendering is used.
    Any,
    /// A VHDL `boolean` condition.
    Bool,
    /// A plain `integer` value.
    Int,
    /// A `std_logic` value.
    Std,
}

/// Emits one process (or subprogram) into a writer.
pub(crate) struct ProcessEmitter<'a, 'm> {
    pub design: &'a Design,
    pub interner: &'a Interner,
    pub process: &'a Process,
    pub ann: &'a Annotations,
    /// Memories referenced by emitted code, in first-use order; the
    /// declaration writer declares exactly these.
    pub used_memories: &'m mut Vec<MemoryId>,
}

impl<'a, 'm> ProcessEmitter<'a, 'm> {
    /// Emits the concurrent statement for this process.
    pub fn emit(&mut self, w: &mut CodeWriter) -> TranslateResult<()> {
        match self.process.kind {
            ProcessKind::SimpleCombinational => self.emit_continuous(w),
            ProcessKind::Combinational => self.emit_combinational(w),
            ProcessKind::Sequential | ProcessKind::CustomSensitivity => self.emit_sequential(w),
            ProcessKind::Initial => self.emit_initial(w),
            ProcessKind::Function | ProcessKind::Procedure => self.emit_subprogram(w),
        }
    }

    // ----- process kinds -------------------------------------------------

    fn emit_continuous(&mut self, w: &mut CodeWriter) -> TranslateResult<()> {
        let process = self.process;
        for stmt in &process.body {
            match stmt {
                Stmt::Assign {
                    lhs,
                    sig_assign,
                    op,
                    value,
                    ..
                } => self.assign(*lhs, *sig_assign, *op, *value, w)?,
                other => {
                    return Err(error_not_supported(
                        "only assignments in a continuous-assignment block",
                        other.span(),
                    )
                    .into())
                }
            }
        }
        Ok(())
    }

    fn emit_combinational(&mut self, w: &mut CodeWriter) -> TranslateResult<()> {
        let process = self.process;
        let mut names = Vec::new();
        for item in &process.sensitivity {
            match item {
                SensItem::Signal(id) => names.push(self.signal_name(*id)?),
                _ => {
                    return Err(error_sensitivity(
                        "combinational sensitivity list may only contain plain signals",
                        process.span,
                    )
                    .into())
                }
            }
        }
        let label = self.text(process.name);
        w.line(&format!("{label}: process ({}) is", names.join(", ")));
        self.local_decls(w);
        w.line("begin");
        w.indent();
        self.stmts(&process.body, w)?;
        w.dedent();
        w.line(&format!("end process {label};"));
        Ok(())
    }

    fn emit_sequential(&mut self, w: &mut CodeWriter) -> TranslateResult<()> {
        let process = self.process;
        let label = self.text(process.name);
        match self.classify_sensitivity()? {
            SensClass::Delay(ns) => {
                w.line(&format!("{label}: process is"));
                self.local_decls(w);
                w.line("begin");
                w.indent();
                self.stmts(&process.body, w)?;
                w.line(&format!("wait for {ns} ns;"));
                w.dedent();
                w.line(&format!("end process {label};"));
            }
            SensClass::Plain(ids) => {
                let names = self.signal_names(&ids)?;
                w.line(&format!("{label}: process ({}) is", names.join(", ")));
                self.local_decls(w);
                w.line("begin");
                w.indent();
                self.stmts(&process.body, w)?;
                w.dedent();
                w.line(&format!("end process {label};"));
            }
            SensClass::Edges(edges) if edges.len() == 1 => {
                let (sig, kind) = edges[0];
                let name = self.signal_name(sig)?;
                w.line(&format!("{label}: process ({name}) is"));
                self.local_decls(w);
                w.line("begin");
                w.indent();
                w.line(&format!("if {} then", edge_call(kind, &name)));
                w.indent();
                self.stmts(&process.body, w)?;
                w.dedent();
                w.line("end if;");
                w.dedent();
                w.line(&format!("end process {label};"));
            }
            SensClass::Edges(edges) => self.emit_async_reset(&edges, &label, w)?,
        }
        Ok(())
    }

    /// Two or more edge-waiters model an asynchronous-reset pattern: the
    /// body's outermost conditional tests each asynchronous edge and its
    /// final `else` is rewritten to an `elsif` ORing the remaining
    /// (synchronous) edges. The sensitivity list reduces to the plain
    /// signals and the whole-body edge guard no longer applies.
    fn emit_async_reset(
        &mut self,
        edges: &[(SignalId, EdgeKind)],
        label: &str,
        w: &mut CodeWriter,
    ) -> TranslateResult<()> {
        let process = self.process;
        let span = process.span;
        let Some((Stmt::If {
            arms,
            else_body: Some(else_body),
            ..
        }, rest)) = process.body.split_last()
        else {
            return Err(error_sensitivity(
                "asynchronous-reset process must end in a conditional with a final else",
                span,
            )
            .into());
        };

        let mut tested = Vec::new();
        for arm in arms {
            let Expr::Edge { signal, edge, .. } = process.exprs[arm.test] else {
                return Err(error_sensitivity(
                    "cannot locate an edge test in the asynchronous-reset conditional",
                    arm.span,
                )
                .into());
            };
            let Some(Object::Signal(sig)) = process.lookup(signal) else {
                return Err(error_sensitivity(
                    "edge test on a name that is not a signal",
                    arm.span,
                )
                .into());
            };
            if !edges.iter().any(|&(s, k)| s == sig && k == edge) {
                return Err(error_sensitivity(
                    "edge test does not appear in the sensitivity list",
                    arm.span,
                )
                .into());
            }
            tested.push((sig, edge));
        }

        let mut remaining = Vec::new();
        let mut plain = Vec::new();
        for &(sig, kind) in edges {
            let name = self.signal_name(sig)?;
            let covered = tested.iter().any(|&(s, k)| s == sig && k == kind);
            if !covered {
                remaining.push(edge_call(kind, &name));
            }
            plain.push(name);
        }
        let clause = if remaining.is_empty() {
            None
        } else {
            Some(remaining.join(" or "))
        };

        w.line(&format!("{label}: process ({}) is", plain.join(", ")));
        self.local_decls(w);
        w.line("begin");
        w.indent();
        self.stmts(rest, w)?;
        self.if_stmt(arms, Some(else_body.as_slice()), clause.as_deref(), w)?;
        w.dedent();
        w.line(&format!("end process {label};"));
        Ok(())
    }

    fn emit_initial(&mut self, w: &mut CodeWriter) -> TranslateResult<()> {
        let process = self.process;
        let label = self.text(process.name);
        w.line(&format!("{label}: process is"));
        self.local_decls(w);
        w.line("begin");
        w.indent();
        self.stmts(&process.body, w)?;
        w.line("wait;");
        w.dedent();
        w.line(&format!("end process {label};"));
        Ok(())
    }

    /// Emits a function or procedure declaration.
    pub fn emit_subprogram(&mut self, w: &mut CodeWriter) -> TranslateResult<()> {
        let process = self.process;
        let name = self.text(process.name);
        let mut params = Vec::new();
        for arg in &process.args {
            let shape = process.var_shape(*arg).ok_or_else(|| {
                TranslateError::internal("subprogram argument without a declared shape")
            })?;
            let dir = if process.kind == ProcessKind::Function {
                "in"
            } else {
                let read = process.inputs.contains(arg);
                let written = process.outputs.contains(arg);
                match (read, written) {
                    (true, true) => "inout",
                    (false, true) => "out",
                    _ => "in",
                }
            };
            params.push(format!(
                "{}: {} {}",
                self.text(*arg),
                dir,
                VhdlType::from_shape(shape).to_str(false)
            ));
        }
        let params = params.join("; ");
        if process.kind == ProcessKind::Function {
            let ret = process.ret.ok_or_else(|| {
                TranslateError::internal("function descriptor without a return shape")
            })?;
            w.line(&format!(
                "function {name}({params}) return {} is",
                VhdlType::from_shape(ret).to_str(false)
            ));
        } else {
            w.line(&format!("procedure {name}({params}) is"));
        }
        self.local_decls(w);
        w.line("begin");
        w.indent();
        self.stmts(&process.body, w)?;
        w.dedent();
        if process.kind == ProcessKind::Function {
            w.line(&format!("end function {name};"));
        } else {
            w.line(&format!("end procedure {name};"));
        }
        Ok(())
    }

    /// Local object declarations between the header and `begin`.
    fn local_decls(&mut self, w: &mut CodeWriter) {
        let process = self.process;
        w.indent();
        if process.uses_text_output {
            w.line("variable L: line;");
        }
        for (name, shape) in &process.vars {
            if process.args.contains(name) || self.ann.is_loop_var(*name) {
                continue;
            }
            w.line(&format!(
                "variable {}: {};",
                self.text(*name),
                VhdlType::from_shape(*shape).to_str(true)
            ));
        }
        w.dedent();
    }

    // ----- statements ----------------------------------------------------

    fn stmts(&mut self, list: &[Stmt], w: &mut CodeWriter) -> TranslateResult<()> {
        for stmt in list {
            self.stmt(stmt, w)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt, w: &mut CodeWriter) -> TranslateResult<()> {
        let process = self.process;
        match stmt {
            Stmt::Assign {
                lhs,
                sig_assign,
                op,
                value,
                ..
            } => self.assign(*lhs, *sig_assign, *op, *value, w)?,
            Stmt::If {
                arms, else_body, ..
            } => self.if_stmt(arms, else_body.as_deref(), None, w)?,
            Stmt::For {
                var,
                dir,
                start,
                stop,
                body,
                ..
            } => {
                let start_v = self.bound(*start, 0)?;
                let stop_v = self.bound(*stop, 0)?;
                let var = self.text(*var);
                match dir {
                    RangeDir::Ascending => {
                        w.line(&format!("for {var} in {start_v} to {} loop", stop_v - 1))
                    }
                    RangeDir::Descending => {
                        w.line(&format!("for {var} in {} downto {stop_v} loop", start_v - 1))
                    }
                }
                w.indent();
                self.stmts(body, w)?;
                w.dedent();
                w.line("end loop;");
            }
            Stmt::While { cond, body, .. } => {
                let cond = self.expr(*cond, Ctx::Bool)?;
                w.line(&format!("while {cond} loop"));
                w.indent();
                self.stmts(body, w)?;
                w.dedent();
                w.line("end loop;");
            }
            Stmt::Break { .. } => w.line("exit;"),
            Stmt::Continue { .. } => w.line("next;"),
            Stmt::Return { value, .. } => match value {
                Some(value) if process.kind == ProcessKind::Function => {
                    let ret = process.ret.ok_or_else(|| {
                        TranslateError::internal("function descriptor without a return shape")
                    })?;
                    let e =
                        self.converted_rhs(InferredType::Std(VhdlType::from_shape(ret)), *value)?;
                    w.line(&format!("return {e};"));
                }
                _ => w.line("return;"),
            },
            Stmt::CallProc { func, args, .. } => {
                let call = self.call_text(*func, args)?;
                w.line(&format!("{call};"));
            }
            Stmt::Print { args, .. } => {
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        w.line("write(L, string'(\" \"));");
                    }
                    let item = self.print_item(*arg)?;
                    w.line(&format!("write(L, {item});"));
                }
                w.line("writeline(output, L);");
            }
            Stmt::Finish { .. } => {
                w.line("assert False report \"End of Simulation\" severity Failure;")
            }
            Stmt::Wait { spec, .. } => match spec {
                WaitSpec::Delay(e) => {
                    let e = self.expr(*e, Ctx::Int)?;
                    w.line(&format!("wait for {e} ns;"));
                }
                WaitSpec::EdgeList(edges) => {
                    let mut parts = Vec::new();
                    for (name, kind) in edges {
                        let name = self.bound_signal_text(*name)?;
                        parts.push(edge_call(*kind, &name));
                    }
                    w.line(&format!("wait until {};", parts.join(" or ")));
                }
                WaitSpec::Level(e) => {
                    let e = self.expr(*e, Ctx::Bool)?;
                    w.line(&format!("wait until {e};"));
                }
            },
            Stmt::Pass { .. } => w.line("null;"),
        }
        Ok(())
    }

    fn assign(
        &mut self,
        lhs: ExprId,
        sig_assign: bool,
        op: Option<BinOp>,
        value: ExprId,
        w: &mut CodeWriter,
    ) -> TranslateResult<()> {
        let assign_op = if sig_assign { "<=" } else { ":=" };
        if op.is_none() {
            if let Expr::Index { base, index, .. } = self.process.exprs[value] {
                if let Some(mem_id) = self.memory_base(base) {
                    let mem = self.design.memories.get(mem_id);
                    if let Some(rom) = &mem.rom {
                        return self.rom_case(lhs, assign_op, rom, index, w);
                    }
                }
            }
        }
        let lhs_ty = self.ty(lhs)?;
        let lhs_s = self.expr_raw(lhs, Ctx::Any)?;
        let rhs_s = match op {
            Some(aug) => self.aug_rhs(lhs_ty, &lhs_s, aug, value)?,
            None => self.converted_rhs(lhs_ty, value)?,
        };
        w.line(&format!("{lhs_s} {assign_op} {rhs_s};"));
        Ok(())
    }

    /// Rewrites a read-only table lookup into a `case` statement: one
    /// alternative per table entry in table order, the last entry aliased
    /// to `others`. An index wider than the table therefore reaches only
    /// the last tabulated value.
    fn rom_case(
        &mut self,
        lhs: ExprId,
        assign_op: &str,
        rom: &[i64],
        index: ExprId,
        w: &mut CodeWriter,
    ) -> TranslateResult<()> {
        if rom.is_empty() {
            return Err(error_not_supported(
                "lookup in an empty read-only table",
                self.process.exprs[index].span(),
            )
            .into());
        }
        let lhs_ty = self.ty(lhs)?;
        let lhs_s = self.expr_raw(lhs, Ctx::Any)?;
        let sel = self.expr(index, Ctx::Int)?;
        w.line(&format!("case {sel} is"));
        w.indent();
        for (i, value) in rom.iter().enumerate() {
            if i == rom.len() - 1 {
                w.line("when others =>");
            } else {
                w.line(&format!("when {i} =>"));
            }
            let lit = self.sized_literal(lhs_ty, *value, index)?;
            w.indent();
            w.line(&format!("{lhs_s} {assign_op} {lit};"));
            w.dedent();
        }
        w.dedent();
        w.line("end case;");
        Ok(())
    }

    /// Formats a constant per the assignment target's descriptor: a
    /// character literal for `std_logic`, decimal for `integer`, a sized
    /// binary string for vectors.
    fn sized_literal(
        &self,
        target: InferredType,
        value: i64,
        at: ExprId,
    ) -> TranslateResult<String> {
        match target {
            InferredType::Std(VhdlType::StdLogic) => {
                if !(0..=1).contains(&value) {
                    return Err(error_not_supported(
                        "a multi-bit value for a single-bit target",
                        self.process.exprs[at].span(),
                    )
                    .into());
                }
                Ok(format!("'{value}'"))
            }
            InferredType::Std(VhdlType::Integer) => Ok(value.to_string()),
            InferredType::Std(VhdlType::Unsigned(n)) | InferredType::Std(VhdlType::Signed(n)) => {
                Ok(format!("\"{}\"", bin_str(value, n)))
            }
            _ => Err(error_not_supported(
                "a sized constant for a non-numeric target",
                self.process.exprs[at].span(),
            )
            .into()),
        }
    }

    /// Renders the right-hand side of an assignment, inserting the explicit
    /// conversion the target type requires.
    fn converted_rhs(&mut self, target: InferredType, value: ExprId) -> TranslateResult<String> {
        let InferredType::Std(lt) = target else {
            return self.expr(value, Ctx::Any);
        };
        match lt {
            VhdlType::StdLogic => self.expr(value, Ctx::Std),
            VhdlType::Boolean => self.expr(value, Ctx::Bool),
            VhdlType::Integer => self.expr(value, Ctx::Int),
            VhdlType::Unsigned(n) => {
                let rt = self.ty(value)?;
                match rt {
                    InferredType::Std(VhdlType::Unsigned(m)) if m == n => {
                        self.expr(value, Ctx::Any)
                    }
                    InferredType::Std(VhdlType::Unsigned(_)) => {
                        Ok(format!("resize({}, {n})", self.expr(value, Ctx::Any)?))
                    }
                    InferredType::Std(VhdlType::Integer) => {
                        Ok(format!("to_unsigned({}, {n})", self.expr(value, Ctx::Int)?))
                    }
                    InferredType::Std(VhdlType::Signed(_)) => Ok(format!(
                        "unsigned(resize({}, {n}))",
                        self.expr(value, Ctx::Any)?
                    )),
                    _ => Err(error_not_supported(
                        "assigning a non-numeric value to a vector",
                        self.process.exprs[value].span(),
                    )
                    .into()),
                }
            }
            VhdlType::Signed(n) => {
                let rt = self.ty(value)?;
                match rt {
                    InferredType::Std(VhdlType::Signed(m)) if m == n => self.expr(value, Ctx::Any),
                    InferredType::Std(VhdlType::Signed(_)) => {
                        Ok(format!("resize({}, {n})", self.expr(value, Ctx::Any)?))
                    }
                    InferredType::Std(VhdlType::Integer) => {
                        Ok(format!("to_signed({}, {n})", self.expr(value, Ctx::Int)?))
                    }
                    InferredType::Std(VhdlType::Unsigned(_)) => Ok(format!(
                        "signed(resize({}, {n}))",
                        self.expr(value, Ctx::Any)?
                    )),
                    _ => Err(error_not_supported(
                        "assigning a non-numeric value to a vector",
                        self.process.exprs[value].span(),
                    )
                    .into()),
                }
            }
        }
    }

    /// Builds the right-hand side of an augmented assignment.
    fn aug_rhs(
        &mut self,
        lhs_ty: InferredType,
        lhs_s: &str,
        op: BinOp,
        value: ExprId,
    ) -> TranslateResult<String> {
        let rhs_ctx = match lhs_ty {
            InferredType::Std(VhdlType::StdLogic) => Ctx::Std,
            InferredType::Std(VhdlType::Boolean) => Ctx::Bool,
            _ => Ctx::Any,
        };
        let spelling = match op {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::BitAnd => "and",
            BinOp::BitOr => "or",
            BinOp::BitXor => "xor",
            BinOp::Shl => {
                return Ok(format!(
                    "shift_left({lhs_s}, {})",
                    self.expr(value, Ctx::Int)?
                ))
            }
            BinOp::Shr => {
                return Ok(format!(
                    "shift_right({lhs_s}, {})",
                    self.expr(value, Ctx::Int)?
                ))
            }
            BinOp::Div | BinOp::Mod | BinOp::Pow => {
                return Err(error_not_supported(
                    "this operator in an augmented assignment",
                    self.process.exprs[value].span(),
                )
                .into())
            }
        };
        Ok(format!(
            "({lhs_s} {spelling} {})",
            self.expr(value, rhs_ctx)?
        ))
    }

    /// Emits a multi-branch conditional as `if/elsif/else`, or as a `case`
    /// statement when every arm tests equality of one common variable
    /// against distinct constant or enumerated values. With `edge_clause`
    /// set (asynchronous-reset rewrite), the final `else` becomes an
    /// `elsif` over the given edge tests.
    fn if_stmt(
        &mut self,
        arms: &[IfArm],
        else_body: Option<&[Stmt]>,
        edge_clause: Option<&str>,
        w: &mut CodeWriter,
    ) -> TranslateResult<()> {
        if edge_clause.is_none() {
            if let Some(plan) = self.try_case(arms)? {
                return self.case_stmt(&plan, arms, else_body, w);
            }
        }
        for (i, arm) in arms.iter().enumerate() {
            let test = self.expr(arm.test, Ctx::Bool)?;
            if i == 0 {
                w.line(&format!("if {test} then"));
            } else {
                w.line(&format!("elsif {test} then"));
            }
            w.indent();
            self.stmts(&arm.body, w)?;
            w.dedent();
        }
        if let Some(body) = else_body {
            match edge_clause {
                Some(clause) => w.line(&format!("elsif {clause} then")),
                None => w.line("else"),
            }
            w.indent();
            self.stmts(body, w)?;
            w.dedent();
        }
        w.line("end if;");
        Ok(())
    }

    /// Checks whether an if-chain qualifies for `case` emission; returns
    /// the selector and one label per arm if so.
    fn try_case(&mut self, arms: &[IfArm]) -> TranslateResult<Option<CasePlan>> {
        if arms.is_empty() {
            return Ok(None);
        }
        let process = self.process;
        let mut selector: Option<(Ident, ExprId)> = None;
        let mut labels = Vec::new();
        let mut seen = HashSet::new();
        for arm in arms {
            let Expr::Compare {
                op: CmpOp::Eq,
                lhs,
                rhs,
                ..
            } = process.exprs[arm.test]
            else {
                return Ok(None);
            };
            let (name_id, const_id) = if self.is_plain_name(lhs) && self.case_label(rhs).is_some()
            {
                (lhs, rhs)
            } else if self.is_plain_name(rhs) && self.case_label(lhs).is_some() {
                (rhs, lhs)
            } else {
                return Ok(None);
            };
            let Expr::Name { name, .. } = process.exprs[name_id] else {
                return Ok(None);
            };
            match selector {
                None => selector = Some((name, name_id)),
                Some((sel, _)) if sel == name => {}
                Some(_) => return Ok(None),
            }
            let Some((label, value)) = self.case_label(const_id) else {
                return Ok(None);
            };
            if !seen.insert(value) {
                return Ok(None);
            }
            labels.push(label);
        }
        let (_, sel_id) = match selector {
            Some(s) => s,
            None => return Ok(None),
        };
        Ok(Some(CasePlan {
            selector: sel_id,
            labels,
        }))
    }

    fn case_stmt(
        &mut self,
        plan: &CasePlan,
        arms: &[IfArm],
        else_body: Option<&[Stmt]>,
        w: &mut CodeWriter,
    ) -> TranslateResult<()> {
        let sel_ctx = match self.ty(plan.selector)? {
            InferredType::Std(t) if t.is_vector() => Ctx::Int,
            _ => Ctx::Any,
        };
        let sel = self.expr(plan.selector, sel_ctx)?;
        w.line(&format!("case {sel} is"));
        w.indent();
        for (arm, label) in arms.iter().zip(&plan.labels) {
            w.line(&format!("when {label} =>"));
            w.indent();
            self.stmts(&arm.body, w)?;
            w.dedent();
        }
        w.line("when others =>");
        w.indent();
        match else_body {
            Some(body) => self.stmts(body, w)?,
            None => w.line("null;"),
        }
        w.dedent();
        w.dedent();
        w.line("end case;");
        Ok(())
    }

    /// A name denoting a signal or local variable, usable as case selector.
    fn is_plain_name(&self, id: ExprId) -> bool {
        let Expr::Name { name, .. } = self.process.exprs[id] else {
            return false;
        };
        if self.ann.is_loop_var(name) || self.process.var_shape(name).is_some() {
            return true;
        }
        matches!(self.process.lookup(name), Some(Object::Signal(_)))
    }

    /// Renders a case alternative label for a constant-like node, together
    /// with the value used for the distinctness check.
    fn case_label(&self, id: ExprId) -> Option<(String, i64)> {
        match &self.process.exprs[id] {
            Expr::Literal { value, .. } => Some((value.to_string(), *value)),
            Expr::Name { name, .. } => match self.process.lookup(*name)? {
                Object::Const(v) => Some((v.to_string(), v)),
                Object::EnumMember { ty, index } => {
                    let member = self.design.enums.get(ty).member(index)?;
                    Some((self.interner.resolve(member).to_string(), i64::from(index)))
                }
                _ => None,
            },
            _ => None,
        }
    }

    // ----- expressions ---------------------------------------------------

    fn expr(&mut self, id: ExprId, ctx: Ctx) -> TranslateResult<String> {
        let raw = self.expr_raw(id, ctx)?;
        let ty = self.ty(id)?;
        Ok(coerce(raw, ty, ctx))
    }

    fn expr_raw(&mut self, id: ExprId, ctx: Ctx) -> TranslateResult<String> {
        let node = self.process.exprs[id].clone();
        let span = node.span();
        match node {
            Expr::Literal { value, .. } => {
                if ctx == Ctx::Std && (value == 0 || value == 1) {
                    Ok(format!("'{value}'"))
                } else {
                    Ok(value.to_string())
                }
            }
            Expr::BoolLit { value, .. } => Ok(if value { "True" } else { "False" }.to_string()),
            Expr::Name { name, .. } => self.name_text(name, ctx, span),
            Expr::Unary { op, operand, .. } => {
                let e = self.expr(operand, Ctx::Any)?;
                Ok(match op {
                    UnaryOp::Plus => format!("(+{e})"),
                    UnaryOp::Minus => format!("(-{e})"),
                    UnaryOp::Invert => format!("(not {e})"),
                })
            }
            Expr::Binary { op, lhs, rhs, .. } => match op {
                BinOp::Shl => Ok(format!(
                    "shift_left({}, {})",
                    self.expr(lhs, Ctx::Any)?,
                    self.expr(rhs, Ctx::Int)?
                )),
                BinOp::Shr => Ok(format!(
                    "shift_right({}, {})",
                    self.expr(lhs, Ctx::Any)?,
                    self.expr(rhs, Ctx::Int)?
                )),
                BinOp::Pow => Ok(format!(
                    "({} ** {})",
                    self.expr(lhs, Ctx::Int)?,
                    self.expr(rhs, Ctx::Int)?
                )),
                _ => {
                    let spelling = match op {
                        BinOp::Add => "+",
                        BinOp::Sub => "-",
                        BinOp::Mul => "*",
                        BinOp::Div => "/",
                        BinOp::Mod => "mod",
                        BinOp::BitAnd => "and",
                        BinOp::BitOr => "or",
                        BinOp::BitXor => "xor",
                        _ => unreachable!(),
                    };
                    Ok(format!(
                        "({} {spelling} {})",
                        self.expr(lhs, Ctx::Any)?,
                        self.expr(rhs, Ctx::Any)?
                    ))
                }
            },
            Expr::Logic { op, terms, .. } => {
                let spelling = match op {
                    LogicOp::And => " and ",
                    LogicOp::Or => " or ",
                };
                let mut parts = Vec::new();
                for term in terms {
                    parts.push(self.expr(term, Ctx::Bool)?);
                }
                Ok(format!("({})", parts.join(spelling)))
            }
            Expr::Not { operand, .. } => {
                Ok(format!("(not {})", self.expr(operand, Ctx::Bool)?))
            }
            Expr::Compare { op, lhs, rhs, .. } => self.compare(op, lhs, rhs),
            Expr::Index { base, index, .. } => {
                if let Some(mem_id) = self.memory_base(base) {
                    let mem = self.design.memories.get(mem_id);
                    if mem.rom.is_some() {
                        return Err(error_not_supported(
                            "a read-only table may only be the full right-hand side of an assignment",
                            span,
                        )
                        .into());
                    }
                    self.note_memory(mem_id);
                    Ok(format!(
                        "{}({})",
                        self.text(mem.name),
                        self.expr(index, Ctx::Int)?
                    ))
                } else {
                    Ok(format!(
                        "{}({})",
                        self.expr(base, Ctx::Any)?,
                        self.expr(index, Ctx::Int)?
                    ))
                }
            }
            Expr::Slice {
                base, upper, lower, ..
            } => {
                let lo = self.const_or_internal(lower, 0)?;
                let width = match self.ty(base)? {
                    InferredType::Std(t) => t.size(),
                    InferredType::Enum(_) => None,
                };
                match width {
                    Some(width) => {
                        let hi = self.const_or_internal(upper, i64::from(width))? - 1;
                        Ok(format!(
                            "{}({hi} downto {lo})",
                            self.expr(base, Ctx::Any)?
                        ))
                    }
                    // The operand is a constant without a declared width;
                    // extract the bits now and emit a sized literal.
                    None => {
                        let value = eval(self.process, base).ok_or_else(|| {
                            TranslateError::internal("unsized slice operand is not constant")
                        })?;
                        let hi = self.const_or_internal(upper, 0)?;
                        let bits = extract_bits(value, lo as u32, (hi - lo) as u32);
                        self.sized_literal(self.ty(id)?, bits, base)
                    }
                }
            }
            Expr::Concat { parts, .. } => {
                let mut rendered = Vec::new();
                for part in parts {
                    rendered.push(self.expr(part, Ctx::Std)?);
                }
                Ok(format!("unsigned'({})", rendered.join(" & ")))
            }
            Expr::Edge { signal, edge, .. } => {
                let name = self.bound_signal_text(signal)?;
                Ok(edge_call(edge, &name))
            }
            Expr::Call { func, args, .. } => self.call_text(func, &args),
        }
    }

    fn compare(&mut self, op: CmpOp, lhs: ExprId, rhs: ExprId) -> TranslateResult<String> {
        let lt = self.ty(lhs)?;
        let rt = self.ty(rhs)?;
        if let (InferredType::Std(a), InferredType::Std(b)) = (lt, rt) {
            let unified = VhdlType::combine(a, b).ok_or_else(|| {
                TranslateError::internal("comparison operands lost their common type")
            })?;
            let ctx = match unified {
                VhdlType::StdLogic => Ctx::Std,
                VhdlType::Integer => Ctx::Int,
                _ => Ctx::Any,
            };
            let mut l = self.expr(lhs, ctx)?;
            let mut r = self.expr(rhs, ctx)?;
            if let VhdlType::Signed(w) = unified {
                if matches!(a, VhdlType::Unsigned(_)) {
                    l = format!("signed(resize({l}, {w}))");
                }
                if matches!(b, VhdlType::Unsigned(_)) {
                    r = format!("signed(resize({r}, {w}))");
                }
            }
            Ok(format!("({l} {} {r})", op.vhdl()))
        } else {
            // Enum comparisons were unified during inference.
            let l = self.expr(lhs, Ctx::Any)?;
            let r = self.expr(rhs, Ctx::Any)?;
            Ok(format!("({l} {} {r})", op.vhdl()))
        }
    }

    fn call_text(&mut self, func: Ident, args: &[ExprId]) -> TranslateResult<String> {
        let callee = match self.process.lookup(func) {
            Some(Object::Callable(id)) => self.design.callables.get(id),
            _ => {
                return Err(TranslateError::internal(
                    "call target is not a callable after inference",
                ))
            }
        };
        let mut rendered = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            let ctx = match callee.args.get(i).and_then(|a| callee.var_shape(*a)) {
                Some(VarShape::Logic) => Ctx::Std,
                Some(VarShape::Int) => Ctx::Int,
                _ => Ctx::Any,
            };
            rendered.push(self.expr(*arg, ctx)?);
        }
        Ok(format!("{}({})", self.text(func), rendered.join(", ")))
    }

    fn name_text(&mut self, name: Ident, ctx: Ctx, span: Span) -> TranslateResult<String> {
        if self.ann.is_loop_var(name) || self.process.var_shape(name).is_some() {
            return Ok(self.text(name));
        }
        match self.process.lookup(name) {
            Some(Object::Signal(id)) => self.signal_name(id),
            Some(Object::Const(v)) => {
                if ctx == Ctx::Std && (v == 0 || v == 1) {
                    Ok(format!("'{v}'"))
                } else {
                    Ok(v.to_string())
                }
            }
            Some(Object::EnumMember { ty, index }) => {
                let member = self.design.enums.get(ty).member(index).ok_or_else(|| {
                    TranslateError::internal("enum member index out of range")
                })?;
                Ok(self.text(member))
            }
            _ => Err(error_not_supported(
                format!(
                    "`{}` cannot be used as a value here",
                    self.interner.resolve(name)
                ),
                span,
            )
            .into()),
        }
    }

    fn print_item(&mut self, arg: ExprId) -> TranslateResult<String> {
        match self.ty(arg)? {
            InferredType::Std(t) if t.is_vector() => self.expr(arg, Ctx::Int),
            InferredType::Std(VhdlType::StdLogic) => {
                Ok(format!("to_bit({})", self.expr(arg, Ctx::Any)?))
            }
            InferredType::Std(_) => self.expr(arg, Ctx::Any),
            InferredType::Enum(ty) => {
                let tname = self.text(self.design.enums.get(ty).name);
                Ok(format!("{tname}'image({})", self.expr(arg, Ctx::Any)?))
            }
        }
    }

    // ----- helpers -------------------------------------------------------

    fn ty(&self, id: ExprId) -> TranslateResult<InferredType> {
        self.ann
            .ty(id)
            .ok_or_else(|| TranslateError::internal("expression node missing a type annotation"))
    }

    fn text(&self, ident: Ident) -> String {
        self.interner.resolve(ident).to_string()
    }

    fn signal_name(&self, id: SignalId) -> TranslateResult<String> {
        let sig = self.design.signals.get(id);
        let name = sig
            .name
            .ok_or_else(|| TranslateError::internal("emitting a reference to an unnamed signal"))?;
        Ok(self.text(name))
    }

    /// Resolves an identifier naming a signal to the signal's current name
    /// (which a port binding may have changed), falling back to the
    /// identifier's own text.
    fn bound_signal_text(&self, name: Ident) -> TranslateResult<String> {
        match self.process.lookup(name) {
            Some(Object::Signal(id)) => self.signal_name(id),
            _ => Ok(self.text(name)),
        }
    }

    fn memory_base(&self, base: ExprId) -> Option<MemoryId> {
        if let Expr::Name { name, .. } = self.process.exprs[base] {
            if let Some(Object::Memory(id)) = self.process.lookup(name) {
                return Some(id);
            }
        }
        None
    }

    fn note_memory(&mut self, id: MemoryId) {
        if !self.used_memories.contains(&id) {
            self.used_memories.push(id);
        }
    }

    fn bound(&self, bound: Option<ExprId>, default: i64) -> TranslateResult<i64> {
        match bound {
            None => Ok(default),
            Some(b) => eval(self.process, b)
                .ok_or_else(|| TranslateError::internal("loop bound lost its constant value")),
        }
    }

    fn const_or_internal(&self, bound: Option<ExprId>, default: i64) -> TranslateResult<i64> {
        match bound {
            None => Ok(default),
            Some(b) => eval(self.process, b)
                .ok_or_else(|| TranslateError::internal("slice bound lost its constant value")),
        }
    }

    fn classify_sensitivity(&self) -> TranslateResult<SensClass> {
        let process = self.process;
        let span = process.span;
        let mut edges = Vec::new();
        let mut plain = Vec::new();
        let mut delays = Vec::new();
        for item in &process.sensitivity {
            match item {
                SensItem::Edge { signal, edge } => edges.push((*signal, *edge)),
                SensItem::Signal(id) => plain.push(*id),
                SensItem::Delay(ns) => delays.push(*ns),
            }
        }
        let kinds =
            usize::from(!edges.is_empty()) + usize::from(!plain.is_empty()) + usize::from(!delays.is_empty());
        if kinds > 1 {
            return Err(error_sensitivity(
                "sensitivity list mixes edges, plain signals, and delays",
                span,
            )
            .into());
        }
        if !edges.is_empty() {
            Ok(SensClass::Edges(edges))
        } else if !plain.is_empty() {
            Ok(SensClass::Plain(plain))
        } else if delays.len() == 1 {
            Ok(SensClass::Delay(delays[0]))
        } else if delays.len() > 1 {
            Err(error_sensitivity("multiple delay triggers on one process", span).into())
        } else {
            Err(error_sensitivity("empty sensitivity list", span).into())
        }
    }

    fn signal_names(&self, ids: &[SignalId]) -> TranslateResult<Vec<String>> {
        ids.iter().map(|id| self.signal_name(*id)).collect()
    }
}

struct CasePlan {
    selector: ExprId,
    labels: Vec<String>,
}

enum SensClass {
    Edges(Vec<(SignalId, EdgeKind)>),
    Plain(Vec<SignalId>),
    Delay(u64),
}

/// Extracts `width` bits of `value` starting at bit `lo`, reading the
/// two's-complement pattern.
fn extract_bits(value: i64, lo: u32, width: u32) -> i64 {
    if lo >= 64 {
        return 0;
    }
    let shifted = (value as u64) >> lo;
    let masked = if width >= 64 {
        shifted
    } else {
        shifted & ((1u64 << width) - 1)
    };
    masked as i64
}

fn edge_call(kind: EdgeKind, name: &str) -> String {
    match kind {
        EdgeKind::Rising => format!("rising_edge({name})"),
        EdgeKind::Falling => format!("falling_edge({name})"),
    }
}

fn coerce(raw: String, ty: InferredType, ctx: Ctx) -> String {
    match (ctx, ty) {
        (Ctx::Bool, InferredType::Std(VhdlType::StdLogic)) => format!("({raw} = '1')"),
        (Ctx::Bool, InferredType::Std(VhdlType::Unsigned(_)))
        | (Ctx::Bool, InferredType::Std(VhdlType::Signed(_)))
        | (Ctx::Bool, InferredType::Std(VhdlType::Integer)) => format!("({raw} /= 0)"),
        (Ctx::Std, InferredType::Std(VhdlType::Boolean)) => format!("to_std_logic({raw})"),
        (Ctx::Int, InferredType::Std(VhdlType::Unsigned(_)))
        | (Ctx::Int, InferredType::Std(VhdlType::Signed(_))) => format!("to_integer({raw})"),
        _ => raw,
    }
}

/// Collects every callable reachable from the design's processes, in
/// first-reference order, following calls made from callable bodies.
pub(crate) fn collect_callables(design: &Design) -> Vec<CallableId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for process in &design.processes {
        collect_in(process, &mut out, &mut seen);
    }
    let mut next = 0;
    while next < out.len() {
        let id = out[next];
        next += 1;
        collect_in(design.callables.get(id), &mut out, &mut seen);
    }
    out
}

fn collect_in(process: &Process, out: &mut Vec<CallableId>, seen: &mut HashSet<CallableId>) {
    fn visit_expr(
        process: &Process,
        id: ExprId,
        out: &mut Vec<CallableId>,
        seen: &mut HashSet<CallableId>,
    ) {
        match &process.exprs[id] {
            Expr::Literal { .. }
            | Expr::BoolLit { .. }
            | Expr::Name { .. }
            | Expr::Edge { .. } => {}
            Expr::Unary { operand, .. } | Expr::Not { operand, .. } => {
                visit_expr(process, *operand, out, seen)
            }
            Expr::Binary { lhs, rhs, .. } | Expr::Compare { lhs, rhs, .. } => {
                visit_expr(process, *lhs, out, seen);
                visit_expr(process, *rhs, out, seen);
            }
            Expr::Logic { terms, .. } | Expr::Concat { parts: terms, .. } => {
                for t in terms {
                    visit_expr(process, *t, out, seen);
                }
            }
            Expr::Index { base, index, .. } => {
                visit_expr(process, *base, out, seen);
                visit_expr(process, *index, out, seen);
            }
            Expr::Slice {
                base, upper, lower, ..
            } => {
                visit_expr(process, *base, out, seen);
                if let Some(u) = upper {
                    visit_expr(process, *u, out, seen);
                }
                if let Some(l) = lower {
                    visit_expr(process, *l, out, seen);
                }
            }
            Expr::Call { func, args, .. } => {
                if let Some(Object::Callable(id)) = process.lookup(*func) {
                    if seen.insert(id) {
                        out.push(id);
                    }
                }
                for a in args {
                    visit_expr(process, *a, out, seen);
                }
            }
        }
    }

    fn visit_stmts(
        process: &Process,
        list: &[Stmt],
        out: &mut Vec<CallableId>,
        seen: &mut HashSet<CallableId>,
    ) {
        for stmt in list {
            match stmt {
                Stmt::Assign { lhs, value, .. } => {
                    visit_expr(process, *lhs, out, seen);
                    visit_expr(process, *value, out, seen);
                }
                Stmt::If {
                    arms, else_body, ..
                } => {
                    for arm in arms {
                        visit_expr(process, arm.test, out, seen);
                        visit_stmts(process, &arm.body, out, seen);
                    }
                    if let Some(body) = else_body {
                        visit_stmts(process, body, out, seen);
                    }
                }
                Stmt::For {
                    start,
                    stop,
                    step,
                    body,
                    ..
                } => {
                    for b in [start, stop, step].into_iter().flatten() {
                        visit_expr(process, *b, out, seen);
                    }
                    visit_stmts(process, body, out, seen);
                }
                Stmt::While { cond, body, .. } => {
                    visit_expr(process, *cond, out, seen);
                    visit_stmts(process, body, out, seen);
                }
                Stmt::Return { value, .. } => {
                    if let Some(v) = value {
                        visit_expr(process, *v, out, seen);
                    }
                }
                Stmt::CallProc { func, args, .. } => {
                    if let Some(Object::Callable(id)) = process.lookup(*func) {
                        if seen.insert(id) {
                            out.push(id);
                        }
                    }
                    for a in args {
                        visit_expr(process, *a, out, seen);
                    }
                }
                Stmt::Print { args, .. } => {
                    for a in args {
                        visit_expr(process, *a, out, seen);
                    }
                }
                Stmt::Wait { spec, .. } => match spec {
                    WaitSpec::Delay(e) | WaitSpec::Level(e) => visit_expr(process, *e, out, seen),
                    WaitSpec::EdgeList(_) => {}
                },
                Stmt::Break { .. }
                | Stmt::Continue { .. }
                | Stmt::Finish { .. }
                | Stmt::Pass { .. } => {}
            }
        }
    }

    visit_stmts(process, &process.body, out, seen);
}
