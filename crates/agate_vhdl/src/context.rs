//! Conversion orchestration and the long-lived entry point.
//!
//! A [`Converter`] is created once and reused; each call to
//! [`Converter::convert`] runs one whole-design conversion with its own
//! per-invocation state (enum dedup registry, memory usage, output
//! buffers). The only state on the converter itself is the caller-facing
//! configuration and the advisory re-entrancy guard.

use crate::codegen::{collect_callables, ProcessEmitter};
use crate::decls::{
    write_constwires, write_declarations, write_entity, write_preamble, FUNC_DECLS,
};
use crate::errors::{
    error_arg_type, error_first_arg_type, error_shadowing_signal, warn_nested_conversion,
    TranslateResult,
};
use crate::infer::annotate_design;
use crate::writer::CodeWriter;
use agate_common::{Ident, Interner, Span};
use agate_diagnostics::DiagnosticSink;
use agate_model::{Design, MemoryId, SignalId};
use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// The VHDL conversion entry point.
///
/// The engine is strictly single-threaded. The re-entrancy guard is
/// advisory, not a lock: a conversion requested while one is already in
/// progress is skipped with a warning and reported as a pass-through.
pub struct Converter {
    name: Option<String>,
    directory: Option<PathBuf>,
    converting: Cell<bool>,
}

impl Converter {
    /// Creates a converter with default settings.
    pub fn new() -> Self {
        Self {
            name: None,
            directory: None,
            converting: Cell::new(false),
        }
    }

    /// Overrides the design name used for the entity and the output file.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the directory the output file is written into.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Converts a design to one VHDL text unit.
    ///
    /// Returns `Ok(None)` when a conversion is already in progress (the
    /// nested request is a pass-through, surfaced as an advisory). On any
    /// fatal error no partial output is returned. The design's transient
    /// signal annotations are reset before returning, on success and on
    /// failure alike, so the same design can be converted again.
    pub fn convert(
        &self,
        design: &mut Design,
        interner: &Interner,
        sink: &DiagnosticSink,
    ) -> TranslateResult<Option<String>> {
        if self.converting.replace(true) {
            sink.emit(warn_nested_conversion(Span::DUMMY));
            return Ok(None);
        }
        let guard = ReentrancyGuard(&self.converting);
        let result = self.run(design, interner, sink);
        design.reset_annotations();
        drop(guard);
        result.map(Some)
    }

    /// Converts a design and writes the result to `<name>.vhd`.
    ///
    /// The file handle is scoped to this call, so on a write failure the
    /// partially written file is closed rather than leaked; its content
    /// must be treated as invalid by the caller.
    pub fn convert_to_file(
        &self,
        design: &mut Design,
        interner: &Interner,
        sink: &DiagnosticSink,
    ) -> TranslateResult<Option<PathBuf>> {
        let name = self.unit_name(design, interner);
        let Some(text) = self.convert(design, interner, sink)? else {
            return Ok(None);
        };
        let file = format!("{name}.vhd");
        let path = match &self.directory {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        };
        std::fs::write(&path, text)?;
        Ok(Some(path))
    }

    fn unit_name(&self, design: &Design, interner: &Interner) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => interner.resolve(design.name).to_string(),
        }
    }

    fn run(
        &self,
        design: &mut Design,
        interner: &Interner,
        sink: &DiagnosticSink,
    ) -> TranslateResult<String> {
        if design.processes.is_empty() {
            return Err(error_first_arg_type(
                "design does not elaborate to any convertible process",
                Span::DUMMY,
            )
            .into());
        }
        for process in &design.processes {
            if process.kind.is_callable() {
                return Err(error_arg_type(
                    "a subprogram is not a convertible process",
                    process.span,
                )
                .into());
            }
        }
        bind_ports(design, interner)?;
        let design: &Design = design;

        let anns = annotate_design(design, interner)?;
        let mut used_memories: Vec<MemoryId> = Vec::new();

        let mut subs = CodeWriter::new();
        for id in collect_callables(design) {
            let mut emitter = ProcessEmitter {
                design,
                interner,
                process: design.callables.get(id),
                ann: &anns.callables[id.as_raw() as usize],
                used_memories: &mut used_memories,
            };
            emitter.emit(&mut subs)?;
            subs.blank();
        }

        let mut body = CodeWriter::new();
        for (i, process) in design.processes.iter().enumerate() {
            let mut emitter = ProcessEmitter {
                design,
                interner,
                process,
                ann: &anns.processes[i],
                used_memories: &mut used_memories,
            };
            emitter.emit(&mut body)?;
            body.blank();
        }

        let name = self.unit_name(design, interner);
        let mut w = CodeWriter::new();
        write_preamble(&mut w);
        w.blank();
        write_entity(&mut w, design, interner, &name);
        w.blank();
        w.line(&format!("architecture rtl of {name} is"));
        w.blank();
        w.append(FUNC_DECLS);
        w.blank();
        if !subs.is_empty() {
            w.append(&subs.finish());
        }
        let mut enums_declared = HashSet::new();
        let constwires =
            write_declarations(&mut w, design, interner, sink, &used_memories, &mut enums_declared)?;
        w.blank();
        w.line("begin");
        w.blank();
        if !constwires.is_empty() {
            write_constwires(&mut w, design, interner, &constwires)?;
            w.blank();
        }
        w.append(&body.finish());
        w.line("end architecture rtl;");
        Ok(w.finish())
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

struct ReentrancyGuard<'a>(&'a Cell<bool>);

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Forces every port-bound signal's name to its port name. Fails when a
/// port name is already bound to a different signal.
fn bind_ports(design: &mut Design, interner: &Interner) -> TranslateResult<()> {
    let mut bound: HashMap<Ident, SignalId> = HashMap::new();
    for (id, sig) in design.signals.iter() {
        if let Some(name) = sig.name {
            bound.insert(name, id);
        }
    }
    let interface = design.interface.clone();
    for arg in interface {
        if let Some(&other) = bound.get(&arg.name) {
            if other != arg.signal {
                let span = design.signals.get(arg.signal).span;
                return Err(
                    error_shadowing_signal(interner.resolve(arg.name), span).into()
                );
            }
        }
        design.signals.get_mut(arg.signal).name = Some(arg.name);
        bound.insert(arg.name, arg.signal);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agate_common::Span;
    use agate_model::{PortArg, Signal, SignalCategory};

    fn logic(name: Option<Ident>) -> Signal {
        Signal {
            name,
            category: SignalCategory::Logic,
            value: 0,
            driven: false,
            read: true,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn empty_design_is_rejected() {
        let mut interner = Interner::new();
        let mut design = Design::new(interner.intern("top"));
        let sink = DiagnosticSink::new();
        let err = Converter::new()
            .convert(&mut design, &interner, &sink)
            .unwrap_err();
        assert!(format!("{err}").contains("E301"));
    }

    #[test]
    fn nested_conversion_is_a_pass_through() {
        let mut interner = Interner::new();
        let mut design = Design::new(interner.intern("top"));
        let sink = DiagnosticSink::new();
        let conv = Converter::new();
        conv.converting.set(true);
        let out = conv.convert(&mut design, &interner, &sink).unwrap();
        assert!(out.is_none());
        assert_eq!(sink.diagnostics().len(), 1);
        assert_eq!(format!("{}", sink.diagnostics()[0].code), "W302");
    }

    #[test]
    fn port_binding_renames_signal() {
        let mut interner = Interner::new();
        let mut design = Design::new(interner.intern("top"));
        let internal = interner.intern("clk_i");
        let port = interner.intern("clk");
        let id = design.signals.push(logic(Some(internal)));
        design.interface.push(PortArg {
            name: port,
            signal: id,
        });
        bind_ports(&mut design, &interner).unwrap();
        assert_eq!(design.signals.get(id).name, Some(port));
    }

    #[test]
    fn shadowing_port_name_is_rejected() {
        let mut interner = Interner::new();
        let mut design = Design::new(interner.intern("top"));
        let taken = interner.intern("clk");
        design.signals.push(logic(Some(taken)));
        let other = design.signals.push(logic(None));
        design.interface.push(PortArg {
            name: taken,
            signal: other,
        });
        let err = bind_ports(&mut design, &interner).unwrap_err();
        assert!(format!("{err}").contains("E302"));
    }
}
