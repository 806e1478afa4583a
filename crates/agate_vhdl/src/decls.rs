//! The declaration writer: preamble, entity, and architecture declarations.
//!
//! Declarations are produced after the process bodies have been emitted
//! into their own buffer, so that memory usage and subprogram references
//! are known, but they are placed before the bodies in the assembled unit.

use crate::errors::{warn_undriven_signal, warn_unused_signal, TranslateError, TranslateResult};
use crate::types::VhdlType;
use crate::writer::CodeWriter;
use agate_common::{bin_str, Interner};
use agate_diagnostics::DiagnosticSink;
use agate_model::{Design, EnumTypeId, MemoryId, Signal, SignalCategory, SignalId};
use std::collections::HashSet;

/// The helper subprogram emitted at the top of every architecture.
pub(crate) const FUNC_DECLS: &str = "\
function to_std_logic (arg: boolean) return std_logic is
begin
    if arg then
        return '1';
    else
        return '0';
    end if;
end function to_std_logic;
";

/// The fixed library/use-clause preamble.
pub(crate) fn write_preamble(w: &mut CodeWriter) {
    w.line("library IEEE;");
    w.line("use IEEE.std_logic_1164.all;");
    w.line("use IEEE.numeric_std.all;");
    w.line("use std.textio.all;");
}

/// The entity declaration; the port clause is omitted for a design with no
/// top-level interface. Direction is `out` iff the bound signal is driven.
pub(crate) fn write_entity(w: &mut CodeWriter, design: &Design, interner: &Interner, name: &str) {
    w.line(&format!("entity {name} is"));
    if !design.interface.is_empty() {
        w.indent();
        w.line("port (");
        w.indent();
        let last = design.interface.len() - 1;
        for (i, arg) in design.interface.iter().enumerate() {
            let sig = design.signals.get(arg.signal);
            let dir = if sig.driven { "out" } else { "in" };
            let ty = signal_type_text(design, interner, sig);
            let sep = if i == last { "" } else { ";" };
            w.line(&format!("{}: {dir} {ty}{sep}", interner.resolve(arg.name)));
        }
        w.dedent();
        w.line(");");
        w.dedent();
    }
    w.line(&format!("end entity {name};"));
}

fn signal_type_text(design: &Design, interner: &Interner, sig: &Signal) -> String {
    match sig.category {
        SignalCategory::Logic => "std_logic".to_string(),
        SignalCategory::Vector { width, signed } => if signed {
            VhdlType::Signed(width)
        } else {
            VhdlType::Unsigned(width)
        }
        .to_str(true),
        SignalCategory::Enum(tid) => interner.resolve(design.enums.get(tid).name).to_string(),
    }
}

/// Writes enumerated-type, signal, and memory declarations.
///
/// Signals advisory-checked here: a driven-but-never-read signal gets a
/// dead-driven warning; a read-but-never-driven signal is recovered by
/// declaring it anyway and returning it for a constant continuous
/// assignment after `begin`.
pub(crate) fn write_declarations(
    w: &mut CodeWriter,
    design: &Design,
    interner: &Interner,
    sink: &DiagnosticSink,
    used_memories: &[MemoryId],
    enums_declared: &mut HashSet<EnumTypeId>,
) -> TranslateResult<Vec<SignalId>> {
    let ports: HashSet<SignalId> = design.interface.iter().map(|a| a.signal).collect();

    // Enumerated types, exactly once each, in first-use order.
    for (id, sig) in design.signals.iter() {
        if !ports.contains(&id) && !(sig.name.is_some() && (sig.driven || sig.read)) {
            continue;
        }
        if let SignalCategory::Enum(tid) = sig.category {
            if enums_declared.insert(tid) {
                let ty = design.enums.get(tid);
                let members: Vec<&str> =
                    ty.members.iter().map(|m| interner.resolve(*m)).collect();
                w.line(&format!(
                    "type {} is ({});",
                    interner.resolve(ty.name),
                    members.join(", ")
                ));
            }
        }
    }

    let mut constwires = Vec::new();
    for (id, sig) in design.signals.iter() {
        if ports.contains(&id) {
            continue;
        }
        let Some(name) = sig.name else { continue };
        if !sig.driven && !sig.read {
            continue;
        }
        if sig.driven && !sig.read {
            sink.emit(warn_unused_signal(interner.resolve(name), sig.span));
        }
        if sig.read && !sig.driven {
            sink.emit(warn_undriven_signal(interner.resolve(name), sig.span));
            constwires.push(id);
        }
        w.line(&format!(
            "signal {}: {};",
            interner.resolve(name),
            signal_type_text(design, interner, sig)
        ));
    }

    for mem_id in used_memories {
        let mem = design.memories.get(*mem_id);
        if !mem.decl {
            continue;
        }
        let name = interner.resolve(mem.name);
        let elem = if mem.elem_signed {
            VhdlType::Signed(mem.elem_width)
        } else {
            VhdlType::Unsigned(mem.elem_width)
        }
        .to_str(true);
        w.line(&format!(
            "type t_array_{name} is array(0 to {}) of {elem};",
            mem.depth.saturating_sub(1)
        ));
        w.line(&format!("signal {name}: t_array_{name};"));
    }

    Ok(constwires)
}

/// Constant continuous assignments recovering read-but-never-driven
/// signals, placed right after `begin`.
pub(crate) fn write_constwires(
    w: &mut CodeWriter,
    design: &Design,
    interner: &Interner,
    constwires: &[SignalId],
) -> TranslateResult<()> {
    for &id in constwires {
        let sig = design.signals.get(id);
        let name = sig
            .name
            .ok_or_else(|| TranslateError::internal("constwire for an unnamed signal"))?;
        let value = match sig.category {
            SignalCategory::Logic => format!("'{}'", i64::from(sig.value != 0)),
            SignalCategory::Vector { width, .. } => {
                format!("\"{}\"", bin_str(sig.value, width))
            }
            SignalCategory::Enum(tid) => {
                let index = u32::try_from(sig.value)
                    .ok()
                    .and_then(|i| design.enums.get(tid).member(i))
                    .ok_or_else(|| {
                        TranslateError::internal("enum signal value outside its member range")
                    })?;
                interner.resolve(index).to_string()
            }
        };
        w.line(&format!("{} <= {value};", interner.resolve(name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agate_common::Span;

    fn sig(name: Option<agate_common::Ident>, driven: bool, read: bool) -> Signal {
        Signal {
            name,
            category: SignalCategory::Vector {
                width: 4,
                signed: false,
            },
            value: 5,
            driven,
            read,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn entity_without_ports_omits_clause() {
        let mut interner = Interner::new();
        let design = Design::new(interner.intern("empty"));
        let mut w = CodeWriter::new();
        write_entity(&mut w, &design, &interner, "empty");
        assert_eq!(w.finish(), "entity empty is\nend entity empty;\n");
    }

    #[test]
    fn port_direction_follows_driven() {
        let mut interner = Interner::new();
        let mut design = Design::new(interner.intern("top"));
        let din = interner.intern("din");
        let dout = interner.intern("dout");
        let a = design.signals.push(sig(Some(din), false, true));
        let b = design.signals.push(sig(Some(dout), true, false));
        design.interface.push(agate_model::PortArg {
            name: din,
            signal: a,
        });
        design.interface.push(agate_model::PortArg {
            name: dout,
            signal: b,
        });
        let mut w = CodeWriter::new();
        write_entity(&mut w, &design, &interner, "top");
        let text = w.finish();
        assert!(text.contains("din: in unsigned(3 downto 0);"));
        assert!(text.contains("dout: out unsigned(3 downto 0)"));
    }

    #[test]
    fn undriven_signal_recovered_with_advisory() {
        let mut interner = Interner::new();
        let mut design = Design::new(interner.intern("top"));
        let name = interner.intern("level");
        let id = design.signals.push(sig(Some(name), false, true));
        let sink = DiagnosticSink::new();
        let mut w = CodeWriter::new();
        let mut enums = HashSet::new();
        let wires =
            write_declarations(&mut w, &design, &interner, &sink, &[], &mut enums).unwrap();
        assert_eq!(wires, vec![id]);
        assert!(!sink.has_errors());
        assert_eq!(sink.diagnostics().len(), 1);

        let mut w2 = CodeWriter::new();
        write_constwires(&mut w2, &design, &interner, &wires).unwrap();
        assert_eq!(w2.finish(), "level <= \"0101\";\n");
    }

    #[test]
    fn dead_driven_signal_warns() {
        let mut interner = Interner::new();
        let mut design = Design::new(interner.intern("top"));
        let name = interner.intern("dbg");
        design.signals.push(sig(Some(name), true, false));
        let sink = DiagnosticSink::new();
        let mut w = CodeWriter::new();
        let mut enums = HashSet::new();
        let wires =
            write_declarations(&mut w, &design, &interner, &sink, &[], &mut enums).unwrap();
        assert!(wires.is_empty());
        assert_eq!(sink.diagnostics().len(), 1);
        assert!(w.finish().contains("signal dbg: unsigned(3 downto 0);"));
    }
}
