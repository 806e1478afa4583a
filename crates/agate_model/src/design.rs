//! The whole-design container handed to the translation engine.

use crate::enums::EnumType;
use crate::ids::{CallableId, EnumTypeId, MemoryId, SignalId};
use crate::memory::Memory;
use crate::pool::Pool;
use crate::process::Process;
use crate::signal::Signal;
use agate_common::Ident;
use serde::{Deserialize, Serialize};

/// One resolved top-level interface argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortArg {
    /// The port name.
    pub name: Ident,
    /// The signal bound to the port.
    pub signal: SignalId,
}

/// A complete design as produced by the analysis stage.
///
/// The converter runs type inference over every process, emits
/// declarations, then emits one concurrent statement per process; at the
/// end it resets all transient signal annotations so the same design can be
/// converted again independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Design {
    /// The design name; also the entity name and output file stem.
    pub name: Ident,
    /// All signals of the design.
    pub signals: Pool<SignalId, Signal>,
    /// All memories and ROMs of the design.
    pub memories: Pool<MemoryId, Memory>,
    /// All enumerated types referenced by the design.
    pub enums: Pool<EnumTypeId, EnumType>,
    /// The ordered top-level interface.
    pub interface: Vec<PortArg>,
    /// The concurrent processes, in emission order.
    pub processes: Vec<Process>,
    /// Callable helpers referenced from process bodies.
    pub callables: Pool<CallableId, Process>,
}

impl Design {
    /// Creates an empty design with the given name.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            signals: Pool::new(),
            memories: Pool::new(),
            enums: Pool::new(),
            interface: Vec::new(),
            processes: Vec::new(),
            callables: Pool::new(),
        }
    }

    /// Clears every signal's transient name/driven/read annotations.
    pub fn reset_annotations(&mut self) {
        for (_, sig) in self.signals.iter_mut() {
            sig.reset_annotations();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalCategory;
    use agate_common::Span;

    #[test]
    fn empty_design() {
        let d = Design::new(Ident::from_raw(0));
        assert!(d.signals.is_empty());
        assert!(d.interface.is_empty());
        assert!(d.processes.is_empty());
    }

    #[test]
    fn reset_clears_all_signals() {
        let mut d = Design::new(Ident::from_raw(0));
        d.signals.push(Signal {
            name: Some(Ident::from_raw(1)),
            category: SignalCategory::Logic,
            value: 0,
            driven: true,
            read: true,
            span: Span::DUMMY,
        });
        d.reset_annotations();
        let sig = d.signals.get(SignalId::from_raw(0));
        assert!(sig.name.is_none());
        assert!(!sig.driven && !sig.read);
    }
}
