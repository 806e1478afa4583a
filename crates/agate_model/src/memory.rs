//! Memory and ROM descriptors.

use agate_common::Ident;
use serde::{Deserialize, Serialize};

/// A fixed-depth array of signal-like elements sharing one element type.
///
/// A ROM additionally carries a read-only constant content table; an
/// assignment whose right-hand side indexes a ROM with a single index
/// expression is rewritten as a `case` statement over the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    /// The memory name.
    pub name: Ident,
    /// The number of elements.
    pub depth: u32,
    /// The bit width of each element.
    pub elem_width: u32,
    /// Whether the elements carry signed semantics.
    pub elem_signed: bool,
    /// Whether a single array declaration can represent this memory.
    ///
    /// `false` when element aliasing makes the declaration ambiguous;
    /// referencing such a memory raises `ListElementNotUnique`.
    pub decl: bool,
    /// Read-only constant contents, present for ROMs.
    pub rom: Option<Vec<i64>>,
}

impl Memory {
    /// Returns `true` if this memory is a read-only constant table.
    pub fn is_rom(&self) -> bool {
        self.rom.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rom_detection() {
        let ram = Memory {
            name: Ident::from_raw(0),
            depth: 16,
            elem_width: 8,
            elem_signed: false,
            decl: true,
            rom: None,
        };
        assert!(!ram.is_rom());

        let rom = Memory {
            rom: Some(vec![0, 1, 1, 0]),
            ..ram
        };
        assert!(rom.is_rom());
    }
}
