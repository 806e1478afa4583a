//! Enumerated types for symbolic (non-numeric) signals.

use agate_common::Ident;
use serde::{Deserialize, Serialize};

/// A named, ordered set of distinct symbolic members.
///
/// Declared exactly once per conversion regardless of how many signals and
/// processes reference it; the dedup registry lives in the conversion
/// context, not on the type itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumType {
    /// The VHDL type name.
    pub name: Ident,
    /// The ordered member names.
    pub members: Vec<Ident>,
}

impl EnumType {
    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the type has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the member name at `index`, if in range.
    pub fn member(&self, index: u32) -> Option<Ident> {
        self.members.get(index as usize).copied()
    }
}
