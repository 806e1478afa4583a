//! Signal descriptors.
//!
//! A [`Signal`] is a named hardware wire or register discovered by the
//! analysis stage. The translation engine reads it, forces port-bound
//! signals to their port names, and resets the transient annotation fields
//! once a conversion has finished.

use crate::ids::EnumTypeId;
use agate_common::{Ident, Span};
use serde::{Deserialize, Serialize};

/// The value category of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalCategory {
    /// A boolean-like single wire (`std_logic`), no range.
    Logic,
    /// A fixed-width bit vector, signed or unsigned.
    Vector {
        /// The number of bits.
        width: u32,
        /// Whether the vector carries signed arithmetic semantics.
        signed: bool,
    },
    /// A symbolic signal over an enumerated type.
    Enum(EnumTypeId),
}

/// A signal in the design.
///
/// `name`, `driven`, and `read` are transient annotations owned by the
/// analysis stage; the converter resets them after emitting output so the
/// same design objects can be fed through a second, independent conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// The signal name, if one has been assigned.
    ///
    /// A port-bound signal has its name forced equal to the port name
    /// before declaration; translation fails if the name is already bound
    /// to a different object.
    pub name: Option<Ident>,
    /// The value category.
    pub category: SignalCategory,
    /// The current constant value. For enum signals this is the member index.
    pub value: i64,
    /// Whether the signal is assigned somewhere in the design.
    pub driven: bool,
    /// Whether the signal is read somewhere in the design.
    pub read: bool,
    /// The source span of the signal's origin.
    pub span: Span,
}

impl Signal {
    /// Returns the bit width for vector signals, `None` for boolean-like
    /// and enum signals.
    pub fn width(&self) -> Option<u32> {
        match self.category {
            SignalCategory::Vector { width, .. } => Some(width),
            _ => None,
        }
    }

    /// Clears the transient name/driven/read annotations.
    pub fn reset_annotations(&mut self) {
        self.name = None;
        self.driven = false;
        self.read = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec8() -> Signal {
        Signal {
            name: Some(Ident::from_raw(0)),
            category: SignalCategory::Vector {
                width: 8,
                signed: false,
            },
            value: 0,
            driven: true,
            read: true,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn width_of_vector() {
        assert_eq!(vec8().width(), Some(8));
    }

    #[test]
    fn width_of_logic_is_none() {
        let mut s = vec8();
        s.category = SignalCategory::Logic;
        assert_eq!(s.width(), None);
    }

    #[test]
    fn reset_clears_annotations() {
        let mut s = vec8();
        s.reset_annotations();
        assert!(s.name.is_none());
        assert!(!s.driven);
        assert!(!s.read);
    }

    #[test]
    fn categories_distinct() {
        assert_ne!(
            SignalCategory::Logic,
            SignalCategory::Vector {
                width: 1,
                signed: false
            }
        );
        assert_ne!(
            SignalCategory::Vector {
                width: 4,
                signed: false
            },
            SignalCategory::Vector {
                width: 4,
                signed: true
            }
        );
    }
}
