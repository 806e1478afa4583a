//! The closed set of VHDL value categories and their combination rules.
//!
//! Every expression node is annotated with exactly one [`VhdlType`] by the
//! inference pass (enum-typed expressions are tracked separately and never
//! enter this algebra). The pairwise `combine` rules decide the result of
//! bitwise operations and the common operand type of comparisons;
//! `combine_arith` is the narrower rule for `+ - mod` and friends.

use agate_model::{SignalCategory, VarShape};

/// A VHDL value category, with bit width for the vector variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VhdlType {
    /// A single wire (`std_logic`).
    StdLogic,
    /// The `boolean` type produced by comparisons and logical operators.
    Boolean,
    /// An unconstrained `integer`.
    Integer,
    /// An `unsigned` vector of the given width.
    Unsigned(u32),
    /// A `signed` vector of the given width.
    Signed(u32),
}

impl VhdlType {
    /// Returns the bit width for vector types, `None` otherwise.
    pub fn size(self) -> Option<u32> {
        match self {
            VhdlType::Unsigned(n) | VhdlType::Signed(n) => Some(n),
            _ => None,
        }
    }

    /// Returns `true` for the sized vector types.
    pub fn is_vector(self) -> bool {
        matches!(self, VhdlType::Unsigned(_) | VhdlType::Signed(_))
    }

    /// Renders the type as VHDL source text.
    ///
    /// Vector types include their `(N-1 downto 0)` range when `constrained`
    /// is set, as required in port clauses and object declarations.
    pub fn to_str(self, constrained: bool) -> String {
        match self {
            VhdlType::StdLogic => "std_logic".to_string(),
            VhdlType::Boolean => "boolean".to_string(),
            VhdlType::Integer => "integer".to_string(),
            VhdlType::Unsigned(n) => {
                if constrained {
                    format!("unsigned({} downto 0)", n.saturating_sub(1))
                } else {
                    "unsigned".to_string()
                }
            }
            VhdlType::Signed(n) => {
                if constrained {
                    format!("signed({} downto 0)", n.saturating_sub(1))
                } else {
                    "signed".to_string()
                }
            }
        }
    }

    /// Combines two operand types for bitwise operations and comparisons.
    ///
    /// Signed wins over unsigned, unsigned over `std_logic`, `std_logic`
    /// over integer; vector widths take the maximum. Returns `None` when no
    /// rule applies, which the caller reports as an unsupported type.
    pub fn combine(a: VhdlType, b: VhdlType) -> Option<VhdlType> {
        use VhdlType::*;
        let w = a.size().unwrap_or(0).max(b.size().unwrap_or(0));
        match (a, b) {
            (Signed(_), _) | (_, Signed(_)) => Some(Signed(w)),
            (Unsigned(_), _) | (_, Unsigned(_)) => Some(Unsigned(w)),
            (StdLogic, _) | (_, StdLogic) => Some(StdLogic),
            (Integer, _) | (_, Integer) => Some(Integer),
            _ => None,
        }
    }

    /// Combines two operand types for arithmetic operations.
    ///
    /// Both-integer stays integer; a vector paired with an integer keeps
    /// the vector's kind at the maximum width; anything else falls back to
    /// a plain integer expression.
    pub fn combine_arith(a: VhdlType, b: VhdlType) -> VhdlType {
        use VhdlType::*;
        match (a, b) {
            (Integer, Integer) => Integer,
            (Signed(x), Integer) | (Integer, Signed(x)) => Signed(x),
            (Signed(x), Signed(y)) => Signed(x.max(y)),
            (Unsigned(x), Integer) | (Integer, Unsigned(x)) => Unsigned(x),
            (Unsigned(x), Unsigned(y)) => Unsigned(x.max(y)),
            _ => Integer,
        }
    }

    /// Derives the type of a signal; `None` for enum-typed signals, which
    /// never enter the numeric algebra.
    pub fn from_signal(category: SignalCategory) -> Option<VhdlType> {
        match category {
            SignalCategory::Logic => Some(VhdlType::StdLogic),
            SignalCategory::Vector { width, signed } => Some(if signed {
                VhdlType::Signed(width)
            } else {
                VhdlType::Unsigned(width)
            }),
            SignalCategory::Enum(_) => None,
        }
    }

    /// Derives the type of a local variable or subprogram argument.
    pub fn from_shape(shape: VarShape) -> VhdlType {
        match shape {
            VarShape::Logic => VhdlType::StdLogic,
            VarShape::Vector { width, signed } => {
                if signed {
                    VhdlType::Signed(width)
                } else {
                    VhdlType::Unsigned(width)
                }
            }
            VarShape::Int => VhdlType::Integer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VhdlType::*;

    #[test]
    fn combine_signed_wins() {
        assert_eq!(VhdlType::combine(Signed(4), Unsigned(8)), Some(Signed(8)));
        assert_eq!(VhdlType::combine(Integer, Signed(6)), Some(Signed(6)));
    }

    #[test]
    fn combine_unsigned_over_logic() {
        assert_eq!(VhdlType::combine(Unsigned(4), StdLogic), Some(Unsigned(4)));
        assert_eq!(VhdlType::combine(StdLogic, Integer), Some(StdLogic));
    }

    #[test]
    fn combine_integers() {
        assert_eq!(VhdlType::combine(Integer, Integer), Some(Integer));
    }

    #[test]
    fn combine_booleans_undefined() {
        assert_eq!(VhdlType::combine(Boolean, Boolean), None);
    }

    #[test]
    fn arith_vector_absorbs_integer() {
        assert_eq!(VhdlType::combine_arith(Unsigned(8), Integer), Unsigned(8));
        assert_eq!(VhdlType::combine_arith(Integer, Signed(5)), Signed(5));
        assert_eq!(VhdlType::combine_arith(Integer, Integer), Integer);
    }

    #[test]
    fn arith_mixed_sign_falls_back() {
        assert_eq!(VhdlType::combine_arith(Unsigned(8), Signed(4)), Integer);
    }

    #[test]
    fn render_constrained() {
        assert_eq!(Unsigned(8).to_str(true), "unsigned(7 downto 0)");
        assert_eq!(Signed(4).to_str(true), "signed(3 downto 0)");
        assert_eq!(Unsigned(8).to_str(false), "unsigned");
        assert_eq!(StdLogic.to_str(true), "std_logic");
    }

    #[test]
    fn from_signal_categories() {
        assert_eq!(
            VhdlType::from_signal(SignalCategory::Logic),
            Some(StdLogic)
        );
        assert_eq!(
            VhdlType::from_signal(SignalCategory::Vector {
                width: 8,
                signed: true
            }),
            Some(Signed(8))
        );
        assert_eq!(
            VhdlType::from_signal(SignalCategory::Enum(
                agate_model::EnumTypeId::from_raw(0)
            )),
            None
        );
    }
}
