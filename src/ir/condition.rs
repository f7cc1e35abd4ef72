//! Condition codes tested by compares, branches and selects.

use std::fmt;

use strum::{EnumCount, EnumIter};

/// The relational operator evaluated by a `Compare`, `If`, `IfImm`, `Select` or
/// `SelectImm` instruction.
///
/// Signed comparisons use the `Lt/Le/Gt/Ge` members; their unsigned counterparts are
/// `B` (below), `Be`, `A` (above) and `Ae`, following the usual flags naming. Equality
/// codes are signedness-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum ConditionCode {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Signed less-than.
    Lt,
    /// Signed less-or-equal.
    Le,
    /// Signed greater-than.
    Gt,
    /// Signed greater-or-equal.
    Ge,
    /// Unsigned below.
    B,
    /// Unsigned below-or-equal.
    Be,
    /// Unsigned above.
    A,
    /// Unsigned above-or-equal.
    Ae,
}

impl ConditionCode {
    /// The logical negation of the code: the condition that holds exactly when
    /// `self` does not.
    ///
    /// Used to narrow ranges into the false successor of a branch.
    #[must_use]
    pub fn invert(self) -> ConditionCode {
        match self {
            ConditionCode::Eq => ConditionCode::Ne,
            ConditionCode::Ne => ConditionCode::Eq,
            ConditionCode::Lt => ConditionCode::Ge,
            ConditionCode::Le => ConditionCode::Gt,
            ConditionCode::Gt => ConditionCode::Le,
            ConditionCode::Ge => ConditionCode::Lt,
            ConditionCode::B => ConditionCode::Ae,
            ConditionCode::Be => ConditionCode::A,
            ConditionCode::A => ConditionCode::Be,
            ConditionCode::Ae => ConditionCode::B,
        }
    }

    /// The code that yields the same truth value after the two compared operands are
    /// exchanged (`a < b` ⇔ `b > a`).
    ///
    /// Used when lowering swaps a constant into the immediate position.
    #[must_use]
    pub fn swap_operands(self) -> ConditionCode {
        match self {
            ConditionCode::Eq => ConditionCode::Eq,
            ConditionCode::Ne => ConditionCode::Ne,
            ConditionCode::Lt => ConditionCode::Gt,
            ConditionCode::Le => ConditionCode::Ge,
            ConditionCode::Gt => ConditionCode::Lt,
            ConditionCode::Ge => ConditionCode::Le,
            ConditionCode::B => ConditionCode::A,
            ConditionCode::Be => ConditionCode::Ae,
            ConditionCode::A => ConditionCode::B,
            ConditionCode::Ae => ConditionCode::Be,
        }
    }

    /// Returns `true` for the signed ordering codes (`Lt/Le/Gt/Ge`).
    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ConditionCode::Lt | ConditionCode::Le | ConditionCode::Gt | ConditionCode::Ge
        )
    }

    /// Returns `true` for the unsigned ordering codes (`B/Be/A/Ae`).
    #[must_use]
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            ConditionCode::B | ConditionCode::Be | ConditionCode::A | ConditionCode::Ae
        )
    }
}

impl fmt::Display for ConditionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConditionCode::Eq => "EQ",
            ConditionCode::Ne => "NE",
            ConditionCode::Lt => "LT",
            ConditionCode::Le => "LE",
            ConditionCode::Gt => "GT",
            ConditionCode::Ge => "GE",
            ConditionCode::B => "B",
            ConditionCode::Be => "BE",
            ConditionCode::A => "A",
            ConditionCode::Ae => "AE",
        };
        write!(f, "{name}")
    }
}
