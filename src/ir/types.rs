//! Value types carried by IR instructions.
//!
//! Every instruction declares a [`DataType`] for its result, and the compare/branch/select
//! family additionally records the type of the values being compared. The range analysis
//! represents every integral domain inside `i64`, so the module also exposes the per-type
//! domain bounds used by interval construction ([`DataType::min_value`] /
//! [`DataType::max_value`]).

use strum::{EnumCount, EnumIter};

/// The value type of an SSA instruction result.
///
/// The set mirrors a method-level JIT IR: fixed-width integers in both signednesses,
/// booleans (represented as `0`/`1`), IEEE floats, managed references and `void` for
/// instructions producing no value.
///
/// Range analysis covers the integral and reference members only; the float members
/// exist so that graphs containing float computations can still be built and
/// transformed (if-conversion must recognize and reject float selects).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
pub enum DataType {
    /// Boolean, materialized as the integers `0` and `1`.
    Bool,
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 64-bit integer.
    ///
    /// The interval domain is `i64`-bounded, so the tracked maximum of this type is
    /// `i64::MAX`; values above it are not representable and `U64` is excluded from
    /// phi and compare narrowing.
    U64,
    /// Signed 64-bit integer.
    I64,
    /// IEEE-754 single precision float. Not range-tracked.
    F32,
    /// IEEE-754 double precision float. Not range-tracked.
    F64,
    /// Managed object reference. Only nullity is range-relevant: `[0, i64::MAX]`.
    Ref,
    /// No value (side-effect-only instructions).
    Void,
}

impl DataType {
    /// Returns `true` for the fixed-width integer types and `Bool`.
    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            DataType::Bool
                | DataType::U8
                | DataType::I8
                | DataType::U16
                | DataType::I16
                | DataType::U32
                | DataType::I32
                | DataType::U64
                | DataType::I64
        )
    }

    /// Returns `true` for `F32` and `F64`.
    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    /// Returns `true` for the managed reference type.
    #[must_use]
    pub fn is_reference(self) -> bool {
        self == DataType::Ref
    }

    /// Returns `true` if values of this type are tracked by the range analysis.
    #[must_use]
    pub fn is_range_tracked(self) -> bool {
        self.is_integral() || self.is_reference()
    }

    /// Returns `true` for the unsigned integer types (`Bool` counts as unsigned).
    #[must_use]
    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            DataType::Bool | DataType::U8 | DataType::U16 | DataType::U32 | DataType::U64
        )
    }

    /// Returns `true` for types occupying a full 64-bit register (including references).
    #[must_use]
    pub fn is_64bit(self) -> bool {
        matches!(self, DataType::U64 | DataType::I64 | DataType::F64 | DataType::Ref)
    }

    /// Bit width of the type's storage, or 0 for `Void`.
    #[must_use]
    pub fn bit_width(self) -> u8 {
        match self {
            DataType::Bool => 1,
            DataType::U8 | DataType::I8 => 8,
            DataType::U16 | DataType::I16 => 16,
            DataType::U32 | DataType::I32 | DataType::F32 => 32,
            DataType::U64 | DataType::I64 | DataType::F64 | DataType::Ref => 64,
            DataType::Void => 0,
        }
    }

    /// Smallest value of the type's domain, as an `i64`.
    ///
    /// Unsigned types and references bottom at 0.
    ///
    /// # Panics
    ///
    /// Float and void types have no integral domain; asking for one is a contract
    /// violation.
    #[must_use]
    pub fn min_value(self) -> i64 {
        assert!(
            self.is_range_tracked(),
            "no integral domain for {self:?}"
        );
        match self {
            DataType::Bool | DataType::U8 | DataType::U16 | DataType::U32 | DataType::U64 => 0,
            DataType::I8 => i64::from(i8::MIN),
            DataType::I16 => i64::from(i16::MIN),
            DataType::I32 => i64::from(i32::MIN),
            DataType::I64 => i64::MIN,
            DataType::Ref => 0,
            DataType::F32 | DataType::F64 | DataType::Void => unreachable!(),
        }
    }

    /// Largest value of the type's domain, as an `i64`.
    ///
    /// `U64` and `Ref` top out at `i64::MAX` since the interval representation is
    /// `i64`-bounded.
    ///
    /// # Panics
    ///
    /// Float and void types have no integral domain; asking for one is a contract
    /// violation.
    #[must_use]
    pub fn max_value(self) -> i64 {
        assert!(
            self.is_range_tracked(),
            "no integral domain for {self:?}"
        );
        match self {
            DataType::Bool => 1,
            DataType::U8 => i64::from(u8::MAX),
            DataType::I8 => i64::from(i8::MAX),
            DataType::U16 => i64::from(u16::MAX),
            DataType::I16 => i64::from(i16::MAX),
            DataType::U32 => i64::from(u32::MAX),
            DataType::I32 => i64::from(i32::MAX),
            DataType::U64 | DataType::I64 | DataType::Ref => i64::MAX,
            DataType::F32 | DataType::F64 | DataType::Void => unreachable!(),
        }
    }
}
