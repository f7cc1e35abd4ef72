//! Closed integer intervals and condition-code narrowing.
//!
//! [`BoundsRange`] is the value domain of the range analysis: a closed interval
//! `[left, right]` over `i64`, wide enough to hold every tracked type's domain
//! (`U64` is capped at `i64::MAX` and excluded from narrowing elsewhere). The
//! interesting operation is [`BoundsRange::try_narrow`]: given the ranges of a
//! comparison's operands and the condition code known to hold, it returns the
//! sharpened pair, or `None` when the condition can never hold.

use std::fmt;

use crate::ir::{ConditionCode, DataType, InstId};

/// A closed interval `[left, right]` with `left <= right`.
///
/// Ranges are plain values; narrowing and fitting return new ranges instead of
/// mutating. The optional `len_array` marks ranges whose upper bound was derived
/// from an array length, for consumers that reason about bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsRange {
    left: i64,
    right: i64,
    len_array: Option<InstId>,
}

impl BoundsRange {
    /// The maximal range of a type's domain.
    ///
    /// # Panics
    ///
    /// Panics for float and void types; those have no integral domain.
    #[must_use]
    pub fn new(ty: DataType) -> BoundsRange {
        BoundsRange {
            left: ty.min_value(),
            right: ty.max_value(),
            len_array: None,
        }
    }

    /// The point range `[value, value]`.
    #[must_use]
    pub fn point(value: i64) -> BoundsRange {
        BoundsRange {
            left: value,
            right: value,
            len_array: None,
        }
    }

    /// The range `[left, right]`. Requires `left <= right`.
    #[must_use]
    pub fn of(left: i64, right: i64) -> BoundsRange {
        debug_assert!(left <= right, "inverted range [{left}, {right}]");
        BoundsRange {
            left,
            right,
            len_array: None,
        }
    }

    /// The same bounds with an array-length provenance attached.
    #[must_use]
    pub fn with_len_array(self, len_array: Option<InstId>) -> BoundsRange {
        BoundsRange { len_array, ..self }
    }

    /// Lower bound.
    #[must_use]
    pub fn left(self) -> i64 {
        self.left
    }

    /// Upper bound.
    #[must_use]
    pub fn right(self) -> i64 {
        self.right
    }

    /// The array-length instruction this range's upper bound was derived from.
    #[must_use]
    pub fn len_array(self) -> Option<InstId> {
        self.len_array
    }

    /// Whether the range holds exactly one value.
    #[must_use]
    pub fn is_const(self) -> bool {
        self.left == self.right
    }

    /// Whether the range spans the type's whole domain, carrying no information.
    #[must_use]
    pub fn is_max_range(self, ty: DataType) -> bool {
        self.left == ty.min_value() && self.right == ty.max_value()
    }

    /// Whether both ranges hold the same single value.
    ///
    /// Identical wide ranges prove nothing about the values inside them, so
    /// only constant ranges compare equal.
    #[must_use]
    pub fn is_equal(self, other: BoundsRange) -> bool {
        self.is_const() && other.is_const() && self.left == other.left
    }

    /// Whether every value of `self` is below every value of `other`.
    #[must_use]
    pub fn is_less(self, other: BoundsRange) -> bool {
        self.right < other.left
    }

    /// Whether every value of the range is below the value produced by `inst`.
    ///
    /// Instruction-shaped bounds are not tracked, so nothing is ever provable
    /// here and the answer is always `false`.
    #[must_use]
    pub fn is_less_than_inst(self, _inst: InstId) -> bool {
        false
    }

    /// Whether every value of `self` is above every value of `other`.
    #[must_use]
    pub fn is_more(self, other: BoundsRange) -> bool {
        self.left > other.right
    }

    /// Whether every value of `self` is at least every value of `other`.
    #[must_use]
    pub fn is_more_or_equal(self, other: BoundsRange) -> bool {
        self.left >= other.right
    }

    /// Whether the range contains no negative value.
    #[must_use]
    pub fn is_not_negative(self) -> bool {
        self.left >= 0
    }

    /// Whether the range contains only negative values.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.right < 0
    }

    /// Fits the range into a type's domain.
    ///
    /// A range with any bound outside the domain collapses to the whole domain
    /// rather than being clamped bound-by-bound; a partially clamped interval
    /// would claim precision the analysis does not have.
    #[must_use]
    pub fn fit_in(self, ty: DataType) -> BoundsRange {
        let (min, max) = (ty.min_value(), ty.max_value());
        let inside = |v: i64| (min..=max).contains(&v);
        if inside(self.left) && inside(self.right) {
            self
        } else {
            BoundsRange::of(min, max)
        }
    }

    /// The smallest range covering every input, or `None` for an empty slice.
    ///
    /// Array-length provenance survives only when every input carries the same
    /// one.
    #[must_use]
    pub fn union_of(ranges: &[BoundsRange]) -> Option<BoundsRange> {
        let (first, rest) = ranges.split_first()?;
        let mut union = *first;
        for range in rest {
            union.left = union.left.min(range.left);
            union.right = union.right.max(range.right);
            if union.len_array != range.len_array {
                union.len_array = None;
            }
        }
        Some(union)
    }

    /// Narrows both operand ranges of a comparison known to be true.
    ///
    /// Returns the sharpened `(lhs, rhs)` pair, or `None` when the condition
    /// cannot hold for any value pair, which marks the guarded edge as
    /// unreachable. Codes with nothing to say about a given overlap shape
    /// return the inputs unchanged; `Ne` facts go through
    /// [`narrow_by_ne`](BoundsRange::narrow_by_ne) instead.
    #[must_use]
    pub fn try_narrow(
        cc: ConditionCode,
        lhs: BoundsRange,
        rhs: BoundsRange,
    ) -> Option<(BoundsRange, BoundsRange)> {
        use ConditionCode::{A, Ae, B, Be, Eq, Ge, Gt, Le, Lt};

        let (ll, lr) = (lhs.left, lhs.right);
        let (rl, rr) = (rhs.left, rhs.right);
        match Overlap::classify(lhs, rhs) {
            Overlap::StraddlesLow => match cc {
                Gt | A => {
                    if rl == lr {
                        return None;
                    }
                    Some((lhs.resized(rl + 1, lr), rhs.resized(rl, lr - 1)))
                }
                Ge | Ae | Eq => Some((lhs.resized(rl, lr), rhs.resized(rl, lr))),
                _ => Some((lhs, rhs)),
            },
            Overlap::Below => match cc {
                Gt | Ge | A | Ae => None,
                _ => Some((lhs, rhs)),
            },
            Overlap::Encloses => match cc {
                Gt | A => Some((lhs.resized(rl + 1, lr), rhs)),
                Ge | Ae => Some((lhs.resized(rl, lr), rhs)),
                Lt | B => {
                    if ll == rr {
                        return None;
                    }
                    Some((lhs.resized(ll, rr - 1), rhs))
                }
                Le | Be => Some((lhs.resized(ll, rr), rhs)),
                Eq => Some((lhs.resized(rl, rr), rhs)),
                _ => Some((lhs, rhs)),
            },
            Overlap::StraddlesHigh => match cc {
                Lt | B => {
                    if ll == rr {
                        return None;
                    }
                    Some((lhs.resized(ll, rr - 1), rhs.resized(ll + 1, rr)))
                }
                Le | Be | Eq => Some((lhs.resized(ll, rr), rhs.resized(ll, rr))),
                _ => Some((lhs, rhs)),
            },
            Overlap::Above => match cc {
                Lt | Le | B | Be => None,
                _ => Some((lhs, rhs)),
            },
            Overlap::Enclosed => match cc {
                Gt | A => Some((lhs, rhs.resized(rl, lr - 1))),
                Ge | Ae => Some((lhs, rhs.resized(rl, lr))),
                Lt | B => Some((lhs, rhs.resized(ll + 1, rr))),
                Le | Be => Some((lhs, rhs.resized(ll, rr))),
                Eq => Some((lhs, rhs.resized(ll, lr))),
                _ => Some((lhs, rhs)),
            },
        }
    }

    /// Narrows a pair of operand ranges under a known-true `!=` fact.
    ///
    /// Inequality only bites when one side is a single point sitting exactly on
    /// a bound of the other side; that bound is then excluded. Everything else,
    /// including two point ranges, passes through unchanged.
    #[must_use]
    pub fn narrow_by_ne(lhs: BoundsRange, rhs: BoundsRange) -> (BoundsRange, BoundsRange) {
        match (lhs.is_const(), rhs.is_const()) {
            (true, false) => (lhs, rhs.exclude_bound(lhs.left)),
            (false, true) => (lhs.exclude_bound(rhs.left), rhs),
            _ => (lhs, rhs),
        }
    }

    fn exclude_bound(self, value: i64) -> BoundsRange {
        if self.is_const() {
            return self;
        }
        if value == self.left {
            self.resized(self.left + 1, self.right)
        } else if value == self.right {
            self.resized(self.left, self.right - 1)
        } else {
            self
        }
    }

    fn resized(self, left: i64, right: i64) -> BoundsRange {
        debug_assert!(left <= right, "inverted range [{left}, {right}]");
        BoundsRange { left, right, ..self }
    }
}

impl fmt::Display for BoundsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.left, self.right)
    }
}

/// Relative position of two closed intervals, from the left interval's point of
/// view.
///
/// Conditions are tested in declaration order; intervals sharing a bound
/// classify as the first matching variant, so the narrowing tables never see a
/// shape whose formulas would produce an inverted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// `ll <= rl <= lr <= rr`: left straddles the right interval's lower bound.
    StraddlesLow,
    /// `lr < rl`: left lies entirely below right.
    Below,
    /// `ll <= rl && rr <= lr`: right is nested inside left.
    Encloses,
    /// `rl <= ll <= rr <= lr`: left straddles the right interval's upper bound.
    StraddlesHigh,
    /// `rr < ll`: left lies entirely above right.
    Above,
    /// `rl <= ll && lr <= rr`: left is nested inside right.
    Enclosed,
}

impl Overlap {
    /// Classifies the relative position of `lhs` and `rhs`.
    #[must_use]
    pub fn classify(lhs: BoundsRange, rhs: BoundsRange) -> Overlap {
        let (ll, lr) = (lhs.left, lhs.right);
        let (rl, rr) = (rhs.left, rhs.right);
        if ll <= rl && rl <= lr && lr <= rr {
            Overlap::StraddlesLow
        } else if lr < rl {
            Overlap::Below
        } else if ll <= rl && rr <= lr {
            Overlap::Encloses
        } else if rl <= ll && ll <= rr && rr <= lr {
            Overlap::StraddlesHigh
        } else if rr < ll {
            Overlap::Above
        } else {
            debug_assert!(rl <= ll && lr <= rr);
            Overlap::Enclosed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BoundsRange, Overlap};
    use crate::ir::{ConditionCode, DataType, InstId};

    #[test]
    fn test_type_domains() {
        let r = BoundsRange::new(DataType::U8);
        assert_eq!((r.left(), r.right()), (0, 255));
        let r = BoundsRange::new(DataType::Ref);
        assert_eq!((r.left(), r.right()), (0, i64::MAX));
        assert!(r.is_max_range(DataType::Ref));
    }

    #[test]
    fn test_point_and_predicates() {
        let five = BoundsRange::point(5);
        assert!(five.is_const());
        assert!(five.is_not_negative());
        assert!(BoundsRange::of(-9, -1).is_negative());
        assert!(BoundsRange::of(0, 3).is_less(BoundsRange::of(4, 9)));
        assert!(!BoundsRange::of(0, 4).is_less(BoundsRange::of(4, 9)));
        assert!(BoundsRange::of(7, 9).is_more(BoundsRange::of(0, 6)));
        assert!(BoundsRange::of(6, 9).is_more_or_equal(BoundsRange::of(0, 6)));
    }

    #[test]
    fn test_is_equal_needs_matching_constants() {
        assert!(BoundsRange::point(5).is_equal(BoundsRange::point(5)));
        assert!(!BoundsRange::point(5).is_equal(BoundsRange::point(6)));
        // A range equal to itself still proves nothing about the value.
        let wide = BoundsRange::of(0, 9);
        assert!(!wide.is_equal(wide));
    }

    #[test]
    fn test_is_less_than_inst_never_proves() {
        assert!(!BoundsRange::point(-1).is_less_than_inst(InstId::new(3)));
    }

    #[test]
    fn test_fit_in_collapses_out_of_domain_bounds() {
        let wide = BoundsRange::of(-1, 300);
        let fitted = wide.fit_in(DataType::U8);
        assert_eq!(fitted, BoundsRange::of(0, 255));

        // In-domain ranges are untouched, not clamped toward the domain edges.
        let narrow = BoundsRange::of(10, 20);
        assert_eq!(narrow.fit_in(DataType::U8), narrow);

        // One bad bound is enough to collapse the whole interval.
        let half_out = BoundsRange::of(10, 300);
        assert_eq!(half_out.fit_in(DataType::U8), BoundsRange::of(0, 255));
    }

    #[test]
    fn test_fit_in_is_idempotent() {
        for range in [
            BoundsRange::of(-1000, 1000),
            BoundsRange::of(5, 5),
            BoundsRange::new(DataType::I64),
        ] {
            for ty in [DataType::I8, DataType::U16, DataType::I32] {
                let once = range.fit_in(ty);
                assert_eq!(once.fit_in(ty), once, "{range} in {ty:?}");
            }
        }
    }

    #[test]
    fn test_union_identity_and_monotonicity() {
        let r = BoundsRange::of(3, 7).with_len_array(Some(InstId::new(4)));
        assert_eq!(BoundsRange::union_of(&[r]), Some(r));

        let ranges = [
            BoundsRange::of(0, 5),
            BoundsRange::of(3, 9),
            BoundsRange::of(-2, -1),
        ];
        let union = BoundsRange::union_of(&ranges).unwrap();
        assert_eq!(union, BoundsRange::of(-2, 9));
        for r in ranges {
            assert!(union.left() <= r.left() && union.right() >= r.right());
        }
    }

    #[test]
    fn test_union_of_empty_is_none() {
        assert_eq!(BoundsRange::union_of(&[]), None);
    }

    #[test]
    fn test_union_drops_mismatched_len_array() {
        let a = BoundsRange::of(0, 5).with_len_array(Some(InstId::new(1)));
        let b = BoundsRange::of(2, 9).with_len_array(Some(InstId::new(2)));
        let union = BoundsRange::union_of(&[a, b]).unwrap();
        assert_eq!(union.len_array(), None);

        let c = BoundsRange::of(2, 9).with_len_array(Some(InstId::new(1)));
        let union = BoundsRange::union_of(&[a, c]).unwrap();
        assert_eq!(union.len_array(), Some(InstId::new(1)));
    }

    #[test]
    fn test_overlap_classification() {
        let classify = |l: (i64, i64), r: (i64, i64)| {
            Overlap::classify(BoundsRange::of(l.0, l.1), BoundsRange::of(r.0, r.1))
        };
        assert_eq!(classify((0, 5), (3, 9)), Overlap::StraddlesLow);
        assert_eq!(classify((0, 2), (3, 9)), Overlap::Below);
        assert_eq!(classify((0, 10), (3, 9)), Overlap::Encloses);
        assert_eq!(classify((5, 12), (3, 9)), Overlap::StraddlesHigh);
        assert_eq!(classify((10, 12), (3, 9)), Overlap::Above);
        assert_eq!(classify((4, 8), (3, 9)), Overlap::Enclosed);
    }

    #[test]
    fn test_overlap_ties_take_the_first_matching_case() {
        // Identical points satisfy several case conditions; the first one wins.
        let p = BoundsRange::point(5);
        assert_eq!(Overlap::classify(p, p), Overlap::StraddlesLow);
        // A shared bound between nesting shapes resolves before the nested cases.
        assert_eq!(
            Overlap::classify(BoundsRange::of(0, 5), BoundsRange::of(0, 9)),
            Overlap::StraddlesLow
        );
    }

    #[test]
    fn test_narrow_gt_on_enclosed_constant() {
        // [0, 10] > [5, 5] leaves [6, 10] on the left, the point untouched.
        let (l, r) = BoundsRange::try_narrow(
            ConditionCode::Gt,
            BoundsRange::of(0, 10),
            BoundsRange::point(5),
        )
        .unwrap();
        assert_eq!(l, BoundsRange::of(6, 10));
        assert_eq!(r, BoundsRange::point(5));
    }

    #[test]
    fn test_narrow_gt_straddling_low() {
        let (l, r) = BoundsRange::try_narrow(
            ConditionCode::Gt,
            BoundsRange::of(0, 5),
            BoundsRange::of(3, 9),
        )
        .unwrap();
        assert_eq!(l, BoundsRange::of(4, 5));
        assert_eq!(r, BoundsRange::of(3, 4));
    }

    #[test]
    fn test_narrow_gt_point_overlap_is_unreachable() {
        // [0, 5] > [5, 9] can only hold at 5 > 5, which never does.
        let narrowed = BoundsRange::try_narrow(
            ConditionCode::Gt,
            BoundsRange::of(0, 5),
            BoundsRange::of(5, 9),
        );
        assert_eq!(narrowed, None);
    }

    #[test]
    fn test_narrow_ge_and_eq_intersect() {
        let (l, r) = BoundsRange::try_narrow(
            ConditionCode::Ge,
            BoundsRange::of(0, 5),
            BoundsRange::of(3, 9),
        )
        .unwrap();
        assert_eq!(l, BoundsRange::of(3, 5));
        assert_eq!(r, BoundsRange::of(3, 5));

        let (l, r) = BoundsRange::try_narrow(
            ConditionCode::Eq,
            BoundsRange::of(4, 8),
            BoundsRange::of(3, 9),
        )
        .unwrap();
        assert_eq!(l, BoundsRange::of(4, 8));
        assert_eq!(r, BoundsRange::of(4, 8));
    }

    #[test]
    fn test_narrow_contradictions_are_none() {
        // Disjoint below: left can never be greater.
        assert_eq!(
            BoundsRange::try_narrow(
                ConditionCode::Gt,
                BoundsRange::of(0, 2),
                BoundsRange::of(3, 9)
            ),
            None
        );
        assert_eq!(
            BoundsRange::try_narrow(
                ConditionCode::Ae,
                BoundsRange::of(0, 2),
                BoundsRange::of(3, 9)
            ),
            None
        );
        // Disjoint above: left can never be less.
        assert_eq!(
            BoundsRange::try_narrow(
                ConditionCode::Le,
                BoundsRange::of(10, 12),
                BoundsRange::of(3, 9)
            ),
            None
        );
    }

    #[test]
    fn test_narrow_unrelated_code_is_unchanged() {
        // An equality test over disjoint ranges is left to other passes.
        let l = BoundsRange::of(0, 2);
        let r = BoundsRange::of(3, 9);
        assert_eq!(
            BoundsRange::try_narrow(ConditionCode::Eq, l, r),
            Some((l, r))
        );
    }

    #[test]
    fn test_narrow_lt_straddling_high() {
        let (l, r) = BoundsRange::try_narrow(
            ConditionCode::Lt,
            BoundsRange::of(5, 12),
            BoundsRange::of(3, 9),
        )
        .unwrap();
        assert_eq!(l, BoundsRange::of(5, 8));
        assert_eq!(r, BoundsRange::of(6, 9));
    }

    #[test]
    fn test_narrow_lt_shared_bound_is_unreachable() {
        assert_eq!(
            BoundsRange::try_narrow(
                ConditionCode::Lt,
                BoundsRange::of(9, 12),
                BoundsRange::of(3, 9)
            ),
            None
        );
    }

    #[test]
    fn test_narrow_enclosed_shrinks_the_outer_range() {
        let (l, r) = BoundsRange::try_narrow(
            ConditionCode::Lt,
            BoundsRange::of(4, 8),
            BoundsRange::of(3, 9),
        )
        .unwrap();
        assert_eq!(l, BoundsRange::of(4, 8));
        assert_eq!(r, BoundsRange::of(5, 9));

        let (l, r) = BoundsRange::try_narrow(
            ConditionCode::A,
            BoundsRange::of(4, 8),
            BoundsRange::of(3, 9),
        )
        .unwrap();
        assert_eq!(l, BoundsRange::of(4, 8));
        assert_eq!(r, BoundsRange::of(3, 7));
    }

    #[test]
    fn test_narrow_by_ne_excludes_touched_bound() {
        let five = BoundsRange::point(5);
        let (l, r) = BoundsRange::narrow_by_ne(five, BoundsRange::of(5, 9));
        assert_eq!(l, five);
        assert_eq!(r, BoundsRange::of(6, 9));

        let (l, r) = BoundsRange::narrow_by_ne(BoundsRange::of(0, 5), five);
        assert_eq!(l, BoundsRange::of(0, 4));
        assert_eq!(r, five);
    }

    #[test]
    fn test_narrow_by_ne_without_bound_contact_is_unchanged() {
        let three = BoundsRange::point(3);
        let range = BoundsRange::of(0, 9);
        assert_eq!(BoundsRange::narrow_by_ne(three, range), (three, range));
    }

    #[test]
    fn test_narrow_by_ne_two_points_unchanged() {
        let a = BoundsRange::point(5);
        let b = BoundsRange::point(5);
        assert_eq!(BoundsRange::narrow_by_ne(a, b), (a, b));
    }

    #[test]
    fn test_narrowing_preserves_len_array() {
        let len = Some(InstId::new(7));
        let lhs = BoundsRange::of(0, 10);
        let rhs = BoundsRange::of(0, 100).with_len_array(len);
        let (_, r) =
            BoundsRange::try_narrow(ConditionCode::Ge, lhs, rhs).unwrap();
        assert_eq!(r.len_array(), len);
    }
}
