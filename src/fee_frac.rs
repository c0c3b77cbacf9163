use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// An exact fee-and-size fraction.
///
/// A `FeeFrac` represents a fee (in satoshis) paid for a size (in virtual
/// bytes) without ever dividing the two, so feerate comparisons are exact.
/// The size of a `FeeFrac` cannot be zero unless the fee is also zero; the
/// all-zero value is called *empty* and stands in for "undefined feerate".
///
/// `FeeFrac`s are totally ordered: first by increasing feerate, then by
/// *decreasing* size (for equal feerates, the smaller package is the better
/// one and therefore sorts higher). The empty `FeeFrac` sorts above
/// everything else. For example, the following values are in ascending
/// order:
///
/// - fee=0 size=1 (feerate 0)
/// - fee=1 size=2 (feerate 0.5)
/// - fee=2 size=2 (feerate 1)
/// - fee=1 size=1 (feerate 1)
/// - fee=2 size=1 (feerate 2)
/// - fee=0 size=0 (empty)
///
/// [`FeeFrac::feerate_cmp`] and the strict helpers compare feerate only,
/// treating equal feerates of different size as equivalent and the empty
/// value as incomparable to everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeFrac {
    pub fee: i64,
    pub size: i32,
}

impl FeeFrac {
    /// The empty (undefined-feerate) value.
    pub const EMPTY: FeeFrac = FeeFrac { fee: 0, size: 0 };

    /// Builds a `FeeFrac` from a fee and a size.
    pub fn new(fee: i64, size: i32) -> Self {
        debug_assert!(size != 0 || fee == 0, "zero-size FeeFrac must carry zero fee");
        Self { fee, size }
    }

    /// True iff both fee and size are zero.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Widening multiply used for cross-product feerate comparisons.
    ///
    /// The products of a 64-bit fee and a 32-bit size need 96 bits; `i128`
    /// holds them losslessly.
    #[inline]
    fn mul(a: i64, b: i32) -> i128 {
        i128::from(a) * i128::from(b)
    }

    /// Portable variant of the widening multiply, composed from two
    /// half-width multiplies. Returns a `(high, low)` pair whose
    /// lexicographic order matches the order of the full products.
    ///
    /// Kept (and tested against [`Self::mul`]) to document the arithmetic
    /// for targets without native 128-bit support.
    #[inline]
    pub fn mul_fallback(a: i64, b: i32) -> (i64, u32) {
        let low = (a as u32 as i64) * i64::from(b);
        let high = (a >> 32) * i64::from(b);
        (high + (low >> 32), low as u32)
    }

    /// Compares two `FeeFrac`s by feerate alone.
    ///
    /// Equal feerates of different size compare as `Equal`, and the empty
    /// value compares `Equal` to everything (it is neither lower nor higher
    /// in feerate than any other value).
    pub fn feerate_cmp(&self, other: &FeeFrac) -> Ordering {
        Self::mul(self.fee, other.size).cmp(&Self::mul(other.fee, self.size))
    }

    /// True iff `self` has strictly lower feerate than `other`.
    pub fn feerate_lt(&self, other: &FeeFrac) -> bool {
        self.feerate_cmp(other) == Ordering::Less
    }

    /// True iff `self` has strictly higher feerate than `other`.
    pub fn feerate_gt(&self, other: &FeeFrac) -> bool {
        self.feerate_cmp(other) == Ordering::Greater
    }
}

impl Ord for FeeFrac {
    fn cmp(&self, other: &Self) -> Ordering {
        let cross_a = Self::mul(self.fee, other.size);
        let cross_b = Self::mul(other.fee, self.size);
        if cross_a == cross_b {
            // Tie on feerate: the smaller size is the better value. Note
            // the reversal; this is also what makes the empty value the
            // maximum.
            other.size.cmp(&self.size)
        } else {
            cross_a.cmp(&cross_b)
        }
    }
}

impl PartialOrd for FeeFrac {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for FeeFrac {
    type Output = FeeFrac;

    fn add(self, rhs: FeeFrac) -> FeeFrac {
        FeeFrac::new(self.fee + rhs.fee, self.size + rhs.size)
    }
}

impl Sub for FeeFrac {
    type Output = FeeFrac;

    fn sub(self, rhs: FeeFrac) -> FeeFrac {
        // Differences are direction coefficients; a negative fee over a
        // positive size is legitimate here.
        FeeFrac { fee: self.fee - rhs.fee, size: self.size - rhs.size }
    }
}

impl AddAssign for FeeFrac {
    fn add_assign(&mut self, rhs: FeeFrac) {
        self.fee += rhs.fee;
        self.size += rhs.size;
    }
}

impl SubAssign for FeeFrac {
    fn sub_assign(&mut self, rhs: FeeFrac) {
        self.fee -= rhs.fee;
        self.size -= rhs.size;
    }
}
