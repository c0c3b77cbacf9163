use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fee_frac::FeeFrac;

/// A fee rate expressed in satoshis per 1000 virtual bytes.
///
/// This is the rounded, human-facing rendering of a [`FeeFrac`]; all exact
/// ordering decisions happen on `FeeFrac` and results are converted to
/// `FeeRate` at the edge.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FeeRate {
    sat_per_kvb: i64,
}

impl FeeRate {
    /// The zero fee rate, also used as the "no estimate" marker.
    pub const ZERO: FeeRate = FeeRate { sat_per_kvb: 0 };

    /// Fee rate paying `fee` satoshis for `vsize` virtual bytes.
    ///
    /// A zero `vsize` yields the zero rate.
    pub fn new(fee: i64, vsize: u64) -> Self {
        if vsize == 0 {
            return Self::ZERO;
        }
        Self { sat_per_kvb: fee.saturating_mul(1000) / vsize as i64 }
    }

    pub const fn from_sat_per_kvb(sat_per_kvb: i64) -> Self {
        Self { sat_per_kvb }
    }

    pub const fn sat_per_kvb(&self) -> i64 {
        self.sat_per_kvb
    }
}

impl From<FeeFrac> for FeeRate {
    fn from(frac: FeeFrac) -> Self {
        Self::new(frac.fee, frac.size.max(0) as u64)
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sat/kvB", self.sat_per_kvb)
    }
}
