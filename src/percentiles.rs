use serde::{Deserialize, Serialize};

use crate::fee_rate::FeeRate;

/// Consensus ceiling on block weight.
pub const MAX_BLOCK_WEIGHT: u64 = 4_000_000;

/// Block weight assumed when projecting what fits in the next block.
pub const DEFAULT_BLOCK_MAX_WEIGHT: u64 = 4_000_000;

/// Weight units per virtual byte.
pub const WITNESS_SCALE_FACTOR: u64 = 4;

/// Feerates observed at the 5th/25th/50th/75th weight percentiles of a
/// block-sized stream of packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPercentiles {
    pub p5: FeeRate,
    pub p25: FeeRate,
    pub p50: FeeRate,
    pub p75: FeeRate,
}

impl BlockPercentiles {
    /// An estimate without a 75th percentile never saw half a block of
    /// weight and is treated as no estimate at all.
    pub fn is_empty(&self) -> bool {
        self.p75 == FeeRate::ZERO
    }
}

/// Walks a stream of `(feerate, vsize)` packages, recording the feerate in
/// effect as cumulative weight first reaches 1/20, 1/4, 1/2 and 3/4 of
/// [`DEFAULT_BLOCK_MAX_WEIGHT`].
///
/// The stream must be feerate-sorted; which direction is the caller's
/// choice and determines the orientation of the result (descending input
/// yields `p5 >= p25 >= p50 >= p75`, ascending the reverse). If the
/// stream's total weight is below half a block, the data is too thin to
/// trust and the empty result is returned.
pub fn calculate_block_percentiles(stats: &[(FeeRate, u64)]) -> BlockPercentiles {
    let thresholds = [
        DEFAULT_BLOCK_MAX_WEIGHT / 20,
        DEFAULT_BLOCK_MAX_WEIGHT / 4,
        DEFAULT_BLOCK_MAX_WEIGHT / 2,
        3 * DEFAULT_BLOCK_MAX_WEIGHT / 4,
    ];
    let mut captured = [None; 4];

    let mut accumulated: u64 = 0;
    for &(fee_rate, vsize) in stats {
        accumulated += vsize * WITNESS_SCALE_FACTOR;
        for (slot, &threshold) in captured.iter_mut().zip(&thresholds) {
            if slot.is_none() && accumulated >= threshold {
                *slot = Some(fee_rate);
            }
        }
    }

    if accumulated < DEFAULT_BLOCK_MAX_WEIGHT / 2 {
        return BlockPercentiles::default();
    }

    BlockPercentiles {
        p5: captured[0].unwrap_or(FeeRate::ZERO),
        p25: captured[1].unwrap_or(FeeRate::ZERO),
        p50: captured[2].unwrap_or(FeeRate::ZERO),
        p75: captured[3].unwrap_or(FeeRate::ZERO),
    }
}
