use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::ForecastError;
use crate::event_bus::{BlockConnectedEvent, BlockObserver};
use crate::fee_rate::FeeRate;
use crate::forecast_result::ForecastResult;
use crate::forecaster::{Forecaster, ForecasterKind};
use crate::linearizer::linearize;
use crate::percentiles::{calculate_block_percentiles, BlockPercentiles};
use crate::tx::{RemovedTransaction, Txid};

/// Oldest transaction age tracked, in hours (three weeks).
pub const MAX_HOURS: usize = 504;

pub const SECONDS_IN_HOUR: i64 = 60 * 60;

/// How often the host's scheduler should call
/// [`NTimeForecaster::update_tracking_stats`].
pub const STATS_UPDATE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// A confirmed transaction as tracked for latency statistics. Feerate and
/// size are those of the linearization chunk the transaction confirmed
/// in, since the chunk is what a miner actually priced.
#[derive(Debug, Clone, Copy)]
struct ConfirmedTx {
    received_time: i64,
    confirmed_time: i64,
    fee_rate: FeeRate,
    vsize: u32,
}

/// `tracking[age][latency]` holds transactions first seen `age` hours ago
/// that confirmed within `latency + 1` hours of arrival. A transaction
/// seen `age` hours ago cannot have taken longer than that to confirm, so
/// row `age` only needs `age + 1` buckets.
type TrackingMatrix = Vec<Vec<Vec<ConfirmedTx>>>;

/// Forecasts confirmation fee rates for hour-denominated targets from the
/// observed latency distribution of recently confirmed transactions.
pub struct NTimeForecaster {
    state: RwLock<State>,
}

struct State {
    chain_tip_height: u32,
    tracking: TrackingMatrix,
}

fn empty_tracking() -> TrackingMatrix {
    (0..MAX_HOURS).map(|age| vec![Vec::new(); age + 1]).collect()
}

impl NTimeForecaster {
    pub fn new() -> Self {
        Self { state: RwLock::new(State { chain_tip_height: 0, tracking: empty_tracking() }) }
    }

    /// Ages the matrix by one hour: every row moves down one slot and
    /// gains a latency bucket, the freshest row empties, and the oldest
    /// row falls off the end.
    pub fn update_tracking_stats(&self) {
        let kind = ForecasterKind::NTime;
        debug!(forecaster = %kind, "aging tracking stats by one hour");

        let mut state = self.state.write();
        let mut aged = empty_tracking();
        for (age, row) in state.tracking.iter_mut().take(MAX_HOURS - 1).enumerate() {
            let mut shifted = std::mem::take(row);
            shifted.push(Vec::new());
            aged[age + 1] = shifted;
        }
        state.tracking = aged;
    }

    fn record(tracking: &mut TrackingMatrix, tx: ConfirmedTx) {
        let latency = tx.confirmed_time - tx.received_time;
        let bucket = if latency <= 0 {
            0
        } else {
            ((latency + SECONDS_IN_HOUR - 1) / SECONDS_IN_HOUR - 1) as usize
        };
        if bucket >= MAX_HOURS {
            debug!(
                forecaster = %ForecasterKind::NTime,
                latency_secs = latency,
                "confirmation latency exceeds the tracking horizon, discarding"
            );
            return;
        }
        tracking[bucket][bucket].push(tx);
    }

    /// Tracked transactions received within `start_hr` hours and confirmed
    /// at least `end_hr` hours ago, sorted by ascending feerate.
    fn txs_within_time(&self, start_hr: usize, end_hr: usize) -> Vec<(FeeRate, u64)> {
        let now = Utc::now().timestamp();
        let start_timestamp = now - start_hr as i64 * SECONDS_IN_HOUR;
        let end_timestamp = now - end_hr as i64 * SECONDS_IN_HOUR;

        let state = self.state.read();
        let mut in_range = Vec::new();
        for row in state.tracking.iter().take(start_hr.min(MAX_HOURS - 1) + 1) {
            for bucket in row {
                for tx in bucket {
                    if tx.received_time >= start_timestamp && tx.confirmed_time <= end_timestamp {
                        in_range.push((tx.fee_rate, u64::from(tx.vsize)));
                    }
                }
            }
        }
        in_range.sort_by_key(|&(fee_rate, _)| fee_rate);
        in_range
    }

    /// Percentiles over everything seen and confirmed within the last
    /// `hours` hours.
    fn window_estimate(&self, hours: usize) -> BlockPercentiles {
        let stats = self.txs_within_time(hours, 0);
        debug!(
            forecaster = %ForecasterKind::NTime,
            hours,
            transactions = stats.len(),
            "computing window estimate"
        );
        calculate_block_percentiles(&stats)
    }

    /// Percentiles over the previous day-aligned window of the same
    /// length, for a longer-term baseline.
    fn historical_estimate(&self, hours: usize) -> BlockPercentiles {
        let start_hr = hours.div_ceil(24) * 24;
        let end_hr = start_hr - hours;
        let stats = self.txs_within_time(start_hr, end_hr);
        debug!(
            forecaster = %ForecasterKind::NTime,
            hours,
            start_hr,
            end_hr,
            transactions = stats.len(),
            "computing historical estimate"
        );
        calculate_block_percentiles(&stats)
    }
}

impl Default for NTimeForecaster {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockObserver for NTimeForecaster {
    fn on_block_connected(&self, event: &BlockConnectedEvent) {
        let kind = ForecasterKind::NTime;
        let by_txid: HashMap<Txid, &RemovedTransaction> =
            event.txs_removed_for_block.iter().map(|tx| (tx.txid, tx)).collect();

        let linearization = linearize(&event.txs_removed_for_block);
        let now = Utc::now().timestamp();

        let mut state = self.state.write();
        state.chain_tip_height = event.height;
        for (txid, &chunk_index) in &linearization.inclusion_order {
            let Some(tx) = by_txid.get(txid) else { continue };
            let chunk = linearization.chunks[chunk_index];
            Self::record(
                &mut state.tracking,
                ConfirmedTx {
                    received_time: tx.arrival_time,
                    confirmed_time: now,
                    fee_rate: FeeRate::from(chunk),
                    vsize: chunk.size.max(0) as u32,
                },
            );
        }
        debug!(
            forecaster = %kind,
            height = event.height,
            tracked = event.txs_removed_for_block.len(),
            "tracked confirmed transactions for new block"
        );
    }
}

impl Forecaster for NTimeForecaster {
    fn kind(&self) -> ForecasterKind {
        ForecasterKind::NTime
    }

    fn estimate(&self, target_hours: u32) -> ForecastResult {
        let kind = self.kind();
        let height = self.state.read().chain_tip_height;

        if let Some(error) = super::target_error(kind, target_hours, MAX_HOURS as u32) {
            return ForecastResult::failure(kind, height, error);
        }

        let window = self.window_estimate(target_hours as usize);
        if window.is_empty() {
            return ForecastResult::failure(
                kind,
                height,
                ForecastError::insufficient_data(format!(
                    "{kind}: not enough tracked data to provide a window estimate"
                )),
            );
        }

        let historical = self.historical_estimate(target_hours as usize);
        if historical.is_empty() {
            return ForecastResult::failure(
                kind,
                height,
                ForecastError::insufficient_data(format!(
                    "{kind}: not enough tracked data to provide a historical estimate"
                )),
            );
        }

        // Serve whichever side promises the lower 75th percentile; when
        // the recent window is hotter than the baseline, the baseline is
        // the safer advice, and vice versa.
        let chosen = if window.p75 < historical.p75 { window } else { historical };
        debug!(
            forecaster = %kind,
            height,
            target_hours,
            p5 = chosen.p5.sat_per_kvb(),
            p25 = chosen.p25.sat_per_kvb(),
            p50 = chosen.p50.sat_per_kvb(),
            p75 = chosen.p75.sat_per_kvb(),
            "time-bucketed percentiles"
        );
        ForecastResult::success(kind, height, chosen.p25, chosen.p50)
    }

    fn max_target(&self) -> u32 {
        MAX_HOURS as u32
    }
}
