//! The read-only surface the engine needs from its host node.
//!
//! Forecasters never hold a reference to the host's chain or mempool
//! state; each is constructed with the narrow handles below. Whatever
//! lock discipline the host uses (conventionally: chain state before
//! mempool) lives behind these traits; the engine itself takes no host
//! locks.

use crate::fee_rate::FeeRate;
use crate::tx::{MempoolEntry, Txid};

/// View of the active chain.
pub trait ChainView: Send + Sync {
    /// Height of the current chain tip.
    fn active_tip_height(&self) -> u32;
}

/// View of the host's mempool.
pub trait MempoolView: Send + Sync {
    /// True once the initial mempool load from disk has been attempted.
    fn load_tried(&self) -> bool;

    /// Metadata for an unconfirmed transaction, if it is in the mempool.
    fn entry(&self, txid: &Txid) -> Option<MempoolEntry>;
}

/// A next-block linearization of the current mempool.
///
/// Both vectors run in inclusion order and index the same packages: the
/// feerate and virtual size of each package, and the first transaction of
/// each package (used to look up arrival times).
#[derive(Debug, Clone, Default)]
pub struct NextBlockTemplate {
    pub package_feerates: Vec<(FeeRate, u64)>,
    pub package_reps: Vec<Txid>,
}

impl NextBlockTemplate {
    pub fn is_empty(&self) -> bool {
        self.package_feerates.is_empty()
    }
}

/// Produces next-block templates on demand.
///
/// Hosts implement this by running the linearizer over the live mempool
/// under their own locks; the call may block on those locks but must not
/// do unbounded work beyond linearizing the current mempool contents.
pub trait TemplateProvider: Send + Sync {
    fn next_block_template(&self) -> NextBlockTemplate;
}
