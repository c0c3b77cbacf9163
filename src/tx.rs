use std::fmt;

use serde::{Deserialize, Serialize};

/// A transaction identifier, opaque to the engine.
///
/// Only equality and a stable order are required: ids key the linearizer's
/// ancestor sets and break ties deterministically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Txid([u8; 32]);

impl Txid {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Id whose big-endian tail encodes `value`; ids built this way order
    /// the same as their values. Convenient for hosts and tests that label
    /// transactions with counters.
    pub fn from_low_u64_be(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({self})")
    }
}

/// The slice of mempool metadata the engine reads through the mempool
/// adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MempoolEntry {
    /// When the transaction entered the mempool, in seconds since the
    /// epoch.
    pub arrival_time: i64,
}

/// A transaction that left the mempool because a block confirmed it.
///
/// This is the record the host hands to the engine on every
/// block-connected event; it carries exactly what linearization and
/// latency tracking need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedTransaction {
    pub txid: Txid,
    /// Fee in satoshis.
    pub fee: i64,
    /// Virtual size in vbytes.
    pub vsize: i32,
    /// When the transaction was first seen, in seconds since the epoch.
    pub arrival_time: i64,
    /// Parents of this transaction. Ids that do not resolve within the
    /// same event are treated as confirmed long ago and ignored.
    pub parents: Vec<Txid>,
}

impl RemovedTransaction {
    pub fn fee_frac(&self) -> crate::FeeFrac {
        crate::FeeFrac::new(self.fee, self.vsize)
    }
}

/// Identifier and size of a transaction in a block or block template,
/// enough to weigh template/block overlap without holding the
/// transaction itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSummary {
    pub txid: Txid,
    /// Virtual size in vbytes.
    pub vsize: u64,
}
