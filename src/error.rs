//! Error types for the AXI transaction engine.
//!
//! Every variant is fatal to the enclosing test: agents return them from their phase methods and
//! the driver is expected to stop the simulation. Nothing in the crate retries.

use thiserror::Error;

use crate::axi::encodings::Channel;
use crate::sim::Cycle;

/// Result type alias for BFM operations
pub type Result<T> = std::result::Result<T, BfmError>;

#[derive(Debug, Error)]
pub enum BfmError {
    /// Enqueue on a bounded queue that already holds `capacity` entries.
    #[error("{queue}: enqueue on a full queue (capacity {capacity})")]
    QueueFull { queue: String, capacity: usize },

    /// `deq`, `peek` or `back` on an empty queue.
    #[error("{queue}: {op} on an empty queue")]
    QueueEmpty { queue: String, op: &'static str },

    /// A response had to be allocated but no request is pending for it.
    #[error("[{agent} resp alloc error] {channel} response without a pending request")]
    NoPendingRequest { agent: String, channel: Channel },

    /// An outstanding task reached its timeout threshold.
    #[error("[Timeout!!!] task {name} on {channel} allocated at cycle {alloc_cycle} outstanding for {threshold} cycles")]
    Timeout {
        name: String,
        channel: Channel,
        alloc_cycle: Cycle,
        threshold: u64,
    },

    /// The DUT broke an AXI4 rule.
    #[error("[{agent}] protocol violation on {channel}: {reason}")]
    Protocol {
        agent: String,
        channel: Channel,
        reason: String,
    },

    /// A response arrived that matches no outstanding request.
    #[error("[{agent}] unexpected {channel} response with id {id:#x}")]
    UnexpectedResponse {
        agent: String,
        channel: Channel,
        id: u64,
    },

    /// A sampled field value has no encoding.
    #[error("invalid {field} encoding {value:#x}")]
    Encoding { field: &'static str, value: u64 },

    /// The binder has no signal at the requested path.
    #[error("signal not found: {path}")]
    UnboundSignal { path: String },
}

impl BfmError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BfmError::Timeout { .. })
    }
}
