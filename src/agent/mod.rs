pub mod checker;
pub mod config;
pub mod master;
pub mod policy;
pub mod slave;
pub mod stats;

pub use config::AxiAgentConfig;
pub use master::{AxiMaster, Completion, TxnKind};
pub use slave::AxiSlave;
