pub mod config;
pub mod top;

pub type Cycle = u64;
