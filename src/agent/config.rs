use serde::Deserialize;

use crate::axi::config::AxiBundleCfg;
use crate::sim::config::Config;

/// Per-agent parameters, loaded from the `[master]` or `[slave]` section.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AxiAgentConfig {
    pub name: String,
    pub agent_id: usize,
    pub bus_bits: u32,
    pub max_nr_txns: usize,
    pub random_txn: bool,
    pub has_wr: bool,
    pub has_rd: bool,
    /// Caps the random payload width of a beat below the beat size.
    pub max_data_bytes: Option<usize>,
    pub timeout_threshold: u64,
    pub seed: u64,
    pub id_bits: u32,
    pub addr_lo: u64,
    pub addr_hi: u64,
    pub max_len: u8,
    pub max_size: u8,
    /// Probability of asserting an input ready line in a given cycle; 1.0 disables backpressure.
    pub ready_probability: f64,
    /// Share one backpressure draw between AW and W in a cycle, so a slave never takes write
    /// data ahead of its address.
    pub write_ready_lockstep: bool,
    pub bundle: AxiBundleCfg,
}

impl Config for AxiAgentConfig {}

impl Default for AxiAgentConfig {
    fn default() -> Self {
        Self {
            name: "axi_agent".to_string(),
            agent_id: 0,
            bus_bits: 64,
            max_nr_txns: 4,
            random_txn: false,
            has_wr: true,
            has_rd: true,
            max_data_bytes: None,
            timeout_threshold: 1000,
            seed: 0,
            id_bits: 4,
            addr_lo: 0,
            addr_hi: 0xffff,
            max_len: 7,
            max_size: 3,
            ready_probability: 1.0,
            write_ready_lockstep: false,
            bundle: AxiBundleCfg::default(),
        }
    }
}

impl AxiAgentConfig {
    pub fn bus_bytes(&self) -> usize {
        (self.bus_bits / 8) as usize
    }

    /// log2 of the bus width in bytes.
    pub fn bus_size(&self) -> u32 {
        self.bus_bytes().trailing_zeros()
    }

    /// Fail fast on parameters no agent can run with.
    pub fn ensure_valid(&self) {
        assert!(
            self.bus_bits >= 8 && self.bus_bits.is_power_of_two(),
            "bus_bits must be a power of two of at least 8, got {}",
            self.bus_bits
        );
        assert!(self.addr_lo <= self.addr_hi, "addr_lo must not exceed addr_hi");
        assert!(self.id_bits <= 64, "id_bits must be <= 64");
        assert!(
            (0.0..=1.0).contains(&self.ready_probability),
            "ready_probability must be within [0, 1]"
        );
        assert!(self.timeout_threshold > 0, "timeout_threshold must be > 0");
        if let Some(cap) = self.max_data_bytes {
            assert!(cap > 0, "max_data_bytes must be > 0");
        }
    }
}
