//! Pluggable decisions an agent makes each drive phase: what to issue next and whether to accept
//! input this cycle.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::agent::config::AxiAgentConfig;
use crate::axi::encodings::Channel;
use crate::axi::flit::{AddressFlit, WriteBatch};
use crate::sim::Cycle;

const PAGE_BYTES: u64 = 0x1000;

/// A new transaction for the master to queue.
#[derive(Debug, Clone)]
pub enum Request {
    Write { aw: AddressFlit, batch: WriteBatch },
    Read { ar: AddressFlit },
}

/// Room the master has for a new request this cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueSlots {
    pub write: bool,
    pub read: bool,
    /// Transactions queued or awaiting a response.
    pub in_flight: usize,
}

pub trait RequestPolicy {
    fn next_request(&mut self, now: Cycle, slots: IssueSlots) -> Option<Request>;
}

/// Issues nothing; requests come only from `issue_write`/`issue_read`.
#[derive(Debug, Default)]
pub struct NoTraffic;

impl RequestPolicy for NoTraffic {
    fn next_request(&mut self, _now: Cycle, _slots: IssueSlots) -> Option<Request> {
        None
    }
}

/// Legal random INCR traffic within the configured address window.
#[derive(Debug)]
pub struct RandomTraffic {
    rng: StdRng,
    id_bits: u32,
    addr_range: (u64, u64),
    max_len: u8,
    max_size: u8,
    bus_size: u32,
    bus_bytes: usize,
    max_data_bytes: Option<usize>,
    max_nr_txns: usize,
    has_wr: bool,
    has_rd: bool,
    limit: Option<u64>,
    issued: u64,
}

impl RandomTraffic {
    pub fn new(conf: &AxiAgentConfig) -> Self {
        let bus_size = conf.bus_size();
        Self {
            rng: StdRng::seed_from_u64(conf.seed),
            id_bits: conf.id_bits,
            addr_range: (conf.addr_lo, conf.addr_hi),
            max_len: conf.max_len,
            max_size: conf.max_size.min(bus_size as u8),
            bus_size,
            bus_bytes: conf.bus_bytes(),
            max_data_bytes: conf.max_data_bytes,
            max_nr_txns: conf.max_nr_txns,
            has_wr: conf.has_wr,
            has_rd: conf.has_rd,
            limit: None,
            issued: 0,
        }
    }

    /// Stop after `limit` transactions.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn issued(&self) -> u64 {
        self.issued
    }

    fn exhausted(&self) -> bool {
        self.limit.is_some_and(|limit| self.issued >= limit)
    }

    fn random_addr_flit(&mut self) -> AddressFlit {
        let mut flit = AddressFlit::random_gen(
            &mut self.rng,
            self.id_bits,
            self.addr_range,
            self.max_len,
            self.max_size,
            self.bus_size,
        );
        // INCR bursts must not cross a 4 KiB page
        let room = (PAGE_BYTES - (flit.addr & (PAGE_BYTES - 1))) >> flit.size;
        if (flit.nr_beats() as u64) > room {
            flit.len = (room - 1) as u8;
        }
        flit
    }
}

impl RequestPolicy for RandomTraffic {
    fn next_request(&mut self, _now: Cycle, slots: IssueSlots) -> Option<Request> {
        if self.exhausted() || slots.in_flight >= self.max_nr_txns {
            return None;
        }
        let write = self.has_wr && slots.write;
        let read = self.has_rd && slots.read;
        let is_write = match (write, read) {
            (false, false) => return None,
            (true, false) => true,
            (false, true) => false,
            (true, true) => self.rng.gen_bool(0.5),
        };

        let flit = self.random_addr_flit();
        self.issued += 1;
        if is_write {
            let batch =
                WriteBatch::random_gen(&mut self.rng, &flit, self.max_data_bytes, self.bus_bytes);
            Some(Request::Write { aw: flit, batch })
        } else {
            Some(Request::Read { ar: flit })
        }
    }
}

/// Decides each cycle whether an input channel accepts a handshake. Agents still hold ready low
/// when the backing queue is full, whatever the policy says.
pub trait ReadyPolicy {
    fn ready(&mut self, channel: Channel, now: Cycle) -> bool;
}

#[derive(Debug, Default)]
pub struct AlwaysReady;

impl ReadyPolicy for AlwaysReady {
    fn ready(&mut self, _channel: Channel, _now: Cycle) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct RandomBackpressure {
    rng: StdRng,
    probability: f64,
    lockstep_write: bool,
    /// Cycle and outcome of the last AW/W draw when in lockstep.
    write_draw: Option<(Cycle, bool)>,
}

impl RandomBackpressure {
    pub fn new(seed: u64, probability: f64) -> Self {
        assert!((0.0..=1.0).contains(&probability), "probability out of range");
        Self {
            rng: StdRng::seed_from_u64(seed),
            probability,
            lockstep_write: false,
            write_draw: None,
        }
    }

    /// AW and W get the same answer within a cycle.
    pub fn with_lockstep_write(mut self) -> Self {
        self.lockstep_write = true;
        self
    }
}

impl ReadyPolicy for RandomBackpressure {
    fn ready(&mut self, channel: Channel, now: Cycle) -> bool {
        if !self.lockstep_write || !matches!(channel, Channel::AW | Channel::W) {
            return self.rng.gen_bool(self.probability);
        }
        match self.write_draw {
            Some((cycle, ready)) if cycle == now => ready,
            _ => {
                let ready = self.rng.gen_bool(self.probability);
                self.write_draw = Some((now, ready));
                ready
            }
        }
    }
}

/// The ready policy a config asks for.
pub fn ready_policy_for(conf: &AxiAgentConfig) -> Box<dyn ReadyPolicy> {
    if conf.ready_probability < 1.0 {
        // decorrelate from the traffic generator seeded with the same value
        let policy = RandomBackpressure::new(conf.seed ^ 0x5eed_0000_0000_0000, conf.ready_probability);
        if conf.write_ready_lockstep {
            Box::new(policy.with_lockstep_write())
        } else {
            Box::new(policy)
        }
    } else {
        Box::new(AlwaysReady)
    }
}
