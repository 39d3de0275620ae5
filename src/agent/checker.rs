use std::collections::VecDeque;

use log::trace;

use crate::axi::encodings::{BurstType, Channel};
use crate::axi::flit::AddressFlit;
use crate::axi::task::{AxTask, WTask};
use crate::builtin::queue::BoundedQueue;
use crate::error::{BfmError, Result};

/// The slave's check queues, handed to the checker once per sample phase. The checker owns
/// draining them; response allocation never looks at these.
pub struct CheckQueues<'a> {
    pub aw: &'a mut BoundedQueue<AxTask>,
    pub ar: &'a mut BoundedQueue<AxTask>,
    pub w: &'a mut BoundedQueue<WTask>,
}

pub trait ProtocolChecker {
    fn check(&mut self, agent: &str, queues: CheckQueues<'_>) -> Result<()>;

    /// Forget any burst in progress.
    fn reset(&mut self);
}

/// Burst-level AXI4 rules on accepted requests and write data.
#[derive(Debug)]
pub struct BurstChecker {
    bus_size: u32,
    /// Beat counts of accepted AWs whose data has not completed yet.
    expected: VecDeque<usize>,
    /// Beat counts of W bursts that completed before their AW was seen.
    early: VecDeque<usize>,
    beats: usize,
    checked: u64,
}

impl BurstChecker {
    pub fn new(bus_size: u32) -> Self {
        Self {
            bus_size,
            expected: VecDeque::new(),
            early: VecDeque::new(),
            beats: 0,
            checked: 0,
        }
    }

    /// Requests and W bursts checked so far.
    pub fn checked(&self) -> u64 {
        self.checked
    }

    fn violation(agent: &str, channel: Channel, reason: String) -> BfmError {
        BfmError::Protocol {
            agent: agent.to_string(),
            channel,
            reason,
        }
    }

    fn check_request(&self, agent: &str, channel: Channel, flit: &AddressFlit) -> Result<()> {
        if u32::from(flit.size) > self.bus_size {
            return Err(Self::violation(
                agent,
                channel,
                format!("size {} exceeds the bus size {}", flit.size, self.bus_size),
            ));
        }
        let beats = flit.nr_beats();
        match flit.burst {
            BurstType::Wrap => {
                if !matches!(beats, 2 | 4 | 8 | 16) {
                    return Err(Self::violation(
                        agent,
                        channel,
                        format!("WRAP burst of {beats} beats"),
                    ));
                }
                if flit.addr % flit.beat_bytes() != 0 {
                    return Err(Self::violation(
                        agent,
                        channel,
                        format!("unaligned WRAP start {:#x}", flit.addr),
                    ));
                }
            }
            BurstType::Fixed => {
                if beats > 16 {
                    return Err(Self::violation(
                        agent,
                        channel,
                        format!("FIXED burst of {beats} beats"),
                    ));
                }
            }
            BurstType::Incr => {
                let Some(end) = flit.beat_addr(beats - 1).checked_add(flit.beat_bytes() - 1) else {
                    return Err(Self::violation(
                        agent,
                        channel,
                        format!("INCR burst from {:#x} runs past the address space", flit.addr),
                    ));
                };
                if flit.addr >> 12 != end >> 12 {
                    return Err(Self::violation(
                        agent,
                        channel,
                        format!("INCR burst {:#x}..={:#x} crosses a 4 KiB boundary", flit.addr, end),
                    ));
                }
            }
        }
        Ok(())
    }

    fn match_burst(&self, agent: &str, expected: usize, got: usize) -> Result<()> {
        if expected != got {
            return Err(Self::violation(
                agent,
                Channel::W,
                format!("last asserted after {got} beats, AW announced {expected}"),
            ));
        }
        Ok(())
    }
}

impl ProtocolChecker for BurstChecker {
    fn check(&mut self, agent: &str, queues: CheckQueues<'_>) -> Result<()> {
        while !queues.aw.is_empty() {
            let task = queues.aw.deq()?;
            self.check_request(agent, Channel::AW, task.flit())?;
            let beats = task.flit().nr_beats();
            match self.early.pop_front() {
                Some(got) => self.match_burst(agent, beats, got)?,
                None => self.expected.push_back(beats),
            }
            self.checked += 1;
        }

        while !queues.ar.is_empty() {
            let task = queues.ar.deq()?;
            self.check_request(agent, Channel::AR, task.flit())?;
            self.checked += 1;
        }

        while !queues.w.is_empty() {
            let task = queues.w.deq()?;
            self.beats += 1;
            let last = task.payload().last();
            if !last {
                if let Some(&expected) = self.expected.front() {
                    if self.beats >= expected {
                        return Err(Self::violation(
                            agent,
                            Channel::W,
                            format!("no last after {} beats, AW announced {expected}", self.beats),
                        ));
                    }
                }
                continue;
            }
            let got = std::mem::take(&mut self.beats);
            match self.expected.pop_front() {
                Some(expected) => self.match_burst(agent, expected, got)?,
                None => self.early.push_back(got),
            }
            trace!("[{agent}] W burst of {got} beats checked");
            self.checked += 1;
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.expected.clear();
        self.early.clear();
        self.beats = 0;
    }
}
