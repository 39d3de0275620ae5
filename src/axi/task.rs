//! Scheduling units queued by the agents.
//!
//! A task wraps exactly one payload together with the bookkeeping needed to detect a stalled
//! handshake: when it was allocated and how many cycles it has been outstanding.

use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::axi::bundle::{AxBits, BBits, Decoupled, RBits, WBits};
use crate::axi::encodings::Channel;
use crate::axi::flit::{
    AddressFlit, ReadBatch, ReadDataFlit, Transmit, WriteBatch, WriteDataFlit, WriteResponseFlit,
};
use crate::error::{BfmError, Result};
use crate::sim::Cycle;

static TASK_SEQ: AtomicU64 = AtomicU64::new(0);

/// Allocation context stamped on every new task.
#[derive(Debug, Clone, Copy)]
pub struct TaskMeta<'a> {
    pub alloc_cycle: Cycle,
    pub timeout_threshold: u64,
    pub label: Option<&'a str>,
}

impl<'a> TaskMeta<'a> {
    pub fn new(alloc_cycle: Cycle, timeout_threshold: u64, label: Option<&'a str>) -> Self {
        Self {
            alloc_cycle,
            timeout_threshold,
            label,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Task<P> {
    name: String,
    channel: Channel,
    alloc_cycle: Cycle,
    timeout_cnt: u64,
    timeout_threshold: u64,
    payload: P,
}

pub type AxTask = Task<AddressFlit>;
pub type WTask = Task<WritePayload>;
pub type RTask = Task<ReadPayload>;
pub type BTask = Task<WriteResponseFlit>;

impl<P> Task<P> {
    fn alloc(channel: Channel, payload: P, meta: TaskMeta<'_>) -> Self {
        let seq = TASK_SEQ.fetch_add(1, Ordering::Relaxed);
        let chnl = channel.as_str().to_ascii_lowercase();
        let name = match meta.label {
            Some(label) => format!("{label}_{chnl}_task_{seq}"),
            None => format!("{chnl}_task_{seq}"),
        };
        Self {
            name,
            channel,
            alloc_cycle: meta.alloc_cycle,
            timeout_cnt: 0,
            timeout_threshold: meta.timeout_threshold,
            payload,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn alloc_cycle(&self) -> Cycle {
        self.alloc_cycle
    }

    pub fn timeout_cnt(&self) -> u64 {
        self.timeout_cnt
    }

    pub fn timeout_threshold(&self) -> u64 {
        self.timeout_threshold
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Count one more cycle outstanding. Fails exactly once, on the call that reaches the
    /// threshold.
    pub fn timeout_check(&mut self) -> Result<()> {
        self.timeout_cnt += 1;
        if self.timeout_cnt == self.timeout_threshold {
            return Err(BfmError::Timeout {
                name: self.name.clone(),
                channel: self.channel,
                alloc_cycle: self.alloc_cycle,
                threshold: self.timeout_threshold,
            });
        }
        Ok(())
    }
}

impl<P> Display for Task<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[Task {}] channel = {}, alloc_cycle = {}, timeout_cnt = {}/{}",
            self.name, self.channel, self.alloc_cycle, self.timeout_cnt, self.timeout_threshold
        )
    }
}

impl AxTask {
    pub fn customized(flit: AddressFlit, channel: Channel, meta: TaskMeta<'_>) -> Self {
        assert!(channel.is_addr_chnl(), "address task on {channel}");
        Task::alloc(channel, flit, meta)
    }

    pub fn recv(bdl: &Decoupled<AxBits>, channel: Channel, meta: TaskMeta<'_>) -> Result<Self> {
        Ok(Self::customized(bdl.recv()?, channel, meta))
    }

    pub fn flit(&self) -> &AddressFlit {
        &self.payload
    }
}

/// A W task carries either one sampled beat or a whole burst to send, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePayload {
    Flit(WriteDataFlit),
    Batch(WriteBatch),
}

impl WritePayload {
    pub fn last(&self) -> bool {
        match self {
            WritePayload::Flit(flit) => flit.last,
            WritePayload::Batch(batch) => batch.last(),
        }
    }

    /// Advance a batch to its next beat. A single flit has nothing to advance to.
    pub fn advance(&mut self) -> bool {
        match self {
            WritePayload::Flit(_) => false,
            WritePayload::Batch(batch) => batch.advance(),
        }
    }

    pub fn as_batch(&self) -> Option<&WriteBatch> {
        match self {
            WritePayload::Batch(batch) => Some(batch),
            WritePayload::Flit(_) => None,
        }
    }

    pub fn as_flit(&self) -> Option<&WriteDataFlit> {
        match self {
            WritePayload::Flit(flit) => Some(flit),
            WritePayload::Batch(_) => None,
        }
    }
}

impl Transmit for WritePayload {
    type Flit = WriteDataFlit;

    fn current_flit(&self) -> WriteDataFlit {
        match self {
            WritePayload::Flit(flit) => flit.clone(),
            WritePayload::Batch(batch) => batch.current_beat(),
        }
    }
}

impl WTask {
    pub fn customized(batch: WriteBatch, meta: TaskMeta<'_>) -> Self {
        Task::alloc(Channel::W, WritePayload::Batch(batch), meta)
    }

    pub fn random_gen<R: Rng + ?Sized>(
        rng: &mut R,
        aw: &AddressFlit,
        max_data_bytes: Option<usize>,
        bus_bytes: usize,
        meta: TaskMeta<'_>,
    ) -> Self {
        Self::customized(WriteBatch::random_gen(rng, aw, max_data_bytes, bus_bytes), meta)
    }

    pub fn recv(bdl: &Decoupled<WBits>, meta: TaskMeta<'_>) -> Result<Self> {
        Ok(Task::alloc(Channel::W, WritePayload::Flit(bdl.recv()?), meta))
    }
}

/// An R task carries either one sampled beat or a whole burst to send, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadPayload {
    Flit(ReadDataFlit),
    Batch(ReadBatch),
}

impl ReadPayload {
    pub fn id(&self) -> u64 {
        match self {
            ReadPayload::Flit(flit) => flit.id,
            ReadPayload::Batch(batch) => batch.id,
        }
    }

    pub fn last(&self) -> bool {
        match self {
            ReadPayload::Flit(flit) => flit.last,
            ReadPayload::Batch(batch) => batch.last(),
        }
    }

    pub fn advance(&mut self) -> bool {
        match self {
            ReadPayload::Flit(_) => false,
            ReadPayload::Batch(batch) => batch.advance(),
        }
    }

    pub fn as_batch(&self) -> Option<&ReadBatch> {
        match self {
            ReadPayload::Batch(batch) => Some(batch),
            ReadPayload::Flit(_) => None,
        }
    }

    pub fn as_flit(&self) -> Option<&ReadDataFlit> {
        match self {
            ReadPayload::Flit(flit) => Some(flit),
            ReadPayload::Batch(_) => None,
        }
    }
}

impl Transmit for ReadPayload {
    type Flit = ReadDataFlit;

    fn current_flit(&self) -> ReadDataFlit {
        match self {
            ReadPayload::Flit(flit) => flit.clone(),
            ReadPayload::Batch(batch) => batch.current_beat(),
        }
    }
}

impl RTask {
    pub fn customized(batch: ReadBatch, meta: TaskMeta<'_>) -> Self {
        Task::alloc(Channel::R, ReadPayload::Batch(batch), meta)
    }

    pub fn random_gen<R: Rng + ?Sized>(
        rng: &mut R,
        ar: &AddressFlit,
        max_data_bytes: Option<usize>,
        bus_bytes: usize,
        meta: TaskMeta<'_>,
    ) -> Self {
        Self::customized(ReadBatch::random_gen(rng, ar, max_data_bytes, bus_bytes), meta)
    }

    pub fn recv(bdl: &Decoupled<RBits>, meta: TaskMeta<'_>) -> Result<Self> {
        Ok(Task::alloc(Channel::R, ReadPayload::Flit(bdl.recv()?), meta))
    }
}

impl BTask {
    pub fn customized(flit: WriteResponseFlit, meta: TaskMeta<'_>) -> Self {
        Task::alloc(Channel::B, flit, meta)
    }

    pub fn random_gen(aw: &AddressFlit, meta: TaskMeta<'_>) -> Self {
        Self::customized(WriteResponseFlit::random_gen(aw), meta)
    }

    pub fn recv(bdl: &Decoupled<BBits>, meta: TaskMeta<'_>) -> Result<Self> {
        Ok(Self::customized(bdl.recv()?, meta))
    }

    pub fn flit(&self) -> &WriteResponseFlit {
        &self.payload
    }
}
