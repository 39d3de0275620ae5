use std::sync::Arc;

use log::{debug, info, trace, warn};
use num::BigUint;

use crate::agent::config::AxiAgentConfig;
use crate::agent::policy::{
    ready_policy_for, IssueSlots, NoTraffic, RandomTraffic, ReadyPolicy, Request, RequestPolicy,
};
use crate::agent::stats::AgentStats;
use crate::axi::bundle::Axi4Bundle;
use crate::axi::encodings::{BurstType, Channel, RespType};
use crate::axi::flit::{AddressFlit, Transmit, WriteBatch};
use crate::axi::task::{AxTask, BTask, RTask, TaskMeta, WTask};
use crate::base::behavior::*;
use crate::base::module::{module_inner, IsModule, ModuleBase};
use crate::base::signal::{CycleSource, SignalBinder};
use crate::builtin::queue::BoundedQueue;
use crate::error::{BfmError, Result};
use crate::sim::Cycle;

const REQ_QUEUE_DEPTH: usize = 2;
const RESP_QUEUE_DEPTH: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnKind {
    Write,
    Read,
}

/// A transaction the master saw through to its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub kind: TxnKind,
    pub id: u64,
    pub addr: u64,
    pub len: u8,
    pub size: u8,
    pub burst: BurstType,
    /// First error response of the transaction, OKAY otherwise.
    pub resp: RespType,
    /// Read data, one entry per beat. Empty for writes.
    pub data: Vec<BigUint>,
    pub issue_cycle: Cycle,
    pub done_cycle: Cycle,
}

/// An accepted request waiting for its response.
#[derive(Debug)]
struct Outstanding {
    request: AxTask,
    data: Vec<BigUint>,
    resp: RespType,
}

impl Outstanding {
    fn new(request: AxTask) -> Self {
        Self {
            request,
            data: Vec::new(),
            resp: RespType::Okay,
        }
    }

    fn record_resp(&mut self, resp: RespType) {
        if !self.resp.is_error() {
            self.resp = resp;
        }
    }

    fn finish(self, kind: TxnKind, now: Cycle) -> Completion {
        let flit = self.request.flit();
        Completion {
            kind,
            id: flit.id,
            addr: flit.addr,
            len: flit.len,
            size: flit.size,
            burst: flit.burst,
            resp: self.resp,
            data: self.data,
            issue_cycle: self.request.alloc_cycle(),
            done_cycle: now,
        }
    }
}

#[derive(Debug)]
pub struct MasterState {
    aw_q: BoundedQueue<AxTask>,
    w_q: BoundedQueue<WTask>,
    ar_q: BoundedQueue<AxTask>,
    r_q: BoundedQueue<RTask>,
    b_q: BoundedQueue<BTask>,
    writes: Vec<Outstanding>,
    reads: Vec<Outstanding>,
    completions: Vec<Completion>,
    stats: AgentStats,
}

impl MasterState {
    fn new(name: &str) -> Self {
        Self {
            aw_q: BoundedQueue::bounded(REQ_QUEUE_DEPTH, &format!("{name}_aw")),
            w_q: BoundedQueue::bounded(REQ_QUEUE_DEPTH, &format!("{name}_w")),
            ar_q: BoundedQueue::bounded(REQ_QUEUE_DEPTH, &format!("{name}_ar")),
            r_q: BoundedQueue::bounded(RESP_QUEUE_DEPTH, &format!("{name}_r")),
            b_q: BoundedQueue::bounded(RESP_QUEUE_DEPTH, &format!("{name}_b")),
            writes: Vec::new(),
            reads: Vec::new(),
            completions: Vec::new(),
            stats: AgentStats::new(name),
        }
    }

    fn in_flight(&self) -> usize {
        self.aw_q.len() + self.ar_q.len() + self.writes.len() + self.reads.len()
    }
}

/// Drives AW/W/AR and accepts B/R.
pub struct AxiMaster {
    base: ModuleBase<MasterState, AxiAgentConfig>,
    bundle: Axi4Bundle,
    requests: Box<dyn RequestPolicy>,
    readiness: Box<dyn ReadyPolicy>,
}

impl AxiMaster {
    pub fn new(
        config: Arc<AxiAgentConfig>,
        binder: &mut dyn SignalBinder,
        clock: Arc<dyn CycleSource>,
    ) -> Result<Self> {
        config.ensure_valid();
        let requests: Box<dyn RequestPolicy> = if config.random_txn {
            Box::new(RandomTraffic::new(&config))
        } else {
            Box::new(NoTraffic)
        };
        let mut me = AxiMaster {
            base: ModuleBase::new(&config.name, MasterState::new(&config.name), clock),
            bundle: Axi4Bundle::bind(binder, &config.bundle)?,
            requests,
            readiness: ready_policy_for(&config),
        };
        info!(
            "[{}] axi master {} instantiated, {}-bit bus",
            me.base.name, config.agent_id, config.bus_bits
        );
        me.init_conf(config);
        Ok(me)
    }

    pub fn with_request_policy(mut self, policy: Box<dyn RequestPolicy>) -> Self {
        self.requests = policy;
        self
    }

    pub fn with_ready_policy(mut self, policy: Box<dyn ReadyPolicy>) -> Self {
        self.readiness = policy;
        self
    }

    pub fn bundle(&self) -> &Axi4Bundle {
        &self.bundle
    }

    pub fn stats(&self) -> &AgentStats {
        &self.base.state.stats
    }

    pub fn aw_queue(&self) -> &BoundedQueue<AxTask> {
        &self.base.state.aw_q
    }

    pub fn w_queue(&self) -> &BoundedQueue<WTask> {
        &self.base.state.w_q
    }

    pub fn ar_queue(&self) -> &BoundedQueue<AxTask> {
        &self.base.state.ar_q
    }

    pub fn r_queue(&self) -> &BoundedQueue<RTask> {
        &self.base.state.r_q
    }

    pub fn b_queue(&self) -> &BoundedQueue<BTask> {
        &self.base.state.b_q
    }

    /// Accepted requests still waiting for their response.
    pub fn outstanding(&self) -> usize {
        self.base.state.writes.len() + self.base.state.reads.len()
    }

    pub fn is_idle(&self) -> bool {
        let state = &self.base.state;
        state.in_flight() == 0 && state.w_q.is_empty() && state.r_q.is_empty() && state.b_q.is_empty()
    }

    pub fn completions(&self) -> &[Completion] {
        &self.base.state.completions
    }

    pub fn take_completions(&mut self) -> Vec<Completion> {
        std::mem::take(&mut self.base.state.completions)
    }

    /// Queue a directed write. Fails if the AW or W queue is full.
    pub fn issue_write(&mut self, aw: AddressFlit, batch: WriteBatch) -> Result<()> {
        self.enqueue(Request::Write { aw, batch })
    }

    /// Queue a directed read. Fails if the AR queue is full.
    pub fn issue_read(&mut self, ar: AddressFlit) -> Result<()> {
        self.enqueue(Request::Read { ar })
    }

    fn enqueue(&mut self, request: Request) -> Result<()> {
        let now = self.base.now();
        let meta = TaskMeta::new(now, self.conf().timeout_threshold, Some(&self.base.name));
        let state = &mut self.base.state;
        match request {
            Request::Write { aw, batch } => {
                debug!(
                    "[{}@{}] alloc write id={:#x} addr={:#x} len={} size={}",
                    self.base.name, now, aw.id, aw.addr, aw.len, aw.size
                );
                state.aw_q.enq(AxTask::customized(aw, Channel::AW, meta))?;
                state.w_q.enq(WTask::customized(batch, meta))?;
            }
            Request::Read { ar } => {
                debug!(
                    "[{}@{}] alloc read id={:#x} addr={:#x} len={} size={}",
                    self.base.name, now, ar.id, ar.addr, ar.len, ar.size
                );
                state.ar_q.enq(AxTask::customized(ar, Channel::AR, meta))?;
            }
        }
        Ok(())
    }

    /// Retire outstanding transactions against the responses captured last cycle.
    fn complete(&mut self) -> Result<()> {
        let now = self.base.now();
        let state = &mut self.base.state;

        while !state.b_q.is_empty() {
            let resp = state.b_q.deq()?.into_payload();
            let Some(pos) = state.writes.iter().position(|o| o.request.flit().id == resp.id) else {
                return Err(BfmError::UnexpectedResponse {
                    agent: self.base.name.clone(),
                    channel: Channel::B,
                    id: resp.id,
                });
            };
            let mut txn = state.writes.remove(pos);
            txn.record_resp(resp.resp);
            let done = txn.finish(TxnKind::Write, now);
            debug!(
                "[{}@{}] write id={:#x} done, {:?} after {} cycles",
                self.base.name,
                now,
                done.id,
                done.resp,
                now - done.issue_cycle
            );
            if done.resp.is_error() {
                state.stats.error_responses += 1;
            }
            state.stats.writes_completed += 1;
            state.completions.push(done);
        }

        while !state.r_q.is_empty() {
            let beat = state.r_q.deq()?.payload().current_flit();
            let Some(pos) = state.reads.iter().position(|o| o.request.flit().id == beat.id) else {
                return Err(BfmError::UnexpectedResponse {
                    agent: self.base.name.clone(),
                    channel: Channel::R,
                    id: beat.id,
                });
            };
            let txn = &mut state.reads[pos];
            txn.data.push(beat.data);
            txn.record_resp(beat.resp);

            let expected = txn.request.flit().nr_beats();
            let got = txn.data.len();
            if beat.last != (got == expected) || got > expected {
                return Err(BfmError::Protocol {
                    agent: self.base.name.clone(),
                    channel: Channel::R,
                    reason: format!(
                        "read id={:#x} got last={} on beat {got} of {expected}",
                        beat.id, beat.last
                    ),
                });
            }
            if !beat.last {
                continue;
            }

            let done = state.reads.remove(pos).finish(TxnKind::Read, now);
            debug!(
                "[{}@{}] read id={:#x} done, {} beats {:?} after {} cycles",
                self.base.name,
                now,
                done.id,
                done.data.len(),
                done.resp,
                now - done.issue_cycle
            );
            if done.resp.is_error() {
                state.stats.error_responses += 1;
            }
            state.stats.reads_completed += 1;
            state.completions.push(done);
        }
        Ok(())
    }

    fn check_timeouts(&mut self) -> Result<()> {
        let state = &mut self.base.state;
        for task in state.aw_q.iter_mut() {
            task.timeout_check()?;
        }
        for task in state.w_q.iter_mut() {
            task.timeout_check()?;
        }
        for task in state.ar_q.iter_mut() {
            task.timeout_check()?;
        }
        for txn in state.writes.iter_mut().chain(state.reads.iter_mut()) {
            txn.request.timeout_check()?;
        }
        Ok(())
    }

    fn req_alloc(&mut self) -> Result<()> {
        let state = &self.base.state;
        let slots = IssueSlots {
            write: !state.aw_q.is_full() && !state.w_q.is_full(),
            read: !state.ar_q.is_full(),
            in_flight: state.in_flight(),
        };
        match self.requests.next_request(self.base.now(), slots) {
            Some(request) => self.enqueue(request),
            None => Ok(()),
        }
    }

    fn send(&self) -> Result<()> {
        let state = &self.base.state;
        if state.aw_q.is_empty() {
            self.bundle.aw.set_valid(false);
        } else {
            self.bundle.aw.send(state.aw_q.peek()?);
        }

        // write data is offered independently of the AW handshake
        if state.w_q.is_empty() {
            self.bundle.w.set_valid(false);
        } else {
            self.bundle.w.send(state.w_q.peek()?);
        }

        if state.ar_q.is_empty() {
            self.bundle.ar.set_valid(false);
        } else {
            self.bundle.ar.send(state.ar_q.peek()?);
        }
        Ok(())
    }

    fn set_rx_ready(&mut self) {
        let now = self.base.now();
        let b_ready = self.readiness.ready(Channel::B, now) && !self.base.state.b_q.is_full();
        let r_ready = self.readiness.ready(Channel::R, now) && !self.base.state.r_q.is_full();
        self.bundle.b.set_ready(b_ready);
        self.bundle.r.set_ready(r_ready);
    }

    fn recv(&mut self) -> Result<()> {
        let now = self.base.now();
        let meta = TaskMeta::new(now, self.conf().timeout_threshold, Some(&self.base.name));
        let state = &mut self.base.state;

        if self.bundle.r.fire() {
            if state.r_q.is_full() {
                return Err(self.overflow(Channel::R));
            }
            let task = RTask::recv(&self.bundle.r, meta)?;
            trace!(
                "[{}@{}] R fire id={:#x} last={}",
                self.base.name,
                now,
                task.payload().id(),
                task.payload().last()
            );
            state.r_q.enq(task)?;
            state.stats.handshakes.bump(Channel::R);
        }

        if self.bundle.b.fire() {
            if state.b_q.is_full() {
                return Err(self.overflow(Channel::B));
            }
            let task = BTask::recv(&self.bundle.b, meta)?;
            trace!("[{}@{}] B fire id={:#x}", self.base.name, now, task.flit().id);
            state.b_q.enq(task)?;
            state.stats.handshakes.bump(Channel::B);
        }
        Ok(())
    }

    fn overflow(&self, channel: Channel) -> BfmError {
        BfmError::Protocol {
            agent: self.base.name.clone(),
            channel,
            reason: "response accepted with a full queue".to_string(),
        }
    }

    /// Pop or advance whatever the slave accepted this cycle.
    fn retire_sent(&mut self) -> Result<()> {
        let now = self.base.now();
        let state = &mut self.base.state;

        if self.bundle.aw.fire() {
            let task = state.aw_q.deq()?;
            trace!("[{}@{}] AW fire {}", self.base.name, now, task);
            state.writes.push(Outstanding::new(task));
            state.stats.handshakes.bump(Channel::AW);
        }

        if self.bundle.w.fire() {
            let head = state.w_q.peek_mut()?;
            if head.payload().last() {
                state.w_q.deq()?;
            } else {
                head.payload_mut().advance();
            }
            state.stats.handshakes.bump(Channel::W);
        }

        if self.bundle.ar.fire() {
            let task = state.ar_q.deq()?;
            trace!("[{}@{}] AR fire {}", self.base.name, now, task);
            state.reads.push(Outstanding::new(task));
            state.stats.handshakes.bump(Channel::AR);
        }
        Ok(())
    }
}

impl IsModule for AxiMaster {
    module_inner!(MasterState, AxiAgentConfig);
}

impl ModuleBehaviors for AxiMaster {
    fn drive_phase(&mut self) -> Result<()> {
        self.complete()?;
        self.check_timeouts()?;
        self.req_alloc()?;
        self.send()?;
        self.set_rx_ready();
        Ok(())
    }

    fn sample_phase(&mut self) -> Result<()> {
        self.recv()?;
        self.retire_sent()
    }

    fn reset(&mut self) {
        let state = &mut self.base.state;
        if state.in_flight() > 0 {
            warn!("[{}] reset drops {} transactions in flight", self.base.name, state.in_flight());
        }
        *state = MasterState::new(&self.base.name);
        for valid in [&self.bundle.aw.valid, &self.bundle.w.valid, &self.bundle.ar.valid] {
            valid.set_bool(false);
        }
        self.bundle.b.set_ready(false);
        self.bundle.r.set_ready(false);
    }
}
