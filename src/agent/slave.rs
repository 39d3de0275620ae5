use std::sync::Arc;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agent::checker::{BurstChecker, CheckQueues, ProtocolChecker};
use crate::agent::config::AxiAgentConfig;
use crate::agent::policy::{ready_policy_for, ReadyPolicy};
use crate::agent::stats::AgentStats;
use crate::axi::bundle::Axi4Bundle;
use crate::axi::encodings::Channel;
use crate::axi::task::{AxTask, BTask, RTask, TaskMeta, WTask};
use crate::base::behavior::*;
use crate::base::module::{module_inner, IsModule, ModuleBase};
use crate::base::signal::{CycleSource, SignalBinder};
use crate::builtin::queue::BoundedQueue;
use crate::error::{BfmError, Result};

const PENDING_QUEUE_DEPTH: usize = 2;
const CHECK_QUEUE_DEPTH: usize = 2;

#[derive(Debug)]
pub struct SlaveState {
    /// Requests waiting for a response to be allocated.
    aw_pending: BoundedQueue<AxTask>,
    ar_pending: BoundedQueue<AxTask>,
    /// Everything accepted, held for the protocol checker.
    aw_check: BoundedQueue<AxTask>,
    ar_check: BoundedQueue<AxTask>,
    w_check: BoundedQueue<WTask>,
    b_q: BoundedQueue<BTask>,
    r_q: BoundedQueue<RTask>,
    stats: AgentStats,
}

impl SlaveState {
    fn new(name: &str) -> Self {
        Self {
            aw_pending: BoundedQueue::bounded(PENDING_QUEUE_DEPTH, &format!("{name}_aw_pending")),
            ar_pending: BoundedQueue::bounded(PENDING_QUEUE_DEPTH, &format!("{name}_ar_pending")),
            aw_check: BoundedQueue::bounded(CHECK_QUEUE_DEPTH, &format!("{name}_aw_check")),
            ar_check: BoundedQueue::bounded(CHECK_QUEUE_DEPTH, &format!("{name}_ar_check")),
            w_check: BoundedQueue::bounded(CHECK_QUEUE_DEPTH, &format!("{name}_w_check")),
            b_q: BoundedQueue::unbounded(&format!("{name}_b")),
            r_q: BoundedQueue::unbounded(&format!("{name}_r")),
            stats: AgentStats::new(name),
        }
    }
}

/// Accepts AW/W/AR and answers with B/R in acceptance order.
pub struct AxiSlave {
    base: ModuleBase<SlaveState, AxiAgentConfig>,
    bundle: Axi4Bundle,
    rng: StdRng,
    checker: Box<dyn ProtocolChecker>,
    readiness: Box<dyn ReadyPolicy>,
}

impl AxiSlave {
    pub fn new(
        config: Arc<AxiAgentConfig>,
        binder: &mut dyn SignalBinder,
        clock: Arc<dyn CycleSource>,
    ) -> Result<Self> {
        config.ensure_valid();
        let mut me = AxiSlave {
            base: ModuleBase::new(&config.name, SlaveState::new(&config.name), clock),
            bundle: Axi4Bundle::bind(binder, &config.bundle)?,
            rng: StdRng::seed_from_u64(config.seed),
            checker: Box::new(BurstChecker::new(config.bus_size())),
            readiness: ready_policy_for(&config),
        };
        info!(
            "[{}] axi slave {} instantiated, {}-bit bus",
            me.base.name, config.agent_id, config.bus_bits
        );
        me.init_conf(config);
        Ok(me)
    }

    pub fn with_checker(mut self, checker: Box<dyn ProtocolChecker>) -> Self {
        self.checker = checker;
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

    pub fn aw_pending(&self) -> &BoundedQueue<AxTask> {
        &self.base.state.aw_pending
    }

    pub fn ar_pending(&self) -> &BoundedQueue<AxTask> {
        &self.base.state.ar_pending
    }

    pub fn b_queue(&self) -> &BoundedQueue<BTask> {
        &self.base.state.b_q
    }

    pub fn r_queue(&self) -> &BoundedQueue<RTask> {
        &self.base.state.r_q
    }

    pub fn is_idle(&self) -> bool {
        let state = &self.base.state;
        state.aw_pending.is_empty()
            && state.ar_pending.is_empty()
            && state.b_q.is_empty()
            && state.r_q.is_empty()
    }

    fn check_timeouts(&mut self) -> Result<()> {
        let state = &mut self.base.state;
        for task in state.aw_pending.iter_mut().chain(state.ar_pending.iter_mut()) {
            task.timeout_check()?;
        }
        for task in state.b_q.iter_mut() {
            task.timeout_check()?;
        }
        for task in state.r_q.iter_mut() {
            task.timeout_check()?;
        }
        Ok(())
    }

    fn set_rx_ready(&mut self) {
        let now = self.base.now();
        let (has_wr, has_rd) = (self.conf().has_wr, self.conf().has_rd);
        let state = &self.base.state;

        // AW/AR follow the pending queues only
        let aw_ready = has_wr && self.readiness.ready(Channel::AW, now) && !state.aw_pending.is_full();
        let w_ready = has_wr && self.readiness.ready(Channel::W, now) && !state.w_check.is_full();
        let ar_ready = has_rd && self.readiness.ready(Channel::AR, now) && !state.ar_pending.is_full();

        self.bundle.aw.set_ready(aw_ready);
        self.bundle.w.set_ready(w_ready);
        self.bundle.ar.set_ready(ar_ready);
    }

    fn send(&self) -> Result<()> {
        let state = &self.base.state;
        if state.b_q.is_empty() {
            self.bundle.b.set_valid(false);
        } else {
            self.bundle.b.send(state.b_q.peek()?);
        }

        if state.r_q.is_empty() {
            self.bundle.r.set_valid(false);
        } else {
            self.bundle.r.send(state.r_q.peek()?);
        }
        Ok(())
    }

    /// Pop or advance the responses the master accepted this cycle.
    fn retire_sent(&mut self) -> Result<()> {
        let now = self.base.now();
        let state = &mut self.base.state;

        if self.bundle.b.fire() {
            let task = state.b_q.deq()?;
            trace!("[{}@{}] B fire {}", self.base.name, now, task);
            state.stats.handshakes.bump(Channel::B);
            state.stats.writes_completed += 1;
        }

        if self.bundle.r.fire() {
            let head = state.r_q.peek_mut()?;
            if head.payload().last() {
                let task = state.r_q.deq()?;
                trace!("[{}@{}] R burst done {}", self.base.name, now, task);
                state.stats.reads_completed += 1;
            } else {
                head.payload_mut().advance();
            }
            state.stats.handshakes.bump(Channel::R);
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<()> {
        let now = self.base.now();
        let meta = TaskMeta::new(now, self.conf().timeout_threshold, Some(&self.base.name));
        let state = &mut self.base.state;

        if self.bundle.aw.fire() {
            let task = AxTask::recv(&self.bundle.aw, Channel::AW, meta)?;
            trace!("[{}@{}] AW fire {}", self.base.name, now, task);
            state.aw_check.enq(task.clone())?;
            state.aw_pending.enq(task)?;
            state.stats.handshakes.bump(Channel::AW);
        }

        if self.bundle.ar.fire() {
            let task = AxTask::recv(&self.bundle.ar, Channel::AR, meta)?;
            trace!("[{}@{}] AR fire {}", self.base.name, now, task);
            state.ar_check.enq(task.clone())?;
            state.ar_pending.enq(task)?;
            state.stats.handshakes.bump(Channel::AR);
        }

        if self.bundle.w.fire() {
            let task = WTask::recv(&self.bundle.w, meta)?;
            state.w_check.enq(task)?;
            state.stats.handshakes.bump(Channel::W);
        }
        Ok(())
    }

    fn check(&mut self) -> Result<()> {
        let state = &mut self.base.state;
        self.checker.check(
            &self.base.name,
            CheckQueues {
                aw: &mut state.aw_check,
                ar: &mut state.ar_check,
                w: &mut state.w_check,
            },
        )
    }

    fn resp_alloc(&mut self) -> Result<()> {
        let now = self.base.now();
        let conf = self.conf();
        let (max_data_bytes, bus_bytes) = (conf.max_data_bytes, conf.bus_bytes());
        let meta = TaskMeta::new(now, conf.timeout_threshold, Some(&self.base.name));
        let state = &mut self.base.state;

        if self.bundle.w.fire() && self.bundle.w.bits.last.value_bool() {
            if state.aw_pending.is_empty() {
                return Err(BfmError::NoPendingRequest {
                    agent: self.base.name.clone(),
                    channel: Channel::B,
                });
            }
            let aw = state.aw_pending.deq()?;
            let b = BTask::random_gen(aw.flit(), meta);
            debug!("[{}@{}] alloc B id={:#x}", self.base.name, now, b.flit().id);
            state.b_q.enq(b)?;
        }

        if !state.ar_pending.is_empty() {
            let ar = state.ar_pending.deq()?;
            let r = RTask::random_gen(&mut self.rng, ar.flit(), max_data_bytes, bus_bytes, meta);
            debug!(
                "[{}@{}] alloc R id={:#x}, {} beats",
                self.base.name,
                now,
                ar.flit().id,
                ar.flit().nr_beats()
            );
            state.r_q.enq(r)?;
        }
        Ok(())
    }
}

impl IsModule for AxiSlave {
    module_inner!(SlaveState, AxiAgentConfig);
}

impl ModuleBehaviors for AxiSlave {
    fn drive_phase(&mut self) -> Result<()> {
        self.check_timeouts()?;
        self.set_rx_ready();
        self.send()
    }

    fn sample_phase(&mut self) -> Result<()> {
        self.retire_sent()?;
        self.recv()?;
        self.check()?;
        self.resp_alloc()
    }

    fn reset(&mut self) {
        self.base.state = SlaveState::new(&self.base.name);
        self.checker.reset();
        self.bundle.aw.set_ready(false);
        self.bundle.w.set_ready(false);
        self.bundle.ar.set_ready(false);
        self.bundle.b.set_valid(false);
        self.bundle.r.set_valid(false);
    }
}
