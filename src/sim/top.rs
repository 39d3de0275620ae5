use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;

use crate::agent::config::AxiAgentConfig;
use crate::agent::master::AxiMaster;
use crate::agent::policy::RandomTraffic;
use crate::agent::slave::AxiSlave;
use crate::agent::stats::AgentStats;
use crate::base::behavior::*;
use crate::base::signal::{bind_signal, CycleSource, Signal, SignalTable};
use crate::error::Result;
use crate::sim::config::SimConfig;
use crate::sim::Cycle;

/// Outcome of a loopback run.
#[derive(Debug, Clone, Serialize)]
pub struct SimSummary {
    pub cycles: Cycle,
    pub finished: bool,
    pub completed: u64,
    pub master: AgentStats,
    pub slave: AgentStats,
}

/// One master wired straight to one slave through an in-memory signal table.
pub struct Sim {
    config: SimConfig,
    signals: SignalTable,
    cycles: Signal,
    pub master: AxiMaster,
    pub slave: AxiSlave,
}

impl Sim {
    pub fn new(
        config: SimConfig,
        mut master_conf: AxiAgentConfig,
        mut slave_conf: AxiAgentConfig,
    ) -> Result<Self> {
        if master_conf.bundle.prefix != slave_conf.bundle.prefix
            || master_conf.bundle.hierarchy != slave_conf.bundle.hierarchy
        {
            warn!("master and slave bind different bundles, nothing will connect");
        }
        if slave_conf.ready_probability < 1.0 && !slave_conf.write_ready_lockstep {
            warn!("slave backpressure without write_ready_lockstep may accept W data before its AW");
        }
        master_conf.seed = master_conf.seed.wrapping_add(config.seed);
        slave_conf.seed = slave_conf.seed.wrapping_add(config.seed);

        let mut signals = SignalTable::new();
        let cycles = bind_signal(&mut signals, "cycles", None, None)?;
        let clock: Arc<dyn CycleSource> = Arc::new(cycles.clone());

        let mut master = AxiMaster::new(Arc::new(master_conf.clone()), &mut signals, Arc::clone(&clock))?;
        if master_conf.random_txn {
            master = master
                .with_request_policy(Box::new(RandomTraffic::new(&master_conf).with_limit(config.txns)));
        }
        let slave = AxiSlave::new(Arc::new(slave_conf), &mut signals, clock)?;

        Ok(Sim {
            config,
            signals,
            cycles,
            master,
            slave,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    pub fn now(&self) -> Cycle {
        self.cycles.cycles()
    }

    /// Advance the clock by one edge and run both delta phases of every agent.
    pub fn tick(&mut self) -> Result<()> {
        self.cycles.set(self.now() + 1);
        self.drive_phase()?;
        self.sample_phase()
    }

    pub fn finished(&self) -> bool {
        self.master.stats().completed() >= self.config.txns
            && self.master.is_idle()
            && self.slave.is_idle()
    }

    /// Run until the requested transactions complete or the cycle budget runs out.
    pub fn simulate(&mut self) -> Result<SimSummary> {
        while !self.finished() && self.now() < self.config.cycles {
            self.tick()?;
        }

        let summary = self.summary();
        if summary.finished {
            info!(
                "simulation finished after {} cycles, {} transactions completed",
                summary.cycles, summary.completed
            );
        } else {
            warn!(
                "cycle budget of {} exhausted with {} of {} transactions completed",
                self.config.cycles, summary.completed, self.config.txns
            );
        }
        Ok(summary)
    }

    pub fn summary(&self) -> SimSummary {
        SimSummary {
            cycles: self.now(),
            finished: self.finished(),
            completed: self.master.stats().completed(),
            master: self.master.stats().clone(),
            slave: self.slave.stats().clone(),
        }
    }
}

impl ModuleBehaviors for Sim {
    fn drive_phase(&mut self) -> Result<()> {
        self.master.drive_phase()?;
        self.slave.drive_phase()
    }

    fn sample_phase(&mut self) -> Result<()> {
        self.master.sample_phase()?;
        self.slave.sample_phase()
    }

    fn reset(&mut self) {
        self.cycles.set(0u8);
        self.master.reset();
        self.slave.reset();
    }
}
