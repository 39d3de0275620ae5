use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::base::behavior::*;
use crate::base::signal::CycleSource;
use crate::sim::Cycle;

/// State, configuration and identity shared by every agent.
pub struct ModuleBase<T, C> {
    pub state: T,
    pub config: OnceLock<Arc<C>>,
    /// Label used in task names and log lines.
    pub name: String,
    clock: Arc<dyn CycleSource>,
}

impl<T: fmt::Debug, C: fmt::Debug> fmt::Debug for ModuleBase<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleBase")
            .field("name", &self.name)
            .field("now", &self.now())
            .field("state", &self.state)
            .field("config", &self.config)
            .finish()
    }
}

impl<T, C> ModuleBase<T, C> {
    pub fn new(name: &str, state: T, clock: Arc<dyn CycleSource>) -> Self {
        Self {
            state,
            config: OnceLock::new(),
            name: name.to_string(),
            clock,
        }
    }

    /// Current cycle as reported by the design.
    pub fn now(&self) -> Cycle {
        self.clock.cycles()
    }
}

pub trait IsModule: ModuleBehaviors {
    type StateType;
    type ConfigType;

    fn base(&mut self) -> &mut ModuleBase<Self::StateType, Self::ConfigType>;

    fn base_ref(&self) -> &ModuleBase<Self::StateType, Self::ConfigType>;

    fn state_mut(&mut self) -> &mut Self::StateType {
        &mut self.base().state
    }

    fn state(&self) -> &Self::StateType {
        &self.base_ref().state
    }

    fn name(&self) -> &str {
        &self.base_ref().name
    }

    fn now(&self) -> Cycle {
        self.base_ref().now()
    }
}

impl<X> Parameterizable for X where X: IsModule {
    type ConfigType = X::ConfigType;

    fn conf(&self) -> &Self::ConfigType {
        self.base_ref().config.get().expect("config not found, was `init_conf` called in `new`?")
    }

    fn init_conf(&mut self, conf: Arc<Self::ConfigType>) {
        self.base().config.set(Arc::clone(&conf)).map_err(|_| "config already set").unwrap();
    }
}

macro_rules! module_inner {
    ($T:ty, $C:ty) => {
        type StateType = $T;
        type ConfigType = $C;

        fn base(&mut self) -> &mut ModuleBase<$T, $C> {
            &mut self.base
        }

        fn base_ref(&self) -> &ModuleBase<$T, $C> {
            &self.base
        }
    };
}

pub(crate) use module_inner;
