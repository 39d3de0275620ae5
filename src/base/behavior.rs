use std::sync::Arc;

use crate::error::Result;

/// The two delta-cycle phases every agent goes through once per clock cycle.
///
/// The driver calls `drive_phase` on every agent right after the clock edge and `sample_phase`
/// one delta later, once the inputs have settled. Both phases must run in that order before
/// the next edge.
pub trait ModuleBehaviors {
    fn drive_phase(&mut self) -> Result<()>;
    fn sample_phase(&mut self) -> Result<()>;
    fn reset(&mut self);
}

pub trait Parameterizable {
    type ConfigType;

    fn conf(&self) -> &Self::ConfigType;
    fn init_conf(&mut self, conf: Arc<Self::ConfigType>);
}
