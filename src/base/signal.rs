/// `Signal` models one wire of the design under test.
///
/// Agents never talk to each other directly; every exchange goes through signal handles handed
/// out by a [`SignalBinder`]. A real simulator integration implements [`SignalAccess`] over its
/// own handles, while [`SignalTable`] keeps everything in software for tests and loopback runs.
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use log::debug;
use num::{BigUint, Zero};

use crate::error::{BfmError, Result};
use crate::sim::Cycle;

/// Read/write access to a scalar or vector signal value.
pub trait SignalAccess: Send + Sync {
    fn get(&self) -> BigUint;
    fn set(&self, value: BigUint);
}

/// Software-only signal storage.
#[derive(Debug, Default)]
pub struct SoftSignal(RwLock<BigUint>);

impl SignalAccess for SoftSignal {
    fn get(&self) -> BigUint {
        self.0.read().expect("rw lock poisoned").clone()
    }

    fn set(&self, value: BigUint) {
        *self.0.write().expect("rw lock poisoned") = value;
    }
}

/// A bound signal: the handle plus the path it was bound from.
#[derive(Clone)]
pub struct Signal {
    path: String,
    handle: Arc<dyn SignalAccess>,
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signal({} = {:#x})", self.path, self.value())
    }
}

impl Signal {
    pub fn new(path: impl Into<String>, handle: Arc<dyn SignalAccess>) -> Self {
        Self {
            path: path.into(),
            handle,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> BigUint {
        self.handle.get()
    }

    /// Low 64 bits of the value.
    pub fn value_u64(&self) -> u64 {
        self.value().iter_u64_digits().next().unwrap_or(0)
    }

    pub fn value_bool(&self) -> bool {
        !self.value().is_zero()
    }

    pub fn set(&self, value: impl Into<BigUint>) {
        self.handle.set(value.into());
    }

    pub fn set_bool(&self, value: bool) {
        self.set(value as u8);
    }
}

/// Source of the current simulation cycle.
pub trait CycleSource {
    fn cycles(&self) -> Cycle;
}

/// A cycle counter exposed by the design, e.g. a `cycles` register.
impl CycleSource for Signal {
    fn cycles(&self) -> Cycle {
        self.value_u64()
    }
}

/// Resolves hierarchical paths to signal handles.
pub trait SignalBinder {
    fn bind(&mut self, path: &str) -> Result<Arc<dyn SignalAccess>>;
}

/// `<hierarchy>.<prefix>_<suffix>`, with either part omitted when absent.
pub fn hierarchical_path(suffix: &str, prefix: Option<&str>, hierarchy: Option<&str>) -> String {
    let mut path = String::new();
    if let Some(hierarchy) = hierarchy {
        path.push_str(hierarchy);
        path.push('.');
    }
    if let Some(prefix) = prefix {
        path.push_str(prefix);
        path.push('_');
    }
    path.push_str(suffix);
    path
}

pub fn bind_signal(
    binder: &mut dyn SignalBinder,
    suffix: &str,
    prefix: Option<&str>,
    hierarchy: Option<&str>,
) -> Result<Signal> {
    let path = hierarchical_path(suffix, prefix, hierarchy);
    debug!("[Signal Binding] {}", path);
    let handle = binder.bind(&path)?;
    Ok(Signal::new(path, handle))
}

/// In-memory binder. Two agents binding the same path share one handle, which is how a
/// loopback connects a master straight to a slave.
///
/// In strict mode only declared paths bind; otherwise signals are created on first use.
#[derive(Default)]
pub struct SignalTable {
    signals: HashMap<String, Arc<SoftSignal>>,
    strict: bool,
}

impl SignalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self {
            signals: HashMap::new(),
            strict: true,
        }
    }

    pub fn declare(&mut self, path: &str) {
        self.signals.entry(path.to_string()).or_default();
    }

    pub fn contains(&self, path: &str) -> bool {
        self.signals.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn peek(&self, path: &str) -> Option<BigUint> {
        self.signals.get(path).map(|s| s.get())
    }

    pub fn peek_u64(&self, path: &str) -> Option<u64> {
        self.peek(path)
            .map(|v| v.iter_u64_digits().next().unwrap_or(0))
    }

    /// Drive a value from outside any agent, standing in for the design under test.
    pub fn poke(&mut self, path: &str, value: impl Into<BigUint>) {
        self.signals
            .entry(path.to_string())
            .or_default()
            .set(value.into());
    }

    pub fn signal(&self, path: &str) -> Option<Signal> {
        self.signals.get(path).map(|s| {
            let handle: Arc<dyn SignalAccess> = Arc::clone(s) as Arc<dyn SignalAccess>;
            Signal::new(path, handle)
        })
    }
}

impl SignalBinder for SignalTable {
    fn bind(&mut self, path: &str) -> Result<Arc<dyn SignalAccess>> {
        if self.strict && !self.signals.contains_key(path) {
            return Err(BfmError::UnboundSignal {
                path: path.to_string(),
            });
        }
        let handle = self.signals.entry(path.to_string()).or_default();
        Ok(Arc::clone(handle) as Arc<dyn SignalAccess>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_concatenation() {
        assert_eq!(hierarchical_path("valid", None, None), "valid");
        assert_eq!(hierarchical_path("valid", Some("axi_aw"), None), "axi_aw_valid");
        assert_eq!(
            hierarchical_path("id", Some("axi_aw_bits"), Some("top.dut")),
            "top.dut.axi_aw_bits_id"
        );
    }

    #[test]
    fn shared_handles_see_each_other() {
        let mut table = SignalTable::new();
        let a = bind_signal(&mut table, "ready", Some("axi_b"), None).unwrap();
        let b = bind_signal(&mut table, "ready", Some("axi_b"), None).unwrap();
        a.set_bool(true);
        assert!(b.value_bool());
        assert_eq!(table.peek_u64("axi_b_ready"), Some(1));
    }

    #[test]
    fn strict_table_rejects_unknown_paths() {
        let mut table = SignalTable::strict();
        table.declare("cycles");
        assert!(bind_signal(&mut table, "cycles", None, None).is_ok());
        let err = bind_signal(&mut table, "valid", Some("axi_aw"), None).unwrap_err();
        assert!(matches!(err, BfmError::UnboundSignal { path } if path == "axi_aw_valid"));
    }

    #[test]
    fn wide_values_survive() {
        let mut table = SignalTable::new();
        let data = bind_signal(&mut table, "data", Some("axi_r_bits"), None).unwrap();
        let wide = (BigUint::from(1u8) << 500usize) | BigUint::from(0xabcdu32);
        data.set(wide.clone());
        assert_eq!(data.value(), wide);
        assert_eq!(data.value_u64(), 0xabcd);
    }
}
