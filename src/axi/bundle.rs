//! Channel adapters: the valid/ready/payload signals of each AXI4 channel, bound once at
//! construction.
//!
//! Optional fields are `Option<Signal>`: whether a field exists is decided from the bundle
//! configuration when binding, so driving and sampling never consult the configuration again.
//! A field that was not bound is never read or written.

use num::BigUint;

use crate::axi::config::{AxCfg, AxiBundleCfg, DataCfg};
use crate::axi::encodings::{BurstType, RespType};
use crate::axi::flit::{AddressFlit, ReadDataFlit, Transmit, WriteDataFlit, WriteResponseFlit};
use crate::axi::task::Task;
use crate::base::signal::{bind_signal, Signal, SignalBinder};
use crate::error::Result;

/// Payload signals of one channel.
pub trait ChannelBits {
    type Flit;

    /// Write every bound field from `flit`.
    fn drive(&self, flit: &Self::Flit);

    /// Read every bound field; unbound optional fields come back as `None`.
    fn sample(&self) -> Result<Self::Flit>;
}

/// Ready/valid handshake bundle, the same shape as Chisel's `DecoupledIO`:
///
/// ```text
/// <hierarchy>.<prefix>_valid
/// <hierarchy>.<prefix>_ready
/// <hierarchy>.<prefix>_bits_<field>
/// ```
#[derive(Debug, Clone)]
pub struct Decoupled<B> {
    pub valid: Signal,
    pub ready: Signal,
    pub bits: B,
}

impl<B> Decoupled<B> {
    pub fn bind<F>(
        binder: &mut dyn SignalBinder,
        prefix: &str,
        hierarchy: Option<&str>,
        bind_bits: F,
    ) -> Result<Self>
    where
        F: FnOnce(&mut dyn SignalBinder, &str, Option<&str>) -> Result<B>,
    {
        let bits = bind_bits(&mut *binder, &format!("{prefix}_bits"), hierarchy)?;
        Ok(Self {
            valid: bind_signal(binder, "valid", Some(prefix), hierarchy)?,
            ready: bind_signal(binder, "ready", Some(prefix), hierarchy)?,
            bits,
        })
    }

    pub fn fire(&self) -> bool {
        self.valid.value_bool() && self.ready.value_bool()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.value_bool()
    }

    pub fn is_valid(&self) -> bool {
        self.valid.value_bool()
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.set_bool(valid);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.set_bool(ready);
    }
}

impl<B: ChannelBits> Decoupled<B> {
    /// Put the task's current flit (or current beat of its batch) on the bus and assert valid.
    pub fn send<P: Transmit<Flit = B::Flit>>(&self, task: &Task<P>) {
        self.bits.drive(&task.payload().current_flit());
        self.set_valid(true);
    }

    pub fn recv(&self) -> Result<B::Flit> {
        self.bits.sample()
    }
}

fn bind_optional(
    binder: &mut dyn SignalBinder,
    enabled: bool,
    field: &str,
    prefix: &str,
    hierarchy: Option<&str>,
) -> Result<Option<Signal>> {
    enabled
        .then(|| bind_signal(binder, field, Some(prefix), hierarchy))
        .transpose()
}

fn drive_optional<T: Into<BigUint>>(signal: &Option<Signal>, value: Option<T>) {
    if let Some(signal) = signal {
        match value {
            Some(value) => signal.set(value),
            None => signal.set(0u8),
        }
    }
}

fn sample_u8(signal: &Option<Signal>) -> Option<u8> {
    signal.as_ref().map(|s| s.value_u64() as u8)
}

fn sample_u64(signal: &Option<Signal>) -> Option<u64> {
    signal.as_ref().map(Signal::value_u64)
}

/// AW/AR payload.
#[derive(Debug, Clone)]
pub struct AxBits {
    pub id: Signal,
    pub addr: Signal,
    pub len: Signal,
    pub size: Signal,
    pub burst: Signal,
    pub lock: Option<Signal>,
    pub cache: Option<Signal>,
    pub prot: Option<Signal>,
    pub qos: Option<Signal>,
    pub region: Option<Signal>,
    pub user: Option<Signal>,
}

impl AxBits {
    pub fn bind(
        binder: &mut dyn SignalBinder,
        prefix: &str,
        hierarchy: Option<&str>,
        cfg: &AxCfg,
    ) -> Result<Self> {
        Ok(Self {
            id: bind_signal(binder, "id", Some(prefix), hierarchy)?,
            addr: bind_signal(binder, "addr", Some(prefix), hierarchy)?,
            len: bind_signal(binder, "len", Some(prefix), hierarchy)?,
            size: bind_signal(binder, "size", Some(prefix), hierarchy)?,
            burst: bind_signal(binder, "burst", Some(prefix), hierarchy)?,
            lock: bind_optional(binder, cfg.has_lock, "lock", prefix, hierarchy)?,
            cache: bind_optional(binder, cfg.has_cache, "cache", prefix, hierarchy)?,
            prot: bind_optional(binder, cfg.has_prot, "prot", prefix, hierarchy)?,
            qos: bind_optional(binder, cfg.has_qos, "qos", prefix, hierarchy)?,
            region: bind_optional(binder, cfg.has_region, "region", prefix, hierarchy)?,
            user: bind_optional(binder, cfg.has_user, "user", prefix, hierarchy)?,
        })
    }
}

impl ChannelBits for AxBits {
    type Flit = AddressFlit;

    fn drive(&self, flit: &AddressFlit) {
        self.id.set(flit.id);
        self.addr.set(flit.addr);
        self.len.set(flit.len);
        self.size.set(flit.size);
        self.burst.set(flit.burst.encode());
        drive_optional(&self.lock, flit.lock);
        drive_optional(&self.cache, flit.cache);
        drive_optional(&self.prot, flit.prot);
        drive_optional(&self.qos, flit.qos);
        drive_optional(&self.region, flit.region);
        drive_optional(&self.user, flit.user);
    }

    fn sample(&self) -> Result<AddressFlit> {
        Ok(AddressFlit {
            id: self.id.value_u64(),
            addr: self.addr.value_u64(),
            len: self.len.value_u64() as u8,
            size: self.size.value_u64() as u8,
            burst: BurstType::decode(self.burst.value_u64())?,
            lock: sample_u8(&self.lock),
            cache: sample_u8(&self.cache),
            prot: sample_u8(&self.prot),
            qos: sample_u8(&self.qos),
            region: sample_u8(&self.region),
            user: sample_u64(&self.user),
        })
    }
}

/// W payload.
#[derive(Debug, Clone)]
pub struct WBits {
    pub data: Signal,
    pub strb: Signal,
    pub last: Signal,
    pub user: Option<Signal>,
}

impl WBits {
    pub fn bind(
        binder: &mut dyn SignalBinder,
        prefix: &str,
        hierarchy: Option<&str>,
        cfg: &DataCfg,
    ) -> Result<Self> {
        Ok(Self {
            data: bind_signal(binder, "data", Some(prefix), hierarchy)?,
            strb: bind_signal(binder, "strb", Some(prefix), hierarchy)?,
            last: bind_signal(binder, "last", Some(prefix), hierarchy)?,
            user: bind_optional(binder, cfg.has_user, "user", prefix, hierarchy)?,
        })
    }
}

impl ChannelBits for WBits {
    type Flit = WriteDataFlit;

    fn drive(&self, flit: &WriteDataFlit) {
        self.data.set(flit.data.clone());
        self.strb.set(flit.strb.clone());
        self.last.set_bool(flit.last);
        drive_optional(&self.user, flit.user);
    }

    fn sample(&self) -> Result<WriteDataFlit> {
        Ok(WriteDataFlit {
            data: self.data.value(),
            strb: self.strb.value(),
            last: self.last.value_bool(),
            user: sample_u64(&self.user),
        })
    }
}

/// R payload.
#[derive(Debug, Clone)]
pub struct RBits {
    pub id: Signal,
    pub data: Signal,
    pub resp: Signal,
    pub last: Signal,
    pub user: Option<Signal>,
}

impl RBits {
    pub fn bind(
        binder: &mut dyn SignalBinder,
        prefix: &str,
        hierarchy: Option<&str>,
        cfg: &DataCfg,
    ) -> Result<Self> {
        Ok(Self {
            id: bind_signal(binder, "id", Some(prefix), hierarchy)?,
            data: bind_signal(binder, "data", Some(prefix), hierarchy)?,
            resp: bind_signal(binder, "resp", Some(prefix), hierarchy)?,
            last: bind_signal(binder, "last", Some(prefix), hierarchy)?,
            user: bind_optional(binder, cfg.has_user, "user", prefix, hierarchy)?,
        })
    }
}

impl ChannelBits for RBits {
    type Flit = ReadDataFlit;

    fn drive(&self, flit: &ReadDataFlit) {
        self.id.set(flit.id);
        self.data.set(flit.data.clone());
        self.resp.set(flit.resp.encode());
        self.last.set_bool(flit.last);
        drive_optional(&self.user, flit.user);
    }

    fn sample(&self) -> Result<ReadDataFlit> {
        Ok(ReadDataFlit {
            id: self.id.value_u64(),
            data: self.data.value(),
            resp: RespType::decode(self.resp.value_u64())?,
            last: self.last.value_bool(),
            user: sample_u64(&self.user),
        })
    }
}

/// B payload.
#[derive(Debug, Clone)]
pub struct BBits {
    pub id: Signal,
    pub resp: Signal,
    pub user: Option<Signal>,
}

impl BBits {
    pub fn bind(
        binder: &mut dyn SignalBinder,
        prefix: &str,
        hierarchy: Option<&str>,
        cfg: &DataCfg,
    ) -> Result<Self> {
        Ok(Self {
            id: bind_signal(binder, "id", Some(prefix), hierarchy)?,
            resp: bind_signal(binder, "resp", Some(prefix), hierarchy)?,
            user: bind_optional(binder, cfg.has_user, "user", prefix, hierarchy)?,
        })
    }
}

impl ChannelBits for BBits {
    type Flit = WriteResponseFlit;

    fn drive(&self, flit: &WriteResponseFlit) {
        self.id.set(flit.id);
        self.resp.set(flit.resp.encode());
        drive_optional(&self.user, flit.user);
    }

    fn sample(&self) -> Result<WriteResponseFlit> {
        Ok(WriteResponseFlit {
            id: self.id.value_u64(),
            resp: RespType::decode(self.resp.value_u64())?,
            user: sample_u64(&self.user),
        })
    }
}

/// All five channels of one AXI4 port.
#[derive(Debug, Clone)]
pub struct Axi4Bundle {
    pub aw: Decoupled<AxBits>,
    pub w: Decoupled<WBits>,
    pub b: Decoupled<BBits>,
    pub ar: Decoupled<AxBits>,
    pub r: Decoupled<RBits>,
}

impl Axi4Bundle {
    pub fn bind(binder: &mut dyn SignalBinder, cfg: &AxiBundleCfg) -> Result<Self> {
        let hierarchy = cfg.hierarchy.as_deref();
        Ok(Self {
            aw: Decoupled::bind(binder, &cfg.channel_prefix("aw"), hierarchy, |b, p, h| {
                AxBits::bind(b, p, h, &cfg.aw)
            })?,
            w: Decoupled::bind(binder, &cfg.channel_prefix("w"), hierarchy, |b, p, h| {
                WBits::bind(b, p, h, &cfg.w)
            })?,
            b: Decoupled::bind(binder, &cfg.channel_prefix("b"), hierarchy, |b, p, h| {
                BBits::bind(b, p, h, &cfg.b)
            })?,
            ar: Decoupled::bind(binder, &cfg.channel_prefix("ar"), hierarchy, |b, p, h| {
                AxBits::bind(b, p, h, &cfg.ar)
            })?,
            r: Decoupled::bind(binder, &cfg.channel_prefix("r"), hierarchy, |b, p, h| {
                RBits::bind(b, p, h, &cfg.r)
            })?,
        })
    }
}
