//! Per-channel payloads of the AXI4 protocol.
//!
//! A flit is what one handshake moves on one channel. Bursts on the data channels are modelled
//! as batches: the full list of beats plus a cursor naming the beat currently on the wire.

use num::BigUint;
use rand::Rng;

use crate::axi::encodings::{BurstType, RespType};
use crate::builtin::bits::{apply_strobe, byte_mask, lane_strobe, random_bytes};

/// Anything that can put its current beat on a channel.
pub trait Transmit {
    type Flit;

    fn current_flit(&self) -> Self::Flit;
}

/// AW/AR request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFlit {
    pub id: u64,
    pub addr: u64,
    pub len: u8,
    pub size: u8,
    pub burst: BurstType,
    pub lock: Option<u8>,
    pub cache: Option<u8>,
    pub prot: Option<u8>,
    pub qos: Option<u8>,
    pub region: Option<u8>,
    pub user: Option<u64>,
}

impl AddressFlit {
    pub fn new(id: u64, addr: u64, len: u8, size: u8) -> Self {
        Self {
            id,
            addr,
            len,
            size,
            burst: BurstType::Incr,
            lock: None,
            cache: None,
            prot: None,
            qos: None,
            region: None,
            user: None,
        }
    }

    pub fn with_burst(mut self, burst: BurstType) -> Self {
        self.burst = burst;
        self
    }

    /// Random INCR request. The address is drawn from `addr_range` (inclusive) and aligned
    /// down to the bus width; optional fields stay unset.
    pub fn random_gen<R: Rng + ?Sized>(
        rng: &mut R,
        id_bits: u32,
        addr_range: (u64, u64),
        max_len: u8,
        max_size: u8,
        bus_size: u32,
    ) -> Self {
        let (min_addr, max_addr) = addr_range;
        assert!(min_addr <= max_addr, "empty address range");
        assert!(bus_size < 64, "bus size out of range");

        // same ID is allowed
        let id = if id_bits >= 64 {
            rng.gen::<u64>()
        } else {
            rng.gen_range(0..(1u64 << id_bits))
        };

        // draw among aligned slots so the result never falls below the range
        let first = (min_addr >> bus_size) + u64::from(min_addr & ((1u64 << bus_size) - 1) != 0);
        let last = max_addr >> bus_size;
        let addr = if first <= last {
            rng.gen_range(first..=last) << bus_size
        } else {
            min_addr >> bus_size << bus_size
        };

        let len = rng.gen_range(0..=max_len);
        let size = rng.gen_range(0..=max_size);
        Self::new(id, addr, len, size)
    }

    pub fn nr_beats(&self) -> usize {
        self.len as usize + 1
    }

    pub fn beat_bytes(&self) -> u64 {
        1u64 << self.size
    }

    pub fn total_bytes(&self) -> u64 {
        (self.nr_beats() as u64) << self.size
    }

    /// Byte address of beat `beat` of this burst.
    pub fn beat_addr(&self, beat: usize) -> u64 {
        let beat_bytes = self.beat_bytes();
        let step = beat as u64 * beat_bytes;
        match self.burst {
            BurstType::Fixed => self.addr,
            BurstType::Incr => {
                if beat == 0 {
                    self.addr
                } else {
                    (self.addr & !(beat_bytes - 1)).wrapping_add(step)
                }
            }
            BurstType::Wrap => {
                let total = self.total_bytes();
                let boundary = self.addr / total * total;
                boundary + (self.addr - boundary + step) % total
            }
        }
    }

    /// Bus lane of each beat's data: starts at the address offset within the bus word,
    /// advances by the beat size and wraps to lane 0 when it runs off the bus.
    pub fn lane_offsets(&self, bus_bytes: usize) -> Vec<usize> {
        let beat_bytes = self.beat_bytes() as usize;
        let mut offset = (self.addr % bus_bytes as u64) as usize;
        (0..self.nr_beats())
            .map(|_| {
                let lane = offset;
                offset += beat_bytes;
                if offset >= bus_bytes {
                    offset = 0;
                }
                lane
            })
            .collect()
    }

    fn data_bytes(&self, max_data_bytes: Option<usize>) -> usize {
        let beat_bytes = self.beat_bytes() as usize;
        max_data_bytes.map_or(beat_bytes, |cap| beat_bytes.min(cap))
    }
}

impl Transmit for AddressFlit {
    type Flit = AddressFlit;

    fn current_flit(&self) -> AddressFlit {
        self.clone()
    }
}

/// One W beat as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteDataFlit {
    pub data: BigUint,
    pub strb: BigUint,
    pub last: bool,
    pub user: Option<u64>,
}

/// One R beat as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadDataFlit {
    pub id: u64,
    pub data: BigUint,
    pub resp: RespType,
    pub last: bool,
    pub user: Option<u64>,
}

/// B response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResponseFlit {
    pub id: u64,
    pub resp: RespType,
    pub user: Option<u64>,
}

impl WriteResponseFlit {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            resp: RespType::Okay,
            user: None,
        }
    }

    /// Not randomized, only echoes the request id; kept for symmetry with the other channels.
    pub fn random_gen(aw: &AddressFlit) -> Self {
        Self::new(aw.id)
    }
}

impl Transmit for WriteResponseFlit {
    type Flit = WriteResponseFlit;

    fn current_flit(&self) -> WriteResponseFlit {
        self.clone()
    }
}

/// A full W burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    datas: Vec<BigUint>,
    strbs: Vec<BigUint>,
    beat: usize,
    pub user: Option<u64>,
}

impl WriteBatch {
    pub fn new(datas: Vec<BigUint>, strbs: Vec<BigUint>) -> Self {
        assert!(!datas.is_empty(), "a write batch needs at least one beat");
        assert_eq!(datas.len(), strbs.len(), "one strobe per data beat");
        Self {
            datas,
            strbs,
            beat: 0,
            user: None,
        }
    }

    /// Random burst for `aw`. Beats walk the bus lanes the same way read data does
    /// (see [`AddressFlit::lane_offsets`]); each strobe covers exactly the lanes its beat
    /// drives and the data outside them is zero.
    pub fn random_gen<R: Rng + ?Sized>(
        rng: &mut R,
        aw: &AddressFlit,
        max_data_bytes: Option<usize>,
        bus_bytes: usize,
    ) -> Self {
        let data_bytes = aw.data_bytes(max_data_bytes);
        let bus_strobe = lane_strobe(bus_bytes);

        let (datas, strbs) = aw
            .lane_offsets(bus_bytes)
            .into_iter()
            .map(|lane| {
                let strb = (lane_strobe(data_bytes) << lane) & &bus_strobe;
                let data = apply_strobe(&(random_bytes(rng, data_bytes) << (lane * 8)), &strb);
                (data, strb)
            })
            .unzip();
        Self::new(datas, strbs)
    }

    pub fn nr_beats(&self) -> usize {
        self.datas.len()
    }

    pub fn beat(&self) -> usize {
        self.beat
    }

    pub fn last(&self) -> bool {
        self.beat == self.datas.len() - 1
    }

    pub fn data(&self) -> &BigUint {
        &self.datas[self.beat]
    }

    pub fn strb(&self) -> &BigUint {
        &self.strbs[self.beat]
    }

    pub fn datas(&self) -> &[BigUint] {
        &self.datas
    }

    pub fn strbs(&self) -> &[BigUint] {
        &self.strbs
    }

    /// Move to the next beat. Returns false, leaving the cursor in place, on the last beat.
    pub fn advance(&mut self) -> bool {
        if self.last() {
            return false;
        }
        self.beat += 1;
        true
    }

    pub fn current_beat(&self) -> WriteDataFlit {
        WriteDataFlit {
            data: self.data().clone(),
            strb: self.strb().clone(),
            last: self.last(),
            user: self.user,
        }
    }
}

/// A full R burst.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadBatch {
    pub id: u64,
    datas: Vec<BigUint>,
    pub resp: RespType,
    beat: usize,
    pub user: Option<u64>,
}

impl ReadBatch {
    pub fn new(id: u64, datas: Vec<BigUint>) -> Self {
        assert!(!datas.is_empty(), "a read batch needs at least one beat");
        Self {
            id,
            datas,
            resp: RespType::Okay,
            beat: 0,
            user: None,
        }
    }

    /// Random read data for `ar`: `ar.len + 1` beats, each a random value of the beat size
    /// (capped by `max_data_bytes`) placed on its lane and masked to the bus width.
    pub fn random_gen<R: Rng + ?Sized>(
        rng: &mut R,
        ar: &AddressFlit,
        max_data_bytes: Option<usize>,
        bus_bytes: usize,
    ) -> Self {
        let data_bytes = ar.data_bytes(max_data_bytes);
        let bus_mask = byte_mask(bus_bytes);

        let datas = ar
            .lane_offsets(bus_bytes)
            .into_iter()
            .map(|lane| (random_bytes(rng, data_bytes) << (lane * 8)) & &bus_mask)
            .collect();
        Self::new(ar.id, datas)
    }

    pub fn nr_beats(&self) -> usize {
        self.datas.len()
    }

    pub fn beat(&self) -> usize {
        self.beat
    }

    pub fn last(&self) -> bool {
        self.beat == self.datas.len() - 1
    }

    pub fn data(&self) -> &BigUint {
        &self.datas[self.beat]
    }

    pub fn datas(&self) -> &[BigUint] {
        &self.datas
    }

    /// Move to the next beat. Returns false, leaving the cursor in place, on the last beat.
    pub fn advance(&mut self) -> bool {
        if self.last() {
            return false;
        }
        self.beat += 1;
        true
    }

    pub fn current_beat(&self) -> ReadDataFlit {
        ReadDataFlit {
            id: self.id,
            data: self.data().clone(),
            resp: self.resp,
            last: self.last(),
            user: self.user,
        }
    }
}
