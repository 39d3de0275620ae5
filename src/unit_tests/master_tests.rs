use std::sync::Arc;

use num::BigUint;

use crate::agent::config::AxiAgentConfig;
use crate::agent::master::{AxiMaster, TxnKind};
use crate::axi::encodings::{Channel, RespType};
use crate::axi::flit::{AddressFlit, WriteBatch};
use crate::base::behavior::ModuleBehaviors;
use crate::base::signal::{bind_signal, Signal, SignalTable};
use crate::error::BfmError;

/// A master whose bus is driven by hand through the signal table.
struct Bench {
    table: SignalTable,
    cycles: Signal,
    master: AxiMaster,
}

impl Bench {
    fn new(conf: AxiAgentConfig) -> Self {
        let mut table = SignalTable::new();
        let cycles = bind_signal(&mut table, "cycles", None, None).unwrap();
        let master = AxiMaster::new(Arc::new(conf), &mut table, Arc::new(cycles.clone())).unwrap();
        Self {
            table,
            cycles,
            master,
        }
    }

    fn drive(&mut self) {
        self.cycles.set(self.cycles.value_u64() + 1);
        self.master.drive_phase().unwrap();
    }

    fn sample(&mut self) {
        self.master.sample_phase().unwrap();
    }

    fn poke(&mut self, path: &str, value: u64) {
        self.table.poke(path, value);
    }

    fn peek(&self, path: &str) -> u64 {
        self.table.peek_u64(path).unwrap()
    }
}

fn conf() -> AxiAgentConfig {
    AxiAgentConfig {
        name: "m".to_string(),
        ..AxiAgentConfig::default()
    }
}

fn one_beat_write(id: u64) -> (AddressFlit, WriteBatch) {
    (
        AddressFlit::new(id, 0x100, 0, 3),
        WriteBatch::new(vec![BigUint::from(0xabu8)], vec![BigUint::from(0xffu8)]),
    )
}

#[test]
fn idle_master_drives_nothing() {
    let mut bench = Bench::new(conf());
    bench.drive();
    for channel in ["aw", "w", "ar"] {
        assert_eq!(bench.peek(&format!("axi_{channel}_valid")), 0, "{channel}");
    }
    assert_eq!(bench.peek("axi_b_ready"), 1);
    assert_eq!(bench.peek("axi_r_ready"), 1);
    assert!(bench.master.is_idle());
}

#[test]
fn aw_valid_drops_after_the_queue_drains() {
    let mut bench = Bench::new(conf());
    let (aw, batch) = one_beat_write(1);
    bench.master.issue_write(aw, batch).unwrap();

    bench.drive();
    assert_eq!(bench.peek("axi_aw_valid"), 1);
    assert_eq!(bench.peek("axi_aw_bits_id"), 1);
    assert_eq!(bench.peek("axi_w_valid"), 1);
    bench.poke("axi_aw_ready", 1);
    bench.sample();
    assert!(bench.master.aw_queue().is_empty());
    assert_eq!(bench.master.w_queue().len(), 1);
    assert_eq!(bench.master.outstanding(), 1);

    bench.drive();
    assert_eq!(bench.peek("axi_aw_valid"), 0);
    assert_eq!(bench.peek("axi_w_valid"), 1);
    assert_eq!(bench.peek("axi_w_bits_last"), 1);
    bench.poke("axi_w_ready", 1);
    bench.sample();
    assert!(bench.master.w_queue().is_empty());

    bench.drive();
    assert_eq!(bench.peek("axi_w_valid"), 0);
}

#[test]
fn write_data_is_offered_before_the_address_is_accepted() {
    let mut bench = Bench::new(AxiAgentConfig {
        timeout_threshold: 50,
        ..conf()
    });
    let (aw, batch) = one_beat_write(3);
    bench.master.issue_write(aw, batch).unwrap();

    // the responder only raises AW and W ready once it sees write data
    for _ in 0..10 {
        bench.drive();
        let w_valid = bench.peek("axi_w_valid");
        bench.poke("axi_aw_ready", w_valid);
        bench.poke("axi_w_ready", w_valid);
        bench.sample();
        if bench.master.w_queue().is_empty() {
            break;
        }
    }
    assert!(bench.master.aw_queue().is_empty());
    assert!(bench.master.w_queue().is_empty());
    assert_eq!(bench.master.outstanding(), 1);
    assert_eq!(bench.master.stats().handshakes.get(Channel::AW), 1);
    assert_eq!(bench.master.stats().handshakes.get(Channel::W), 1);
}

#[test]
fn write_data_can_lead_a_stalled_address() {
    let mut bench = Bench::new(conf());
    let (aw, batch) = one_beat_write(4);
    bench.master.issue_write(aw, batch).unwrap();

    bench.poke("axi_w_ready", 1);
    bench.drive();
    bench.sample();
    assert!(bench.master.w_queue().is_empty());
    assert_eq!(bench.master.aw_queue().len(), 1);

    bench.drive();
    assert_eq!(bench.peek("axi_aw_valid"), 1);
    assert_eq!(bench.peek("axi_w_valid"), 0);
    bench.poke("axi_aw_ready", 1);
    bench.sample();
    assert_eq!(bench.master.outstanding(), 1);
}

#[test]
fn ar_valid_follows_the_ar_queue() {
    let mut bench = Bench::new(conf());
    bench.master.issue_read(AddressFlit::new(2, 0x40, 1, 3)).unwrap();

    bench.drive();
    assert_eq!(bench.peek("axi_ar_valid"), 1);
    assert_eq!(bench.peek("axi_aw_valid"), 0);
    bench.sample();
    // not accepted, still queued
    assert_eq!(bench.master.ar_queue().len(), 1);

    bench.poke("axi_ar_ready", 1);
    bench.drive();
    bench.sample();
    assert!(bench.master.ar_queue().is_empty());

    bench.drive();
    assert_eq!(bench.peek("axi_ar_valid"), 0);
}

#[test]
fn write_retires_on_its_response() {
    let mut bench = Bench::new(conf());
    let (aw, batch) = one_beat_write(5);
    bench.master.issue_write(aw, batch).unwrap();
    bench.poke("axi_aw_ready", 1);
    bench.poke("axi_w_ready", 1);
    bench.drive();
    bench.sample();
    bench.drive();
    bench.sample();
    assert_eq!(bench.master.outstanding(), 1);

    bench.poke("axi_b_valid", 1);
    bench.poke("axi_b_bits_id", 5);
    bench.poke("axi_b_bits_resp", 0);
    bench.drive();
    bench.sample();
    assert_eq!(bench.master.b_queue().len(), 1);

    bench.poke("axi_b_valid", 0);
    bench.drive();
    bench.sample();
    let done = bench.master.take_completions();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].kind, TxnKind::Write);
    assert_eq!(done[0].id, 5);
    assert_eq!(done[0].resp, RespType::Okay);
    assert!(bench.master.is_idle());
    assert_eq!(bench.master.stats().writes_completed, 1);
    assert_eq!(bench.master.stats().handshakes.get(Channel::B), 1);
}

#[test]
fn read_collects_every_beat() {
    let mut bench = Bench::new(conf());
    bench.master.issue_read(AddressFlit::new(2, 0x40, 1, 3)).unwrap();
    bench.poke("axi_ar_ready", 1);
    bench.drive();
    bench.sample();

    bench.poke("axi_r_valid", 1);
    bench.poke("axi_r_bits_id", 2);
    bench.poke("axi_r_bits_data", 0x11);
    bench.poke("axi_r_bits_last", 0);
    bench.drive();
    bench.sample();

    bench.poke("axi_r_bits_data", 0x22);
    bench.poke("axi_r_bits_last", 1);
    bench.drive();
    bench.sample();

    bench.poke("axi_r_valid", 0);
    bench.drive();
    bench.sample();
    let done = bench.master.take_completions();
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].kind, TxnKind::Read);
    assert_eq!(done[0].data, vec![BigUint::from(0x11u8), BigUint::from(0x22u8)]);
    assert_eq!(bench.master.stats().reads_completed, 1);
}

#[test]
fn response_without_request_is_fatal() {
    let mut bench = Bench::new(conf());
    bench.poke("axi_b_valid", 1);
    bench.poke("axi_b_bits_id", 9);
    bench.drive();
    bench.sample();
    bench.cycles.set(2u8);
    let err = bench.master.drive_phase().unwrap_err();
    assert!(matches!(
        err,
        BfmError::UnexpectedResponse { channel: Channel::B, id: 9, .. }
    ));
}

#[test]
fn early_last_on_read_data_is_fatal() {
    let mut bench = Bench::new(conf());
    bench.master.issue_read(AddressFlit::new(1, 0x0, 3, 3)).unwrap();
    bench.poke("axi_ar_ready", 1);
    bench.drive();
    bench.sample();

    bench.poke("axi_r_valid", 1);
    bench.poke("axi_r_bits_id", 1);
    bench.poke("axi_r_bits_last", 1);
    bench.drive();
    bench.sample();
    let err = bench.master.drive_phase().unwrap_err();
    assert!(matches!(err, BfmError::Protocol { channel: Channel::R, .. }));
}

#[test]
fn directed_requests_respect_queue_capacity() {
    let mut bench = Bench::new(conf());
    bench.master.issue_read(AddressFlit::new(0, 0, 0, 0)).unwrap();
    bench.master.issue_read(AddressFlit::new(1, 0, 0, 0)).unwrap();
    let err = bench.master.issue_read(AddressFlit::new(2, 0, 0, 0)).unwrap_err();
    assert!(matches!(err, BfmError::QueueFull { capacity: 2, .. }));
}

#[test]
fn stalled_request_times_out() {
    let mut bench = Bench::new(AxiAgentConfig {
        timeout_threshold: 3,
        ..conf()
    });
    bench.master.issue_read(AddressFlit::new(0, 0, 0, 0)).unwrap();
    bench.drive();
    bench.drive();
    bench.cycles.set(3u8);
    let err = bench.master.drive_phase().unwrap_err();
    assert!(err.is_timeout());
}

#[test]
fn random_master_keeps_its_outstanding_cap() {
    let mut bench = Bench::new(AxiAgentConfig {
        random_txn: true,
        max_nr_txns: 3,
        ..conf()
    });
    bench.poke("axi_aw_ready", 1);
    bench.poke("axi_ar_ready", 1);
    bench.poke("axi_w_ready", 1);
    for _ in 0..50 {
        bench.drive();
        bench.sample();
        let queued = bench.master.aw_queue().len() + bench.master.ar_queue().len();
        assert!(bench.master.outstanding() + queued <= 3);
    }
    // nobody answers, so the cap is reached and held
    assert_eq!(bench.master.outstanding(), 3);
}
