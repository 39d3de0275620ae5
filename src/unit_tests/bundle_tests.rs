use num::BigUint;

use crate::axi::bundle::Axi4Bundle;
use crate::axi::config::{AxCfg, AxiBundleCfg, DataCfg};
use crate::axi::encodings::{BurstType, Channel, RespType};
use crate::axi::flit::AddressFlit;
use crate::axi::task::{AxTask, BTask, TaskMeta, WTask};
use crate::base::signal::SignalTable;
use crate::error::BfmError;

const AW_FIELDS: [&str; 11] = [
    "id", "addr", "len", "size", "burst", "lock", "cache", "prot", "qos", "region", "user",
];

fn meta() -> TaskMeta<'static> {
    TaskMeta::new(0, 100, None)
}

fn full_cfg(prefix: &str) -> AxiBundleCfg {
    AxiBundleCfg {
        prefix: prefix.to_string(),
        aw: AxCfg::full(),
        ar: AxCfg::full(),
        w: DataCfg { has_user: true },
        b: DataCfg { has_user: true },
        r: DataCfg { has_user: true },
        ..AxiBundleCfg::default()
    }
}

#[test]
fn bundle_binds_hierarchical_paths() {
    let mut table = SignalTable::new();
    let cfg = AxiBundleCfg {
        hierarchy: Some("tb.dut".to_string()),
        ..AxiBundleCfg::default()
    };
    Axi4Bundle::bind(&mut table, &cfg).unwrap();
    for path in [
        "tb.dut.axi_aw_valid",
        "tb.dut.axi_aw_ready",
        "tb.dut.axi_aw_bits_addr",
        "tb.dut.axi_w_bits_strb",
        "tb.dut.axi_b_bits_resp",
        "tb.dut.axi_ar_bits_burst",
        "tb.dut.axi_r_bits_last",
    ] {
        assert!(table.contains(path), "{path} not bound");
    }
    assert!(!table.contains("tb.dut.axi_aw_bits_lock"));
    assert!(!table.contains("tb.dut.axi_r_bits_user"));
}

#[test]
fn address_recv_then_send_reproduces_enabled_fields() {
    let mut src = SignalTable::new();
    let input = Axi4Bundle::bind(&mut src, &full_cfg("axi")).unwrap();
    for (field, value) in AW_FIELDS.iter().zip([5u64, 0x2040, 3, 2, 2, 1, 0xa, 3, 7, 2, 0x55]) {
        src.poke(&format!("axi_aw_bits_{field}"), value);
    }

    let task = AxTask::recv(&input.aw, Channel::AW, meta()).unwrap();
    assert_eq!(task.flit().burst, BurstType::Wrap);
    assert_eq!(task.flit().lock, Some(1));
    assert_eq!(task.flit().user, Some(0x55));

    let mut dst = SignalTable::new();
    let output = Axi4Bundle::bind(&mut dst, &full_cfg("dut")).unwrap();
    output.aw.send(&task);
    for field in AW_FIELDS {
        assert_eq!(
            dst.peek(&format!("dut_aw_bits_{field}")),
            src.peek(&format!("axi_aw_bits_{field}")),
            "{field}"
        );
    }
    assert_eq!(dst.peek_u64("dut_aw_valid"), Some(1));
}

#[test]
fn disabled_fields_are_never_touched() {
    let mut table = SignalTable::new();
    let bundle = Axi4Bundle::bind(&mut table, &AxiBundleCfg::default()).unwrap();

    let mut flit = AddressFlit::new(1, 0x40, 0, 3);
    flit.lock = Some(1);
    flit.qos = Some(4);
    let task = AxTask::customized(flit, Channel::AR, meta());
    bundle.ar.send(&task);

    assert_eq!(table.peek_u64("axi_ar_bits_addr"), Some(0x40));
    assert!(!table.contains("axi_ar_bits_lock"));
    assert!(!table.contains("axi_ar_bits_qos"));

    let sampled = bundle.ar.recv().unwrap();
    assert_eq!(sampled.lock, None);
    assert_eq!(sampled.qos, None);
}

#[test]
fn write_beat_round_trips_wide_data() {
    let mut src = SignalTable::new();
    let input = Axi4Bundle::bind(&mut src, &full_cfg("axi")).unwrap();
    let wide = (BigUint::from(0xdeadu32) << 200usize) | BigUint::from(0xbeefu32);
    src.poke("axi_w_bits_data", wide.clone());
    src.poke("axi_w_bits_strb", 0xffff_ffffu32);
    src.poke("axi_w_bits_last", 1u8);
    src.poke("axi_w_bits_user", 9u8);

    let task = WTask::recv(&input.w, meta()).unwrap();
    let beat = task.payload().as_flit().unwrap();
    assert_eq!(beat.data, wide);
    assert!(beat.last);
    assert_eq!(beat.user, Some(9));

    let mut dst = SignalTable::new();
    let output = Axi4Bundle::bind(&mut dst, &full_cfg("dut")).unwrap();
    output.w.send(&task);
    assert_eq!(dst.peek("dut_w_bits_data"), Some(wide));
    assert_eq!(dst.peek_u64("dut_w_bits_strb"), Some(0xffff_ffff));
    assert_eq!(dst.peek_u64("dut_w_bits_last"), Some(1));
}

#[test]
fn write_response_round_trips() {
    let mut table = SignalTable::new();
    let bundle = Axi4Bundle::bind(&mut table, &AxiBundleCfg::default()).unwrap();
    table.poke("axi_b_bits_id", 6u8);
    table.poke("axi_b_bits_resp", 2u8);
    let task = BTask::recv(&bundle.b, meta()).unwrap();
    assert_eq!(task.flit().id, 6);
    assert_eq!(task.flit().resp, RespType::SlvErr);
    assert_eq!(task.flit().user, None);
}

#[test]
fn fire_needs_valid_and_ready() {
    let mut table = SignalTable::new();
    let bundle = Axi4Bundle::bind(&mut table, &AxiBundleCfg::default()).unwrap();
    assert!(!bundle.b.fire());
    bundle.b.set_valid(true);
    assert!(!bundle.b.fire());
    assert!(!bundle.b.is_ready());
    bundle.b.set_ready(true);
    assert!(bundle.b.fire());
    bundle.b.set_valid(false);
    assert!(!bundle.b.fire());
}

#[test]
fn undefined_burst_encoding_is_rejected() {
    let mut table = SignalTable::new();
    let bundle = Axi4Bundle::bind(&mut table, &AxiBundleCfg::default()).unwrap();
    table.poke("axi_aw_bits_burst", 3u8);
    let err = AxTask::recv(&bundle.aw, Channel::AW, meta()).unwrap_err();
    assert!(matches!(err, BfmError::Encoding { field: "burst", value: 3 }));
}

#[test]
fn strict_binder_reports_missing_signals() {
    let mut table = SignalTable::strict();
    table.declare("axi_aw_bits_id");
    let err = Axi4Bundle::bind(&mut table, &AxiBundleCfg::default()).unwrap_err();
    assert!(matches!(err, BfmError::UnboundSignal { .. }));
}
