use num::{BigUint, Zero};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::axi::encodings::{BurstType, RespType};
use crate::axi::flit::{AddressFlit, ReadBatch, WriteBatch, WriteResponseFlit};
use crate::builtin::bits::{apply_strobe, byte_mask};

#[test]
fn random_address_stays_in_range_and_aligned() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let flit = AddressFlit::random_gen(&mut rng, 4, (0x103, 0x2ff), 15, 2, 3);
        assert!((0x103..=0x2ff).contains(&flit.addr), "{:#x}", flit.addr);
        assert_eq!(flit.addr % 8, 0);
        assert!(flit.id < 16);
        assert!(flit.len <= 15);
        assert!(flit.size <= 2);
        assert_eq!(flit.burst, BurstType::Incr);
        assert_eq!(flit.lock, None);
        assert_eq!(flit.user, None);
    }
}

#[test]
fn read_batch_places_beats_on_their_lanes() {
    let mut rng = StdRng::seed_from_u64(1);
    let ar = AddressFlit::new(3, 0x1000, 3, 2);
    let batch = ReadBatch::random_gen(&mut rng, &ar, None, 8);

    assert_eq!(batch.nr_beats(), 4);
    assert_eq!(batch.id, 3);
    assert_eq!(batch.resp, RespType::Okay);
    // 4-byte beats on an 8-byte bus starting at lane 0: lanes 0, 4, 0, 4
    for (data, lane) in batch.datas().iter().zip([0usize, 4, 0, 4]) {
        assert!((data >> ((lane + 4) * 8)).is_zero(), "beat spills past its lane: {data:#x}");
        assert!((data & byte_mask(lane)).is_zero(), "beat spills below its lane: {data:#x}");
    }
}

#[test]
fn read_batch_cursor_reports_last_on_final_beat_only() {
    let mut rng = StdRng::seed_from_u64(2);
    let ar = AddressFlit::new(0, 0x0, 5, 3);
    let mut batch = ReadBatch::random_gen(&mut rng, &ar, None, 8);
    assert_eq!(batch.nr_beats(), 6);

    for beat in 0..6 {
        assert_eq!(batch.beat(), beat);
        assert_eq!(batch.last(), beat == 5);
        assert_eq!(batch.current_beat().last, beat == 5);
        assert_eq!(batch.advance(), beat != 5);
    }
    assert_eq!(batch.beat(), 5);
}

#[test]
fn read_batch_honors_data_cap() {
    let mut rng = StdRng::seed_from_u64(3);
    let ar = AddressFlit::new(1, 0x0, 7, 3);
    let batch = ReadBatch::random_gen(&mut rng, &ar, Some(2), 8);
    for data in batch.datas() {
        assert!(data < &(BigUint::from(1u32) << 16usize));
    }
}

#[test]
fn write_batch_strobes_cover_exactly_the_driven_lanes() {
    let mut rng = StdRng::seed_from_u64(4);
    let aw = AddressFlit::new(1, 0x104, 2, 2);
    let batch = WriteBatch::random_gen(&mut rng, &aw, None, 8);

    let expected: Vec<BigUint> = [0xf0u32, 0x0f, 0xf0].into_iter().map(BigUint::from).collect();
    assert_eq!(batch.strbs(), expected.as_slice());
    for (data, strb) in batch.datas().iter().zip(batch.strbs()) {
        assert_eq!(&apply_strobe(data, strb), data);
    }
}

#[test]
fn write_batch_honors_data_cap() {
    let mut rng = StdRng::seed_from_u64(5);
    let aw = AddressFlit::new(1, 0x0, 3, 3);
    let batch = WriteBatch::random_gen(&mut rng, &aw, Some(2), 8);
    for strb in batch.strbs() {
        assert_eq!(strb, &BigUint::from(0x3u32));
    }
}

#[test]
fn beat_addresses_follow_the_burst_type() {
    let incr = AddressFlit::new(0, 0x1003, 2, 2);
    assert_eq!(
        (0..3).map(|i| incr.beat_addr(i)).collect::<Vec<_>>(),
        vec![0x1003, 0x1004, 0x1008]
    );

    let wrap = AddressFlit::new(0, 0x1008, 3, 2).with_burst(BurstType::Wrap);
    assert_eq!(wrap.total_bytes(), 16);
    assert_eq!(
        (0..4).map(|i| wrap.beat_addr(i)).collect::<Vec<_>>(),
        vec![0x1008, 0x100c, 0x1000, 0x1004]
    );

    let fixed = AddressFlit::new(0, 0x2000, 3, 2).with_burst(BurstType::Fixed);
    assert!((0..4).all(|i| fixed.beat_addr(i) == 0x2000));
}

#[test]
fn write_response_echoes_the_request_id() {
    let aw = AddressFlit::new(0x2a, 0x40, 0, 0);
    let resp = WriteResponseFlit::random_gen(&aw);
    assert_eq!(resp.id, 0x2a);
    assert_eq!(resp.resp, RespType::Okay);
    assert_eq!(resp.user, None);
}
