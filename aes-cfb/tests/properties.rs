use aes_cfb::{
    CipherContext, Direction, EngineDescriptor, EngineKind, Error, FeedbackWidth, KeySchedule, KeySize, Registry,
    State,
};
use proptest::prelude::*;

fn key_and_size() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 16),
        prop::collection::vec(any::<u8>(), 24),
        prop::collection::vec(any::<u8>(), 32),
    ]
}

fn width() -> impl Strategy<Value = FeedbackWidth> {
    prop_oneof![
        Just(FeedbackWidth::Cfb128),
        Just(FeedbackWidth::Cfb8),
        Just(FeedbackWidth::Cfb1),
    ]
}

fn engine(keys: &KeySchedule, width: FeedbackWidth, kind: EngineKind) -> EngineDescriptor {
    EngineDescriptor {
        key_size: keys.key_size(),
        width,
        kind,
    }
}

fn context<'k>(engine: &EngineDescriptor, direction: Direction, keys: &'k KeySchedule, iv: &[u8]) -> CipherContext<'k> {
    aes_cfb::init(engine, direction, keys, iv).unwrap()
}

proptest! {
    #[test]
    fn round_trip(
        key in key_and_size(),
        iv in any::<[u8; 16]>(),
        width in width(),
        data in prop::collection::vec(any::<u8>(), 0..200),
    ) {
        let keys = KeySchedule::expand(&key).unwrap();
        let e = engine(&keys, width, EngineKind::Reference);
        let ct = context(&e, Direction::Encrypt, &keys, &iv).process(&data).unwrap();
        prop_assert_eq!(ct.len(), data.len());
        let pt = context(&e, Direction::Decrypt, &keys, &iv).process(&ct).unwrap();
        prop_assert_eq!(pt, data);
    }

    #[test]
    fn engine_kinds_agree(
        key in key_and_size(),
        iv in any::<[u8; 16]>(),
        data in prop::collection::vec(any::<u8>(), 0..400),
    ) {
        let keys = KeySchedule::expand(&key).unwrap();
        for direction in [Direction::Encrypt, Direction::Decrypt] {
            let reference = engine(&keys, FeedbackWidth::Cfb128, EngineKind::Reference);
            let accelerated = engine(&keys, FeedbackWidth::Cfb128, EngineKind::HardwareAccelerated);
            prop_assert_eq!(
                context(&reference, direction, &keys, &iv).process(&data).unwrap(),
                context(&accelerated, direction, &keys, &iv).process(&data).unwrap()
            );
        }
    }

    #[test]
    fn streaming_equivalence(
        key in key_and_size(),
        iv in any::<[u8; 16]>(),
        cfb1 in any::<bool>(),
        decrypt in any::<bool>(),
        data in prop::collection::vec(any::<u8>(), 0..64),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let keys = KeySchedule::expand(&key).unwrap();
        let width = if cfb1 { FeedbackWidth::Cfb1 } else { FeedbackWidth::Cfb8 };
        let direction = if decrypt { Direction::Decrypt } else { Direction::Encrypt };
        let e = engine(&keys, width, EngineKind::Reference);

        let whole = context(&e, direction, &keys, &iv).process(&data).unwrap();

        let mut cuts: Vec<usize> = cuts.iter().map(|i| i.index(data.len() + 1)).collect();
        cuts.push(0);
        cuts.push(data.len());
        cuts.sort_unstable();
        let mut ctx = context(&e, direction, &keys, &iv);
        let mut pieces = Vec::new();
        for w in cuts.windows(2) {
            pieces.extend(ctx.process(&data[w[0]..w[1]]).unwrap());
        }
        prop_assert_eq!(pieces, whole);
    }

    #[test]
    fn cfb1_bit_streaming(
        key in key_and_size(),
        iv in any::<[u8; 16]>(),
        byte in any::<u8>(),
        split in 0usize..=8,
    ) {
        let keys = KeySchedule::expand(&key).unwrap();
        let e = engine(&keys, FeedbackWidth::Cfb1, EngineKind::Reference);
        let whole = context(&e, Direction::Encrypt, &keys, &iv).process(&[byte]).unwrap()[0];

        let mut ctx = context(&e, Direction::Encrypt, &keys, &iv);
        let head = ctx.process_bits(&[byte], split).unwrap();
        prop_assert_eq!(ctx.bit_offset() as usize, split % 8);
        let tail = ctx.process_bits(&[byte.checked_shl(split as u32).unwrap_or(0)], 8 - split).unwrap();
        let head = head.first().copied().unwrap_or(0);
        let tail = tail.first().copied().unwrap_or(0);
        prop_assert_eq!(head | tail.checked_shr(split as u32).unwrap_or(0), whole);
    }
}

#[test]
fn zero_length_input_does_not_move_state() {
    let keys = KeySchedule::expand(&[0x42; 16]).unwrap();
    let iv = [0x24; 16];
    let data = [0x99u8; 40];
    for width in FeedbackWidth::ALL {
        let e = engine(&keys, width, EngineKind::Reference);
        let mut ctx = context(&e, Direction::Encrypt, &keys, &iv);
        assert!(ctx.process(&[]).unwrap().is_empty());
        assert_eq!(ctx.state(), State::Initialized);
        assert_eq!(ctx.iv_state(), Some(iv));
        let after_empty = ctx.process(&data).unwrap();
        let fresh = context(&e, Direction::Encrypt, &keys, &iv).process(&data).unwrap();
        assert_eq!(after_empty, fresh);
    }
}

#[test]
fn cfb128_partial_block_exhausts() {
    let keys = KeySchedule::expand(&[0x42; 32]).unwrap();
    let e = engine(&keys, FeedbackWidth::Cfb128, EngineKind::Reference);
    for direction in [Direction::Encrypt, Direction::Decrypt] {
        for len in 1..16 {
            let mut ctx = context(&e, direction, &keys, &[0; 16]);
            ctx.process(&vec![0; len]).unwrap();
            assert_eq!(ctx.state(), State::Exhausted);
            assert_eq!(ctx.process(&[0; 16]).unwrap_err(), Error::StreamExhausted);
            assert_eq!(ctx.process(&[]).unwrap_err(), Error::StreamExhausted);

            let mut buf = [7u8; 4];
            assert_eq!(ctx.process_in_place(&mut buf).unwrap_err(), Error::StreamExhausted);
            assert_eq!(buf, [7u8; 4]);
        }
    }
}

#[test]
fn cfb8_and_cfb1_never_exhaust() {
    let keys = KeySchedule::expand(&[0x42; 24]).unwrap();
    for width in [FeedbackWidth::Cfb8, FeedbackWidth::Cfb1] {
        let e = engine(&keys, width, EngineKind::Reference);
        let mut ctx = context(&e, Direction::Encrypt, &keys, &[0; 16]);
        for len in [3, 17, 1, 5] {
            ctx.process(&vec![0; len]).unwrap();
            assert_eq!(ctx.state(), State::InUse);
        }
    }
}

#[test]
fn rejects_unsupported_configurations() {
    for (key_bits, width_bits) in [(96, 128), (128, 7)] {
        assert_eq!(
            aes_cfb::select_engine(key_bits, width_bits).unwrap_err(),
            Error::UnsupportedConfiguration { key_bits, width_bits }
        );
    }
    assert!(aes_cfb::aes_cfb1(64).is_err());
    assert!(Registry::reference().select(256, 16).is_err());
}

#[test]
fn uninitialized_context() {
    let engine = aes_cfb::aes_cfb128(128).unwrap();
    let mut ctx = CipherContext::new(engine);
    assert_eq!(ctx.process(b"abc").unwrap_err(), Error::UninitializedContext);
    assert_eq!(ctx.process_bits(b"abc", 24).unwrap_err(), Error::UninitializedContext);
    assert_eq!(ctx.state(), State::Uninitialized);

    // a bit length the width cannot take still reports the missing init
    let mut ctx = CipherContext::new(aes_cfb::aes_cfb8(128).unwrap());
    assert_eq!(ctx.process_bits(b"abc", 12).unwrap_err(), Error::UninitializedContext);
    assert_eq!(ctx.process_bits(b"a", 12).unwrap_err(), Error::UninitializedContext);
}

#[test]
fn schedule_is_shared_across_threads() {
    let keys = KeySchedule::expand(&[0x11; 16]).unwrap();
    let iv = [0x22; 16];
    let data = vec![0x33u8; 100];
    let e = engine(&keys, FeedbackWidth::Cfb8, EngineKind::Reference);
    let expected = context(&e, Direction::Encrypt, &keys, &iv).process(&data).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| context(&e, Direction::Encrypt, &keys, &iv).process(&data).unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
    assert_eq!(keys.key_size(), KeySize::Aes128);
}
