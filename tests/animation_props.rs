use proptest::prelude::*;
use spriteforge::{Advance, AnimationClock, FrameAtlas, OverflowPolicy, SpriteError};

// Splits one period (64/64) into dyadic parts at the given cut points, so every
// partial sum is exact and only the final part reaches the period.
fn split_period(cuts: &std::collections::BTreeSet<u32>) -> Vec<f64> {
    let mut parts = Vec::new();
    let mut prev = 0;
    for &c in cuts.iter().chain(std::iter::once(&64)) {
        parts.push((c - prev) as f64 / 64.0);
        prev = c;
    }
    parts
}

fn overflow_policy() -> impl Strategy<Value = OverflowPolicy> {
    prop_oneof![Just(OverflowPolicy::Discard), Just(OverflowPolicy::Carry)]
}

proptest! {
    #[test]
    fn accumulator_stays_below_period(
        frames in 1usize..16,
        period in 0.01f64..2.0,
        policy in overflow_policy(),
        deltas in prop::collection::vec(0.0f64..5.0, 1..64),
    ) {
        let mut clock = AnimationClock::new(frames, period).unwrap().with_overflow(policy);
        for dt in deltas {
            clock.advance(dt).unwrap();
            prop_assert!(clock.accumulator() >= 0.0);
            prop_assert!(clock.accumulator() < clock.period());
            prop_assert!(clock.current_frame() < frames);
        }
    }

    #[test]
    fn k_exact_periods_give_k_triggers(
        frames in 1usize..9,
        cycles in prop::collection::vec(prop::collection::btree_set(1u32..64, 0..6), 1..12),
    ) {
        let mut clock = AnimationClock::new(frames, 1.0).unwrap();
        let mut triggers = 0usize;

        for cuts in &cycles {
            let parts = split_period(cuts);
            let last = parts.len() - 1;
            for (i, dt) in parts.into_iter().enumerate() {
                let before = clock.current_frame();
                match clock.advance(dt).unwrap() {
                    Advance::NoTrigger => prop_assert!(i < last),
                    Advance::Triggered(frame) => {
                        prop_assert_eq!(i, last);
                        prop_assert_eq!(frame, (before + 1) % frames);
                        triggers += 1;
                    }
                }
            }
        }

        prop_assert_eq!(triggers, cycles.len());
        prop_assert_eq!(clock.current_frame(), cycles.len() % frames);
    }

    #[test]
    fn negative_deltas_never_change_state(
        warmup in 0.0f64..0.9,
        bad in -100.0f64..-1e-9,
    ) {
        let mut clock = AnimationClock::new(4, 1.0).unwrap();
        clock.advance(warmup).unwrap();
        let acc = clock.accumulator();

        let err = clock.advance(bad).unwrap_err();
        prop_assert!(matches!(err, SpriteError::InvalidInput(_)));
        prop_assert_eq!(clock.accumulator(), acc);
        prop_assert_eq!(clock.current_frame(), 0);
    }

    #[test]
    fn uv_strips_partition_unit_range(frames in 1usize..128) {
        let atlas = FrameAtlas::build(frames, 0.5).unwrap();
        prop_assert_eq!(atlas.vertices().len(), frames * 4);

        let mut prev_end = 0.0f32;
        for i in 0..frames {
            let (u0, u1) = atlas.uv_span(i).unwrap();
            prop_assert_eq!(u0.to_bits(), prev_end.to_bits());
            prop_assert!(u1 > u0);
            prop_assert!(((u1 - u0) - 1.0 / frames as f32).abs() < 1e-6);
            prev_end = u1;

            let span = atlas.frame(i).unwrap();
            prop_assert_eq!(span.vertex_offset as usize, 4 * i);
            prop_assert_eq!(span.vertex_count, 4);
        }
        prop_assert_eq!(prev_end, 1.0);
        let out_of_range = matches!(atlas.frame(frames), Err(SpriteError::OutOfRange { .. }));
        prop_assert!(out_of_range);
    }
}
