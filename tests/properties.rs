//! Property tests: debouncing, sentinel sanitization, quality bounds.

use aminic::acquisition::{parse_channel, sanitize_line, Ambient, Channel, SweepCapture};
use aminic::analysis::Analyzer;
use aminic::config::{SMOOTHING_ORDER, SMOOTHING_WINDOW};
use aminic::ui::buttons::Debouncer;
use aminic::ui::ButtonId;
use proptest::prelude::*;

// ═════════════════════════════════════════════════════════════════════════
// 1. Accepted presses of one button are never closer than its threshold
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn accepted_presses_respect_threshold(
        samples in prop::collection::vec((0usize..4, any::<bool>(), 0u64..200), 1..400),
    ) {
        let mut debouncer = Debouncer::new();
        let mut last: [Option<u64>; 4] = [None; 4];
        let mut now = 0u64;
        for (idx, pressed, gap) in samples {
            now += gap;
            let button = ButtonId::ALL[idx];
            if debouncer.update(button, Some(pressed), now) {
                if let Some(prev) = last[idx] {
                    prop_assert!(
                        now - prev >= button.debounce_ms(),
                        "{:?} accepted {} ms after the previous press",
                        button,
                        now - prev
                    );
                }
                last[idx] = Some(now);
            }
        }
    }

    #[test]
    fn first_press_is_always_accepted(idx in 0usize..4, at in 0u64..1_000_000) {
        let mut debouncer = Debouncer::new();
        prop_assert!(debouncer.update(ButtonId::ALL[idx], Some(true), at));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Sanitizing equals substituting "0" for the sentinels
// ═════════════════════════════════════════════════════════════════════════

fn arb_token() -> impl Strategy<Value = String> {
    prop_oneof![
        (-1_000_000i64..1_000_000).prop_map(|v| format!("{}", v as f64 / 1000.0)),
        Just("ovf".to_string()),
        Just("nan".to_string()),
        Just(" ovf".to_string()),
    ]
}

proptest! {
    #[test]
    fn sanitize_matches_zero_substitution(tokens in prop::collection::vec(arb_token(), 1..40)) {
        let line = tokens.join(",");
        let substituted = tokens
            .iter()
            .map(|t| if matches!(t.trim(), "ovf" | "nan") { "0" } else { t.as_str() })
            .collect::<Vec<_>>()
            .join(",");

        let sanitized = parse_channel(Channel::Phase1, &sanitize_line(&line)).unwrap();
        let expected = parse_channel(Channel::Phase1, &substituted).unwrap();
        prop_assert_eq!(sanitized.len(), tokens.len());
        prop_assert_eq!(sanitized, expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Quality differences stay inside the sample range
// ═════════════════════════════════════════════════════════════════════════

fn arb_channels() -> impl Strategy<Value = Vec<Vec<f64>>> {
    prop::collection::vec(prop::collection::vec(-100.0f64..100.0, 80), 6)
}

fn capture(channels: Vec<Vec<f64>>, samples: usize) -> SweepCapture {
    let channels: [Vec<f64>; 6] = core::array::from_fn(|c| channels[c][..samples].to_vec());
    SweepCapture::new(channels, Ambient::default()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn quality_is_bounded_by_capture_length(
        samples in SMOOTHING_WINDOW..=80usize,
        initial in arb_channels(),
        normal in arb_channels(),
    ) {
        let analyzer = Analyzer::new(SMOOTHING_WINDOW, SMOOTHING_ORDER).unwrap();
        let result = analyzer
            .quality_diff(&capture(initial, samples), &capture(normal, samples))
            .unwrap();
        for d in result.phase.iter().chain(result.magnitude.iter()) {
            prop_assert!(*d < samples, "difference {} for {} samples", d, samples);
        }
    }

    #[test]
    fn identical_captures_score_zero(
        samples in SMOOTHING_WINDOW..=80usize,
        channels in arb_channels(),
    ) {
        let analyzer = Analyzer::new(SMOOTHING_WINDOW, SMOOTHING_ORDER).unwrap();
        let a = capture(channels, samples);
        let result = analyzer.quality_diff(&a, &a.clone()).unwrap();
        prop_assert_eq!(result.phase, [0, 0, 0]);
        prop_assert_eq!(result.magnitude, [0, 0, 0]);
    }
}
