use ppg_stress::analysis::stress::{ClassificationStrategy, StressThresholds};
use ppg_stress::config::StressConfig;
use ppg_stress::detection::rr::peak_times;
use ppg_stress::pipeline::{stage_error, StressPipeline, StressReport};
use ppg_stress::{estimate_stress, StressError, StressLabel, Waveform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Synthetic PPG: Gaussian pulses at beat times cycling through `rr_pattern`,
/// on a DC offset with slow respiratory drift and uniform noise.
///
/// Beats start 0.4 s in and the signal ends 0.4 s after the last one, so both
/// beat-free margins are shorter than the default minimum peak distance.
/// Returns the beat times in seconds along with the waveform.
fn pulse_train(
    rr_pattern: &[f64],
    secs: f64,
    fs: f64,
    noise: f64,
    seed: u64,
) -> (Vec<f64>, Waveform) {
    let mut beats = Vec::new();
    let mut t = 0.4;
    let mut k = 0;
    while t < secs - 0.4 {
        beats.push(t);
        t += rr_pattern[k % rr_pattern.len()];
        k += 1;
    }
    let end = beats.last().copied().unwrap_or(0.0) + 0.4;

    let mut rng = StdRng::seed_from_u64(seed);
    let samples = (0..(end * fs) as usize)
        .map(|i| {
            let t = i as f64 / fs;
            let pulses: f64 = beats
                .iter()
                .filter(|&&b| (t - b).abs() < 0.6)
                .map(|&b| (-((t - b) / 0.08).powi(2)).exp())
                .sum();
            let drift = 0.3 * (2.0 * std::f64::consts::PI * 0.15 * t).sin();
            3.0 + pulses + drift + rng.gen_range(-noise..noise)
        })
        .collect();
    (beats, Waveform::new(samples, fs).unwrap())
}

/// Asserts one detected peak per beat, with the outermost peaks on the outermost beats.
fn assert_peaks_match_beats(report: &StressReport, beats: &[f64], fs: f64) {
    assert_eq!(report.peaks.len(), beats.len());
    let times = peak_times(&report.peaks, fs).unwrap();
    let first = times.first().unwrap() - beats.first().unwrap();
    let last = times.last().unwrap() - beats.last().unwrap();
    assert!(first.abs() < 0.02, "First peak is {first} s off its beat");
    assert!(last.abs() < 0.02, "Last peak is {last} s off its beat");
}

#[test]
fn test_steady_rhythm_is_high_stress() {
    init_logger();
    let (beats, wave) = pulse_train(&[0.8333], 30.0, 125.0, 0.05, 42);
    let report = estimate_stress(&wave, &StressConfig::default()).unwrap();
    assert_peaks_match_beats(&report, &beats, 125.0);
    assert!(report.hrv.rmssd < 0.020, "RMSSD was {}", report.hrv.rmssd);
    assert_eq!(report.hrv.pnn50, 0.0);
    assert!((report.hrv.mean_heart_rate - 72.0).abs() < 1.0);
    assert_eq!(report.label, StressLabel::High);
}

#[test]
fn test_variable_rhythm_is_low_stress() {
    init_logger();
    let (beats, wave) = pulse_train(&[0.75, 0.95], 40.0, 125.0, 0.05, 7);
    let report = estimate_stress(&wave, &StressConfig::default()).unwrap();
    assert_peaks_match_beats(&report, &beats, 125.0);
    for &rr in report.rr.as_slice() {
        assert!(
            (rr - 0.75).abs() < 0.02 || (rr - 0.95).abs() < 0.02,
            "Unexpected RR interval {rr}"
        );
    }
    assert!(report.hrv.rmssd > 0.15);
    assert_eq!(report.hrv.pnn50, 100.0);
    assert_eq!(report.label, StressLabel::Low);
}

#[test]
fn test_mild_variability_is_moderate_stress() {
    init_logger();
    // successive differences of 15 ms with one 60 ms excursion every ten beats
    let pattern = [0.80, 0.815, 0.80, 0.815, 0.80, 0.815, 0.80, 0.815, 0.875, 0.815];
    let (beats, wave) = pulse_train(&pattern, 60.0, 250.0, 0.03, 3);
    let report = estimate_stress(&wave, &StressConfig::default()).unwrap();
    assert_peaks_match_beats(&report, &beats, 250.0);
    assert!(
        report.hrv.rmssd > 0.020 && report.hrv.rmssd < 0.040,
        "RMSSD was {}",
        report.hrv.rmssd
    );
    assert!(report.hrv.pnn50 > 10.0, "pNN50 was {}", report.hrv.pnn50);
    assert_eq!(report.label, StressLabel::Moderate);
}

#[test]
fn test_stage_outputs_are_consistent() {
    let (_, wave) = pulse_train(&[0.75, 0.95], 40.0, 125.0, 0.05, 11);
    let report = estimate_stress(&wave, &StressConfig::default()).unwrap();
    assert_eq!(report.filtered.len(), wave.len());
    assert_eq!(report.filtered.fs(), wave.fs());
    assert_eq!(report.rr.len(), report.peaks.len() - 1);
    assert!(report
        .peaks
        .indices()
        .windows(2)
        .all(|w| w[1] - w[0] >= 62));
    assert!(report.peaks.indices().iter().all(|&p| p < wave.len()));
}

#[test]
fn test_flat_signal_has_no_beats() {
    let wave = Waveform::new(vec![1.0; 1250], 125.0).unwrap();
    let err = estimate_stress(&wave, &StressConfig::default()).unwrap_err();
    assert_eq!(
        stage_error(&err),
        Some(&StressError::InsufficientPeaks { found: 0 })
    );
}

#[test]
fn test_prominence_can_reject_all_beats() {
    let (_, wave) = pulse_train(&[0.8333], 30.0, 125.0, 0.01, 1);
    let mut config = StressConfig::default();
    config.peaks.min_prominence = 10.0;
    let err = estimate_stress(&wave, &config).unwrap_err();
    assert!(matches!(
        stage_error(&err),
        Some(StressError::InsufficientPeaks { .. })
    ));
}

#[test]
fn test_thresholds_change_label() {
    let (_, wave) = pulse_train(&[0.8333], 30.0, 125.0, 0.05, 42);
    let mut config = StressConfig::default();
    config.thresholds = StressThresholds {
        rmssd_low: 0.0,
        rmssd_high: 0.0,
        pnn50_low: 0.0,
        pnn50_high: 0.0,
    };
    let report = estimate_stress(&wave, &config).unwrap();
    // pNN50 = 0 is not strictly above 0, so the low-stress rule cannot fire
    assert_eq!(report.label, StressLabel::Moderate);
}

#[test]
fn test_batch_matches_single_runs() {
    init_logger();
    let pipeline = StressPipeline::with_classifier(
        StressConfig::default(),
        ClassificationStrategy::Thresholds(StressThresholds::default()),
    );
    let waves: Vec<Waveform> = (0..4)
        .map(|seed| {
            let pattern: &[f64] = if seed % 2 == 0 { &[0.8333] } else { &[0.75, 0.95] };
            pulse_train(pattern, 30.0, 125.0, 0.05, seed).1
        })
        .collect();
    let batch = pipeline.analyze_batch(&waves);
    assert_eq!(batch.len(), waves.len());
    for (wave, result) in waves.iter().zip(batch) {
        let single = pipeline.analyze(wave).unwrap();
        assert_eq!(result.unwrap(), single);
    }
}
