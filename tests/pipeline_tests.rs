//! Integration Tests
//!
//! End-to-end tests for the ingest, model and egress pipeline.

use approx::assert_relative_eq;
use ndarray::{array, Array1, Array2, Axis};
use pretty_assertions::assert_eq;

use stride_align::engine::{generate_test_tone, AlignmentSpec, AudioBuffer, Device};
use stride_align::neural::{GainModel, IdentityModel, MaskFillModel};
use stride_align::prep::{generate_mask, IngestRequest, ScalingPolicy};
use stride_align::{
    compute_divisible_length, denormalize_from_model, max_abs_scale, normalize_for_model,
    pad_to_divisible_length, AlignError, Pipeline, PipelineConfig, PipelineOutput,
};

fn request(rate: u32, target_length: usize, alignment: AlignmentSpec) -> IngestRequest {
    IngestRequest {
        src_rate: rate,
        target_rate: rate,
        target_length,
        alignment,
        device: Device::Cpu,
    }
}

fn config(sample_rate: u32, alignment: AlignmentSpec) -> PipelineConfig {
    PipelineConfig {
        sample_rate,
        alignment,
        ..PipelineConfig::default()
    }
}

// === Length Alignment ===

#[test]
fn test_divisible_length_concrete_case() {
    assert_eq!(compute_divisible_length(1000, 256, 2).unwrap(), 768);
}

#[test]
fn test_divisible_length_covers_hop_multiples() {
    for hop in [1usize, 64, 256, 512] {
        for downsamples in 0..7u32 {
            for frames in [0usize, 1, 3, 17, 100] {
                let length = frames * hop;
                let result = compute_divisible_length(length, hop, downsamples).unwrap();
                assert!(result >= length, "{} < {} for hop {}", result, length, hop);
                assert_eq!((result / hop + 1) % (1 << downsamples), 0);
            }
        }
    }
}

#[test]
fn test_aligner_is_idempotent() {
    let x = Array2::<f32>::ones((2, 1000));
    let once = pad_to_divisible_length(&x, 100, 3, true).unwrap();
    let twice = pad_to_divisible_length(&once, 100, 3, true).unwrap();

    assert_eq!(once.dim(), (2, 1500));
    assert_eq!(once, twice);
}

// === Round Trip ===

#[test]
fn test_identity_round_trip_mono() {
    let tone = generate_test_tone(440.0, 0.5, 1024, 1, 16000);
    let mono = tone.column(0).to_owned();

    for pad_end in [true, false] {
        let alignment = AlignmentSpec::new(256, 0, pad_end);
        let buffer: AudioBuffer<f32> =
            normalize_for_model(mono.view(), &request(16000, mono.len(), alignment)).unwrap();
        let restored = denormalize_from_model(buffer.view(), mono.len(), pad_end).unwrap();

        assert_eq!(restored.dim(), (1024, 1));
        for (a, b) in restored.column(0).iter().zip(mono.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }
}

#[test]
fn test_identity_round_trip_stereo() {
    let stereo = Array2::from_shape_fn((512, 2), |(t, c)| if c == 0 { t as f32 / 512.0 } else { -0.25 });

    let alignment = AlignmentSpec::new(128, 0, true);
    let buffer: AudioBuffer<f64> =
        normalize_for_model(stereo.view(), &request(8000, 512, alignment)).unwrap();
    assert_eq!(buffer.data().dim(), (1, 2, 512));

    let restored = denormalize_from_model(buffer.view(), 512, true).unwrap();
    assert_eq!(restored.dim(), (512, 2));
    for (a, b) in restored.iter().zip(stereo.iter()) {
        assert_relative_eq!(*a, *b as f64, epsilon = 1e-6);
    }
}

#[test]
fn test_pipeline_pads_then_restores_length() {
    let pipeline = Pipeline::new(config(16000, AlignmentSpec::new(256, 2, true)), IdentityModel::new()).unwrap();
    let raw = Array1::<f32>::from_elem(768, 0.5);

    let buffer: AudioBuffer<f32> = pipeline.prepare(raw.view(), 16000, 768).unwrap();
    assert_eq!(buffer.sample_count(), 768);

    let output: PipelineOutput<f32> = pipeline.run(raw.view(), 16000, 768, None).unwrap();
    assert_eq!(output.samples.dim(), (768, 1));
    assert!(output.samples.iter().all(|&v| v == 0.5));
}

#[test]
fn test_pipeline_resamples_to_model_rate() {
    let pipeline = Pipeline::new(config(16000, AlignmentSpec::new(1, 0, true)), IdentityModel::new()).unwrap();
    let raw = Array1::<i16>::from_elem(8000, i16::MAX / 2);

    let output: PipelineOutput<f32> = pipeline.run(raw.view(), 8000, 8000, None).unwrap();
    assert_eq!(output.sample_rate, 16000);
    assert_eq!(output.samples.dim(), (16000, 1));
    // filter edges ring; the interior holds the level
    assert!(output.samples.column(0).iter().skip(500).take(15000).all(|&v| (v - 0.5).abs() < 1e-2));
}

#[test]
fn test_pipeline_filters_tones_above_model_nyquist() {
    let pipeline = Pipeline::new(config(16000, AlignmentSpec::new(1, 0, true)), IdentityModel::new()).unwrap();
    let rms = |x: &[f32]| (x.iter().map(|v| v * v).sum::<f32>() / x.len() as f32).sqrt();

    let high = generate_test_tone(12000.0, 0.5, 44100, 1, 44100);
    let output: PipelineOutput<f32> = pipeline.run(high.view(), 44100, 44100, None).unwrap();
    assert_eq!(output.samples.dim(), (16000, 1));
    let interior = output.samples.column(0).to_vec();
    assert!(rms(&interior[500..15500]) < 0.02);

    let low = generate_test_tone(1000.0, 0.5, 44100, 1, 44100);
    let output: PipelineOutput<f32> = pipeline.run(low.view(), 44100, 44100, None).unwrap();
    let interior = output.samples.column(0).to_vec();
    assert_relative_eq!(rms(&interior[500..15500]), 0.3536, epsilon = 0.02);
}

#[test]
fn test_pipeline_rejects_unalignable_target() {
    let pipeline = Pipeline::new(config(16000, AlignmentSpec::new(256, 2, true)), IdentityModel::new()).unwrap();
    let raw = Array1::<f32>::zeros(1000);

    let result: stride_align::Result<PipelineOutput<f32>> = pipeline.run(raw.view(), 16000, 1000, None);
    assert!(matches!(result, Err(AlignError::InvalidLength { .. })));
}

// === Masks ===

#[test]
fn test_mask_zeros_requested_seconds() {
    let mask: Array1<f32> = generate_mask(&Array1::<f32>::zeros(10), 1, "2-5").unwrap();
    assert_eq!(mask, array![1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn test_mask_with_several_intervals() {
    let mask: Array1<f32> = generate_mask(&Array1::<f32>::zeros(50), 10, "0-1,3-4").unwrap();
    for (i, &v) in mask.iter().enumerate() {
        let masked = i < 10 || (30..40).contains(&i);
        assert_eq!(v, if masked { 0.0 } else { 1.0 }, "sample {}", i);
    }
}

#[test]
fn test_mask_parse_error_propagates() {
    let pipeline = Pipeline::new(config(10, AlignmentSpec::new(1, 0, true)), IdentityModel::new()).unwrap();
    let raw = Array1::<f32>::zeros(50);

    let result: stride_align::Result<PipelineOutput<f32>> = pipeline.run(raw.view(), 10, 50, Some("3-"));
    assert!(matches!(result, Err(AlignError::Parse { .. })));
}

#[test]
fn test_mask_fill_model_inpaints_masked_seconds() {
    let pipeline = Pipeline::new(config(10, AlignmentSpec::new(1, 0, true)), MaskFillModel::new(0.75)).unwrap();
    let raw = Array2::<f32>::from_elem((50, 2), 0.1);

    let output: PipelineOutput<f32> = pipeline.run(raw.view(), 10, 50, Some("0-1,3-4")).unwrap();
    assert_eq!(output.samples.dim(), (50, 2));
    for (t, row) in output.samples.axis_iter(Axis(0)).enumerate() {
        let expected = if t < 10 || (30..40).contains(&t) { 0.75 } else { 0.1 };
        assert!(row.iter().all(|&v| (v - expected).abs() < 1e-6), "row {}", t);
    }
}

#[test]
fn test_mask_fill_model_fills_alignment_padding() {
    let pipeline = Pipeline::new(config(10, AlignmentSpec::new(1, 2, true)), MaskFillModel::new(0.5)).unwrap();
    let raw = Array1::<f32>::from_elem(3, 0.2);

    let buffer: AudioBuffer<f32> = pipeline.prepare(raw.view(), 10, 7).unwrap();
    let mask: AudioBuffer<f32> = pipeline.prepare_mask(raw.view(), 10, 7, "0-0").unwrap();
    assert_eq!(mask.data().dim(), buffer.data().dim());
    // padding past the raw input is masked
    assert_eq!(mask.data().iter().copied().collect::<Vec<_>>(), vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0]);

    let output: PipelineOutput<f32> = pipeline.run(raw.view(), 10, 7, Some("0-0")).unwrap();
    assert_eq!(output.samples.column(0).to_vec(), vec![0.2, 0.2, 0.2, 0.5, 0.5, 0.5, 0.5]);
}

// === Scaling ===

#[test]
fn test_max_abs_scale_hits_target_peak() {
    let tone = generate_test_tone(220.0, 0.8, 4410, 2, 44100);
    let scaled = max_abs_scale(&tone, 0.05f32).unwrap();
    let peak = scaled.iter().fold(0.0f32, |acc, &v| acc.max(v.abs()));
    assert_relative_eq!(peak, 0.05, epsilon = 1e-6);
}

#[test]
fn test_max_abs_scale_rejects_silence() {
    let silent = Array2::<f64>::zeros((4, 2));
    assert!(matches!(
        max_abs_scale(&silent, 0.05),
        Err(AlignError::DivideByZero { .. })
    ));
}

#[test]
fn test_scaled_pipeline_output() {
    let mut cfg = config(100, AlignmentSpec::new(1, 0, true));
    cfg.input_scaling = Some(ScalingPolicy::default());
    let pipeline = Pipeline::new(cfg, GainModel::new(2.0)).unwrap();
    let raw: Array1<i32> = array![i32::MAX, 0, i32::MIN / 2];

    let output: PipelineOutput<f64> = pipeline.run(raw.view(), 100, 3, None).unwrap();
    let peak = output.samples.iter().fold(0.0f64, |acc, &v| acc.max(v.abs()));
    assert_relative_eq!(peak, 0.1, epsilon = 1e-6);
}

// === Shape errors ===

#[test]
fn test_three_axis_input_rejected() {
    let raw = ndarray::Array3::<f32>::zeros((2, 2, 2));
    let result: stride_align::Result<AudioBuffer<f32>> =
        normalize_for_model(raw.view(), &request(100, 2, AlignmentSpec::new(1, 0, true)));
    assert!(matches!(result, Err(AlignError::Shape { .. })));
}

#[test]
fn test_egress_rejects_two_axis_buffer() {
    let flat = Array2::<f32>::zeros((2, 4));
    assert!(matches!(
        denormalize_from_model(flat.view(), 4, true),
        Err(AlignError::Shape { .. })
    ));
}
