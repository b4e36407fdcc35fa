use std::io::Cursor;

use ecgscan::{
    decode_image, CalibrationParams, CropRect, DecodedImage, DigitizeConfig, DigitizeReport,
    Digitizer, ExtractOptions, ExtractionMethod, InputError, PathSource, StaticColorOracle,
    StripImage, TraceColorHint,
};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

const PAPER: Rgb<u8> = Rgb([255, 238, 238]);
const GRID: Rgb<u8> = Rgb([238, 125, 135]);

fn grid_paper(w: u32, h: u32, pitch: u32) -> RgbImage {
    RgbImage::from_fn(w, h, |x, y| {
        if x % pitch == 0 || y % pitch == 0 {
            GRID
        } else {
            PAPER
        }
    })
}

/// Sine-like trace around `baseline`, three pixels thick.
fn draw_wave(img: &mut RgbImage, baseline: f32, amp: f32, ink: Rgb<u8>) {
    let ys: Vec<f32> = (0..img.width())
        .map(|x| baseline - amp * (x as f32 / 40.0).sin())
        .collect();
    for t in 0..3 {
        for (x, pair) in ys.windows(2).enumerate() {
            draw_line_segment_mut(
                img,
                (x as f32, pair[0] + t as f32),
                (x as f32 + 1.0, pair[1] + t as f32),
                ink,
            );
        }
    }
}

fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[test]
fn black_trace_on_grid_paper() {
    let mut img = grid_paper(1200, 500, 12);
    draw_wave(&mut img, 250.0, 25.0, Rgb([20, 20, 20]));

    let result = Digitizer::new()
        .extract(StripImage::from(&img), &ExtractOptions::default())
        .unwrap();

    assert!((result.grid_spacing_px - 12.0).abs() <= 0.5, "{}", result.grid_spacing_px);
    assert_eq!(result.path_source, PathSource::Viterbi);
    assert_eq!(result.signal_px.len(), 1200);
    // 100 mm of paper at 25 mm/s.
    assert!((result.duration_s - 4.0).abs() < 0.2);
    assert_eq!(
        result.signal_uv.len(),
        (result.duration_s * f64::from(result.fs)).round() as usize
    );
    // 25 px at 12 px/mm and 10 mm/mV is about 208 µV peak.
    let max = result.signal_uv.iter().cloned().fold(f64::MIN, f64::max);
    let min = result.signal_uv.iter().cloned().fold(f64::MAX, f64::min);
    assert!(max > 120.0 && max < 320.0, "max {max}");
    assert!(min < -120.0 && min > -320.0, "min {min}");
    assert!(result.quality_score > 0.5, "quality {}", result.quality_score);
}

#[test]
fn blank_image_degrades_gracefully() {
    let img = RgbImage::from_pixel(750, 300, Rgb([255, 255, 255]));
    let result = Digitizer::new()
        .extract(StripImage::Rgb(&img), &ExtractOptions::default())
        .unwrap();
    assert!(result.grid_fallback);
    assert!((result.grid_spacing_px - 3.0).abs() < 1e-9);
    assert!(result.quality_score < 0.5);
    assert_eq!(result.signal_uv.len(), 5000);
    assert!(result.signal_uv.iter().all(|v| v.is_finite()));

    let report = DigitizeReport::from_result(&result, "II");
    assert!(report
        .quality
        .issues
        .iter()
        .any(|i| i.starts_with("Low confidence")));
}

#[test]
fn oracle_hint_recovers_unusual_ink() {
    let orange = Rgb([240, 140, 30]);
    let mut img = RgbImage::from_pixel(800, 300, Rgb([255, 255, 255]));
    draw_wave(&mut img, 150.0, 20.0, orange);
    let bytes = png_bytes(&img);

    let digitizer = Digitizer::new();
    let plain = digitizer
        .extract(StripImage::Rgb(&img), &ExtractOptions::default())
        .unwrap();
    assert_eq!(plain.coverage, 0.0);

    let oracle = StaticColorOracle::new(TraceColorHint {
        colors: vec![[235, 135, 40]],
        names: vec!["orange".into()],
        confidence: 0.9,
        background: Some("white".into()),
    });
    let hinted = digitizer
        .extract_with_oracle(StripImage::Rgb(&img), &bytes, &oracle, CalibrationParams::default())
        .unwrap();
    assert_eq!(hinted.method, ExtractionMethod::ColorDpWithOracle);
    assert!(hinted.coverage > 0.95);
    assert!(hinted.quality_score > plain.quality_score);

    // A precomputed hint takes the same route without an oracle.
    let options = ExtractOptions::new(CalibrationParams::default())
        .with_hint(TraceColorHint::from_colors(vec![[240, 140, 30]]));
    let direct = digitizer.extract(StripImage::Rgb(&img), &options).unwrap();
    assert_eq!(direct.method, hinted.method);
}

#[test]
fn silent_oracle_leaves_default_method() {
    let img = RgbImage::from_pixel(300, 100, Rgb([255, 255, 255]));
    let oracle = StaticColorOracle::silent();
    let result = Digitizer::new()
        .extract_with_oracle(StripImage::Rgb(&img), b"raw", &oracle, CalibrationParams::default())
        .unwrap();
    assert_eq!(result.method, ExtractionMethod::ColorDp);
}

#[test]
fn grayscale_scan_uses_darkest_pixels() {
    let img = GrayImage::from_fn(600, 200, |x, y| {
        let trace = (100.0 - 15.0 * (x as f32 / 30.0).sin()).round() as u32;
        if y.abs_diff(trace) <= 1 {
            Luma([10])
        } else if x % 10 == 0 {
            Luma([200])
        } else {
            Luma([245])
        }
    });
    let result = Digitizer::new()
        .extract(StripImage::from(&img), &ExtractOptions::default())
        .unwrap();
    assert!(result.coverage > 0.9, "coverage {}", result.coverage);
    for (x, &y) in result.signal_px.iter().enumerate().step_by(25) {
        let expected = 100.0 - 15.0 * (x as f64 / 30.0).sin();
        assert!((y - expected).abs() <= 2.5, "column {x}: {y} vs {expected}");
    }
}

#[test]
fn decoded_and_cropped_input() {
    let mut img = grid_paper(900, 600, 10);
    draw_wave(&mut img, 450.0, 20.0, Rgb([10, 10, 140]));
    let decoded = decode_image(&png_bytes(&img)).unwrap();
    let cropped = decoded
        .crop(&CropRect {
            x1: -50,
            y1: 300,
            x2: 2000,
            y2: 600,
        })
        .unwrap();
    assert!(matches!(cropped, DecodedImage::Rgb(_)));
    assert_eq!(cropped.dimensions(), (900, 300));

    let result = Digitizer::new()
        .extract(cropped.as_strip(), &ExtractOptions::default())
        .unwrap();
    assert_eq!(result.image_size, [900, 300]);
    // Trace baseline moved from row 450 to row 150.
    let mid = result.signal_px[0];
    assert!((mid - 151.0).abs() <= 2.0, "{mid}");

    let err = decoded
        .crop(&CropRect {
            x1: 10,
            y1: 700,
            x2: 20,
            y2: 900,
        })
        .unwrap_err();
    assert!(matches!(err, InputError::DegenerateCrop { .. }));
}

#[test]
fn config_overrides_change_behaviour() {
    let mut config = DigitizeConfig::default();
    config.normalization.enable = false;
    config.calibration.nominal_strip_width_mm = 150.0;
    let digitizer = Digitizer::with_config(config);

    let img = RgbImage::from_pixel(600, 100, Rgb([255, 255, 255]));
    let result = digitizer
        .extract(StripImage::Rgb(&img), &ExtractOptions::default())
        .unwrap();
    // 150 mm at 25 mm/s.
    assert_eq!(result.signal_uv.len(), 3000);
    assert!(!digitizer.config().normalization.enable);
}

#[test]
fn report_serializes_to_expected_shape() {
    let mut img = grid_paper(600, 300, 10);
    draw_wave(&mut img, 150.0, 30.0, Rgb([20, 20, 20]));
    let result = Digitizer::new()
        .extract(StripImage::Rgb(&img), &ExtractOptions::default())
        .unwrap();
    let json = serde_json::to_value(DigitizeReport::from_result(&result, "V1")).unwrap();
    assert_eq!(
        json["leads"]["V1"]["samples_uV"].as_array().unwrap().len(),
        result.signal_uv.len()
    );
    assert_eq!(json["calibration"]["method"], "autocorrelation");
    assert_eq!(json["metadata"]["image_size"][0], 600);
    assert!(json["quality"]["issues"].is_array());
}
