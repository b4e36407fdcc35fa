//! Diagnostic rendering of an extraction on top of the source image.

use ecgscan::{ExtractionResult, PathSource};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

const REGION_COLOR: Rgb<u8> = Rgb([0, 170, 0]);
const PATH_COLOR: Rgb<u8> = Rgb([0, 90, 255]);
const FALLBACK_PATH_COLOR: Rgb<u8> = Rgb([255, 140, 0]);

/// Copy of `image` with the searched region outlined and the extracted
/// path drawn as a polyline. Centroid-fallback paths use a warning colour.
pub fn render(image: &RgbImage, result: &ExtractionResult) -> RgbImage {
    let mut out = image.clone();
    let region = result.region;
    if out.width() > 0 && region.height() > 0 {
        let rect = Rect::at(0, region.y_start as i32).of_size(out.width(), region.height() as u32);
        draw_hollow_rect_mut(&mut out, rect, REGION_COLOR);
    }

    let color = match result.path_source {
        PathSource::Viterbi => PATH_COLOR,
        PathSource::CentroidFallback { .. } => FALLBACK_PATH_COLOR,
    };
    for (x, pair) in result.signal_px.windows(2).enumerate() {
        draw_line_segment_mut(
            &mut out,
            (x as f32, pair[0] as f32),
            (x as f32 + 1.0, pair[1] as f32),
            color,
        );
    }
    out
}
