//! Shared synthetic images and masks for unit tests.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::mask::TraceMask;

pub(crate) const PAPER: Rgb<u8> = Rgb([255, 236, 236]);
pub(crate) const GRID_INK: Rgb<u8> = Rgb([235, 120, 130]);
pub(crate) const TRACE_INK: Rgb<u8> = Rgb([15, 15, 15]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GridLines {
    Vertical,
    Both,
}

/// Pink millimetre paper with one-pixel grid lines every `pitch` pixels.
pub(crate) fn grid_paper_rgb(w: u32, h: u32, pitch: usize, lines: GridLines) -> RgbImage {
    let pitch = pitch as u32;
    RgbImage::from_fn(w, h, |x, y| {
        let on_v = x % pitch == 0;
        let on_h = lines == GridLines::Both && y % pitch == 0;
        if on_v || on_h {
            GRID_INK
        } else {
            PAPER
        }
    })
}

/// Draw a polyline through `(x, ys[x])` that is `thickness` pixels tall.
pub(crate) fn draw_trace(img: &mut RgbImage, ys: &[f32], thickness: u32) {
    for t in 0..thickness {
        let dy = t as f32;
        for (x, pair) in ys.windows(2).enumerate() {
            draw_line_segment_mut(
                img,
                (x as f32, pair[0] + dy),
                ((x + 1) as f32, pair[1] + dy),
                TRACE_INK,
            );
        }
    }
}

/// Grid paper with a periodic QRS-like trace around row `baseline`.
pub(crate) fn synthetic_strip(w: u32, h: u32, pitch: usize, baseline: f32, amp_px: f32) -> RgbImage {
    let mut img = grid_paper_rgb(w, h, pitch, GridLines::Both);
    let ys: Vec<f32> = (0..w).map(|x| baseline - amp_px * beat_shape(x, 160)).collect();
    draw_trace(&mut img, &ys, 3);
    img
}

/// Unit-height spike every `period` columns on a flat baseline.
pub(crate) fn beat_shape(x: u32, period: u32) -> f32 {
    let phase = (x % period) as f32 / period as f32;
    let d = (phase - 0.5).abs();
    if d < 0.04 {
        1.0 - d / 0.04
    } else {
        0.0
    }
}

/// Mask with a full-width horizontal line at `row`.
pub(crate) fn horizontal_line_mask(w: usize, h: usize, row: usize) -> TraceMask {
    TraceMask::from_fn(w, h, |_, y| y == row)
}

/// Mask whose column `x` is set at row `ys[x]` (skipped when `None`).
pub(crate) fn mask_from_rows(w: usize, h: usize, ys: &[Option<usize>]) -> TraceMask {
    TraceMask::from_fn(w, h, |x, y| ys.get(x).copied().flatten() == Some(y))
}
