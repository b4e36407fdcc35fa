//! Pixel classification into trace ink vs. paper/grid.
//!
//! Printed strips put black, blue or green ink on pink/red millimetre paper.
//! Each rule below targets one ink family; the union is cleaned with a 2x2
//! opening so that scanner speckle does not seed spurious path candidates.

use image::{GrayImage, RgbImage};

use crate::input::StripImage;
use crate::mask::TraceMask;

/// Colour thresholds for the RGB rules (channel values in 0..=255).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Mean brightness below which a pixel counts as dark.
    pub dark_brightness_max: f32,
    /// Sum of pairwise channel differences below which a pixel is neutral.
    pub neutral_spread_max: f32,
    /// Red excess over green and blue that marks the pink grid hue.
    pub pink_margin: f32,
    /// Bright blue: `B > blue_over_red * R`.
    pub blue_over_red: f32,
    /// Bright blue: `B > blue_over_green * G`.
    pub blue_over_green: f32,
    /// Bright blue: absolute floor on `B`.
    pub blue_floor: f32,
    /// Dark blue: ceiling on both `R` and `G`.
    pub dark_blue_rg_max: f32,
    /// Dark blue: absolute floor on `B`.
    pub dark_blue_floor: f32,
    /// Green: `G` must exceed both other channels by this ratio.
    pub green_ratio: f32,
    /// Green: absolute floor on `G`.
    pub green_floor: f32,
    /// Percentile (0..100) used as the darkness threshold for gray input.
    pub gray_percentile: f32,
    /// Apply the 2x2 opening to the RGB mask.
    pub open_mask: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            dark_brightness_max: 80.0,
            neutral_spread_max: 60.0,
            pink_margin: 20.0,
            blue_over_red: 1.5,
            blue_over_green: 1.2,
            blue_floor: 150.0,
            dark_blue_rg_max: 120.0,
            dark_blue_floor: 100.0,
            green_ratio: 1.3,
            green_floor: 100.0,
            gray_percentile: 5.0,
            open_mask: true,
        }
    }
}

impl ClassifierConfig {
    /// Apply the three ink rules to one pixel.
    pub fn is_trace_rgb(&self, rgb: [u8; 3]) -> bool {
        let [r, g, b] = rgb.map(f32::from);

        let brightness = (r + g + b) / 3.0;
        let spread = (r - g).abs() + (g - b).abs() + (r - b).abs();
        let is_pink = r > g + self.pink_margin && r > b + self.pink_margin;
        let dark_neutral =
            brightness < self.dark_brightness_max && (spread < self.neutral_spread_max || !is_pink);

        let bright_blue =
            b > r * self.blue_over_red && b > g * self.blue_over_green && b > self.blue_floor;
        let dark_blue = b > r
            && b > g
            && r < self.dark_blue_rg_max
            && g < self.dark_blue_rg_max
            && b > self.dark_blue_floor;

        let green = g > r * self.green_ratio && g > b * self.green_ratio && g > self.green_floor;

        dark_neutral || bright_blue || dark_blue || green
    }
}

/// Classify every pixel of `image`. Never fails; worst case the mask is empty.
pub fn classify(image: StripImage<'_>, config: &ClassifierConfig) -> TraceMask {
    match image {
        StripImage::Rgb(rgb) => classify_rgb(rgb, config),
        StripImage::Gray(gray) => classify_gray(gray, config.gray_percentile),
    }
}

fn classify_rgb(img: &RgbImage, config: &ClassifierConfig) -> TraceMask {
    let raw = TraceMask::from_fn(img.width() as usize, img.height() as usize, |x, y| {
        config.is_trace_rgb(img.get_pixel(x as u32, y as u32).0)
    });
    if config.open_mask {
        raw.opened_2x2()
    } else {
        raw
    }
}

/// Gray strips carry no hue, so the darkest few percent are taken as ink.
fn classify_gray(img: &GrayImage, pct: f32) -> TraceMask {
    let mut values: Vec<f32> = img.as_raw().iter().map(|&v| v as f32).collect();
    let Some(threshold) = percentile(&mut values, pct) else {
        return TraceMask::new(img.width() as usize, img.height() as usize);
    };
    TraceMask::from_fn(img.width() as usize, img.height() as usize, |x, y| {
        (img.get_pixel(x as u32, y as u32)[0] as f32) < threshold
    })
}

/// Linear-interpolated percentile. Reorders `values`.
pub(crate) fn percentile(values: &mut [f32], pct: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let (lo, hi, frac) = percentile_rank(values.len(), pct);
    Some(values[lo] + (values[hi] - values[lo]) * frac)
}

/// Bracketing indices and weight for percentile `pct` of `len` sorted values.
fn percentile_rank(len: usize, pct: f32) -> (usize, usize, f32) {
    let last = len.saturating_sub(1);
    let rank = f64::from(pct.clamp(0.0, 100.0)) / 100.0 * last as f64;
    let lo = (rank.floor() as usize).min(last);
    let hi = (rank.ceil() as usize).min(last);
    (lo, hi, (rank - lo as f64) as f32)
}

/// Mask of pixels within `tolerance` (Euclidean RGB distance, exclusive) of
/// any of `colors`. Gray pixels are compared as `(v, v, v)`.
pub fn color_hint_mask(image: StripImage<'_>, colors: &[[u8; 3]], tolerance: f32) -> TraceMask {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let tol_sq = tolerance * tolerance;
    let near = |px: [u8; 3]| {
        colors.iter().any(|c| {
            let d: f32 = px
                .iter()
                .zip(c.iter())
                .map(|(&a, &b)| {
                    let d = a as f32 - b as f32;
                    d * d
                })
                .sum();
            d < tol_sq
        })
    };
    match image {
        StripImage::Rgb(img) => {
            TraceMask::from_fn(w, h, |x, y| near(img.get_pixel(x as u32, y as u32).0))
        }
        StripImage::Gray(img) => TraceMask::from_fn(w, h, |x, y| {
            let v = img.get_pixel(x as u32, y as u32)[0];
            near([v, v, v])
        }),
    }
}
