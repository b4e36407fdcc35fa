//! Image intake: decoding, alpha flattening and cropping.
//!
//! Everything here runs before the core pipeline and is the only place that
//! can fail. Photographs with an alpha channel are flattened onto white paper
//! so that transparent regions read as background rather than dark trace ink.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

use crate::error::InputError;

/// Borrowed view of the strip handed to the pipeline.
#[derive(Debug, Clone, Copy)]
pub enum StripImage<'a> {
    Rgb(&'a RgbImage),
    Gray(&'a GrayImage),
}

impl StripImage<'_> {
    pub fn width(&self) -> u32 {
        match self {
            Self::Rgb(img) => img.width(),
            Self::Gray(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::Rgb(img) => img.height(),
            Self::Gray(img) => img.height(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

impl<'a> From<&'a RgbImage> for StripImage<'a> {
    fn from(img: &'a RgbImage) -> Self {
        Self::Rgb(img)
    }
}

impl<'a> From<&'a GrayImage> for StripImage<'a> {
    fn from(img: &'a GrayImage) -> Self {
        Self::Gray(img)
    }
}

/// Owned, decoded strip image.
#[derive(Debug, Clone)]
pub enum DecodedImage {
    Rgb(RgbImage),
    Gray(GrayImage),
}

impl DecodedImage {
    pub fn as_strip(&self) -> StripImage<'_> {
        match self {
            Self::Rgb(img) => img.into(),
            Self::Gray(img) => img.into(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.as_strip().dimensions()
    }

    /// RGB rendition, replicating gray levels when needed.
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Self::Rgb(img) => img.clone(),
            Self::Gray(img) => DynamicImage::ImageLuma8(img.clone()).to_rgb8(),
        }
    }

    /// Convert a decoded [`DynamicImage`], flattening alpha onto white.
    pub fn from_dynamic(img: DynamicImage) -> Result<Self, InputError> {
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(InputError::EmptyImage { width, height });
        }

        let color = img.color();
        let decoded = match (color.has_color(), color.has_alpha()) {
            (true, true) => Self::Rgb(flatten_rgba(&img)),
            (true, false) => Self::Rgb(img.into_rgb8()),
            (false, true) => Self::Gray(flatten_luma_alpha(&img)),
            (false, false) => Self::Gray(img.into_luma8()),
        };
        Ok(decoded)
    }

    /// Crop to `rect` after clamping it to the image bounds.
    pub fn crop(&self, rect: &CropRect) -> Result<Self, InputError> {
        let (width, height) = self.dimensions();
        let (x, y, w, h) = rect.clamp_to(width, height)?;
        Ok(match self {
            Self::Rgb(img) => Self::Rgb(image::imageops::crop_imm(img, x, y, w, h).to_image()),
            Self::Gray(img) => Self::Gray(image::imageops::crop_imm(img, x, y, w, h).to_image()),
        })
    }
}

/// Crop rectangle in pixel corners: columns `x1..x2`, rows `y1..y2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CropRect {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl CropRect {
    /// Clamp to `[0, width] x [0, height]` and return `(x, y, w, h)`.
    pub fn clamp_to(&self, width: u32, height: u32) -> Result<(u32, u32, u32, u32), InputError> {
        let cx = |v: i64| v.clamp(0, width as i64) as u32;
        let cy = |v: i64| v.clamp(0, height as i64) as u32;
        let (x1, x2) = (cx(self.x1), cx(self.x2));
        let (y1, y2) = (cy(self.y1), cy(self.y2));
        if x2 <= x1 || y2 <= y1 {
            return Err(InputError::DegenerateCrop {
                x1: self.x1,
                y1: self.y1,
                x2: self.x2,
                y2: self.y2,
                width,
                height,
            });
        }
        Ok((x1, y1, x2 - x1, y2 - y1))
    }
}

/// Decode an in-memory image (PNG, JPEG, ...).
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, InputError> {
    let img = image::load_from_memory(bytes)?;
    DecodedImage::from_dynamic(img)
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> Result<DecodedImage, InputError> {
    let bytes = std::fs::read(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_image(&bytes)
}

#[inline]
fn over_white(c: u8, alpha: u8) -> u8 {
    let a = alpha as f32 / 255.0;
    (c as f32 * a + 255.0 * (1.0 - a)).round().clamp(0.0, 255.0) as u8
}

fn flatten_rgba(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, px) in rgba.enumerate_pixels() {
        let [r, g, b, a] = px.0;
        out.put_pixel(x, y, Rgb([over_white(r, a), over_white(g, a), over_white(b, a)]));
    }
    out
}

fn flatten_luma_alpha(img: &DynamicImage) -> GrayImage {
    let la = img.to_luma_alpha8();
    let mut out = GrayImage::new(la.width(), la.height());
    for (x, y, px) in la.enumerate_pixels() {
        let [l, a] = px.0;
        out.put_pixel(x, y, Luma([over_white(l, a)]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn transparent_pixels_become_white() {
        let mut rgba = RgbaImage::from_pixel(4, 3, Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 1, Rgba([10, 20, 30, 255]));
        let decoded = decode_image(&encode_png(DynamicImage::ImageRgba8(rgba))).unwrap();
        let DecodedImage::Rgb(rgb) = decoded else {
            panic!("expected rgb output");
        };
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 1).0, [10, 20, 30]);
    }

    #[test]
    fn gray_input_stays_gray() {
        let gray = GrayImage::from_pixel(5, 5, Luma([77]));
        let decoded = decode_image(&encode_png(DynamicImage::ImageLuma8(gray))).unwrap();
        assert!(matches!(decoded, DecodedImage::Gray(_)));
        assert_eq!(decoded.dimensions(), (5, 5));
    }

    #[test]
    fn borrowed_views_keep_the_colour_kind() {
        let rgb = RgbImage::new(3, 2);
        let gray = GrayImage::new(4, 5);
        assert!(matches!(StripImage::from(&rgb), StripImage::Rgb(_)));
        assert!(matches!(StripImage::from(&gray), StripImage::Gray(_)));
        assert_eq!(DecodedImage::Gray(gray).as_strip().dimensions(), (4, 5));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, InputError::Decode(_)));
    }

    #[test]
    fn crop_is_clamped_to_bounds() {
        let img = DecodedImage::Rgb(RgbImage::new(20, 10));
        let rect = CropRect {
            x1: -5,
            y1: 2,
            x2: 100,
            y2: 8,
        };
        let cropped = img.crop(&rect).unwrap();
        assert_eq!(cropped.dimensions(), (20, 6));
    }

    #[test]
    fn crop_outside_image_is_degenerate() {
        let img = DecodedImage::Gray(GrayImage::new(20, 10));
        let rect = CropRect {
            x1: 30,
            y1: 0,
            x2: 40,
            y2: 10,
        };
        assert!(matches!(
            img.crop(&rect),
            Err(InputError::DegenerateCrop { .. })
        ));
    }
}
