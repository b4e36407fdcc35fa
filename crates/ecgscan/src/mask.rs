//! Boolean trace mask with the same geometry as the source image.

/// Row-major boolean grid marking pixels believed to be trace ink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceMask {
    width: usize,
    height: usize,
    data: Vec<bool>,
}

impl TraceMask {
    /// All-false mask of size `width x height`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![false; width * height],
        }
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: bool) {
        self.data[y * self.width + x] = v;
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Number of set pixels in rows `y0..y1`.
    pub fn count_rows(&self, y0: usize, y1: usize) -> usize {
        self.data[y0 * self.width..y1 * self.width]
            .iter()
            .filter(|&&v| v)
            .count()
    }

    /// Set rows of column `x` restricted to `y0..y1`, in increasing order.
    pub fn column_rows(&self, x: usize, y0: usize, y1: usize) -> impl Iterator<Item = usize> + '_ {
        (y0..y1).filter(move |&y| self.get(x, y))
    }

    /// Whether column `x` has any set pixel within rows `y0..y1`.
    pub fn column_has_trace(&self, x: usize, y0: usize, y1: usize) -> bool {
        (y0..y1).any(|y| self.get(x, y))
    }

    /// Morphological opening with a 2x2 structuring element.
    ///
    /// A pixel survives iff it lies inside at least one fully-set 2x2 block
    /// contained in the image, which removes isolated pixels and one-pixel
    /// wide spurs.
    pub fn opened_2x2(&self) -> TraceMask {
        let (w, h) = (self.width, self.height);
        let mut out = TraceMask::new(w, h);
        if w < 2 || h < 2 {
            return out;
        }
        // Erode: anchor (x, y) marks a fully set block at (x..=x+1, y..=y+1).
        for y in 0..h - 1 {
            for x in 0..w - 1 {
                if self.get(x, y) && self.get(x + 1, y) && self.get(x, y + 1) && self.get(x + 1, y + 1)
                {
                    // Dilate back over the same block.
                    out.set(x, y, true);
                    out.set(x + 1, y, true);
                    out.set(x, y + 1, true);
                    out.set(x + 1, y + 1, true);
                }
            }
        }
        out
    }

    /// Render as an 8-bit image (set = 255) for debugging dumps.
    pub fn to_gray_image(&self) -> image::GrayImage {
        image::GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            image::Luma([if self.get(x as usize, y as usize) { 255 } else { 0 }])
        })
    }
}
