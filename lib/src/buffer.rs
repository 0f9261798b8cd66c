use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbaImage};

/// Alpha at or above this counts as visible content.
pub const VISIBLE_ALPHA: u8 = 0x80;

/// Longest side accepted at decode time; larger sources are downscaled first.
pub const MAX_SOURCE_EDGE: u32 = 2000;

/// Content bounding box in pixel coordinates. `right` and `bottom` are
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropBox {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// Normalized RGBA image shared by the pipeline stages.
///
/// Each stage either mutates the buffer in place or produces a new one;
/// stages never hold two copies alive.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    pixels: RgbaImage,
}

impl PixelBuffer {
    /// Decodes raw image bytes into a canonical RGBA buffer.
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let decoded = image::load_from_memory(bytes)?;
        log::debug!("decoded {}x{} image", decoded.width(), decoded.height());
        Ok(Self::new(decoded.to_rgba8()))
    }

    /// Wraps an already decoded image, downscaling oversized sources so the
    /// longest side fits [`MAX_SOURCE_EDGE`].
    pub fn new(pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        let longest = width.max(height);
        if longest <= MAX_SOURCE_EDGE {
            return Self { pixels };
        }
        let scale = MAX_SOURCE_EDGE as f32 / longest as f32;
        let new_width = ((width as f32 * scale).round() as u32).max(1);
        let new_height = ((height as f32 * scale).round() as u32).max(1);
        log::debug!("downscaling {width}x{height} source to {new_width}x{new_height}");
        Self {
            pixels: imageops::resize(&pixels, new_width, new_height, FilterType::Lanczos3),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    /// Resamples to exactly the given dimensions with Lanczos3. Returns the
    /// buffer unchanged when it already has them.
    pub fn resized(self, width: u32, height: u32) -> Self {
        if self.pixels.dimensions() == (width, height) {
            return self;
        }
        Self {
            pixels: imageops::resize(&self.pixels, width, height, FilterType::Lanczos3),
        }
    }

    /// Bounding box of non-background content, or `None` when the whole
    /// image is background.
    ///
    /// Background means transparent, or matching the border reference color:
    /// the top-left pixel when it is opaque. With a transparent top-left
    /// pixel only transparency counts. Matching is exact.
    pub fn content_box(&self) -> Option<CropBox> {
        let (width, height) = self.pixels.dimensions();
        if width == 0 || height == 0 {
            return None;
        }
        let reference = {
            let corner = self.pixels.get_pixel(0, 0);
            (corner[3] >= VISIBLE_ALPHA).then(|| [corner[0], corner[1], corner[2]])
        };
        let row_is_background =
            |y: u32| (0..width).all(|x| self.is_background(x, y, reference));
        let column_is_background =
            |x: u32| (0..height).all(|y| self.is_background(x, y, reference));

        let mut top = 0;
        while top < height && row_is_background(top) {
            top += 1;
        }
        if top == height {
            return None;
        }
        let mut bottom = height;
        while bottom > top && row_is_background(bottom - 1) {
            bottom -= 1;
        }
        let mut left = 0;
        while left < width && column_is_background(left) {
            left += 1;
        }
        let mut right = width;
        while right > left && column_is_background(right - 1) {
            right -= 1;
        }
        Some(CropBox { left, top, right, bottom })
    }

    /// Copies out the sub-image under `area`.
    pub fn cropped(&self, area: &CropBox) -> Self {
        let view = imageops::crop_imm(
            &self.pixels,
            area.left,
            area.top,
            area.width(),
            area.height(),
        );
        Self { pixels: view.to_image() }
    }

    /// Alpha-weighted luminance plane (Rec. 709 weights). Transparent pixels
    /// read as black, so alpha boundaries trace like luminance boundaries.
    pub fn luminance(&self) -> GrayImage {
        let (width, height) = self.pixels.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            let p = self.pixels.get_pixel(x, y);
            let luma = 0.2127 * f32::from(p[0])
                + 0.7152 * f32::from(p[1])
                + 0.0722 * f32::from(p[2]);
            Luma([(luma * f32::from(p[3]) / 255.0).round() as u8])
        })
    }

    /// Average color of the visible pixels inside the given rectangle, or
    /// `None` when every pixel there is transparent. The rectangle is clamped
    /// to the image.
    pub fn average_rgb(&self, x: u32, y: u32, width: u32, height: u32) -> Option<[u8; 3]> {
        let mut sum = [0u32; 3];
        let mut count = 0u32;
        for py in y..(y + height).min(self.height()) {
            for px in x..(x + width).min(self.width()) {
                let p = self.pixels.get_pixel(px, py);
                if p[3] >= VISIBLE_ALPHA {
                    sum[0] += u32::from(p[0]);
                    sum[1] += u32::from(p[1]);
                    sum[2] += u32::from(p[2]);
                    count += 1;
                }
            }
        }
        (count > 0).then(|| {
            [
                ((sum[0] + count / 2) / count) as u8,
                ((sum[1] + count / 2) / count) as u8,
                ((sum[2] + count / 2) / count) as u8,
            ]
        })
    }

    fn is_background(&self, x: u32, y: u32, reference: Option<[u8; 3]>) -> bool {
        let p = self.pixels.get_pixel(x, y);
        if p[3] < VISIBLE_ALPHA {
            return true;
        }
        match reference {
            Some(rgb) => [p[0], p[1], p[2]] == rgb,
            None => false,
        }
    }
}
