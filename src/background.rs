use crate::foundation::error::{NeuroframeError, NeuroframeResult};

/// Luminance weights for RGB -> grayscale reduction (ITU-R BT.601), matching
/// perceptual brightness rather than a plain channel average.
const LUMA: [f32; 3] = [0.2989, 0.5870, 0.1140];

/// A static grayscale image used as the compositing backdrop.
///
/// Intensities are `f32` in [0,1], stored row-major. A background lives
/// independently of any [`ActivityVolume`](crate::ActivityVolume) and is
/// resampled to the volume's grid before use.
#[derive(Clone, Debug)]
pub struct BackgroundImage {
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl BackgroundImage {
    /// Build from a row-major grayscale plane with intensities in [0,1].
    pub fn from_gray(height: usize, width: usize, data: Vec<f32>) -> NeuroframeResult<Self> {
        if height == 0 || width == 0 {
            return Err(NeuroframeError::value(format!(
                "background dimensions must be non-zero, got {height}x{width}"
            )));
        }
        if data.len() != height * width {
            return Err(NeuroframeError::shape(format!(
                "expected a 2D background with {} samples ({height}x{width}), got {}",
                height * width,
                data.len()
            )));
        }
        for &v in &data {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(NeuroframeError::value(
                    "background intensities must be finite and in [0,1]",
                ));
            }
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Build from a row-major straight-alpha RGBA8 raster, reducing color to
    /// grayscale with the fixed luminance weights.
    pub fn from_rgba8(height: usize, width: usize, rgba: &[u8]) -> NeuroframeResult<Self> {
        if height == 0 || width == 0 {
            return Err(NeuroframeError::value(format!(
                "background dimensions must be non-zero, got {height}x{width}"
            )));
        }
        if rgba.len() != height * width * 4 {
            return Err(NeuroframeError::shape(format!(
                "expected {} rgba8 bytes ({height}x{width}x4), got {}",
                height * width * 4,
                rgba.len()
            )));
        }

        let data = rgba
            .chunks_exact(4)
            .map(|px| {
                let r = f32::from(px[0]) / 255.0;
                let g = f32::from(px[1]) / 255.0;
                let b = f32::from(px[2]) / 255.0;
                (LUMA[0] * r + LUMA[1] * g + LUMA[2] * b).clamp(0.0, 1.0)
            })
            .collect();

        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Build from a decoded image, flattening any color or alpha channel.
    pub fn from_image(img: &image::DynamicImage) -> NeuroframeResult<Self> {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(height as usize, width as usize, rgba.as_raw())
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Row-major intensities in [0,1].
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Resample to exactly `height x width` with bilinear filtering.
    ///
    /// The output grid always matches the requested dimensions; no cropping
    /// or padding is performed.
    pub fn resampled(&self, height: usize, width: usize) -> Self {
        if height == self.height && width == self.width {
            return self.clone();
        }

        let mut data = Vec::with_capacity(height * width);
        let sy = self.height as f32 / height as f32;
        let sx = self.width as f32 / width as f32;

        for y in 0..height {
            // Sample at pixel centers, clamped to the source extent.
            let fy = ((y as f32 + 0.5) * sy - 0.5).clamp(0.0, (self.height - 1) as f32);
            let y0 = fy.floor() as usize;
            let y1 = (y0 + 1).min(self.height - 1);
            let ty = fy - y0 as f32;

            for x in 0..width {
                let fx = ((x as f32 + 0.5) * sx - 0.5).clamp(0.0, (self.width - 1) as f32);
                let x0 = fx.floor() as usize;
                let x1 = (x0 + 1).min(self.width - 1);
                let tx = fx - x0 as f32;

                let top = crate::foundation::math::lerp(
                    self.data[y0 * self.width + x0],
                    self.data[y0 * self.width + x1],
                    tx,
                );
                let bottom = crate::foundation::math::lerp(
                    self.data[y1 * self.width + x0],
                    self.data[y1 * self.width + x1],
                    tx,
                );
                data.push(crate::foundation::math::lerp(top, bottom, ty).clamp(0.0, 1.0));
            }
        }

        Self {
            height,
            width,
            data,
        }
    }
}
