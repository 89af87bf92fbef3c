use std::io::Read;

use crate::foundation::error::{NeuroframeError, NeuroframeResult};

/// A time-indexed stack of 2D activity maps.
///
/// Axes are (height, width, time); samples are stored time-major as one
/// contiguous buffer, so slice `t` is the row-major `height*width` plane at
/// `data[t*height*width ..]`. The volume is immutable once constructed, and
/// its global value range is computed up front for the volume-wide
/// normalization policy.
#[derive(Clone, Debug)]
pub struct ActivityVolume {
    height: usize,
    width: usize,
    frames: usize,
    data: Vec<f32>,
    value_min: f32,
    value_max: f32,
}

impl ActivityVolume {
    /// Build a volume from `dims = [height, width, frames]` and a time-major
    /// sample buffer.
    ///
    /// Fails with [`NeuroframeError::Value`] when any axis is zero or any
    /// sample is non-finite, and with [`NeuroframeError::Shape`] when the
    /// buffer length does not equal `height * width * frames` (the data is
    /// not a 3-dimensional array of the claimed extent).
    pub fn from_vec(dims: [usize; 3], data: Vec<f32>) -> NeuroframeResult<Self> {
        let [height, width, frames] = dims;
        if height == 0 || width == 0 || frames == 0 {
            return Err(NeuroframeError::value(format!(
                "volume dimensions must be non-zero, got {height}x{width}x{frames}"
            )));
        }

        let expected = height * width * frames;
        if data.len() != expected {
            return Err(NeuroframeError::shape(format!(
                "expected a 3D volume with {expected} samples ({height}x{width}x{frames}), got {}",
                data.len()
            )));
        }

        let mut value_min = f32::INFINITY;
        let mut value_max = f32::NEG_INFINITY;
        for &v in &data {
            if !v.is_finite() {
                return Err(NeuroframeError::value(
                    "volume samples must be finite (no NaN/Inf)",
                ));
            }
            value_min = value_min.min(v);
            value_max = value_max.max(v);
        }

        Ok(Self {
            height,
            width,
            frames,
            data,
            value_min,
            value_max,
        })
    }

    /// Parse a volume from its JSON document form (see [`VolumeDoc`]).
    pub fn from_json_reader(reader: impl Read) -> NeuroframeResult<Self> {
        let doc: VolumeDoc = serde_json::from_reader(reader)
            .map_err(|e| NeuroframeError::value(format!("parse volume JSON: {e}")))?;
        doc.into_volume()
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Time extent (number of slices).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Samples per slice.
    pub fn slice_len(&self) -> usize {
        self.height * self.width
    }

    /// Borrow the 2D slice at time `t`.
    pub fn slice(&self, t: usize) -> NeuroframeResult<&[f32]> {
        if t >= self.frames {
            return Err(NeuroframeError::index(format!(
                "frame index {t} out of range (0..{})",
                self.frames
            )));
        }
        let len = self.slice_len();
        Ok(&self.data[t * len..(t + 1) * len])
    }

    /// Volume-global (min, max), cached at construction.
    pub fn value_range(&self) -> (f32, f32) {
        (self.value_min, self.value_max)
    }
}

/// On-disk JSON form of an [`ActivityVolume`], as consumed by the CLI:
/// `{ "height": H, "width": W, "frames": T, "data": [H*W*T samples] }`
/// with `data` in time-major order.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VolumeDoc {
    pub height: usize,
    pub width: usize,
    pub frames: usize,
    pub data: Vec<f32>,
}

impl VolumeDoc {
    /// Validate and convert into an [`ActivityVolume`].
    pub fn into_volume(self) -> NeuroframeResult<ActivityVolume> {
        ActivityVolume::from_vec([self.height, self.width, self.frames], self.data)
    }
}
