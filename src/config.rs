use crate::colormap::Colormap;
use crate::foundation::error::{NeuroframeError, NeuroframeResult};

/// Activity threshold mode, resolved once at configuration time.
///
/// Both `Auto` and `Value` operate in normalized display space: the threshold
/// is compared against the slice values after they have been mapped to [0,1],
/// so a literal must itself lie in [0,1].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Threshold {
    /// 75th percentile of the current slice's normalized values.
    Auto,
    /// Fixed cutoff in normalized display space.
    Value(f32),
    /// No masking; every pixel receives the overlay alpha.
    None,
}

impl Default for Threshold {
    fn default() -> Self {
        Self::Auto
    }
}

/// Display-range policy used to normalize a slice to [0,1].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeRange {
    /// The current slice's own min/max (the default).
    Slice,
    /// The volume-global min/max, cached when the volume is loaded.
    Volume,
    /// A fixed caller-supplied range.
    Fixed { lo: f32, hi: f32 },
}

impl Default for NormalizeRange {
    fn default() -> Self {
        Self::Slice
    }
}

/// Immutable compositing configuration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CompositorConfig {
    /// Scalar -> RGB mapping for the overlay.
    pub colormap: Colormap,
    /// Opacity of above-threshold overlay pixels, in [0,1].
    pub overlay_alpha: f32,
    /// Transparency cutoff mode.
    pub threshold: Threshold,
    /// Normalization range policy.
    pub range: NormalizeRange,
    /// Frame interval in milliseconds; consumed only by encoders/players
    /// (GIF frame delay, MP4 fps), never by compositing itself.
    pub interval_ms: u32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            colormap: Colormap::Hot,
            overlay_alpha: 0.7,
            threshold: Threshold::Auto,
            range: NormalizeRange::Slice,
            interval_ms: 100,
        }
    }
}

impl CompositorConfig {
    pub fn validate(&self) -> NeuroframeResult<()> {
        if !self.overlay_alpha.is_finite() || !(0.0..=1.0).contains(&self.overlay_alpha) {
            return Err(NeuroframeError::value(format!(
                "overlay_alpha must be in [0,1], got {}",
                self.overlay_alpha
            )));
        }
        if let Threshold::Value(v) = self.threshold
            && (!v.is_finite() || !(0.0..=1.0).contains(&v))
        {
            return Err(NeuroframeError::value(format!(
                "activity threshold must be in [0,1] (normalized display space), got {v}"
            )));
        }
        if let NormalizeRange::Fixed { lo, hi } = self.range
            && (!lo.is_finite() || !hi.is_finite() || lo >= hi)
        {
            return Err(NeuroframeError::value(format!(
                "fixed normalization range requires finite lo < hi, got [{lo}, {hi}]"
            )));
        }
        if self.interval_ms == 0 {
            return Err(NeuroframeError::value("frame interval must be > 0 ms"));
        }
        Ok(())
    }

    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = colormap;
        self
    }

    pub fn with_overlay_alpha(mut self, overlay_alpha: f32) -> Self {
        self.overlay_alpha = overlay_alpha;
        self
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_range(mut self, range: NormalizeRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_interval_ms(mut self, interval_ms: u32) -> Self {
        self.interval_ms = interval_ms;
        self
    }
}
