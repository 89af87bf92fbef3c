use tracing::info;

use crate::{
    background::BackgroundImage,
    config::{CompositorConfig, NormalizeRange, Threshold},
    foundation::{
        error::{NeuroframeError, NeuroframeResult},
        math,
    },
    volume::ActivityVolume,
};

/// One composited frame: straight-alpha RGBA8, row-major, channel values
/// 0-255. This is the fixed output convention of the whole pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, RGBA interleaved.
    pub data: Vec<u8>,
}

/// Deterministic mapping from (volume, frame index, config, optional
/// background) to composited RGBA frames.
///
/// The two `load_*` operations replace instance state; `get_frame` is a pure
/// `&self` call, so concurrent frame reads with no interleaved loads are safe.
#[derive(Clone, Debug)]
pub struct Compositor {
    config: CompositorConfig,
    volume: Option<ActivityVolume>,
    background: Option<BackgroundImage>,
    // Background resampled to the volume grid, kept in sync by both loads.
    background_scaled: Option<BackgroundImage>,
}

impl Compositor {
    /// Create a compositor with a validated configuration.
    pub fn new(config: CompositorConfig) -> NeuroframeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            volume: None,
            background: None,
            background_scaled: None,
        })
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Load (or replace) the activity volume.
    ///
    /// Shape and value validation happens when the [`ActivityVolume`] is
    /// constructed; loading replaces any previous volume along with its
    /// cached normalization statistics, and re-resamples a loaded background
    /// to the new grid.
    pub fn load_data(&mut self, volume: ActivityVolume) {
        info!(
            height = volume.height(),
            width = volume.width(),
            frames = volume.frames(),
            "volume loaded"
        );
        self.volume = Some(volume);
        self.refresh_scaled_background();
    }

    /// Load (or replace) the background image.
    ///
    /// With a volume already loaded the background is resampled to the
    /// volume's grid immediately; otherwise resampling happens once a volume
    /// arrives. Requesting a frame with a background but no volume fails with
    /// the usual missing-volume state error.
    pub fn load_background(&mut self, background: BackgroundImage) {
        info!(
            height = background.height(),
            width = background.width(),
            "background loaded"
        );
        self.background = Some(background);
        self.refresh_scaled_background();
    }

    fn refresh_scaled_background(&mut self) {
        self.background_scaled = match (&self.volume, &self.background) {
            (Some(volume), Some(bg)) => Some(bg.resampled(volume.height(), volume.width())),
            _ => None,
        };
    }

    pub fn volume(&self) -> Option<&ActivityVolume> {
        self.volume.as_ref()
    }

    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// (height, width, time extent) of the loaded volume, if any.
    pub fn dimensions(&self) -> Option<(usize, usize, usize)> {
        self.volume
            .as_ref()
            .map(|v| (v.height(), v.width(), v.frames()))
    }

    /// Composite the frame at `index`.
    ///
    /// Fails with [`NeuroframeError::State`] when no volume is loaded and
    /// [`NeuroframeError::Index`] when `index` is outside the time extent.
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn get_frame(&self, index: usize) -> NeuroframeResult<FrameRGBA> {
        let volume = self
            .volume
            .as_ref()
            .ok_or_else(|| NeuroframeError::state("no volume loaded; call load_data first"))?;
        let slice = volume.slice(index)?;

        let (lo, hi) = self.resolve_range(volume, slice);
        let normalized = normalize_slice(slice, lo, hi);
        let cutoff = match self.config.threshold {
            Threshold::Auto => math::percentile(&normalized, 75.0),
            Threshold::Value(v) => v,
            Threshold::None => f32::NEG_INFINITY,
        };

        let overlay_alpha = self.config.overlay_alpha;
        let colormap = self.config.colormap;
        let mut data = Vec::with_capacity(normalized.len() * 4);

        match &self.background_scaled {
            Some(bg) => {
                // Composite over the grayscale backdrop; output is opaque.
                for (&t, &back) in normalized.iter().zip(bg.data()) {
                    let [r, g, b] = colormap.sample(t);
                    let a = if t >= cutoff { overlay_alpha } else { 0.0 };
                    data.push(math::channel_to_u8(back + (r - back) * a));
                    data.push(math::channel_to_u8(back + (g - back) * a));
                    data.push(math::channel_to_u8(back + (b - back) * a));
                    data.push(255);
                }
            }
            None => {
                // No backdrop: keep the binary mask in the alpha channel.
                for &t in &normalized {
                    let [r, g, b] = colormap.sample(t);
                    let a = if t >= cutoff { overlay_alpha } else { 0.0 };
                    data.push(math::channel_to_u8(r));
                    data.push(math::channel_to_u8(g));
                    data.push(math::channel_to_u8(b));
                    data.push(math::channel_to_u8(a));
                }
            }
        }

        Ok(FrameRGBA {
            width: volume.width() as u32,
            height: volume.height() as u32,
            data,
        })
    }

    fn resolve_range(&self, volume: &ActivityVolume, slice: &[f32]) -> (f32, f32) {
        match self.config.range {
            NormalizeRange::Slice => slice
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                }),
            NormalizeRange::Volume => volume.value_range(),
            NormalizeRange::Fixed { lo, hi } => (lo, hi),
        }
    }
}

/// Map `slice` linearly from `[lo, hi]` to `[0, 1]`, clamped.
///
/// A degenerate range (`hi <= lo`) collapses the scale: every value maps to
/// 0.0, which is what the epsilon-substitution guard evaluates to at
/// `v == lo` without risking f32 epsilon underflow at large magnitudes.
fn normalize_slice(slice: &[f32], lo: f32, hi: f32) -> Vec<f32> {
    let span = hi - lo;
    if !(span > 0.0) {
        return vec![0.0; slice.len()];
    }
    slice
        .iter()
        .map(|&v| ((v - lo) / span).clamp(0.0, 1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colormap::Colormap;

    fn compositor(config: CompositorConfig) -> Compositor {
        Compositor::new(config).unwrap()
    }

    fn ramp_volume() -> ActivityVolume {
        // One 2x2 slice: 0, 1, 2, 3.
        ActivityVolume::from_vec([2, 2, 1], vec![0.0, 1.0, 2.0, 3.0]).unwrap()
    }

    #[test]
    fn normalize_maps_slice_range_to_unit_interval() {
        let n = normalize_slice(&[2.0, 4.0, 6.0], 2.0, 6.0);
        assert_eq!(n, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn normalize_clamps_fixed_range_outliers() {
        let n = normalize_slice(&[-1.0, 0.5, 2.0], 0.0, 1.0);
        assert_eq!(n, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn degenerate_range_maps_to_zero() {
        let n = normalize_slice(&[5.0, 5.0, 5.0], 5.0, 5.0);
        assert_eq!(n, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn get_frame_without_volume_is_a_state_error() {
        let c = compositor(CompositorConfig::default());
        assert!(matches!(
            c.get_frame(0).unwrap_err(),
            NeuroframeError::State(_)
        ));
    }

    #[test]
    fn get_frame_out_of_range_is_an_index_error() {
        let mut c = compositor(CompositorConfig::default());
        c.load_data(ramp_volume());
        assert!(matches!(
            c.get_frame(1).unwrap_err(),
            NeuroframeError::Index(_)
        ));
    }

    #[test]
    fn frame_matches_volume_dimensions() {
        let mut c = compositor(CompositorConfig::default());
        c.load_data(ramp_volume());
        let f = c.get_frame(0).unwrap();
        assert_eq!((f.width, f.height), (2, 2));
        assert_eq!(f.data.len(), 16);
    }

    #[test]
    fn literal_threshold_masks_in_normalized_space() {
        let mut c = compositor(
            CompositorConfig::default()
                .with_threshold(Threshold::Value(0.5))
                .with_overlay_alpha(1.0),
        );
        c.load_data(ramp_volume());
        let f = c.get_frame(0).unwrap();
        // Normalized values 0, 1/3, 2/3, 1 against cutoff 0.5.
        let alphas: Vec<u8> = f.data.chunks_exact(4).map(|px| px[3]).collect();
        assert_eq!(alphas, vec![0, 0, 255, 255]);
    }

    #[test]
    fn threshold_none_leaves_every_pixel_opaque() {
        let mut c = compositor(
            CompositorConfig::default()
                .with_threshold(Threshold::None)
                .with_overlay_alpha(0.5),
        );
        c.load_data(ramp_volume());
        let f = c.get_frame(0).unwrap();
        assert!(f.data.chunks_exact(4).all(|px| px[3] == 128));
    }

    #[test]
    fn auto_threshold_uses_the_75th_percentile() {
        let mut c = compositor(
            CompositorConfig::default()
                .with_threshold(Threshold::Auto)
                .with_overlay_alpha(1.0),
        );
        c.load_data(ramp_volume());
        let f = c.get_frame(0).unwrap();
        // Normalized 0, 1/3, 2/3, 1; p75 = 0.75: only the last pixel passes.
        let opaque = f.data.chunks_exact(4).filter(|px| px[3] != 0).count();
        assert_eq!(opaque, 1);
    }

    #[test]
    fn volume_range_policy_uses_global_extrema() {
        // Two constant slices 0 and 1; slice-local normalization would map
        // both to 0, volume-global keeps their identity.
        let v = ActivityVolume::from_vec([1, 2, 2], vec![0.0, 0.0, 1.0, 1.0]).unwrap();
        let mut c = compositor(
            CompositorConfig::default()
                .with_range(NormalizeRange::Volume)
                .with_threshold(Threshold::Value(0.5))
                .with_overlay_alpha(1.0),
        );
        c.load_data(v);
        assert!(c.get_frame(0).unwrap().data.chunks_exact(4).all(|px| px[3] == 0));
        assert!(c.get_frame(1).unwrap().data.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn background_blend_is_opaque_and_weighted() {
        let mut c = compositor(
            CompositorConfig::default()
                .with_colormap(Colormap::Hot)
                .with_threshold(Threshold::None)
                .with_overlay_alpha(1.0),
        );
        c.load_data(ramp_volume());
        c.load_background(BackgroundImage::from_gray(2, 2, vec![0.5; 4]).unwrap());
        let f = c.get_frame(0).unwrap();
        // Full overlay alpha replaces the backdrop with the colormap color;
        // hot(1.0) is white, and the output is opaque.
        assert_eq!(&f.data[12..16], &[255, 255, 255, 255]);

        // Half alpha blends halfway between backdrop and overlay color.
        let mut half = compositor(
            CompositorConfig::default()
                .with_colormap(Colormap::Hot)
                .with_threshold(Threshold::None)
                .with_overlay_alpha(0.5),
        );
        half.load_data(ramp_volume());
        half.load_background(BackgroundImage::from_gray(2, 2, vec![0.0; 4]).unwrap());
        let f = half.get_frame(0).unwrap();
        // 0.0 + (1.0 - 0.0) * 0.5 per channel for the white top pixel.
        assert_eq!(&f.data[12..16], &[128, 128, 128, 255]);
    }

    #[test]
    fn replacing_the_volume_rescales_the_background() {
        let mut c = compositor(CompositorConfig::default().with_threshold(Threshold::None));
        c.load_background(BackgroundImage::from_gray(8, 8, vec![0.25; 64]).unwrap());
        c.load_data(ramp_volume());
        assert_eq!(c.get_frame(0).unwrap().data.len(), 2 * 2 * 4);

        let bigger = ActivityVolume::from_vec([3, 5, 1], vec![0.0; 15]).unwrap();
        c.load_data(bigger);
        assert_eq!(c.get_frame(0).unwrap().data.len(), 3 * 5 * 4);
    }
}
