//! Neuroframe turns a time-indexed stack of 2D activity maps into
//! color-composited RGBA frames, optionally blended over a static grayscale
//! background, and streams them into animation encoders.
//!
//! # Pipeline overview
//!
//! 1. **Load**: [`ActivityVolume`] (height x width x time, `f32`) and an
//!    optional [`BackgroundImage`], resampled to the volume's grid
//! 2. **Normalize**: each slice is mapped linearly to `[0,1]` by the
//!    configured [`NormalizeRange`] policy
//! 3. **Colorize**: one of four fixed [`Colormap`]s maps activity to RGB
//! 4. **Mask**: activity below the [`Threshold`] becomes transparent; the
//!    rest gets the configured overlay alpha
//! 5. **Blend**: the overlay is composed over the background, or kept as an
//!    RGBA layer with its binary mask
//! 6. **Encode** (optional): frames stream into a [`FrameSink`] — animated
//!    GIF, system-`ffmpeg` MP4, or in-memory
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic**: for a given volume, configuration and background,
//!   every composited frame is byte-for-byte reproducible.
//! - **No IO in the compositor**: file decode and encode live at the
//!   [`assets`] and [`encode`] boundaries.
//! - **Straight-alpha RGBA8** output end-to-end (see [`FrameRGBA`]).
#![forbid(unsafe_code)]

pub mod animate;
pub mod assets;
pub mod background;
pub mod colormap;
pub mod compositor;
pub mod config;
pub mod encode;
pub mod foundation;
pub mod volume;

pub use animate::{
    SaveOutcome, create_animation, render_frames, render_frames_parallel, save_animation,
};
pub use assets::{DEFAULT_BACKGROUND_FILE, detect_background, load_background_file};
pub use background::BackgroundImage;
pub use colormap::Colormap;
pub use compositor::{Compositor, FrameRGBA};
pub use config::{CompositorConfig, NormalizeRange, Threshold};
pub use encode::{
    ffmpeg::{FfmpegEncoder, is_ffmpeg_on_path},
    gif::GifSink,
    sink::{FrameSink, InMemorySink, SinkConfig},
};
pub use foundation::error::{NeuroframeError, NeuroframeResult};
pub use volume::{ActivityVolume, VolumeDoc};
