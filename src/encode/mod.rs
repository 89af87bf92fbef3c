//! Encoding sinks.
//!
//! Sinks consume composited frames in timeline order and are driven by
//! [`create_animation`](crate::create_animation).

/// `ffmpeg`-based MP4 sink (raw RGBA piped to the system binary).
pub mod ffmpeg;
/// Animated-GIF sink.
pub mod gif;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
