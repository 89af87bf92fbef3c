use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::warn;

use crate::{
    compositor::{Compositor, FrameRGBA},
    encode::{
        ffmpeg::{FfmpegEncoder, is_ffmpeg_on_path},
        gif::GifSink,
        sink::{FrameSink, SinkConfig},
    },
    foundation::error::{NeuroframeError, NeuroframeResult},
};

/// Backdrop used when flattening masked frames for alpha-less containers.
const MP4_BACKDROP: [u8; 4] = [0, 0, 0, 255];

fn dims(compositor: &Compositor) -> NeuroframeResult<(usize, usize, usize)> {
    compositor
        .dimensions()
        .ok_or_else(|| NeuroframeError::state("no volume loaded; call load_data first"))
}

/// Composite every frame of the loaded volume, in timeline order.
pub fn render_frames(compositor: &Compositor) -> NeuroframeResult<Vec<FrameRGBA>> {
    let (_, _, frames) = dims(compositor)?;
    (0..frames).map(|i| compositor.get_frame(i)).collect()
}

/// Composite every frame on a rayon worker pool.
///
/// Frames are independent of each other, so the fan-out is safe; output
/// ordering matches the sequential path exactly. `threads` overrides the
/// pool's worker count when set.
pub fn render_frames_parallel(
    compositor: &Compositor,
    threads: Option<usize>,
) -> NeuroframeResult<Vec<FrameRGBA>> {
    let (_, _, frames) = dims(compositor)?;
    let pool = build_thread_pool(threads)?;
    let rendered = pool.install(|| {
        (0..frames)
            .into_par_iter()
            .map(|i| compositor.get_frame(i))
            .collect::<Vec<_>>()
    });
    rendered.into_iter().collect()
}

fn build_thread_pool(threads: Option<usize>) -> NeuroframeResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        if n == 0 {
            return Err(NeuroframeError::value("thread count must be > 0"));
        }
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| NeuroframeError::value(format!("failed to build rayon thread pool: {e}")))
}

/// Sequence the full time extent into `sink`, in order.
#[tracing::instrument(skip(compositor, sink))]
pub fn create_animation(
    compositor: &Compositor,
    sink: &mut dyn FrameSink,
) -> NeuroframeResult<()> {
    let (height, width, frames) = dims(compositor)?;
    sink.begin(SinkConfig {
        width: width as u32,
        height: height as u32,
        interval_ms: compositor.config().interval_ms,
    })?;
    for index in 0..frames {
        let frame = compositor.get_frame(index)?;
        sink.push_frame(index, &frame)?;
    }
    sink.end()
}

/// What [`save_animation`] did with the request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The animation was encoded to the given path.
    Written(PathBuf),
    /// MP4 output was requested but `ffmpeg` is not on `PATH`; the render was
    /// skipped with a warning. This is the documented recoverable degradation
    /// at the encoding boundary, not a compositing failure.
    SkippedMissingEncoder,
}

/// Encode the full animation to `out_path`, picking the container from the
/// file extension (`.gif` or `.mp4`).
pub fn save_animation(compositor: &Compositor, out_path: &Path) -> NeuroframeResult<SaveOutcome> {
    let ext = out_path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "gif" => {
            let mut sink = GifSink::new(out_path);
            create_animation(compositor, &mut sink)?;
            Ok(SaveOutcome::Written(out_path.to_path_buf()))
        }
        "mp4" => {
            if !is_ffmpeg_on_path() {
                warn!(
                    path = %out_path.display(),
                    "ffmpeg not found on PATH; skipping MP4 encode"
                );
                return Ok(SaveOutcome::SkippedMissingEncoder);
            }
            let mut sink = FfmpegEncoder::new(out_path, true, MP4_BACKDROP);
            create_animation(compositor, &mut sink)?;
            Ok(SaveOutcome::Written(out_path.to_path_buf()))
        }
        other => Err(NeuroframeError::value(format!(
            "unsupported animation container '.{other}' (expected .gif or .mp4)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{CompositorConfig, Threshold},
        encode::sink::InMemorySink,
        volume::ActivityVolume,
    };

    fn loaded_compositor() -> Compositor {
        let mut c = Compositor::new(
            CompositorConfig::default()
                .with_threshold(Threshold::Value(0.5))
                .with_interval_ms(40),
        )
        .unwrap();
        let data: Vec<f32> = (0..2 * 3 * 4).map(|i| (i % 7) as f32).collect();
        c.load_data(ActivityVolume::from_vec([2, 3, 4], data).unwrap());
        c
    }

    #[test]
    fn create_animation_pushes_every_frame_in_order() {
        let c = loaded_compositor();
        let mut sink = InMemorySink::new();
        create_animation(&c, &mut sink).unwrap();

        let indices: Vec<usize> = sink.frames().iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        let cfg = sink.config().unwrap();
        assert_eq!((cfg.width, cfg.height, cfg.interval_ms), (3, 2, 40));
    }

    #[test]
    fn parallel_render_matches_sequential() {
        let c = loaded_compositor();
        let sequential = render_frames(&c).unwrap();
        let parallel = render_frames_parallel(&c, Some(2)).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn zero_threads_is_a_value_error() {
        let c = loaded_compositor();
        assert!(matches!(
            render_frames_parallel(&c, Some(0)).unwrap_err(),
            NeuroframeError::Value(_)
        ));
    }

    #[test]
    fn unloaded_compositor_is_a_state_error() {
        let c = Compositor::new(CompositorConfig::default()).unwrap();
        assert!(matches!(
            render_frames(&c).unwrap_err(),
            NeuroframeError::State(_)
        ));
    }

    #[test]
    fn unknown_container_is_a_value_error() {
        let c = loaded_compositor();
        assert!(matches!(
            save_animation(&c, Path::new("out.webm")).unwrap_err(),
            NeuroframeError::Value(_)
        ));
    }
}
