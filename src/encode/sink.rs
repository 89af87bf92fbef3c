use std::path::Path;

use crate::compositor::FrameRGBA;
use crate::foundation::error::NeuroframeResult;

/// Configuration provided to a [`FrameSink`] at the start of a sequence.
#[derive(Debug, Clone, Copy)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Interval between frames in milliseconds.
    pub interval_ms: u32,
}

impl SinkConfig {
    /// Frame rate implied by the interval, rounded, never below 1 fps.
    pub fn fps(&self) -> u32 {
        ((1000 + self.interval_ms / 2) / self.interval_ms).max(1)
    }
}

/// Sink contract for consuming composited frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `index`
/// order, starting at 0, covering the full time extent.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> NeuroframeResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, index: usize, frame: &FrameRGBA) -> NeuroframeResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> NeuroframeResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(usize, FrameRGBA)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Captured frames in timeline order.
    pub fn frames(&self) -> &[(usize, FrameRGBA)] {
        &self.frames
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> NeuroframeResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &FrameRGBA) -> NeuroframeResult<()> {
        self.frames.push((index, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> NeuroframeResult<()> {
        Ok(())
    }
}

/// Create the parent directory of an output path if it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> NeuroframeResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}
