use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::Context as _;
use image::{
    Delay, Frame, RgbaImage,
    codecs::gif::{GifEncoder, Repeat},
};

use crate::{
    compositor::FrameRGBA,
    encode::sink::{FrameSink, SinkConfig, ensure_parent_dir},
    foundation::error::{NeuroframeError, NeuroframeResult},
};

/// Animated-GIF sink: one GIF image per pushed frame, infinite repeat, frame
/// delay taken from the configured interval.
pub struct GifSink {
    out_path: PathBuf,
    cfg: Option<SinkConfig>,
    encoder: Option<GifEncoder<BufWriter<File>>>,
}

impl GifSink {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            cfg: None,
            encoder: None,
        }
    }
}

impl FrameSink for GifSink {
    fn begin(&mut self, cfg: SinkConfig) -> NeuroframeResult<()> {
        ensure_parent_dir(&self.out_path)?;
        let file = File::create(&self.out_path)
            .with_context(|| format!("create gif output '{}'", self.out_path.display()))?;

        let mut encoder = GifEncoder::new(BufWriter::new(file));
        encoder
            .set_repeat(Repeat::Infinite)
            .context("write gif loop header")?;

        self.cfg = Some(cfg);
        self.encoder = Some(encoder);
        Ok(())
    }

    fn push_frame(&mut self, _index: usize, frame: &FrameRGBA) -> NeuroframeResult<()> {
        let Some(cfg) = self.cfg else {
            return Err(NeuroframeError::state("gif sink used before begin"));
        };
        let Some(encoder) = self.encoder.as_mut() else {
            return Err(NeuroframeError::state("gif sink is already finalized"));
        };
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(NeuroframeError::value(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        let image = RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| NeuroframeError::shape("frame data does not match width*height*4"))?;
        let delay = Delay::from_numer_denom_ms(cfg.interval_ms, 1);
        encoder
            .encode_frame(Frame::from_parts(image, 0, 0, delay))
            .context("encode gif frame")?;
        Ok(())
    }

    fn end(&mut self) -> NeuroframeResult<()> {
        // Dropping the encoder writes the GIF trailer and flushes the file.
        if self.encoder.take().is_none() {
            return Err(NeuroframeError::state("gif sink was never started"));
        }
        Ok(())
    }
}
