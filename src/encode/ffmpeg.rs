use std::{
    path::PathBuf,
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    compositor::FrameRGBA,
    encode::sink::{FrameSink, SinkConfig, ensure_parent_dir},
    foundation::error::{NeuroframeError, NeuroframeResult},
};

/// True when a usable `ffmpeg` binary is on `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// MP4 sink piping raw straight-alpha RGBA frames into the system `ffmpeg`
/// binary (libx264, yuv420p, faststart).
///
/// We intentionally use the system `ffmpeg` rather than an FFI binding to
/// avoid native FFmpeg dev header/lib requirements. Frames are flattened over
/// `backdrop_rgba` before encoding since yuv420p output has no alpha.
pub struct FfmpegEncoder {
    out_path: PathBuf,
    overwrite: bool,
    backdrop_rgba: [u8; 4],
    proc: Option<FfmpegProc>,
}

struct FfmpegProc {
    child: Child,
    stdin: Option<ChildStdin>,
    scratch: Vec<u8>,
    width: u32,
    height: u32,
}

impl FfmpegEncoder {
    pub fn new(out_path: impl Into<PathBuf>, overwrite: bool, backdrop_rgba: [u8; 4]) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite,
            backdrop_rgba,
            proc: None,
        }
    }
}

impl FrameSink for FfmpegEncoder {
    fn begin(&mut self, cfg: SinkConfig) -> NeuroframeResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(NeuroframeError::value("encode width/height must be non-zero"));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            // The default settings target yuv420p output for maximum compatibility.
            return Err(NeuroframeError::value(
                "encode width/height must be even (required for yuv420p mp4 output)",
            ));
        }

        ensure_parent_dir(&self.out_path)?;
        if !self.overwrite && self.out_path.exists() {
            return Err(NeuroframeError::value(format!(
                "output file '{}' already exists",
                self.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(NeuroframeError::resource(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if self.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps().to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&self.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            NeuroframeError::resource(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| NeuroframeError::resource("failed to open ffmpeg stdin (unexpected)"))?;

        self.proc = Some(FfmpegProc {
            scratch: vec![0u8; (cfg.width * cfg.height * 4) as usize],
            child,
            stdin: Some(stdin),
            width: cfg.width,
            height: cfg.height,
        });
        Ok(())
    }

    fn push_frame(&mut self, _index: usize, frame: &FrameRGBA) -> NeuroframeResult<()> {
        let Some(proc) = self.proc.as_mut() else {
            return Err(NeuroframeError::state("ffmpeg sink used before begin"));
        };

        if frame.width != proc.width || frame.height != proc.height {
            return Err(NeuroframeError::value(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, proc.width, proc.height
            )));
        }
        if frame.data.len() != proc.scratch.len() {
            return Err(NeuroframeError::value(
                "frame data size mismatch with width*height*4",
            ));
        }

        flatten_to_opaque_rgba8(&mut proc.scratch, &frame.data, self.backdrop_rgba)?;

        let Some(stdin) = proc.stdin.as_mut() else {
            return Err(NeuroframeError::state("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&proc.scratch).map_err(|e| {
            NeuroframeError::resource(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn end(&mut self) -> NeuroframeResult<()> {
        let Some(mut proc) = self.proc.take() else {
            return Err(NeuroframeError::state("ffmpeg sink was never started"));
        };

        drop(proc.stdin.take());

        let output = proc.child.wait_with_output().map_err(|e| {
            NeuroframeError::resource(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NeuroframeError::resource(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Flatten straight-alpha RGBA8 over an opaque backdrop color.
fn flatten_to_opaque_rgba8(dst: &mut [u8], src: &[u8], bg_rgba: [u8; 4]) -> NeuroframeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(NeuroframeError::value(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    let bg_r = u16::from(bg_rgba[0]);
    let bg_g = u16::from(bg_rgba[1]);
    let bg_b = u16::from(bg_rgba[2]);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }

        let inv = 255u16 - a;
        d[0] = (mul_div255(u16::from(s[0]), a) + mul_div255(bg_r, inv)).min(255) as u8;
        d[1] = (mul_div255(u16::from(s[1]), a) + mul_div255(bg_g, inv)).min(255) as u8;
        d[2] = (mul_div255(u16::from(s[2]), a) + mul_div255(bg_b, inv)).min(255) as u8;
        d[3] = 255;
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_rejects_odd_dimensions() {
        let mut sink = FfmpegEncoder::new("out.mp4", true, [0, 0, 0, 255]);
        let err = sink
            .begin(SinkConfig {
                width: 3,
                height: 4,
                interval_ms: 100,
            })
            .unwrap_err();
        assert!(matches!(err, NeuroframeError::Value(_)));
    }

    #[test]
    fn push_before_begin_is_a_state_error() {
        let mut sink = FfmpegEncoder::new("out.mp4", true, [0, 0, 0, 255]);
        let frame = FrameRGBA {
            width: 2,
            height: 2,
            data: vec![0; 16],
        };
        assert!(matches!(
            sink.push_frame(0, &frame).unwrap_err(),
            NeuroframeError::State(_)
        ));
    }

    #[test]
    fn flatten_straight_over_black_produces_expected_rgb() {
        // Straight red @ 50% alpha becomes 128,0,0 over black.
        let src = vec![255u8, 0, 0, 128];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).unwrap();
        assert_eq!(dst, vec![128u8, 0, 0, 255]);
    }

    #[test]
    fn flatten_transparent_pixel_is_backdrop() {
        let src = vec![255u8, 255, 255, 0];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, vec![10u8, 20, 30, 255]);
    }

    #[test]
    fn flatten_opaque_pixel_is_kept() {
        let src = vec![1u8, 2, 3, 255];
        let mut dst = vec![0u8; 4];
        flatten_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
        assert_eq!(dst, src);
    }
}
