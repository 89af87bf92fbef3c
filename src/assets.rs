//! Background file loading.
//!
//! IO is front-loaded here; the compositor itself only ever sees decoded
//! [`BackgroundImage`] planes.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    background::BackgroundImage,
    foundation::error::{NeuroframeError, NeuroframeResult},
};

/// File extensions accepted for background images.
pub const BACKGROUND_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tiff", "tif"];

/// Conventional background filename probed by [`detect_background`].
pub const DEFAULT_BACKGROUND_FILE: &str = "background.png";

/// Decode a background image file into a grayscale plane.
///
/// Fails with [`NeuroframeError::Resource`] for an extension outside the
/// allowlist or an unreadable/undecodable file. A direct load with a bad path
/// always fails hard; only [`detect_background`] degrades to "no background".
pub fn load_background_file(path: &Path) -> NeuroframeResult<BackgroundImage> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !BACKGROUND_EXTENSIONS.contains(&ext.as_str()) {
        return Err(NeuroframeError::resource(format!(
            "unsupported background format '{}' (expected one of: {})",
            path.display(),
            BACKGROUND_EXTENSIONS.join(", ")
        )));
    }

    let img = image::open(path).map_err(|e| {
        NeuroframeError::resource(format!(
            "could not read background image '{}': {e}",
            path.display()
        ))
    })?;
    let background = BackgroundImage::from_image(&img)?;
    info!(
        path = %path.display(),
        height = background.height(),
        width = background.width(),
        "background image decoded"
    );
    Ok(background)
}

/// Probe `dir` for the conventional background file.
///
/// Absence is not an error: auto-detection degrades to "no background".
pub fn detect_background(dir: &Path) -> Option<PathBuf> {
    let candidate = dir.join(DEFAULT_BACKGROUND_FILE);
    if candidate.is_file() {
        debug!(path = %candidate.display(), "background auto-detected");
        Some(candidate)
    } else {
        debug!(dir = %dir.display(), "no conventional background found");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("neuroframe-assets-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn unsupported_extension_is_a_resource_error() {
        let err = load_background_file(Path::new("background.svg")).unwrap_err();
        assert!(matches!(err, NeuroframeError::Resource(_)));
    }

    #[test]
    fn missing_file_fails_hard() {
        let err = load_background_file(Path::new("definitely-not-here.png")).unwrap_err();
        assert!(matches!(err, NeuroframeError::Resource(_)));
    }

    #[test]
    fn png_roundtrip_decodes_to_grayscale() {
        let dir = temp_dir("roundtrip");
        let path = dir.join("bg.png");
        image::RgbaImage::from_pixel(2, 3, image::Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();

        let bg = load_background_file(&path).unwrap();
        assert_eq!((bg.height(), bg.width()), (3, 2));
        assert!(bg.data().iter().all(|&v| v > 0.99));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn detect_background_reports_presence_and_absence() {
        let dir = temp_dir("detect");
        assert_eq!(detect_background(&dir), None);

        let path = dir.join(DEFAULT_BACKGROUND_FILE);
        image::GrayImage::from_pixel(1, 1, image::Luma([128]))
            .save(&path)
            .unwrap();
        assert_eq!(detect_background(&dir), Some(path));

        std::fs::remove_dir_all(&dir).ok();
    }
}
