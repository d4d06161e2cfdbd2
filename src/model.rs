use std::path::PathBuf;

use crate::{
    error::{ScrollcastError, ScrollcastResult},
    frame::Fps,
};

/// Corner of the page frame the webcam overlay is anchored to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPosition {
    #[default]
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

/// Mask shape used when blending the webcam overlay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayShape {
    #[default]
    Circle,
    RoundedRect,
}

/// How webcam frames are selected for a given output frame index.
///
/// `Cyclic` wraps the track; `DurationMatched` plays it once at native speed
/// and holds the last frame afterwards. Fixed at track construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingPolicy {
    #[default]
    Cyclic,
    DurationMatched,
}

/// Immutable per-recording configuration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VideoConfig {
    pub fps: Fps,
    pub video_codec: String,
    pub audio_codec: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: Fps { num: 20, den: 1 },
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

impl VideoConfig {
    pub fn validate(&self) -> ScrollcastResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(ScrollcastError::validation(
                "viewport width/height must be non-zero",
            ));
        }
        if !self.viewport_width.is_multiple_of(2) || !self.viewport_height.is_multiple_of(2) {
            // We target yuv420p mp4 output for maximum compatibility.
            return Err(ScrollcastError::validation(
                "viewport width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.video_codec.is_empty() || self.audio_codec.is_empty() {
            return Err(ScrollcastError::validation(
                "video/audio codec must be non-empty",
            ));
        }
        Ok(())
    }
}

/// The final artifact plus derived metadata.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct RecordingResult {
    pub path: PathBuf,
    pub frame_count: u64,
    pub duration_secs: f64,
    /// `true` when webcam audio made it into the artifact.
    pub has_audio: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(VideoConfig::default().validate().is_ok());
    }

    #[test]
    fn config_validation_catches_bad_values() {
        let mut cfg = VideoConfig::default();
        cfg.viewport_width = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = VideoConfig::default();
        cfg.viewport_height = 719;
        assert!(cfg.validate().is_err());

        let mut cfg = VideoConfig::default();
        cfg.fps.num = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = VideoConfig::default();
        cfg.video_codec.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn enum_defaults_match_request_defaults() {
        assert_eq!(OverlayPosition::default(), OverlayPosition::BottomRight);
        assert_eq!(OverlayShape::default(), OverlayShape::Circle);
        assert_eq!(IndexingPolicy::default(), IndexingPolicy::Cyclic);
    }
}
