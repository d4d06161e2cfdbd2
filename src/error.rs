pub type ScrollcastResult<T> = Result<T, ScrollcastError>;

#[derive(thiserror::Error, Debug)]
pub enum ScrollcastError {
    /// The page could not be loaded within the navigation timeout.
    #[error("navigation error: {0}")]
    Navigation(String),

    /// A screenshot could not be taken or decoded into a bitmap.
    #[error("capture error: {0}")]
    Capture(String),

    /// The webcam source exists but could not be probed or decoded.
    #[error("track load error: {0}")]
    TrackLoad(String),

    /// The frame sequence could not be encoded into a video file.
    #[error("encode error: {0}")]
    Encode(String),

    /// Audio could not be muxed onto the base video.
    #[error("audio mux error: {0}")]
    AudioMux(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrollcastError {
    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn track_load(msg: impl Into<String>) -> Self {
        Self::TrackLoad(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn audio_mux(msg: impl Into<String>) -> Self {
        Self::AudioMux(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            ScrollcastError::navigation("x")
                .to_string()
                .contains("navigation error:")
        );
        assert!(
            ScrollcastError::capture("x")
                .to_string()
                .contains("capture error:")
        );
        assert!(
            ScrollcastError::track_load("x")
                .to_string()
                .contains("track load error:")
        );
        assert!(
            ScrollcastError::encode("x")
                .to_string()
                .contains("encode error:")
        );
        assert!(
            ScrollcastError::audio_mux("x")
                .to_string()
                .contains("audio mux error:")
        );
        assert!(
            ScrollcastError::validation("x")
                .to_string()
                .contains("validation error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = ScrollcastError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
