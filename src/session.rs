use std::path::Path;

use crate::{
    assemble::VideoAssembler,
    choreo::{Choreographer, ScrollScript},
    error::ScrollcastResult,
    frame::FrameBuffer,
    model::{IndexingPolicy, RecordingResult, VideoConfig},
    navigate::PageNavigator,
    overlay::{OverlaySettings, blend},
    track::WebcamTrack,
};

/// One recording request, end to end: drive the scripted scroll timeline,
/// composite the webcam overlay onto every sampled frame, then hand the
/// buffer to the assembler.
///
/// Capture completes entirely before encoding begins; the pipeline is fully
/// sequential per request.
pub struct RecordingSession {
    config: VideoConfig,
    choreographer: Choreographer,
    overlay: OverlaySettings,
    track: WebcamTrack,
}

impl RecordingSession {
    pub fn new(
        config: VideoConfig,
        script: ScrollScript,
        overlay: OverlaySettings,
        track: WebcamTrack,
    ) -> ScrollcastResult<Self> {
        config.validate()?;
        overlay.validate()?;
        Ok(Self {
            config,
            choreographer: Choreographer::new(script)?,
            overlay,
            track,
        })
    }

    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    /// Run the capture against `nav`, returning the composited frame buffer.
    ///
    /// The navigator is closed on every exit path, including mid-capture
    /// failures.
    pub fn capture(
        &self,
        nav: &mut dyn PageNavigator,
        url: &str,
    ) -> ScrollcastResult<FrameBuffer> {
        tracing::info!(
            url,
            samples = self.choreographer.script().total_samples(),
            webcam_frames = self.track.len(),
            "starting capture"
        );

        let mut buffer = FrameBuffer::new();
        let fps = self.config.fps;
        let result = self.choreographer.run(nav, url, &mut |idx, frame| {
            let overlay_frame = self.track.frame_for(idx, fps);
            let composited = blend(&frame, overlay_frame, &self.overlay)?;
            buffer.push(composited)
        });

        // Release the browser session regardless of how capture ended.
        if let Err(e) = nav.close() {
            tracing::warn!(error = %e, "failed to close browser session");
        }
        result?;

        tracing::info!(frames = buffer.len(), "capture complete");
        Ok(buffer)
    }

    /// Capture and assemble the final artifact at `final_path`.
    pub fn record(
        &self,
        nav: &mut dyn PageNavigator,
        url: &str,
        final_path: &Path,
    ) -> ScrollcastResult<RecordingResult> {
        let buffer = self.capture(nav, url)?;
        let mut assembler = VideoAssembler::new(self.config.clone())?;
        let result = assembler.assemble(&buffer, self.track.audio_source(), final_path)?;
        tracing::info!(
            path = %result.path.display(),
            frames = result.frame_count,
            duration_secs = result.duration_secs,
            has_audio = result.has_audio,
            "recording written"
        );
        Ok(result)
    }
}

/// Load a webcam track, degrading to no-overlay instead of aborting the
/// recording when the source is missing or unreadable.
pub fn load_webcam_or_disable(path: Option<&Path>, policy: IndexingPolicy) -> WebcamTrack {
    let Some(path) = path else {
        return WebcamTrack::empty(policy);
    };
    match WebcamTrack::load(path, policy) {
        Ok(track) => track,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "webcam track unusable, overlay disabled");
            WebcamTrack::empty(policy)
        }
    }
}
