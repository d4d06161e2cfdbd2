use std::path::{Path, PathBuf};

use crate::{
    error::{ScrollcastError, ScrollcastResult},
    frame::{Fps, Frame},
    model::IndexingPolicy,
};

/// A decoded webcam source: the full frame sequence plus the metadata needed
/// to pick a frame per output index and to mux audio later.
///
/// Created once per recording, consumed index-by-index during compositing.
#[derive(Clone, Debug)]
pub struct WebcamTrack {
    frames: Vec<Frame>,
    native_fps: Fps,
    has_audio: bool,
    source_path: Option<PathBuf>,
    policy: IndexingPolicy,
}

impl WebcamTrack {
    /// Track with no frames; every lookup yields `None` and the overlay
    /// becomes a no-op.
    pub fn empty(policy: IndexingPolicy) -> Self {
        Self {
            frames: Vec::new(),
            native_fps: Fps { num: 30, den: 1 },
            has_audio: false,
            source_path: None,
            policy,
        }
    }

    /// Build a track from already-decoded frames. Used by tests and by
    /// callers that source frames outside a media file.
    pub fn from_frames(frames: Vec<Frame>, native_fps: Fps, policy: IndexingPolicy) -> Self {
        Self {
            frames,
            native_fps,
            has_audio: false,
            source_path: None,
            policy,
        }
    }

    /// Decode `path` into a track.
    ///
    /// An absent path degrades to an empty track (logged, not an error); a
    /// present but unprobeable/undecodable file is a track-load error.
    pub fn load(path: &Path, policy: IndexingPolicy) -> ScrollcastResult<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "webcam source missing, overlay disabled");
            return Ok(Self::empty(policy));
        }

        let info = probe_video(path)?;
        let frames = decode_all_frames_rgba8(path, info.width, info.height)?;
        if frames.is_empty() {
            return Err(ScrollcastError::track_load(format!(
                "webcam source '{}' contains no decodable video frames",
                path.display()
            )));
        }

        tracing::debug!(
            path = %path.display(),
            frames = frames.len(),
            fps = info.fps.as_f64(),
            has_audio = info.has_audio,
            "webcam track loaded"
        );

        Ok(Self {
            frames,
            native_fps: info.fps,
            has_audio: info.has_audio,
            source_path: Some(path.to_path_buf()),
            policy,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn policy(&self) -> IndexingPolicy {
        self.policy
    }

    pub fn native_fps(&self) -> Fps {
        self.native_fps
    }

    /// The file to pull audio from during muxing, when the source carries an
    /// audio stream.
    pub fn audio_source(&self) -> Option<&Path> {
        if self.has_audio {
            self.source_path.as_deref()
        } else {
            None
        }
    }

    /// Overlay frame for output frame `output_index` at `output_fps`.
    ///
    /// `Cyclic` wraps the track modulo its length and is defined for every
    /// index; `DurationMatched` plays the track once at its native rate and
    /// holds the last frame once the source is exhausted. No fallback
    /// between policies.
    pub fn frame_for(&self, output_index: u64, output_fps: Fps) -> Option<&Frame> {
        if self.frames.is_empty() {
            return None;
        }
        let idx = match self.policy {
            IndexingPolicy::Cyclic => (output_index % self.frames.len() as u64) as usize,
            IndexingPolicy::DurationMatched => {
                let t = output_fps.frames_to_secs(output_index);
                let src = (t * self.native_fps.as_f64()).floor() as u64;
                src.min(self.frames.len() as u64 - 1) as usize
            }
        };
        Some(&self.frames[idx])
    }
}

#[derive(Clone, Debug)]
struct ProbedSource {
    width: u32,
    height: u32,
    fps: Fps,
    has_audio: bool,
}

fn probe_video(source_path: &Path) -> ScrollcastResult<ProbedSource> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let out = std::process::Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(source_path)
        .output()
        .map_err(|e| ScrollcastError::track_load(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ScrollcastError::track_load(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ScrollcastError::track_load(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            ScrollcastError::track_load(format!(
                "no video stream found in '{}'",
                source_path.display()
            ))
        })?;
    let width = video_stream
        .width
        .ok_or_else(|| ScrollcastError::track_load("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ScrollcastError::track_load("missing video height from ffprobe"))?;

    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| ScrollcastError::track_load("invalid video r_frame_rate"))?;
    let fps = Fps::new(fps_num, fps_den)
        .map_err(|_| ScrollcastError::track_load("video r_frame_rate is zero"))?;
    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(ProbedSource {
        width,
        height,
        fps,
        has_audio,
    })
}

fn decode_all_frames_rgba8(
    source_path: &Path,
    width: u32,
    height: u32,
) -> ScrollcastResult<Vec<Frame>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(source_path)
        .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
        .output()
        .map_err(|e| {
            ScrollcastError::track_load(format!("failed to run ffmpeg for video decode: {e}"))
        })?;

    if !out.status.success() {
        return Err(ScrollcastError::track_load(format!(
            "ffmpeg video decode failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let frame_len = width as usize * height as usize * 4;
    if frame_len == 0 {
        return Err(ScrollcastError::track_load(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if !out.stdout.len().is_multiple_of(frame_len) {
        return Err(ScrollcastError::track_load(format!(
            "decoded video stream has invalid size: got {} bytes, expected multiples of {frame_len}",
            out.stdout.len()
        )));
    }

    let mut frames = Vec::with_capacity(out.stdout.len() / frame_len);
    for chunk in out.stdout.chunks_exact(frame_len) {
        frames.push(Frame::new(width, height, chunk.to_vec())?);
    }
    Ok(frames)
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}
