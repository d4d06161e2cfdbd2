use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    error::{ScrollcastError, ScrollcastResult},
    frame::{Frame, FrameBuffer},
    model::{RecordingResult, VideoConfig},
};

/// Assembly progress, observable for logging and tests.
///
/// `Idle -> FramesEncoded -> AudioMuxed | AudioSkipped -> Done`, with
/// `Failed` reachable from any state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssemblerState {
    Idle,
    FramesEncoded,
    AudioMuxed,
    AudioSkipped,
    Done,
    Failed,
}

/// Encodes a [`FrameBuffer`] into an MP4 and optionally muxes webcam audio
/// onto it, looping the audio to cover the full video duration.
///
/// Audio is best-effort: any muxing failure falls back to promoting the
/// silent base video as the final artifact. Video delivery takes priority
/// over audio correctness.
pub struct VideoAssembler {
    cfg: VideoConfig,
    state: AssemblerState,
}

impl VideoAssembler {
    pub fn new(cfg: VideoConfig) -> ScrollcastResult<Self> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            state: AssemblerState::Idle,
        })
    }

    pub fn state(&self) -> AssemblerState {
        self.state
    }

    /// Encode `frames` and write the final artifact at `final_path`.
    ///
    /// Intermediate files are written next to `final_path` and renamed into
    /// place only when complete, so no partial artifact ever lands at the
    /// final path. Temps are removed on success and on the audio fallback
    /// path.
    pub fn assemble(
        &mut self,
        frames: &FrameBuffer,
        audio_source: Option<&Path>,
        final_path: &Path,
    ) -> ScrollcastResult<RecordingResult> {
        let base_path = sibling_temp(final_path, "base");
        let result = self.assemble_inner(frames, audio_source, final_path, &base_path);
        if result.is_err() {
            self.state = AssemblerState::Failed;
            remove_temp(&base_path);
        }
        result
    }

    fn assemble_inner(
        &mut self,
        frames: &FrameBuffer,
        audio_source: Option<&Path>,
        final_path: &Path,
        base_path: &Path,
    ) -> ScrollcastResult<RecordingResult> {
        self.encode_base(frames, base_path)?;
        self.state = AssemblerState::FramesEncoded;

        let muxed = match audio_source {
            Some(src) => self.try_mux_audio(base_path, src, final_path),
            None => false,
        };
        if muxed {
            remove_temp(base_path);
            self.state = AssemblerState::AudioMuxed;
        } else {
            promote(base_path, final_path)?;
            self.state = AssemblerState::AudioSkipped;
        }

        self.state = AssemblerState::Done;
        let frame_count = frames.len() as u64;
        Ok(RecordingResult {
            path: final_path.to_path_buf(),
            frame_count,
            duration_secs: self.cfg.fps.frames_to_secs(frame_count),
            has_audio: muxed,
        })
    }

    /// Write the ordered frame sequence as a video at the configured frame
    /// rate.
    fn encode_base(&self, frames: &FrameBuffer, out_path: &Path) -> ScrollcastResult<()> {
        let Some((width, height)) = frames.dimensions() else {
            return Err(ScrollcastError::encode("no frames were captured"));
        };
        if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
            return Err(ScrollcastError::encode(format!(
                "frame dimensions {width}x{height} must be even (required for yuv420p mp4 output)"
            )));
        }

        let mut encoder = FrameEncoder::spawn(&self.cfg, width, height, out_path)?;
        for frame in frames.frames() {
            encoder.encode_frame(frame)?;
        }
        encoder.finish()
    }

    /// Mux looped audio from `audio_src` onto `base_path`, writing the result
    /// to `final_path`. Returns `false` (and logs) instead of failing when
    /// the source has no audio stream or the mux itself goes wrong.
    fn try_mux_audio(&self, base_path: &Path, audio_src: &Path, final_path: &Path) -> bool {
        match audio_stream_present(audio_src) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(src = %audio_src.display(), "audio source has no audio stream");
                return false;
            }
            Err(e) => {
                tracing::warn!(src = %audio_src.display(), error = %e, "audio probe failed, keeping silent video");
                return false;
            }
        }

        let mux_path = sibling_temp(final_path, "mux");
        match self.mux_audio(base_path, audio_src, &mux_path) {
            Ok(()) => match std::fs::rename(&mux_path, final_path) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to move muxed video into place, keeping silent video");
                    remove_temp(&mux_path);
                    false
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "audio mux failed, keeping silent video");
                remove_temp(&mux_path);
                false
            }
        }
    }

    fn mux_audio(&self, base_path: &Path, audio_src: &Path, out_path: &Path) -> ScrollcastResult<()> {
        // Loop-audio-to-fill: the audio input repeats indefinitely and
        // `-shortest` caps the result at the video's duration.
        let out = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(base_path)
            .args(["-stream_loop", "-1", "-i"])
            .arg(audio_src)
            .args([
                "-map",
                "0:v:0",
                "-map",
                "1:a:0",
                "-c:v",
                "copy",
                "-c:a",
                &self.cfg.audio_codec,
                "-shortest",
                "-movflags",
                "+faststart",
            ])
            .arg(out_path)
            .output()
            .map_err(|e| {
                ScrollcastError::audio_mux(format!("failed to run ffmpeg for audio mux: {e}"))
            })?;

        if !out.status.success() {
            return Err(ScrollcastError::audio_mux(format!(
                "ffmpeg mux exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(())
    }
}

/// Streams raw RGBA8 frames into a spawned `ffmpeg` process.
///
/// We intentionally use the system `ffmpeg` binary rather than linking
/// FFmpeg to avoid native dev header/lib requirements.
struct FrameEncoder {
    width: u32,
    height: u32,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FrameEncoder {
    fn spawn(
        cfg: &VideoConfig,
        width: u32,
        height: u32,
        out_path: &Path,
    ) -> ScrollcastResult<Self> {
        ensure_parent_dir(out_path)?;
        if !is_ffmpeg_on_path() {
            return Err(ScrollcastError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            &cfg.video_codec,
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(out_path);

        let mut child = cmd.spawn().map_err(|e| {
            ScrollcastError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScrollcastError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            width,
            height,
            child: Some(child),
            stdin: Some(stdin),
        })
    }

    fn encode_frame(&mut self, frame: &Frame) -> ScrollcastResult<()> {
        if frame.width != self.width || frame.height != self.height {
            return Err(ScrollcastError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ScrollcastError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            ScrollcastError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn finish(mut self) -> ScrollcastResult<()> {
        drop(self.stdin.take());
        let child = self
            .child
            .take()
            .ok_or_else(|| ScrollcastError::encode("ffmpeg encoder is already finalized"))?;

        let output = child.wait_with_output().map_err(|e| {
            ScrollcastError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScrollcastError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

impl Drop for FrameEncoder {
    fn drop(&mut self) {
        // Abandoned mid-encode: reap the child so no ffmpeg lingers.
        if let Some(mut child) = self.child.take() {
            drop(self.stdin.take());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Whether `path` carries at least one audio stream.
fn audio_stream_present(path: &Path) -> ScrollcastResult<bool> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=codec_type",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .map_err(|e| ScrollcastError::audio_mux(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ScrollcastError::audio_mux(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(!String::from_utf8_lossy(&out.stdout).trim().is_empty())
}

fn sibling_temp(final_path: &Path, tag: &str) -> PathBuf {
    let stem = final_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out");
    final_path.with_file_name(format!(".{stem}.{tag}.tmp.mp4"))
}

fn promote(from: &Path, to: &Path) -> ScrollcastResult<()> {
    use anyhow::Context as _;
    std::fs::rename(from, to).with_context(|| {
        format!(
            "failed to move '{}' into place at '{}'",
            from.display(),
            to.display()
        )
    })?;
    Ok(())
}

fn remove_temp(path: &Path) {
    if path.exists()
        && let Err(e) = std::fs::remove_file(path)
    {
        tracing::warn!(path = %path.display(), error = %e, "failed to remove temp file");
    }
}

pub fn ensure_parent_dir(path: &Path) -> ScrollcastResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembler_starts_idle() {
        let asm = VideoAssembler::new(VideoConfig::default()).unwrap();
        assert_eq!(asm.state(), AssemblerState::Idle);
    }

    #[test]
    fn empty_buffer_is_an_encode_error_and_fails_the_assembler() {
        let mut asm = VideoAssembler::new(VideoConfig::default()).unwrap();
        let err = asm
            .assemble(
                &FrameBuffer::new(),
                None,
                Path::new("target/assemble_empty/out.mp4"),
            )
            .unwrap_err();
        assert!(err.to_string().contains("encode error:"));
        assert_eq!(asm.state(), AssemblerState::Failed);
    }

    #[test]
    fn odd_dimensions_are_rejected_before_spawning() {
        let mut buf = FrameBuffer::new();
        buf.push(Frame::solid(3, 4, [0, 0, 0, 255]).unwrap()).unwrap();

        let mut asm = VideoAssembler::new(VideoConfig::default()).unwrap();
        let err = asm
            .assemble(&buf, None, Path::new("target/assemble_odd/out.mp4"))
            .unwrap_err();
        assert!(err.to_string().contains("must be even"));
        assert_eq!(asm.state(), AssemblerState::Failed);
    }

    #[test]
    fn temp_names_stay_next_to_the_final_artifact() {
        let t = sibling_temp(Path::new("static/captures/scroll_123.mp4"), "base");
        assert_eq!(
            t,
            Path::new("static/captures/.scroll_123.base.tmp.mp4")
        );
    }
}
