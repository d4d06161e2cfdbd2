use std::{path::Path, process::Command};

use scrollcast::{Frame, FrameBuffer, VideoAssembler, VideoConfig};

fn ffmpeg_tools_available() -> bool {
    let ffmpeg_ok = Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    let ffprobe_ok = Command::new("ffprobe")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    ffmpeg_ok && ffprobe_ok
}

fn probed_duration_secs(path: &Path) -> f64 {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .unwrap();
    assert!(out.status.success(), "ffprobe failed for {}", path.display());
    String::from_utf8_lossy(&out.stdout).trim().parse().unwrap()
}

fn stream_count(path: &Path, kind: &str) -> usize {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            kind,
            "-show_entries",
            "stream=codec_type",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .unwrap();
    assert!(out.status.success());
    String::from_utf8_lossy(&out.stdout).lines().count()
}

/// 1s clip with video and a 440Hz audio track, for mux tests.
fn synth_webcam(path: &Path) {
    let status = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=64x64:rate=30",
            "-f",
            "lavfi",
            "-i",
            "sine=frequency=440:sample_rate=48000",
            "-t",
            "1",
            "-pix_fmt",
            "yuv420p",
            "-c:v",
            "libx264",
            "-c:a",
            "aac",
        ])
        .arg(path)
        .status()
        .unwrap();
    assert!(status.success(), "ffmpeg failed creating synthetic webcam");
}

/// 1s clip with video only, for the audio-skip path.
fn synth_silent_clip(path: &Path) {
    let status = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-y",
            "-f",
            "lavfi",
            "-i",
            "testsrc=size=64x64:rate=30",
            "-t",
            "1",
            "-pix_fmt",
            "yuv420p",
            "-c:v",
            "libx264",
            "-an",
        ])
        .arg(path)
        .status()
        .unwrap();
    assert!(status.success(), "ffmpeg failed creating silent clip");
}

fn solid_frames(n: usize) -> FrameBuffer {
    let mut buf = FrameBuffer::new();
    for _ in 0..n {
        buf.push(Frame::solid(64, 48, [30, 60, 90, 255]).unwrap())
            .unwrap();
    }
    buf
}

fn no_temp_files_left(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().all(|e| {
        !e.unwrap()
            .file_name()
            .to_string_lossy()
            .contains(".tmp.mp4")
    })
}

#[test]
fn encode_duration_matches_frame_count_over_fps() {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not available");
        return;
    }
    let dir = Path::new("target").join("assemble_encode");
    std::fs::create_dir_all(&dir).unwrap();
    let out = dir.join("silent.mp4");

    let mut asm = VideoAssembler::new(VideoConfig::default()).unwrap();
    let result = asm.assemble(&solid_frames(40), None, &out).unwrap();

    assert_eq!(result.frame_count, 40);
    assert!(!result.has_audio);
    assert!(out.exists());
    // 40 frames at 20 fps, within one frame of 2 seconds.
    assert!((probed_duration_secs(&out) - 2.0).abs() <= 0.05 + 1e-9);
    assert_eq!(stream_count(&out, "a"), 0);
    assert!(no_temp_files_left(&dir));
}

#[test]
fn short_audio_is_looped_to_fill_the_video() {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not available");
        return;
    }
    let dir = Path::new("target").join("assemble_loop");
    std::fs::create_dir_all(&dir).unwrap();
    let webcam = dir.join("webcam.mp4");
    synth_webcam(&webcam);
    let out = dir.join("with_audio.mp4");

    // 60 frames at 20 fps: 3s of video against 1s of audio.
    let mut asm = VideoAssembler::new(VideoConfig::default()).unwrap();
    let result = asm.assemble(&solid_frames(60), Some(&webcam), &out).unwrap();

    assert!(result.has_audio);
    assert_eq!(stream_count(&out, "a"), 1);
    let video_d = 3.0;
    assert!((probed_duration_secs(&out) - video_d).abs() <= 0.15);

    // The looped audio stream covers the whole video, not just its first
    // second.
    let audio_d = {
        let o = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-select_streams",
                "a:0",
                "-show_entries",
                "stream=duration",
                "-of",
                "csv=p=0",
            ])
            .arg(&out)
            .output()
            .unwrap();
        String::from_utf8_lossy(&o.stdout)
            .trim()
            .parse::<f64>()
            .unwrap()
    };
    assert!(audio_d >= video_d - 0.2, "audio ends early at {audio_d}s");
    assert!(no_temp_files_left(&dir));
}

#[test]
fn source_without_audio_stream_promotes_the_silent_base() {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not available");
        return;
    }
    let dir = Path::new("target").join("assemble_skip");
    std::fs::create_dir_all(&dir).unwrap();
    let clip = dir.join("silent_clip.mp4");
    synth_silent_clip(&clip);
    let out = dir.join("promoted.mp4");

    let mut asm = VideoAssembler::new(VideoConfig::default()).unwrap();
    let result = asm.assemble(&solid_frames(20), Some(&clip), &out).unwrap();

    assert!(!result.has_audio);
    assert!(out.exists());
    assert_eq!(stream_count(&out, "a"), 0);
    assert_eq!(stream_count(&out, "v"), 1);
    assert!(no_temp_files_left(&dir));
}

#[test]
fn unreadable_audio_source_still_delivers_the_video() {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg/ffprobe not available");
        return;
    }
    let dir = Path::new("target").join("assemble_fallback");
    std::fs::create_dir_all(&dir).unwrap();
    let bogus = dir.join("bogus.mp4");
    std::fs::write(&bogus, b"this is not a media file").unwrap();
    let out = dir.join("fallback.mp4");

    let mut asm = VideoAssembler::new(VideoConfig::default()).unwrap();
    let result = asm.assemble(&solid_frames(20), Some(&bogus), &out).unwrap();

    assert!(!result.has_audio);
    assert!(out.exists());
    assert_eq!(stream_count(&out, "v"), 1);
    assert!(no_temp_files_left(&dir));
}
