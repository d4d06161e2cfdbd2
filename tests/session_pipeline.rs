use std::time::Duration;

use scrollcast::{
    Fps, Frame, IndexingPolicy, OverlaySettings, PageNavigator, RecordingSession, ScrollScript,
    ScrollcastResult, VideoConfig, WebcamTrack,
};

/// Fake browser: renders a vertical gradient that shifts with the scroll
/// position, so samples taken at different offsets are distinguishable.
struct GradientNav {
    page_height: f64,
    scroll_y: f64,
    closed: bool,
}

impl GradientNav {
    fn new(page_height: f64) -> Self {
        Self {
            page_height,
            scroll_y: 0.0,
            closed: false,
        }
    }
}

impl PageNavigator for GradientNav {
    fn navigate(&mut self, _url: &str, _timeout: Duration) -> ScrollcastResult<f64> {
        Ok(self.page_height)
    }

    fn scroll_to(&mut self, y: f64) -> ScrollcastResult<()> {
        self.scroll_y = y;
        Ok(())
    }

    fn screenshot(&mut self) -> ScrollcastResult<Vec<u8>> {
        let mut img = image::RgbaImage::new(64, 48);
        for (_, y, px) in img.enumerate_pixels_mut() {
            let v = ((self.scroll_y + f64::from(y)) % 256.0) as u8;
            *px = image::Rgba([v, v, v, 255]);
        }
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        Ok(bytes)
    }

    fn close(&mut self) -> ScrollcastResult<()> {
        self.closed = true;
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn fast_session(track: WebcamTrack) -> RecordingSession {
    let config = VideoConfig {
        viewport_width: 64,
        viewport_height: 48,
        ..VideoConfig::default()
    };
    let script = ScrollScript {
        step_delay: Duration::ZERO,
        ..ScrollScript::default()
    };
    RecordingSession::new(config, script, OverlaySettings::default(), track).unwrap()
}

#[test]
fn default_scenario_yields_82_frames_of_4_1_seconds() {
    init_tracing();
    let session = fast_session(WebcamTrack::empty(IndexingPolicy::Cyclic));
    let mut nav = GradientNav::new(1000.0);

    let buffer = session.capture(&mut nav, "http://example.com").unwrap();
    assert_eq!(buffer.len(), 82);
    let duration = buffer.duration_secs(Fps::new(20, 1).unwrap());
    assert!((duration - 4.1).abs() < 1e-9);
    assert!(nav.closed);
}

#[test]
fn scrolling_actually_changes_the_sampled_frames() {
    init_tracing();
    let session = fast_session(WebcamTrack::empty(IndexingPolicy::Cyclic));
    let mut nav = GradientNav::new(1000.0);

    let buffer = session.capture(&mut nav, "http://example.com").unwrap();
    let frames = buffer.frames();

    // Initial pause at the top vs. mid pause at half height.
    let top = &frames[0];
    let mid = &frames[40];
    assert_ne!(top.pixel(0, 0), mid.pixel(0, 0));
    // The timeline returns to the top for the final pause.
    let last = frames.last().unwrap();
    assert_eq!(top.pixel(0, 0), last.pixel(0, 0));
}

#[test]
fn cyclic_webcam_track_cycles_across_the_capture() {
    init_tracing();
    // Three distinguishable webcam frames; at 82 output frames every one of
    // them must appear, in rotation, at the overlay center.
    let webcam: Vec<Frame> = (0u8..3)
        .map(|i| Frame::solid(32, 32, [100 + i, 0, 0, 255]).unwrap())
        .collect();
    let track = WebcamTrack::from_frames(webcam, Fps::new(30, 1).unwrap(), IndexingPolicy::Cyclic);
    let session = fast_session(track);
    let mut nav = GradientNav::new(1000.0);

    let buffer = session.capture(&mut nav, "http://example.com").unwrap();
    // Overlay: 16px circle, bottom-right, 20px margin. Probe its center.
    let cx = 64 - 20 - 8;
    let cy = 48 - 20 - 8;
    for (i, frame) in buffer.frames().iter().enumerate() {
        let expect = 100 + (i % 3) as u8;
        assert_eq!(frame.pixel(cx, cy), Some([expect, 0, 0, 255]), "frame {i}");
    }
}
