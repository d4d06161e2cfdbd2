use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use scrollcast::{
    CaptureStore, IndexingPolicy, OverlayPosition, OverlaySettings, OverlayShape,
    RecordingSession, ScrollScript, VideoConfig, load_webcam_or_disable,
};

#[derive(Parser, Debug)]
#[command(name = "scrollcast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a scrolling walkthrough of a web page as an MP4 (requires
    /// `ffmpeg` on PATH and a running WebDriver).
    Capture(CaptureArgs),
    /// Store a webcam source file under a sanitized name for later captures.
    UploadWebcam(UploadArgs),
}

#[derive(Parser, Debug)]
struct CaptureArgs {
    /// Page to record.
    #[arg(long)]
    url: String,

    /// Store root; recordings land in `<root>/captures`.
    #[arg(long, default_value = "static")]
    root: PathBuf,

    /// Webcam source: a path, or the stored name of an uploaded file.
    #[arg(long)]
    webcam: Option<String>,

    /// Overlay corner.
    #[arg(long, value_enum, default_value_t = PositionChoice::BottomRight)]
    position: PositionChoice,

    /// Overlay mask shape.
    #[arg(long, value_enum, default_value_t = ShapeChoice::Circle)]
    shape: ShapeChoice,

    /// Webcam frame selection policy.
    #[arg(long, value_enum, default_value_t = PolicyChoice::Cyclic)]
    policy: PolicyChoice,

    /// Output frame rate.
    #[arg(long, default_value_t = 20)]
    fps: u32,

    /// Capture viewport width (must be even).
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Capture viewport height (must be even).
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// WebDriver endpoint to drive the browser through.
    #[arg(long, default_value = "http://localhost:4444")]
    webdriver_url: String,
}

#[derive(Parser, Debug)]
struct UploadArgs {
    /// File to store.
    #[arg(long)]
    file: PathBuf,

    /// Store root; sources land in `<root>/assets`.
    #[arg(long, default_value = "static")]
    root: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PositionChoice {
    BottomRight,
    BottomLeft,
    TopRight,
    TopLeft,
}

impl From<PositionChoice> for OverlayPosition {
    fn from(v: PositionChoice) -> Self {
        match v {
            PositionChoice::BottomRight => OverlayPosition::BottomRight,
            PositionChoice::BottomLeft => OverlayPosition::BottomLeft,
            PositionChoice::TopRight => OverlayPosition::TopRight,
            PositionChoice::TopLeft => OverlayPosition::TopLeft,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ShapeChoice {
    Circle,
    RoundedRect,
}

impl From<ShapeChoice> for OverlayShape {
    fn from(v: ShapeChoice) -> Self {
        match v {
            ShapeChoice::Circle => OverlayShape::Circle,
            ShapeChoice::RoundedRect => OverlayShape::RoundedRect,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyChoice {
    Cyclic,
    DurationMatched,
}

impl From<PolicyChoice> for IndexingPolicy {
    fn from(v: PolicyChoice) -> Self {
        match v {
            PolicyChoice::Cyclic => IndexingPolicy::Cyclic,
            PolicyChoice::DurationMatched => IndexingPolicy::DurationMatched,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Capture(args) => cmd_capture(args),
        Command::UploadWebcam(args) => cmd_upload(args),
    }
}

fn cmd_capture(args: CaptureArgs) -> anyhow::Result<()> {
    let store = CaptureStore::init(&args.root)?;

    let webcam_path = args.webcam.as_deref().and_then(|name| {
        let direct = PathBuf::from(name);
        if direct.exists() {
            Some(direct)
        } else {
            store.webcam_path(name)
        }
    });
    let track = load_webcam_or_disable(webcam_path.as_deref(), args.policy.into());

    let config = VideoConfig {
        fps: scrollcast::Fps::new(args.fps, 1)?,
        viewport_width: args.width,
        viewport_height: args.height,
        ..VideoConfig::default()
    };
    let overlay = OverlaySettings {
        position: args.position.into(),
        shape: args.shape.into(),
        ..OverlaySettings::default()
    };

    let session = RecordingSession::new(config, ScrollScript::default(), overlay, track)?;
    let out_path = store.new_capture_path()?;

    let mut nav = make_navigator(&args, &session)?;
    let result = session.record(nav.as_mut(), &args.url, &out_path)?;

    println!(
        "{}",
        serde_json::json!({
            "video_path": result.path,
            "frames": result.frame_count,
            "duration_secs": result.duration_secs,
            "has_audio": result.has_audio,
        })
    );
    Ok(())
}

#[cfg(feature = "webdriver")]
fn make_navigator(
    args: &CaptureArgs,
    session: &RecordingSession,
) -> anyhow::Result<Box<dyn scrollcast::PageNavigator>> {
    let nav = scrollcast::WebDriverNavigator::connect(
        &args.webdriver_url,
        session.config().viewport_width,
        session.config().viewport_height,
    )?;
    Ok(Box::new(nav))
}

#[cfg(not(feature = "webdriver"))]
fn make_navigator(
    _args: &CaptureArgs,
    _session: &RecordingSession,
) -> anyhow::Result<Box<dyn scrollcast::PageNavigator>> {
    anyhow::bail!(
        "this build has no browser backend; rebuild with `--features webdriver` \
         and start a WebDriver (e.g. chromedriver)"
    )
}

fn cmd_upload(args: UploadArgs) -> anyhow::Result<()> {
    let store = CaptureStore::init(&args.root)?;
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("read webcam source '{}'", args.file.display()))?;
    let original = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .context("webcam source has no usable file name")?;
    let stored = store.store_webcam(original, &bytes)?;

    println!("{}", serde_json::json!({ "filename": stored }));
    Ok(())
}
