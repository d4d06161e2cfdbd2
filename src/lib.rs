#![forbid(unsafe_code)]

pub mod assemble;
pub mod choreo;
pub mod error;
pub mod frame;
pub mod model;
pub mod navigate;
pub mod overlay;
pub mod session;
pub mod store;
pub mod track;
#[cfg(feature = "webdriver")]
pub mod webdriver;

pub use assemble::{AssemblerState, VideoAssembler};
pub use choreo::{Choreographer, ScrollPhase, ScrollScript, scroll_positions};
pub use error::{ScrollcastError, ScrollcastResult};
pub use frame::{Fps, Frame, FrameBuffer};
pub use model::{IndexingPolicy, OverlayPosition, OverlayShape, RecordingResult, VideoConfig};
pub use navigate::PageNavigator;
pub use overlay::{OverlaySettings, blend};
pub use session::{RecordingSession, load_webcam_or_disable};
pub use store::CaptureStore;
pub use track::WebcamTrack;
#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverNavigator;
