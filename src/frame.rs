use crate::error::{ScrollcastError, ScrollcastResult};

/// One RGBA8 bitmap sample of either the recorded page or the webcam source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8, `width * height * 4` bytes.
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> ScrollcastResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScrollcastError::validation(
                "frame width/height must be non-zero",
            ));
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ScrollcastError::validation(format!(
                "frame data size mismatch: got {} bytes, expected {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Opaque single-color frame, used by tests and fallback paths.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ScrollcastResult<Self> {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self::new(width, height, data)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[off],
            self.data[off + 1],
            self.data[off + 2],
            self.data[off + 3],
        ])
    }
}

/// Output frames-per-second as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> ScrollcastResult<Self> {
        if den == 0 {
            return Err(ScrollcastError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ScrollcastError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }
}

/// Append-only ordered sequence of frames representing the final video in
/// playback order. All frames must share the dimensions of the first one.
#[derive(Clone, Debug, Default)]
pub struct FrameBuffer {
    frames: Vec<Frame>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) -> ScrollcastResult<()> {
        if let Some(first) = self.frames.first()
            && (frame.width != first.width || frame.height != first.height)
        {
            return Err(ScrollcastError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, first.width, first.height
            )));
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Dimensions of the buffered frames, `None` while empty.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| (f.width, f.height))
    }

    pub fn duration_secs(&self, fps: Fps) -> f64 {
        fps.frames_to_secs(self.frames.len() as u64)
    }
}
