use std::time::Duration;

use crate::{
    error::{ScrollcastError, ScrollcastResult},
    frame::Frame,
};

/// Page-navigation capability the choreographer drives.
///
/// Implementations wrap a live browser (see the `webdriver` feature). The
/// trait is synchronous; the capture pipeline is fully sequential per
/// recording and blocks on every call.
pub trait PageNavigator {
    /// Load `url` and wait for it to settle, returning the total scrollable
    /// page height in CSS pixels. Fails with a navigation error on timeout
    /// or network failure.
    fn navigate(&mut self, url: &str, timeout: Duration) -> ScrollcastResult<f64>;

    /// Scroll the viewport so its top edge is at `y` pixels.
    fn scroll_to(&mut self, y: f64) -> ScrollcastResult<()>;

    /// Capture the current viewport as encoded image bytes (PNG or similar).
    fn screenshot(&mut self) -> ScrollcastResult<Vec<u8>>;

    /// Release the underlying browser session. Called on every exit path,
    /// including mid-capture failures; must be safe to call once.
    fn close(&mut self) -> ScrollcastResult<()>;
}

/// Decode screenshot bytes into an RGBA8 [`Frame`].
pub fn decode_screenshot(bytes: &[u8]) -> ScrollcastResult<Frame> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ScrollcastError::capture(format!("failed to decode screenshot: {e}")))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Frame::new(width, height, img.into_raw())
        .map_err(|e| ScrollcastError::capture(format!("decoded screenshot is malformed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_roundtrips_png() {
        let img = image::RgbaImage::from_pixel(6, 4, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();

        let frame = decode_screenshot(&bytes).unwrap();
        assert_eq!((frame.width, frame.height), (6, 4));
        assert_eq!(frame.pixel(0, 0), Some([10, 20, 30, 255]));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_screenshot(&[0u8, 1, 2, 3]).unwrap_err();
        assert!(err.to_string().contains("capture error:"));
    }
}
