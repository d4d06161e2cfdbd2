use image::{RgbaImage, imageops};

use crate::{
    error::{ScrollcastError, ScrollcastResult},
    frame::Frame,
    model::{OverlayPosition, OverlayShape},
};

/// Placement and shaping rules for the webcam picture-in-picture overlay.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct OverlaySettings {
    pub position: OverlayPosition,
    pub shape: OverlayShape,
    /// Overlay width as a fraction of the primary frame's width, keeping the
    /// overlay resolution-independent.
    pub width_fraction: f64,
    /// Padding between the overlay and the anchored frame corner.
    pub margin_px: u32,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            position: OverlayPosition::default(),
            shape: OverlayShape::default(),
            width_fraction: 0.25,
            margin_px: 20,
        }
    }
}

impl OverlaySettings {
    pub fn validate(&self) -> ScrollcastResult<()> {
        if !(self.width_fraction > 0.0 && self.width_fraction <= 1.0) {
            return Err(ScrollcastError::validation(
                "overlay width_fraction must be in (0, 1]",
            ));
        }
        Ok(())
    }
}

/// Blend `secondary` onto `primary` at the configured corner with the
/// configured shape mask. With no secondary frame this is a no-op clone of
/// the primary. Never fails on out-of-range placement: the overlay box is
/// clamped into the frame and per-pixel bounds are guarded.
pub fn blend(
    primary: &Frame,
    secondary: Option<&Frame>,
    settings: &OverlaySettings,
) -> ScrollcastResult<Frame> {
    settings.validate()?;
    let Some(secondary) = secondary else {
        return Ok(primary.clone());
    };

    let (ow, oh) = overlay_size(primary, settings);
    if ow == 0 || oh == 0 {
        return Ok(primary.clone());
    }

    let overlay = fit_secondary(secondary, settings.shape, ow, oh)?;
    let mask = shape_mask(settings.shape, ow, oh);
    let (x0, y0) = overlay_origin(primary, ow, oh, settings.position, settings.margin_px);

    let mut out = primary.clone();
    let pw = out.width as usize;
    let ph = out.height as usize;
    for oy in 0..oh as usize {
        let py = y0 as usize + oy;
        if py >= ph {
            break;
        }
        for ox in 0..ow as usize {
            let px = x0 as usize + ox;
            if px >= pw {
                break;
            }
            if mask[oy * ow as usize + ox] == 0 {
                continue;
            }
            let s_off = (oy * ow as usize + ox) * 4;
            let d_off = (py * pw + px) * 4;
            let a = u16::from(overlay.data[s_off + 3]);
            if a == 255 {
                out.data[d_off..d_off + 3].copy_from_slice(&overlay.data[s_off..s_off + 3]);
            } else {
                // Linear alpha blend for sources carrying transparency.
                let inv = 255 - a;
                for c in 0..3 {
                    let s = u16::from(overlay.data[s_off + c]);
                    let d = u16::from(out.data[d_off + c]);
                    out.data[d_off + c] =
                        (mul_div255(s, a) + mul_div255(d, inv)).min(255) as u8;
                }
            }
            out.data[d_off + 3] = 255;
        }
    }
    Ok(out)
}

/// Target overlay dimensions for a primary frame, clamped so the overlay can
/// never exceed the frame itself.
fn overlay_size(primary: &Frame, settings: &OverlaySettings) -> (u32, u32) {
    let w = ((f64::from(primary.width) * settings.width_fraction).round() as u32).max(1);
    match settings.shape {
        OverlayShape::Circle => {
            let d = w.min(primary.width).min(primary.height);
            (d, d)
        }
        OverlayShape::RoundedRect => {
            let h = (w * 3 / 4).max(1);
            (w.min(primary.width), h.min(primary.height))
        }
    }
}

/// Resize/crop the secondary frame to the target overlay size.
///
/// Circle overlays center-crop the longer axis to a square first; rectangular
/// overlays resize directly (aspect may distort).
fn fit_secondary(
    secondary: &Frame,
    shape: OverlayShape,
    ow: u32,
    oh: u32,
) -> ScrollcastResult<Frame> {
    let img = RgbaImage::from_raw(secondary.width, secondary.height, secondary.data.clone())
        .ok_or_else(|| ScrollcastError::validation("secondary frame buffer is malformed"))?;

    let img = match shape {
        OverlayShape::Circle => {
            let side = secondary.width.min(secondary.height);
            let x0 = (secondary.width - side) / 2;
            let y0 = (secondary.height - side) / 2;
            imageops::crop_imm(&img, x0, y0, side, side).to_image()
        }
        OverlayShape::RoundedRect => img,
    };

    let resized = imageops::resize(&img, ow, oh, imageops::FilterType::Triangle);
    Frame::new(ow, oh, resized.into_raw())
}

/// Binary mask selecting which overlay pixels replace the base image:
/// a filled circle, or a rectangle with quarter-circle corners.
fn shape_mask(shape: OverlayShape, w: u32, h: u32) -> Vec<u8> {
    let mut mask = vec![0u8; w as usize * h as usize];
    match shape {
        OverlayShape::Circle => {
            let cx = (f64::from(w) - 1.0) / 2.0;
            let cy = (f64::from(h) - 1.0) / 2.0;
            let r = f64::from(w.min(h)) / 2.0;
            for y in 0..h {
                for x in 0..w {
                    let dx = f64::from(x) - cx;
                    let dy = f64::from(y) - cy;
                    if dx * dx + dy * dy <= r * r {
                        mask[(y * w + x) as usize] = 255;
                    }
                }
            }
        }
        OverlayShape::RoundedRect => {
            let r = w.min(h) / 4;
            for y in 0..h {
                for x in 0..w {
                    if rounded_rect_contains(x, y, w, h, r) {
                        mask[(y * w + x) as usize] = 255;
                    }
                }
            }
        }
    }
    mask
}

fn rounded_rect_contains(x: u32, y: u32, w: u32, h: u32, r: u32) -> bool {
    if r == 0 {
        return true;
    }
    // Inside the cross formed by the two inner rectangles.
    let in_x_band = x >= r && x < w - r;
    let in_y_band = y >= r && y < h - r;
    if in_x_band || in_y_band {
        return true;
    }
    // Corner regions: inside the quarter circle around the nearest inner
    // corner center.
    let cx = if x < r { r } else { w - 1 - r };
    let cy = if y < r { r } else { h - 1 - r };
    let dx = f64::from(x) - f64::from(cx);
    let dy = f64::from(y) - f64::from(cy);
    dx * dx + dy * dy <= f64::from(r) * f64::from(r)
}

/// Top-left corner of the overlay box, clamped so the box stays inside the
/// primary frame even when margin plus overlay exceed the frame.
fn overlay_origin(
    primary: &Frame,
    ow: u32,
    oh: u32,
    position: OverlayPosition,
    margin: u32,
) -> (u32, u32) {
    let max_x = primary.width.saturating_sub(ow);
    let max_y = primary.height.saturating_sub(oh);
    let (x, y) = match position {
        OverlayPosition::BottomRight => (
            i64::from(primary.width) - i64::from(ow) - i64::from(margin),
            i64::from(primary.height) - i64::from(oh) - i64::from(margin),
        ),
        OverlayPosition::BottomLeft => (
            i64::from(margin),
            i64::from(primary.height) - i64::from(oh) - i64::from(margin),
        ),
        OverlayPosition::TopRight => (
            i64::from(primary.width) - i64::from(ow) - i64::from(margin),
            i64::from(margin),
        ),
        OverlayPosition::TopLeft => (i64::from(margin), i64::from(margin)),
    };
    (
        x.clamp(0, i64::from(max_x)) as u32,
        y.clamp(0, i64::from(max_y)) as u32,
    )
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}
