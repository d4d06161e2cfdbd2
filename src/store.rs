use std::{
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context as _;

use crate::error::{ScrollcastError, ScrollcastResult};

/// On-disk layout for recordings and uploaded webcam sources.
///
/// Directories are created by the explicit [`CaptureStore::init`] call, never
/// as a side effect of loading the crate.
#[derive(Clone, Debug)]
pub struct CaptureStore {
    captures_dir: PathBuf,
    assets_dir: PathBuf,
}

impl CaptureStore {
    /// Create the store rooted at `root` (`<root>/captures`, `<root>/assets`),
    /// creating both directories.
    pub fn init(root: impl AsRef<Path>) -> ScrollcastResult<Self> {
        let root = root.as_ref();
        let captures_dir = root.join("captures");
        let assets_dir = root.join("assets");
        for dir in [&captures_dir, &assets_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
        }
        Ok(Self {
            captures_dir,
            assets_dir,
        })
    }

    pub fn captures_dir(&self) -> &Path {
        &self.captures_dir
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Output path for a new recording: `captures/scroll_<unixTimestamp>.mp4`.
    ///
    /// Two recordings landing in the same second collide; accepted
    /// limitation of the timestamp naming scheme.
    pub fn new_capture_path(&self) -> ScrollcastResult<PathBuf> {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ScrollcastError::validation(format!("system clock before epoch: {e}")))?
            .as_secs();
        Ok(self.captures_dir.join(format!("scroll_{ts}.mp4")))
    }

    /// Path of a previously stored webcam source, if it exists.
    pub fn webcam_path(&self, stored_name: &str) -> Option<PathBuf> {
        let path = self.assets_dir.join(sanitize_filename(stored_name)?);
        path.exists().then_some(path)
    }

    /// Persist an uploaded webcam source under a sanitized name and return
    /// the stored name.
    pub fn store_webcam(&self, filename: &str, bytes: &[u8]) -> ScrollcastResult<String> {
        let name = sanitize_filename(filename).ok_or_else(|| {
            ScrollcastError::validation(format!(
                "webcam filename '{filename}' is empty after sanitization"
            ))
        })?;
        let path = self.assets_dir.join(&name);
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write webcam source '{}'", path.display()))?;
        Ok(name)
    }
}

/// Reduce an untrusted filename to a safe flat name: directory components are
/// stripped, characters outside `[A-Za-z0-9._-]` are replaced with `_`, and
/// leading dots are dropped. Returns `None` when nothing safe remains.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_' || c == '-') {
        return None;
    }
    Some(cleaned)
}
