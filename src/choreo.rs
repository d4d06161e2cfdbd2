use std::time::Duration;

use crate::{
    error::{ScrollcastError, ScrollcastResult},
    frame::Frame,
    navigate::{PageNavigator, decode_screenshot},
};

/// Named segment of the fixed pause/scroll timeline. Phases execute strictly
/// in declaration order exactly once per recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollPhase {
    InitialPause,
    ScrollDown,
    MidPause,
    ScrollUp,
    FinalPause,
}

/// Tunables for the scripted scroll-and-pause timeline.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ScrollScript {
    /// Samples held at the top before scrolling starts.
    pub initial_pause_frames: u32,
    /// Discrete steps per scroll leg; each leg yields `scroll_steps + 1` samples.
    pub scroll_steps: u32,
    /// Samples held at the scroll target.
    pub mid_pause_frames: u32,
    /// Samples held at the top after scrolling back.
    pub final_pause_frames: u32,
    /// Scroll target as a fraction of total page height.
    pub target_fraction: f64,
    /// Settle delay between issuing a scroll command and sampling, to let
    /// layout/paint catch up. Shorter risks capturing mid-paint frames.
    pub step_delay: Duration,
    pub navigation_timeout: Duration,
}

impl Default for ScrollScript {
    fn default() -> Self {
        Self {
            initial_pause_frames: 10,
            scroll_steps: 20,
            mid_pause_frames: 20,
            final_pause_frames: 10,
            target_fraction: 0.5,
            step_delay: Duration::from_millis(50),
            navigation_timeout: Duration::from_secs(30),
        }
    }
}

impl ScrollScript {
    pub fn validate(&self) -> ScrollcastResult<()> {
        if self.scroll_steps == 0 {
            return Err(ScrollcastError::validation("scroll_steps must be > 0"));
        }
        if !(self.target_fraction > 0.0 && self.target_fraction <= 1.0) {
            return Err(ScrollcastError::validation(
                "target_fraction must be in (0, 1]",
            ));
        }
        Ok(())
    }

    /// Total number of samples a run will produce: two pause blocks around
    /// two `steps + 1` legs and the mid pause.
    pub fn total_samples(&self) -> u64 {
        u64::from(self.initial_pause_frames)
            + 2 * (u64::from(self.scroll_steps) + 1)
            + u64::from(self.mid_pause_frames)
            + u64::from(self.final_pause_frames)
    }

    /// The full phase plan for a page of height `page_height`, as scroll
    /// positions per phase.
    pub fn phase_plan(&self, page_height: f64) -> Vec<(ScrollPhase, Vec<f64>)> {
        let target = page_height.max(0.0) * self.target_fraction;
        vec![
            (
                ScrollPhase::InitialPause,
                vec![0.0; self.initial_pause_frames as usize],
            ),
            (
                ScrollPhase::ScrollDown,
                scroll_positions(0.0, target, self.scroll_steps),
            ),
            (
                ScrollPhase::MidPause,
                vec![target; self.mid_pause_frames as usize],
            ),
            (
                ScrollPhase::ScrollUp,
                scroll_positions(target, 0.0, self.scroll_steps),
            ),
            (
                ScrollPhase::FinalPause,
                vec![0.0; self.final_pause_frames as usize],
            ),
        ]
    }
}

/// Linear interpolation of scroll positions from `start` to `end` in `steps`
/// discrete steps, inclusive on both ends: exactly `steps + 1` samples.
pub fn scroll_positions(start: f64, end: f64, steps: u32) -> Vec<f64> {
    if steps == 0 {
        return vec![start];
    }
    let mut out = Vec::with_capacity(steps as usize + 1);
    for i in 0..=steps {
        out.push(start + (end - start) * f64::from(i) / f64::from(steps));
    }
    // Endpoints must be exact regardless of float accumulation.
    out[0] = start;
    out[steps as usize] = end;
    out
}

/// Drives the page-navigation capability through the scripted timeline,
/// feeding decoded samples to `sink` in strictly increasing index order.
///
/// Each run re-drives the live page; the sequence is finite and
/// non-restartable.
pub struct Choreographer {
    script: ScrollScript,
}

impl Choreographer {
    pub fn new(script: ScrollScript) -> ScrollcastResult<Self> {
        script.validate()?;
        Ok(Self { script })
    }

    pub fn script(&self) -> &ScrollScript {
        &self.script
    }

    /// Navigate to `url`, run the phase timeline, and push every sampled
    /// frame into `sink`. Returns the number of samples produced.
    pub fn run(
        &self,
        nav: &mut dyn PageNavigator,
        url: &str,
        sink: &mut dyn FnMut(u64, Frame) -> ScrollcastResult<()>,
    ) -> ScrollcastResult<u64> {
        let page_height = nav.navigate(url, self.script.navigation_timeout)?;
        tracing::debug!(url, page_height, "page loaded, starting scroll timeline");

        let mut idx: u64 = 0;
        for (phase, positions) in self.script.phase_plan(page_height) {
            tracing::trace!(?phase, samples = positions.len(), "entering phase");
            for pos in positions {
                if matches!(phase, ScrollPhase::ScrollDown | ScrollPhase::ScrollUp) {
                    nav.scroll_to(pos)?;
                }
                if !self.script.step_delay.is_zero() {
                    std::thread::sleep(self.script.step_delay);
                }
                let bytes = nav.screenshot()?;
                let frame = decode_screenshot(&bytes)?;
                sink(idx, frame)?;
                idx += 1;
            }
        }
        Ok(idx)
    }
}
