//! Frame rate measurement

use instant::Instant;

/// Weight of the newest frame in the running average
const SMOOTHING: f64 = 0.1;

/// Measures the time between `start_render` and `done_render` and keeps an
/// exponentially smoothed frames-per-second estimate.
///
/// [`FpsCounter::frame`] calls them in reverse so the measured span is the
/// whole interval between displayed frames.
#[derive(Debug, Default)]
pub struct FpsCounter {
    started: Option<Instant>,
    smoothed_seconds: Option<f64>,
    frames: u64,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_render(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn done_render(&mut self) {
        if let Some(started) = self.started.take() {
            self.record(started.elapsed().as_secs_f64());
        }
    }

    /// Mark the start of a displayed frame, closing the previous interval
    pub fn frame(&mut self) {
        self.done_render();
        self.start_render();
    }

    fn record(&mut self, seconds: f64) {
        self.smoothed_seconds = Some(match self.smoothed_seconds {
            Some(avg) => avg + SMOOTHING * (seconds - avg),
            None => seconds,
        });
        self.frames += 1;
    }

    /// Smoothed frames per second; zero before the first frame
    pub fn fps(&self) -> f64 {
        match self.smoothed_seconds {
            Some(s) if s > 0.0 => 1.0 / s,
            _ => 0.0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
