use std::time::{Duration, Instant};

/// Wall-clock frame timer for real-time playback.
pub struct Time {
    start: Instant,
    last: Instant,
    pub delta: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now, delta: Duration::ZERO }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last;
        self.last = now;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.last.duration_since(self.start).as_secs_f32()
    }

    /// Sleeps off whatever remains of a `frame` since the last tick.
    pub fn pace(&self, frame: Duration) {
        let spent = self.last.elapsed();
        if spent < frame {
            std::thread::sleep(frame - spent);
        }
    }
}
