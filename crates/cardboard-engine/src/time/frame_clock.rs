use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds (clamped).
    pub dt: f32,

    /// Time since the clock was created, in seconds (unclamped).
    pub elapsed: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped so a stall (debugger, minimized window) does not
/// produce a pathological `dt`.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_counts_from_zero() {
        let mut clock = FrameClock::new();
        let base = clock.start;
        assert_eq!(clock.tick_at(base + Duration::from_millis(16)).frame_index, 0);
        assert_eq!(clock.tick_at(base + Duration::from_millis(32)).frame_index, 1);
    }

    #[test]
    fn long_stall_is_clamped() {
        let mut clock = FrameClock::new();
        let base = clock.start;
        let ft = clock.tick_at(base + Duration::from_secs(5));
        assert!((ft.dt - 0.25).abs() < 1e-6);
        assert!((ft.elapsed - 5.0).abs() < 1e-3);
    }

    #[test]
    fn zero_delta_is_raised_to_minimum() {
        let mut clock = FrameClock::new();
        let base = clock.start;
        let ft = clock.tick_at(base);
        assert!(ft.dt > 0.0);
    }
}
