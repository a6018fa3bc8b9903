use std::time::Instant;

/// Frames-per-second meter based on the gap between consecutive frames.
#[derive(Debug, Default)]
pub struct FpsMeter {
    prev: Option<Instant>,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame at `now` and return the instantaneous rate.
    ///
    /// The first call has no previous timestamp and reports 0. Later calls
    /// report `floor(1 / elapsed_seconds)`, saturating for a zero interval.
    pub fn tick(&mut self, now: Instant) -> u32 {
        let fps = match self.prev {
            None => 0,
            Some(prev) => {
                let elapsed = now.saturating_duration_since(prev).as_secs_f64();
                if elapsed <= 0.0 {
                    u32::MAX
                } else {
                    (1.0 / elapsed).floor() as u32
                }
            }
        };
        self.prev = Some(now);
        fps
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_frame_reports_zero() {
        let mut meter = FpsMeter::new();
        assert_eq!(meter.tick(Instant::now()), 0);
    }

    #[test]
    fn later_frames_report_floored_reciprocal() {
        let mut meter = FpsMeter::new();
        let start = Instant::now();
        meter.tick(start);
        assert_eq!(meter.tick(start + Duration::from_millis(40)), 25);
        // 1 / 0.3 = 3.33
        let third = start + Duration::from_millis(340);
        assert_eq!(meter.tick(third), 3);
        assert_eq!(meter.tick(third + Duration::from_secs(2)), 0);
    }

    #[test]
    fn zero_interval_saturates() {
        let mut meter = FpsMeter::new();
        let now = Instant::now();
        meter.tick(now);
        assert_eq!(meter.tick(now), u32::MAX);
    }

    #[test]
    fn reset_forgets_previous_frame() {
        let mut meter = FpsMeter::new();
        let now = Instant::now();
        meter.tick(now);
        meter.reset();
        assert_eq!(meter.tick(now + Duration::from_millis(10)), 0);
    }
}
