//! Fixed-timestep clock.
//!
//! Wall-clock time is measured as `f64` seconds but accumulated in integer
//! microseconds, so every simulation step is exactly `FIXED_DT_US` long and
//! the gameplay clock never drifts from the timers it drives.

use std::time::Instant;

const FPS_SAMPLE_COUNT: usize = 60;

/// Fixed simulation step in integer microseconds. Gameplay clocks and timers
/// advance by exactly this much per step so runs replay identically.
pub const FIXED_DT_US: u64 = 16_667;

/// Longest wall-clock gap fed into the accumulator in one frame.
pub const MAX_FRAME_US: u64 = 250_000;

pub struct TimeState {
    accumulator_us: u64,
    /// Simulated time, always a whole number of steps.
    pub sim_time_us: u64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,
    /// Fraction of a step left in the accumulator after the last frame.
    pub interpolation_alpha: f64,

    frame_samples_us: [u64; FPS_SAMPLE_COUNT],
    sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new() -> Self {
        Self {
            accumulator_us: 0,
            sim_time_us: 0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
            interpolation_alpha: 0.0,
            frame_samples_us: [FIXED_DT_US; FPS_SAMPLE_COUNT],
            sample_index: 0,
            smoothed_fps: 1_000_000.0 / FIXED_DT_US as f64,
            smoothed_frame_time_ms: FIXED_DT_US as f64 / 1000.0,
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.accumulate(real_dt);
    }

    /// Feed a measured wall-clock delta (seconds) into the accumulator.
    pub fn accumulate(&mut self, real_dt: f64) {
        let mut frame_us = (real_dt.max(0.0) * 1_000_000.0).round() as u64;
        if frame_us > MAX_FRAME_US {
            log::warn!(
                "Frame took {:.1}ms, capping to {}ms",
                real_dt * 1000.0,
                MAX_FRAME_US / 1000
            );
            frame_us = MAX_FRAME_US;
        }
        self.real_dt = frame_us as f64 / 1_000_000.0;
        self.accumulator_us += frame_us;
        self.steps_this_frame = 0;
        self.frame_count += 1;

        self.frame_samples_us[self.sample_index] = frame_us;
        self.sample_index = (self.sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_us = self.frame_samples_us.iter().sum::<u64>() as f64 / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_us / 1000.0;
        self.smoothed_fps = if avg_us > 0.0 {
            1_000_000.0 / avg_us
        } else {
            0.0
        };
    }

    /// Consumes one fixed step from the accumulator if enough time is banked.
    pub fn should_step(&mut self) -> bool {
        if self.accumulator_us < FIXED_DT_US {
            return false;
        }
        self.accumulator_us -= FIXED_DT_US;
        self.sim_time_us += FIXED_DT_US;
        self.fixed_step_count += 1;
        self.steps_this_frame += 1;
        true
    }

    pub fn end_frame(&mut self) {
        self.interpolation_alpha = self.accumulator_us as f64 / FIXED_DT_US as f64;
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP_SECS: f64 = FIXED_DT_US as f64 / 1_000_000.0;

    #[test]
    fn two_fixed_steps_fit_in_two_steps_of_time() {
        let mut time = TimeState::new();
        time.accumulate(2.0 * STEP_SECS + 0.001);
        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        assert_eq!(steps, 2);
        assert_eq!(time.steps_this_frame, 2);
        assert_eq!(time.sim_time_us, 2 * FIXED_DT_US);
    }

    #[test]
    fn short_frame_produces_no_step() {
        let mut time = TimeState::new();
        time.accumulate(STEP_SECS * 0.5);
        assert!(!time.should_step());
        time.end_frame();
        assert!(time.interpolation_alpha > 0.4 && time.interpolation_alpha < 0.6);
    }

    #[test]
    fn long_frame_is_capped() {
        let mut time = TimeState::new();
        time.accumulate(5.0);
        assert_eq!(time.real_dt, 0.25);
        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        // 250_000 / 16_667 rounds down to 14.
        assert_eq!(steps, 14);
    }

    #[test]
    fn leftover_time_carries_into_the_next_frame() {
        let mut time = TimeState::new();
        time.accumulate(STEP_SECS * 0.6);
        assert!(!time.should_step());
        time.accumulate(STEP_SECS * 0.6);
        assert!(time.should_step());
        assert!(!time.should_step());
        assert_eq!(time.fixed_step_count, 1);
    }
}
