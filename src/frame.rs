//! Frame timing and the two-state render loop.

use std::time::{Duration, Instant};

/// What the window reported this iteration, reduced to what the loop cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    CloseRequested,
    EscapePressed,
    OtherKeyPressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Closing,
}

impl LoopState {
    /// Closing is terminal: nothing brings the loop back to `Running`.
    pub fn on(self, signal: Signal) -> LoopState {
        match (self, signal) {
            (LoopState::Closing, _) => LoopState::Closing,
            (LoopState::Running, Signal::CloseRequested) | (LoopState::Running, Signal::EscapePressed) => LoopState::Closing,
            (LoopState::Running, Signal::OtherKeyPressed) => LoopState::Running,
        }
    }
}

/// Everything a demo needs to know to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// Framebuffer size in physical pixels, re-queried every frame.
    pub width: u32,
    pub height: u32,
    /// Seconds since the clock started.
    pub time: f32,
    /// Seconds since the previous frame, clamped.
    pub dt: f32,
    pub index: u64,
}

impl Frame {
    /// Width over height, or `None` while the window is minimised.
    pub fn aspect(&self) -> Option<f32> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }
}

/// Produces one [`Frame`] per presented frame.
///
/// Delta time is clamped so a stall in the debugger doesn't turn into one enormous step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            index: 0,
            dt_min: Duration::from_micros(100),
            dt_max: Duration::from_millis(250),
        }
    }

    pub fn tick(&mut self, width: u32, height: u32) -> Frame {
        self.tick_at(Instant::now(), width, height)
    }

    fn tick_at(&mut self, now: Instant, width: u32, height: u32) -> Frame {
        let dt = now.saturating_duration_since(self.last)
            .max(self.dt_min)
            .min(self.dt_max);
        self.last = now;

        let frame = Frame {
            width,
            height,
            time: now.saturating_duration_since(self.start).as_secs_f32(),
            dt: dt.as_secs_f32(),
            index: self.index,
        };
        self.index = self.index.wrapping_add(1);

        frame
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn close_request_and_escape_both_close() {
        assert_eq!(LoopState::Running.on(Signal::CloseRequested), LoopState::Closing);
        assert_eq!(LoopState::Running.on(Signal::EscapePressed), LoopState::Closing);
    }

    #[test]
    fn other_keys_keep_running() {
        assert_eq!(LoopState::Running.on(Signal::OtherKeyPressed), LoopState::Running);
    }

    #[test]
    fn closing_is_terminal() {
        for signal in [Signal::CloseRequested, Signal::EscapePressed, Signal::OtherKeyPressed].iter() {
            assert_eq!(LoopState::Closing.on(*signal), LoopState::Closing);
        }
    }

    #[test]
    fn minimised_window_has_no_aspect() {
        let frame = Frame { width: 800, height: 0, time: 0.0, dt: 0.0, index: 0 };
        assert_eq!(frame.aspect(), None);

        let frame = Frame { width: 800, height: 400, ..frame };
        assert_eq!(frame.aspect(), Some(2.0));
    }

    #[test]
    fn clock_counts_frames_and_clamps_delta() {
        let mut clock = FrameClock::new();
        let start = clock.start;

        let first = clock.tick_at(start, 10, 10);
        assert_eq!(first.index, 0);
        assert!((first.dt - 0.0001).abs() < 1e-6);

        let second = clock.tick_at(start + Duration::from_secs(5), 10, 10);
        assert_eq!(second.index, 1);
        assert!((second.dt - 0.25).abs() < 1e-6);
        assert!((second.time - 5.0).abs() < 1e-3);
    }
}
