use std::time::Duration;
use chess::{Color, NUM_COLORS};

use crate::engine::uci::TimeControl;

/// Longest clock a match may start with, one day.
pub const MAX_CLOCK_SECONDS: f64 = 86_400.0;

/// Two countdown clocks sharing one per-move increment, in seconds.
///
/// Remaining time may dip below zero after a slow move; the caller is expected
/// to check `flagged` straight after charging.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatchClock {
    remaining: [f64; NUM_COLORS],
    increment: f64,
}

impl MatchClock {
    pub fn new(initial_seconds: f64, increment_seconds: f64) -> Self {
        Self {
            remaining: [initial_seconds; NUM_COLORS],
            increment: increment_seconds,
        }
    }

    /// Subtracts the time `side` spent thinking, then credits the increment.
    pub fn charge_elapsed(&mut self, side: Color, seconds: f64) {
        let remaining = &mut self.remaining[side.to_index()];
        *remaining -= seconds;
        *remaining += self.increment;
    }

    pub fn remaining(&self, side: Color) -> f64 {
        self.remaining[side.to_index()]
    }

    /// How long `side` may still think, bounded to `[0, MAX_CLOCK_SECONDS]`.
    pub fn thinking_budget(&self, side: Color) -> Duration {
        // `max` also maps NaN to zero
        let seconds = self.remaining(side).max(0.0).min(MAX_CLOCK_SECONDS);
        Duration::from_secs_f64(seconds)
    }

    pub fn flagged(&self, side: Color) -> bool {
        self.remaining(side) <= 0.0
    }

    /// Both clocks together, as every `go` reports them.
    pub fn time_control(&self) -> TimeControl {
        TimeControl {
            white_time: centiseconds(self.remaining(Color::White)),
            white_increment: centiseconds(self.increment),
            black_time: centiseconds(self.remaining(Color::Black)),
            black_increment: centiseconds(self.increment),
        }
    }
}

fn centiseconds(seconds: f64) -> i64 {
    (seconds * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use chess::Color;

    use super::{MatchClock, MAX_CLOCK_SECONDS};

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn charging_subtracts_think_time() {
        let mut clock = MatchClock::new(300.0, 0.0);

        clock.charge_elapsed(Color::White, 12.4);

        assert_close(clock.remaining(Color::White), 287.6);
        assert_close(clock.remaining(Color::Black), 300.0);
    }

    #[test]
    fn increment_is_credited_after_every_move() {
        let mut clock = MatchClock::new(60.0, 2.0);

        let mut expected = 60.0;
        for think in [0.0, 1.5, 3.25, 0.01, 7.0] {
            clock.charge_elapsed(Color::Black, think);
            expected = expected - think + 2.0;
            assert_close(clock.remaining(Color::Black), expected);
        }

        assert_close(clock.remaining(Color::White), 60.0);
    }

    #[test]
    fn running_out_flags_the_side() {
        let mut clock = MatchClock::new(5.0, 0.0);
        assert!(!clock.flagged(Color::White));

        clock.charge_elapsed(Color::White, 5.0);
        assert!(clock.flagged(Color::White));
        assert!(!clock.flagged(Color::Black));

        let mut clock = MatchClock::new(5.0, 1.0);
        clock.charge_elapsed(Color::Black, 5.5);
        assert!(!clock.flagged(Color::Black));
    }

    #[test]
    fn thinking_budget_stays_representable() {
        let mut clock = MatchClock::new(300.0, 0.0);
        clock.charge_elapsed(Color::White, 301.0);
        assert_eq!(clock.thinking_budget(Color::White), Duration::ZERO);
        assert_eq!(clock.thinking_budget(Color::Black), Duration::from_secs(300));

        let clock = MatchClock::new(f64::INFINITY, 0.0);
        assert_eq!(clock.thinking_budget(Color::White), Duration::from_secs_f64(MAX_CLOCK_SECONDS));

        let clock = MatchClock::new(f64::NAN, 0.0);
        assert_eq!(clock.thinking_budget(Color::Black), Duration::ZERO);
    }

    #[test]
    fn time_control_reports_centiseconds_for_both_sides() {
        let mut clock = MatchClock::new(300.0, 1.5);
        clock.charge_elapsed(Color::White, 12.4);

        let control = clock.time_control();

        assert_eq!(control.white_time, 28910);
        assert_eq!(control.white_increment, 150);
        assert_eq!(control.black_time, 30000);
        assert_eq!(control.black_increment, 150);
    }
}
