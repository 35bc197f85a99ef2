//! Single-shot wall-clock timing.

use crate::infrastructure::traits::{Clock, SystemClock};

/// Value returned by a timed operation together with its duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timed<T> {
    pub value: T,
    pub millis: f64,
}

/// Times one invocation of an operation against a [`Clock`].
///
/// No warm-up and no retries: run it repeatedly and aggregate for stable numbers.
#[derive(Debug, Clone, Default)]
pub struct Sampler<C: Clock = SystemClock> {
    clock: C,
}

impl<C: Clock> Sampler<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Run `op` once, returning its value and the elapsed milliseconds.
    pub fn time<T>(&self, op: impl FnOnce() -> T) -> Timed<T> {
        let start = self.clock.now();
        let value = op();
        let elapsed = self.clock.now().saturating_sub(start);
        Timed {
            value,
            millis: elapsed.as_secs_f64() * 1000.0,
        }
    }

    /// Run `op` once and return only the elapsed milliseconds.
    pub fn measure(&self, op: impl FnOnce()) -> f64 {
        self.time(op).millis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::StepClock;
    use std::time::Duration;

    #[test]
    fn given_step_clock_when_measuring_then_reports_one_step() {
        let sampler = Sampler::new(StepClock::new(Duration::from_micros(1500)));
        let mut calls = 0;
        let millis = sampler.measure(|| calls += 1);
        assert_eq!(calls, 1);
        assert!((millis - 1.5).abs() < 1e-9);
    }

    #[test]
    fn given_operation_with_result_when_timed_then_value_passed_through() {
        let sampler = Sampler::new(StepClock::new(Duration::from_millis(2)));
        let timed = sampler.time(|| 40 + 2);
        assert_eq!(timed.value, 42);
        assert!((timed.millis - 2.0).abs() < 1e-9);
    }
}
