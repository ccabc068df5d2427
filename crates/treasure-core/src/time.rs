//! Time abstractions for determinism.
//!
//! Two separate concerns live here. [`Clock`] answers "what time is it" and
//! stamps saves and completed progress. [`Pacer`] owns the pauses between
//! story lines, so tests can run a whole story without waiting on real time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Abstraction over system time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Schedules the pause before each story line.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Suspends the caller for (a logical rendition of) `delay`.
    async fn pace(&self, delay: Duration);
}

/// Pacer backed by `tokio::time::sleep`, optionally scaled.
///
/// A scale of `1.0` reproduces the authored pacing, `0.0` removes it.
#[derive(Debug, Clone, Copy)]
pub struct TokioPacer {
    scale: f64,
}

impl TokioPacer {
    /// Creates a pacer that sleeps for `delay * scale`.
    ///
    /// Negative or non-finite scales are treated as `0.0`.
    #[must_use]
    pub fn new(scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            0.0
        };
        Self { scale }
    }

    /// Returns the effective scale.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Scales `delay`, saturating at `Duration::MAX`.
    fn scaled(&self, delay: Duration) -> Duration {
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.scale).unwrap_or(Duration::MAX)
    }
}

impl Default for TokioPacer {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[async_trait]
impl Pacer for TokioPacer {
    async fn pace(&self, delay: Duration) {
        let scaled = self.scaled(delay);
        if scaled.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(scaled).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_scale_clamps_to_zero() {
        assert!(TokioPacer::new(-2.0).scale().abs() < f64::EPSILON);
        assert!(TokioPacer::new(f64::NAN).scale().abs() < f64::EPSILON);
        assert!((TokioPacer::new(0.5).scale() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_huge_scale_saturates_instead_of_overflowing() {
        let pacer = TokioPacer::new(1e300);

        assert_eq!(pacer.scaled(Duration::from_millis(800)), Duration::MAX);
        assert_eq!(pacer.scaled(Duration::ZERO), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_pacer_sleeps_for_scaled_delay() {
        // Arrange
        let pacer = TokioPacer::new(0.5);
        let started = tokio::time::Instant::now();

        // Act
        pacer.pace(Duration::from_millis(800)).await;

        // Assert
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(400));
        assert!(elapsed < Duration::from_millis(402));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_scale_does_not_advance_time() {
        let pacer = TokioPacer::new(0.0);
        let started = tokio::time::Instant::now();

        pacer.pace(Duration::from_secs(5)).await;

        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
