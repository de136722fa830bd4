//! Trait for engines advanced one discrete time-step at a time.

use crate::error::BloomResult;

/// Anything integrated forward by an explicit `dt`.
///
/// Implemented by the population and gravity engines so the harness can
/// drive either with the same loop. Engines never sub-step on their own:
/// the caller owns the choice of a stable `dt`.
pub trait Stepper {
    /// Advances the state by `dt`. Fails when `dt` is not finite and positive.
    fn step(&mut self, dt: f64) -> BloomResult<()>;

    /// Current simulation clock.
    fn time(&self) -> f64;

    /// Advances `steps` times by `dt`.
    fn advance(&mut self, steps: usize, dt: f64) -> BloomResult<()> {
        for _ in 0..steps {
            self.step(dt)?;
        }
        Ok(())
    }
}
