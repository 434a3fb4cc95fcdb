//! ## Counter
//!
//! Drive a board's sample clock counters with solved divisors.
//!
//! How the divisors reach the counter registers depends on the board, so it stays
//! behind [`ClockTarget`].
//!

use crate::clock::ClockSolver;
use crate::error::Error;
use crate::types::DivisorPair;

use anyhow::Result;
use log::info;

/// ### Clock Target
///
/// Hardware that can run a sample clock from two chained counters.
///
pub trait ClockTarget {
    /// Load both counters and start the clock
    fn load_divisors(&mut self, pair: DivisorPair) -> Result<()>;
    /// Halt the counters
    fn stop(&mut self) -> Result<()>;
}

impl<T: ClockTarget + ?Sized> ClockTarget for &mut T {
    fn load_divisors(&mut self, pair: DivisorPair) -> Result<()> {
        (**self).load_divisors(pair)
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }
}

/// ### Sample Clock
///
/// A solved clock: what was asked for, the divisors, and what the hardware will really produce.
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleClock {
    pub requested_hz: f64,
    pub divisors: DivisorPair,
    pub actual_hz: f64,
}

impl SampleClock {
    pub fn new(solver: &ClockSolver, hz: f64) -> Result<SampleClock, Error> {
        let divisors = solver.solve(hz)?;

        Ok(SampleClock {
            requested_hz: hz,
            divisors,
            actual_hz: divisors.actual_hz(solver.root_clock_hz()),
        })
    }
}

/// ### Start Clock
///
/// Solve for `hz` and load the result into the target.
///
/// The target is left untouched if `hz` is not a valid frequency.
///
/// #### Arguments
/// - `target` -> the counters to program
/// - `solver` -> the solver matching the board's root clock
/// - `hz` -> the requested sample rate
///
/// #### Returns
/// The programmed clock, including the rate actually achieved
///
pub fn start_clock<T: ClockTarget>(
    mut target: T,
    solver: &ClockSolver,
    hz: f64,
) -> Result<SampleClock> {
    let clock = SampleClock::new(solver, hz)?;

    target.load_divisors(clock.divisors)?;

    info!(
        "sample clock started at {} Hz (requested {} Hz, divisors {}x{})",
        clock.actual_hz, clock.requested_hz, clock.divisors.divisor_a, clock.divisors.divisor_b
    );

    Ok(clock)
}

/// ### Stop Clock
///
/// Halt the sample clock counters.
///
pub fn stop_clock<T: ClockTarget>(mut target: T) -> Result<()> {
    target.stop()?;
    info!("sample clock stopped");
    Ok(())
}
