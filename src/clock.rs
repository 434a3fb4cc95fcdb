//! ## Clock
//!
//! Sample clock divisor calculation.
//!
//! The boards derive their sample clock from a fixed root oscillator fed through two
//! chained 16-bit counters. Picking a sample rate means picking two divisors whose
//! product is as close as possible to `root / rate`.
//!

use crate::constants::clock::{DEFAULT_ROOT_CLOCK_HZ, MAX_DIVISOR, MIN_DIVISOR};
use crate::error::Error;
use crate::types::DivisorPair;

use log::{debug, trace};

/// ### Clock Solver
///
/// Computes counter divisors for a given root clock.
///
/// Solving is a pure computation, so a solver can be copied freely and shared between threads.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSolver {
    root_clock_hz: u32,
}

impl Default for ClockSolver {
    fn default() -> Self {
        ClockSolver {
            root_clock_hz: DEFAULT_ROOT_CLOCK_HZ,
        }
    }
}

impl ClockSolver {
    /// ### With Root Clock
    ///
    /// Build a solver for a board whose oscillator is not the default 10 MHz.
    ///
    /// #### Arguments
    /// - `root_clock_hz` -> the oscillator frequency, must be non-zero
    ///
    pub fn with_root_clock(root_clock_hz: u32) -> Result<ClockSolver, Error> {
        if root_clock_hz == 0 {
            return Err(Error::InvalidRootClock);
        }

        Ok(ClockSolver { root_clock_hz })
    }

    pub fn root_clock_hz(&self) -> u32 {
        self.root_clock_hz
    }

    /// ### Solve
    ///
    /// Find the divisor pair that best approximates `target_hz`.
    ///
    /// Requests at or above a quarter of the root clock get the fastest clock the counters
    /// allow, `(2, 2)`. Requests so slow that both counters would need more than 16 bits get
    /// the slowest one, `(65535, 65535)`. Anything in between is searched downward from the
    /// square root of the total division, keeping the first pair with the smallest error.
    ///
    /// All rounding is `f64::round`, i.e. halves round away from zero.
    ///
    /// #### Arguments
    /// - `target_hz` -> the requested sample rate; zero, negative and non-finite values are rejected
    ///
    pub fn solve(&self, target_hz: f64) -> Result<DivisorPair, Error> {
        if !target_hz.is_finite() || target_hz <= 0.0 {
            return Err(Error::InvalidFrequency(target_hz));
        }

        let root = self.root_clock_hz as f64;
        let max = MAX_DIVISOR as f64;

        // FLOOR
        // ==========
        if target_hz * 4.0 >= root {
            debug!("{target_hz} Hz is at or above root/4, using minimum divisors");
            return Ok(DivisorPair::new(MIN_DIVISOR, MIN_DIVISOR));
        }

        // CEILING
        // ==========
        let ratio = root / target_hz;
        let candidate = ratio.sqrt().round();
        if candidate > max {
            debug!("{target_hz} Hz needs a division of {ratio}, clamping to maximum divisors");
            return Ok(DivisorPair::new(MAX_DIVISOR, MAX_DIVISOR));
        }

        // SEARCH
        // ==========

        // ratio > 4 here, so candidate >= 2
        let candidate = candidate as u16;
        let mut divisor_b = candidate;
        let mut min_err = (ratio - (ratio / candidate as f64).round() * candidate as f64).abs();

        for lv in (MIN_DIVISOR..=candidate).rev() {
            let a = (ratio / lv as f64).round();
            // smaller lv only makes a larger
            if a > max {
                debug!("divisor a = {a} exceeds 16 bits at b = {lv}, ending search");
                break;
            }

            let err = (ratio - a * lv as f64).abs();
            if err == 0.0 {
                debug!("found exact divisors ({a}, {lv})");
                divisor_b = lv;
                break;
            }
            if err < min_err {
                trace!("new best divisors ({a}, {lv}), error {err}");
                divisor_b = lv;
                min_err = err;
            }
        }

        // only the pair right at the ceiling can push a past 16 bits
        let divisor_a = (ratio / divisor_b as f64).round().min(max) as u16;

        debug!(
            "{target_hz} Hz -> divisors ({divisor_a}, {divisor_b}), error {min_err} of {ratio}"
        );

        Ok(DivisorPair::new(divisor_a, divisor_b))
    }
}

/// ### Calculate Clocks
///
/// Solve for `target_hz` against the default 10 MHz root clock.
///
pub fn calculate_clocks(target_hz: f64) -> Result<DivisorPair, Error> {
    ClockSolver::default().solve(target_hz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{quickcheck, TestResult};

    fn solver(root: u32) -> ClockSolver {
        ClockSolver::with_root_clock(root).expect("non-zero root clock")
    }

    #[test]
    fn zero_frequency_is_rejected() {
        assert_eq!(calculate_clocks(0.0), Err(Error::InvalidFrequency(0.0)));
    }

    #[test]
    fn negative_and_non_finite_frequencies_are_rejected() {
        assert_eq!(calculate_clocks(-10.0), Err(Error::InvalidFrequency(-10.0)));
        assert!(matches!(
            calculate_clocks(f64::NAN),
            Err(Error::InvalidFrequency(_))
        ));
        assert!(matches!(
            calculate_clocks(f64::INFINITY),
            Err(Error::InvalidFrequency(_))
        ));
    }

    #[test]
    fn zero_root_clock_is_rejected() {
        assert_eq!(ClockSolver::with_root_clock(0), Err(Error::InvalidRootClock));
    }

    #[test]
    fn default_root_is_ten_megahertz() {
        assert_eq!(ClockSolver::default().root_clock_hz(), 10_000_000);
    }

    #[test]
    fn root_frequency_gives_minimum_divisors() {
        assert_eq!(calculate_clocks(10_000_000.0), Ok(DivisorPair::new(2, 2)));
    }

    #[test]
    fn quarter_root_gives_minimum_divisors() {
        assert_eq!(calculate_clocks(2_500_000.0), Ok(DivisorPair::new(2, 2)));
        assert_eq!(calculate_clocks(2_499_999.0), Ok(DivisorPair::new(2, 2)));
    }

    #[test]
    fn exact_square_is_found() {
        let pair = calculate_clocks(10_000_000.0 / (100.0 * 100.0)).unwrap();
        assert_eq!(pair, DivisorPair::new(100, 100));
        assert_eq!(pair.actual_hz(10_000_000), 1000.0);
    }

    #[test]
    fn exact_pair_below_square_root_is_found() {
        // sqrt(100000) ~ 316, the only exact factor within reach is 250
        assert_eq!(calculate_clocks(100.0), Ok(DivisorPair::new(400, 250)));
        // ratio 10: (3, 3) is off by one, (5, 2) is exact
        assert_eq!(solver(10).solve(1.0), Ok(DivisorPair::new(5, 2)));
    }

    #[test]
    fn first_minimum_wins_ties() {
        // ratio 7: (2, 3) and (4, 2) are both off by one
        assert_eq!(solver(7).solve(1.0), Ok(DivisorPair::new(2, 3)));
    }

    #[test]
    fn halves_round_away_from_zero() {
        // ratio 5: 5 / 2 = 2.5 rounds to 3
        assert_eq!(solver(5).solve(1.0), Ok(DivisorPair::new(3, 2)));
    }

    #[test]
    fn very_slow_clock_clamps_to_maximum_divisors() {
        assert_eq!(calculate_clocks(0.001), Ok(DivisorPair::new(0xFFFF, 0xFFFF)));
    }

    #[test]
    fn divisor_a_is_clamped_right_at_the_ceiling() {
        // sqrt rounds to 65535 but ratio / 65535 rounds to 65536
        let pair = calculate_clocks(10_000_000.0 / 4_294_950_000.0).unwrap();
        assert_eq!(pair, DivisorPair::new(0xFFFF, 0xFFFF));
    }

    #[test]
    fn product_grows_as_rate_drops() {
        let rates = [1_000_000.0, 100_000.0, 10_000.0, 1_000.0, 100.0, 10.0, 1.0, 0.1];
        let products: Vec<u32> = rates
            .iter()
            .map(|hz| calculate_clocks(*hz).unwrap().product())
            .collect();

        assert!(products.windows(2).all(|w| w[0] < w[1]), "{products:?}");
    }

    #[test]
    fn solver_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Copy>() {}
        assert_send_sync::<ClockSolver>();
    }

    #[test]
    fn divisors_stay_in_range() {
        fn prop(hz: u32) -> TestResult {
            if hz == 0 {
                return TestResult::discard();
            }
            let pair = calculate_clocks(hz as f64).unwrap();
            TestResult::from_bool(pair.divisor_a >= 1 && pair.divisor_b >= 1)
        }
        quickcheck(prop as fn(u32) -> TestResult);
    }

    #[test]
    fn fast_rates_always_give_minimum_divisors() {
        fn prop(extra: u32) -> bool {
            let hz = 2_500_000.0 + extra as f64;
            calculate_clocks(hz) == Ok(DivisorPair::new(2, 2))
        }
        quickcheck(prop as fn(u32) -> bool);
    }

    #[test]
    fn search_never_loses_to_the_square_root_guess() {
        fn prop(hz: u32) -> TestResult {
            let hz = (hz % 2_500_000) as f64;
            if hz == 0.0 {
                return TestResult::discard();
            }
            let ratio = 10_000_000.0 / hz;
            let pair = calculate_clocks(hz).unwrap();

            let b = ratio.sqrt().round();
            let guess_err = (ratio - (ratio / b).round() * b).abs();
            let err = (ratio - pair.product() as f64).abs();

            // rounding a keeps the product within b/2 of the ratio
            TestResult::from_bool(err <= guess_err && err <= pair.divisor_b as f64 / 2.0 + 1e-6)
        }
        quickcheck(prop as fn(u32) -> TestResult);
    }

    #[test]
    fn solving_is_idempotent() {
        fn prop(hz: f64) -> TestResult {
            if !hz.is_finite() || hz <= 0.0 {
                return TestResult::discard();
            }
            TestResult::from_bool(calculate_clocks(hz) == calculate_clocks(hz))
        }
        quickcheck(prop as fn(f64) -> TestResult);
    }
}
