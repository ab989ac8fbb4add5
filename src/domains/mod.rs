//! Numerical domain of the estimator.
//!
//! - Precision: exact decimal reals for partial sums and the final estimate
//! - Monte Carlo: the quarter-circle integrand and the per-worker sampling loop

pub mod monte_carlo;
pub mod precision;

pub use monte_carlo::{estimate_integral, pi_from_integral, QuarterCircleSampler, SampleOutcome};
pub use precision::PreciseReal;
