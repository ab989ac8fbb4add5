//! Monte Carlo integration of the quarter-circle function.
//!
//! ```text
//! f(x)      = √(1 − x²)
//! Î[a,b]    = (b − a) · (1/n) Σ f(xᵢ),  xᵢ ~ U[a, b)
//! π̂         = 4 · Î[0,1]
//! ```
//!
//! Each worker produces the exact sum Σ f(xᵢ) over its own samples; the
//! coordinator divides the combined sum by the number of samples actually
//! dispatched. Samples are evaluated in f64 and added without rounding.

use crate::domains::precision::PreciseReal;
use crate::engine::clock::Stopwatch;
use crate::engine::rng::SampleSource;
use crate::error::PiResult;

/// The integrand, √(1 − x²). NaN outside [−1, 1].
#[must_use]
pub fn quarter_circle(x: f64) -> f64 {
    (1.0 - x * x).sqrt()
}

/// Outcome of one worker's sampling loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    /// Exact sum of the sampled integrand values.
    pub sum: PreciseReal,
    /// Number of samples drawn.
    pub samples: u64,
    /// Seconds spent inside the sampling loop.
    pub elapsed_seconds: f64,
}

/// Sampling loop over a fixed interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuarterCircleSampler {
    samples: u64,
    low: f64,
    high: f64,
}

impl QuarterCircleSampler {
    /// Create a sampler drawing `samples` points in `[low, high)`.
    ///
    /// The bounds are not checked: points outside [−1, 1] make the integrand
    /// non-finite and [`run`](Self::run) fails at that sample.
    #[must_use]
    pub const fn new(samples: u64, low: f64, high: f64) -> Self {
        Self { samples, low, high }
    }

    /// Number of samples this sampler draws.
    #[must_use]
    pub const fn samples(&self) -> u64 {
        self.samples
    }

    /// Draw every sample and accumulate the exact sum.
    ///
    /// Elapsed time covers the loop only.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PiError::NonFiniteValue`] if a sample point falls
    /// outside the integrand's domain.
    ///
    /// # Example
    ///
    /// ```rust
    /// use distpi::domains::monte_carlo::QuarterCircleSampler;
    /// use distpi::engine::rng::SampleRng;
    ///
    /// let mut rng = SampleRng::new(42);
    /// let outcome = QuarterCircleSampler::new(10_000, 0.0, 1.0).run(&mut rng).unwrap();
    /// let mean = outcome.sum.to_f64().unwrap() / 10_000.0;
    /// assert!((4.0 * mean - std::f64::consts::PI).abs() < 0.05);
    /// ```
    pub fn run<S: SampleSource>(&self, source: &mut S) -> PiResult<SampleOutcome> {
        let watch = Stopwatch::start();
        let mut sum = PreciseReal::zero();

        for i in 0..self.samples {
            let x = source.sample_in(self.low, self.high);
            let value = quarter_circle(x);
            let exact = PreciseReal::from_f64(value, format!("sample {i} (x = {x})"))?;
            sum.accumulate(&exact);
        }

        Ok(SampleOutcome {
            sum,
            samples: self.samples,
            elapsed_seconds: watch.elapsed_secs(),
        })
    }
}

/// Integral estimate `(high − low) · total / denominator`.
///
/// # Errors
///
/// Returns an error if `denominator` is zero or the width is not finite.
pub fn estimate_integral(
    total: &PreciseReal,
    denominator: u64,
    low: f64,
    high: f64,
) -> PiResult<PreciseReal> {
    let mean = total.checked_div(&PreciseReal::from_u64(denominator))?;
    let width = PreciseReal::from_f64(high - low, "interval width")?;
    Ok(&mean * &width)
}

/// π estimate `4 · integral`, applied regardless of the interval.
#[must_use]
pub fn pi_from_integral(integral: &PreciseReal) -> PreciseReal {
    integral * &PreciseReal::from_u64(4)
}
