//! Linear and sigmoid diffusion between a base-year value and an end-year value.
//!
//! These functions are used wherever a scenario parameter, technology efficiency or technology
//! share changes gradually over the simulation period.
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;

/// Half-width of the interval on which the logistic curve used by [`sigmoid_diffusion`] is
/// evaluated. The base year maps to `-SIGMOID_RANGE` and the end year to `+SIGMOID_RANGE`.
const SIGMOID_RANGE: f64 = 6.0;

/// Exponents beyond this magnitude saturate the logistic function
const MAX_EXPONENT: f64 = 700.0;

/// How a value moves from its base-year to its end-year value
#[derive(PartialEq, Debug, Clone, Copy, Default, DeserializeLabeledStringEnum)]
pub enum DiffusionChoice {
    /// Straight-line interpolation
    #[string = "linear"]
    Linear,
    /// Logistic (S-shaped) interpolation
    #[default]
    #[string = "sigmoid"]
    Sigmoid,
}

/// Parameters for the logistic curve of [`sigmoid_diffusion`]
#[derive(PartialEq, Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SigmoidShape {
    /// Shifts the curve's midpoint on the normalised interval
    pub midpoint: f64,
    /// Controls how abrupt the transition is
    pub steepness: f64,
}

impl Default for SigmoidShape {
    fn default() -> Self {
        Self {
            midpoint: 0.0,
            steepness: 1.0,
        }
    }
}

/// Parameters for a technology diffusion curve evaluated with [`sigmoid_function`]
#[derive(PartialEq, Debug, Clone, Copy, Deserialize)]
pub struct SigmoidParameters {
    /// The year at which the curve reaches half its asymptote
    pub midpoint: f64,
    /// Slope of the curve (negative for declining technologies)
    pub steepness: f64,
    /// The curve's asymptote (maximum share)
    pub l_parameter: f64,
}

impl SigmoidParameters {
    /// Evaluate the curve at the given year
    pub fn evaluate(&self, year: u32) -> f64 {
        sigmoid_function(year as f64, self.l_parameter, self.midpoint, self.steepness)
    }
}

/// Numerically stable logistic function `1 / (1 + exp(-x))`
fn logistic(x: f64) -> f64 {
    let x = x.clamp(-MAX_EXPONENT, MAX_EXPONENT);
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Linearly interpolate between `value_by` and `value_ey`.
///
/// # Arguments
///
/// * `base_yr` - The year in which the value is `value_by`
/// * `curr_yr` - The year to calculate the value for
/// * `value_by` - Value in the base year
/// * `value_ey` - Value once the change is fully realised
/// * `yr_until_changed` - The year by which the change is fully realised
///
/// # Returns
///
/// `value_by` up to `base_yr`, `value_ey` from `yr_until_changed` onwards and a linear
/// interpolation in between.
pub fn linear_diff(
    base_yr: u32,
    curr_yr: u32,
    value_by: f64,
    value_ey: f64,
    yr_until_changed: u32,
) -> f64 {
    if curr_yr >= yr_until_changed {
        return value_ey;
    }
    if curr_yr <= base_yr {
        return value_by;
    }

    let fraction = (curr_yr - base_yr) as f64 / (yr_until_changed - base_yr) as f64;
    value_by + (value_ey - value_by) * fraction
}

/// Calculate the fraction (0 to 1) of a change realised by `curr_yr` along a sigmoid curve.
///
/// The period from `base_yr` to `yr_until_changed` is mapped onto the interval [-6, 6] of a
/// logistic curve, so the fraction is close to 0 in the base year and close to 1 at the end year.
/// `midpoint` shifts the curve along that interval and `steepness` scales it.
///
/// # Returns
///
/// Exactly 0 up to `base_yr` and exactly 1 from `yr_until_changed` onwards.
pub fn sigmoid_diffusion(
    base_yr: u32,
    curr_yr: u32,
    yr_until_changed: u32,
    midpoint: f64,
    steepness: f64,
) -> f64 {
    if curr_yr >= yr_until_changed {
        return 1.0;
    }
    if curr_yr <= base_yr {
        return 0.0;
    }

    let period = (yr_until_changed - base_yr) as f64;
    let x = -SIGMOID_RANGE + (2.0 * SIGMOID_RANGE / period) * (curr_yr - base_yr) as f64;
    logistic(steepness * (x - midpoint))
}

/// Evaluate a logistic curve with asymptote `l_parameter` at `x`.
///
/// Used to read technology shares back from fitted diffusion curves; the asymptote can be below
/// one when several technologies compete for the same service.
pub fn sigmoid_function(x: f64, l_parameter: f64, midpoint: f64, steepness: f64) -> f64 {
    l_parameter * logistic(steepness * (x - midpoint))
}

/// Diffuse from `value_by` to `value_ey` with the given method.
///
/// # Arguments
///
/// * `choice` - Linear or sigmoid diffusion
/// * `shape` - Curve parameters, only used for sigmoid diffusion
pub fn diffuse(
    choice: DiffusionChoice,
    shape: SigmoidShape,
    base_yr: u32,
    curr_yr: u32,
    value_by: f64,
    value_ey: f64,
    yr_until_changed: u32,
) -> f64 {
    match choice {
        DiffusionChoice::Linear => {
            linear_diff(base_yr, curr_yr, value_by, value_ey, yr_until_changed)
        }
        DiffusionChoice::Sigmoid => {
            let fraction = sigmoid_diffusion(
                base_yr,
                curr_yr,
                yr_until_changed,
                shape.midpoint,
                shape.steepness,
            );
            value_by + (value_ey - value_by) * fraction
        }
    }
}
