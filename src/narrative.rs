//! Narratives describe how a scenario parameter moves between values over the simulation period.
//!
//! A narrative is an ordered list of change points. Each change point moves the parameter from
//! `value_by` in its `base_yr` to `value_ey` by its `end_yr`, following either a linear or a
//! sigmoid diffusion curve.
use crate::diffusion::{DiffusionChoice, SigmoidShape, diffuse};
use crate::region::RegionID;
use anyhow::{Result, ensure};
use float_cmp::approx_eq;
use serde::Deserialize;
use std::collections::HashMap;

/// Default steepness of narrative sigmoid curves
fn default_sig_steepness() -> f64 {
    1.0
}

/// A single change point of a [`Narrative`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NarrativePoint {
    /// The year in which the change starts
    pub base_yr: u32,
    /// The year by which the change is fully realised
    pub end_yr: u32,
    /// Value at `base_yr`
    pub value_by: f64,
    /// Value at `end_yr`
    pub value_ey: f64,
    /// Shape of the change
    #[serde(default)]
    pub diffusion_choice: DiffusionChoice,
    /// Midpoint of the sigmoid curve (only used for sigmoid diffusion)
    #[serde(default)]
    pub sig_midpoint: f64,
    /// Steepness of the sigmoid curve (only used for sigmoid diffusion)
    #[serde(default = "default_sig_steepness")]
    pub sig_steepness: f64,
    /// Whether `value_ey` can be overridden for individual regions
    #[serde(default)]
    pub regional_specific: bool,
    /// End values for individual regions
    #[serde(default)]
    pub regional_values: HashMap<RegionID, f64>,
}

impl NarrativePoint {
    /// The end value for the given region
    fn value_ey_for(&self, region_id: &RegionID) -> f64 {
        if self.regional_specific {
            if let Some(value) = self.regional_values.get(region_id) {
                return *value;
            }
        }

        self.value_ey
    }
}

/// The trajectory of one scenario parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Narrative(Vec<NarrativePoint>);

impl Narrative {
    /// Create a new [`Narrative`] from its change points, checking that they are well formed.
    ///
    /// Change points must be in order and contiguous, i.e. each point must start in the year the
    /// previous one ended, from the value the previous one ended on.
    pub fn new(points: Vec<NarrativePoint>) -> Result<Self> {
        ensure!(!points.is_empty(), "Narrative has no change points");

        for point in &points {
            ensure!(
                point.base_yr <= point.end_yr,
                "Narrative change point ends ({}) before it starts ({})",
                point.end_yr,
                point.base_yr
            );
            ensure!(
                point.value_by.is_finite() && point.value_ey.is_finite(),
                "Narrative values must be finite"
            );
        }

        for (prev, next) in points.iter().zip(points.iter().skip(1)) {
            ensure!(
                next.base_yr == prev.end_yr,
                "Narrative change points must be contiguous (one ends in {}, next starts in {})",
                prev.end_yr,
                next.base_yr
            );
            ensure!(
                approx_eq!(f64, next.value_by, prev.value_ey),
                "Narrative change point starting in {} should start from the previous end value {}",
                next.base_yr,
                prev.value_ey
            );
        }

        Ok(Self(points))
    }

    /// A narrative for a parameter which keeps the same value throughout
    pub fn constant(value: f64) -> Self {
        Self(vec![NarrativePoint {
            base_yr: 0,
            end_yr: 0,
            value_by: value,
            value_ey: value,
            diffusion_choice: DiffusionChoice::Linear,
            sig_midpoint: 0.0,
            sig_steepness: default_sig_steepness(),
            regional_specific: false,
            regional_values: HashMap::new(),
        }])
    }

    /// The value at the start of the narrative
    pub fn value_by(&self) -> f64 {
        self.0[0].value_by
    }

    /// Resolve the narrative to a value for the given year and region.
    ///
    /// Years before the first change point take its start value; years after the last take its
    /// end value. Where regional end values apply, each following change point starts from the
    /// regional value rather than the national one.
    pub fn resolve(&self, curr_yr: u32, region_id: &RegionID) -> f64 {
        let mut value_by = self.value_by();
        for point in &self.0 {
            let value_ey = point.value_ey_for(region_id);
            if curr_yr <= point.end_yr {
                let shape = SigmoidShape {
                    midpoint: point.sig_midpoint,
                    steepness: point.sig_steepness,
                };
                return diffuse(
                    point.diffusion_choice,
                    shape,
                    point.base_yr,
                    curr_yr,
                    value_by,
                    value_ey,
                    point.end_yr,
                );
            }
            value_by = value_ey;
        }

        value_by
    }
}
