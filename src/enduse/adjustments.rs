//! The annual adjustments applied to an end use's fuel before conversion to energy service.
//!
//! Each stage takes the fuel produced by the previous one. A stage whose scenario parameter is
//! absent leaves the fuel unchanged.
use crate::climate::{ClimateClass, ClimateFactors};
use crate::fueltype::FuelVector;
use crate::strategy::Change;
use anyhow::{Result, ensure};
use log::warn;
use serde::Deserialize;

/// The mix of two industrial processes serving the same end use (e.g. hot and cold rolling).
///
/// Shifting demand towards the switched process changes fuel use according to the ratio of the
/// processes' efficiencies.
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct ProcessMix {
    /// Share of service provided by the switched process in the base year
    pub switched_share_by: f64,
    /// Efficiency of the switched process
    pub switched_efficiency: f64,
    /// Efficiency of the remaining process
    pub remaining_efficiency: f64,
}

impl ProcessMix {
    /// Check that shares and efficiencies are valid
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.switched_share_by),
            "switched_share_by must be between 0 and 1"
        );
        ensure!(
            self.switched_efficiency > 0.0 && self.remaining_efficiency > 0.0,
            "Process efficiencies must be greater than zero"
        );

        Ok(())
    }

    /// Fuel needed per unit of service for the given share of the switched process
    fn fuel_intensity(&self, switched_share: f64) -> f64 {
        switched_share / self.switched_efficiency
            + (1.0 - switched_share) / self.remaining_efficiency
    }
}

/// Scale heating and cooling end uses by the ratio of current-year to base-year degree days
pub fn climate(fuel: FuelVector, class: ClimateClass, factors: &ClimateFactors) -> FuelVector {
    fuel * factors.factor_for(class)
}

/// Subtract the savings from consumers gaining a smart meter since the base year.
///
/// # Arguments
///
/// * `penetration` - Base-year and current-year fraction of consumers with a smart meter
/// * `saving_rate` - Fraction of fuel saved by consumers with a smart meter
pub fn smart_meter(
    fuel: FuelVector,
    penetration: Option<Change>,
    saving_rate: Option<f64>,
) -> FuelVector {
    match (penetration, saving_rate) {
        (Some(penetration), Some(rate)) => {
            let saving = (penetration.cy - penetration.by) * rate;
            fuel * (1.0 - saving)
        }
        _ => fuel,
    }
}

/// Scale fuel by one plus the fractional change in demand for the end use
pub fn enduse_change(fuel: FuelVector, change: Option<f64>) -> FuelVector {
    change.map_or(fuel, |change| fuel * (1.0 + change))
}

/// Calculate the combined growth factor of several scenario drivers.
///
/// Drivers are multiplied together. A zero base-year value gives a neutral factor and NaN values
/// are treated as one.
pub fn scenario_driver_factor(drivers: &[Change]) -> f64 {
    let replace_nan = |value: f64| {
        if value.is_nan() {
            warn!("Scenario driver value is NaN; using 1 instead");
            1.0
        } else {
            value
        }
    };

    let (product_by, product_cy) = drivers.iter().fold((1.0, 1.0), |(by, cy), driver| {
        (by * replace_nan(driver.by), cy * replace_nan(driver.cy))
    });

    if product_by == 0.0 {
        1.0
    } else {
        product_cy / product_by
    }
}

/// Scale fuel by the growth of the end use's scenario drivers
pub fn scenario_drivers(fuel: FuelVector, drivers: &[Change]) -> FuelVector {
    fuel * scenario_driver_factor(drivers)
}

/// Scale cooling end uses by the change in the fraction of floor area which is cooled
pub fn cooled_floorarea(
    fuel: FuelVector,
    class: ClimateClass,
    cooled_fraction: Option<Change>,
) -> FuelVector {
    match cooled_fraction {
        Some(fraction) if class == ClimateClass::Cooling && fraction.by != 0.0 => {
            fuel * (fraction.cy / fraction.by)
        }
        _ => fuel,
    }
}

/// Scale fuel by the change in fuel intensity from shifting service between two processes
pub fn process_mix(
    fuel: FuelVector,
    mix: Option<&ProcessMix>,
    switched_share_cy: Option<f64>,
) -> FuelVector {
    match (mix, switched_share_cy) {
        (Some(mix), Some(share_cy)) => {
            fuel * (mix.fuel_intensity(share_cy) / mix.fuel_intensity(mix.switched_share_by))
        }
        _ => fuel,
    }
}
