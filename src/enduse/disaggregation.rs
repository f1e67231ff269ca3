//! Spreading annual fuel over the hours of the modelled days.
use crate::fueltype::{FuelType, FuelVector, HOURS_PER_DAY, HourlyFuel};
use crate::load_profile::LoadProfile;
use crate::technology::{Efficiency, FuelSplit, Technology};

/// Spread each fueltype's annual fuel with the same profile
pub fn disaggregate_fuel(fuel: &FuelVector, profile: &LoadProfile) -> HourlyFuel {
    let mut hourly = HourlyFuel::zeros(profile.shape_yh().len());
    for (fueltype, value) in fuel.iter_nonzero() {
        hourly.add_shaped(fueltype, value, profile.shape_yh());
    }
    hourly
}

/// Spread a single value of one fueltype
pub fn disaggregate_value(fueltype: FuelType, value: f64, profile: &LoadProfile) -> HourlyFuel {
    let mut hourly = HourlyFuel::zeros(profile.shape_yh().len());
    hourly.add_shaped(fueltype, value, profile.shape_yh());
    hourly
}

/// Spread a technology's annual service over the modelled hours and convert it to fuel.
///
/// Fuel in each hour uses the technology's efficiency in that hour and is divided between
/// fueltypes with the technology's split for that hour.
///
/// # Arguments
///
/// * `service` - Annual energy service delivered by the technology
/// * `technology` - The technology
/// * `profile` - The technology's load profile
/// * `modelled_days` - Days of the year covered by the profile
pub fn disaggregate_service(
    service: f64,
    technology: &Technology,
    profile: &LoadProfile,
    modelled_days: &[usize],
) -> HourlyFuel {
    let mut hourly = HourlyFuel::zeros(profile.shape_yh().len());
    let days = profile.shape_yh().iter().zip(modelled_days);
    for (day_index, (shape_day, year_day)) in days.enumerate() {
        for (hour, share_hour) in shape_day.iter().enumerate() {
            let hour_of_year = year_day * HOURS_PER_DAY + hour;
            let fuel = service * share_hour / technology.eff_cy.at_hour(hour_of_year);
            match &technology.fuel_split {
                FuelSplit::Single(fueltype) => {
                    hourly.get_mut(*fueltype)[day_index][hour] += fuel;
                }
                FuelSplit::Hourly(shares) => {
                    for (fueltype, shares) in shares {
                        hourly.get_mut(*fueltype)[day_index][hour] += fuel * shares[hour_of_year];
                    }
                }
            }
        }
    }
    hourly
}
