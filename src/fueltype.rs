//! Fueltypes and the annual and hourly fuel arrays indexed by them.
use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};
use std::ops::{AddAssign, Index, IndexMut, Mul};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator};

/// The number of hours in a day
pub const HOURS_PER_DAY: usize = 24;

/// The number of days in a (modelled) year
pub const DAYS_PER_YEAR: usize = 365;

/// Values for each hour of a single day
pub type DayHours = [f64; HOURS_PER_DAY];

/// An energy carrier
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    EnumCount,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    /// Coal and other solid fuels
    SolidFuel,
    /// Natural gas
    Gas,
    /// Electricity
    Electricity,
    /// Oil products
    Oil,
    /// Biomass
    Biomass,
    /// Hydrogen
    Hydrogen,
    /// Synthetic carrier used for technology-agnostic accounting of energy service
    Heat,
}

impl FuelType {
    /// The position of this fueltype in fuel arrays
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Annual energy for each fueltype
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FuelVector([f64; FuelType::COUNT]);

impl FuelVector {
    /// Create a vector with all fueltypes set to zero
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Create a vector from values ordered as [`FuelType`]'s variants
    pub fn from_array(values: [f64; FuelType::COUNT]) -> Self {
        Self(values)
    }

    /// Create a vector with a single non-zero fueltype
    pub fn single(fueltype: FuelType, value: f64) -> Self {
        let mut fuel = Self::zeros();
        fuel[fueltype] = value;
        fuel
    }

    /// Iterate over fueltypes and their values
    pub fn iter(&self) -> impl Iterator<Item = (FuelType, f64)> + '_ {
        FuelType::iter().map(|fueltype| (fueltype, self[fueltype]))
    }

    /// Iterate over fueltypes which have a non-zero value
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (FuelType, f64)> + '_ {
        self.iter().filter(|(_, value)| *value != 0.0)
    }

    /// Total across fueltypes
    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// The underlying values, ordered as [`FuelType`]'s variants
    pub fn as_array(&self) -> &[f64; FuelType::COUNT] {
        &self.0
    }

    /// Check that no entry is negative (or NaN)
    pub fn check_non_negative(&self) -> Result<()> {
        for (fueltype, value) in self.iter() {
            ensure!(
                value >= 0.0,
                "Negative or invalid fuel value {value} for fueltype {fueltype}"
            );
        }

        Ok(())
    }
}

impl Index<FuelType> for FuelVector {
    type Output = f64;

    fn index(&self, fueltype: FuelType) -> &f64 {
        &self.0[fueltype.index()]
    }
}

impl IndexMut<FuelType> for FuelVector {
    fn index_mut(&mut self, fueltype: FuelType) -> &mut f64 {
        &mut self.0[fueltype.index()]
    }
}

impl AddAssign for FuelVector {
    fn add_assign(&mut self, rhs: Self) {
        for (lhs, rhs) in self.0.iter_mut().zip(rhs.0) {
            *lhs += rhs;
        }
    }
}

impl Mul<f64> for FuelVector {
    type Output = FuelVector;

    fn mul(self, rhs: f64) -> FuelVector {
        FuelVector(self.0.map(|value| value * rhs))
    }
}

/// Find the hour with the highest value.
///
/// # Returns
///
/// `(day, hour, value)` of the first maximum, or `None` if `days` is empty.
pub fn peak_hour(days: &[DayHours]) -> Option<(usize, usize, f64)> {
    let mut peak: Option<(usize, usize, f64)> = None;
    for (day, hours) in days.iter().enumerate() {
        for (hour, value) in hours.iter().enumerate() {
            if peak.is_none_or(|(_, _, max)| *value > max) {
                peak = Some((day, hour, *value));
            }
        }
    }
    peak
}

/// Hourly energy for each fueltype over the modelled days of a year.
///
/// Days are indexed by their position in the list of modelled days, not by day of year.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyFuel([Vec<DayHours>; FuelType::COUNT]);

impl HourlyFuel {
    /// Create an all-zero hourly array covering `num_days` days
    pub fn zeros(num_days: usize) -> Self {
        Self(std::array::from_fn(|_| {
            vec![[0.0; HOURS_PER_DAY]; num_days]
        }))
    }

    /// The number of days covered
    pub fn num_days(&self) -> usize {
        self.0[0].len()
    }

    /// Hourly values for one fueltype
    pub fn get(&self, fueltype: FuelType) -> &[DayHours] {
        &self.0[fueltype.index()]
    }

    /// Mutable hourly values for one fueltype
    pub fn get_mut(&mut self, fueltype: FuelType) -> &mut [DayHours] {
        &mut self.0[fueltype.index()]
    }

    /// Add `value` spread according to `shape` to the given fueltype.
    ///
    /// `shape` must cover the same number of days as `self`.
    pub fn add_shaped(&mut self, fueltype: FuelType, value: f64, shape: &[DayHours]) {
        assert_eq!(shape.len(), self.num_days(), "Shape length mismatch");
        for (day, shape_day) in self.get_mut(fueltype).iter_mut().zip(shape) {
            for (hour, share) in day.iter_mut().zip(shape_day) {
                *hour += value * share;
            }
        }
    }

    /// Add another hourly array to this one
    pub fn add(&mut self, other: &HourlyFuel) {
        for fueltype in FuelType::iter() {
            for (day, other_day) in self.get_mut(fueltype).iter_mut().zip(other.get(fueltype)) {
                for (hour, other_hour) in day.iter_mut().zip(other_day) {
                    *hour += other_hour;
                }
            }
        }
    }

    /// Total over all hours for one fueltype
    pub fn total(&self, fueltype: FuelType) -> f64 {
        self.get(fueltype).iter().flatten().sum()
    }

    /// Totals over all hours for every fueltype
    pub fn annual(&self) -> FuelVector {
        let mut fuel = FuelVector::zeros();
        for fueltype in FuelType::iter() {
            fuel[fueltype] = self.total(fueltype);
        }
        fuel
    }

    /// Find the hour with the highest demand for a fueltype.
    ///
    /// # Returns
    ///
    /// `(day, hour, value)` of the first maximum, or `None` if no days are covered.
    pub fn peak(&self, fueltype: FuelType) -> Option<(usize, usize, f64)> {
        peak_hour(self.get(fueltype))
    }

    /// Check that no entry is negative (or NaN)
    pub fn check_non_negative(&self) -> Result<()> {
        for fueltype in FuelType::iter() {
            ensure!(
                self.get(fueltype).iter().flatten().all(|value| *value >= 0.0),
                "Negative or invalid hourly fuel value for fueltype {fueltype}"
            );
        }

        Ok(())
    }
}
