//! Temperature-derived quantities: degree days, climate scaling factors and peak days.
use crate::fueltype::{DAYS_PER_YEAR, HOURS_PER_DAY};
use anyhow::{Result, ensure};
use serde_string_enum::DeserializeLabeledStringEnum;

/// How an end use responds to the climate
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, DeserializeLabeledStringEnum)]
pub enum ClimateClass {
    /// Demand scales with heating degree days
    #[string = "heating"]
    Heating,
    /// Demand scales with cooling degree days
    #[string = "cooling"]
    Cooling,
    /// Demand is independent of temperature
    #[default]
    #[string = "none"]
    Unaffected,
}

/// Daily mean temperatures for one region and year
#[derive(PartialEq, Debug, Clone)]
pub struct YearWeather {
    temperatures: Vec<f64>,
}

impl YearWeather {
    /// Create a new [`YearWeather`] from daily mean temperatures (°C) for every day of the year
    pub fn new(temperatures: Vec<f64>) -> Result<Self> {
        ensure!(
            temperatures.len() == DAYS_PER_YEAR,
            "Expected temperatures for {DAYS_PER_YEAR} days, got {}",
            temperatures.len()
        );
        ensure!(
            temperatures.iter().all(|t| t.is_finite()),
            "Temperatures must be finite"
        );

        Ok(Self { temperatures })
    }

    /// Daily mean temperatures
    pub fn daily(&self) -> &[f64] {
        &self.temperatures
    }

    /// Temperature for every hour of the year, taking each day's mean for all its hours
    pub fn hourly(&self) -> Vec<f64> {
        self.temperatures
            .iter()
            .flat_map(|t| [*t; HOURS_PER_DAY])
            .collect()
    }

    /// Heating degree days for each day
    pub fn heating_degree_days(&self, t_base_heating: f64) -> Vec<f64> {
        self.temperatures
            .iter()
            .map(|t| (t_base_heating - t).max(0.0))
            .collect()
    }

    /// Cooling degree days for each day
    pub fn cooling_degree_days(&self, t_base_cooling: f64) -> Vec<f64> {
        self.temperatures
            .iter()
            .map(|t| (t - t_base_cooling).max(0.0))
            .collect()
    }

    /// The day with the greatest heating need, or `None` if it is never below `t_base_heating`
    pub fn peak_heating_day(&self, t_base_heating: f64) -> Option<usize> {
        let degrees: Vec<_> = self
            .hourly()
            .iter()
            .map(|t| (t_base_heating - t).max(0.0))
            .collect();
        peak_day_from_hourly(&degrees)
    }

    /// The day with the greatest cooling need, or `None` if it is never above `t_base_cooling`
    pub fn peak_cooling_day(&self, t_base_cooling: f64) -> Option<usize> {
        let degrees: Vec<_> = self
            .hourly()
            .iter()
            .map(|t| (t - t_base_cooling).max(0.0))
            .collect();
        peak_day_from_hourly(&degrees)
    }
}

/// Ratios of current-year to base-year degree days for a region
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ClimateFactors {
    /// Scaling for heating end uses
    pub heating: f64,
    /// Scaling for cooling end uses
    pub cooling: f64,
}

impl Default for ClimateFactors {
    fn default() -> Self {
        Self {
            heating: 1.0,
            cooling: 1.0,
        }
    }
}

/// The ratio `cy / by`, or 1 if the base-year value is zero
fn ratio_or_neutral(by: f64, cy: f64) -> f64 {
    if by == 0.0 { 1.0 } else { cy / by }
}

impl ClimateFactors {
    /// Calculate the factors from base-year and current-year weather
    pub fn calculate(
        weather_by: &YearWeather,
        weather_cy: &YearWeather,
        t_base_heating: f64,
        t_base_cooling: f64,
    ) -> Self {
        let hdd_by: f64 = weather_by.heating_degree_days(t_base_heating).iter().sum();
        let hdd_cy: f64 = weather_cy.heating_degree_days(t_base_heating).iter().sum();
        let cdd_by: f64 = weather_by.cooling_degree_days(t_base_cooling).iter().sum();
        let cdd_cy: f64 = weather_cy.cooling_degree_days(t_base_cooling).iter().sum();

        Self {
            heating: ratio_or_neutral(hdd_by, hdd_cy),
            cooling: ratio_or_neutral(cdd_by, cdd_cy),
        }
    }

    /// The scaling factor for an end use of the given class
    pub fn factor_for(&self, class: ClimateClass) -> f64 {
        match class {
            ClimateClass::Heating => self.heating,
            ClimateClass::Cooling => self.cooling,
            ClimateClass::Unaffected => 1.0,
        }
    }
}

/// The day of the year containing the given hour of the year
pub fn peak_day_from_hour(hour_of_year: usize) -> usize {
    hour_of_year / HOURS_PER_DAY
}

/// The day containing the hour of the year with the largest value (the first, if tied), or `None`
/// if all values are zero
pub fn peak_day_from_hourly(hourly_values: &[f64]) -> Option<usize> {
    let (hour, max) = hourly_values
        .iter()
        .copied()
        .enumerate()
        .rev()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))?;
    (max > 0.0).then(|| peak_day_from_hour(hour))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn weather(value: f64) -> YearWeather {
        YearWeather::new(vec![value; DAYS_PER_YEAR]).unwrap()
    }

    #[test]
    fn test_year_weather_new_invalid() {
        assert!(YearWeather::new(vec![10.0; 10]).is_err());
        let mut temps = vec![10.0; DAYS_PER_YEAR];
        temps[3] = f64::NAN;
        assert!(YearWeather::new(temps).is_err());
    }

    #[test]
    fn test_degree_days() {
        let weather = weather(10.0);
        assert_approx_eq!(f64, weather.heating_degree_days(15.5)[0], 5.5);
        assert_eq!(weather.cooling_degree_days(21.0)[0], 0.0);
        assert_eq!(weather.hourly().len(), DAYS_PER_YEAR * HOURS_PER_DAY);
    }

    #[test]
    fn test_climate_factors() {
        let factors = ClimateFactors::calculate(&weather(5.5), &weather(10.5), 15.5, 21.0);
        assert_approx_eq!(f64, factors.heating, 0.5);
        // No cooling degree days in base year
        assert_eq!(factors.cooling, 1.0);
        assert_eq!(factors.factor_for(ClimateClass::Unaffected), 1.0);
        assert_approx_eq!(f64, factors.factor_for(ClimateClass::Heating), 0.5);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(23, 0)]
    #[case(24, 1)]
    #[case(8759, 364)]
    fn test_peak_day_from_hour(#[case] hour: usize, #[case] expected: usize) {
        assert_eq!(peak_day_from_hour(hour), expected);
    }

    #[test]
    fn test_peak_day_from_hourly() {
        assert_eq!(peak_day_from_hourly(&[1.0; 30]), Some(0));
        assert_eq!(peak_day_from_hourly(&[0.0; 30]), None);
        assert_eq!(peak_day_from_hourly(&[]), None);
        let mut hourly = vec![0.0; 72];
        hourly[47] = 5.0;
        hourly[48] = 5.0;
        assert_eq!(peak_day_from_hourly(&hourly), Some(1));
    }

    #[test]
    fn test_peak_heating_and_cooling_day() {
        let mut temps = vec![18.0; DAYS_PER_YEAR];
        temps[200] = -3.0;
        temps[201] = -3.0;
        temps[30] = 30.0;
        let weather = YearWeather::new(temps).unwrap();
        assert_eq!(weather.peak_heating_day(15.5), Some(200));
        assert_eq!(weather.peak_cooling_day(21.0), Some(30));
        assert_eq!(weather.peak_cooling_day(35.0), None);
    }
}
