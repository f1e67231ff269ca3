//! Peak shaving: flattening each day's load curve to reach a higher load factor.
//!
//! Demand above the day's new allowed maximum is clipped and moved to the hours below the day's
//! mean, in proportion to how far each is below the mean. Each day's total is unchanged.
use crate::fueltype::{DayHours, FuelType, HOURS_PER_DAY, HourlyFuel};
use log::trace;
use strum::IntoEnumIterator;

/// The load factor (mean divided by maximum) of a day, or `None` if the day has no demand
pub fn load_factor(day: &DayHours) -> Option<f64> {
    let max = day.iter().copied().fold(0.0, f64::max);
    (max > 0.0).then(|| day.iter().sum::<f64>() / HOURS_PER_DAY as f64 / max)
}

/// Shave the peak of a single day.
///
/// # Arguments
///
/// * `day` - Hourly demand for the day
/// * `improvement` - Amount added to the day's load factor (capped so it does not exceed one)
pub fn shave_day(day: &mut DayHours, improvement: f64) {
    let Some(current) = load_factor(day) else {
        return;
    };
    let target = (current + improvement).min(1.0);
    if target <= current {
        return;
    }

    let mean = day.iter().sum::<f64>() / HOURS_PER_DAY as f64;
    let new_max = mean / target;

    let mut excess = 0.0;
    for value in day.iter_mut() {
        if *value > new_max {
            excess += *value - new_max;
            *value = new_max;
        }
    }

    let shortfall: f64 = day.iter().map(|value| (mean - value).max(0.0)).sum();
    if shortfall <= 0.0 {
        return;
    }
    for value in day.iter_mut() {
        let below_mean = (mean - *value).max(0.0);
        *value += excess * below_mean / shortfall;
    }
}

/// Shave the peaks of every day and fueltype.
///
/// An improvement of zero leaves the demand unchanged.
pub fn shave_peaks(hourly: &mut HourlyFuel, improvement: f64) {
    if improvement <= 0.0 {
        return;
    }

    trace!("Shaving peaks with load factor improvement {improvement}");
    for fueltype in FuelType::iter() {
        for day in hourly.get_mut(fueltype) {
            shave_day(day, improvement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn peaky_day() -> DayHours {
        let mut day = [1.0; HOURS_PER_DAY];
        day[8] = 5.0;
        day[18] = 8.0;
        day[3] = 0.2;
        day
    }

    #[rstest]
    #[case(0.1)]
    #[case(0.3)]
    #[case(1.0)]
    fn test_shave_day(peaky_day: DayHours, #[case] improvement: f64) {
        let before: f64 = peaky_day.iter().sum();
        let lf_before = load_factor(&peaky_day).unwrap();
        let mut day = peaky_day;
        shave_day(&mut day, improvement);

        let after: f64 = day.iter().sum();
        assert_approx_eq!(f64, before, after, epsilon = 1e-9);

        let target = (lf_before + improvement).min(1.0);
        let new_max = before / HOURS_PER_DAY as f64 / target;
        assert!(day.iter().all(|value| *value <= new_max + 1e-9));
        assert!(load_factor(&day).unwrap() > lf_before);
    }

    #[rstest]
    fn test_shave_day_no_improvement(peaky_day: DayHours) {
        let mut day = peaky_day;
        shave_day(&mut day, 0.0);
        assert_eq!(day, peaky_day);
    }

    #[test]
    fn test_shave_day_empty() {
        let mut day = [0.0; HOURS_PER_DAY];
        shave_day(&mut day, 0.5);
        assert_eq!(day, [0.0; HOURS_PER_DAY]);
        assert_eq!(load_factor(&day), None);
    }

    #[test]
    fn test_shave_day_flat() {
        let mut day = [2.0; HOURS_PER_DAY];
        assert_eq!(load_factor(&day), Some(1.0));
        shave_day(&mut day, 0.5);
        assert_eq!(day, [2.0; HOURS_PER_DAY]);
    }

    #[rstest]
    fn test_shave_peaks(peaky_day: DayHours) {
        let mut hourly = HourlyFuel::zeros(2);
        hourly.get_mut(FuelType::Electricity)[1] = peaky_day;
        hourly.get_mut(FuelType::Gas)[0] = peaky_day;
        let totals_before = hourly.annual();

        let mut unchanged = hourly.clone();
        shave_peaks(&mut unchanged, 0.0);
        assert_eq!(unchanged, hourly);

        shave_peaks(&mut hourly, 0.2);
        let totals_after = hourly.annual();
        for fueltype in FuelType::iter() {
            assert_approx_eq!(
                f64,
                totals_before[fueltype],
                totals_after[fueltype],
                epsilon = 1e-9
            );
        }
        assert!(hourly.get(FuelType::Electricity)[1][18] < 8.0);
        assert_eq!(hourly.get(FuelType::Electricity)[0], [0.0; HOURS_PER_DAY]);
    }
}
