//! Code for reading daily temperatures from a CSV file.
use super::*;
use crate::climate::YearWeather;
use crate::fueltype::DAYS_PER_YEAR;
use crate::id::IDCollection;
use crate::model::WeatherMap;
use crate::region::RegionID;
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const TEMPERATURES_FILE_NAME: &str = "temperatures.csv";

/// The mean temperature of one day
#[derive(PartialEq, Debug, Deserialize)]
struct TemperatureRaw {
    region: String,
    year: u32,
    /// Day of the year, starting from zero
    day: usize,
    temperature: f64,
}

/// Read daily temperatures from the temperatures CSV file.
///
/// The file is optional. If given, every region and year listed must have a temperature for every
/// day of the year.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `region_ids` - All possible region IDs
pub fn read_weather(model_dir: &Path, region_ids: &IndexSet<RegionID>) -> Result<WeatherMap> {
    let file_path = model_dir.join(TEMPERATURES_FILE_NAME);
    let temperatures_csv = read_csv_optional(&file_path)?;
    read_weather_from_iter(temperatures_csv, region_ids).with_context(|| input_err_msg(&file_path))
}

fn read_weather_from_iter<I>(iter: I, region_ids: &IndexSet<RegionID>) -> Result<WeatherMap>
where
    I: Iterator<Item = TemperatureRaw>,
{
    let mut days: HashMap<(RegionID, u32), Vec<Option<f64>>> = HashMap::new();
    for raw in iter {
        let region_id = region_ids.get_id_by_str(&raw.region)?;
        ensure!(
            raw.day < DAYS_PER_YEAR,
            "Day must be between 0 and {} (got {})",
            DAYS_PER_YEAR - 1,
            raw.day
        );

        let temperatures = days
            .entry((region_id.clone(), raw.year))
            .or_insert_with(|| vec![None; DAYS_PER_YEAR]);
        ensure!(
            temperatures[raw.day].replace(raw.temperature).is_none(),
            "Duplicate temperature for region {region_id}, year {} and day {}",
            raw.year,
            raw.day
        );
    }

    days.into_iter()
        .map(|((region_id, year), temperatures)| {
            let temperatures: Option<Vec<f64>> = temperatures.into_iter().collect();
            let temperatures = temperatures.with_context(|| {
                format!("Missing temperatures for some days for region {region_id} and year {year}")
            })?;
            let weather = YearWeather::new(temperatures)
                .with_context(|| format!("Invalid temperatures for region {region_id}"))?;
            Ok(((region_id, year), weather))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, region_ids};
    use rstest::rstest;

    fn year(region: &str, temperature: f64) -> impl Iterator<Item = TemperatureRaw> + '_ {
        (0..DAYS_PER_YEAR).map(move |day| TemperatureRaw {
            region: region.into(),
            year: 2015,
            day,
            temperature,
        })
    }

    #[rstest]
    fn test_read_weather_from_iter(region_ids: IndexSet<RegionID>) {
        let iter = year("GBR", 5.0).chain(year("USA", 10.0));
        let weather = read_weather_from_iter(iter, &region_ids).unwrap();
        assert_eq!(weather.len(), 2);
        let key: (RegionID, u32) = ("USA".into(), 2015);
        assert_eq!(weather[&key].daily()[100], 10.0);
    }

    #[rstest]
    fn test_read_weather_missing_day(region_ids: IndexSet<RegionID>) {
        let iter = year("GBR", 5.0).skip(1);
        assert_error!(
            read_weather_from_iter(iter, &region_ids),
            "Missing temperatures for some days for region GBR and year 2015"
        );
    }

    #[rstest]
    fn test_read_weather_invalid_day(region_ids: IndexSet<RegionID>) {
        let iter = [TemperatureRaw {
            region: "GBR".into(),
            year: 2015,
            day: 365,
            temperature: 0.0,
        }]
        .into_iter();
        assert_error!(
            read_weather_from_iter(iter, &region_ids),
            "Day must be between 0 and 364 (got 365)"
        );
    }
}
