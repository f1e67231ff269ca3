//! The module responsible for writing output data to disk.
use crate::fueltype::{DayHours, peak_hour};
use crate::region::RegionID;
use crate::simulation::AggregatedDemand;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "enduse_demand_results";

/// The output file name for annual demand
const ANNUAL_DEMAND_FILE_NAME: &str = "annual_demand.csv";

/// The output file name for peak-hour demand
const PEAK_DEMAND_FILE_NAME: &str = "peak_demand.csv";

/// The output file name for hourly demand
const HOURLY_DEMAND_FILE_NAME: &str = "debug_hourly_demand.csv";

/// Get the model name from the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model specified at `model_dir`.
///
/// # Arguments
///
/// * `output_dir` - The folder to create
/// * `allow_overwrite` - Whether to delete the contents of `output_dir` if it is not empty
///
/// # Returns
///
/// Whether an existing folder with contents was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut entries) = fs::read_dir(output_dir) {
        if entries.next().is_none() {
            // already exists and is empty
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use the --overwrite option to replace \
            its contents."
        );
        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the annual demand CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct AnnualDemandRow {
    year: u32,
    region: RegionID,
    key: String,
    fuel: f64,
}

/// Represents a row in the peak demand CSV file or the hourly demand CSV file.
///
/// `day` is the day of the year, regardless of which days are modelled.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct HourlyDemandRow {
    year: u32,
    region: RegionID,
    key: String,
    day: usize,
    hour: usize,
    value: f64,
}

/// For writing extra debug information about the model
struct DebugDataWriter {
    hourly_demand_writer: csv::Writer<File>,
}

impl DebugDataWriter {
    /// Open CSV files to write debug info to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    fn create(output_path: &Path) -> Result<Self> {
        let file_path = output_path.join(HOURLY_DEMAND_FILE_NAME);
        Ok(Self {
            hourly_demand_writer: csv::Writer::from_path(file_path)?,
        })
    }

    /// Write the demand of every modelled hour to file
    fn write_hourly_demand(
        &mut self,
        year: u32,
        region_id: &RegionID,
        key: &str,
        days: &[DayHours],
        modelled_days: &[usize],
    ) -> Result<()> {
        for (day, hours) in modelled_days.iter().zip(days) {
            for (hour, value) in hours.iter().enumerate() {
                let row = HourlyDemandRow {
                    year,
                    region: region_id.clone(),
                    key: key.to_string(),
                    day: *day,
                    hour,
                    value: *value,
                };
                self.hourly_demand_writer.serialize(row)?;
            }
        }

        Ok(())
    }

    /// Flush the underlying streams
    fn flush(&mut self) -> Result<()> {
        self.hourly_demand_writer.flush()?;

        Ok(())
    }
}

/// An object for writing simulated demand to file
pub struct DataWriter {
    annual_demand_writer: csv::Writer<File>,
    peak_demand_writer: csv::Writer<File>,
    debug_writer: Option<DebugDataWriter>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(output_path: &Path, save_debug_info: bool) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let debug_writer = if save_debug_info {
            // Create debug CSV files
            Some(DebugDataWriter::create(output_path)?)
        } else {
            None
        };

        Ok(Self {
            annual_demand_writer: new_writer(ANNUAL_DEMAND_FILE_NAME)?,
            peak_demand_writer: new_writer(PEAK_DEMAND_FILE_NAME)?,
            debug_writer,
        })
    }

    /// Write the annual and peak demand of one region and year.
    ///
    /// # Arguments
    ///
    /// * `year` - The simulated year
    /// * `region_id` - The region
    /// * `demand` - Hourly demand for each output key
    /// * `modelled_days` - The days of the year to which the hourly demand belongs
    pub fn write_demand(
        &mut self,
        year: u32,
        region_id: &RegionID,
        demand: &AggregatedDemand,
        modelled_days: &[usize],
    ) -> Result<()> {
        for (key, days) in demand.iter() {
            let row = AnnualDemandRow {
                year,
                region: region_id.clone(),
                key: key.to_string(),
                fuel: days.iter().flatten().sum(),
            };
            self.annual_demand_writer.serialize(row)?;

            if let Some((day, hour, value)) = peak_hour(days) {
                let row = HourlyDemandRow {
                    year,
                    region: region_id.clone(),
                    key: key.to_string(),
                    day: modelled_days[day],
                    hour,
                    value,
                };
                self.peak_demand_writer.serialize(row)?;
            }

            if let Some(wtr) = &mut self.debug_writer {
                wtr.write_hourly_demand(year, region_id, key, days, modelled_days)?;
            }
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.annual_demand_writer.flush()?;
        self.peak_demand_writer.flush()?;
        if let Some(wtr) = &mut self.debug_writer {
            wtr.flush()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fueltype::HOURS_PER_DAY;
    use itertools::{Itertools, assert_equal};
    use rstest::{fixture, rstest};
    use std::iter;
    use tempfile::tempdir;

    #[fixture]
    fn demand() -> AggregatedDemand {
        let mut days = vec![[1.0; HOURS_PER_DAY]; 2];
        days[1][18] = 5.0;
        let mut demand = AggregatedDemand::default();
        demand.add("residential_gas_boiler_gas".into(), &days);
        demand
    }

    fn read_rows<T: serde::de::DeserializeOwned>(file_path: &Path) -> Vec<T> {
        csv::Reader::from_path(file_path)
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap()
    }

    #[rstest]
    fn test_write_demand(demand: AggregatedDemand) {
        let dir = tempdir().unwrap();
        let region_id: RegionID = "GBR".into();

        {
            let mut writer = DataWriter::create(dir.path(), false).unwrap();
            writer
                .write_demand(2020, &region_id, &demand, &[10, 200])
                .unwrap();
            writer.flush().unwrap();
        }

        let expected = AnnualDemandRow {
            year: 2020,
            region: region_id.clone(),
            key: "residential_gas_boiler_gas".into(),
            fuel: 52.0,
        };
        let records: Vec<AnnualDemandRow> = read_rows(&dir.path().join(ANNUAL_DEMAND_FILE_NAME));
        assert_equal(records, iter::once(expected));

        // Peak day is reported as a day of the year
        let expected = HourlyDemandRow {
            year: 2020,
            region: region_id,
            key: "residential_gas_boiler_gas".into(),
            day: 200,
            hour: 18,
            value: 5.0,
        };
        let records: Vec<HourlyDemandRow> = read_rows(&dir.path().join(PEAK_DEMAND_FILE_NAME));
        assert_equal(records, iter::once(expected));

        assert!(!dir.path().join(HOURLY_DEMAND_FILE_NAME).exists());
    }

    #[rstest]
    fn test_write_hourly_demand(demand: AggregatedDemand) {
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path(), true).unwrap();
            writer
                .write_demand(2020, &"GBR".into(), &demand, &[0, 1])
                .unwrap();
            writer.flush().unwrap();
        }

        let records: Vec<HourlyDemandRow> = read_rows(&dir.path().join(HOURLY_DEMAND_FILE_NAME));
        assert_eq!(records.len(), 2 * HOURS_PER_DAY);
        assert_eq!(records[HOURS_PER_DAY + 18].value, 5.0);
        assert_eq!(records[HOURS_PER_DAY + 18].day, 1);
    }

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("results");

        // New folder
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // Existing empty folder
        assert!(!create_output_directory(&output_dir, false).unwrap());

        // Existing folder with contents
        fs::write(output_dir.join("file.txt"), "contents").unwrap();
        assert!(create_output_directory(&output_dir, false).is_err());
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(!output_dir.join("file.txt").exists());
    }
}
