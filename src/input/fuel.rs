//! Code for reading base-year fuel and scenario drivers from CSV files.
use super::*;
use crate::enduse::EnduseMap;
use crate::fueltype::{FuelType, FuelVector};
use crate::id::{IDCollection, SectorID};
use crate::model::{DriverMap, FuelMap};
use crate::region::RegionID;
use indexmap::IndexSet;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const FUELS_FILE_NAME: &str = "fuels.csv";
const DRIVERS_FILE_NAME: &str = "drivers.csv";

/// Base-year fuel of one fueltype for an end use in a sector and region
#[derive(PartialEq, Debug, Deserialize)]
struct FuelRaw {
    region: String,
    sector: SectorID,
    enduse: String,
    fueltype: FuelType,
    fuel: f64,
}

/// The value of a scenario driver in a region and year
#[derive(PartialEq, Debug, Deserialize)]
struct DriverRaw {
    region: String,
    year: u32,
    driver: String,
    value: f64,
}

/// Read base-year fuel from the fuels CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `region_ids` - All possible region IDs
/// * `enduses` - All end uses
///
/// # Returns
///
/// Base-year fuel grouped by region, end use and sector.
pub fn read_fuels(
    model_dir: &Path,
    region_ids: &IndexSet<RegionID>,
    enduses: &EnduseMap,
) -> Result<FuelMap> {
    let file_path = model_dir.join(FUELS_FILE_NAME);
    let fuels_csv = read_csv(&file_path)?;
    read_fuels_from_iter(fuels_csv, region_ids, enduses).with_context(|| input_err_msg(&file_path))
}

fn read_fuels_from_iter<I>(
    iter: I,
    region_ids: &IndexSet<RegionID>,
    enduses: &EnduseMap,
) -> Result<FuelMap>
where
    I: Iterator<Item = FuelRaw>,
{
    let mut map = FuelMap::new();
    let mut seen = HashSet::new();
    for raw in iter {
        let region_id = region_ids.get_id_by_str(&raw.region)?;
        let enduse = enduses.get_id_by_str(&raw.enduse)?;
        ensure!(
            raw.fuel.is_finite() && raw.fuel >= 0.0,
            "Fuel must be a non-negative number (got {} for end use {enduse})",
            raw.fuel
        );
        ensure!(
            seen.insert((
                region_id.clone(),
                enduse.clone(),
                raw.sector.clone(),
                raw.fueltype
            )),
            "Duplicate {} fuel for end use {enduse}, sector {} and region {region_id}",
            raw.fueltype,
            raw.sector
        );

        let fuel = map
            .entry(region_id)
            .or_default()
            .entry((enduse, raw.sector))
            .or_insert_with(FuelVector::zeros);
        fuel[raw.fueltype] = raw.fuel;
    }

    Ok(map)
}

/// Read scenario drivers from the drivers CSV file.
///
/// Every driver named by an end use must be given for every region, the base year and every
/// simulated year. The file is optional if no end use has drivers.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `region_ids` - All possible region IDs
/// * `enduses` - All end uses
/// * `base_yr` - The base year
/// * `simulated_yrs` - All simulated years
pub fn read_drivers(
    model_dir: &Path,
    region_ids: &IndexSet<RegionID>,
    enduses: &EnduseMap,
    base_yr: u32,
    simulated_yrs: &[u32],
) -> Result<DriverMap> {
    let file_path = model_dir.join(DRIVERS_FILE_NAME);
    let drivers_csv = read_csv_optional(&file_path)?;
    read_drivers_from_iter(drivers_csv, region_ids, enduses, base_yr, simulated_yrs)
        .with_context(|| input_err_msg(&file_path))
}

fn read_drivers_from_iter<I>(
    iter: I,
    region_ids: &IndexSet<RegionID>,
    enduses: &EnduseMap,
    base_yr: u32,
    simulated_yrs: &[u32],
) -> Result<DriverMap>
where
    I: Iterator<Item = DriverRaw>,
{
    let mut map = DriverMap::new();
    for raw in iter {
        let region_id = region_ids.get_id_by_str(&raw.region)?;
        try_insert(&mut map, (region_id, raw.year, raw.driver), raw.value)?;
    }

    let names: IndexSet<&String> = enduses
        .values()
        .flat_map(|enduse| enduse.drivers.iter())
        .collect();
    let years = || std::iter::once(base_yr).chain(simulated_yrs.iter().copied());
    for name in names {
        for region_id in region_ids {
            for year in years() {
                ensure!(
                    map.contains_key(&(region_id.clone(), year, name.clone())),
                    "Missing value for driver {name} in region {region_id} and year {year}"
                );
            }
        }
    }

    Ok(map)
}
