//! Code for reading technology fuel shares and service switches from CSV files.
use super::*;
use crate::diffusion::SigmoidParameters;
use crate::enduse::EnduseMap;
use crate::fuel_share::{FuelShares, FuelSharesMap};
use crate::fueltype::FuelType;
use crate::id::{EnduseID, IDCollection, SectorID, TechnologyID};
use crate::model::ServiceSwitchMap;
use crate::technology::TechnologyDefinitionMap;
use serde::Deserialize;
use std::path::Path;

const FUEL_SHARES_FILE_NAME: &str = "fuel_shares.csv";
const SERVICE_SWITCHES_FILE_NAME: &str = "service_switches.csv";

/// The share of an end use's fuel of one fueltype used by a technology
#[derive(PartialEq, Debug, Deserialize)]
struct FuelShareRaw {
    enduse: String,
    sector: SectorID,
    fueltype: FuelType,
    technology: String,
    share: f64,
}

/// The diffusion curve of one technology in a service switch
#[derive(PartialEq, Debug, Deserialize)]
struct ServiceSwitchRaw {
    enduse: String,
    sector: SectorID,
    technology: String,
    midpoint: f64,
    steepness: f64,
    l_parameter: f64,
}

/// Read fuel shares from the fuel shares CSV file.
///
/// The file is optional: end uses without fuel shares are simulated without technologies.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `enduses` - All end uses
/// * `technologies` - All technology definitions
pub fn read_fuel_shares(
    model_dir: &Path,
    enduses: &EnduseMap,
    technologies: &TechnologyDefinitionMap,
) -> Result<FuelSharesMap> {
    let file_path = model_dir.join(FUEL_SHARES_FILE_NAME);
    let fuel_shares_csv = read_csv_optional(&file_path)?;
    read_fuel_shares_from_iter(fuel_shares_csv, enduses, technologies)
        .with_context(|| input_err_msg(&file_path))
}

fn read_fuel_shares_from_iter<I>(
    iter: I,
    enduses: &EnduseMap,
    technologies: &TechnologyDefinitionMap,
) -> Result<FuelSharesMap>
where
    I: Iterator<Item = FuelShareRaw>,
{
    type RawShares = IndexMap<FuelType, IndexMap<TechnologyID, f64>>;
    let mut map: IndexMap<(EnduseID, SectorID), RawShares> = IndexMap::new();
    for raw in iter {
        let enduse = enduses.get_id_by_str(&raw.enduse)?;
        let technology: TechnologyID = technologies.get_id_by_str(&raw.technology)?;
        check_fraction(raw.share, "share")?;

        let shares = map
            .entry((enduse.clone(), raw.sector.clone()))
            .or_default()
            .entry(raw.fueltype)
            .or_default();
        ensure!(
            shares.insert(technology.clone(), raw.share).is_none(),
            "Duplicate share for technology {technology} in end use {enduse} and sector {}",
            raw.sector
        );
    }

    map.into_iter()
        .map(|((enduse, sector), shares)| {
            let shares = FuelShares::new(shares).with_context(|| {
                format!("Invalid fuel shares for end use {enduse} and sector {sector}")
            })?;
            Ok(((enduse, sector), shares))
        })
        .collect()
}

/// Read service switches from the service switches CSV file.
///
/// The file is optional.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `enduses` - All end uses
/// * `technologies` - All technology definitions
pub fn read_service_switches(
    model_dir: &Path,
    enduses: &EnduseMap,
    technologies: &TechnologyDefinitionMap,
) -> Result<ServiceSwitchMap> {
    let file_path = model_dir.join(SERVICE_SWITCHES_FILE_NAME);
    let switches_csv = read_csv_optional(&file_path)?;
    read_service_switches_from_iter(switches_csv, enduses, technologies)
        .with_context(|| input_err_msg(&file_path))
}

fn read_service_switches_from_iter<I>(
    iter: I,
    enduses: &EnduseMap,
    technologies: &TechnologyDefinitionMap,
) -> Result<ServiceSwitchMap>
where
    I: Iterator<Item = ServiceSwitchRaw>,
{
    let mut map = ServiceSwitchMap::new();
    for raw in iter {
        let enduse = enduses.get_id_by_str(&raw.enduse)?;
        let technology: TechnologyID = technologies.get_id_by_str(&raw.technology)?;
        ensure!(
            raw.l_parameter >= 0.0,
            "l_parameter of technology {technology} must not be negative"
        );

        let switch = map.entry((enduse.clone(), raw.sector.clone())).or_default();
        let parameters = SigmoidParameters {
            midpoint: raw.midpoint,
            steepness: raw.steepness,
            l_parameter: raw.l_parameter,
        };
        ensure!(
            switch.insert(technology.clone(), parameters).is_none(),
            "Duplicate switch for technology {technology} in end use {enduse} and sector {}",
            raw.sector
        );
    }

    Ok(map)
}
