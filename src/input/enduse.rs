//! Code for reading end uses from a CSV file.
use super::*;
use crate::climate::ClimateClass;
use crate::enduse::{Enduse, EnduseMap};
use crate::id::{EnduseID, SubmodelID};
use serde::Deserialize;
use std::path::Path;

const ENDUSES_FILE_NAME: &str = "enduses.csv";

/// An end use as it appears in the CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct EnduseRaw {
    id: EnduseID,
    submodel: SubmodelID,
    #[serde(default)]
    climate_class: ClimateClass,
    /// Driver names, separated by semicolons
    #[serde(default)]
    drivers: String,
    #[serde(default)]
    flat_profile: bool,
}

/// Read end uses from the end uses CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A map of end uses, keyed by ID, or an error.
pub fn read_enduses(model_dir: &Path) -> Result<EnduseMap> {
    let file_path = model_dir.join(ENDUSES_FILE_NAME);
    let enduses_csv = read_csv(&file_path)?;
    read_enduses_from_iter(enduses_csv).with_context(|| input_err_msg(&file_path))
}

fn read_enduses_from_iter<I>(iter: I) -> Result<EnduseMap>
where
    I: Iterator<Item = EnduseRaw>,
{
    let mut enduses = EnduseMap::new();
    for raw in iter {
        let drivers: Vec<String> = raw
            .drivers
            .split(';')
            .map(str::trim)
            .filter(|driver| !driver.is_empty())
            .map(ToString::to_string)
            .collect();
        ensure!(
            drivers.iter().all_unique(),
            "Duplicate drivers given for end use {}",
            raw.id
        );

        let enduse = Enduse {
            id: raw.id.clone(),
            submodel: raw.submodel,
            climate_class: raw.climate_class,
            drivers,
            flat_profile: raw.flat_profile,
        };
        ensure!(
            enduses.insert(raw.id.clone(), enduse).is_none(),
            "Duplicate ID found: {}",
            raw.id
        );
    }

    Ok(enduses)
}
