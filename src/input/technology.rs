//! Code for reading technology definitions from a CSV file.
use super::*;
use crate::diffusion::DiffusionChoice;
use crate::fueltype::FuelType;
use crate::id::TechnologyID;
use crate::technology::{
    HybridDefinition, TechnologyDefinition, TechnologyDefinitionMap, TechnologyType,
};
use serde::Deserialize;
use std::path::Path;

const TECHNOLOGIES_FILE_NAME: &str = "technologies.csv";

/// A technology as it appears in the CSV file.
///
/// The last four columns are only filled in for hybrid technologies.
#[derive(PartialEq, Debug, Deserialize)]
struct TechnologyRaw {
    id: TechnologyID,
    fueltype: FuelType,
    tech_type: TechnologyType,
    eff_by: f64,
    eff_ey: f64,
    eff_achieved: f64,
    diff_method: DiffusionChoice,
    yr_until_changed: u32,
    tech_low_temp: Option<TechnologyID>,
    tech_high_temp: Option<TechnologyID>,
    temp_cutoff_low: Option<f64>,
    temp_cutoff_high: Option<f64>,
}

impl TechnologyRaw {
    /// Collect the hybrid columns, if any are given
    fn hybrid(&self) -> Result<Option<HybridDefinition>> {
        match (
            &self.tech_low_temp,
            &self.tech_high_temp,
            self.temp_cutoff_low,
            self.temp_cutoff_high,
        ) {
            (None, None, None, None) => Ok(None),
            (Some(low), Some(high), Some(cutoff_low), Some(cutoff_high)) => {
                Ok(Some(HybridDefinition {
                    tech_low_temp: low.clone(),
                    tech_high_temp: high.clone(),
                    temp_cutoff_low: cutoff_low,
                    temp_cutoff_high: cutoff_high,
                }))
            }
            _ => bail!(
                "Technology {} must give either all or none of tech_low_temp, tech_high_temp, \
                temp_cutoff_low and temp_cutoff_high",
                self.id
            ),
        }
    }
}

/// Read technology definitions from the technologies CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A map of technology definitions, keyed by ID, or an error.
pub fn read_technologies(model_dir: &Path) -> Result<TechnologyDefinitionMap> {
    let file_path = model_dir.join(TECHNOLOGIES_FILE_NAME);
    let technologies_csv = read_csv(&file_path)?;
    read_technologies_from_iter(technologies_csv).with_context(|| input_err_msg(&file_path))
}

fn read_technologies_from_iter<I>(iter: I) -> Result<TechnologyDefinitionMap>
where
    I: Iterator<Item = TechnologyRaw>,
{
    let mut definitions = TechnologyDefinitionMap::new();
    for raw in iter {
        let definition = TechnologyDefinition {
            id: raw.id.clone(),
            fueltype: raw.fueltype,
            tech_type: raw.tech_type,
            eff_by: raw.eff_by,
            eff_ey: raw.eff_ey,
            eff_achieved: raw.eff_achieved,
            diff_method: raw.diff_method,
            yr_until_changed: raw.yr_until_changed,
            hybrid: raw.hybrid()?,
        };
        ensure!(
            definitions.insert(raw.id.clone(), definition).is_none(),
            "Duplicate ID found: {}",
            raw.id
        );
    }

    // Hybrids may refer to technologies defined later in the file
    for definition in definitions.values() {
        definition
            .validate(&definitions)
            .with_context(|| format!("Invalid technology {}", definition.id))?;
    }

    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn raw(id: &str, tech_type: TechnologyType) -> TechnologyRaw {
        TechnologyRaw {
            id: id.into(),
            fueltype: FuelType::Gas,
            tech_type,
            eff_by: 0.8,
            eff_ey: 0.9,
            eff_achieved: 1.0,
            diff_method: DiffusionChoice::Linear,
            yr_until_changed: 2050,
            tech_low_temp: None,
            tech_high_temp: None,
            temp_cutoff_low: None,
            temp_cutoff_high: None,
        }
    }

    #[test]
    fn test_read_technologies_from_iter() {
        let hybrid = TechnologyRaw {
            tech_low_temp: Some("boiler_gas".into()),
            tech_high_temp: Some("heat_pump".into()),
            temp_cutoff_low: Some(-2.0),
            temp_cutoff_high: Some(4.0),
            ..raw("hybrid", TechnologyType::Hybrid)
        };
        let definitions = read_technologies_from_iter(
            [
                hybrid,
                raw("boiler_gas", TechnologyType::Standard),
                raw("heat_pump", TechnologyType::HeatPump),
            ]
            .into_iter(),
        )
        .unwrap();
        assert_eq!(definitions.len(), 3);
        let hybrid = definitions["hybrid"].hybrid.as_ref().unwrap();
        assert_eq!(hybrid.tech_high_temp, "heat_pump".into());
        assert_eq!(hybrid.temp_cutoff_low, -2.0);
    }

    #[test]
    fn test_read_technologies_incomplete_hybrid() {
        let hybrid = TechnologyRaw {
            tech_low_temp: Some("boiler_gas".into()),
            ..raw("hybrid", TechnologyType::Hybrid)
        };
        assert_error!(
            read_technologies_from_iter([hybrid].into_iter()),
            "Technology hybrid must give either all or none of tech_low_temp, tech_high_temp, \
            temp_cutoff_low and temp_cutoff_high"
        );
    }

    #[test]
    fn test_read_technologies_invalid() {
        let technology = TechnologyRaw {
            eff_achieved: 1.5,
            ..raw("boiler_gas", TechnologyType::Standard)
        };
        assert_error!(
            read_technologies_from_iter([technology].into_iter()),
            "Invalid technology boiler_gas"
        );
    }

    #[test]
    fn test_read_technologies() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(TECHNOLOGIES_FILE_NAME)).unwrap();
            writeln!(
                file,
                "id,fueltype,tech_type,eff_by,eff_ey,eff_achieved,diff_method,yr_until_changed,\
tech_low_temp,tech_high_temp,temp_cutoff_low,temp_cutoff_high
boiler_gas,gas,standard,0.85,0.9,1.0,linear,2050,,,,
heat_pump,electricity,heat_pump,2.8,3.5,0.8,sigmoid,2050,,,,"
            )
            .unwrap();
        }

        let definitions = read_technologies(dir.path()).unwrap();
        assert_eq!(
            definitions["heat_pump"],
            TechnologyDefinition {
                id: "heat_pump".into(),
                fueltype: FuelType::Electricity,
                tech_type: TechnologyType::HeatPump,
                eff_by: 2.8,
                eff_ey: 3.5,
                eff_achieved: 0.8,
                diff_method: DiffusionChoice::Sigmoid,
                yr_until_changed: 2050,
                hybrid: None,
            }
        );
    }
}
