//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::diffusion::SigmoidShape;
use crate::enduse::adjustments::ProcessMix;
use crate::fueltype::{DAYS_PER_YEAR, DayHours, HOURS_PER_DAY};
use crate::id::{EnduseID, SectorID, TechnologyID};
use crate::input::{input_err_msg, is_sorted_and_unique, read_toml};
use crate::load_profile::DailyShape;
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_mode_constrained, bool, true);
define_param_default!(default_allow_placeholder_technologies, bool, true);
define_param_default!(default_modelled_days, Vec<usize>, (0..DAYS_PER_YEAR).collect());
define_param_default!(default_t_base_heating, f64, 15.5);
define_param_default!(default_t_base_cooling, f64, 21.0);

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// The year to which the input fuel data refers
    pub base_yr: u32,
    /// Years to simulate
    pub simulated_yrs: Vec<u32>,
    /// Whether fuel is attributed to technologies (rather than pooled as heat for heating end uses)
    #[serde(default = "default_mode_constrained")]
    pub mode_constrained: bool,
    /// Whether fuel of fueltypes without technologies is assigned to a placeholder technology.
    ///
    /// If false, an end use must define technologies for all of its fueltypes or none.
    #[serde(default = "default_allow_placeholder_technologies")]
    pub allow_placeholder_technologies: bool,
    /// Days of the year (0-364) which are simulated
    #[serde(default = "default_modelled_days")]
    pub modelled_days: Vec<usize>,
    /// Base temperature for heating degree days
    #[serde(default = "default_t_base_heating")]
    pub t_base_heating: f64,
    /// Base temperature for cooling degree days
    #[serde(default = "default_t_base_cooling")]
    pub t_base_cooling: f64,
    /// Curve parameters for sigmoid technology efficiency diffusion
    #[serde(default)]
    pub technology_diffusion: SigmoidShape,
    /// Industrial process mixes
    #[serde(default)]
    pub process_mixes: Vec<ProcessMixConfig>,
    /// Load profiles and the end uses, sectors and technologies they apply to
    #[serde(default)]
    pub load_profiles: Vec<LoadProfileConfig>,
}

/// A process mix for one end use and sector
#[derive(Debug, Deserialize, PartialEq)]
pub struct ProcessMixConfig {
    /// The end use
    pub enduse: EnduseID,
    /// The sector
    pub sector: SectorID,
    /// The processes
    #[serde(flatten)]
    pub mix: ProcessMix,
}

/// Named daily shapes for load profiles
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy)]
pub enum DailyShapeName {
    /// The same demand every day
    #[string = "flat"]
    Flat,
    /// Proportional to heating degree days
    #[string = "heating_degree_days"]
    HeatingDegreeDays,
    /// Proportional to cooling degree days
    #[string = "cooling_degree_days"]
    CoolingDegreeDays,
}

/// The daily shape of a load profile: either a named shape or a value for every day
#[derive(Deserialize, Debug, PartialEq, Clone)]
#[serde(untagged)]
pub enum DailyShapeConfig {
    /// A named shape
    Named(DailyShapeName),
    /// Values for every day of the year
    Values(Vec<f64>),
}

impl Default for DailyShapeConfig {
    fn default() -> Self {
        Self::Named(DailyShapeName::Flat)
    }
}

/// A load profile and the keys it is registered under
#[derive(Debug, Deserialize, PartialEq)]
pub struct LoadProfileConfig {
    /// End uses using the profile
    pub enduses: Vec<EnduseID>,
    /// Sectors using the profile (all sectors of the end uses if empty)
    #[serde(default)]
    pub sectors: Vec<SectorID>,
    /// Technologies using the profile (the end-use-level profile if empty)
    #[serde(default)]
    pub technologies: Vec<TechnologyID>,
    /// Demand on each day of the year
    #[serde(default)]
    pub daily: DailyShapeConfig,
    /// Demand in each hour of the day (flat if absent)
    pub hourly: Option<Vec<f64>>,
    /// Demand in each hour of the peak day (same as other days if absent)
    pub peak_hourly: Option<Vec<f64>>,
}

/// Convert a list of hourly values to a [`DayHours`]
fn to_day_hours(values: &[f64]) -> Result<DayHours> {
    ensure!(
        values.iter().all(|value| *value >= 0.0),
        "Hourly values cannot be negative"
    );
    values.try_into().ok().with_context(|| {
        format!(
            "Expected {HOURS_PER_DAY} hourly values, got {}",
            values.len()
        )
    })
}

impl LoadProfileConfig {
    /// The daily shape
    pub fn daily_shape(&self) -> DailyShape {
        match &self.daily {
            DailyShapeConfig::Named(DailyShapeName::Flat) => DailyShape::Flat,
            DailyShapeConfig::Named(DailyShapeName::HeatingDegreeDays) => {
                DailyShape::HeatingDegreeDays
            }
            DailyShapeConfig::Named(DailyShapeName::CoolingDegreeDays) => {
                DailyShape::CoolingDegreeDays
            }
            DailyShapeConfig::Values(values) => DailyShape::Explicit(values.clone()),
        }
    }

    /// The hourly shape of an ordinary day
    pub fn hourly_shape(&self) -> Result<DayHours> {
        self.hourly
            .as_deref()
            .map_or(Ok([1.0; HOURS_PER_DAY]), to_day_hours)
    }

    /// The hourly shape of the peak day, if it differs from other days
    pub fn peak_hourly_shape(&self) -> Result<Option<DayHours>> {
        self.peak_hourly.as_deref().map(to_day_hours).transpose()
    }

    /// Check the profile is valid
    fn validate(&self) -> Result<()> {
        ensure!(!self.enduses.is_empty(), "No end uses given");
        if let DailyShapeConfig::Values(values) = &self.daily {
            ensure!(
                values.len() == DAYS_PER_YEAR,
                "Expected {DAYS_PER_YEAR} daily values, got {}",
                values.len()
            );
        }
        self.hourly_shape()?;
        self.peak_hourly_shape()?;

        Ok(())
    }
}

/// Check that the `simulated_yrs` parameter is valid
fn check_simulated_yrs(base_yr: u32, years: &[u32]) -> Result<()> {
    ensure!(!years.is_empty(), "`simulated_yrs` is empty");

    ensure!(
        is_sorted_and_unique(years),
        "`simulated_yrs` must be composed of unique values in order"
    );

    ensure!(
        years[0] >= base_yr,
        "`simulated_yrs` cannot be before `base_yr`"
    );

    Ok(())
}

/// Check that the `modelled_days` parameter is valid
fn check_modelled_days(days: &[usize]) -> Result<()> {
    ensure!(!days.is_empty(), "`modelled_days` is empty");
    ensure!(
        is_sorted_and_unique(days),
        "`modelled_days` must be composed of unique values in order"
    );
    ensure!(
        days.iter().all(|day| *day < DAYS_PER_YEAR),
        "`modelled_days` must be between 0 and {}",
        DAYS_PER_YEAR - 1
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_simulated_yrs(self.base_yr, &self.simulated_yrs)?;
        check_modelled_days(&self.modelled_days)?;

        ensure!(
            self.t_base_heating.is_finite() && self.t_base_cooling.is_finite(),
            "Base temperatures must be finite"
        );
        if self.t_base_heating > self.t_base_cooling {
            warn!(
                "t_base_heating ({}) is above t_base_cooling ({})",
                self.t_base_heating, self.t_base_cooling
            );
        }

        for mix in &self.process_mixes {
            mix.mix.validate().with_context(|| {
                format!(
                    "Invalid process mix for end use {} and sector {}",
                    mix.enduse, mix.sector
                )
            })?;
        }

        for (i, profile) in self.load_profiles.iter().enumerate() {
            profile
                .validate()
                .with_context(|| format!("Invalid load profile (number {})", i + 1))?;
        }

        Ok(())
    }

    /// Get the process mix for an end use and sector, if any
    pub fn process_mix(&self, enduse: &EnduseID, sector: &SectorID) -> Option<&ProcessMix> {
        self.process_mixes
            .iter()
            .find(|mix| mix.enduse == *enduse && mix.sector == *sector)
            .map(|mix| &mix.mix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_check_simulated_yrs() {
        // Valid
        assert!(check_simulated_yrs(2015, &[2015]).is_ok());
        assert!(check_simulated_yrs(2015, &[2020, 2030]).is_ok());

        // Invalid
        assert!(check_simulated_yrs(2015, &[]).is_err());
        assert!(check_simulated_yrs(2015, &[2020, 2020]).is_err());
        assert!(check_simulated_yrs(2015, &[2030, 2020]).is_err());
        assert_error!(
            check_simulated_yrs(2015, &[2010]),
            "`simulated_yrs` cannot be before `base_yr`"
        );
    }

    #[rstest]
    #[case(&[0, 1, 364], true)]
    #[case(&[], false)]
    #[case(&[5, 3], false)]
    #[case(&[365], false)]
    fn test_check_modelled_days(#[case] days: &[usize], #[case] expected_valid: bool) {
        assert_eq!(check_modelled_days(days).is_ok(), expected_valid);
    }

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "base_yr = 2015
simulated_yrs = [2015, 2020]

[technology_diffusion]
steepness = 2.0

[[process_mixes]]
enduse = \"steel_rolling\"
sector = \"steel\"
switched_share_by = 0.2
switched_efficiency = 1.5
remaining_efficiency = 1.0

[[load_profiles]]
enduses = [\"space_heating\"]
daily = \"heating_degree_days\"
hourly = [1, 1, 1, 1, 1, 1, 2, 3, 3, 2, 1, 1, 1, 1, 1, 1, 2, 3, 3, 3, 2, 1, 1, 1]"
            )
            .unwrap();
        }

        let params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(params.simulated_yrs, [2015, 2020]);
        assert!(params.mode_constrained);
        assert!(params.allow_placeholder_technologies);
        assert_eq!(params.modelled_days.len(), DAYS_PER_YEAR);
        assert_eq!(params.t_base_heating, 15.5);
        assert_eq!(params.technology_diffusion.midpoint, 0.0);
        assert_eq!(params.technology_diffusion.steepness, 2.0);
        assert_eq!(
            params
                .process_mix(&"steel_rolling".into(), &"steel".into())
                .unwrap()
                .switched_share_by,
            0.2
        );

        let profile = &params.load_profiles[0];
        assert_eq!(profile.daily_shape(), DailyShape::HeatingDegreeDays);
        assert_eq!(profile.hourly_shape().unwrap()[7], 3.0);
        assert_eq!(profile.peak_hourly_shape().unwrap(), None);
    }

    #[test]
    fn test_load_profile_config_invalid() {
        let profile = LoadProfileConfig {
            enduses: vec!["lighting".into()],
            sectors: Vec::new(),
            technologies: Vec::new(),
            daily: DailyShapeConfig::Values(vec![1.0; 10]),
            hourly: None,
            peak_hourly: None,
        };
        assert_error!(profile.validate(), "Expected 365 daily values, got 10");

        let profile = LoadProfileConfig {
            daily: DailyShapeConfig::default(),
            hourly: Some(vec![1.0; 12]),
            ..profile
        };
        assert_error!(profile.validate(), "Expected 24 hourly values, got 12");
    }
}
