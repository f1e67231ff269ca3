//! The model represents the static input data provided by the user.
use crate::climate::{ClimateClass, YearWeather};
use crate::enduse::EnduseMap;
use crate::enduse::service::ServiceSwitch;
use crate::fuel_share::FuelSharesMap;
use crate::fueltype::FuelVector;
use crate::id::{EnduseID, SectorID, TechnologyID};
use crate::load_profile::DailyShape;
use crate::region::{RegionID, RegionMap};
use crate::strategy::{Change, Scenario};
use crate::technology::{TechnologyDefinitionMap, TechnologyType};
use anyhow::{Context, Result, ensure};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::path::PathBuf;

pub mod parameters;
pub use parameters::ModelParameters;

/// Service switches, keyed by end use and sector
pub type ServiceSwitchMap = HashMap<(EnduseID, SectorID), ServiceSwitch>;

/// Base-year fuel of each end use and sector, grouped by region
pub type FuelMap = IndexMap<RegionID, IndexMap<(EnduseID, SectorID), FuelVector>>;

/// Values of scenario drivers (e.g. population), keyed by region, year and driver name
pub type DriverMap = HashMap<(RegionID, u32, String), f64>;

/// Daily temperatures, keyed by region and year
pub type WeatherMap = HashMap<(RegionID, u32), YearWeather>;

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Regions
    pub regions: RegionMap,
    /// End uses
    pub enduses: EnduseMap,
    /// Technology definitions
    pub technologies: TechnologyDefinitionMap,
    /// How each end use's fuel is split between technologies, per sector
    pub fuel_shares: FuelSharesMap,
    /// Technology switches
    pub service_switches: ServiceSwitchMap,
    /// Base-year fuel
    pub fuels: FuelMap,
    /// Scenario drivers
    pub drivers: DriverMap,
    /// Temperatures (may be empty if no end use depends on the weather)
    pub weather: WeatherMap,
    /// Scenario narratives
    pub scenario: Scenario,
}

impl Model {
    /// Iterate over the model's simulated years
    pub fn iter_years(&self) -> impl Iterator<Item = u32> + '_ {
        self.parameters.simulated_yrs.iter().copied()
    }

    /// Get the temperatures of a region in a year, if provided
    pub fn weather(&self, region_id: &RegionID, year: u32) -> Option<&YearWeather> {
        self.weather.get(&(region_id.clone(), year))
    }

    /// Get the base-year and current-year values of each of an end use's scenario drivers
    pub fn driver_changes(
        &self,
        region_id: &RegionID,
        enduse: &EnduseID,
        curr_yr: u32,
    ) -> Result<Vec<Change>> {
        let enduse = &self.enduses[enduse];
        let get = |driver: &str, year: u32| {
            self.drivers
                .get(&(region_id.clone(), year, driver.to_string()))
                .copied()
                .with_context(|| {
                    format!(
                        "Missing value for driver {driver} in region {region_id} and year {year}"
                    )
                })
        };

        enduse
            .drivers
            .iter()
            .map(|driver| {
                Ok(Change {
                    by: get(driver, self.parameters.base_yr)?,
                    cy: get(driver, curr_yr)?,
                })
            })
            .collect()
    }

    /// All pairs of end use and technology used in the model, from fuel shares and switches
    pub fn enduse_technologies(&self) -> IndexSet<(&EnduseID, &TechnologyID)> {
        let from_shares = self.fuel_shares.iter().flat_map(|((enduse, _), shares)| {
            shares.technologies().map(move |(_, technology)| (enduse, technology))
        });
        let from_switches = self.service_switches.iter().flat_map(|((enduse, _), switch)| {
            switch.keys().map(move |technology| (enduse, technology))
        });

        let mut pairs: IndexSet<_> = from_shares.chain(from_switches).collect();
        pairs.sort();
        pairs
    }

    /// Whether any part of the model needs temperature data
    fn needs_weather(&self) -> bool {
        self.enduses
            .values()
            .any(|enduse| enduse.climate_class != ClimateClass::Unaffected)
            || self
                .technologies
                .values()
                .any(|technology| technology.tech_type != TechnologyType::Standard)
            || self.parameters.load_profiles.iter().any(|profile| {
                matches!(
                    profile.daily_shape(),
                    DailyShape::HeatingDegreeDays | DailyShape::CoolingDegreeDays
                )
            })
    }

    /// Check that the parts of the model read from different files are consistent
    pub fn validate(&self) -> Result<()> {
        for ((enduse, sector), shares) in &self.fuel_shares {
            for (fueltype, technology) in shares.technologies() {
                let definition = &self.technologies[technology];
                ensure!(
                    definition.fueltype == fueltype,
                    "Technology {technology} uses {} but is listed under {fueltype} for end use \
                    {enduse} and sector {sector}",
                    definition.fueltype
                );
            }
        }

        for (i, profile) in self.parameters.load_profiles.iter().enumerate() {
            for enduse in &profile.enduses {
                ensure!(
                    self.enduses.contains_key(enduse),
                    "Load profile number {} refers to unknown end use {enduse}",
                    i + 1
                );
            }
            for technology in &profile.technologies {
                ensure!(
                    self.technologies.contains_key(technology),
                    "Load profile number {} refers to unknown technology {technology}",
                    i + 1
                );
            }
        }

        for mix in &self.parameters.process_mixes {
            ensure!(
                self.enduses.contains_key(&mix.enduse),
                "Process mix refers to unknown end use {}",
                mix.enduse
            );
        }

        if !self.weather.is_empty() || self.needs_weather() {
            let years = std::iter::once(self.parameters.base_yr).chain(self.iter_years());
            for year in years {
                for region_id in self.regions.keys() {
                    ensure!(
                        self.weather(region_id, year).is_some(),
                        "Missing temperatures for region {region_id} and year {year}"
                    );
                }
            }
        }

        Ok(())
    }
}
