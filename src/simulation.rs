//! Functionality for running the end-use demand simulation.
use crate::climate::{ClimateFactors, YearWeather};
use crate::enduse::{EnduseHourly, EnduseInputs, RegionYear, simulate_enduse};
use crate::fuel_share::PLACEHOLDER_TECHNOLOGY;
use crate::fueltype::{DAYS_PER_YEAR, DayHours, FuelType, FuelVector, HOURS_PER_DAY};
use crate::id::{EnduseID, SectorID, SubmodelID};
use crate::load_profile::{LoadProfile, LoadProfileStore};
use crate::model::{Model, ModelParameters};
use crate::output::DataWriter;
use crate::region::RegionID;
use crate::strategy::StrategyVariables;
use crate::technology::{TechnologyContext, TechnologyStock};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::{debug, info, warn};
use std::path::Path;
use std::rc::Rc;
use strum::IntoEnumIterator;

/// Hourly demand of a region and year, aggregated by submodel, fueltype and technology.
///
/// Keys have the form `{submodel}_{fueltype}_{technology}`. Fuel not attributed to a technology is
/// reported under the technology name `placeholder`.
#[derive(PartialEq, Debug, Default)]
pub struct AggregatedDemand(IndexMap<String, Vec<DayHours>>);

impl AggregatedDemand {
    /// The output key for a submodel, fueltype and technology
    pub fn key(submodel: &SubmodelID, fueltype: FuelType, technology: &str) -> String {
        format!("{submodel}_{fueltype}_{technology}")
    }

    /// Add hourly demand to the given key
    pub fn add(&mut self, key: String, hourly: &[DayHours]) {
        let days = self
            .0
            .entry(key)
            .or_insert_with(|| vec![[0.0; HOURS_PER_DAY]; hourly.len()]);
        for (total, day) in days.iter_mut().zip(hourly) {
            for (total, value) in total.iter_mut().zip(day) {
                *total += value;
            }
        }
    }

    /// Add the hourly fuel of an end use.
    ///
    /// Fueltypes with no demand are skipped.
    pub fn add_enduse(&mut self, submodel: &SubmodelID, hourly: &EnduseHourly) {
        for (technology, fuel) in hourly.iter() {
            let technology =
                technology.map_or_else(|| PLACEHOLDER_TECHNOLOGY.to_string(), ToString::to_string);
            for fueltype in FuelType::iter() {
                if fuel.total(fueltype) > 0.0 {
                    self.add(
                        Self::key(submodel, fueltype, &technology),
                        fuel.get(fueltype),
                    );
                }
            }
        }
    }

    /// Iterate over the keys and their hourly demand
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DayHours])> {
        self.0.iter().map(|(key, days)| (key.as_str(), days.as_slice()))
    }

    /// The number of keys
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there is no demand at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Run the simulation.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write additional information (e.g. hourly demand) to file
pub fn run(model: &Model, output_path: &Path, debug_model: bool) -> Result<()> {
    let mut writer = DataWriter::create(output_path, debug_model)?;

    for year in model.iter_years() {
        info!("Simulating year {year}");
        for region_id in model.regions.keys() {
            let demand = simulate_region_year(model, region_id, year)?;
            writer.write_demand(year, region_id, &demand, &model.parameters.modelled_days)?;
        }
    }

    writer.flush()?;

    Ok(())
}

/// Build the load profiles of a region and year from the model's profile configurations
fn build_load_profiles(
    parameters: &ModelParameters,
    fuels: &IndexMap<(EnduseID, SectorID), FuelVector>,
    weather_cy: Option<&YearWeather>,
) -> Result<LoadProfileStore> {
    let modelled_days = &parameters.modelled_days;
    let mut store = LoadProfileStore::new(modelled_days)?;
    for (i, config) in parameters.load_profiles.iter().enumerate() {
        let build = || -> Result<Rc<LoadProfile>> {
            let daily = config.daily_shape().daily_values(
                weather_cy,
                parameters.t_base_heating,
                parameters.t_base_cooling,
            )?;
            let hourly = vec![config.hourly_shape()?; DAYS_PER_YEAR];
            let peak_hourly = config.peak_hourly_shape()?;
            let peak_day = weather_cy.and_then(|weather| {
                config.daily_shape().peak_day(
                    weather,
                    parameters.t_base_heating,
                    parameters.t_base_cooling,
                )
            });
            ensure!(
                peak_hourly.is_none() || weather_cy.is_some(),
                "Peak-day load profiles need temperature data"
            );
            let profile = LoadProfile::new(
                &daily,
                &hourly,
                peak_day,
                peak_hourly.as_ref(),
                modelled_days,
            )?;
            debug!(
                "Load profile number {}: peak day {peak_day:?} with {:.4} of annual demand",
                i + 1,
                profile.f_peak_yd()
            );
            Ok(Rc::new(profile))
        };
        let profile = build().with_context(|| format!("Invalid load profile number {}", i + 1))?;

        for enduse in &config.enduses {
            let sectors: Vec<&SectorID> = if config.sectors.is_empty() {
                fuels
                    .keys()
                    .filter(|(fuel_enduse, _)| fuel_enduse == enduse)
                    .map(|(_, sector)| sector)
                    .collect()
            } else {
                config.sectors.iter().collect()
            };

            for sector in sectors {
                if config.technologies.is_empty() {
                    store.insert(enduse, sector, None, Rc::clone(&profile))?;
                } else {
                    for technology in &config.technologies {
                        store.insert(enduse, sector, Some(technology), Rc::clone(&profile))?;
                    }
                }
            }
        }
    }

    Ok(store)
}

/// Simulate every end use and sector of one region in one year
pub fn simulate_region_year(
    model: &Model,
    region_id: &RegionID,
    curr_yr: u32,
) -> Result<AggregatedDemand> {
    let parameters = &model.parameters;
    let Some(fuels) = model.fuels.get(region_id) else {
        warn!("No fuel given for region {region_id}");
        return Ok(AggregatedDemand::default());
    };

    let weather_by = model.weather(region_id, parameters.base_yr);
    let weather_cy = model.weather(region_id, curr_yr);
    let climate = match (weather_by, weather_cy) {
        (Some(by), Some(cy)) => ClimateFactors::calculate(
            by,
            cy,
            parameters.t_base_heating,
            parameters.t_base_cooling,
        ),
        _ => ClimateFactors::default(),
    };
    debug!("Climate factors for region {region_id} in {curr_yr}: {climate:?}");

    let strategy =
        StrategyVariables::resolve(&model.scenario, parameters.base_yr, curr_yr, region_id);
    let technology_context = TechnologyContext {
        base_yr: parameters.base_yr,
        curr_yr,
        diffusion_shape: parameters.technology_diffusion,
        t_base_heating: parameters.t_base_heating,
        weather_by,
        weather_cy,
    };
    let technologies = TechnologyStock::new(
        &model.technologies,
        model.enduse_technologies(),
        &technology_context,
    )
    .with_context(|| format!("Could not build technologies for region {region_id}"))?;
    let load_profiles = build_load_profiles(parameters, fuels, weather_cy)
        .with_context(|| format!("Could not build load profiles for region {region_id}"))?;

    let context = RegionYear {
        region_id,
        curr_yr,
        parameters,
        strategy: &strategy,
        climate,
        technologies: &technologies,
        load_profiles: &load_profiles,
    };

    let mut demand = AggregatedDemand::default();
    for ((enduse_id, sector), fuel_by) in fuels {
        let enduse = &model.enduses[enduse_id];
        let key = (enduse_id.clone(), sector.clone());
        let inputs = EnduseInputs {
            enduse,
            sector,
            fuel_by: *fuel_by,
            drivers: model.driver_changes(region_id, enduse_id, curr_yr)?,
            fuel_shares: model.fuel_shares.get(&key),
            service_switch: model.service_switches.get(&key),
            process_mix: parameters.process_mix(enduse_id, sector),
        };
        let output = simulate_enduse(&context, &inputs)?;
        debug!("{enduse_id} in sector {sector}: annual fuel {:?}", output.fuel_y);
        demand.add_enduse(&enduse.submodel, &output.hourly);
    }

    Ok(demand)
}
