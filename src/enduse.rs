//! The end-use cascade: simulating one end use in one sector, region and year.
//!
//! Annual fuel is first adjusted for the climate and the scenario (see [`adjustments`]). If the
//! end use has technologies, the fuel is converted to energy service, reduced by heat recovery and
//! air leakage improvements, redistributed between technologies by any service switch and
//! converted back to fuel with current-year efficiencies. The result is spread over the modelled
//! hours with load profiles and finally peak-shaved.
use crate::climate::{ClimateClass, ClimateFactors};
use crate::demand_management::shave_peaks;
use crate::fuel_share::{FuelShares, TechnologyKey};
use crate::fueltype::{FuelType, FuelVector, HourlyFuel};
use crate::id::{EnduseID, SectorID, SubmodelID, define_id_getter};
use crate::load_profile::LoadProfileStore;
use crate::model::ModelParameters;
use crate::region::RegionID;
use crate::strategy::{Change, StrategyVariables};
use crate::technology::TechnologyStock;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, trace};

pub mod adjustments;
use adjustments::ProcessMix;
pub mod disaggregation;
use disaggregation::{disaggregate_fuel, disaggregate_value};
pub mod service;
use service::{
    EnduseTechnologies, ServiceSwitch, TechnologyValues, fuel_to_service, reduce_service,
    service_to_fuel, switch_service,
};

/// A map of [`Enduse`]s, keyed by end use ID
pub type EnduseMap = IndexMap<EnduseID, Enduse>;

/// A category of energy consumption (e.g. space heating)
#[derive(PartialEq, Debug, Clone)]
pub struct Enduse {
    /// Unique identifier
    pub id: EnduseID,
    /// The submodel the end use belongs to (e.g. residential)
    pub submodel: SubmodelID,
    /// How demand responds to the climate
    pub climate_class: ClimateClass,
    /// Names of the scenario drivers of demand
    pub drivers: Vec<String>,
    /// Whether demand without technologies is spread evenly over all hours
    pub flat_profile: bool,
}
define_id_getter! {Enduse, EnduseID}

/// Inputs shared by every end use simulated for one region and year
pub struct RegionYear<'a> {
    /// The region
    pub region_id: &'a RegionID,
    /// The year being simulated
    pub curr_yr: u32,
    /// Model-wide parameters
    pub parameters: &'a ModelParameters,
    /// Scenario parameters resolved for the region and year
    pub strategy: &'a StrategyVariables,
    /// Degree-day scaling factors
    pub climate: ClimateFactors,
    /// Technologies resolved for the region and year
    pub technologies: &'a TechnologyStock,
    /// Load profiles for the region and year
    pub load_profiles: &'a LoadProfileStore,
}

/// Inputs specific to one end use and sector
pub struct EnduseInputs<'a> {
    /// The end use
    pub enduse: &'a Enduse,
    /// The sector
    pub sector: &'a SectorID,
    /// Base-year annual fuel
    pub fuel_by: FuelVector,
    /// Base-year and current-year values of each of the end use's scenario drivers
    pub drivers: Vec<Change>,
    /// How fuel is split between technologies, if known
    pub fuel_shares: Option<&'a FuelShares>,
    /// Technology switch for the end use and sector, if any
    pub service_switch: Option<&'a ServiceSwitch>,
    /// Industrial process mix for the end use and sector, if any
    pub process_mix: Option<&'a ProcessMix>,
}

/// Hourly fuel of an end use
#[derive(PartialEq, Debug, Clone)]
pub enum EnduseHourly {
    /// Hourly fuel of each technology
    ByTechnology(IndexMap<TechnologyKey, HourlyFuel>),
    /// Hourly fuel of the whole end use
    Aggregated(HourlyFuel),
}

impl EnduseHourly {
    /// Iterate over the hourly fuel of each technology, using a placeholder for aggregated fuel
    pub fn iter(&self) -> Box<dyn Iterator<Item = (Option<&TechnologyKey>, &HourlyFuel)> + '_> {
        match self {
            Self::ByTechnology(map) => Box::new(map.iter().map(|(key, fuel)| (Some(key), fuel))),
            Self::Aggregated(fuel) => Box::new(std::iter::once((None, fuel))),
        }
    }

    fn iter_mut(&mut self) -> Box<dyn Iterator<Item = &mut HourlyFuel> + '_> {
        match self {
            Self::ByTechnology(map) => Box::new(map.values_mut()),
            Self::Aggregated(fuel) => Box::new(std::iter::once(fuel)),
        }
    }
}

/// The result of simulating one end use
#[derive(PartialEq, Debug, Clone)]
pub struct EnduseOutput {
    /// Annual fuel after all adjustments and conversions
    pub fuel_y: FuelVector,
    /// Hourly fuel
    pub hourly: EnduseHourly,
}

/// Apply the annual adjustments in order
fn adjust_fuel(context: &RegionYear, inputs: &EnduseInputs) -> FuelVector {
    let enduse = &inputs.enduse.id;
    let class = inputs.enduse.climate_class;
    let strategy = context.strategy;

    let fuel = adjustments::climate(inputs.fuel_by, class, &context.climate);
    trace!("{enduse}: after climate adjustment {fuel:?}");
    let fuel = adjustments::smart_meter(
        fuel,
        strategy.smart_meter_penetration,
        strategy.smart_meter_savings.get(enduse).copied(),
    );
    trace!("{enduse}: after smart meter savings {fuel:?}");
    let fuel = adjustments::enduse_change(fuel, strategy.enduse_change.get(enduse).copied());
    trace!("{enduse}: after end use change {fuel:?}");
    let fuel = adjustments::scenario_drivers(fuel, &inputs.drivers);
    trace!("{enduse}: after scenario drivers {fuel:?}");
    let fuel = adjustments::cooled_floorarea(
        fuel,
        class,
        strategy.cooled_floorarea.get(enduse).copied(),
    );
    trace!("{enduse}: after cooled floor area {fuel:?}");
    let fuel = adjustments::process_mix(
        fuel,
        inputs.process_mix,
        strategy.process_mix_share.get(enduse).copied(),
    );
    trace!("{enduse}: after process mix {fuel:?}");

    fuel
}

/// Spread an end use's fuel without technologies over the modelled hours
fn disaggregate_without_technologies(
    context: &RegionYear,
    inputs: &EnduseInputs,
    fuel: FuelVector,
) -> Result<EnduseOutput> {
    let profile = if inputs.enduse.flat_profile {
        context.load_profiles.flat()
    } else {
        context
            .load_profiles
            .get_required(&inputs.enduse.id, inputs.sector, None)?
    };

    Ok(EnduseOutput {
        fuel_y: fuel,
        hourly: EnduseHourly::Aggregated(disaggregate_fuel(&fuel, profile)),
    })
}

/// Convert energy service to hourly fuel of each technology
fn service_to_hourly_fuel(
    technologies: &EnduseTechnologies,
    service: &TechnologyValues,
) -> Result<EnduseOutput> {
    let hourly = service_to_fuel(service, technologies)?;
    let mut fuel_y = FuelVector::zeros();
    for technology_hourly in hourly.values() {
        fuel_y += technology_hourly.annual();
    }

    Ok(EnduseOutput {
        fuel_y,
        hourly: EnduseHourly::ByTechnology(hourly),
    })
}

/// Pool energy service of all technologies into the heat fueltype
fn service_to_hourly_heat(
    technologies: &EnduseTechnologies,
    service: &TechnologyValues,
) -> Result<EnduseOutput> {
    let mut hourly = HourlyFuel::zeros(technologies.modelled_days.len());
    for (key, service) in service {
        let profile = technologies.profile(key)?;
        hourly.add(&disaggregate_value(FuelType::Heat, *service, profile));
    }

    Ok(EnduseOutput {
        fuel_y: FuelVector::single(FuelType::Heat, service.values().sum()),
        hourly: EnduseHourly::Aggregated(hourly),
    })
}

/// Convert fuel to hourly fuel via energy service and technologies
fn simulate_technologies(
    context: &RegionYear,
    inputs: &EnduseInputs,
    fuel_shares: &FuelShares,
    fuel: &FuelVector,
) -> Result<EnduseOutput> {
    let enduse = &inputs.enduse.id;
    let parameters = context.parameters;
    if !parameters.allow_placeholder_technologies {
        fuel_shares.check_all_or_none(fuel)?;
    }

    let technologies = EnduseTechnologies {
        enduse,
        sector: inputs.sector,
        technologies: context.technologies,
        load_profiles: context.load_profiles,
        modelled_days: &parameters.modelled_days,
    };
    let mut service = fuel_to_service(fuel, &fuel_shares.split(fuel), &technologies)?;
    debug!("{enduse}: service {service:?}");

    reduce_service(&mut service, context.strategy.heat_recovery.get(enduse).copied());
    reduce_service(&mut service, context.strategy.air_leakage.get(enduse).copied());

    if let Some(switch) = inputs.service_switch
        && context.curr_yr > parameters.base_yr
    {
        service = switch_service(&service, switch, context.curr_yr)?;
    }

    if !parameters.mode_constrained && inputs.enduse.climate_class == ClimateClass::Heating {
        service_to_hourly_heat(&technologies, &service)
    } else {
        service_to_hourly_fuel(&technologies, &service)
    }
}

/// Simulate one end use in one sector for the region and year of `context`.
///
/// # Returns
///
/// Annual and hourly fuel, or an error if the inputs are inconsistent or any fuel turns out
/// negative.
pub fn simulate_enduse(context: &RegionYear, inputs: &EnduseInputs) -> Result<EnduseOutput> {
    let enduse = &inputs.enduse.id;
    let sector = inputs.sector;
    let run = || -> Result<EnduseOutput> {
        inputs.fuel_by.check_non_negative()?;
        let fuel = adjust_fuel(context, inputs);
        fuel.check_non_negative()?;

        let mut output = match inputs.fuel_shares {
            Some(shares) if shares.has_technologies() => {
                simulate_technologies(context, inputs, shares, &fuel)?
            }
            _ => disaggregate_without_technologies(context, inputs, fuel)?,
        };

        if let Some(improvement) = context.strategy.load_factor_improvement.get(enduse) {
            for hourly in output.hourly.iter_mut() {
                shave_peaks(hourly, *improvement);
            }
        }

        output.fuel_y.check_non_negative()?;
        for (_, hourly) in output.hourly.iter() {
            hourly.check_non_negative()?;
        }

        Ok(output)
    };

    run().with_context(|| {
        format!(
            "Error simulating end use {enduse} in sector {sector}, region {} and year {}",
            context.region_id, context.curr_yr
        )
    })
}
