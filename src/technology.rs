//! Technologies convert fuel into energy service with an efficiency that can change over time.
//!
//! A [`TechnologyDefinition`] is read from the model configuration. For each region and simulated
//! year these definitions are resolved into [`Technology`] instances, which hold the base-year and
//! current-year efficiencies. Heat pumps have an efficiency which depends on the outside
//! temperature and hybrids blend two other technologies depending on the outside temperature, so
//! both need hourly temperatures to be resolved.
use crate::climate::YearWeather;
use crate::diffusion::{DiffusionChoice, SigmoidShape, diffuse};
use crate::fueltype::{FuelType, HOURS_PER_DAY};
use crate::id::{EnduseID, TechnologyID, define_id_getter};
use crate::load_profile::LoadProfile;
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::collections::HashMap;
use std::rc::Rc;

/// Change in heat pump efficiency per degree of temperature difference
const HEAT_PUMP_SLOPE: f64 = -0.08;

/// The temperature difference at which a heat pump's nominal efficiency applies
const HEAT_PUMP_NOMINAL_TEMP_DIFF: f64 = 10.0;

/// Heat pump efficiency never drops below direct electric heating
const MIN_HEAT_PUMP_EFFICIENCY: f64 = 1.0;

/// A map of [`TechnologyDefinition`]s, keyed by technology ID
pub type TechnologyDefinitionMap = IndexMap<TechnologyID, TechnologyDefinition>;

/// The kind of technology, which determines how its efficiency is calculated
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, DeserializeLabeledStringEnum)]
pub enum TechnologyType {
    /// Efficiency independent of weather
    #[default]
    #[string = "standard"]
    Standard,
    /// Efficiency depends on the difference between outside and heating base temperature
    #[string = "heat_pump"]
    HeatPump,
    /// Blend of two technologies depending on the outside temperature
    #[string = "hybrid"]
    Hybrid,
}

/// The two technologies making up a hybrid technology
#[derive(PartialEq, Debug, Clone)]
pub struct HybridDefinition {
    /// Technology used at low outside temperatures
    pub tech_low_temp: TechnologyID,
    /// Technology used at high outside temperatures
    pub tech_high_temp: TechnologyID,
    /// At or below this temperature only the low-temperature technology is used
    pub temp_cutoff_low: f64,
    /// At or above this temperature only the high-temperature technology is used
    pub temp_cutoff_high: f64,
}

impl HybridDefinition {
    /// The share of service delivered by the high-temperature technology at temperature `t`
    pub fn service_share_high_temp(&self, t: f64) -> f64 {
        if t <= self.temp_cutoff_low {
            0.0
        } else if t >= self.temp_cutoff_high {
            1.0
        } else {
            (t - self.temp_cutoff_low) / (self.temp_cutoff_high - self.temp_cutoff_low)
        }
    }
}

/// A technology as described in the model configuration
#[derive(PartialEq, Debug, Clone)]
pub struct TechnologyDefinition {
    /// Unique identifier (e.g. "boiler_gas")
    pub id: TechnologyID,
    /// The fueltype consumed
    pub fueltype: FuelType,
    /// How efficiency is calculated
    pub tech_type: TechnologyType,
    /// Base-year efficiency (nominal efficiency for heat pumps)
    pub eff_by: f64,
    /// Theoretically achievable efficiency by `yr_until_changed`
    pub eff_ey: f64,
    /// Fraction of the theoretical efficiency improvement which is realised
    pub eff_achieved: f64,
    /// How efficiency moves towards `eff_ey`
    pub diff_method: DiffusionChoice,
    /// The year in which `eff_ey` is reached
    pub yr_until_changed: u32,
    /// Components of a hybrid technology
    pub hybrid: Option<HybridDefinition>,
}
define_id_getter! {TechnologyDefinition, TechnologyID}

impl TechnologyDefinition {
    /// Check that the definition is internally consistent
    pub fn validate(&self, definitions: &TechnologyDefinitionMap) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.eff_achieved),
            "eff_achieved must be between 0 and 1"
        );

        if self.tech_type == TechnologyType::Hybrid {
            let hybrid = self
                .hybrid
                .as_ref()
                .context("Hybrid technologies must name two component technologies")?;
            ensure!(
                hybrid.temp_cutoff_low < hybrid.temp_cutoff_high,
                "temp_cutoff_low must be below temp_cutoff_high"
            );
            for component in [&hybrid.tech_low_temp, &hybrid.tech_high_temp] {
                let definition = definitions
                    .get(component)
                    .with_context(|| format!("Unknown component technology {component}"))?;
                ensure!(
                    definition.tech_type != TechnologyType::Hybrid,
                    "Hybrid technologies cannot be made from other hybrids ({component})"
                );
            }
        } else {
            ensure!(
                self.eff_by > 0.0 && self.eff_ey > 0.0,
                "Efficiencies must be greater than zero"
            );
            ensure!(
                self.hybrid.is_none(),
                "Only hybrid technologies can have component technologies"
            );
        }

        Ok(())
    }

    /// The nominal efficiency in `curr_yr`, taking into account how much of the potential
    /// improvement is realised
    pub fn nominal_eff_cy(&self, base_yr: u32, curr_yr: u32, shape: SigmoidShape) -> f64 {
        let theoretical = diffuse(
            self.diff_method,
            shape,
            base_yr,
            curr_yr,
            self.eff_by,
            self.eff_ey,
            self.yr_until_changed,
        );
        self.eff_by + (theoretical - self.eff_by) * self.eff_achieved
    }
}

/// Heat pump efficiency at a single hour
///
/// # Arguments
///
/// * `nominal_eff` - Efficiency at the nominal temperature difference
/// * `temperature` - Outside temperature
/// * `t_base_heating` - Base temperature for heating
pub fn heat_pump_efficiency(nominal_eff: f64, temperature: f64, t_base_heating: f64) -> f64 {
    let temp_diff = (t_base_heating - temperature).max(0.0);
    let eff = nominal_eff + HEAT_PUMP_SLOPE * (temp_diff - HEAT_PUMP_NOMINAL_TEMP_DIFF);
    eff.max(MIN_HEAT_PUMP_EFFICIENCY)
}

/// How the fuel used by a technology is divided between fueltypes
#[derive(PartialEq, Debug, Clone)]
pub enum FuelSplit {
    /// All fuel is of one fueltype
    Single(FuelType),
    /// The share of each fueltype varies by hour of the year
    Hourly(IndexMap<FuelType, Vec<f64>>),
}

/// Efficiency of a technology in one year
#[derive(PartialEq, Debug, Clone)]
pub enum Efficiency {
    /// A single value for the year
    Annual(f64),
    /// One value per hour of the year
    Hourly(Vec<f64>),
}

impl Efficiency {
    /// The efficiency at the given hour of the year
    pub fn at_hour(&self, hour_of_year: usize) -> f64 {
        match self {
            Self::Annual(eff) => *eff,
            Self::Hourly(values) => values[hour_of_year],
        }
    }

    /// The efficiency of delivering service with the timing of a load profile.
    ///
    /// This is the service delivered per unit of fuel when service follows `profile`, so hours
    /// with low efficiency weigh more heavily when they carry more service.
    pub fn over_profile(&self, profile: &LoadProfile, modelled_days: &[usize]) -> f64 {
        let Self::Hourly(values) = self else {
            return self.at_hour(0);
        };

        let fuel_per_service: f64 = profile
            .shape_yh()
            .iter()
            .zip(modelled_days)
            .flat_map(|(shape_day, day)| {
                shape_day
                    .iter()
                    .enumerate()
                    .map(move |(hour, share)| share / values[day * HOURS_PER_DAY + hour])
            })
            .sum();
        1.0 / fuel_per_service
    }
}

/// A technology resolved for a particular region and year
#[derive(PartialEq, Debug, Clone)]
pub struct Technology {
    /// Unique identifier
    pub id: TechnologyID,
    /// The kind of technology
    pub tech_type: TechnologyType,
    /// The fueltype the technology is listed under in fuel shares
    pub fueltype: FuelType,
    /// Base-year efficiency
    pub eff_by: Efficiency,
    /// Current-year efficiency
    pub eff_cy: Efficiency,
    /// How fuel is divided between fueltypes in the current year
    pub fuel_split: FuelSplit,
}
define_id_getter! {Technology, TechnologyID}

/// Inputs for resolving technology definitions for one region and year
pub struct TechnologyContext<'a> {
    /// The base year of the simulation
    pub base_yr: u32,
    /// The year being simulated
    pub curr_yr: u32,
    /// Curve parameters for sigmoid efficiency diffusion
    pub diffusion_shape: SigmoidShape,
    /// Base temperature for heating
    pub t_base_heating: f64,
    /// Base-year weather, needed for weather-dependent technologies
    pub weather_by: Option<&'a YearWeather>,
    /// Current-year weather, needed for weather-dependent technologies
    pub weather_cy: Option<&'a YearWeather>,
}

impl TechnologyContext<'_> {
    /// Hourly temperatures for the base and current years
    fn hourly_temperatures(&self, id: &TechnologyID) -> Result<(Vec<f64>, Vec<f64>)> {
        match (self.weather_by, self.weather_cy) {
            (Some(by), Some(cy)) => Ok((by.hourly(), cy.hourly())),
            _ => bail!("Technology {id} needs temperature data, but none was provided"),
        }
    }
}

/// Efficiency of a non-hybrid technology in the base and current years
fn component_efficiencies(
    definition: &TechnologyDefinition,
    context: &TechnologyContext,
    temperatures: Option<&(Vec<f64>, Vec<f64>)>,
) -> Result<(Efficiency, Efficiency)> {
    let eff_cy =
        definition.nominal_eff_cy(context.base_yr, context.curr_yr, context.diffusion_shape);
    match definition.tech_type {
        TechnologyType::Standard => Ok((
            Efficiency::Annual(definition.eff_by),
            Efficiency::Annual(eff_cy),
        )),
        TechnologyType::HeatPump => {
            let (temps_by, temps_cy) = temperatures.context("Heat pumps need temperature data")?;
            let hourly = |nominal: f64, temps: &[f64]| {
                temps
                    .iter()
                    .map(|t| heat_pump_efficiency(nominal, *t, context.t_base_heating))
                    .collect()
            };
            Ok((
                Efficiency::Hourly(hourly(definition.eff_by, temps_by)),
                Efficiency::Hourly(hourly(eff_cy, temps_cy)),
            ))
        }
        TechnologyType::Hybrid => bail!("Nested hybrid technology {}", definition.id),
    }
}

/// Blend two technologies' efficiencies hour by hour.
///
/// # Returns
///
/// The hourly blended efficiency and the hourly share of fuel of each fueltype.
fn blend_hybrid(
    hybrid: &HybridDefinition,
    temperatures: &[f64],
    (low, low_fueltype): (&Efficiency, FuelType),
    (high, high_fueltype): (&Efficiency, FuelType),
) -> (Vec<f64>, IndexMap<FuelType, Vec<f64>>) {
    let mut efficiency = Vec::with_capacity(temperatures.len());
    let mut shares: IndexMap<FuelType, Vec<f64>> = IndexMap::new();
    shares.insert(low_fueltype, vec![0.0; temperatures.len()]);
    shares.insert(high_fueltype, vec![0.0; temperatures.len()]);

    for (hour, t) in temperatures.iter().enumerate() {
        let share_high = hybrid.service_share_high_temp(*t);
        let fuel_low = (1.0 - share_high) / low.at_hour(hour);
        let fuel_high = share_high / high.at_hour(hour);
        let fuel_total = fuel_low + fuel_high;

        efficiency.push(1.0 / fuel_total);
        shares[&low_fueltype][hour] += fuel_low / fuel_total;
        shares[&high_fueltype][hour] += fuel_high / fuel_total;
    }

    (efficiency, shares)
}

impl Technology {
    /// Resolve a technology definition for the region and year described by `context`.
    pub fn from_definition(
        definition: &TechnologyDefinition,
        definitions: &TechnologyDefinitionMap,
        context: &TechnologyContext,
    ) -> Result<Self> {
        let needs_weather = |def: &TechnologyDefinition| def.tech_type != TechnologyType::Standard;
        let temperatures = if needs_weather(definition) {
            Some(context.hourly_temperatures(&definition.id)?)
        } else {
            None
        };

        let Some(hybrid) = &definition.hybrid else {
            let (eff_by, eff_cy) =
                component_efficiencies(definition, context, temperatures.as_ref())?;
            return Ok(Self {
                id: definition.id.clone(),
                tech_type: definition.tech_type,
                fueltype: definition.fueltype,
                eff_by,
                eff_cy,
                fuel_split: FuelSplit::Single(definition.fueltype),
            });
        };

        let (temps_by, temps_cy) = temperatures
            .as_ref()
            .with_context(|| format!("Hybrid technology {} needs temperatures", definition.id))?;
        let get_component = |id: &TechnologyID| {
            definitions
                .get(id)
                .with_context(|| format!("Unknown component technology {id}"))
        };
        let low = get_component(&hybrid.tech_low_temp)?;
        let high = get_component(&hybrid.tech_high_temp)?;
        let (low_by, low_cy) = component_efficiencies(low, context, temperatures.as_ref())?;
        let (high_by, high_cy) = component_efficiencies(high, context, temperatures.as_ref())?;

        let (eff_by, _) = blend_hybrid(
            hybrid,
            temps_by,
            (&low_by, low.fueltype),
            (&high_by, high.fueltype),
        );
        let (eff_cy, shares) = blend_hybrid(
            hybrid,
            temps_cy,
            (&low_cy, low.fueltype),
            (&high_cy, high.fueltype),
        );

        Ok(Self {
            id: definition.id.clone(),
            tech_type: definition.tech_type,
            fueltype: definition.fueltype,
            eff_by: Efficiency::Hourly(eff_by),
            eff_cy: Efficiency::Hourly(eff_cy),
            fuel_split: FuelSplit::Hourly(shares),
        })
    }
}

/// The technologies available in one submodel for one region and year.
///
/// Technologies are looked up by technology and end use. The same resolved technology is shared
/// between all the end uses which use it.
#[derive(Debug, Default)]
pub struct TechnologyStock {
    technologies: HashMap<(TechnologyID, EnduseID), Rc<Technology>>,
}

impl TechnologyStock {
    /// Resolve the technologies used by each end use.
    ///
    /// # Arguments
    ///
    /// * `definitions` - All technology definitions
    /// * `enduse_technologies` - Pairs of end use and technology used by that end use
    /// * `context` - Region- and year-specific inputs
    pub fn new<'a, I>(
        definitions: &TechnologyDefinitionMap,
        enduse_technologies: I,
        context: &TechnologyContext,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a EnduseID, &'a TechnologyID)>,
    {
        let mut resolved: HashMap<TechnologyID, Rc<Technology>> = HashMap::new();
        let mut technologies = HashMap::new();
        for (enduse, technology_id) in enduse_technologies {
            let technology = if let Some(technology) = resolved.get(technology_id) {
                Rc::clone(technology)
            } else {
                let definition = definitions.get(technology_id).with_context(|| {
                    format!("Unknown technology {technology_id} used by end use {enduse}")
                })?;
                let technology = Rc::new(
                    Technology::from_definition(definition, definitions, context)
                        .with_context(|| format!("Could not resolve technology {technology_id}"))?,
                );
                resolved.insert(technology_id.clone(), Rc::clone(&technology));
                technology
            };

            technologies.insert((technology_id.clone(), enduse.clone()), technology);
        }

        Ok(Self { technologies })
    }

    /// Get a technology for an end use
    pub fn get(&self, technology_id: &TechnologyID, enduse: &EnduseID) -> Result<&Technology> {
        self.technologies
            .get(&(technology_id.clone(), enduse.clone()))
            .map(AsRef::as_ref)
            .with_context(|| {
                format!("Technology {technology_id} is not in the stock for end use {enduse}")
            })
    }

    /// The number of (technology, end use) entries
    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    /// Whether the stock is empty
    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }
}
