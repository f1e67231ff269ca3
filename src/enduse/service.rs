//! Conversion between fuel and energy service, service reductions and technology switching.
use super::disaggregation::{disaggregate_service, disaggregate_value};
use crate::diffusion::SigmoidParameters;
use crate::fuel_share::{TechnologyKey, TechnologyShare};
use crate::fueltype::{FuelVector, HourlyFuel};
use crate::id::{EnduseID, SectorID, TechnologyID};
use crate::load_profile::{LoadProfile, LoadProfileStore};
use crate::technology::TechnologyStock;
use anyhow::{Result, ensure};
use float_cmp::approx_eq;
use indexmap::IndexMap;
use log::{debug, warn};

/// Diffusion curves for the technologies taking part in a service switch.
///
/// Technologies not in the switch keep their service.
pub type ServiceSwitch = IndexMap<TechnologyID, SigmoidParameters>;

/// Annual energy service (or fuel) for each technology of an end use
pub type TechnologyValues = IndexMap<TechnologyKey, f64>;

/// The technologies of one end use and sector, with the load profiles their service follows
pub struct EnduseTechnologies<'a> {
    /// The end use
    pub enduse: &'a EnduseID,
    /// The sector
    pub sector: &'a SectorID,
    /// Technologies resolved for the region and year
    pub technologies: &'a TechnologyStock,
    /// Load profiles for the region and year
    pub load_profiles: &'a LoadProfileStore,
    /// Days of the year which are simulated
    pub modelled_days: &'a [usize],
}

impl EnduseTechnologies<'_> {
    /// The load profile of a technology, or the end-use-level profile for a placeholder
    pub fn profile(&self, key: &TechnologyKey) -> Result<&LoadProfile> {
        let technology = match key {
            TechnologyKey::Technology(id) => Some(id),
            TechnologyKey::Placeholder(_) => None,
        };
        self.load_profiles
            .get_required(self.enduse, self.sector, technology)
            .map(AsRef::as_ref)
    }

    /// Base-year efficiency of a technology over its load profile (one for a placeholder)
    fn eff_by(&self, key: &TechnologyKey) -> Result<f64> {
        match key {
            TechnologyKey::Placeholder(_) => Ok(1.0),
            TechnologyKey::Technology(id) => {
                let technology = self.technologies.get(id, self.enduse)?;
                let profile = self.profile(key)?;
                Ok(technology.eff_by.over_profile(profile, self.modelled_days))
            }
        }
    }
}

/// Convert fuel to energy service using base-year efficiencies.
///
/// Service of weather-dependent technologies is weighted by the hours in which it is delivered.
///
/// # Arguments
///
/// * `fuel` - Annual fuel of the end use
/// * `shares` - How each fueltype's fuel is split between technologies
/// * `technologies` - Technologies and load profiles of the end use
pub fn fuel_to_service(
    fuel: &FuelVector,
    shares: &[TechnologyShare],
    technologies: &EnduseTechnologies,
) -> Result<TechnologyValues> {
    let mut service = TechnologyValues::new();
    for share in shares {
        let eff_by = technologies.eff_by(&share.key)?;
        let value = fuel[share.fueltype] * share.share * eff_by;
        *service.entry(share.key.clone()).or_default() += value;
    }

    Ok(service)
}

/// Convert energy service to hourly fuel using current-year efficiencies.
///
/// Each technology's service is spread over the modelled hours with its load profile and
/// converted to fuel with the efficiency of each hour.
pub fn service_to_fuel(
    service: &TechnologyValues,
    technologies: &EnduseTechnologies,
) -> Result<IndexMap<TechnologyKey, HourlyFuel>> {
    service
        .iter()
        .map(|(key, service)| {
            let profile = technologies.profile(key)?;
            let hourly = match key {
                TechnologyKey::Technology(id) => {
                    let technology = technologies.technologies.get(id, technologies.enduse)?;
                    disaggregate_service(*service, technology, profile, technologies.modelled_days)
                }
                TechnologyKey::Placeholder(fueltype) => {
                    disaggregate_value(*fueltype, *service, profile)
                }
            };
            Ok((key.clone(), hourly))
        })
        .collect()
}

/// Reduce every technology's service by a fraction (e.g. for heat recovery)
pub fn reduce_service(service: &mut TechnologyValues, reduction: Option<f64>) {
    if let Some(reduction) = reduction {
        for value in service.values_mut() {
            *value *= 1.0 - reduction;
        }
    }
}

/// Redistribute service between technologies according to their diffusion curves.
///
/// Each switched technology gets the share of total service given by its curve in `curr_yr`.
/// Other technologies keep their service.
pub fn switch_service(
    service: &TechnologyValues,
    switch: &ServiceSwitch,
    curr_yr: u32,
) -> Result<TechnologyValues> {
    let total: f64 = service.values().sum();
    let mut switched = service.clone();
    for (id, parameters) in switch {
        let share = parameters.evaluate(curr_yr);
        ensure!(
            share >= 0.0,
            "Service share of technology {id} is negative ({share})"
        );
        switched.insert(TechnologyKey::Technology(id.clone()), total * share);
    }

    let total_switched: f64 = switched.values().sum();
    if !approx_eq!(f64, total, total_switched, epsilon = 1e-6 * total.abs().max(1.0)) {
        warn!(
            "Service after switching ({total_switched}) differs from service before switching \
            ({total}) in {curr_yr}"
        );
    }
    debug!("Switched service in {curr_yr}: {switched:?}");

    Ok(switched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::YearWeather;
    use crate::diffusion::SigmoidShape;
    use crate::fixture::{assert_error, technology_definitions};
    use crate::fueltype::{DAYS_PER_YEAR, FuelType, HOURS_PER_DAY};
    use crate::technology::{TechnologyContext, TechnologyDefinitionMap};
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::{fixture, rstest};
    use std::rc::Rc;

    /// Technologies and flat load profiles for space heating on the given days
    struct Setup {
        enduse: EnduseID,
        sector: SectorID,
        stock: TechnologyStock,
        load_profiles: LoadProfileStore,
        modelled_days: Vec<usize>,
    }

    impl Setup {
        fn new(
            definitions: &TechnologyDefinitionMap,
            weather: &YearWeather,
            modelled_days: Vec<usize>,
        ) -> Self {
            let enduse: EnduseID = "space_heating".into();
            let sector: SectorID = "dwellings".into();
            let context = TechnologyContext {
                base_yr: 2015,
                curr_yr: 2015,
                diffusion_shape: SigmoidShape::default(),
                t_base_heating: 15.5,
                weather_by: Some(weather),
                weather_cy: Some(weather),
            };
            let boiler: TechnologyID = "boiler_gas".into();
            let heat_pump: TechnologyID = "heat_pump".into();
            let stock = TechnologyStock::new(
                definitions,
                [(&enduse, &boiler), (&enduse, &heat_pump)],
                &context,
            )
            .unwrap();

            let mut load_profiles = LoadProfileStore::new(&modelled_days).unwrap();
            let profile = Rc::new(LoadProfile::flat(&modelled_days).unwrap());
            load_profiles
                .insert(&enduse, &sector, None, profile)
                .unwrap();

            Self {
                enduse,
                sector,
                stock,
                load_profiles,
                modelled_days,
            }
        }

        fn technologies(&self) -> EnduseTechnologies<'_> {
            EnduseTechnologies {
                enduse: &self.enduse,
                sector: &self.sector,
                technologies: &self.stock,
                load_profiles: &self.load_profiles,
                modelled_days: &self.modelled_days,
            }
        }
    }

    /// Extreme cold on the first day, no heating need on any other day
    #[fixture]
    fn weather() -> YearWeather {
        let mut temps = vec![15.5; DAYS_PER_YEAR];
        temps[0] = -100.0;
        YearWeather::new(temps).unwrap()
    }

    #[fixture]
    fn setup(technology_definitions: TechnologyDefinitionMap, weather: YearWeather) -> Setup {
        Setup::new(&technology_definitions, &weather, vec![0, 1])
    }

    fn boiler() -> TechnologyKey {
        TechnologyKey::Technology("boiler_gas".into())
    }

    fn heat_pump() -> TechnologyKey {
        TechnologyKey::Technology("heat_pump".into())
    }

    #[rstest]
    fn test_round_trip(setup: Setup) {
        let fuel = FuelVector::single(FuelType::Gas, 1000.0);
        let shares = [TechnologyShare {
            key: boiler(),
            fueltype: FuelType::Gas,
            share: 1.0,
        }];
        let service = fuel_to_service(&fuel, &shares, &setup.technologies()).unwrap();
        assert_eq!(service[&boiler()], 900.0);
        let fuel_back = service_to_fuel(&service, &setup.technologies()).unwrap();
        assert_approx_eq!(
            f64,
            fuel_back[&boiler()].total(FuelType::Gas),
            1000.0,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_round_trip_heat_pump(setup: Setup) {
        let fuel = FuelVector::single(FuelType::Electricity, 100.0);
        let shares = [TechnologyShare {
            key: heat_pump(),
            fueltype: FuelType::Electricity,
            share: 1.0,
        }];
        let service = fuel_to_service(&fuel, &shares, &setup.technologies()).unwrap();
        assert_approx_eq!(
            f64,
            service[&heat_pump()],
            100.0 / (0.5 + 0.5 / 3.8),
            epsilon = 1e-9
        );
        let fuel_back = service_to_fuel(&service, &setup.technologies()).unwrap();
        assert_approx_eq!(
            f64,
            fuel_back[&heat_pump()].total(FuelType::Electricity),
            100.0,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_service_to_fuel_hourly_efficiency(setup: Setup) {
        let service = indexmap! {heat_pump() => 96.0};
        let fuel = service_to_fuel(&service, &setup.technologies()).unwrap();
        let electricity = fuel[&heat_pump()].get(FuelType::Electricity);

        // 2 units of service per hour over two days; efficiency 1 on the cold day, 3.8 after
        assert_approx_eq!(f64, electricity[0][0], 2.0, epsilon = 1e-12);
        assert_approx_eq!(f64, electricity[1][HOURS_PER_DAY - 1], 2.0 / 3.8, epsilon = 1e-12);
        assert_approx_eq!(
            f64,
            fuel[&heat_pump()].total(FuelType::Electricity),
            48.0 + 48.0 / 3.8,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_service_to_fuel_cold_day_only(
        technology_definitions: TechnologyDefinitionMap,
        weather: YearWeather,
    ) {
        let setup = Setup::new(&technology_definitions, &weather, vec![0]);
        let service = indexmap! {heat_pump() => 100.0};
        let fuel = service_to_fuel(&service, &setup.technologies()).unwrap();
        assert_approx_eq!(
            f64,
            fuel[&heat_pump()].total(FuelType::Electricity),
            100.0,
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_placeholder(setup: Setup) {
        let fuel = FuelVector::single(FuelType::Oil, 50.0);
        let key = TechnologyKey::Placeholder(FuelType::Oil);
        let shares = [TechnologyShare {
            key: key.clone(),
            fueltype: FuelType::Oil,
            share: 1.0,
        }];
        let service = fuel_to_service(&fuel, &shares, &setup.technologies()).unwrap();
        assert_eq!(service[&key], 50.0);
        let fuel_back = service_to_fuel(&service, &setup.technologies()).unwrap();
        assert_approx_eq!(f64, fuel_back[&key].total(FuelType::Oil), 50.0, epsilon = 1e-9);
    }

    #[rstest]
    fn test_unknown_technology(setup: Setup) {
        let shares = [TechnologyShare {
            key: TechnologyKey::Technology("fusion".into()),
            fueltype: FuelType::Gas,
            share: 1.0,
        }];
        assert_error!(
            fuel_to_service(
                &FuelVector::single(FuelType::Gas, 1.0),
                &shares,
                &setup.technologies()
            ),
            "Technology fusion is not in the stock for end use space_heating"
        );
    }

    #[test]
    fn test_reduce_service() {
        let mut service = indexmap! {boiler() => 100.0};
        reduce_service(&mut service, Some(0.1));
        assert_approx_eq!(f64, service[&boiler()], 90.0);
        reduce_service(&mut service, None);
        assert_approx_eq!(f64, service[&boiler()], 90.0);
    }

    #[fixture]
    fn two_technology_switch() -> ServiceSwitch {
        indexmap! {
            "heat_pump".into() => SigmoidParameters {
                midpoint: 2040.0,
                steepness: 0.5,
                l_parameter: 1.0,
            },
            "boiler_gas".into() => SigmoidParameters {
                midpoint: 2040.0,
                steepness: -0.5,
                l_parameter: 1.0,
            },
        }
    }

    #[rstest]
    #[case(2040, 0.5, 0.5)]
    #[case(2060, 1.0, 0.0)]
    #[case(2020, 0.0, 1.0)]
    fn test_switch_service(
        two_technology_switch: ServiceSwitch,
        #[case] curr_yr: u32,
        #[case] heat_pump_share: f64,
        #[case] boiler_share: f64,
    ) {
        let service = indexmap! {boiler() => 100.0};
        let switched = switch_service(&service, &two_technology_switch, curr_yr).unwrap();
        let heat_pump = TechnologyKey::Technology("heat_pump".into());
        assert_approx_eq!(f64, switched[&heat_pump], 100.0 * heat_pump_share, epsilon = 0.01);
        assert_approx_eq!(f64, switched[&boiler()], 100.0 * boiler_share, epsilon = 0.01);
    }

    #[test]
    fn test_switch_service_holds_others() {
        let placeholder = TechnologyKey::Placeholder(FuelType::Oil);
        let service = indexmap! {boiler() => 80.0, placeholder.clone() => 20.0};
        let switch = indexmap! {
            "boiler_gas".into() => SigmoidParameters {
                midpoint: 2040.0,
                steepness: 0.5,
                l_parameter: 0.8,
            },
        };
        let switched = switch_service(&service, &switch, 2100).unwrap();
        assert_eq!(switched[&placeholder], 20.0);
        assert_approx_eq!(f64, switched[&boiler()], 80.0, epsilon = 1e-6);
    }

    #[test]
    fn test_switch_service_negative() {
        let switch = indexmap! {
            "boiler_gas".into() => SigmoidParameters {
                midpoint: 2040.0,
                steepness: 0.5,
                l_parameter: -1.0,
            },
        };
        assert!(switch_service(&indexmap! {boiler() => 1.0}, &switch, 2040).is_err());
    }
}
