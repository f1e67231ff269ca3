//! Fixtures for tests

use crate::diffusion::{DiffusionChoice, SigmoidShape};
use crate::fueltype::{DAYS_PER_YEAR, FuelType};
use crate::model::ModelParameters;
use crate::region::RegionID;
use crate::technology::{
    HybridDefinition, TechnologyDefinition, TechnologyDefinitionMap, TechnologyType,
};
use indexmap::{IndexSet, indexmap};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn region_ids() -> IndexSet<RegionID> {
    ["GBR".into(), "USA".into()].into_iter().collect()
}

#[fixture]
pub fn model_parameters() -> ModelParameters {
    ModelParameters {
        base_yr: 2015,
        simulated_yrs: vec![2015, 2020],
        mode_constrained: true,
        allow_placeholder_technologies: true,
        modelled_days: (0..DAYS_PER_YEAR).collect(),
        t_base_heating: 15.5,
        t_base_cooling: 21.0,
        technology_diffusion: SigmoidShape::default(),
        process_mixes: Vec::new(),
        load_profiles: Vec::new(),
    }
}

/// A technology whose efficiency does not change over time
fn constant_technology(
    id: &str,
    fueltype: FuelType,
    tech_type: TechnologyType,
    eff: f64,
) -> TechnologyDefinition {
    TechnologyDefinition {
        id: id.into(),
        fueltype,
        tech_type,
        eff_by: eff,
        eff_ey: eff,
        eff_achieved: 1.0,
        diff_method: DiffusionChoice::Linear,
        yr_until_changed: 2050,
        hybrid: None,
    }
}

#[fixture]
pub fn technology_definitions() -> TechnologyDefinitionMap {
    let hybrid = TechnologyDefinition {
        hybrid: Some(HybridDefinition {
            tech_low_temp: "boiler_gas".into(),
            tech_high_temp: "heat_pump".into(),
            temp_cutoff_low: 0.0,
            temp_cutoff_high: 10.0,
        }),
        ..constant_technology("hybrid_gas_hp", FuelType::Gas, TechnologyType::Hybrid, 1.0)
    };

    indexmap! {
        "boiler_gas".into() => constant_technology(
            "boiler_gas",
            FuelType::Gas,
            TechnologyType::Standard,
            0.9,
        ),
        "heat_pump".into() => constant_technology(
            "heat_pump",
            FuelType::Electricity,
            TechnologyType::HeatPump,
            3.0,
        ),
        "heat_pump_standard".into() => constant_technology(
            "heat_pump_standard",
            FuelType::Electricity,
            TechnologyType::Standard,
            3.0,
        ),
        "hybrid_gas_hp".into() => hybrid,
    }
}
