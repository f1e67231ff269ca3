//! Scenario parameters and their resolution into strategy variables for a region and year.
use crate::id::EnduseID;
use crate::narrative::Narrative;
use crate::region::RegionID;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::collections::HashMap;
use strum::Display;

/// A scenario parameter which can be driven by a narrative
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Display, DeserializeLabeledStringEnum)]
#[strum(serialize_all = "snake_case")]
pub enum ScenarioParameter {
    /// Fraction of consumers with a smart meter
    #[string = "smart_meter_penetration"]
    SmartMeterPenetration,
    /// Fraction of an end use's fuel saved by consumers with a smart meter
    #[string = "smart_meter_saving"]
    SmartMeterSaving,
    /// Fractional change in an end use's demand
    #[string = "enduse_change"]
    EnduseChange,
    /// Fraction of floor area which is cooled
    #[string = "cooled_floorarea"]
    CooledFloorarea,
    /// Share of an industrial process mix going to the switched process
    #[string = "process_mix_share"]
    ProcessMixShare,
    /// Fraction of service recovered from waste heat
    #[string = "heat_recovery"]
    HeatRecovery,
    /// Fractional reduction of service from reduced air leakage
    #[string = "air_leakage"]
    AirLeakage,
    /// Improvement of the daily load factor through demand management
    #[string = "load_factor_improvement"]
    LoadFactorImprovement,
}

impl ScenarioParameter {
    /// Whether the parameter is given separately for each end use
    pub fn is_enduse_specific(self) -> bool {
        self != Self::SmartMeterPenetration
    }
}

/// The narratives of a scenario, keyed by parameter and (for end-use-specific parameters) end use
#[derive(Debug, Default, PartialEq)]
pub struct Scenario {
    narratives: IndexMap<(ScenarioParameter, Option<EnduseID>), Narrative>,
}

impl Scenario {
    /// Add the narrative for a parameter.
    ///
    /// End-use-specific parameters must name an end use and others must not.
    pub fn insert(
        &mut self,
        parameter: ScenarioParameter,
        enduse: Option<EnduseID>,
        narrative: Narrative,
    ) -> Result<()> {
        ensure!(
            parameter.is_enduse_specific() == enduse.is_some(),
            "{} must {}be given for a specific end use",
            parameter,
            if parameter.is_enduse_specific() {
                ""
            } else {
                "not "
            }
        );

        let key = (parameter, enduse);
        ensure!(
            !self.narratives.contains_key(&key),
            "Duplicate narrative for {}",
            parameter
        );
        self.narratives.insert(key, narrative);

        Ok(())
    }

    /// Get the narrative for a parameter and end use, if any
    pub fn get(
        &self,
        parameter: ScenarioParameter,
        enduse: Option<&EnduseID>,
    ) -> Option<&Narrative> {
        self.narratives.get(&(parameter, enduse.cloned()))
    }

    /// Iterate over the end-use-specific narratives for a parameter
    fn iter_enduse(
        &self,
        parameter: ScenarioParameter,
    ) -> impl Iterator<Item = (&EnduseID, &Narrative)> {
        self.narratives
            .iter()
            .filter(move |((p, _), _)| *p == parameter)
            .filter_map(|((_, enduse), narrative)| Some((enduse.as_ref()?, narrative)))
    }

    /// The end uses named by any narrative
    pub fn enduses(&self) -> impl Iterator<Item = &EnduseID> {
        self.narratives.keys().filter_map(|(_, enduse)| enduse.as_ref())
    }
}

/// A parameter's values in the base year and the current year
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Change {
    /// Value in the base year
    pub by: f64,
    /// Value in the current year
    pub cy: f64,
}

/// Scenario parameters resolved for one region and year.
///
/// A missing entry means the parameter has no effect.
#[derive(PartialEq, Debug, Default)]
pub struct StrategyVariables {
    /// Smart meter penetration
    pub smart_meter_penetration: Option<Change>,
    /// Smart meter saving rate per end use
    pub smart_meter_savings: HashMap<EnduseID, f64>,
    /// Fractional change in demand per end use
    pub enduse_change: HashMap<EnduseID, f64>,
    /// Cooled floor area fraction per end use
    pub cooled_floorarea: HashMap<EnduseID, Change>,
    /// Share of the switched process per end use
    pub process_mix_share: HashMap<EnduseID, f64>,
    /// Heat recovery fraction per end use
    pub heat_recovery: HashMap<EnduseID, f64>,
    /// Air leakage improvement per end use
    pub air_leakage: HashMap<EnduseID, f64>,
    /// Load factor improvement per end use
    pub load_factor_improvement: HashMap<EnduseID, f64>,
}

impl StrategyVariables {
    /// Resolve the scenario's narratives for a region and year.
    ///
    /// # Arguments
    ///
    /// * `scenario` - The scenario's narratives
    /// * `base_yr` - The base year of the simulation
    /// * `curr_yr` - The year being simulated
    /// * `region_id` - The region being simulated
    pub fn resolve(scenario: &Scenario, base_yr: u32, curr_yr: u32, region_id: &RegionID) -> Self {
        let change = |narrative: &Narrative| Change {
            by: narrative.resolve(base_yr, region_id),
            cy: narrative.resolve(curr_yr, region_id),
        };
        let current = |parameter| {
            scenario
                .iter_enduse(parameter)
                .map(|(enduse, narrative)| (enduse.clone(), narrative.resolve(curr_yr, region_id)))
                .collect()
        };

        Self {
            smart_meter_penetration: scenario
                .get(ScenarioParameter::SmartMeterPenetration, None)
                .map(change),
            smart_meter_savings: current(ScenarioParameter::SmartMeterSaving),
            enduse_change: current(ScenarioParameter::EnduseChange),
            cooled_floorarea: scenario
                .iter_enduse(ScenarioParameter::CooledFloorarea)
                .map(|(enduse, narrative)| (enduse.clone(), change(narrative)))
                .collect(),
            process_mix_share: current(ScenarioParameter::ProcessMixShare),
            heat_recovery: current(ScenarioParameter::HeatRecovery),
            air_leakage: current(ScenarioParameter::AirLeakage),
            load_factor_improvement: current(ScenarioParameter::LoadFactorImprovement),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diffusion::DiffusionChoice;
    use crate::fixture::assert_error;
    use crate::narrative::NarrativePoint;
    use float_cmp::assert_approx_eq;

    fn linear(value_by: f64, value_ey: f64) -> Narrative {
        Narrative::new(vec![NarrativePoint {
            base_yr: 2015,
            end_yr: 2035,
            value_by,
            value_ey,
            diffusion_choice: DiffusionChoice::Linear,
            sig_midpoint: 0.0,
            sig_steepness: 1.0,
            regional_specific: false,
            regional_values: HashMap::new(),
        }])
        .unwrap()
    }

    #[test]
    fn test_insert_invalid() {
        let mut scenario = Scenario::default();
        assert_error!(
            scenario.insert(ScenarioParameter::EnduseChange, None, linear(0.0, 1.0)),
            "enduse_change must be given for a specific end use"
        );
        assert_error!(
            scenario.insert(
                ScenarioParameter::SmartMeterPenetration,
                Some("lighting".into()),
                linear(0.0, 1.0)
            ),
            "smart_meter_penetration must not be given for a specific end use"
        );

        scenario
            .insert(
                ScenarioParameter::HeatRecovery,
                Some("space_heating".into()),
                linear(0.0, 0.1),
            )
            .unwrap();
        assert_error!(
            scenario.insert(
                ScenarioParameter::HeatRecovery,
                Some("space_heating".into()),
                linear(0.0, 0.1)
            ),
            "Duplicate narrative for heat_recovery"
        );
    }

    #[test]
    fn test_resolve() {
        let mut scenario = Scenario::default();
        scenario
            .insert(
                ScenarioParameter::SmartMeterPenetration,
                None,
                linear(0.2, 0.6),
            )
            .unwrap();
        scenario
            .insert(
                ScenarioParameter::EnduseChange,
                Some("lighting".into()),
                linear(0.0, -0.2),
            )
            .unwrap();
        scenario
            .insert(
                ScenarioParameter::CooledFloorarea,
                Some("cooling".into()),
                linear(0.1, 0.3),
            )
            .unwrap();

        let variables = StrategyVariables::resolve(&scenario, 2015, 2025, &"GBR".into());
        let penetration = variables.smart_meter_penetration.unwrap();
        assert_approx_eq!(f64, penetration.by, 0.2);
        assert_approx_eq!(f64, penetration.cy, 0.4);
        assert_approx_eq!(f64, variables.enduse_change["lighting"], -0.1);
        assert_approx_eq!(f64, variables.cooled_floorarea["cooling"].cy, 0.2);
        assert!(variables.heat_recovery.is_empty());
        assert_eq!(scenario.enduses().count(), 2);
    }
}
