//! Code for reading scenario narratives from a TOML file.
use super::*;
use crate::enduse::EnduseMap;
use crate::id::{EnduseID, IDCollection};
use crate::narrative::{Narrative, NarrativePoint};
use crate::region::RegionID;
use crate::strategy::{Scenario, ScenarioParameter};
use indexmap::IndexSet;
use serde::Deserialize;
use std::path::Path;

const SCENARIO_FILE_NAME: &str = "scenario.toml";

/// The contents of the scenario file
#[derive(Debug, Deserialize, PartialEq)]
struct ScenarioFile {
    #[serde(default)]
    narrative: Vec<NarrativePointRaw>,
}

/// A change point of a narrative, with the parameter it applies to
#[derive(Debug, Deserialize, PartialEq)]
struct NarrativePointRaw {
    parameter: ScenarioParameter,
    enduse: Option<String>,
    #[serde(flatten)]
    point: NarrativePoint,
}

/// Read scenario narratives from the scenario TOML file.
///
/// The file is optional: without it, no scenario parameter changes. Change points of the same
/// parameter (and end use) form a single narrative, in the order they appear in the file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `region_ids` - All possible region IDs
/// * `enduses` - All end uses
pub fn read_scenario(
    model_dir: &Path,
    region_ids: &IndexSet<RegionID>,
    enduses: &EnduseMap,
) -> Result<Scenario> {
    let file_path = model_dir.join(SCENARIO_FILE_NAME);
    if !file_path.exists() {
        return Ok(Scenario::default());
    }

    let scenario_file: ScenarioFile = read_toml(&file_path)?;
    read_scenario_from_iter(scenario_file.narrative.into_iter(), region_ids, enduses)
        .with_context(|| input_err_msg(&file_path))
}

fn read_scenario_from_iter<I>(
    iter: I,
    region_ids: &IndexSet<RegionID>,
    enduses: &EnduseMap,
) -> Result<Scenario>
where
    I: Iterator<Item = NarrativePointRaw>,
{
    let mut points: IndexMap<(ScenarioParameter, Option<EnduseID>), Vec<NarrativePoint>> =
        IndexMap::new();
    for raw in iter {
        let enduse = raw
            .enduse
            .as_deref()
            .map(|enduse| enduses.get_id_by_str(enduse))
            .transpose()?;
        for region_id in raw.point.regional_values.keys() {
            region_ids.get_id_by_str(&region_id.0)?;
        }

        points
            .entry((raw.parameter, enduse))
            .or_default()
            .push(raw.point);
    }

    let mut scenario = Scenario::default();
    for ((parameter, enduse), points) in points {
        let narrative = Narrative::new(points).with_context(|| match &enduse {
            Some(enduse) => format!("Invalid narrative for {parameter} of end use {enduse}"),
            None => format!("Invalid narrative for {parameter}"),
        })?;
        scenario.insert(parameter, enduse, narrative)?;
    }

    Ok(scenario)
}
