//! Integration tests for the `run` command.
use enduse_demand::cli::{RunOpts, handle_run_command};
use enduse_demand::settings::Settings;
use float_cmp::assert_approx_eq;
use itertools::Itertools;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Get the path to the demo model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

/// Read the annual demand output file
fn read_annual_demand(output_dir: &Path) -> Vec<(u32, String, String, f64)> {
    csv::Reader::from_path(output_dir.join("annual_demand.csv"))
        .unwrap()
        .into_deserialize()
        .try_collect()
        .unwrap()
}

/// An integration test for the `run` command.
#[test]
fn test_handle_run_command() {
    unsafe { std::env::set_var("ENDUSE_DEMAND_LOG_LEVEL", "off") };

    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let opts = RunOpts {
        output_dir: Some(output_dir.clone()),
        overwrite: false,
        debug_model: true,
    };
    handle_run_command(&get_model_dir(), &opts, Some(Settings::default())).unwrap();

    for file_name in [
        "annual_demand.csv",
        "peak_demand.csv",
        "debug_hourly_demand.csv",
        "enduse_demand_info.log",
        "enduse_demand_error.log",
    ] {
        assert!(output_dir.join(file_name).is_file(), "Missing {file_name}");
    }

    let records = read_annual_demand(&output_dir);
    let years: HashSet<_> = records.iter().map(|(year, _, _, _)| *year).collect();
    assert_eq!(years, HashSet::from([2015, 2020, 2030, 2050]));
    assert!(records.iter().all(|(_, _, _, fuel)| *fuel >= 0.0));

    let keys: HashSet<_> = records.iter().map(|(_, _, key, _)| key.as_str()).collect();
    for key in [
        "residential_gas_boiler_gas",
        "residential_electricity_heat_pump_air",
        "residential_electricity_hybrid_gas_hp",
        "residential_gas_placeholder",
        "service_electricity_air_conditioner",
        "industry_gas_placeholder",
    ] {
        assert!(keys.contains(key), "Missing key {key}");
    }

    // Nothing changes in the base year, so all fuel ends up in the output
    let total_sco_by: f64 = records
        .iter()
        .filter(|(year, region, _, _)| *year == 2015 && region == "SCO")
        .map(|(_, _, _, fuel)| fuel)
        .sum();
    assert_approx_eq!(f64, total_sco_by, 23300.0, epsilon = 1e-3);

    // Output folder now has contents, so can't be reused without overwriting
    assert_eq!(
        handle_run_command(&get_model_dir(), &opts, Some(Settings::default()))
            .unwrap_err()
            .chain()
            .next()
            .unwrap()
            .to_string(),
        format!(
            "Failed to create output directory: {}",
            output_dir.display()
        )
    );
}
