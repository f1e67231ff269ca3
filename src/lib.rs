//! Simulation of end-use energy demand.
//!
//! Base-year fuel of each end use is adjusted for the climate and scenario assumptions, converted
//! to energy service and back to fuel with the current year's technologies, then spread over the
//! hours of the year with load profiles.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod cli;
pub mod climate;
pub mod demand_management;
pub mod diffusion;
pub mod enduse;
pub mod fuel_share;
pub mod fueltype;
pub mod id;
pub mod input;
pub mod load_profile;
pub mod log;
pub mod model;
pub mod narrative;
pub mod output;
pub mod region;
pub mod settings;
pub mod simulation;
pub mod strategy;
pub mod technology;

#[cfg(test)]
mod fixture;

/// Get the folder in which program-wide configuration files are stored
pub fn get_config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("enduse_demand");

    path
}
