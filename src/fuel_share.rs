//! Shares of each fueltype's fuel attributed to individual technologies.
use crate::fueltype::{FuelType, FuelVector};
use crate::id::{EnduseID, SectorID, TechnologyID};
use anyhow::{Result, ensure};
use float_cmp::approx_eq;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;

/// Technology name used in outputs when the technology mix is unknown
pub const PLACEHOLDER_TECHNOLOGY: &str = "placeholder";

/// Fuel shares for every (end use, sector) pair which has them
pub type FuelSharesMap = HashMap<(EnduseID, SectorID), FuelShares>;

/// How the fuel of one fueltype is divided between technologies
#[derive(PartialEq, Debug, Clone)]
pub enum TechnologyMix {
    /// Each technology's share of the fuel, summing to one
    Explicit(IndexMap<TechnologyID, f64>),
    /// The fuel is known but not which technologies use it
    Unknown,
}

/// Identifies a stream of fuel or service within an end use
#[derive(PartialEq, Eq, Hash, Debug, Clone, PartialOrd, Ord)]
pub enum TechnologyKey {
    /// A technology from the technology stock
    Technology(TechnologyID),
    /// Stands in for the unknown technologies using the given fueltype
    Placeholder(FuelType),
}

impl fmt::Display for TechnologyKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Technology(id) => write!(f, "{id}"),
            Self::Placeholder(_) => write!(f, "{PLACEHOLDER_TECHNOLOGY}"),
        }
    }
}

/// A share of one fueltype's fuel going to one technology
#[derive(PartialEq, Debug, Clone)]
pub struct TechnologyShare {
    /// The technology (or placeholder)
    pub key: TechnologyKey,
    /// The fueltype
    pub fueltype: FuelType,
    /// Fraction of the fueltype's fuel
    pub share: f64,
}

/// The technology mix of each fueltype for one end use and sector
#[derive(PartialEq, Debug, Clone, Default)]
pub struct FuelShares(IndexMap<FuelType, IndexMap<TechnologyID, f64>>);

impl FuelShares {
    /// Create a new [`FuelShares`], checking that each fueltype's shares sum to one
    pub fn new(shares: IndexMap<FuelType, IndexMap<TechnologyID, f64>>) -> Result<Self> {
        for (fueltype, technologies) in &shares {
            ensure!(
                !technologies.is_empty(),
                "No technologies given for fueltype {fueltype}"
            );
            ensure!(
                technologies.values().all(|share| (0.0..=1.0).contains(share)),
                "Shares for fueltype {fueltype} must be between 0 and 1"
            );
            let total: f64 = technologies.values().sum();
            ensure!(
                approx_eq!(f64, total, 1.0, epsilon = 1e-5),
                "Shares for fueltype {fueltype} sum to {total} rather than one"
            );
        }

        Ok(Self(shares))
    }

    /// The technology mix for a fueltype
    pub fn mix(&self, fueltype: FuelType) -> TechnologyMix {
        match self.0.get(&fueltype) {
            Some(technologies) => TechnologyMix::Explicit(technologies.clone()),
            None => TechnologyMix::Unknown,
        }
    }

    /// Whether any fueltype has technologies
    pub fn has_technologies(&self) -> bool {
        !self.0.is_empty()
    }

    /// Iterate over all technologies with their fueltype
    pub fn technologies(&self) -> impl Iterator<Item = (FuelType, &TechnologyID)> {
        self.0
            .iter()
            .flat_map(|(fueltype, technologies)| technologies.keys().map(move |id| (*fueltype, id)))
    }

    /// Check that either every fueltype with fuel has technologies or none does
    pub fn check_all_or_none(&self, fuel: &FuelVector) -> Result<()> {
        let mut with_fuel = fuel.iter_nonzero().map(|(fueltype, _)| fueltype);
        let Some(first) = with_fuel.next() else {
            return Ok(());
        };
        let first_defined = self.0.contains_key(&first);
        for fueltype in with_fuel {
            ensure!(
                self.0.contains_key(&fueltype) == first_defined,
                "Technologies are defined for some fueltypes but not others ({first} and \
                {fueltype})"
            );
        }

        Ok(())
    }

    /// Split fuel between technologies.
    ///
    /// Fueltypes with fuel but no technologies get a placeholder with a share of one. Fueltypes
    /// without fuel are skipped.
    pub fn split(&self, fuel: &FuelVector) -> Vec<TechnologyShare> {
        let mut shares = Vec::new();
        for (fueltype, _) in fuel.iter_nonzero() {
            match self.mix(fueltype) {
                TechnologyMix::Explicit(technologies) => {
                    shares.extend(technologies.into_iter().map(|(id, share)| TechnologyShare {
                        key: TechnologyKey::Technology(id),
                        fueltype,
                        share,
                    }));
                }
                TechnologyMix::Unknown => shares.push(TechnologyShare {
                    key: TechnologyKey::Placeholder(fueltype),
                    fueltype,
                    share: 1.0,
                }),
            }
        }

        shares
    }
}
