//! Load profiles spread annual fuel over the hours of the modelled days.
//!
//! A [`LoadProfile`] combines a daily shape (the share of the year's demand on each day) with an
//! hourly shape for each day (the share of the day's demand in each hour). Profiles are registered
//! in a [`LoadProfileStore`] under (end use, sector, technology) keys, where several keys may share
//! the same profile. A profile registered without a technology is the end-use-level profile.
use crate::climate::YearWeather;
use crate::fueltype::{DAYS_PER_YEAR, DayHours, HOURS_PER_DAY};
use crate::id::{EnduseID, SectorID, TechnologyID};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::warn;
use std::rc::Rc;

/// How demand is spread over the days of the year
#[derive(PartialEq, Debug, Clone)]
pub enum DailyShape {
    /// The same demand every day
    Flat,
    /// Proportional to heating degree days
    HeatingDegreeDays,
    /// Proportional to cooling degree days
    CoolingDegreeDays,
    /// Given explicitly for every day of the year
    Explicit(Vec<f64>),
}

impl DailyShape {
    /// Get the (unnormalised) daily values for a year.
    ///
    /// # Arguments
    ///
    /// * `weather` - Weather for the year, needed for degree-day shapes
    /// * `t_base_heating` - Base temperature for heating degree days
    /// * `t_base_cooling` - Base temperature for cooling degree days
    pub fn daily_values(
        &self,
        weather: Option<&YearWeather>,
        t_base_heating: f64,
        t_base_cooling: f64,
    ) -> Result<Vec<f64>> {
        let weather = || weather.context("Degree-day load profiles need temperature data");
        match self {
            Self::Flat => Ok(vec![1.0; DAYS_PER_YEAR]),
            Self::HeatingDegreeDays => Ok(weather()?.heating_degree_days(t_base_heating)),
            Self::CoolingDegreeDays => Ok(weather()?.cooling_degree_days(t_base_cooling)),
            Self::Explicit(values) => Ok(values.clone()),
        }
    }

    /// The day of the year with the greatest degree-day need.
    ///
    /// Cooling profiles peak on the day with the most cooling degree hours and all others on the
    /// day with the most heating degree hours.
    pub fn peak_day(
        &self,
        weather: &YearWeather,
        t_base_heating: f64,
        t_base_cooling: f64,
    ) -> Option<usize> {
        match self {
            Self::CoolingDegreeDays => weather.peak_cooling_day(t_base_cooling),
            _ => weather.peak_heating_day(t_base_heating),
        }
    }
}

/// Scale values so they sum to one, or return `None` if they sum to zero
fn normalise(values: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = values.iter().sum();
    (total > 0.0).then(|| values.iter().map(|value| value / total).collect())
}

/// Scale a day's hourly values so they sum to one
fn normalise_day(day: &DayHours) -> Result<DayHours> {
    let total: f64 = day.iter().sum();
    ensure!(total > 0.0, "Hourly shape must have a positive total");
    Ok(day.map(|value| value / total))
}

/// An immutable bundle of shapes used to spread annual fuel over hours
#[derive(PartialEq, Debug)]
pub struct LoadProfile {
    /// Share of annual demand on each modelled day (sums to one)
    shape_yd: Vec<f64>,
    /// Share of annual demand in each hour of the modelled days (sums to one)
    shape_yh: Vec<DayHours>,
    /// The day of the year with the greatest degree-day need
    peak_day: Option<usize>,
    /// Share of the whole year's demand falling on the peak day
    f_peak_yd: f64,
}

impl LoadProfile {
    /// Create a new [`LoadProfile`].
    ///
    /// # Arguments
    ///
    /// * `daily` - Daily demand for every day of the year (any scale)
    /// * `hourly` - Hourly demand for each day of the year (any scale)
    /// * `peak_day` - Day of the year with the greatest degree-day need, if any
    /// * `peak_hourly` - Hourly shape which replaces that of the peak day
    /// * `modelled_days` - Days of the year which are simulated
    pub fn new(
        daily: &[f64],
        hourly: &[DayHours],
        peak_day: Option<usize>,
        peak_hourly: Option<&DayHours>,
        modelled_days: &[usize],
    ) -> Result<Self> {
        ensure!(
            daily.len() == DAYS_PER_YEAR && hourly.len() == DAYS_PER_YEAR,
            "Load profiles must cover {DAYS_PER_YEAR} days"
        );
        ensure!(
            daily.iter().chain(hourly.iter().flatten()).all(|v| *v >= 0.0),
            "Load profiles cannot contain negative values"
        );
        ensure!(!modelled_days.is_empty(), "No modelled days");
        ensure!(
            peak_day.is_none_or(|day| day < DAYS_PER_YEAR),
            "Peak day must be less than {DAYS_PER_YEAR}"
        );

        let f_peak_yd = match (peak_day, normalise(daily)) {
            (Some(day), Some(shares)) => shares[day],
            _ => 0.0,
        };

        let mut hourly = hourly.to_vec();
        if let (Some(day), Some(peak_hourly)) = (peak_day, peak_hourly) {
            hourly[day] = *peak_hourly;
        }

        let modelled_daily: Vec<_> = modelled_days.iter().map(|day| daily[*day]).collect();
        let shape_yd = normalise(&modelled_daily).unwrap_or_else(|| {
            warn!("Load profile has no demand on the modelled days; using a flat profile");
            vec![1.0 / modelled_days.len() as f64; modelled_days.len()]
        });
        let shape_yh = shape_yd
            .iter()
            .zip(modelled_days)
            .map(|(share_day, day)| {
                let hours = normalise_day(&hourly[*day]).with_context(|| format!("Day {day}"))?;
                Ok(hours.map(|share_hour| share_day * share_hour))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            shape_yd,
            shape_yh,
            peak_day,
            f_peak_yd,
        })
    }

    /// A profile spreading demand evenly over all modelled hours
    pub fn flat(modelled_days: &[usize]) -> Result<Self> {
        Self::new(
            &[1.0; DAYS_PER_YEAR],
            &[[1.0; HOURS_PER_DAY]; DAYS_PER_YEAR],
            None,
            None,
            modelled_days,
        )
    }

    /// Share of annual demand on each modelled day
    pub fn shape_yd(&self) -> &[f64] {
        &self.shape_yd
    }

    /// Share of annual demand in each hour of the modelled days
    pub fn shape_yh(&self) -> &[DayHours] {
        &self.shape_yh
    }

    /// The day of the year with the greatest degree-day need, if known
    pub fn peak_day(&self) -> Option<usize> {
        self.peak_day
    }

    /// Share of the whole year's demand falling on the peak day
    pub fn f_peak_yd(&self) -> f64 {
        self.f_peak_yd
    }
}

/// Profiles for one end use and sector, keyed by technology (`None` for the end-use level)
type TechnologyProfiles = IndexMap<Option<TechnologyID>, Rc<LoadProfile>>;

/// Registry of load profiles keyed by end use, sector and technology
#[derive(Debug)]
pub struct LoadProfileStore {
    profiles: IndexMap<EnduseID, IndexMap<SectorID, TechnologyProfiles>>,
    flat: Rc<LoadProfile>,
}

impl LoadProfileStore {
    /// Create an empty store for the given modelled days
    pub fn new(modelled_days: &[usize]) -> Result<Self> {
        Ok(Self {
            profiles: IndexMap::new(),
            flat: Rc::new(LoadProfile::flat(modelled_days)?),
        })
    }

    /// Register a profile.
    ///
    /// # Arguments
    ///
    /// * `enduse` - End use
    /// * `sector` - Sector
    /// * `technology` - Technology, or `None` for the end-use-level profile
    /// * `profile` - The profile, which may also be registered under other keys
    pub fn insert(
        &mut self,
        enduse: &EnduseID,
        sector: &SectorID,
        technology: Option<&TechnologyID>,
        profile: Rc<LoadProfile>,
    ) -> Result<()> {
        let technologies = self
            .profiles
            .entry(enduse.clone())
            .or_default()
            .entry(sector.clone())
            .or_default();
        let technology = technology.cloned();
        ensure!(
            !technologies.contains_key(&technology),
            "Duplicate load profile for end use {enduse}, sector {sector} and technology {}",
            technology.as_ref().map_or("(none)", |id| &*id.0)
        );
        technologies.insert(technology, profile);

        Ok(())
    }

    /// Look up a profile.
    ///
    /// Falls back to the end-use-level profile if no technology-specific one is registered.
    pub fn get(
        &self,
        enduse: &EnduseID,
        sector: &SectorID,
        technology: Option<&TechnologyID>,
    ) -> Option<&Rc<LoadProfile>> {
        let technologies = self.profiles.get(enduse)?.get(sector)?;
        technology
            .and_then(|id| technologies.get(&Some(id.clone())))
            .or_else(|| technologies.get(&None))
    }

    /// Look up a profile, returning an error if there is none
    pub fn get_required(
        &self,
        enduse: &EnduseID,
        sector: &SectorID,
        technology: Option<&TechnologyID>,
    ) -> Result<&Rc<LoadProfile>> {
        self.get(enduse, sector, technology).with_context(|| {
            format!(
                "No load profile for end use {enduse}, sector {sector} and technology {}",
                technology.map_or("(none)", |id| &*id.0)
            )
        })
    }

    /// A profile spreading demand evenly over the modelled hours
    pub fn flat(&self) -> &Rc<LoadProfile> {
        &self.flat
    }
}
