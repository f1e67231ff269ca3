//! Common routines for handling input data.
use crate::id::{HasID, IDLike};
use crate::model::{Model, ModelParameters};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::Display;
use std::fs;
use std::hash::Hash;
use std::path::Path;

mod enduse;
use enduse::read_enduses;
mod fuel;
use fuel::{read_drivers, read_fuels};
mod fuel_share;
use fuel_share::{read_fuel_shares, read_service_switches};
mod region;
use region::read_regions;
mod scenario;
use scenario::read_scenario;
mod technology;
use technology::read_technologies;
mod weather;
use weather::read_weather;

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    ensure!(!vec.is_empty(), "CSV file {} cannot be empty", file_path.display());

    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a CSV file.
///
/// The file may be missing or empty, in which case no items are returned.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    if !file_path.exists() {
        return Ok(Vec::new().into_iter());
    }

    Ok(read_csv_internal(file_path)?.into_iter())
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Format an error message to include the file path. To be used with `anyhow::Context`.
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Read a CSV file of items with IDs.
///
/// As this function is only ever used for top-level CSV files (i.e. the ones which actually define
/// the IDs for a given type), we use an ordered map to maintain the order in the input files.
pub fn read_csv_id_file<T, ID: IDLike>(file_path: &Path) -> Result<IndexMap<ID, T>>
where
    T: HasID<ID> + DeserializeOwned,
{
    fn fill_and_validate_map<T, ID: IDLike>(file_path: &Path) -> Result<IndexMap<ID, T>>
    where
        T: HasID<ID> + DeserializeOwned,
    {
        let mut map = IndexMap::new();
        for record in read_csv::<T>(file_path)? {
            let id = record.get_id().clone();
            let existing = map.insert(id.clone(), record).is_some();
            ensure!(!existing, "Duplicate ID found: {id}");
        }

        Ok(map)
    }

    fill_and_validate_map(file_path).with_context(|| input_err_msg(file_path))
}

/// Check whether an iterator contains values that are sorted and unique
pub fn is_sorted_and_unique<T, I>(iter: I) -> bool
where
    T: PartialOrd + Clone,
    I: IntoIterator<Item = T>,
{
    iter.into_iter().tuple_windows().all(|(a, b)| a < b)
}

/// Insert a key-value pair into a `HashMap` if the key does not already exist.
///
/// If the key already exists, it returns an error with a message indicating the key's existence.
pub fn try_insert<K, V>(map: &mut HashMap<K, V>, key: K, value: V) -> Result<()>
where
    K: Eq + Hash + std::fmt::Debug,
{
    match map.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(value);
            Ok(())
        }
        Entry::Occupied(entry) => bail!("Key {:?} already exists in the map", entry.key()),
    }
}

/// Check that a value is a valid fraction (between 0 and 1 inclusive)
pub fn check_fraction<T: Display>(value: f64, name: T) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        bail!("{name} must be between 0 and 1 (got {value})");
    }

    Ok(())
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The static model data ([`Model`]) or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;

    let regions = read_regions(model_dir)?;
    let region_ids = regions.keys().cloned().collect();
    let enduses = read_enduses(model_dir)?;
    let technologies = read_technologies(model_dir)?;
    let fuel_shares = read_fuel_shares(model_dir, &enduses, &technologies)?;
    let service_switches = read_service_switches(model_dir, &enduses, &technologies)?;
    let fuels = read_fuels(model_dir, &region_ids, &enduses)?;
    let drivers = read_drivers(
        model_dir,
        &region_ids,
        &enduses,
        parameters.base_yr,
        &parameters.simulated_yrs,
    )?;
    let weather = read_weather(model_dir, &region_ids)?;
    let scenario = read_scenario(model_dir, &region_ids, &enduses)?;

    let model = Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        regions,
        enduses,
        technologies,
        fuel_shares,
        service_switches,
        fuels,
        drivers,
        weather,
        scenario,
    };
    model.validate()?;

    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::EnduseID;
    use crate::fixture::assert_error;
    use crate::id::define_id_getter;
    use rstest::rstest;
    use serde::Deserialize;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Record {
        id: EnduseID,
        value: u32,
    }
    define_id_getter! {Record, EnduseID}

    /// Create an example CSV file in dir_path
    fn create_csv_file(dir_path: &Path, contents: &str) -> PathBuf {
        let file_path = dir_path.join("test.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    /// Test a normal read
    #[test]
    fn test_read_csv() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value\nhello,1\nworld,2\n");
        let records: Vec<Record> = read_csv(&file_path).unwrap().collect();
        assert_eq!(
            records,
            &[
                Record {
                    id: "hello".into(),
                    value: 1,
                },
                Record {
                    id: "world".into(),
                    value: 2,
                }
            ]
        );

        // File with whitespace
        let file_path = create_csv_file(dir.path(), "id  , value\t\n  hello\t ,1\n world ,2\n");
        let records: Vec<Record> = read_csv(&file_path).unwrap().collect();
        assert_eq!(records[0].id, "hello".into());

        // Empty files are only allowed when optional
        let file_path = create_csv_file(dir.path(), "id,value\n");
        assert!(read_csv::<Record>(&file_path).is_err());
        assert!(read_csv_optional::<Record>(&file_path).unwrap().next().is_none());

        // Missing files are only allowed when optional
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("missing.csv");
        assert!(read_csv::<Record>(&file_path).is_err());
        assert!(read_csv_optional::<Record>(&file_path).unwrap().next().is_none());
    }

    #[test]
    fn test_read_csv_id_file() {
        let dir = tempdir().unwrap();
        let file_path = create_csv_file(dir.path(), "id,value\nhello,1\nworld,2\n");
        let map: IndexMap<EnduseID, Record> = read_csv_id_file(&file_path).unwrap();
        assert_eq!(map.keys().map(ToString::to_string).collect_vec(), ["hello", "world"]);

        let file_path = create_csv_file(dir.path(), "id,value\nhello,1\nhello,2\n");
        let result: Result<IndexMap<EnduseID, Record>> = read_csv_id_file(&file_path);
        assert_eq!(
            result.unwrap_err().chain().nth(1).unwrap().to_string(),
            "Duplicate ID found: hello"
        );
    }

    #[test]
    fn test_read_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.toml");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "value = 1").unwrap();
        }

        #[derive(Debug, Deserialize, PartialEq)]
        struct Value {
            value: u32,
        }
        assert_eq!(read_toml::<Value>(&file_path).unwrap(), Value { value: 1 });

        // Invalid TOML
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "bad toml syntax").unwrap();
        }
        assert!(read_toml::<Value>(&file_path).is_err());
    }

    #[rstest]
    #[case(&[], true)]
    #[case(&[1], true)]
    #[case(&[1, 2], true)]
    #[case(&[1, 2, 3, 4], true)]
    #[case(&[2, 1], false)]
    #[case(&[1, 1], false)]
    #[case(&[1, 3, 2, 4], false)]
    fn test_is_sorted_and_unique(#[case] values: &[u32], #[case] expected: bool) {
        assert_eq!(is_sorted_and_unique(values), expected);
    }

    #[test]
    fn test_try_insert() {
        let mut map = HashMap::new();
        assert!(try_insert(&mut map, "key", 1).is_ok());
        assert_error!(
            try_insert(&mut map, "key", 2),
            "Key \"key\" already exists in the map"
        );
        assert_eq!(map["key"], 1);
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(0.5, true)]
    #[case(1.0, true)]
    #[case(-0.1, false)]
    #[case(1.1, false)]
    #[case(f64::NAN, false)]
    fn test_check_fraction(#[case] value: f64, #[case] expected_valid: bool) {
        assert_eq!(check_fraction(value, "share").is_ok(), expected_valid);
    }
}
