//! CSV ingestion of environment and household demand data.
//!
//! Environment data comes from a single CSV with one row per hour. Demand is
//! the element-wise sum of the first `k` household load profiles found in a
//! directory, selected by file-name prefix and sorted by name.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::EnvironmentSeries;
use crate::error::DataError;

/// Demand column of the residential load profiles.
pub const DEFAULT_DEMAND_COLUMN: &str = "Electricity:Facility [kW](Hourly)";

/// m/s to km/h.
const MS_TO_KMH: f64 = 3.6;

/// What to do when fewer households exist than were requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsufficientHouseholds {
    /// Reject the data set.
    #[default]
    Fail,
    /// Log a warning and aggregate the households that exist.
    Warn,
}

#[derive(Debug, Deserialize)]
struct EnvironmentRow {
    solar_irradiance: f64,
    wind_speed: f64,
    rate_consumption_charge: f64,
}

/// Irradiance, wind speed, and price columns of an environment file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentColumns {
    pub solar_irradiance: Vec<f64>,
    pub wind_speed: Vec<f64>,
    pub rate_consumption_charge: Vec<f64>,
}

/// Reads the environment columns from any CSV source.
///
/// `wind_in_m_per_s` converts the wind column to km/h.
pub fn read_environment(
    reader: impl Read,
    wind_in_m_per_s: bool,
) -> Result<EnvironmentColumns, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut columns = EnvironmentColumns::default();

    for row in rdr.deserialize() {
        let row: EnvironmentRow = row?;
        columns.solar_irradiance.push(row.solar_irradiance);
        columns.wind_speed.push(if wind_in_m_per_s {
            row.wind_speed * MS_TO_KMH
        } else {
            row.wind_speed
        });
        columns.rate_consumption_charge.push(row.rate_consumption_charge);
    }

    Ok(columns)
}

/// Reads one numeric column, located by header name.
///
/// `origin` names the source in error messages.
pub fn read_column(reader: impl Read, column: &str, origin: &str) -> Result<Vec<f64>, DataError> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let idx = rdr
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| DataError::MissingColumn {
            column: column.to_string(),
            path: origin.to_string(),
        })?;

    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let raw = record.get(idx).unwrap_or("").trim();
        let value = raw.parse::<f64>().map_err(|_| DataError::InvalidValue {
            value: raw.to_string(),
            column: column.to_string(),
            path: origin.to_string(),
        })?;
        values.push(value);
    }

    Ok(values)
}

fn open(path: &Path) -> Result<File, DataError> {
    File::open(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Sums the demand of the first `k` households whose file name starts with `prefix`.
///
/// # Errors
///
/// Fails if the directory cannot be read, a file lacks the demand column or
/// holds a non-numeric value, household lengths differ, or fewer than `k`
/// households exist under [`InsufficientHouseholds::Fail`].
pub fn aggregate_households(
    dir: &Path,
    prefix: &str,
    k: usize,
    column: &str,
    policy: InsufficientHouseholds,
) -> Result<Vec<f64>, DataError> {
    let io_err = |source: std::io::Error| DataError::Io {
        path: dir.display().to_string(),
        source,
    };

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix))
        })
        .collect();
    files.sort();

    if files.len() < k {
        match policy {
            InsufficientHouseholds::Fail => {
                return Err(DataError::NotEnoughHouseholds {
                    requested: k,
                    found: files.len(),
                });
            }
            InsufficientHouseholds::Warn => warn!(
                requested = k,
                found = files.len(),
                prefix,
                "not enough household samples, aggregating what exists"
            ),
        }
    }

    let mut total: Vec<f64> = Vec::new();
    for (i, path) in files.iter().take(k).enumerate() {
        let origin = path.display().to_string();
        let demand = read_column(open(path)?, column, &origin)?;
        if i == 0 {
            total = demand;
            continue;
        }
        if demand.len() != total.len() {
            return Err(DataError::HouseholdLength {
                path: origin,
                found: demand.len(),
                expected: total.len(),
            });
        }
        for (acc, d) in total.iter_mut().zip(demand) {
            *acc += d;
        }
    }

    debug!(households = files.len().min(k), samples = total.len(), "aggregated demand");
    Ok(total)
}

/// Where and how to load an [`EnvironmentSeries`] from disk.
#[derive(Debug, Clone)]
pub struct CsvSource {
    /// Environment CSV with irradiance, wind speed, and price columns.
    pub environment: PathBuf,
    /// Directory of household load profiles.
    pub households_dir: PathBuf,
    /// File-name prefix selecting households (e.g. `USA_CA`).
    pub household_prefix: String,
    /// Number of households to aggregate.
    pub households: usize,
    pub demand_column: String,
    pub wind_in_m_per_s: bool,
    pub on_insufficient: InsufficientHouseholds,
}

impl CsvSource {
    pub fn load(&self) -> Result<EnvironmentSeries, DataError> {
        let env = read_environment(open(&self.environment)?, self.wind_in_m_per_s)?;
        let demand = aggregate_households(
            &self.households_dir,
            &self.household_prefix,
            self.households,
            &self.demand_column,
            self.on_insufficient,
        )?;
        EnvironmentSeries::new(
            demand,
            env.solar_irradiance,
            env.wind_speed,
            env.rate_consumption_charge,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV: &str = "\
solar_irradiance,wind_speed,rate_consumption_charge
0,2.5,0.10
350.5,5,0.22
";

    #[test]
    fn reads_environment_rows() {
        let cols = read_environment(ENV.as_bytes(), false).unwrap();
        assert_eq!(cols.solar_irradiance, vec![0.0, 350.5]);
        assert_eq!(cols.wind_speed, vec![2.5, 5.0]);
        assert_eq!(cols.rate_consumption_charge, vec![0.10, 0.22]);
    }

    #[test]
    fn converts_wind_from_m_per_s() {
        let cols = read_environment(ENV.as_bytes(), true).unwrap();
        assert_eq!(cols.wind_speed, vec![2.5 * 3.6, 5.0 * 3.6]);
    }

    #[test]
    fn malformed_environment_row_is_an_error() {
        let bad = "solar_irradiance,wind_speed,rate_consumption_charge\n1,abc,0.1\n";
        assert!(matches!(
            read_environment(bad.as_bytes(), false),
            Err(DataError::Csv(_))
        ));
    }

    #[test]
    fn reads_named_column() {
        let csv = "Date/Time,Electricity:Facility [kW](Hourly),Gas\n01/01 01:00,1.5,0\n01/01 02:00,2.25,0\n";
        let values = read_column(csv.as_bytes(), DEFAULT_DEMAND_COLUMN, "mem").unwrap();
        assert_eq!(values, vec![1.5, 2.25]);
    }

    #[test]
    fn missing_column_names_the_source() {
        let err = read_column("a,b\n1,2\n".as_bytes(), "c", "house.csv").unwrap_err();
        assert!(matches!(
            err,
            DataError::MissingColumn { ref column, ref path } if column == "c" && path == "house.csv"
        ));
    }

    #[test]
    fn non_numeric_value_is_reported() {
        let err = read_column("a\n1\nx\n".as_bytes(), "a", "mem").unwrap_err();
        assert!(matches!(err, DataError::InvalidValue { ref value, .. } if value == "x"));
    }

    #[test]
    fn missing_directory_is_io_error() {
        let err = aggregate_households(
            Path::new("/definitely/not/here"),
            "USA_CA",
            1,
            DEFAULT_DEMAND_COLUMN,
            InsufficientHouseholds::Fail,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));
    }
}
