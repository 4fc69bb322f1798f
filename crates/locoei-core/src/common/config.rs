//! Run configuration loaded from JSON. Every stage receives it explicitly.

use crate::domain::ViolationPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "locoei.json";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputFiles {
    pub rail_links: String,
    pub yard_name_fills: String,
    pub carrier_groups: String,
    pub statewide_fuel: String,
    pub class1_county_pct: String,
    pub projection_factors: String,
    pub epa_rates: String,
    pub hap_speciation: String,
    pub texas_counties: String,
    pub yard_reference: String,
    pub txled_counties: String,
    pub deri_regions: String,
    pub deri_benefits: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            rail_links: "rail_links.csv".to_string(),
            yard_name_fills: "yard_name_fills.csv".to_string(),
            carrier_groups: "carrier_groups.csv".to_string(),
            statewide_fuel: "statewide_fuel.csv".to_string(),
            class1_county_pct: "class1_county_pct.csv".to_string(),
            projection_factors: "projection_factors.csv".to_string(),
            epa_rates: "epa_rates.csv".to_string(),
            hap_speciation: "hap_speciation.csv".to_string(),
            texas_counties: "texas_counties.csv".to_string(),
            yard_reference: "yard_reference.csv".to_string(),
            txled_counties: "txled_counties.csv".to_string(),
            deri_regions: "deri_regions.json".to_string(),
            deri_benefits: "deri_benefits.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub raw_dir: PathBuf,
    pub interim_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub inputs: InputFiles,
    pub first_year: i32,
    pub last_year: i32,
    pub fuel_base_year: i32,
    pub state_filter: Vec<String>,
    pub large_carriers: Vec<String>,
    pub txled_reduction_pct: f64,
    pub expected_txled_counties: usize,
    pub expected_texas_counties: usize,
    pub deri_literature_total_tons: f64,
    pub deri_area_regions: BTreeMap<String, String>,
    pub apply_txled: bool,
    pub apply_deri: bool,
    pub reporting_years: Vec<i32>,
    pub on_violation: ViolationPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        let deri_area_regions = [
            ("Austin", "Austin"),
            ("Beaumont/Port Arthur", "Beaumont"),
            ("Dallas/Fort Worth", "Dallas/Fort Worth"),
            ("Houston/Galveston/Brazoria", "Houston"),
            ("San Antonio", "San Antonio"),
            ("Tyler/Longview", "Tyler"),
        ]
        .into_iter()
        .map(|(area, region)| (area.to_string(), region.to_string()))
        .collect();

        Self {
            raw_dir: PathBuf::from("data/raw"),
            interim_dir: PathBuf::from("data/interim"),
            processed_dir: PathBuf::from("data/processed"),
            inputs: InputFiles::default(),
            first_year: 2011,
            last_year: 2050,
            fuel_base_year: 2019,
            state_filter: vec!["TX".to_string()],
            large_carriers: vec!["BNSF".to_string(), "KCS".to_string(), "UP".to_string()],
            txled_reduction_pct: 6.2,
            expected_txled_counties: 110,
            expected_texas_counties: 254,
            deri_literature_total_tons: 27_206.2667,
            deri_area_regions,
            apply_txled: true,
            apply_deri: true,
            reporting_years: vec![2019, 2020],
            on_violation: ViolationPolicy::Halt,
        }
    }
}

impl RunConfig {
    pub fn analysis_years(&self) -> RangeInclusive<i32> {
        self.first_year..=self.last_year
    }

    pub fn raw_path(&self, file_name: &str) -> PathBuf {
        self.raw_dir.join(file_name)
    }

    /// Relative data directories are taken relative to `base_dir`.
    pub fn resolve_relative_to(mut self, base_dir: &Path) -> Self {
        for dir in [
            &mut self.raw_dir,
            &mut self.interim_dir,
            &mut self.processed_dir,
        ] {
            if dir.is_relative() {
                *dir = base_dir.join(&*dir);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_year > self.last_year {
            return Err(ConfigError::Invalid(format!(
                "firstYear {} is after lastYear {}",
                self.first_year, self.last_year
            )));
        }
        if !self.analysis_years().contains(&self.fuel_base_year) {
            return Err(ConfigError::Invalid(format!(
                "fuelBaseYear {} is outside {}..={}",
                self.fuel_base_year, self.first_year, self.last_year
            )));
        }
        if !(0.0..=100.0).contains(&self.txled_reduction_pct) {
            return Err(ConfigError::Invalid(format!(
                "txledReductionPct {} is not a percentage",
                self.txled_reduction_pct
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read run configuration '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse run configuration '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid run configuration: {0}")]
    Invalid(String),
}

pub fn load_run_config(config_path: impl AsRef<Path>) -> Result<RunConfig, ConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    let config: RunConfig = serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })?;
    config.validate()?;

    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(config.resolve_relative_to(&base_dir))
}
