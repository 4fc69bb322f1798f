//! Unit conversions and fixed emission-rate parameters.
//!
//! Rates are grams of pollutant per gallon of diesel.

pub const GRAMS_PER_US_TON: f64 = 907_185.0;
pub const GRAMS_PER_POUND: f64 = 453.592;
pub const DAYS_PER_YEAR: f64 = 365.0;

pub const DIESEL_CARBON_G_PER_GAL: f64 = 2_778.0;
pub const CARBON_OXIDATION_FRACTION: f64 = 0.99;
pub const CO2_PER_CARBON_MASS: f64 = 44.0 / 12.0;
pub const CO2_G_PER_GAL: f64 =
    DIESEL_CARBON_G_PER_GAL * CARBON_OXIDATION_FRACTION * CO2_PER_CARBON_MASS;

pub const CO_LINE_HAUL_G_PER_GAL: f64 = 1.28 * 20.8;
pub const CO_SMALL_RAILROAD_G_PER_GAL: f64 = 1.28 * 18.2;
pub const CO_SWITCH_G_PER_GAL: f64 = 1.83 * 15.2;

pub const NH3_LB_PER_GAL: f64 = 1.83e-4;
pub const NH3_G_PER_GAL: f64 = NH3_LB_PER_GAL * GRAMS_PER_POUND;

pub const DIESEL_METRIC_TON_PER_BBL: f64 = 0.1346;
pub const BBL_METRIC_TON_TO_G_PER_GAL: f64 = 23_809.5;
pub const SULFUR_TO_SO2_CONVERSION: f64 = 0.97;
pub const SO2_PER_SULFUR_MASS: f64 = 64.0 / 32.0;
pub const HIGH_SULFUR_PPM: f64 = 500.0;
pub const ULTRA_LOW_SULFUR_PPM: f64 = 15.0;
pub const LAST_HIGH_SULFUR_YEAR: i32 = 2011;

pub const PM25_PER_PM10: f64 = 0.97;
pub const VOC_PER_HC: f64 = 1.053;
pub const LEAD_PER_PM10: f64 = 8.405e-5;

pub const NOX: &str = "NOX";
pub const CO: &str = "CO";
pub const CO2: &str = "CO2";
pub const NH3: &str = "NH3";
pub const SO2: &str = "SO2";
pub const PM10_PRI: &str = "PM10-PRI";
pub const PM25_PRI: &str = "PM25-PRI";
pub const HC: &str = "HC";
pub const VOC: &str = "VOC";
pub const LEAD: &str = "7439921";

pub const NO_SERVICE_OPERATOR: &str = "NS";
pub const DART_CARRIER: &str = "DART";
pub const DART_SERVICE_COUNTY_FIPS: u32 = 48_121;
pub const AMTRAK_CARRIER: &str = "AMTK";

pub fn so2_g_per_gal(year: i32) -> f64 {
    let sulfur_ppm = if year <= LAST_HIGH_SULFUR_YEAR {
        HIGH_SULFUR_PPM
    } else {
        ULTRA_LOW_SULFUR_PPM
    };
    DIESEL_METRIC_TON_PER_BBL
        * BBL_METRIC_TON_TO_G_PER_GAL
        * SULFUR_TO_SO2_CONVERSION
        * SO2_PER_SULFUR_MASS
        * sulfur_ppm
        * 1.0e-6
}
