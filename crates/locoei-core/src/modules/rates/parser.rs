use serde::Deserialize;

/// Long-format EPA locomotive rate table: one rate per carrier label,
/// pollutant and year.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EpaRateRow {
    pub carriers: String,
    pub pollutant: String,
    pub year: i32,
    pub em_fac: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpeciationRow {
    pub scc: u64,
    pub input_pollutant_code: String,
    pub output_pollutant_code: String,
    pub output_pollutant_description: String,
    pub multiplication_factor: f64,
}
