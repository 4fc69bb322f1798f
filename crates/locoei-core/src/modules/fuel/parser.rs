use serde::Deserialize;

/// Statewide survey row: gallons burned by one carrier in line-haul and yard
/// service during the base year.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatewideFuelRow {
    #[serde(rename = "RRCarrier")]
    pub carrier: String,
    #[serde(rename = "LineHaul", default)]
    pub line_haul: Option<f64>,
    #[serde(rename = "Yard", default)]
    pub yard: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CountyPctRow {
    #[serde(rename = "FIPS")]
    pub stcntyfips: u32,
    #[serde(rename = "CountyPCT")]
    pub county_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProjectionFactorRow {
    pub year: i32,
    pub freight: f64,
    pub passenger: f64,
}
