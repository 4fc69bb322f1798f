use serde::Deserialize;

/// A named yard with its 2017 fuel use, the basis for splitting county yard
/// fuel among yards.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceYard {
    pub stcntyfips: u32,
    #[serde(default)]
    pub eis_facility_id: Option<String>,
    pub yardname: String,
    pub fuel_2017: f64,
    #[serde(default)]
    pub site_latitude: Option<f64>,
    #[serde(default)]
    pub site_longitude: Option<f64>,
}
