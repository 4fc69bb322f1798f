use serde::Deserialize;
use std::collections::BTreeMap;

/// One DERI grant: NOx tons reduced over the activity life, credited from
/// `year` up to (not including) `benefits_expiry_year`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeriBenefitRow {
    pub area: String,
    pub year: i32,
    pub benefits_expiry_year: i32,
    pub total_nox_reduction_tons: f64,
    pub activity_life: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeriRegion {
    pub counties: Vec<String>,
}

pub type DeriRegions = BTreeMap<String, DeriRegion>;
