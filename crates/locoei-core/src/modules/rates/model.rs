use super::parser::{EpaRateRow, SpeciationRow};
use crate::common::constants::{
    CO, CO_LINE_HAUL_G_PER_GAL, CO_SMALL_RAILROAD_G_PER_GAL, CO_SWITCH_G_PER_GAL, CO2,
    CO2_G_PER_GAL, HC, LEAD, LEAD_PER_PM10, NH3, NH3_G_PER_GAL, NOX, PM10_PRI, PM25_PER_PM10,
    PM25_PRI, SO2, VOC, VOC_PER_HC, so2_g_per_gal,
};
use crate::domain::{PollutantType, SourceCategory, ValidationReport};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::RangeInclusive;
use tracing::debug;

/// Grams of pollutant per gallon for one source category and year.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EmissionFactor {
    pub source_category: SourceCategory,
    pub scc: u64,
    pub pollutant: String,
    pub pol_type: PollutantType,
    pub pol_desc: String,
    pub year: i32,
    pub em_fac: f64,
}

impl EmissionFactor {
    pub fn new(
        source_category: SourceCategory,
        pollutant: &str,
        pol_type: PollutantType,
        pol_desc: &str,
        year: i32,
        em_fac: f64,
    ) -> Self {
        Self {
            source_category,
            scc: source_category.scc(),
            pollutant: pollutant.to_string(),
            pol_type,
            pol_desc: pol_desc.to_string(),
            year,
            em_fac,
        }
    }
}

pub fn pollutant_description(code: &str) -> &'static str {
    match code {
        CO2 => "Carbon Dioxide",
        CO => "Carbon Monoxide",
        NH3 => "Ammonia",
        SO2 => "Sulfur Dioxide",
        NOX => "Nitrogen Oxides",
        PM10_PRI => "PM10 Primary (Filt + Cond)",
        PM25_PRI => "PM2.5 Primary (Filt + Cond)",
        VOC => "Volatile Organic Compounds",
        HC => "Hydrocarbons",
        LEAD => "Lead",
        _ => "",
    }
}

pub fn co_g_per_gal(category: SourceCategory) -> f64 {
    match category {
        SourceCategory::ClassILineHaul
        | SourceCategory::PassengerLineHaul
        | SourceCategory::CommuterLineHaul => CO_LINE_HAUL_G_PER_GAL,
        SourceCategory::ClassIIILineHaul => CO_SMALL_RAILROAD_G_PER_GAL,
        SourceCategory::Yard => CO_SWITCH_G_PER_GAL,
    }
}

/// CO2, CO, NH3 and SO2, which depend only on fuel properties and year.
pub fn fixed_rate_factors(years: RangeInclusive<i32>) -> Vec<EmissionFactor> {
    let mut factors = Vec::new();
    for category in SourceCategory::ALL {
        for year in years.clone() {
            factors.push(EmissionFactor::new(
                category,
                CO2,
                PollutantType::Ghg,
                pollutant_description(CO2),
                year,
                CO2_G_PER_GAL,
            ));
            for (code, em_fac) in [
                (CO, co_g_per_gal(category)),
                (NH3, NH3_G_PER_GAL),
                (SO2, so2_g_per_gal(year)),
            ] {
                factors.push(EmissionFactor::new(
                    category,
                    code,
                    PollutantType::Cap,
                    pollutant_description(code),
                    year,
                    em_fac,
                ));
            }
        }
    }
    factors
}

pub type EpaSeries = BTreeMap<(SourceCategory, String), BTreeMap<i32, f64>>;

pub fn epa_series(rows: &[EpaRateRow]) -> EpaSeries {
    let mut series = EpaSeries::new();
    let mut unlabeled = 0_usize;
    for row in rows {
        let categories = SourceCategory::from_epa_label(&row.carriers);
        if categories.is_empty() {
            unlabeled += 1;
        }
        for category in categories {
            series
                .entry((*category, row.pollutant.trim().to_string()))
                .or_default()
                .insert(row.year, row.em_fac);
        }
    }
    debug!(unlabeled, "EPA rate rows without a known carrier label");
    series
}

/// NOX, PM10-PRI and HC from the EPA table. Years past the last tabulated year
/// carry the final value forward.
pub fn epa_table_factors(
    series: &EpaSeries,
    years: RangeInclusive<i32>,
) -> (Vec<EmissionFactor>, ValidationReport) {
    let mut report = ValidationReport::new();
    let mut factors = Vec::new();
    let mut missing = BTreeSet::new();

    for category in SourceCategory::ALL {
        for pollutant in [NOX, PM10_PRI, HC] {
            let Some(by_year) = series.get(&(category, pollutant.to_string())) else {
                missing.insert(format!("{category}/{pollutant}/all years"));
                continue;
            };
            let last = by_year.last_key_value();
            for year in years.clone() {
                let em_fac = match (by_year.get(&year), last) {
                    (Some(&value), _) => value,
                    (None, Some((&last_year, &value))) if year > last_year => value,
                    _ => {
                        missing.insert(format!("{category}/{pollutant}/{year}"));
                        continue;
                    }
                };
                factors.push(EmissionFactor::new(
                    category,
                    pollutant,
                    PollutantType::Cap,
                    pollutant_description(pollutant),
                    year,
                    em_fac,
                ));
            }
        }
    }

    if !missing.is_empty() {
        report.push(
            "RATES.MISSING_EPA_RATE",
            format!("{} EPA rate(s) missing: {:?}", missing.len(), missing),
        );
    }
    (factors, report)
}

pub fn derived_factors(
    inputs: &[EmissionFactor],
    from: &str,
    to: &str,
    multiplier: f64,
) -> Vec<EmissionFactor> {
    inputs
        .iter()
        .filter(|factor| factor.pollutant == from)
        .map(|factor| {
            EmissionFactor::new(
                factor.source_category,
                to,
                PollutantType::Cap,
                pollutant_description(to),
                factor.year,
                factor.em_fac * multiplier,
            )
        })
        .collect()
}

/// Hazardous air pollutants as fixed fractions of PM2.5 or VOC per SCC.
pub fn hap_factors(
    speciation: &[SpeciationRow],
    rates: &[EmissionFactor],
) -> (Vec<EmissionFactor>, ValidationReport) {
    let mut by_input: HashMap<(u64, &str), Vec<&EmissionFactor>> = HashMap::new();
    for factor in rates {
        by_input
            .entry((factor.scc, factor.pollutant.as_str()))
            .or_default()
            .push(factor);
    }

    let mut report = ValidationReport::new();
    let mut unmatched = BTreeSet::new();
    let mut factors = Vec::new();
    for row in speciation {
        let input = row.input_pollutant_code.trim();
        let Some(inputs) = by_input.get(&(row.scc, input)) else {
            unmatched.insert(format!("{}/{}", row.scc, input));
            continue;
        };
        for factor in inputs {
            factors.push(EmissionFactor::new(
                factor.source_category,
                row.output_pollutant_code.trim(),
                PollutantType::Hap,
                row.output_pollutant_description.trim(),
                factor.year,
                factor.em_fac * row.multiplication_factor,
            ));
        }
    }

    if !unmatched.is_empty() {
        report.push(
            "RATES.UNKNOWN_SPECIATION_INPUT",
            format!(
                "{} speciation input(s) have no rate: {:?}",
                unmatched.len(),
                unmatched
            ),
        );
    }
    (factors, report)
}

pub fn build_emission_factors(
    epa_rows: &[EpaRateRow],
    speciation: &[SpeciationRow],
    years: RangeInclusive<i32>,
) -> (Vec<EmissionFactor>, ValidationReport) {
    let mut factors = fixed_rate_factors(years.clone());
    let (epa, mut report) = epa_table_factors(&epa_series(epa_rows), years);

    factors.extend(derived_factors(&epa, PM10_PRI, PM25_PRI, PM25_PER_PM10));
    factors.extend(derived_factors(&epa, HC, VOC, VOC_PER_HC));
    factors.extend(derived_factors(&epa, PM10_PRI, LEAD, LEAD_PER_PM10));
    factors.extend(epa.into_iter().filter(|factor| factor.pollutant != HC));

    let (haps, hap_report) = hap_factors(speciation, &factors);
    factors.extend(haps);
    report.extend(hap_report);

    factors.sort_by(|left, right| {
        (left.source_category, &left.pollutant, left.year).cmp(&(
            right.source_category,
            &right.pollutant,
            right.year,
        ))
    });
    (factors, report)
}
