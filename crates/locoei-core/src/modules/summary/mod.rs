mod model;

use super::StageExecutor;
use super::control::{
    CONTROLLED_OUTPUT_STEM, ControlledQuantity, UNCONTROLLED_OUTPUT_STEM, UncontrolledQuantity,
};
use super::helpers::validate_stage_request;
use super::serialization::{latest_stage_output, read_csv_records, write_stage_output};
use crate::common::config::RunConfig;
use crate::domain::{PipelineStage, StageOutput, StageRequest, StageResult, ValidationReport};
use tracing::info;

pub use model::{
    CountySummaryRow, StatewideEmissionRow, StatewideFuelSummary, county_summary,
    statewide_emission_summary, statewide_fuel_summary,
};

pub const STATEWIDE_FUEL_OUTPUT_STEM: &str = "statewide_fuel_summary";
pub const STATEWIDE_EMISSION_OUTPUT_STEM: &str = "statewide_summary";
pub const COUNTY_SUMMARY_OUTPUT_STEM: &str = "county_summary";

pub struct SummaryStage;

impl StageExecutor for SummaryStage {
    fn execute(&self, request: &StageRequest, config: &RunConfig) -> StageResult<StageOutput> {
        validate_stage_request(request, PipelineStage::Summary)?;

        let controlled: Vec<ControlledQuantity> = read_csv_records(&latest_stage_output(
            &config.processed_dir,
            CONTROLLED_OUTPUT_STEM,
        )?)?;
        let uncontrolled: Vec<UncontrolledQuantity> = read_csv_records(&latest_stage_output(
            &config.processed_dir,
            UNCONTROLLED_OUTPUT_STEM,
        )?)?;

        let mut report = ValidationReport::new();
        let missing_years: Vec<i32> = config
            .reporting_years
            .iter()
            .copied()
            .filter(|year| !uncontrolled.iter().any(|row| row.year == *year))
            .collect();
        if !missing_years.is_empty() {
            report.push(
                "SUMMARY.MISSING_YEAR",
                format!("reporting year(s) {missing_years:?} have no emission records"),
            );
        }
        report.enforce(config.on_violation, PipelineStage::Summary)?;

        let statewide = statewide_fuel_summary(&uncontrolled, &config.reporting_years);
        let statewide_emissions =
            statewide_emission_summary(&controlled, &uncontrolled, &config.reporting_years);
        let counties = county_summary(&controlled, &uncontrolled, &config.reporting_years);

        let artifacts = vec![
            write_stage_output(
                &config.processed_dir,
                STATEWIDE_FUEL_OUTPUT_STEM,
                &request.run_stamp,
                &statewide,
            )?,
            write_stage_output(
                &config.processed_dir,
                STATEWIDE_EMISSION_OUTPUT_STEM,
                &request.run_stamp,
                &statewide_emissions,
            )?,
            write_stage_output(
                &config.processed_dir,
                COUNTY_SUMMARY_OUTPUT_STEM,
                &request.run_stamp,
                &counties,
            )?,
        ];
        info!(
            years = ?config.reporting_years,
            statewide_rows = statewide.len(),
            statewide_emission_rows = statewide_emissions.len(),
            county_rows = counties.len(),
            "wrote summary tables"
        );

        Ok(StageOutput { artifacts, report })
    }
}

#[cfg(test)]
mod tests {
    use super::{county_summary, statewide_emission_summary, statewide_fuel_summary};
    use crate::domain::{PollutantType, SourceCategory};
    use crate::modules::control::{ControlledQuantity, UncontrolledQuantity};

    fn uncontrolled(
        year: i32,
        county: (u32, &str),
        category: SourceCategory,
        pollutant: &str,
        pol_type: PollutantType,
        fuel_gallons: f64,
        tons: f64,
    ) -> UncontrolledQuantity {
        UncontrolledQuantity {
            year,
            stcntyfips: county.0,
            county_name: county.1.to_string(),
            source_category: category,
            scc: category.scc(),
            yardname: None,
            eis_facility_id: None,
            pollutant: pollutant.to_string(),
            pol_type,
            pol_desc: String::new(),
            em_fac: 1.0,
            fuel_gallons,
            em_quant: 0.0,
            region: None,
            em_quant_ton: tons,
            deri_credit_ton: 0.0,
            uncontrolled_em_quant_ton: tons,
        }
    }

    fn controlled(source: &UncontrolledQuantity, tons: f64) -> ControlledQuantity {
        ControlledQuantity {
            year: source.year,
            stcntyfips: source.stcntyfips,
            county_name: source.county_name.clone(),
            source_category: source.source_category,
            scc: source.scc,
            yardname: source.yardname.clone(),
            eis_facility_id: None,
            pollutant: source.pollutant.clone(),
            pol_type: source.pol_type,
            pol_desc: String::new(),
            em_fac: 1.0,
            fuel_gallons: source.fuel_gallons,
            em_quant: 0.0,
            txled_fac: 1.0,
            controlled_em_quant: 0.0,
            controlled_em_quant_ton: tons,
        }
    }

    const DALLAS: (u32, &str) = (48_113, "Dallas");
    const HARRIS: (u32, &str) = (48_201, "Harris");

    #[test]
    fn statewide_fuel_sums_co_rows_for_reporting_years() {
        let rows = vec![
            uncontrolled(2019, DALLAS, SourceCategory::Yard, "CO", PollutantType::Cap, 90.0, 0.0),
            uncontrolled(2019, DALLAS, SourceCategory::Yard, "NOX", PollutantType::Cap, 90.0, 0.0),
            uncontrolled(2019, HARRIS, SourceCategory::Yard, "CO", PollutantType::Cap, 300.0, 0.0),
            uncontrolled(2021, HARRIS, SourceCategory::Yard, "CO", PollutantType::Cap, 1.0, 0.0),
        ];

        let summary = statewide_fuel_summary(&rows, &[2019]);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].source_category, SourceCategory::Yard);
        assert_eq!(summary[0].scc, 2_285_002_010);
        assert!((summary[0].fuel_gallons - 390.0).abs() < 1.0e-12);
    }

    #[test]
    fn county_summary_collapses_yards_and_skips_haps() {
        let mut miller = uncontrolled(
            2019,
            DALLAS,
            SourceCategory::Yard,
            "NOX",
            PollutantType::Cap,
            90.0,
            3.0,
        );
        miller.yardname = Some("Miller Yard".to_string());
        let mut dallas_yard = miller.clone();
        dallas_yard.yardname = Some("Dallas Yard".to_string());
        dallas_yard.uncontrolled_em_quant_ton = 1.0;
        let benzene = uncontrolled(
            2019,
            DALLAS,
            SourceCategory::Yard,
            "71432",
            PollutantType::Hap,
            90.0,
            0.5,
        );
        let uncontrolled_rows = vec![miller.clone(), dallas_yard.clone(), benzene.clone()];
        let controlled_rows = vec![
            controlled(&miller, 2.5),
            controlled(&dallas_yard, 1.0),
            controlled(&benzene, 0.5),
        ];

        let rows = county_summary(&controlled_rows, &uncontrolled_rows, &[2019]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pollutant, "NOX");
        assert!((rows[0].uncontrolled_ton - 4.0).abs() < 1.0e-12);
        assert!((rows[0].controlled_ton - 3.5).abs() < 1.0e-12);
        assert!((rows[0].uncontrolled_ozone_day_ton - 4.0 / 365.0).abs() < 1.0e-15);
    }

    #[test]
    fn all_zero_county_groups_are_dropped() {
        let zero = uncontrolled(
            2020,
            HARRIS,
            SourceCategory::PassengerLineHaul,
            "CO",
            PollutantType::Cap,
            0.0,
            0.0,
        );
        let kept_zero = uncontrolled(
            2020,
            DALLAS,
            SourceCategory::PassengerLineHaul,
            "CO2",
            PollutantType::Ghg,
            10.0,
            0.0,
        );
        let kept = uncontrolled(
            2020,
            DALLAS,
            SourceCategory::PassengerLineHaul,
            "CO",
            PollutantType::Cap,
            10.0,
            2.0,
        );
        let uncontrolled_rows = vec![zero.clone(), kept_zero.clone(), kept.clone()];
        let controlled_rows = vec![
            controlled(&zero, 0.0),
            controlled(&kept_zero, 0.0),
            controlled(&kept, 2.0),
        ];

        let rows = county_summary(&controlled_rows, &uncontrolled_rows, &[2020]);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.stcntyfips == 48_113));
    }

    #[test]
    fn statewide_emissions_sum_counties_and_name_lead() {
        let dallas_nox = uncontrolled(
            2019,
            DALLAS,
            SourceCategory::Yard,
            "NOX",
            PollutantType::Cap,
            90.0,
            3.0,
        );
        let harris_nox = uncontrolled(
            2019,
            HARRIS,
            SourceCategory::Yard,
            "NOX",
            PollutantType::Cap,
            300.0,
            5.0,
        );
        let class_one_lead = uncontrolled(
            2019,
            HARRIS,
            SourceCategory::ClassILineHaul,
            "7439921",
            PollutantType::Cap,
            300.0,
            0.25,
        );
        let benzene = uncontrolled(
            2019,
            HARRIS,
            SourceCategory::Yard,
            "71432",
            PollutantType::Hap,
            300.0,
            0.5,
        );
        let outside_years = uncontrolled(
            2021,
            HARRIS,
            SourceCategory::Yard,
            "NOX",
            PollutantType::Cap,
            300.0,
            9.0,
        );
        let uncontrolled_rows = vec![
            dallas_nox.clone(),
            harris_nox.clone(),
            class_one_lead.clone(),
            benzene.clone(),
            outside_years.clone(),
        ];
        let controlled_rows = vec![
            controlled(&dallas_nox, 2.0),
            controlled(&harris_nox, 4.0),
            controlled(&class_one_lead, 0.25),
            controlled(&benzene, 0.5),
            controlled(&outside_years, 9.0),
        ];

        let rows = statewide_emission_summary(&controlled_rows, &uncontrolled_rows, &[2019]);
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].source_category, SourceCategory::ClassILineHaul);
        assert_eq!(rows[0].pollutant, "Lead");
        assert!((rows[0].uncontrolled_ton - 0.25).abs() < 1.0e-12);

        assert_eq!(rows[1].source_category, SourceCategory::Yard);
        assert_eq!(rows[1].scc, 2_285_002_010);
        assert_eq!(rows[1].pollutant, "NOX");
        assert!((rows[1].uncontrolled_ton - 8.0).abs() < 1.0e-12);
        assert!((rows[1].controlled_ton - 6.0).abs() < 1.0e-12);
    }
}
