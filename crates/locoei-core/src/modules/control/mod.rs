mod model;
mod parser;

use super::StageExecutor;
use super::counties::{TexasCounty, check_county_count};
use super::helpers::validate_stage_request;
use super::quantity::{EmissionQuantity, QUANTITY_OUTPUT_STEM};
use super::serialization::{
    latest_stage_output, read_csv_cells, read_csv_records, read_json_document,
    write_stage_output,
};
use crate::common::config::RunConfig;
use crate::domain::{PipelineStage, StageOutput, StageRequest, StageResult};
use crate::numerics::kahan_sum;
use std::collections::BTreeSet;
use tracing::info;

pub use model::{
    ControlledQuantity, DeriApplication, DeriYardCredit, RegionalCredit, UncontrolledQuantity,
    apply_deri, apply_txled, check_deri_total, regional_deri_credits, txled_counties,
    txled_factor,
};
pub use parser::{DeriBenefitRow, DeriRegion, DeriRegions};

pub const CONTROLLED_OUTPUT_STEM: &str = "cntr_emis_quant";
pub const UNCONTROLLED_OUTPUT_STEM: &str = "uncntr_emis_quant";
pub const DERI_CREDIT_OUTPUT_STEM: &str = "deri_credit_by_yard";

pub struct ControlStage;

impl StageExecutor for ControlStage {
    fn execute(&self, request: &StageRequest, config: &RunConfig) -> StageResult<StageOutput> {
        validate_stage_request(request, PipelineStage::Control)?;

        let quantity_path = latest_stage_output(&config.processed_dir, QUANTITY_OUTPUT_STEM)?;
        let quantities: Vec<EmissionQuantity> = read_csv_records(&quantity_path)?;
        let counties: Vec<TexasCounty> =
            read_csv_records(&config.raw_path(&config.inputs.texas_counties))?;
        let mut report = check_county_count(
            &counties,
            config.expected_texas_counties,
            "CONTROL.COUNTY_COUNT",
        );

        let txled = if config.apply_txled {
            let cells = read_csv_cells(&config.raw_path(&config.inputs.txled_counties))?;
            let (txled, txled_report) =
                txled_counties(&cells, &counties, config.expected_txled_counties);
            report.extend(txled_report);
            txled
        } else {
            BTreeSet::new()
        };
        let controlled = apply_txled(
            &quantities,
            &txled,
            config.txled_reduction_pct,
            config.apply_txled,
        );

        let (credits, regions) = if config.apply_deri {
            let benefits: Vec<DeriBenefitRow> =
                read_csv_records(&config.raw_path(&config.inputs.deri_benefits))?;
            let regions: DeriRegions =
                read_json_document(&config.raw_path(&config.inputs.deri_regions))?;
            let (credits, credit_report) = regional_deri_credits(
                &benefits,
                &config.deri_area_regions,
                config.analysis_years(),
            );
            report.extend(credit_report);
            let window_total = kahan_sum(credits.iter().map(|credit| credit.nox_tons));
            report.extend(check_deri_total(
                window_total,
                config.deri_literature_total_tons,
                "analysis-window",
            ));
            (credits, regions)
        } else {
            (Vec::new(), DeriRegions::new())
        };

        let (deri, deri_report) = apply_deri(&quantities, &credits, &regions, config.apply_deri);
        report.extend(deri_report);
        if config.apply_deri {
            report.extend(check_deri_total(
                deri.applied_tons,
                config.deri_literature_total_tons,
                "applied",
            ));
        }
        report.enforce(config.on_violation, PipelineStage::Control)?;

        let artifacts = vec![
            write_stage_output(
                &config.processed_dir,
                CONTROLLED_OUTPUT_STEM,
                &request.run_stamp,
                &controlled,
            )?,
            write_stage_output(
                &config.processed_dir,
                UNCONTROLLED_OUTPUT_STEM,
                &request.run_stamp,
                &deri.uncontrolled,
            )?,
            write_stage_output(
                &config.processed_dir,
                DERI_CREDIT_OUTPUT_STEM,
                &request.run_stamp,
                &deri.yard_credits,
            )?,
        ];
        info!(
            txled_counties = txled.len(),
            deri_credits = credits.len(),
            deri_applied_tons = deri.applied_tons,
            "wrote controlled and uncontrolled emission quantities"
        );

        Ok(StageOutput { artifacts, report })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DeriBenefitRow, DeriRegion, DeriRegions, apply_deri, apply_txled, check_deri_total,
        regional_deri_credits, txled_counties,
    };
    use crate::common::config::RunConfig;
    use crate::domain::{PollutantType, SourceCategory};
    use crate::modules::counties::TexasCounty;
    use crate::modules::quantity::EmissionQuantity;

    fn quantity(
        county: (u32, &str),
        category: SourceCategory,
        yardname: Option<&str>,
        pollutant: &str,
        year: i32,
        em_quant: f64,
    ) -> EmissionQuantity {
        EmissionQuantity {
            year,
            stcntyfips: county.0,
            county_name: county.1.to_string(),
            source_category: category,
            scc: category.scc(),
            yardname: yardname.map(str::to_string),
            eis_facility_id: None,
            pollutant: pollutant.to_string(),
            pol_type: PollutantType::Cap,
            pol_desc: String::new(),
            em_fac: 1.0,
            fuel_gallons: em_quant,
            em_quant,
        }
    }

    fn texas() -> Vec<TexasCounty> {
        [(48_113, "Dallas"), (48_121, "Denton"), (48_201, "Harris")]
            .into_iter()
            .map(|(stcntyfips, name)| TexasCounty {
                name: name.to_string(),
                stcntyfips,
            })
            .collect()
    }

    const DALLAS: (u32, &str) = (48_113, "Dallas");
    const DENTON: (u32, &str) = (48_121, "Denton");
    const HARRIS: (u32, &str) = (48_201, "Harris");

    #[test]
    fn txled_list_is_normalized_and_counted() {
        let cells = vec![" DALLAS ".to_string(), "harris".to_string()];
        let (matched, report) = txled_counties(&cells, &texas(), 2);
        assert!(report.is_clean());
        assert_eq!(matched.len(), 2);
        assert!(matched.contains("dallas"));

        let (_, short) = txled_counties(&cells, &texas(), 110);
        assert!(short.has_code("CONTROL.TXLED_COUNT"));

        let typo = vec!["Dalas".to_string()];
        let (_, unmatched) = txled_counties(&typo, &texas(), 1);
        assert!(unmatched.has_code("CONTROL.TXLED_UNMATCHED"));
    }

    #[test]
    fn txled_reduces_only_nox_in_listed_counties() {
        let cells = vec!["Dallas".to_string()];
        let (matched, _) = txled_counties(&cells, &texas(), 1);
        let rows = vec![
            quantity(DALLAS, SourceCategory::ClassILineHaul, None, "NOX", 2020, 1_000.0),
            quantity(DALLAS, SourceCategory::ClassILineHaul, None, "CO", 2020, 1_000.0),
            quantity(HARRIS, SourceCategory::ClassILineHaul, None, "NOX", 2020, 1_000.0),
        ];

        let controlled = apply_txled(&rows, &matched, 6.2, true);
        assert!((controlled[0].txled_fac - 0.938).abs() < 1.0e-12);
        assert!((controlled[0].controlled_em_quant - 938.0).abs() < 1.0e-9);
        assert!((controlled[0].controlled_em_quant_ton - 938.0 / 907_185.0).abs() < 1.0e-15);
        assert_eq!(controlled[1].txled_fac, 1.0);
        assert_eq!(controlled[2].txled_fac, 1.0);

        let disabled = apply_txled(&rows, &matched, 6.2, false);
        assert!(disabled.iter().all(|row| row.txled_fac == 1.0));
    }

    fn benefits() -> Vec<DeriBenefitRow> {
        vec![
            DeriBenefitRow {
                area: "Dallas/Fort Worth".to_string(),
                year: 2018,
                benefits_expiry_year: 2021,
                total_nox_reduction_tons: 30.0,
                activity_life: 3.0,
            },
            DeriBenefitRow {
                area: "Houston/Galveston/Brazoria".to_string(),
                year: 2020,
                benefits_expiry_year: 2025,
                total_nox_reduction_tons: 50.0,
                activity_life: 5.0,
            },
        ]
    }

    fn regions() -> DeriRegions {
        let mut regions = DeriRegions::new();
        regions.insert(
            "Dallas/Fort Worth".to_string(),
            DeriRegion {
                counties: vec!["Dallas".to_string(), "Denton".to_string()],
            },
        );
        regions.insert(
            "Houston".to_string(),
            DeriRegion {
                counties: vec!["Harris".to_string()],
            },
        );
        regions
    }

    #[test]
    fn deri_credits_are_annualized_within_window() {
        let config = RunConfig::default();
        let (credits, report) =
            regional_deri_credits(&benefits(), &config.deri_area_regions, 2019..=2021);
        assert!(report.is_clean());

        let summary: Vec<(&str, i32, f64)> = credits
            .iter()
            .map(|credit| (credit.region.as_str(), credit.year, credit.nox_tons))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Dallas/Fort Worth", 2019, 10.0),
                ("Dallas/Fort Worth", 2020, 10.0),
                ("Houston", 2020, 10.0),
                ("Houston", 2021, 10.0),
            ]
        );
        let total: f64 = credits.iter().map(|credit| credit.nox_tons).sum();
        assert!(check_deri_total(total, 40.0, "window").is_clean());
        assert!(check_deri_total(total, 27_206.2667, "window").has_code("CONTROL.DERI_TOTAL"));
    }

    #[test]
    fn unknown_area_is_reported() {
        let mut rows = benefits();
        rows[0].area = "Lubbock".to_string();
        let (_, report) =
            regional_deri_credits(&rows, &RunConfig::default().deri_area_regions, 2019..=2021);
        assert!(report.has_code("CONTROL.DERI_UNKNOWN_AREA"));
    }

    #[test]
    fn deri_credit_splits_evenly_over_region_yards() {
        let (credits, _) = regional_deri_credits(
            &benefits(),
            &RunConfig::default().deri_area_regions,
            2019..=2021,
        );
        let mut rows = Vec::new();
        for year in 2019..=2021 {
            for (county, yard) in [
                (DALLAS, Some("Miller Yard")),
                (DALLAS, Some("Dallas Yard")),
                (HARRIS, Some("Settegast")),
                (HARRIS, Some("Englewood")),
            ] {
                rows.push(quantity(county, SourceCategory::Yard, yard, "NOX", year, 907_185.0));
                rows.push(quantity(county, SourceCategory::Yard, yard, "CO", year, 907_185.0));
            }
            rows.push(quantity(DENTON, SourceCategory::CommuterLineHaul, None, "NOX", year, 1.0));
        }

        let (application, report) = apply_deri(&rows, &credits, &regions(), true);
        assert!(report.is_clean(), "{:?}", report.violations());
        assert!((application.applied_tons - 40.0).abs() < 1.0e-9);
        assert!(check_deri_total(application.applied_tons, 40.0, "applied").is_clean());
        assert_eq!(application.yard_credits.len(), 8);

        let miller_2019 = application
            .uncontrolled
            .iter()
            .find(|row| {
                row.year == 2019
                    && row.yardname.as_deref() == Some("Miller Yard")
                    && row.pollutant == "NOX"
            })
            .expect("Miller Yard 2019 NOX should exist");
        assert_eq!(miller_2019.deri_credit_ton, 5.0);
        assert!((miller_2019.uncontrolled_em_quant_ton - 6.0).abs() < 1.0e-12);
        assert_eq!(miller_2019.region.as_deref(), Some("Dallas/Fort Worth"));

        let dallas_2021 = application
            .uncontrolled
            .iter()
            .find(|row| row.year == 2021 && row.stcntyfips == 48_113 && row.pollutant == "NOX")
            .expect("Dallas 2021 NOX should exist");
        assert_eq!(dallas_2021.deri_credit_ton, 0.0);

        let co_credit: f64 = application
            .uncontrolled
            .iter()
            .filter(|row| row.pollutant == "CO")
            .map(|row| row.deri_credit_ton)
            .sum();
        assert_eq!(co_credit, 0.0);
    }

    #[test]
    fn credit_without_yards_is_reported_unapplied() {
        let (credits, _) = regional_deri_credits(
            &benefits(),
            &RunConfig::default().deri_area_regions,
            2019..=2021,
        );
        let rows = vec![quantity(
            DALLAS,
            SourceCategory::Yard,
            Some("Miller Yard"),
            "NOX",
            2019,
            1.0,
        )];
        let (application, report) = apply_deri(&rows, &credits, &regions(), true);
        assert!(report.has_code("CONTROL.DERI_UNAPPLIED"));
        assert_eq!(application.applied_tons, 10.0);

        let (disabled, disabled_report) = apply_deri(&rows, &credits, &regions(), false);
        assert!(disabled_report.is_clean());
        assert_eq!(disabled.applied_tons, 0.0);
        assert!(disabled.yard_credits.is_empty());
    }
}
