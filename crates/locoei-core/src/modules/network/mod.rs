mod model;
mod parser;

use super::StageExecutor;
use super::helpers::validate_stage_request;
use super::serialization::{read_csv_records, write_stage_output};
use crate::common::config::RunConfig;
use crate::domain::{PipelineStage, StageOutput, StageRequest, StageResult};
use tracing::info;

pub use model::{NetworkLink, build_network_links, passes_jurisdiction};
pub use parser::{CarrierGroupRow, RawRailLink, YardNameFill, normalize_carrier};

pub const NETWORK_OUTPUT_STEM: &str = "network_links";

pub struct NetworkStage;

impl StageExecutor for NetworkStage {
    fn execute(&self, request: &StageRequest, config: &RunConfig) -> StageResult<StageOutput> {
        validate_stage_request(request, PipelineStage::Network)?;

        let raw_links: Vec<RawRailLink> =
            read_csv_records(&config.raw_path(&config.inputs.rail_links))?;
        let fills: Vec<YardNameFill> =
            read_csv_records(&config.raw_path(&config.inputs.yard_name_fills))?;
        let carrier_groups: Vec<CarrierGroupRow> =
            read_csv_records(&config.raw_path(&config.inputs.carrier_groups))?;
        info!(
            raw_links = raw_links.len(),
            yard_fills = fills.len(),
            carriers = carrier_groups.len(),
            "loaded rail network inputs"
        );

        let (links, report) =
            build_network_links(&raw_links, &fills, &carrier_groups, &config.state_filter);
        report.enforce(config.on_violation, PipelineStage::Network)?;

        let artifact = write_stage_output(
            &config.interim_dir,
            NETWORK_OUTPUT_STEM,
            &request.run_stamp,
            &links,
        )?;
        info!(rows = artifact.rows, path = %artifact.path.display(), "wrote network links");

        Ok(StageOutput {
            artifacts: vec![artifact],
            report,
        })
    }
}
