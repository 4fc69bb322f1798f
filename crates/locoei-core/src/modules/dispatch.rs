use super::StageExecutor;
use super::control::ControlStage;
use super::fuel::FuelStage;
use super::network::NetworkStage;
use super::quantity::QuantityStage;
use super::rates::RatesStage;
use super::serialization::run_stamp;
use super::summary::SummaryStage;
use crate::common::config::RunConfig;
use crate::domain::{PipelineStage, StageOutput, StageRequest, StageResult};
use tracing::{info, info_span};

pub fn stage_executor(stage: PipelineStage) -> &'static dyn StageExecutor {
    match stage {
        PipelineStage::Network => &NetworkStage,
        PipelineStage::Fuel => &FuelStage,
        PipelineStage::Rates => &RatesStage,
        PipelineStage::Quantity => &QuantityStage,
        PipelineStage::Control => &ControlStage,
        PipelineStage::Summary => &SummaryStage,
    }
}

pub fn execute_stage(request: &StageRequest, config: &RunConfig) -> StageResult<StageOutput> {
    let _span = info_span!("stage", stage = %request.stage, stamp = %request.run_stamp).entered();
    info!("starting stage");
    let output = stage_executor(request.stage).execute(request, config)?;
    info!(
        artifacts = output.artifacts.len(),
        violations = output.report.violations().len(),
        "finished stage"
    );
    Ok(output)
}

/// Runs a single stage stamped with today's date.
pub fn run_stage(stage: PipelineStage, config: &RunConfig) -> StageResult<StageOutput> {
    execute_stage(&StageRequest::new(stage, run_stamp()), config)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    pub run_stamp: String,
    pub stages: Vec<(PipelineStage, StageOutput)>,
}

impl PipelineRun {
    pub fn output(&self, stage: PipelineStage) -> Option<&StageOutput> {
        self.stages
            .iter()
            .find(|(ran, _)| *ran == stage)
            .map(|(_, output)| output)
    }
}

/// Every stage in serial order under one run stamp. The first failing stage
/// ends the run.
pub fn run_pipeline(config: &RunConfig) -> StageResult<PipelineRun> {
    run_pipeline_with_stamp(config, run_stamp())
}

pub fn run_pipeline_with_stamp(
    config: &RunConfig,
    run_stamp: impl Into<String>,
) -> StageResult<PipelineRun> {
    let run_stamp = run_stamp.into();
    let mut stages = Vec::with_capacity(PipelineStage::SERIAL_ORDER.len());
    for stage in PipelineStage::SERIAL_ORDER {
        let output = execute_stage(&StageRequest::new(stage, run_stamp.clone()), config)?;
        stages.push((stage, output));
    }
    Ok(PipelineRun { run_stamp, stages })
}

#[cfg(test)]
mod tests {
    use super::{run_pipeline_with_stamp, stage_executor};
    use crate::common::config::RunConfig;
    use crate::domain::{LocoErrorCategory, PipelineStage, StageRequest};
    use tempfile::TempDir;

    #[test]
    fn executors_reject_requests_for_other_stages() {
        let config = RunConfig::default();
        let request = StageRequest::new(PipelineStage::Summary, "2026-10-17");
        let error = stage_executor(PipelineStage::Network)
            .execute(&request, &config)
            .expect_err("network executor should refuse a summary request");
        assert_eq!(error.placeholder(), "INPUT.STAGE_MISMATCH");
    }

    #[test]
    fn pipeline_stops_at_first_missing_input() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = RunConfig::default().resolve_relative_to(temp.path());
        let error = run_pipeline_with_stamp(&config, "2026-10-17")
            .expect_err("empty raw directory should fail");
        assert_eq!(error.category(), LocoErrorCategory::Io);
        assert_eq!(error.placeholder(), "IO.CSV_READ");
        assert!(!temp.path().join("data/interim").exists());
    }
}
