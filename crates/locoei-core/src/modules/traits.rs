use crate::common::config::RunConfig;
use crate::domain::{StageOutput, StageRequest, StageResult};

pub trait StageExecutor {
    fn execute(&self, request: &StageRequest, config: &RunConfig) -> StageResult<StageOutput>;
}

#[cfg(test)]
mod tests {
    use super::StageExecutor;
    use crate::common::config::RunConfig;
    use crate::domain::{
        LocoError, LocoErrorCategory, PipelineStage, StageOutput, StageRequest, StageResult,
    };

    struct FailingExecutor;

    impl StageExecutor for FailingExecutor {
        fn execute(
            &self,
            _request: &StageRequest,
            _config: &RunConfig,
        ) -> StageResult<StageOutput> {
            Err(LocoError::computation("RUN.STAGE", "stage execution failed"))
        }
    }

    #[test]
    fn stage_executor_uses_shared_error_types() {
        let request = StageRequest::new(PipelineStage::Fuel, "2026-10-17");
        let error = FailingExecutor
            .execute(&request, &RunConfig::default())
            .expect_err("executor should fail");
        assert_eq!(error.category(), LocoErrorCategory::Run);
        assert_eq!(error.exit_code(), 4);
        assert_eq!(error.placeholder(), "RUN.STAGE");
    }
}
