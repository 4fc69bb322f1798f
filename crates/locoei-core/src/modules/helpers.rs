use crate::domain::{LocoError, LocoResult, PipelineStage, StageRequest};

pub(crate) fn validate_stage_request(
    request: &StageRequest,
    expected: PipelineStage,
) -> LocoResult<()> {
    if request.stage != expected {
        return Err(LocoError::input_validation(
            "INPUT.STAGE_MISMATCH",
            format!(
                "{} executor received a request for stage {}",
                expected, request.stage
            ),
        ));
    }
    if request.run_stamp.trim().is_empty() {
        return Err(LocoError::input_validation(
            "INPUT.RUN_STAMP",
            format!("{} request has an empty run stamp", request.stage),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_stage_request;
    use crate::domain::{LocoErrorCategory, PipelineStage, StageRequest};

    #[test]
    fn mismatched_stage_is_an_input_error() {
        let request = StageRequest::new(PipelineStage::Rates, "2026-10-17");
        assert!(validate_stage_request(&request, PipelineStage::Rates).is_ok());

        let error = validate_stage_request(&request, PipelineStage::Fuel)
            .expect_err("mismatched stage should fail");
        assert_eq!(error.category(), LocoErrorCategory::Input);
        assert_eq!(error.placeholder(), "INPUT.STAGE_MISMATCH");
    }

    #[test]
    fn blank_run_stamp_is_rejected() {
        let request = StageRequest::new(PipelineStage::Network, " ");
        let error = validate_stage_request(&request, PipelineStage::Network)
            .expect_err("blank stamp should fail");
        assert_eq!(error.placeholder(), "INPUT.RUN_STAMP");
    }
}
