// src/services/stages.rs

use std::collections::BTreeMap;

use crate::{
    error::AppError,
    models::stage_attempt::{
        AttemptFilter, StageAttempt, StageStatus, StageStatusResponse, SubmitAttemptRequest,
    },
    scoring::meets_threshold,
    services::attempts::AttemptRecorder,
};

/// Records stage attempts and answers "where does this user stand on each stage".
///
/// Submissions only touch the attempt log. Level progress is a separate
/// projection written through `ProgressStore` by its own endpoint.
#[derive(Clone)]
pub struct StageProgressionService {
    recorder: AttemptRecorder,
}

impl StageProgressionService {
    pub fn new(recorder: AttemptRecorder) -> Self {
        Self { recorder }
    }

    /// Validates and records a submission, returning the attempt id.
    pub async fn submit_attempt(&self, request: SubmitAttemptRequest) -> Result<uuid::Uuid, AppError> {
        let (attempt, passing_score) = request.into_parts();

        if let Some(threshold) = passing_score {
            if !threshold.is_finite() {
                return Err(AppError::InvalidInput(
                    "passingScore must be a finite number".to_string(),
                ));
            }
            if meets_threshold(attempt.score, threshold) != attempt.passed {
                return Err(AppError::InvalidInput(format!(
                    "passed={} disagrees with score {} against passing score {}",
                    attempt.passed, attempt.score, threshold
                )));
            }
        }

        self.recorder.record_stage_attempt(&attempt).await
    }

    pub async fn list_attempts(&self, filter: &AttemptFilter) -> Result<Vec<StageAttempt>, AppError> {
        self.recorder.list_attempts(filter).await
    }

    /// Most recent outcome per stage for one user.
    pub async fn latest_status_per_stage(
        &self,
        user_id: &str,
    ) -> Result<BTreeMap<String, StageStatus>, AppError> {
        let attempts = self.list_attempts(&AttemptFilter::for_user(user_id)).await?;
        Ok(latest_per_stage(&attempts))
    }

    /// Full attempt history plus the per-stage summary.
    pub async fn stage_status(&self, user_id: &str) -> Result<StageStatusResponse, AppError> {
        let attempts = self.list_attempts(&AttemptFilter::for_user(user_id)).await?;
        let latest = latest_per_stage(&attempts);
        Ok(StageStatusResponse { attempts, latest })
    }
}

/// Reduces attempts to the one with the greatest `created_at` per stage.
/// On equal timestamps the attempt seen first wins, which for a newest-first
/// list is the most recently stored one.
pub fn latest_per_stage(attempts: &[StageAttempt]) -> BTreeMap<String, StageStatus> {
    let mut latest: BTreeMap<String, StageStatus> = BTreeMap::new();

    for attempt in attempts {
        match latest.get(&attempt.stage) {
            Some(current) if current.created_at >= attempt.created_at => {}
            _ => {
                latest.insert(attempt.stage.clone(), StageStatus::from(attempt));
            }
        }
    }

    latest
}
