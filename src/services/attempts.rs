// src/services/attempts.rs

use validator::Validate;

use crate::{
    error::AppError,
    models::{
        quiz_result::{NewQuizResult, QuizResult, QuizResultFilter},
        stage_attempt::{AttemptFilter, NewStageAttempt, StageAttempt},
    },
    storage::Storage,
    utils::ident::is_identifier,
};

/// Append-only log of stage attempts and quiz results.
#[derive(Clone)]
pub struct AttemptRecorder {
    storage: Storage,
}

impl AttemptRecorder {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Records one stage attempt and returns its generated id.
    pub async fn record_stage_attempt(
        &self,
        attempt: &NewStageAttempt,
    ) -> Result<uuid::Uuid, AppError> {
        attempt.validate()?;
        let store = self.storage.store()?;

        let record = store.insert_stage_attempt(attempt).await.map_err(|e| {
            tracing::error!("Failed to record attempt for {}: {}", attempt.user_id, e);
            e
        })?;

        tracing::info!(
            attempt_id = %record.id,
            user_id = %record.user_id,
            stage = %record.stage,
            passed = record.passed,
            "Stage attempt recorded"
        );
        Ok(record.id)
    }

    /// Records one quiz result. Scores are stored as given.
    pub async fn record_quiz_result(&self, result: &NewQuizResult) -> Result<QuizResult, AppError> {
        if !is_identifier(&result.user_id) {
            return Err(AppError::InvalidInput("userId is missing or malformed".to_string()));
        }
        if !result.percent.is_finite() {
            return Err(AppError::InvalidInput("percent must be a finite number".to_string()));
        }
        let store = self.storage.store()?;

        let record = store.insert_quiz_result(result).await.map_err(|e| {
            tracing::error!("Failed to record quiz result for {}: {}", result.user_id, e);
            e
        })?;

        tracing::info!(
            quiz_id = %record.id,
            user_id = %record.user_id,
            total = record.total,
            is_posttest = record.is_posttest,
            "Quiz result recorded"
        );
        Ok(record)
    }

    /// Attempts matching the filter, newest first. No filter means every user.
    pub async fn list_attempts(&self, filter: &AttemptFilter) -> Result<Vec<StageAttempt>, AppError> {
        filter.validate()?;
        self.storage.store()?.list_stage_attempts(filter).await
    }

    pub async fn list_quiz_results(
        &self,
        filter: &QuizResultFilter,
    ) -> Result<Vec<QuizResult>, AppError> {
        filter.validate()?;
        self.storage.store()?.list_quiz_results(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::quiz_result::{CareerAnswers, CategoryScores};
    use serde_json::json;

    fn attempt(user_id: &str, stage: &str) -> NewStageAttempt {
        NewStageAttempt {
            user_id: user_id.to_string(),
            stage: stage.to_string(),
            answers: vec![json!(5), json!(4), json!(3)],
            score: 12.0,
            passed: false,
        }
    }

    #[tokio::test]
    async fn test_record_and_list() {
        let recorder = AttemptRecorder::new(Storage::memory());
        let first = recorder.record_stage_attempt(&attempt("u1", "concern")).await.unwrap();
        let second = recorder.record_stage_attempt(&attempt("u1", "concern")).await.unwrap();
        recorder.record_stage_attempt(&attempt("u1", "control")).await.unwrap();

        let filter = AttemptFilter {
            user_id: Some("u1".to_string()),
            stage: Some("concern".to_string()),
        };
        let listed = recorder.list_attempts(&filter).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second);
        assert_eq!(listed[1].id, first);
    }

    #[tokio::test]
    async fn test_invalid_attempt_is_not_written() {
        let recorder = AttemptRecorder::new(Storage::memory());
        let err = recorder
            .record_stage_attempt(&attempt("", "concern"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let everything = recorder.list_attempts(&AttemptFilter::default()).await.unwrap();
        assert!(everything.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_storage() {
        let recorder = AttemptRecorder::new(Storage::Unavailable("down".to_string()));
        let err = recorder
            .record_stage_attempt(&attempt("u1", "concern"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_validation_precedes_storage_check() {
        let recorder = AttemptRecorder::new(Storage::Unavailable("down".to_string()));
        let err = recorder
            .record_stage_attempt(&attempt("u1", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_record_quiz_result_rejects_blank_user() {
        let recorder = AttemptRecorder::new(Storage::memory());
        let result = NewQuizResult {
            user_id: " ".to_string(),
            answers: CareerAnswers::default().normalized(),
            scores: CategoryScores::default(),
            total: 0,
            percent: 0.0,
            category: "low".to_string(),
            is_posttest: false,
        };
        let err = recorder.record_quiz_result(&result).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
