// src/models/stage_attempt.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::utils::ident::{validate_finite, validate_identifier};

pub const MAX_STAGE_ANSWERS: usize = 200;

/// Immutable log record of one stage submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageAttempt {
    pub id: uuid::Uuid,
    pub user_id: String,
    pub stage: String,

    /// Selected option indices or values, in question order.
    pub answers: Vec<serde_json::Value>,

    pub score: f64,
    pub passed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// An attempt as handed to the store. Id and timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewStageAttempt {
    #[validate(custom(function = validate_identifier))]
    pub user_id: String,
    #[validate(custom(function = validate_identifier))]
    pub stage: String,
    #[validate(custom(function = validate_answers))]
    pub answers: Vec<serde_json::Value>,
    #[validate(custom(function = validate_finite))]
    pub score: f64,
    pub passed: bool,
}

fn validate_answers(answers: &[serde_json::Value]) -> Result<(), ValidationError> {
    if answers.is_empty() {
        return Err(ValidationError::new("answers_cannot_be_empty"));
    }
    if answers.len() > MAX_STAGE_ANSWERS {
        return Err(ValidationError::new("too_many_answers"));
    }
    if !answers.iter().all(|a| a.is_number() || a.is_string()) {
        return Err(ValidationError::new("answer_must_be_number_or_string"));
    }
    Ok(())
}

/// DTO for submitting a stage attempt.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptRequest {
    pub user_id: String,
    pub stage: String,
    pub answers: Vec<serde_json::Value>,
    pub score: f64,
    pub passed: bool,

    /// Stage threshold known to the caller. When given, `passed` must agree with it.
    #[serde(default)]
    pub passing_score: Option<f64>,
}

impl SubmitAttemptRequest {
    pub fn into_parts(self) -> (NewStageAttempt, Option<f64>) {
        (
            NewStageAttempt {
                user_id: self.user_id,
                stage: self.stage,
                answers: self.answers,
                score: self.score,
                passed: self.passed,
            },
            self.passing_score,
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAttemptResponse {
    pub attempt_id: uuid::Uuid,
}

/// Query parameters for listing attempts. Omitting `user_id` lists every user.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttemptFilter {
    #[validate(custom(function = validate_identifier))]
    pub user_id: Option<String>,
    #[validate(custom(function = validate_identifier))]
    pub stage: Option<String>,
}

impl AttemptFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            stage: None,
        }
    }

    pub fn matches(&self, attempt: &StageAttempt) -> bool {
        self.user_id.as_deref().is_none_or(|u| u == attempt.user_id)
            && self.stage.as_deref().is_none_or(|s| s == attempt.stage)
    }
}

/// Latest known outcome for one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatus {
    pub score: f64,
    pub passed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&StageAttempt> for StageStatus {
    fn from(attempt: &StageAttempt) -> Self {
        Self {
            score: attempt.score,
            passed: attempt.passed,
            created_at: attempt.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageStatusResponse {
    pub attempts: Vec<StageAttempt>,
    pub latest: BTreeMap<String, StageStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attempt(answers: Vec<serde_json::Value>) -> NewStageAttempt {
        NewStageAttempt {
            user_id: "u1".to_string(),
            stage: "concern".to_string(),
            answers,
            score: 20.0,
            passed: true,
        }
    }

    #[test]
    fn test_valid_attempt() {
        assert!(attempt(vec![json!(5), json!(4), json!("b")]).validate().is_ok());
    }

    #[test]
    fn test_empty_answers_rejected() {
        assert!(attempt(vec![]).validate().is_err());
    }

    #[test]
    fn test_nested_answers_rejected() {
        assert!(attempt(vec![json!({"a": 1})]).validate().is_err());
        assert!(attempt(vec![json!(null)]).validate().is_err());
    }

    #[test]
    fn test_blank_stage_rejected() {
        let mut a = attempt(vec![json!(1)]);
        a.stage = String::new();
        assert!(a.validate().is_err());
    }

    #[test]
    fn test_filter_matches() {
        let record = StageAttempt {
            id: uuid::Uuid::new_v4(),
            user_id: "u1".to_string(),
            stage: "concern".to_string(),
            answers: vec![json!(1)],
            score: 1.0,
            passed: false,
            created_at: chrono::Utc::now(),
        };
        assert!(AttemptFilter::default().matches(&record));
        assert!(AttemptFilter::for_user("u1").matches(&record));
        assert!(!AttemptFilter::for_user("u2").matches(&record));
        let by_stage = AttemptFilter {
            user_id: None,
            stage: Some("control".to_string()),
        };
        assert!(!by_stage.matches(&record));
    }
}
