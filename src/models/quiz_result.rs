// src/models/quiz_result.rs

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::utils::ident::validate_identifier;

/// Items per adaptability category.
pub const CATEGORY_ITEM_COUNT: usize = 6;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// Raw ratings for the four career-adaptability categories.
/// A category left out of a submission decodes as an empty list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CareerAnswers {
    #[serde(default)]
    #[validate(custom(function = validate_ratings))]
    pub concern: Vec<i32>,
    #[serde(default)]
    #[validate(custom(function = validate_ratings))]
    pub control: Vec<i32>,
    #[serde(default)]
    #[validate(custom(function = validate_ratings))]
    pub curiosity: Vec<i32>,
    #[serde(default)]
    #[validate(custom(function = validate_ratings))]
    pub confidence: Vec<i32>,
}

impl CareerAnswers {
    /// Fills absent categories with zero ratings.
    pub fn normalized(mut self) -> Self {
        for ratings in [
            &mut self.concern,
            &mut self.control,
            &mut self.curiosity,
            &mut self.confidence,
        ] {
            if ratings.is_empty() {
                *ratings = vec![0; CATEGORY_ITEM_COUNT];
            }
        }
        self
    }
}

/// A supplied category must hold exactly six ratings on the 1..=5 scale.
fn validate_ratings(ratings: &[i32]) -> Result<(), ValidationError> {
    if ratings.is_empty() {
        return Ok(());
    }
    if ratings.len() != CATEGORY_ITEM_COUNT {
        return Err(ValidationError::new("category_needs_six_ratings"));
    }
    if ratings
        .iter()
        .any(|r| !(MIN_RATING..=MAX_RATING).contains(r))
    {
        return Err(ValidationError::new("rating_out_of_range"));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub concern: i32,
    pub control: i32,
    pub curiosity: i32,
    pub confidence: i32,
}

impl CategoryScores {
    pub fn sum(&self) -> i32 {
        self.concern + self.control + self.curiosity + self.confidence
    }
}

/// Immutable log record of one career-adaptability quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: uuid::Uuid,
    pub user_id: String,
    pub answers: CareerAnswers,
    pub scores: CategoryScores,
    pub total: i32,
    pub percent: f64,
    pub category: String,
    pub is_posttest: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A quiz result as handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuizResult {
    pub user_id: String,
    pub answers: CareerAnswers,
    pub scores: CategoryScores,
    pub total: i32,
    pub percent: f64,
    pub category: String,
    pub is_posttest: bool,
}

/// DTO for submitting a quiz.
///
/// Derived fields are optional: the server evaluates the raw answers itself and
/// its own figures are what gets recorded.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    #[validate(custom(function = validate_identifier))]
    pub user_id: String,
    #[validate(nested)]
    pub answers: CareerAnswers,
    #[serde(default)]
    pub scores: Option<CategoryScores>,
    #[serde(default)]
    pub total: Option<i32>,
    #[serde(default)]
    pub percent: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_posttest: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizResponse {
    pub quiz_id: uuid::Uuid,
    pub scores: CategoryScores,
    pub total: i32,
    pub percent: f64,
    pub category: String,
}

impl From<&QuizResult> for SubmitQuizResponse {
    fn from(result: &QuizResult) -> Self {
        Self {
            quiz_id: result.id,
            scores: result.scores,
            total: result.total,
            percent: result.percent,
            category: result.category.clone(),
        }
    }
}

/// Query parameters for quiz history.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultFilter {
    #[validate(custom(function = validate_identifier))]
    pub user_id: Option<String>,
    pub is_posttest: Option<bool>,
}

impl QuizResultFilter {
    pub fn posttests() -> Self {
        Self {
            user_id: None,
            is_posttest: Some(true),
        }
    }

    pub fn matches(&self, result: &QuizResult) -> bool {
        self.user_id.as_deref().is_none_or(|u| u == result.user_id)
            && self.is_posttest.is_none_or(|p| p == result.is_posttest)
    }
}

/// Change between the latest pretest and the latest posttest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthDelta {
    pub scores: CategoryScores,
    pub total: i32,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizGrowth {
    pub pretest: Option<QuizResult>,
    pub posttest: Option<QuizResult>,
    pub delta: Option<GrowthDelta>,
}

/// Aggregated struct for displaying the leaderboard.
/// Derived on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub total: i32,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}
