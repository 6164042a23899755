// src/services/quiz.rs

use validator::Validate;

use crate::{
    error::AppError,
    models::quiz_result::{NewQuizResult, QuizGrowth, QuizResult, QuizResultFilter, SubmitQuizRequest},
    scoring::{ScoreEvaluator, growth_between},
    services::attempts::AttemptRecorder,
    utils::ident::is_identifier,
};

/// Career adaptability quiz: evaluation, recording and history.
#[derive(Clone)]
pub struct QuizService {
    evaluator: ScoreEvaluator,
    recorder: AttemptRecorder,
}

impl QuizService {
    pub fn new(evaluator: ScoreEvaluator, recorder: AttemptRecorder) -> Self {
        Self {
            evaluator,
            recorder,
        }
    }

    /// Evaluates the raw answers and records the result.
    ///
    /// Client-computed figures are compared against the evaluation and only
    /// logged when they differ; the evaluation is what gets stored.
    pub async fn submit(&self, request: SubmitQuizRequest) -> Result<QuizResult, AppError> {
        request.validate()?;

        let answers = request.answers.normalized();
        let evaluation = self.evaluator.evaluate(&answers);

        let disagrees = request.scores.is_some_and(|s| s != evaluation.scores)
            || request.total.is_some_and(|t| t != evaluation.total)
            || request.percent.is_some_and(|p| p != evaluation.percent)
            || request
                .category
                .as_deref()
                .is_some_and(|c| c != evaluation.category);
        if disagrees {
            tracing::warn!(
                user_id = %request.user_id,
                total = evaluation.total,
                "Submitted quiz figures differ from server evaluation; keeping evaluation"
            );
        }

        let result = NewQuizResult {
            user_id: request.user_id,
            answers,
            scores: evaluation.scores,
            total: evaluation.total,
            percent: evaluation.percent,
            category: evaluation.category,
            is_posttest: request.is_posttest,
        };

        self.recorder.record_quiz_result(&result).await
    }

    pub async fn history(&self, filter: &QuizResultFilter) -> Result<Vec<QuizResult>, AppError> {
        self.recorder.list_quiz_results(filter).await
    }

    /// Compares a user's latest pretest with their latest posttest.
    pub async fn growth(&self, user_id: &str) -> Result<QuizGrowth, AppError> {
        if !is_identifier(user_id) {
            return Err(AppError::InvalidInput("userId is missing or malformed".to_string()));
        }
        let filter = QuizResultFilter {
            user_id: Some(user_id.to_string()),
            is_posttest: None,
        };
        let results = self.recorder.list_quiz_results(&filter).await?;

        // Newest first, so the first match of each kind is the latest.
        let pretest = results.iter().find(|r| !r.is_posttest).cloned();
        let posttest = results.iter().find(|r| r.is_posttest).cloned();
        let delta = match (&pretest, &posttest) {
            (Some(pre), Some(post)) => Some(growth_between(pre, post)),
            _ => None,
        };

        Ok(QuizGrowth {
            pretest,
            posttest,
            delta,
        })
    }
}
