// src/scoring.rs

use serde::{Deserialize, Serialize};

use crate::models::quiz_result::{
    CATEGORY_ITEM_COUNT, CareerAnswers, CategoryScores, GrowthDelta, MAX_RATING, QuizResult,
};

/// Highest reachable quiz total: four categories of six items rated 5.
pub const MAX_TOTAL: i32 = 4 * CATEGORY_ITEM_COUNT as i32 * MAX_RATING;

/// One qualitative band. A band covers `[min_percent, next band's min_percent)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBand {
    pub min_percent: f64,
    pub label: String,
}

impl CategoryBand {
    pub fn new(min_percent: f64, label: impl Into<String>) -> Self {
        Self {
            min_percent,
            label: label.into(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            CategoryBand::new(0.0, "low"),
            CategoryBand::new(60.0, "moderate"),
            CategoryBand::new(80.0, "high"),
        ]
    }
}

/// Output of evaluating one quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizEvaluation {
    pub scores: CategoryScores,
    pub total: i32,
    pub percent: f64,
    pub category: String,
}

/// Turns raw ratings into category scores, a total, a percentage and a label.
#[derive(Debug, Clone)]
pub struct ScoreEvaluator {
    bands: Vec<CategoryBand>,
}

impl Default for ScoreEvaluator {
    fn default() -> Self {
        Self::new(CategoryBand::defaults())
    }
}

impl ScoreEvaluator {
    /// Bands are expected in ascending `min_percent` order. An empty table
    /// falls back to the defaults.
    pub fn new(bands: Vec<CategoryBand>) -> Self {
        let bands = if bands.is_empty() {
            CategoryBand::defaults()
        } else {
            bands
        };
        Self { bands }
    }

    pub fn evaluate(&self, answers: &CareerAnswers) -> QuizEvaluation {
        let scores = CategoryScores {
            concern: category_score(&answers.concern),
            control: category_score(&answers.control),
            curiosity: category_score(&answers.curiosity),
            confidence: category_score(&answers.confidence),
        };
        let total = scores.sum();
        let percent = percent_of(total);

        QuizEvaluation {
            scores,
            total,
            percent,
            category: self.category_for(percent).to_string(),
        }
    }

    /// First band whose range contains `percent`. Values below the first band
    /// land in the first band.
    pub fn category_for(&self, percent: f64) -> &str {
        let matched = self.bands.iter().enumerate().find(|(i, band)| {
            let upper = self.bands.get(i + 1).map(|next| next.min_percent);
            percent >= band.min_percent && upper.is_none_or(|u| percent < u)
        });

        matched
            .map(|(_, band)| band)
            .or_else(|| self.bands.first())
            .map(|band| band.label.as_str())
            .unwrap_or_default()
    }
}

/// Sum of one category's ratings. A missing category counts as zeros.
pub fn category_score(ratings: &[i32]) -> i32 {
    ratings.iter().sum()
}

/// `total / 120 * 100`, kept at full precision.
pub fn percent_of(total: i32) -> f64 {
    total as f64 / MAX_TOTAL as f64 * 100.0
}

/// Stage pass rule: reaching the threshold passes.
pub fn meets_threshold(score: f64, passing_score: f64) -> bool {
    score >= passing_score
}

/// Difference between a pretest and a posttest, posttest minus pretest.
pub fn growth_between(pretest: &QuizResult, posttest: &QuizResult) -> GrowthDelta {
    let (pre, post) = (pretest.scores, posttest.scores);
    GrowthDelta {
        scores: CategoryScores {
            concern: post.concern - pre.concern,
            control: post.control - pre.control,
            curiosity: post.curiosity - pre.curiosity,
            confidence: post.confidence - pre.confidence,
        },
        total: posttest.total - pretest.total,
        percent: posttest.percent - pretest.percent,
    }
}
