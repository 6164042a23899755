// src/models/progress.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::ident::{validate_finite, validate_identifier};

/// Latest completion state of one level for one user.
/// At most one entry exists per `(user, level_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub level_id: String,
    pub score: f64,
    pub completed: bool,

    /// Set only when `completed` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Progress {
    /// Builds the entry an upsert writes, stamping completion time when completed.
    pub fn stamped(
        level_id: impl Into<String>,
        score: f64,
        completed: bool,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            level_id: level_id.into(),
            score,
            completed,
            completed_at: completed.then_some(now),
        }
    }
}

/// Replaces the entry with the same `level_id`, or appends when there is none.
/// A level that stays completed keeps its original completion time.
pub fn upsert_into(list: &mut Vec<Progress>, mut entry: Progress) {
    match list.iter_mut().find(|p| p.level_id == entry.level_id) {
        Some(existing) => {
            if existing.completed && entry.completed {
                entry.completed_at = existing.completed_at.or(entry.completed_at);
            }
            *existing = entry;
        }
        None => list.push(entry),
    }
}

/// DTO for upserting a level's progress.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProgressRequest {
    #[validate(custom(function = validate_identifier))]
    pub user_id: String,
    #[validate(custom(function = validate_identifier))]
    pub level_id: String,
    #[validate(custom(function = validate_finite))]
    pub score: f64,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub progress: Vec<Progress>,
    pub completed_count: usize,
}

impl From<Vec<Progress>> for ProgressResponse {
    fn from(progress: Vec<Progress>) -> Self {
        let completed_count = progress.iter().filter(|p| p.completed).count();
        Self {
            progress,
            completed_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_into_replaces_matching_level() {
        let now = chrono::Utc::now();
        let mut list = vec![
            Progress::stamped("concern", 10.0, false, now),
            Progress::stamped("control", 12.0, true, now),
        ];

        upsert_into(&mut list, Progress::stamped("concern", 25.0, true, now));

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].level_id, "concern");
        assert_eq!(list[0].score, 25.0);
        assert_eq!(list[0].completed_at, Some(now));
        assert_eq!(list[1].level_id, "control");
    }

    #[test]
    fn test_completion_time_survives_repeat_upserts() {
        let first = chrono::Utc::now();
        let later = first + chrono::TimeDelta::minutes(5);
        let mut list = vec![Progress::stamped("concern", 20.0, true, first)];

        upsert_into(&mut list, Progress::stamped("concern", 22.0, true, later));
        assert_eq!(list[0].score, 22.0);
        assert_eq!(list[0].completed_at, Some(first));

        // Reopening clears the stamp, completing again takes the new time.
        upsert_into(&mut list, Progress::stamped("concern", 5.0, false, later));
        assert_eq!(list[0].completed_at, None);
        upsert_into(&mut list, Progress::stamped("concern", 21.0, true, later));
        assert_eq!(list[0].completed_at, Some(later));
    }

    #[test]
    fn test_upsert_into_appends_new_level() {
        let now = chrono::Utc::now();
        let mut list = vec![Progress::stamped("concern", 10.0, true, now)];

        upsert_into(&mut list, Progress::stamped("curiosity", 3.0, false, now));

        assert_eq!(list.len(), 2);
        assert_eq!(list[1].level_id, "curiosity");
        assert_eq!(list[1].completed_at, None);
    }

    #[test]
    fn test_completed_count() {
        let now = chrono::Utc::now();
        let response = ProgressResponse::from(vec![
            Progress::stamped("concern", 10.0, true, now),
            Progress::stamped("control", 1.0, false, now),
        ]);
        assert_eq!(response.completed_count, 1);
    }

    #[test]
    fn test_request_validation() {
        let bad = UpsertProgressRequest {
            user_id: String::new(),
            level_id: "concern".to_string(),
            score: 1.0,
            completed: true,
        };
        assert!(bad.validate().is_err());

        let nan = UpsertProgressRequest {
            user_id: "u1".to_string(),
            level_id: "concern".to_string(),
            score: f64::NAN,
            completed: true,
        };
        assert!(nan.validate().is_err());
    }
}
