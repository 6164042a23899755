use axum::extract::FromRef;

use crate::{
    config::Config,
    scoring::ScoreEvaluator,
    services::{
        AttemptRecorder, LeaderboardAggregator, ProgressStore, QuizService,
        StageProgressionService, UserDirectory,
    },
    storage::Storage,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: Storage,
    pub stages: StageProgressionService,
    pub quiz: QuizService,
    pub progress: ProgressStore,
    pub leaderboard: LeaderboardAggregator,
    pub users: UserDirectory,
}

impl AppState {
    /// Wires every service to the same storage handle.
    pub fn new(config: Config, storage: Storage) -> Self {
        let recorder = AttemptRecorder::new(storage.clone());
        let evaluator = ScoreEvaluator::new(config.category_bands.clone());

        Self {
            stages: StageProgressionService::new(recorder.clone()),
            quiz: QuizService::new(evaluator, recorder),
            progress: ProgressStore::new(storage.clone()),
            leaderboard: LeaderboardAggregator::new(storage.clone())
                .with_limits(config.leaderboard_default_limit, config.leaderboard_max_limit),
            users: UserDirectory::new(storage.clone()),
            storage,
            config,
        }
    }
}

impl FromRef<AppState> for Storage {
    fn from_ref(state: &AppState) -> Self {
        state.storage.clone()
    }
}

impl FromRef<AppState> for StageProgressionService {
    fn from_ref(state: &AppState) -> Self {
        state.stages.clone()
    }
}

impl FromRef<AppState> for QuizService {
    fn from_ref(state: &AppState) -> Self {
        state.quiz.clone()
    }
}

impl FromRef<AppState> for ProgressStore {
    fn from_ref(state: &AppState) -> Self {
        state.progress.clone()
    }
}

impl FromRef<AppState> for LeaderboardAggregator {
    fn from_ref(state: &AppState) -> Self {
        state.leaderboard.clone()
    }
}

impl FromRef<AppState> for UserDirectory {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}
