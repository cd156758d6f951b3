// src/lib.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use log::{info, warn};

// --- Declare modules ---
mod config;
mod draft;
mod models;
mod sample;
mod session;
mod state;
mod stats;
pub mod storage;

// --- Expose public types ---
pub use config::{
    get_config_path as get_config_path_util, load as load_config_util, parse_color,
    save as save_config_util, Config, Error as ConfigError, StandardColor, Theme, ThemeMode,
    Units,
};
pub use draft::{generate_id, PlanDefaults, PlannedExerciseUpdate, ValidationError, WorkoutDraft};
pub use models::{
    Difficulty, Exercise, ExerciseSession, LoadingState, SetSession, User, UserStats,
    WeightProgress, Workout, WorkoutExercise, WorkoutSession,
};
pub use sample::{sample_data, SampleData};
pub use session::{
    start_session, PerformedSet, Progress, RestTimer, SessionError, SessionPhase, WorkoutRunner,
    REST_TICK,
};
pub use state::{reduce, AppAction, AppState, AppStore, SubscriptionId, LOAD_ERROR_MESSAGE};
pub use stats::{add_weight_sample, calculate_streak, record_completed_session, CompletionUpdate};
pub use storage::{
    get_db_path as get_db_path_util, KeyValueStore, MemoryStore, SqliteStore, StorageError,
};

#[derive(Default, Debug, Clone, Copy)]
pub struct ExerciseFilters<'a> {
    pub category: Option<&'a str>,
    pub muscle: Option<&'a str>,
    /// Case-insensitive substring of the name.
    pub search: Option<&'a str>,
}

#[derive(Default, Debug, Clone, Copy)]
pub struct WorkoutFilters<'a> {
    pub difficulty: Option<Difficulty>,
    pub category: Option<&'a str>,
}

/// Profile fields to change. `None` leaves a field alone.
#[derive(Default, Debug, Clone)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub fitness_level: Option<Difficulty>,
    pub goals: Option<Vec<String>>,
    pub age: Option<u32>,
    /// cm
    pub height: Option<f64>,
}

pub struct AppService {
    pub config: Config,
    pub app: AppStore,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppService {
    /// Initializes the application service.
    ///
    /// A failed load of persisted data is not fatal: it is recorded in the
    /// loading state and the service starts with whatever was applied.
    /// # Errors
    /// Returns `anyhow::Error` if config/store path determination or opening fails.
    pub fn initialize() -> Result<Self> {
        let config_path =
            config::get_config_path().context("Failed to determine configuration file path")?;
        let config = config::load(&config_path)
            .context(format!("Failed to load config from {config_path:?}"))?;

        let db_path = storage::get_db_path().context("Failed to determine store path")?;
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open store at {db_path:?}"))?;

        let mut service = Self {
            config,
            app: AppStore::new(Box::new(store)),
            db_path,
            config_path,
        };
        if let Err(e) = service.load_state() {
            warn!("Starting with partially loaded data: {e}");
        }
        Ok(service)
    }

    /// Runs the startup load, restores a paused session and seeds the sample
    /// catalog on first run.
    /// # Errors
    /// Returns the `StorageError` that stopped the load. Nothing is seeded then.
    pub fn load_state(&mut self) -> Result<(), StorageError> {
        self.app.load()?;
        self.restore_paused_session();
        self.seed_sample_data_if_empty();
        Ok(())
    }

    fn restore_paused_session(&mut self) {
        match self.app.parked_session() {
            Ok(Some(session)) => {
                info!("Restoring paused session for workout {}", session.workout_id);
                self.app
                    .dispatch(AppAction::SetCurrentWorkout(Some(session)));
            }
            Ok(None) => {}
            Err(e) => warn!("Ignoring unreadable paused session: {e}"),
        }
    }

    /// Seeds the sample exercises, workouts, user and stats when enabled and
    /// the exercise catalog is empty. Existing workouts, user or stats are kept.
    /// Returns true if anything was seeded.
    pub fn seed_sample_data_if_empty(&mut self) -> bool {
        if !self.config.seed_sample_data || !self.app.state().exercises.is_empty() {
            return false;
        }
        let sample = sample_data();
        info!(
            "Seeding sample data: {} exercises, {} workouts",
            sample.exercises.len(),
            sample.workouts.len()
        );
        self.app.dispatch(AppAction::SetExercises(sample.exercises));
        if self.app.state().workouts.is_empty() {
            self.app.dispatch(AppAction::SetWorkouts(sample.workouts));
        }
        if self.app.state().user.is_none() {
            self.app.dispatch(AppAction::SetUser(sample.user));
        }
        if self.app.state().user_stats.is_none() {
            self.app.dispatch(AppAction::SetUserStats(sample.user_stats));
        }
        true
    }

    pub const fn state(&self) -> &AppState {
        self.app.state()
    }

    pub fn dispatch(&mut self, action: AppAction) {
        self.app.dispatch(action);
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    // --- Settings ---

    /// Saves the current configuration state.
    /// # Errors
    /// Returns `ConfigError` if saving fails.
    pub fn save_config(&self) -> Result<(), ConfigError> {
        config::save(&self.config_path, &self.config)
    }

    /// Sets the measurement units.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_units(&mut self, units: Units) -> Result<(), ConfigError> {
        self.config.units = units;
        self.save_config()
    }

    /// Sets the theme mode and, optionally, the table header colour.
    /// # Errors
    /// - `ConfigError::InvalidColor` for an unknown colour name.
    /// - `ConfigError` variants if saving fails.
    pub fn set_theme(&mut self, mode: ThemeMode, header_color: Option<&str>) -> Result<(), ConfigError> {
        if let Some(color) = header_color {
            let parsed = parse_color(color)?;
            self.config.theme.header_color = format!("{parsed:?}");
        }
        self.config.theme.mode = mode;
        self.save_config()
    }

    /// Updates the given reminder flags; `None` leaves a flag as is.
    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_reminders(
        &mut self,
        notifications: Option<bool>,
        workout_reminders: Option<bool>,
        rest_time_reminders: Option<bool>,
    ) -> Result<(), ConfigError> {
        if let Some(on) = notifications {
            self.config.notifications = on;
        }
        if let Some(on) = workout_reminders {
            self.config.workout_reminders = on;
        }
        if let Some(on) = rest_time_reminders {
            self.config.rest_time_reminders = on;
        }
        self.save_config()
    }

    /// # Errors
    /// Returns `ConfigError` variants if saving fails.
    pub fn set_language(&mut self, language: &str) -> Result<(), ConfigError> {
        self.config.language = language.trim().to_string();
        self.save_config()
    }

    /// Sets the streak interval (in days).
    /// # Errors
    /// - `ConfigError::InvalidStreakInterval` if `days` is 0.
    /// - `ConfigError` variants if saving fails.
    pub fn set_streak_interval(&mut self, days: u32) -> Result<(), ConfigError> {
        if days == 0 {
            return Err(ConfigError::InvalidStreakInterval(days));
        }
        self.config.streak_interval_days = days;
        self.save_config()
    }

    // --- Catalog queries ---

    pub fn list_exercises(&self, filters: ExerciseFilters) -> Vec<&Exercise> {
        let search = filters.search.map(|s| s.trim().to_lowercase());
        self.state()
            .exercises
            .iter()
            .filter(|e| {
                filters
                    .category
                    .map_or(true, |c| e.category.eq_ignore_ascii_case(c.trim()))
            })
            .filter(|e| filters.muscle.map_or(true, |m| e.targets_muscle(m)))
            .filter(|e| {
                search
                    .as_deref()
                    .map_or(true, |s| e.name.to_lowercase().contains(s))
            })
            .collect()
    }

    /// Distinct exercise categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.state()
            .exercises
            .iter()
            .map(|e| e.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct muscle groups across the catalog, sorted.
    pub fn muscle_groups(&self) -> Vec<String> {
        self.state()
            .exercises
            .iter()
            .flat_map(|e| e.muscle_groups.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn list_workouts(&self, filters: WorkoutFilters) -> Vec<&Workout> {
        self.state()
            .workouts
            .iter()
            .filter(|w| filters.difficulty.map_or(true, |d| w.difficulty == d))
            .filter(|w| {
                filters
                    .category
                    .map_or(true, |c| w.category.eq_ignore_ascii_case(c.trim()))
            })
            .collect()
    }

    /// The workout suggested on the home screen: the first in the catalog.
    pub fn todays_workout(&self) -> Option<&Workout> {
        self.state().workouts.first()
    }

    /// # Errors
    /// `ValidationError::UnknownWorkout` if no workout has that id.
    pub fn get_workout(&self, id: &str) -> Result<&Workout, ValidationError> {
        self.state()
            .find_workout(id.trim())
            .ok_or_else(|| ValidationError::UnknownWorkout(id.to_string()))
    }

    // --- Workout catalog editing ---

    /// Empty draft whose added exercises get the configured plan defaults.
    pub fn new_draft(&self, name: &str) -> WorkoutDraft {
        WorkoutDraft::new(name).with_defaults(PlanDefaults {
            sets: self.config.default_sets,
            reps: self.config.default_reps,
            weight: 0.0,
            rest_time: self.config.default_rest_seconds,
        })
    }

    /// Validates `draft` and adds the workout to the catalog.
    /// # Errors
    /// `ValidationError` if the draft is incomplete; the catalog is unchanged then.
    pub fn create_workout(
        &mut self,
        draft: &WorkoutDraft,
        now: DateTime<Utc>,
    ) -> Result<Workout, ValidationError> {
        let workout = draft.build(now, &self.state().workouts)?;
        info!("Created workout {} ({})", workout.id, workout.name);
        self.app.dispatch(AppAction::AddWorkout(workout.clone()));
        Ok(workout)
    }

    /// Replaces workout `id` with the contents of `draft`.
    /// # Errors
    /// `ValidationError::UnknownWorkout` for a missing id, or the draft's validation error.
    pub fn update_workout(
        &mut self,
        id: &str,
        draft: &WorkoutDraft,
        now: DateTime<Utc>,
    ) -> Result<Workout, ValidationError> {
        let updated = draft.build_update(self.get_workout(id)?, now)?;
        self.app.dispatch(AppAction::UpdateWorkout(updated.clone()));
        Ok(updated)
    }

    /// Removes workout `id`. Returns false if it was not in the catalog.
    pub fn delete_workout(&mut self, id: &str) -> bool {
        let existed = self.state().find_workout(id).is_some();
        self.app.dispatch(AppAction::DeleteWorkout(id.to_string()));
        existed
    }

    // --- Workout execution ---

    /// Starts a fresh session of workout `workout_id`, replacing any session
    /// in progress.
    /// # Errors
    /// `WorkoutNotFound` for a stale id, `EmptyWorkout` if there is nothing to perform.
    pub fn start_workout(
        &mut self,
        workout_id: &str,
        now: DateTime<Utc>,
    ) -> Result<WorkoutRunner, SessionError> {
        let workout = self
            .state()
            .find_workout(workout_id)
            .ok_or_else(|| SessionError::WorkoutNotFound(workout_id.to_string()))?;
        let runner = WorkoutRunner::new(workout, start_session(workout, now))?;
        info!("Started workout {workout_id} as session {}", runner.session().id);
        self.record_progress(&runner);
        Ok(runner)
    }

    /// Continues the current session. With `workout_id` given, the session
    /// must belong to that workout.
    /// # Errors
    /// `NoActiveSession`, `SessionMismatch`, or `WorkoutNotFound` if the
    /// session's workout was deleted.
    pub fn resume_workout(&mut self, workout_id: Option<&str>) -> Result<WorkoutRunner, SessionError> {
        let session = self
            .state()
            .current_workout
            .clone()
            .ok_or(SessionError::NoActiveSession)?;
        if let Some(requested) = workout_id {
            if requested != session.workout_id {
                return Err(SessionError::SessionMismatch {
                    active: session.workout_id,
                    requested: requested.to_string(),
                });
            }
        }
        let workout = self
            .state()
            .find_workout(&session.workout_id)
            .ok_or_else(|| SessionError::WorkoutNotFound(session.workout_id.clone()))?;
        WorkoutRunner::new(workout, session)
    }

    /// Publishes the runner's session as the current workout.
    pub fn record_progress(&mut self, runner: &WorkoutRunner) {
        self.app
            .dispatch(AppAction::SetCurrentWorkout(Some(runner.session().clone())));
    }

    /// Keeps the session current and stores it so a later run can resume it.
    /// # Errors
    /// Returns `StorageError` if the session could not be stored.
    pub fn pause_workout(&mut self, runner: &WorkoutRunner) -> Result<(), StorageError> {
        self.record_progress(runner);
        self.app.park_session(Some(runner.session()))?;
        info!("Paused session {}", runner.session().id);
        Ok(())
    }

    /// Commits a finished session: stats and user counters are updated and
    /// the current-session slot is cleared.
    /// # Errors
    /// `SessionError::InvalidPhase` if the runner has not finished.
    pub fn finish_workout(&mut self, runner: WorkoutRunner) -> Result<CompletionUpdate, SessionError> {
        let session = runner.into_session();
        let update = record_completed_session(
            self.state().user_stats.as_ref(),
            self.state().user.as_ref(),
            &session,
            self.config.streak_interval_days,
        )?;
        self.app.dispatch(AppAction::SetUserStats(update.stats.clone()));
        if let Some(user) = &update.user {
            self.app.dispatch(AppAction::SetUser(user.clone()));
        }
        self.clear_session();
        info!(
            "Finished workout {} in {} min",
            session.workout_id,
            session.total_duration.unwrap_or(0)
        );
        Ok(update)
    }

    /// Discards the current session without a trace. Returns false if there
    /// was none.
    pub fn cancel_workout(&mut self) -> bool {
        let had_session = self.state().current_workout.is_some();
        self.clear_session();
        had_session
    }

    fn clear_session(&mut self) {
        self.app.dispatch(AppAction::SetCurrentWorkout(None));
        if let Err(e) = self.app.park_session(None) {
            warn!("Failed to remove paused session: {e}");
        }
    }

    // --- Profile ---

    /// Creates the profile if there is none, otherwise applies `update`.
    /// # Errors
    /// `ValidationError::EmptyProfileName` if a new profile gets no name or a
    /// name is set to blank.
    pub fn update_profile(
        &mut self,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<User, ValidationError> {
        let name = match update.name.as_deref().map(str::trim) {
            Some("") => return Err(ValidationError::EmptyProfileName),
            other => other.map(str::to_string),
        };

        let user = match self.state().user.clone() {
            Some(mut user) => {
                if let Some(name) = name {
                    user.name = name;
                }
                if let Some(email) = update.email {
                    user.email = email.trim().to_string();
                }
                if let Some(level) = update.fitness_level {
                    user.fitness_level = level;
                }
                if let Some(goals) = update.goals {
                    user.goals = goals;
                }
                if update.age.is_some() {
                    user.age = update.age;
                }
                if update.height.is_some() {
                    user.height = update.height;
                }
                user
            }
            None => User {
                id: generate_id(now, std::iter::empty()),
                name: name.ok_or(ValidationError::EmptyProfileName)?,
                email: update.email.unwrap_or_default().trim().to_string(),
                avatar: None,
                age: update.age,
                weight: None,
                height: update.height,
                fitness_level: update.fitness_level.unwrap_or_default(),
                goals: update.goals.unwrap_or_default(),
                created_at: now,
                last_workout: None,
                workout_streak: 0,
                total_workouts: 0,
            },
        };
        self.app.dispatch(AppAction::SetUser(user.clone()));
        Ok(user)
    }

    /// Logs a body weight given in the configured units. The profile weight
    /// follows the most recent sample.
    /// # Errors
    /// `ValidationError::InvalidWeight` unless the weight is positive.
    pub fn log_weight(
        &mut self,
        weight: f64,
        date: DateTime<Utc>,
        notes: Option<String>,
    ) -> Result<UserStats, ValidationError> {
        if !(weight.is_finite() && weight > 0.0) {
            return Err(ValidationError::InvalidWeight(weight));
        }
        let sample = WeightProgress {
            date,
            weight: self.config.units.weight_to_kg(weight),
            notes: notes.filter(|n| !n.trim().is_empty()),
        };
        let stats = add_weight_sample(self.state().user_stats.as_ref(), sample)?;
        let latest = stats.weight_progress.last().map(|w| w.weight);
        self.app.dispatch(AppAction::SetUserStats(stats.clone()));

        if let Some(mut user) = self.state().user.clone() {
            if user.weight != latest {
                user.weight = latest;
                self.app.dispatch(AppAction::SetUser(user));
            }
        }
        Ok(stats)
    }

    /// Clears all persisted data and resets the state.
    /// # Errors
    /// Returns `StorageError` if the store could not be cleared; state is kept then.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.app.logout()
    }
}
