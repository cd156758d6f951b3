//src/state.rs
use serde::de::DeserializeOwned;
use serde::Serialize;
use log::{debug, info, warn};

use crate::models::{Exercise, LoadingState, User, UserStats, Workout, WorkoutSession};
use crate::storage::{
    KeyValueStore, StorageError, EXERCISES_KEY, PAUSED_SESSION_KEY, SNAPSHOT_KEYS, USER_KEY,
    USER_STATS_KEY, WORKOUTS_KEY,
};

/// Message shown when the startup load fails.
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load data";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub user: Option<User>,
    pub exercises: Vec<Exercise>,
    pub workouts: Vec<Workout>,
    pub current_workout: Option<WorkoutSession>,
    pub user_stats: Option<UserStats>,
    pub loading: LoadingState,
}

impl AppState {
    pub fn find_workout(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn find_exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    /// True when any slice that gets persisted differs between the two states.
    fn persisted_slices_differ(&self, other: &Self) -> bool {
        self.user != other.user
            || self.workouts != other.workouts
            || self.exercises != other.exercises
            || self.user_stats != other.user_stats
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    SetUser(User),
    SetExercises(Vec<Exercise>),
    AddExercise(Exercise),
    SetWorkouts(Vec<Workout>),
    AddWorkout(Workout),
    UpdateWorkout(Workout),
    DeleteWorkout(String),
    SetCurrentWorkout(Option<WorkoutSession>),
    SetUserStats(UserStats),
    SetLoading(LoadingState),
    Logout,
}

impl AppAction {
    const fn name(&self) -> &'static str {
        match self {
            Self::SetUser(_) => "set-user",
            Self::SetExercises(_) => "set-exercises",
            Self::AddExercise(_) => "add-exercise",
            Self::SetWorkouts(_) => "set-workouts",
            Self::AddWorkout(_) => "add-workout",
            Self::UpdateWorkout(_) => "update-workout",
            Self::DeleteWorkout(_) => "delete-workout",
            Self::SetCurrentWorkout(_) => "set-current-workout",
            Self::SetUserStats(_) => "set-user-stats",
            Self::SetLoading(_) => "set-loading",
            Self::Logout => "logout",
        }
    }
}

/// Computes the next state. `state` is left untouched.
pub fn reduce(state: &AppState, action: AppAction) -> AppState {
    let mut next = state.clone();
    match action {
        AppAction::SetUser(user) => next.user = Some(user),
        AppAction::SetExercises(exercises) => next.exercises = exercises,
        AppAction::AddExercise(exercise) => next.exercises.push(exercise),
        AppAction::SetWorkouts(workouts) => next.workouts = workouts,
        AppAction::AddWorkout(workout) => {
            // An id already in the catalog is replaced in place, keeping ids unique.
            match next.workouts.iter_mut().find(|w| w.id == workout.id) {
                Some(existing) => *existing = workout,
                None => next.workouts.push(workout),
            }
        }
        AppAction::UpdateWorkout(workout) => {
            if let Some(existing) = next.workouts.iter_mut().find(|w| w.id == workout.id) {
                *existing = workout;
            }
        }
        AppAction::DeleteWorkout(id) => next.workouts.retain(|w| w.id != id),
        AppAction::SetCurrentWorkout(session) => next.current_workout = session,
        AppAction::SetUserStats(stats) => next.user_stats = Some(stats),
        AppAction::SetLoading(loading) => next.loading = loading,
        AppAction::Logout => next = AppState::default(),
    }
    next
}

/// Handle returned by [`AppStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&AppState)>;

/// Owns the application state and the persisted store behind it.
///
/// All mutation goes through [`AppStore::dispatch`]. Once the initial load has
/// run, every dispatch that changes the user, workouts, exercises or stats
/// writes all four slices back to the store. Write failures are logged only.
pub struct AppStore {
    state: AppState,
    store: Box<dyn KeyValueStore>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    loaded: bool,
}

impl AppStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self {
            state: AppState::default(),
            store,
            listeners: Vec::new(),
            next_subscription: 0,
            loaded: false,
        }
    }

    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Whether the startup load has run (successfully or not).
    pub const fn has_loaded(&self) -> bool {
        self.loaded
    }

    /// Registers a callback run with the new state after every dispatch.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&AppState) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    pub fn dispatch(&mut self, action: AppAction) {
        debug!("dispatch {}", action.name());
        let persist = !matches!(action, AppAction::Logout);
        let next = reduce(&self.state, action);
        let changed = next.persisted_slices_differ(&self.state);
        self.state = next;

        if persist && changed && self.loaded && !self.state.loading.is_loading {
            if let Err(e) = self.save() {
                warn!("Failed to persist app state: {e}");
            }
        }
        self.notify();
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    /// Writes the user, workouts, exercises and stats slices to the store.
    /// Stops at the first failing key; keys written before it stay written.
    /// # Errors
    /// Returns `StorageError` on serialization or write failure.
    pub fn save(&mut self) -> Result<(), StorageError> {
        let snapshot = [
            (USER_KEY, to_json(USER_KEY, &self.state.user)?),
            (WORKOUTS_KEY, to_json(WORKOUTS_KEY, &self.state.workouts)?),
            (EXERCISES_KEY, to_json(EXERCISES_KEY, &self.state.exercises)?),
            (USER_STATS_KEY, to_json(USER_STATS_KEY, &self.state.user_stats)?),
        ];
        for (key, value) in &snapshot {
            self.store.set(key, value)?;
        }
        debug!("Persisted app state");
        Ok(())
    }

    /// Loads the four persisted slices.
    ///
    /// Missing keys keep their defaults. On a read or parse failure loading is
    /// cleared with an error message and the slices applied so far are kept.
    /// # Errors
    /// Returns the `StorageError` that stopped the load.
    pub fn load(&mut self) -> Result<(), StorageError> {
        info!("Loading persisted app state");
        self.dispatch(AppAction::SetLoading(LoadingState::loading()));
        let result = self.apply_persisted();
        self.loaded = true;
        match result {
            Ok(()) => {
                self.dispatch(AppAction::SetLoading(LoadingState::idle()));
                info!(
                    "Loaded persisted app state: {} workouts, {} exercises",
                    self.state.workouts.len(),
                    self.state.exercises.len()
                );
                Ok(())
            }
            Err(e) => {
                warn!("Failed to load persisted app state: {e}");
                self.dispatch(AppAction::SetLoading(LoadingState::failed(
                    LOAD_ERROR_MESSAGE,
                )));
                Err(e)
            }
        }
    }

    fn apply_persisted(&mut self) -> Result<(), StorageError> {
        let values = self.store.multi_get(&SNAPSHOT_KEYS)?;
        let [user, workouts, exercises, stats]: [Option<String>; 4] =
            values.try_into().map_err(|_| {
                StorageError::Unavailable("store returned the wrong number of values".to_string())
            })?;

        if let Some(user) = parse_slice::<Option<User>>(USER_KEY, user)?.flatten() {
            self.dispatch(AppAction::SetUser(user));
        }
        if let Some(workouts) = parse_slice(WORKOUTS_KEY, workouts)? {
            self.dispatch(AppAction::SetWorkouts(workouts));
        }
        if let Some(exercises) = parse_slice(EXERCISES_KEY, exercises)? {
            self.dispatch(AppAction::SetExercises(exercises));
        }
        if let Some(stats) = parse_slice::<Option<UserStats>>(USER_STATS_KEY, stats)?.flatten() {
            self.dispatch(AppAction::SetUserStats(stats));
        }
        Ok(())
    }

    /// Stores `session` as the paused session, or removes it with `None`.
    /// # Errors
    /// Returns `StorageError` on serialization or write failure.
    pub fn park_session(&mut self, session: Option<&WorkoutSession>) -> Result<(), StorageError> {
        match session {
            Some(session) => {
                let json = to_json(PAUSED_SESSION_KEY, session)?;
                self.store.set(PAUSED_SESSION_KEY, &json)
            }
            None => self.store.remove(PAUSED_SESSION_KEY),
        }
    }

    /// # Errors
    /// Returns `StorageError` if the read fails or the stored value does not parse.
    pub fn parked_session(&self) -> Result<Option<WorkoutSession>, StorageError> {
        parse_slice(PAUSED_SESSION_KEY, self.store.get(PAUSED_SESSION_KEY)?)
    }

    /// Clears the persisted store, then resets the state to its initial value.
    /// The state is only reset if the clear succeeded.
    /// # Errors
    /// Returns `StorageError` if the store could not be cleared.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        self.store.clear()?;
        info!("Cleared persisted store");
        self.dispatch(AppAction::Logout);
        Ok(())
    }
}

fn to_json<T: Serialize>(key: &'static str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Serialize { key, source })
}

fn parse_slice<T: DeserializeOwned>(
    key: &str,
    raw: Option<String>,
) -> Result<Option<T>, StorageError> {
    raw.map(|text| {
        serde_json::from_str(&text).map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::{TimeZone, Utc};

    fn workout(id: &str, name: &str) -> Workout {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Workout {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            exercises: Vec::new(),
            duration: None,
            created_at: at,
            updated_at: at,
            difficulty: Difficulty::Beginner,
            category: "General".to_string(),
        }
    }

    #[test]
    fn test_reduce_leaves_input_untouched() {
        let state = AppState::default();
        let next = reduce(&state, AppAction::AddWorkout(workout("1", "A")));
        assert!(state.workouts.is_empty());
        assert_eq!(next.workouts.len(), 1);
    }

    #[test]
    fn test_add_workout_with_existing_id_replaces() {
        let state = reduce(&AppState::default(), AppAction::AddWorkout(workout("1", "A")));
        let state = reduce(&state, AppAction::AddWorkout(workout("2", "B")));
        let state = reduce(&state, AppAction::AddWorkout(workout("1", "A2")));

        let names: Vec<_> = state.workouts.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["A2", "B"]);
    }

    #[test]
    fn test_update_missing_workout_is_noop() {
        let state = reduce(&AppState::default(), AppAction::AddWorkout(workout("1", "A")));
        let next = reduce(&state, AppAction::UpdateWorkout(workout("9", "Z")));
        assert_eq!(next, state);
    }

    #[test]
    fn test_delete_twice_is_idempotent() {
        let state = reduce(&AppState::default(), AppAction::AddWorkout(workout("1", "A")));
        let state = reduce(&state, AppAction::AddWorkout(workout("2", "B")));
        let once = reduce(&state, AppAction::DeleteWorkout("1".to_string()));
        let twice = reduce(&once, AppAction::DeleteWorkout("1".to_string()));
        assert_eq!(once, twice);
        assert_eq!(twice.workouts.len(), 1);
    }

    #[test]
    fn test_logout_resets_everything() {
        let mut state = reduce(&AppState::default(), AppAction::AddWorkout(workout("1", "A")));
        state.user_stats = Some(UserStats::default());
        state.loading = LoadingState::loading();

        let next = reduce(&state, AppAction::Logout);
        assert_eq!(next, AppState::default());
        assert!(!next.loading.is_loading);
        assert!(next.loading.error.is_none());
    }
}
