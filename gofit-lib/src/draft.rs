//src/draft.rs
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Difficulty, Exercise, Workout, WorkoutExercise};

const DEFAULT_CATEGORY: &str = "General";
/// Seconds assumed per repetition when estimating a workout's length.
const SECONDS_PER_REP: u32 = 3;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Workout name cannot be empty.")]
    EmptyName,
    #[error("Add at least one exercise to the workout.")]
    NoExercises,
    #[error("Exercise not found in catalog: {0}")]
    UnknownExercise(String),
    #[error("No planned exercise with id {0}")]
    UnknownPlannedExercise(String),
    #[error("Workout not found: {0}")]
    UnknownWorkout(String),
    #[error("Weight must be a positive number (got {0}).")]
    InvalidWeight(f64),
    #[error("Profile name cannot be empty.")]
    EmptyProfileName,
}

/// Plan parameters given to exercises added to a draft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanDefaults {
    pub sets: u32,
    pub reps: u32,
    pub weight: f64,
    pub rest_time: u32,
}

impl Default for PlanDefaults {
    fn default() -> Self {
        Self {
            sets: 3,
            reps: 10,
            weight: 0.0,
            rest_time: 60,
        }
    }
}

/// Field changes for one planned exercise. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannedExerciseUpdate {
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub rest_time: Option<u32>,
    pub notes: Option<String>,
}

/// A workout being put together before it is saved to the catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub exercises: Vec<WorkoutExercise>,
    pub defaults: PlanDefaults,
    next_entry: u32,
}

impl WorkoutDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Draft for editing an existing workout.
    pub fn from_workout(workout: &Workout) -> Self {
        Self {
            name: workout.name.clone(),
            description: workout.description.clone().unwrap_or_default(),
            category: workout.category.clone(),
            difficulty: workout.difficulty,
            exercises: workout.exercises.clone(),
            defaults: PlanDefaults::default(),
            next_entry: u32::try_from(workout.exercises.len()).unwrap_or(u32::MAX),
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: PlanDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Appends `exercise` with the draft's default plan. Returns the entry id.
    pub fn add_exercise(&mut self, exercise: &Exercise) -> String {
        let entry_id = loop {
            self.next_entry += 1;
            let candidate = format!("{}-{}", self.next_entry, exercise.id);
            if !self.exercises.iter().any(|e| e.id == candidate) {
                break candidate;
            }
        };
        self.exercises.push(WorkoutExercise {
            id: entry_id.clone(),
            exercise: exercise.clone(),
            sets: self.defaults.sets,
            reps: self.defaults.reps,
            weight: Some(self.defaults.weight),
            rest_time: self.defaults.rest_time,
            completed: false,
            notes: None,
        });
        entry_id
    }

    /// Looks `exercise_id` up in `catalog` and adds it.
    /// # Errors
    /// `ValidationError::UnknownExercise` if the catalog has no such id.
    pub fn add_from_catalog(
        &mut self,
        catalog: &[Exercise],
        exercise_id: &str,
    ) -> Result<String, ValidationError> {
        let exercise = catalog
            .iter()
            .find(|e| e.id == exercise_id.trim())
            .ok_or_else(|| ValidationError::UnknownExercise(exercise_id.to_string()))?;
        Ok(self.add_exercise(exercise))
    }

    /// Returns false if no entry had that id.
    pub fn remove_exercise(&mut self, entry_id: &str) -> bool {
        let before = self.exercises.len();
        self.exercises.retain(|e| e.id != entry_id);
        self.exercises.len() != before
    }

    /// # Errors
    /// `UnknownPlannedExercise` for a bad entry id, `InvalidWeight` for a negative weight.
    pub fn update_exercise(
        &mut self,
        entry_id: &str,
        update: PlannedExerciseUpdate,
    ) -> Result<(), ValidationError> {
        if let Some(w) = update.weight {
            if w < 0.0 || !w.is_finite() {
                return Err(ValidationError::InvalidWeight(w));
            }
        }
        let entry = self
            .exercises
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| ValidationError::UnknownPlannedExercise(entry_id.to_string()))?;

        if let Some(sets) = update.sets {
            entry.sets = sets;
        }
        if let Some(reps) = update.reps {
            entry.reps = reps;
        }
        if let Some(weight) = update.weight {
            entry.weight = Some(weight);
        }
        if let Some(rest) = update.rest_time {
            entry.rest_time = rest;
        }
        if let Some(notes) = update.notes {
            let notes = notes.trim();
            entry.notes = (!notes.is_empty()).then(|| notes.to_string());
        }
        Ok(())
    }

    /// Estimated length in minutes, rounded up.
    pub fn estimated_duration(&self) -> u32 {
        let seconds: u32 = self
            .exercises
            .iter()
            .map(|e| e.sets * (e.reps * SECONDS_PER_REP + e.rest_time))
            .sum();
        seconds.div_ceil(60)
    }

    /// Validates the draft and turns it into a catalog workout.
    ///
    /// The id is the creation time in milliseconds, bumped past any id in
    /// `existing`.
    /// # Errors
    /// `EmptyName` if the trimmed name is empty, `NoExercises` if nothing was added.
    pub fn build(&self, now: DateTime<Utc>, existing: &[Workout]) -> Result<Workout, ValidationError> {
        let id = generate_id(now, existing.iter().map(|w| w.id.as_str()));
        self.assemble(id, now, now)
    }

    /// Applies the draft to `original`, keeping its id and creation time.
    /// # Errors
    /// Same validation as [`WorkoutDraft::build`].
    pub fn build_update(
        &self,
        original: &Workout,
        now: DateTime<Utc>,
    ) -> Result<Workout, ValidationError> {
        self.assemble(original.id.clone(), original.created_at, now)
    }

    fn assemble(
        &self,
        id: String,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Workout, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.exercises.is_empty() {
            return Err(ValidationError::NoExercises);
        }

        let description = self.description.trim();
        let category = self.category.trim();
        Ok(Workout {
            id,
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            exercises: self.exercises.clone(),
            duration: Some(self.estimated_duration()),
            created_at,
            updated_at: now,
            difficulty: self.difficulty,
            category: if category.is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                category.to_string()
            },
        })
    }
}

/// Millisecond timestamp id, incremented until it collides with nothing in `taken`.
pub fn generate_id<'a, I>(now: DateTime<Utc>, taken: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: Vec<&str> = taken.into_iter().collect();
    let mut candidate = now.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if !taken.contains(&id.as_str()) {
            return id;
        }
        candidate += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn exercise(id: &str) -> Exercise {
        Exercise {
            id: id.to_string(),
            name: format!("Exercise {id}"),
            category: "Chest".to_string(),
            muscle_groups: vec!["Chest".to_string()],
            equipment: Vec::new(),
            instructions: Vec::new(),
            video_url: None,
            image_url: None,
            gif_url: None,
            difficulty: Difficulty::Beginner,
            description: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_build_requires_name_and_exercises() {
        let mut draft = WorkoutDraft::new("   ");
        assert_eq!(draft.build(now(), &[]), Err(ValidationError::EmptyName));

        draft.name = "Push".to_string();
        assert_eq!(draft.build(now(), &[]), Err(ValidationError::NoExercises));

        draft.add_exercise(&exercise("1"));
        assert!(draft.build(now(), &[]).is_ok());
    }

    #[test]
    fn test_build_fills_defaults_and_trims() {
        let mut draft = WorkoutDraft::new("  Push Day ");
        draft.description = "  ".to_string();
        draft.add_exercise(&exercise("1"));

        let workout = draft.build(now(), &[]).unwrap();
        assert_eq!(workout.name, "Push Day");
        assert_eq!(workout.category, "General");
        assert_eq!(workout.description, None);
        assert_eq!(workout.id, now().timestamp_millis().to_string());
        assert_eq!(workout.created_at, workout.updated_at);
        assert_eq!(workout.exercises[0].sets, 3);
        assert_eq!(workout.exercises[0].reps, 10);
        assert_eq!(workout.exercises[0].rest_time, 60);
        assert_eq!(workout.exercises[0].weight, Some(0.0));
    }

    #[test]
    fn test_id_skips_taken_values() {
        let mut draft = WorkoutDraft::new("A");
        draft.add_exercise(&exercise("1"));
        let first = draft.build(now(), &[]).unwrap();
        let second = draft.build(now(), std::slice::from_ref(&first)).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(second.id, (now().timestamp_millis() + 1).to_string());
    }

    #[test]
    fn test_estimated_duration_rounds_up() {
        let mut draft = WorkoutDraft::new("A");
        // 3 * (10 * 3 + 60) = 270s
        draft.add_exercise(&exercise("1"));
        assert_eq!(draft.estimated_duration(), 5);

        let id = draft.add_exercise(&exercise("2"));
        draft
            .update_exercise(
                &id,
                PlannedExerciseUpdate {
                    sets: Some(1),
                    reps: Some(10),
                    rest_time: Some(30),
                    ..Default::default()
                },
            )
            .unwrap();
        // 270 + 60 = 330s
        assert_eq!(draft.estimated_duration(), 6);
    }

    #[test]
    fn test_update_and_remove_entries() {
        let mut draft = WorkoutDraft::new("A");
        let id = draft.add_exercise(&exercise("1"));

        assert_eq!(
            draft.update_exercise(
                &id,
                PlannedExerciseUpdate {
                    weight: Some(-5.0),
                    ..Default::default()
                }
            ),
            Err(ValidationError::InvalidWeight(-5.0))
        );
        draft
            .update_exercise(
                &id,
                PlannedExerciseUpdate {
                    weight: Some(42.5),
                    notes: Some(" slow negatives ".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(draft.exercises[0].weight, Some(42.5));
        assert_eq!(draft.exercises[0].notes.as_deref(), Some("slow negatives"));

        assert!(draft.remove_exercise(&id));
        assert!(!draft.remove_exercise(&id));
        assert!(draft.exercises.is_empty());
    }

    #[test]
    fn test_edit_keeps_identity_and_unique_entries() {
        let mut draft = WorkoutDraft::new("A");
        draft.add_exercise(&exercise("1"));
        let original = draft.build(now(), &[]).unwrap();

        let mut edit = WorkoutDraft::from_workout(&original);
        edit.name = "B".to_string();
        let added = edit.add_exercise(&exercise("1"));
        assert_ne!(added, original.exercises[0].id);

        let later = now() + chrono::Duration::hours(1);
        let updated = edit.build_update(&original, later).unwrap();
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.exercises.len(), 2);
    }

    #[test]
    fn test_add_from_catalog_unknown_id() {
        let catalog = vec![exercise("1")];
        let mut draft = WorkoutDraft::new("A");
        assert_eq!(
            draft.add_from_catalog(&catalog, "7"),
            Err(ValidationError::UnknownExercise("7".to_string()))
        );
        assert!(draft.add_from_catalog(&catalog, "1").is_ok());
    }
}
