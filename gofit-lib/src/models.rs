//src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty tier shared by users, exercises and workouts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl TryFrom<&str> for Difficulty {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => anyhow::bail!("Invalid difficulty: {value}"),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginner => write!(f, "Beginner"),
            Self::Intermediate => write!(f, "Intermediate"),
            Self::Advanced => write!(f, "Advanced"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Body weight in kg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Height in cm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub fitness_level: Difficulty,
    pub goals: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_workout: Option<DateTime<Utc>>,
    pub workout_streak: u32,
    pub total_workouts: u32,
}

/// Catalog entry. Reference data, never edited once in the catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: String,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gif_url: Option<String>,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Exercise {
    /// Animated media wins over a still image.
    pub fn media_url(&self) -> Option<&str> {
        self.gif_url.as_deref().or(self.image_url.as_deref())
    }

    pub fn targets_muscle(&self, muscle: &str) -> bool {
        self.muscle_groups
            .iter()
            .any(|m| m.eq_ignore_ascii_case(muscle.trim()))
    }
}

/// An exercise as planned inside a workout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutExercise {
    pub id: String,
    pub exercise: Exercise,
    pub sets: u32,
    pub reps: u32,
    /// Planned load in kg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Rest after each set, in seconds.
    pub rest_time: u32,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub exercises: Vec<WorkoutExercise>,
    /// Estimated duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub difficulty: Difficulty,
    pub category: String,
}

impl Workout {
    pub fn total_sets(&self) -> u32 {
        self.exercises.iter().map(|e| e.sets).sum()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetSession {
    pub set_number: u32,
    pub reps: u32,
    pub weight: f64,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_time: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSession {
    pub exercise_id: String,
    pub sets: Vec<SetSession>,
    pub completed: bool,
}

/// One execution of a workout. Terminal once `completed_at` is set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub id: String,
    pub workout_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub exercises: Vec<ExerciseSession>,
    /// Whole minutes between start and completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WorkoutSession {
    pub const fn is_finished(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeightProgress {
    pub date: DateTime<Utc>,
    /// kg
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_workouts: u32,
    /// Minutes.
    pub total_workout_time: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(default)]
    pub favorite_exercises: Vec<String>,
    /// Minutes.
    #[serde(default)]
    pub average_workout_duration: u32,
    #[serde(default)]
    pub weight_progress: Vec<WeightProgress>,
    /// Completion time of the latest recorded workout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_workout: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoadingState {
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoadingState {
    pub const fn idle() -> Self {
        Self {
            is_loading: false,
            error: None,
        }
    }

    pub const fn loading() -> Self {
        Self {
            is_loading: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            is_loading: false,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(image_url: Option<&str>, gif_url: Option<&str>) -> Exercise {
        Exercise {
            id: "1".to_string(),
            name: "Push-up".to_string(),
            category: "Chest".to_string(),
            muscle_groups: vec!["Chest".to_string(), "Triceps".to_string()],
            equipment: Vec::new(),
            instructions: Vec::new(),
            video_url: None,
            image_url: image_url.map(str::to_string),
            gif_url: gif_url.map(str::to_string),
            difficulty: Difficulty::Beginner,
            description: None,
        }
    }

    #[test]
    fn test_media_url_prefers_gif() {
        assert_eq!(exercise(None, None).media_url(), None);
        assert_eq!(exercise(Some("a.png"), None).media_url(), Some("a.png"));
        assert_eq!(exercise(Some("a.png"), Some("a.gif")).media_url(), Some("a.gif"));
    }

    #[test]
    fn test_targets_muscle_ignores_case() {
        let push_up = exercise(None, None);
        assert!(push_up.targets_muscle(" triceps "));
        assert!(!push_up.targets_muscle("Biceps"));
    }
}
