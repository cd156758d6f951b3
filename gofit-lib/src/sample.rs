//src/sample.rs
//! First-run sample catalog: a handful of bodyweight and free-weight
//! exercises, two workouts built from them, a demo user and their stats.
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    Difficulty, Exercise, User, UserStats, WeightProgress, Workout, WorkoutExercise,
};

pub struct SampleData {
    pub exercises: Vec<Exercise>,
    pub workouts: Vec<Workout>,
    pub user: User,
    pub user_stats: UserStats,
}

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[allow(clippy::too_many_arguments)]
fn exercise(
    id: &str,
    name: &str,
    category: &str,
    muscle_groups: &[&str],
    equipment: &[&str],
    instructions: &[&str],
    difficulty: Difficulty,
    description: &str,
) -> Exercise {
    Exercise {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        muscle_groups: strings(muscle_groups),
        equipment: strings(equipment),
        instructions: strings(instructions),
        video_url: None,
        image_url: None,
        gif_url: None,
        difficulty,
        description: Some(description.to_string()),
    }
}

pub fn sample_exercises() -> Vec<Exercise> {
    vec![
        exercise(
            "1",
            "Push-up",
            "Chest",
            &["Chest", "Triceps", "Shoulders"],
            &["None"],
            &[
                "Lie face down on the floor",
                "Place your hands shoulder-width apart",
                "Keep your body straight",
                "Lower until your chest almost touches the floor",
                "Push back up to the starting position",
            ],
            Difficulty::Beginner,
            "Classic movement for chest and arm strength",
        ),
        exercise(
            "2",
            "Squat",
            "Legs",
            &["Quadriceps", "Glutes", "Calves"],
            &["None"],
            &[
                "Stand with feet shoulder-width apart",
                "Keep your back straight",
                "Lower as if sitting into a chair",
                "Go as deep as you can while staying balanced",
                "Stand back up",
            ],
            Difficulty::Beginner,
            "Fundamental lower-body strength exercise",
        ),
        exercise(
            "3",
            "Plank",
            "Core",
            &["Abs", "Shoulders", "Back"],
            &["None"],
            &[
                "Lie face down on the floor",
                "Support yourself on forearms and toes",
                "Keep your body straight like a board",
                "Brace your abs",
                "Hold the position for the set time",
            ],
            Difficulty::Beginner,
            "Builds core stability",
        ),
        exercise(
            "4",
            "Bench Press",
            "Chest",
            &["Chest", "Triceps", "Shoulders"],
            &["Barbell", "Bench"],
            &[
                "Lie on the bench with the bar above your chest",
                "Grip the bar shoulder-width apart",
                "Lower the bar until it lightly touches your chest",
                "Press the bar back up",
                "Stay in control through the whole movement",
            ],
            Difficulty::Intermediate,
            "Classic chest builder",
        ),
        exercise(
            "5",
            "Biceps Curl",
            "Arms",
            &["Biceps"],
            &["Dumbbells"],
            &[
                "Stand holding a dumbbell in each hand",
                "Keep your elbows close to your body",
                "Curl the weights up to your shoulders",
                "Lower them slowly",
                "Stay in control through the whole movement",
            ],
            Difficulty::Beginner,
            "Isolation exercise for the biceps",
        ),
    ]
}

fn planned(
    id: &str,
    exercise: &Exercise,
    sets: u32,
    reps: u32,
    weight: Option<f64>,
    rest_time: u32,
) -> WorkoutExercise {
    WorkoutExercise {
        id: id.to_string(),
        exercise: exercise.clone(),
        sets,
        reps,
        weight,
        rest_time,
        completed: false,
        notes: None,
    }
}

pub fn sample_workouts(exercises: &[Exercise]) -> Vec<Workout> {
    let [push_up, squat, plank, bench, ..] = exercises else {
        return Vec::new();
    };
    vec![
        Workout {
            id: "1".to_string(),
            name: "Full Body Starter".to_string(),
            description: Some("A simple routine for getting started".to_string()),
            exercises: vec![
                planned("1-1", push_up, 3, 10, None, 60),
                planned("1-2", squat, 3, 15, None, 60),
                // Plank reps are seconds held
                planned("1-3", plank, 3, 30, None, 60),
            ],
            duration: Some(30),
            created_at: date(2024, 1, 1),
            updated_at: date(2024, 1, 1),
            difficulty: Difficulty::Beginner,
            category: "Full Body".to_string(),
        },
        Workout {
            id: "2".to_string(),
            name: "Chest Day".to_string(),
            description: Some("Focus on building the chest".to_string()),
            exercises: vec![
                planned("2-1", bench, 4, 8, Some(60.0), 90),
                planned("2-2", push_up, 3, 12, None, 60),
            ],
            duration: Some(45),
            created_at: date(2024, 1, 2),
            updated_at: date(2024, 1, 2),
            difficulty: Difficulty::Intermediate,
            category: "Chest".to_string(),
        },
    ]
}

pub fn sample_user() -> User {
    User {
        id: "1".to_string(),
        name: "GoFit User".to_string(),
        email: "user@gofit.app".to_string(),
        avatar: None,
        age: None,
        weight: Some(71.0),
        height: None,
        fitness_level: Difficulty::Beginner,
        goals: strings(&["Build muscle", "Improve conditioning"]),
        created_at: date(2024, 1, 1),
        last_workout: Some(date(2024, 1, 15)),
        workout_streak: 5,
        total_workouts: 12,
    }
}

pub fn sample_user_stats() -> UserStats {
    UserStats {
        total_workouts: 12,
        total_workout_time: 480,
        current_streak: 5,
        longest_streak: 8,
        favorite_exercises: strings(&["Push-up", "Squat", "Plank"]),
        average_workout_duration: 40,
        weight_progress: vec![
            WeightProgress {
                date: date(2024, 1, 1),
                weight: 70.0,
                notes: None,
            },
            WeightProgress {
                date: date(2024, 1, 15),
                weight: 71.0,
                notes: None,
            },
        ],
        last_workout: Some(date(2024, 1, 15)),
    }
}

pub fn sample_data() -> SampleData {
    let exercises = sample_exercises();
    let workouts = sample_workouts(&exercises);
    SampleData {
        exercises,
        workouts,
        user: sample_user(),
        user_stats: sample_user_stats(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_workouts_reference_catalog() {
        let data = sample_data();
        assert_eq!(data.exercises.len(), 5);
        assert_eq!(data.workouts.len(), 2);
        for workout in &data.workouts {
            for planned in &workout.exercises {
                assert!(data.exercises.iter().any(|e| *e == planned.exercise));
            }
        }
        assert_eq!(data.workouts[1].total_sets(), 7);
    }
}
