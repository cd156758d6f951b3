//src/stats.rs
use chrono::{DateTime, Utc};
use log::debug;

use crate::draft::ValidationError;
use crate::models::{User, UserStats, WeightProgress, WorkoutSession};
use crate::session::SessionError;

/// Updated stats and user after a session is committed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionUpdate {
    pub stats: UserStats,
    pub user: Option<User>,
}

/// Streak after a workout completed at `completed_at`.
///
/// The previous workout on the same calendar day keeps the streak as is, a gap
/// of at most `interval_days` days extends it, anything else starts over at 1.
pub fn calculate_streak(
    last_workout: Option<DateTime<Utc>>,
    current_streak: u32,
    completed_at: DateTime<Utc>,
    interval_days: u32,
) -> u32 {
    let Some(last) = last_workout else {
        return 1;
    };
    if current_streak == 0 {
        return 1;
    }
    let gap = (completed_at.date_naive() - last.date_naive()).num_days();
    if gap <= 0 {
        current_streak
    } else if gap <= i64::from(interval_days.max(1)) {
        current_streak.saturating_add(1)
    } else {
        1
    }
}

/// Folds a finished session into the stats and mirrors the counters on the user.
/// # Errors
/// `SessionError::InvalidPhase` if the session has not been completed.
pub fn record_completed_session(
    stats: Option<&UserStats>,
    user: Option<&User>,
    session: &WorkoutSession,
    streak_interval_days: u32,
) -> Result<CompletionUpdate, SessionError> {
    let completed_at = session.completed_at.ok_or(SessionError::InvalidPhase {
        action: "record stats",
        phase: "in progress",
    })?;
    let minutes = session.total_duration.unwrap_or(0);

    let mut stats = stats.cloned().unwrap_or_default();
    // Older snapshots only carry the date on the user record
    let last_workout = stats.last_workout.or_else(|| user.and_then(|u| u.last_workout));
    let streak = calculate_streak(
        last_workout,
        stats.current_streak,
        completed_at,
        streak_interval_days,
    );

    stats.total_workouts = stats.total_workouts.saturating_add(1);
    stats.total_workout_time = stats.total_workout_time.saturating_add(minutes);
    stats.average_workout_duration = average_minutes(stats.total_workout_time, stats.total_workouts);
    stats.current_streak = streak;
    stats.longest_streak = stats.longest_streak.max(streak);
    stats.last_workout = Some(completed_at);

    let user = user.map(|u| User {
        total_workouts: u.total_workouts.saturating_add(1),
        workout_streak: streak,
        last_workout: Some(completed_at),
        ..u.clone()
    });

    debug!(
        "Recorded completed session: total_workouts={}, streak={streak}",
        stats.total_workouts
    );
    Ok(CompletionUpdate { stats, user })
}

fn average_minutes(total: u32, count: u32) -> u32 {
    if count == 0 {
        0
    } else {
        total.saturating_add(count / 2) / count
    }
}

/// Adds a weight sample, keeping samples ordered by date. Samples on the same
/// date keep insertion order.
/// # Errors
/// `ValidationError::InvalidWeight` unless the weight is a positive number.
pub fn add_weight_sample(
    stats: Option<&UserStats>,
    sample: WeightProgress,
) -> Result<UserStats, ValidationError> {
    if !(sample.weight.is_finite() && sample.weight > 0.0) {
        return Err(ValidationError::InvalidWeight(sample.weight));
    }
    let mut stats = stats.cloned().unwrap_or_default();
    let at = stats
        .weight_progress
        .partition_point(|existing| existing.date <= sample.date);
    stats.weight_progress.insert(at, sample);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::{Duration, TimeZone};

    fn day(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, 0, 0).unwrap()
    }

    fn finished_session(at: DateTime<Utc>, minutes: u32) -> WorkoutSession {
        WorkoutSession {
            id: "s1".to_string(),
            workout_id: "w1".to_string(),
            started_at: at - Duration::minutes(i64::from(minutes)),
            completed_at: Some(at),
            exercises: Vec::new(),
            total_duration: Some(minutes),
            notes: None,
        }
    }

    fn user(last_workout: Option<DateTime<Utc>>, streak: u32) -> User {
        User {
            id: "u1".to_string(),
            name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            avatar: None,
            age: None,
            weight: None,
            height: None,
            fitness_level: Difficulty::Beginner,
            goals: Vec::new(),
            created_at: day(1, 0),
            last_workout,
            workout_streak: streak,
            total_workouts: 4,
        }
    }

    #[test]
    fn test_streak_rules() {
        assert_eq!(calculate_streak(None, 5, day(10, 8), 1), 1);
        assert_eq!(calculate_streak(Some(day(9, 20)), 0, day(10, 8), 1), 1);
        // Next calendar day extends even if under 24h apart
        assert_eq!(calculate_streak(Some(day(9, 20)), 3, day(10, 8), 1), 4);
        // Same day does not extend
        assert_eq!(calculate_streak(Some(day(10, 6)), 3, day(10, 20), 1), 3);
        // Gap too large
        assert_eq!(calculate_streak(Some(day(7, 8)), 3, day(10, 8), 1), 1);
        assert_eq!(calculate_streak(Some(day(7, 8)), 3, day(10, 8), 3), 4);
    }

    #[test]
    fn test_record_updates_stats_and_user() {
        let stats = UserStats {
            total_workouts: 4,
            total_workout_time: 160,
            current_streak: 2,
            longest_streak: 2,
            ..Default::default()
        };
        let user = user(Some(day(9, 8)), 2);
        let update =
            record_completed_session(Some(&stats), Some(&user), &finished_session(day(10, 8), 45), 1)
                .unwrap();

        assert_eq!(update.stats.total_workouts, 5);
        assert_eq!(update.stats.total_workout_time, 205);
        assert_eq!(update.stats.average_workout_duration, 41);
        assert_eq!(update.stats.current_streak, 3);
        assert_eq!(update.stats.longest_streak, 3);

        let user = update.user.unwrap();
        assert_eq!(user.total_workouts, 5);
        assert_eq!(user.workout_streak, 3);
        assert_eq!(user.last_workout, Some(day(10, 8)));
    }

    #[test]
    fn test_record_without_prior_stats_or_user() {
        let update = record_completed_session(None, None, &finished_session(day(3, 9), 30), 1).unwrap();
        assert_eq!(update.stats.total_workouts, 1);
        assert_eq!(update.stats.total_workout_time, 30);
        assert_eq!(update.stats.average_workout_duration, 30);
        assert_eq!(update.stats.current_streak, 1);
        assert!(update.user.is_none());
    }

    #[test]
    fn test_longest_streak_survives_reset() {
        let stats = UserStats {
            current_streak: 6,
            longest_streak: 6,
            ..Default::default()
        };
        let user = user(Some(day(1, 8)), 6);
        let update =
            record_completed_session(Some(&stats), Some(&user), &finished_session(day(10, 8), 20), 1)
                .unwrap();
        assert_eq!(update.stats.current_streak, 1);
        assert_eq!(update.stats.longest_streak, 6);
    }

    #[test]
    fn test_streak_builds_without_user() {
        let mut stats = None;
        for d in 3..6 {
            let update =
                record_completed_session(stats.as_ref(), None, &finished_session(day(d, 9), 30), 1)
                    .unwrap();
            assert!(update.user.is_none());
            stats = Some(update.stats);
        }
        let stats = stats.unwrap();
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.last_workout, Some(day(5, 9)));
    }

    #[test]
    fn test_counters_saturate() {
        let stats = UserStats {
            total_workouts: u32::MAX,
            total_workout_time: u32::MAX - 10,
            current_streak: u32::MAX,
            longest_streak: u32::MAX,
            last_workout: Some(day(9, 8)),
            ..Default::default()
        };
        let update =
            record_completed_session(Some(&stats), None, &finished_session(day(10, 8), 45), 1)
                .unwrap();
        assert_eq!(update.stats.total_workouts, u32::MAX);
        assert_eq!(update.stats.total_workout_time, u32::MAX);
        assert_eq!(update.stats.current_streak, u32::MAX);
        assert_eq!(update.stats.average_workout_duration, 1);
    }

    #[test]
    fn test_unfinished_session_rejected() {
        let mut session = finished_session(day(3, 9), 30);
        session.completed_at = None;
        assert!(record_completed_session(None, None, &session, 1).is_err());
    }

    #[test]
    fn test_weight_samples_sorted_and_validated() {
        let sample = |d: u32, weight: f64| WeightProgress {
            date: day(d, 7),
            weight,
            notes: None,
        };
        let stats = add_weight_sample(None, sample(5, 80.0)).unwrap();
        let stats = add_weight_sample(Some(&stats), sample(2, 81.0)).unwrap();
        let stats = add_weight_sample(Some(&stats), sample(9, 79.5)).unwrap();

        let weights: Vec<f64> = stats.weight_progress.iter().map(|w| w.weight).collect();
        assert_eq!(weights, vec![81.0, 80.0, 79.5]);

        assert_eq!(
            add_weight_sample(Some(&stats), sample(10, 0.0)),
            Err(ValidationError::InvalidWeight(0.0))
        );
    }
}
