//src/session.rs
//! Guided execution of a workout: set progression, rest countdown and the
//! final session record.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use thiserror::Error;
use log::debug;

use crate::draft::generate_id;
use crate::models::{ExerciseSession, SetSession, Workout, WorkoutExercise, WorkoutSession};

/// Interval of the rest countdown.
pub const REST_TICK: Duration = Duration::from_secs(1);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Workout not found: {0}")]
    WorkoutNotFound(String),
    #[error("No workout session is in progress.")]
    NoActiveSession,
    #[error("The session in progress belongs to workout {active}, not {requested}.")]
    SessionMismatch { active: String, requested: String },
    #[error("Workout '{0}' has no sets to perform.")]
    EmptyWorkout(String),
    #[error("Cannot {action} while {phase}.")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },
    #[error("The session is already finished.")]
    AlreadyFinished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Exercising {
        exercise_index: usize,
        set_index: usize,
    },
    /// Indices point at the set that comes after the rest.
    Resting {
        exercise_index: usize,
        set_index: usize,
        remaining_seconds: u32,
    },
    Finished,
}

impl SessionPhase {
    const fn label(self) -> &'static str {
        match self {
            Self::Exercising { .. } => "exercising",
            Self::Resting { .. } => "resting",
            Self::Finished => "finished",
        }
    }

    pub const fn is_resting(self) -> bool {
        matches!(self, Self::Resting { .. })
    }
}

/// What was actually lifted, when it differs from the plan.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerformedSet {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
}

/// Position in the workout, 1-based for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub exercise_number: usize,
    pub total_exercises: usize,
    pub set_number: usize,
    pub total_sets: usize,
    pub completed_sets: usize,
    pub planned_sets: usize,
}

impl Progress {
    /// Share of the workout's exercises reached so far, in percent.
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total_exercises == 0 {
            return 100.0;
        }
        self.exercise_number as f64 / self.total_exercises as f64 * 100.0
    }
}

/// One-shot deadline for the next countdown tick. Re-armed after each tick,
/// disarmed as soon as the rest is over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestTimer {
    deadline: Option<Instant>,
}

impl RestTimer {
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + REST_TICK);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarms and returns true if the deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Creates the session record for a fresh execution of `workout`.
pub fn start_session(workout: &Workout, now: DateTime<Utc>) -> WorkoutSession {
    WorkoutSession {
        id: generate_id(now, std::iter::empty()),
        workout_id: workout.id.clone(),
        started_at: now,
        completed_at: None,
        exercises: workout.exercises.iter().map(empty_record).collect(),
        total_duration: None,
        notes: None,
    }
}

fn empty_record(planned: &WorkoutExercise) -> ExerciseSession {
    ExerciseSession {
        exercise_id: planned.exercise.id.clone(),
        sets: Vec::new(),
        completed: false,
    }
}

/// One record per planned exercise, in plan order. Each planned exercise takes
/// the first unclaimed record with its exercise id.
fn align_records(plan: &[WorkoutExercise], mut records: Vec<ExerciseSession>) -> Vec<ExerciseSession> {
    plan.iter()
        .map(|planned| {
            let mut record = records
                .iter()
                .position(|r| r.exercise_id == planned.exercise.id)
                .map_or_else(|| empty_record(planned), |i| records.remove(i));
            record.completed = record.completed && record.sets.len() >= planned.sets as usize;
            record
        })
        .collect()
}

/// Drives one session through the workout's exercises and sets.
#[derive(Debug, Clone)]
pub struct WorkoutRunner {
    plan: Vec<WorkoutExercise>,
    session: WorkoutSession,
    phase: SessionPhase,
    timer: RestTimer,
}

impl WorkoutRunner {
    /// Starts at the first set not yet recorded in `session`. For a fresh
    /// session that is set 1 of the first exercise that has any sets.
    ///
    /// Recorded sets follow their exercise by id, so a plan reordered or
    /// extended after a pause keeps the progress made. Records of exercises
    /// no longer in the plan are dropped.
    /// # Errors
    /// `EmptyWorkout` if no exercise has a set, `AlreadyFinished` for a
    /// completed session or one with every set recorded.
    pub fn new(workout: &Workout, mut session: WorkoutSession) -> Result<Self, SessionError> {
        if session.is_finished() {
            return Err(SessionError::AlreadyFinished);
        }
        let plan = workout.exercises.clone();
        if first_with_sets(&plan, 0).is_none() {
            return Err(SessionError::EmptyWorkout(workout.name.clone()));
        }

        // The plan may have been edited since the session was paused
        session.exercises = align_records(&plan, std::mem::take(&mut session.exercises));

        let (exercise_index, set_index) = plan
            .iter()
            .zip(&session.exercises)
            .enumerate()
            .find_map(|(i, (planned, done))| {
                let recorded = done.sets.len();
                (recorded < planned.sets as usize).then_some((i, recorded))
            })
            .ok_or(SessionError::AlreadyFinished)?;

        Ok(Self {
            plan,
            session,
            phase: SessionPhase::Exercising {
                exercise_index,
                set_index,
            },
            timer: RestTimer::default(),
        })
    }

    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub const fn session(&self) -> &WorkoutSession {
        &self.session
    }

    pub fn into_session(self) -> WorkoutSession {
        self.session
    }

    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, SessionPhase::Finished)
    }

    /// The planned exercise the cursor points at, `None` once finished.
    pub fn current_exercise(&self) -> Option<&WorkoutExercise> {
        match self.phase {
            SessionPhase::Exercising { exercise_index, .. }
            | SessionPhase::Resting { exercise_index, .. } => self.plan.get(exercise_index),
            SessionPhase::Finished => None,
        }
    }

    pub fn progress(&self) -> Progress {
        let completed_sets = self.session.exercises.iter().map(|e| e.sets.len()).sum();
        let planned_sets = self.plan.iter().map(|e| e.sets as usize).sum();
        let total_exercises = self.plan.len();
        match self.phase {
            SessionPhase::Exercising {
                exercise_index,
                set_index,
            }
            | SessionPhase::Resting {
                exercise_index,
                set_index,
                ..
            } => Progress {
                exercise_number: exercise_index + 1,
                total_exercises,
                set_number: set_index + 1,
                total_sets: self.plan[exercise_index].sets as usize,
                completed_sets,
                planned_sets,
            },
            SessionPhase::Finished => Progress {
                exercise_number: total_exercises,
                total_exercises,
                set_number: 0,
                total_sets: 0,
                completed_sets,
                planned_sets,
            },
        }
    }

    /// Records the current set and advances.
    ///
    /// More sets left on this exercise: rest, then the next set. Last set of an
    /// exercise with more to come: rest (using the next exercise's rest time),
    /// then set 1 of the next exercise. Last set overall: the session is stamped
    /// with its completion time and whole-minute duration.
    /// # Errors
    /// `InvalidPhase` while resting, `AlreadyFinished` after the last set.
    pub fn complete_set(
        &mut self,
        performed: Option<PerformedSet>,
        now: DateTime<Utc>,
    ) -> Result<SessionPhase, SessionError> {
        let (exercise_index, set_index) = match self.phase {
            SessionPhase::Exercising {
                exercise_index,
                set_index,
            } => (exercise_index, set_index),
            SessionPhase::Resting { .. } => {
                return Err(SessionError::InvalidPhase {
                    action: "complete a set",
                    phase: self.phase.label(),
                })
            }
            SessionPhase::Finished => return Err(SessionError::AlreadyFinished),
        };

        let total_sets = self.plan[exercise_index].sets as usize;
        self.record_set(exercise_index, set_index, performed.unwrap_or_default());

        let next = if set_index + 1 < total_sets {
            Some((exercise_index, set_index + 1))
        } else {
            self.session.exercises[exercise_index].completed = true;
            first_with_sets(&self.plan, exercise_index + 1).map(|next_exercise| (next_exercise, 0))
        };

        self.phase = match next {
            // Rest length comes from the exercise the next set belongs to
            Some((exercise_index, set_index)) => {
                let rest = self.plan[exercise_index].rest_time;
                self.enter_rest(exercise_index, set_index, rest)
            }
            None => {
                self.finish(now);
                SessionPhase::Finished
            }
        };
        debug!("Set completed, now {:?}", self.phase);
        Ok(self.phase)
    }

    fn record_set(&mut self, exercise_index: usize, set_index: usize, performed: PerformedSet) {
        let planned = &self.plan[exercise_index];
        let set = SetSession {
            set_number: u32::try_from(set_index + 1).unwrap_or(u32::MAX),
            reps: performed.reps.unwrap_or(planned.reps),
            weight: performed.weight.or(planned.weight).unwrap_or(0.0),
            completed: true,
            rest_time: Some(planned.rest_time),
        };
        self.session.exercises[exercise_index].sets.push(set);
    }

    fn enter_rest(&mut self, exercise_index: usize, set_index: usize, rest: u32) -> SessionPhase {
        if rest == 0 {
            self.timer.cancel();
            return SessionPhase::Exercising {
                exercise_index,
                set_index,
            };
        }
        self.timer.arm(Instant::now());
        SessionPhase::Resting {
            exercise_index,
            set_index,
            remaining_seconds: rest,
        }
    }

    fn finish(&mut self, now: DateTime<Utc>) {
        self.timer.cancel();
        let minutes = (now - self.session.started_at).num_minutes().max(0);
        self.session.completed_at = Some(now);
        self.session.total_duration = Some(u32::try_from(minutes).unwrap_or(u32::MAX));
    }

    /// One second of rest elapses. Reaching zero returns to exercising at the
    /// stored position. Outside a rest this does nothing.
    pub fn tick(&mut self) -> SessionPhase {
        if let SessionPhase::Resting {
            exercise_index,
            set_index,
            remaining_seconds,
        } = self.phase
        {
            let remaining = remaining_seconds.saturating_sub(1);
            self.phase = if remaining == 0 {
                self.timer.cancel();
                SessionPhase::Exercising {
                    exercise_index,
                    set_index,
                }
            } else {
                SessionPhase::Resting {
                    exercise_index,
                    set_index,
                    remaining_seconds: remaining,
                }
            };
        }
        self.phase
    }

    /// Ends the rest immediately. Outside a rest this does nothing.
    pub fn skip_rest(&mut self) -> SessionPhase {
        if let SessionPhase::Resting {
            exercise_index,
            set_index,
            ..
        } = self.phase
        {
            self.timer.cancel();
            self.phase = SessionPhase::Exercising {
                exercise_index,
                set_index,
            };
        }
        self.phase
    }

    /// When the next countdown tick is due, if resting.
    pub const fn next_tick_at(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Ticks if the timer deadline has passed and re-arms it while the rest
    /// continues. Returns true if a tick happened.
    pub fn poll_rest_timer(&mut self, now: Instant) -> bool {
        if !self.timer.fire_if_due(now) {
            return false;
        }
        if self.tick().is_resting() {
            self.timer.arm(now);
        }
        true
    }
}

fn first_with_sets(plan: &[WorkoutExercise], from: usize) -> Option<usize> {
    plan.iter()
        .enumerate()
        .skip(from)
        .find(|(_, e)| e.sets > 0)
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, Exercise};
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn planned(id: &str, sets: u32, rest: u32) -> WorkoutExercise {
        WorkoutExercise {
            id: format!("w-{id}"),
            exercise: Exercise {
                id: id.to_string(),
                name: format!("Exercise {id}"),
                category: "Legs".to_string(),
                muscle_groups: Vec::new(),
                equipment: Vec::new(),
                instructions: Vec::new(),
                video_url: None,
                image_url: None,
                gif_url: None,
                difficulty: Difficulty::Beginner,
                description: None,
            },
            sets,
            reps: 8,
            weight: Some(20.0),
            rest_time: rest,
            completed: false,
            notes: None,
        }
    }

    fn workout(exercises: Vec<WorkoutExercise>) -> Workout {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Workout {
            id: "w1".to_string(),
            name: "Test".to_string(),
            description: None,
            exercises,
            duration: None,
            created_at: at,
            updated_at: at,
            difficulty: Difficulty::Beginner,
            category: "General".to_string(),
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap()
    }

    fn runner(exercises: Vec<WorkoutExercise>) -> WorkoutRunner {
        let workout = workout(exercises);
        WorkoutRunner::new(&workout, start_session(&workout, start())).unwrap()
    }

    fn ex(exercise_index: usize, set_index: usize) -> SessionPhase {
        SessionPhase::Exercising {
            exercise_index,
            set_index,
        }
    }

    fn rest(exercise_index: usize, set_index: usize, remaining_seconds: u32) -> SessionPhase {
        SessionPhase::Resting {
            exercise_index,
            set_index,
            remaining_seconds,
        }
    }

    #[test]
    fn test_full_progression_alternates_rest_and_sets() {
        let mut r = runner(vec![planned("a", 3, 60), planned("b", 2, 30)]);
        let now = start() + ChronoDuration::minutes(25);
        assert_eq!(r.phase(), ex(0, 0));

        let expected = [rest(0, 1, 60), rest(0, 2, 60), rest(1, 0, 30), rest(1, 1, 30)];
        for want in expected {
            let got = r.complete_set(None, now).unwrap();
            assert_eq!(got, want);
            // Skip rest lands on the stored position
            assert_eq!(
                r.skip_rest(),
                match want {
                    SessionPhase::Resting {
                        exercise_index,
                        set_index,
                        ..
                    } => ex(exercise_index, set_index),
                    _ => unreachable!(),
                }
            );
        }
        assert_eq!(r.complete_set(None, now).unwrap(), SessionPhase::Finished);

        let session = r.into_session();
        assert_eq!(session.completed_at, Some(now));
        assert_eq!(session.total_duration, Some(25));
        assert_eq!(session.exercises[0].sets.len(), 3);
        assert_eq!(session.exercises[1].sets.len(), 2);
        assert!(session.exercises.iter().all(|e| e.completed));
    }

    #[test]
    fn test_exercise_change_rests_with_next_exercise_rest_time() {
        let mut r = runner(vec![planned("a", 1, 45), planned("b", 1, 10)]);
        assert_eq!(r.complete_set(None, start()).unwrap(), rest(1, 0, 10));
    }

    #[test]
    fn test_countdown_returns_to_exercising() {
        let mut r = runner(vec![planned("a", 2, 3)]);
        r.complete_set(None, start()).unwrap();
        assert_eq!(r.tick(), rest(0, 1, 2));
        assert_eq!(r.tick(), rest(0, 1, 1));
        assert_eq!(r.tick(), ex(0, 1));
        // Ticks outside a rest change nothing
        assert_eq!(r.tick(), ex(0, 1));
        assert!(r.next_tick_at().is_none());
    }

    #[test]
    fn test_complete_set_rejected_while_resting() {
        let mut r = runner(vec![planned("a", 2, 30)]);
        r.complete_set(None, start()).unwrap();
        assert!(matches!(
            r.complete_set(None, start()),
            Err(SessionError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_complete_after_finish_is_error() {
        let mut r = runner(vec![planned("a", 1, 30)]);
        assert_eq!(r.complete_set(None, start()).unwrap(), SessionPhase::Finished);
        assert_eq!(
            r.complete_set(None, start()),
            Err(SessionError::AlreadyFinished)
        );
        assert_eq!(r.skip_rest(), SessionPhase::Finished);
    }

    #[test]
    fn test_zero_rest_goes_straight_to_next_set() {
        let mut r = runner(vec![planned("a", 2, 0)]);
        assert_eq!(r.complete_set(None, start()).unwrap(), ex(0, 1));
    }

    #[test]
    fn test_exercises_without_sets_are_skipped() {
        let mut r = runner(vec![planned("a", 0, 10), planned("b", 1, 10), planned("c", 0, 10)]);
        assert_eq!(r.phase(), ex(1, 0));
        assert_eq!(r.complete_set(None, start()).unwrap(), SessionPhase::Finished);

        let empty = workout(vec![planned("a", 0, 10)]);
        assert!(matches!(
            WorkoutRunner::new(&empty, start_session(&empty, start())),
            Err(SessionError::EmptyWorkout(_))
        ));
    }

    #[test]
    fn test_performed_values_override_plan() {
        let mut r = runner(vec![planned("a", 2, 10)]);
        r.complete_set(
            Some(PerformedSet {
                reps: Some(6),
                weight: Some(22.5),
            }),
            start(),
        )
        .unwrap();
        let set = &r.session().exercises[0].sets[0];
        assert_eq!(set.set_number, 1);
        assert_eq!(set.reps, 6);
        assert_eq!(set.weight, 22.5);
        assert_eq!(set.rest_time, Some(10));
    }

    #[test]
    fn test_rest_timer_polling() {
        let mut r = runner(vec![planned("a", 2, 2)]);
        r.complete_set(None, start()).unwrap();
        let due = r.next_tick_at().unwrap();

        assert!(!r.poll_rest_timer(due - Duration::from_millis(1)));
        assert!(r.poll_rest_timer(due));
        assert_eq!(r.phase(), rest(0, 1, 1));
        // Re-armed for the next second
        let next_due = r.next_tick_at().unwrap();
        assert_eq!(next_due, due + REST_TICK);

        assert!(r.poll_rest_timer(next_due));
        assert_eq!(r.phase(), ex(0, 1));
        assert!(r.next_tick_at().is_none());
    }

    #[test]
    fn test_skip_rest_cancels_timer() {
        let mut r = runner(vec![planned("a", 2, 30)]);
        r.complete_set(None, start()).unwrap();
        assert!(r.next_tick_at().is_some());
        r.skip_rest();
        assert!(r.next_tick_at().is_none());
        assert!(!r.poll_rest_timer(Instant::now() + Duration::from_secs(5)));
    }

    #[test]
    fn test_progress_reports_position() {
        let mut r = runner(vec![planned("a", 3, 10), planned("b", 2, 10)]);
        r.complete_set(None, start()).unwrap();
        let p = r.progress();
        assert_eq!(p.exercise_number, 1);
        assert_eq!(p.set_number, 2);
        assert_eq!(p.total_sets, 3);
        assert_eq!(p.completed_sets, 1);
        assert_eq!(p.planned_sets, 5);
        assert!((p.percent() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resume_continues_after_recorded_sets() {
        let w = workout(vec![planned("a", 2, 10), planned("b", 2, 10)]);
        let mut first = WorkoutRunner::new(&w, start_session(&w, start())).unwrap();
        first.complete_set(None, start()).unwrap();
        first.skip_rest();
        first.complete_set(None, start()).unwrap();

        let resumed = WorkoutRunner::new(&w, first.into_session()).unwrap();
        assert_eq!(resumed.phase(), ex(1, 0));
        assert!(resumed.session().exercises[0].completed);
    }

    #[test]
    fn test_resume_after_plan_edit_follows_exercise_ids() {
        let w = workout(vec![planned("a", 2, 10), planned("b", 2, 10)]);
        let mut first = WorkoutRunner::new(&w, start_session(&w, start())).unwrap();
        for _ in 0..3 {
            first.complete_set(None, start()).unwrap();
            first.skip_rest();
        }

        // Reordered, with a new exercise in the middle
        let edited = workout(vec![planned("b", 2, 10), planned("c", 1, 10), planned("a", 2, 10)]);
        let resumed = WorkoutRunner::new(&edited, first.into_session()).unwrap();
        assert_eq!(resumed.phase(), ex(0, 1));

        let records = &resumed.session().exercises;
        let ids: Vec<&str> = records.iter().map(|r| r.exercise_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(records[0].sets.len(), 1);
        assert!(records[1].sets.is_empty());
        assert_eq!(records[2].sets.len(), 2);
        assert!(records[2].completed);
    }

    #[test]
    fn test_resume_drops_records_of_removed_exercises() {
        let w = workout(vec![planned("a", 1, 10), planned("b", 2, 10)]);
        let mut first = WorkoutRunner::new(&w, start_session(&w, start())).unwrap();
        first.complete_set(None, start()).unwrap();

        let edited = workout(vec![planned("b", 2, 10)]);
        let resumed = WorkoutRunner::new(&edited, first.into_session()).unwrap();
        assert_eq!(resumed.phase(), ex(0, 0));
        assert_eq!(resumed.session().exercises.len(), 1);
        assert_eq!(resumed.progress().completed_sets, 0);
    }

    #[test]
    fn test_finished_session_cannot_be_resumed() {
        let w = workout(vec![planned("a", 1, 10)]);
        let mut session = start_session(&w, start());
        session.completed_at = Some(start());
        assert!(matches!(
            WorkoutRunner::new(&w, session),
            Err(SessionError::AlreadyFinished)
        ));
    }
}
