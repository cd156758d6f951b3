//src/main.rs
mod cli; // Keep cli module for parsing args

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Timelike, Utc};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, stdin, stdout, Write};
use std::time::{Duration, Instant};
use log::debug;

use gofit_lib::{
    AppService, Difficulty, Exercise, ExerciseFilters, PerformedSet, PlannedExerciseUpdate,
    ProfileUpdate, SessionPhase, ThemeMode, Units, UserStats, Workout, WorkoutDraft,
    WorkoutFilters, WorkoutRunner,
};

const LOG_ENV_VAR: &str = "GOFIT_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() -> Result<()> {
    // --- Check for completion generation request FIRST ---
    let cli_args = cli::parse_args();
    let export_csv = cli_args.export_csv;

    if let cli::Commands::Completions { shell } = cli_args.command {
        let mut cmd = cli::build_cli_command();
        let bin_name = cmd.get_name().to_string();

        eprintln!("Generating completion script for {shell}...");
        clap_complete::generate(shell, &mut cmd, bin_name, &mut stdout());
        return Ok(());
    }

    init_logging();
    debug!("Starting {:?}", cli_args.command);

    // Loads config, opens the store and runs the startup load
    let mut service =
        AppService::initialize().context("Failed to initialize application service")?;
    if let Some(error) = &service.state().loading.error {
        eprintln!("Warning: {error}. Some of your data may be missing.");
    }

    let header_color = service.config.header_color();
    let units = service.config.units;

    match cli_args.command {
        cli::Commands::Completions { .. } => {
            unreachable!("Completion generation should have exited already");
        }
        cli::Commands::Home => print_home(&service, header_color, units),

        // --- Catalog ---
        cli::Commands::Exercises {
            category,
            muscle,
            search,
        } => {
            let exercises = service.list_exercises(ExerciseFilters {
                category: category.as_deref(),
                muscle: muscle.as_deref(),
                search: search.as_deref(),
            });
            if exercises.is_empty() {
                println!("No exercises found matching the criteria.");
                println!("Categories: {}", service.categories().join(", "));
                println!("Muscle groups: {}", service.muscle_groups().join(", "));
            } else if export_csv {
                print_exercises_csv(&exercises)?;
            } else {
                print_exercise_table(&exercises, header_color);
            }
        }
        cli::Commands::Workouts {
            difficulty,
            category,
        } => {
            let workouts = service.list_workouts(WorkoutFilters {
                difficulty: difficulty.map(cli_difficulty),
                category: category.as_deref(),
            });
            if workouts.is_empty() {
                println!("No workouts found. Create one with `gofit create-workout`.");
            } else if export_csv {
                print_workouts_csv(&workouts)?;
            } else {
                print_workout_table(&workouts, header_color);
            }
        }
        cli::Commands::ShowWorkout { id } => {
            let workout = service.get_workout(&id)?;
            print_workout_details(workout, header_color, units);
        }
        cli::Commands::CreateWorkout {
            name,
            description,
            category,
            difficulty,
            exercises,
            sets,
            reps,
            weight,
            rest,
        } => {
            let mut draft = service.new_draft(&name);
            draft.description = description.unwrap_or_default();
            draft.category = category.unwrap_or_default();
            draft.difficulty = cli_difficulty(difficulty);
            if let Some(sets) = sets {
                draft.defaults.sets = sets;
            }
            if let Some(reps) = reps {
                draft.defaults.reps = reps;
            }
            if let Some(w) = weight {
                draft.defaults.weight = parse_weight_arg(w, units)?;
            }
            if let Some(rest) = rest {
                draft.defaults.rest_time = rest;
            }

            let catalog = service.state().exercises.clone();
            for exercise_id in &exercises {
                draft.add_from_catalog(&catalog, exercise_id)?;
            }
            match service.create_workout(&draft, Utc::now()) {
                Ok(workout) => println!(
                    "Created workout '{}' (ID: {}), about {} min.",
                    workout.name,
                    workout.id,
                    workout.duration.unwrap_or(0)
                ),
                Err(e) => bail!("Error creating workout: {e}"),
            }
        }
        cli::Commands::EditWorkout {
            id,
            name,
            description,
            category,
            difficulty,
            add,
            remove,
            entry,
            sets,
            reps,
            weight,
            rest,
            notes,
        } => {
            let original = service.get_workout(&id)?.clone();
            let defaults = service.new_draft("").defaults;
            let mut draft = WorkoutDraft::from_workout(&original).with_defaults(defaults);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            if let Some(category) = category {
                draft.category = category;
            }
            if let Some(difficulty) = difficulty {
                draft.difficulty = cli_difficulty(difficulty);
            }
            for entry_id in &remove {
                if !draft.remove_exercise(entry_id) {
                    bail!("Workout {id} has no planned entry '{entry_id}'.");
                }
            }
            let catalog = service.state().exercises.clone();
            for exercise_id in &add {
                draft.add_from_catalog(&catalog, exercise_id)?;
            }
            if let Some(entry_id) = entry {
                let update = PlannedExerciseUpdate {
                    sets,
                    reps,
                    weight: weight.map(|w| parse_weight_arg(w, units)).transpose()?,
                    rest_time: rest,
                    notes,
                };
                draft.update_exercise(&entry_id, update)?;
            }

            match service.update_workout(&id, &draft, Utc::now()) {
                Ok(workout) => println!("Updated workout '{}' (ID: {}).", workout.name, workout.id),
                Err(e) => bail!("Error updating workout: {e}"),
            }
        }
        cli::Commands::DeleteWorkout { id } => {
            if service.delete_workout(&id) {
                println!("Deleted workout {id}.");
            } else {
                println!("Workout {id} not found; nothing deleted.");
            }
        }

        // --- Execution ---
        cli::Commands::Run { id } => {
            if let Some(paused) = &service.state().current_workout {
                if !confirm(&format!(
                    "A paused session of workout {} will be discarded. Continue?",
                    paused.workout_id
                ))? {
                    println!("Keeping the paused session. Resume it with `gofit resume`.");
                    return Ok(());
                }
            }
            let runner = service.start_workout(&id, Utc::now())?;
            run_session(&mut service, runner)?;
        }
        cli::Commands::Resume => {
            let runner = service.resume_workout(None)?;
            run_session(&mut service, runner)?;
        }
        cli::Commands::Cancel { yes } => {
            if service.state().current_workout.is_none() {
                println!("No paused workout.");
            } else if yes || confirm("Discard the paused workout?")? {
                service.cancel_workout();
                println!("Paused workout discarded.");
            }
        }

        // --- Profile & stats ---
        cli::Commands::Profile => print_profile(&service, header_color, units),
        cli::Commands::SetProfile {
            name,
            email,
            level,
            goals,
            age,
            height,
        } => {
            let update = ProfileUpdate {
                name,
                email,
                fitness_level: level.map(cli_difficulty),
                goals: goals.map(|g| {
                    g.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                }),
                age,
                height,
            };
            match service.update_profile(update, Utc::now()) {
                Ok(user) => println!("Profile saved for {}.", user.name),
                Err(e) => bail!("Error saving profile: {e}"),
            }
        }
        cli::Commands::Stats => match &service.state().user_stats {
            None => println!("No stats yet. Finish a workout to start tracking."),
            Some(stats) if export_csv => print_weight_csv(stats, units)?,
            Some(stats) => print_stats(stats, header_color, units),
        },
        cli::Commands::LogWeight {
            weight,
            date,
            notes,
        } => {
            let timestamp = match date {
                Some(date_str) => parse_date_arg(&date_str)?,
                None => Utc::now(),
            };
            match service.log_weight(weight, timestamp, notes) {
                Ok(_) => println!(
                    "Logged weight {weight:.1} {} on {}.",
                    units.weight_label(),
                    timestamp.with_timezone(&Local).format("%Y-%m-%d")
                ),
                Err(e) => bail!("Error logging weight: {e}"),
            }
        }

        // --- Settings ---
        cli::Commands::SetUnits { units } => {
            let units = match units {
                cli::UnitsCli::Metric => Units::Metric,
                cli::UnitsCli::Imperial => Units::Imperial,
            };
            service.set_units(units)?;
            println!("Units set to {units:?}.");
        }
        cli::Commands::SetTheme { mode, color } => {
            let mode = match mode {
                cli::ThemeModeCli::Light => ThemeMode::Light,
                cli::ThemeModeCli::Dark => ThemeMode::Dark,
            };
            service.set_theme(mode, color.as_deref())?;
            println!(
                "Theme set to {mode:?} (header colour {}).",
                service.config.theme.header_color
            );
        }
        cli::Commands::SetReminders {
            notifications,
            workout,
            rest,
        } => {
            service.set_reminders(notifications, workout, rest)?;
            let c = &service.config;
            println!(
                "Notifications: {}, workout reminders: {}, rest reminders: {}",
                on_off(c.notifications),
                on_off(c.workout_reminders),
                on_off(c.rest_time_reminders)
            );
        }
        cli::Commands::SetLanguage { language } => {
            service.set_language(&language)?;
            println!("Language set to {}.", service.config.language);
        }
        cli::Commands::SetStreakInterval { days } => {
            service.set_streak_interval(days)?;
            println!("Streak interval set to {days} day(s).");
        }
        cli::Commands::ConfigPath => println!("{}", service.get_config_path().display()),
        cli::Commands::DbPath => println!("{}", service.get_db_path().display()),
        cli::Commands::Logout { yes } => {
            if yes || confirm("This deletes your profile, workouts and stats. Sign out?")? {
                service.logout().context("Failed to clear stored data")?;
                println!("Signed out. All stored data was removed.");
            }
        }
    }

    Ok(())
}

fn init_logging() {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(LOG_ENV_VAR, DEFAULT_LOG_FILTER),
    )
    .target(env_logger::Target::Stderr)
    .format_target(false)
    .init();
}

const fn cli_difficulty(d: cli::DifficultyCli) -> Difficulty {
    match d {
        cli::DifficultyCli::Beginner => Difficulty::Beginner,
        cli::DifficultyCli::Intermediate => Difficulty::Intermediate,
        cli::DifficultyCli::Advanced => Difficulty::Advanced,
    }
}

const fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// Converts a weight argument in configured units to kg.
fn parse_weight_arg(weight: f64, units: Units) -> Result<f64> {
    if !weight.is_finite() || weight < 0.0 {
        bail!("Weight must be zero or a positive number (got {weight}).");
    }
    Ok(units.weight_to_kg(weight))
}

/// Parses YYYY-MM-DD to noon UTC on that day.
fn parse_date_arg(date_str: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{date_str}', expected YYYY-MM-DD"))?;
    let naive_dt = date
        .and_hms_opt(12, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid date components: {date}"))?;
    Ok(Utc.from_utc_datetime(&naive_dt))
}

fn format_weight(kg: Option<f64>, units: Units) -> String {
    match kg {
        Some(kg) if kg > 0.0 => format!("{:.1} {}", units.weight_from_kg(kg), units.weight_label()),
        _ => "-".to_string(),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N]: ");
    stdout().flush()?;
    let mut input = String::new();
    stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

// --- Guided workout ---

enum SessionOutcome {
    Finished,
    Paused,
    Cancelled,
}

/// Raw terminal mode for single-key input, restored on drop.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Waits for a key press. `None` once `timeout` elapses without one; with no
/// timeout this blocks until a key arrives.
fn read_key(timeout: Option<Duration>) -> Result<Option<KeyCode>> {
    let _raw = RawMode::enable()?;
    let deadline = timeout.map(|t| Instant::now() + t);
    loop {
        let wait = deadline.map_or(Duration::from_secs(60), |d| {
            d.saturating_duration_since(Instant::now())
        });
        if !event::poll(wait)? {
            if deadline.is_some() {
                return Ok(None);
            }
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            // Raw mode swallows the interrupt signal
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(Some(KeyCode::Esc));
            }
            return Ok(Some(key.code));
        }
    }
}

fn confirm_key(prompt: &str) -> Result<bool> {
    print!("\n{prompt} [y/N] ");
    stdout().flush()?;
    let answer = matches!(read_key(None)?, Some(KeyCode::Char('y' | 'Y')));
    println!();
    Ok(answer)
}

/// Asks for the reps and weight actually performed; blank keeps the plan.
fn prompt_performed_set(units: Units) -> Result<PerformedSet> {
    print!("\nReps and weight ({}), e.g. \"8 62.5\", blank for plan: ", units.weight_label());
    stdout().flush()?;
    let mut input = String::new();
    stdin().read_line(&mut input)?;

    let mut parts = input.split_whitespace();
    let reps = parts
        .next()
        .map(str::parse::<u32>)
        .transpose()
        .context("Reps must be a whole number")?;
    let weight = parts
        .next()
        .map(str::parse::<f64>)
        .transpose()
        .context("Weight must be a number")?
        .map(|w| parse_weight_arg(w, units))
        .transpose()?;
    Ok(PerformedSet { reps, weight })
}

fn render_phase(runner: &WorkoutRunner, units: Units) -> Result<()> {
    let progress = runner.progress();
    let Some(planned) = runner.current_exercise() else {
        return Ok(());
    };
    match runner.phase() {
        SessionPhase::Exercising { .. } => {
            println!(
                "\n[{:>3.0}%] Exercise {}/{}: {}  set {} of {}: {} reps @ {}",
                progress.percent(),
                progress.exercise_number,
                progress.total_exercises,
                planned.exercise.name,
                progress.set_number,
                progress.total_sets,
                planned.reps,
                format_weight(planned.weight, units)
            );
            println!("  [Enter] done  [e] enter reps/weight  [p] pause  [q] quit");
        }
        SessionPhase::Resting {
            remaining_seconds, ..
        } => {
            print!(
                "\r  Rest {remaining_seconds:>3}s  next: {} set {}/{}  [Enter] skip ",
                planned.exercise.name, progress.set_number, progress.total_sets
            );
            stdout().flush()?;
        }
        SessionPhase::Finished => {}
    }
    Ok(())
}

fn run_session(service: &mut AppService, mut runner: WorkoutRunner) -> Result<()> {
    let units = service.config.units;
    let bell = service.config.rest_time_reminders;
    let workout_name = service
        .state()
        .find_workout(&runner.session().workout_id)
        .map_or_else(|| runner.session().workout_id.clone(), |w| w.name.clone());
    println!("Starting {workout_name}.");

    let mut shown: Option<SessionPhase> = None;
    let outcome = loop {
        let phase = runner.phase();
        if phase == SessionPhase::Finished {
            break SessionOutcome::Finished;
        }
        if shown != Some(phase) {
            render_phase(&runner, units)?;
            shown = Some(phase);
        }

        let timeout = runner
            .next_tick_at()
            .map(|at| at.saturating_duration_since(Instant::now()));
        match (read_key(timeout)?, phase) {
            (None, _) => {
                runner.poll_rest_timer(Instant::now());
                if phase.is_resting() && !runner.phase().is_resting() && bell {
                    print!("\x07");
                }
            }
            (Some(KeyCode::Enter | KeyCode::Char(' ')), SessionPhase::Resting { .. }) => {
                runner.skip_rest();
            }
            (Some(KeyCode::Enter | KeyCode::Char(' ')), SessionPhase::Exercising { .. }) => {
                runner.complete_set(None, Utc::now())?;
                service.record_progress(&runner);
            }
            (Some(KeyCode::Char('e')), SessionPhase::Exercising { .. }) => {
                match prompt_performed_set(units) {
                    Ok(performed) => {
                        runner.complete_set(Some(performed), Utc::now())?;
                        service.record_progress(&runner);
                    }
                    Err(e) => {
                        eprintln!("{e:#}");
                        shown = None;
                    }
                }
            }
            (Some(KeyCode::Char('p')), _) => break SessionOutcome::Paused,
            (Some(KeyCode::Char('q') | KeyCode::Esc), _) => {
                if confirm_key("Discard this workout? Nothing will be saved.")? {
                    break SessionOutcome::Cancelled;
                }
                shown = None;
            }
            _ => {}
        }
    };
    println!();

    match outcome {
        SessionOutcome::Finished => {
            let sets: usize = runner.session().exercises.iter().map(|e| e.sets.len()).sum();
            let update = service.finish_workout(runner)?;
            println!(
                "Workout complete! {sets} sets. Streak: {} day(s), total workouts: {}.",
                update.stats.current_streak, update.stats.total_workouts
            );
        }
        SessionOutcome::Paused => {
            service
                .pause_workout(&runner)
                .context("Failed to save the paused workout")?;
            println!("Paused. Continue with `gofit resume`.");
        }
        SessionOutcome::Cancelled => {
            service.cancel_workout();
            println!("Workout discarded.");
        }
    }
    Ok(())
}

// --- Output ---

fn print_home(service: &AppService, header_color: Color, units: Units) {
    let state = service.state();
    let first_name = state
        .user
        .as_ref()
        .and_then(|u| u.name.split_whitespace().next())
        .unwrap_or("there");
    let greeting = match Local::now().hour() {
        5..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    };
    println!("{greeting}, {first_name}!\n");

    let stats = state.user_stats.clone().unwrap_or_default();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Workouts").fg(header_color),
            Cell::new("Streak").fg(header_color),
            Cell::new("Minutes").fg(header_color),
        ]);
    table.add_row(vec![
        Cell::new(stats.total_workouts),
        Cell::new(stats.current_streak),
        Cell::new(stats.total_workout_time),
    ]);
    println!("{table}");

    if let Some(session) = &state.current_workout {
        let name = state
            .find_workout(&session.workout_id)
            .map_or(session.workout_id.as_str(), |w| w.name.as_str());
        println!("\nPaused workout: {name}. Continue with `gofit resume`.");
    }

    match service.todays_workout() {
        Some(workout) => {
            println!("\nToday's workout:");
            print_workout_details(workout, header_color, units);
            println!("Start it with `gofit run {}`.", workout.id);
        }
        None => println!("\nNo workouts yet. Create one with `gofit create-workout`."),
    }
}

fn print_exercise_table(exercises: &[&Exercise], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Category").fg(header_color),
            Cell::new("Muscles").fg(header_color),
            Cell::new("Equipment").fg(header_color),
            Cell::new("Difficulty").fg(header_color),
        ]);

    for exercise in exercises {
        table.add_row(vec![
            Cell::new(&exercise.id),
            Cell::new(&exercise.name).add_attribute(Attribute::Bold),
            Cell::new(&exercise.category),
            Cell::new(exercise.muscle_groups.join(", ")),
            Cell::new(exercise.equipment.join(", ")),
            Cell::new(exercise.difficulty),
        ]);
    }
    println!("{table}");
}

fn print_exercises_csv(exercises: &[&Exercise]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["ID", "Name", "Category", "Muscles", "Equipment", "Difficulty"])?;
    for exercise in exercises {
        writer.write_record([
            exercise.id.clone(),
            exercise.name.clone(),
            exercise.category.clone(),
            exercise.muscle_groups.join(";"),
            exercise.equipment.join(";"),
            exercise.difficulty.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_workout_table(workouts: &[&Workout], header_color: Color) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").fg(header_color),
            Cell::new("Name").fg(header_color),
            Cell::new("Category").fg(header_color),
            Cell::new("Difficulty").fg(header_color),
            Cell::new("Exercises").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Est. min").fg(header_color),
        ]);

    for workout in workouts {
        table.add_row(vec![
            Cell::new(&workout.id),
            Cell::new(&workout.name).add_attribute(Attribute::Bold),
            Cell::new(&workout.category),
            Cell::new(workout.difficulty),
            Cell::new(workout.exercises.len()),
            Cell::new(workout.total_sets()),
            Cell::new(workout.duration.map_or("-".to_string(), |d| d.to_string())),
        ]);
    }
    println!("{table}");
}

fn print_workouts_csv(workouts: &[&Workout]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "ID",
        "Name",
        "Category",
        "Difficulty",
        "Exercises",
        "Sets",
        "Duration_min",
        "Created_Local",
    ])?;
    for workout in workouts {
        writer.write_record([
            workout.id.clone(),
            workout.name.clone(),
            workout.category.clone(),
            workout.difficulty.to_string(),
            workout.exercises.len().to_string(),
            workout.total_sets().to_string(),
            workout.duration.map(|d| d.to_string()).unwrap_or_default(),
            workout.created_at.with_timezone(&Local).to_rfc3339(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn print_workout_details(workout: &Workout, header_color: Color, units: Units) {
    println!(
        "{} (ID: {})  {} | {} | about {} min",
        workout.name,
        workout.id,
        workout.category,
        workout.difficulty,
        workout.duration.unwrap_or(0)
    );
    if let Some(description) = &workout.description {
        println!("{description}");
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Entry").fg(header_color),
            Cell::new("Exercise").fg(header_color),
            Cell::new("Sets").fg(header_color),
            Cell::new("Reps").fg(header_color),
            Cell::new(format!("Weight ({})", units.weight_label())).fg(header_color),
            Cell::new("Rest (s)").fg(header_color),
            Cell::new("Notes").fg(header_color),
        ]);
    for planned in &workout.exercises {
        table.add_row(vec![
            Cell::new(&planned.id),
            Cell::new(&planned.exercise.name),
            Cell::new(planned.sets),
            Cell::new(planned.reps),
            Cell::new(format_weight(planned.weight, units)),
            Cell::new(planned.rest_time),
            Cell::new(planned.notes.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}");

    let media: Vec<_> = workout
        .exercises
        .iter()
        .filter_map(|planned| Some((&planned.exercise.name, planned.exercise.media_url()?)))
        .collect();
    if !media.is_empty() {
        println!("Demonstrations:");
        for (name, url) in media {
            println!("  {name}: {url}");
        }
    }
}

fn print_profile(service: &AppService, header_color: Color, units: Units) {
    let Some(user) = &service.state().user else {
        println!("No profile yet. Create one with `gofit set-profile --name <NAME>`.");
        return;
    };

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Profile").fg(header_color),
            Cell::new("").fg(header_color),
        ]);
    let rows = [
        ("Name", user.name.clone()),
        ("Email", user.email.clone()),
        ("Level", user.fitness_level.to_string()),
        ("Goals", user.goals.join(", ")),
        ("Age", user.age.map(|a| a.to_string()).unwrap_or_default()),
        ("Weight", format_weight(user.weight, units)),
        (
            "Height",
            user.height.map(|h| format!("{h:.0} cm")).unwrap_or_default(),
        ),
        ("Workouts", user.total_workouts.to_string()),
        ("Streak", user.workout_streak.to_string()),
        (
            "Last workout",
            user.last_workout
                .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Member since",
            user.created_at.with_timezone(&Local).format("%Y-%m-%d").to_string(),
        ),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    println!("{table}");
}

fn print_stats(stats: &UserStats, header_color: Color, units: Units) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Statistic").fg(header_color),
            Cell::new("Value").fg(header_color),
        ]);
    let rows = [
        ("Total workouts", stats.total_workouts.to_string()),
        ("Total time", format!("{} min", stats.total_workout_time)),
        (
            "Average duration",
            format!("{} min", stats.average_workout_duration),
        ),
        ("Current streak", format!("{} day(s)", stats.current_streak)),
        ("Longest streak", format!("{} day(s)", stats.longest_streak)),
        ("Favourite exercises", stats.favorite_exercises.join(", ")),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    println!("{table}");

    if stats.weight_progress.is_empty() {
        println!("No weight entries yet. Add one with `gofit log-weight`.");
        return;
    }
    let mut weights = Table::new();
    weights
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Date").fg(header_color),
            Cell::new(format!("Weight ({})", units.weight_label())).fg(header_color),
            Cell::new("Notes").fg(header_color),
        ]);
    for entry in &stats.weight_progress {
        weights.add_row(vec![
            Cell::new(entry.date.with_timezone(&Local).format("%Y-%m-%d")),
            Cell::new(format!("{:.1}", units.weight_from_kg(entry.weight))),
            Cell::new(entry.notes.as_deref().unwrap_or("")),
        ]);
    }
    println!("{weights}");
}

fn print_weight_csv(stats: &UserStats, units: Units) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    let weight_header = format!("Weight_{}", units.weight_label());
    writer.write_record(["Date_Local", weight_header.as_str(), "Notes"])?;
    for entry in &stats.weight_progress {
        writer.write_record([
            entry.date.with_timezone(&Local).to_rfc3339(),
            format!("{:.2}", units.weight_from_kg(entry.weight)),
            entry.notes.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
