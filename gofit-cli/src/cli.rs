// src/cli.rs
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan, run and track your workouts", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print lists as CSV instead of tables
    #[arg(long = "csv", global = true)]
    pub export_csv: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DifficultyCli {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitsCli {
    Metric,
    Imperial,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeModeCli {
    Light,
    Dark,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Greeting, quick stats and today's workout
    Home,
    /// Browse the exercise catalog
    Exercises {
        /// Only exercises in this category (e.g., "Chest")
        #[arg(short, long)]
        category: Option<String>,
        /// Only exercises working this muscle (e.g., "triceps")
        #[arg(short, long)]
        muscle: Option<String>,
        /// Name contains this text
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List workout plans
    Workouts {
        #[arg(short, long, value_enum)]
        difficulty: Option<DifficultyCli>,
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show one workout plan with its exercises
    ShowWorkout { id: String },
    /// Build a new workout plan from catalog exercises
    CreateWorkout {
        #[arg(short, long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Defaults to "General"
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long, value_enum, default_value = "beginner")]
        difficulty: DifficultyCli,
        /// Catalog exercise id to add; repeat for more exercises
        #[arg(short, long = "exercise", required = true)]
        exercises: Vec<String>,
        /// Sets for every added exercise (default from config)
        #[arg(short, long)]
        sets: Option<u32>,
        /// Reps for every added exercise (default from config)
        #[arg(short, long)]
        reps: Option<u32>,
        /// Weight for every added exercise, in configured units
        #[arg(short, long)]
        weight: Option<f64>,
        /// Rest between sets in seconds (default from config)
        #[arg(long)]
        rest: Option<u32>,
    },
    /// Change a workout plan
    EditWorkout {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long, value_enum)]
        difficulty: Option<DifficultyCli>,
        /// Catalog exercise id to append; repeatable
        #[arg(long)]
        add: Vec<String>,
        /// Planned entry id to remove (see show-workout); repeatable
        #[arg(long)]
        remove: Vec<String>,
        /// Planned entry id that --sets/--reps/--weight/--rest/--notes apply to
        #[arg(long)]
        entry: Option<String>,
        #[arg(short, long, requires = "entry")]
        sets: Option<u32>,
        #[arg(short, long, requires = "entry")]
        reps: Option<u32>,
        /// In configured units
        #[arg(short, long, requires = "entry")]
        weight: Option<f64>,
        #[arg(long, requires = "entry")]
        rest: Option<u32>,
        #[arg(long, requires = "entry")]
        notes: Option<String>,
    },
    DeleteWorkout { id: String },
    /// Run a workout with guided sets and rest countdown
    Run { id: String },
    /// Continue the paused workout
    Resume,
    /// Discard the paused workout
    Cancel {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the user profile
    Profile,
    /// Create or edit the user profile
    SetProfile {
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        #[arg(short, long, value_enum)]
        level: Option<DifficultyCli>,
        /// Comma-separated goals (e.g., "Build muscle,Run 10k")
        #[arg(short, long)]
        goals: Option<String>,
        #[arg(short, long)]
        age: Option<u32>,
        /// Height in cm
        #[arg(long)]
        height: Option<f64>,
    },
    /// Workout totals, streaks and weight progress
    Stats,
    /// Record body weight in configured units
    LogWeight {
        weight: f64,
        /// Date of the measurement (YYYY-MM-DD), default today
        #[arg(short, long)]
        date: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
    },
    SetUnits {
        #[arg(value_enum)]
        units: UnitsCli,
    },
    SetTheme {
        #[arg(value_enum)]
        mode: ThemeModeCli,
        /// Table header colour (e.g., "Cyan", "DarkGreen")
        #[arg(short, long)]
        color: Option<String>,
    },
    SetReminders {
        #[arg(long)]
        notifications: Option<bool>,
        #[arg(long)]
        workout: Option<bool>,
        /// Ring the terminal bell when a rest is over
        #[arg(long)]
        rest: Option<bool>,
    },
    SetLanguage { language: String },
    /// Days allowed between workouts before a streak breaks
    SetStreakInterval { days: u32 },
    /// Show the path to the config file
    ConfigPath,
    /// Show the path to the data store
    DbPath,
    /// Delete all stored data
    Logout {
        #[arg(short, long)]
        yes: bool,
    },
    /// Generate a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
