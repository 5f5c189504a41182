//! strengthy - Personal strength training log

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use strengthy::config::{DEFAULT_DB_PATH, DEFAULT_OWNER, Settings};
use strengthy::db::{CardioSet, Database, NewCardioSet, NewSet, SetPatch, Workout, WorkoutSet};
use strengthy::exercises::{MuscleGroup, find_library_exercise, get_library, library_by_group};
use strengthy::pr::{
    self, CardioInput, CardioMode, HistoricalMaxima, PrPolicy, RawSet, SetInput, SetType,
};
use strengthy::units::WeightUnit;

#[derive(Parser)]
#[command(name = "strengthy")]
#[command(author, version, about = "Personal strength training log with PR detection")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "STRENGTHY_DB", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Whose training log to use
    #[arg(long, global = true, env = "STRENGTHY_OWNER", default_value = DEFAULT_OWNER)]
    owner: String,

    /// Preferred weight unit (kg or lbs)
    #[arg(long, global = true, env = "STRENGTHY_UNIT", default_value = "kg")]
    unit_pref: String,

    /// Let the very first set of an exercise count as a record
    #[arg(long, global = true, env = "STRENGTHY_FIRST_SET_PR")]
    first_set_pr: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a strength set
    Log {
        /// Exercise name (created on first use)
        exercise: String,

        #[command(flatten)]
        set: SetArgs,

        /// Workout to add to (defaults to the active one)
        #[arg(long)]
        workout: Option<i64>,

        /// Explicit set number
        #[arg(long)]
        set_number: Option<u32>,
    },

    /// Change a logged set and re-check records
    Edit {
        set_id: i64,

        #[command(flatten)]
        changes: EditArgs,
    },

    /// Mark a set as completed
    Done { set_id: i64 },

    /// Mark a set as not completed
    Undone { set_id: i64 },

    /// Delete a set
    Delete { set_id: i64 },

    /// Log a cardio entry
    Cardio {
        /// Exercise name, e.g. "Treadmill"
        exercise: String,

        /// treadmill, bike, elliptical, stairs or row (guessed from the library)
        #[arg(short, long)]
        mode: Option<String>,

        /// Duration in seconds
        #[arg(short, long)]
        duration: u32,

        /// Distance in meters
        #[arg(long)]
        distance: Option<f64>,

        #[arg(long)]
        floors: Option<u32>,

        #[arg(long)]
        level: Option<f64>,

        /// Seconds per 500 m
        #[arg(long)]
        split: Option<f64>,

        /// Strokes per minute
        #[arg(long)]
        spm: Option<f64>,

        #[arg(long)]
        workout: Option<i64>,
    },

    /// Manage workouts
    Workout {
        #[command(subcommand)]
        action: WorkoutAction,
    },

    /// Show all sets logged for an exercise
    History {
        exercise: String,

        /// Number of sets to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show current personal bests for an exercise
    Prs { exercise: String },

    /// List your exercises
    Exercises,

    /// Add a custom exercise
    AddExercise {
        name: String,

        /// Muscle group (chest, back, quads, ...)
        #[arg(short, long, default_value = "other")]
        group: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Browse the built-in exercise library
    Library {
        /// Filter by muscle group
        group: Option<String>,
    },

    /// Evaluate a set given as JSON, without touching the database
    Evaluate {
        /// Set as JSON, e.g. '{"reps": 5, "weight": 100, "unit": "kg"}'
        #[arg(long)]
        set: String,

        /// JSON file with an array of prior sets
        #[arg(long)]
        history: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum WorkoutAction {
    /// Start a workout
    Start {
        #[arg(default_value = "Workout")]
        name: String,

        /// Date (YYYY-MM-DD), today by default
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Finish the active (or given) workout
    End { id: Option<i64> },

    /// List recent workouts
    List {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show a workout with its sets
    Show { id: Option<i64> },
}

#[derive(clap::Args)]
struct SetArgs {
    #[arg(short, long, allow_negative_numbers = true)]
    reps: i64,

    /// Partial reps (0-5), each worth half a rep
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    half_reps: i64,

    /// Weight (omit for bodyweight)
    #[arg(short, long, allow_negative_numbers = true)]
    weight: Option<f64>,

    /// kg or lbs (defaults to the preferred unit)
    #[arg(short, long)]
    unit: Option<String>,

    /// W (warm-up), S (standard), F (failure) or D (drop set)
    #[arg(short = 't', long = "type", default_value = "S")]
    set_type: String,

    /// Rate of perceived exertion (0-10)
    #[arg(long)]
    rpe: Option<f64>,
}

/// Only the flags given on the command line change the set
#[derive(clap::Args)]
struct EditArgs {
    #[arg(short, long, allow_negative_numbers = true)]
    reps: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    half_reps: Option<i64>,

    #[arg(short, long, allow_negative_numbers = true)]
    weight: Option<f64>,

    #[arg(short, long)]
    unit: Option<String>,

    #[arg(short = 't', long = "type")]
    set_type: Option<String>,

    #[arg(long)]
    rpe: Option<f64>,
}

impl EditArgs {
    fn to_patch(&self) -> Result<SetPatch> {
        Ok(SetPatch {
            reps: self.reps,
            half_reps: self.half_reps,
            weight: self.weight,
            unit: self.unit.as_deref().map(|u| WeightUnit::from_tag(Some(u))),
            set_type: self.set_type.as_deref().map(SetType::parse).transpose()?,
            rpe: self.rpe,
        })
    }
}

impl SetArgs {
    fn to_input(&self, settings: &Settings) -> Result<SetInput> {
        let input = SetInput::new(
            self.reps,
            self.half_reps,
            self.weight,
            settings.unit_or_default(self.unit.as_deref()),
        )?
        .with_set_type(SetType::parse(&self.set_type)?);
        Ok(input)
    }
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings {
        db_path: cli.db,
        owner: cli.owner,
        weight_unit: WeightUnit::from_tag(Some(&cli.unit_pref)),
        pr_policy: PrPolicy { first_set_counts_as_pr: cli.first_set_pr },
    };

    if let Commands::Evaluate { set, history } = &cli.command {
        return evaluate_json(set, history.as_ref(), &settings);
    }
    if let Commands::Library { group } = &cli.command {
        print_library(group.as_deref());
        return Ok(());
    }

    let mut db = Database::open(&settings.db_path)?;

    match cli.command {
        Commands::Log { exercise, set, workout, set_number } => {
            let exercise = db.get_or_create_exercise(&settings.owner, &exercise)?;
            let workout_id = resolve_workout(&db, &settings, workout)?;
            let new = NewSet {
                workout_id,
                exercise_id: exercise.id,
                input: set.to_input(&settings)?,
                set_number,
                rpe: set.rpe,
            };
            let stored = db.create_set(&new, settings.pr_policy)?;
            println!("Logged: {} - {}", exercise.name, describe_set(&stored));
            print_celebration(&stored);
        }

        Commands::Edit { set_id, changes } => {
            let stored = db.edit_set(&settings.owner, set_id, &changes.to_patch()?, settings.pr_policy)?;
            println!("Updated: {}", describe_set(&stored));
            print_celebration(&stored);
        }

        Commands::Done { set_id } => {
            db.set_completed(&settings.owner, set_id, true)?;
            println!("Set {} completed", set_id);
        }

        Commands::Undone { set_id } => {
            db.set_completed(&settings.owner, set_id, false)?;
            println!("Set {} reopened", set_id);
        }

        Commands::Delete { set_id } => {
            db.delete_set(&settings.owner, set_id)?;
            println!("Set {} deleted", set_id);
        }

        Commands::Cardio { exercise, mode, duration, distance, floors, level, split, spm, workout } => {
            let mode = match mode {
                Some(m) => CardioMode::parse(&m)?,
                None => find_library_exercise(&exercise)
                    .and_then(|e| e.cardio_mode)
                    .with_context(|| format!("no cardio mode known for {:?}, pass --mode", exercise))?,
            };
            let exercise = db.get_or_create_exercise(&settings.owner, &exercise)?;
            let workout_id = resolve_workout(&db, &settings, workout)?;
            let new = NewCardioSet {
                workout_id,
                exercise_id: exercise.id,
                input: CardioInput {
                    distance_meters: distance,
                    floors,
                    level,
                    split_seconds: split,
                    spm,
                    ..CardioInput::new(mode, duration)
                },
            };
            let stored = db.create_cardio_set(&new, settings.pr_policy)?;
            println!("Logged: {} - {}", exercise.name, describe_cardio(&stored));
        }

        Commands::Workout { action } => run_workout_action(&db, &settings, action)?,

        Commands::History { exercise, limit } => {
            let Some(exercise) = db.find_exercise(&settings.owner, &exercise)? else {
                bail!("no exercise named {:?}", exercise);
            };
            let sets = db.exercise_history(&settings.owner, exercise.id)?;
            println!("{} history:", exercise.name);
            println!("{:-<60}", "");
            for set in sets.iter().take(limit) {
                println!("workout {:>4} | {}", set.workout_id, describe_set(set));
            }
        }

        Commands::Prs { exercise } => {
            let Some(exercise) = db.find_exercise(&settings.owner, &exercise)? else {
                bail!("no exercise named {:?}", exercise);
            };
            let bests = db.personal_bests(&settings.owner, exercise.id)?;
            print_bests(&exercise.name, &bests, &settings);
        }

        Commands::Exercises => {
            let exercises = db.list_exercises(&settings.owner)?;
            println!("Your exercises:");
            println!("{:-<60}", "");
            for ex in exercises {
                println!(
                    "{:>4} | {:35} | {:10} | {}",
                    ex.id,
                    ex.name,
                    ex.muscle_group,
                    if ex.custom { "custom" } else { "-" }
                );
            }
        }

        Commands::AddExercise { name, group, description } => {
            let id = db.create_exercise(
                &settings.owner,
                &name,
                MuscleGroup::parse(&group),
                description.as_deref(),
                true,
            )?;
            println!("Added: {} (id: {})", name, id);
        }

        Commands::Evaluate { .. } | Commands::Library { .. } => {}
    }

    Ok(())
}

/// Explicit workout, else the active one, else a fresh one for today
fn resolve_workout(db: &Database, settings: &Settings, workout: Option<i64>) -> Result<i64> {
    if let Some(id) = workout {
        return Ok(id);
    }
    if let Some(active) = db.active_workout(&settings.owner)? {
        return Ok(active.id);
    }
    let today = Local::now().date_naive();
    let id = db.start_workout(&settings.owner, "Workout", today)?;
    println!("Started workout {} for {}", id, today);
    Ok(id)
}

fn run_workout_action(db: &Database, settings: &Settings, action: WorkoutAction) -> Result<()> {
    match action {
        WorkoutAction::Start { name, date } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let id = db.start_workout(&settings.owner, &name, date)?;
            println!("Started: {} on {} (id: {})", name, date, id);
        }

        WorkoutAction::End { id } => {
            let workout = find_workout(db, settings, id)?;
            db.end_workout(workout.id)?;
            println!("Finished: {} (id: {})", workout.name, workout.id);
        }

        WorkoutAction::List { limit } => {
            println!("Recent workouts:");
            println!("{:-<60}", "");
            for w in db.list_workouts(&settings.owner, limit)? {
                println!(
                    "{:>4} | {} | {:25} | {}",
                    w.id,
                    w.date,
                    w.name,
                    if w.ended_at.is_some() { "done" } else { "in progress" }
                );
            }
        }

        WorkoutAction::Show { id } => {
            let workout = find_workout(db, settings, id)?;
            println!("{} - {} (id: {})", workout.date, workout.name, workout.id);
            if let Some(notes) = &workout.notes {
                println!("{}", notes);
            }
            println!("{:-<60}", "");
            for set in db.sets_for_workout(workout.id)? {
                let name = db
                    .get_exercise(set.exercise_id)?
                    .map(|e| e.name)
                    .unwrap_or_default();
                println!("{:25} | {}", name, describe_set(&set));
            }
            for entry in db.cardio_sets_for_workout(workout.id)? {
                println!("{:25} | {}", "cardio", describe_cardio(&entry));
            }
        }
    }
    Ok(())
}

fn find_workout(db: &Database, settings: &Settings, id: Option<i64>) -> Result<Workout> {
    let workout = match id {
        Some(id) => db.get_workout(id)?,
        None => db.active_workout(&settings.owner)?,
    };
    let workout = workout.context("no such workout (and no active workout)")?;
    if workout.owner != settings.owner {
        bail!("workout {} belongs to someone else", workout.id);
    }
    Ok(workout)
}

fn describe_set(set: &WorkoutSet) -> String {
    let weight = match set.input.weight {
        Some(w) => format!("{} {}", w, set.input.unit),
        None => "bodyweight".to_string(),
    };
    let half = if set.input.half_reps > 0 {
        format!(" +{} half", set.input.half_reps)
    } else {
        String::new()
    };
    let flags = if set.is_pr { " PR" } else { "" };
    let done = if set.completed { " ✓" } else { "" };
    format!(
        "#{} [{}] {} x {}{}{}{} (id: {})",
        set.set_number,
        set.input.set_type.code(),
        weight,
        set.input.reps,
        half,
        flags,
        done,
        set.id
    )
}

fn describe_cardio(entry: &CardioSet) -> String {
    let mut parts = vec![format!("{} {}s", entry.input.mode, entry.input.duration_seconds)];
    if let Some(d) = entry.input.distance_meters {
        parts.push(format!("{:.0} m", d));
    }
    if let Some(f) = entry.input.floors {
        parts.push(format!("{} floors", f));
    }
    if let Some(s) = entry.input.split_seconds {
        parts.push(format!("{:.1}s/500m", s));
    }
    if entry.is_pr {
        parts.push("PR".to_string());
    }
    format!("{} (id: {})", parts.join(", "), entry.id)
}

fn print_celebration(set: &WorkoutSet) {
    let celebrations = set.flags.celebrations();
    if celebrations.is_empty() {
        return;
    }
    let labels: Vec<&str> = celebrations.iter().map(|c| c.label()).collect();
    println!("New personal record: {}!", labels.join(", "));
}

fn print_bests(name: &str, bests: &HistoricalMaxima, settings: &Settings) {
    println!("{} personal bests ({} working sets)", name, bests.qualifying_sets);
    println!("{:-<40}", "");
    let kg = |v: f64| HistoricalMaxima::best(v).map(|v| settings.display_kg(v));
    let none = || "-".to_string();
    println!("Heaviest weight: {}", kg(bests.weight_kg).unwrap_or_else(none));
    println!("Estimated 1RM:   {}", kg(bests.e1rm).unwrap_or_else(none));
    println!(
        "Best volume:     {}",
        HistoricalMaxima::best(bests.volume)
            .map(|v| format!("{:.0} {}", settings.weight_unit.kg_in_unit(v), settings.weight_unit))
            .unwrap_or_else(none)
    );
    println!(
        "Most reps:       {}",
        HistoricalMaxima::best(bests.reps).map(|r| r.to_string()).unwrap_or_else(none)
    );
}

fn print_library(group: Option<&str>) {
    let entries = match group {
        Some(g) => library_by_group(MuscleGroup::parse(g)),
        None => get_library().iter().collect(),
    };
    for ex in entries {
        println!("{:35} | {:10} | {:?}", ex.name, ex.group, ex.equipment);
    }
}

fn evaluate_json(set: &str, history: Option<&PathBuf>, settings: &Settings) -> Result<()> {
    let raw: RawSet = serde_json::from_str(set).context("invalid set JSON")?;

    let prior: Vec<RawSet> = match history {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&text).context("invalid history JSON")?
        }
        None => Vec::new(),
    };

    let result = pr::evaluate_raw(raw, prior, settings.pr_policy)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
