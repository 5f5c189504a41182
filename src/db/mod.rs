//! Database module - SQLite storage for exercises, workouts and sets

mod sets;

pub use sets::{CardioSet, NewCardioSet, NewSet, SetPatch, SetUpdate, WorkoutSet};

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::exercises::{MuscleGroup, find_library_exercise};

/// Exercise owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseRecord {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub muscle_group: MuscleGroup,
    pub description: Option<String>,
    /// Created explicitly by the user rather than implicitly while logging
    pub custom: bool,
    pub created_at: DateTime<Utc>,
}

/// Workout session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database {}", path.display()))?;
        Self::with_connection(conn)
    }

    /// Private database that lives as long as the value (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                name TEXT NOT NULL COLLATE NOCASE,
                muscle_group TEXT NOT NULL,
                description TEXT,
                custom INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE (owner, name)
            );

            CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                date TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL,
                ended_at TEXT
            );

            CREATE TABLE IF NOT EXISTS workout_sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
                exercise_id INTEGER NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
                set_number INTEGER NOT NULL,
                reps INTEGER NOT NULL,
                half_reps INTEGER NOT NULL DEFAULT 0,
                weight REAL,
                unit TEXT NOT NULL DEFAULT 'kg',
                set_type TEXT NOT NULL DEFAULT 'S',
                rpe REAL,
                is_pr INTEGER NOT NULL DEFAULT 0,
                is_abs_weight_pr INTEGER NOT NULL DEFAULT 0,
                is_e1rm_pr INTEGER NOT NULL DEFAULT 0,
                is_volume_pr INTEGER NOT NULL DEFAULT 0,
                is_rep_pr INTEGER NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE (workout_id, exercise_id, set_number)
            );

            CREATE TABLE IF NOT EXISTS cardio_sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
                exercise_id INTEGER NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
                set_number INTEGER NOT NULL DEFAULT 1,
                mode TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                distance_meters REAL,
                floors INTEGER,
                level REAL,
                split_seconds REAL,
                spm REAL,
                is_pr INTEGER NOT NULL DEFAULT 0,
                is_distance_pr INTEGER NOT NULL DEFAULT 0,
                is_pace_pr INTEGER NOT NULL DEFAULT 0,
                is_ascent_pr INTEGER NOT NULL DEFAULT 0,
                is_intensity_pr INTEGER NOT NULL DEFAULT 0,
                is_split_pr INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE (workout_id, exercise_id, set_number)
            );

            CREATE INDEX IF NOT EXISTS idx_workouts_owner ON workouts(owner);
            CREATE INDEX IF NOT EXISTS idx_workout_sets_exercise ON workout_sets(exercise_id);",
        )?;

        // Migration: databases created before half reps were tracked
        let has_half_reps: bool = self.conn
            .prepare("SELECT half_reps FROM workout_sets LIMIT 1")
            .is_ok();
        if !has_half_reps {
            debug!("Adding half_reps column to workout_sets");
            self.conn.execute(
                "ALTER TABLE workout_sets ADD COLUMN half_reps INTEGER NOT NULL DEFAULT 0",
                [],
            )?;
        }

        Ok(())
    }

    // ---------------------------------------------------------------------
    // Exercises
    // ---------------------------------------------------------------------

    /// Add an exercise; names are unique per owner (case-insensitive)
    pub fn create_exercise(
        &self,
        owner: &str,
        name: &str,
        muscle_group: MuscleGroup,
        description: Option<&str>,
        custom: bool,
    ) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            bail!("exercise name must not be empty");
        }
        if self.find_exercise(owner, name)?.is_some() {
            bail!("You already have an exercise named {:?}", name);
        }

        self.conn.execute(
            "INSERT INTO exercises (owner, name, muscle_group, description, custom, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                owner,
                name,
                muscle_group.as_str(),
                description,
                custom,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find owner's exercise by name
    pub fn find_exercise(&self, owner: &str, name: &str) -> Result<Option<ExerciseRecord>> {
        let exercise = self.conn
            .query_row(
                "SELECT id, owner, name, muscle_group, description, custom, created_at FROM exercises WHERE owner = ?1 AND name = ?2",
                params![owner, name.trim()],
                exercise_from_row,
            )
            .optional()?;
        Ok(exercise)
    }

    pub fn get_exercise(&self, id: i64) -> Result<Option<ExerciseRecord>> {
        let exercise = self.conn
            .query_row(
                "SELECT id, owner, name, muscle_group, description, custom, created_at FROM exercises WHERE id = ?1",
                [id],
                exercise_from_row,
            )
            .optional()?;
        Ok(exercise)
    }

    /// Look up an exercise by name, creating it when the owner doesn't
    /// have one yet. New exercises take their muscle group from the library.
    pub fn get_or_create_exercise(&self, owner: &str, name: &str) -> Result<ExerciseRecord> {
        if let Some(existing) = self.find_exercise(owner, name)? {
            return Ok(existing);
        }

        let group = find_library_exercise(name)
            .map(|e| e.group)
            .unwrap_or(MuscleGroup::Other);
        let id = self.create_exercise(owner, name, group, None, false)?;
        info!("Created exercise {:?} ({}) for {}", name.trim(), group, owner);

        self.get_exercise(id)?
            .with_context(|| format!("exercise {} vanished after insert", id))
    }

    /// All exercises of an owner, by name
    pub fn list_exercises(&self, owner: &str) -> Result<Vec<ExerciseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, name, muscle_group, description, custom, created_at FROM exercises WHERE owner = ?1 ORDER BY name"
        )?;

        let exercises = stmt
            .query_map([owner], exercise_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(exercises)
    }

    // ---------------------------------------------------------------------
    // Workouts
    // ---------------------------------------------------------------------

    /// Start a new workout
    pub fn start_workout(&self, owner: &str, name: &str, date: NaiveDate) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO workouts (owner, name, date, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![owner, name, date.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Mark a workout as finished
    pub fn end_workout(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE workouts SET ended_at = ?1 WHERE id = ?2",
            params![Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            bail!("workout {} not found", id);
        }
        Ok(())
    }

    pub fn set_workout_notes(&self, id: i64, notes: Option<&str>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE workouts SET notes = ?1 WHERE id = ?2",
            params![notes, id],
        )?;
        if changed == 0 {
            bail!("workout {} not found", id);
        }
        Ok(())
    }

    pub fn get_workout(&self, id: i64) -> Result<Option<Workout>> {
        let workout = self.conn
            .query_row(
                "SELECT id, owner, name, date, notes, created_at, ended_at FROM workouts WHERE id = ?1",
                [id],
                workout_from_row,
            )
            .optional()?;
        Ok(workout)
    }

    /// Owner's workouts, newest first
    pub fn list_workouts(&self, owner: &str, limit: usize) -> Result<Vec<Workout>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner, name, date, notes, created_at, ended_at FROM workouts WHERE owner = ?1 ORDER BY date DESC, created_at DESC, id DESC LIMIT ?2"
        )?;

        let workouts = stmt
            .query_map(params![owner, limit as i64], workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(workouts)
    }

    /// Latest workout that hasn't been ended yet
    pub fn active_workout(&self, owner: &str) -> Result<Option<Workout>> {
        let workout = self.conn
            .query_row(
                "SELECT id, owner, name, date, notes, created_at, ended_at FROM workouts WHERE owner = ?1 AND ended_at IS NULL ORDER BY created_at DESC, id DESC LIMIT 1",
                [owner],
                workout_from_row,
            )
            .optional()?;
        Ok(workout)
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<ExerciseRecord> {
    let group: String = row.get(3)?;
    let created_at: String = row.get(6)?;
    Ok(ExerciseRecord {
        id: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        muscle_group: MuscleGroup::parse(&group),
        description: row.get(4)?,
        custom: row.get(5)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn workout_from_row(row: &Row<'_>) -> rusqlite::Result<Workout> {
    let date: String = row.get(3)?;
    let created_at: String = row.get(5)?;
    let ended_at: Option<String> = row.get(6)?;
    Ok(Workout {
        id: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .unwrap_or_else(|_| Utc::now().date_naive()),
        notes: row.get(4)?,
        created_at: parse_timestamp(&created_at),
        ended_at: ended_at.as_deref().map(parse_timestamp),
    })
}
