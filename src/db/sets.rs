//! Set storage - strength and cardio sets with PR flags
//!
//! Creating or updating a set reads the owner's history for the exercise,
//! evaluates the new values and writes the flags in one immediate
//! transaction, so two writers can't both claim the same record.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Database, parse_timestamp};
use crate::pr::cardio::evaluate_cardio;
use crate::pr::input::{LooseNumber, validate_rpe};
use crate::pr::{
    CardioFlags, CardioInput, CardioMode, HistoricalMaxima, PrFlags, PrPolicy, RawSet, SetInput,
    SetType, ValidationError, evaluate_against,
};
use crate::units::WeightUnit;

/// Stored strength set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub set_number: u32,
    #[serde(flatten)]
    pub input: SetInput,
    pub rpe: Option<f64>,
    #[serde(flatten)]
    pub flags: PrFlags,
    pub is_pr: bool,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Strength set to be logged
#[derive(Debug, Clone, PartialEq)]
pub struct NewSet {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub input: SetInput,
    /// Next free number for the workout and exercise when `None`
    pub set_number: Option<u32>,
    pub rpe: Option<f64>,
}

/// New values for an existing strength set
#[derive(Debug, Clone, PartialEq)]
pub struct SetUpdate {
    pub input: SetInput,
    pub rpe: Option<f64>,
}

/// Fields to change on a stored set; `None` keeps what is stored
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetPatch {
    pub reps: Option<i64>,
    pub half_reps: Option<i64>,
    pub weight: Option<f64>,
    pub unit: Option<WeightUnit>,
    pub set_type: Option<SetType>,
    pub rpe: Option<f64>,
}

impl SetPatch {
    /// Merge over the stored set, validating the result like fresh input
    pub fn apply(&self, current: &WorkoutSet) -> Result<SetUpdate, ValidationError> {
        let input = SetInput::new(
            self.reps.unwrap_or(i64::from(current.input.reps)),
            self.half_reps.unwrap_or(i64::from(current.input.half_reps)),
            self.weight.or(current.input.weight),
            self.unit.unwrap_or(current.input.unit),
        )?
        .with_set_type(self.set_type.unwrap_or(current.input.set_type));

        Ok(SetUpdate { input, rpe: self.rpe.or(current.rpe) })
    }
}

/// Stored cardio entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardioSet {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub set_number: u32,
    #[serde(flatten)]
    pub input: CardioInput,
    #[serde(flatten)]
    pub flags: CardioFlags,
    pub is_pr: bool,
    pub created_at: DateTime<Utc>,
}

/// Cardio entry to be logged
#[derive(Debug, Clone, PartialEq)]
pub struct NewCardioSet {
    pub workout_id: i64,
    pub exercise_id: i64,
    pub input: CardioInput,
}

const SET_COLUMNS: &str = "s.id, s.workout_id, s.exercise_id, s.set_number, s.reps, s.half_reps, s.weight, s.unit, s.set_type, s.rpe, s.is_abs_weight_pr, s.is_e1rm_pr, s.is_volume_pr, s.is_rep_pr, s.is_pr, s.completed, s.created_at";

const CARDIO_COLUMNS: &str = "c.id, c.workout_id, c.exercise_id, c.set_number, c.mode, c.duration_seconds, c.distance_meters, c.floors, c.level, c.split_seconds, c.spm, c.is_distance_pr, c.is_pace_pr, c.is_ascent_pr, c.is_intensity_pr, c.is_split_pr, c.is_pr, c.created_at";

impl Database {
    // ---------------------------------------------------------------------
    // Strength sets
    // ---------------------------------------------------------------------

    /// Log a set: assign its number, evaluate PRs against the owner's
    /// history for the exercise and store it with the flags
    pub fn create_set(&mut self, new: &NewSet, policy: PrPolicy) -> Result<WorkoutSet> {
        let rpe = validate_rpe(new.rpe)?;
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let owner = owner_for(&tx, new.workout_id, new.exercise_id)?;
        let set_number = match new.set_number {
            Some(n) => n,
            None => next_set_number(&tx, "workout_sets", new.workout_id, new.exercise_id)?,
        };

        let maxima = strength_maxima(&tx, &owner, new.exercise_id, None)?;
        let flags = evaluate_against(&new.input, &maxima, policy);

        tx.execute(
            "INSERT INTO workout_sets (workout_id, exercise_id, set_number, reps, half_reps, weight, unit, set_type, rpe, is_pr, is_abs_weight_pr, is_e1rm_pr, is_volume_pr, is_rep_pr, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                new.workout_id,
                new.exercise_id,
                set_number,
                new.input.reps,
                new.input.half_reps,
                new.input.weight,
                new.input.unit.as_str(),
                new.input.set_type.code(),
                rpe,
                flags.is_pr(),
                flags.is_abs_weight_pr,
                flags.is_e1rm_pr,
                flags.is_volume_pr,
                flags.is_rep_pr,
                Utc::now().to_rfc3339(),
            ],
        )
        .with_context(|| format!("failed to insert set {} of workout {}", set_number, new.workout_id))?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "Logged set {} (#{}) for {}: {:?} against {} prior sets",
            id,
            set_number,
            owner,
            flags.categories(),
            maxima.qualifying_sets
        );

        self.get_set(id)?
            .with_context(|| format!("set {} vanished after insert", id))
    }

    /// Replace a set's values and evaluate it again, excluding itself from
    /// the history it is compared against
    pub fn update_set(
        &mut self,
        owner: &str,
        id: i64,
        update: &SetUpdate,
        policy: PrPolicy,
    ) -> Result<WorkoutSet> {
        let rpe = validate_rpe(update.rpe)?;
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exercise_id = owned_set(&tx, "workout_sets", owner, id)?;
        let maxima = strength_maxima(&tx, owner, exercise_id, Some(id))?;
        let flags = evaluate_against(&update.input, &maxima, policy);

        tx.execute(
            "UPDATE workout_sets SET reps = ?1, half_reps = ?2, weight = ?3, unit = ?4, set_type = ?5, rpe = ?6, is_pr = ?7, is_abs_weight_pr = ?8, is_e1rm_pr = ?9, is_volume_pr = ?10, is_rep_pr = ?11 WHERE id = ?12",
            params![
                update.input.reps,
                update.input.half_reps,
                update.input.weight,
                update.input.unit.as_str(),
                update.input.set_type.code(),
                rpe,
                flags.is_pr(),
                flags.is_abs_weight_pr,
                flags.is_e1rm_pr,
                flags.is_volume_pr,
                flags.is_rep_pr,
                id,
            ],
        )?;
        tx.commit()?;

        info!("Updated set {}: {:?}", id, flags.categories());

        self.get_set(id)?
            .with_context(|| format!("set {} not found", id))
    }

    /// Change only the given fields of a set, then evaluate it again
    pub fn edit_set(
        &mut self,
        owner: &str,
        id: i64,
        patch: &SetPatch,
        policy: PrPolicy,
    ) -> Result<WorkoutSet> {
        owned_set(&self.conn, "workout_sets", owner, id)?;
        let current = self.get_set(id)?
            .with_context(|| format!("set {} not found", id))?;
        let update = patch.apply(&current)?;
        self.update_set(owner, id, &update, policy)
    }

    /// Completion is the only field that changes without re-evaluation
    pub fn set_completed(&self, owner: &str, id: i64, completed: bool) -> Result<()> {
        owned_set(&self.conn, "workout_sets", owner, id)?;
        self.conn.execute(
            "UPDATE workout_sets SET completed = ?1 WHERE id = ?2",
            params![completed, id],
        )?;
        Ok(())
    }

    pub fn delete_set(&self, owner: &str, id: i64) -> Result<()> {
        owned_set(&self.conn, "workout_sets", owner, id)?;
        self.conn.execute("DELETE FROM workout_sets WHERE id = ?1", [id])?;
        info!("Deleted set {} of {}", id, owner);
        Ok(())
    }

    pub fn get_set(&self, id: i64) -> Result<Option<WorkoutSet>> {
        let set = self.conn
            .query_row(
                &format!("SELECT {} FROM workout_sets s WHERE s.id = ?1", SET_COLUMNS),
                [id],
                set_from_row,
            )
            .optional()?;
        Ok(set)
    }

    /// Sets of one workout, grouped by exercise in set order
    pub fn sets_for_workout(&self, workout_id: i64) -> Result<Vec<WorkoutSet>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM workout_sets s WHERE s.workout_id = ?1 ORDER BY s.exercise_id, s.set_number",
            SET_COLUMNS
        ))?;

        let sets = stmt
            .query_map([workout_id], set_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sets)
    }

    /// Every set the owner logged for an exercise, newest workout first
    pub fn exercise_history(&self, owner: &str, exercise_id: i64) -> Result<Vec<WorkoutSet>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM workout_sets s JOIN workouts w ON w.id = s.workout_id
             WHERE w.owner = ?1 AND s.exercise_id = ?2
             ORDER BY w.date DESC, w.id DESC, s.set_number",
            SET_COLUMNS
        ))?;

        let sets = stmt
            .query_map(params![owner, exercise_id], set_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sets)
    }

    /// Current bests for an exercise, as the evaluator sees them
    pub fn personal_bests(&self, owner: &str, exercise_id: i64) -> Result<HistoricalMaxima> {
        strength_maxima(&self.conn, owner, exercise_id, None)
    }

    // ---------------------------------------------------------------------
    // Cardio sets
    // ---------------------------------------------------------------------

    pub fn create_cardio_set(&mut self, new: &NewCardioSet, policy: PrPolicy) -> Result<CardioSet> {
        let input = new.input.validate()?;
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let owner = owner_for(&tx, new.workout_id, new.exercise_id)?;
        let set_number = next_set_number(&tx, "cardio_sets", new.workout_id, new.exercise_id)?;
        let history = cardio_history(&tx, &owner, new.exercise_id, None)?;
        let flags = evaluate_cardio(&input, &history, policy);

        tx.execute(
            "INSERT INTO cardio_sets (workout_id, exercise_id, set_number, mode, duration_seconds, distance_meters, floors, level, split_seconds, spm, is_pr, is_distance_pr, is_pace_pr, is_ascent_pr, is_intensity_pr, is_split_pr, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                new.workout_id,
                new.exercise_id,
                set_number,
                input.mode.as_str(),
                input.duration_seconds,
                input.distance_meters,
                input.floors,
                input.level,
                input.split_seconds,
                input.spm,
                flags.is_pr(),
                flags.is_distance_pr,
                flags.is_pace_pr,
                flags.is_ascent_pr,
                flags.is_intensity_pr,
                flags.is_split_pr,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!("Logged {} entry {} for {}: {:?}", input.mode, id, owner, flags);

        self.get_cardio_set(id)?
            .with_context(|| format!("cardio set {} vanished after insert", id))
    }

    pub fn update_cardio_set(
        &mut self,
        owner: &str,
        id: i64,
        input: &CardioInput,
        policy: PrPolicy,
    ) -> Result<CardioSet> {
        let input = input.validate()?;
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exercise_id = owned_set(&tx, "cardio_sets", owner, id)?;
        let history = cardio_history(&tx, owner, exercise_id, Some(id))?;
        let flags = evaluate_cardio(&input, &history, policy);

        tx.execute(
            "UPDATE cardio_sets SET mode = ?1, duration_seconds = ?2, distance_meters = ?3, floors = ?4, level = ?5, split_seconds = ?6, spm = ?7, is_pr = ?8, is_distance_pr = ?9, is_pace_pr = ?10, is_ascent_pr = ?11, is_intensity_pr = ?12, is_split_pr = ?13 WHERE id = ?14",
            params![
                input.mode.as_str(),
                input.duration_seconds,
                input.distance_meters,
                input.floors,
                input.level,
                input.split_seconds,
                input.spm,
                flags.is_pr(),
                flags.is_distance_pr,
                flags.is_pace_pr,
                flags.is_ascent_pr,
                flags.is_intensity_pr,
                flags.is_split_pr,
                id,
            ],
        )?;
        tx.commit()?;

        info!("Updated {} entry {}: {:?}", input.mode, id, flags);

        self.get_cardio_set(id)?
            .with_context(|| format!("cardio set {} not found", id))
    }

    pub fn get_cardio_set(&self, id: i64) -> Result<Option<CardioSet>> {
        let set = self.conn
            .query_row(
                &format!("SELECT {} FROM cardio_sets c WHERE c.id = ?1", CARDIO_COLUMNS),
                [id],
                cardio_from_row,
            )
            .optional()?;
        Ok(set)
    }

    pub fn cardio_sets_for_workout(&self, workout_id: i64) -> Result<Vec<CardioSet>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM cardio_sets c WHERE c.workout_id = ?1 ORDER BY c.exercise_id, c.set_number",
            CARDIO_COLUMNS
        ))?;

        let sets = stmt
            .query_map([workout_id], cardio_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sets)
    }
}

/// Owner of the workout, checking the exercise belongs to the same person
fn owner_for(conn: &Connection, workout_id: i64, exercise_id: i64) -> Result<String> {
    let workout_owner: String = conn
        .query_row("SELECT owner FROM workouts WHERE id = ?1", [workout_id], |row| row.get(0))
        .optional()?
        .with_context(|| format!("workout {} not found", workout_id))?;

    let exercise_owner: String = conn
        .query_row("SELECT owner FROM exercises WHERE id = ?1", [exercise_id], |row| row.get(0))
        .optional()?
        .with_context(|| format!("exercise {} not found", exercise_id))?;

    if workout_owner != exercise_owner {
        bail!(
            "exercise {} belongs to {}, not to the owner of workout {}",
            exercise_id,
            exercise_owner,
            workout_id
        );
    }
    Ok(workout_owner)
}

/// Exercise of a set that belongs to `owner`; someone else's set is
/// reported as missing
fn owned_set(conn: &Connection, table: &str, owner: &str, id: i64) -> Result<i64> {
    let found: Option<(i64, String)> = conn
        .query_row(
            &format!(
                "SELECT t.exercise_id, w.owner FROM {} t JOIN workouts w ON w.id = t.workout_id WHERE t.id = ?1",
                table
            ),
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match found {
        Some((exercise_id, set_owner)) if set_owner == owner => Ok(exercise_id),
        Some(_) => {
            warn!("{} tried to change set {} in {} owned by someone else", owner, id, table);
            bail!("set {} not found", id)
        }
        None => bail!("set {} not found", id),
    }
}

fn next_set_number(conn: &Connection, table: &str, workout_id: i64, exercise_id: i64) -> Result<u32> {
    let last: Option<u32> = conn.query_row(
        &format!("SELECT MAX(set_number) FROM {} WHERE workout_id = ?1 AND exercise_id = ?2", table),
        params![workout_id, exercise_id],
        |row| row.get(0),
    )?;
    last.unwrap_or(0)
        .checked_add(1)
        .with_context(|| format!("no set number left after {} in workout {}", u32::MAX, workout_id))
}

/// Aggregate the owner's prior sets for an exercise, optionally leaving
/// one set out
fn strength_maxima(
    conn: &Connection,
    owner: &str,
    exercise_id: i64,
    exclude: Option<i64>,
) -> Result<HistoricalMaxima> {
    let mut stmt = conn.prepare(
        "SELECT s.reps, s.half_reps, s.weight, s.unit, s.set_type FROM workout_sets s
         JOIN workouts w ON w.id = s.workout_id
         WHERE w.owner = ?1 AND s.exercise_id = ?2 AND (?3 IS NULL OR s.id != ?3)",
    )?;

    let mut maxima = HistoricalMaxima::default();
    let mut rows = stmt.query(params![owner, exercise_id, exclude])?;
    while let Some(row) = rows.next()? {
        maxima.push(&input_from_columns(row, 0)?);
    }
    Ok(maxima)
}

fn cardio_history(
    conn: &Connection,
    owner: &str,
    exercise_id: i64,
    exclude: Option<i64>,
) -> Result<Vec<CardioInput>> {
    let mut stmt = conn.prepare(
        "SELECT c.mode, c.duration_seconds, c.distance_meters, c.floors, c.level, c.split_seconds, c.spm FROM cardio_sets c
         JOIN workouts w ON w.id = c.workout_id
         WHERE w.owner = ?1 AND c.exercise_id = ?2 AND (?3 IS NULL OR c.id != ?3)",
    )?;

    let history = stmt
        .query_map(params![owner, exercise_id, exclude], |row| cardio_input_from_columns(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(history)
}

fn conversion_error(column: usize, err: ValidationError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Stored rows go through the same boundary as any other input
fn input_from_columns(row: &Row<'_>, start: usize) -> rusqlite::Result<SetInput> {
    let raw = RawSet {
        reps: row.get(start)?,
        half_reps: row.get(start + 1)?,
        weight: row.get::<_, Option<f64>>(start + 2)?.map(LooseNumber::Number),
        unit: row.get(start + 3)?,
        set_type: row.get(start + 4)?,
    };
    SetInput::try_from(raw).map_err(|e| conversion_error(start, e))
}

fn set_from_row(row: &Row<'_>) -> rusqlite::Result<WorkoutSet> {
    let created_at: String = row.get(16)?;
    Ok(WorkoutSet {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        exercise_id: row.get(2)?,
        set_number: row.get(3)?,
        input: input_from_columns(row, 4)?,
        rpe: row.get(9)?,
        flags: PrFlags {
            is_abs_weight_pr: row.get(10)?,
            is_e1rm_pr: row.get(11)?,
            is_volume_pr: row.get(12)?,
            is_rep_pr: row.get(13)?,
        },
        is_pr: row.get(14)?,
        completed: row.get(15)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn cardio_input_from_columns(row: &Row<'_>, start: usize) -> rusqlite::Result<CardioInput> {
    let mode: String = row.get(start)?;
    Ok(CardioInput {
        mode: CardioMode::parse(&mode).map_err(|e| conversion_error(start, e))?,
        duration_seconds: row.get(start + 1)?,
        distance_meters: row.get(start + 2)?,
        floors: row.get(start + 3)?,
        level: row.get(start + 4)?,
        split_seconds: row.get(start + 5)?,
        spm: row.get(start + 6)?,
    })
}

fn cardio_from_row(row: &Row<'_>) -> rusqlite::Result<CardioSet> {
    let created_at: String = row.get(17)?;
    Ok(CardioSet {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        exercise_id: row.get(2)?,
        set_number: row.get(3)?,
        input: cardio_input_from_columns(row, 4)?,
        flags: CardioFlags {
            is_distance_pr: row.get(11)?,
            is_pace_pr: row.get(12)?,
            is_ascent_pr: row.get(13)?,
            is_intensity_pr: row.get(14)?,
            is_split_pr: row.get(15)?,
        },
        is_pr: row.get(16)?,
        created_at: parse_timestamp(&created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exercises::MuscleGroup;
    use chrono::NaiveDate;

    struct Fixture {
        db: Database,
        workout: i64,
        squat: i64,
    }

    fn setup() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let workout = db
            .start_workout("alice", "Legs", NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .unwrap();
        let squat = db
            .create_exercise("alice", "Back Squat", MuscleGroup::Quads, None, true)
            .unwrap();
        Fixture { db, workout, squat }
    }

    fn new_set(f: &Fixture, weight: f64, reps: i64, unit: WeightUnit) -> NewSet {
        NewSet {
            workout_id: f.workout,
            exercise_id: f.squat,
            input: SetInput::new(reps, 0, Some(weight), unit).unwrap(),
            set_number: None,
            rpe: None,
        }
    }

    fn log(f: &mut Fixture, weight: f64, reps: i64) -> WorkoutSet {
        let set = new_set(f, weight, reps, WeightUnit::Kg);
        f.db.create_set(&set, PrPolicy::default()).unwrap()
    }

    #[test]
    fn test_first_set_is_baseline() {
        let mut f = setup();
        let set = log(&mut f, 100.0, 5);
        assert_eq!(set.set_number, 1);
        assert!(!set.is_pr);
        assert_eq!(set.flags, PrFlags::default());
    }

    #[test]
    fn test_heavier_set_flagged() {
        let mut f = setup();
        log(&mut f, 100.0, 5);
        let set = log(&mut f, 105.0, 5);
        assert_eq!(set.set_number, 2);
        assert!(set.is_pr);
        assert!(set.flags.is_abs_weight_pr);
        assert!(set.flags.is_e1rm_pr);
        assert!(set.flags.is_volume_pr);
        assert!(!set.flags.is_rep_pr);
    }

    #[test]
    fn test_tie_not_flagged() {
        let mut f = setup();
        log(&mut f, 100.0, 5);
        let set = log(&mut f, 100.0, 5);
        assert!(!set.is_pr);
    }

    #[test]
    fn test_units_normalized_across_sets() {
        let mut f = setup();
        let lbs = new_set(&f, 220.0, 5, WeightUnit::Lbs);
        f.db.create_set(&lbs, PrPolicy::default()).unwrap();

        let set = log(&mut f, 100.0, 5);
        assert!(set.flags.is_abs_weight_pr);
        assert_eq!(set.input.unit, WeightUnit::Kg);
    }

    #[test]
    fn test_permissive_policy_flags_first_set() {
        let mut f = setup();
        let set = new_set(&f, 60.0, 10, WeightUnit::Kg);
        let policy = PrPolicy { first_set_counts_as_pr: true };
        let stored = f.db.create_set(&set, policy).unwrap();
        assert!(stored.flags.is_abs_weight_pr);
        assert!(stored.flags.is_e1rm_pr);
        assert!(stored.flags.is_volume_pr);
        assert!(stored.flags.is_rep_pr);
    }

    #[test]
    fn test_history_scoped_to_owner() {
        let mut f = setup();
        log(&mut f, 100.0, 5);

        let bob_workout = f
            .db
            .start_workout("bob", "Legs", NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
            .unwrap();
        let bob_squat = f
            .db
            .create_exercise("bob", "Back Squat", MuscleGroup::Quads, None, true)
            .unwrap();
        let bob_set = NewSet {
            workout_id: bob_workout,
            exercise_id: bob_squat,
            input: SetInput::new(5, 0, Some(200.0), WeightUnit::Kg).unwrap(),
            set_number: None,
            rpe: None,
        };
        // Bob has no history of his own
        assert!(!f.db.create_set(&bob_set, PrPolicy::default()).unwrap().is_pr);

        // Alice's record is not affected by Bob's heavier set
        assert!(log(&mut f, 101.0, 5).flags.is_abs_weight_pr);
    }

    #[test]
    fn test_history_spans_workouts() {
        let mut f = setup();
        log(&mut f, 100.0, 5);

        let next = f
            .db
            .start_workout("alice", "Legs again", NaiveDate::from_ymd_opt(2026, 3, 5).unwrap())
            .unwrap();
        let mut set = new_set(&f, 100.0, 5, WeightUnit::Kg);
        set.workout_id = next;
        let stored = f.db.create_set(&set, PrPolicy::default()).unwrap();
        assert_eq!(stored.set_number, 1);
        assert!(!stored.is_pr);
    }

    #[test]
    fn test_cross_owner_exercise_rejected() {
        let mut f = setup();
        let bob_bench = f
            .db
            .create_exercise("bob", "Bench", MuscleGroup::Chest, None, true)
            .unwrap();
        let mut set = new_set(&f, 60.0, 5, WeightUnit::Kg);
        set.exercise_id = bob_bench;
        assert!(f.db.create_set(&set, PrPolicy::default()).is_err());
    }

    #[test]
    fn test_missing_workout_rejected() {
        let mut f = setup();
        let mut set = new_set(&f, 60.0, 5, WeightUnit::Kg);
        set.workout_id = 999;
        let err = f.db.create_set(&set, PrPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("workout 999 not found"));
    }

    #[test]
    fn test_duplicate_set_number_rejected() {
        let mut f = setup();
        log(&mut f, 100.0, 5);
        let mut set = new_set(&f, 90.0, 5, WeightUnit::Kg);
        set.set_number = Some(1);
        assert!(f.db.create_set(&set, PrPolicy::default()).is_err());
    }

    #[test]
    fn test_invalid_rpe_rejected() {
        let mut f = setup();
        let mut set = new_set(&f, 90.0, 5, WeightUnit::Kg);
        set.rpe = Some(12.0);
        assert!(f.db.create_set(&set, PrPolicy::default()).is_err());
        assert!(f.db.sets_for_workout(f.workout).unwrap().is_empty());
    }

    #[test]
    fn test_warmup_excluded_from_history() {
        let mut f = setup();
        log(&mut f, 60.0, 5);
        let mut warmup = new_set(&f, 140.0, 3, WeightUnit::Kg);
        warmup.input = warmup.input.with_set_type(SetType::Warmup);
        let stored = f.db.create_set(&warmup, PrPolicy::default()).unwrap();
        assert!(!stored.is_pr);
        assert_eq!(stored.input.set_type, SetType::Warmup);

        // Still a weight PR: the heavier warm-up doesn't count
        assert!(log(&mut f, 80.0, 5).flags.is_abs_weight_pr);
    }

    #[test]
    fn test_update_excludes_itself() {
        let mut f = setup();
        log(&mut f, 100.0, 5);
        let pr = log(&mut f, 110.0, 5);
        assert!(pr.flags.is_abs_weight_pr);

        // Re-saving the same values must not compare against itself
        let update = SetUpdate { input: pr.input, rpe: Some(9.0) };
        let again = f.db.update_set("alice", pr.id, &update, PrPolicy::default()).unwrap();
        assert!(again.flags.is_abs_weight_pr);
        assert_eq!(again.rpe, Some(9.0));

        // Lowering it below the earlier set clears the flags
        let update = SetUpdate {
            input: SetInput::new(5, 0, Some(95.0), WeightUnit::Kg).unwrap(),
            rpe: None,
        };
        let lowered = f.db.update_set("alice", pr.id, &update, PrPolicy::default()).unwrap();
        assert!(!lowered.is_pr);
        assert_eq!(lowered.input.weight, Some(95.0));
    }

    #[test]
    fn test_update_missing_set() {
        let mut f = setup();
        let update = SetUpdate {
            input: SetInput::new(5, 0, Some(95.0), WeightUnit::Kg).unwrap(),
            rpe: None,
        };
        assert!(f.db.update_set("alice", 7, &update, PrPolicy::default()).is_err());
    }

    #[test]
    fn test_completion_and_delete() {
        let mut f = setup();
        let set = log(&mut f, 100.0, 5);
        assert!(!set.completed);

        f.db.set_completed("alice", set.id, true).unwrap();
        let stored = f.db.get_set(set.id).unwrap().unwrap();
        assert!(stored.completed);
        assert_eq!(stored.flags, set.flags);

        f.db.delete_set("alice", set.id).unwrap();
        assert!(f.db.get_set(set.id).unwrap().is_none());
        assert!(f.db.delete_set("alice", set.id).is_err());
        assert!(f.db.set_completed("alice", set.id, false).is_err());
    }

    #[test]
    fn test_half_reps_and_null_weight_persist() {
        let mut f = setup();
        let set = NewSet {
            workout_id: f.workout,
            exercise_id: f.squat,
            input: SetInput::new(12, 1, None, WeightUnit::Lbs).unwrap(),
            set_number: Some(4),
            rpe: Some(7.5),
        };
        let stored = f.db.create_set(&set, PrPolicy::default()).unwrap();
        assert_eq!(stored.set_number, 4);
        assert_eq!(stored.input.half_reps, 1);
        assert_eq!(stored.input.weight, None);
        assert_eq!(stored.input.unit, WeightUnit::Lbs);
        assert_eq!(stored.rpe, Some(7.5));
        assert_eq!(stored.input.effective_reps(), 12.5);

        // Next automatic number continues after the highest
        assert_eq!(log(&mut f, 50.0, 5).set_number, 5);
    }

    #[test]
    fn test_exercise_history_and_bests() {
        let mut f = setup();
        log(&mut f, 100.0, 5);
        log(&mut f, 80.0, 12);

        let history = f.db.exercise_history("alice", f.squat).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].set_number, 1);

        let bests = f.db.personal_bests("alice", f.squat).unwrap();
        assert_eq!(bests.weight_kg, 100.0);
        assert_eq!(bests.volume, 960.0);
        assert_eq!(bests.reps, 12.0);
        assert_eq!(bests.qualifying_sets, 2);

        assert!(f.db.personal_bests("bob", f.squat).unwrap().is_empty());
    }

    #[test]
    fn test_sets_json_uses_storage_field_names() {
        let mut f = setup();
        log(&mut f, 100.0, 5);
        let set = log(&mut f, 105.0, 5);
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["is_pr"], true);
        assert_eq!(json["is_abs_weight_pr"], true);
        assert_eq!(json["is_rep_pr"], false);
        assert_eq!(json["unit"], "kg");
        assert_eq!(json["set_type"], "S");
    }

    fn cardio_fixture() -> (Fixture, i64) {
        let f = setup();
        let treadmill = f
            .db
            .create_exercise("alice", "Treadmill", MuscleGroup::Cardio, None, false)
            .unwrap();
        (f, treadmill)
    }

    fn treadmill_run(f: &Fixture, exercise_id: i64, secs: u32, meters: f64) -> NewCardioSet {
        NewCardioSet {
            workout_id: f.workout,
            exercise_id,
            input: CardioInput {
                distance_meters: Some(meters),
                ..CardioInput::new(CardioMode::Treadmill, secs)
            },
        }
    }

    #[test]
    fn test_cardio_sets_flagged() {
        let (mut f, treadmill) = cardio_fixture();
        let run = treadmill_run(&f, treadmill, 1800, 5000.0);
        let first = f.db.create_cardio_set(&run, PrPolicy::default()).unwrap();
        assert_eq!(first.set_number, 1);
        assert!(!first.is_pr);

        let run = treadmill_run(&f, treadmill, 1700, 5200.0);
        let second = f.db.create_cardio_set(&run, PrPolicy::default()).unwrap();
        assert_eq!(second.set_number, 2);
        assert!(second.flags.is_distance_pr);
        assert!(second.flags.is_pace_pr);
        assert!(second.is_pr);

        assert_eq!(f.db.cardio_sets_for_workout(f.workout).unwrap().len(), 2);
    }

    #[test]
    fn test_cardio_update_excludes_itself() {
        let (mut f, treadmill) = cardio_fixture();
        let run = treadmill_run(&f, treadmill, 1800, 5000.0);
        f.db.create_cardio_set(&run, PrPolicy::default()).unwrap();
        let run = treadmill_run(&f, treadmill, 1800, 6000.0);
        let best = f.db.create_cardio_set(&run, PrPolicy::default()).unwrap();
        assert!(best.flags.is_distance_pr);

        let again = f
            .db
            .update_cardio_set("alice", best.id, &best.input, PrPolicy::default())
            .unwrap();
        assert!(again.flags.is_distance_pr);
    }

    #[test]
    fn test_cardio_invalid_input_rejected() {
        let (mut f, treadmill) = cardio_fixture();
        let bad = treadmill_run(&f, treadmill, 1800, f64::INFINITY);
        assert!(f.db.create_cardio_set(&bad, PrPolicy::default()).is_err());
    }

    #[test]
    fn test_set_number_exhausted() {
        let mut f = setup();
        let mut last = new_set(&f, 100.0, 5, WeightUnit::Kg);
        last.set_number = Some(u32::MAX);
        f.db.create_set(&last, PrPolicy::default()).unwrap();

        let next = new_set(&f, 100.0, 5, WeightUnit::Kg);
        let err = f.db.create_set(&next, PrPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("no set number left"));
        assert_eq!(f.db.sets_for_workout(f.workout).unwrap().len(), 1);
    }

    #[test]
    fn test_other_owners_sets_untouchable() {
        let mut f = setup();
        let alice_set = log(&mut f, 100.0, 5);
        let update = SetUpdate {
            input: SetInput::new(1, 0, Some(1.0), WeightUnit::Kg).unwrap(),
            rpe: None,
        };

        let err = f.db.update_set("bob", alice_set.id, &update, PrPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("not found"));
        assert!(f.db.edit_set("bob", alice_set.id, &SetPatch::default(), PrPolicy::default()).is_err());
        assert!(f.db.set_completed("bob", alice_set.id, true).is_err());
        assert!(f.db.delete_set("bob", alice_set.id).is_err());

        let stored = f.db.get_set(alice_set.id).unwrap().unwrap();
        assert_eq!(stored, alice_set);
    }

    #[test]
    fn test_other_owners_cardio_untouchable() {
        let (mut f, treadmill) = cardio_fixture();
        let run = treadmill_run(&f, treadmill, 1800, 5000.0);
        let entry = f.db.create_cardio_set(&run, PrPolicy::default()).unwrap();

        let mut changed = entry.input;
        changed.distance_meters = Some(1.0);
        assert!(f.db.update_cardio_set("bob", entry.id, &changed, PrPolicy::default()).is_err());
        assert_eq!(f.db.get_cardio_set(entry.id).unwrap().unwrap(), entry);
    }

    #[test]
    fn test_edit_keeps_fields_not_given() {
        let mut f = setup();
        let warmup = NewSet {
            workout_id: f.workout,
            exercise_id: f.squat,
            input: SetInput::new(8, 2, Some(225.0), WeightUnit::Lbs)
                .unwrap()
                .with_set_type(SetType::Warmup),
            set_number: None,
            rpe: Some(6.0),
        };
        let stored = f.db.create_set(&warmup, PrPolicy::default()).unwrap();

        let patch = SetPatch { weight: Some(230.0), ..SetPatch::default() };
        let edited = f.db.edit_set("alice", stored.id, &patch, PrPolicy::default()).unwrap();
        assert_eq!(edited.input.weight, Some(230.0));
        assert_eq!(edited.input.unit, WeightUnit::Lbs);
        assert_eq!(edited.input.set_type, SetType::Warmup);
        assert_eq!(edited.input.reps, 8);
        assert_eq!(edited.input.half_reps, 2);
        assert_eq!(edited.rpe, Some(6.0));
        assert!(!edited.is_pr);
    }

    #[test]
    fn test_edit_changes_given_fields() {
        let mut f = setup();
        log(&mut f, 100.0, 5);
        let set = log(&mut f, 90.0, 5);
        assert!(!set.is_pr);

        let patch = SetPatch {
            reps: Some(3),
            weight: Some(110.0),
            set_type: Some(SetType::Failure),
            ..SetPatch::default()
        };
        let edited = f.db.edit_set("alice", set.id, &patch, PrPolicy::default()).unwrap();
        assert_eq!(edited.input.reps, 3);
        assert_eq!(edited.input.unit, WeightUnit::Kg);
        assert_eq!(edited.input.set_type, SetType::Failure);
        assert!(edited.flags.is_abs_weight_pr);

        let bad = SetPatch { reps: Some(-1), ..SetPatch::default() };
        assert!(f.db.edit_set("alice", set.id, &bad, PrPolicy::default()).is_err());
    }
}
