//! Exercise definitions - muscle groups and the built-in library

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pr::CardioMode;

/// Muscle group classification of an exercise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    Forearms,
    Core,
    Cardio,
    Other,
}

impl MuscleGroup {
    /// Case-insensitive lookup; legacy "legs" and "arms" map onto the
    /// closest group, anything else is `Other`
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "chest" => MuscleGroup::Chest,
            "back" => MuscleGroup::Back,
            "shoulders" => MuscleGroup::Shoulders,
            "biceps" | "arms" => MuscleGroup::Biceps,
            "triceps" => MuscleGroup::Triceps,
            "quads" | "legs" => MuscleGroup::Quads,
            "hamstrings" => MuscleGroup::Hamstrings,
            "glutes" => MuscleGroup::Glutes,
            "calves" => MuscleGroup::Calves,
            "forearms" => MuscleGroup::Forearms,
            "core" => MuscleGroup::Core,
            "cardio" => MuscleGroup::Cardio,
            _ => MuscleGroup::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "chest",
            MuscleGroup::Back => "back",
            MuscleGroup::Shoulders => "shoulders",
            MuscleGroup::Biceps => "biceps",
            MuscleGroup::Triceps => "triceps",
            MuscleGroup::Quads => "quads",
            MuscleGroup::Hamstrings => "hamstrings",
            MuscleGroup::Glutes => "glutes",
            MuscleGroup::Calves => "calves",
            MuscleGroup::Forearms => "forearms",
            MuscleGroup::Core => "core",
            MuscleGroup::Cardio => "cardio",
            MuscleGroup::Other => "other",
        }
    }

    /// All muscle groups for iteration
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Chest,
            MuscleGroup::Back,
            MuscleGroup::Shoulders,
            MuscleGroup::Biceps,
            MuscleGroup::Triceps,
            MuscleGroup::Quads,
            MuscleGroup::Hamstrings,
            MuscleGroup::Glutes,
            MuscleGroup::Calves,
            MuscleGroup::Forearms,
            MuscleGroup::Core,
            MuscleGroup::Cardio,
            MuscleGroup::Other,
        ]
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Kettlebell,
    Cable,
    Machine,
    Bodyweight,
}

#[derive(Debug, Clone)]
pub struct LibraryExercise {
    pub name: &'static str,
    pub group: MuscleGroup,
    pub equipment: Equipment,
    /// Set for machines logged as cardio entries
    pub cardio_mode: Option<CardioMode>,
}

const fn lift(name: &'static str, group: MuscleGroup, equipment: Equipment) -> LibraryExercise {
    LibraryExercise { name, group, equipment, cardio_mode: None }
}

const fn cardio(name: &'static str, mode: CardioMode) -> LibraryExercise {
    LibraryExercise {
        name,
        group: MuscleGroup::Cardio,
        equipment: Equipment::Machine,
        cardio_mode: Some(mode),
    }
}

use Equipment::*;
use MuscleGroup as G;

/// Built-in exercise catalog
pub const LIBRARY: &[LibraryExercise] = &[
    // Barbell
    lift("Barbell High Bar Back Squat", G::Quads, Barbell),
    lift("Barbell Front Squat", G::Quads, Barbell),
    lift("Barbell Romanian Deadlift", G::Hamstrings, Barbell),
    lift("Barbell Deadlift", G::Back, Barbell),
    lift("Barbell Bench Press", G::Chest, Barbell),
    lift("Barbell Bent-Over Row", G::Back, Barbell),
    lift("Barbell Overhead Press", G::Shoulders, Barbell),
    lift("Barbell Hip Thrust", G::Glutes, Barbell),
    lift("Barbell Curl", G::Biceps, Barbell),
    lift("EZ-Bar Skull Crusher", G::Triceps, Barbell),
    lift("Barbell Ab Rollout", G::Core, Barbell),
    // Dumbbell
    lift("Dumbbell Bench Press", G::Chest, Dumbbell),
    lift("Dumbbell Chest-Supported Row", G::Back, Dumbbell),
    lift("Arnold Press", G::Shoulders, Dumbbell),
    lift("Dumbbell Alternating Bicep Curl", G::Biceps, Dumbbell),
    lift("Dumbbell Overhead Extension", G::Triceps, Dumbbell),
    lift("Dumbbell Walking Lunge", G::Quads, Dumbbell),
    lift("Dumbbell Single-Leg Calf Raise", G::Calves, Dumbbell),
    lift("Dumbbell Zottman Curl", G::Forearms, Dumbbell),
    // Cable
    lift("Low-to-High Cable Fly", G::Chest, Cable),
    lift("Seated Cable Row", G::Back, Cable),
    lift("Cable Face Pull", G::Shoulders, Cable),
    lift("Cable Straight Bar Pushdown", G::Triceps, Cable),
    lift("Cable Rope Crunch", G::Core, Cable),
    // Machine
    lift("Leg Press", G::Quads, Machine),
    lift("Lying Leg Curl Machine", G::Hamstrings, Machine),
    lift("Standing Calf Raise Machine", G::Calves, Machine),
    lift("Machine Chest Press", G::Chest, Machine),
    // Kettlebell
    lift("Kettlebell Swing", G::Glutes, Kettlebell),
    lift("Kettlebell Goblet Squat", G::Quads, Kettlebell),
    // Bodyweight
    lift("Push-ups", G::Chest, Bodyweight),
    lift("Pull-ups", G::Back, Bodyweight),
    lift("Chin-ups", G::Biceps, Bodyweight),
    lift("Dips", G::Triceps, Bodyweight),
    lift("Hanging Leg Raise", G::Core, Bodyweight),
    // Cardio
    cardio("Treadmill", CardioMode::Treadmill),
    cardio("Stationary Bike", CardioMode::Bike),
    cardio("Elliptical Trainer", CardioMode::Elliptical),
    cardio("Stair Climber", CardioMode::Stairs),
    cardio("Rowing Machine", CardioMode::Row),
];

pub fn get_library() -> &'static [LibraryExercise] {
    LIBRARY
}

/// Library entries for one muscle group
pub fn library_by_group(group: MuscleGroup) -> Vec<&'static LibraryExercise> {
    LIBRARY.iter().filter(|e| e.group == group).collect()
}

/// Find a library exercise by name, ignoring case and surrounding spaces
pub fn find_library_exercise(name: &str) -> Option<&'static LibraryExercise> {
    let name = name.trim();
    LIBRARY.iter().find(|e| e.name.eq_ignore_ascii_case(name))
}
