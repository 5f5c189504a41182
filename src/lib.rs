//! strengthy - Personal strength training log
//!
//! Logs sets per workout and flags personal records (heaviest weight,
//! estimated 1RM, set volume, reps) against the lifter's own history.

pub mod config;
pub mod db;
pub mod exercises;
pub mod pr;
pub mod units;

pub use config::Settings;
pub use db::Database;
