//! Stats module - Classification rules and cohort aggregates

mod calculator;
mod classifier;

pub use calculator::{StatsCalculator, COUNT_COL, FREQUENCY_COL};
pub use classifier::{Grade, Predicate};
