//! Data module - Source loading and cleaning

mod loader;
mod processor;

pub use loader::DataLoader;
pub use processor::{DataProcessor, GRADE_COL, PREDICATE_COL};
