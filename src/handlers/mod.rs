pub mod config;
pub mod questions;

pub use config::{get_config, update_config};
pub use questions::{evaluate_test, generate_questions, get_syllabus};
