//! # Question Generation
//!
//! The full question-paper pipeline: syllabus data, prompt construction,
//! Gemini-backed generation, output parsing, validation, caching, and test
//! evaluation.
//!
//! ## Flow
//!
//! ```text
//! GenerationRequest -> validator -> prompt -> GeminiClient -> parser
//!                          |                                     |
//!                       syllabus                              validator
//!                                                                |
//!                                                         GeneratedPaper
//! ```
//!
//! Evaluation is the reverse direction: a paper plus user answers goes
//! through `evaluation` to produce marks and subject analytics.

pub mod cache;
pub mod evaluation;
pub mod generator;
pub mod models;
pub mod parser;
pub mod prompt;
pub mod syllabus;
pub mod validator;
