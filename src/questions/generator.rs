//! # Question Generator
//!
//! Orchestrates multi-subject question generation: validates the request,
//! fills in default chapters, builds one prompt per subject, calls Gemini,
//! parses and validates the output, and assembles the final paper with
//! sequential question ids and generation metadata.
//!
//! A subject whose generation or parsing fails is skipped with a warning so
//! one bad response doesn't sink the whole paper; only a completely empty
//! result is an error.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::gemini::GeminiClient;
use crate::questions::models::{GeneratedPaper, GenerationMetadata, GenerationRequest, Question};
use crate::questions::parser::parse_llm_output;
use crate::questions::prompt::build_prompt;
use crate::questions::syllabus;
use crate::questions::validator::validate_subject_request;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

/// Generate a full paper for the given request.
pub async fn generate_paper(
    http: reqwest::Client,
    config: &AppConfig,
    request: &GenerationRequest,
) -> AppResult<GeneratedPaper> {
    let exam = request.exam;
    info!(
        exam = %exam,
        subjects = %request.subjects.keys().cloned().collect::<Vec<_>>().join(", "),
        "Starting question generation"
    );

    if request.subjects.is_empty() {
        return Err(AppError::ValidationError(
            "At least one subject is required".to_string(),
        ));
    }

    // Resolve empty chapter lists to the full syllabus, then validate
    // everything up front so no Gemini calls happen for a bad request
    let mut resolved = BTreeMap::new();
    for (subject, subject_request) in &request.subjects {
        let mut subject_request = subject_request.clone();
        if subject_request.chapters.is_empty() {
            if let Some(all) = syllabus::chapters(exam, subject) {
                info!(subject = %subject, "No chapters specified, using full syllabus");
                subject_request.chapters = all.iter().map(|s| s.to_string()).collect();
            }
        }
        validate_subject_request(exam, subject, &subject_request)?;
        resolved.insert(subject.clone(), subject_request);
    }

    let client = GeminiClient::from_config(http, &config.gemini)?;
    let safety_buffer = config.generation.safety_buffer;

    let started = Instant::now();
    let mut all_questions: Vec<Question> = Vec::new();
    let mut by_subject: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    let mut total_parsed = 0usize;
    let mut total_invalid = 0usize;

    for (subject, subject_request) in &resolved {
        let subject_started = Instant::now();

        // Over-request so validation failures still leave enough questions
        let to_request = subject_request.num_questions + safety_buffer;
        let prompt = build_prompt(
            &exam.to_string(),
            subject,
            &subject_request.chapters,
            to_request,
            subject_request.difficulty,
        );

        let raw = match client.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(subject = %subject, error = %e, "Generation failed, skipping subject");
                by_subject.insert(subject.clone(), Vec::new());
                continue;
            }
        };

        let batch = match parse_llm_output(&raw, subject, Some(to_request)) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(subject = %subject, error = %e, "Parsing failed, skipping subject");
                by_subject.insert(subject.clone(), Vec::new());
                continue;
            }
        };

        total_parsed += batch.parsed_count;
        total_invalid += batch.invalid_count;

        let mut questions = batch.questions;
        if questions.len() > subject_request.num_questions {
            questions.truncate(subject_request.num_questions);
        } else if questions.len() < subject_request.num_questions {
            warn!(
                subject = %subject,
                requested = subject_request.num_questions,
                got = questions.len(),
                "Insufficient questions after validation"
            );
        }

        info!(
            subject = %subject,
            count = questions.len(),
            elapsed_secs = subject_started.elapsed().as_secs_f64(),
            "Subject generation complete"
        );

        let ids = by_subject.entry(subject.clone()).or_default();
        for mut question in questions {
            question.id = all_questions.len() as u32;
            question.difficulty = Some(subject_request.difficulty);
            question.chapter = subject_request.chapters.first().cloned();
            ids.push(question.id);
            all_questions.push(question);
        }
    }

    if all_questions.is_empty() {
        return Err(AppError::Upstream(format!(
            "Generated 0 questions, but {} were requested",
            request.total_requested()
        )));
    }

    let generation_time_secs = started.elapsed().as_secs_f64();
    info!(
        total = all_questions.len(),
        elapsed_secs = generation_time_secs,
        "Question generation complete"
    );

    let success_rate = if total_parsed > 0 {
        (total_parsed - total_invalid) as f64 / total_parsed as f64
    } else {
        0.0
    };

    let metadata = GenerationMetadata {
        exam,
        total_questions: all_questions.len(),
        subjects: resolved.keys().cloned().collect(),
        generation_time_secs,
        model: config.gemini.model.clone(),
        temperature: config.gemini.temperature,
        success_rate,
    };

    Ok(GeneratedPaper {
        questions: all_questions,
        by_subject,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::models::{Difficulty, SubjectRequest};

    fn request_for(subject: &str, num: usize) -> GenerationRequest {
        let mut subjects = BTreeMap::new();
        subjects.insert(
            subject.to_string(),
            SubjectRequest {
                chapters: Vec::new(),
                num_questions: num,
                difficulty: Difficulty::Medium,
            },
        );
        GenerationRequest {
            exam: crate::questions::models::ExamType::Jee,
            subjects,
        }
    }

    #[tokio::test]
    async fn test_empty_subjects_rejected() {
        let request = GenerationRequest {
            exam: crate::questions::models::ExamType::Jee,
            subjects: BTreeMap::new(),
        };
        let result = generate_paper(reqwest::Client::new(), &AppConfig::default(), &request).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_invalid_subject_rejected_before_api_call() {
        // "Biology" is not a JEE subject; no API key is configured either,
        // but validation must fire first
        let request = request_for("Biology", 5);
        let result = generate_paper(reqwest::Client::new(), &AppConfig::default(), &request).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_config_error() {
        let request = request_for("Physics", 5);
        let result = generate_paper(reqwest::Client::new(), &AppConfig::default(), &request).await;
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }
}
