//! # Question Validation
//!
//! Validation rules for generation requests and for questions parsed out of
//! LLM output. Request validation is strict (a bad request is rejected);
//! parsed-question validation is a filter (a bad question is dropped and
//! counted, the batch continues).

use crate::error::{AppError, AppResult};
use crate::questions::models::{ExamType, Question, SubjectRequest};
use crate::questions::syllabus;

pub const MIN_QUESTIONS_PER_SUBJECT: usize = 1;
pub const MAX_QUESTIONS_PER_SUBJECT: usize = 100;

pub const MIN_QUESTION_LENGTH: usize = 10;
pub const MAX_QUESTION_LENGTH: usize = 1000;
pub const MIN_OPTION_LENGTH: usize = 1;
pub const MAX_OPTION_LENGTH: usize = 500;
pub const MIN_SOLUTION_LENGTH: usize = 10;

pub const VALID_OPTIONS: [&str; 4] = ["A", "B", "C", "D"];

/// Validate one subject's generation parameters against the syllabus.
pub fn validate_subject_request(
    exam: ExamType,
    subject: &str,
    request: &SubjectRequest,
) -> AppResult<()> {
    if !syllabus::is_valid_subject(exam, subject) {
        return Err(AppError::ValidationError(format!(
            "Invalid subject '{}' for {}. Valid subjects: {}",
            subject,
            exam,
            syllabus::subjects(exam).join(", ")
        )));
    }

    if request.num_questions < MIN_QUESTIONS_PER_SUBJECT {
        return Err(AppError::ValidationError(format!(
            "num_questions must be at least {}",
            MIN_QUESTIONS_PER_SUBJECT
        )));
    }

    if request.num_questions > MAX_QUESTIONS_PER_SUBJECT {
        return Err(AppError::ValidationError(format!(
            "num_questions cannot exceed {}",
            MAX_QUESTIONS_PER_SUBJECT
        )));
    }

    let invalid: Vec<&str> = request
        .chapters
        .iter()
        .filter(|ch| !syllabus::is_valid_chapter(exam, subject, ch))
        .map(|ch| ch.as_str())
        .collect();

    if !invalid.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Invalid chapters for {} {}: {}",
            exam,
            subject,
            invalid.join(", ")
        )));
    }

    Ok(())
}

/// Structural checks for a parsed question. Returns every problem found so
/// the caller can log a complete diagnosis.
pub fn question_errors(question: &Question) -> Vec<String> {
    let mut errors = Vec::new();

    let text_len = question.question.chars().count();
    if text_len < MIN_QUESTION_LENGTH {
        errors.push(format!("Question too short (min {} chars)", MIN_QUESTION_LENGTH));
    } else if text_len > MAX_QUESTION_LENGTH {
        errors.push(format!("Question too long (max {} chars)", MAX_QUESTION_LENGTH));
    }

    for key in VALID_OPTIONS {
        match question.options.get(key) {
            None => errors.push(format!("Missing option: {}", key)),
            Some(text) => {
                let len = text.chars().count();
                if len < MIN_OPTION_LENGTH {
                    errors.push(format!("Option {} too short", key));
                } else if len > MAX_OPTION_LENGTH {
                    errors.push(format!("Option {} too long", key));
                }
            }
        }
    }

    for key in question.options.keys() {
        if !VALID_OPTIONS.contains(&key.as_str()) {
            errors.push(format!("Invalid option key: {}", key));
        }
    }

    if !VALID_OPTIONS.contains(&question.correct.as_str()) {
        errors.push(format!(
            "Invalid correct answer: {}. Must be one of A, B, C, D",
            question.correct
        ));
    }

    if question.solution.chars().count() < MIN_SOLUTION_LENGTH {
        errors.push(format!("Solution too short (min {} chars)", MIN_SOLUTION_LENGTH));
    }

    errors
}

pub fn is_valid_question(question: &Question) -> bool {
    question_errors(question).is_empty()
}

/// A user answer is A-D or unattempted (None).
pub fn is_valid_answer(answer: Option<&str>) -> bool {
    match answer {
        None => true,
        Some(a) => VALID_OPTIONS.contains(&a),
    }
}

/// Collapse runs of whitespace and trim; optionally truncate at a word
/// boundary with an ellipsis.
pub fn sanitize_text(text: &str, max_length: Option<usize>) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    match max_length {
        Some(max) if collapsed.chars().count() > max => {
            let truncated: String = collapsed.chars().take(max).collect();
            match truncated.rsplit_once(' ') {
                Some((head, _)) => format!("{}...", head),
                None => format!("{}...", truncated),
            }
        }
        _ => collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_question() -> Question {
        let mut options = BTreeMap::new();
        options.insert("A".to_string(), "Newton".to_string());
        options.insert("B".to_string(), "Joule".to_string());
        options.insert("C".to_string(), "Watt".to_string());
        options.insert("D".to_string(), "Pascal".to_string());

        Question {
            id: 0,
            subject: "Physics".to_string(),
            question: "What is the SI unit of force?".to_string(),
            options,
            correct: "A".to_string(),
            solution: "Force is measured in newtons, named after Isaac Newton.".to_string(),
            chapter: None,
            difficulty: None,
            marks: 4,
        }
    }

    #[test]
    fn test_valid_question_passes() {
        assert!(is_valid_question(&sample_question()));
    }

    #[test]
    fn test_missing_option_fails() {
        let mut question = sample_question();
        question.options.remove("C");
        let errors = question_errors(&question);
        assert!(errors.iter().any(|e| e.contains("Missing option: C")));
    }

    #[test]
    fn test_bad_correct_answer_fails() {
        let mut question = sample_question();
        question.correct = "E".to_string();
        assert!(!is_valid_question(&question));
    }

    #[test]
    fn test_short_question_fails() {
        let mut question = sample_question();
        question.question = "Short?".to_string();
        let errors = question_errors(&question);
        assert!(errors.iter().any(|e| e.contains("too short")));
    }

    #[test]
    fn test_subject_request_validation() {
        let request = SubjectRequest {
            chapters: vec!["Kinematics".to_string()],
            num_questions: 10,
            difficulty: crate::questions::models::Difficulty::Medium,
        };
        assert!(validate_subject_request(ExamType::Jee, "Physics", &request).is_ok());
        assert!(validate_subject_request(ExamType::Neet, "Mathematics", &request).is_err());

        let bad_chapter = SubjectRequest {
            chapters: vec!["Photosynthesis".to_string()],
            ..request.clone()
        };
        assert!(validate_subject_request(ExamType::Jee, "Physics", &bad_chapter).is_err());

        let too_many = SubjectRequest {
            num_questions: 500,
            ..request
        };
        assert!(validate_subject_request(ExamType::Jee, "Physics", &too_many).is_err());
    }

    #[test]
    fn test_answer_validation() {
        assert!(is_valid_answer(None));
        assert!(is_valid_answer(Some("B")));
        assert!(!is_valid_answer(Some("E")));
        assert!(!is_valid_answer(Some("b")));
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  hello \n  world  ", None), "hello world");
        let long = "alpha beta gamma delta";
        assert_eq!(sanitize_text(long, Some(12)), "alpha beta...");
    }
}
