//! # Test Evaluation
//!
//! Scores a completed attempt against the exam's marking scheme and produces
//! subject-wise analytics plus plain-language performance insights.

use crate::error::{AppError, AppResult};
use crate::questions::models::{
    EvaluationResult, ExamType, MarkingScheme, Question, QuestionDetail, SubjectResult,
};
use crate::questions::syllabus::marking_scheme;
use crate::questions::validator::is_valid_answer;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct SubjectTally {
    total: usize,
    attempted: usize,
    correct: usize,
    wrong: usize,
    unattempted: usize,
    marks: f64,
    max_marks: f64,
}

/// Evaluate a test attempt.
///
/// `answers` maps question id to the chosen option; a missing id or an
/// explicit null means unattempted. Invalid answers (anything outside A-D)
/// are treated as unattempted with a warning rather than rejected, matching
/// the forgiving posture of the rest of the pipeline.
pub fn evaluate(
    exam: ExamType,
    questions: &[Question],
    answers: &BTreeMap<u32, Option<String>>,
) -> AppResult<EvaluationResult> {
    if questions.is_empty() {
        return Err(AppError::ValidationError(
            "Questions list cannot be empty".to_string(),
        ));
    }

    info!(exam = %exam, count = questions.len(), "Starting evaluation");

    let scheme: MarkingScheme = marking_scheme(exam);

    let mut total_marks = 0.0;
    let mut positive_marks = 0.0;
    let mut negative_marks = 0.0;
    let mut correct_count = 0;
    let mut wrong_count = 0;
    let mut unattempted_count = 0;

    let mut tallies: BTreeMap<String, SubjectTally> = BTreeMap::new();
    let mut question_details = Vec::with_capacity(questions.len());

    for question in questions {
        let mut user_answer = answers.get(&question.id).cloned().flatten();

        if !is_valid_answer(user_answer.as_deref()) {
            warn!(question_id = question.id, answer = ?user_answer, "Invalid user answer");
            user_answer = None;
        }

        let tally = tallies.entry(question.subject.clone()).or_default();

        let (marks, is_correct) = match user_answer.as_deref() {
            Some(answer) if answer == question.correct => {
                positive_marks += scheme.correct as f64;
                correct_count += 1;
                tally.correct += 1;
                tally.attempted += 1;
                (scheme.correct, true)
            }
            Some(_) => {
                negative_marks += scheme.wrong.abs() as f64;
                wrong_count += 1;
                tally.wrong += 1;
                tally.attempted += 1;
                (scheme.wrong, false)
            }
            None => {
                unattempted_count += 1;
                tally.unattempted += 1;
                (scheme.unattempted, false)
            }
        };

        total_marks += marks as f64;
        tally.marks += marks as f64;
        tally.max_marks += scheme.correct as f64;
        tally.total += 1;

        question_details.push(QuestionDetail {
            id: question.id,
            subject: question.subject.clone(),
            question: question.question.clone(),
            your_answer: user_answer,
            correct_answer: question.correct.clone(),
            is_correct,
            marks_obtained: marks,
            solution: question.solution.clone(),
        });
    }

    let attempted = correct_count + wrong_count;
    let accuracy = if attempted > 0 {
        correct_count as f64 / attempted as f64 * 100.0
    } else {
        0.0
    };

    let subject_results = tallies
        .into_iter()
        .map(|(subject, tally)| SubjectResult {
            subject,
            total_questions: tally.total,
            attempted: tally.attempted,
            correct: tally.correct,
            wrong: tally.wrong,
            unattempted: tally.unattempted,
            marks_obtained: tally.marks,
            max_marks: tally.max_marks,
            accuracy: if tally.attempted > 0 {
                tally.correct as f64 / tally.attempted as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();

    info!(
        total_marks,
        correct = correct_count,
        accuracy,
        "Evaluation complete"
    );

    Ok(EvaluationResult {
        total_marks,
        positive_marks,
        negative_marks,
        total_questions: questions.len(),
        attempted,
        correct: correct_count,
        wrong: wrong_count,
        unattempted: unattempted_count,
        accuracy,
        subject_results,
        question_details,
    })
}

/// Plain-language strengths, weaknesses, and recommendations derived from an
/// evaluation.
#[derive(Debug, Default, Serialize)]
pub struct PerformanceInsights {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

pub fn performance_insights(result: &EvaluationResult) -> PerformanceInsights {
    let mut insights = PerformanceInsights::default();

    if result.accuracy >= 80.0 {
        insights.strengths.push("Excellent overall accuracy".to_string());
    } else if result.accuracy >= 60.0 {
        insights.strengths.push("Good overall performance".to_string());
    } else {
        insights
            .weaknesses
            .push("Overall accuracy needs improvement".to_string());
    }

    for subject in &result.subject_results {
        if subject.accuracy >= 80.0 {
            insights
                .strengths
                .push(format!("Strong performance in {}", subject.subject));
        } else if subject.accuracy < 50.0 {
            insights
                .weaknesses
                .push(format!("Weak performance in {}", subject.subject));
            insights.recommendations.push(format!(
                "Focus more on {} - review concepts and practice more questions",
                subject.subject
            ));
        }
    }

    let attempt_rate = result.attempted as f64 / result.total_questions as f64 * 100.0;
    if attempt_rate < 80.0 {
        insights.recommendations.push(
            "Try to attempt more questions - unattempted questions give 0 marks".to_string(),
        );
    }

    if result.negative_marks > result.positive_marks * 0.3 {
        insights.recommendations.push(
            "Be more careful with answers - high negative marking detected".to_string(),
        );
    }

    insights
}
