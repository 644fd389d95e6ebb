//! # LLM Output Parser
//!
//! Extracts structured questions from raw Gemini output. The model is asked
//! for a strict `Q1. / A) / ... / Answer: / Solution:` layout (see
//! `questions::prompt`), but real output drifts, so parsing is two-stage:
//! a primary block splitter keyed on `Qn.` headings, and a fallback splitter
//! on blank lines for malformed output. Questions that fail structural
//! validation are dropped and counted rather than failing the batch.

use crate::error::{AppError, AppResult};
use crate::questions::models::Question;
use crate::questions::validator::{is_valid_question, sanitize_text};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

fn question_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*Q\d+\.").expect("static regex"))
}

fn answer_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Answer:\s*([A-D])\b").expect("static regex"))
}

fn solution_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)Solution:\s*(.*)").expect("static regex"))
}

fn option_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*([A-D])\)\s*(.+)$").expect("static regex"))
}

/// Outcome of parsing one LLM response.
#[derive(Debug)]
pub struct ParsedBatch {
    pub questions: Vec<Question>,
    /// Blocks the splitter produced, before validation
    pub parsed_count: usize,
    /// Parsed questions dropped by validation
    pub invalid_count: usize,
}

impl ParsedBatch {
    pub fn success_rate(&self) -> f64 {
        if self.parsed_count > 0 {
            self.questions.len() as f64 / self.parsed_count as f64
        } else {
            0.0
        }
    }
}

/// Parse LLM output into validated questions.
///
/// Truncation to `expected_count` happens immediately after splitting so a
/// model that over-generates can't inflate the batch.
pub fn parse_llm_output(
    text: &str,
    subject: &str,
    expected_count: Option<usize>,
) -> AppResult<ParsedBatch> {
    info!(subject = %subject, chars = text.len(), "Parsing LLM output");

    if text.trim().is_empty() {
        return Err(AppError::Upstream("Empty LLM output".to_string()));
    }

    let mut questions = parse_blocks(text, subject);
    if questions.is_empty() {
        warn!(subject = %subject, "Primary parsing produced nothing, trying fallback");
        questions = parse_fallback(text, subject);
    }

    if questions.is_empty() {
        return Err(AppError::Upstream(format!(
            "Failed to parse any questions from LLM output for {}",
            subject
        )));
    }

    if let Some(expected) = expected_count {
        if questions.len() > expected {
            warn!(
                subject = %subject,
                parsed = questions.len(),
                expected,
                "Truncating over-generated questions"
            );
            questions.truncate(expected);
        }
    }

    let parsed_count = questions.len();
    let mut valid = Vec::with_capacity(parsed_count);
    let mut invalid_count = 0;

    for (i, mut question) in questions.into_iter().enumerate() {
        question.id = i as u32;
        if is_valid_question(&question) {
            valid.push(question);
        } else {
            invalid_count += 1;
            debug!(subject = %subject, index = i, "Question failed validation");
        }
    }

    info!(
        subject = %subject,
        valid = valid.len(),
        invalid = invalid_count,
        "Parsing complete"
    );

    Ok(ParsedBatch {
        questions: valid,
        parsed_count,
        invalid_count,
    })
}

/// Primary strategy: split on `Qn.` headings.
fn parse_blocks(text: &str, subject: &str) -> Vec<Question> {
    let starts: Vec<usize> = question_heading().find_iter(text).map(|m| m.start()).collect();
    if starts.is_empty() {
        return Vec::new();
    }

    let mut questions = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        if let Some(question) = parse_question_block(&text[start..end], subject) {
            questions.push(question);
        }
    }

    questions
}

/// Fallback strategy for output without clean headings: split on blank lines
/// and keep only blocks that look substantial and carry enough options.
fn parse_fallback(text: &str, subject: &str) -> Vec<Question> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|block| block.len() > 50)
        .filter_map(|block| parse_question_block(block, subject))
        .filter(|q| q.options.len() >= 3)
        .collect()
}

/// Parse a single question block into its parts.
fn parse_question_block(block: &str, subject: &str) -> Option<Question> {
    let correct = answer_pattern()
        .captures(block)
        .map(|c| c[1].to_uppercase())?;

    let solution = solution_pattern()
        .captures(block)
        .map(|c| sanitize_text(&c[1], None))
        .unwrap_or_default();

    // Strip the answer/solution tail so option and question extraction only
    // sees the body of the block
    let body_end = answer_pattern()
        .find(block)
        .map(|m| m.start())
        .unwrap_or(block.len());
    let body = &block[..body_end];

    let mut options = BTreeMap::new();
    let mut first_option_offset = body.len();
    for caps in option_pattern().captures_iter(body) {
        let key = caps[1].to_uppercase();
        let value = sanitize_text(&caps[2], None);
        if let Some(m) = caps.get(0) {
            first_option_offset = first_option_offset.min(m.start());
        }
        options.insert(key, value);
    }

    // Question text is everything between the Qn. heading and the first
    // option line
    let heading = &body[..first_option_offset];
    let question_text = heading
        .lines()
        .map(|line| {
            question_heading()
                .find(line)
                .map(|m| line[m.end()..].trim())
                .unwrap_or_else(|| line.trim())
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if question_text.is_empty() {
        return None;
    }

    Some(Question {
        id: 0,
        subject: subject.to_string(),
        question: sanitize_text(&question_text, None),
        options,
        correct,
        solution,
        chapter: None,
        difficulty: None,
        marks: 4,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
Q1. What is the SI unit of force?
A) Newton
B) Joule
C) Watt
D) Pascal
Answer: A
Solution: Force is measured in newtons, named after Isaac Newton.

Q2. Which gas is most abundant in Earth's atmosphere?
A) Oxygen
B) Carbon dioxide
C) Nitrogen
D) Argon
Answer: C
Solution: Nitrogen makes up about 78 percent of the atmosphere by volume.
";

    #[test]
    fn test_parses_well_formed_output() {
        let batch = parse_llm_output(WELL_FORMED, "Physics", None).unwrap();
        assert_eq!(batch.questions.len(), 2);
        assert_eq!(batch.invalid_count, 0);

        let first = &batch.questions[0];
        assert_eq!(first.id, 0);
        assert_eq!(first.question, "What is the SI unit of force?");
        assert_eq!(first.options["A"], "Newton");
        assert_eq!(first.options.len(), 4);
        assert_eq!(first.correct, "A");
        assert!(first.solution.starts_with("Force is measured"));

        assert_eq!(batch.questions[1].correct, "C");
    }

    #[test]
    fn test_truncates_to_expected_count() {
        let batch = parse_llm_output(WELL_FORMED, "Physics", Some(1)).unwrap();
        assert_eq!(batch.questions.len(), 1);
        assert_eq!(batch.parsed_count, 1);
    }

    #[test]
    fn test_block_missing_answer_is_dropped() {
        let text = "\
Q1. A question with no answer line at all, which cannot be scored?
A) One
B) Two
C) Three
D) Four
Solution: No answer was given so this block is unusable for an exam.

Q2. What is the SI unit of force?
A) Newton
B) Joule
C) Watt
D) Pascal
Answer: A
Solution: Force is measured in newtons, named after Isaac Newton.
";
        let batch = parse_llm_output(text, "Physics", None).unwrap();
        assert_eq!(batch.questions.len(), 1);
        assert_eq!(batch.questions[0].correct, "A");
    }

    #[test]
    fn test_invalid_question_counted_not_fatal() {
        // Q1 has only two options, so validation drops it
        let text = "\
Q1. Which of these is a prime number bigger than ten?
A) Eleven
B) Twelve
Answer: A
Solution: Eleven is only divisible by one and itself.

Q2. What is the SI unit of force?
A) Newton
B) Joule
C) Watt
D) Pascal
Answer: A
Solution: Force is measured in newtons, named after Isaac Newton.
";
        let batch = parse_llm_output(text, "Mathematics", None).unwrap();
        assert_eq!(batch.questions.len(), 1);
        assert_eq!(batch.invalid_count, 1);
        assert!(batch.success_rate() < 1.0);
    }

    #[test]
    fn test_empty_output_is_error() {
        assert!(parse_llm_output("   \n ", "Physics", None).is_err());
        assert!(parse_llm_output("No questions here at all.", "Physics", None).is_err());
    }

    #[test]
    fn test_multiline_question_text() {
        let text = "\
Q1. A block of mass 2 kg rests on a frictionless surface.
If a 10 N force acts on it, what is its acceleration?
A) 2 m/s^2
B) 5 m/s^2
C) 10 m/s^2
D) 20 m/s^2
Answer: B
Solution: Using F = ma, a = 10 / 2 = 5 m/s^2 for the block.
";
        let batch = parse_llm_output(text, "Physics", None).unwrap();
        assert_eq!(batch.questions.len(), 1);
        assert!(batch.questions[0].question.contains("frictionless surface"));
        assert!(batch.questions[0].question.contains("what is its acceleration?"));
    }

    #[test]
    fn test_ids_assigned_sequentially() {
        let batch = parse_llm_output(WELL_FORMED, "Physics", None).unwrap();
        let ids: Vec<u32> = batch.questions.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }
}
