//! # Question Data Models
//!
//! Typed structures for generated questions, generation requests, and
//! evaluation results. These are the wire shapes of the question API, so
//! everything here derives Serialize/Deserialize.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Supported competitive exams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExamType {
    #[serde(rename = "JEE")]
    Jee,
    #[serde(rename = "NEET")]
    Neet,
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamType::Jee => write!(f, "JEE"),
            ExamType::Neet => write!(f, "NEET"),
        }
    }
}

impl FromStr for ExamType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "JEE" => Ok(ExamType::Jee),
            "NEET" => Ok(ExamType::Neet),
            other => Err(format!("Invalid exam type: {}. Must be one of: JEE, NEET", other)),
        }
    }
}

/// Question difficulty levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "Easy"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::Hard => write!(f, "Hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            other => Err(format!(
                "Invalid difficulty: {}. Must be one of: Easy, Medium, Hard",
                other
            )),
        }
    }
}

/// A single multiple-choice question.
///
/// Options are a BTreeMap so serialized papers always list A..D in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub subject: String,
    pub question: String,
    pub options: BTreeMap<String, String>,
    pub correct: String,
    pub solution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default = "default_marks")]
    pub marks: i32,
}

fn default_marks() -> i32 {
    4
}

/// Per-subject slice of a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectRequest {
    /// Chapters to draw from; empty means the full syllabus for the subject
    #[serde(default)]
    pub chapters: Vec<String>,
    pub num_questions: usize,
    pub difficulty: Difficulty,
}

/// Body of `POST /api/v1/questions/generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub exam: ExamType,
    /// Subject name -> generation parameters
    pub subjects: BTreeMap<String, SubjectRequest>,
}

impl GenerationRequest {
    pub fn total_requested(&self) -> usize {
        self.subjects.values().map(|s| s.num_questions).sum()
    }
}

/// A generated paper plus bookkeeping about how it was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPaper {
    pub questions: Vec<Question>,
    pub by_subject: BTreeMap<String, Vec<u32>>,
    pub metadata: GenerationMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub exam: ExamType,
    pub total_questions: usize,
    pub subjects: Vec<String>,
    pub generation_time_secs: f64,
    pub model: String,
    pub temperature: f32,
    /// Fraction of parsed questions that survived validation
    pub success_rate: f64,
}

/// Marking scheme applied during evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MarkingScheme {
    pub correct: i32,
    pub wrong: i32,
    pub unattempted: i32,
}

impl Default for MarkingScheme {
    fn default() -> Self {
        Self {
            correct: 4,
            wrong: -1,
            unattempted: 0,
        }
    }
}

/// Results for a single subject within an evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectResult {
    pub subject: String,
    pub total_questions: usize,
    pub attempted: usize,
    pub correct: usize,
    pub wrong: usize,
    pub unattempted: usize,
    pub marks_obtained: f64,
    pub max_marks: f64,
    pub accuracy: f64,
}

/// Per-question detail row in an evaluation response.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionDetail {
    pub id: u32,
    pub subject: String,
    pub question: String,
    pub your_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub marks_obtained: i32,
    pub solution: String,
}

/// Complete evaluation of a test attempt.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub total_marks: f64,
    pub positive_marks: f64,
    pub negative_marks: f64,
    pub total_questions: usize,
    pub attempted: usize,
    pub correct: usize,
    pub wrong: usize,
    pub unattempted: usize,
    pub accuracy: f64,
    pub subject_results: Vec<SubjectResult>,
    pub question_details: Vec<QuestionDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_type_round_trip() {
        assert_eq!("JEE".parse::<ExamType>().unwrap(), ExamType::Jee);
        assert_eq!(ExamType::Neet.to_string(), "NEET");
        assert!("UPSC".parse::<ExamType>().is_err());
    }

    #[test]
    fn test_exam_type_serde_uses_uppercase() {
        let json = serde_json::to_string(&ExamType::Jee).unwrap();
        assert_eq!(json, "\"JEE\"");
        let parsed: ExamType = serde_json::from_str("\"NEET\"").unwrap();
        assert_eq!(parsed, ExamType::Neet);
    }

    #[test]
    fn test_generation_request_total() {
        let json = r#"{
            "exam": "JEE",
            "subjects": {
                "Physics": {"chapters": ["Kinematics"], "num_questions": 10, "difficulty": "Medium"},
                "Chemistry": {"chapters": [], "num_questions": 5, "difficulty": "Hard"}
            }
        }"#;
        let request: GenerationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.total_requested(), 15);
        assert!(request.subjects["Chemistry"].chapters.is_empty());
    }

    #[test]
    fn test_question_default_marks() {
        let json = r#"{
            "id": 0,
            "subject": "Physics",
            "question": "What is the SI unit of force?",
            "options": {"A": "Newton", "B": "Joule", "C": "Watt", "D": "Pascal"},
            "correct": "A",
            "solution": "Force is measured in newtons."
        }"#;
        let question: Question = serde_json::from_str(json).unwrap();
        assert_eq!(question.marks, 4);
    }
}
