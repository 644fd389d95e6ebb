//! # Prompt Templates
//!
//! Builds the question-generation prompt sent to Gemini: a base template
//! with exam/subject/chapter/count/difficulty slots, a difficulty-specific
//! focus block, and a per-subject few-shot example to anchor the output
//! format. The parser in `questions::parser` depends on the "Strict Format"
//! section here staying in sync with its regexes.

use crate::questions::models::Difficulty;

const DIFFICULTY_EASY_FOCUS: &str = "\
Focus on:
- Basic concepts and definitions
- Direct application of formulas
- Recall-based questions
- Fundamental understanding
";

const DIFFICULTY_MEDIUM_FOCUS: &str = "\
Focus on:
- Application of concepts
- Multi-step problem solving
- Conceptual understanding
- Standard exam-level difficulty
";

const DIFFICULTY_HARD_FOCUS: &str = "\
Focus on:
- Complex problem solving
- Integration of multiple concepts
- Advanced applications
- Analytical and critical thinking
- Tricky but fair scenarios
";

const EXAMPLE_PHYSICS: &str = "\
**Example Question**:

Q1. A particle starts from rest with constant acceleration and covers 36 m in the 5th second of its motion. What is its acceleration?
A) 4 m/s^2
B) 8 m/s^2
C) 12 m/s^2
D) 16 m/s^2
Answer: B
Solution: Distance in the nth second is s_n = u + (a/2)(2n - 1). With u = 0 and n = 5: 36 = (a/2)(9), so a = 8 m/s^2.
";

const EXAMPLE_CHEMISTRY: &str = "\
**Example Question**:

Q1. Which of the following has the highest lattice energy?
A) NaCl
B) NaF
C) NaBr
D) NaI
Answer: B
Solution: Lattice energy is inversely proportional to the sum of ionic radii. F- has the smallest ionic radius among the halides, so NaF has the highest lattice energy.
";

const EXAMPLE_MATHEMATICS: &str = "\
**Example Question**:

Q1. What is the derivative of f(x) = x^3 + 2x^2 - 5x + 7?
A) 3x^2 + 4x - 5
B) 3x^2 + 2x - 5
C) x^2 + 4x - 5
D) 3x^2 + 4x + 5
Answer: A
Solution: Using the power rule: d/dx(x^3) = 3x^2, d/dx(2x^2) = 4x, d/dx(-5x) = -5. Therefore f'(x) = 3x^2 + 4x - 5.
";

const EXAMPLE_BIOLOGY: &str = "\
**Example Question**:

Q1. During which phase of the cell cycle does DNA replication occur?
A) G1 phase
B) S phase
C) G2 phase
D) M phase
Answer: B
Solution: DNA replication occurs during the S (Synthesis) phase of interphase. G1 and G2 are gap phases for cell growth, and M phase is for mitosis.
";

fn difficulty_focus(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => DIFFICULTY_EASY_FOCUS,
        Difficulty::Medium => DIFFICULTY_MEDIUM_FOCUS,
        Difficulty::Hard => DIFFICULTY_HARD_FOCUS,
    }
}

fn subject_example(subject: &str) -> Option<&'static str> {
    match subject {
        "Physics" => Some(EXAMPLE_PHYSICS),
        "Chemistry" => Some(EXAMPLE_CHEMISTRY),
        "Mathematics" => Some(EXAMPLE_MATHEMATICS),
        "Botany" | "Zoology" => Some(EXAMPLE_BIOLOGY),
        _ => None,
    }
}

/// Build the full generation prompt for one subject.
pub fn build_prompt(
    exam: &str,
    subject: &str,
    chapters: &[String],
    num_questions: usize,
    difficulty: Difficulty,
) -> String {
    let chapter_list = chapters.join(", ");

    let mut prompt = format!(
        "You are an expert {exam} question paper setter with deep knowledge of {subject}.

**Task**: Generate {num_questions} high-quality Multiple Choice Questions (MCQs).

**Specifications**:
- Subject: {subject}
- Chapters: {chapter_list}
- Difficulty Level: {difficulty}
- Exam Standard: {exam} (Indian competitive exam)

**Quality Requirements**:
1. Questions must be exam-level difficulty and conceptually accurate
2. Each question must test a specific concept or application
3. All 4 options should be plausible to avoid obvious elimination
4. Solutions must be clear, concise, and educationally valuable
5. Avoid ambiguous wording or trick questions

**Strict Format** (Follow EXACTLY):

Q1. [Clear, specific question text]
A) [First option]
B) [Second option]
C) [Third option]
D) [Fourth option]
Answer: [A/B/C/D]
Solution: [Brief explanation of why the answer is correct]

Q2. [Next question...]
A) [option]
B) [option]
C) [option]
D) [option]
Answer: [A/B/C/D]
Solution: [explanation]

**Important Notes**:
- Number questions sequentially (Q1, Q2, Q3, ...)
- Use EXACTLY the format shown above
- Include all 4 options (A, B, C, D) for every question
- Provide the correct answer letter (A, B, C, or D)
- Keep solutions under 100 words
- Do not include any extra text, headers, or commentary

Generate {num_questions} questions now:
"
    );

    prompt.push('\n');
    prompt.push_str(difficulty_focus(difficulty));

    if let Some(example) = subject_example(subject) {
        prompt.push('\n');
        prompt.push_str(example);
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_slots() {
        let chapters = vec!["Kinematics".to_string(), "Waves".to_string()];
        let prompt = build_prompt("JEE", "Physics", &chapters, 12, Difficulty::Hard);

        assert!(prompt.contains("Generate 12 high-quality Multiple Choice Questions"));
        assert!(prompt.contains("Subject: Physics"));
        assert!(prompt.contains("Chapters: Kinematics, Waves"));
        assert!(prompt.contains("Difficulty Level: Hard"));
        assert!(prompt.contains("Exam Standard: JEE"));
    }

    #[test]
    fn test_difficulty_modifier_appended() {
        let chapters = vec!["Trigonometry".to_string()];
        let easy = build_prompt("JEE", "Mathematics", &chapters, 5, Difficulty::Easy);
        let hard = build_prompt("JEE", "Mathematics", &chapters, 5, Difficulty::Hard);

        assert!(easy.contains("Recall-based questions"));
        assert!(!easy.contains("Tricky but fair scenarios"));
        assert!(hard.contains("Tricky but fair scenarios"));
    }

    #[test]
    fn test_subject_example_included() {
        let chapters = vec!["Photosynthesis".to_string()];
        let prompt = build_prompt("NEET", "Botany", &chapters, 5, Difficulty::Medium);
        assert!(prompt.contains("DNA replication"));
    }
}
