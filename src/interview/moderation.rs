//! # Content Moderation Filter
//!
//! Hard-stop filter for unprofessional candidate speech. Each transcribed
//! input fragment is checked against a fixed word list with word-boundary
//! matching, so listed words never trigger as substrings of other words
//! ("die" does not match "died").
//!
//! Only candidate (input) transcription is checked, never the AI's own
//! output. Fragments are checked as they stream in without whole-utterance
//! context, so phrases spanning a fragment boundary can slip through. The
//! filter detects only; terminating the session is the caller's job.

use regex::Regex;
use std::sync::OnceLock;

/// Reason string sent with `terminateForViolation`.
pub const VIOLATION_REASON: &str = "Use of inappropriate language";

/// Disallowed words, matched case-insensitively as whole tokens.
const FLAGGED_WORDS: &[&str] = &[
    "kill", "killed", "murder", "die", "suicide", "bomb", "weapon", "stupid", "idiot", "moron",
    "hate", "bribe", "cheat", "damn", "bastard", "shit", "fuck",
];

fn flagged_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = FLAGGED_WORDS.join("|");
        Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("static regex")
    })
}

/// Returns true if the text contains any disallowed word.
pub fn check(text: &str) -> bool {
    flagged_pattern().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_listed_words() {
        assert!(check("you killed it"));
        assert!(check("I will pay you a bribe"));
        assert!(check("this is stupid"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(check("KILL"));
        assert!(check("Bribe"));
    }

    #[test]
    fn test_word_boundaries_only() {
        // "die" is listed but must not fire inside "died" or "diet"
        assert!(check("just die already"));
        assert!(!check("the species died out"));
        assert!(!check("a balanced diet"));
        // "kill" must not fire inside "skills"
        assert!(!check("my communication skills"));
    }

    #[test]
    fn test_clean_text_passes() {
        assert!(!check("reassign the budget"));
        assert!(!check("I studied thermodynamics and fluid mechanics"));
        assert!(!check(""));
    }
}
