//! # Exam Syllabus
//!
//! Static syllabus data for the supported exams: subjects and their chapter
//! lists, plus the per-exam marking scheme. Immutable for the process
//! lifetime and shared by validation, prompting, and the syllabus endpoint.

use crate::questions::models::{ExamType, MarkingScheme};

pub const JEE_SUBJECTS: &[&str] = &["Physics", "Chemistry", "Mathematics"];
pub const NEET_SUBJECTS: &[&str] = &["Physics", "Chemistry", "Botany", "Zoology"];

const JEE_PHYSICS: &[&str] = &[
    "Kinematics",
    "Laws of Motion",
    "Work Energy Power",
    "Rotational Motion",
    "Gravitation",
    "Properties of Matter",
    "Thermodynamics",
    "Kinetic Theory of Gases",
    "Oscillations",
    "Waves",
    "Electrostatics",
    "Current Electricity",
    "Magnetic Effects of Current",
    "Electromagnetic Induction",
    "Alternating Current",
    "Electromagnetic Waves",
    "Optics",
    "Dual Nature of Matter",
    "Atoms and Nuclei",
    "Semiconductor Devices",
    "Communication Systems",
];

const JEE_CHEMISTRY: &[&str] = &[
    "Atomic Structure",
    "Chemical Bonding",
    "States of Matter",
    "Thermodynamics",
    "Chemical Equilibrium",
    "Ionic Equilibrium",
    "Redox Reactions",
    "Electrochemistry",
    "Chemical Kinetics",
    "Surface Chemistry",
    "Periodic Table",
    "Hydrogen",
    "s-Block Elements",
    "p-Block Elements",
    "d-Block Elements",
    "f-Block Elements",
    "Coordination Compounds",
    "Metallurgy",
    "Organic Chemistry Basics",
    "Hydrocarbons",
    "Organic Compounds with Functional Groups",
    "Biomolecules",
    "Polymers",
    "Chemistry in Everyday Life",
];

const JEE_MATHEMATICS: &[&str] = &[
    "Sets and Relations",
    "Functions",
    "Trigonometry",
    "Complex Numbers",
    "Quadratic Equations",
    "Sequences and Series",
    "Permutations and Combinations",
    "Binomial Theorem",
    "Limits",
    "Continuity",
    "Differentiation",
    "Applications of Derivatives",
    "Integration",
    "Applications of Integrals",
    "Differential Equations",
    "Vectors",
    "3D Geometry",
    "Matrices and Determinants",
    "Probability",
    "Statistics",
    "Mathematical Reasoning",
    "Linear Programming",
];

const NEET_PHYSICS: &[&str] = &[
    "Physical World and Measurement",
    "Kinematics",
    "Laws of Motion",
    "Work Energy Power",
    "Rotational Motion",
    "Gravitation",
    "Properties of Solids and Liquids",
    "Thermodynamics",
    "Kinetic Theory of Gases",
    "Oscillations and Waves",
    "Electrostatics",
    "Current Electricity",
    "Magnetic Effects of Current",
    "Magnetism and Matter",
    "Electromagnetic Induction",
    "Alternating Current",
    "Electromagnetic Waves",
    "Optics",
    "Dual Nature of Matter",
    "Atoms and Nuclei",
    "Electronic Devices",
];

const NEET_CHEMISTRY: &[&str] = &[
    "Basic Concepts of Chemistry",
    "Atomic Structure",
    "Chemical Bonding",
    "States of Matter",
    "Thermodynamics",
    "Chemical Equilibrium",
    "Redox Reactions",
    "Hydrogen",
    "s-Block Elements",
    "p-Block Elements",
    "Organic Chemistry Basics",
    "Hydrocarbons",
    "Environmental Chemistry",
    "Solid State",
    "Solutions",
    "Electrochemistry",
    "Chemical Kinetics",
    "Surface Chemistry",
    "d and f Block Elements",
    "Coordination Compounds",
    "Haloalkanes and Haloarenes",
    "Alcohols Phenols and Ethers",
    "Aldehydes Ketones and Carboxylic Acids",
    "Organic Compounds with Nitrogen",
    "Biomolecules",
    "Polymers",
    "Chemistry in Everyday Life",
];

const NEET_BOTANY: &[&str] = &[
    "The Living World",
    "Biological Classification",
    "Plant Kingdom",
    "Morphology of Flowering Plants",
    "Anatomy of Flowering Plants",
    "Cell Structure and Function",
    "Cell Cycle and Division",
    "Transport in Plants",
    "Mineral Nutrition",
    "Photosynthesis",
    "Respiration in Plants",
    "Plant Growth and Development",
    "Reproduction in Organisms",
    "Sexual Reproduction in Flowering Plants",
    "Principles of Inheritance",
    "Molecular Basis of Inheritance",
    "Strategies for Enhancement in Food Production",
    "Organisms and Populations",
    "Ecosystem",
    "Biodiversity and Conservation",
    "Environmental Issues",
];

const NEET_ZOOLOGY: &[&str] = &[
    "Animal Kingdom",
    "Structural Organization in Animals",
    "Biomolecules",
    "Digestion and Absorption",
    "Breathing and Exchange of Gases",
    "Body Fluids and Circulation",
    "Excretory Products and Elimination",
    "Locomotion and Movement",
    "Neural Control and Coordination",
    "Chemical Coordination",
    "Human Reproduction",
    "Reproductive Health",
    "Evolution",
    "Human Health and Disease",
    "Microbes in Human Welfare",
    "Biotechnology Principles",
    "Biotechnology Applications",
];

/// List of subjects for an exam.
pub fn subjects(exam: ExamType) -> &'static [&'static str] {
    match exam {
        ExamType::Jee => JEE_SUBJECTS,
        ExamType::Neet => NEET_SUBJECTS,
    }
}

/// Chapter list for a subject, or None if the subject doesn't belong to the
/// exam.
pub fn chapters(exam: ExamType, subject: &str) -> Option<&'static [&'static str]> {
    match (exam, subject) {
        (ExamType::Jee, "Physics") => Some(JEE_PHYSICS),
        (ExamType::Jee, "Chemistry") => Some(JEE_CHEMISTRY),
        (ExamType::Jee, "Mathematics") => Some(JEE_MATHEMATICS),
        (ExamType::Neet, "Physics") => Some(NEET_PHYSICS),
        (ExamType::Neet, "Chemistry") => Some(NEET_CHEMISTRY),
        (ExamType::Neet, "Botany") => Some(NEET_BOTANY),
        (ExamType::Neet, "Zoology") => Some(NEET_ZOOLOGY),
        _ => None,
    }
}

pub fn is_valid_subject(exam: ExamType, subject: &str) -> bool {
    subjects(exam).contains(&subject)
}

pub fn is_valid_chapter(exam: ExamType, subject: &str, chapter: &str) -> bool {
    chapters(exam, subject)
        .map(|list| list.contains(&chapter))
        .unwrap_or(false)
}

/// Marking scheme for an exam. JEE and NEET both use +4/-1/0.
pub fn marking_scheme(_exam: ExamType) -> MarkingScheme {
    MarkingScheme::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_membership() {
        assert!(is_valid_subject(ExamType::Jee, "Mathematics"));
        assert!(!is_valid_subject(ExamType::Neet, "Mathematics"));
        assert!(is_valid_subject(ExamType::Neet, "Zoology"));
    }

    #[test]
    fn test_chapter_membership() {
        assert!(is_valid_chapter(ExamType::Jee, "Physics", "Kinematics"));
        assert!(!is_valid_chapter(ExamType::Jee, "Physics", "Photosynthesis"));
        assert!(is_valid_chapter(ExamType::Neet, "Botany", "Photosynthesis"));
    }

    #[test]
    fn test_unknown_subject_has_no_chapters() {
        assert!(chapters(ExamType::Jee, "Biology").is_none());
    }

    #[test]
    fn test_marking_scheme() {
        let scheme = marking_scheme(ExamType::Jee);
        assert_eq!(scheme.correct, 4);
        assert_eq!(scheme.wrong, -1);
        assert_eq!(scheme.unattempted, 0);
    }
}
