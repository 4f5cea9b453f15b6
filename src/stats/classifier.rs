//! Classifier Module
//! Letter grade and graduation predicate rules.
//!
//! Both classifiers are ordered rule lists with inclusive lower bounds.
//! The first matching rule wins, so rule order is part of the contract.

use std::fmt;

/// Letter grade derived from GPA, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    A,
    BPlus,
    B,
    C,
    D,
}

/// (minimum GPA, grade), evaluated top to bottom.
const GRADE_RULES: [(f64, Grade); 4] = [
    (3.75, Grade::A),
    (3.50, Grade::BPlus),
    (3.00, Grade::B),
    (2.50, Grade::C),
];

impl Grade {
    /// Classify a GPA. Total over all reals; NaN falls through to `D`.
    pub fn from_gpa(gpa: f64) -> Self {
        GRADE_RULES
            .iter()
            .find(|(min_gpa, _)| gpa >= *min_gpa)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::D)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Graduation predicate (honors tier), best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Predicate {
    Cumlaude,
    VerySatisfactory,
    Satisfactory,
    Sufficient,
}

/// A predicate rule: minimum GPA and optional maximum study duration.
struct PredicateRule {
    min_gpa: f64,
    max_semesters: Option<f64>,
    predicate: Predicate,
}

const PREDICATE_RULES: [PredicateRule; 3] = [
    PredicateRule {
        min_gpa: 3.75,
        max_semesters: Some(8.0),
        predicate: Predicate::Cumlaude,
    },
    PredicateRule {
        min_gpa: 3.50,
        max_semesters: Some(9.0),
        predicate: Predicate::VerySatisfactory,
    },
    PredicateRule {
        min_gpa: 3.00,
        max_semesters: None,
        predicate: Predicate::Satisfactory,
    },
];

impl PredicateRule {
    fn matches(&self, gpa: f64, semesters: f64) -> bool {
        gpa >= self.min_gpa && self.max_semesters.map_or(true, |max| semesters <= max)
    }
}

impl Predicate {
    /// Classify a (GPA, study duration in semesters) pair.
    pub fn classify(gpa: f64, semesters: f64) -> Self {
        PREDICATE_RULES
            .iter()
            .find(|rule| rule.matches(gpa, semesters))
            .map(|rule| rule.predicate)
            .unwrap_or(Predicate::Sufficient)
    }

    /// Official predicate wording used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Predicate::Cumlaude => "Cumlaude (Dengan Pujian)",
            Predicate::VerySatisfactory => "Sangat Memuaskan",
            Predicate::Satisfactory => "Memuaskan",
            Predicate::Sufficient => "Cukup",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
