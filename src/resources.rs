//! Classroom activity suggestions for teachers, keyed by difficulty area and
//! grade group.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyArea {
    Reading,
    Math,
    Writing,
    Behavior,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown difficulty area '{0}' (expected reading, math, writing or behavior)")]
pub struct UnknownArea(pub String);

impl FromStr for DifficultyArea {
    type Err = UnknownArea;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reading" => Ok(DifficultyArea::Reading),
            "math" => Ok(DifficultyArea::Math),
            "writing" => Ok(DifficultyArea::Writing),
            "behavior" | "behaviour" => Ok(DifficultyArea::Behavior),
            _ => Err(UnknownArea(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GradeGroup {
    #[serde(rename = "K-2")]
    KToTwo,
    #[serde(rename = "3-5")]
    ThreeToFive,
    #[serde(rename = "6-8")]
    SixToEight,
}

impl GradeGroup {
    /// Accepts `K`, `1`..`8`, optionally prefixed with `Grade`. Anything past
    /// grade 5, or unrecognised, lands in 6-8.
    pub fn from_grade(grade: &str) -> Self {
        let trimmed = grade.trim();
        let level = trimmed
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("grade"))
            .map(|_| trimmed[5..].trim())
            .unwrap_or(trimmed);

        match level.to_ascii_uppercase().as_str() {
            "K" | "KG" | "KINDERGARTEN" | "0" | "1" | "2" => GradeGroup::KToTwo,
            "3" | "4" | "5" => GradeGroup::ThreeToFive,
            _ => GradeGroup::SixToEight,
        }
    }
}

const READING_K2: &[&str] = &[
    "Picture book discussion with visual cues",
    "Letter sound matching games",
    "Simple word building with letter tiles",
    "Reading comprehension with picture support",
    "Phonics songs and rhyming activities",
];
const READING_3_5: &[&str] = &[
    "Graphic organizer for story elements",
    "Vocabulary word maps with illustrations",
    "Partner reading with guided questions",
    "Reading response journals with prompts",
    "Text-to-self connection activities",
];
const READING_6_8: &[&str] = &[
    "Literature circles with differentiated roles",
    "Character analysis using graphic organizers",
    "Compare and contrast essays with templates",
    "Research projects with structured guidelines",
    "Reading strategy instruction (summarizing, questioning)",
];
const MATH_K2: &[&str] = &[
    "Hands-on counting with manipulatives",
    "Visual number line activities",
    "Shape recognition through real-world objects",
    "Simple addition/subtraction with pictures",
    "Math story problems with visual supports",
];
const MATH_3_5: &[&str] = &[
    "Fraction circles and visual representations",
    "Word problem solving with step-by-step guides",
    "Math journals for problem-solving strategies",
    "Multiplication games with visual arrays",
    "Real-world math applications (cooking, shopping)",
];
const MATH_6_8: &[&str] = &[
    "Algebra tiles for equation solving",
    "Geometric constructions with technology",
    "Data analysis projects with real data",
    "Mathematical modeling activities",
    "Peer tutoring for complex problem solving",
];
const WRITING_K2: &[&str] = &[
    "Picture prompts for creative writing",
    "Sentence frames for structured writing",
    "Interactive writing with teacher support",
    "Story sequencing activities",
    "Simple poetry with repetitive patterns",
];
const WRITING_3_5: &[&str] = &[
    "Graphic organizer for essay planning",
    "Peer editing with specific checklists",
    "Multi-step writing process instruction",
    "Genre studies with mentor texts",
    "Writing conferences with guided feedback",
];
const BEHAVIOR_ALL: &[&str] = &[
    "Positive behavior reinforcement system",
    "Clear classroom expectations with visual reminders",
    "Break cards for self-regulation",
    "Mindfulness and breathing exercises",
    "Social skills practice through role-play",
    "Sensory break activities",
    "Peer mentoring programs",
    "Goal-setting and progress tracking",
    "Conflict resolution strategies",
    "Emotional regulation techniques",
];

/// The pool an activity is drawn from. Writing has no 6-8 list and falls
/// back to 3-5; behavior ignores the grade.
pub fn activities(area: DifficultyArea, group: GradeGroup) -> &'static [&'static str] {
    use DifficultyArea::*;
    use GradeGroup::*;

    match (area, group) {
        (Reading, KToTwo) => READING_K2,
        (Reading, ThreeToFive) => READING_3_5,
        (Reading, SixToEight) => READING_6_8,
        (Math, KToTwo) => MATH_K2,
        (Math, ThreeToFive) => MATH_3_5,
        (Math, SixToEight) => MATH_6_8,
        (Writing, KToTwo) => WRITING_K2,
        (Writing, ThreeToFive | SixToEight) => WRITING_3_5,
        (Behavior, _) => BEHAVIOR_ALL,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySuggestion {
    pub area: DifficultyArea,
    pub grade_group: GradeGroup,
    pub activity: &'static str,
}

pub fn generate_activity<R: Rng + ?Sized>(
    area: DifficultyArea,
    grade: &str,
    rng: &mut R,
) -> ActivitySuggestion {
    let grade_group = GradeGroup::from_grade(grade);
    let pool = activities(area, grade_group);
    ActivitySuggestion {
        area,
        grade_group,
        activity: pool[rng.gen_range(0..pool.len())],
    }
}
