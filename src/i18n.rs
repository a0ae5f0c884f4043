//! Typed UI strings. Every `TextKey` must have a translation in every
//! `Language`; the exhaustive match enforces that at compile time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Somali,
}

impl Language {
    /// Parses `en`, `so`, `English`, `Somali` or an `Accept-Language` value
    /// such as `so-SO,so;q=0.9`.
    pub fn from_code(code: &str) -> Option<Self> {
        let primary = code
            .split(',')
            .next()
            .and_then(|tag| tag.split(';').next())
            .and_then(|tag| tag.split('-').next())
            .map(|tag| tag.trim().to_ascii_lowercase())?;

        match primary.as_str() {
            "en" | "english" => Some(Language::English),
            "so" | "somali" => Some(Language::Somali),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    LowRisk,
    MediumRisk,
    HighRisk,
    SampleModelNotice,
    PredictionSaved,
    ObservationSaved,
    Welcome,
    LoggedOut,

    // Page headings and form labels.
    AppTitle,
    SignIn,
    Username,
    Password,
    StudentAssessment,
    StudentName,
    GradeLevel,
    MathScore,
    ReadingScore,
    WritingScore,
    Attendance,
    BehaviorRating,
    LiteracyLevel,
    SaveAssessment,
    AssessRisk,
    BatchAssessment,
    BatchInstructions,
    SummarizeBatch,
    Dashboard,
    ModelInfo,
    ClassroomActivity,
    SuggestActivity,

    // Weekly observation insights.
    GreatHomework,
    HomeworkNeedsAttention,
    HomeworkConcerning,
    ExcellentBehavior,
    GoodBehavior,
    BehaviorNeedsSupport,
    HomeworkImproved,
    BehaviorImproved,
    MoodImproved,
}

pub fn text(key: TextKey, language: Language) -> &'static str {
    use Language::*;
    use TextKey::*;

    match (key, language) {
        (LowRisk, English) => "Low Risk",
        (LowRisk, Somali) => "Khatar Hoose",
        (MediumRisk, English) => "Medium Risk",
        (MediumRisk, Somali) => "Khatar Dhexe",
        (HighRisk, English) => "High Risk",
        (HighRisk, Somali) => "Khatar Sare",
        (SampleModelNotice, English) => {
            "Note: Using sample prediction model. Replace with your trained model file."
        }
        (SampleModelNotice, Somali) => {
            "Fiiro gaar ah: Waxaa la isticmaalayaa tusaale moodel. Ku beddel faylka moodelkaaga."
        }
        (PredictionSaved, English) => "Prediction saved successfully!",
        (PredictionSaved, Somali) => "Saadaasha si guul leh ayaa loo kaydiyay!",
        (ObservationSaved, English) => "Observation saved successfully!",
        (ObservationSaved, Somali) => "Indha-indheynta si guul leh ayaa loo kaydiyay!",
        (Welcome, English) => "Welcome",
        (Welcome, Somali) => "Soo dhawoow",
        (LoggedOut, English) => "You have been logged out.",
        (LoggedOut, Somali) => "Waad ka baxday.",
        (AppTitle, English) => "EduScan Learning Risk Assessment",
        (AppTitle, Somali) => "EduScan Qiimeynta Khatarta Waxbarashada",
        (SignIn, English) => "Sign in",
        (SignIn, Somali) => "Gal",
        (Username, English) => "Username",
        (Username, Somali) => "Magaca isticmaalaha",
        (Password, English) => "Password",
        (Password, Somali) => "Furaha sirta ah",
        (StudentAssessment, English) => "Student assessment",
        (StudentAssessment, Somali) => "Qiimeynta ardayga",
        (StudentName, English) => "Student name",
        (StudentName, Somali) => "Magaca ardayga",
        (GradeLevel, English) => "Grade level",
        (GradeLevel, Somali) => "Fasalka",
        (MathScore, English) => "Math score (0-100)",
        (MathScore, Somali) => "Dhibcaha xisaabta (0-100)",
        (ReadingScore, English) => "Reading score (0-100)",
        (ReadingScore, Somali) => "Dhibcaha akhriska (0-100)",
        (WritingScore, English) => "Writing score (0-100)",
        (WritingScore, Somali) => "Dhibcaha qoraalka (0-100)",
        (Attendance, English) => "Attendance (%)",
        (Attendance, Somali) => "Imaanshaha (%)",
        (BehaviorRating, English) => "Behavior rating (1-5)",
        (BehaviorRating, Somali) => "Qiimeynta dabeecadda (1-5)",
        (LiteracyLevel, English) => "Literacy level (1-10)",
        (LiteracyLevel, Somali) => "Heerka akhris-qoraalka (1-10)",
        (SaveAssessment, English) => "Save this assessment",
        (SaveAssessment, Somali) => "Kaydi qiimeyntan",
        (AssessRisk, English) => "Assess learning risk",
        (AssessRisk, Somali) => "Qiimee khatarta waxbarashada",
        (BatchAssessment, English) => "Batch assessment",
        (BatchAssessment, Somali) => "Qiimeyn koox ah",
        (BatchInstructions, English) => {
            "Paste a CSV with math_score, reading_score, writing_score, attendance, behavior and literacy columns."
        }
        (BatchInstructions, Somali) => {
            "Ku dheji CSV leh tiirarka math_score, reading_score, writing_score, attendance, behavior iyo literacy."
        }
        (SummarizeBatch, English) => "Summarize batch",
        (SummarizeBatch, Somali) => "Soo koob kooxda",
        (Dashboard, English) => "Dashboard",
        (Dashboard, Somali) => "Shaxda xogta",
        (ModelInfo, English) => "Model info",
        (ModelInfo, Somali) => "Macluumaadka moodelka",
        (ClassroomActivity, English) => "Classroom activity",
        (ClassroomActivity, Somali) => "Hawlaha fasalka",
        (SuggestActivity, English) => "Suggest an activity",
        (SuggestActivity, Somali) => "Soo jeedi hawl",
        (GreatHomework, English) => "Great homework completion!",
        (GreatHomework, Somali) => "Dhammaystirka casharrada guriga waa heer sare!",
        (HomeworkNeedsAttention, English) => "Homework completion needs attention",
        (HomeworkNeedsAttention, Somali) => "Dhammaystirka casharrada guriga wuxuu u baahan yahay fiiro",
        (HomeworkConcerning, English) => "Homework completion is concerning",
        (HomeworkConcerning, Somali) => "Dhammaystirka casharrada guriga waa walaac",
        (ExcellentBehavior, English) => "Excellent behavior this week!",
        (ExcellentBehavior, Somali) => "Dabeecad heer sare ah toddobaadkan!",
        (GoodBehavior, English) => "Good behavior overall",
        (GoodBehavior, Somali) => "Dabeecad wanaagsan guud ahaan",
        (BehaviorNeedsSupport, English) => "Behavior needs support",
        (BehaviorNeedsSupport, Somali) => "Dabeecaddu waxay u baahan tahay taageero",
        (HomeworkImproved, English) => "Homework completion improved!",
        (HomeworkImproved, Somali) => "Dhammaystirka casharrada guriga wuu fiicnaaday!",
        (BehaviorImproved, English) => "Behavior rating improved!",
        (BehaviorImproved, Somali) => "Qiimeynta dabeecadda way fiicnaatay!",
        (MoodImproved, English) => "Mood has improved!",
        (MoodImproved, Somali) => "Niyaddu way fiicnaatay!",
    }
}
