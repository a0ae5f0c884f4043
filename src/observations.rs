//! Daily parent observations: entry validation, per-child queries, weekly
//! averages and CSV export.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

use crate::i18n::TextKey;
use crate::store::{JsonStore, StoreError};

/// Log view shows at most this many entries.
pub const LOG_LIMIT: usize = 20;

/// Observations dated before this year are rejected.
pub const EARLIEST_YEAR: i32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusLevel {
    Poor,
    BelowAverage,
    Average,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyLevel {
    VeryLow,
    Low,
    Normal,
    High,
    VeryHigh,
}

/// Form payload for a new observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationEntry {
    pub child_name: String,
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub homework_completion: u32,
    pub reading_time: u32,
    pub focus_level: FocusLevel,
    #[serde(default)]
    pub subjects_struggled: Vec<String>,
    pub behavior_rating: u8,
    pub mood_rating: u8,
    pub sleep_hours: f64,
    pub energy_level: EnergyLevel,
    #[serde(default)]
    pub social_interactions: String,
    #[serde(default)]
    pub learning_wins: String,
    #[serde(default)]
    pub challenges_faced: String,
    #[serde(default)]
    pub strategies_used: String,
    pub screen_time: f64,
    pub physical_activity: u32,
    #[serde(default)]
    pub medication_taken: bool,
    #[serde(default)]
    pub special_events: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentObservation {
    pub child_name: String,
    pub date: NaiveDate,
    pub homework_completion: u32,
    pub reading_time: u32,
    pub focus_level: FocusLevel,
    pub subjects_struggled: Vec<String>,
    pub behavior_rating: u8,
    pub mood_rating: u8,
    pub sleep_hours: f64,
    pub energy_level: EnergyLevel,
    pub social_interactions: String,
    pub learning_wins: String,
    pub challenges_faced: String,
    pub strategies_used: String,
    pub screen_time: f64,
    pub physical_activity: u32,
    pub medication_taken: bool,
    pub special_events: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("observation failed validation: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("an observation for {child} on {date} already exists")]
    Duplicate { child: String, date: NaiveDate },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ObservationEntry {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.child_name.trim().is_empty() {
            errors.push("Child name is required".to_string());
        }
        if self.homework_completion > 100 {
            errors.push("Homework completion must be between 0 and 100%".to_string());
        }
        if self.reading_time > 180 {
            errors.push("Reading time must be between 0 and 180 minutes".to_string());
        }
        if !(1..=5).contains(&self.behavior_rating) {
            errors.push("Behavior rating must be between 1 and 5".to_string());
        }
        if !(1..=5).contains(&self.mood_rating) {
            errors.push("Mood rating must be between 1 and 5".to_string());
        }
        if !(4.0..=12.0).contains(&self.sleep_hours) {
            errors.push("Sleep hours must be between 4 and 12".to_string());
        }
        if !(0.0..=12.0).contains(&self.screen_time) {
            errors.push("Screen time must be between 0 and 12 hours".to_string());
        }
        if self.physical_activity > 300 {
            errors.push("Physical activity must be between 0 and 300 minutes".to_string());
        }

        errors
    }

    /// Validates and stamps the entry. `today` fills in a missing date.
    pub fn into_observation(
        self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<ParentObservation, ObservationError> {
        let date = self.date.unwrap_or(today);
        let mut errors = self.validate();
        // One day of slack for clients ahead of UTC.
        let latest = today.succ_opt().unwrap_or(today);
        if date > latest {
            errors.push("Observation date cannot be in the future".to_string());
        } else if date.year() < EARLIEST_YEAR {
            errors.push(format!("Observation date must be in {EARLIEST_YEAR} or later"));
        }
        if !errors.is_empty() {
            return Err(ObservationError::Invalid(errors));
        }

        Ok(ParentObservation {
            child_name: self.child_name.trim().to_string(),
            date,
            homework_completion: self.homework_completion,
            reading_time: self.reading_time,
            focus_level: self.focus_level,
            subjects_struggled: self.subjects_struggled,
            behavior_rating: self.behavior_rating,
            mood_rating: self.mood_rating,
            sleep_hours: self.sleep_hours,
            energy_level: self.energy_level,
            social_interactions: self.social_interactions,
            learning_wins: self.learning_wins,
            challenges_faced: self.challenges_faced,
            strategies_used: self.strategies_used,
            screen_time: self.screen_time,
            physical_activity: self.physical_activity,
            medication_taken: self.medication_taken,
            special_events: self.special_events,
            timestamp: now,
        })
    }
}

/// Appends an observation unless the child already has one for that date.
pub fn record(
    store: &JsonStore<ParentObservation>,
    observation: &ParentObservation,
) -> Result<(), ObservationError> {
    let exists = store
        .load_all()
        .iter()
        .any(|o| o.child_name == observation.child_name && o.date == observation.date);
    if exists {
        return Err(ObservationError::Duplicate {
            child: observation.child_name.clone(),
            date: observation.date,
        });
    }

    store.append(observation)?;
    info!(
        "Recorded observation for {} on {}",
        observation.child_name, observation.date
    );
    Ok(())
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The 30 days up to and including `end`.
    pub fn last_30_days(end: NaiveDate) -> Self {
        Self {
            start: end
                .checked_sub_signed(Duration::days(30))
                .unwrap_or(NaiveDate::MIN),
            end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A child's observations within `range`, oldest first.
pub fn for_child(
    all: &[ParentObservation],
    child: &str,
    range: DateRange,
) -> Vec<ParentObservation> {
    let mut selected: Vec<ParentObservation> = all
        .iter()
        .filter(|o| o.child_name == child && range.contains(o.date))
        .cloned()
        .collect();
    selected.sort_by_key(|o| o.date);
    selected
}

/// Newest first, capped at [`LOG_LIMIT`].
pub fn log_for_child(all: &[ParentObservation], child: &str) -> Vec<ParentObservation> {
    let mut selected: Vec<ParentObservation> =
        all.iter().filter(|o| o.child_name == child).cloned().collect();
    selected.sort_by(|a, b| b.date.cmp(&a.date));
    selected.truncate(LOG_LIMIT);
    selected
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    /// Monday of the week.
    pub week_start: NaiveDate,
    pub entries: usize,
    pub avg_homework_completion: f64,
    pub avg_behavior_rating: f64,
    pub avg_sleep_hours: f64,
    pub avg_mood_rating: f64,
}

#[derive(Default)]
struct WeekTotals {
    entries: usize,
    homework: f64,
    behavior: f64,
    sleep: f64,
    mood: f64,
}

pub fn weekly_summary(observations: &[ParentObservation]) -> Vec<WeeklySummary> {
    let mut weeks: BTreeMap<NaiveDate, WeekTotals> = BTreeMap::new();

    for obs in observations {
        let offset = obs.date.weekday().num_days_from_monday() as i64;
        let week_start = obs
            .date
            .checked_sub_signed(Duration::days(offset))
            .unwrap_or(NaiveDate::MIN);
        let totals = weeks.entry(week_start).or_default();
        totals.entries += 1;
        totals.homework += obs.homework_completion as f64;
        totals.behavior += obs.behavior_rating as f64;
        totals.sleep += obs.sleep_hours;
        totals.mood += obs.mood_rating as f64;
    }

    weeks
        .into_iter()
        .map(|(week_start, t)| {
            let n = t.entries as f64;
            WeeklySummary {
                week_start,
                entries: t.entries,
                avg_homework_completion: t.homework / n,
                avg_behavior_rating: t.behavior / n,
                avg_sleep_hours: t.sleep / n,
                avg_mood_rating: t.mood / n,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeworkInsight {
    Great,
    NeedsAttention,
    Concerning,
}

impl HomeworkInsight {
    fn from_average(avg: f64) -> Self {
        if avg >= 80.0 {
            HomeworkInsight::Great
        } else if avg >= 60.0 {
            HomeworkInsight::NeedsAttention
        } else {
            HomeworkInsight::Concerning
        }
    }

    pub fn text_key(self) -> TextKey {
        match self {
            HomeworkInsight::Great => TextKey::GreatHomework,
            HomeworkInsight::NeedsAttention => TextKey::HomeworkNeedsAttention,
            HomeworkInsight::Concerning => TextKey::HomeworkConcerning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorInsight {
    Excellent,
    Good,
    NeedsSupport,
}

impl BehaviorInsight {
    fn from_average(avg: f64) -> Self {
        if avg >= 4.0 {
            BehaviorInsight::Excellent
        } else if avg >= 3.0 {
            BehaviorInsight::Good
        } else {
            BehaviorInsight::NeedsSupport
        }
    }

    pub fn text_key(self) -> TextKey {
        match self {
            BehaviorInsight::Excellent => TextKey::ExcellentBehavior,
            BehaviorInsight::Good => TextKey::GoodBehavior,
            BehaviorInsight::NeedsSupport => TextKey::BehaviorNeedsSupport,
        }
    }
}

/// Week-over-week gains worth calling out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Improvement {
    Homework,
    Behavior,
    Mood,
}

impl Improvement {
    pub fn text_key(self) -> TextKey {
        match self {
            Improvement::Homework => TextKey::HomeworkImproved,
            Improvement::Behavior => TextKey::BehaviorImproved,
            Improvement::Mood => TextKey::MoodImproved,
        }
    }
}

const HOMEWORK_GAIN: f64 = 5.0;
const RATING_GAIN: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyInsights {
    pub week_start: NaiveDate,
    pub homework: HomeworkInsight,
    pub behavior: BehaviorInsight,
    /// Empty when there is no earlier week to compare with.
    pub improvements: Vec<Improvement>,
}

/// Highlights for the latest week in `weeks` (ordered oldest first), compared
/// against the week before it.
pub fn weekly_insights(weeks: &[WeeklySummary]) -> Option<WeeklyInsights> {
    let (latest, earlier) = weeks.split_last()?;

    let improvements = earlier
        .last()
        .map(|prev| {
            let mut gains = Vec::new();
            if latest.avg_homework_completion - prev.avg_homework_completion > HOMEWORK_GAIN {
                gains.push(Improvement::Homework);
            }
            if latest.avg_behavior_rating - prev.avg_behavior_rating > RATING_GAIN {
                gains.push(Improvement::Behavior);
            }
            if latest.avg_mood_rating - prev.avg_mood_rating > RATING_GAIN {
                gains.push(Improvement::Mood);
            }
            gains
        })
        .unwrap_or_default();

    Some(WeeklyInsights {
        week_start: latest.week_start,
        homework: HomeworkInsight::from_average(latest.avg_homework_completion),
        behavior: BehaviorInsight::from_average(latest.avg_behavior_rating),
        improvements,
    })
}

/// Flat CSV shape; the csv crate cannot write nested lists.
#[derive(Serialize)]
struct ObservationRow<'a> {
    child_name: &'a str,
    date: NaiveDate,
    homework_completion: u32,
    reading_time: u32,
    focus_level: FocusLevel,
    subjects_struggled: String,
    behavior_rating: u8,
    mood_rating: u8,
    sleep_hours: f64,
    energy_level: EnergyLevel,
    social_interactions: &'a str,
    learning_wins: &'a str,
    challenges_faced: &'a str,
    strategies_used: &'a str,
    screen_time: f64,
    physical_activity: u32,
    medication_taken: bool,
    special_events: &'a str,
    timestamp: DateTime<Utc>,
}

pub fn export_csv(observations: &[ParentObservation]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for o in observations {
        writer.serialize(ObservationRow {
            child_name: &o.child_name,
            date: o.date,
            homework_completion: o.homework_completion,
            reading_time: o.reading_time,
            focus_level: o.focus_level,
            subjects_struggled: o.subjects_struggled.join("; "),
            behavior_rating: o.behavior_rating,
            mood_rating: o.mood_rating,
            sleep_hours: o.sleep_hours,
            energy_level: o.energy_level,
            social_interactions: &o.social_interactions,
            learning_wins: &o.learning_wins,
            challenges_faced: &o.challenges_faced,
            strategies_used: &o.strategies_used,
            screen_time: o.screen_time,
            physical_activity: o.physical_activity,
            medication_taken: o.medication_taken,
            special_events: &o.special_events,
            timestamp: o.timestamp,
        })?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

pub fn export_file_name(child: &str, date: NaiveDate) -> String {
    let safe: String = child
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_observations_{}.csv", safe, date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(child: &str, date: NaiveDate) -> ObservationEntry {
        ObservationEntry {
            child_name: child.to_string(),
            date: Some(date),
            homework_completion: 80,
            reading_time: 20,
            focus_level: FocusLevel::Good,
            subjects_struggled: vec!["Math".to_string(), "Reading".to_string()],
            behavior_rating: 4,
            mood_rating: 3,
            sleep_hours: 8.0,
            energy_level: EnergyLevel::Normal,
            social_interactions: String::new(),
            learning_wins: "Finished a chapter book".to_string(),
            challenges_faced: String::new(),
            strategies_used: String::new(),
            screen_time: 2.0,
            physical_activity: 60,
            medication_taken: false,
            special_events: String::new(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn observation(child: &str, date: NaiveDate) -> ParentObservation {
        entry(child, date).into_observation(date, Utc::now()).unwrap()
    }

    #[test]
    fn collects_all_range_violations() {
        let mut bad = entry("Ayaan", day(2026, 3, 2));
        bad.homework_completion = 120;
        bad.sleep_hours = 2.0;
        bad.mood_rating = 0;
        let errors = bad.validate();
        assert_eq!(errors.len(), 3);
        assert!(matches!(
            bad.into_observation(day(2026, 3, 2), Utc::now()),
            Err(ObservationError::Invalid(_))
        ));
    }

    #[test]
    fn missing_date_defaults_to_today() {
        let mut e = entry("Ayaan", day(2026, 3, 2));
        e.date = None;
        let obs = e.into_observation(day(2026, 4, 1), Utc::now()).unwrap();
        assert_eq!(obs.date, day(2026, 4, 1));
    }

    #[test]
    fn second_entry_for_same_day_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path().join("parent_observations.json"));

        record(&store, &observation("Ayaan", day(2026, 3, 2))).unwrap();
        record(&store, &observation("Hodan", day(2026, 3, 2))).unwrap();
        let err = record(&store, &observation("Ayaan", day(2026, 3, 2))).unwrap_err();
        assert!(matches!(err, ObservationError::Duplicate { .. }));
        assert_eq!(store.load_all().len(), 2);
    }

    #[test]
    fn filters_by_child_and_range() {
        let all = vec![
            observation("Ayaan", day(2026, 3, 10)),
            observation("Ayaan", day(2026, 1, 1)),
            observation("Hodan", day(2026, 3, 5)),
            observation("Ayaan", day(2026, 3, 3)),
        ];
        let selected = for_child(&all, "Ayaan", DateRange::last_30_days(day(2026, 3, 10)));
        let dates: Vec<NaiveDate> = selected.iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![day(2026, 3, 3), day(2026, 3, 10)]);
    }

    #[test]
    fn log_is_newest_first_and_capped() {
        let all: Vec<ParentObservation> = (1..=25)
            .map(|d| observation("Ayaan", day(2026, 1, d)))
            .collect();
        let log = log_for_child(&all, "Ayaan");
        assert_eq!(log.len(), LOG_LIMIT);
        assert_eq!(log[0].date, day(2026, 1, 25));
    }

    #[test]
    fn weekly_summary_groups_by_monday() {
        // 2026-03-02 is a Monday.
        let mut a = observation("Ayaan", day(2026, 3, 2));
        a.homework_completion = 60;
        a.sleep_hours = 7.0;
        let mut b = observation("Ayaan", day(2026, 3, 8));
        b.homework_completion = 100;
        b.sleep_hours = 9.0;
        let c = observation("Ayaan", day(2026, 3, 9));

        let weeks = weekly_summary(&[a, b, c]);
        assert_eq!(weeks.len(), 2);
        assert_eq!(weeks[0].week_start, day(2026, 3, 2));
        assert_eq!(weeks[0].entries, 2);
        assert!((weeks[0].avg_homework_completion - 80.0).abs() < 1e-9);
        assert!((weeks[0].avg_sleep_hours - 8.0).abs() < 1e-9);
        assert_eq!(weeks[1].week_start, day(2026, 3, 9));
    }

    #[test]
    fn extreme_dates_do_not_overflow() {
        let range = DateRange::last_30_days(NaiveDate::MIN);
        assert_eq!(range.start, NaiveDate::MIN);
        assert!(range.contains(NaiveDate::MIN));

        let mut obs = observation("Ayaan", day(2026, 3, 2));
        obs.date = NaiveDate::MIN;
        let weeks = weekly_summary(&[obs]);
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].week_start, NaiveDate::MIN);
    }

    #[test]
    fn entry_dates_are_bounded() {
        let today = day(2026, 3, 10);

        let future = entry("Ayaan", day(2026, 4, 1)).into_observation(today, Utc::now());
        match future {
            Err(ObservationError::Invalid(errors)) => {
                assert_eq!(errors, vec!["Observation date cannot be in the future"]);
            }
            other => panic!("expected invalid entry, got {other:?}"),
        }

        let ancient = entry("Ayaan", day(1899, 1, 1)).into_observation(today, Utc::now());
        assert!(matches!(ancient, Err(ObservationError::Invalid(_))));

        let tomorrow = entry("Ayaan", day(2026, 3, 11)).into_observation(today, Utc::now());
        assert!(tomorrow.is_ok());
    }

    fn week(start: NaiveDate, homework: f64, behavior: f64, mood: f64) -> WeeklySummary {
        WeeklySummary {
            week_start: start,
            entries: 5,
            avg_homework_completion: homework,
            avg_behavior_rating: behavior,
            avg_sleep_hours: 9.0,
            avg_mood_rating: mood,
        }
    }

    #[test]
    fn insights_grade_the_latest_week() {
        assert_eq!(weekly_insights(&[]), None);

        let single = weekly_insights(&[week(day(2026, 3, 2), 80.0, 3.0, 3.0)]).unwrap();
        assert_eq!(single.homework, HomeworkInsight::Great);
        assert_eq!(single.behavior, BehaviorInsight::Good);
        assert!(single.improvements.is_empty());

        let low = weekly_insights(&[week(day(2026, 3, 2), 59.9, 2.5, 3.0)]).unwrap();
        assert_eq!(low.homework, HomeworkInsight::Concerning);
        assert_eq!(low.behavior, BehaviorInsight::NeedsSupport);

        let mid = weekly_insights(&[week(day(2026, 3, 2), 60.0, 4.0, 3.0)]).unwrap();
        assert_eq!(mid.homework, HomeworkInsight::NeedsAttention);
        assert_eq!(mid.behavior, BehaviorInsight::Excellent);
    }

    #[test]
    fn insights_flag_week_over_week_gains() {
        let weeks = [
            week(day(2026, 2, 23), 50.0, 4.0, 2.0),
            week(day(2026, 3, 2), 60.0, 3.0, 3.0),
            week(day(2026, 3, 9), 66.0, 3.1, 3.5),
        ];
        let insights = weekly_insights(&weeks).unwrap();
        assert_eq!(insights.week_start, day(2026, 3, 9));
        // Behavior rose by less than 0.2.
        assert_eq!(insights.improvements, vec![Improvement::Homework, Improvement::Mood]);
    }

    #[test]
    fn export_flattens_subjects() {
        let csv = export_csv(&[observation("Ayaan", day(2026, 3, 2))]).unwrap();
        let text = String::from_utf8(csv).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("child_name,date,homework_completion"));
        assert!(lines.next().unwrap().contains("Math; Reading"));
    }

    #[test]
    fn export_file_name_is_filesystem_safe() {
        assert_eq!(
            export_file_name("Ayaan Ali", day(2026, 3, 2)),
            "Ayaan_Ali_observations_20260302.csv"
        );
    }
}
