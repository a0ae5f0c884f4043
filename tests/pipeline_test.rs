use eduscan::batch::{self, BatchError};
use eduscan::i18n::Language;
use eduscan::store::JsonStore;
use eduscan::{
    assess, classify, AssessmentRequest, FeatureVector, Prediction, PredictionResult,
    PredictionSource, RequestContext, RiskModelAdapter, RiskPredictor, RiskTier,
    StudentAssessmentInput,
};
use std::cell::Cell;
use std::path::PathBuf;

fn bundled_model() -> RiskModelAdapter {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models/risk_model.json");
    RiskModelAdapter::load_or_sample(&path)
}

fn typical_student() -> StudentAssessmentInput {
    StudentAssessmentInput {
        math_score: 75,
        reading_score: 80,
        writing_score: 70,
        attendance: 85.0,
        behavior: 3,
        literacy: 6,
    }
}

struct CountingModel {
    calls: Cell<usize>,
}

impl RiskPredictor for CountingModel {
    fn predict(&self, _features: &FeatureVector) -> Prediction {
        self.calls.set(self.calls.get() + 1);
        Prediction {
            label: 1,
            probability: 0.9,
        }
    }

    fn source(&self) -> PredictionSource {
        PredictionSource::Model
    }
}

#[test]
fn typical_student_gets_a_consistent_tier() {
    let model = bundled_model();
    assert_eq!(model.source(), PredictionSource::Model);

    let ctx = RequestContext::default();
    let assessment = assess(&ctx, &model, typical_student().into()).unwrap();
    let p = assessment.result.probability;
    assert!((0.0..=1.0).contains(&p));
    assert_eq!(assessment.risk_tier, classify(p));
    assert_eq!(assessment.risk_tier, RiskTier::Low);
    assert!(!assessment.recommendations.is_empty());
    assert!(assessment.notice.is_none());
}

#[test]
fn out_of_range_attendance_never_reaches_the_model() {
    let model = CountingModel {
        calls: Cell::new(0),
    };
    let input = StudentAssessmentInput {
        attendance: 150.0,
        ..typical_student()
    };

    let err = assess(&RequestContext::default(), &model, input.into()).unwrap_err();
    let message = err.to_string();
    assert!(!message.is_empty());
    let eduscan::pipeline::PipelineError::Invalid(errors) = err;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("between 0 and 100"));
    assert_eq!(model.calls.get(), 0);
}

#[test]
fn batch_without_behavior_column_is_rejected() {
    let csv = "name,math_score,reading_score,writing_score,attendance,literacy\n\
               Amina,75,80,70,85,6\n";
    let model = CountingModel {
        calls: Cell::new(0),
    };

    match batch::process(csv.as_bytes(), &model) {
        Err(BatchError::MissingColumns(missing)) => assert_eq!(missing, vec!["behavior"]),
        other => panic!("expected missing column error, got {other:?}"),
    }
    assert_eq!(model.calls.get(), 0);
}

#[test]
fn batch_scores_with_the_bundled_model() {
    let csv = "name,math_score,reading_score,writing_score,attendance,behavior,literacy\n\
               Amina,75,80,70,85,3,6\n\
               Yusuf,30,35,30,50,1,2\n\
               Broken,abc,35,30,50,1,2\n";
    let outcome = batch::process(csv.as_bytes(), &bundled_model()).unwrap();
    let summary = outcome.summary();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.low_risk, 1);
    assert_eq!(summary.high_risk, 1);
    assert_eq!(outcome.errors[0].row, 3);

    let written = String::from_utf8(outcome.to_csv_bytes().unwrap()).unwrap();
    let first = written.lines().next().unwrap();
    assert!(first.starts_with("Student_ID,Risk_Level,Risk_Probability,name"));
    assert!(written.contains("Low Risk"));
    assert!(written.contains("High Risk"));
}

#[test]
fn saved_results_round_trip_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store: JsonStore<PredictionResult> = JsonStore::new(dir.path().join("nested/predictions.json"));
    let model = bundled_model();
    let ctx = RequestContext::new(Language::Somali).with_user("teacher1");

    let first = assess(
        &ctx,
        &model,
        AssessmentRequest {
            student_name: Some("Amina".to_string()),
            ..AssessmentRequest::from(typical_student())
        },
    )
    .unwrap();
    let second = assess(
        &ctx,
        &model,
        AssessmentRequest {
            student_name: Some("Yusuf".to_string()),
            ..AssessmentRequest::from(typical_student())
        },
    )
    .unwrap();
    assert_eq!(first.risk_label, "Khatar Hoose");

    assert_eq!(store.append(&first.result).unwrap(), 1);
    assert_eq!(store.append(&second.result).unwrap(), 2);

    let loaded = store.load_all();
    assert_eq!(loaded, vec![first.result, second.result]);
    assert_eq!(loaded[0].risk_tier(), first.risk_tier);
}

#[test]
fn missing_model_falls_back_to_labeled_sample() {
    let dir = tempfile::tempdir().unwrap();
    let model = RiskModelAdapter::load_or_sample(&dir.path().join("absent.json"));
    assert_eq!(model.source(), PredictionSource::Sample);

    let assessment = assess(&RequestContext::default(), &model, typical_student().into()).unwrap();
    assert_eq!(assessment.source, PredictionSource::Sample);
    assert!(assessment.notice.is_some());
    assert_eq!(assessment.risk_tier, RiskTier::Medium);
}
