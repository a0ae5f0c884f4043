//! CSV batch scoring.
//!
//! The upload must carry every model column; anything else is passed through
//! to the output untouched. Rows are scored one after another, and a bad row
//! is reported without stopping the rest of the batch. The output keeps one
//! line per input row; failed rows leave the risk columns blank and carry the
//! reason in a trailing `Error` column.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use serde::Serialize;
use std::io::{Read, Write};
use thiserror::Error;
use tracing::{info, warn};

use crate::model::RiskPredictor;
use crate::risk::{classify, RiskTier};
use crate::validation::{Feature, StudentAssessmentInput};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write CSV: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based data row number.
    pub row: usize,
    pub message: String,
    /// The raw cells, when the row could be read at all.
    #[serde(skip)]
    pub record: Option<StringRecord>,
}

#[derive(Debug, Clone)]
pub struct ScoredRow {
    pub student_id: usize,
    pub risk_tier: RiskTier,
    pub probability: f64,
    pub record: StringRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_rows: usize,
    pub processed: usize,
    pub failed: usize,
    pub low_risk: usize,
    pub medium_risk: usize,
    pub high_risk: usize,
    pub average_probability: f64,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub headers: StringRecord,
    pub rows: Vec<ScoredRow>,
    pub errors: Vec<RowError>,
}

/// Header names that are required but absent, in model order.
pub fn missing_columns(headers: &StringRecord) -> Vec<String> {
    Feature::ALL
        .iter()
        .map(|f| f.column())
        .filter(|column| !headers.iter().any(|h| h == *column))
        .map(str::to_string)
        .collect()
}

pub fn process<R, P>(input: R, model: &P) -> Result<BatchOutcome, BatchError>
where
    R: Read,
    P: RiskPredictor + ?Sized,
{
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(input);
    let headers = reader.headers()?.clone();

    let missing = missing_columns(&headers);
    if !missing.is_empty() {
        warn!("Rejecting batch upload, missing columns: {}", missing.join(", "));
        return Err(BatchError::MissingColumns(missing));
    }

    let positions: Vec<(Feature, usize)> = Feature::ALL
        .iter()
        .filter_map(|&f| headers.iter().position(|h| h == f.column()).map(|i| (f, i)))
        .collect();

    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                errors.push(RowError {
                    row,
                    message: e.to_string(),
                    record: None,
                });
                continue;
            }
        };

        match score_row(&record, &positions, model) {
            Ok((risk_tier, probability)) => rows.push(ScoredRow {
                student_id: row,
                risk_tier,
                probability,
                record,
            }),
            Err(message) => errors.push(RowError {
                row,
                message,
                record: Some(record),
            }),
        }
    }

    info!(
        "Batch scored {} rows ({} failed)",
        rows.len(),
        errors.len()
    );

    Ok(BatchOutcome {
        headers,
        rows,
        errors,
    })
}

fn score_row<P>(
    record: &StringRecord,
    positions: &[(Feature, usize)],
    model: &P,
) -> Result<(RiskTier, f64), String>
where
    P: RiskPredictor + ?Sized,
{
    let mut values = [0.0; 6];
    for (slot, &(feature, column)) in values.iter_mut().zip(positions) {
        *slot = parse_cell(record.get(column).unwrap_or(""), feature)?;
    }

    let input = StudentAssessmentInput {
        math_score: values[0] as i64,
        reading_score: values[1] as i64,
        writing_score: values[2] as i64,
        attendance: values[3],
        behavior: values[4] as i64,
        literacy: values[5] as i64,
    };

    let features = input.into_features().map_err(|errors| {
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    })?;

    let prediction = model.predict(&features);
    Ok((classify(prediction.probability), prediction.probability))
}

fn parse_cell(raw: &str, feature: Feature) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("{}: '{}' is not a number", feature.column(), raw))?;
    if !value.is_finite() {
        return Err(format!("{}: '{}' is not a number", feature.column(), raw));
    }
    if feature.is_integer() && value.fract() != 0.0 {
        return Err(format!("{}: '{}' must be a whole number", feature.column(), raw));
    }
    Ok(value)
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        let count = |tier: RiskTier| self.rows.iter().filter(|r| r.risk_tier == tier).count();
        let processed = self.rows.len();
        let average_probability = if processed > 0 {
            self.rows.iter().map(|r| r.probability).sum::<f64>() / processed as f64
        } else {
            0.0
        };

        BatchSummary {
            total_rows: processed + self.errors.len(),
            processed,
            failed: self.errors.len(),
            low_risk: count(RiskTier::Low),
            medium_risk: count(RiskTier::Medium),
            high_risk: count(RiskTier::High),
            average_probability,
        }
    }

    /// Writes `Student_ID, Risk_Level, Risk_Probability`, every original
    /// column, then `Error`. Lines follow input order.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), BatchError> {
        let mut writer = WriterBuilder::new().flexible(true).from_writer(out);
        let width = self.headers.len();

        let mut header = StringRecord::from(vec!["Student_ID", "Risk_Level", "Risk_Probability"]);
        header.extend(self.headers.iter());
        header.push_field("Error");
        writer.write_record(&header)?;

        let mut lines: Vec<(usize, StringRecord)> = Vec::with_capacity(self.rows.len() + self.errors.len());
        for row in &self.rows {
            let mut line = StringRecord::new();
            line.push_field(&row.student_id.to_string());
            line.push_field(row.risk_tier.label());
            line.push_field(&format_probability(row.probability));
            push_cells(&mut line, Some(&row.record), width);
            line.push_field("");
            lines.push((row.student_id, line));
        }
        for error in &self.errors {
            let mut line = StringRecord::new();
            line.push_field(&error.row.to_string());
            line.push_field("");
            line.push_field("");
            push_cells(&mut line, error.record.as_ref(), width);
            line.push_field(&error.message);
            lines.push((error.row, line));
        }
        lines.sort_by_key(|(row, _)| *row);

        for (_, line) in &lines {
            writer.write_record(line)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// 1-based numbers of the rows that could not be scored.
    pub fn failed_rows(&self) -> Vec<usize> {
        self.errors.iter().map(|e| e.row).collect()
    }

    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, BatchError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(buffer)
    }
}

/// Pads or cuts the original cells to the header width so `Error` stays aligned.
fn push_cells(line: &mut StringRecord, record: Option<&StringRecord>, width: usize) {
    for i in 0..width {
        line.push_field(record.and_then(|r| r.get(i)).unwrap_or(""));
    }
}

pub fn format_probability(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

pub fn output_file_name(date: NaiveDate) -> String {
    format!("learning_risk_predictions_{}.csv", date.format("%Y%m%d"))
}
