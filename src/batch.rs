use std::io::{BufRead, Read};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassificationResult, Classifier};
use crate::exclusion::ExclusionKind;
use crate::record::EntityRecord;
use crate::scorer::Tier;

/// Per-record outcome at the batch boundary. A record that cannot be
/// parsed is skipped with its reason; it is never silently dropped, and it
/// never aborts the rest of the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordOutcome {
    Classified {
        /// 1-based record position in the input (CSV header excluded).
        line: usize,
        name: String,
        result: ClassificationResult,
    },
    Skipped {
        line: usize,
        reason: String,
    },
}

/// Running totals for one batch, suitable for printing at the end of a
/// run. Flag and exclusion counts only cover records that actually
/// classified; parse failures are tallied under `skipped`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: u64,
    pub classified: u64,
    pub skipped: u64,
    pub flagged: u64,
    pub excluded_false_positive: u64,
    pub excluded_taiwan: u64,
    pub excluded_hong_kong: u64,
    pub tier_none: u64,
    pub tier_low: u64,
    pub tier_medium: u64,
    pub tier_high: u64,
    pub tier_very_high: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchSummary {
    pub fn new() -> Self {
        BatchSummary {
            total: 0,
            classified: 0,
            skipped: 0,
            flagged: 0,
            excluded_false_positive: 0,
            excluded_taiwan: 0,
            excluded_hong_kong: 0,
            tier_none: 0,
            tier_low: 0,
            tier_medium: 0,
            tier_high: 0,
            tier_very_high: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record(&mut self, outcome: &RecordOutcome) {
        self.total += 1;
        match outcome {
            RecordOutcome::Skipped { .. } => self.skipped += 1,
            RecordOutcome::Classified { result, .. } => {
                self.classified += 1;
                if result.is_chinese {
                    self.flagged += 1;
                }
                match result.exclusion {
                    Some(ExclusionKind::FalsePositive) => self.excluded_false_positive += 1,
                    Some(ExclusionKind::Taiwan) => self.excluded_taiwan += 1,
                    Some(ExclusionKind::HongKong) => self.excluded_hong_kong += 1,
                    None => {}
                }
                match result.tier {
                    Tier::None => self.tier_none += 1,
                    Tier::Low => self.tier_low += 1,
                    Tier::Medium => self.tier_medium += 1,
                    Tier::High => self.tier_high += 1,
                    Tier::VeryHigh => self.tier_very_high += 1,
                }
            }
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Percentage of classified records that were flagged.
    pub fn flag_rate(&self) -> f64 {
        if self.classified == 0 {
            0.0
        } else {
            (self.flagged as f64 / self.classified as f64) * 100.0
        }
    }
}

impl Default for BatchSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives a classifier over an input stream, handing each outcome to the
/// caller's sink as it is produced. Holds only a borrow of the classifier,
/// so several runners can share one engine.
pub struct BatchRunner<'a> {
    classifier: &'a Classifier,
}

impl<'a> BatchRunner<'a> {
    pub fn new(classifier: &'a Classifier) -> Self {
        BatchRunner { classifier }
    }

    /// Process CSV input with a header row. Column names map onto record
    /// fields ("name", "country", "city", ...; common aliases like "state"
    /// and "zip" are accepted). Rows that fail to parse become skips.
    pub fn run_csv<R, F>(&self, reader: R, mut sink: F) -> Result<BatchSummary>
    where
        R: Read,
        F: FnMut(&RecordOutcome) -> Result<()>,
    {
        let mut summary = BatchSummary::new();
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(reader);

        for (index, row) in csv_reader.deserialize::<EntityRecord>().enumerate() {
            let line = index + 1;
            let outcome = match row {
                Ok(record) => self.classify_one(line, &record),
                Err(e) => {
                    log::warn!("Skipping CSV record {}: {}", line, e);
                    RecordOutcome::Skipped {
                        line,
                        reason: e.to_string(),
                    }
                }
            };
            summary.record(&outcome);
            sink(&outcome)?;
        }

        summary.finish();
        Ok(summary)
    }

    /// Process JSON-lines input, one record object per line. Blank lines
    /// are not records and are passed over without an outcome; lines that
    /// do not decode or do not parse become skips.
    pub fn run_jsonl<R, F>(&self, reader: R, mut sink: F) -> Result<BatchSummary>
    where
        R: BufRead,
        F: FnMut(&RecordOutcome) -> Result<()>,
    {
        let mut summary = BatchSummary::new();

        for (index, line_result) in reader.lines().enumerate() {
            let line = index + 1;
            let outcome = match line_result {
                Ok(raw) if raw.trim().is_empty() => continue,
                Ok(raw) => match serde_json::from_str::<EntityRecord>(&raw) {
                    Ok(record) => self.classify_one(line, &record),
                    Err(e) => {
                        log::warn!("Skipping JSONL line {}: {}", line, e);
                        RecordOutcome::Skipped {
                            line,
                            reason: e.to_string(),
                        }
                    }
                },
                // An undecodable line is a skip, not a batch failure.
                // lines() consumes through the newline before the UTF-8
                // check, so iteration resumes at the next line.
                Err(e) => {
                    log::warn!("Skipping undecodable JSONL line {}: {}", line, e);
                    RecordOutcome::Skipped {
                        line,
                        reason: e.to_string(),
                    }
                }
            };
            summary.record(&outcome);
            sink(&outcome)?;
        }

        summary.finish();
        Ok(summary)
    }

    fn classify_one(&self, line: usize, record: &EntityRecord) -> RecordOutcome {
        let result = self.classifier.classify(record);
        RecordOutcome::Classified {
            line,
            name: record.name.clone(),
            result,
        }
    }
}
