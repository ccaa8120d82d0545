use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::exclusion::{ExclusionFilter, ExclusionKind};
use crate::record::{EntityRecord, NormalizedRecord};
use crate::refdata::ReferenceDataBundle;
use crate::scanner::{Signal, SignalScanner};
use crate::scorer::{Scorer, Tier};

/// The verdict on one record. `is_chinese` is true when the score reaches
/// the decision threshold and no exclusion fired; excluded records carry a
/// zero score, no signals and the exclusion reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_chinese: bool,
    pub score: i64,
    pub tier: Tier,
    pub signals: Vec<Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusion: Option<ExclusionKind>,
}

impl ClassificationResult {
    fn excluded(kind: ExclusionKind) -> Self {
        ClassificationResult {
            is_chinese: false,
            score: 0,
            tier: Tier::None,
            signals: Vec::new(),
            exclusion: Some(kind),
        }
    }

    pub fn is_hong_kong(&self) -> bool {
        matches!(self.exclusion, Some(ExclusionKind::HongKong))
    }

    pub fn is_taiwan(&self) -> bool {
        matches!(self.exclusion, Some(ExclusionKind::Taiwan))
    }
}

/// The classification engine: exclusion lists, compiled rule table and
/// scorer, built once from a reference data bundle. Construction is the
/// only fallible step; `classify` itself is pure and total.
///
/// The engine holds no interior mutability, so one instance can be shared
/// behind an `Arc` and called from any number of threads.
pub struct Classifier {
    exclusions: ExclusionFilter,
    scanner: SignalScanner,
    scorer: Scorer,
}

impl Classifier {
    pub fn new(bundle: ReferenceDataBundle) -> Result<Self> {
        let scanner = SignalScanner::from_bundle(&bundle)?;
        let exclusions = ExclusionFilter::from_bundle(&bundle);
        let scorer = Scorer::new(bundle.thresholds.clone());
        log::info!(
            "Classifier ready: {} reference entries, bundle version {}",
            bundle.rule_count(),
            bundle.version
        );
        Ok(Classifier {
            exclusions,
            scanner,
            scorer,
        })
    }

    pub fn classify(&self, record: &EntityRecord) -> ClassificationResult {
        let normalized = NormalizedRecord::from_record(record);

        if let Some(kind) = self.exclusions.check(&normalized) {
            return ClassificationResult::excluded(kind);
        }

        let signals = self.scanner.scan(&normalized);
        let (score, tier) = self.scorer.score(&signals);
        let is_chinese = score >= self.scorer.decision_threshold();

        log::debug!(
            "Classified '{}': score {} ({}), {} signals",
            record.name,
            score,
            tier.as_str(),
            signals.len()
        );

        ClassificationResult {
            is_chinese,
            score,
            tier,
            signals,
            exclusion: None,
        }
    }
}
