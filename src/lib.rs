pub mod batch;
pub mod classifier;
pub mod exclusion;
pub mod normalize;
pub mod record;
pub mod refdata;
pub mod scanner;
pub mod scorer;
pub mod script;

pub use batch::{BatchRunner, BatchSummary, RecordOutcome};
pub use classifier::{ClassificationResult, Classifier};
pub use exclusion::ExclusionKind;
pub use normalize::{normalize, NormalizedText};
pub use record::{EntityRecord, FieldKind, NormalizedRecord};
pub use refdata::{BundleReport, ReferenceDataBundle, ScoreThresholds, ScoreWeights};
pub use scanner::{MatchMode, RuleCategory, Signal, SignalScanner};
pub use scorer::{Scorer, Tier};
