use serde::{Deserialize, Serialize};

use crate::refdata::ScoreThresholds;
use crate::scanner::Signal;

/// Confidence buckets derived from the summed signal score. Ordering
/// follows score ordering, so `Tier::High > Tier::Medium` holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::None => "NONE",
            Tier::Low => "LOW",
            Tier::Medium => "MEDIUM",
            Tier::High => "HIGH",
            Tier::VeryHigh => "VERY_HIGH",
        }
    }
}

/// Turns a signal set into a score and a confidence tier. The score is a
/// plain sum; signal weights already encode how much independent evidence
/// each rule category carries.
pub struct Scorer {
    thresholds: ScoreThresholds,
}

impl Scorer {
    pub fn new(thresholds: ScoreThresholds) -> Self {
        Scorer { thresholds }
    }

    pub fn score(&self, signals: &[Signal]) -> (i64, Tier) {
        let total: i64 = signals.iter().map(|s| s.weight).sum();
        (total, self.tier_for(total))
    }

    pub fn tier_for(&self, score: i64) -> Tier {
        if score >= self.thresholds.very_high {
            Tier::VeryHigh
        } else if score >= self.thresholds.high {
            Tier::High
        } else if score >= self.thresholds.medium {
            Tier::Medium
        } else if score > 0 {
            Tier::Low
        } else {
            Tier::None
        }
    }

    /// The is-PRC decision threshold; identical to the MEDIUM cutoff.
    pub fn decision_threshold(&self) -> i64 {
        self.thresholds.medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldKind;
    use crate::scanner::RuleCategory;

    fn scorer() -> Scorer {
        Scorer::new(ScoreThresholds::default())
    }

    fn signal(weight: i64) -> Signal {
        Signal {
            category: RuleCategory::City,
            field: FieldKind::Name,
            matched_text: "X".to_string(),
            weight,
        }
    }

    #[test]
    fn test_tier_boundaries() {
        let s = scorer();
        assert_eq!(s.tier_for(0), Tier::None);
        assert_eq!(s.tier_for(1), Tier::Low);
        assert_eq!(s.tier_for(49), Tier::Low);
        assert_eq!(s.tier_for(50), Tier::Medium);
        assert_eq!(s.tier_for(69), Tier::Medium);
        assert_eq!(s.tier_for(70), Tier::High);
        assert_eq!(s.tier_for(99), Tier::High);
        assert_eq!(s.tier_for(100), Tier::VeryHigh);
        assert_eq!(s.tier_for(500), Tier::VeryHigh);
    }

    #[test]
    fn test_score_is_signal_sum() {
        let (total, tier) = scorer().score(&[signal(50), signal(60)]);
        assert_eq!(total, 110);
        assert_eq!(tier, Tier::VeryHigh);

        let (total, tier) = scorer().score(&[]);
        assert_eq!(total, 0);
        assert_eq!(tier, Tier::None);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::VeryHigh > Tier::High);
        assert!(Tier::High > Tier::Medium);
        assert!(Tier::Medium > Tier::Low);
        assert!(Tier::Low > Tier::None);
    }

    #[test]
    fn test_custom_thresholds() {
        let s = Scorer::new(ScoreThresholds {
            medium: 10,
            high: 20,
            very_high: 30,
        });
        assert_eq!(s.tier_for(15), Tier::Medium);
        assert_eq!(s.decision_threshold(), 10);
    }
}
