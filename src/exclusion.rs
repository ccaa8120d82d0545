use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, NormalizedText};
use crate::record::NormalizedRecord;
use crate::refdata::ReferenceDataBundle;

/// Why a record was excluded before any signal was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionKind {
    /// Name matched a known non-PRC homonym (US place names, restaurant
    /// chains, porcelain makers).
    FalsePositive,
    Taiwan,
    HongKong,
}

impl ExclusionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionKind::FalsePositive => "false_positive",
            ExclusionKind::Taiwan => "taiwan",
            ExclusionKind::HongKong => "hong_kong",
        }
    }
}

/// One compiled exclusion marker. Short single-token entries ("HK", "ROC",
/// "TW") only match as a standalone token, so "ROCKWELL" never reads as
/// ROC. Longer entries match as phrases on the plain or despaced form,
/// with the despaced side under the same length gate the scanner uses.
#[derive(Debug, Clone)]
struct Marker {
    pattern: NormalizedText,
    tokens: Vec<String>,
    whole_word: bool,
    despace_eligible: bool,
}

impl Marker {
    fn compile(entry: &str, despace_min_len: usize) -> Option<Marker> {
        let pattern = normalize(entry);
        if pattern.is_empty() {
            return None;
        }
        let tokens: Vec<String> = pattern.tokens().map(str::to_string).collect();
        let whole_word = tokens.len() == 1 && pattern.plain.chars().count() <= 3;
        let despace_eligible = pattern.despaced.chars().count() >= despace_min_len;
        Some(Marker {
            pattern,
            tokens,
            whole_word,
            despace_eligible,
        })
    }

    fn compile_list(entries: &[String], despace_min_len: usize) -> Vec<Marker> {
        entries
            .iter()
            .filter_map(|e| Marker::compile(e, despace_min_len))
            .collect()
    }

    fn matches(&self, text: &NormalizedText) -> bool {
        if text.is_empty() {
            return false;
        }
        // Equality modulo spacing shares the scanner's despaced length
        // gate: a country of "HONGKONG" is recognized, while short codes
        // have to match their spacing as-is.
        if self.despace_eligible && text.equals_despaced(&self.pattern) {
            return true;
        }
        if self.whole_word {
            text.contains_token_seq(&self.tokens)
        } else {
            text.plain.contains(&self.pattern.plain)
                || (self.despace_eligible && text.despaced.contains(&self.pattern.despaced))
        }
    }
}

/// Pre-scoring suppression of records that would otherwise light up the
/// China patterns: known homonym names, Taiwan entities, Hong Kong
/// entities. Checked strictly before the signal scan; an excluded record
/// never reaches the scorer.
pub struct ExclusionFilter {
    false_positives: Vec<NormalizedText>,
    taiwan: Vec<Marker>,
    hong_kong: Vec<Marker>,
    china_markers: Vec<Marker>,
}

impl ExclusionFilter {
    pub fn from_bundle(bundle: &ReferenceDataBundle) -> Self {
        ExclusionFilter {
            false_positives: bundle
                .false_positives
                .iter()
                .map(|e| normalize(e))
                .filter(|p| !p.is_empty())
                .collect(),
            taiwan: Marker::compile_list(&bundle.taiwan_identifiers, bundle.despace_min_len),
            hong_kong: Marker::compile_list(&bundle.hong_kong_identifiers, bundle.despace_min_len),
            china_markers: Marker::compile_list(&bundle.country_identifiers, bundle.despace_min_len),
        }
    }

    /// Evaluate the exclusion lists in their fixed precedence order:
    /// false positives, then Taiwan, then Hong Kong.
    pub fn check(&self, record: &NormalizedRecord) -> Option<ExclusionKind> {
        if self.is_false_positive(&record.name) {
            log::debug!("Excluded as false positive: '{}'", record.name.plain);
            return Some(ExclusionKind::FalsePositive);
        }
        if self.is_taiwan(record) {
            log::debug!("Excluded as Taiwan entity: '{}'", record.name.plain);
            return Some(ExclusionKind::Taiwan);
        }
        if self.is_hong_kong(record) {
            log::debug!("Excluded as Hong Kong entity: '{}'", record.name.plain);
            return Some(ExclusionKind::HongKong);
        }
        None
    }

    fn is_false_positive(&self, name: &NormalizedText) -> bool {
        self.false_positives.iter().any(|p| name.contains_phrase(p))
    }

    /// Taiwan needs corroboration on the name side: a Taiwan marker in the
    /// name only excludes when a China pattern appears in the name too
    /// (otherwise "Taiwan Semiconductor" has nothing to suppress). A
    /// Taiwan marker in the country field excludes on its own.
    fn is_taiwan(&self, record: &NormalizedRecord) -> bool {
        if self.taiwan.iter().any(|m| m.matches(&record.country)) {
            return true;
        }
        let name_marker = self.taiwan.iter().any(|m| m.matches(&record.name));
        name_marker && self.china_markers.iter().any(|m| m.matches(&record.name))
    }

    fn is_hong_kong(&self, record: &NormalizedRecord) -> bool {
        self.hong_kong
            .iter()
            .any(|m| m.matches(&record.country) || m.matches(&record.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EntityRecord;

    fn filter() -> ExclusionFilter {
        ExclusionFilter::from_bundle(&ReferenceDataBundle::default())
    }

    fn check(record: &EntityRecord) -> Option<ExclusionKind> {
        filter().check(&NormalizedRecord::from_record(record))
    }

    #[test]
    fn test_restaurant_names_are_false_positives() {
        for name in [
            "Great Wall Chinese Restaurant",
            "China Garden Restaurant",
            "China King Restaurant",
            "China Wok #2",
            "Panda Express 1148",
        ] {
            assert_eq!(
                check(&EntityRecord::named(name)),
                Some(ExclusionKind::FalsePositive),
                "{}",
                name
            );
        }
    }

    #[test]
    fn test_us_place_names_are_false_positives() {
        assert_eq!(
            check(&EntityRecord::named("China Lake Naval Weapons Center")),
            Some(ExclusionKind::FalsePositive)
        );
        assert_eq!(
            check(&EntityRecord::named("China Grove Baptist Church")),
            Some(ExclusionKind::FalsePositive)
        );
        assert_eq!(
            check(&EntityRecord::named("China Beach")),
            Some(ExclusionKind::FalsePositive)
        );
        assert_eq!(
            check(&EntityRecord::named("Chinati Foundation")),
            Some(ExclusionKind::FalsePositive)
        );
    }

    #[test]
    fn test_false_positive_phrase_spans_spacing() {
        assert_eq!(
            check(&EntityRecord::named("Chinatown Express LLC")),
            Some(ExclusionKind::FalsePositive)
        );
        assert_eq!(
            check(&EntityRecord::named("China Town Cafe")),
            Some(ExclusionKind::FalsePositive)
        );
        assert_eq!(
            check(&EntityRecord::named("Indo-China Trading House")),
            Some(ExclusionKind::FalsePositive)
        );
    }

    #[test]
    fn test_porcelain_makers_are_false_positives() {
        assert_eq!(
            check(&EntityRecord::named("Homer Laughlin China Company")),
            Some(ExclusionKind::FalsePositive)
        );
        assert_eq!(
            check(&EntityRecord::named("Fine China Imports of Ohio")),
            Some(ExclusionKind::FalsePositive)
        );
    }

    #[test]
    fn test_taiwan_country_field_alone_excludes() {
        let record = EntityRecord::named("Taiwan Semiconductor Manufacturing Company")
            .with_country("TW");
        assert_eq!(check(&record), Some(ExclusionKind::Taiwan));

        let iso_label = EntityRecord::named("Foxconn Technology")
            .with_country("Taiwan, Province of China");
        assert_eq!(check(&iso_label), Some(ExclusionKind::Taiwan));
    }

    #[test]
    fn test_taiwan_name_marker_needs_china_pattern() {
        // Marker plus a China pattern in the name triggers the exclusion.
        assert_eq!(
            check(&EntityRecord::named("Taiwan Glass (China) Holdings")),
            Some(ExclusionKind::Taiwan)
        );
        assert_eq!(
            check(&EntityRecord::named(
                "Government of the Republic of China (Taiwan)"
            )),
            Some(ExclusionKind::Taiwan)
        );
        // Marker alone does not; there is nothing to suppress.
        assert_eq!(
            check(&EntityRecord::named("Taiwan Semiconductor Manufacturing Company")),
            None
        );
    }

    #[test]
    fn test_roc_only_as_standalone_token() {
        assert_eq!(
            check(&EntityRecord::named("ROC (China) Trading Co")),
            Some(ExclusionKind::Taiwan)
        );
        // ROC inside a longer word is not a marker.
        assert_eq!(check(&EntityRecord::named("Rockwell China Ventures")), None);
        // Spaced-out punctuation does not reassemble a short marker.
        assert_eq!(
            check(&EntityRecord::named("Acme Trading").with_country("R.O.C.")),
            None
        );
    }

    #[test]
    fn test_short_marker_cutoff_counts_chars() {
        // A two-ideograph marker is short for matching purposes even though
        // it is six bytes long: it matches as a standalone token only.
        let mut bundle = ReferenceDataBundle::default();
        bundle.taiwan_identifiers.push("台灣".to_string());
        let filter = ExclusionFilter::from_bundle(&bundle);

        let by_country =
            NormalizedRecord::from_record(&EntityRecord::named("Acme Trading").with_country("台灣"));
        assert_eq!(filter.check(&by_country), Some(ExclusionKind::Taiwan));

        let embedded = NormalizedRecord::from_record(&EntityRecord::named("台灣化工有限公司"));
        assert_eq!(filter.check(&embedded), None);
    }

    #[test]
    fn test_bare_republic_of_china_is_not_excluded() {
        // Long-standing list behavior: only the standalone ROC token is a
        // Taiwan marker, so this name falls through to the scanner.
        assert_eq!(
            check(&EntityRecord::named("Republic of China Import Export")),
            None
        );
    }

    #[test]
    fn test_hong_kong_by_country_or_name() {
        assert_eq!(
            check(&EntityRecord::named("Acme Trading").with_country("Hong Kong")),
            Some(ExclusionKind::HongKong)
        );
        assert_eq!(
            check(&EntityRecord::named("Acme Trading").with_country("HONGKONG")),
            Some(ExclusionKind::HongKong)
        );
        assert_eq!(
            check(&EntityRecord::named("HK Electronics Ltd")),
            Some(ExclusionKind::HongKong)
        );
        assert_eq!(
            check(&EntityRecord::named("Hongkong and Shanghai Banking Corporation")),
            Some(ExclusionKind::HongKong)
        );
    }

    #[test]
    fn test_precedence_false_positive_first() {
        // Carries a false-positive phrase, a Taiwan marker and a China
        // pattern at once; the false positive wins.
        assert_eq!(
            check(&EntityRecord::named("Chinatown Taipei Kitchen")),
            Some(ExclusionKind::FalsePositive)
        );
    }

    #[test]
    fn test_precedence_taiwan_before_hong_kong() {
        let record = EntityRecord::named("Taiwan China Trading").with_country("HK");
        assert_eq!(check(&record), Some(ExclusionKind::Taiwan));
    }

    #[test]
    fn test_plain_prc_records_pass_through() {
        assert_eq!(
            check(&EntityRecord::named("Huawei Technologies").with_country("CN")),
            None
        );
        assert_eq!(check(&EntityRecord::named("Shenzhen Widgets")), None);
    }
}
