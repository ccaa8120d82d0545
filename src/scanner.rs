use std::collections::HashSet;

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, NormalizedText};
use crate::record::{FieldKind, NormalizedRecord};
use crate::refdata::ReferenceDataBundle;
use crate::script;

/// Rule categories, strongest evidence first. Each category carries one
/// weight and is applied to a fixed set of record fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    CountryCode,
    CompanyName,
    PostalPattern,
    City,
    Province,
    District,
    StreetPattern,
    HanScript,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::CountryCode => "country_code",
            RuleCategory::CompanyName => "company_name",
            RuleCategory::PostalPattern => "postal_pattern",
            RuleCategory::City => "city",
            RuleCategory::Province => "province",
            RuleCategory::District => "district",
            RuleCategory::StreetPattern => "street_pattern",
            RuleCategory::HanScript => "han_script",
        }
    }

    /// The record fields this category is scanned against.
    pub fn fields(&self) -> &'static [FieldKind] {
        match self {
            RuleCategory::CountryCode => &[FieldKind::Country, FieldKind::Name],
            RuleCategory::CompanyName => &[FieldKind::Name],
            RuleCategory::PostalPattern => &[FieldKind::PostalCode],
            RuleCategory::City => &[FieldKind::City, FieldKind::AddressLine, FieldKind::Name],
            RuleCategory::Province => &[FieldKind::ProvinceOrState, FieldKind::AddressLine],
            RuleCategory::District => &[FieldKind::AddressLine, FieldKind::City],
            RuleCategory::StreetPattern => &[FieldKind::AddressLine],
            RuleCategory::HanScript => &[FieldKind::Name, FieldKind::AddressLine],
        }
    }
}

/// How a gazetteer pattern is applied to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Whole-field match. Used for short codes ("CN", "PRC") so they never
    /// fire inside longer text; their spacing has to match as-is.
    Exact,
    /// Pattern tokens appear as a contiguous token sequence of the field.
    ContainsWord,
    /// Plain substring containment. Used for the long country phrases;
    /// this is what makes "Chinati" light up, which the false-positive
    /// list then suppresses.
    ContainsSubstring,
    /// Substring containment on the despaced form only.
    SpaceNormalized,
}

/// One compiled rule row: a normalized pattern (or anchored regex for
/// postal codes), its category, weight and match mode.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub category: RuleCategory,
    pub weight: i64,
    pub mode: MatchMode,
    pub pattern: NormalizedText,
    tokens: Vec<String>,
    /// Whether the space-stripped pass applies. Short patterns are kept
    /// out of it so "Z T E" cannot despace into a ZTE hit.
    despace_eligible: bool,
    regex: Option<Regex>,
}

impl CompiledRule {
    fn gazetteer(
        entry: &str,
        category: RuleCategory,
        weight: i64,
        mode: Option<MatchMode>,
        despace_min_len: usize,
    ) -> Option<CompiledRule> {
        let pattern = normalize(entry);
        if pattern.is_empty() {
            return None;
        }
        let tokens: Vec<String> = pattern.tokens().map(str::to_string).collect();
        let mode = mode.unwrap_or_else(|| {
            if tokens.len() == 1 && pattern.plain.chars().count() <= 3 {
                MatchMode::Exact
            } else {
                MatchMode::ContainsWord
            }
        });
        let despace_eligible = pattern.despaced.chars().count() >= despace_min_len;
        Some(CompiledRule {
            category,
            weight,
            mode,
            pattern,
            tokens,
            despace_eligible,
            regex: None,
        })
    }

    fn postal(pattern: &str, weight: i64) -> Result<CompiledRule> {
        let regex = Regex::new(pattern)
            .map_err(|e| anyhow::anyhow!("Invalid postal regex pattern '{}': {}", pattern, e))?;
        Ok(CompiledRule {
            category: RuleCategory::PostalPattern,
            weight,
            mode: MatchMode::Exact,
            pattern: normalize(pattern),
            tokens: Vec::new(),
            despace_eligible: false,
            regex: Some(regex),
        })
    }

    fn matches(&self, text: &NormalizedText) -> bool {
        if text.is_empty() {
            return false;
        }
        if let Some(regex) = &self.regex {
            return regex.is_match(&text.plain);
        }
        // Whole-field equality modulo spacing shares the despaced pass
        // gate: a short code has to match its spacing as-is, so a name of
        // "Z T E" stays clean. The spacing variants of the short country
        // codes are list entries of their own ("P.R.C.", "P R C").
        if self.despace_eligible && text.equals_despaced(&self.pattern) {
            return true;
        }
        let mode_hit = match self.mode {
            MatchMode::Exact => text.plain == self.pattern.plain,
            MatchMode::ContainsWord => text.contains_token_seq(&self.tokens),
            MatchMode::ContainsSubstring => text.plain.contains(&self.pattern.plain),
            MatchMode::SpaceNormalized => false,
        };
        if mode_hit {
            return true;
        }
        self.despace_eligible
            && self.mode != MatchMode::Exact
            && text.despaced.contains(&self.pattern.despaced)
    }
}

/// One rule hit on one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub category: RuleCategory,
    pub field: FieldKind,
    /// The pattern that fired; for postal and Han-script hits, the field
    /// text that fired.
    pub matched_text: String,
    pub weight: i64,
}

/// The compiled rule table. Built once from a bundle, then shared
/// read-only across threads; `scan` takes `&self` and allocates nothing
/// global.
#[derive(Debug)]
pub struct SignalScanner {
    rules: Vec<CompiledRule>,
    street_rules: Vec<CompiledRule>,
    han_weight: i64,
    han_enabled: bool,
}

impl SignalScanner {
    pub fn from_bundle(bundle: &ReferenceDataBundle) -> Result<Self> {
        let w = &bundle.weights;
        let min_len = bundle.despace_min_len;
        let mut rules = Vec::new();

        for entry in &bundle.country_identifiers {
            // Long identifiers match as substrings ("PEOPLES REPUBLIC OF
            // CHINA" inside a name); the short codes stay whole-field.
            let pattern = normalize(entry);
            let mode = if pattern.tokens().count() > 1 || pattern.plain.chars().count() >= 4 {
                Some(MatchMode::ContainsSubstring)
            } else {
                Some(MatchMode::Exact)
            };
            rules.extend(CompiledRule::gazetteer(
                entry,
                RuleCategory::CountryCode,
                w.country,
                mode,
                min_len,
            ));
        }
        for entry in bundle.company_names.iter().chain(&bundle.company_misspellings) {
            rules.extend(CompiledRule::gazetteer(
                entry,
                RuleCategory::CompanyName,
                w.company,
                Some(MatchMode::ContainsWord),
                min_len,
            ));
        }
        for pattern in &bundle.postal_patterns {
            rules.push(CompiledRule::postal(pattern, w.postal)?);
        }
        for entry in &bundle.cities {
            rules.extend(CompiledRule::gazetteer(
                entry,
                RuleCategory::City,
                w.city,
                Some(MatchMode::ContainsWord),
                min_len,
            ));
        }
        for entry in &bundle.provinces {
            rules.extend(CompiledRule::gazetteer(
                entry,
                RuleCategory::Province,
                w.province,
                Some(MatchMode::ContainsWord),
                min_len,
            ));
        }
        for entry in &bundle.districts {
            rules.extend(CompiledRule::gazetteer(
                entry,
                RuleCategory::District,
                w.district,
                Some(MatchMode::ContainsWord),
                min_len,
            ));
        }

        let street_rules = bundle
            .street_tokens
            .iter()
            .filter_map(|entry| {
                CompiledRule::gazetteer(
                    entry,
                    RuleCategory::StreetPattern,
                    w.street,
                    Some(MatchMode::ContainsWord),
                    min_len,
                )
            })
            .collect();

        log::debug!(
            "Compiled {} rules plus {} street tokens",
            rules.len(),
            bundle.street_tokens.len()
        );

        Ok(SignalScanner {
            rules,
            street_rules,
            han_weight: w.han_script,
            han_enabled: bundle.han_script_enabled,
        })
    }

    /// Scan every rule against its fields and return the deduplicated
    /// signals in deterministic order (rule table order, then field
    /// order). The same pattern never counts twice on the same field,
    /// which also collapses spelling variants that despace identically
    /// ("XI'AN" and "XIAN").
    pub fn scan(&self, record: &NormalizedRecord) -> Vec<Signal> {
        let mut signals = Vec::new();
        let mut seen: HashSet<(String, FieldKind)> = HashSet::new();

        for rule in &self.rules {
            self.apply(rule, record, &mut signals, &mut seen);
        }

        // Street tokens are weak evidence; they only count when the record
        // already placed itself in a known city.
        let city_hit = signals
            .iter()
            .any(|s| s.category == RuleCategory::City);
        if city_hit {
            for rule in &self.street_rules {
                self.apply(rule, record, &mut signals, &mut seen);
            }
        }

        if self.han_enabled && self.han_weight > 0 {
            self.scan_han(record, &mut signals);
        }

        signals
    }

    fn apply(
        &self,
        rule: &CompiledRule,
        record: &NormalizedRecord,
        signals: &mut Vec<Signal>,
        seen: &mut HashSet<(String, FieldKind)>,
    ) {
        for &field in rule.category.fields() {
            let text = record.field(field);
            if !rule.matches(text) {
                continue;
            }
            if !seen.insert((rule.pattern.despaced.clone(), field)) {
                continue;
            }
            let matched_text = if rule.regex.is_some() {
                text.plain.clone()
            } else {
                rule.pattern.plain.clone()
            };
            log::debug!(
                "Signal: {:?} '{}' on {} (+{})",
                rule.category,
                matched_text,
                field.as_str(),
                rule.weight
            );
            signals.push(Signal {
                category: rule.category,
                field,
                matched_text,
                weight: rule.weight,
            });
        }
    }

    /// Han-script text fires at most once per record, on the first field
    /// that carries it; name and address both being in Chinese is still
    /// one fact about the record.
    fn scan_han(&self, record: &NormalizedRecord, signals: &mut Vec<Signal>) {
        for &field in RuleCategory::HanScript.fields() {
            let text = record.field(field);
            if script::contains_han(&text.plain) {
                log::debug!("Signal: Han script on {} (+{})", field.as_str(), self.han_weight);
                signals.push(Signal {
                    category: RuleCategory::HanScript,
                    field,
                    matched_text: text.plain.clone(),
                    weight: self.han_weight,
                });
                return;
            }
        }
    }
}
