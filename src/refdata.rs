use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// Versioned reference data for the screening engine: one pattern list per
/// rule category plus the scoring tunables. Loaded once at startup and
/// never mutated afterwards; list edits are a redeploy, not a runtime event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReferenceDataBundle {
    #[serde(default = "default_version")]
    pub version: String,
    /// Last-edited stamp for audit trails, refreshed by whoever edits the
    /// file. Free-form text, not parsed.
    #[serde(default = "default_updated")]
    pub updated: String,

    /// Country-level identifiers (codes and phrases). Strongest tier.
    #[serde(default)]
    pub country_identifiers: Vec<String>,
    /// Well-known mainland company names.
    #[serde(default)]
    pub company_names: Vec<String>,
    /// Frequently observed misspellings of the company names. Kept as a
    /// separate list so curators can see which entries are variants.
    #[serde(default)]
    pub company_misspellings: Vec<String>,
    /// Major mainland cities.
    #[serde(default)]
    pub cities: Vec<String>,
    /// Province-level divisions.
    #[serde(default)]
    pub provinces: Vec<String>,
    /// Urban districts of the major cities.
    #[serde(default)]
    pub districts: Vec<String>,
    /// Romanized street-address tokens ("LU", "DADAO", ...). Weak evidence,
    /// only counted when a city already matched.
    #[serde(default)]
    pub street_tokens: Vec<String>,
    /// Anchored regexes for mainland postal codes.
    #[serde(default)]
    pub postal_patterns: Vec<String>,
    /// Name fragments that look Chinese but are not PRC entities
    /// (US place names, restaurant chains, porcelain makers).
    #[serde(default)]
    pub false_positives: Vec<String>,
    /// Markers separating Taiwan entities from mainland ones.
    #[serde(default)]
    pub taiwan_identifiers: Vec<String>,
    /// Markers separating Hong Kong entities from mainland ones.
    #[serde(default)]
    pub hong_kong_identifiers: Vec<String>,

    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub thresholds: ScoreThresholds,
    /// Minimum despaced pattern length for the space-stripped matching
    /// pass. Patterns shorter than this are never matched despaced, so
    /// "Z T E" does not light up on the ZTE entry.
    #[serde(default = "default_despace_min_len")]
    pub despace_min_len: usize,
    /// Whether Han-script text counts as a signal at all.
    #[serde(default = "default_true")]
    pub han_script_enabled: bool,
}

/// Signal weight per rule category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreWeights {
    pub country: i64,
    pub company: i64,
    pub postal: i64,
    pub city: i64,
    pub province: i64,
    pub district: i64,
    pub street: i64,
    pub han_script: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            country: 100,
            company: 80,
            postal: 60,
            city: 50,
            province: 40,
            district: 25,
            street: 15,
            han_script: 40,
        }
    }
}

/// Score cutoffs for the confidence tiers. Anything above zero but below
/// `medium` is LOW; `medium` is also the is-PRC decision threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoreThresholds {
    pub medium: i64,
    pub high: i64,
    pub very_high: i64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        ScoreThresholds {
            medium: 50,
            high: 70,
            very_high: 100,
        }
    }
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_updated() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn default_despace_min_len() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn strs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ReferenceDataBundle {
    fn default() -> Self {
        ReferenceDataBundle {
            version: default_version(),
            updated: default_updated(),
            country_identifiers: strs(&[
                "CN",
                "CHN",
                "PRC",
                "P.R.C.",
                "P R C",
                "CHINA",
                "PR CHINA",
                "PEOPLES REPUBLIC OF CHINA",
                "MAINLAND CHINA",
            ]),
            company_names: strs(&[
                "HUAWEI",
                "ZTE",
                "ZHONGXING",
                "ALIBABA",
                "TENCENT",
                "BAIDU",
                "XIAOMI",
                "LENOVO",
                "HAIER",
                "HISENSE",
                "HIKVISION",
                "DAHUA",
                "DJI",
                "BYD",
                "GEELY",
                "CHERY",
                "GREAT WALL MOTOR",
                "SINOPEC",
                "PETROCHINA",
                "CNOOC",
                "COSCO",
                "SMIC",
                "CRRC",
                "CATL",
                "BYTEDANCE",
                "COMAC",
                "AVIC",
                "NORINCO",
                "CETC",
                "CNNC",
                "SINOCHEM",
                "CHINALCO",
                "TSINGHUA UNIGROUP",
                "INSPUR",
                "SUGON",
                "IFLYTEK",
                "MEGVII",
                "SENSETIME",
            ]),
            company_misspellings: strs(&[
                "HWAWEI",
                "HUAWAI",
                "HUWEI",
                "HAUWEI",
                "XIAMOI",
                "ALIBABBA",
                "TENCANT",
            ]),
            cities: strs(&[
                "BEIJING",
                "SHANGHAI",
                "SHENZHEN",
                "GUANGZHOU",
                "CHENGDU",
                "CHONGQING",
                "TIANJIN",
                "WUHAN",
                "HANGZHOU",
                "NANJING",
                "SUZHOU",
                "XIAN",
                "XI'AN",
                "QINGDAO",
                "DALIAN",
                "DONGGUAN",
                "FOSHAN",
                "NINGBO",
                "HEFEI",
                "ZHENGZHOU",
                "CHANGSHA",
                "KUNMING",
                "XIAMEN",
                "FUZHOU",
                "SHENYANG",
                "HARBIN",
                "CHANGCHUN",
                "JINAN",
                "SHIJIAZHUANG",
                "NANCHANG",
                "NANNING",
                "GUIYANG",
                "LANZHOU",
                "URUMQI",
                "ZHUHAI",
                "WUXI",
            ]),
            provinces: strs(&[
                "GUANGDONG",
                "JIANGSU",
                "ZHEJIANG",
                "SHANDONG",
                "HENAN",
                "SICHUAN",
                "HUBEI",
                "HUNAN",
                "HEBEI",
                "FUJIAN",
                "ANHUI",
                "LIAONING",
                "SHAANXI",
                "SHANXI",
                "JIANGXI",
                "YUNNAN",
                "GUIZHOU",
                "GUANGXI",
                "GANSU",
                "HAINAN",
                "JILIN",
                "HEILONGJIANG",
                "QINGHAI",
                "NINGXIA",
                "XINJIANG",
                "XIZANG",
                "TIBET",
                "INNER MONGOLIA",
                "NEI MONGOL",
            ]),
            districts: strs(&[
                "HAIDIAN",
                "CHAOYANG",
                "DONGCHENG",
                "XICHENG",
                "FENGTAI",
                "PUDONG",
                "MINHANG",
                "XUHUI",
                "JINGAN",
                "HONGKOU",
                "NANSHAN",
                "FUTIAN",
                "LUOHU",
                "BAOAN",
                "BAO'AN",
                "LONGGANG",
                "LONGHUA",
                "TIANHE",
                "YUEXIU",
                "PANYU",
                "BINHAI",
                "YUZHONG",
                "JIANGBEI",
                "GULOU",
                "QIXIA",
                "WUHOU",
                "JINNIU",
            ]),
            street_tokens: strs(&[
                "LU", "JIE", "DAJIE", "DADAO", "HUTONG", "NONG", "LILONG", "CUN", "ZHEN",
            ]),
            postal_patterns: strs(&["^[1-8][0-9]{5}$"]),
            false_positives: strs(&[
                "CHINA BEACH",
                "CHINA GROVE",
                "CHINA LAKE",
                "CHINA SPRING",
                "CHINATOWN",
                "CHINA GARDEN",
                "CHINA WOK",
                "CHINA BUFFET",
                "CHINA HOUSE",
                "CHINA KING",
                "CHINA STAR",
                "CHINA ONE",
                "CHINA EXPRESS",
                "CHINA INN",
                "CHINA MOON",
                "GREAT WALL RESTAURANT",
                "GREAT WALL CHINESE RESTAURANT",
                "GREAT WALL BUFFET",
                "PANDA EXPRESS",
                "BONE CHINA",
                "FINE CHINA",
                "LENOX CHINA",
                "HOMER LAUGHLIN",
                "CHINATI",
                "INDOCHINA",
                "AZTEC",
                "COMAC PUMP",
            ]),
            taiwan_identifiers: strs(&["TAIWAN", "TAIPEI", "TWN", "TW", "ROC"]),
            hong_kong_identifiers: strs(&["HONG KONG", "HK", "HKG", "HKSAR"]),
            weights: ScoreWeights::default(),
            thresholds: ScoreThresholds::default(),
            despace_min_len: default_despace_min_len(),
            han_script_enabled: true,
        }
    }
}

impl ReferenceDataBundle {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read reference data file: {}", path))?;
        let bundle: ReferenceDataBundle = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse reference data file: {}", path))?;
        Ok(bundle)
    }

    pub fn to_file(&self, path: &str) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .context("Failed to serialize reference data")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write reference data file: {}", path))?;
        Ok(())
    }

    /// Total number of list entries across every category, for log lines.
    pub fn rule_count(&self) -> usize {
        self.country_identifiers.len()
            + self.company_names.len()
            + self.company_misspellings.len()
            + self.cities.len()
            + self.provinces.len()
            + self.districts.len()
            + self.street_tokens.len()
            + self.postal_patterns.len()
            + self.false_positives.len()
            + self.taiwan_identifiers.len()
            + self.hong_kong_identifiers.len()
    }

    /// Lint the bundle without building a classifier. Errors mean the
    /// bundle cannot work as intended; warnings mean it will load but
    /// something looks off.
    pub fn validate(&self) -> BundleReport {
        let mut report = BundleReport::new();

        let core_lists: [(&str, &Vec<String>); 6] = [
            ("country_identifiers", &self.country_identifiers),
            ("company_names", &self.company_names),
            ("cities", &self.cities),
            ("false_positives", &self.false_positives),
            ("taiwan_identifiers", &self.taiwan_identifiers),
            ("hong_kong_identifiers", &self.hong_kong_identifiers),
        ];
        for (list_name, list) in core_lists {
            if list.is_empty() {
                report.error(format!("List '{}' is empty", list_name));
            }
        }

        let optional_lists: [(&str, &Vec<String>); 4] = [
            ("company_misspellings", &self.company_misspellings),
            ("provinces", &self.provinces),
            ("districts", &self.districts),
            ("street_tokens", &self.street_tokens),
        ];
        for (list_name, list) in optional_lists {
            if list.is_empty() {
                report.warn(format!("List '{}' is empty", list_name));
            }
        }

        if self.postal_patterns.is_empty() {
            report.warn("List 'postal_patterns' is empty".to_string());
        }
        for pattern in &self.postal_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                report.error(format!("Invalid postal regex pattern '{}': {}", pattern, e));
            }
        }

        for (list_name, list) in core_lists.iter().chain(optional_lists.iter()) {
            for entry in list.iter() {
                if normalize(entry).is_empty() {
                    report.warn(format!(
                        "Entry '{}' in '{}' normalizes to nothing and will never match",
                        entry, list_name
                    ));
                }
            }
        }

        let t = &self.thresholds;
        if t.medium <= 0 {
            report.error(format!(
                "Threshold 'medium' must be positive, got {}",
                t.medium
            ));
        }
        if !(t.medium <= t.high && t.high <= t.very_high) {
            report.error(format!(
                "Thresholds must be ordered medium <= high <= very_high, got {}/{}/{}",
                t.medium, t.high, t.very_high
            ));
        }

        let w = &self.weights;
        let weight_entries: [(&str, i64); 8] = [
            ("country", w.country),
            ("company", w.company),
            ("postal", w.postal),
            ("city", w.city),
            ("province", w.province),
            ("district", w.district),
            ("street", w.street),
            ("han_script", w.han_script),
        ];
        for (weight_name, value) in weight_entries {
            if value < 0 {
                report.error(format!(
                    "Weight '{}' must be non-negative, got {}",
                    weight_name, value
                ));
            }
        }

        if self.despace_min_len == 0 {
            report.warn(
                "despace_min_len of 0 applies the despaced pass to every pattern, \
                 including short codes"
                    .to_string(),
            );
        }
        if self.han_script_enabled && w.han_script >= t.medium {
            report.warn(format!(
                "han_script weight {} reaches the decision threshold {}; \
                 script alone would classify a record",
                w.han_script, t.medium
            ));
        }

        report
    }
}

/// Outcome of linting a bundle: accumulated errors and warnings, with
/// `valid` dropping to false on the first error.
#[derive(Debug, Clone)]
pub struct BundleReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl BundleReport {
    pub fn new() -> Self {
        BundleReport {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(&mut self, message: String) {
        self.valid = false;
        self.errors.push(message);
    }

    pub fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

impl Default for BundleReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bundle_is_valid() {
        let report = ReferenceDataBundle::default().validate();
        assert!(report.valid, "errors: {:?}", report.errors);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_default_bundle_carries_the_canonical_entries() {
        let bundle = ReferenceDataBundle::default();
        for code in ["CN", "CHN", "PRC", "P.R.C.", "P R C", "CHINA"] {
            assert!(
                bundle.country_identifiers.iter().any(|c| c == code),
                "missing country identifier {}",
                code
            );
        }
        assert!(bundle.company_names.iter().any(|c| c == "HUAWEI"));
        assert!(bundle.company_misspellings.iter().any(|c| c == "HWAWEI"));
        assert!(bundle.cities.iter().any(|c| c == "SHENZHEN"));
        assert!(bundle.taiwan_identifiers.iter().any(|c| c == "TAIWAN"));
        assert!(bundle.hong_kong_identifiers.iter().any(|c| c == "HONG KONG"));
        assert!(bundle.rule_count() > 100);
    }

    #[test]
    fn test_yaml_round_trip() {
        let bundle = ReferenceDataBundle::default();
        let yaml = serde_yaml::to_string(&bundle).unwrap();
        let parsed: ReferenceDataBundle = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.version, bundle.version);
        assert_eq!(parsed.country_identifiers, bundle.country_identifiers);
        assert_eq!(parsed.weights.company, 80);
        assert_eq!(parsed.thresholds.very_high, 100);
        assert_eq!(parsed.despace_min_len, 5);
    }

    #[test]
    fn test_partial_yaml_fills_tunables_from_defaults() {
        let yaml = r#"
country_identifiers: ["CN", "CHINA"]
company_names: ["HUAWEI"]
cities: ["SHENZHEN"]
false_positives: ["CHINATOWN"]
taiwan_identifiers: ["TAIWAN"]
hong_kong_identifiers: ["HONG KONG"]
weights:
  company: 90
"#;
        let bundle: ReferenceDataBundle = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(bundle.weights.company, 90);
        assert_eq!(bundle.weights.country, 100);
        assert_eq!(bundle.thresholds.medium, 50);
        assert!(bundle.han_script_enabled);
        assert!(bundle.postal_patterns.is_empty());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let yaml = "country_identifiers: [\"CN\"]\nmystery_list: [\"X\"]\n";
        assert!(serde_yaml::from_str::<ReferenceDataBundle>(yaml).is_err());
    }

    #[test]
    fn test_validate_flags_bad_regex() {
        let mut bundle = ReferenceDataBundle::default();
        bundle.postal_patterns.push("[0-9".to_string());
        let report = bundle.validate();
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("[0-9")));
    }

    #[test]
    fn test_validate_flags_empty_core_list() {
        let mut bundle = ReferenceDataBundle::default();
        bundle.country_identifiers.clear();
        let report = bundle.validate();
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("country_identifiers")));
    }

    #[test]
    fn test_validate_flags_unordered_thresholds() {
        let mut bundle = ReferenceDataBundle::default();
        bundle.thresholds = ScoreThresholds {
            medium: 80,
            high: 70,
            very_high: 100,
        };
        let report = bundle.validate();
        assert!(!report.valid);
    }

    #[test]
    fn test_validate_warns_on_heavy_han_weight() {
        let mut bundle = ReferenceDataBundle::default();
        bundle.weights.han_script = 60;
        let report = bundle.validate();
        assert!(report.valid);
        assert!(report.warnings.iter().any(|w| w.contains("han_script")));
    }

    #[test]
    fn test_file_round_trip() {
        let bundle = ReferenceDataBundle::default();
        let path = std::env::temp_dir().join("prc-screen-refdata-test.yaml");
        let path = path.to_str().unwrap();
        bundle.to_file(path).unwrap();
        let loaded = ReferenceDataBundle::from_file(path).unwrap();
        assert_eq!(loaded.cities, bundle.cities);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ReferenceDataBundle::from_file("/nonexistent/refdata.yaml").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/refdata.yaml"));
    }
}
