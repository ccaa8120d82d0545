/// A raw field canonicalized for matching.
///
/// `plain` is the uppercased text with every punctuation/whitespace run
/// collapsed to a single space and the ends trimmed. `despaced` is `plain`
/// with the spaces removed, and exists to catch character-spacing evasion
/// ("H u a w e i" despaces to "HUAWEI"). Both forms keep CJK ideographs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedText {
    pub plain: String,
    pub despaced: String,
}

impl NormalizedText {
    pub fn is_empty(&self) -> bool {
        self.plain.is_empty()
    }

    /// Tokens of the plain form. The plain form is single-space separated
    /// by construction, so this never yields empty tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.plain.split(' ').filter(|t| !t.is_empty())
    }

    /// True when `needle`'s token sequence appears as contiguous tokens of
    /// the plain form. Empty needles never match.
    pub fn contains_token_seq(&self, needle: &[String]) -> bool {
        if needle.is_empty() {
            return false;
        }
        let hay: Vec<&str> = self.tokens().collect();
        if hay.len() < needle.len() {
            return false;
        }
        hay.windows(needle.len())
            .any(|w| w.iter().zip(needle.iter()).all(|(h, n)| *h == n))
    }

    /// Phrase containment used by the exclusion lists: the pattern appears
    /// in the plain form, or its despaced form appears in the despaced
    /// form (so "CHINATOWN" also covers "CHINA TOWN"). Empty patterns
    /// never match.
    pub fn contains_phrase(&self, pattern: &NormalizedText) -> bool {
        if pattern.is_empty() {
            return false;
        }
        self.plain.contains(&pattern.plain) || self.despaced.contains(&pattern.despaced)
    }

    /// Whole-field equality modulo spacing and punctuation: "P.R.C." and
    /// "P R C" both equal "PRC" under this comparison.
    pub fn equals_despaced(&self, pattern: &NormalizedText) -> bool {
        !pattern.is_empty() && self.despaced == pattern.despaced
    }
}

/// Canonicalize a raw string for matching. Pure and total: empty input
/// yields an empty `NormalizedText`, never an error. Idempotent over the
/// plain form: `normalize(normalize(s).plain).plain == normalize(s).plain`.
pub fn normalize(raw: &str) -> NormalizedText {
    let mut plain = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !plain.is_empty() {
                plain.push(' ');
            }
            pending_space = false;
            for up in ch.to_uppercase() {
                plain.push(up);
            }
        } else {
            // Punctuation and whitespace both act as token separators, so
            // "CO.,LTD" becomes "CO LTD" rather than "COLTD".
            pending_space = true;
        }
    }
    let despaced = plain.chars().filter(|c| *c != ' ').collect();
    NormalizedText { plain, despaced }
}
