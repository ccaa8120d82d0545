/// Detects Han-script (CJK ideograph) text in record fields.
///
/// Upstream feeds frequently carry untransliterated mainland names, but the
/// same script is used in Taiwan and Hong Kong, so a Han hit is only ever a
/// corroborating signal and never a verdict on its own.
pub fn contains_han(text: &str) -> bool {
    text.chars().any(is_han_char)
}

fn is_han_char(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'     // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}'   // CJK Extension A
        | '\u{20000}'..='\u{2A6DF}' // CJK Extension B
        | '\u{F900}'..='\u{FAFF}'   // CJK Compatibility Ideographs
    )
}
