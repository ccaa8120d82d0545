#![allow(clippy::uninlined_format_args)]

use prc_screen::record::EntityRecord;
use prc_screen::refdata::ReferenceDataBundle;
use prc_screen::Classifier;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Testing evasion resistance with a trimmed reference bundle...");

    // Small bundle showing the YAML shape; the shipped defaults carry the
    // full lists.
    let bundle_yaml = r#"
version: "smoke"
updated: "manual"
country_identifiers:
  - "CN"
  - "PRC"
  - "P.R.C."
  - "P R C"
  - "CHINA"
company_names:
  - "HUAWEI"
  - "ZTE"
company_misspellings:
  - "HWAWEI"
  - "HUAWAI"
cities:
  - "SHENZHEN"
  - "BEIJING"
postal_patterns:
  - "^[1-8][0-9]{5}$"
false_positives:
  - "CHINATOWN"
taiwan_identifiers:
  - "TAIWAN"
hong_kong_identifiers:
  - "HONG KONG"
"#;

    let bundle: ReferenceDataBundle = serde_yaml::from_str(bundle_yaml)?;
    let classifier = Classifier::new(bundle)?;
    let mut failures = 0;

    println!("\n=== Character-spacing evasion ===");
    for name in [
        "H u a w e i Technologies",
        "H-U-A-W-E-I Device Co",
        "S h e n z h e n Trading",
    ] {
        let result = classifier.classify(&EntityRecord::named(name));
        if result.is_chinese {
            println!("✅ CAUGHT: '{}' (score {}, {})", name, result.score, result.tier.as_str());
        } else {
            println!("❌ MISSED: '{}' (score {})", name, result.score);
            failures += 1;
        }
    }

    println!("\n=== Misspelling variants ===");
    for name in ["Hwawei Technology Ltd", "Huawai Electronics"] {
        let result = classifier.classify(&EntityRecord::named(name));
        if result.is_chinese {
            println!("✅ CAUGHT: '{}' (score {})", name, result.score);
        } else {
            println!("❌ MISSED: '{}'", name);
            failures += 1;
        }
    }

    println!("\n=== Punctuated country codes ===");
    for country in ["CN", "P.R.C.", "p r c", "China"] {
        let result = classifier.classify(&EntityRecord::named("Neutral Name").with_country(country));
        if result.is_chinese {
            println!("✅ CAUGHT: country '{}' (score {})", country, result.score);
        } else {
            println!("❌ MISSED: country '{}'", country);
            failures += 1;
        }
    }

    println!("\n=== Short tokens must not despace ===");
    for name in ["Z T E Trading", "Z T E"] {
        let result = classifier.classify(&EntityRecord::named(name));
        if result.score == 0 {
            println!("✅ GOOD: '{}' stays clean (no despaced short-code hit)", name);
        } else {
            println!("❌ BAD: '{}' scored {} unexpectedly", name, result.score);
            failures += 1;
        }
    }

    println!("\n=== Legitimate records stay clean ===");
    for name in ["Bayerische Motoren Werke AG", "Chinatown Express LLC"] {
        let result = classifier.classify(&EntityRecord::named(name));
        if !result.is_chinese {
            println!("✅ GOOD: '{}' not flagged", name);
        } else {
            println!("❌ BAD: '{}' flagged with score {}", name, result.score);
            failures += 1;
        }
    }

    println!();
    if failures == 0 {
        println!("✅ SUCCESS: all evasion checks passed");
        Ok(())
    } else {
        println!("❌ FAILED: {} evasion check(s) failed", failures);
        std::process::exit(1);
    }
}
