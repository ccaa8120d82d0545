#![allow(clippy::uninlined_format_args)]

use prc_screen::record::EntityRecord;
use prc_screen::refdata::ReferenceDataBundle;
use prc_screen::{Classifier, ExclusionKind};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Testing the exclusion lists against the built-in reference data...");

    let classifier = Classifier::new(ReferenceDataBundle::default())?;
    let mut failures = 0;

    println!("\n=== Restaurants and US homonyms ===");
    let false_positives = [
        "Great Wall Chinese Restaurant",
        "China Garden Restaurant",
        "Panda Express 1148",
        "China Lake Naval Weapons Center",
        "China Grove Baptist Church",
        "Chinati Foundation",
        "Homer Laughlin China Company",
        "Indo-China Trading House",
        "Comac Pump & Well LLC",
    ];
    for name in false_positives {
        let result = classifier.classify(&EntityRecord::named(name));
        match result.exclusion {
            Some(ExclusionKind::FalsePositive) => {
                println!("✅ EXCLUDED: '{}'", name);
            }
            other => {
                println!("❌ WRONG: '{}' got {:?} (score {})", name, other, result.score);
                failures += 1;
            }
        }
    }

    println!("\n=== Taiwan separation ===");
    let taiwan_cases = [
        EntityRecord::named("Taiwan Semiconductor Manufacturing Company").with_country("TW"),
        EntityRecord::named("Foxconn Technology").with_country("Taiwan, Province of China"),
        EntityRecord::named("Taiwan Glass (China) Holdings"),
        EntityRecord::named("ROC (China) Trading Co"),
    ];
    for record in taiwan_cases {
        let result = classifier.classify(&record);
        if result.is_taiwan() && !result.is_chinese {
            println!("✅ TAIWAN: '{}'", record.name);
        } else {
            println!(
                "❌ WRONG: '{}' got {:?} (is_chinese={})",
                record.name, result.exclusion, result.is_chinese
            );
            failures += 1;
        }
    }

    println!("\n=== Hong Kong separation ===");
    let hk_cases = [
        EntityRecord::named("Acme Trading").with_country("Hong Kong"),
        EntityRecord::named("Acme Trading").with_country("HK"),
        EntityRecord::named("HK Electronics Ltd"),
        EntityRecord::named("Hongkong and Shanghai Banking Corporation"),
    ];
    for record in hk_cases {
        let result = classifier.classify(&record);
        if result.is_hong_kong() && !result.is_chinese {
            println!("✅ HONG KONG: '{}'", record.name);
        } else {
            println!(
                "❌ WRONG: '{}' got {:?} (is_chinese={})",
                record.name, result.exclusion, result.is_chinese
            );
            failures += 1;
        }
    }

    println!("\n=== Names that must pass through ===");
    // COMAC the airframer scores; only the pump company is excluded.
    let comac = classifier.classify(&EntityRecord::named("COMAC Shanghai"));
    if comac.is_chinese && comac.exclusion.is_none() {
        println!("✅ SCORED: 'COMAC Shanghai' (score {})", comac.score);
    } else {
        println!("❌ WRONG: 'COMAC Shanghai' excluded or unflagged");
        failures += 1;
    }

    // Long-standing list behavior: without the standalone ROC token this
    // name is not a Taiwan marker and still lights up the China patterns.
    let roc = classifier.classify(&EntityRecord::named("Republic of China Import Export"));
    if roc.exclusion.is_none() && roc.is_chinese {
        println!("✅ SCORED: 'Republic of China Import Export' (score {})", roc.score);
    } else {
        println!(
            "❌ WRONG: 'Republic of China Import Export' got {:?}",
            roc.exclusion
        );
        failures += 1;
    }

    // Taiwan marker without any China pattern is left alone entirely.
    let tsmc = classifier.classify(&EntityRecord::named("Taiwan Semiconductor Manufacturing"));
    if tsmc.exclusion.is_none() && !tsmc.is_chinese {
        println!("✅ CLEAN: 'Taiwan Semiconductor Manufacturing' (no country field)");
    } else {
        println!(
            "❌ WRONG: 'Taiwan Semiconductor Manufacturing' got {:?}",
            tsmc.exclusion
        );
        failures += 1;
    }

    println!();
    if failures == 0 {
        println!("✅ SUCCESS: all exclusion checks passed");
        Ok(())
    } else {
        println!("❌ FAILED: {} exclusion check(s) failed", failures);
        std::process::exit(1);
    }
}
