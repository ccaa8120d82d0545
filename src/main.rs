use clap::{Arg, Command};
use log::LevelFilter;
use prc_screen::batch::{BatchRunner, BatchSummary, RecordOutcome};
use prc_screen::{Classifier, EntityRecord, ReferenceDataBundle};
use std::io::Write;
use std::process;

fn main() {
    let matches = Command::new("prc-screen")
        .version(env!("CARGO_PKG_VERSION"))
        .about("PRC entity screening for organization records")
        .long_about(
            "Classifies organization records (patent assignees, procurement vendors, \n\
             publication affiliations) as PRC-affiliated or not, with a calibrated \n\
             confidence tier, per-signal explanations, and exclusion handling for \n\
             Taiwan, Hong Kong and known false-positive names.",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Reference data file path")
                .default_value("refdata.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write the built-in reference data to a file and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the reference data and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Batch input file (CSV with headers, or JSON lines)")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Batch input format: csv, jsonl, or auto (by extension)")
                .default_value("auto"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write per-record outcomes as JSON lines to this file instead of stdout")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("name")
                .long("name")
                .value_name("TEXT")
                .help("Classify a single record with this organization name")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("country")
                .long("country")
                .value_name("TEXT")
                .help("Country field for single-record mode")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("city")
                .long("city")
                .value_name("TEXT")
                .help("City field for single-record mode")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("province")
                .long("province")
                .value_name("TEXT")
                .help("Province/state field for single-record mode")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("address")
                .long("address")
                .value_name("TEXT")
                .help("Address line field for single-record mode")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("postal")
                .long("postal")
                .value_name("TEXT")
                .help("Postal code field for single-record mode")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Print the full tier breakdown after a batch run")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-signal detail")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Initialize logger based on verbose flag
    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    let refdata_path = matches.get_one::<String>("config").unwrap();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_bundle(generate_path);
        return;
    }

    let bundle = match load_bundle(refdata_path) {
        Ok(bundle) => bundle,
        Err(e) => {
            eprintln!("Error loading reference data: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_bundle(&bundle);
        return;
    }

    let classifier = match Classifier::new(bundle) {
        Ok(classifier) => classifier,
        Err(e) => {
            eprintln!("Error building classifier: {e:#}");
            process::exit(1);
        }
    };

    if matches.get_one::<String>("name").is_some() {
        classify_single(&classifier, &matches);
        return;
    }

    if let Some(input_path) = matches.get_one::<String>("input") {
        let format = matches.get_one::<String>("format").unwrap();
        let output_path = matches.get_one::<String>("output").map(String::as_str);
        let show_stats = matches.get_flag("stats");
        if let Err(e) = run_batch(&classifier, input_path, format, output_path, show_stats) {
            eprintln!("Batch error: {e:#}");
            process::exit(1);
        }
        return;
    }

    eprintln!("Nothing to do: use --input FILE for a batch or --name TEXT for a single record");
    process::exit(1);
}

fn load_bundle(path: &str) -> anyhow::Result<ReferenceDataBundle> {
    if std::path::Path::new(path).exists() {
        ReferenceDataBundle::from_file(path)
    } else {
        log::warn!("Reference data file '{path}' not found, using built-in reference data");
        Ok(ReferenceDataBundle::default())
    }
}

fn generate_default_bundle(path: &str) {
    let bundle = ReferenceDataBundle::default();
    match bundle.to_file(path) {
        Ok(()) => {
            println!("Default reference data written to: {path}");
            println!("Edit the lists there and point --config at the file.");
        }
        Err(e) => {
            eprintln!("Error writing reference data file: {e:#}");
            process::exit(1);
        }
    }
}

fn test_bundle(bundle: &ReferenceDataBundle) {
    println!("🔍 Testing reference data...");
    println!();
    println!("Bundle version: {}", bundle.version);
    println!("Reference entries: {}", bundle.rule_count());

    let report = bundle.validate();
    for warning in &report.warnings {
        println!("⚠️  {warning}");
    }
    if report.valid {
        println!("✅ Reference data validated");
    } else {
        println!("❌ Reference data validation failed:");
        for error in &report.errors {
            println!("   {error}");
        }
        process::exit(1);
    }
}

fn classify_single(classifier: &Classifier, matches: &clap::ArgMatches) {
    let mut record = EntityRecord::named(matches.get_one::<String>("name").unwrap());
    record.country = matches.get_one::<String>("country").cloned();
    record.city = matches.get_one::<String>("city").cloned();
    record.province_or_state = matches.get_one::<String>("province").cloned();
    record.address_line = matches.get_one::<String>("address").cloned();
    record.postal_code = matches.get_one::<String>("postal").cloned();

    println!("🔍 Classifying: {}", record.name);
    println!();

    let result = classifier.classify(&record);
    if let Some(kind) = result.exclusion {
        println!("❌ PRC affiliation: NO (excluded: {})", kind.as_str());
        return;
    }

    if result.is_chinese {
        println!(
            "✅ PRC affiliation: YES (score {}, {})",
            result.score,
            result.tier.as_str()
        );
    } else {
        println!(
            "❌ PRC affiliation: NO (score {}, {})",
            result.score,
            result.tier.as_str()
        );
    }
    if !result.signals.is_empty() {
        println!("   Signals:");
        for signal in &result.signals {
            println!(
                "     - {} '{}' on {} (+{})",
                signal.category.as_str(),
                signal.matched_text,
                signal.field.as_str(),
                signal.weight
            );
        }
    }
}

fn run_batch(
    classifier: &Classifier,
    input_path: &str,
    format: &str,
    output_path: Option<&str>,
    show_stats: bool,
) -> anyhow::Result<()> {
    use anyhow::Context;

    let format = match format {
        "auto" => infer_format(input_path)?,
        "csv" | "jsonl" => format.to_string(),
        other => anyhow::bail!("Unsupported format '{}': use csv, jsonl, or auto", other),
    };

    let input = std::fs::File::open(input_path)
        .with_context(|| format!("Failed to open input file: {input_path}"))?;
    let mut output: Box<dyn Write> = match output_path {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {path}"))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    log::info!("Processing {} as {}", input_path, format);

    let runner = BatchRunner::new(classifier);
    let sink = |outcome: &RecordOutcome| -> anyhow::Result<()> {
        let line = serde_json::to_string(outcome).context("Failed to serialize outcome")?;
        writeln!(output, "{line}").context("Failed to write outcome")?;
        Ok(())
    };

    let summary = match format.as_str() {
        "csv" => runner.run_csv(input, sink)?,
        _ => runner.run_jsonl(std::io::BufReader::new(input), sink)?,
    };

    // Keep the summary off stdout when the outcome stream is going there.
    if output_path.is_some() {
        print_summary(&summary, show_stats);
    } else {
        eprint_summary(&summary, show_stats);
    }
    Ok(())
}

fn infer_format(path: &str) -> anyhow::Result<String> {
    let lower = path.to_lowercase();
    if lower.ends_with(".csv") {
        Ok("csv".to_string())
    } else if lower.ends_with(".jsonl") || lower.ends_with(".ndjson") || lower.ends_with(".json") {
        Ok("jsonl".to_string())
    } else {
        anyhow::bail!(
            "Cannot infer format from '{}': pass --format csv or --format jsonl",
            path
        )
    }
}

fn print_summary(summary: &BatchSummary, show_stats: bool) {
    for line in summary_lines(summary, show_stats) {
        println!("{line}");
    }
}

fn eprint_summary(summary: &BatchSummary, show_stats: bool) {
    for line in summary_lines(summary, show_stats) {
        eprintln!("{line}");
    }
}

fn summary_lines(summary: &BatchSummary, show_stats: bool) -> Vec<String> {
    let mut lines = vec![
        "📊 Batch Summary".to_string(),
        "═══════════════════════════════════════".to_string(),
        format!("  Total records: {}", summary.total),
        format!("  ├─ Classified: {}", summary.classified),
        format!("  ├─ Skipped: {}", summary.skipped),
        format!(
            "  └─ Flagged PRC: {} ({:.1}%)",
            summary.flagged,
            summary.flag_rate()
        ),
    ];
    let excluded =
        summary.excluded_false_positive + summary.excluded_taiwan + summary.excluded_hong_kong;
    if excluded > 0 {
        lines.push(format!(
            "  Exclusions: {} false positive, {} Taiwan, {} Hong Kong",
            summary.excluded_false_positive, summary.excluded_taiwan, summary.excluded_hong_kong
        ));
    }
    if show_stats {
        lines.push(String::new());
        lines.push("🎯 Confidence tiers:".to_string());
        lines.push(format!("  VERY_HIGH: {}", summary.tier_very_high));
        lines.push(format!("  HIGH:      {}", summary.tier_high));
        lines.push(format!("  MEDIUM:    {}", summary.tier_medium));
        lines.push(format!("  LOW:       {}", summary.tier_low));
        lines.push(format!("  NONE:      {}", summary.tier_none));
    }
    if let Some(finished) = summary.finished_at {
        lines.push(format!(
            "  Started: {}",
            summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        lines.push(format!(
            "  Finished: {}",
            finished.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    lines
}
