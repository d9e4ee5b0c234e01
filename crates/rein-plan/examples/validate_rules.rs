use std::env;
use std::path::{Path, PathBuf};

use rein_plan::{ValidationReport, load_rules_document};
use serde_json::Value;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let rules_path = args
        .next()
        .map(PathBuf::from)
        .ok_or("missing rules path")?;
    if args.next().is_some() {
        return Err("unexpected argument".into());
    }

    let rules_json = load_json(&rules_path)?;
    let validated = match load_rules_document(&rules_json) {
        Ok(validated) => validated,
        Err(report) => {
            eprintln!("rules validation failed");
            print_report(&report);
            std::process::exit(1);
        }
    };

    if !validated.warnings.is_empty() {
        eprintln!("rules validated with warnings:");
        print_report(&ValidationReport {
            errors: Vec::new(),
            warnings: validated.warnings,
        });
    } else {
        println!("rules validated successfully");
    }

    Ok(())
}

fn load_json(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let json = serde_json::from_str(&contents)?;
    Ok(json)
}

fn print_report(report: &ValidationReport) {
    for issue in report.errors.iter().chain(&report.warnings) {
        eprintln!("{issue}");
        if let Some(hint) = &issue.hint {
            eprintln!("  hint: {hint}");
        }
    }
}
