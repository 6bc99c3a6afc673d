use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use meetpoint::geojson::plan_to_feature_collection;
use meetpoint::{parse_codes, MeetingPlan, MeetpointError};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{build_planner, PlannerOptions};

pub fn run(
    options: &PlannerOptions,
    input: Option<PathBuf>,
    column: &str,
    json: bool,
    geojson: Option<PathBuf>,
) -> Result<()> {
    let codes = read_codes(input.as_deref(), column)?;
    if codes.is_empty() {
        eprintln!("Warning: no location codes provided");
        return Ok(());
    }

    let planner = build_planner(options)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Refining midpoint for {} location(s)...", codes.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = planner.plan_codes(codes);
    spinner.finish_and_clear();

    let plan = match result {
        Ok(plan) => plan,
        Err(MeetpointError::NoValidCoordinates { failures }) => {
            for failure in &failures {
                eprintln!("{}", failure);
            }
            bail!("Could not retrieve any valid coordinates");
        }
        Err(e) => return Err(e).context("Failed to compute meeting point"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }

    if let Some(path) = geojson {
        write_geojson(&plan, &path)?;
        eprintln!("Map data written to: {}", path.display());
    }

    Ok(())
}

/// Read location codes from a file, a CSV column, or stdin.
///
/// `None` and `-` read stdin. Files ending in `.csv` read `column`; any other
/// file is treated as one code per line.
pub fn read_codes(input: Option<&Path>, column: &str) -> Result<Vec<String>> {
    let path = match input {
        Some(path) if path != Path::new("-") => path,
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            return Ok(parse_codes(&text));
        }
    };

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        read_csv_column(path, column)
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(parse_codes(&text))
    }
}

fn read_csv_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let file = File::open(path).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let idx = headers
        .iter()
        .position(|h| h.trim() == column)
        .with_context(|| format!("Column '{}' not found in CSV", column))?;

    let mut codes = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(code) = record.get(idx).map(str::trim).filter(|c| !c.is_empty()) {
            codes.push(code.to_string());
        }
    }
    Ok(codes)
}

fn print_plan(plan: &MeetingPlan) {
    println!("Location codes:");
    for code in &plan.codes {
        println!("  {}", code);
    }

    for failure in &plan.geocode_failures {
        eprintln!("{}", failure);
    }
    if let Some(reason) = &plan.refinement.oracle_failure {
        eprintln!(
            "Error calculating distances: {} (stopped after {} iteration(s))",
            reason, plan.refinement.iterations
        );
    }

    println!();
    println!("Refined midpoint: {}", plan.midpoint());
    println!();
    println!("Distances to the midpoint:");
    for entry in &plan.report {
        println!("  {}", entry);
    }
}

fn write_geojson(plan: &MeetingPlan, path: &Path) -> Result<()> {
    let collection = plan_to_feature_collection(plan);

    let file = File::create(path).context("Failed to create GeoJSON file")?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &geojson::GeoJson::FeatureCollection(collection))?;
    writer.flush()?;
    Ok(())
}
