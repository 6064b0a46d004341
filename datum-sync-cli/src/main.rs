use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use datum_sync::{BmiDatumSync, DatumSyncConfig};

/// Column aliases accepted in input CSV headers, matched
/// case-insensitively as substrings.
const LON_KEYS: &[&str] = &["lon", "long", "longitude"];
const LAT_KEYS: &[&str] = &["lat", "latitude"];
const ELEV_KEYS: &[&str] = &["z", "elev", "elevation"];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file or directory of CSV point files
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// BMI configuration file (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let start_time = std::time::Instant::now();

    fs::create_dir_all(&args.output)?;

    // the CLI reads the config as well to learn the variable bindings
    let config = DatumSyncConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config {:?}", args.config))?;

    let mut model = BmiDatumSync::new();
    model
        .initialize(&args.config)
        .with_context(|| format!("failed to initialize model from {:?}", args.config))?;

    let input_files = if args.input.is_file() {
        vec![args.input.clone()]
    } else if args.input.is_dir() {
        collect_csv_files(&args.input)?
    } else {
        error!("Invalid input path: {:?}", args.input);
        anyhow::bail!("Input path must be a file or directory");
    };

    if input_files.is_empty() {
        anyhow::bail!("No CSV files found under {:?}", args.input);
    }
    info!("Found {} input files", input_files.len());

    let mut failures = Vec::new();
    for path in &input_files {
        if let Err(e) = process_file(&mut model, &config, path, &args.output) {
            failures.push(format!("{}: {:#}", path.display(), e));
        }
    }

    model.finalize().context("failed to finalize model")?;

    let elapsed = start_time.elapsed();
    info!("Total processing time: {:?}", elapsed);

    if !failures.is_empty() {
        error!("Failed to process {} files:", failures.len());
        for failure in &failures {
            error!("  {}", failure);
        }
        anyhow::bail!("{} files failed to process", failures.len());
    }

    Ok(())
}

fn collect_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(collect_csv_files(&path)?);
        } else if path.extension().and_then(|s| s.to_str()) == Some("csv") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn process_file(
    model: &mut BmiDatumSync,
    config: &DatumSyncConfig,
    path: &Path,
    output_dir: &Path,
) -> Result<()> {
    info!("Processing file: {:?}", path);

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers = reader.headers()?.clone();

    let lon_idx = find_column(&headers, LON_KEYS)
        .context("CSV must contain a longitude column (lon/long/longitude)")?;
    let lat_idx = find_column(&headers, LAT_KEYS)
        .context("CSV must contain a latitude column (lat/latitude)")?;
    let elev_idx = find_column(&headers, ELEV_KEYS);

    let mut lon = Vec::new();
    let mut lat = Vec::new();
    let mut elev = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read row {}", row + 1))?;
        lon.push(parse_field(&record, lon_idx, row)?);
        lat.push(parse_field(&record, lat_idx, row)?);
        if let Some(idx) = elev_idx {
            elev.push(parse_field(&record, idx, row)?);
        }
    }

    let vars = &config.variables;
    model
        .set_value(&vars.longitude, &lon)
        .and_then(|()| model.set_value(&vars.latitude, &lat))
        .and_then(|()| model.set_value(&vars.elevation, &elev))
        .context("failed to set model inputs")?;
    model.update().context("model update failed")?;

    let flat = model
        .get_value(&vars.output)
        .context("failed to read model output")?;

    let stem = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("points.csv");
    let output_path = output_dir.join(format!("out_{stem}"));
    write_output(&output_path, &flat, lon.len(), elev_idx.is_some())?;

    info!("Written converted points: {:?}", output_path);
    Ok(())
}

fn find_column(headers: &csv::StringRecord, keys: &[&str]) -> Option<usize> {
    for key in keys {
        for (idx, column) in headers.iter().enumerate() {
            if column.to_lowercase().contains(key) {
                return Some(idx);
            }
        }
    }
    None
}

fn parse_field(record: &csv::StringRecord, idx: usize, row: usize) -> Result<f64> {
    let field = record.get(idx).unwrap_or("").trim();
    field
        .parse::<f64>()
        .with_context(|| format!("row {}: '{}' is not a number", row + 1, field))
}

fn write_output(path: &Path, flat: &[f64], rows: usize, with_elevation: bool) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;

    if with_elevation {
        writer.write_record(["longitude", "latitude", "elevation"])?;
    } else {
        writer.write_record(["longitude", "latitude"])?;
    }

    let (x, rest) = flat.split_at(rows);
    let (y, z) = rest.split_at(rows);
    for i in 0..rows {
        if with_elevation {
            writer.write_record([x[i].to_string(), y[i].to_string(), z[i].to_string()])?;
        } else {
            writer.write_record([x[i].to_string(), y[i].to_string()])?;
        }
    }

    writer.flush()?;
    Ok(())
}
