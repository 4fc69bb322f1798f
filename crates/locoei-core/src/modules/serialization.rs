//! Table I/O shared by the stages: CSV records via serde, date-stamped output
//! names, and discovery of the previous stage's newest output.

use crate::domain::{LocoError, LocoResult, StageArtifact};
use chrono::Local;
use globset::{Glob, GlobMatcher};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATE_STAMP_FORMAT: &str = "%Y-%m-%d";

pub fn run_stamp() -> String {
    Local::now().format(DATE_STAMP_FORMAT).to_string()
}

pub fn stamped_file_name(stem: &str, stamp: &str) -> String {
    format!("{stem}_{stamp}.csv")
}

pub fn output_pattern(stem: &str) -> String {
    format!("{stem}_[0-9]*-*-*.csv")
}

fn output_matcher(stem: &str) -> LocoResult<GlobMatcher> {
    let pattern = output_pattern(stem);
    Glob::new(&pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|error| {
            LocoError::internal(
                "SYS.OUTPUT_PATTERN",
                format!("invalid output pattern '{}': {}", pattern, error),
            )
        })
}

/// Files in `dir` whose names match `<stem>_<date>.csv`, oldest stamp first.
pub fn find_stage_outputs(dir: &Path, stem: &str) -> LocoResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let matcher = output_matcher(stem)?;
    let entries = fs::read_dir(dir).map_err(|source| {
        LocoError::io_system(
            "IO.OUTPUT_DIR_READ",
            format!("failed to list '{}': {}", dir.display(), source),
        )
    })?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| {
            LocoError::io_system(
                "IO.OUTPUT_DIR_READ",
                format!("failed to list '{}': {}", dir.display(), source),
            )
        })?;
        let file_name = entry.file_name();
        if matcher.is_match(Path::new(&file_name)) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches)
}

pub fn latest_stage_output(dir: &Path, stem: &str) -> LocoResult<PathBuf> {
    find_stage_outputs(dir, stem)?.pop().ok_or_else(|| {
        LocoError::io_system(
            "IO.STAGE_OUTPUT_MISSING",
            format!(
                "no file matching '{}' in '{}'; run the producing stage first",
                output_pattern(stem),
                dir.display()
            ),
        )
    })
}

pub fn remove_previous_outputs(dir: &Path, stem: &str) -> LocoResult<usize> {
    let previous = find_stage_outputs(dir, stem)?;
    for path in &previous {
        fs::remove_file(path).map_err(|source| {
            LocoError::io_system(
                "IO.OUTPUT_REMOVE",
                format!("failed to remove '{}': {}", path.display(), source),
            )
        })?;
    }
    Ok(previous.len())
}

fn csv_error(path: &Path, error: csv::Error) -> LocoError {
    if error.is_io_error() {
        LocoError::io_system(
            "IO.CSV_READ",
            format!("failed to read '{}': {}", path.display(), error),
        )
    } else {
        LocoError::input_validation(
            "INPUT.CSV_PARSE",
            format!("failed to parse '{}': {}", path.display(), error),
        )
    }
}

pub fn read_csv_records<T>(path: &Path) -> LocoResult<Vec<T>>
where
    T: DeserializeOwned,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|error| csv_error(path, error))?;

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|error| csv_error(path, error))
}

/// Every non-empty cell of a headerless CSV, in reading order.
pub fn read_csv_cells(path: &Path) -> LocoResult<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|error| csv_error(path, error))?;

    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| csv_error(path, error))?;
        cells.extend(
            record
                .iter()
                .filter(|cell| !cell.is_empty())
                .map(str::to_string),
        );
    }
    Ok(cells)
}

pub fn write_csv_records<T>(path: &Path, records: &[T]) -> LocoResult<()>
where
    T: Serialize,
{
    let write_error = |error: csv::Error| {
        LocoError::io_system(
            "IO.CSV_WRITE",
            format!("failed to write '{}': {}", path.display(), error),
        )
    };

    let mut writer = csv::Writer::from_path(path).map_err(write_error)?;
    for record in records {
        writer.serialize(record).map_err(write_error)?;
    }
    writer.flush().map_err(|source| {
        LocoError::io_system(
            "IO.CSV_WRITE",
            format!("failed to flush '{}': {}", path.display(), source),
        )
    })
}

/// Replaces any earlier `<stem>_<date>.csv` in `dir` with this run's table.
pub fn write_stage_output<T>(
    dir: &Path,
    stem: &str,
    stamp: &str,
    records: &[T],
) -> LocoResult<StageArtifact>
where
    T: Serialize,
{
    fs::create_dir_all(dir).map_err(|source| {
        LocoError::io_system(
            "IO.OUTPUT_DIRECTORY",
            format!(
                "failed to create output directory '{}': {}",
                dir.display(),
                source
            ),
        )
    })?;
    remove_previous_outputs(dir, stem)?;

    let path = dir.join(stamped_file_name(stem, stamp));
    write_csv_records(&path, records)?;
    Ok(StageArtifact::new(path, records.len()))
}

pub fn read_json_document<T>(path: &Path) -> LocoResult<T>
where
    T: DeserializeOwned,
{
    let source = fs::read_to_string(path).map_err(|source| {
        LocoError::io_system(
            "IO.JSON_READ",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })?;
    serde_json::from_str(&source).map_err(|source| {
        LocoError::input_validation(
            "INPUT.JSON_PARSE",
            format!("failed to parse '{}': {}", path.display(), source),
        )
    })
}
