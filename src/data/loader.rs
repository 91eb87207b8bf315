use std::fs;
use std::path::Path;

use crate::error::{Result, RidgeError};

use super::fcs::read_fcs;
use super::model::TimeSeries;

/// Literal substring a file name needs to count as an FCS file.
const FCS_MARKER: &str = "fcs";

// ---------------------------------------------------------------------------
// Directory checks and discovery
// ---------------------------------------------------------------------------

/// The source directory must exist, be a directory and hold something.
pub fn check_directory(dir: &Path) -> Result<()> {
    let invalid = |reason: String| RidgeError::InvalidDirectory {
        path: dir.to_path_buf(),
        reason,
    };

    let meta = fs::metadata(dir).map_err(|e| invalid(e.to_string()))?;
    if !meta.is_dir() {
        return Err(invalid("not a directory".into()));
    }
    let mut entries = fs::read_dir(dir).map_err(|e| invalid(e.to_string()))?;
    if entries.next().is_none() {
        return Err(invalid("directory is empty".into()));
    }
    Ok(())
}

/// File names in `dir` containing `identifier` and the substring `fcs`.
///
/// Names are returned sorted, which fixes the insertion order of the time
/// series built from them.
pub fn discover(dir: &Path, identifier: &str) -> Result<Vec<String>> {
    check_directory(dir)?;

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();

    let matching: Vec<String> = names
        .into_iter()
        .filter(|name| name.contains(identifier))
        .collect();
    if matching.is_empty() {
        return Err(RidgeError::NoMatchingFiles {
            identifier: identifier.to_string(),
            dir: dir.to_path_buf(),
        });
    }

    let fcs: Vec<String> = matching
        .into_iter()
        .filter(|name| name.contains(FCS_MARKER))
        .collect();
    if fcs.is_empty() {
        return Err(RidgeError::NoMatchingFcsFiles {
            identifier: identifier.to_string(),
            dir: dir.to_path_buf(),
        });
    }

    log::debug!("Matched files for '{identifier}': {fcs:?}");
    Ok(fcs)
}

// ---------------------------------------------------------------------------
// Time points
// ---------------------------------------------------------------------------

/// Time-point label encoded in a file name such as `A02_6.fcs`.
///
/// Everything from the first `.` on is ignored; the label is the token
/// after the last `_` of what remains (`sample_119_0.fcs` → `0`).
pub fn time_point_label(file_name: &str) -> Result<String> {
    let stem = file_name.split('.').next().unwrap_or(file_name);
    match stem.rsplit_once('_') {
        Some((_, label)) if !label.is_empty() => Ok(label.to_string()),
        _ => Err(RidgeError::MissingTimePoint(file_name.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Load & aggregate
// ---------------------------------------------------------------------------

/// Read every file and key it by its time point, in the given order.
///
/// A repeated label replaces the earlier sample (logged), unless `strict`
/// is set, in which case it is an error.
pub fn load_time_series(dir: &Path, files: &[String], strict: bool) -> Result<TimeSeries> {
    let mut series = TimeSeries::new();

    for file in files {
        let label = time_point_label(file)?;
        if strict && series.get(&label).is_some() {
            return Err(RidgeError::DuplicateTimePoint {
                label,
                file: file.clone(),
            });
        }

        log::info!("Loading {file} (time point {label})");
        let sample = read_fcs(&dir.join(file)).map_err(|source| RidgeError::Fcs {
            file: file.clone(),
            source,
        })?;
        log::debug!(
            "{file}: {} events, channels {:?}",
            sample.event_count(),
            sample.channel_names()
        );

        if let Some(previous) = series.insert(label.as_str(), file.as_str(), sample) {
            log::warn!(
                "Time point '{label}' of {file} replaces the one loaded from {}",
                previous.file
            );
        }
    }

    Ok(series)
}
