//! Persistence of finished conversions.
//!
//! Store mode writes two artifacts next to each other:
//! - `<stem>.json` (or one Parquet file per channel under `<stem>_flat/`)
//!   with the flat matrices
//! - `<stem>_parsed.json` with the structured column stores

pub mod json;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use lt_common::{Error, FlatFormat};
use lt_export::{write_matrix, WriterConfig};
use tracing::{info, warn};

use crate::run::Conversion;

pub use json::{Metadata, PARSED_SUFFIX};

/// Where a run's outputs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub flat_json: PathBuf,
    pub flat_dir: PathBuf,
    pub structured: PathBuf,
}

impl OutputPaths {
    /// Paths derived from `output` (extension dropped) or from the input log.
    pub fn for_input(input: &Path, output: Option<&Path>) -> Self {
        let stem = match output {
            Some(path) => path.with_extension(""),
            None => default_stem(input),
        };
        Self {
            flat_json: suffixed(&stem, ".json"),
            flat_dir: suffixed(&stem, "_flat"),
            structured: suffixed(&stem, "_parsed.json"),
        }
    }
}

/// Input path with `.` and `-` in the file name replaced by `_`.
pub fn default_stem(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().replace(['.', '-'], "_"))
        .unwrap_or_else(|| "lcm_log".to_string());
    input.with_file_name(name)
}

fn suffixed(stem: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = stem.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Write flat and structured outputs; returns every file written.
pub fn write_outputs(
    conversion: &Conversion,
    source: &Path,
    paths: &OutputPaths,
    format: FlatFormat,
) -> Result<Vec<PathBuf>, Error> {
    let metadata = Metadata::new(source, conversion);
    let mut written = Vec::new();

    match format {
        FlatFormat::Json => {
            json::write_document(&paths.flat_json, &json::flat_document(&metadata, conversion))?;
            written.push(paths.flat_json.clone());
        }
        FlatFormat::Parquet => {
            let config = WriterConfig::new(&paths.flat_dir).with_log_time(conversion.with_log_time);
            for channel in &conversion.channels {
                if channel.flat.cols() == 0 {
                    warn!(channel = %channel.name, "no numeric columns; skipping flat file");
                    continue;
                }
                written.push(write_matrix(&config, &channel.name, &channel.flat)?);
            }
        }
    }

    json::write_document(
        &paths.structured,
        &json::structured_document(&metadata, conversion),
    )?;
    written.push(paths.structured.clone());

    info!(files = written.len(), "wrote outputs");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stem_replaces_dots_and_dashes() {
        assert_eq!(
            default_stem(Path::new("/data/lcmlog-2024-01-01.00")),
            PathBuf::from("/data/lcmlog_2024_01_01_00")
        );
        assert_eq!(default_stem(Path::new("run.log")), PathBuf::from("run_log"));
    }

    #[test]
    fn paths_from_input() {
        let paths = OutputPaths::for_input(Path::new("logs/run.log"), None);
        assert_eq!(paths.flat_json, PathBuf::from("logs/run_log.json"));
        assert_eq!(paths.flat_dir, PathBuf::from("logs/run_log_flat"));
        assert_eq!(paths.structured, PathBuf::from("logs/run_log_parsed.json"));
    }

    #[test]
    fn explicit_output_drops_extension() {
        let paths = OutputPaths::for_input(Path::new("run.log"), Some(Path::new("out/data.json")));
        assert_eq!(paths.flat_json, PathBuf::from("out/data.json"));
        assert_eq!(paths.structured, PathBuf::from("out/data_parsed.json"));
    }
}
