//! Persistence for validation results - save/load JSON files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::{BmsCheckError, Result};

use super::result::ValidationResult;

impl ValidationResult {
    /// Save the result to a JSON file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use bmscheck::ValidationResult;
    /// # fn example(result: &ValidationResult) -> bmscheck::Result<()> {
    /// result.save("trend.quality.json")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    BmsCheckError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let file = File::create(path).map_err(|e| {
            BmsCheckError::Persistence(format!(
                "Failed to create file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| {
            BmsCheckError::Persistence(format!("Failed to serialize validation result: {}", e))
        })?;

        Ok(())
    }

    /// Load a result from a JSON file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use bmscheck::ValidationResult;
    /// let result = ValidationResult::load("trend.quality.json").unwrap();
    /// println!("Score: {:.2}", result.score);
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            BmsCheckError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| {
            BmsCheckError::Persistence(format!(
                "Failed to parse validation result '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

/// Default result file path for a data file.
///
/// # Example
///
/// ```
/// use bmscheck::validation::result_path;
///
/// let path = result_path("exports/trend.csv");
/// assert_eq!(path.to_string_lossy(), "exports/trend.quality.json");
/// ```
pub fn result_path(data_path: impl AsRef<Path>) -> PathBuf {
    let data_path = data_path.as_ref();
    let stem = data_path.file_stem().unwrap_or_default().to_string_lossy();
    let parent = data_path.parent().unwrap_or(Path::new("."));

    parent.join(format!("{}.quality.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_path() {
        assert_eq!(
            result_path("data/trend.csv").to_string_lossy(),
            "data/trend.quality.json"
        );
        assert_eq!(result_path("trend.tsv").to_string_lossy(), "trend.quality.json");
    }

    #[test]
    fn test_load_missing_file_is_persistence_error() {
        let err = ValidationResult::load("/nonexistent/trend.quality.json").unwrap_err();
        assert!(matches!(err, BmsCheckError::Persistence(_)));
    }
}
