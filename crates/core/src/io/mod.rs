//! I/O for rasters, vector layers, attribute tables and text reports

mod geojson;
mod geotiff;
mod table;

pub use geojson::{
    feature_collection_from_str, feature_collection_to_string, read_geojson, write_geojson,
};
pub use geotiff::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
pub use table::{write_csv, write_csv_to};

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Where a tool should put its results.
///
/// Mirrors the output group of the survey tools: a vector layer, an
/// attribute table, a text report, or the report printed to the console.
#[derive(Debug, Clone, Default)]
pub struct ExportTargets {
    /// GeoJSON layer with the computed features
    pub features: Option<PathBuf>,
    /// CSV attribute table
    pub csv: Option<PathBuf>,
    /// Plain-text report
    pub report: Option<PathBuf>,
    /// Print the report to standard output
    pub print_report: bool,
}

impl ExportTargets {
    /// Fail when no output was requested at all
    pub fn validate(&self, tool: &'static str) -> Result<()> {
        if self.features.is_none() && self.csv.is_none() && self.report.is_none() && !self.print_report {
            return Err(Error::MissingOutput(tool));
        }
        Ok(())
    }
}

/// Write report lines as UTF-8 text, one per line
pub fn write_report<P: AsRef<Path>>(lines: &[String], path: P) -> Result<()> {
    let mut text = lines.join("\n");
    text.push('\n');
    std::fs::write(path.as_ref(), text)?;
    tracing::debug!("report written to {}", path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_require_output() {
        let none = ExportTargets::default();
        assert!(matches!(none.validate("lines"), Err(Error::MissingOutput("lines"))));

        let printed = ExportTargets {
            print_report: true,
            ..Default::default()
        };
        assert!(printed.validate("lines").is_ok());
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reporte.txt");
        let lines = vec!["REPORTE".to_string(), String::new(), "Área: 1.0".to_string()];
        write_report(&lines, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "REPORTE\n\nÁrea: 1.0\n");
    }
}
