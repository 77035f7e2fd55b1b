//! Manifest file handling
//!
//! The manifest records one row per dispatched chunk: the bounding box and
//! the catalogue name. Rows are appended and flushed immediately after
//! dispatch, before the chunk's eventual success or failure is known, so the
//! manifest lists attempted chunks; cross-check against the presence of the
//! output files to find successful ones.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use skycat_common::types::Region;

use crate::error::Result;

/// Header line written at the top of every manifest
pub const MANIFEST_HEADER: &str = "# raLow raHigh decLow decHigh catalogue";

/// Append-only writer for the chunk manifest
#[derive(Debug)]
pub struct ManifestWriter {
    file: File,
}

impl ManifestWriter {
    /// Create (truncating) the manifest and write the header line
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = File::create(path)?;
        writeln!(file, "{}", MANIFEST_HEADER)?;
        Ok(Self { file })
    }

    /// Append one row and flush so a killed run still leaves a usable list
    pub fn append(&mut self, region: &Region, catalogue: &str) -> Result<()> {
        writeln!(self.file, "{}", format_row(region, catalogue))?;
        self.file.flush()?;
        Ok(())
    }
}

/// Format one manifest row: four fixed-precision floats and the name
pub fn format_row(region: &Region, catalogue: &str) -> String {
    format!(
        "{:.6} {:.6} {:.6} {:.6} {}",
        region.ra_low, region.ra_high, region.dec_low, region.dec_high, catalogue
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn region() -> Region {
        Region::new(10.0, 11.0, 0.0, 1.0).unwrap()
    }

    #[test]
    fn test_row_format() {
        assert_eq!(
            format_row(&region(), "cat_0"),
            "10.000000 11.000000 0.000000 1.000000 cat_0"
        );
    }

    #[test]
    fn test_manifest_written_with_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat_list.txt");

        let mut writer = ManifestWriter::create(&path).unwrap();
        writer.append(&region(), "cat_0").unwrap();
        writer
            .append(&Region::new(11.0, 12.0, 1.0, 2.0).unwrap(), "cat_1")
            .unwrap();
        drop(writer);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], MANIFEST_HEADER);
        assert_eq!(lines[1], "10.000000 11.000000 0.000000 1.000000 cat_0");
        assert_eq!(lines[2], "11.000000 12.000000 1.000000 2.000000 cat_1");
    }
}
