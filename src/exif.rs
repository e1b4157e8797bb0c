//! EXIF metadata reading.
//!
//! Width, height and capture time come from `exiftool`, run once per gallery
//! over every image file:
//!
//! ```text
//! exiftool -ImageWidth -ImageHeight -DateTimeOriginal -json <file>...
//! ```
//!
//! The [`MetadataReader`] trait is the seam between `init` and the external
//! tool, so manifest initialization is testable without exiftool installed.

use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExifError {
    #[error("EXIF tool `{0}` not found. Is exiftool installed?")]
    NotInstalled(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("EXIF tool failed: {0}")]
    Failed(String),
    #[error("Unreadable EXIF tool output: {0}")]
    Output(#[from] serde_json::Error),
}

/// One entry of exiftool's `-json` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExifRecord {
    pub source_file: String,
    #[serde(default)]
    pub image_width: Option<u32>,
    #[serde(default)]
    pub image_height: Option<u32>,
    #[serde(default)]
    pub date_time_original: Option<String>,
}

impl ExifRecord {
    /// Last path segment of `SourceFile`.
    pub fn filename(&self) -> &str {
        self.source_file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.source_file)
    }
}

/// Source of per-image dimensions and capture time.
pub trait MetadataReader {
    /// Read metadata for every file, in any order.
    fn read(&self, files: &[PathBuf]) -> Result<Vec<ExifRecord>, ExifError>;
}

/// Reads metadata by shelling out to exiftool.
pub struct ExifTool {
    command: String,
}

impl ExifTool {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl MetadataReader for ExifTool {
    fn read(&self, files: &[PathBuf]) -> Result<Vec<ExifRecord>, ExifError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(command = %self.command, files = files.len(), "running EXIF tool");

        let output = Command::new(&self.command)
            .args(["-ImageWidth", "-ImageHeight", "-DateTimeOriginal", "-json"])
            .args(files.iter().map(|p| p.as_os_str()))
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ExifError::NotInstalled(self.command.clone()),
                _ => ExifError::Io(e),
            })?;

        // exiftool exits non-zero when any single file had a problem, yet still
        // prints JSON for the rest; only an empty stdout is a hard failure.
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ExifError::Failed(if stderr.is_empty() {
                format!("no output (exit status {})", output.status)
            } else {
                stderr
            }));
        }
        parse_exif_json(&output.stdout)
    }
}

/// Parse exiftool's `-json` output.
pub fn parse_exif_json(bytes: &[u8]) -> Result<Vec<ExifRecord>, ExifError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Whether `path` has one of `extensions` (case-insensitive).
pub fn has_image_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy())
        .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(&ext)))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Mock reader that answers from a fixed table and records what it was asked.
    #[derive(Default)]
    pub struct MockReader {
        pub records: Vec<ExifRecord>,
        pub requested: RefCell<Vec<String>>,
        pub fail: Option<String>,
    }

    impl MockReader {
        /// Records for `(filename, width, height)` triples.
        pub fn with_dimensions(entries: &[(&str, u32, u32)]) -> Self {
            Self {
                records: entries
                    .iter()
                    .map(|(name, w, h)| ExifRecord {
                        source_file: format!("photos/{name}"),
                        image_width: Some(*w),
                        image_height: Some(*h),
                        date_time_original: None,
                    })
                    .collect(),
                ..Self::default()
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                fail: Some(message.to_string()),
                ..Self::default()
            }
        }
    }

    impl MetadataReader for MockReader {
        fn read(&self, files: &[PathBuf]) -> Result<Vec<ExifRecord>, ExifError> {
            if let Some(message) = &self.fail {
                return Err(ExifError::Failed(message.clone()));
            }
            let names: Vec<String> = files
                .iter()
                .filter_map(|f| f.file_name())
                .map(|f| f.to_string_lossy().into_owned())
                .collect();
            let found = self
                .records
                .iter()
                .filter(|r| names.iter().any(|n| n == r.filename()))
                .cloned()
                .collect();
            self.requested.borrow_mut().extend(names);
            Ok(found)
        }
    }

    #[test]
    fn parse_exiftool_output() {
        let json = br#"[
            {"SourceFile": "src/assets/images/photos/merida/DSCF001.jpeg",
             "ImageWidth": 6240, "ImageHeight": 4160,
             "DateTimeOriginal": "2026:01:14 09:12:44"},
            {"SourceFile": "src/assets/images/photos/merida/DSCF002.jpeg",
             "ImageWidth": 4160, "ImageHeight": 6240}
        ]"#;
        let records = parse_exif_json(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].filename(), "DSCF001.jpeg");
        assert_eq!(records[0].image_width, Some(6240));
        assert_eq!(
            records[0].date_time_original.as_deref(),
            Some("2026:01:14 09:12:44")
        );
        assert_eq!(records[1].date_time_original, None);
    }

    #[test]
    fn parse_rejects_non_json() {
        assert!(matches!(
            parse_exif_json(b"Error: File not found"),
            Err(ExifError::Output(_))
        ));
    }

    #[test]
    fn filename_without_directory() {
        let record = ExifRecord {
            source_file: "DSCF009.jpeg".to_string(),
            ..ExifRecord::default()
        };
        assert_eq!(record.filename(), "DSCF009.jpeg");
    }

    #[test]
    fn image_extension_match_is_case_insensitive() {
        let exts = vec!["jpeg".to_string(), "jpg".to_string()];
        assert!(has_image_extension(Path::new("a/DSCF001.JPEG"), &exts));
        assert!(has_image_extension(Path::new("b.jpg"), &exts));
        assert!(!has_image_extension(Path::new("c.png"), &exts));
        assert!(!has_image_extension(Path::new("noext"), &exts));
    }

    #[test]
    fn missing_tool_is_reported_as_not_installed() {
        let tool = ExifTool::new("definitely-not-an-exif-tool-3f9a");
        let result = tool.read(&[PathBuf::from("a.jpeg")]);
        assert!(matches!(result, Err(ExifError::NotInstalled(_))));
    }

    #[test]
    fn no_files_skips_the_tool() {
        let tool = ExifTool::new("definitely-not-an-exif-tool-3f9a");
        assert!(tool.read(&[]).unwrap().is_empty());
    }

    #[test]
    fn mock_records_requests() {
        let reader = MockReader::with_dimensions(&[("a.jpeg", 10, 5), ("b.jpeg", 5, 10)]);
        let records = reader.read(&[PathBuf::from("dir/a.jpeg")]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(reader.requested.borrow().as_slice(), ["a.jpeg"]);
    }
}
