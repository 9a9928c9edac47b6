//! Source-format parsers.
//!
//! Each parser streams rows out of a staged upload and hands them to a
//! visitor one at a time. Row-level problems travel inside [`SourceRow`];
//! only problems with the file as a whole surface as [`ParseError`].

pub mod delimited;
pub mod error;
pub mod spreadsheet;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::landmark::{RawLandmark, RowError};

pub use delimited::DelimitedParser;
pub use error::ParseError;
pub use spreadsheet::SpreadsheetParser;

/// Upload formats accepted at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Xls,
    Xlsx,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xls" => Some(Self::Xls),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xls => "xls",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Returns the text after the last `.` of a file name, or `""` when the
/// name has no extension or starts with its only dot.
pub fn extension_of(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[idx + 1..],
        _ => "",
    }
}

/// One row read from a source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    /// 1-based physical row number, header included.
    pub row_number: u64,
    /// The row as it appeared in the source, for failure records.
    pub raw: String,
    pub fields: Result<RawLandmark, RowError>,
}

/// Returned by a row visitor to keep reading or stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowControl {
    Continue,
    Stop,
}

/// A source opened for reading. Rows are delivered strictly in file order.
pub trait RowSource {
    fn read_rows(
        &mut self,
        visit: &mut dyn FnMut(SourceRow) -> RowControl,
    ) -> Result<(), ParseError>;
}

pub trait RowParser: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn RowSource>, ParseError>;
    fn supports(&self, format: SourceFormat) -> bool;
}

pub struct ParserRegistry {
    parsers: Vec<Box<dyn RowParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(DelimitedParser), Box::new(SpreadsheetParser)],
        }
    }

    pub fn open(&self, path: &Path, format: SourceFormat) -> Result<Box<dyn RowSource>, ParseError> {
        self.parsers
            .iter()
            .find(|p| p.supports(format))
            .ok_or_else(|| ParseError::UnsupportedFormat(format.extension().to_string()))?
            .open(path)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
