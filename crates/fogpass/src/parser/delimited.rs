//! Delimited text (CSV or TSV) landmark files.
//!
//! The first non-blank line decides the layout: tab-separated if it holds a
//! tab, comma-separated otherwise. That same line is skipped as a header
//! when it mentions both a location and a latitude column; otherwise it is
//! the first data row. Sequence order is not a column here, so it is taken
//! from the data row's position.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::{ParseError, RowControl, RowParser, RowSource, SourceFormat, SourceRow};
use crate::landmark::{RawLandmark, RowError};

const COLUMN_COUNT: usize = 7;

pub struct DelimitedParser;

impl RowParser for DelimitedParser {
    fn open(&self, path: &Path) -> Result<Box<dyn RowSource>, ParseError> {
        let file = File::open(path).map_err(|e| ParseError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Box::new(DelimitedSource {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
        }))
    }

    fn supports(&self, format: SourceFormat) -> bool {
        matches!(format, SourceFormat::Csv)
    }
}

pub struct DelimitedSource {
    path: PathBuf,
    reader: BufReader<File>,
}

impl RowSource for DelimitedSource {
    fn read_rows(
        &mut self,
        visit: &mut dyn FnMut(SourceRow) -> RowControl,
    ) -> Result<(), ParseError> {
        let mut buf = Vec::new();
        let mut line_number = 0u64;
        let mut delimiter = None;
        let mut data_rows = 0i64;

        loop {
            buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| ParseError::Read {
                    path: self.path.clone(),
                    source: e,
                })?;
            if read == 0 {
                break;
            }
            line_number += 1;

            let mut line = match std::str::from_utf8(&buf) {
                Ok(text) => text.trim_end_matches(['\n', '\r']),
                Err(_) => {
                    data_rows += 1;
                    let raw = String::from_utf8_lossy(&buf);
                    let row = SourceRow {
                        row_number: line_number,
                        raw: raw.trim_end_matches(['\n', '\r']).to_string(),
                        fields: Err(RowError::InvalidUtf8),
                    };
                    if visit(row) == RowControl::Stop {
                        break;
                    }
                    continue;
                }
            };
            if line_number == 1 {
                line = line.trim_start_matches('\u{feff}');
            }
            if line.trim().is_empty() {
                continue;
            }

            let delim = match delimiter {
                Some(d) => d,
                None => {
                    let d = detect_delimiter(line);
                    delimiter = Some(d);
                    if looks_like_header(line) {
                        continue;
                    }
                    d
                }
            };

            data_rows += 1;
            let row = SourceRow {
                row_number: line_number,
                raw: line.to_string(),
                fields: parse_fields(line, delim, data_rows),
            };
            if visit(row) == RowControl::Stop {
                break;
            }
        }

        Ok(())
    }
}

fn detect_delimiter(line: &str) -> u8 {
    if line.contains('\t') {
        b'\t'
    } else {
        b','
    }
}

/// Heuristic: a header names both a location column and a latitude column.
fn looks_like_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("location") && lower.contains("lat")
}

/// Splits one line into trimmed fields, honoring double-quoted values.
fn split_fields(line: &str, delimiter: u8) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => record.iter().map(str::to_string).collect(),
        _ => line
            .split(delimiter as char)
            .map(|f| f.trim().to_string())
            .collect(),
    }
}

fn parse_fields(line: &str, delimiter: u8, sequence: i64) -> Result<RawLandmark, RowError> {
    let fields = split_fields(line, delimiter);
    if fields.len() < COLUMN_COUNT {
        return Err(RowError::ColumnCount {
            expected: COLUMN_COUNT,
            found: fields.len(),
        });
    }

    let mut fields = fields.into_iter();
    let mut next = || fields.next().unwrap_or_default();

    let location_code = next();
    let landmark_type = next();
    let name = next();
    let latitude = next();
    let longitude = next();
    let prewarning = next();
    let direction = next();

    Ok(RawLandmark {
        sequence_order: Some(sequence),
        location_code,
        landmark_type,
        name,
        latitude,
        longitude,
        prewarning_distance: parse_optional_integer(&prewarning, "prewarning distance")?,
        direction,
    })
}

fn parse_optional_integer(value: &str, field: &'static str) -> Result<Option<i64>, RowError> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| RowError::NotInteger {
            field,
            value: value.to_string(),
        })
}
