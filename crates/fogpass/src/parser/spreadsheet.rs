//! OOXML workbook (`.xlsx`, and `.xls` files saved in that format).
//!
//! Only the first worksheet is read. Its XML is streamed straight out of the
//! zip entry, one `<row>` at a time, so large sheets are never held in
//! memory. The shared-string table is loaded up front because cells refer
//! to it by index.
//!
//! Column layout: sequence, location, type, name, latitude, longitude,
//! prewarning distance, direction. The first row is the header.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use zip::result::ZipError;
use zip::ZipArchive;

use super::{ParseError, RowControl, RowParser, RowSource, SourceFormat, SourceRow};
use crate::landmark::{RawLandmark, RowError};

const COLUMN_COUNT: usize = 8;
const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const DEFAULT_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

pub struct SpreadsheetParser;

impl RowParser for SpreadsheetParser {
    fn open(&self, path: &Path) -> Result<Box<dyn RowSource>, ParseError> {
        let file = File::open(path).map_err(|e| ParseError::Open {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| workbook_error(path, e))?;

        let sheet_part = first_sheet_part(&mut archive, path)?;
        let shared_strings = read_shared_strings(&mut archive, path)?;

        Ok(Box::new(SpreadsheetSource {
            path: path.to_path_buf(),
            archive,
            sheet_part,
            shared_strings,
        }))
    }

    fn supports(&self, format: SourceFormat) -> bool {
        matches!(format, SourceFormat::Xls | SourceFormat::Xlsx)
    }
}

pub struct SpreadsheetSource {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    sheet_part: String,
    shared_strings: Vec<String>,
}

/// A cell value after shared strings and types have been resolved.
#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    Error(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Number(v) => write!(f, "{}", v),
            Self::Text(s) | Self::Error(s) => f.write_str(s),
            Self::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Number,
    SharedString,
    InlineString,
    FormulaString,
    Bool,
    Error,
}

impl CellKind {
    fn from_attr(value: &[u8]) -> Self {
        match value {
            b"s" => Self::SharedString,
            b"inlineStr" => Self::InlineString,
            b"str" | b"d" => Self::FormulaString,
            b"b" => Self::Bool,
            b"e" => Self::Error,
            _ => Self::Number,
        }
    }
}

struct PendingCell {
    column: usize,
    kind: CellKind,
    text: String,
}

struct PendingRow {
    number: u64,
    cells: Vec<CellValue>,
    next_column: usize,
    has_content: bool,
}

impl PendingRow {
    fn new(number: u64) -> Self {
        Self {
            number,
            cells: vec![CellValue::Empty; COLUMN_COUNT],
            next_column: 0,
            has_content: false,
        }
    }

    fn set(&mut self, column: usize, value: CellValue) {
        self.next_column = column.saturating_add(1);
        if value != CellValue::Empty {
            self.has_content = true;
        }
        if let Some(slot) = self.cells.get_mut(column) {
            *slot = value;
        }
    }

    fn into_source_row(self) -> SourceRow {
        let raw = self
            .cells
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        SourceRow {
            row_number: self.number,
            raw,
            fields: build_fields(&self.cells),
        }
    }
}

impl RowSource for SpreadsheetSource {
    fn read_rows(
        &mut self,
        visit: &mut dyn FnMut(SourceRow) -> RowControl,
    ) -> Result<(), ParseError> {
        let entry = self
            .archive
            .by_name(&self.sheet_part)
            .map_err(|e| workbook_error(&self.path, e))?;

        let mut reader = Reader::from_reader(BufReader::new(entry));
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut header_seen = false;
        let mut last_row_number = 0u64;
        let mut row: Option<PendingRow> = None;
        let mut cell: Option<PendingCell> = None;
        let mut in_value = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"row" => {
                        last_row_number = row_number(e).unwrap_or(last_row_number + 1);
                        row = Some(PendingRow::new(last_row_number));
                    }
                    b"c" => {
                        let next_column = row.as_ref().map_or(0, |r| r.next_column);
                        cell = Some(start_cell(e, next_column));
                    }
                    b"v" | b"t" if cell.is_some() => in_value = true,
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                    b"row" => {
                        // A row element without cells: header if first, blank otherwise.
                        last_row_number = row_number(e).unwrap_or(last_row_number + 1);
                        header_seen = true;
                    }
                    b"c" => {
                        if let Some(r) = row.as_mut() {
                            let pending = start_cell(e, r.next_column);
                            r.set(pending.column, CellValue::Empty);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Text(e)) => {
                    if in_value {
                        if let Some(c) = cell.as_mut() {
                            c.text.push_str(&e.decode().unwrap_or_default());
                        }
                    }
                }
                Ok(Event::GeneralRef(e)) => {
                    if in_value {
                        if let (Some(c), Some(ch)) = (cell.as_mut(), resolve_entity(&e)) {
                            c.text.push(ch);
                        }
                    }
                }
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"v" | b"t" => in_value = false,
                    b"c" => {
                        if let (Some(c), Some(r)) = (cell.take(), row.as_mut()) {
                            let value = resolve_cell(c.kind, &c.text, &self.shared_strings);
                            r.set(c.column, value);
                        }
                    }
                    b"row" => {
                        if let Some(r) = row.take() {
                            if !header_seen {
                                header_seen = true;
                            } else if r.has_content && visit(r.into_source_row()) == RowControl::Stop {
                                break;
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ParseError::Xml {
                        path: self.path.clone(),
                        reason: e.to_string(),
                    })
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }
}

fn workbook_error(path: &Path, e: ZipError) -> ParseError {
    ParseError::Workbook {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn attribute(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn row_number(e: &BytesStart<'_>) -> Option<u64> {
    attribute(e, b"r").and_then(|r| r.parse().ok())
}

fn start_cell(e: &BytesStart<'_>, next_column: usize) -> PendingCell {
    let column = attribute(e, b"r")
        .and_then(|r| column_index(&r))
        .unwrap_or(next_column);
    let kind = attribute(e, b"t")
        .map(|t| CellKind::from_attr(t.as_bytes()))
        .unwrap_or(CellKind::Number);
    PendingCell {
        column,
        kind,
        text: String::new(),
    }
}

/// Zero-based column of an A1-style reference (`"C12"` is 2). `None` when
/// the reference has no letters or names a column past `usize`.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(|b| b.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for b in letters {
        let digit = (b.to_ascii_uppercase() - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    Some(index - 1)
}

fn resolve_entity(e: &BytesRef<'_>) -> Option<char> {
    let name: &[u8] = e;
    match name {
        b"amp" => Some('&'),
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        [b'#', b'x', hex @ ..] | [b'#', b'X', hex @ ..] => std::str::from_utf8(hex)
            .ok()
            .and_then(|h| u32::from_str_radix(h, 16).ok())
            .and_then(char::from_u32),
        [b'#', dec @ ..] => std::str::from_utf8(dec)
            .ok()
            .and_then(|d| d.parse::<u32>().ok())
            .and_then(char::from_u32),
        _ => None,
    }
}

fn resolve_cell(kind: CellKind, text: &str, shared_strings: &[String]) -> CellValue {
    let text = text.trim();
    if text.is_empty() {
        return CellValue::Empty;
    }
    match kind {
        CellKind::SharedString => text
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i))
            .map(|s| {
                if s.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(s.clone())
                }
            })
            .unwrap_or_else(|| CellValue::Error("#REF!".to_string())),
        CellKind::InlineString | CellKind::FormulaString => CellValue::Text(text.to_string()),
        CellKind::Bool => CellValue::Bool(text == "1"),
        CellKind::Error => CellValue::Error(text.to_string()),
        CellKind::Number => text
            .parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or_else(|_| CellValue::Text(text.to_string())),
    }
}

fn cell_text(cell: &CellValue) -> String {
    cell.to_string().trim().to_string()
}

fn numeric(cell: &CellValue, field: &'static str) -> Result<Option<f64>, RowError> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Number(v) => Ok(Some(*v)),
        CellValue::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or(RowError::NotNumeric { field }),
        CellValue::Bool(_) | CellValue::Error(_) => Err(RowError::NotNumeric { field }),
    }
}

fn build_fields(cells: &[CellValue]) -> Result<RawLandmark, RowError> {
    let sequence_order = numeric(&cells[0], "sequence order")?.map(|v| v as i64);
    let prewarning_distance = numeric(&cells[6], "prewarning distance")?.map(|v| v as i64);

    Ok(RawLandmark {
        sequence_order,
        location_code: cell_text(&cells[1]),
        landmark_type: cell_text(&cells[2]),
        name: cell_text(&cells[3]),
        latitude: cell_text(&cells[4]),
        longitude: cell_text(&cells[5]),
        prewarning_distance,
        direction: cell_text(&cells[7]),
    })
}

/// Reads a small workbook part into memory. `None` if the part is absent.
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
    path: &Path,
) -> Result<Option<String>, ParseError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(workbook_error(path, e)),
    };
    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| ParseError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(Some(content))
}

fn xml_error(path: &Path, e: quick_xml::Error) -> ParseError {
    ParseError::Xml {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// Locates the first worksheet through the workbook relationships, falling
/// back to the conventional part name.
fn first_sheet_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
) -> Result<String, ParseError> {
    let workbook = read_part(archive, WORKBOOK_PART, path)?.ok_or_else(|| {
        ParseError::Workbook {
            path: path.to_path_buf(),
            reason: format!("missing {}", WORKBOOK_PART),
        }
    })?;

    let Some(relationship_id) = first_sheet_relationship(&workbook, path)? else {
        return Ok(DEFAULT_SHEET_PART.to_string());
    };
    let Some(rels) = read_part(archive, WORKBOOK_RELS_PART, path)? else {
        return Ok(DEFAULT_SHEET_PART.to_string());
    };

    let target = relationship_target(&rels, &relationship_id, path)?;
    Ok(target
        .map(|t| match t.strip_prefix('/') {
            Some(absolute) => absolute.to_string(),
            None => format!("xl/{}", t),
        })
        .unwrap_or_else(|| DEFAULT_SHEET_PART.to_string()))
}

fn first_sheet_relationship(workbook: &str, path: &Path) -> Result<Option<String>, ParseError> {
    let mut reader = Reader::from_str(workbook);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                return Ok(attribute(e, b"id"));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_error(path, e)),
            _ => {}
        }
    }
}

fn relationship_target(rels: &str, id: &str, path: &Path) -> Result<Option<String>, ParseError> {
    let mut reader = Reader::from_str(rels);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if attribute(e, b"Id").as_deref() == Some(id) {
                    return Ok(attribute(e, b"Target"));
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(xml_error(path, e)),
            _ => {}
        }
    }
}

fn read_shared_strings<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &Path,
) -> Result<Vec<String>, ParseError> {
    let Some(xml) = read_part(archive, SHARED_STRINGS_PART, path)? else {
        return Ok(Vec::new());
    };

    let mut reader = Reader::from_str(&xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => current.clear(),
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    current.push_str(&e.decode().unwrap_or_default());
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text {
                    if let Some(ch) = resolve_entity(&e) {
                        current.push(ch);
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(path, e)),
            _ => {}
        }
    }

    Ok(strings)
}
