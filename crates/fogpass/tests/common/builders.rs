//! Builders for landmark file fixtures.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

pub const CSV_HEADER: &str = "Location,Type,Name,Lat,Lon,Warn,Dir";

/// Builder for delimited landmark files.
pub struct CsvBuilder {
    header: Option<String>,
    rows: Vec<String>,
}

impl CsvBuilder {
    pub fn new() -> Self {
        Self {
            header: Some(CSV_HEADER.to_string()),
            rows: Vec::new(),
        }
    }

    pub fn without_header(mut self) -> Self {
        self.header = None;
        self
    }

    pub fn row(mut self, line: &str) -> Self {
        self.rows.push(line.to_string());
        self
    }

    /// Appends `count` valid rows with distinct location codes.
    pub fn valid_rows(mut self, count: usize) -> Self {
        let start = self.rows.len();
        for i in start..start + count {
            self.rows.push(format!(
                "LM{:05},SIGNAL,Signal {},{:.4},{:.4},300,UP",
                i,
                i,
                25.0 + (i % 100) as f64 * 0.001,
                81.0 + (i % 100) as f64 * 0.001
            ));
        }
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::new();
        if let Some(header) = &self.header {
            out.push_str(header);
            out.push('\n');
        }
        for row in &self.rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.build().into_bytes()
    }
}

/// Builder for single-sheet OOXML workbooks using inline strings.
pub struct WorkbookBuilder {
    rows: Vec<Vec<Cell>>,
}

pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
    /// Inline text under an explicit column reference such as `"AB"`.
    TextAt(String, String),
}

impl WorkbookBuilder {
    pub fn new() -> Self {
        let header = [
            "Seq", "Location", "Type", "Name", "Lat", "Lon", "Warn", "Dir",
        ]
        .iter()
        .map(|h| Cell::Text(h.to_string()))
        .collect();
        Self { rows: vec![header] }
    }

    pub fn row(mut self, cells: Vec<Cell>) -> Self {
        self.rows.push(cells);
        self
    }

    /// A complete landmark row.
    pub fn landmark(self, seq: i64, code: &str, lat: f64, lon: f64) -> Self {
        self.row(vec![
            Cell::Number(seq as f64),
            Cell::Text(code.to_string()),
            Cell::Text("STATION".to_string()),
            Cell::Text(format!("{} Jn", code)),
            Cell::Number(lat),
            Cell::Number(lon),
            Cell::Number(500.0),
            Cell::Text("UP".to_string()),
        ])
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        )
        .unwrap();

        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
        )
        .unwrap();

        zip.start_file("xl/worksheets/sheet1.xml", options).unwrap();
        zip.write_all(self.sheet_xml().as_bytes()).unwrap();

        zip.finish().unwrap().into_inner()
    }

    fn sheet_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0"?><worksheet><sheetData>"#);
        for (r, cells) in self.rows.iter().enumerate() {
            let row_number = r + 1;
            xml.push_str(&format!(r#"<row r="{}">"#, row_number));
            for (c, cell) in cells.iter().enumerate() {
                let reference = format!("{}{}", (b'A' + c as u8) as char, row_number);
                match cell {
                    Cell::Number(v) => {
                        xml.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, v))
                    }
                    Cell::Text(t) => xml.push_str(&format!(
                        r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        reference, t
                    )),
                    Cell::TextAt(column, t) => xml.push_str(&format!(
                        r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        column, row_number, t
                    )),
                    Cell::Empty => {}
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

/// The first bytes of a legacy BIFF (OLE compound document) workbook.
pub fn legacy_xls_bytes() -> Vec<u8> {
    let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    bytes.extend(std::iter::repeat(0u8).take(504));
    bytes
}
