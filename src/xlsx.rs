//! XLSX Workbook Writer Module
//! Writes DataFrames as worksheets of a single .xlsx workbook.
//!
//! Uses direct ZIP/XML generation (SpreadsheetML with inline strings), one
//! sheet per table, header row in bold.

use crate::error::{CohortError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;
// `::zip` because the polars prelude also exports a `zip` module.
use ::zip::{write::FileOptions, ZipWriter};

/// Excel's sheet-name length limit.
const MAX_SHEET_NAME_LEN: usize = 31;
/// Characters Excel rejects in sheet names.
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];
/// Style index of the bold header cells in styles.xml.
const HEADER_STYLE: usize = 1;

/// A single worksheet cell.
#[derive(Debug, Clone, PartialEq)]
enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

/// Workbook generator for report tables
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write every `(sheet name, table)` pair into one workbook at `output_path`,
    /// replacing any existing file.
    pub fn write_sheets(sheets: &[(String, &DataFrame)], output_path: &Path) -> Result<()> {
        if sheets.is_empty() {
            return Err(CohortError::invalid("a workbook needs at least one sheet"));
        }
        for (name, _) in sheets {
            Self::validate_sheet_name(name)?;
        }

        let names: Vec<&str> = sheets.iter().map(|(name, _)| name.as_str()).collect();

        // Build every worksheet before touching the output file, so a failure
        // leaves any previous workbook intact.
        let sheet_parts: Vec<String> = sheets
            .iter()
            .map(|(_, df)| Self::sheet_xml(df))
            .collect::<Result<_>>()?;

        let file = File::create(output_path)?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default();

        // 1. [Content_Types].xml
        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(Self::content_types_xml(sheets.len()).as_bytes())?;

        // 2. _rels/.rels
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(Self::rels_xml().as_bytes())?;

        // 3. xl/workbook.xml and its relationships
        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(Self::workbook_xml(&names).as_bytes())?;
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(Self::workbook_rels_xml(sheets.len()).as_bytes())?;

        // 4. Styles
        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(Self::styles_xml().as_bytes())?;

        // 5. Worksheets
        for (idx, xml) in sheet_parts.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", idx + 1), options)?;
            zip.write_all(xml.as_bytes())?;
        }

        // 6. docProps
        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(Self::core_props_xml().as_bytes())?;
        zip.start_file("docProps/app.xml", options)?;
        zip.write_all(Self::app_props_xml(&names).as_bytes())?;

        zip.finish()?;

        info!(
            "Workbook written: {} ({} sheets)",
            output_path.display(),
            sheets.len()
        );
        Ok(())
    }

    fn validate_sheet_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(CohortError::invalid("sheet name must not be empty"));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(CohortError::invalid(format!(
                "sheet name '{}' is longer than {} characters",
                name, MAX_SHEET_NAME_LEN
            )));
        }
        if name.contains(&FORBIDDEN_SHEET_CHARS[..]) {
            return Err(CohortError::invalid(format!(
                "sheet name '{}' contains a forbidden character",
                name
            )));
        }
        Ok(())
    }

    fn content_types_xml(sheet_count: usize) -> String {
        let mut xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
"#
        .to_string();

        for i in 1..=sheet_count {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i
            ));
            xml.push('\n');
        }
        xml.push_str("</Types>");
        xml
    }

    fn rels_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#
    }

    fn workbook_xml(names: &[&str]) -> String {
        let mut sheets = String::new();
        for (idx, name) in names.iter().enumerate() {
            sheets.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                Self::escape_xml(name),
                idx + 1,
                idx + 1
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets>{}</sheets>
</workbook>"#,
            sheets
        )
    }

    fn workbook_rels_xml(sheet_count: usize) -> String {
        let mut xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#
        .to_string();

        for i in 1..=sheet_count {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
                i, i
            ));
            xml.push('\n');
        }
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            sheet_count + 1
        ));
        xml.push_str("\n</Relationships>");
        xml
    }

    fn styles_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="2"><border><left/><right/><top/><bottom/><diagonal/></border><border><left style="thin"/><right style="thin"/><top style="thin"/><bottom style="thin"/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="1" xfId="0" applyFont="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center"/></xf></cellXfs>
<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#
    }

    /// Worksheet XML: header row from the column names, then one row per record.
    fn sheet_xml(df: &DataFrame) -> Result<String> {
        let mut rows = String::new();

        rows.push_str(r#"<row r="1">"#);
        for (col_idx, name) in df.get_column_names().iter().enumerate() {
            let cell = CellValue::Text(name.to_string());
            rows.push_str(&Self::cell_xml(col_idx, 1, &cell, Some(HEADER_STYLE)));
        }
        rows.push_str("</row>");

        for row_idx in 0..df.height() {
            let excel_row = row_idx + 2;
            rows.push_str(&format!(r#"<row r="{}">"#, excel_row));
            for (col_idx, column) in df.get_columns().iter().enumerate() {
                if let Some(cell) = Self::cell_value(&column.get(row_idx)?) {
                    rows.push_str(&Self::cell_xml(col_idx, excel_row, &cell, None));
                }
            }
            rows.push_str("</row>");
        }

        Ok(format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>{}</sheetData>
</worksheet>"#,
            rows
        ))
    }

    /// Map a DataFrame value to a cell; `None` leaves the cell empty.
    fn cell_value(value: &AnyValue) -> Option<CellValue> {
        match value {
            AnyValue::Null => None,
            AnyValue::Boolean(b) => Some(CellValue::Bool(*b)),
            AnyValue::String(s) => Some(CellValue::Text(s.to_string())),
            AnyValue::StringOwned(s) => Some(CellValue::Text(s.to_string())),
            other => match other.extract::<f64>() {
                Some(v) if v.is_finite() => Some(CellValue::Number(v)),
                Some(_) => None,
                None => Some(CellValue::Text(other.to_string())),
            },
        }
    }

    fn cell_xml(col_idx: usize, row: usize, cell: &CellValue, style: Option<usize>) -> String {
        let reference = format!("{}{}", Self::column_letter(col_idx), row);
        let style = style.map(|s| format!(r#" s="{}""#, s)).unwrap_or_default();

        match cell {
            CellValue::Number(v) => format!(r#"<c r="{}"{}><v>{}</v></c>"#, reference, style, v),
            CellValue::Bool(b) => format!(
                r#"<c r="{}"{} t="b"><v>{}</v></c>"#,
                reference,
                style,
                u8::from(*b)
            ),
            CellValue::Text(s) => format!(
                r#"<c r="{}"{} t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                reference,
                style,
                Self::escape_xml(s)
            ),
        }
    }

    /// Zero-based column index to Excel letters: 0 → A, 25 → Z, 26 → AA.
    fn column_letter(mut idx: usize) -> String {
        let mut letters = Vec::new();
        loop {
            letters.push((b'A' + (idx % 26) as u8) as char);
            if idx < 26 {
                break;
            }
            idx = idx / 26 - 1;
        }
        letters.iter().rev().collect()
    }

    fn escape_xml(s: &str) -> String {
        let mut escaped = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                // Control characters are not allowed in XML 1.0
                c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
                c => escaped.push(c),
            }
        }
        escaped
    }

    fn core_props_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:title>Rekap Wisuda</dc:title>
<dc:creator>Cohort Report</dc:creator>
<cp:lastModifiedBy>Cohort Report</cp:lastModifiedBy>
<cp:revision>1</cp:revision>
</cp:coreProperties>"#
    }

    fn app_props_xml(names: &[&str]) -> String {
        let titles: String = names
            .iter()
            .map(|name| format!("<vt:lpstr>{}</vt:lpstr>", Self::escape_xml(name)))
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
<Application>Cohort Report</Application>
<HeadingPairs><vt:vector size="2" baseType="variant"><vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant><vt:variant><vt:i4>{}</vt:i4></vt:variant></vt:vector></HeadingPairs>
<TitlesOfParts><vt:vector size="{}" baseType="lpstr">{}</vt:vector></TitlesOfParts>
<AppVersion>16.0000</AppVersion>
</Properties>"#,
            names.len(),
            names.len(),
            titles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook, Data, Reader, Xlsx};

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            Column::new("Program Studi".into(), vec!["Informatika", "R&D <Lab>"]),
            Column::new("IPK".into(), vec![Some(3.625), None]),
            Column::new("Lulus".into(), vec![true, false]),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(XlsxWriter::column_letter(0), "A");
        assert_eq!(XlsxWriter::column_letter(25), "Z");
        assert_eq!(XlsxWriter::column_letter(26), "AA");
        assert_eq!(XlsxWriter::column_letter(27), "AB");
        assert_eq!(XlsxWriter::column_letter(701), "ZZ");
        assert_eq!(XlsxWriter::column_letter(702), "AAA");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            XlsxWriter::escape_xml(r#"R&D <"Lab">"#),
            "R&amp;D &lt;&quot;Lab&quot;&gt;"
        );
        assert_eq!(XlsxWriter::escape_xml("a\u{1}b"), "ab");
    }

    #[test]
    fn test_sheet_name_rules() {
        assert!(XlsxWriter::validate_sheet_name("Top 5 IPK Tertinggi").is_ok());
        assert!(XlsxWriter::validate_sheet_name("").is_err());
        assert!(XlsxWriter::validate_sheet_name("a/b").is_err());
        assert!(XlsxWriter::validate_sheet_name(&"x".repeat(32)).is_err());
    }

    #[test]
    fn test_workbook_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rekap.xlsx");
        let df = sample();

        XlsxWriter::write_sheets(
            &[("Satu".to_string(), &df), ("Dua".to_string(), &df)],
            &path,
        )
        .unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Satu", "Dua"]);

        let range = workbook.worksheet_range("Dua").unwrap();
        assert_eq!(range.get_size(), (3, 3));
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("Program Studi".to_string()))
        );
        assert_eq!(
            range.get_value((2, 0)),
            Some(&Data::String("R&D <Lab>".to_string()))
        );
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(3.625)));
        assert_eq!(range.get_value((2, 1)), Some(&Data::Empty));
        assert_eq!(range.get_value((1, 2)), Some(&Data::Bool(true)));
    }

    #[test]
    fn test_existing_file_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rekap.xlsx");
        std::fs::write(&path, b"stale").unwrap();

        XlsxWriter::write_sheets(&[("Satu".to_string(), &sample())], &path).unwrap();

        let workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Satu"]);
    }

    #[test]
    fn test_invalid_sheet_leaves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rekap.xlsx");
        std::fs::write(&path, b"previous").unwrap();
        let df = sample();

        let result = XlsxWriter::write_sheets(
            &[("Satu".to_string(), &df), ("a/b".to_string(), &df)],
            &path,
        );

        assert!(matches!(result, Err(CohortError::InvalidValue(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"previous");
    }
}
