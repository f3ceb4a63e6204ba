//! Spreadsheet splitting by column value.
//!
//! The first worksheet is read with calamine; its first row is the header
//! row. Every distinct value of the chosen column, in the order it is first
//! seen, becomes one `.xlsx` holding the header row plus the matching rows.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use docsplit_core::sanitize::is_illegal_path_char;
use docsplit_core::{EntrySink, ProgressEvent};

use crate::OfficeError;
use crate::package::{XML_DECLARATION, write_package, xml_text};

/// A spreadsheet cell value as carried into the output files.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// A date or date-time cell; written back with a date number format.
    Date(NaiveDateTime),
}

impl Cell {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) if dt.is_duration() => Cell::Number(dt.as_f64()),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(Cell::Date)
                .unwrap_or_else(|| Cell::Number(dt.as_f64())),
            Data::DateTimeIso(s) => Cell::Text(s.clone()),
            Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        }
    }

    /// Text used for grouping and for file names.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{:.0}", f),
            Cell::Number(f) => f.to_string(),
            Cell::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Cell::Date(dt) if dt.time() == NaiveTime::MIN => dt.format("%Y-%m-%d").to_string(),
            Cell::Date(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// The first worksheet of a workbook: a header row and data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Rows sharing one value of the split column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueGroup {
    pub value: String,
    /// Indices into [`Sheet::rows`], in sheet order.
    pub rows: Vec<usize>,
}

/// Read the first worksheet of an `.xlsx`/`.xls`/`.ods` workbook.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Sheet, OfficeError> {
    let unreadable = |reason: String| OfficeError::Unreadable {
        format: "spreadsheet",
        reason,
    };

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| unreadable(e.to_string()))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| unreadable("no sheets found in workbook".to_string()))?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| unreadable(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|c| Cell::from_data(c).display()).collect(),
        None => return Err(OfficeError::EmptySheet),
    };
    let rows: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(Cell::from_data).collect())
        .collect();

    tracing::info!(sheet = %first, rows = rows.len(), "workbook loaded");
    Ok(Sheet { headers, rows })
}

/// Group row indices by the value in `column`, in first-seen order.
///
/// Rows whose cell in that column is empty belong to no group.
pub fn group_rows_by_column(sheet: &Sheet, column: &str) -> Result<Vec<ValueGroup>, OfficeError> {
    let col = sheet
        .headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| OfficeError::ColumnNotFound {
            column: column.to_string(),
            available: sheet.headers.clone(),
        })?;

    let mut groups: Vec<ValueGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for (i, row) in sheet.rows.iter().enumerate() {
        let value = row.get(col).map(Cell::display).unwrap_or_default();
        if value.is_empty() {
            skipped += 1;
            continue;
        }
        match index.get(&value) {
            Some(&g) => groups[g].rows.push(i),
            None => {
                index.insert(value.clone(), groups.len());
                groups.push(ValueGroup {
                    value,
                    rows: vec![i],
                });
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(column, skipped, "rows with an empty split value were left out");
    }
    Ok(groups)
}

/// File stem for a column value: spaces become `_`, path-hostile characters are dropped.
pub fn value_file_stem(value: &str) -> String {
    let stem: String = value
        .chars()
        .filter(|&c| !is_illegal_path_char(c))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    if stem.is_empty() { "_".to_string() } else { stem }
}

/// Spreadsheet column letters for a zero-based index (`0` → `A`, `26` → `AA`).
fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Days since the 1900-system epoch, as Excel stores dates.
fn excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or_default()
        .and_time(NaiveTime::MIN);
    dt.signed_duration_since(epoch).num_milliseconds() as f64 / 86_400_000.0
}

// Style indices into the cellXfs of `STYLES`
const DATE_STYLE: u8 = 1;
const DATE_TIME_STYLE: u8 = 2;

fn write_cell(xml: &mut String, reference: &str, cell: &Cell) {
    let element = match cell {
        Cell::Empty => return,
        Cell::Text(s) => format!(
            r#"<c r="{reference}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            xml_text(s)
        ),
        Cell::Number(f) if f.is_finite() => format!(r#"<c r="{reference}"><v>{f}</v></c>"#),
        Cell::Number(f) => format!(r#"<c r="{reference}" t="inlineStr"><is><t>{f}</t></is></c>"#),
        Cell::Bool(b) => format!(r#"<c r="{reference}" t="b"><v>{}</v></c>"#, u8::from(*b)),
        Cell::Date(dt) => {
            let style = if dt.time() == NaiveTime::MIN {
                DATE_STYLE
            } else {
                DATE_TIME_STYLE
            };
            format!(r#"<c r="{reference}" s="{style}"><v>{}</v></c>"#, excel_serial(dt))
        }
    };
    xml.push_str(&element);
}

/// Minimal stylesheet: the default format, a date format (builtin 14), and a
/// date-time format (builtin 22).
const STYLES: &str = concat!(
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="3">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
    r#"<xf numFmtId="22" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/>"#,
    r#"</cellXfs></styleSheet>"#,
);

/// Write a single-sheet `.xlsx` with `headers` as row 1 followed by `rows`.
pub fn write_sheet(headers: &[String], rows: &[&Vec<Cell>]) -> Result<Vec<u8>, OfficeError> {
    let mut sheet = String::new();
    sheet.push_str(XML_DECLARATION);
    sheet.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    let header_cells: Vec<Cell> = headers.iter().map(|h| Cell::Text(h.clone())).collect();
    let all_rows = std::iter::once(&header_cells).chain(rows.iter().copied());
    for (r, row) in all_rows.enumerate() {
        let row_number = r + 1;
        sheet.push_str(&format!(r#"<row r="{row_number}">"#));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letters(c), row_number);
            write_cell(&mut sheet, &reference, cell);
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let content_types = format!(
        "{XML_DECLARATION}{}",
        concat!(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
            r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
            r#"</Types>"#,
        )
    );
    let root_rels = format!(
        "{XML_DECLARATION}{}",
        concat!(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
            r#"</Relationships>"#,
        )
    );
    let workbook = format!(
        "{XML_DECLARATION}{}",
        concat!(
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        )
    );
    let workbook_rels = format!(
        "{XML_DECLARATION}{}",
        concat!(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            r#"</Relationships>"#,
        )
    );

    write_package(&[
        ("[Content_Types].xml", content_types),
        ("_rels/.rels", root_rels),
        ("xl/workbook.xml", workbook),
        ("xl/_rels/workbook.xml.rels", workbook_rels),
        ("xl/worksheets/sheet1.xml", sheet),
        ("xl/styles.xml", format!("{XML_DECLARATION}{STYLES}")),
    ])
}

/// Split a workbook into one `.xlsx` per distinct value of `column`.
///
/// Returns the number of files written to `sink`.
pub fn split_workbook(
    bytes: &[u8],
    column: &str,
    sink: &mut dyn EntrySink,
    progress: impl Fn(ProgressEvent),
) -> Result<usize, OfficeError> {
    let sheet = read_first_sheet(bytes)?;
    let groups = group_rows_by_column(&sheet, column)?;
    if groups.is_empty() {
        return Err(OfficeError::NoValues(column.to_string()));
    }
    tracing::info!(column, values = groups.len(), "found unique values");

    let mut created = 0;
    for group in &groups {
        let rows: Vec<&Vec<Cell>> = group.rows.iter().map(|&i| &sheet.rows[i]).collect();
        let file_name = format!("{}.xlsx", value_file_stem(&group.value));
        let bytes = write_sheet(&sheet.headers, &rows)?;
        sink.add_entry(&file_name, bytes)?;
        created += 1;

        tracing::info!(file = %file_name, rows = rows.len(), "created spreadsheet");
        progress(ProgressEvent::DocumentWritten {
            file_name,
            detail: format!("{} rows", rows.len()),
        });
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn sample() -> Sheet {
        Sheet {
            headers: vec!["Client Name".into(), "Amount".into()],
            rows: vec![
                vec![text("Bob"), Cell::Number(10.0)],
                vec![text("Alice"), Cell::Number(2.5)],
                vec![text("Bob"), Cell::Number(7.0)],
                vec![Cell::Empty, Cell::Number(1.0)],
                vec![text("Carol"), Cell::Bool(true)],
            ],
        }
    }

    #[test]
    fn groups_in_first_seen_order() {
        let groups = group_rows_by_column(&sample(), "Client Name").unwrap();
        let values: Vec<&str> = groups.iter().map(|g| g.value.as_str()).collect();
        assert_eq!(values, vec!["Bob", "Alice", "Carol"]);
        assert_eq!(groups[0].rows, vec![0, 2]);
        assert_eq!(groups[1].rows, vec![1]);
    }

    #[test]
    fn numeric_values_group_by_display() {
        let groups = group_rows_by_column(&sample(), "Amount").unwrap();
        let values: Vec<&str> = groups.iter().map(|g| g.value.as_str()).collect();
        assert_eq!(values, vec!["10", "2.5", "7", "1", "TRUE"]);
    }

    #[test]
    fn missing_column_lists_available() {
        let err = group_rows_by_column(&sample(), "Client").unwrap_err();
        match &err {
            OfficeError::ColumnNotFound { column, available } => {
                assert_eq!(column, "Client");
                assert_eq!(available, &vec!["Client Name".to_string(), "Amount".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("Client Name, Amount"));
        assert!(err.is_no_match());
    }

    #[test]
    fn value_stems() {
        assert_eq!(value_file_stem("Acme Corp"), "Acme_Corp");
        assert_eq!(value_file_stem("A/B: \"C\""), "AB_C");
        assert_eq!(value_file_stem("???"), "_");
    }

    #[test]
    fn column_letters_cover_multi_letter() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn cell_display() {
        assert_eq!(Cell::Number(100.0).display(), "100");
        assert_eq!(Cell::Number(-3.25).display(), "-3.25");
        assert_eq!(Cell::Bool(false).display(), "FALSE");
        assert_eq!(Cell::Empty.display(), "");
    }

    #[test]
    fn written_sheet_reads_back() {
        let sheet = sample();
        let rows: Vec<&Vec<Cell>> = vec![&sheet.rows[0], &sheet.rows[4]];
        let bytes = write_sheet(&sheet.headers, &rows).unwrap();

        let back = read_first_sheet(&bytes).unwrap();
        assert_eq!(back.headers, sheet.headers);
        assert_eq!(back.rows.len(), 2);
        assert_eq!(back.rows[0][0], text("Bob"));
        assert_eq!(back.rows[0][1].display(), "10");
        assert_eq!(back.rows[1][1], Cell::Bool(true));
    }

    fn date(y: i32, m: u32, d: u32) -> Cell {
        Cell::Date(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        )
    }

    #[test]
    fn date_display_is_iso() {
        assert_eq!(date(2024, 3, 15).display(), "2024-03-15");
        let with_time = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(Cell::Date(with_time).display(), "2024-03-15 09:30:00");
        assert_eq!(value_file_stem(&Cell::Date(with_time).display()), "2024-03-15_093000");
    }

    #[test]
    fn excel_serial_matches_1900_system() {
        let Cell::Date(dt) = date(2023, 3, 15) else {
            unreachable!()
        };
        assert_eq!(excel_serial(&dt), 45000.0);
    }

    #[test]
    fn split_by_date_column_keeps_dates() {
        let headers = vec!["Statement Date".to_string(), "Client".to_string()];
        let rows = vec![
            vec![date(2024, 3, 15), text("Ann")],
            vec![date(2024, 4, 1), text("Ben")],
            vec![date(2024, 3, 15), text("Cat")],
        ];
        let refs: Vec<&Vec<Cell>> = rows.iter().collect();
        let bytes = write_sheet(&headers, &refs).unwrap();

        let mut sink: Vec<(String, Vec<u8>)> = Vec::new();
        let created = split_workbook(&bytes, "Statement Date", &mut sink, |_| {}).unwrap();
        assert_eq!(created, 2);
        assert_eq!(sink[0].0, "2024-03-15.xlsx");
        assert_eq!(sink[1].0, "2024-04-01.xlsx");

        let march = read_first_sheet(&sink[0].1).unwrap();
        assert_eq!(march.rows.len(), 2);
        assert_eq!(march.rows[0][0], date(2024, 3, 15));
        assert_eq!(march.rows[1][1], text("Cat"));
    }

    #[test]
    fn unreadable_bytes() {
        let err = read_first_sheet(b"definitely not a workbook").unwrap_err();
        assert!(matches!(err, OfficeError::Unreadable { .. }));
        assert!(!err.is_no_match());
    }
}
