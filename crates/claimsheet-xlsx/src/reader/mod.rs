//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::{read_styles_xml, ParsedStyles};
use claimsheet_core::date::serial_to_datetime;
use claimsheet_core::{
    CellAddress, CellData, CellRange, CellValue, SheetState, Style, Workbook, Worksheet,
};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// `_x000D_` is a carriage return, `_x005F_` an escaped underscore.
fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate.get(6..7) == Some("_"))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                result.push('_');
                rest = &candidate[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// A `<sheet>` entry from workbook.xml
struct SheetEntry {
    name: String,
    r_id: String,
    state: SheetState,
}

/// Cell being assembled from `<c>` and its children
#[derive(Default)]
struct PendingCell {
    reference: String,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    formula: Option<String>,
}

/// Which text-bearing child of `<c>` we are inside
#[derive(Clone, Copy, PartialEq)]
enum TextTarget {
    None,
    Value,
    Formula,
    InlineString,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let parsed_styles = Self::read_styles(&mut archive)?;
        let sheets = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();

        for entry in &sheets {
            let Some(path) = sheet_paths.get(&entry.r_id) else {
                log::warn!("sheet '{}' has no worksheet part, skipping", entry.name);
                continue;
            };
            let mut worksheet = Worksheet::new(entry.name.as_str());
            worksheet.set_state(entry.state);
            Self::read_worksheet(
                &mut archive,
                path,
                &mut worksheet,
                &shared_strings,
                &parsed_styles.cell_styles,
            )?;
            workbook.add_existing_worksheet(worksheet)?;
        }

        log::debug!("read {} worksheet(s)", workbook.sheet_count());
        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        // Phonetic runs carry a reading aid, not cell text
        let mut in_rph = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_rph = true,
                    b"t" if in_si && !in_rph => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current));
                        in_si = false;
                    }
                    b"rPh" => in_rph = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    if let Ok(text) = e.unescape() {
                        current.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    fn read_styles<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<ParsedStyles> {
        match archive.by_name("xl/styles.xml") {
            Ok(file) => read_styles_xml(file),
            Err(_) => Ok(ParsedStyles::default()),
        }
    }

    /// Read workbook.xml to get sheet names, rIds and visibility
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<SheetEntry>> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    let mut name = None;
                    let mut r_id = None;
                    let mut state = SheetState::Visible;

                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().ok().map(|s| s.to_string());
                        match attr.key.as_ref() {
                            b"name" => name = value,
                            b"r:id" => r_id = value,
                            b"state" => {
                                state = value.as_deref().map(SheetState::parse).unwrap_or_default()
                            }
                            _ => {}
                        }
                    }

                    if let (Some(name), Some(r_id)) = (name, r_id) {
                        sheets.push(SheetEntry { name, r_id, state });
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(sheets)
    }

    /// Read workbook.xml.rels to get sheet file paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = None;

                    for attr in e.attributes().flatten() {
                        let value = attr.unescape_value().ok().map(|s| s.to_string());
                        match attr.key.as_ref() {
                            b"Id" => id = value,
                            b"Target" => target = value,
                            b"Type" => rel_type = value,
                            _ => {}
                        }
                    }

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Relative targets are resolved against xl/
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet part: rows, cells and merged regions
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        cell_styles: &[Style],
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut cell: Option<PendingCell> = None;
        let mut target = TextTarget::None;
        // Local pool index for each cellXfs entry, interned on first use
        let mut style_map: HashMap<u32, u32> = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"row" => Self::apply_row_attrs(worksheet, &e)?,
                    b"c" => cell = Some(Self::start_cell(&e)),
                    b"v" if cell.is_some() => target = TextTarget::Value,
                    b"f" if cell.is_some() => target = TextTarget::Formula,
                    b"t" if cell.is_some() => target = TextTarget::InlineString,
                    _ => {}
                },

                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"row" => Self::apply_row_attrs(worksheet, &e)?,
                    b"c" => {
                        let pending = Self::start_cell(&e);
                        Self::process_cell(
                            worksheet,
                            pending,
                            shared_strings,
                            cell_styles,
                            &mut style_map,
                        )?;
                    }
                    b"mergeCell" => {
                        if let Some(reference) = e
                            .attributes()
                            .flatten()
                            .find(|a| a.key.as_ref() == b"ref")
                            .and_then(|a| a.unescape_value().ok())
                        {
                            let range = CellRange::parse(&reference).map_err(|err| {
                                XlsxError::Parse(format!("Invalid merge range '{}': {}", reference, err))
                            })?;
                            if let Err(err) = worksheet.merge_cells(&range) {
                                log::warn!("ignoring merged region {}: {}", reference, err);
                            }
                        }
                    }
                    _ => {}
                },

                Ok(Event::Text(e)) if target != TextTarget::None => {
                    if let (Some(pending), Ok(text)) = (cell.as_mut(), e.unescape()) {
                        let slot = match target {
                            TextTarget::Formula => &mut pending.formula,
                            _ => &mut pending.value,
                        };
                        slot.get_or_insert_with(String::new).push_str(&text);
                    }
                }

                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"v" | b"f" | b"t" => target = TextTarget::None,
                    b"c" => {
                        if let Some(pending) = cell.take() {
                            Self::process_cell(
                                worksheet,
                                pending,
                                shared_strings,
                                cell_styles,
                                &mut style_map,
                            )?;
                        }
                    }
                    _ => {}
                },

                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }

    fn apply_row_attrs(worksheet: &mut Worksheet, e: &BytesStart<'_>) -> XlsxResult<()> {
        let mut row = None;
        let mut hidden = false;

        for attr in e.attributes().flatten() {
            match attr.key.as_ref() {
                b"r" => row = attr.unescape_value().ok().and_then(|s| s.parse::<u32>().ok()),
                b"hidden" => {
                    hidden = matches!(attr.unescape_value().ok().as_deref(), Some("1" | "true"))
                }
                _ => {}
            }
        }

        if let (Some(row), true) = (row, hidden) {
            worksheet.set_row_hidden(row, true);
        }
        Ok(())
    }

    fn start_cell(e: &BytesStart<'_>) -> PendingCell {
        let mut pending = PendingCell::default();
        for attr in e.attributes().flatten() {
            let value = attr.unescape_value().ok().map(|s| s.to_string());
            match attr.key.as_ref() {
                b"r" => pending.reference = value.unwrap_or_default(),
                b"t" => pending.cell_type = value,
                b"s" => pending.style = value.and_then(|s| s.parse().ok()).unwrap_or(0),
                _ => {}
            }
        }
        pending
    }

    fn process_cell(
        worksheet: &mut Worksheet,
        cell: PendingCell,
        shared_strings: &[String],
        styles: &[Style],
        style_map: &mut HashMap<u32, u32>,
    ) -> XlsxResult<()> {
        let addr = CellAddress::parse(&cell.reference).map_err(|e| {
            XlsxError::Parse(format!("Invalid cell reference '{}': {}", cell.reference, e))
        })?;

        let style = styles.get(cell.style as usize);
        if style.is_none() && cell.style != 0 {
            log::warn!(
                "cell {} refers to missing style {}",
                cell.reference,
                cell.style
            );
        }
        let is_date_style = style.is_some_and(|s| s.number_format.is_date_format());

        let value = match (cell.formula.as_deref(), cell.value.as_deref()) {
            // Shared-formula followers carry no text; keep their cached value
            (Some(f), _) if !f.trim().is_empty() => CellValue::formula(f),
            (_, Some(raw)) => {
                Self::parse_value(raw, cell.cell_type.as_deref(), shared_strings, is_date_style)?
            }
            _ => CellValue::Empty,
        };

        let style_index = match style {
            Some(style) if cell.style != 0 && *style != Style::default() => *style_map
                .entry(cell.style)
                .or_insert_with(|| worksheet.intern_style(style.clone())),
            _ => 0,
        };

        worksheet.insert_cell(addr.row, addr.col, CellData::with_style(value, style_index))?;
        Ok(())
    }

    fn parse_value(
        raw: &str,
        cell_type: Option<&str>,
        shared_strings: &[String],
        is_date_style: bool,
    ) -> XlsxResult<CellValue> {
        Ok(match cell_type {
            Some("s") => {
                let idx: usize = raw.trim().parse().map_err(|_| {
                    XlsxError::Parse(format!("Invalid shared string index: {}", raw))
                })?;
                let s = shared_strings.get(idx).ok_or_else(|| {
                    XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                })?;
                CellValue::text(s)
            }

            Some("b") => CellValue::Boolean(raw == "1" || raw.eq_ignore_ascii_case("true")),

            Some("inlineStr") | Some("str") => CellValue::text(decode_excel_escapes(raw)),

            // ISO 8601 date cells
            Some("d") => chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .map(CellValue::Date)
                .unwrap_or_else(|_| CellValue::text(raw)),

            None | Some("n") => match raw.trim().parse::<f64>() {
                Ok(n) if is_date_style => serial_to_datetime(n)
                    .map(CellValue::Date)
                    .unwrap_or(CellValue::Number(n)),
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::text(raw),
            },

            // Error values and unknown types are kept as their text
            Some(_) => CellValue::text(raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Cursor, Write};

    #[test]
    fn test_decode_excel_escapes() {
        assert_eq!(decode_excel_escapes("a_x000D_b"), "a\rb");
        assert_eq!(decode_excel_escapes("x_x005F_y"), "x_y");
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("plain"), "plain");
        assert_eq!(decode_excel_escapes("_x0009__x000a_"), "\t\n");
    }

    fn package(sheet_xml: &str, workbook_xml: &str) -> Cursor<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();

        let parts = [
            ("[Content_Types].xml", "<Types/>".to_string()),
            ("xl/workbook.xml", workbook_xml.to_string()),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<Relationships>
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#
                    .to_string(),
            ),
            (
                "xl/sharedStrings.xml",
                r#"<sst><si><t>발생금액</t></si><si><r><t>Sale </t></r><r><t>Date</t></r></si></sst>"#
                    .to_string(),
            ),
            (
                "xl/styles.xml",
                r#"<styleSheet><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="14"/></cellXfs></styleSheet>"#
                    .to_string(),
            ),
            ("xl/worksheets/sheet1.xml", sheet_xml.to_string()),
        ];

        for (name, body) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        let mut cursor = zip.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    #[test]
    fn test_read_cells_merges_and_rows() {
        let sheet = r#"<worksheet><sheetData>
<row r="3"><c r="A3" t="s"><v>0</v></c><c r="B3" t="s"><v>1</v></c></row>
<row r="4" hidden="1"><c r="A4"><v>1,5</v></c><c r="B4" s="1"><v>45658</v></c><c r="C4"><f>SUM(A4:A5)</f><v>3</v></c></row>
<row r="5"><c r="A5" t="inlineStr"><is><t>SUV</t></is></c><c r="B5" t="b"><v>1</v></c></row>
</sheetData><mergeCells count="1"><mergeCell ref="A5:A6"/></mergeCells></worksheet>"#;
        let workbook_xml =
            r#"<workbook><sheets><sheet name="Claims" sheetId="1" state="hidden" r:id="rId1"/></sheets></workbook>"#;

        let workbook = XlsxReader::read(package(sheet, workbook_xml)).unwrap();
        let ws = workbook.worksheet(0).unwrap();

        assert_eq!(ws.name(), "Claims");
        assert_eq!(ws.state(), SheetState::Hidden);
        assert_eq!(ws.value_at(3, 1).as_text(), Some("발생금액"));
        assert_eq!(ws.value_at(3, 2).as_text(), Some("Sale Date"));
        assert_eq!(ws.value_at(4, 1).as_text(), Some("1,5"));
        assert_eq!(
            ws.value_at(4, 2),
            &CellValue::Date(
                chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(ws.value_at(4, 3), &CellValue::Formula("=SUM(A4:A5)".into()));
        assert_eq!(ws.value_at(5, 1).as_text(), Some("SUV"));
        assert_eq!(ws.value_at(5, 2), &CellValue::Boolean(true));
        assert!(ws.is_row_hidden(4));
        assert!(!ws.is_row_hidden(5));
        assert_eq!(ws.merged_regions(), &[CellRange::parse("A5:A6").unwrap()]);
    }

    #[test]
    fn test_missing_content_types() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("xl/workbook.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let mut cursor = zip.finish().unwrap();
        cursor.set_position(0);

        assert!(matches!(
            XlsxReader::read(cursor),
            Err(XlsxError::InvalidFormat(_))
        ));
    }
}
