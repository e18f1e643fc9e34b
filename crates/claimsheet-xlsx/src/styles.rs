//! XLSX styles (styles.xml) read/write helpers
//!
//! Only fills and number formats are modelled. Every other component is
//! written as the single default font/border so that Excel accepts the file.

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use claimsheet_core::{
    CellData, CellValue, Color, FillStyle, NumberFormat, Style, Workbook, Worksheet,
};

// === Writing ===

#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    /// Global, deduplicated styles. Index corresponds to the cellXfs index.
    styles: Vec<Style>,
    /// Per-worksheet mapping: (local pool index, needs date format) -> xf id.
    sheet_maps: Vec<HashMap<(u32, bool), u32>>,
}

/// Date cells are stored as serials, so they need a date number format
fn needs_date_format(cell: &CellData, style: &Style) -> bool {
    matches!(cell.value, CellValue::Date(_)) && !style.number_format.is_date_format()
}

impl XlsxStyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut styles: Vec<Style> = vec![Style::default()];
        let mut style_to_xf: HashMap<Style, u32> = HashMap::new();
        style_to_xf.insert(Style::default(), 0);

        let mut sheet_maps = Vec::with_capacity(workbook.sheet_count());

        for sheet in workbook.worksheets() {
            let mut map: HashMap<(u32, bool), u32> = HashMap::new();
            map.insert((0, false), 0);

            for (_row, _col, cell) in sheet.iter_cells() {
                let mut style = sheet.styles().get(cell.style_index).cloned().unwrap_or_default();
                let key = (cell.style_index, needs_date_format(cell, &style));
                if map.contains_key(&key) {
                    continue;
                }
                if key.1 {
                    style.number_format = NumberFormat::iso_date();
                }
                let xf_id = *style_to_xf.entry(style.clone()).or_insert_with(|| {
                    styles.push(style);
                    (styles.len() - 1) as u32
                });
                map.insert(key, xf_id);
            }

            sheet_maps.push(map);
        }

        Self { styles, sheet_maps }
    }

    /// The cellXfs index to write for a stored cell
    pub(crate) fn xf_id_for(&self, sheet: &Worksheet, sheet_index: usize, cell: &CellData) -> u32 {
        let style = sheet.styles().get(cell.style_index).cloned().unwrap_or_default();
        let date = needs_date_format(cell, &style);
        self.sheet_maps
            .get(sheet_index)
            .and_then(|m| m.get(&(cell.style_index, date)).copied())
            .unwrap_or(0)
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        // Excel requires the first two fills to be none and gray125
        let mut fill_ids: HashMap<FillStyle, u32> = HashMap::new();
        let mut fills: Vec<FillStyle> = Vec::new();

        let mut numfmt_ids: HashMap<&str, u32> = HashMap::new();
        let mut numfmts: Vec<(u32, &str)> = Vec::new();
        let mut next_numfmt_id: u32 = 164;

        let mut resolved: Vec<(u32, u32)> = Vec::with_capacity(self.styles.len());

        for style in &self.styles {
            let fill_id = match style.fill {
                FillStyle::None => 0,
                fill => *fill_ids.entry(fill).or_insert_with(|| {
                    fills.push(fill);
                    fills.len() as u32 + 1
                }),
            };

            let num_fmt_id = match &style.number_format {
                NumberFormat::General => 0,
                NumberFormat::BuiltIn(id) => *id,
                NumberFormat::Custom(code) => *numfmt_ids.entry(code.as_str()).or_insert_with(|| {
                    let id = next_numfmt_id;
                    next_numfmt_id += 1;
                    numfmts.push((id, code.as_str()));
                    id
                }),
            };

            resolved.push((fill_id, num_fmt_id));
        }

        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !numfmts.is_empty() {
            xml.push_str(&format!("\n  <numFmts count=\"{}\">", numfmts.len()));
            for (id, code) in &numfmts {
                xml.push_str(&format!(
                    "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml_attr(code)
                ));
            }
            xml.push_str("\n  </numFmts>");
        }

        xml.push_str(
            r#"
  <fonts count="1">
    <font><sz val="11"/><name val="Calibri"/><family val="2"/></font>
  </fonts>"#,
        );

        xml.push_str(&format!("\n  <fills count=\"{}\">", fills.len() + 2));
        xml.push_str("\n    <fill><patternFill patternType=\"none\"/></fill>");
        xml.push_str("\n    <fill><patternFill patternType=\"gray125\"/></fill>");
        for fill in &fills {
            xml.push_str("\n    ");
            xml.push_str(&write_fill(fill));
        }
        xml.push_str("\n  </fills>");

        xml.push_str(
            r#"
  <borders count="1">
    <border><left/><right/><top/><bottom/><diagonal/></border>
  </borders>
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", resolved.len()));
        for (fill_id, num_fmt_id) in &resolved {
            let mut xf = format!(
                "\n    <xf numFmtId=\"{}\" fontId=\"0\" fillId=\"{}\" borderId=\"0\" xfId=\"0\"",
                num_fmt_id, fill_id
            );
            if *num_fmt_id != 0 {
                xf.push_str(" applyNumberFormat=\"1\"");
            }
            if *fill_id != 0 {
                xf.push_str(" applyFill=\"1\"");
            }
            xf.push_str("/>");
            xml.push_str(&xf);
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
</styleSheet>"#,
        );
        xml
    }
}

fn escape_xml_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn write_color(tag: &str, color: &Color) -> String {
    match color {
        Color::Auto => format!("<{} auto=\"1\"/>", tag),
        Color::Argb { .. } => format!(
            "<{} rgb=\"{}\"/>",
            tag,
            color.to_argb_hex().unwrap_or_default()
        ),
        Color::Theme { index, tint } if *tint != 0 => format!(
            "<{} theme=\"{}\" tint=\"{}\"/>",
            tag,
            index,
            f64::from(*tint) / 100.0
        ),
        Color::Theme { index, .. } => format!("<{} theme=\"{}\"/>", tag, index),
        Color::Indexed(i) => format!("<{} indexed=\"{}\"/>", tag, i),
    }
}

fn write_fill(fill: &FillStyle) -> String {
    match fill {
        FillStyle::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        FillStyle::Solid { color } => format!(
            "<fill><patternFill patternType=\"solid\">{}<bgColor indexed=\"64\"/></patternFill></fill>",
            write_color("fgColor", color)
        ),
    }
}

// === Reading ===

/// Cell formats from `cellXfs`, indexed by the `s` attribute of a cell
#[derive(Debug)]
pub(crate) struct ParsedStyles {
    pub(crate) cell_styles: Vec<Style>,
}

impl Default for ParsedStyles {
    fn default() -> Self {
        Self {
            cell_styles: vec![Style::default()],
        }
    }
}

pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<ParsedStyles> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();

    let mut numfmts: HashMap<u32, String> = HashMap::new();
    let mut fills: Vec<FillStyle> = Vec::new();
    let mut cell_xfs: Vec<Style> = Vec::new();

    let mut in_fill = false;
    let mut fill_solid = false;
    let mut fill_fg = Color::Auto;
    let mut in_cell_xfs = false;

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"cellXfs" => in_cell_xfs = true,
                b"fill" => {
                    in_fill = true;
                    fill_solid = false;
                    fill_fg = Color::Auto;
                }
                b"patternFill" if in_fill => fill_solid = is_solid_pattern(&e),
                b"xf" if in_cell_xfs => cell_xfs.push(resolve_xf(&e, &numfmts, &fills)),
                _ => {}
            },

            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"numFmt" => {
                    let id = attr_value(&e, b"numFmtId").and_then(|s| s.parse().ok());
                    let code = attr_value(&e, b"formatCode");
                    if let (Some(id), Some(code)) = (id, code) {
                        numfmts.insert(id, code);
                    }
                }
                b"patternFill" if in_fill => fill_solid = is_solid_pattern(&e),
                b"fgColor" if in_fill => fill_fg = parse_color_attrs(&e),
                b"xf" if in_cell_xfs => cell_xfs.push(resolve_xf(&e, &numfmts, &fills)),
                _ => {}
            },

            Ok(Event::End(e)) => match e.name().as_ref() {
                b"cellXfs" => in_cell_xfs = false,
                b"fill" => {
                    in_fill = false;
                    fills.push(if fill_solid {
                        FillStyle::solid(fill_fg)
                    } else {
                        FillStyle::None
                    });
                }
                _ => {}
            },

            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }

        buf.clear();
    }

    if cell_xfs.is_empty() {
        return Ok(ParsedStyles::default());
    }
    Ok(ParsedStyles {
        cell_styles: cell_xfs,
    })
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.to_string()))
}

fn is_solid_pattern(e: &BytesStart<'_>) -> bool {
    attr_value(e, b"patternType").as_deref() == Some("solid")
}

fn resolve_xf(e: &BytesStart<'_>, numfmts: &HashMap<u32, String>, fills: &[FillStyle]) -> Style {
    let id = |key: &[u8]| {
        attr_value(e, key)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0)
    };
    let num_fmt_id = id(b"numFmtId");
    let fill_id = id(b"fillId");

    Style {
        fill: fills.get(fill_id as usize).copied().unwrap_or_default(),
        number_format: NumberFormat::from_id(
            num_fmt_id,
            numfmts.get(&num_fmt_id).map(String::as_str),
        ),
    }
}

fn parse_color_attrs(e: &BytesStart<'_>) -> Color {
    // Priority: rgb > theme > indexed > auto
    if let Some(color) = attr_value(e, b"rgb").and_then(|rgb| Color::from_hex(&rgb)) {
        return color;
    }

    if let Some(index) = attr_value(e, b"theme").and_then(|s| s.parse::<u8>().ok()) {
        let tint = attr_value(e, b"tint")
            .and_then(|s| s.parse::<f64>().ok())
            .map(|t| (t * 100.0).round() as i8)
            .unwrap_or(0);
        return Color::Theme { index, tint };
    }

    attr_value(e, b"indexed")
        .and_then(|s| s.parse::<u8>().ok())
        .map(Color::Indexed)
        .unwrap_or(Color::Auto)
}
