//! Streaming VOTable and VOSI document reader built on `quick-xml`.
//!
//! Only the subset of VOTable needed to classify and compare query results is
//! read: the FIELD declarations and TABLEDATA rows of the first TABLE, and the
//! INFO elements of the document. Binary serializations are rejected.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;

use crate::error::{Result, TapError};

/// Namespace prefix shared by every VOTable schema version.
pub const VOTABLE_NAMESPACE_PREFIX: &str = "http://www.ivoa.net/xml/VOTable/";

/// Name of the INFO element that carries a TAP query's outcome.
pub const QUERY_STATUS: &str = "QUERY_STATUS";

/// A column declaration of a VOTable TABLE.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Field {
    pub id: Option<String>,
    pub name: String,
    pub datatype: String,
    pub arraysize: Option<String>,
}

impl Field {
    /// The identifier used to address this field: its `ID` if declared,
    /// otherwise its `name`.
    pub fn identifier(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

/// An INFO element, typically `QUERY_STATUS`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Info {
    pub name: String,
    pub value: String,
    pub text: String,
}

/// The first table of a VOTable document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VoTable {
    fields: Vec<Field>,
    rows: Vec<Vec<String>>,
    infos: Vec<Info>,
}

impl VoTable {
    /// Parses a VOTable document, keeping the first TABLE found.
    ///
    /// Fails on malformed XML, on a root element other than `VOTABLE`, on a
    /// document without any TABLE, on rows whose cell count differs from the
    /// field count, and on non-TABLEDATA serializations.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut table = VoTable::default();
        let mut depth = 0usize;
        let mut saw_root = false;
        let mut tables_seen = 0usize;
        let mut in_first_table = false;
        let mut current_row: Option<Vec<String>> = None;
        let mut current_cell: Option<String> = None;
        let mut current_info: Option<Info> = None;

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(e) => {
                    let name = local_name(&e);
                    if depth == 0 {
                        expect_root(&name)?;
                        saw_root = true;
                    }
                    depth += 1;
                    match name.as_str() {
                        "TABLE" => {
                            tables_seen += 1;
                            in_first_table = tables_seen == 1;
                        }
                        "FIELD" if in_first_table => table.fields.push(read_field(&e)?),
                        "TR" if in_first_table => current_row = Some(Vec::new()),
                        "TD" if current_row.is_some() => current_cell = Some(String::new()),
                        "INFO" => current_info = Some(read_info(&e)?),
                        "BINARY" | "BINARY2" | "FITS" if in_first_table => {
                            return Err(TapError::Parse(format!(
                                "Unsupported VOTable serialization: {name}"
                            )));
                        }
                        _ => {}
                    }
                }
                Event::Empty(e) => {
                    let name = local_name(&e);
                    if depth == 0 {
                        expect_root(&name)?;
                        saw_root = true;
                    }
                    match name.as_str() {
                        "TABLE" => {
                            tables_seen += 1;
                            in_first_table = false;
                        }
                        "FIELD" if in_first_table => table.fields.push(read_field(&e)?),
                        "TR" if in_first_table => table.push_row(Vec::new())?,
                        "TD" => {
                            if let Some(row) = current_row.as_mut() {
                                row.push(String::new());
                            }
                        }
                        "INFO" => table.infos.push(read_info(&e)?),
                        _ => {}
                    }
                }
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    match String::from_utf8_lossy(e.local_name().as_ref()).as_ref() {
                        "TABLE" => in_first_table = false,
                        "TD" => {
                            if let (Some(row), Some(cell)) = (current_row.as_mut(), current_cell.take())
                            {
                                row.push(cell);
                            }
                        }
                        "TR" => {
                            if let Some(row) = current_row.take() {
                                table.push_row(row)?;
                            }
                        }
                        "INFO" => {
                            if let Some(info) = current_info.take() {
                                table.infos.push(info);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(xml_error)?;
                    append_text(&mut current_cell, &mut current_info, &text);
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    append_text(&mut current_cell, &mut current_info, &text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(TapError::Parse(
                "Document has no VOTABLE root element".to_string(),
            ));
        }
        if depth != 0 {
            return Err(TapError::Parse(
                "Unexpected end of document inside an open element".to_string(),
            ));
        }
        if tables_seen == 0 {
            return Err(TapError::Parse(
                "VOTable document contains no TABLE".to_string(),
            ));
        }
        Ok(table)
    }

    fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.fields.len() {
            return Err(TapError::Parse(format!(
                "Row {} has {} cells, expected {}",
                self.rows.len() + 1,
                row.len(),
                self.fields.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn infos(&self) -> &[Info] {
        &self.infos
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the cell at `row`, `column`, if both are in range.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, column: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(column).map(String::as_str))
    }

    /// The `QUERY_STATUS` INFO element, if the service sent one.
    ///
    /// A service may report `OK` before the table and `OVERFLOW` or `ERROR`
    /// after it, so the last one in document order wins.
    pub fn query_status(&self) -> Option<&Info> {
        self.infos.iter().rev().find(|info| info.name == QUERY_STATUS)
    }
}

fn expect_root(name: &str) -> Result<()> {
    if name == "VOTABLE" {
        Ok(())
    } else {
        Err(TapError::Parse(format!(
            "Root element is <{name}>, expected <VOTABLE>"
        )))
    }
}

fn append_text(cell: &mut Option<String>, info: &mut Option<Info>, text: &str) {
    if let Some(cell) = cell.as_mut() {
        cell.push_str(text);
    } else if let Some(info) = info.as_mut() {
        info.text.push_str(text);
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn xml_error(err: impl std::fmt::Display) -> TapError {
    TapError::Parse(err.to_string())
}

/// Returns the value of attribute `key` (matched on local name).
fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.local_name().as_ref() == key.as_bytes() {
            return Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned()));
        }
    }
    Ok(None)
}

fn read_field(e: &BytesStart<'_>) -> Result<Field> {
    Ok(Field {
        id: attribute(e, "ID")?,
        name: attribute(e, "name")?.unwrap_or_default(),
        datatype: attribute(e, "datatype")?.unwrap_or_default(),
        arraysize: attribute(e, "arraysize")?,
    })
}

fn read_info(e: &BytesStart<'_>) -> Result<Info> {
    Ok(Info {
        name: attribute(e, "name")?.unwrap_or_default(),
        value: attribute(e, "value")?.unwrap_or_default(),
        text: String::new(),
    })
}

/// Extracts the text of the VOTable-namespaced `QUERY_STATUS` INFO element.
///
/// This is a lenient scan used on payloads that failed to parse as a table:
/// it stops at the first XML error and returns what it found so far. Returns
/// `None` when no such element exists or its text is empty.
pub fn query_status_text(xml: &str) -> Option<String> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut capturing: Option<String> = None;

    loop {
        match reader.read_resolved_event() {
            Ok((ResolveResult::Bound(Namespace(ns)), Event::Start(e)))
                if is_votable_namespace(ns) && e.local_name().as_ref() == b"INFO" =>
            {
                if attribute(&e, "name").ok().flatten().as_deref() == Some(QUERY_STATUS) {
                    capturing = Some(String::new());
                }
            }
            Ok((_, Event::Text(t))) => {
                if let (Some(text), Ok(value)) = (capturing.as_mut(), t.unescape()) {
                    text.push_str(&value);
                }
            }
            Ok((_, Event::End(e))) if e.local_name().as_ref() == b"INFO" => {
                if let Some(text) = capturing.take() {
                    return Some(text).filter(|t| !t.is_empty());
                }
            }
            Ok((_, Event::Eof)) | Err(_) => return None,
            _ => {}
        }
    }
}

fn is_votable_namespace(ns: &[u8]) -> bool {
    ns.starts_with(VOTABLE_NAMESPACE_PREFIX.as_bytes())
}

/// Checks that `xml` is well formed and contains an element named `element`.
///
/// With a `namespace`, the element must be bound to exactly that namespace;
/// without one, only the local name is compared.
pub fn element_exists(xml: &str, element: &str, namespace: Option<&str>) -> Result<bool> {
    let mut reader = NsReader::from_str(xml);
    let mut found = false;
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        let (resolved, event) = reader.read_resolved_event().map_err(xml_error)?;
        let start = match &event {
            Event::Start(e) => {
                depth += 1;
                Some(e)
            }
            Event::Empty(e) => Some(e),
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                None
            }
            Event::Eof => break,
            _ => None,
        };
        let Some(start) = start else { continue };
        saw_root = true;
        if start.local_name().as_ref() != element.as_bytes() {
            continue;
        }
        found |= match (namespace, &resolved) {
            (None, _) => true,
            (Some(expected), ResolveResult::Bound(Namespace(ns))) => {
                *ns == expected.as_bytes()
            }
            (Some(_), _) => false,
        };
    }

    if !saw_root {
        return Err(TapError::Parse("no element found".to_string()));
    }
    if depth != 0 {
        return Err(TapError::Parse(
            "Unexpected end of document inside an open element".to_string(),
        ));
    }
    Ok(found)
}

/// Strips a byte-order mark and surrounding whitespace from a response body.
pub fn clean_text(raw: &str) -> &str {
    raw.trim_start_matches('\u{feff}').trim()
}
