//! Planner result documents (XML) to table fields.
//!
//! Two document shapes are accepted:
//!
//! - record list: `<data><row><demands>10</demands>...</row>...</data>`, one
//!   row per child element of the root that has children or attributes;
//! - flat record: `<result><demands>10</demands>...</result>`, one row.
//!
//! Attributes and child-element text both become fields. Field types are
//! inferred per cell by [`Value::parse`].

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::ReportError;
use crate::table::{Fields, Value};

pub const ARTIFACT_EXTENSION: &str = "xml";

pub fn is_artifact(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == ARTIFACT_EXTENSION)
}

pub fn read_artifact(path: &Path) -> Result<Vec<Fields>, ReportError> {
    let text = fs::read_to_string(path).map_err(|source| ReportError::io(path, source))?;
    parse_artifact(&text).map_err(|message| ReportError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

pub fn parse_artifact(xml: &str) -> Result<Vec<Fields>, String> {
    let root = parse_tree(xml)?;
    let is_record_list = root
        .children
        .iter()
        .any(|child| !child.children.is_empty() || !child.attrs.is_empty());
    if !is_record_list {
        return Ok(vec![record_fields(&root)]);
    }
    Ok(root
        .children
        .iter()
        .filter(|child| !child.children.is_empty() || !child.attrs.is_empty())
        .map(record_fields)
        .collect())
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

fn record_fields(record: &Element) -> Fields {
    let mut fields = Fields::new();
    for (name, raw) in &record.attrs {
        if let Some(value) = Value::parse(raw) {
            fields.insert(name.clone(), value);
        }
    }
    for child in &record.children {
        if let Some(value) = Value::parse(&child.text) {
            fields.insert(child.name.clone(), value);
        }
    }
    if record.children.is_empty()
        && let Some(value) = Value::parse(&record.text)
    {
        fields.insert(record.name.clone(), value);
    }
    fields
}

fn parse_tree(xml: &str) -> Result<Element, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("at byte {}: {e}", reader.buffer_position()))?;
        match event {
            Event::Start(start) => stack.push(element(&start)?),
            Event::Empty(start) => attach(&mut stack, &mut root, element(&start)?)?,
            Event::End(_) => {
                let done = stack.pop().ok_or("unbalanced end tag")?;
                attach(&mut stack, &mut root, done)?;
            }
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    let text = text.unescape().map_err(|e| e.to_string())?;
                    open.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.name));
    }
    root.ok_or_else(|| "no root element".to_string())
}

fn element(start: &BytesStart<'_>) -> Result<Element, String> {
    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let name = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attrs.push((name, value.into_owned()));
    }
    Ok(Element {
        name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        attrs,
        ..Element::default()
    })
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, done: Element) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(done);
        return Ok(());
    }
    if root.is_some() {
        return Err(format!("second root element <{}>", done.name));
    }
    *root = Some(done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_list_yields_row_per_record() {
        let xml = r#"<?xml version="1.0"?>
<data>
  <row index="0">
    <demands>100</demands>
    <single_transponder_for_all>true</single_transponder_for_all>
    <total_Cost>250.5</total_Cost>
    <ZR_NodeMadrid>4</ZR_NodeMadrid>
  </row>
  <row index="1">
    <demands>100</demands>
    <total_Cost/>
  </row>
</data>"#;
        let rows = parse_artifact(xml).expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("total_Cost"), Some(&Value::Number(250.5)));
        assert_eq!(rows[0].get("single_transponder_for_all"), Some(&Value::Bool(true)));
        assert_eq!(rows[0].get("ZR_NodeMadrid"), Some(&Value::Number(4.0)));
        assert_eq!(rows[0].get("index"), Some(&Value::Number(0.0)));
        assert_eq!(rows[1].get("total_Cost"), None);
    }

    #[test]
    fn flat_document_is_one_row() {
        let xml = "<result><demands>40</demands><number_ZR>7</number_ZR><note>a &amp; b</note></result>";
        let rows = parse_artifact(xml).expect("parse");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("demands"), Some(&Value::Number(40.0)));
        assert_eq!(rows[0].get("note"), Some(&Value::Text("a & b".to_string())));
    }

    #[test]
    fn attribute_only_records_are_rows() {
        let xml = r#"<data><row demands="5" number_LR="2"/><row demands="6"><x>1</x></row></data>"#;
        let rows = parse_artifact(xml).expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("number_LR"), Some(&Value::Number(2.0)));

        let rows = parse_artifact(r#"<data><row demands="5"/><row demands="6"/></data>"#)
            .expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("demands"), Some(&Value::Number(6.0)));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(parse_artifact("<data><row></data>").is_err());
        assert!(parse_artifact("").is_err());
        assert!(parse_artifact("<a/><b/>").is_err());
    }

    #[test]
    fn only_xml_extension_is_an_artifact() {
        assert!(is_artifact(Path::new("/r/results100.xml")));
        assert!(!is_artifact(Path::new("/r/output.n2p")));
        assert!(!is_artifact(Path::new("/r/xml")));
    }
}
